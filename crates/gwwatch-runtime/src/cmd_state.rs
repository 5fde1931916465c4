//! `gwwatch state` and `gwwatch reset`: inspect or drop persisted debounce state.

use gwwatch_core::{EntityStateRecord, EntityStateStore};

use crate::cli::{ResetOpts, RouterOpts, StateOpts};
use crate::context::open_store;

/// Entry point for `gwwatch state`.
pub fn cmd_state(router: &RouterOpts, opts: &StateOpts) -> anyhow::Result<()> {
    let store = open_store(router, &opts.store)?;
    let records = match &opts.gateway {
        Some(gateway) => vec![(gateway.clone(), store.get(gateway)?)],
        None => store.list()?,
    };
    println!("{}", state_to_json(store.namespace(), &records));
    Ok(())
}

/// Entry point for `gwwatch reset`.
pub fn cmd_reset(router: &RouterOpts, opts: &ResetOpts) -> anyhow::Result<()> {
    let store = open_store(router, &opts.store)?;
    if store.remove(&opts.gateway)? {
        println!("reset {} in {}", opts.gateway, store.namespace());
    } else {
        println!("no state for {} in {}", opts.gateway, store.namespace());
    }
    Ok(())
}

pub(crate) fn state_to_json(namespace: &str, records: &[(String, EntityStateRecord)]) -> String {
    let entities: Vec<serde_json::Value> = records
        .iter()
        .map(|(key, record)| {
            serde_json::json!({
                "entity_key": key,
                "last_status": record.last_status,
                "last_change": record.last_change,
                "notified": record.notified,
                "last_reported": record.last_reported,
            })
        })
        .collect();

    let doc = serde_json::json!({
        "namespace": namespace,
        "entities": entities,
    });
    serde_json::to_string_pretty(&doc).unwrap_or_else(|_| doc.to_string())
}
