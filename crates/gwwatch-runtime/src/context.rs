//! Builders shared by subcommands: router client and state store from CLI options.

use std::time::Duration;

use anyhow::Context;
use gwwatch_source_opnsense::{OpnsenseClient, OpnsenseConfig};
use gwwatch_store::SqliteStateStore;

use crate::cli::{RouterOpts, StoreOpts};

pub fn build_client(router: &RouterOpts) -> anyhow::Result<OpnsenseClient> {
    let url = router.require_router_url()?;
    if router.api_key.is_empty() || router.api_secret.is_empty() {
        tracing::warn!("API key or secret is empty; the router will likely reject requests");
    }
    let config = OpnsenseConfig::new(url, router.api_key.clone(), router.api_secret.clone())
        .with_timeout(Duration::from_millis(router.timeout_ms))
        .with_accept_invalid_certs(router.insecure);
    Ok(OpnsenseClient::new(config)?)
}

/// Open the SQLite store, creating its parent directory when needed.
pub fn open_store(router: &RouterOpts, opts: &StoreOpts) -> anyhow::Result<SqliteStateStore> {
    let namespace = opts.resolve_namespace(router)?;
    if let Some(parent) = opts.state_db.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating state directory {}", parent.display()))?;
    }
    let store = SqliteStateStore::open(&opts.state_db, namespace)
        .with_context(|| format!("opening state db {}", opts.state_db.display()))?;
    tracing::debug!(
        "state db {} (namespace {})",
        opts.state_db.display(),
        store.namespace()
    );
    Ok(store)
}
