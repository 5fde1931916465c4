//! `gwwatch list` and `gwwatch verify`: direct router queries, no state involved.

use gwwatch_core::{GatewayStatus, StatusSource, normalize};

use crate::cli::RouterOpts;
use crate::context::build_client;

/// Entry point for `gwwatch list`.
pub async fn cmd_list(router: &RouterOpts) -> anyhow::Result<()> {
    let client = build_client(router)?;
    let gateways = client.list_entities().await;
    if gateways.is_empty() {
        tracing::warn!("no gateways returned by {}", client.identity());
        return Ok(());
    }
    println!("{}", format_gateway_list(&gateways));
    Ok(())
}

/// Entry point for `gwwatch verify`.
pub async fn cmd_verify(router: &RouterOpts) -> anyhow::Result<()> {
    let client = build_client(router)?;
    let count = client
        .verify()
        .await
        .map_err(|e| anyhow::anyhow!("cannot query {}: {e}", client.identity()))?;
    println!("ok: {count} gateways on {}", client.identity());
    Ok(())
}

/// One line per gateway: name, canonical status, router description.
pub(crate) fn format_gateway_list(gateways: &[GatewayStatus]) -> String {
    let width = gateways.iter().map(|g| g.name.len()).max().unwrap_or(0);
    gateways
        .iter()
        .map(|g| {
            let line = format!("{:<width$}  {:<7}", g.name, normalize(&g.status).as_str());
            if g.status_description.is_empty() {
                line.trim_end().to_string()
            } else {
                format!("{line}  Status: {}", g.status_description)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
