//! `gwwatch check`: one poll cycle for one gateway.

use std::io::Write;
use std::time::Duration;

use chrono::Utc;
use gwwatch_core::{EntityStateStore, StatusSource, run_cycle};

use crate::cli::{CheckOpts, RouterOpts};
use crate::context::{build_client, open_store};
use crate::poll_loop::write_event;

/// Entry point for `gwwatch check`.
pub async fn cmd_check(router: &RouterOpts, opts: CheckOpts) -> anyhow::Result<()> {
    let client = build_client(router)?;
    let mut store = open_store(router, &opts.store)?;
    let delay = Duration::from_secs(opts.delay_secs);

    let mut out = std::io::stdout();
    check_once(&client, &mut store, &opts.gateway, delay, &mut out).await
}

/// Run one cycle and print the resulting event, if any. Errors propagate so
/// the process exits non-zero.
pub(crate) async fn check_once<S, T, W>(
    source: &S,
    store: &mut T,
    gateway: &str,
    delay: Duration,
    out: &mut W,
) -> anyhow::Result<()>
where
    S: StatusSource + ?Sized,
    T: EntityStateStore + ?Sized,
    W: Write,
{
    match run_cycle(gateway, source, store, delay, Utc::now()).await? {
        Some(event) => write_event(out, &event)?,
        None => tracing::info!("{gateway}: nothing to report"),
    }
    Ok(())
}
