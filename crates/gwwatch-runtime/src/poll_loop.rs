//! Poll loop: drives one cycle per gateway on every tick and writes emitted
//! events as JSON lines.

use std::io::{self, Write};
use std::time::Duration;

use chrono::Utc;
use tokio::time::{MissedTickBehavior, interval};

use gwwatch_core::{CycleError, EntityStateStore, StatusEvent, StatusSource, run_cycle};

use crate::cli::{RouterOpts, WatchOpts};
use crate::context::{build_client, open_store};

/// Run `watch` until ctrl-c or SIGTERM.
pub async fn run_watch(router: &RouterOpts, opts: WatchOpts) -> anyhow::Result<()> {
    let client = build_client(router)?;
    let mut store = open_store(router, &opts.store)?;
    let delay = Duration::from_secs(opts.delay_secs);
    let period = Duration::from_secs(opts.interval_secs);
    let timeout = Duration::from_millis(router.timeout_ms);

    if tick_may_overrun(opts.gateways.len(), timeout, period) {
        tracing::warn!(
            "{} gateway(s) x {}ms timeout exceeds the {}s interval; \
             ticks will run late while the router is unreachable",
            opts.gateways.len(),
            router.timeout_ms,
            opts.interval_secs
        );
    }

    tracing::info!(
        "watching {} gateway(s) on {} every {}s (delay {}s)",
        opts.gateways.len(),
        client.identity(),
        opts.interval_secs,
        opts.delay_secs
    );

    // Dropping the loop mid-fetch is safe: no state is written before the
    // fetch of a cycle has returned.
    tokio::select! {
        () = shutdown_signal() => {}
        () = run_poll_loop(&client, &mut store, &opts.gateways, delay, period, io::stdout()) => {}
    }

    tracing::info!("gwwatch stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
                    _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
                }
            }
            Err(e) => {
                tracing::warn!("failed to register SIGTERM handler: {e}");
                ctrl_c.await.ok();
                tracing::info!("received ctrl-c, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        tracing::info!("received ctrl-c, shutting down");
    }
}

/// Returns only when the event consumer has gone away (broken pipe).
async fn run_poll_loop<S, T, W>(
    source: &S,
    store: &mut T,
    gateways: &[String],
    delay: Duration,
    period: Duration,
    mut out: W,
) where
    S: StatusSource,
    T: EntityStateStore,
    W: Write,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let events = poll_tick(source, store, gateways, delay).await;
        if let Err(e) = write_events(&mut out, &events) {
            tracing::warn!("event output closed ({e}); stopping");
            return;
        }
    }
}

/// Worst case for one tick is a full timeout per gateway, since each cycle
/// fetches on its own.
pub(crate) fn tick_may_overrun(gateways: usize, timeout: Duration, period: Duration) -> bool {
    let gateways = u32::try_from(gateways).unwrap_or(u32::MAX);
    timeout.saturating_mul(gateways) > period
}

/// One tick: a cycle per gateway, in order. Failed cycles are logged and
/// skipped; they never stop the other gateways.
///
/// Every cycle issues its own status request, so N gateways cost N requests
/// per tick and up to N timeouts when the router is unreachable.
pub(crate) async fn poll_tick<S, T>(
    source: &S,
    store: &mut T,
    gateways: &[String],
    delay: Duration,
) -> Vec<StatusEvent>
where
    S: StatusSource + ?Sized,
    T: EntityStateStore + ?Sized,
{
    let mut events = Vec::new();
    for gateway in gateways {
        match run_cycle(gateway, source, store, delay, Utc::now()).await {
            Ok(Some(event)) => events.push(event),
            Ok(None) => {}
            Err(e @ CycleError::EntityNotFound { .. }) => {
                tracing::warn!("{e}; check the configured gateway name");
            }
            Err(e) => tracing::warn!("poll cycle for {gateway} failed: {e}"),
        }
    }
    events
}

/// Write one event as a single JSON line.
pub(crate) fn write_event<W: Write>(out: &mut W, event: &StatusEvent) -> io::Result<()> {
    serde_json::to_writer(&mut *out, event).map_err(io::Error::from)?;
    out.write_all(b"\n")?;
    out.flush()
}

/// Write a tick's events. Per-event failures are logged and skipped, except a
/// broken pipe, which is returned.
pub(crate) fn write_events<W: Write>(out: &mut W, events: &[StatusEvent]) -> io::Result<()> {
    for event in events {
        match write_event(out, event) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => return Err(e),
            Err(e) => tracing::error!("failed to write event: {e}"),
        }
    }
    Ok(())
}
