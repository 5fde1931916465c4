//! One poll cycle: fetch → classify → normalize → decide → persist.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::debounce::decide;
use crate::error::CycleError;
use crate::normalize::normalize;
use crate::source::StatusSource;
use crate::store::EntityStateStore;
use crate::types::{Observation, StatusEvent};

/// Run a single poll cycle for `entity_key`.
///
/// Returns the event to deliver, if any. The fetch is the only await point;
/// the store is read and written only after it has returned, so dropping the
/// future before then leaves the store untouched.
///
/// Unreachable sources become a `Down` observation. A successful response
/// that lacks `entity_key` fails with [`CycleError::EntityNotFound`] without
/// touching the store.
pub async fn run_cycle<S, T>(
    entity_key: &str,
    source: &S,
    store: &mut T,
    delay: Duration,
    now: DateTime<Utc>,
) -> Result<Option<StatusEvent>, CycleError>
where
    S: StatusSource + ?Sized,
    T: EntityStateStore + ?Sized,
{
    let observation = match source.fetch_statuses().await {
        Ok(statuses) => {
            let gateway = statuses
                .into_iter()
                .find(|g| g.name == entity_key)
                .ok_or_else(|| CycleError::EntityNotFound {
                    entity_key: entity_key.to_string(),
                })?;
            let description =
                Some(gateway.status_description).filter(|d| !d.trim().is_empty());
            Observation::reported(normalize(&gateway.status), description)
        }
        Err(e) if e.is_unreachable() => {
            tracing::info!(
                "{} unreachable while checking {entity_key}: {e}; treating as down",
                source.identity()
            );
            Observation::timeout()
        }
        Err(e) => return Err(CycleError::Source(e)),
    };

    let previous = store.get(entity_key)?;
    let (next, action) = decide(entity_key, &previous, &observation, now, delay);
    store.put(entity_key, &next)?;

    let event = action.into_event();
    match &event {
        Some(ev) => tracing::info!(
            "{entity_key}: status {} (previous {:?}, reason {:?})",
            ev.status,
            ev.previous,
            ev.reason
        ),
        None => tracing::debug!(
            "{entity_key}: observed {} (notified={}, since {:?})",
            observation.status,
            next.notified,
            next.last_change
        ),
    }

    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SourceError, StoreError};
    use crate::store::MemoryStateStore;
    use crate::types::{CanonicalStatus, EntityStateRecord, GatewayStatus, ObservationReason};
    use async_trait::async_trait;
    use chrono::TimeDelta;
    use std::sync::Mutex;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-02-25T12:00:00Z")
            .expect("valid RFC3339")
            .with_timezone(&Utc)
    }

    const DELAY: Duration = Duration::from_secs(60);

    /// Fake status source replaying a queue of canned responses.
    struct FakeSource {
        responses: Mutex<Vec<Result<Vec<GatewayStatus>, SourceError>>>,
    }

    impl FakeSource {
        fn new() -> Self {
            Self {
                responses: Mutex::new(Vec::new()),
            }
        }

        fn with_gateways(self, gateways: &[(&str, &str)]) -> Self {
            let statuses = gateways
                .iter()
                .map(|(name, status)| GatewayStatus {
                    name: (*name).to_string(),
                    status: (*status).to_string(),
                    status_description: format!("status {status}"),
                })
                .collect();
            self.push(Ok(statuses))
        }

        fn with_error(self, err: SourceError) -> Self {
            self.push(Err(err))
        }

        fn push(self, response: Result<Vec<GatewayStatus>, SourceError>) -> Self {
            self.responses
                .lock()
                .expect("lock")
                .insert(0, response);
            self
        }
    }

    #[async_trait]
    impl StatusSource for FakeSource {
        fn identity(&self) -> &str {
            "https://router.test"
        }

        async fn fetch_statuses(&self) -> Result<Vec<GatewayStatus>, SourceError> {
            self.responses
                .lock()
                .expect("lock")
                .pop()
                .unwrap_or_else(|| Err(SourceError::Request("no canned response".into())))
        }
    }

    /// Source that never answers.
    struct HangingSource;

    #[async_trait]
    impl StatusSource for HangingSource {
        fn identity(&self) -> &str {
            "hanging"
        }

        async fn fetch_statuses(&self) -> Result<Vec<GatewayStatus>, SourceError> {
            std::future::pending().await
        }
    }

    /// Store whose every operation fails.
    struct BrokenStore;

    impl EntityStateStore for BrokenStore {
        fn get(&self, _entity_key: &str) -> Result<EntityStateRecord, StoreError> {
            Err(StoreError::new("disk gone"))
        }

        fn put(&mut self, _entity_key: &str, _record: &EntityStateRecord) -> Result<(), StoreError> {
            Err(StoreError::new("disk gone"))
        }
    }

    #[tokio::test]
    async fn reported_status_is_normalized_and_persisted() {
        let source = FakeSource::new().with_gateways(&[("WAN", "none"), ("LTE", "down")]);
        let mut store = MemoryStateStore::new();

        let event = run_cycle("WAN", &source, &mut store, DELAY, t0())
            .await
            .expect("cycle");

        assert!(event.is_none(), "delay not yet elapsed");
        let record = store.get("WAN").expect("get");
        assert_eq!(record.last_status, Some(CanonicalStatus::Up));
        assert_eq!(record.last_change, Some(t0()));
        assert_eq!(store.get("LTE").expect("get"), EntityStateRecord::default());
    }

    #[tokio::test]
    async fn zero_delay_emits_on_first_cycle() {
        let source = FakeSource::new().with_gateways(&[("WAN", "down")]);
        let mut store = MemoryStateStore::new();

        let event = run_cycle("WAN", &source, &mut store, Duration::ZERO, t0())
            .await
            .expect("cycle")
            .expect("event");

        assert_eq!(event.entity_key, "WAN");
        assert_eq!(event.status, CanonicalStatus::Down);
        assert_eq!(event.changed_at, Some(t0()));
        assert_eq!(event.reason, ObservationReason::Reported);
        assert_eq!(event.description.as_deref(), Some("status down"));
    }

    #[tokio::test]
    async fn stable_status_emits_once_across_cycles() {
        let source = FakeSource::new()
            .with_gateways(&[("WAN", "none")])
            .with_gateways(&[("WAN", "none")])
            .with_gateways(&[("WAN", "none")])
            .with_gateways(&[("WAN", "none")]);
        let mut store = MemoryStateStore::new();

        let mut events = Vec::new();
        for minute in 0..4 {
            let now = t0() + TimeDelta::minutes(minute);
            events.extend(
                run_cycle("WAN", &source, &mut store, DELAY, now)
                    .await
                    .expect("cycle"),
            );
        }

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].changed_at, Some(t0()));
    }

    #[tokio::test]
    async fn timeout_is_treated_as_down() {
        let source = FakeSource::new().with_error(SourceError::Timeout);
        let mut store = MemoryStateStore::new();
        store
            .put(
                "WAN",
                &EntityStateRecord {
                    last_status: Some(CanonicalStatus::Up),
                    last_change: Some(t0()),
                    notified: true,
                    last_reported: Some(CanonicalStatus::Up),
                },
            )
            .expect("put");

        let now = t0() + TimeDelta::seconds(61);
        let event = run_cycle("WAN", &source, &mut store, Duration::ZERO, now)
            .await
            .expect("timeout never fails the cycle")
            .expect("event");

        assert_eq!(event.status, CanonicalStatus::Down);
        assert_eq!(event.previous, Some(CanonicalStatus::Up));
        assert_eq!(event.reason, ObservationReason::Timeout);
        assert!(event.description.is_none());
        let record = store.get("WAN").expect("get");
        assert_eq!(record.last_status, Some(CanonicalStatus::Down));
        assert!(record.notified);
    }

    #[tokio::test]
    async fn connection_failure_is_treated_as_down() {
        let source = FakeSource::new().with_error(SourceError::Connect("refused".into()));
        let mut store = MemoryStateStore::new();

        run_cycle("WAN", &source, &mut store, DELAY, t0())
            .await
            .expect("cycle");

        assert_eq!(
            store.get("WAN").expect("get").last_status,
            Some(CanonicalStatus::Down)
        );
    }

    #[tokio::test]
    async fn missing_entity_fails_without_mutation() {
        let source = FakeSource::new().with_gateways(&[("LTE", "none")]);
        let mut store = MemoryStateStore::new();

        let err = run_cycle("WAN", &source, &mut store, DELAY, t0())
            .await
            .expect_err("absent entity");

        assert!(matches!(err, CycleError::EntityNotFound { ref entity_key } if entity_key == "WAN"));
        assert!(store.is_empty(), "not-found must not touch the store");
    }

    #[tokio::test]
    async fn http_error_surfaces_without_mutation() {
        let source = FakeSource::new().with_error(SourceError::Http { status: 401 });
        let mut store = MemoryStateStore::new();

        let err = run_cycle("WAN", &source, &mut store, DELAY, t0())
            .await
            .expect_err("hard source error");

        assert!(matches!(err, CycleError::Source(SourceError::Http { status: 401 })));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn tls_failure_surfaces_without_mutation() {
        let source =
            FakeSource::new().with_error(SourceError::Tls("self-signed certificate".into()));
        let mut store = MemoryStateStore::new();

        let err = run_cycle("WAN", &source, &mut store, Duration::ZERO, t0())
            .await
            .expect_err("certificate problems are not an outage");

        assert!(matches!(err, CycleError::Source(SourceError::Tls(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn unrecognized_status_is_unknown() {
        let source = FakeSource::new().with_gateways(&[("WAN", "gremlins")]);
        let mut store = MemoryStateStore::new();

        let event = run_cycle("WAN", &source, &mut store, Duration::ZERO, t0())
            .await
            .expect("cycle")
            .expect("event");

        assert_eq!(event.status, CanonicalStatus::Unknown);
    }

    #[tokio::test]
    async fn store_failure_is_fatal() {
        let source = FakeSource::new().with_gateways(&[("WAN", "none")]);
        let mut store = BrokenStore;

        let err = run_cycle("WAN", &source, &mut store, DELAY, t0())
            .await
            .expect_err("store down");

        assert!(matches!(err, CycleError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn cancelled_fetch_leaves_store_untouched() {
        let mut store = MemoryStateStore::new();

        let outcome = tokio::time::timeout(
            Duration::from_millis(20),
            run_cycle("WAN", &HangingSource, &mut store, DELAY, t0()),
        )
        .await;

        assert!(outcome.is_err(), "fetch should have been cancelled");
        assert!(store.is_empty());
    }
}
