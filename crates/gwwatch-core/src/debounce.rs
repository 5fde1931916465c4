//! Debounce state machine for gateway status transitions.
//!
//! A status is reported once it has been observed continuously for the
//! configured delay:
//!
//! - **Change**: a different status resets the window (`last_change := now`)
//!   and clears `notified`, even in the middle of a running window.
//! - **Gate**: once `now - last_change >= delay` and nothing has fired for the
//!   current status, exactly one event is emitted and `notified` is set.
//! - **Stable**: further identical observations never re-emit.
//!
//! The first observation of an entity counts as a change, so the window starts
//! at the first successful read. A zero delay emits on the cycle of the change.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::types::{Action, EntityStateRecord, Observation, StatusEvent};

/// Feed one observation through the state machine.
///
/// Returns the record to persist and the action for the caller. Pure: the
/// caller owns reading and writing the record.
pub fn decide(
    entity_key: &str,
    previous: &EntityStateRecord,
    observed: &Observation,
    now: DateTime<Utc>,
    delay: Duration,
) -> (EntityStateRecord, Action) {
    let mut next = previous.clone();

    if previous.last_status != Some(observed.status) {
        next.last_status = Some(observed.status);
        next.last_change = Some(now);
        next.notified = false;
    }

    let elapsed = now.signed_duration_since(next.last_change_or_epoch());
    if next.notified || elapsed < delay_window(delay) {
        return (next, Action::None);
    }

    next.notified = true;
    let event = StatusEvent {
        entity_key: entity_key.to_string(),
        status: observed.status,
        changed_at: next.last_change,
        previous: previous.last_reported,
        reason: observed.reason,
        description: observed.description.clone(),
    };
    next.last_reported = Some(observed.status);

    (next, Action::Emit(event))
}

/// Delays beyond what `TimeDelta` can hold never elapse.
fn delay_window(delay: Duration) -> TimeDelta {
    TimeDelta::from_std(delay).unwrap_or(TimeDelta::MAX)
}

// ─── Tests ───────────────────────────────────────────────────────────


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::types::CanonicalStatus;
    use proptest::prelude::*;

    fn arb_status() -> impl Strategy<Value = CanonicalStatus> {
        prop_oneof![
            Just(CanonicalStatus::Up),
            Just(CanonicalStatus::Down),
            Just(CanonicalStatus::Unknown),
        ]
    }

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-02-25T12:00:00Z")
            .expect("valid RFC3339")
            .with_timezone(&Utc)
    }

    proptest! {
        /// At most one emit for a status that never changes.
        #[test]
        fn stable_status_emits_at_most_once(
            status in arb_status(),
            gaps in proptest::collection::vec(0i64..600, 1..40),
            delay_secs in 0u64..300,
        ) {
            let delay = Duration::from_secs(delay_secs);
            let mut state = EntityStateRecord::default();
            let mut now = t0();
            let mut emits = 0;
            for gap in gaps {
                now += TimeDelta::seconds(gap);
                let (next, action) = decide("gw", &state, &Observation::reported(status, None), now, delay);
                if matches!(action, Action::Emit(_)) {
                    emits += 1;
                }
                state = next;
            }
            prop_assert!(emits <= 1);
        }

        /// Alternating faster than the delay never emits.
        #[test]
        fn flapping_never_emits(
            len in 1usize..60,
            delay_secs in 2u64..600,
        ) {
            let delay = Duration::from_secs(delay_secs);
            let step = TimeDelta::seconds(delay_secs as i64 - 1);
            let mut state = EntityStateRecord::default();
            let mut now = t0();
            for i in 0..len {
                let status = if i % 2 == 0 { CanonicalStatus::Up } else { CanonicalStatus::Down };
                let (next, action) = decide("gw", &state, &Observation::reported(status, None), now, delay);
                prop_assert_eq!(action, Action::None);
                state = next;
                now += step;
            }
        }

        /// `notified` never survives a status change.
        #[test]
        fn notified_only_for_current_status(
            statuses in proptest::collection::vec(arb_status(), 1..40),
            delay_secs in 0u64..120,
        ) {
            let delay = Duration::from_secs(delay_secs);
            let mut state = EntityStateRecord::default();
            let mut now = t0();
            for status in statuses {
                let before = state.last_status;
                let (next, _) = decide("gw", &state, &Observation::reported(status, None), now, delay);
                if before != Some(status) && delay_secs > 0 {
                    prop_assert!(!next.notified);
                }
                if next.notified {
                    prop_assert_eq!(next.last_reported, next.last_status);
                }
                state = next;
                now += TimeDelta::seconds(30);
            }
        }
    }
}
