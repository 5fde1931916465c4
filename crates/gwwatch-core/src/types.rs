use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseStatusError;
use crate::normalize::{TIMEOUT_SENTINEL, normalize};

// ─── Canonical status ─────────────────────────────────────────────

/// Normalized health of a monitored gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalStatus {
    Up,
    Down,
    Unknown,
}

impl CanonicalStatus {
    pub const ALL: [Self; 3] = [Self::Up, Self::Down, Self::Unknown];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the persisted form written by [`CanonicalStatus::as_str`].
///
/// This is not the raw source vocabulary; use [`crate::normalize::normalize`]
/// for values returned by a status source.
impl FromStr for CanonicalStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "unknown" => Ok(Self::Unknown),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

// ─── Entity state ─────────────────────────────────────────────────

/// Persisted debounce state for one monitored entity.
///
/// `notified` is only ever true for the status currently held in
/// `last_status`; any change of `last_status` clears it.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityStateRecord {
    /// Last observed status. `None` until the first successful observation.
    pub last_status: Option<CanonicalStatus>,
    /// When `last_status` last changed to a different value.
    pub last_change: Option<DateTime<Utc>>,
    /// Whether an event already fired for the current `last_status`.
    pub notified: bool,
    /// Status carried by the most recent emitted event.
    #[serde(default)]
    pub last_reported: Option<CanonicalStatus>,
}

impl EntityStateRecord {
    /// Change timestamp, with epoch standing in for "never set".
    pub fn last_change_or_epoch(&self) -> DateTime<Utc> {
        self.last_change.unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

// ─── Observations & events ────────────────────────────────────────

/// How the status fed into a cycle was obtained.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservationReason {
    /// The source answered and listed the entity.
    #[default]
    Reported,
    /// The source was unreachable; the status was synthesized as down.
    Timeout,
}

/// A status reading ready for the decider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub status: CanonicalStatus,
    pub reason: ObservationReason,
    /// Human-readable status text from the source, when it answered.
    pub description: Option<String>,
}

impl Observation {
    pub fn reported(status: CanonicalStatus, description: Option<String>) -> Self {
        Self {
            status,
            reason: ObservationReason::Reported,
            description,
        }
    }

    /// Synthetic reading for a source that did not answer.
    pub fn timeout() -> Self {
        Self {
            status: normalize(TIMEOUT_SENTINEL),
            reason: ObservationReason::Timeout,
            description: None,
        }
    }
}

/// Event emitted once per stable status transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub entity_key: String,
    pub status: CanonicalStatus,
    pub changed_at: Option<DateTime<Utc>>,
    /// Status of the previous event for this entity, `None` on the first one.
    pub previous: Option<CanonicalStatus>,
    pub reason: ObservationReason,
    pub description: Option<String>,
}

/// Decider output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Emit(StatusEvent),
}

impl Action {
    pub fn into_event(self) -> Option<StatusEvent> {
        match self {
            Self::None => None,
            Self::Emit(event) => Some(event),
        }
    }
}

// ─── Source records ───────────────────────────────────────────────

/// One row of a status source response.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayStatus {
    pub name: String,
    pub status: String,
    pub status_description: String,
}
