//! Error types shared by the core and its IO boundaries.

use thiserror::Error;

/// Failure to parse a persisted canonical status string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown canonical status: {0:?}")]
pub struct ParseStatusError(pub String);

/// Classified failure of a status source fetch.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("status source timed out")]
    Timeout,

    #[error("status source unreachable: {0}")]
    Connect(String),

    /// TLS handshake or certificate verification failed. The router answered,
    /// so this is a configuration problem rather than an outage.
    #[error("TLS failure talking to status source: {0}")]
    Tls(String),

    #[error("status source returned HTTP {status}")]
    Http { status: u16 },

    #[error("failed to decode status response: {0}")]
    Decode(String),

    #[error("status request failed: {0}")]
    Request(String),
}

impl SourceError {
    /// True when the source did not answer at all (timeout or connection
    /// failure), as opposed to answering with something unusable.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Connect(_))
    }
}

/// Persisted state could not be read or written.
#[derive(Debug, Error)]
#[error("state store unavailable: {0}")]
pub struct StoreError(pub String);

impl StoreError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self(detail.into())
    }
}

/// Hard failure of a single poll cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("entity {entity_key:?} not present in status response")]
    EntityNotFound { entity_key: String },

    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),

    #[error(transparent)]
    Source(SourceError),
}
