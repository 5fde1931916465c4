//! gwwatch-source-opnsense: OPNsense gateway status over HTTP.
//! Pure IO boundary: fetches and classifies, no debounce logic.

pub mod client;
pub mod response;

pub use client::{DEFAULT_TIMEOUT_MS, OpnsenseClient, OpnsenseConfig, normalize_router_url};
pub use response::decode_statuses;
