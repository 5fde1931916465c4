//! Raw source vocabulary → [`CanonicalStatus`].
//!
//! OPNsense reports `none` for a healthy gateway and `down`/`force_down`
//! when it is offline. Degraded markers (`loss`, `delay`, `delay+loss`) and
//! anything else are not recognized and map to `Unknown`.

use crate::types::CanonicalStatus;

/// Raw token meaning "no active issue".
pub const UP_TOKEN: &str = "none";

/// Raw tokens meaning the gateway is offline.
pub const DOWN_TOKENS: [&str; 2] = ["down", "force_down"];

/// Raw token fed in when the source timed out.
pub const TIMEOUT_SENTINEL: &str = "down";

/// Map a raw status token onto the canonical enumeration. Total: never fails.
pub fn normalize(raw: &str) -> CanonicalStatus {
    let token = raw.trim().to_ascii_lowercase();
    if token == UP_TOKEN {
        CanonicalStatus::Up
    } else if DOWN_TOKENS.contains(&token.as_str()) {
        CanonicalStatus::Down
    } else {
        CanonicalStatus::Unknown
    }
}
