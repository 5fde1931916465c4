//! Decoding of `/api/routes/gateway/status` bodies.

use gwwatch_core::GatewayStatus;
use serde::Deserialize;

/// Current firmware wraps the gateways in `items`; older tooling treated the
/// body as a bare array. Both are accepted.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StatusResponse {
    Wrapped { items: Vec<RawGateway> },
    List(Vec<RawGateway>),
}

#[derive(Debug, Deserialize)]
struct RawGateway {
    #[serde(default)]
    name: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    status_translated: String,
}

impl From<RawGateway> for GatewayStatus {
    fn from(raw: RawGateway) -> Self {
        Self {
            name: raw.name,
            status: raw.status,
            status_description: raw.status_translated,
        }
    }
}

/// Decode a status response body into gateway rows.
pub fn decode_statuses(body: &[u8]) -> Result<Vec<GatewayStatus>, serde_json::Error> {
    let response: StatusResponse = serde_json::from_slice(body)?;
    let gateways = match response {
        StatusResponse::Wrapped { items } => items,
        StatusResponse::List(items) => items,
    };
    Ok(gateways.into_iter().map(GatewayStatus::from).collect())
}
