use plaza_core::Zone;
use plaza_engine::ClickPoint;
use serde::{Deserialize, Serialize};

/// Body of `POST /game/zone_click`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneClickRequest {
    /// Zone wire name: "HOUSING", "GREEN" or "MOBILITY".
    pub zone: String,
    /// Where on the display the click landed, if the client knows.
    #[serde(default)]
    pub click: Option<ClickPoint>,
}

/// Inbound WebSocket frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    ZoneClick(ZoneClickRequest),
    /// Full observation set. Kept as raw JSON so a bad list is reported the
    /// same way as on the HTTP route.
    People { people: serde_json::Value },
}

/// Reply to an inbound request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayResponse {
    pub ok: bool,
    /// Zone credited with a manual vote.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<Zone>,
    /// Number of people in an accepted observation set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GatewayResponse {
    pub fn voted(zone: Zone) -> Self {
        Self {
            ok: true,
            zone: Some(zone),
            accepted: None,
            error: None,
        }
    }

    pub fn accepted(count: usize) -> Self {
        Self {
            ok: true,
            zone: None,
            accepted: Some(count),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            zone: None,
            accepted: None,
            error: Some(message.into()),
        }
    }
}
