use serde::{Deserialize, Serialize};

use crate::UpdateKind;

/// Envelope exchanged with the live-data server: `{ "type": ..., "data": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LiveMessage {
    #[serde(rename = "type")]
    pub kind: UpdateKind,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl LiveMessage {
    pub fn new(kind: UpdateKind, data: serde_json::Value) -> Self {
        Self { kind, data }
    }

    /// Parse a text frame. Missing `data` defaults to `null`.
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
