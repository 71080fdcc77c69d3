// src/replication/message.rs

use serde::{Deserialize, Serialize};

use crate::performer::NoteEvent;

/// Tagged messages exchanged between peers.
/// The transport adds the sender's peer id; it is never part of the body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum WireMessage {
    PerformanceUpdate {
        notes: Vec<NoteEvent>,
        /// Cumulative, not a delta.
        score: f64,
    },
    /// Actions this core doesn't consume (party bookkeeping and the like).
    #[serde(other)]
    Other,
}

impl WireMessage {
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
