// SPDX-License-Identifier: MIT

//! Event stream message schema.
//!
//! Serializes with externally-tagged `{"message_type": "..."}` JSON so a
//! reader can branch on the discriminant without buffering the payload.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

crate::define_id! {
    /// Identifier for a pending approval request.
    pub struct ApprovalId("apr-");
}

/// A single result map produced by a completed action.
pub type ResultMap = HashMap<String, String>;

/// Ordered, append-only message carried by the stream logger for one
/// exec-id. Never rewritten once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "message_type", rename_all = "snake_case")]
pub enum StreamMessage {
    Log { action_id: String, bytes: Vec<u8> },
    Result { action_id: String, value: ResultMap },
    Error { action_id: String, text: String },
    Approval { action_id: String, approval_id: ApprovalId },
    Cancelled { action_id: String, text: String },
    /// Terminal marker written once by `Close(closeID)`; no
    /// further records follow it for the exec-id.
    Closed { action_id: String },
}

impl StreamMessage {
    pub fn action_id(&self) -> &str {
        match self {
            StreamMessage::Log { action_id, .. }
            | StreamMessage::Result { action_id, .. }
            | StreamMessage::Error { action_id, .. }
            | StreamMessage::Approval { action_id, .. }
            | StreamMessage::Cancelled { action_id, .. }
            | StreamMessage::Closed { action_id, .. } => action_id,
        }
    }

    pub fn is_result(&self) -> bool {
        matches!(self, StreamMessage::Result { .. })
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
