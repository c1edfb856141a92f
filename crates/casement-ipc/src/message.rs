//! Message types crossing the process boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message queued for delivery. The payload is an owned copy of the
/// sender's arguments; nothing is shared by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpcMessage {
    pub channel: String,
    pub sender_id: u32,
    pub payload: Vec<Value>,
}

impl IpcMessage {
    pub fn new(sender_id: u32, channel: impl Into<String>, payload: Vec<Value>) -> Self {
        Self {
            channel: channel.into(),
            sender_id,
            payload,
        }
    }

    pub fn event(&self) -> IpcEvent {
        IpcEvent {
            sender_id: self.sender_id,
            channel: self.channel.clone(),
        }
    }
}

/// Metadata handed to every listener alongside the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpcEvent {
    pub sender_id: u32,
    pub channel: String,
}
