//! JSON frames exchanged over the chat transport.
//!
//! Inbound: `{"sender": .., "message": .., "type": "user" | "chat" | "system"}`.
//! Outbound: `{"message": ..}`.

use serde::{Deserialize, Serialize};

use crate::log::EventKind;

/// Close code used for every close this client initiates.
pub const NORMAL_CLOSE: u16 = 1000;

/// Sender recorded for system frames that do not name one.
pub const SYSTEM_SENDER: &str = "system";

/// Why this client closed a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// User left the group or identity went away
    Leaving,
    /// Transport is being replaced by one for a different target
    Switching,
}

impl CloseReason {
    /// Reason string sent in the close frame.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Leaving => "leaving",
            Self::Switching => "switching",
        }
    }
}

/// Frame broadcast by the chat server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundFrame {
    /// Sender display name. System announcements usually omit it.
    #[serde(default)]
    pub sender: Option<String>,
    /// Message text
    pub message: String,
    /// Frame type tag
    #[serde(rename = "type")]
    pub kind: FrameKind,
}

/// Type tag of an inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    /// Message from a group member
    User,
    /// Message from a group member, as tagged by the reference server
    Chat,
    /// Server announcement (joins, leaves)
    System,
}

impl From<FrameKind> for EventKind {
    fn from(kind: FrameKind) -> Self {
        match kind {
            FrameKind::User | FrameKind::Chat => Self::User,
            FrameKind::System => Self::System,
        }
    }
}

impl InboundFrame {
    /// Parse a text frame. Unknown types and missing fields are errors.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Sender to record, falling back to [`SYSTEM_SENDER`].
    pub fn sender_or_system(&self) -> &str {
        match self.sender.as_deref() {
            Some(sender) if !sender.is_empty() => sender,
            _ => SYSTEM_SENDER,
        }
    }
}

/// Frame sent by this client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundFrame {
    /// Message text
    pub message: String,
}

impl OutboundFrame {
    /// Serialize to the JSON text sent on the wire.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
