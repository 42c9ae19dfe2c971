use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Sender shown on join/leave notices.
pub const SYSTEM_SENDER: &str = "System";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    #[serde(rename = "message")]
    Chat,
    Roll,
    System,
}

/// One entry of a room's history. Never mutated once it has been appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(rename = "type")]
    pub kind: MessageKind,
}

impl Message {
    pub fn new(sender: impl Into<String>, content: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            sender: sender.into(),
            content: content.into(),
            timestamp: OffsetDateTime::now_utc(),
            kind,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(SYSTEM_SENDER, content, MessageKind::System)
    }

    pub fn entered(display_name: &str) -> Self {
        Self::system(format!("{display_name} entered the room"))
    }

    pub fn left(display_name: &str) -> Self {
        Self::system(format!("{display_name} left the room"))
    }
}
