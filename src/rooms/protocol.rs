//! JSON frames exchanged over the room socket: `{"event": ..., "data": ...}`.

use serde::{Deserialize, Serialize};

use super::msg::{Message, MessageKind};
use super::presence::Role;
use super::roll::{DiceRollResult, RollRequest};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub room_id: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default, alias = "type")]
    pub kind: MessageKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    Join(JoinRequest),
    SendMessage(ChatRequest),
    SendRoll(DiceRollResult),
    RollDice(RollRequest),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    PreviousMessages(Vec<Message>),
    Message(Message),
}
