//! The live table: players and the master share a room's chat, rolls and history.

mod msg;
mod presence;
mod protocol;
mod relay;
mod roll;
mod store;
mod ws;

use axum::{Router, routing::get};

use crate::AppState;

pub use msg::{Message, MessageKind, SYSTEM_SENDER};
pub use presence::{ConnectionId, PresenceRegistry, Role, SessionIdentity};
pub use protocol::{ChatRequest, ClientEvent, JoinRequest, ServerEvent};
pub use relay::{Outbound, Relay};
pub use roll::{DiceRollResult, MAX_DICE_PER_ROLL, RollRequest};
pub use store::MessageStore;

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(ws::room_ws))
}
