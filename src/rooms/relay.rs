//! The live session relay: joins, chat, rolls and leave notices fanned out per room.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use super::msg::{Message, MessageKind};
use super::presence::{ConnectionId, PresenceRegistry, SessionIdentity};
use super::protocol::{ChatRequest, ClientEvent, JoinRequest, ServerEvent};
use super::roll::{DiceRollResult, RollRequest};
use super::store::MessageStore;

/// Frames queued for one connection, drained by its socket task.
pub type Outbound = mpsc::UnboundedReceiver<ServerEvent>;

/// Shared room state for every live connection.
///
/// Each room has its own turn lock. Everything that appends to a room's
/// history (join notice, chat, roll, leave notice) holds that lock across
/// "build message, append, fan out", and a join also takes its history
/// snapshot under it. Members of a room therefore all see one order, and a
/// joiner's replayed history ends exactly where its live stream begins.
/// Different rooms never wait on each other.
///
/// A rejoin into another room only takes the new room's turn, so a message
/// published concurrently in the old room may still reach the connection
/// after the new room's `previousMessages`.
#[derive(Default)]
pub struct Relay {
    presence: PresenceRegistry,
    store: MessageStore,
    outbound: RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>>,
    turns: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl Relay {
    pub fn new(presence: PresenceRegistry, store: MessageStore) -> Self {
        Self {
            presence,
            store,
            outbound: RwLock::default(),
            turns: RwLock::default(),
        }
    }

    pub fn presence(&self) -> &PresenceRegistry {
        &self.presence
    }

    pub fn history(&self, room_id: &str) -> Vec<Message> {
        self.store.history(room_id)
    }

    /// Opens a new, not yet joined connection.
    pub fn connect(&self) -> (ConnectionId, Outbound) {
        let connection_id = Uuid::now_v7();
        let (tx, rx) = mpsc::unbounded_channel();
        self.outbound.write().insert(connection_id, tx);
        debug!(%connection_id, "connection opened");
        (connection_id, rx)
    }

    pub fn handle(&self, connection_id: ConnectionId, event: ClientEvent) {
        match event {
            ClientEvent::Join(request) => self.join(connection_id, request),
            ClientEvent::SendMessage(ChatRequest { content, kind }) => self.send_message(connection_id, content, kind),
            ClientEvent::SendRoll(roll) => self.send_roll(connection_id, roll),
            ClientEvent::RollDice(request) => self.roll_dice(connection_id, request),
        }
    }

    pub fn join(&self, connection_id: ConnectionId, JoinRequest { display_name, room_id, role }: JoinRequest) {
        if !self.outbound.read().contains_key(&connection_id) {
            debug!(%connection_id, "join on closed connection dropped");
            return;
        }
        if display_name.is_empty() || room_id.is_empty() {
            debug!(%connection_id, %display_name, %room_id, "join with empty name or room");
        }

        let turn = self.turn(&room_id);
        let _turn = turn.lock();

        let identity = SessionIdentity { display_name, room_id, role };
        let notice = Message::entered(&identity.display_name);
        let room_id = identity.room_id.clone();
        if let Some(previous) = self.presence.register(connection_id, identity) {
            debug!(%connection_id, previous_room = %previous.room_id, "rejoin replaced identity");
        }

        self.store.ensure_room(&room_id);
        self.deliver(connection_id, ServerEvent::PreviousMessages(self.store.history(&room_id)));
        info!(%connection_id, %room_id, ?role, "{}", notice.content);
        self.publish(&room_id, notice);
    }

    pub fn send_message(&self, connection_id: ConnectionId, content: String, kind: MessageKind) {
        let Some(identity) = self.presence.lookup(connection_id) else {
            debug!(%connection_id, "message from unjoined connection dropped");
            return;
        };
        if content.trim().is_empty() {
            debug!(%connection_id, "empty message dropped");
            return;
        }
        let kind = match kind {
            MessageKind::System => MessageKind::Chat,
            kind => kind,
        };

        let turn = self.turn(&identity.room_id);
        let _turn = turn.lock();
        self.publish(&identity.room_id, Message::new(identity.display_name, content, kind));
    }

    pub fn send_roll(&self, connection_id: ConnectionId, roll: DiceRollResult) {
        let Some(identity) = self.presence.lookup(connection_id) else {
            debug!(%connection_id, "roll from unjoined connection dropped");
            return;
        };
        if !roll.is_well_formed() {
            debug!(%connection_id, ?roll, "malformed roll dropped");
            return;
        }

        let turn = self.turn(&identity.room_id);
        let _turn = turn.lock();
        self.publish(&identity.room_id, Message::new(identity.display_name, roll.format(), MessageKind::Roll));
    }

    /// Rolls on the server, then relays the result like [`send_roll`](Self::send_roll).
    pub fn roll_dice(&self, connection_id: ConnectionId, request: RollRequest) {
        if self.presence.lookup(connection_id).is_none() {
            debug!(%connection_id, "roll request from unjoined connection dropped");
            return;
        }
        let Some(roll) = DiceRollResult::roll(&mut rand::rng(), request) else {
            debug!(%connection_id, "roll total out of range dropped");
            return;
        };
        self.send_roll(connection_id, roll);
    }

    /// Closes the connection. Joined connections leave a notice in their room.
    pub fn disconnect(&self, connection_id: ConnectionId) {
        let _ = self.outbound.write().remove(&connection_id);

        let Some(identity) = self.presence.remove(connection_id) else {
            debug!(%connection_id, "connection closed before joining");
            return;
        };

        let turn = self.turn(&identity.room_id);
        let _turn = turn.lock();
        let notice = Message::left(&identity.display_name);
        info!(%connection_id, room_id = %identity.room_id, "{}", notice.content);
        self.publish(&identity.room_id, notice);
    }

    fn turn(&self, room_id: &str) -> Arc<Mutex<()>> {
        if let Some(turn) = self.turns.read().get(room_id) {
            return Arc::clone(turn);
        }
        Arc::clone(self.turns.write().entry(room_id.to_owned()).or_default())
    }

    /// Appends and fans out. Caller holds the room's turn.
    fn publish(&self, room_id: &str, message: Message) {
        self.store.append(room_id, message.clone());

        let members = self.presence.members_of(room_id);
        debug!(room_id, recipients = members.len(), kind = ?message.kind, "broadcast message");
        for member in members {
            self.deliver(member, ServerEvent::Message(message.clone()));
        }
    }

    fn deliver(&self, connection_id: ConnectionId, event: ServerEvent) {
        let outbound = self.outbound.read();
        let Some(tx) = outbound.get(&connection_id) else {
            return;
        };
        if tx.send(event).is_err() {
            debug!(%connection_id, "outbound queue closed");
        }
    }
}
