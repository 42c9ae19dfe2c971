//! Who is connected, under which name, in which room.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ConnectionId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Master,
    #[default]
    Player,
}

/// The identity a connection adopts on join. Replaced wholesale on rejoin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub display_name: String,
    pub room_id: String,
    pub role: Role,
}

#[derive(Default)]
pub struct PresenceRegistry {
    identities: RwLock<HashMap<ConnectionId, SessionIdentity>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates `connection_id` with `identity`, returning the identity it replaced.
    pub fn register(&self, connection_id: ConnectionId, identity: SessionIdentity) -> Option<SessionIdentity> {
        self.identities.write().insert(connection_id, identity)
    }

    pub fn lookup(&self, connection_id: ConnectionId) -> Option<SessionIdentity> {
        self.identities.read().get(&connection_id).cloned()
    }

    pub fn remove(&self, connection_id: ConnectionId) -> Option<SessionIdentity> {
        self.identities.write().remove(&connection_id)
    }

    pub fn members_of(&self, room_id: &str) -> Vec<ConnectionId> {
        self.identities
            .read()
            .iter()
            .filter(|(_, identity)| identity.room_id == room_id)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.identities.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
