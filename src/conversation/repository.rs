use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{
    language::Language,
    room::{Message, Room},
};
use crate::error::{AppError, AppResult};

const ROOM_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ROOM_ID_LEN: usize = 7;

/// In-memory room store.
/// Rooms live as long as the process.
#[derive(Debug, Clone, Default)]
pub struct RoomRepository {
    rooms: Arc<RwLock<HashMap<String, Room>>>,
}

impl RoomRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(
        &self,
        ai1_role: String,
        ai2_role: String,
        topic: String,
        language: Language,
    ) -> Room {
        let mut rooms = self.rooms.write().await;

        let mut id = generate_room_id();
        while rooms.contains_key(&id) {
            id = generate_room_id();
        }

        let room = Room::new(id.clone(), ai1_role, ai2_role, topic, language);
        rooms.insert(id.clone(), room.clone());

        info!("🏠 Room {} created", id);
        room
    }

    pub async fn get(&self, id: &str) -> AppResult<Room> {
        self.rooms
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Room {} not found", id)))
    }

    /// Claims the room for one turn and returns a snapshot to generate from
    pub async fn begin_turn(&self, id: &str, cadence: usize) -> AppResult<(Room, RoomClaim)> {
        let mut rooms = self.rooms.write().await;
        let room = rooms
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("Room {} not found", id)))?;

        if room.generating {
            return Err(AppError::TurnInProgress(id.to_string()));
        }
        if room.requires_payment(cadence) {
            return Err(AppError::ContinuationRequired(id.to_string()));
        }

        room.generating = true;
        Ok((room.clone(), RoomClaim::new(self.clone(), id, ClaimKind::Turn)))
    }

    pub async fn finish_turn(&self, claim: RoomClaim, messages: Vec<Message>) -> AppResult<Room> {
        let mut rooms = self.rooms.write().await;
        let room = rooms
            .get_mut(&claim.id)
            .ok_or_else(|| AppError::NotFound(format!("Room {} not found", claim.id)))?;

        room.messages.extend(messages);
        room.generating = false;
        claim.disarm();

        debug!("Room {} now has {} messages", room.id, room.messages.len());
        Ok(room.clone())
    }

    /// Reserves the room's due continuation for one payment. A second
    /// payment for the same due point is refused until this claim is
    /// released.
    pub async fn claim_continuation(&self, id: &str, cadence: usize) -> AppResult<RoomClaim> {
        let mut rooms = self.rooms.write().await;
        let room = rooms
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("Room {} not found", id)))?;

        if !room.requires_payment(cadence) {
            return Err(AppError::ContinuationNotRequired(id.to_string()));
        }
        if room.continuation_claimed {
            return Err(AppError::ContinuationInProgress(id.to_string()));
        }

        room.continuation_claimed = true;
        Ok(RoomClaim::new(self.clone(), id, ClaimKind::Continuation))
    }

    /// Spends a continuation claim once its payment is redeemed
    pub async fn unlock_continuation(&self, claim: RoomClaim) -> AppResult<()> {
        let mut rooms = self.rooms.write().await;
        let room = rooms
            .get_mut(&claim.id)
            .ok_or_else(|| AppError::NotFound(format!("Room {} not found", claim.id)))?;

        room.unlock_continuation();
        claim.disarm();

        info!("🔓 Room {} unlocked at {} messages", room.id, room.messages.len());
        Ok(())
    }

    fn release(&self, id: &str, kind: ClaimKind) {
        match self.rooms.try_write() {
            Ok(mut rooms) => {
                if let Some(room) = rooms.get_mut(id) {
                    kind.clear(room);
                }
            }
            Err(_) => {
                // Lock busy; clear from a task once it frees up
                let rooms = self.rooms.clone();
                let id = id.to_string();
                if let Ok(handle) = tokio::runtime::Handle::try_current() {
                    handle.spawn(async move {
                        if let Some(room) = rooms.write().await.get_mut(&id) {
                            kind.clear(room);
                        }
                    });
                }
            }
        }
        debug!("Released {:?} claim on room {}", kind, id);
    }
}

#[derive(Debug, Clone, Copy)]
enum ClaimKind {
    Turn,
    Continuation,
}

impl ClaimKind {
    fn clear(self, room: &mut Room) {
        match self {
            ClaimKind::Turn => room.generating = false,
            ClaimKind::Continuation => room.continuation_claimed = false,
        }
    }
}

/// An exclusive hold on part of a room: its next turn or its due
/// continuation. Released on drop unless it was spent by
/// [`RoomRepository::finish_turn`] or [`RoomRepository::unlock_continuation`],
/// so a failed or abandoned request never leaves the room locked.
#[must_use]
pub struct RoomClaim {
    rooms: RoomRepository,
    id: String,
    kind: ClaimKind,
    armed: bool,
}

impl RoomClaim {
    fn new(rooms: RoomRepository, id: &str, kind: ClaimKind) -> Self {
        Self {
            rooms,
            id: id.to_string(),
            kind,
            armed: true,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.id
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for RoomClaim {
    fn drop(&mut self) {
        if self.armed {
            self.rooms.release(&self.id, self.kind);
        }
    }
}

fn generate_room_id() -> String {
    let mut rng = rand::rng();
    (0..ROOM_ID_LEN)
        .map(|_| ROOM_ID_ALPHABET[rng.random_range(0..ROOM_ID_ALPHABET.len())] as char)
        .collect()
}
