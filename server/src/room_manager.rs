//! Room assignment and the per-connection operations on room state.
//!
//! Every operation is keyed by connection id. A direct connection -> room
//! index is maintained on join and leave, so the hot paths (input, leave)
//! never scan the room table.

use crate::room::{Room, RoomConfig, RoomPhase};
use log::info;
use shared::{character_or_default, stages, InputState, PlayerResult};
use std::collections::{BTreeMap, HashMap};

/// What a `leave` did, so the caller knows what to broadcast.
#[derive(Debug)]
pub struct LeaveOutcome {
    pub room_id: u32,
    /// The room was deleted because the leaver was its last player.
    pub room_deleted: bool,
    /// Standings of a match that was force-ended by the departure.
    pub results: Option<Vec<PlayerResult>>,
}

/// Owns every room and the player -> room index.
pub struct RoomManager {
    rooms: BTreeMap<u32, Room>,
    player_rooms: HashMap<u32, u32>,
    next_room_id: u32,
    config: RoomConfig,
}

impl RoomManager {
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: BTreeMap::new(),
            player_rooms: HashMap::new(),
            next_room_id: 1,
            config,
        }
    }

    /// Places a player in the lowest-id open room, creating one when every
    /// room is full or mid-match. Arms the start countdown once a second
    /// player is seated.
    pub fn join_lobby(&mut self, conn_id: u32, username: &str) -> u32 {
        // A connection can only ever sit in one room.
        if self.player_rooms.contains_key(&conn_id) {
            self.leave(conn_id);
        }

        let room_id = match self.rooms.values().find(|r| r.is_open()).map(|r| r.id) {
            Some(id) => id,
            None => {
                let id = self.next_room_id;
                self.next_room_id += 1;
                self.rooms.insert(id, Room::new(id, self.config));
                info!("Opened room {}", id);
                id
            }
        };

        if let Some(room) = self.rooms.get_mut(&room_id) {
            room.add_player(conn_id, username);
            self.player_rooms.insert(conn_id, room_id);
            info!("{} joined room {} ({} seated)", username, room_id, room.players.len());
            if room.players.len() >= 2 && room.phase == RoomPhase::Lobby {
                room.arm_countdown();
            }
        }
        room_id
    }

    /// Updates the requester's character choice; unknown ids become the
    /// default character. Returns the room to rebroadcast, or `None` when the
    /// connection is not seated anywhere.
    pub fn select_character(&mut self, conn_id: u32, character: &str) -> Option<u32> {
        let room_id = *self.player_rooms.get(&conn_id)?;
        let room = self.rooms.get_mut(&room_id)?;
        let player = room.players.get_mut(&conn_id)?;
        player.character = character_or_default(character).id;
        Some(room_id)
    }

    /// Updates the requester's room's stage choice; unknown ids are ignored
    /// in favor of the current selection.
    pub fn select_stage(&mut self, conn_id: u32, stage: &str) -> Option<u32> {
        let room_id = *self.player_rooms.get(&conn_id)?;
        let room = self.rooms.get_mut(&room_id)?;
        if stages().iter().any(|s| s.id == stage) {
            room.stage = stage.to_string();
        }
        Some(room_id)
    }

    /// Stores a player's control state for the next simulation ticks and
    /// acknowledges the sequence. Stale sequences (UDP reordering) are
    /// dropped so the ack never regresses.
    pub fn submit_input(&mut self, conn_id: u32, input: InputState) -> Option<u32> {
        let room_id = *self.player_rooms.get(&conn_id)?;
        let room = self.rooms.get_mut(&room_id)?;
        let player = room.players.get_mut(&conn_id)?;
        if input.sequence <= player.last_processed_input {
            return None;
        }
        player.last_processed_input = input.sequence;
        player.last_input = input;
        Some(room_id)
    }

    /// Removes a player from their room. Deletes the room when it empties;
    /// force-ends the match when an active room drops to a single player.
    pub fn leave(&mut self, conn_id: u32) -> Option<LeaveOutcome> {
        let room_id = self.player_rooms.remove(&conn_id)?;
        let room = self.rooms.get_mut(&room_id)?;
        room.remove_player(conn_id)?;

        if room.players.is_empty() {
            self.rooms.remove(&room_id);
            info!("Room {} closed (empty)", room_id);
            return Some(LeaveOutcome {
                room_id,
                room_deleted: true,
                results: None,
            });
        }

        let results = if room.phase == RoomPhase::Active && room.players.len() == 1 {
            room.end_match();
            info!("Room {} ended early: one player left standing", room_id);
            Some(room.standings())
        } else {
            None
        };

        Some(LeaveOutcome {
            room_id,
            room_deleted: false,
            results,
        })
    }

    pub fn room(&self, room_id: u32) -> Option<&Room> {
        self.rooms.get(&room_id)
    }

    pub fn room_mut(&mut self, room_id: u32) -> Option<&mut Room> {
        self.rooms.get_mut(&room_id)
    }

    pub fn room_of(&self, conn_id: u32) -> Option<u32> {
        self.player_rooms.get(&conn_id).copied()
    }

    pub fn room_ids(&self) -> Vec<u32> {
        self.rooms.keys().copied().collect()
    }

    /// Drops a room and its index entries (post-match cooldown on an empty
    /// room).
    pub fn remove_room(&mut self, room_id: u32) {
        if let Some(room) = self.rooms.remove(&room_id) {
            for conn_id in room.players.keys() {
                self.player_rooms.remove(conn_id);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
