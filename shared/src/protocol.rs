//! Wire messages exchanged between client and server.
//!
//! Everything crosses the transport as one bincode-encoded `Packet`. The
//! connection handshake assigns the transport id; all later messages are
//! keyed by the sender's address on the server side.

use crate::input::InputState;
use crate::player::Player;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Packet {
    // client -> server
    Connect {
        client_version: u32,
    },
    /// Request to join (or create) a room.
    JoinLobby {
        username: String,
    },
    /// Update the sender's character choice.
    SelectCharacter {
        character: String,
    },
    /// Update the sender's room's stage choice.
    SelectStage {
        stage: String,
    },
    /// One input sample; the sequence travels inside the input itself.
    PlayerInput {
        input: InputState,
    },
    Disconnect,

    // server -> client
    Connected {
        client_id: u32,
    },
    Disconnected {
        reason: String,
    },
    /// Full roster broadcast, sent on every lobby mutation.
    LobbyUpdate {
        room_id: u32,
        players: Vec<Player>,
        stage: String,
        stock_count: u32,
        time_limit: u32,
    },
    /// Lobby -> active transition with the starting roster.
    GameStart {
        room_id: u32,
        players: Vec<Player>,
        stage: String,
        stock_count: u32,
        time_limit: u32,
    },
    /// Per-tick authoritative snapshot.
    GameUpdate {
        players: Vec<Player>,
        timestamp: u64,
    },
    /// Another player's input, relayed to the rest of the room.
    InputRelay {
        player_id: u32,
        input: InputState,
    },
    /// Ordered standings, winner first.
    GameEnd {
        results: Vec<PlayerResult>,
    },
}

/// One row of the final standings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerResult {
    pub id: u32,
    pub username: String,
    pub character: String,
    pub stocks: u32,
    pub damage: f32,
}
