//! One authoritative match room: roster, lifecycle and standings.

use shared::{stage_or_default, Player, PlayerResult, DEFAULT_STAGE};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Where a room is in its lifecycle.
///
/// `Lobby -> Countdown -> Active -> Ended`, then back to `Lobby` after the
/// reset cooldown, or gone entirely if nobody stayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    Lobby,
    Countdown,
    Active,
    Ended,
}

/// Tunables applied to every new room.
#[derive(Debug, Clone, Copy)]
pub struct RoomConfig {
    pub max_players: usize,
    pub stock_count: u32,
    /// Match length in seconds.
    pub time_limit: u32,
    /// Seconds between arming a start and the match going live.
    pub countdown: f32,
    /// Seconds between the standings broadcast and the lobby reset.
    pub reset_delay: f32,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_players: 4,
            stock_count: 3,
            time_limit: 180,
            countdown: 3.0,
            reset_delay: 10.0,
        }
    }
}

/// One isolated match instance.
///
/// The roster is a `BTreeMap` keyed by connection id: ids are handed out
/// monotonically, so key order is join order (the first key is the host) and
/// every per-tick iteration is deterministic.
pub struct Room {
    pub id: u32,
    pub players: BTreeMap<u32, Player>,
    pub stage: String,
    pub phase: RoomPhase,
    /// Simulated seconds since the current match went live.
    pub elapsed: f32,
    /// Seconds left before an armed match starts.
    pub countdown: f32,
    /// Seconds left before an ended match resets or the room is destroyed.
    pub reset_cooldown: f32,
    pub config: RoomConfig,
}

impl Room {
    pub fn new(id: u32, config: RoomConfig) -> Self {
        Self {
            id,
            players: BTreeMap::new(),
            stage: DEFAULT_STAGE.to_string(),
            phase: RoomPhase::Lobby,
            elapsed: 0.0,
            countdown: 0.0,
            reset_cooldown: 0.0,
            config,
        }
    }

    /// A room accepts new players while it is not mid-match and has a seat.
    pub fn is_open(&self) -> bool {
        self.phase != RoomPhase::Active && self.players.len() < self.config.max_players
    }

    /// Inserts a freshly spawned player at the next stage spawn slot.
    pub fn add_player(&mut self, conn_id: u32, username: &str) {
        let stage = stage_or_default(&self.stage);
        let spawn = stage.spawn_slot(self.players.len());
        let player = Player::new(conn_id, username, self.config.stock_count, spawn);
        self.players.insert(conn_id, player);
    }

    pub fn remove_player(&mut self, conn_id: u32) -> Option<Player> {
        self.players.remove(&conn_id)
    }

    /// First joiner still present.
    pub fn host(&self) -> Option<u32> {
        self.players.keys().next().copied()
    }

    /// Players still holding at least one stock.
    pub fn alive_count(&self) -> usize {
        self.players.values().filter(|p| !p.is_out()).count()
    }

    pub fn arm_countdown(&mut self) {
        self.phase = RoomPhase::Countdown;
        self.countdown = self.config.countdown;
    }

    /// Moves everyone to their starting slots with full stocks and flips the
    /// room live.
    pub fn start_match(&mut self) {
        let stage = stage_or_default(&self.stage);
        for (index, player) in self.players.values_mut().enumerate() {
            player.position = stage.spawn_slot(index);
            player.velocity = shared::Vec2::zero();
            player.damage = 0.0;
            player.stocks = self.config.stock_count;
            player.is_jumping = false;
            player.attack = None;
            player.attack_timer = 0.0;
        }
        self.phase = RoomPhase::Active;
        self.elapsed = 0.0;
    }

    /// Flips the room into its post-match cooldown.
    pub fn end_match(&mut self) {
        self.phase = RoomPhase::Ended;
        self.reset_cooldown = self.config.reset_delay;
    }

    /// Returns the roster to a playable lobby state after a match.
    pub fn reset_to_lobby(&mut self) {
        let stage = stage_or_default(&self.stage);
        for (index, player) in self.players.values_mut().enumerate() {
            player.position = stage.spawn_slot(index);
            player.velocity = shared::Vec2::zero();
            player.damage = 0.0;
            player.stocks = self.config.stock_count;
            player.is_jumping = false;
            player.attack = None;
            player.attack_timer = 0.0;
        }
        self.phase = RoomPhase::Lobby;
        self.elapsed = 0.0;
    }

    /// Final standings: stocks descending, damage ascending on ties. The
    /// sort is stable, so equal rows keep join order.
    pub fn standings(&self) -> Vec<PlayerResult> {
        let mut results: Vec<PlayerResult> = self
            .players
            .values()
            .map(|p| PlayerResult {
                id: p.id,
                username: p.username.clone(),
                character: p.character.clone(),
                stocks: p.stocks,
                damage: p.damage,
            })
            .collect();
        results.sort_by(|a, b| {
            b.stocks.cmp(&a.stocks).then_with(|| {
                a.damage.partial_cmp(&b.damage).unwrap_or(Ordering::Equal)
            })
        });
        results
    }
}
