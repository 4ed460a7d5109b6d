//! Client-side prediction and server reconciliation.

use log::debug;
use shared::{advance, resolve_all, stage_or_default, InputState, Player, Stage, NOMINAL_DT};
use std::collections::BTreeMap;

/// The client's view of the match: authoritative remote fighters plus a
/// predicted local one.
///
/// All state here is owned value data. Snapshots replace entries wholesale;
/// nothing aliases server-delivered players.
pub struct ClientEngine {
    pub players: BTreeMap<u32, Player>,
    pub local_id: Option<u32>,
    pub stage: Stage,
    /// Inputs applied locally but not yet acknowledged by the server.
    pending_inputs: Vec<InputState>,
    /// Whether the per-frame prediction loop is live. Stopping and restarting
    /// leaves no queued work behind.
    pub running: bool,
}

impl ClientEngine {
    pub fn new() -> Self {
        Self {
            players: BTreeMap::new(),
            local_id: None,
            stage: stage_or_default(shared::DEFAULT_STAGE),
            pending_inputs: Vec::new(),
            running: false,
        }
    }

    /// Replaces the whole roster from a lobby or start broadcast.
    pub fn load_roster(&mut self, players: Vec<Player>, stage: &str) {
        self.stage = stage_or_default(stage);
        self.players = players.into_iter().map(|p| (p.id, p)).collect();
    }

    /// Starts the prediction loop with a clean replay queue.
    pub fn start(&mut self) {
        self.pending_inputs.clear();
        self.running = true;
    }

    /// Stops the prediction loop; the roster keeps its last state for
    /// rendering.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Applies one freshly captured input to the local fighter and records it
    /// for replay. Uses the fixed nominal step so replaying later gives the
    /// same trajectory.
    pub fn predict(&mut self, input: &InputState) {
        if !self.running {
            return;
        }
        let Some(local_id) = self.local_id else { return };
        let Some(player) = self.players.get(&local_id) else {
            return;
        };

        let next = advance(
            player,
            input,
            NOMINAL_DT,
            &self.stage.platforms,
            &self.stage.bounds,
        );
        self.players.insert(local_id, next);
        self.pending_inputs.push(input.clone());

        // Optimistic hit feedback on the local view; the server's combat
        // resolution overrides this on the next snapshot.
        resolve_all(&mut self.players);
    }

    /// Applies an authoritative snapshot.
    ///
    /// Remote fighters are replaced outright. The local fighter adopts the
    /// server's position/stocks/damage, drops every input the server already
    /// consumed, and replays the remainder in order. Replaying the same queue
    /// from the same base always lands on the same state.
    pub fn apply_snapshot(&mut self, players: Vec<Player>) {
        for server_player in players {
            if Some(server_player.id) != self.local_id {
                self.players.insert(server_player.id, server_player);
                continue;
            }

            let acked = server_player.last_processed_input;
            let base = match self.players.get(&server_player.id) {
                Some(local) => {
                    let mut base = local.clone();
                    base.position = server_player.position;
                    base.stocks = server_player.stocks;
                    base.damage = server_player.damage;
                    base.last_processed_input = acked;
                    base
                }
                None => server_player.clone(),
            };

            self.pending_inputs.retain(|input| input.sequence > acked);
            if !self.pending_inputs.is_empty() {
                debug!(
                    "Replaying {} unacknowledged inputs after snapshot",
                    self.pending_inputs.len()
                );
            }

            let mut replayed = base;
            for input in &self.pending_inputs {
                replayed = advance(
                    &replayed,
                    input,
                    NOMINAL_DT,
                    &self.stage.platforms,
                    &self.stage.bounds,
                );
            }
            self.players.insert(server_player.id, replayed);
        }
    }

    /// Records a relayed peer input on the remote fighter (facing feedback
    /// between snapshots; the simulation never runs on it here).
    pub fn note_remote_input(&mut self, player_id: u32, input: InputState) {
        if Some(player_id) == self.local_id {
            return;
        }
        if let Some(player) = self.players.get_mut(&player_id) {
            player.last_input = input;
        }
    }

    pub fn local_player(&self) -> Option<&Player> {
        self.local_id.and_then(|id| self.players.get(&id))
    }

    /// Fighters in draw order (stable roster order).
    pub fn render_players(&self) -> Vec<&Player> {
        self.players.values().collect()
    }

    #[cfg(test)]
    fn pending_len(&self) -> usize {
        self.pending_inputs.len()
    }
}

impl Default for ClientEngine {
    fn default() -> Self {
        Self::new()
    }
}
