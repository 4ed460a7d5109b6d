//! The authoritative per-tick room update.
//!
//! One shared timer drives every room; `step` runs a single room forward by
//! the measured delta and reports what the transport layer should broadcast.
//! All deferred effects (start countdown, post-match reset) are explicit
//! countdowns stepped here, so nothing can fire against a room that no
//! longer exists.

use crate::room::{Room, RoomPhase};
use log::{debug, info};
use shared::{advance, resolve_all, stage_or_default, PlayerResult};

/// What a tick did to a room. The network layer turns these into packets.
#[derive(Debug, Clone, PartialEq)]
pub enum StepEvent {
    /// Countdown finished; the match went live.
    Started,
    /// One authoritative snapshot should go out.
    Snapshot,
    /// The match finished with the given standings.
    Ended(Vec<PlayerResult>),
    /// Post-match cooldown expired with players still seated.
    BackToLobby,
    /// Post-match cooldown expired on an empty room; destroy it.
    Destroy,
}

/// Advances one room by `dt` seconds.
pub fn step(room: &mut Room, dt: f32) -> Vec<StepEvent> {
    let mut events = Vec::new();
    match room.phase {
        RoomPhase::Lobby => {}
        RoomPhase::Countdown => {
            room.countdown -= dt;
            if room.countdown <= 0.0 {
                // Re-check the roster at fire time; joins and leaves may have
                // happened while the countdown ran.
                if room.players.len() >= 2 {
                    room.start_match();
                    info!("Room {} match started ({} players)", room.id, room.players.len());
                    events.push(StepEvent::Started);
                } else {
                    debug!("Room {} countdown cancelled, roster too small", room.id);
                    room.phase = RoomPhase::Lobby;
                }
            }
        }
        RoomPhase::Active => step_active(room, dt, &mut events),
        RoomPhase::Ended => {
            room.reset_cooldown -= dt;
            if room.reset_cooldown <= 0.0 {
                if room.players.is_empty() {
                    events.push(StepEvent::Destroy);
                } else {
                    room.reset_to_lobby();
                    if room.players.len() >= 2 {
                        room.arm_countdown();
                    }
                    info!("Room {} reset for a rematch", room.id);
                    events.push(StepEvent::BackToLobby);
                }
            }
        }
    }
    events
}

fn step_active(room: &mut Room, dt: f32, events: &mut Vec<StepEvent>) {
    let stage = stage_or_default(&room.stage);

    // Physics over every fighter still holding stocks, driven by the control
    // state stored on the player.
    let ids: Vec<u32> = room.players.keys().copied().collect();
    for id in ids {
        let Some(player) = room.players.get(&id) else { continue };
        if player.is_out() {
            continue;
        }
        let input = player.last_input.clone();
        let next = advance(player, &input, dt, &stage.platforms, &stage.bounds);
        room.players.insert(id, next);
    }

    resolve_all(&mut room.players);
    room.elapsed += dt;

    events.push(StepEvent::Snapshot);

    let time_up = room.elapsed >= room.config.time_limit as f32;
    let stocks_exhausted = room.players.len() > 1 && room.alive_count() <= 1;
    if time_up || stocks_exhausted {
        let results = room.standings();
        room.end_match();
        info!(
            "Room {} match over ({}), winner: {}",
            room.id,
            if time_up { "time limit" } else { "stocks" },
            results.first().map(|r| r.username.as_str()).unwrap_or("-"),
        );
        events.push(StepEvent::Ended(results));
    }
}
