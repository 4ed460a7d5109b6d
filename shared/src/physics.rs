//! The deterministic movement rule engine.
//!
//! `advance` is a pure function: same player, same input, same step, same
//! geometry, same result, bit for bit. The server applies it with the
//! measured tick delta; the client applies it with the fixed nominal step for
//! prediction and replay. Any hidden state or wall-clock read here would
//! break reconciliation.

use crate::input::InputState;
use crate::player::{AttackKind, Player};
use crate::stage::{Platform, StageBounds};
use crate::{
    FRICTION, GRAVITY, JUMP_VELOCITY, PLAYER_HALF_HEIGHT, PLAYER_HALF_WIDTH, PLAYER_SPEED,
    TERMINAL_VELOCITY,
};

/// Advances one fighter by `dt` seconds under the given control state.
///
/// Rule order matters and is part of the contract: gravity, horizontal
/// control, jump, attack release/trigger, integration, platform landing,
/// boundary clamps, fall-off. Platforms are tested in declaration order and
/// the first hit wins.
pub fn advance(
    player: &Player,
    input: &InputState,
    dt: f32,
    platforms: &[Platform],
    bounds: &StageBounds,
) -> Player {
    let mut next = player.clone();

    // Gravity, capped at terminal fall speed.
    next.velocity.y += GRAVITY * dt;
    if next.velocity.y > TERMINAL_VELOCITY {
        next.velocity.y = TERMINAL_VELOCITY;
    }

    // Horizontal control. Holding both directions cancels out and decays
    // like no input at all.
    if input.left && !input.right {
        next.velocity.x = -PLAYER_SPEED;
        next.direction = -1.0;
    } else if input.right && !input.left {
        next.velocity.x = PLAYER_SPEED;
        next.direction = 1.0;
    } else {
        next.velocity.x *= FRICTION;
    }

    // Jump is gated on being grounded; the flag only clears on landing, so a
    // held key cannot re-trigger mid-air.
    if input.jump && !next.is_jumping {
        next.velocity.y = JUMP_VELOCITY;
        next.is_jumping = true;
    }

    // Release a finished attack before considering a new one.
    if next.attack.is_some() {
        next.attack_timer -= dt;
        if next.attack_timer <= 0.0 {
            next.attack = None;
            next.attack_timer = 0.0;
        }
    }
    if next.attack.is_none() {
        if input.light {
            next.attack = Some(AttackKind::Light);
            next.attack_timer = AttackKind::Light.duration();
        } else if input.heavy {
            next.attack = Some(AttackKind::Heavy);
            next.attack_timer = AttackKind::Heavy.duration();
        }
    }

    // Explicit Euler, no substeps.
    let prev_feet = player.position.y + PLAYER_HALF_HEIGHT;
    next.position.x += next.velocity.x * dt;
    next.position.y += next.velocity.y * dt;

    // Platforms are solid from above only: land if the feet crossed the
    // platform top this step while horizontally overlapping it.
    if next.velocity.y > 0.0 {
        for platform in platforms {
            let was_above = prev_feet <= platform.y;
            let is_at_level = next.position.y + PLAYER_HALF_HEIGHT >= platform.y;
            let overlaps = next.position.x + PLAYER_HALF_WIDTH > platform.x
                && next.position.x - PLAYER_HALF_WIDTH < platform.x + platform.width;
            if was_above && is_at_level && overlaps {
                next.position.y = platform.y - PLAYER_HALF_HEIGHT;
                next.velocity.y = 0.0;
                next.is_jumping = false;
                break;
            }
        }
    }

    // Side and ceiling clamps. The bottom is open: that is the kill line.
    if next.position.x < bounds.left + PLAYER_HALF_WIDTH {
        next.position.x = bounds.left + PLAYER_HALF_WIDTH;
        next.velocity.x = 0.0;
    } else if next.position.x > bounds.right - PLAYER_HALF_WIDTH {
        next.position.x = bounds.right - PLAYER_HALF_WIDTH;
        next.velocity.x = 0.0;
    }
    if next.position.y < bounds.top + PLAYER_HALF_HEIGHT {
        next.position.y = bounds.top + PLAYER_HALF_HEIGHT;
        next.velocity.y = 0.0;
    }

    // Fall-off. Stocks never go below zero; at zero the fighter is out and
    // stays wherever it fell until the room resets.
    if next.position.y > bounds.bottom && next.stocks > 0 {
        next.stocks -= 1;
        if next.stocks > 0 {
            next.position.x = (bounds.left + bounds.right) / 2.0;
            next.position.y = bounds.top + 100.0;
            next.velocity.x = 0.0;
            next.velocity.y = 0.0;
            next.damage = 0.0;
            next.is_jumping = false;
            next.attack = None;
            next.attack_timer = 0.0;
        }
    }

    next
}
