//! Fighter state and the value types it is built from.

use crate::character::DEFAULT_CHARACTER;
use crate::input::InputState;
use serde::{Deserialize, Serialize};

/// A point or direction in 2D screen space. Positive y points down.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Vec2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// The two attack moves a fighter can throw.
///
/// All balance numbers live here so hit detection, knockback and the attack
/// release timer read from one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackKind {
    Light,
    Heavy,
}

impl AttackKind {
    /// Circular hit range measured between fighter centers.
    pub fn range(self) -> f32 {
        match self {
            AttackKind::Light => 60.0,
            AttackKind::Heavy => 100.0,
        }
    }

    /// Damage percentage added to the defender on hit.
    pub fn damage(self) -> f32 {
        match self {
            AttackKind::Light => 5.0,
            AttackKind::Heavy => 15.0,
        }
    }

    /// Horizontal knockback base force.
    pub fn knockback_force(self) -> f32 {
        match self {
            AttackKind::Light => 200.0,
            AttackKind::Heavy => 500.0,
        }
    }

    /// How long the attack stays out before it auto-releases, in seconds.
    pub fn duration(self) -> f32 {
        match self {
            AttackKind::Light => 0.2,
            AttackKind::Heavy => 0.5,
        }
    }
}

/// One connected fighter.
///
/// `position` is the hitbox center; the half-extents in the crate root turn
/// it into feet/edges where collision needs them. The attack pair
/// (`attack`, `attack_timer`) is explicit per-tick state so the simulation
/// can release attacks without scheduling anything outside the tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: u32,
    pub username: String,
    pub character: String,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Facing: +1.0 is right, -1.0 is left.
    pub direction: f32,
    /// Accumulated damage percentage. Unbounded above, reset on respawn.
    pub damage: f32,
    /// Remaining lives. Zero means the fighter is out until the room resets.
    pub stocks: u32,
    pub is_jumping: bool,
    pub attack: Option<AttackKind>,
    /// Seconds until the current attack releases.
    pub attack_timer: f32,
    /// Most recent input vector received from this player.
    pub last_input: InputState,
    /// Highest input sequence the authoritative simulation has consumed.
    pub last_processed_input: u32,
}

impl Player {
    pub fn new(id: u32, username: &str, stocks: u32, spawn: Vec2) -> Self {
        Self {
            id,
            username: username.to_string(),
            character: DEFAULT_CHARACTER.to_string(),
            position: spawn,
            velocity: Vec2::zero(),
            direction: 1.0,
            damage: 0.0,
            stocks,
            is_jumping: false,
            attack: None,
            attack_timer: 0.0,
            last_input: InputState::default(),
            last_processed_input: 0,
        }
    }

    pub fn is_attacking(&self) -> bool {
        self.attack.is_some()
    }

    /// A fighter with no stocks left takes no further part in the match.
    pub fn is_out(&self) -> bool {
        self.stocks == 0
    }
}
