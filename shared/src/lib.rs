//! Game rules and wire types shared by the client and the server.
//!
//! The physics and combat functions in this crate are the single source of
//! truth for how a fighter moves and takes hits. The server runs them
//! authoritatively; the client runs the exact same functions for prediction,
//! which is what makes reconciliation converge instead of fight.

pub mod character;
pub mod combat;
pub mod input;
pub mod physics;
pub mod player;
pub mod protocol;
pub mod stage;

pub use character::{character_or_default, characters, Character, DEFAULT_CHARACTER};
pub use combat::{resolve_all, resolve_attack};
pub use input::InputState;
pub use physics::advance;
pub use player::{AttackKind, Player, Vec2};
pub use protocol::{Packet, PlayerResult};
pub use stage::{stage_or_default, stages, Platform, Stage, StageBounds, DEFAULT_STAGE};

/// Downward acceleration, pixels per second squared.
pub const GRAVITY: f32 = 980.0;
/// Fastest a fighter can fall, pixels per second.
pub const TERMINAL_VELOCITY: f32 = 1000.0;
/// Horizontal run speed, pixels per second.
pub const PLAYER_SPEED: f32 = 400.0;
/// Vertical velocity applied on jump (negative is up).
pub const JUMP_VELOCITY: f32 = -600.0;
/// Geometric decay applied to horizontal velocity when neither direction is held.
pub const FRICTION: f32 = 0.9;
/// Half of the fighter hitbox width. Shared by platform snapping and combat.
pub const PLAYER_HALF_WIDTH: f32 = 30.0;
/// Half of the fighter hitbox height.
pub const PLAYER_HALF_HEIGHT: f32 = 40.0;
/// Vertical knockback base, scaled by the defender's damage multiplier.
pub const KNOCKBACK_RISE: f32 = -300.0;
/// Fixed step used for client prediction and reconciliation replay.
pub const NOMINAL_DT: f32 = 1.0 / 60.0;
