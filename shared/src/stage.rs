//! Static stage geometry.
//!
//! Stages are immutable data: platforms are axis-aligned rectangles that are
//! solid from above only, and the bounds rectangle decides where fighters are
//! clamped and where they fall off.

use crate::player::Vec2;
use serde::{Deserialize, Serialize};

/// Stage id used whenever a requested id is unknown or nothing was chosen.
pub const DEFAULT_STAGE: &str = "battlefield";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Playable area limits. `bottom` is the kill line: crossing it costs a stock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageBounds {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub id: String,
    pub name: String,
    pub platforms: Vec<Platform>,
    pub bounds: StageBounds,
}

impl Stage {
    /// Where a fighter reappears after losing a stock: horizontal stage
    /// center, a short drop below the ceiling.
    pub fn respawn_point(&self) -> Vec2 {
        Vec2::new(
            (self.bounds.left + self.bounds.right) / 2.0,
            self.bounds.top + 100.0,
        )
    }

    /// Starting slot for the nth fighter, spaced left to right.
    pub fn spawn_slot(&self, index: usize) -> Vec2 {
        Vec2::new(
            self.bounds.left + 200.0 + 200.0 * index as f32,
            self.bounds.top + 100.0,
        )
    }
}

fn standard_bounds() -> StageBounds {
    StageBounds {
        left: 0.0,
        right: 1280.0,
        top: 0.0,
        bottom: 800.0,
    }
}

/// The built-in stage table.
pub fn stages() -> Vec<Stage> {
    vec![
        Stage {
            id: "battlefield".to_string(),
            name: "Battlefield".to_string(),
            platforms: vec![
                // Main platform
                Platform { x: 300.0, y: 500.0, width: 600.0, height: 20.0 },
                // Smaller platforms
                Platform { x: 400.0, y: 350.0, width: 200.0, height: 15.0 },
                Platform { x: 200.0, y: 400.0, width: 150.0, height: 15.0 },
                Platform { x: 850.0, y: 400.0, width: 150.0, height: 15.0 },
            ],
            bounds: standard_bounds(),
        },
        Stage {
            id: "final_destination".to_string(),
            name: "Final Destination".to_string(),
            platforms: vec![Platform { x: 200.0, y: 500.0, width: 880.0, height: 20.0 }],
            bounds: standard_bounds(),
        },
        Stage {
            id: "small_battlefield".to_string(),
            name: "Small Battlefield".to_string(),
            platforms: vec![
                Platform { x: 350.0, y: 500.0, width: 500.0, height: 20.0 },
                Platform { x: 450.0, y: 350.0, width: 150.0, height: 15.0 },
                Platform { x: 650.0, y: 350.0, width: 150.0, height: 15.0 },
            ],
            bounds: standard_bounds(),
        },
        Stage {
            id: "castle".to_string(),
            name: "Castle".to_string(),
            platforms: vec![
                Platform { x: 300.0, y: 500.0, width: 680.0, height: 20.0 },
                Platform { x: 200.0, y: 400.0, width: 200.0, height: 15.0 },
                Platform { x: 500.0, y: 350.0, width: 150.0, height: 15.0 },
                Platform { x: 800.0, y: 450.0, width: 150.0, height: 15.0 },
                Platform { x: 650.0, y: 250.0, width: 100.0, height: 15.0 },
            ],
            bounds: standard_bounds(),
        },
    ]
}

/// Looks a stage up by id, falling back to the default stage for unknown ids.
pub fn stage_or_default(id: &str) -> Stage {
    let mut all = stages();
    let pos = all.iter().position(|s| s.id == id).unwrap_or(0);
    all.swap_remove(pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_id() {
        let stage = stage_or_default("castle");
        assert_eq!(stage.id, "castle");
        assert_eq!(stage.platforms.len(), 5);
    }

    #[test]
    fn test_unknown_id_falls_back() {
        let stage = stage_or_default("does_not_exist");
        assert_eq!(stage.id, DEFAULT_STAGE);
    }

    #[test]
    fn test_respawn_point_is_center_top() {
        let stage = stage_or_default(DEFAULT_STAGE);
        let point = stage.respawn_point();
        assert_eq!(point.x, 640.0);
        assert_eq!(point.y, 100.0);
    }

    #[test]
    fn test_spawn_slots_are_spaced() {
        let stage = stage_or_default(DEFAULT_STAGE);
        let a = stage.spawn_slot(0);
        let b = stage.spawn_slot(1);
        assert_eq!(a.x, 200.0);
        assert_eq!(b.x, 400.0);
        assert_eq!(a.y, b.y);
    }

    #[test]
    fn test_all_stages_share_bounds() {
        for stage in stages() {
            assert_eq!(stage.bounds, standard_bounds());
            assert!(!stage.platforms.is_empty());
        }
    }
}
