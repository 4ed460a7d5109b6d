//! The character roster.
//!
//! Characters are cosmetic plus coarse stats; the movement and combat numbers
//! are shared constants, so picking a character never changes the simulation.

use serde::{Deserialize, Serialize};

/// Sentinel stored on a player until they pick a character.
pub const DEFAULT_CHARACTER: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterStats {
    pub speed: u8,
    pub weight: u8,
    pub jump_height: u8,
    pub attack_power: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub name: String,
    pub stats: CharacterStats,
}

/// The built-in character table. The first entry doubles as the fallback for
/// unknown ids.
pub fn characters() -> Vec<Character> {
    vec![
        Character {
            id: "fighter".to_string(),
            name: "Fighter".to_string(),
            stats: CharacterStats { speed: 7, weight: 5, jump_height: 6, attack_power: 8 },
        },
        Character {
            id: "ninja".to_string(),
            name: "Ninja".to_string(),
            stats: CharacterStats { speed: 9, weight: 3, jump_height: 8, attack_power: 6 },
        },
        Character {
            id: "brute".to_string(),
            name: "Brute".to_string(),
            stats: CharacterStats { speed: 4, weight: 9, jump_height: 4, attack_power: 10 },
        },
        Character {
            id: "mage".to_string(),
            name: "Mage".to_string(),
            stats: CharacterStats { speed: 6, weight: 4, jump_height: 5, attack_power: 9 },
        },
    ]
}

/// Looks a character up by id, falling back to the first roster entry.
pub fn character_or_default(id: &str) -> Character {
    let mut all = characters();
    let pos = all.iter().position(|c| c.id == id).unwrap_or(0);
    all.swap_remove(pos)
}
