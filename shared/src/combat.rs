//! Hit detection and knockback.

use crate::player::Player;
use crate::KNOCKBACK_RISE;
use std::collections::BTreeMap;

/// Applies one attacker's current attack to one defender, returning the
/// updated defender. No-op unless the attacker is mid-attack and the two are
/// different fighters.
///
/// A hit lands when the defender is inside the attack's circular range and on
/// the side the attacker faces. Knockback scales with the defender's damage
/// after the hit is added, so heavier damage means bigger launches.
pub fn resolve_attack(attacker: &Player, defender: &Player) -> Player {
    let Some(attack) = attacker.attack else {
        return defender.clone();
    };
    if attacker.id == defender.id {
        return defender.clone();
    }

    let dx = defender.position.x - attacker.position.x;
    let distance = attacker.position.distance_to(&defender.position);
    let facing_defender = (attacker.direction > 0.0 && dx > 0.0)
        || (attacker.direction < 0.0 && dx < 0.0);

    if distance >= attack.range() || !facing_defender {
        return defender.clone();
    }

    let mut hit = defender.clone();
    hit.damage += attack.damage();
    let multiplier = 1.0 + hit.damage / 100.0;
    hit.velocity.x = attacker.direction * attack.knockback_force() * multiplier;
    hit.velocity.y = KNOCKBACK_RISE * multiplier;
    // Knocked into the air regardless of prior grounded state.
    hit.is_jumping = true;
    hit
}

/// Runs the all-pairs combat pass over a roster in key order.
///
/// Every attacking fighter is checked against every other fighter
/// independently, so one swing can hit several defenders in the same tick.
/// Eliminated fighters neither deal nor take hits.
pub fn resolve_all(players: &mut BTreeMap<u32, Player>) {
    let ids: Vec<u32> = players.keys().copied().collect();
    for &attacker_id in &ids {
        let attacker = match players.get(&attacker_id) {
            Some(p) if p.is_attacking() && !p.is_out() => p.clone(),
            _ => continue,
        };
        for &defender_id in &ids {
            if defender_id == attacker_id {
                continue;
            }
            if let Some(defender) = players.get(&defender_id) {
                if defender.is_out() {
                    continue;
                }
                let hit = resolve_attack(&attacker, defender);
                players.insert(defender_id, hit);
            }
        }
    }
}
