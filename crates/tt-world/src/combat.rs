//! Robbery and combat resolution math.
//!
//! Pure functions shared by the agent tick (target scoring), the operation
//! runtime (dice rolls), and tests.  All probabilities come out of here so
//! the formulas exist exactly once.

use tt_map::Zone;

use crate::agent::Personality;
use crate::player::Equipment;

/// Robbery attack power: equipment power scaled by the personality bonus.
pub fn attack_power(equipment_power: i32, personality: Personality) -> f64 {
    equipment_power as f64 * (1.0 + personality.robbery_bonus())
}

/// Robbery defense: equipment defense plus twice the house defense level.
pub fn robbery_defense(equipment: &Equipment) -> f64 {
    equipment.defense_bonus as f64 + 2.0 * equipment.house_defense_level as f64
}

/// `p = clamp(0.05, 0.85, 0.4 + (attack − defense)/50 + zone modifier)`.
pub fn robbery_success_probability(attack: f64, defense: f64, zone: Zone) -> f64 {
    (0.4 + (attack - defense) / 50.0 + zone.robbery_modifier()).clamp(0.05, 0.85)
}

/// Loot ceiling: 20% of the target's inventory value, floored.
pub fn max_loot(inventory_value: i64) -> i64 {
    (inventory_value / 5).max(0)
}

/// Per-side combat power with the attacker/defender personality bias.
pub fn combat_power(equipment_power: i32, personality: Personality, attacking: bool) -> f64 {
    let bias = if attacking {
        personality.combat_attack_bias()
    } else {
        personality.combat_defense_bias()
    };
    equipment_power as f64 + bias
}

/// Attacker wins with probability `a / (a + b)`; an all-zero matchup is a
/// coin flip.
pub fn attacker_win_probability(attacker_power: f64, opponent_power: f64) -> f64 {
    let a = attacker_power.max(0.0);
    let b = opponent_power.max(0.0);
    if a + b <= f64::EPSILON {
        0.5
    } else {
        a / (a + b)
    }
}

/// Target attractiveness for the robbery branch:
/// visible equipment + 0.1·inventory value − 2·defense bonus.
pub fn robbery_target_score(equipment: &Equipment, inventory_value: i64) -> f64 {
    let visible = (equipment.power_bonus + equipment.defense_bonus) as f64;
    visible + 0.1 * inventory_value as f64 - 2.0 * equipment.defense_bonus as f64
}
