//! Difficulty profiles: fixed multiplier bundles chosen at character creation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::game::errors::GameError;

/// The five selectable difficulty levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
    Extreme,
    Ultimate,
}

/// Multipliers applied to combat numbers and rewards for a whole playthrough.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyProfile {
    pub player_hp_mult: f64,
    pub player_attack_mult: f64,
    pub player_defense_mult: f64,
    pub monster_hp_mult: f64,
    pub monster_attack_mult: f64,
    pub monster_defense_mult: f64,
    pub exp_mult: f64,
    pub gold_mult: f64,
    pub item_drop_chance: f64,
    /// Levels subtracted from a scene's recommended level. Negative raises it.
    pub scene_level_reduction: i32,
    /// Scales the gold needed to unlock a scene.
    pub unlock_cost_multiplier: f64,
}

impl Difficulty {
    pub const ALL: [Difficulty; 5] = [
        Difficulty::Easy,
        Difficulty::Normal,
        Difficulty::Hard,
        Difficulty::Extreme,
        Difficulty::Ultimate,
    ];

    pub fn profile(self) -> DifficultyProfile {
        match self {
            Difficulty::Easy => DifficultyProfile {
                player_hp_mult: 1.5,
                player_attack_mult: 1.3,
                player_defense_mult: 1.4,
                monster_hp_mult: 0.7,
                monster_attack_mult: 0.8,
                monster_defense_mult: 0.7,
                exp_mult: 1.2,
                gold_mult: 1.3,
                item_drop_chance: 0.8,
                scene_level_reduction: 2,
                unlock_cost_multiplier: 0.8,
            },
            Difficulty::Normal => DifficultyProfile {
                player_hp_mult: 1.0,
                player_attack_mult: 1.0,
                player_defense_mult: 1.0,
                monster_hp_mult: 1.0,
                monster_attack_mult: 1.0,
                monster_defense_mult: 1.0,
                exp_mult: 1.0,
                gold_mult: 1.0,
                item_drop_chance: 0.6,
                scene_level_reduction: 0,
                unlock_cost_multiplier: 1.0,
            },
            Difficulty::Hard => DifficultyProfile {
                player_hp_mult: 0.8,
                player_attack_mult: 0.9,
                player_defense_mult: 0.8,
                monster_hp_mult: 1.5,
                monster_attack_mult: 1.3,
                monster_defense_mult: 1.4,
                exp_mult: 1.3,
                gold_mult: 1.2,
                item_drop_chance: 0.5,
                scene_level_reduction: -1,
                unlock_cost_multiplier: 1.2,
            },
            Difficulty::Extreme => DifficultyProfile {
                player_hp_mult: 0.6,
                player_attack_mult: 0.8,
                player_defense_mult: 0.7,
                monster_hp_mult: 2.0,
                monster_attack_mult: 1.6,
                monster_defense_mult: 1.8,
                exp_mult: 1.5,
                gold_mult: 1.4,
                item_drop_chance: 0.4,
                scene_level_reduction: -2,
                unlock_cost_multiplier: 1.5,
            },
            Difficulty::Ultimate => DifficultyProfile {
                player_hp_mult: 0.5,
                player_attack_mult: 0.7,
                player_defense_mult: 0.6,
                monster_hp_mult: 3.0,
                monster_attack_mult: 2.0,
                monster_defense_mult: 2.5,
                exp_mult: 2.0,
                gold_mult: 1.5,
                item_drop_chance: 0.3,
                scene_level_reduction: -3,
                unlock_cost_multiplier: 2.0,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
            Difficulty::Extreme => "extreme",
            Difficulty::Ultimate => "ultimate",
        }
    }
}

impl DifficultyProfile {
    /// Recommended level for a scene after the profile's level reduction, never below 1.
    pub fn recommended_level(&self, required_level: u32) -> u32 {
        (required_level as i64 - self.scene_level_reduction as i64).max(1) as u32
    }

    /// Gold needed to unlock a scene, truncated like every other scaled number.
    pub fn unlock_cost(&self, required_gold: u32) -> u32 {
        (required_gold as f64 * self.unlock_cost_multiplier) as u32
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" | "1" => Ok(Difficulty::Easy),
            "normal" | "2" => Ok(Difficulty::Normal),
            "hard" | "3" => Ok(Difficulty::Hard),
            "extreme" | "4" => Ok(Difficulty::Extreme),
            "ultimate" | "5" => Ok(Difficulty::Ultimate),
            other => Err(GameError::Input(format!("unknown difficulty '{}'", other))),
        }
    }
}
