//! Elemental magic: affinities, damage constants and secondary effects.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::game::errors::GameError;

/// Chance that a successful cast triggers its affinity's secondary effect.
pub const SECONDARY_EFFECT_CHANCE: f64 = 0.3;
/// Nested chance for a water secondary effect to freeze.
pub const FREEZE_CHANCE: f64 = 0.2;
/// Nested chance for an earth secondary effect to crack armour.
pub const PETRIFY_CHANCE: f64 = 0.15;
/// Damage multiplier when light meets dark or dark meets light.
pub const OPPOSED_MULTIPLIER: f64 = 1.5;

/// The six schools of magic. Chosen once at character creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MagicAffinity {
    Fire,
    Water,
    Wind,
    Earth,
    Light,
    Dark,
}

/// What a secondary effect roll produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondaryEffect {
    /// Flavor only, nothing persists.
    Burn,
    /// Flavor only, the enemy still acts.
    Freeze,
    /// Enemy defense drops to 80% for the rest of the encounter.
    Petrify,
}

impl MagicAffinity {
    pub const ALL: [MagicAffinity; 6] = [
        MagicAffinity::Fire,
        MagicAffinity::Water,
        MagicAffinity::Wind,
        MagicAffinity::Earth,
        MagicAffinity::Light,
        MagicAffinity::Dark,
    ];

    pub fn base_damage(self) -> i64 {
        match self {
            MagicAffinity::Fire => 10,
            MagicAffinity::Water => 8,
            MagicAffinity::Wind => 7,
            MagicAffinity::Earth => 6,
            MagicAffinity::Light => 9,
            MagicAffinity::Dark => 11,
        }
    }

    /// Per-affinity growth coefficient. Carried in the table but not part of
    /// the damage formula.
    pub fn growth_rate(self) -> f64 {
        match self {
            MagicAffinity::Fire => 1.2,
            MagicAffinity::Water => 1.1,
            MagicAffinity::Wind => 1.0,
            MagicAffinity::Earth => 0.9,
            MagicAffinity::Light => 1.15,
            MagicAffinity::Dark => 1.25,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            MagicAffinity::Fire => "火属性",
            MagicAffinity::Water => "水属性",
            MagicAffinity::Wind => "风属性",
            MagicAffinity::Earth => "土属性",
            MagicAffinity::Light => "光属性",
            MagicAffinity::Dark => "暗属性",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MagicAffinity::Fire => "fire",
            MagicAffinity::Water => "water",
            MagicAffinity::Wind => "wind",
            MagicAffinity::Earth => "earth",
            MagicAffinity::Light => "light",
            MagicAffinity::Dark => "dark",
        }
    }

    /// 1.5 for the light/dark pair, 1.0 otherwise.
    pub fn elemental_multiplier(self, enemy: Option<MagicAffinity>) -> f64 {
        match (self, enemy) {
            (MagicAffinity::Light, Some(MagicAffinity::Dark))
            | (MagicAffinity::Dark, Some(MagicAffinity::Light)) => OPPOSED_MULTIPLIER,
            _ => 1.0,
        }
    }

    /// Roll the per-cast secondary effect. Wind and light have none; water and
    /// earth need a second roll to land.
    pub fn roll_secondary<R: Rng + ?Sized>(self, rng: &mut R) -> Option<SecondaryEffect> {
        if !rng.gen_bool(SECONDARY_EFFECT_CHANCE) {
            return None;
        }
        match self {
            MagicAffinity::Fire => Some(SecondaryEffect::Burn),
            MagicAffinity::Water if rng.gen_bool(FREEZE_CHANCE) => Some(SecondaryEffect::Freeze),
            MagicAffinity::Earth if rng.gen_bool(PETRIFY_CHANCE) => Some(SecondaryEffect::Petrify),
            _ => None,
        }
    }
}

impl fmt::Display for MagicAffinity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MagicAffinity {
    type Err = GameError;

    /// Accepts the English key, the display name, or the menu number 1-6.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        MagicAffinity::ALL
            .iter()
            .enumerate()
            .find(|(i, a)| {
                a.as_str().eq_ignore_ascii_case(s)
                    || a.display_name() == s
                    || (i + 1).to_string() == s
            })
            .map(|(_, a)| *a)
            .ok_or_else(|| GameError::Input(format!("unknown magic affinity '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn only_light_and_dark_oppose() {
        assert_eq!(
            MagicAffinity::Light.elemental_multiplier(Some(MagicAffinity::Dark)),
            1.5
        );
        assert_eq!(
            MagicAffinity::Dark.elemental_multiplier(Some(MagicAffinity::Light)),
            1.5
        );
        assert_eq!(
            MagicAffinity::Fire.elemental_multiplier(Some(MagicAffinity::Water)),
            1.0
        );
        assert_eq!(MagicAffinity::Light.elemental_multiplier(None), 1.0);
        assert_eq!(
            MagicAffinity::Dark.elemental_multiplier(Some(MagicAffinity::Dark)),
            1.0
        );
    }

    #[test]
    fn parse_accepts_key_display_name_and_number() {
        assert_eq!("FIRE".parse::<MagicAffinity>().unwrap(), MagicAffinity::Fire);
        assert_eq!("暗属性".parse::<MagicAffinity>().unwrap(), MagicAffinity::Dark);
        assert_eq!("4".parse::<MagicAffinity>().unwrap(), MagicAffinity::Earth);
        assert!("7".parse::<MagicAffinity>().is_err());
    }

    #[test]
    fn wind_and_light_never_roll_secondary_effects() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            assert!(MagicAffinity::Wind.roll_secondary(&mut rng).is_none());
            assert!(MagicAffinity::Light.roll_secondary(&mut rng).is_none());
        }
    }

    #[test]
    fn fire_burns_about_thirty_percent_of_casts() {
        let mut rng = StdRng::seed_from_u64(11);
        let burns = (0..10_000)
            .filter(|_| MagicAffinity::Fire.roll_secondary(&mut rng) == Some(SecondaryEffect::Burn))
            .count();
        assert!((2500..3500).contains(&burns), "burns = {}", burns);
    }

    #[test]
    fn growth_rate_is_tabled_but_distinct_per_affinity() {
        // Damage ignores growth_rate; see Character::calculate_magic_damage tests.
        let rates: Vec<f64> = MagicAffinity::ALL.iter().map(|a| a.growth_rate()).collect();
        assert_eq!(rates, vec![1.2, 1.1, 1.0, 0.9, 1.15, 1.25]);
    }
}
