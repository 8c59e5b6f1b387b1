//! The player character: stats, inventory, equipment and magic progression.
//!
//! Every mutation that can cross an achievement threshold takes an
//! [`AchievementSink`] so the caller decides where unlocks are recorded.

use log::debug;
use rand::Rng;

use crate::game::achievement::{
    self, AchievementSink, DISTINCT_ITEMS_FOR_COLLECTOR, GOLD_FOR_WEALTHY, LEVEL_FOR_EXPERT,
};
use crate::game::catalog::{ContentCatalog, ItemEffect, ItemKind};
use crate::game::difficulty::DifficultyProfile;
use crate::game::errors::GameError;
use crate::game::inventory::{EquipSlot, Equipment, Inventory};
use crate::game::magic::MagicAffinity;

pub const STARTING_GOLD: u64 = 50;
pub const STARTING_MAGIC_POWER: i64 = 5;
pub const EXP_PER_LEVEL: u64 = 100;
pub const MAGIC_EXP_PER_LEVEL: u64 = 200;
pub const MAGIC_POWER_PER_LEVEL: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Character {
    pub name: String,
    pub level: u32,
    pub experience: u64,
    pub hp: i64,
    pub max_hp: i64,
    pub attack: i64,
    pub defense: i64,
    pub gold: u64,
    pub inventory: Inventory,
    pub equipment: Equipment,
    pub magic_affinity: Option<MagicAffinity>,
    pub magic_power: i64,
    pub magic_experience: u64,
    pub magic_level: u32,
}

/// Stat gains from one level-up, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUp {
    pub new_level: u32,
    pub hp: i64,
    pub attack: i64,
    pub defense: i64,
}

/// Result of consuming an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemUse {
    Healed(i64),
    GainedExperience { amount: u64, levels: Vec<LevelUp> },
    NoEffect,
}

impl Character {
    /// A level-1 character with fixed fallback stats. Used when a save is
    /// missing fields and as the base for [`Character::roll_new`].
    pub fn blank(name: &str) -> Self {
        Character {
            name: name.to_string(),
            level: 1,
            experience: 0,
            hp: 40,
            max_hp: 40,
            attack: 8,
            defense: 5,
            gold: 0,
            inventory: Inventory::default(),
            equipment: Equipment::default(),
            magic_affinity: None,
            magic_power: 0,
            magic_experience: 0,
            magic_level: 1,
        }
    }

    /// Roll a fresh character. Base hp 30-50, attack 5-12 and defense 2-8 are
    /// scaled by the player multipliers and truncated.
    pub fn roll_new<R: Rng + ?Sized>(
        name: &str,
        affinity: Option<MagicAffinity>,
        profile: &DifficultyProfile,
        rng: &mut R,
    ) -> Self {
        let base_hp: i64 = rng.gen_range(30..=50);
        let base_attack: i64 = rng.gen_range(5..=12);
        let base_defense: i64 = rng.gen_range(2..=8);

        let mut c = Character::blank(name);
        c.max_hp = ((base_hp as f64 * profile.player_hp_mult) as i64).max(1);
        c.hp = c.max_hp;
        c.attack = (base_attack as f64 * profile.player_attack_mult) as i64;
        c.defense = (base_defense as f64 * profile.player_defense_mult) as i64;
        c.gold = STARTING_GOLD;
        c.magic_affinity = affinity;
        if affinity.is_some() {
            c.magic_power = STARTING_MAGIC_POWER;
        }
        c.inventory.add("新手剑", 1);
        c.inventory.add("新手药水", 2);
        c
    }

    /// Experience needed to leave the current level.
    pub fn exp_to_next_level(&self) -> u64 {
        self.level as u64 * EXP_PER_LEVEL
    }

    /// Add experience. Every full 10 points rolls a small permanent stat bump,
    /// then levels up as many times as the new total allows.
    pub fn gain_experience<R: Rng + ?Sized>(
        &mut self,
        amount: u64,
        rng: &mut R,
        sink: &mut dyn AchievementSink,
    ) -> Vec<LevelUp> {
        self.experience += amount;
        for _ in 0..amount / 10 {
            self.max_hp += rng.gen_range(1..=3);
            self.attack += rng.gen_range(0..=2);
            self.defense += rng.gen_range(0..=2);
        }

        let mut gained = Vec::new();
        while self.experience >= self.exp_to_next_level() {
            gained.push(self.level_up(rng, sink));
        }
        gained
    }

    /// Advance one level, paying the threshold out of experience and restoring hp.
    pub fn level_up<R: Rng + ?Sized>(&mut self, rng: &mut R, sink: &mut dyn AchievementSink) -> LevelUp {
        let threshold = self.exp_to_next_level();
        self.experience = self.experience.saturating_sub(threshold);
        self.level += 1;

        let up = LevelUp {
            new_level: self.level,
            hp: rng.gen_range(5..=15),
            attack: rng.gen_range(2..=5),
            defense: rng.gen_range(1..=4),
        };
        self.max_hp += up.hp;
        self.attack += up.attack;
        self.defense += up.defense;
        self.hp = self.max_hp;
        debug!("{} reached level {}", self.name, self.level);

        if self.level >= LEVEL_FOR_EXPERT {
            sink.unlock(achievement::LEVEL_EXPERT);
        }
        up
    }

    /// Add magic experience; a no-op without an affinity. Returns the number of
    /// magic levels gained.
    pub fn gain_magic_experience(&mut self, amount: u64) -> u32 {
        if self.magic_affinity.is_none() {
            return 0;
        }
        self.magic_experience += amount;
        let mut levels = 0;
        while self.magic_experience >= self.magic_level as u64 * MAGIC_EXP_PER_LEVEL {
            self.magic_level_up();
            levels += 1;
        }
        levels
    }

    /// One magic level: a flat 200 comes off the balance, carry-over is kept.
    pub fn magic_level_up(&mut self) {
        self.magic_level += 1;
        self.magic_experience = self.magic_experience.saturating_sub(MAGIC_EXP_PER_LEVEL);
        self.magic_power += MAGIC_POWER_PER_LEVEL;
    }

    /// `round((base + power) * (1 + (magic_level - 1) * 0.1) * elemental)`, or
    /// `None` when the character has no affinity.
    pub fn calculate_magic_damage(&self, enemy_element: Option<MagicAffinity>) -> Option<i64> {
        let affinity = self.magic_affinity?;
        let base = (affinity.base_damage() + self.magic_power) as f64;
        let level_bonus = 1.0 + (self.magic_level as f64 - 1.0) * 0.1;
        let multiplier = affinity.elemental_multiplier(enemy_element);
        Some((base * level_bonus * multiplier).round() as i64)
    }

    pub fn add_item(&mut self, name: &str, qty: u32, sink: &mut dyn AchievementSink) {
        self.inventory.add(name, qty);
        if self.inventory.distinct() >= DISTINCT_ITEMS_FOR_COLLECTOR {
            sink.unlock(achievement::COLLECTOR);
        }
    }

    /// Remove up to `qty` units; returns how many were removed.
    pub fn remove_item(&mut self, name: &str, qty: u32) -> u32 {
        self.inventory.remove(name, qty)
    }

    /// Equip `name` into the slot its catalog kind maps to. Returns false and
    /// changes nothing when the item is not held or not in the catalog.
    pub fn equip(&mut self, name: &str, catalog: &ContentCatalog) -> bool {
        if !self.inventory.contains(name) {
            return false;
        }
        let Some(def) = catalog.item_def(name) else {
            return false;
        };
        let slot = def.kind.equip_slot();
        if let Some(previous) = self.equipment.replace(slot, name.to_string()) {
            self.inventory.add(&previous, 1);
        }
        self.inventory.remove(name, 1);
        true
    }

    pub fn equipped(&self, slot: EquipSlot) -> Option<&str> {
        self.equipment.get(slot)
    }

    /// Restore up to `amount` hp, never past max. Returns the hp actually restored.
    pub fn heal(&mut self, amount: i64) -> i64 {
        let healed = amount.clamp(0, (self.max_hp - self.hp).max(0));
        self.hp += healed;
        healed
    }

    pub fn heal_full(&mut self) {
        self.hp = self.max_hp;
    }

    /// Apply damage, flooring hp at zero. Returns the damage applied.
    pub fn take_damage(&mut self, amount: i64) -> i64 {
        let dealt = amount.max(0).min(self.hp);
        self.hp -= dealt;
        dealt
    }

    pub fn is_down(&self) -> bool {
        self.hp <= 0
    }

    pub fn add_gold(&mut self, amount: u64, sink: &mut dyn AchievementSink) {
        self.gold += amount;
        if self.gold >= GOLD_FOR_WEALTHY {
            sink.unlock(achievement::WEALTHY);
        }
    }

    /// Pay `amount` or fail without touching the purse.
    pub fn spend_gold(&mut self, amount: u64) -> Result<(), GameError> {
        if self.gold < amount {
            return Err(GameError::InsufficientResource(format!(
                "gold (need {}, have {})",
                amount, self.gold
            )));
        }
        self.gold -= amount;
        Ok(())
    }

    /// Lose up to `amount` gold, never going below zero. Returns what was lost.
    pub fn lose_gold(&mut self, amount: u64) -> u64 {
        let lost = amount.min(self.gold);
        self.gold -= lost;
        lost
    }

    /// Consume one unit of a consumable. Validation happens before anything is
    /// mutated, so a failed use leaves the character unchanged.
    pub fn use_item<R: Rng + ?Sized>(
        &mut self,
        name: &str,
        catalog: &ContentCatalog,
        rng: &mut R,
        sink: &mut dyn AchievementSink,
    ) -> Result<ItemUse, GameError> {
        if !self.inventory.contains(name) {
            return Err(GameError::InsufficientResource(format!("'{}' in inventory", name)));
        }
        let def = catalog.require_item(name)?;
        if def.kind != ItemKind::Consumable {
            return Err(GameError::Input(format!("'{}' cannot be consumed", name)));
        }
        let effect = def.effect;
        self.inventory.remove(name, 1);

        Ok(match effect {
            ItemEffect::Heal(amount) => ItemUse::Healed(self.heal(amount)),
            ItemEffect::Exp(amount) => ItemUse::GainedExperience {
                amount,
                levels: self.gain_experience(amount, rng, sink),
            },
            _ => ItemUse::NoEffect,
        })
    }

    /// Clamp restored values back into their invariants.
    pub fn normalize(&mut self) {
        self.level = self.level.max(1);
        self.magic_level = self.magic_level.max(1);
        self.max_hp = self.max_hp.max(1);
        self.hp = self.hp.clamp(0, self.max_hp);
        self.attack = self.attack.max(0);
        self.defense = self.defense.max(0);
        self.magic_power = self.magic_power.max(0);
    }
}
