//! Quest and achievement bookkeeping driven by inventory and combat events.
//!
//! Quests never complete on their own: the tracker only surfaces the ones
//! whose targets are met, and [`ProgressionTracker::complete_quest`] is the
//! explicit hand-in that pays rewards.

use log::info;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};

use crate::game::achievement::{
    self, AchievementSink, CONSUMABLES_FOR_ALCHEMIST, ENEMIES_FOR_BATTLE_MASTER, QUESTS_FOR_EXPERT,
    TRADES_FOR_MERCHANT,
};
use crate::game::character::{Character, LevelUp};
use crate::game::combat::{CombatOutcome, CombatResult};
use crate::game::errors::GameError;
use crate::game::inventory::Inventory;
use crate::game::quest::{QuestKind, QuestRecord, QuestReward, QuestStatus, QuestTarget};

/// Per-session tallies. Not persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionCounters {
    pub enemies_defeated: u32,
    pub quests_completed: u32,
    pub trades: u32,
    pub consumables_used: u32,
}

/// What a quest hand-in paid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestCompletion {
    pub name: String,
    pub reward: QuestReward,
    pub levels: Vec<LevelUp>,
}

#[derive(Debug, Clone, Default)]
pub struct ProgressionTracker {
    quests: BTreeMap<String, QuestRecord>,
    satisfied_conditions: BTreeSet<String>,
    surfaced: BTreeSet<String>,
    counters: SessionCounters,
}

impl ProgressionTracker {
    pub fn new(quests: BTreeMap<String, QuestRecord>) -> Self {
        ProgressionTracker {
            quests,
            ..Default::default()
        }
    }

    pub fn quests(&self) -> &BTreeMap<String, QuestRecord> {
        &self.quests
    }

    pub fn quest(&self, name: &str) -> Option<&QuestRecord> {
        self.quests.get(name)
    }

    pub fn counters(&self) -> SessionCounters {
        self.counters
    }

    /// Move an available quest to active.
    pub fn accept_quest(&mut self, name: &str) -> Result<&QuestRecord, GameError> {
        let quest = self
            .quests
            .get_mut(name)
            .ok_or_else(|| GameError::NotFound(format!("quest '{}'", name)))?;
        quest.activate()?;
        info!("quest accepted: {}", name);
        Ok(quest)
    }

    /// Mark an opaque condition as met. Returns active quests that became completable.
    pub fn satisfy_condition(&mut self, key: &str, inventory: &Inventory) -> Vec<String> {
        self.satisfied_conditions.insert(key.to_string());
        self.on_inventory_changed(inventory)
    }

    pub fn is_completable(&self, quest: &QuestRecord, inventory: &Inventory) -> bool {
        if !quest.is_active() {
            return false;
        }
        match &quest.target {
            QuestTarget::Condition(key) => self.satisfied_conditions.contains(key),
            items => items.met_by(inventory),
        }
    }

    /// Every active quest whose target is currently met.
    pub fn completable_quests(&self, inventory: &Inventory) -> Vec<String> {
        self.quests
            .values()
            .filter(|q| self.is_completable(q, inventory))
            .map(|q| q.name.clone())
            .collect()
    }

    /// Completable quests not reported before. A quest drops out of the
    /// reported set again if its target stops being met.
    pub fn on_inventory_changed(&mut self, inventory: &Inventory) -> Vec<String> {
        let now: BTreeSet<String> = self.completable_quests(inventory).into_iter().collect();
        let fresh = now.difference(&self.surfaced).cloned().collect();
        self.surfaced = now;
        fresh
    }

    /// Count a kill. Active quests that name the enemy in their target get a
    /// trophy of that name so inventory-based targets can track kills.
    pub fn on_enemy_defeated(
        &mut self,
        enemy: &str,
        qty: u32,
        character: &mut Character,
        sink: &mut dyn AchievementSink,
    ) -> Vec<String> {
        self.counters.enemies_defeated += qty;
        if self.counters.enemies_defeated >= ENEMIES_FOR_BATTLE_MASTER {
            sink.unlock(achievement::BATTLE_MASTER);
        }
        let tracked = self
            .quests
            .values()
            .any(|q| q.is_active() && q.target.mentions(enemy));
        if tracked {
            character.add_item(enemy, qty, sink);
        }
        self.on_inventory_changed(&character.inventory)
    }

    /// Fold a finished encounter into the counters and quest state.
    pub fn observe_combat(
        &mut self,
        outcome: &CombatOutcome,
        character: &mut Character,
        sink: &mut dyn AchievementSink,
    ) -> Vec<String> {
        for _ in 0..outcome.consumables_used {
            self.record_consumable(sink);
        }
        match outcome.result {
            CombatResult::Victory => self.on_enemy_defeated(&outcome.enemy, 1, character, sink),
            _ => self.on_inventory_changed(&character.inventory),
        }
    }

    /// Hand in an active, completable quest: pay exp, gold and items, then
    /// flip it to completed.
    pub fn complete_quest<R: Rng + ?Sized>(
        &mut self,
        name: &str,
        character: &mut Character,
        rng: &mut R,
        sink: &mut dyn AchievementSink,
    ) -> Result<QuestCompletion, GameError> {
        let quest = self
            .quests
            .get(name)
            .ok_or_else(|| GameError::NotFound(format!("quest '{}'", name)))?;
        if !quest.is_active() {
            return Err(GameError::Input(format!("quest '{}' is not active", name)));
        }
        if !self.is_completable(quest, &character.inventory) {
            return Err(GameError::InsufficientResource(format!(
                "progress on quest '{}'",
                name
            )));
        }
        let reward = quest.reward.clone();
        let kind = quest.kind;
        if let Some(quest) = self.quests.get_mut(name) {
            quest.mark_completed()?;
        }

        let levels = character.gain_experience(reward.exp, rng, sink);
        character.add_gold(reward.gold, sink);
        for item in &reward.items {
            character.add_item(item, 1, sink);
        }
        info!("quest completed: {}", name);

        self.counters.quests_completed += 1;
        if self.counters.quests_completed >= QUESTS_FOR_EXPERT {
            sink.unlock(achievement::QUEST_EXPERT);
        }
        if kind == QuestKind::Main && self.all_main_quests_completed() {
            sink.unlock(achievement::SAVIOR);
        }
        self.surfaced.remove(name);

        Ok(QuestCompletion {
            name: name.to_string(),
            reward,
            levels,
        })
    }

    pub fn record_trade(&mut self, sink: &mut dyn AchievementSink) {
        self.counters.trades += 1;
        if self.counters.trades >= TRADES_FOR_MERCHANT {
            sink.unlock(achievement::MERCHANT);
        }
    }

    pub fn record_consumable(&mut self, sink: &mut dyn AchievementSink) {
        self.counters.consumables_used += 1;
        if self.counters.consumables_used >= CONSUMABLES_FOR_ALCHEMIST {
            sink.unlock(achievement::ALCHEMIST);
        }
    }

    fn all_main_quests_completed(&self) -> bool {
        self.quests
            .values()
            .filter(|q| q.kind == QuestKind::Main)
            .all(|q| q.status == QuestStatus::Completed)
    }
}
