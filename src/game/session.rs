//! A running game: the character, the world, quests and achievements under
//! one owner, plus the scene-level operations the action handlers call.

use chrono::{NaiveDateTime, Timelike};
use log::{debug, info};
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};

use crate::game::achievement::{self, AchievementSet, AchievementSink};
use crate::game::catalog::{ContentCatalog, NpcDef, SceneDef};
use crate::game::character::{Character, ItemUse, LevelUp};
use crate::game::combat::{CombatOutcome, CombatSession, TurnReport};
use crate::game::difficulty::{Difficulty, DifficultyProfile};
use crate::game::errors::GameError;
use crate::game::inventory::EquipSlot;
use crate::game::magic::MagicAffinity;
use crate::game::progression::{ProgressionTracker, QuestCompletion};
use crate::game::quest::{QuestRecord, QuestStatus};
use crate::game::scene_action::{SceneActionDef, SceneActionReport};
use crate::game::world::{TimeAdvance, TravelReport, WorldState, START_SCENE};
use crate::game::GameContext;

/// Condition key met by the cave's exploration event.
pub const CAVE_DEPTHS_CONDITION: &str = "explore_cave_deep";
/// Condition key met by talking to the wilderness merchant.
pub const DELIVERY_CONDITION: &str = "deliver_goods";
const DELIVERY_SCENE: &str = "wilderness";
const DELIVERY_NPC: &str = "商人";
const INN_SCENE: &str = "town";
pub const MAX_NAME_CHARS: usize = 32;

/// Everything a save file carries. Produced by [`GameSession::snapshot`] and
/// consumed by [`GameSession::restore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRecord {
    pub character: Character,
    pub difficulty: Difficulty,
    pub world: WorldState,
    pub achievements: AchievementSet,
    pub quests: BTreeMap<String, QuestRecord>,
    /// Wall-clock time of the save, if known.
    pub timestamp: Option<NaiveDateTime>,
}

/// What an exploration turned up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery {
    Encounter(String),
    Items { name: String, qty: u32 },
    Gold(u64),
    CaveDepths,
    Nothing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExploreReport {
    pub discovery: Discovery,
    pub exp: u64,
    pub levels: Vec<LevelUp>,
    pub time: TimeAdvance,
    pub completable: Vec<String>,
}

/// Full result of an auto-resolved fight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FightReport {
    pub rounds: Vec<TurnReport>,
    pub outcome: CombatOutcome,
    pub completable: Vec<String>,
}

pub struct GameSession {
    catalog: ContentCatalog,
    difficulty: Difficulty,
    pub character: Character,
    pub world: WorldState,
    pub achievements: AchievementSet,
    pub progress: ProgressionTracker,
}

/// Trim and check a player-chosen character name.
pub fn validate_character_name(name: &str) -> Result<String, GameError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GameError::InvalidName("name cannot be empty".into()));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(GameError::InvalidName(format!(
            "name longer than {} characters",
            MAX_NAME_CHARS
        )));
    }
    if name.chars().any(|c| c.is_control()) {
        return Err(GameError::InvalidName("name contains control characters".into()));
    }
    Ok(name.to_string())
}

impl GameSession {
    /// Roll a new character and start in the forest.
    pub fn new_game<R: Rng + ?Sized>(
        name: &str,
        affinity: Option<MagicAffinity>,
        difficulty: Difficulty,
        catalog: ContentCatalog,
        rng: &mut R,
    ) -> Result<Self, GameError> {
        let name = validate_character_name(name)?;
        let character = Character::roll_new(&name, affinity, &difficulty.profile(), rng);
        let progress = ProgressionTracker::new(catalog.initial_quests());
        let mut session = GameSession {
            catalog,
            difficulty,
            character,
            world: WorldState::new(START_SCENE),
            achievements: AchievementSet::default(),
            progress,
        };
        session.achievements.unlock(achievement::FIRST_ADVENTURE);
        info!(
            "new game: {} ({}, {})",
            crate::logutil::loggable(&session.character.name),
            affinity.map(|a| a.as_str()).unwrap_or("none"),
            difficulty
        );
        Ok(session)
    }

    /// Resume from a decoded save. Catalog quests missing from the save come
    /// back as available; saved quests the catalog no longer knows are kept.
    pub fn restore(record: SaveRecord, catalog: ContentCatalog) -> Self {
        let mut quests = catalog.initial_quests();
        for (name, saved) in record.quests {
            quests.insert(name, saved);
        }
        let mut character = record.character;
        character.normalize();
        let mut world = record.world;
        if catalog.scene_def(&world.current_scene).is_none() {
            debug!("unknown saved scene {}, moving to start", world.current_scene);
            world.current_scene = START_SCENE.to_string();
        }
        GameSession {
            catalog,
            difficulty: record.difficulty,
            character,
            world,
            achievements: record.achievements,
            progress: ProgressionTracker::new(quests),
        }
    }

    /// Move a fresh character to another starting scene, unlocking it.
    pub fn place_at_start(&mut self, key: &str) -> Result<(), GameError> {
        let scene = self.catalog.require_scene(key)?;
        let key = scene.key.clone();
        self.world.unlocked_scenes.insert(key.clone());
        self.world.visited_scenes.insert(key.clone());
        self.world.current_scene = key;
        Ok(())
    }

    /// Capture the session for saving. The timestamp is cut to whole seconds,
    /// the precision the save file keeps.
    pub fn snapshot(&self, timestamp: NaiveDateTime) -> SaveRecord {
        let timestamp = timestamp.with_nanosecond(0).unwrap_or(timestamp);
        SaveRecord {
            character: self.character.clone(),
            difficulty: self.difficulty,
            world: self.world.clone(),
            achievements: self.achievements.clone(),
            quests: self.progress.quests().clone(),
            timestamp: Some(timestamp),
        }
    }

    pub fn catalog(&self) -> &ContentCatalog {
        &self.catalog
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn profile(&self) -> DifficultyProfile {
        self.difficulty.profile()
    }

    pub fn current_scene(&self) -> Result<&SceneDef, GameError> {
        self.world.current_scene_def(&self.catalog)
    }

    /// Recommended level for a scene after the difficulty reduction.
    pub fn recommended_level(&self, scene: &SceneDef) -> u32 {
        self.profile().recommended_level(scene.required_level)
    }

    /// Achievements unlocked since the last call, for display.
    pub fn take_notifications(&mut self) -> Vec<String> {
        self.achievements.take_notifications()
    }

    /// Search the current scene. An encounter is reported, not fought; the
    /// caller runs it through [`GameSession::begin_combat`] or
    /// [`GameSession::fight`].
    pub fn explore<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<ExploreReport, GameError> {
        let scene = self.world.current_scene_def(&self.catalog)?;
        let discovery = match rng.gen_range(0..4) {
            0 if !scene.enemies.is_empty() => {
                let enemy = &scene.enemies[rng.gen_range(0..scene.enemies.len())];
                Discovery::Encounter(enemy.clone())
            }
            1 if !scene.items.is_empty() => {
                let name = scene.items[rng.gen_range(0..scene.items.len())].clone();
                Discovery::Items {
                    name,
                    qty: rng.gen_range(1..=3),
                }
            }
            2 if scene.key == "cave" => Discovery::CaveDepths,
            2 => Discovery::Gold(rng.gen_range(5..=20)),
            _ => Discovery::Nothing,
        };

        let mut completable = Vec::new();
        match &discovery {
            Discovery::Items { name, qty } => {
                self.character.add_item(name, *qty, &mut self.achievements);
                completable = self.progress.on_inventory_changed(&self.character.inventory);
            }
            Discovery::Gold(amount) => self.character.add_gold(*amount, &mut self.achievements),
            Discovery::CaveDepths => {
                completable = self
                    .progress
                    .satisfy_condition(CAVE_DEPTHS_CONDITION, &self.character.inventory);
            }
            Discovery::Encounter(_) | Discovery::Nothing => {}
        }

        let exp = rng.gen_range(1..=5);
        let levels = self
            .character
            .gain_experience(exp, rng, &mut self.achievements);
        let time = self.world.pass_random_time(rng);
        Ok(ExploreReport {
            discovery,
            exp,
            levels,
            time,
            completable,
        })
    }

    /// Activities offered in the current scene.
    pub fn scene_actions_here(&self) -> Result<Vec<&SceneActionDef>, GameError> {
        let scene = self.current_scene()?;
        Ok(self.catalog.scene_actions(&scene.key).collect())
    }

    /// Run a scene activity. A character below its level takes the failure
    /// branch without paying; unaffordable costs fail with nothing changed.
    /// Takes one hour of game time.
    pub fn perform_scene_action<R: Rng + ?Sized>(
        &mut self,
        name: &str,
        rng: &mut R,
    ) -> Result<SceneActionReport, GameError> {
        let key = self.current_scene()?.key.clone();
        let def = self.catalog.require_scene_action(&key, name)?.clone();

        let succeeded = if self.character.level < def.min_level {
            false
        } else {
            if self.character.gold < def.gold_cost {
                return Err(GameError::InsufficientResource(format!(
                    "gold (need {}, have {})",
                    def.gold_cost, self.character.gold
                )));
            }
            if let Some(item) = &def.item_cost {
                if !self.character.inventory.contains(item) {
                    return Err(GameError::InsufficientResource(format!("'{}' in inventory", item)));
                }
            }
            self.character.spend_gold(def.gold_cost)?;
            if let Some(item) = &def.item_cost {
                self.character.remove_item(item, 1);
            }
            rng.gen_bool(def.chance.clamp(0.0, 1.0))
        };

        let mut report = SceneActionReport {
            action: def.name.clone(),
            succeeded,
            text: if succeeded { def.success_text.clone() } else { def.failure_text.clone() },
            ..Default::default()
        };
        let effects = if succeeded { &def.success } else { &def.failure };
        for effect in effects {
            effect.apply(&mut self.character, rng, &mut self.achievements, &mut report);
        }
        debug!("activity {} in {}: succeeded={}", def.name, key, succeeded);

        report.completable = match def.satisfies.as_deref() {
            Some(condition) if succeeded => self
                .progress
                .satisfy_condition(condition, &self.character.inventory),
            _ => self.progress.on_inventory_changed(&self.character.inventory),
        };
        self.world.advance_time(1);
        Ok(report)
    }

    /// Open an encounter against `enemy`. Call [`GameSession::finish_combat`]
    /// with the outcome once it resolves.
    pub fn begin_combat(&mut self, enemy: &str) -> Result<CombatSession<'_>, GameError> {
        let ctx = GameContext::new(&self.catalog, self.difficulty, &mut self.achievements);
        CombatSession::start(ctx, &mut self.character, enemy)
    }

    /// Fold a resolved encounter into quest state. Returns newly completable quests.
    pub fn finish_combat(&mut self, outcome: &CombatOutcome) -> Vec<String> {
        self.progress
            .observe_combat(outcome, &mut self.character, &mut self.achievements)
    }

    /// Fight `enemy` to the end by attacking every round.
    pub fn fight<R: Rng + ?Sized>(&mut self, enemy: &str, rng: &mut R) -> Result<FightReport, GameError> {
        let (rounds, outcome) = {
            let mut combat = self.begin_combat(enemy)?;
            let rounds = combat.auto_resolve(rng)?;
            let outcome = combat
                .outcome()
                .ok_or_else(|| GameError::Input("combat did not resolve".into()))?;
            (rounds, outcome)
        };
        let completable = self.finish_combat(&outcome);
        Ok(FightReport {
            rounds,
            outcome,
            completable,
        })
    }

    pub fn use_item<R: Rng + ?Sized>(&mut self, name: &str, rng: &mut R) -> Result<ItemUse, GameError> {
        let effect = self
            .character
            .use_item(name, &self.catalog, rng, &mut self.achievements)?;
        self.progress.record_consumable(&mut self.achievements);
        self.progress.on_inventory_changed(&self.character.inventory);
        Ok(effect)
    }

    /// Discard up to `qty` units. Returns how many were dropped.
    pub fn drop_item(&mut self, name: &str, qty: u32) -> Result<u32, GameError> {
        if !self.character.inventory.contains(name) {
            return Err(GameError::InsufficientResource(format!("'{}' in inventory", name)));
        }
        let dropped = self.character.remove_item(name, qty);
        self.progress.on_inventory_changed(&self.character.inventory);
        Ok(dropped)
    }

    pub fn equip(&mut self, name: &str) -> Result<EquipSlot, GameError> {
        if !self.character.inventory.contains(name) {
            return Err(GameError::InsufficientResource(format!("'{}' in inventory", name)));
        }
        let slot = self
            .catalog
            .item_def(name)
            .map(|def| def.kind.equip_slot())
            .ok_or_else(|| GameError::Input(format!("'{}' cannot be equipped", name)))?;
        if !self.character.equip(name, &self.catalog) {
            return Err(GameError::Input(format!("'{}' cannot be equipped", name)));
        }
        Ok(slot)
    }

    /// NPCs present in the current scene.
    pub fn npcs_here(&self) -> Result<Vec<&NpcDef>, GameError> {
        let scene = self.current_scene()?;
        Ok(scene
            .npcs
            .iter()
            .filter_map(|n| self.catalog.npc_def(n))
            .collect())
    }

    pub fn npc_here(&self, name: &str) -> Result<&NpcDef, GameError> {
        let scene = self.current_scene()?;
        if !scene.npcs.iter().any(|n| n == name) {
            return Err(GameError::NotFound(format!("{} is not here", name)));
        }
        self.catalog.require_npc(name)
    }

    /// Talk to an NPC in the current scene. Returns the NPC and any quests
    /// that became completable because of the conversation.
    pub fn talk(&mut self, name: &str) -> Result<(NpcDef, Vec<String>), GameError> {
        let npc = self.npc_here(name)?.clone();
        let mut completable = Vec::new();
        if name == DELIVERY_NPC && self.world.current_scene == DELIVERY_SCENE {
            let delivering = self
                .progress
                .quests()
                .values()
                .any(|q| q.is_active() && q.target.awaits(DELIVERY_CONDITION));
            if delivering {
                completable = self
                    .progress
                    .satisfy_condition(DELIVERY_CONDITION, &self.character.inventory);
            }
        }
        Ok((npc, completable))
    }

    /// Quests offered by NPCs in the current scene, with their status.
    pub fn quests_offered_here(&self) -> Result<Vec<&QuestRecord>, GameError> {
        let offered: BTreeSet<&str> = self
            .npcs_here()?
            .into_iter()
            .flat_map(|npc| npc.quests.iter().map(String::as_str))
            .collect();
        Ok(offered
            .into_iter()
            .filter_map(|name| self.progress.quest(name))
            .collect())
    }

    /// Accept a quest from an NPC in the current scene.
    pub fn accept_quest(&mut self, name: &str) -> Result<(), GameError> {
        let offered = self
            .quests_offered_here()?
            .iter()
            .any(|q| q.name == name && q.status == QuestStatus::Available);
        if !offered && self.progress.quest(name).is_some() {
            return Err(GameError::Input(format!("nobody here offers '{}'", name)));
        }
        self.progress.accept_quest(name)?;
        Ok(())
    }

    pub fn complete_quest<R: Rng + ?Sized>(
        &mut self,
        name: &str,
        rng: &mut R,
    ) -> Result<QuestCompletion, GameError> {
        self.progress
            .complete_quest(name, &mut self.character, rng, &mut self.achievements)
    }

    pub fn travel<R: Rng + ?Sized>(&mut self, key: &str, rng: &mut R) -> Result<TravelReport, GameError> {
        self.world
            .travel(key, &self.catalog, rng, &mut self.achievements)
    }

    /// Pay to unlock a scene. Returns the gold spent.
    pub fn unlock_scene(&mut self, key: &str) -> Result<u64, GameError> {
        let profile = self.profile();
        self.world
            .unlock_scene(key, &self.catalog, &profile, &mut self.character)
    }

    pub fn rest(&mut self) -> i64 {
        self.world.rest(&mut self.character)
    }

    /// Spend the night at the town inn.
    pub fn stay_at_inn(&mut self) -> Result<TimeAdvance, GameError> {
        if self.world.current_scene != INN_SCENE {
            return Err(GameError::Input("there is no inn here".into()));
        }
        self.world
            .stay_at_inn(&mut self.character, &mut self.achievements)
    }

    /// Buy one unit of `item` from an NPC here at their price.
    pub fn buy(&mut self, npc: &str, item: &str) -> Result<u64, GameError> {
        let price = *self
            .npc_here(npc)?
            .trades
            .get(item)
            .ok_or_else(|| GameError::NotFound(format!("{} does not sell {}", npc, item)))?;
        self.character.spend_gold(price)?;
        self.character.add_item(item, 1, &mut self.achievements);
        self.progress.record_trade(&mut self.achievements);
        self.progress.on_inventory_changed(&self.character.inventory);
        Ok(price)
    }

    /// Sell up to `qty` units of a material, treasure or consumable at its
    /// catalog value to any trader here. Returns units sold and gold earned.
    pub fn sell(&mut self, item: &str, qty: u32) -> Result<(u32, u64), GameError> {
        if !self.npcs_here()?.iter().any(|npc| !npc.trades.is_empty()) {
            return Err(GameError::Input("nobody here is buying".into()));
        }
        let held = self.character.inventory.count(item);
        if held == 0 {
            return Err(GameError::InsufficientResource(format!("'{}' in inventory", item)));
        }
        let def = self.catalog.require_item(item)?;
        if !def.kind.sellable() {
            return Err(GameError::Input(format!("{} cannot be sold", item)));
        }
        let value = def.value;
        let sold = self.character.remove_item(item, qty.clamp(1, held));
        let earned = value * sold as u64;
        self.character.add_gold(earned, &mut self.achievements);
        self.progress.record_trade(&mut self.achievements);
        self.progress.on_inventory_changed(&self.character.inventory);
        Ok((sold, earned))
    }
}
