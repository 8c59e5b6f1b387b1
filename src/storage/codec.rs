//! Line-oriented save file format.
//!
//! ```text
//! === RETRO RPG SAVE FILE ===
//! VERSION: 1.0
//! TIMESTAMP: 2024-05-01T20:15:00
//!
//! === PLAYER DATA ===
//! NAME: Aria
//! LEVEL: 3
//! ...
//! === INVENTORY ===
//! 新手药水:2
//! === EQUIPPED ===
//! weapon:新手剑
//! === GAME STATE ===
//! CURRENT_SCENE: forest
//! GAME_TIME: 2024-01-01T11:00:00
//! DAY_COUNT: 1
//! UNLOCKED_SCENES: ["forest", "town"]
//! VISITED_SCENES: ["forest"]
//! === ACHIEVEMENTS ===
//! 初次冒险
//! === QUESTS ===
//! QUEST:猎狼任务
//! DESCRIPTION:杀死5只野狼
//! TARGET:{"野狼": 5}
//! REWARD:{"exp": 50, "gold": 30, "items": ["狼牙"]}
//! STATUS:active
//! TYPE:main
//! ---
//! ```
//!
//! Decoding is tolerant: unknown lines are skipped, missing fields take the
//! defaults of a blank level-1 character, and a quest whose target or reward
//! cannot be parsed falls back to the catalog's definition.

use chrono::NaiveDateTime;
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;
use std::str::FromStr;

use crate::game::achievement::AchievementSet;
use crate::game::catalog::ContentCatalog;
use crate::game::character::Character;
use crate::game::difficulty::Difficulty;
use crate::game::errors::GameError;
use crate::game::inventory::EquipSlot;
use crate::game::magic::MagicAffinity;
use crate::game::quest::{QuestKind, QuestRecord, QuestReward, QuestStatus, QuestTarget};
use crate::game::session::SaveRecord;
use crate::game::world::{WorldState, START_SCENE, STARTING_SCENES};
use crate::logutil::loggable;
use crate::storage::value::{parse_value, Value};

pub const FILE_HEADER: &str = "=== RETRO RPG SAVE FILE ===";
pub const FORMAT_VERSION: &str = "1.0";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const DEFAULT_NAME: &str = "冒险者";
const CONDITION_KEY: &str = "action";
const QUEST_END: &str = "---";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Player,
    Inventory,
    Equipped,
    GameState,
    Achievements,
    Quests,
}

impl Section {
    fn title(self) -> &'static str {
        match self {
            Section::Player => "PLAYER DATA",
            Section::Inventory => "INVENTORY",
            Section::Equipped => "EQUIPPED",
            Section::GameState => "GAME STATE",
            Section::Achievements => "ACHIEVEMENTS",
            Section::Quests => "QUESTS",
        }
    }

    const ALL: [Section; 6] = [
        Section::Player,
        Section::Inventory,
        Section::Equipped,
        Section::GameState,
        Section::Achievements,
        Section::Quests,
    ];
}

/// `Some(title)` for a `=== TITLE ===` line.
fn header_title(line: &str) -> Option<&str> {
    let inner = line.strip_prefix("===")?.strip_suffix("===")?;
    Some(inner.trim())
}

fn section_for(title: &str) -> Option<Section> {
    Section::ALL
        .into_iter()
        .find(|s| s.title().eq_ignore_ascii_case(title))
}

/// `KEY: value` with the key lower-cased. Splits on the first colon.
fn key_value(line: &str) -> Option<(String, &str)> {
    let (key, value) = line.split_once(':')?;
    Some((key.trim().to_ascii_lowercase(), value.trim()))
}

/// Whether `text` starts with the save file header. Used to skip unrelated files.
pub fn has_file_header(text: &str) -> bool {
    text.lines()
        .find(|l| !l.trim().is_empty())
        .map(|l| l.trim() == FILE_HEADER)
        .unwrap_or(false)
}

fn single_line(s: &str) -> String {
    s.replace(['\r', '\n'], " ")
}

fn encode_target(target: &QuestTarget) -> Value {
    match target {
        QuestTarget::Items(items) => Value::Map(
            items
                .iter()
                .map(|(name, n)| (name.clone(), Value::Int(*n as i64)))
                .collect(),
        ),
        QuestTarget::Condition(key) => Value::Map(BTreeMap::from([(
            CONDITION_KEY.to_string(),
            Value::Str(key.clone()),
        )])),
    }
}

fn encode_reward(reward: &QuestReward) -> Value {
    Value::Map(BTreeMap::from([
        ("exp".to_string(), Value::Int(reward.exp as i64)),
        ("gold".to_string(), Value::Int(reward.gold as i64)),
        (
            "items".to_string(),
            Value::strings(reward.items.iter().map(String::as_str)),
        ),
    ]))
}

/// Render a save record as save file text.
pub fn encode(record: &SaveRecord) -> String {
    let c = &record.character;
    let w = &record.world;
    let mut out = String::new();

    // Writing to a String cannot fail.
    let _ = writeln!(out, "{}", FILE_HEADER);
    let _ = writeln!(out, "VERSION: {}", FORMAT_VERSION);
    if let Some(ts) = record.timestamp {
        let _ = writeln!(out, "TIMESTAMP: {}", ts.format(TIMESTAMP_FORMAT));
    }

    let _ = writeln!(out, "\n=== {} ===", Section::Player.title());
    let _ = writeln!(out, "NAME: {}", single_line(&c.name));
    let _ = writeln!(out, "LEVEL: {}", c.level);
    let _ = writeln!(out, "EXP: {}", c.experience);
    let _ = writeln!(out, "HP: {}", c.hp);
    let _ = writeln!(out, "MAX_HP: {}", c.max_hp);
    let _ = writeln!(out, "ATTACK: {}", c.attack);
    let _ = writeln!(out, "DEFENSE: {}", c.defense);
    let _ = writeln!(out, "GOLD: {}", c.gold);
    let _ = writeln!(
        out,
        "MAGIC_AFFINITY: {}",
        c.magic_affinity.map(|a| a.as_str()).unwrap_or("none")
    );
    let _ = writeln!(out, "MAGIC_POWER: {}", c.magic_power);
    let _ = writeln!(out, "MAGIC_EXP: {}", c.magic_experience);
    let _ = writeln!(out, "MAGIC_LEVEL: {}", c.magic_level);
    let _ = writeln!(out, "DIFFICULTY: {}", record.difficulty);

    let _ = writeln!(out, "\n=== {} ===", Section::Inventory.title());
    for (name, qty) in c.inventory.iter() {
        let _ = writeln!(out, "{}:{}", single_line(name), qty);
    }

    let _ = writeln!(out, "\n=== {} ===", Section::Equipped.title());
    for (slot, item) in c.equipment.iter() {
        let _ = writeln!(out, "{}:{}", slot, single_line(item));
    }

    let _ = writeln!(out, "\n=== {} ===", Section::GameState.title());
    let _ = writeln!(out, "CURRENT_SCENE: {}", w.current_scene);
    let _ = writeln!(out, "GAME_TIME: {}", w.game_time.format(TIMESTAMP_FORMAT));
    let _ = writeln!(out, "DAY_COUNT: {}", w.day_count);
    let _ = writeln!(
        out,
        "UNLOCKED_SCENES: {}",
        Value::strings(w.unlocked_scenes.iter().map(String::as_str))
    );
    let _ = writeln!(
        out,
        "VISITED_SCENES: {}",
        Value::strings(w.visited_scenes.iter().map(String::as_str))
    );

    let _ = writeln!(out, "\n=== {} ===", Section::Achievements.title());
    for id in record.achievements.iter() {
        let _ = writeln!(out, "{}", id);
    }

    let _ = writeln!(out, "\n=== {} ===", Section::Quests.title());
    for quest in record.quests.values() {
        let _ = writeln!(out, "QUEST:{}", single_line(&quest.name));
        let _ = writeln!(out, "DESCRIPTION:{}", single_line(&quest.description));
        let _ = writeln!(out, "TARGET:{}", encode_target(&quest.target));
        let _ = writeln!(out, "REWARD:{}", encode_reward(&quest.reward));
        let _ = writeln!(out, "STATUS:{}", quest.status);
        let _ = writeln!(out, "TYPE:{}", quest.kind.as_str());
        let _ = writeln!(out, "{}", QUEST_END);
    }
    out
}

fn field_error(reason: impl Into<String>) -> GameError {
    GameError::StructuredFieldDecode {
        offset: 0,
        reason: reason.into(),
    }
}

fn decode_target(text: &str) -> Result<QuestTarget, GameError> {
    let value = parse_value(text)?;
    let map = value
        .as_map()
        .ok_or_else(|| field_error("quest target is not a map"))?;
    if map.len() == 1 {
        if let Some(key) = map.get(CONDITION_KEY).and_then(Value::as_str) {
            return Ok(QuestTarget::Condition(key.to_string()));
        }
    }
    let mut items = BTreeMap::new();
    for (name, count) in map {
        let count = count
            .as_int()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| field_error(format!("bad count for '{}'", name)))?;
        items.insert(name.clone(), count);
    }
    Ok(QuestTarget::Items(items))
}

fn decode_reward(text: &str) -> Result<QuestReward, GameError> {
    let value = parse_value(text)?;
    let map = value
        .as_map()
        .ok_or_else(|| field_error("quest reward is not a map"))?;
    let amount = |key: &str| -> Result<u64, GameError> {
        match map.get(key) {
            None => Ok(0),
            Some(v) => v
                .as_int()
                .and_then(|n| u64::try_from(n).ok())
                .ok_or_else(|| field_error(format!("bad reward {}", key))),
        }
    };
    let items = match map.get("items") {
        None => Vec::new(),
        Some(list) => list
            .as_list()
            .ok_or_else(|| field_error("reward items is not a list"))?
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| field_error("reward item is not a string"))
            })
            .collect::<Result<Vec<_>, _>>()?,
    };
    Ok(QuestReward {
        exp: amount("exp")?,
        gold: amount("gold")?,
        items,
    })
}

fn decode_scene_list(text: &str) -> Result<BTreeSet<String>, GameError> {
    let value = parse_value(text)?;
    let list = value
        .as_list()
        .ok_or_else(|| field_error("scene list is not a list"))?;
    list.iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| field_error("scene key is not a string"))
        })
        .collect()
}

/// Raw fields of one `QUEST:` block before they are validated.
#[derive(Default)]
struct QuestDraft {
    name: String,
    description: Option<String>,
    target: Option<String>,
    reward: Option<String>,
    status: Option<String>,
    kind: Option<String>,
}

impl QuestDraft {
    fn build(&self) -> Result<QuestRecord, GameError> {
        let target = decode_target(
            self.target
                .as_deref()
                .ok_or_else(|| field_error("missing target"))?,
        )?;
        let reward = match self.reward.as_deref() {
            Some(text) => decode_reward(text)?,
            None => QuestReward::default(),
        };
        Ok(QuestRecord {
            name: self.name.clone(),
            description: self.description.clone().unwrap_or_default(),
            target,
            reward,
            status: self.status()?,
            kind: match self.kind.as_deref() {
                Some(kind) => QuestKind::from_str(kind)?,
                None => QuestKind::Side,
            },
        })
    }

    fn status(&self) -> Result<QuestStatus, GameError> {
        match self.status.as_deref() {
            Some(status) => QuestStatus::from_str(status),
            None => Ok(QuestStatus::Available),
        }
    }

    /// Decode, or fall back to the catalog entry carrying over the saved status.
    fn resolve(self, catalog: &ContentCatalog) -> Option<QuestRecord> {
        match self.build() {
            Ok(quest) => Some(quest),
            Err(e) => {
                let Some(def) = catalog.quest_def(&self.name) else {
                    warn!(
                        "dropping undecodable quest '{}': {}",
                        loggable(&self.name),
                        e
                    );
                    return None;
                };
                warn!(
                    "quest '{}' could not be decoded ({}); using its catalog definition",
                    loggable(&self.name),
                    e
                );
                let mut quest = def.clone();
                if let Ok(status) = self.status() {
                    quest.restore_status(status);
                }
                Some(quest)
            }
        }
    }
}

fn parse_or<T: FromStr>(key: &str, value: &str, fallback: T) -> T {
    match value.parse() {
        Ok(v) => v,
        Err(_) => {
            warn!("bad value for {}: '{}'", key, loggable(value));
            fallback
        }
    }
}

/// Decode save file text. Fails only when no known section is present.
pub fn decode(text: &str, catalog: &ContentCatalog) -> Result<SaveRecord, GameError> {
    let mut character = Character::blank(DEFAULT_NAME);
    let mut difficulty = Difficulty::default();
    let mut world = WorldState::new(START_SCENE);
    world.unlocked_scenes.clear();
    world.visited_scenes.clear();
    let mut unlocked_seen = false;
    let mut visited_seen = false;
    let mut achievements = AchievementSet::default();
    let mut quests = BTreeMap::new();
    let mut timestamp = None;

    let mut section: Option<Section> = None;
    let mut any_section = false;
    let mut quest: Option<QuestDraft> = None;

    for raw in text.lines() {
        // Inventory names are kept verbatim; every other field is trimmed.
        let verbatim = raw.strip_suffix('\r').unwrap_or(raw);
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(title) = header_title(line) {
            section = section_for(title);
            any_section |= section.is_some();
            continue;
        }

        match section {
            None => {
                if let Some((key, value)) = key_value(line) {
                    if key == "timestamp" {
                        timestamp = value.parse::<NaiveDateTime>().ok();
                    }
                }
            }
            Some(Section::Player) => {
                let Some((key, value)) = key_value(line) else {
                    continue;
                };
                match key.as_str() {
                    "name" if !value.is_empty() => character.name = value.to_string(),
                    "level" => character.level = parse_or(&key, value, character.level),
                    "exp" => character.experience = parse_or(&key, value, character.experience),
                    "hp" => character.hp = parse_or(&key, value, character.hp),
                    "max_hp" => character.max_hp = parse_or(&key, value, character.max_hp),
                    "attack" => character.attack = parse_or(&key, value, character.attack),
                    "defense" => character.defense = parse_or(&key, value, character.defense),
                    "gold" => character.gold = parse_or(&key, value, character.gold),
                    "magic_affinity" => {
                        character.magic_affinity = match value.to_ascii_lowercase().as_str() {
                            "" | "none" => None,
                            _ => match MagicAffinity::from_str(value) {
                                Ok(affinity) => Some(affinity),
                                Err(e) => {
                                    warn!("{}", e);
                                    None
                                }
                            },
                        }
                    }
                    "magic_power" => character.magic_power = parse_or(&key, value, character.magic_power),
                    "magic_exp" => {
                        character.magic_experience = parse_or(&key, value, character.magic_experience)
                    }
                    "magic_level" => character.magic_level = parse_or(&key, value, character.magic_level),
                    "difficulty" => difficulty = parse_or(&key, value, difficulty),
                    _ => debug!("ignoring player field {}", key),
                }
            }
            Some(Section::Inventory) => {
                // Item names may contain ':'; the quantity follows the last one.
                let Some((name, qty)) = verbatim.rsplit_once(':') else {
                    continue;
                };
                match qty.trim().parse::<u32>() {
                    Ok(qty) if !name.trim().is_empty() => character.inventory.add(name, qty),
                    _ => warn!("bad inventory line '{}'", loggable(line)),
                }
            }
            Some(Section::Equipped) => {
                let Some((slot, item)) = line.split_once(':') else {
                    continue;
                };
                match EquipSlot::from_str(slot) {
                    Ok(slot) if !item.trim().is_empty() => {
                        character.equipment.replace(slot, item.trim().to_string());
                    }
                    _ => warn!("bad equipment line '{}'", loggable(line)),
                }
            }
            Some(Section::GameState) => {
                let Some((key, value)) = key_value(line) else {
                    continue;
                };
                match key.as_str() {
                    "current_scene" if !value.is_empty() => world.current_scene = value.to_string(),
                    "game_time" => world.game_time = parse_or(&key, value, world.game_time),
                    "day_count" => world.day_count = parse_or(&key, value, world.day_count).max(1),
                    "unlocked_scenes" => match decode_scene_list(value) {
                        Ok(scenes) => {
                            world.unlocked_scenes = scenes;
                            unlocked_seen = true;
                        }
                        Err(e) => warn!("bad unlocked scene list: {}", e),
                    },
                    "visited_scenes" => match decode_scene_list(value) {
                        Ok(scenes) => {
                            world.visited_scenes = scenes;
                            visited_seen = true;
                        }
                        Err(e) => warn!("bad visited scene list: {}", e),
                    },
                    _ => debug!("ignoring game state field {}", key),
                }
            }
            Some(Section::Achievements) => achievements.restore(line),
            Some(Section::Quests) => {
                if line == QUEST_END {
                    if let Some(q) = quest.take().and_then(|d| d.resolve(catalog)) {
                        quests.insert(q.name.clone(), q);
                    }
                    continue;
                }
                if let Some(name) = line
                    .get(..6)
                    .filter(|p| p.eq_ignore_ascii_case("quest:"))
                    .map(|_| line[6..].trim())
                {
                    if let Some(q) = quest.take().and_then(|d| d.resolve(catalog)) {
                        quests.insert(q.name.clone(), q);
                    }
                    quest = Some(QuestDraft {
                        name: name.to_string(),
                        ..Default::default()
                    });
                    continue;
                }
                let (Some(draft), Some((key, value))) = (quest.as_mut(), key_value(line)) else {
                    continue;
                };
                let value = Some(value.to_string());
                match key.as_str() {
                    "description" => draft.description = value,
                    "target" => draft.target = value,
                    "reward" => draft.reward = value,
                    "status" => draft.status = value,
                    "type" => draft.kind = value,
                    _ => debug!("ignoring quest field {}", key),
                }
            }
        }
    }
    if let Some(q) = quest.take().and_then(|d| d.resolve(catalog)) {
        quests.insert(q.name.clone(), q);
    }

    if !any_section {
        return Err(GameError::SaveCorrupt("no recognised section".into()));
    }

    if !unlocked_seen {
        world.unlocked_scenes = STARTING_SCENES.iter().map(|s| s.to_string()).collect();
    }
    world.unlocked_scenes.insert(world.current_scene.clone());
    if !visited_seen {
        world.visited_scenes.insert(world.current_scene.clone());
    }
    character.normalize();

    Ok(SaveRecord {
        character,
        difficulty,
        world,
        achievements,
        quests,
        timestamp,
    })
}
