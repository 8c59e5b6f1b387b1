//! Scene activities: named things to do in a scene besides exploring.
//!
//! An activity may require a level, cost gold or consume one unit of an item,
//! and rolls a success chance. Succeeding can satisfy a quest condition key.

use rand::Rng;
use std::fmt;

use crate::game::achievement::AchievementSink;
use crate::game::character::{Character, LevelUp};

#[derive(Debug, Clone, PartialEq)]
pub enum SceneEffect {
    /// Gain `min..=max` units of an item.
    Item { name: String, qty: (u32, u32) },
    /// Gain one unit of a randomly chosen item.
    OneOf(Vec<String>),
    Gold(u64, u64),
    LoseGold(u64),
    Exp(u64, u64),
    MaxHp(i64),
    Attack(i64),
    Defense(i64),
    HealFull,
    /// Damage that never takes the character below 1 hp.
    Hurt(i64),
    Achievement(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneActionDef {
    pub name: String,
    pub scene: String,
    pub min_level: u32,
    pub gold_cost: u64,
    pub item_cost: Option<String>,
    /// Probability of the success branch, 0.0..=1.0.
    pub chance: f64,
    pub success: Vec<SceneEffect>,
    pub failure: Vec<SceneEffect>,
    pub success_text: String,
    pub failure_text: String,
    /// Quest condition key met on success.
    pub satisfies: Option<String>,
}

/// One visible change made by an activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Item { name: String, qty: u32 },
    Gold(i64),
    Exp(u64),
    MaxHp(i64),
    Attack(i64),
    Defense(i64),
    Healed(i64),
    Hurt(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SceneActionReport {
    pub action: String,
    pub succeeded: bool,
    pub text: String,
    pub changes: Vec<Change>,
    pub levels: Vec<LevelUp>,
    pub completable: Vec<String>,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Item { name, qty } => write!(f, "获得 {} x{}", name, qty),
            Change::Gold(n) if *n >= 0 => write!(f, "金币 +{}", n),
            Change::Gold(n) => write!(f, "金币 {}", n),
            Change::Exp(n) => write!(f, "经验 +{}", n),
            Change::MaxHp(n) => write!(f, "最大生命值 +{}", n),
            Change::Attack(n) => write!(f, "攻击力 +{}", n),
            Change::Defense(n) => write!(f, "防御力 +{}", n),
            Change::Healed(n) => write!(f, "恢复了 {} 点生命值", n),
            Change::Hurt(n) => write!(f, "受到 {} 点伤害", n),
        }
    }
}

impl SceneActionDef {
    pub fn new(scene: &str, name: &str, chance: f64) -> Self {
        SceneActionDef {
            name: name.to_string(),
            scene: scene.to_string(),
            min_level: 0,
            gold_cost: 0,
            item_cost: None,
            chance,
            success: Vec::new(),
            failure: Vec::new(),
            success_text: String::new(),
            failure_text: String::new(),
            satisfies: None,
        }
    }

    pub fn on_success(mut self, text: &str, effects: Vec<SceneEffect>) -> Self {
        self.success_text = text.to_string();
        self.success = effects;
        self
    }

    pub fn on_failure(mut self, text: &str, effects: Vec<SceneEffect>) -> Self {
        self.failure_text = text.to_string();
        self.failure = effects;
        self
    }

    pub fn min_level(mut self, level: u32) -> Self {
        self.min_level = level;
        self
    }

    pub fn costs_gold(mut self, gold: u64) -> Self {
        self.gold_cost = gold;
        self
    }

    pub fn consumes(mut self, item: &str) -> Self {
        self.item_cost = Some(item.to_string());
        self
    }

    pub fn satisfies(mut self, condition: &str) -> Self {
        self.satisfies = Some(condition.to_string());
        self
    }
}

impl SceneEffect {
    pub fn apply<R: Rng + ?Sized>(
        &self,
        character: &mut Character,
        rng: &mut R,
        sink: &mut dyn AchievementSink,
        report: &mut SceneActionReport,
    ) {
        let change = match self {
            SceneEffect::Item { name, qty } => {
                let qty = rng.gen_range(qty.0..=qty.1.max(qty.0));
                character.add_item(name, qty, sink);
                Change::Item { name: name.clone(), qty }
            }
            SceneEffect::OneOf(names) => {
                if names.is_empty() {
                    return;
                }
                let name = names[rng.gen_range(0..names.len())].clone();
                character.add_item(&name, 1, sink);
                Change::Item { name, qty: 1 }
            }
            SceneEffect::Gold(min, max) => {
                let amount = rng.gen_range(*min..=(*max).max(*min));
                character.add_gold(amount, sink);
                Change::Gold(amount as i64)
            }
            SceneEffect::LoseGold(amount) => Change::Gold(-(character.lose_gold(*amount) as i64)),
            SceneEffect::Exp(min, max) => {
                let amount = rng.gen_range(*min..=(*max).max(*min));
                report.levels.extend(character.gain_experience(amount, rng, sink));
                Change::Exp(amount)
            }
            SceneEffect::MaxHp(n) => {
                character.max_hp += n;
                Change::MaxHp(*n)
            }
            SceneEffect::Attack(n) => {
                character.attack += n;
                Change::Attack(*n)
            }
            SceneEffect::Defense(n) => {
                character.defense += n;
                Change::Defense(*n)
            }
            SceneEffect::HealFull => {
                let healed = character.heal(character.max_hp);
                Change::Healed(healed)
            }
            SceneEffect::Hurt(n) => {
                let dealt = character.take_damage((*n).min(character.hp - 1));
                Change::Hurt(dealt)
            }
            SceneEffect::Achievement(id) => {
                sink.unlock(id);
                return;
            }
        };
        report.changes.push(change);
    }
}
