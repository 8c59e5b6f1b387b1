//! One encounter: enemy scaling, the turn loop and its resolution.
//!
//! A [`CombatSession`] borrows the character and the game context for its
//! whole lifetime and walks `Scaling -> InProgress -> Resolved`. The
//! presentation layer feeds it one [`CombatAction`] per prompt through
//! [`CombatSession::step`].

use log::{debug, info};
use rand::Rng;
use std::fmt;

use crate::game::achievement;
use crate::game::catalog::EnemyTemplate;
use crate::game::character::{Character, ItemUse, LevelUp};
use crate::game::difficulty::DifficultyProfile;
use crate::game::errors::GameError;
use crate::game::magic::{MagicAffinity, SecondaryEffect};
use crate::game::GameContext;

pub const FLEE_CHANCE: f64 = 0.5;
/// Gold taken from a defeated player.
pub const DEFEAT_GOLD_PENALTY: u64 = 50;
const PETRIFY_DEFENSE_FACTOR: f64 = 0.8;

/// A scaled, encounter-only copy of an enemy template.
#[derive(Debug, Clone, PartialEq)]
pub struct EnemyInstance {
    pub name: String,
    pub hp: i64,
    pub max_hp: i64,
    pub attack: i64,
    pub defense: i64,
    pub element: Option<MagicAffinity>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombatAction {
    Attack,
    Magic,
    UseItem(String),
    Flee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatResult {
    Victory,
    Defeat,
    Fled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatState {
    Scaling,
    InProgress,
    Resolved(CombatResult),
}

/// Something that happened during a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombatEvent {
    PlayerHit { damage: i64 },
    MagicHit { affinity: MagicAffinity, damage: i64 },
    Secondary(SecondaryEffect),
    MagicExperience { amount: u64, levels: u32 },
    NoAffinity,
    ItemUsed { name: String, effect: ItemUse },
    FleeFailed,
    Fled,
    EnemyHit { damage: i64 },
    EnemyDefeated,
    PlayerDefeated { gold_lost: u64 },
    Rewarded { exp: u64, gold: u64 },
    Dropped(String),
    LevelUp(LevelUp),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub round: u32,
    pub events: Vec<CombatEvent>,
    pub resolved: Option<CombatResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rewards {
    pub exp: u64,
    pub gold: u64,
    pub drops: Vec<String>,
}

/// What the rest of the game needs to know once an encounter is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombatOutcome {
    pub enemy: String,
    pub result: CombatResult,
    pub rounds: u32,
    pub rewards: Option<Rewards>,
    pub gold_lost: u64,
    pub consumables_used: u32,
}

impl EnemyInstance {
    fn unscaled(template: &EnemyTemplate) -> Self {
        EnemyInstance {
            name: template.name.clone(),
            hp: template.hp,
            max_hp: template.hp,
            attack: template.attack,
            defense: template.defense,
            element: template.element,
        }
    }
}

/// Truncate toward zero like every other scaled number in the game.
fn scale(value: i64, factor: f64) -> i64 {
    (value as f64 * factor) as i64
}

/// Derive an encounter's enemy from its template. Each multiplication is
/// truncated before the next, then the result is clamped between the
/// template value and its cap (5x for hp, 3x for attack and defense).
pub fn scale_enemy(
    template: &EnemyTemplate,
    level: u32,
    player_attack: i64,
    player_defense: i64,
    profile: &DifficultyProfile,
) -> EnemyInstance {
    let level_scale = (level.max(1) - 1) as f64 * 0.1;

    let hp = scale(scale(template.hp, 1.0 + level_scale), profile.monster_hp_mult)
        .clamp(template.hp, template.hp * 5);
    let attack = scale(
        scale(template.attack, 1.0 + level_scale + player_defense as f64 * 0.15),
        profile.monster_attack_mult,
    )
    .clamp(template.attack, template.attack * 3);
    let defense = scale(
        scale(template.defense, 1.0 + level_scale + player_attack as f64 * 0.2),
        profile.monster_defense_mult,
    )
    .clamp(template.defense, template.defense * 3);

    EnemyInstance {
        name: template.name.clone(),
        hp,
        max_hp: hp,
        attack,
        defense,
        element: template.element,
    }
}

/// `max(1, attack - defense + roll)` with `roll` in `[-2, 3]`. Used for both sides.
pub fn physical_damage<R: Rng + ?Sized>(attack: i64, defense: i64, rng: &mut R) -> i64 {
    (attack - defense + rng.gen_range(-2..=3)).max(1)
}

pub struct CombatSession<'a> {
    ctx: GameContext<'a>,
    character: &'a mut Character,
    template: &'a EnemyTemplate,
    enemy: EnemyInstance,
    state: CombatState,
    round: u32,
    rewards: Option<Rewards>,
    gold_lost: u64,
    consumables_used: u32,
}

impl<'a> CombatSession<'a> {
    /// Look up the template and scale it against the character.
    pub fn start(
        ctx: GameContext<'a>,
        character: &'a mut Character,
        enemy_name: &str,
    ) -> Result<Self, GameError> {
        let catalog = ctx.catalog;
        let template = catalog.require_enemy(enemy_name)?;
        let mut session = CombatSession {
            enemy: EnemyInstance::unscaled(template),
            ctx,
            character,
            template,
            state: CombatState::Scaling,
            round: 1,
            rewards: None,
            gold_lost: 0,
            consumables_used: 0,
        };
        session.apply_scaling();
        info!(
            "combat start: {} vs {} (hp {} atk {} def {})",
            crate::logutil::loggable(&session.character.name),
            session.enemy.name,
            session.enemy.hp,
            session.enemy.attack,
            session.enemy.defense
        );
        Ok(session)
    }

    fn apply_scaling(&mut self) {
        debug_assert_eq!(self.state, CombatState::Scaling);
        self.enemy = scale_enemy(
            self.template,
            self.character.level,
            self.character.attack,
            self.character.defense,
            &self.ctx.profile,
        );
        self.state = CombatState::InProgress;
    }

    pub fn state(&self) -> CombatState {
        self.state
    }

    pub fn enemy(&self) -> &EnemyInstance {
        &self.enemy
    }

    pub fn character(&self) -> &Character {
        self.character
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.state, CombatState::Resolved(_))
    }

    /// Play one round: the player's action, then the enemy's if it still stands.
    ///
    /// Casting without an affinity and failed item use return without an
    /// enemy turn and without advancing the round.
    pub fn step<R: Rng + ?Sized>(&mut self, action: CombatAction, rng: &mut R) -> Result<TurnReport, GameError> {
        if self.is_resolved() {
            return Err(GameError::Input("combat is already over".into()));
        }
        let mut events = Vec::new();

        match action {
            CombatAction::Attack => {
                let damage = physical_damage(self.character.attack, self.enemy.defense, rng);
                self.enemy.hp -= damage;
                events.push(CombatEvent::PlayerHit { damage });
            }
            CombatAction::Magic => {
                let (Some(affinity), Some(damage)) = (
                    self.character.magic_affinity,
                    self.character.calculate_magic_damage(self.enemy.element),
                ) else {
                    return Ok(TurnReport {
                        round: self.round,
                        events: vec![CombatEvent::NoAffinity],
                        resolved: None,
                    });
                };
                self.enemy.hp -= damage;
                events.push(CombatEvent::MagicHit { affinity, damage });
                if let Some(effect) = affinity.roll_secondary(rng) {
                    if effect == SecondaryEffect::Petrify {
                        self.enemy.defense = scale(self.enemy.defense, PETRIFY_DEFENSE_FACTOR);
                    }
                    events.push(CombatEvent::Secondary(effect));
                }
                let amount = rng.gen_range(5..=15);
                let levels = self.character.gain_magic_experience(amount);
                events.push(CombatEvent::MagicExperience { amount, levels });
            }
            CombatAction::UseItem(name) => {
                let effect = self.character.use_item(
                    &name,
                    self.ctx.catalog,
                    rng,
                    &mut *self.ctx.achievements,
                )?;
                self.consumables_used += 1;
                events.push(CombatEvent::ItemUsed { name, effect });
            }
            CombatAction::Flee => {
                if rng.gen::<f64>() < FLEE_CHANCE {
                    events.push(CombatEvent::Fled);
                    return Ok(self.resolve(CombatResult::Fled, events));
                }
                events.push(CombatEvent::FleeFailed);
            }
        }

        if self.enemy.hp <= 0 {
            events.push(CombatEvent::EnemyDefeated);
            self.award_victory(rng, &mut events);
            return Ok(self.resolve(CombatResult::Victory, events));
        }

        let damage = physical_damage(self.enemy.attack, self.character.defense, rng);
        self.character.take_damage(damage);
        events.push(CombatEvent::EnemyHit { damage });

        if self.character.is_down() {
            self.character.hp = 1;
            self.gold_lost = self.character.lose_gold(DEFEAT_GOLD_PENALTY);
            events.push(CombatEvent::PlayerDefeated {
                gold_lost: self.gold_lost,
            });
            return Ok(self.resolve(CombatResult::Defeat, events));
        }

        let report = TurnReport {
            round: self.round,
            events,
            resolved: None,
        };
        self.round += 1;
        Ok(report)
    }

    /// Attack every round until the encounter ends.
    pub fn auto_resolve<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Vec<TurnReport>, GameError> {
        let mut reports = Vec::new();
        while !self.is_resolved() {
            reports.push(self.step(CombatAction::Attack, rng)?);
        }
        Ok(reports)
    }

    /// Summary for the progression tracker. `None` while still in progress.
    pub fn outcome(&self) -> Option<CombatOutcome> {
        let CombatState::Resolved(result) = self.state else {
            return None;
        };
        Some(CombatOutcome {
            enemy: self.enemy.name.clone(),
            result,
            rounds: self.round,
            rewards: self.rewards.clone(),
            gold_lost: self.gold_lost,
            consumables_used: self.consumables_used,
        })
    }

    fn resolve(&mut self, result: CombatResult, events: Vec<CombatEvent>) -> TurnReport {
        self.state = CombatState::Resolved(result);
        debug!("combat with {} resolved: {:?}", self.enemy.name, result);
        TurnReport {
            round: self.round,
            events,
            resolved: Some(result),
        }
    }

    fn award_victory<R: Rng + ?Sized>(&mut self, rng: &mut R, events: &mut Vec<CombatEvent>) {
        let profile = self.ctx.profile;
        let sink = &mut *self.ctx.achievements;
        let exp = (self.template.exp as f64 * profile.exp_mult) as u64;
        let gold = (self.template.gold as f64 * profile.gold_mult) as u64;

        events.push(CombatEvent::Rewarded { exp, gold });
        for up in self.character.gain_experience(exp, rng, sink) {
            events.push(CombatEvent::LevelUp(up));
        }
        self.character.add_gold(gold, sink);

        let mut drops = Vec::new();
        for item in &self.template.drops {
            if rng.gen::<f64>() < profile.item_drop_chance {
                self.character.add_item(item, 1, sink);
                events.push(CombatEvent::Dropped(item.clone()));
                drops.push(item.clone());
            }
        }

        if self.template.name == "恶魔" {
            sink.unlock(achievement::CASTLE_HERO);
        }
        self.rewards = Some(Rewards { exp, gold, drops });
    }
}

impl fmt::Display for CombatEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombatEvent::PlayerHit { damage } => write!(f, "你造成了 {} 点物理伤害！", damage),
            CombatEvent::MagicHit { affinity, damage } => write!(
                f,
                "你释放了 {} 魔法，造成了 {} 点魔法伤害！",
                affinity.display_name(),
                damage
            ),
            CombatEvent::Secondary(SecondaryEffect::Burn) => write!(f, "燃烧效果：敌人被火焰灼伤！"),
            CombatEvent::Secondary(SecondaryEffect::Freeze) => write!(f, "冰冻效果：敌人被冻住了！"),
            CombatEvent::Secondary(SecondaryEffect::Petrify) => write!(f, "石化效果：敌人防御降低20%！"),
            CombatEvent::MagicExperience { amount, levels } => {
                write!(f, "获得 {} 点魔法经验", amount)?;
                if *levels > 0 {
                    write!(f, "，魔法等级提升了 {} 级！", levels)?;
                }
                Ok(())
            }
            CombatEvent::NoAffinity => write!(f, "你还没有选择魔法属系！"),
            CombatEvent::ItemUsed { name, effect } => match effect {
                ItemUse::Healed(hp) => write!(f, "使用了 {}，恢复 {} 点生命值", name, hp),
                ItemUse::GainedExperience { amount, .. } => {
                    write!(f, "使用了 {}，获得 {} 点经验值", name, amount)
                }
                ItemUse::NoEffect => write!(f, "使用了 {}", name),
            },
            CombatEvent::FleeFailed => write!(f, "逃跑失败！"),
            CombatEvent::Fled => write!(f, "你成功逃脱了！"),
            CombatEvent::EnemyHit { damage } => write!(f, "敌人对你造成了 {} 点伤害！", damage),
            CombatEvent::EnemyDefeated => write!(f, "敌人被击败了！"),
            CombatEvent::PlayerDefeated { gold_lost } => {
                write!(f, "你被击败了！损失了 {} 金币，勉强活了下来。", gold_lost)
            }
            CombatEvent::Rewarded { exp, gold } => {
                write!(f, "战斗胜利！获得 {} 经验值和 {} 金币", exp, gold)
            }
            CombatEvent::Dropped(item) => write!(f, "敌人掉落了 {}！", item),
            CombatEvent::LevelUp(up) => write!(
                f,
                "升级了！现在是 {} 级 (生命+{} 攻击+{} 防御+{})",
                up.new_level, up.hp, up.attack, up.defense
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::achievement::{AchievementSet, AchievementSink};
    use crate::game::catalog::ContentCatalog;
    use crate::game::difficulty::Difficulty;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn wolf() -> EnemyTemplate {
        ContentCatalog::standard()
            .enemy_template("野狼")
            .cloned()
            .unwrap()
    }

    #[test]
    fn scaling_at_level_one_with_weak_player_is_template() {
        let e = scale_enemy(&wolf(), 1, 0, 0, &Difficulty::Normal.profile());
        assert_eq!((e.hp, e.attack, e.defense), (30, 8, 3));
    }

    #[test]
    fn scaling_truncates_each_step() {
        // 30 * 1.1 = 33, then 33 * 0.7 = 23.1 -> 23, clamped up to 30.
        let e = scale_enemy(&wolf(), 2, 0, 0, &Difficulty::Easy.profile());
        assert_eq!(e.hp, 30);
        // Hard: 30 * 1.1 = 33 -> 33 * 1.5 = 49.5 -> 49
        let e = scale_enemy(&wolf(), 2, 0, 0, &Difficulty::Hard.profile());
        assert_eq!(e.hp, 49);
        // attack: 8 * (1 + 0.1 + 5 * 0.15) = 14.8 -> 14, * 1.3 = 18.2 -> 18, capped at 24
        let e = scale_enemy(&wolf(), 2, 0, 5, &Difficulty::Hard.profile());
        assert_eq!(e.attack, 18);
    }

    #[test]
    fn scaling_respects_caps() {
        let e = scale_enemy(&wolf(), 200, 500, 500, &Difficulty::Ultimate.profile());
        assert_eq!((e.hp, e.attack, e.defense), (150, 24, 9));
    }

    #[test]
    fn physical_damage_range() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..1000 {
            let d = physical_damage(10, 3, &mut rng);
            assert!((5..=10).contains(&d));
            assert_eq!(physical_damage(1, 50, &mut rng), 1);
        }
    }

    #[test]
    fn magic_without_affinity_skips_enemy_turn() {
        let catalog = ContentCatalog::standard();
        let mut achievements = AchievementSet::default();
        let mut c = Character::blank("a");
        let mut rng = StdRng::seed_from_u64(10);
        let ctx = GameContext::new(&catalog, Difficulty::Normal, &mut achievements);
        let mut combat = CombatSession::start(ctx, &mut c, "野狼").unwrap();
        let hp = combat.character().hp;
        let report = combat.step(CombatAction::Magic, &mut rng).unwrap();
        assert_eq!(report.events, vec![CombatEvent::NoAffinity]);
        assert_eq!(combat.character().hp, hp);
        assert_eq!(combat.round(), 1);
    }

    #[test]
    fn missing_item_aborts_without_enemy_turn() {
        let catalog = ContentCatalog::standard();
        let mut achievements = AchievementSet::default();
        let mut c = Character::blank("a");
        let mut rng = StdRng::seed_from_u64(11);
        let ctx = GameContext::new(&catalog, Difficulty::Normal, &mut achievements);
        let mut combat = CombatSession::start(ctx, &mut c, "野狼").unwrap();
        let hp = combat.character().hp;
        let err = combat
            .step(CombatAction::UseItem("药水".into()), &mut rng)
            .unwrap_err();
        assert!(matches!(err, GameError::InsufficientResource(_)));
        assert_eq!(combat.character().hp, hp);
        assert_eq!(combat.state(), CombatState::InProgress);
    }

    #[test]
    fn resolved_session_rejects_further_steps() {
        let catalog = ContentCatalog::standard();
        let mut achievements = AchievementSet::default();
        let mut c = Character::blank("a");
        c.attack = 500;
        let mut rng = StdRng::seed_from_u64(12);
        let ctx = GameContext::new(&catalog, Difficulty::Normal, &mut achievements);
        let mut combat = CombatSession::start(ctx, &mut c, "蝙蝠").unwrap();
        combat.auto_resolve(&mut rng).unwrap();
        assert_eq!(combat.state(), CombatState::Resolved(CombatResult::Victory));
        assert!(combat.step(CombatAction::Attack, &mut rng).is_err());
        let outcome = combat.outcome().unwrap();
        assert_eq!(outcome.rewards.unwrap().exp, 10);
    }

    #[test]
    fn defeating_the_demon_unlocks_castle_hero() {
        let catalog = ContentCatalog::standard();
        let mut achievements = AchievementSet::default();
        let mut c = Character::blank("a");
        c.attack = 10_000;
        let mut rng = StdRng::seed_from_u64(13);
        {
            let ctx = GameContext::new(&catalog, Difficulty::Normal, &mut achievements);
            let mut combat = CombatSession::start(ctx, &mut c, "恶魔").unwrap();
            combat.step(CombatAction::Attack, &mut rng).unwrap();
            assert!(combat.is_resolved());
        }
        assert!(!achievements.unlock(achievement::CASTLE_HERO));
    }
}
