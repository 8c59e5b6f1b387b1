//! World state: where the player is, the in-game clock and scene access.
//!
//! All clock movement goes through [`WorldState::advance_time`], which is
//! also the only place the day counter changes.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use log::debug;
use rand::Rng;
use std::collections::BTreeSet;

use crate::game::achievement::{self, AchievementSink, DAYS_FOR_SURVIVOR};
use crate::game::catalog::{ContentCatalog, SceneDef};
use crate::game::character::Character;
use crate::game::difficulty::DifficultyProfile;
use crate::game::errors::GameError;

pub const START_SCENE: &str = "forest";
/// Scenes open from the start of every game.
pub const STARTING_SCENES: [&str; 2] = ["forest", "town"];
pub const MORNING_HOUR: u32 = 8;
pub const INN_PRICE: u64 = 50;
pub const REST_HEAL: i64 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldState {
    pub current_scene: String,
    pub game_time: NaiveDateTime,
    pub day_count: u32,
    pub unlocked_scenes: BTreeSet<String>,
    pub visited_scenes: BTreeSet<String>,
}

/// How far the clock moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeAdvance {
    pub hours: u32,
    pub new_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TravelReport {
    pub scene: String,
    pub time: TimeAdvance,
    pub first_visit: bool,
}

/// Day one, 08:00.
pub fn start_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(MORNING_HOUR, 0, 0))
        .unwrap_or_default()
}

impl WorldState {
    pub fn new(start_scene: &str) -> Self {
        WorldState {
            current_scene: start_scene.to_string(),
            game_time: start_time(),
            day_count: 1,
            unlocked_scenes: STARTING_SCENES.iter().map(|s| s.to_string()).collect(),
            visited_scenes: BTreeSet::from([start_scene.to_string()]),
        }
    }

    pub fn hour(&self) -> u32 {
        self.game_time.hour()
    }

    /// Move the clock forward. Each midnight crossed starts a new day.
    pub fn advance_time(&mut self, hours: u32) -> TimeAdvance {
        let before = self.game_time.date();
        self.game_time += Duration::hours(hours as i64);
        let new_days = (self.game_time.date() - before).num_days().max(0) as u32;
        self.day_count += new_days;
        if new_days > 0 {
            debug!("day {} begins", self.day_count);
        }
        TimeAdvance { hours, new_days }
    }

    /// The usual cost of an action: one to three hours.
    pub fn pass_random_time<R: Rng + ?Sized>(&mut self, rng: &mut R) -> TimeAdvance {
        let hours = rng.gen_range(1..=3);
        self.advance_time(hours)
    }

    /// Hours until the next 08:00.
    pub fn hours_until_morning(&self) -> u32 {
        let hour = self.hour();
        if hour < MORNING_HOUR {
            MORNING_HOUR - hour
        } else {
            24 - hour + MORNING_HOUR
        }
    }

    pub fn current_scene_def<'c>(&self, catalog: &'c ContentCatalog) -> Result<&'c SceneDef, GameError> {
        catalog.require_scene(&self.current_scene)
    }

    /// Fails with [`GameError::Closed`] when the current scene is outside its hours.
    pub fn check_open(&self, catalog: &ContentCatalog) -> Result<(), GameError> {
        let scene = self.current_scene_def(catalog)?;
        match scene.time_restriction {
            Some((open, close)) if !scene.is_open_at(self.hour()) => Err(GameError::Closed {
                scene: scene.name.clone(),
                open,
                close,
            }),
            _ => Ok(()),
        }
    }

    pub fn is_unlocked(&self, key: &str) -> bool {
        self.unlocked_scenes.contains(key)
    }

    /// Gold needed to unlock `key` under `profile`, or `None` if already open.
    pub fn unlock_cost(
        &self,
        key: &str,
        catalog: &ContentCatalog,
        profile: &DifficultyProfile,
    ) -> Result<Option<u64>, GameError> {
        let scene = catalog.require_scene(key)?;
        if self.is_unlocked(key) {
            return Ok(None);
        }
        Ok(Some(profile.unlock_cost(scene.required_gold) as u64))
    }

    /// Pay to open a scene. Returns the gold spent; zero if it was already open.
    pub fn unlock_scene(
        &mut self,
        key: &str,
        catalog: &ContentCatalog,
        profile: &DifficultyProfile,
        character: &mut Character,
    ) -> Result<u64, GameError> {
        let Some(cost) = self.unlock_cost(key, catalog, profile)? else {
            return Ok(0);
        };
        character.spend_gold(cost)?;
        self.unlocked_scenes.insert(key.to_string());
        Ok(cost)
    }

    /// Walk to an unlocked scene. Costs one to three hours and may unlock the
    /// scene's visit achievement and the all-scenes achievement.
    pub fn travel<R: Rng + ?Sized>(
        &mut self,
        key: &str,
        catalog: &ContentCatalog,
        rng: &mut R,
        sink: &mut dyn AchievementSink,
    ) -> Result<TravelReport, GameError> {
        let scene = catalog.require_scene(key)?;
        if !self.is_unlocked(key) {
            return Err(GameError::Input(format!("{} is still locked", scene.name)));
        }
        let time = self.pass_random_time(rng);
        self.current_scene = key.to_string();
        let first_visit = self.visited_scenes.insert(key.to_string());

        if let Some(id) = &scene.visit_achievement {
            sink.unlock(id);
        }
        if catalog.scenes().all(|s| self.visited_scenes.contains(&s.key)) {
            sink.unlock(achievement::ADVENTURER);
        }
        Ok(TravelReport {
            scene: key.to_string(),
            time,
            first_visit,
        })
    }

    /// Rest for an hour, healing up to 20 hp. Returns hp restored.
    pub fn rest(&mut self, character: &mut Character) -> i64 {
        let healed = character.heal(REST_HEAL);
        self.advance_time(1);
        healed
    }

    /// Pay for a night at the inn: full heal, sleep until 08:00.
    pub fn stay_at_inn(
        &mut self,
        character: &mut Character,
        sink: &mut dyn AchievementSink,
    ) -> Result<TimeAdvance, GameError> {
        character.spend_gold(INN_PRICE)?;
        character.heal_full();
        let slept = self.advance_time(self.hours_until_morning());
        if self.day_count >= DAYS_FOR_SURVIVOR {
            sink.unlock(achievement::SURVIVOR);
        }
        Ok(slept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::achievement::AchievementSet;
    use crate::game::difficulty::Difficulty;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn day_counter_follows_midnight() {
        let mut w = WorldState::new(START_SCENE);
        assert_eq!(w.advance_time(15).new_days, 0);
        assert_eq!(w.hour(), 23);
        assert_eq!(w.advance_time(2).new_days, 1);
        assert_eq!(w.day_count, 2);
        // Further early-morning moves do not count the day again.
        assert_eq!(w.advance_time(2).new_days, 0);
        assert_eq!(w.day_count, 2);
        assert_eq!(w.advance_time(48).new_days, 2);
        assert_eq!(w.day_count, 4);
    }

    #[test]
    fn inn_sleeps_until_morning() {
        let mut sink = AchievementSet::default();
        let mut w = WorldState::new(START_SCENE);
        let mut c = Character::blank("a");
        c.gold = 60;
        c.hp = 1;
        w.advance_time(12);
        let slept = w.stay_at_inn(&mut c, &mut sink).unwrap();
        assert_eq!(slept.hours, 12);
        assert_eq!(w.hour(), MORNING_HOUR);
        assert_eq!(w.day_count, 2);
        assert_eq!(c.hp, c.max_hp);
        assert_eq!(c.gold, 10);
        assert!(matches!(
            w.stay_at_inn(&mut c, &mut sink),
            Err(GameError::InsufficientResource(_))
        ));
    }

    #[test]
    fn rest_heals_at_most_twenty() {
        let mut w = WorldState::new(START_SCENE);
        let mut c = Character::blank("a");
        c.hp = 5;
        assert_eq!(w.rest(&mut c), 20);
        assert_eq!(c.hp, 25);
        assert_eq!(w.hour(), 9);
    }

    #[test]
    fn locked_scene_needs_gold_scaled_by_difficulty() {
        let catalog = ContentCatalog::standard();
        let mut w = WorldState::new(START_SCENE);
        let mut c = Character::blank("a");
        let profile = Difficulty::Hard.profile();
        let mut rng = StdRng::seed_from_u64(3);
        let mut sink = AchievementSet::default();

        assert!(w.travel("cave", &catalog, &mut rng, &mut sink).is_err());
        c.gold = 299;
        assert!(w.unlock_scene("cave", &catalog, &profile, &mut c).is_err());
        assert_eq!(c.gold, 299);
        c.gold = 300;
        assert_eq!(w.unlock_scene("cave", &catalog, &profile, &mut c).unwrap(), 300);
        assert_eq!(w.unlock_scene("cave", &catalog, &profile, &mut c).unwrap(), 0);
        let report = w.travel("cave", &catalog, &mut rng, &mut sink).unwrap();
        assert!(report.first_visit);
        assert!((1..=3).contains(&report.time.hours));
        assert!(sink.contains("洞穴探险者"));
    }

    #[test]
    fn closed_scene_reports_hours() {
        let catalog = ContentCatalog::standard();
        let mut w = WorldState::new("castle");
        assert!(w.check_open(&catalog).is_ok());
        w.advance_time(12);
        assert!(matches!(
            w.check_open(&catalog),
            Err(GameError::Closed { open: 8, close: 20, .. })
        ));
    }
}
