//! The game engine: character progression, combat, quests and world state.
//!
//! Nothing in here touches stdin/stdout or the filesystem. The play loop in
//! [`crate::play`] drives a [`session::GameSession`] and [`crate::storage`]
//! snapshots it.

pub mod achievement;
pub mod actions;
pub mod catalog;
pub mod character;
pub mod combat;
pub mod difficulty;
pub mod errors;
pub mod inventory;
pub mod magic;
pub mod progression;
pub mod quest;
pub mod scene_action;
pub mod session;
pub mod world;

use crate::game::achievement::AchievementSink;
use crate::game::catalog::ContentCatalog;
use crate::game::difficulty::{Difficulty, DifficultyProfile};

/// Everything an engine component may read or notify besides the character.
pub struct GameContext<'a> {
    pub catalog: &'a ContentCatalog,
    pub difficulty: Difficulty,
    pub profile: DifficultyProfile,
    pub achievements: &'a mut dyn AchievementSink,
}

impl<'a> GameContext<'a> {
    pub fn new(
        catalog: &'a ContentCatalog,
        difficulty: Difficulty,
        achievements: &'a mut dyn AchievementSink,
    ) -> Self {
        GameContext {
            catalog,
            difficulty,
            profile: difficulty.profile(),
            achievements,
        }
    }
}
