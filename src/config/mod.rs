//! # Configuration Management Module
//!
//! Loads and writes `config.toml`, the single file that tunes a retrorpg
//! installation.
//!
//! ## Configuration Structure
//!
//! - [`GameConfig`] - Default difficulty, auto-save behaviour and start scene
//! - [`StorageConfig`] - Where save files live
//! - [`LoggingConfig`] - Log level and optional log file
//!
//! Every section and field has a default, so a partial file (or an empty one)
//! is valid.
//!
//! CLI flags take precedence over the file: `--difficulty` on `new` replaces
//! `game.difficulty`, and `-v` replaces `logging.level`.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::game::difficulty::Difficulty;
use crate::game::errors::GameError;
use crate::game::world::START_SCENE;

/// Directory name used under the home directory for saves.
pub const SAVE_DIR_NAME: &str = "retro_rpg_saves";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Difficulty for new characters: easy, normal, hard, extreme or ultimate.
    /// Case-insensitive; checked by [`GameConfig::difficulty`].
    pub difficulty: String,
    pub auto_save: bool,
    /// Probability of an auto-save after each action, 0.0 to 1.0.
    pub auto_save_chance: f64,
    pub start_scene: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal.as_str().to_string(),
            auto_save: true,
            auto_save_chance: 0.1,
            start_scene: START_SCENE.to_string(),
        }
    }
}

impl GameConfig {
    pub fn difficulty(&self) -> Result<Difficulty, GameError> {
        self.difficulty.parse()
    }

    /// Auto-save probability clamped to `[0, 1]`; zero when auto-save is off.
    pub fn effective_auto_save_chance(&self) -> f64 {
        if !self.auto_save || !self.auto_save_chance.is_finite() {
            return 0.0;
        }
        self.auto_save_chance.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub save_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            save_dir: default_save_dir().to_string_lossy().into_owned(),
        }
    }
}

/// `<home>/retro_rpg_saves`, or `./saves` when there is no home directory.
pub fn default_save_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(SAVE_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("./saves"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: Some("retrorpg.log".to_string()),
        }
    }
}

impl LoggingConfig {
    /// Parsed level, `Warn` for anything unrecognised.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Warn)
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config
            .game
            .difficulty()
            .map_err(|e| anyhow!("Invalid config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Create a default configuration file
    pub fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content).map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }
}
