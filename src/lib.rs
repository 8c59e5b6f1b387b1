//! # retrorpg - A Turn-Based Text RPG
//!
//! A single-player role-playing game for the terminal: roll a character, explore
//! scenes, fight through turn-based encounters, take on quests and keep the
//! whole run in a plain-text save file.
//!
//! ## Features
//!
//! - **Turn-based combat**: Physical attacks, six magic affinities with elemental
//!   counters and secondary effects, consumables and fleeing
//! - **Difficulty profiles**: Five fixed bundles of multipliers, from easy to ultimate
//! - **Progression**: Levels, magic levels, quests with item or condition targets,
//!   scene activities and achievements
//! - **World clock**: Hours and days pass as you travel, rest and sleep; some
//!   scenes only open at certain hours
//! - **Readable saves**: Line-oriented text with a safe literal grammar for
//!   structured fields
//!
//! ## Module Organization
//!
//! - [`game`] - Rules: characters, combat, magic, quests, world and actions
//! - [`storage`] - Save file codec and the save directory
//! - [`play`] - The interactive loop used by the binary
//! - [`config`] - Configuration loading and defaults
//! - [`validation`] - Save name checks and filename encoding
//! - [`logutil`] - Log formatting for player and save-file text

pub mod config;
pub mod game;
pub mod logutil;
pub mod play;
pub mod storage;
pub mod validation;
