//! # Storage Module - Save Files
//!
//! Persists game sessions as plain text files under a single save directory.
//!
//! ## Features
//!
//! - **Line-oriented format**: Human-readable sections, see [`codec`]
//! - **Safe structured fields**: Quest targets and rewards go through a small
//!   literal parser ([`value`]) and are never evaluated
//! - **Slots and snapshots**: `save_slot_<n>` for numbered slots, otherwise
//!   `save_<YYYYmmdd_HHMMSS>`
//! - **Path validation**: Save names are checked for traversal and
//!   percent-encoded before touching the filesystem
//!
//! Writes are a single blocking `fs::write`; there is no atomic rename or
//! checksum, so a crash mid-write can leave a truncated file behind.

pub mod codec;
pub mod value;

use chrono::{Local, NaiveDateTime};
use log::{debug, info, warn};
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::game::catalog::ContentCatalog;
use crate::game::difficulty::Difficulty;
use crate::game::errors::GameError;
use crate::game::session::SaveRecord;
use crate::validation::{filename_to_save_name, safe_filename, validate_save_name};

/// Largest file `list` and `load` will read.
const MAX_SAVE_BYTES: u64 = 1024 * 1024;

/// One line of `list` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveSummary {
    pub file: String,
    pub character: String,
    pub level: u32,
    pub difficulty: Difficulty,
    pub scene: String,
    pub day: u32,
    pub timestamp: Option<NaiveDateTime>,
}

/// A directory of save files.
#[derive(Debug, Clone)]
pub struct SaveStore {
    dir: PathBuf,
}

/// File name for a save: the numbered slot, or a wall-clock stamp.
pub fn save_name_for(slot: Option<u32>, at: NaiveDateTime) -> String {
    match slot {
        Some(n) => format!("save_slot_{}", n),
        None => format!("save_{}", at.format("%Y%m%d_%H%M%S")),
    }
}

impl SaveStore {
    /// Use `dir` for saves, creating it if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, GameError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        debug!("save directory: {}", dir.display());
        Ok(SaveStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, GameError> {
        let name = validate_save_name(name)?;
        Ok(self.dir.join(safe_filename(&name)))
    }

    /// Write `record` to a slot or a timestamped file. Returns the save name.
    pub fn save(&self, record: &SaveRecord, slot: Option<u32>) -> Result<String, GameError> {
        let at = record
            .timestamp
            .unwrap_or_else(|| Local::now().naive_local());
        let name = save_name_for(slot, at);
        self.save_as(&name, record)?;
        Ok(name)
    }

    pub fn save_as(&self, name: &str, record: &SaveRecord) -> Result<(), GameError> {
        let path = self.path_for(name)?;
        fs::write(&path, codec::encode(record))?;
        info!(
            "saved {} ({}) to {}",
            crate::logutil::loggable(&record.character.name),
            name,
            path.display()
        );
        Ok(())
    }

    fn read(&self, path: &Path) -> Result<String, GameError> {
        let size = fs::metadata(path)?.len();
        if size > MAX_SAVE_BYTES {
            return Err(GameError::SaveCorrupt(format!(
                "{} is {} bytes, larger than any save",
                path.display(),
                size
            )));
        }
        Ok(fs::read_to_string(path)?)
    }

    pub fn load(&self, name: &str, catalog: &ContentCatalog) -> Result<SaveRecord, GameError> {
        let path = self.path_for(name)?;
        let text = match self.read(&path) {
            Err(GameError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                return Err(GameError::NotFound(format!("save '{}'", name)))
            }
            other => other?,
        };
        let record = codec::decode(&text, catalog)?;
        info!("loaded {} from {}", name, path.display());
        Ok(record)
    }

    /// Every readable save, newest first. Files without the save header are skipped.
    pub fn list(&self) -> Result<Vec<SaveSummary>, GameError> {
        let mut saves = Vec::new();
        let empty = ContentCatalog::default();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(file) = entry.file_name().to_str().and_then(filename_to_save_name) else {
                warn!("skipping save file with unexpected name: {:?}", entry.path());
                continue;
            };
            let text = match self.read(&entry.path()) {
                Ok(text) => text,
                Err(e) => {
                    warn!("skipping unreadable save {:?}: {}", entry.path(), e);
                    continue;
                }
            };
            if !codec::has_file_header(&text) {
                debug!("skipping non-save file {:?}", entry.path());
                continue;
            }
            match codec::decode(&text, &empty) {
                Ok(record) => saves.push(SaveSummary {
                    file,
                    character: record.character.name,
                    level: record.character.level,
                    difficulty: record.difficulty,
                    scene: record.world.current_scene,
                    day: record.world.day_count,
                    timestamp: record.timestamp,
                }),
                Err(e) => warn!("skipping corrupt save {:?}: {}", entry.path(), e),
            }
        }
        saves.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.file.cmp(&b.file)));
        Ok(saves)
    }

    pub fn delete(&self, name: &str) -> Result<(), GameError> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("deleted save {}", name);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(GameError::NotFound(format!("save '{}'", name)))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::character::Character;
    use crate::game::world::WorldState;
    use tempfile::tempdir;

    fn record(name: &str, at: &str) -> SaveRecord {
        SaveRecord {
            character: Character::blank(name),
            difficulty: Difficulty::Easy,
            world: WorldState::new("forest"),
            achievements: Default::default(),
            quests: Default::default(),
            timestamp: NaiveDateTime::parse_from_str(at, codec::TIMESTAMP_FORMAT).ok(),
        }
    }

    #[test]
    fn slot_and_timestamp_names() {
        let at = NaiveDateTime::parse_from_str("2024-05-01T20:15:09", codec::TIMESTAMP_FORMAT).unwrap();
        assert_eq!(save_name_for(Some(2), at), "save_slot_2");
        assert_eq!(save_name_for(None, at), "save_20240501_201509");
    }

    #[test]
    fn save_load_delete() {
        let dir = tempdir().unwrap();
        let store = SaveStore::open(dir.path().join("saves")).unwrap();
        let rec = record("Aria", "2024-05-01T20:15:00");
        let name = store.save(&rec, Some(1)).unwrap();
        assert_eq!(name, "save_slot_1");
        assert!(store.dir().join("save_slot_1").exists());

        let loaded = store.load(&name, &ContentCatalog::standard()).unwrap();
        assert_eq!(loaded.character.name, "Aria");
        assert_eq!(loaded.difficulty, Difficulty::Easy);

        store.delete(&name).unwrap();
        assert!(matches!(store.delete(&name), Err(GameError::NotFound(_))));
        assert!(matches!(
            store.load(&name, &ContentCatalog::standard()),
            Err(GameError::NotFound(_))
        ));
    }

    #[test]
    fn list_is_newest_first_and_skips_strangers() {
        let dir = tempdir().unwrap();
        let store = SaveStore::open(dir.path()).unwrap();
        store.save(&record("Old", "2024-01-01T08:00:00"), None).unwrap();
        store.save(&record("New", "2024-03-01T08:00:00"), None).unwrap();
        store.save(&record("Mid", "2024-02-01T08:00:00"), Some(3)).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a save").unwrap();

        let names: Vec<String> = store.list().unwrap().into_iter().map(|s| s.character).collect();
        assert_eq!(names, vec!["New", "Mid", "Old"]);
    }

    #[test]
    fn traversal_names_are_rejected() {
        let dir = tempdir().unwrap();
        let store = SaveStore::open(dir.path()).unwrap();
        let rec = record("Aria", "2024-05-01T20:15:00");
        for bad in ["../escape", "a/b", "..", "", "a\\b"] {
            assert!(
                matches!(store.save_as(bad, &rec), Err(GameError::InvalidName(_))),
                "{:?} accepted",
                bad
            );
        }
    }

    #[test]
    fn unusual_names_stay_inside_the_directory() {
        let dir = tempdir().unwrap();
        let store = SaveStore::open(dir.path()).unwrap();
        store.save_as("我的 存档", &record("Aria", "2024-05-01T20:15:00")).unwrap();
        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].file, "我的 存档");
        assert!(store.load("我的 存档", &ContentCatalog::standard()).is_ok());
    }

    #[test]
    fn oversized_files_are_refused() {
        let dir = tempdir().unwrap();
        let store = SaveStore::open(dir.path()).unwrap();
        let big = format!("{}\n{}", codec::FILE_HEADER, "x".repeat(MAX_SAVE_BYTES as usize + 1));
        std::fs::write(dir.path().join("save_big"), big).unwrap();
        assert!(matches!(
            store.load("save_big", &ContentCatalog::standard()),
            Err(GameError::SaveCorrupt(_))
        ));
        assert!(store.list().unwrap().is_empty());
    }
}
