//! Quest records and their status transitions.
//!
//! A quest target is either a map of item name to required count, checked
//! against the character's inventory, or an opaque named condition that some
//! other part of the game must mark satisfied.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::game::errors::GameError;
use crate::game::inventory::Inventory;

/// Lifecycle of a quest. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QuestStatus {
    Available,
    Active,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestKind {
    Main,
    Side,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestTarget {
    /// Item name to required count.
    Items(BTreeMap<String, u32>),
    /// Opaque condition key, e.g. `explore_cave_deep`.
    Condition(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuestReward {
    pub exp: u64,
    pub gold: u64,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestRecord {
    pub name: String,
    pub description: String,
    pub target: QuestTarget,
    pub reward: QuestReward,
    pub status: QuestStatus,
    pub kind: QuestKind,
}

impl QuestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            QuestStatus::Available => "available",
            QuestStatus::Active => "active",
            QuestStatus::Completed => "completed",
        }
    }
}

impl FromStr for QuestStatus {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(QuestStatus::Available),
            "active" => Ok(QuestStatus::Active),
            "completed" => Ok(QuestStatus::Completed),
            other => Err(GameError::Input(format!("unknown quest status '{}'", other))),
        }
    }
}

impl fmt::Display for QuestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl QuestKind {
    pub fn as_str(self) -> &'static str {
        match self {
            QuestKind::Main => "main",
            QuestKind::Side => "side",
        }
    }
}

impl FromStr for QuestKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "main" => Ok(QuestKind::Main),
            "side" => Ok(QuestKind::Side),
            other => Err(GameError::Input(format!("unknown quest type '{}'", other))),
        }
    }
}

impl QuestTarget {
    /// Convenience for building item targets from literals.
    pub fn items<'a>(pairs: impl IntoIterator<Item = (&'a str, u32)>) -> Self {
        QuestTarget::Items(
            pairs
                .into_iter()
                .map(|(name, n)| (name.to_string(), n))
                .collect(),
        )
    }

    /// Whether `inventory` holds at least the required count of every target item.
    /// Condition targets never complete from inventory alone.
    pub fn met_by(&self, inventory: &Inventory) -> bool {
        match self {
            QuestTarget::Items(required) => required
                .iter()
                .all(|(name, need)| inventory.count(name) >= *need),
            QuestTarget::Condition(_) => false,
        }
    }

    pub fn mentions(&self, item: &str) -> bool {
        matches!(self, QuestTarget::Items(required) if required.contains_key(item))
    }

    pub fn awaits(&self, condition: &str) -> bool {
        matches!(self, QuestTarget::Condition(key) if key == condition)
    }
}

impl QuestRecord {
    /// available -> active. Any other starting state is rejected.
    pub fn activate(&mut self) -> Result<(), GameError> {
        match self.status {
            QuestStatus::Available => {
                self.status = QuestStatus::Active;
                Ok(())
            }
            QuestStatus::Active => Err(GameError::Input(format!(
                "quest '{}' is already active",
                self.name
            ))),
            QuestStatus::Completed => Err(GameError::Input(format!(
                "quest '{}' is already completed",
                self.name
            ))),
        }
    }

    /// active -> completed. Rewards are applied by the caller.
    pub fn mark_completed(&mut self) -> Result<(), GameError> {
        if self.status != QuestStatus::Active {
            return Err(GameError::Input(format!(
                "quest '{}' is not active",
                self.name
            )));
        }
        self.status = QuestStatus::Completed;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.status == QuestStatus::Active
    }

    /// Overwrite status from a save file without regressing a known state.
    pub fn restore_status(&mut self, status: QuestStatus) {
        self.status = self.status.max(status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wolf_hunt() -> QuestRecord {
        QuestRecord {
            name: "猎狼任务".into(),
            description: "杀死5只野狼".into(),
            target: QuestTarget::items([("野狼", 5)]),
            reward: QuestReward {
                exp: 100,
                gold: 50,
                items: vec!["猎人的弓".into()],
            },
            status: QuestStatus::Available,
            kind: QuestKind::Main,
        }
    }

    #[test]
    fn status_moves_forward_only() {
        let mut q = wolf_hunt();
        assert!(q.mark_completed().is_err());
        q.activate().unwrap();
        assert!(q.activate().is_err());
        q.mark_completed().unwrap();
        assert!(q.activate().is_err());
        q.restore_status(QuestStatus::Available);
        assert_eq!(q.status, QuestStatus::Completed);
    }

    #[test]
    fn item_target_needs_every_count() {
        let target = QuestTarget::items([("熊皮", 3), ("狼皮", 1)]);
        let mut inv = Inventory::default();
        inv.add("熊皮", 3);
        assert!(!target.met_by(&inv));
        inv.add("狼皮", 1);
        assert!(target.met_by(&inv));
    }

    #[test]
    fn condition_target_is_never_met_by_inventory() {
        let target = QuestTarget::Condition("explore_cave_deep".into());
        let mut inv = Inventory::default();
        inv.add("explore_cave_deep", 10);
        assert!(!target.met_by(&inv));
        assert!(!target.mentions("explore_cave_deep"));
    }
}
