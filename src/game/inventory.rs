//! Item counts and equipment slots.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::game::errors::GameError;

/// Item name to count. Counts are always at least 1; absence means zero.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Inventory {
    items: BTreeMap<String, u32>,
}

impl Inventory {
    pub fn add(&mut self, name: &str, qty: u32) {
        if qty == 0 {
            return;
        }
        *self.items.entry(name.to_string()).or_insert(0) += qty;
    }

    /// Remove up to `qty` units and return how many were actually removed.
    /// The entry disappears once its count reaches zero.
    pub fn remove(&mut self, name: &str, qty: u32) -> u32 {
        let Some(count) = self.items.get_mut(name) else {
            return 0;
        };
        let removed = qty.min(*count);
        *count -= removed;
        if *count == 0 {
            self.items.remove(name);
        }
        removed
    }

    pub fn count(&self, name: &str) -> u32 {
        self.items.get(name).copied().unwrap_or(0)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    /// Number of distinct item names held.
    pub fn distinct(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.items.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// The three equipment slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EquipSlot {
    Weapon,
    Armor,
    Accessory,
}

impl EquipSlot {
    pub const ALL: [EquipSlot; 3] = [EquipSlot::Weapon, EquipSlot::Armor, EquipSlot::Accessory];

    pub fn as_str(self) -> &'static str {
        match self {
            EquipSlot::Weapon => "weapon",
            EquipSlot::Armor => "armor",
            EquipSlot::Accessory => "accessory",
        }
    }
}

impl fmt::Display for EquipSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EquipSlot {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weapon" => Ok(EquipSlot::Weapon),
            "armor" => Ok(EquipSlot::Armor),
            "accessory" => Ok(EquipSlot::Accessory),
            other => Err(GameError::Input(format!("unknown equipment slot '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Equipment {
    pub weapon: Option<String>,
    pub armor: Option<String>,
    pub accessory: Option<String>,
}

impl Equipment {
    pub fn get(&self, slot: EquipSlot) -> Option<&str> {
        self.slot_ref(slot).as_deref()
    }

    /// Put `item` in `slot`, returning whatever was there before.
    pub fn replace(&mut self, slot: EquipSlot, item: String) -> Option<String> {
        self.slot_mut(slot).replace(item)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EquipSlot, &str)> {
        EquipSlot::ALL
            .into_iter()
            .filter_map(move |slot| self.get(slot).map(|item| (slot, item)))
    }

    fn slot_ref(&self, slot: EquipSlot) -> &Option<String> {
        match slot {
            EquipSlot::Weapon => &self.weapon,
            EquipSlot::Armor => &self.armor,
            EquipSlot::Accessory => &self.accessory,
        }
    }

    fn slot_mut(&mut self, slot: EquipSlot) -> &mut Option<String> {
        match slot {
            EquipSlot::Weapon => &mut self.weapon,
            EquipSlot::Armor => &mut self.armor,
            EquipSlot::Accessory => &mut self.accessory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_clamps_and_deletes_entry() {
        let mut inv = Inventory::default();
        inv.add("草药", 2);
        assert_eq!(inv.remove("草药", 5), 2);
        assert!(!inv.contains("草药"));
        assert_eq!(inv.count("草药"), 0);
        assert_eq!(inv.remove("草药", 1), 0);
    }

    #[test]
    fn adding_zero_creates_no_entry() {
        let mut inv = Inventory::default();
        inv.add("木材", 0);
        assert!(inv.is_empty());
    }

    #[test]
    fn equipment_replace_returns_previous() {
        let mut eq = Equipment::default();
        assert_eq!(eq.replace(EquipSlot::Weapon, "新手剑".into()), None);
        assert_eq!(
            eq.replace(EquipSlot::Weapon, "剑".into()),
            Some("新手剑".to_string())
        );
        assert_eq!(eq.iter().collect::<Vec<_>>(), vec![(EquipSlot::Weapon, "剑")]);
    }
}
