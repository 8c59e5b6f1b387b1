//! Read-only content tables: enemies, items, scenes, scene activities, quests and NPCs.
//!
//! The engine only ever reads from a [`ContentCatalog`]. [`ContentCatalog::standard`]
//! seeds the built-in mainland and underground content.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::game::achievement;
use crate::game::errors::GameError;
use crate::game::inventory::EquipSlot;
use crate::game::magic::MagicAffinity;
use crate::game::quest::{QuestKind, QuestRecord, QuestReward, QuestStatus, QuestTarget};
use crate::game::scene_action::{SceneActionDef, SceneEffect};

/// Town NPC running the fragment shop.
pub const FRAGMENT_MERCHANT: &str = "碎片商人";

#[derive(Debug, Clone, PartialEq)]
pub struct EnemyTemplate {
    pub name: String,
    pub hp: i64,
    pub attack: i64,
    pub defense: i64,
    pub exp: u64,
    pub gold: u64,
    pub drops: Vec<String>,
    /// Elemental alignment, used for the light/dark damage multiplier.
    pub element: Option<MagicAffinity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Consumable,
    Material,
    Treasure,
    Weapon,
    Equipment,
    Armor,
    Accessory,
    Key,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemEffect {
    None,
    Heal(i64),
    Exp(u64),
    Attack(i64),
    Defense(i64),
    Special,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemDef {
    pub name: String,
    pub kind: ItemKind,
    pub effect: ItemEffect,
    /// Sell price in gold.
    pub value: u64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneDef {
    pub key: String,
    pub name: String,
    pub description: String,
    pub enemies: Vec<String>,
    pub items: Vec<String>,
    pub npcs: Vec<String>,
    pub required_level: u32,
    pub required_gold: u32,
    /// Opening hours as `(open, close)`; the scene is usable for `open <= hour < close`.
    pub time_restriction: Option<(u32, u32)>,
    pub dimension: String,
    pub is_boss: bool,
    pub visit_achievement: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NpcDef {
    pub name: String,
    pub dialogue: String,
    pub quests: Vec<String>,
    /// Item name to purchase price.
    pub trades: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default)]
pub struct ContentCatalog {
    enemies: HashMap<String, EnemyTemplate>,
    items: HashMap<String, ItemDef>,
    scenes: Vec<SceneDef>,
    quests: Vec<QuestRecord>,
    npcs: HashMap<String, NpcDef>,
    scene_actions: Vec<SceneActionDef>,
}

impl ItemKind {
    /// Which slot an equippable item occupies. Weapons take the weapon slot,
    /// armour and generic equipment the armour slot, everything else the accessory slot.
    pub fn equip_slot(self) -> EquipSlot {
        match self {
            ItemKind::Weapon => EquipSlot::Weapon,
            ItemKind::Armor | ItemKind::Equipment => EquipSlot::Armor,
            _ => EquipSlot::Accessory,
        }
    }

    /// Kinds a merchant will buy back.
    pub fn sellable(self) -> bool {
        matches!(
            self,
            ItemKind::Material | ItemKind::Treasure | ItemKind::Consumable
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Consumable => "consumable",
            ItemKind::Material => "material",
            ItemKind::Treasure => "treasure",
            ItemKind::Weapon => "weapon",
            ItemKind::Equipment => "equipment",
            ItemKind::Armor => "armor",
            ItemKind::Accessory => "accessory",
            ItemKind::Key => "key",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "consumable" => Ok(ItemKind::Consumable),
            "material" => Ok(ItemKind::Material),
            "treasure" => Ok(ItemKind::Treasure),
            "weapon" => Ok(ItemKind::Weapon),
            "equipment" => Ok(ItemKind::Equipment),
            "armor" => Ok(ItemKind::Armor),
            "accessory" => Ok(ItemKind::Accessory),
            "key" => Ok(ItemKind::Key),
            other => Err(GameError::Input(format!("unknown item type '{}'", other))),
        }
    }
}

impl SceneDef {
    pub fn is_open_at(&self, hour: u32) -> bool {
        match self.time_restriction {
            Some((open, close)) => hour >= open && hour < close,
            None => true,
        }
    }
}

impl ContentCatalog {
    pub fn enemy_template(&self, name: &str) -> Option<&EnemyTemplate> {
        self.enemies.get(name)
    }

    pub fn item_def(&self, name: &str) -> Option<&ItemDef> {
        self.items.get(name)
    }

    pub fn scene_def(&self, key: &str) -> Option<&SceneDef> {
        self.scenes.iter().find(|s| s.key == key)
    }

    pub fn quest_def(&self, name: &str) -> Option<&QuestRecord> {
        self.quests.iter().find(|q| q.name == name)
    }

    pub fn npc_def(&self, name: &str) -> Option<&NpcDef> {
        self.npcs.get(name)
    }

    pub fn require_enemy(&self, name: &str) -> Result<&EnemyTemplate, GameError> {
        self.enemy_template(name)
            .ok_or_else(|| GameError::NotFound(format!("enemy '{}'", name)))
    }

    pub fn require_item(&self, name: &str) -> Result<&ItemDef, GameError> {
        self.item_def(name)
            .ok_or_else(|| GameError::NotFound(format!("item '{}'", name)))
    }

    pub fn require_scene(&self, key: &str) -> Result<&SceneDef, GameError> {
        self.scene_def(key)
            .ok_or_else(|| GameError::NotFound(format!("scene '{}'", key)))
    }

    pub fn require_npc(&self, name: &str) -> Result<&NpcDef, GameError> {
        self.npc_def(name)
            .ok_or_else(|| GameError::NotFound(format!("npc '{}'", name)))
    }

    /// Activities offered in `scene`, in catalog order.
    pub fn scene_actions<'a>(&'a self, scene: &'a str) -> impl Iterator<Item = &'a SceneActionDef> + 'a {
        self.scene_actions.iter().filter(move |a| a.scene == scene)
    }

    pub fn require_scene_action<'a>(&'a self, scene: &'a str, name: &str) -> Result<&'a SceneActionDef, GameError> {
        self.scene_actions(scene)
            .find(|a| a.name == name)
            .ok_or_else(|| GameError::NotFound(format!("activity '{}' here", name)))
    }

    pub fn scenes(&self) -> impl Iterator<Item = &SceneDef> {
        self.scenes.iter()
    }

    /// Fresh copies of every quest, all in their initial state.
    pub fn initial_quests(&self) -> BTreeMap<String, QuestRecord> {
        self.quests
            .iter()
            .map(|q| (q.name.clone(), q.clone()))
            .collect()
    }

    pub fn insert_enemy(&mut self, enemy: EnemyTemplate) {
        self.enemies.insert(enemy.name.clone(), enemy);
    }

    pub fn insert_item(&mut self, item: ItemDef) {
        self.items.insert(item.name.clone(), item);
    }

    pub fn insert_scene(&mut self, scene: SceneDef) {
        self.scenes.retain(|s| s.key != scene.key);
        self.scenes.push(scene);
    }

    pub fn insert_quest(&mut self, quest: QuestRecord) {
        self.quests.retain(|q| q.name != quest.name);
        self.quests.push(quest);
    }

    pub fn insert_npc(&mut self, npc: NpcDef) {
        self.npcs.insert(npc.name.clone(), npc);
    }

    pub fn insert_scene_action(&mut self, action: SceneActionDef) {
        self.scene_actions
            .retain(|a| a.scene != action.scene || a.name != action.name);
        self.scene_actions.push(action);
    }

    /// The built-in content set.
    pub fn standard() -> Self {
        let mut catalog = ContentCatalog::default();
        for enemy in standard_enemies() {
            catalog.insert_enemy(enemy);
        }
        for item in standard_items() {
            catalog.insert_item(item);
        }
        for scene in standard_scenes() {
            catalog.insert_scene(scene);
        }
        for quest in standard_quests() {
            catalog.insert_quest(quest);
        }
        for npc in standard_npcs() {
            catalog.insert_npc(npc);
        }
        for action in standard_scene_actions() {
            catalog.insert_scene_action(action);
        }
        catalog
    }
}

// ============================================================================
// Built-in content
// ============================================================================

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[allow(clippy::too_many_arguments)]
fn enemy(
    name: &str,
    hp: i64,
    attack: i64,
    defense: i64,
    exp: u64,
    gold: u64,
    drops: &[&str],
    element: Option<MagicAffinity>,
) -> EnemyTemplate {
    EnemyTemplate {
        name: name.to_string(),
        hp,
        attack,
        defense,
        exp,
        gold,
        drops: strings(drops),
        element,
    }
}

fn standard_enemies() -> Vec<EnemyTemplate> {
    use MagicAffinity::*;
    vec![
        enemy("野狼", 30, 8, 3, 20, 15, &["狼牙", "狼皮"], None),
        enemy("森林精灵", 25, 10, 2, 25, 20, &["精灵之尘", "魔法草药"], Some(Light)),
        enemy("巨熊", 60, 15, 8, 50, 40, &["熊皮", "熊胆"], None),
        enemy("野马", 40, 10, 5, 30, 25, &["马鬃", "马皮"], None),
        enemy("沙漠蝎子", 25, 12, 3, 25, 15, &["蝎尾针", "蝎毒"], None),
        enemy("游牧强盗", 45, 14, 6, 35, 30, &["强盗头巾", "弯刀"], None),
        enemy("守卫", 50, 15, 10, 40, 35, &["守卫盔甲", "守卫剑"], None),
        enemy("幽灵", 35, 18, 5, 45, 30, &["幽灵精华", "灵魂石"], Some(Dark)),
        enemy("恶魔", 100, 25, 15, 100, 80, &["恶魔之角", "地狱火石"], Some(Dark)),
        enemy("魔法构装体", 70, 20, 12, 65, 45, &["魔法核心", "金属零件"], None),
        enemy("元素精灵", 40, 25, 8, 70, 50, &["元素精华", "魔法水晶碎片"], Some(Light)),
        enemy("暗影法师", 60, 30, 10, 85, 60, &["暗影长袍", "黑暗法术书"], Some(Dark)),
        enemy("蝙蝠", 15, 5, 1, 10, 5, &["蝙蝠翼", "夜视药水"], None),
        enemy("洞穴蜘蛛", 20, 7, 2, 15, 10, &["蜘蛛丝", "毒牙"], None),
        enemy("石魔", 80, 12, 15, 60, 50, &["魔晶石", "石头心脏"], Some(Earth)),
        enemy("骷髅兵", 35, 12, 8, 30, 20, &["骷髅头", "骨粉"], Some(Dark)),
        enemy("僵尸", 55, 10, 12, 40, 25, &["僵尸牙齿", "腐肉"], Some(Dark)),
        enemy("食尸鬼", 45, 18, 6, 45, 30, &["食尸鬼爪", "黑暗精华"], Some(Dark)),
        enemy("熔岩守卫", 150, 32, 25, 160, 120, &["熔岩护盾", "火焰剑"], Some(Fire)),
        enemy("火焰巨兽", 180, 38, 22, 190, 150, &["火焰核心", "巨兽牙齿"], Some(Fire)),
        enemy(
            "远古火龙",
            500,
            60,
            40,
            1000,
            1000,
            &["远古龙鳞", "龙之心", "火焰宝珠", "龙之祝福"],
            Some(Fire),
        ),
    ]
}

fn item(name: &str, kind: ItemKind, effect: ItemEffect, value: u64, description: &str) -> ItemDef {
    ItemDef {
        name: name.to_string(),
        kind,
        effect,
        value,
        description: description.to_string(),
    }
}

fn standard_items() -> Vec<ItemDef> {
    use ItemEffect as E;
    use ItemKind::*;
    vec![
        item("新手剑", Weapon, E::Attack(5), 10, "新手冒险者的短剑"),
        item("新手药水", Consumable, E::Heal(30), 10, "恢复30点生命值"),
        item("草药", Consumable, E::Heal(20), 20, "恢复20点生命值"),
        item("蘑菇", Consumable, E::Heal(10), 10, "恢复10点生命值"),
        item("面包", Consumable, E::Heal(15), 15, "恢复15点生命值"),
        item("药水", Consumable, E::Heal(50), 50, "恢复50点生命值"),
        item("治疗药水", Consumable, E::Heal(50), 40, "恢复50点生命值"),
        item("魔法草药", Consumable, E::Heal(40), 30, "蕴含魔力的草药，恢复40点生命值"),
        item("魔法书", Consumable, E::Exp(100), 100, "增加100点经验值"),
        item("法术书", Consumable, E::Exp(200), 200, "增加200点经验值并学会新法术"),
        item("黑暗法术书", Consumable, E::Exp(150), 150, "增加150点经验值，学会黑暗法术"),
        item("木材", Material, E::None, 5, "用于制作或交易"),
        item("矿石", Material, E::None, 8, "用于制作装备"),
        item("水晶", Material, E::None, 20, "稀有材料"),
        item("仙人掌", Material, E::None, 5, "沙漠植物"),
        item("古老的箭头", Material, E::None, 10, "古代遗物"),
        item("锁链", Material, E::None, 25, "坚固的锁链"),
        item("魔法水晶", Material, E::None, 100, "蕴含强大魔法能量的水晶"),
        item("魔法水晶碎片", Material, E::None, 30, "魔法水晶的碎片，仍有微弱能量"),
        item("元素精华", Material, E::None, 50, "元素力量的结晶"),
        item("狼牙", Material, E::None, 8, "锋利的狼牙"),
        item("狼皮", Material, E::None, 20, "完整的狼皮"),
        item("熊皮", Material, E::None, 35, "厚实的熊皮"),
        item("熊胆", Material, E::None, 40, "珍贵的药材"),
        item("精灵之尘", Material, E::None, 25, "闪闪发光的粉末"),
        item("龙鳞", Material, E::None, 200, "龙身上脱落的鳞片，极其珍贵"),
        item("古代金币", Treasure, E::None, 50, "价值连城的古代金币"),
        item("沙漠玫瑰", Treasure, E::None, 30, "美丽的沙漠植物"),
        item("皇家宝物", Treasure, E::None, 200, "珍贵的皇家宝物"),
        item("囚犯的日记", Treasure, E::None, 50, "囚犯的秘密日记"),
        item("龙心", Treasure, E::None, 500, "龙的心脏，蕴含强大的生命力"),
        item("恶魔之角", Treasure, E::None, 120, "恶魔头上的角"),
        item("装备", Equipment, E::Attack(10), 80, "增加10点攻击力"),
        item("剑", Weapon, E::Attack(25), 100, "增加25点攻击力"),
        item("魔法杖", Weapon, E::Attack(35), 150, "增加35点攻击力，附带魔法伤害"),
        item("猎人的弓", Weapon, E::Attack(20), 90, "猎人赠送的长弓"),
        item("盔甲", Armor, E::Defense(20), 150, "增加20点防御力"),
        item("暗影长袍", Armor, E::Defense(25), 120, "增加25点防御力，附带暗影能量"),
        item("熊皮大衣", Armor, E::Defense(15), 90, "温暖结实的大衣"),
        item("魔法护符", Accessory, E::Special, 100, "精灵祝福过的护符"),
        item("钥匙", Key, E::None, 100, "神秘的钥匙"),
        item("毒草", Material, E::None, 5, "带有毒性的草，可以制作毒药"),
        item("强力毒药", Material, E::None, 40, "用毒草熬制的强力毒药"),
        item("解毒药水", Consumable, E::Heal(25), 20, "解除中毒，恢复25点生命值"),
        item("自然之语", Treasure, E::None, 60, "大自然低语的记录"),
        item("稀有商品", Treasure, E::None, 80, "拍卖会上的稀有商品"),
        item("飞行药水", Material, E::None, 30, "据说喝下后能短暂漂浮"),
        item("锻造大赛奖牌", Treasure, E::None, 50, "锻造比赛的奖牌"),
        item("异世界物品", Treasure, E::None, 150, "来自异世界的奇特物品"),
        item("时间碎片", Treasure, E::None, 120, "凝固的时间碎片"),
        item("星象图", Treasure, E::None, 40, "记录星空的图卷"),
        item("冠军奖杯", Treasure, E::None, 100, "荒野比赛的冠军奖杯"),
        item("神的祝福", Accessory, E::Special, 150, "通过神的试炼获得的祝福"),
        item("神圣光环", Accessory, E::Special, 120, "神圣仪式赐予的光环"),
        item("幽灵礼服", Armor, E::Defense(8), 60, "幽灵舞会上得到的礼服"),
        item("禁书", Treasure, E::None, 100, "记载禁忌知识的书"),
        item("古代知识卷轴", Consumable, E::Exp(80), 80, "增加80点经验值"),
        item("机关图纸", Treasure, E::None, 60, "地牢机关的图纸"),
        item("神秘宝物", Treasure, E::None, 300, "洞穴深处的神秘宝物"),
        item("净化之石", Material, E::None, 80, "能够净化诅咒的石头"),
        item("亡灵的记忆", Treasure, E::None, 50, "亡灵托付的记忆"),
        item("龙蛋", Treasure, E::None, 400, "温热的龙蛋"),
        item("龙语词典", Treasure, E::None, 120, "记录龙语的词典"),
        item("龙骑士徽章", Accessory, E::Special, 300, "通过龙的试炼的证明"),
        item("龙伙伴", Accessory, E::Special, 500, "与你签订契约的幼龙"),
        item("神秘碎片", Material, E::None, 50, "蕴含神秘力量的碎片"),
        item("力量碎片", Material, E::None, 100, "蕴含力量的碎片"),
        item("防御碎片", Material, E::None, 100, "蕴含守护之力的碎片"),
        item("生命碎片", Material, E::None, 75, "蕴含生命力的碎片"),
        item("魔法碎片", Material, E::None, 75, "蕴含魔力的碎片"),
    ]
}

#[allow(clippy::too_many_arguments)]
fn scene(
    key: &str,
    name: &str,
    description: &str,
    enemies: &[&str],
    items: &[&str],
    npcs: &[&str],
    required: (u32, u32),
    time_restriction: Option<(u32, u32)>,
    dimension: &str,
    visit_achievement: Option<&str>,
) -> SceneDef {
    SceneDef {
        key: key.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        enemies: strings(enemies),
        items: strings(items),
        npcs: strings(npcs),
        required_level: required.0,
        required_gold: required.1,
        time_restriction,
        dimension: dimension.to_string(),
        is_boss: false,
        visit_achievement: visit_achievement.map(str::to_string),
    }
}

fn standard_scenes() -> Vec<SceneDef> {
    let mut lair = scene(
        "dragon_lair",
        "龙穴",
        "强大的火龙栖息之地，洞穴深处散发着炽热的光芒。",
        &["熔岩守卫", "火焰巨兽", "远古火龙"],
        &["龙鳞", "龙心"],
        &[],
        (10, 2000),
        None,
        "mainland",
        Some("龙穴勇者"),
    );
    lair.is_boss = true;
    vec![
        scene(
            "forest",
            "神秘森林",
            "茂密的森林，阳光透过树叶洒下斑驳的光影。",
            &["野狼", "森林精灵", "巨熊"],
            &["草药", "木材", "蘑菇"],
            &["猎人", "德鲁伊"],
            (1, 10),
            None,
            "mainland",
            Some("森林探索者"),
        ),
        scene(
            "town",
            "宁静小镇",
            "温馨的小镇，有各种商店和友善的居民。",
            &[],
            &["面包", "药水", "装备"],
            &["铁匠", "商人", "医生", "旅馆老板", FRAGMENT_MERCHANT],
            (1, 20),
            Some((6, 22)),
            "mainland",
            Some("城镇朋友"),
        ),
        scene(
            "wilderness",
            "荒野",
            "广阔的荒野，风很大，视野开阔。",
            &["野马", "沙漠蝎子", "游牧强盗"],
            &["仙人掌", "沙漠玫瑰", "古老的箭头"],
            &["商人"],
            (2, 50),
            None,
            "mainland",
            Some("荒野求生"),
        ),
        scene(
            "castle",
            "古老城堡",
            "庄严的城堡，散发着历史的气息和神秘的氛围。",
            &["守卫", "幽灵", "恶魔"],
            &["皇家宝物", "魔法书", "剑"],
            &["国王"],
            (3, 100),
            Some((8, 20)),
            "mainland",
            Some(achievement::CASTLE_HERO),
        ),
        scene(
            "tower",
            "魔法高塔",
            "高耸入云的魔法塔，散发着神秘的魔法能量。",
            &["魔法构装体", "元素精灵", "暗影法师"],
            &["魔法水晶", "法术书", "魔法杖"],
            &["大法师"],
            (4, 200),
            Some((9, 18)),
            "mainland",
            None,
        ),
        scene(
            "cave",
            "黑暗洞穴",
            "潮湿阴冷的洞穴，偶尔传来滴水声和奇怪的叫声。",
            &["蝙蝠", "洞穴蜘蛛", "石魔"],
            &["矿石", "水晶", "古代金币"],
            &["矿工"],
            (4, 250),
            None,
            "underground",
            Some("洞穴探险者"),
        ),
        scene(
            "dungeon",
            "地下监狱",
            "阴森的地下监狱，充满了痛苦和绝望的气息。",
            &["骷髅兵", "僵尸", "食尸鬼"],
            &["锁链", "钥匙", "囚犯的日记"],
            &[],
            (6, 500),
            None,
            "underground",
            Some("地牢英雄"),
        ),
        lair,
    ]
}

fn quest(
    name: &str,
    description: &str,
    target: QuestTarget,
    reward: (u64, u64, &[&str]),
    kind: QuestKind,
) -> QuestRecord {
    QuestRecord {
        name: name.to_string(),
        description: description.to_string(),
        target,
        reward: QuestReward {
            exp: reward.0,
            gold: reward.1,
            items: strings(reward.2),
        },
        status: QuestStatus::Available,
        kind,
    }
}

fn standard_quests() -> Vec<QuestRecord> {
    use QuestKind::*;
    let cond = |c: &str| QuestTarget::Condition(c.to_string());
    vec![
        quest("猎狼任务", "杀死5只野狼", QuestTarget::items([("野狼", 5)]), (100, 50, &["猎人的弓"]), Main),
        quest("收集熊皮", "收集3张熊皮", QuestTarget::items([("熊皮", 3)]), (80, 40, &["熊皮大衣"]), Side),
        quest("收集魔法草药", "收集10个魔法草药", QuestTarget::items([("魔法草药", 10)]), (120, 60, &["治疗药水"]), Main),
        quest("寻找精灵之尘", "收集5个精灵之尘", QuestTarget::items([("精灵之尘", 5)]), (90, 45, &["魔法护符"]), Side),
        quest("收集矿石", "收集20个矿石", QuestTarget::items([("矿石", 20)]), (150, 75, &["矿工镐"]), Main),
        quest("探索洞穴深处", "到达洞穴最深处", cond("explore_cave_deep"), (200, 100, &["洞穴地图"]), Side),
        quest("送货任务", "将货物送到隔壁村庄", cond("deliver_goods"), (100, 80, &["商人的推荐信"]), Side),
        quest("消灭恶魔", "杀死城堡中的恶魔", QuestTarget::items([("恶魔", 1)]), (500, 300, &["恶魔克星", "皇家勋章"]), Main),
        quest("对抗暗影法师", "击败魔法高塔中的暗影法师", QuestTarget::items([("暗影法师", 3)]), (400, 250, &["光明护符", "大法师的认可"]), Main),
        quest("制作解毒药水", "为小镇调配解毒药水", cond("craft_antidote_potions"), (420, 280, &["高级解毒药水", "药剂师称号"]), Main),
        quest("制作强力毒药", "制作强力毒药", cond("craft_powerful_poisons"), (450, 300, &["毒匕首", "毒药师称号"]), Main),
        quest("与树灵沟通", "与古老的树灵沟通", cond("communicate_with_tree_spirits"), (480, 320, &["生命之花", "德鲁伊称号"]), Main),
        quest("寻找古代宝藏", "寻找传说中的古代宝藏", cond("find_ancient_treasure"), (500, 300, &["古代宝藏图", "探险家称号"]), Main),
        quest("拯救公主", "从地牢中拯救被囚禁的公主", cond("save_princess"), (800, 500, &["公主的祝福", "王国英雄称号"]), Main),
        quest("净化被诅咒的区域", "净化被诅咒的区域", cond("purify_cursed_areas"), (550, 380, &["光明护符", "净化大师称号"]), Main),
        quest("传递信息给生者", "为亡灵传递信息给生者", cond("deliver_messages_to_living"), (480, 320, &["幽灵护符", "灵魂使者称号"]), Side),
        quest("破解遗迹谜题", "破解古代遗迹中的谜题", cond("solve_ruin_puzzles"), (350, 180, &["古代智慧", "解谜大师"]), Side),
        quest("研究龙的行为", "研究龙的习性和行为", cond("study_dragon_behavior"), (620, 420, &["龙语词典", "龙族学者称号"]), Main),
        quest("寻找龙蛋", "寻找珍贵的龙蛋", cond("find_dragon_egg"), (700, 500, &["龙骑士伙伴", "龙语者称号"]), Main),
        quest("驯服幼龙", "驯服一条幼龙", cond("tame_baby_dragon"), (700, 500, &["龙鞍", "驯龙师称号"]), Main),
        quest("与龙建立信任", "与龙建立信任关系", cond("build_trust_with_dragon"), (650, 450, &["龙骑士装备", "龙骑士称号"]), Main),
    ]
}

fn npc(name: &str, dialogue: &str, quests: &[&str], trades: &[(&str, u64)]) -> NpcDef {
    NpcDef {
        name: name.to_string(),
        dialogue: dialogue.to_string(),
        quests: strings(quests),
        trades: trades.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
    }
}

fn standard_npcs() -> Vec<NpcDef> {
    vec![
        npc("猎人", "小心森林深处，那里有危险的生物。", &["猎狼任务", "收集熊皮", "寻找龙蛋", "驯服幼龙"], &[("狼牙", 10), ("狼皮", 25)]),
        npc("德鲁伊", "大自然的力量是无穷的，年轻的冒险者。", &["收集魔法草药", "寻找精灵之尘", "与树灵沟通", "制作强力毒药"], &[("草药", 5), ("魔法草药", 30)]),
        npc("矿工", "这个洞穴深处藏着珍贵的矿石，但也充满了危险。", &["收集矿石", "探索洞穴深处", "寻找古代宝藏"], &[("矿石", 8), ("水晶", 20)]),
        npc("铁匠", "我可以为你打造最好的装备，但需要合适的材料。", &[], &[("剑", 100), ("盔甲", 150)]),
        npc("商人", "看看我的商品吧，有很多好东西！", &["送货任务"], &[("药水", 30), ("面包", 10), ("装备", 80)]),
        npc("医生", "保持健康是冒险的基础。", &["制作解毒药水", "传递信息给生者"], &[("治疗药水", 40), ("草药", 5)]),
        npc(
            FRAGMENT_MERCHANT,
            "欢迎来到碎片商店，这些碎片蕴含着神秘的力量。",
            &[],
            &[("神秘碎片", 100), ("力量碎片", 200), ("防御碎片", 200), ("生命碎片", 150), ("魔法碎片", 150)],
        ),
        npc("旅馆老板", "欢迎来到我们的旅馆，好好休息吧。", &[], &[("面包", 15)]),
        npc("国王", "欢迎来到我的王国，勇敢的冒险者。", &["消灭恶魔", "拯救公主", "净化被诅咒的区域", "与龙建立信任"], &[("皇家宝物", 200)]),
        npc("大法师", "魔法是宇宙的语言，只有真正理解它的人才能掌握其力量。", &["对抗暗影法师", "破解遗迹谜题", "研究龙的行为"], &[("魔法水晶", 100), ("法术书", 150)]),
    ]
}

fn item_effect(name: &str, qty: (u32, u32)) -> SceneEffect {
    SceneEffect::Item {
        name: name.to_string(),
        qty,
    }
}

fn standard_scene_actions() -> Vec<SceneActionDef> {
    use SceneEffect::*;
    let one = |name: &str| item_effect(name, (1, 1));
    let badge = |id: &str| Achievement(id.to_string());
    let act = SceneActionDef::new;
    vec![
        act("forest", "采集毒草", 0.6)
            .on_success("你成功采集了一些毒草！", vec![item_effect("毒草", (1, 3))])
            .on_failure("你不小心被毒草划伤，中毒了。", vec![Hurt(15)]),
        act("forest", "制作毒药", 1.0)
            .consumes("毒草")
            .on_success("你成功制作了一瓶强力毒药！", vec![one("强力毒药")])
            .satisfies("craft_powerful_poisons"),
        act("forest", "与自然沟通", 0.5)
            .on_success("你感受到了大自然的力量，树灵向你低语。", vec![one("自然之语")])
            .on_failure("大自然似乎今天不太愿意与你交流。", vec![])
            .satisfies("communicate_with_tree_spirits"),
        act("forest", "湖中沐浴", 0.7)
            .on_success("清凉的湖水让你精神焕发！", vec![HealFull])
            .on_failure("湖水太冷了，你没能放松下来。", vec![]),
        act("town", "调配解毒药水", 1.0)
            .consumes("毒草")
            .on_success("你在医生的指导下调配出了解毒药水。", vec![one("解毒药水")])
            .satisfies("craft_antidote_potions"),
        act("town", "参加拍卖", 1.0)
            .costs_gold(50)
            .on_success("你在拍卖会上拍得了一件商品！", vec![OneOf(strings(&["稀有商品", "魔法水晶", "飞行药水"]))]),
        act("town", "下注赌博", 0.5)
            .costs_gold(20)
            .on_success("你赢了！", vec![Gold(40, 100)])
            .on_failure("你输掉了赌注。", vec![]),
        act("town", "参加锻造比赛", 0.5)
            .on_success("你赢得了锻造比赛！", vec![Gold(80, 80), one("锻造大赛奖牌")])
            .on_failure("你在比赛中落败了。", vec![]),
        act("wilderness", "走私交易", 0.7)
            .on_success("走私交易成功！", vec![Gold(50, 150)])
            .on_failure("交易失败，你被罚款了。", vec![LoseGold(30)]),
        act("wilderness", "寻找稀有商品", 0.4)
            .on_success("你找到了一件稀有商品！", vec![OneOf(strings(&["异世界物品", "时间碎片", "龙鳞"]))])
            .on_failure("你没有找到任何值得注意的东西。", vec![]),
        act("wilderness", "观测星空", 0.5)
            .on_success("你绘制了一张星象图。", vec![one("星象图")])
            .on_failure("乌云遮住了星空。", vec![]),
        act("wilderness", "参加比赛", 0.4)
            .on_success("你赢得了比赛冠军！", vec![Gold(150, 150), one("冠军奖杯"), badge("飞行冠军")])
            .on_failure("你没能赢得比赛，只拿到了参与奖。", vec![Gold(20, 20)]),
        act("castle", "接受神的试炼", 1.0)
            .min_level(15)
            .on_success("你通过了神的试炼！", vec![Exp(100, 100), one("神的祝福")])
            .on_failure("你的力量不足以通过试炼。", vec![Hurt(50)]),
        act("castle", "参加神圣仪式", 0.7)
            .on_success("你获得了神圣光环！", vec![one("神圣光环"), Defense(5)])
            .on_failure("仪式没有产生任何效果。", vec![]),
        act("castle", "参加幽灵舞会", 0.6)
            .on_success("幽灵们送给你一件礼服。", vec![one("幽灵礼服")])
            .on_failure("幽灵们不欢迎你，把你赶了出去。", vec![Hurt(20)]),
        act("tower", "学习禁书知识", 0.3)
            .on_success("你掌握了禁忌的知识！", vec![one("禁书"), Attack(8)])
            .on_failure("禁忌的知识反噬了你。", vec![Hurt(30)]),
        act("tower", "解读古代文字", 0.4)
            .on_success("你解读出了古代文字，遗迹的谜题迎刃而解。", vec![one("古代知识卷轴")])
            .on_failure("这些文字太难懂了。", vec![])
            .satisfies("solve_ruin_puzzles"),
        act("tower", "学习黑魔法", 0.4)
            .on_success("你学会了黑魔法！", vec![one("黑暗法术书"), Attack(7)])
            .on_failure("黑魔法失控了。", vec![Hurt(25)]),
        act("tower", "与书籍对话", 0.5)
            .on_success("书籍向你讲述了古老的知识。", vec![Exp(30, 60)])
            .on_failure("书籍保持着沉默。", vec![]),
        act("cave", "寻找宝藏", 0.2)
            .on_success("你找到了古代宝藏！", vec![Gold(200, 500), one("神秘宝物"), badge("宝藏猎人")])
            .on_failure("你什么也没找到。", vec![])
            .satisfies("find_ancient_treasure"),
        act("cave", "水晶冥想", 0.6)
            .on_success("你在水晶旁冥想，感觉更有智慧了。", vec![Exp(30, 30)])
            .on_failure("你无法集中精神。", vec![]),
        act("dungeon", "破解机关", 0.5)
            .on_success("你破解了机关，打开了关押公主的牢门！", vec![one("机关图纸")])
            .on_failure("机关被触发了！", vec![Hurt(25)])
            .satisfies("save_princess"),
        act("dungeon", "解开诅咒", 0.3)
            .on_success("你成功解开了诅咒！", vec![one("净化之石"), badge("驱魔师")])
            .on_failure("诅咒的力量反噬了你。", vec![Hurt(25)])
            .satisfies("purify_cursed_areas"),
        act("dungeon", "与亡灵对话", 0.5)
            .on_success("亡灵托付给你它的记忆。", vec![one("亡灵的记忆")])
            .on_failure("亡灵不愿意与你交谈。", vec![])
            .satisfies("deliver_messages_to_living"),
        act("dragon_lair", "寻找龙蛋", 0.3)
            .on_success("你找到了一枚龙蛋！", vec![one("龙蛋"), badge("龙蛋收集者")])
            .on_failure("你没有找到龙蛋。", vec![])
            .satisfies("find_dragon_egg"),
        act("dragon_lair", "学习龙语", 0.4)
            .on_success("你学会了一些龙语。", vec![one("龙语词典")])
            .on_failure("龙语太难学了。", vec![])
            .satisfies("study_dragon_behavior"),
        act("dragon_lair", "接受龙的试炼", 1.0)
            .min_level(30)
            .on_success(
                "你通过了龙的试炼，成为了龙骑士！",
                vec![one("龙骑士徽章"), Attack(10), Defense(5), badge("龙骑士")],
            )
            .on_failure("你的力量不足以通过龙的试炼。", vec![Hurt(60)])
            .satisfies("build_trust_with_dragon"),
        act("dragon_lair", "与龙签订契约", 0.1)
            .on_success("龙同意与你签订契约！", vec![one("龙伙伴"), badge("驯龙高手")])
            .on_failure("龙拒绝了你的请求。", vec![])
            .satisfies("tame_baby_dragon"),
    ]
}
