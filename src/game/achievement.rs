//! Achievement catalog and the unlocked set.
//!
//! Unlocking is idempotent: only the first unlock of an identifier queues a
//! notification, later attempts are silent no-ops.

use log::{info, warn};
use std::collections::BTreeSet;

pub const FIRST_ADVENTURE: &str = "初次冒险";
pub const CASTLE_HERO: &str = "城堡勇者";
pub const BATTLE_MASTER: &str = "战斗大师";
pub const COLLECTOR: &str = "收集家";
pub const QUEST_EXPERT: &str = "任务达人";
pub const WEALTHY: &str = "富甲一方";
pub const LEVEL_EXPERT: &str = "等级达人";
pub const ALCHEMIST: &str = "药剂师";
pub const ADVENTURER: &str = "冒险家";
pub const SAVIOR: &str = "救世主";
pub const MERCHANT: &str = "商人";
pub const SURVIVOR: &str = "生存专家";

pub const ENEMIES_FOR_BATTLE_MASTER: u32 = 100;
pub const DISTINCT_ITEMS_FOR_COLLECTOR: usize = 50;
pub const QUESTS_FOR_EXPERT: u32 = 20;
pub const GOLD_FOR_WEALTHY: u64 = 1000;
pub const LEVEL_FOR_EXPERT: u32 = 20;
pub const CONSUMABLES_FOR_ALCHEMIST: u32 = 50;
pub const TRADES_FOR_MERCHANT: u32 = 50;
pub const DAYS_FOR_SURVIVOR: u32 = 30;

/// Identifier to description, in display order.
pub const ACHIEVEMENTS: &[(&str, &str)] = &[
    (FIRST_ADVENTURE, "开始你的第一次冒险"),
    ("森林探索者", "探索完整个森林"),
    ("洞穴探险者", "深入洞穴探险"),
    ("城镇朋友", "与所有城镇NPC交谈"),
    ("荒野求生", "在荒野中生存3天"),
    (CASTLE_HERO, "进入古老城堡"),
    ("地牢英雄", "探索地下监狱"),
    (BATTLE_MASTER, "击败100个敌人"),
    (COLLECTOR, "收集50个不同的物品"),
    (QUEST_EXPERT, "完成20个任务"),
    (WEALTHY, "拥有1000金币"),
    (LEVEL_EXPERT, "达到20级"),
    (ALCHEMIST, "使用50个消耗品"),
    (ADVENTURER, "探索所有场景"),
    (SAVIOR, "完成主线任务"),
    (MERCHANT, "完成50次交易"),
    (SURVIVOR, "在游戏中生存30天"),
    ("铁匠大师", "打造10件装备"),
    ("收藏家", "收集所有稀有物品"),
    ("战斗精英", "击败所有类型的敌人"),
    ("冰洞探索者", "探索冰冻洞穴"),
    ("魔法森林使者", "探索魔法森林"),
    ("天空之城访客", "访问天空之城"),
    ("深海探索者", "探索水下城市"),
    ("幽灵镇勇者", "探索幽灵小镇"),
    ("浮空岛探险家", "探索浮空岛"),
    ("矮人矿坑挖掘者", "探索矮人矿坑"),
    ("知识追寻者", "探索古老图书馆"),
    ("沙漠绿洲发现者", "发现沙漠绿洲"),
    ("龙穴勇者", "探索龙穴"),
    ("机械都市访客", "访问机械都市"),
    ("毒沼幸存者", "穿越毒沼"),
    ("天空园丁", "探索天空花园"),
    ("暗影界行者", "进入暗影界"),
    ("水晶洞穴探索者", "探索水晶洞穴"),
    ("天空海盗", "登上天空海盗船"),
    ("时光旅行者", "访问时光神殿"),
    ("精灵王国使者", "访问精灵王国"),
    ("冥界访客", "进入冥界"),
    ("云中村民", "访问云中之村"),
    ("空中园丁", "探索空中花园"),
    ("暗影商人", "探索暗影市场"),
    ("水晶矿工", "探索水晶矿场"),
    ("天空村民", "访问天空村落"),
    ("水下居民", "访问水下村庄"),
    ("恶魔访客", "探索恶魔领域"),
    ("天使之城访客", "访问天使之城"),
    ("时光探索者", "探索时光废墟"),
    ("龙之岛探险家", "探索龙族岛屿"),
    ("大集市商人", "访问大集市"),
    ("魔法学徒", "访问魔法学院"),
    ("幽灵船乘客", "登上幽灵船"),
    ("空中酒客", "访问空中酒馆"),
    ("冰宫访客", "访问冰之宫殿"),
    ("火焰祭司", "访问火焰神殿"),
    ("风之谷探索者", "探索风之谷"),
    ("大地使者", "访问大地王国"),
    ("天空学者", "访问天空图书馆"),
    ("造梦师", "探索梦境领域"),
    ("虚空行者", "探索虚空空间"),
    ("天体观测者", "访问天体观测站"),
    ("最终胜利者", "击败暗影君主，拯救世界"),
    // Unlocked by scene activities
    ("龙蛋收集者", "找到一枚龙蛋"),
    ("冰雕大师", "完成一件冰雕作品"),
    ("登山家", "登上冰峰之巅"),
    ("驱魔师", "解开地牢中的诅咒"),
    ("宝藏猎人", "在洞穴中找到宝藏"),
    ("龙骑士", "通过龙的试炼"),
    ("驯龙高手", "与龙签订契约"),
    ("飞行冠军", "赢得荒野比赛"),
    ("时间旅行者", "穿越时间的裂隙"),
];

pub fn describe(id: &str) -> Option<&'static str> {
    ACHIEVEMENTS
        .iter()
        .find(|(key, _)| *key == id)
        .map(|(_, desc)| *desc)
}

/// Anything that can record an achievement unlock.
///
/// Character and combat code take `&mut dyn AchievementSink` so they never
/// reach for global state.
pub trait AchievementSink {
    /// Returns true only when `id` was not held before.
    fn unlock(&mut self, id: &str) -> bool;
}

/// The set of unlocked achievement identifiers. Only grows.
#[derive(Debug, Clone, Default)]
pub struct AchievementSet {
    unlocked: BTreeSet<String>,
    pending: Vec<String>,
}

impl PartialEq for AchievementSet {
    // Pending notifications are display state, not part of the set.
    fn eq(&self, other: &Self) -> bool {
        self.unlocked == other.unlocked
    }
}

impl Eq for AchievementSet {}

impl AchievementSet {
    pub fn contains(&self, id: &str) -> bool {
        self.unlocked.contains(id)
    }

    pub fn len(&self) -> usize {
        self.unlocked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unlocked.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.unlocked.iter().map(String::as_str)
    }

    /// Restore an identifier from a save without queuing a notification.
    pub fn restore(&mut self, id: &str) {
        if describe(id).is_none() {
            warn!("ignoring unknown achievement '{}' in save", id);
            return;
        }
        self.unlocked.insert(id.to_string());
    }

    /// Drain notifications for achievements unlocked since the last call.
    pub fn take_notifications(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending)
    }
}

impl AchievementSink for AchievementSet {
    fn unlock(&mut self, id: &str) -> bool {
        if describe(id).is_none() {
            warn!("attempted to unlock unknown achievement '{}'", id);
            return false;
        }
        if !self.unlocked.insert(id.to_string()) {
            return false;
        }
        info!("achievement unlocked: {}", id);
        self.pending.push(id.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlock_twice_is_a_no_op() {
        let mut set = AchievementSet::default();
        assert!(set.unlock(FIRST_ADVENTURE));
        assert!(!set.unlock(FIRST_ADVENTURE));
        assert_eq!(set.len(), 1);
        assert_eq!(set.take_notifications(), vec![FIRST_ADVENTURE.to_string()]);
        assert!(set.take_notifications().is_empty());
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let mut set = AchievementSet::default();
        assert!(!set.unlock("不存在的成就"));
        set.restore("不存在的成就");
        assert!(set.is_empty());
    }

    #[test]
    fn restore_is_silent() {
        let mut set = AchievementSet::default();
        set.restore(COLLECTOR);
        assert!(set.contains(COLLECTOR));
        assert!(set.take_notifications().is_empty());
        assert!(!set.unlock(COLLECTOR));
    }

    #[test]
    fn table_ids_are_unique() {
        let ids: BTreeSet<&str> = ACHIEVEMENTS.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids.len(), ACHIEVEMENTS.len());
    }

    #[test]
    fn activity_achievements_restore() {
        let mut set = AchievementSet::default();
        for id in ["龙蛋收集者", "冰雕大师", "驯龙高手", "最终胜利者"] {
            set.restore(id);
        }
        assert_eq!(set.len(), 4);
        assert_eq!(describe("龙蛋收集者"), Some("找到一枚龙蛋"));
    }
}
