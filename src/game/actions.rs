//! Player actions outside combat and the table that dispatches them.
//!
//! [`Action::parse`] turns a line of input into an [`Action`]; [`dispatch`]
//! looks up the handler for its [`ActionKind`] once and runs it against a
//! [`GameSession`]. Handlers only produce text lines; the play loop decides
//! how to show them.

use rand::RngCore;
use std::fmt;

use crate::game::catalog::ItemKind;
use crate::game::errors::GameError;
use crate::game::inventory::EquipSlot;
use crate::game::session::{Discovery, GameSession};
use crate::game::world::INN_PRICE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Explore,
    Rest,
    ShowInventory,
    UseItem(String),
    DropItem { name: String, qty: u32 },
    Equip(String),
    ShowStatus,
    ShowQuests,
    AcceptQuest(String),
    CompleteQuest(String),
    ShowMap,
    Travel(String),
    Unlock(String),
    Talk(Option<String>),
    Buy { npc: String, item: String },
    Sell { item: String, qty: u32 },
    Inn,
    Save(Option<u32>),
    Menu,
    Help,
    /// Run a scene activity, or list them when no name is given.
    SceneAction(Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Explore,
    Rest,
    ShowInventory,
    UseItem,
    DropItem,
    Equip,
    ShowStatus,
    ShowQuests,
    AcceptQuest,
    CompleteQuest,
    ShowMap,
    Travel,
    Unlock,
    Talk,
    Buy,
    Sell,
    Inn,
    Save,
    Menu,
    Help,
    SceneAction,
}

/// What the play loop should do after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Continue(Vec<String>),
    /// Exploring ran into an enemy; the loop runs the encounter.
    Encounter { lines: Vec<String>, enemy: String },
    Save(Option<u32>),
    Menu,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Explore => ActionKind::Explore,
            Action::Rest => ActionKind::Rest,
            Action::ShowInventory => ActionKind::ShowInventory,
            Action::UseItem(_) => ActionKind::UseItem,
            Action::DropItem { .. } => ActionKind::DropItem,
            Action::Equip(_) => ActionKind::Equip,
            Action::ShowStatus => ActionKind::ShowStatus,
            Action::ShowQuests => ActionKind::ShowQuests,
            Action::AcceptQuest(_) => ActionKind::AcceptQuest,
            Action::CompleteQuest(_) => ActionKind::CompleteQuest,
            Action::ShowMap => ActionKind::ShowMap,
            Action::Travel(_) => ActionKind::Travel,
            Action::Unlock(_) => ActionKind::Unlock,
            Action::Talk(_) => ActionKind::Talk,
            Action::Buy { .. } => ActionKind::Buy,
            Action::Sell { .. } => ActionKind::Sell,
            Action::Inn => ActionKind::Inn,
            Action::Save(_) => ActionKind::Save,
            Action::Menu => ActionKind::Menu,
            Action::Help => ActionKind::Help,
            Action::SceneAction(_) => ActionKind::SceneAction,
        }
    }

    /// Parse a command line. The first word may be an English command, its
    /// Chinese name or a main-menu number; the rest are arguments.
    pub fn parse(input: &str) -> Result<Action, GameError> {
        let mut words = input.split_whitespace();
        let Some(command) = words.next() else {
            return Err(GameError::Input("empty command".into()));
        };
        let args: Vec<&str> = words.collect();
        let rest = || args.join(" ");
        let required = |what: &str| -> Result<String, GameError> {
            if args.is_empty() {
                Err(GameError::Input(format!("{} requires {}", command, what)))
            } else {
                Ok(args.join(" "))
            }
        };

        let action = match command.to_lowercase().as_str() {
            "1" | "explore" | "e" | "探索" => Action::Explore,
            "2" | "rest" | "休息" => Action::Rest,
            "3" | "inventory" | "i" | "物品" | "背包" => Action::ShowInventory,
            "use" | "使用" => Action::UseItem(required("an item")?),
            "drop" | "丢弃" => {
                let (name, qty) = split_quantity(&args)?;
                Action::DropItem { name, qty }
            }
            "equip" | "装备" => Action::Equip(required("an item")?),
            "4" | "status" | "s" | "角色" | "状态" => Action::ShowStatus,
            "5" | "quests" | "q" | "任务" => Action::ShowQuests,
            "accept" | "接受" => Action::AcceptQuest(required("a quest")?),
            "complete" | "完成" | "交任务" => Action::CompleteQuest(required("a quest")?),
            "6" | "map" | "地图" => {
                if args.is_empty() {
                    Action::ShowMap
                } else {
                    Action::Travel(rest())
                }
            }
            "travel" | "go" | "移动" => Action::Travel(required("a scene")?),
            "unlock" | "解锁" => Action::Unlock(required("a scene")?),
            "7" | "talk" | "交谈" => Action::Talk(if args.is_empty() { None } else { Some(rest()) }),
            "buy" | "购买" => match args.as_slice() {
                [npc, item @ ..] if !item.is_empty() => Action::Buy {
                    npc: npc.to_string(),
                    item: item.join(" "),
                },
                _ => return Err(GameError::Input("usage: buy <npc> <item>".into())),
            },
            "sell" | "出售" => {
                let (item, qty) = split_quantity(&args)?;
                Action::Sell { item, qty }
            }
            "inn" | "旅馆" => Action::Inn,
            "8" | "save" | "保存" => match args.first() {
                None => Action::Save(None),
                Some(slot) => Action::Save(Some(slot.parse().map_err(|_| {
                    GameError::Input(format!("invalid save slot '{}'", slot))
                })?)),
            },
            "9" | "menu" | "quit" | "菜单" => Action::Menu,
            "help" | "h" | "?" | "帮助" => Action::Help,
            "0" | "do" | "act" | "活动" => {
                Action::SceneAction(if args.is_empty() { None } else { Some(rest()) })
            }
            other => return Err(GameError::Input(format!("unknown command '{}'", other))),
        };
        Ok(action)
    }
}

/// `<name...> [qty]`; the quantity defaults to one.
fn split_quantity(args: &[&str]) -> Result<(String, u32), GameError> {
    match args {
        [] => Err(GameError::Input("an item name is required".into())),
        [name] => Ok((name.to_string(), 1)),
        [name @ .., last] => match last.parse::<u32>() {
            Ok(qty) => Ok((name.join(" "), qty)),
            Err(_) => Ok((args.join(" "), 1)),
        },
    }
}

impl ActionKind {
    /// Actions still possible while the current scene is outside its hours.
    pub fn allowed_when_closed(self) -> bool {
        matches!(
            self,
            ActionKind::ShowMap
                | ActionKind::Travel
                | ActionKind::ShowStatus
                | ActionKind::Save
                | ActionKind::Menu
                | ActionKind::Help
        )
    }
}

type Handler = fn(&mut GameSession, Action, &mut dyn RngCore) -> Result<ActionOutcome, GameError>;

/// Indexed by `ActionKind as usize`.
const HANDLERS: [(ActionKind, Handler); 21] = [
    (ActionKind::Explore, explore),
    (ActionKind::Rest, rest),
    (ActionKind::ShowInventory, show_inventory),
    (ActionKind::UseItem, use_item),
    (ActionKind::DropItem, drop_item),
    (ActionKind::Equip, equip),
    (ActionKind::ShowStatus, show_status),
    (ActionKind::ShowQuests, show_quests),
    (ActionKind::AcceptQuest, accept_quest),
    (ActionKind::CompleteQuest, complete_quest),
    (ActionKind::ShowMap, show_map),
    (ActionKind::Travel, travel),
    (ActionKind::Unlock, unlock),
    (ActionKind::Talk, talk),
    (ActionKind::Buy, buy),
    (ActionKind::Sell, sell),
    (ActionKind::Inn, inn),
    (ActionKind::Save, save),
    (ActionKind::Menu, menu),
    (ActionKind::Help, help),
    (ActionKind::SceneAction, scene_action),
];

/// Run one action. Fails with [`GameError::Closed`] when the scene is closed
/// and the action is not allowed then.
pub fn dispatch(
    session: &mut GameSession,
    action: Action,
    rng: &mut dyn RngCore,
) -> Result<ActionOutcome, GameError> {
    let kind = action.kind();
    if !kind.allowed_when_closed() {
        session.world.check_open(session.catalog())?;
    }
    let (_, handler) = HANDLERS[kind as usize];
    handler(session, action, rng)
}

fn explore(s: &mut GameSession, _: Action, rng: &mut dyn RngCore) -> Result<ActionOutcome, GameError> {
    let scene_name = s.current_scene()?.name.clone();
    let report = s.explore(rng)?;
    let mut lines = vec![format!("你开始探索{}...", scene_name)];
    let encounter = match &report.discovery {
        Discovery::Encounter(enemy) => {
            lines.push(format!("你遇到了 {}！", enemy));
            Some(enemy.clone())
        }
        Discovery::Items { name, qty } => {
            lines.push(format!("你发现了 {} 个 {}！", qty, name));
            None
        }
        Discovery::Gold(amount) => {
            lines.push(format!("你捡到了 {} 金币。", amount));
            None
        }
        Discovery::CaveDepths => {
            lines.push("你摸索着走到了洞穴的最深处。".to_string());
            None
        }
        Discovery::Nothing => {
            lines.push("你没有发现任何特别的东西。".to_string());
            None
        }
    };
    lines.push(format!("探索获得 {} 点经验值", report.exp));
    for up in &report.levels {
        lines.push(format!("升级了！现在是 {} 级", up.new_level));
    }
    push_completable(&mut lines, &report.completable);
    Ok(match encounter {
        Some(enemy) => ActionOutcome::Encounter { lines, enemy },
        None => ActionOutcome::Continue(lines),
    })
}

fn rest(s: &mut GameSession, _: Action, _: &mut dyn RngCore) -> Result<ActionOutcome, GameError> {
    let healed = s.rest();
    Ok(ActionOutcome::Continue(vec![format!(
        "你休息了一会儿，恢复了 {} 点生命值。({}/{})",
        healed, s.character.hp, s.character.max_hp
    )]))
}

fn show_inventory(s: &mut GameSession, _: Action, _: &mut dyn RngCore) -> Result<ActionOutcome, GameError> {
    let c = &s.character;
    let mut lines = vec!["=== 物品 ===".to_string()];
    if c.inventory.is_empty() {
        lines.push("背包是空的。".to_string());
    }
    for (name, qty) in c.inventory.iter() {
        let kind = s
            .catalog()
            .item_def(name)
            .map(|d| d.kind.to_string())
            .unwrap_or_else(|| "?".to_string());
        lines.push(format!("{} x{} [{}]", name, qty, kind));
    }
    lines.push("=== 装备 ===".to_string());
    for slot in EquipSlot::ALL {
        lines.push(format!("{}: {}", slot, c.equipped(slot).unwrap_or("无")));
    }
    Ok(ActionOutcome::Continue(lines))
}

fn use_item(s: &mut GameSession, action: Action, rng: &mut dyn RngCore) -> Result<ActionOutcome, GameError> {
    let Action::UseItem(name) = action else {
        return Err(mismatch(ActionKind::UseItem));
    };
    let effect = s.use_item(&name, rng)?;
    let event = crate::game::combat::CombatEvent::ItemUsed { name, effect };
    Ok(ActionOutcome::Continue(vec![event.to_string()]))
}

fn drop_item(s: &mut GameSession, action: Action, _: &mut dyn RngCore) -> Result<ActionOutcome, GameError> {
    let Action::DropItem { name, qty } = action else {
        return Err(mismatch(ActionKind::DropItem));
    };
    let dropped = s.drop_item(&name, qty)?;
    Ok(ActionOutcome::Continue(vec![format!("你丢弃了 {} 个 {}。", dropped, name)]))
}

fn equip(s: &mut GameSession, action: Action, _: &mut dyn RngCore) -> Result<ActionOutcome, GameError> {
    let Action::Equip(name) = action else {
        return Err(mismatch(ActionKind::Equip));
    };
    let slot = s.equip(&name)?;
    Ok(ActionOutcome::Continue(vec![format!("你装备了 {}（{}）。", name, slot)]))
}

fn show_status(s: &mut GameSession, _: Action, _: &mut dyn RngCore) -> Result<ActionOutcome, GameError> {
    let c = &s.character;
    let scene = s.current_scene()?;
    let mut lines = vec![
        format!("=== {} ===", c.name),
        format!("等级: {}  经验: {}/{}", c.level, c.experience, c.exp_to_next_level()),
        format!("生命: {}/{}  攻击: {}  防御: {}", c.hp, c.max_hp, c.attack, c.defense),
        format!("金币: {}", c.gold),
    ];
    match c.magic_affinity {
        Some(a) => lines.push(format!(
            "魔法: {}  魔力: {}  魔法等级: {}  魔法经验: {}",
            a.display_name(),
            c.magic_power,
            c.magic_level,
            c.magic_experience
        )),
        None => lines.push("魔法: 无".to_string()),
    }
    lines.push(format!(
        "位置: {}  时间: 第 {} 天 {}  难度: {}",
        scene.name,
        s.world.day_count,
        s.world.game_time.format("%H:%M"),
        s.difficulty()
    ));
    let unlocked: Vec<&str> = s.achievements.iter().collect();
    lines.push(format!("成就 ({}): {}", unlocked.len(), unlocked.join("、")));
    Ok(ActionOutcome::Continue(lines))
}

fn show_quests(s: &mut GameSession, _: Action, _: &mut dyn RngCore) -> Result<ActionOutcome, GameError> {
    let mut lines = vec!["=== 任务 ===".to_string()];
    let completable = s.progress.completable_quests(&s.character.inventory);
    for quest in s.progress.quests().values() {
        let mark = if completable.contains(&quest.name) { " (可完成)" } else { "" };
        lines.push(format!(
            "[{}/{}] {}: {}{}",
            quest.kind.as_str(),
            quest.status.as_str(),
            quest.name,
            quest.description,
            mark
        ));
    }
    Ok(ActionOutcome::Continue(lines))
}

fn accept_quest(s: &mut GameSession, action: Action, _: &mut dyn RngCore) -> Result<ActionOutcome, GameError> {
    let Action::AcceptQuest(name) = action else {
        return Err(mismatch(ActionKind::AcceptQuest));
    };
    s.accept_quest(&name)?;
    Ok(ActionOutcome::Continue(vec![format!("你接受了任务：{}", name)]))
}

fn complete_quest(
    s: &mut GameSession,
    action: Action,
    rng: &mut dyn RngCore,
) -> Result<ActionOutcome, GameError> {
    let Action::CompleteQuest(name) = action else {
        return Err(mismatch(ActionKind::CompleteQuest));
    };
    let done = s.complete_quest(&name, rng)?;
    let mut lines = vec![format!(
        "任务完成：{}！获得 {} 经验值和 {} 金币",
        done.name, done.reward.exp, done.reward.gold
    )];
    for item in &done.reward.items {
        lines.push(format!("获得物品：{}", item));
    }
    for up in &done.levels {
        lines.push(format!("升级了！现在是 {} 级", up.new_level));
    }
    Ok(ActionOutcome::Continue(lines))
}

fn show_map(s: &mut GameSession, _: Action, _: &mut dyn RngCore) -> Result<ActionOutcome, GameError> {
    let profile = s.profile();
    let mut lines = vec![format!("=== 地图 (当前: {}) ===", s.world.current_scene)];
    for scene in s.catalog().scenes() {
        let access = match s.world.unlock_cost(&scene.key, s.catalog(), &profile)? {
            None => "已解锁".to_string(),
            Some(cost) => format!("解锁需要 {} 金币", cost),
        };
        let hours = match scene.time_restriction {
            Some((open, close)) => format!(" {:02}:00-{:02}:00", open, close),
            None => String::new(),
        };
        lines.push(format!(
            "{} - {} (推荐等级 {}) {}{}",
            scene.key,
            scene.name,
            s.recommended_level(scene),
            access,
            hours
        ));
    }
    Ok(ActionOutcome::Continue(lines))
}

fn travel(s: &mut GameSession, action: Action, rng: &mut dyn RngCore) -> Result<ActionOutcome, GameError> {
    let Action::Travel(key) = action else {
        return Err(mismatch(ActionKind::Travel));
    };
    let report = s.travel(&key, rng)?;
    let scene = s.current_scene()?;
    let mut lines = vec![
        format!("你花了 {} 小时来到了{}。", report.time.hours, scene.name),
        scene.description.clone(),
    ];
    if report.time.new_days > 0 {
        lines.push(format!("新的一天开始了，今天是第 {} 天。", s.world.day_count));
    }
    let recommended = s.recommended_level(scene);
    if s.character.level < recommended {
        lines.push(format!("警告：这里推荐等级为 {}。", recommended));
    }
    Ok(ActionOutcome::Continue(lines))
}

fn unlock(s: &mut GameSession, action: Action, _: &mut dyn RngCore) -> Result<ActionOutcome, GameError> {
    let Action::Unlock(key) = action else {
        return Err(mismatch(ActionKind::Unlock));
    };
    let spent = s.unlock_scene(&key)?;
    let line = if spent == 0 {
        format!("{} 已经解锁了。", key)
    } else {
        format!("你花费 {} 金币解锁了 {}。", spent, key)
    };
    Ok(ActionOutcome::Continue(vec![line]))
}

fn talk(s: &mut GameSession, action: Action, _: &mut dyn RngCore) -> Result<ActionOutcome, GameError> {
    let Action::Talk(target) = action else {
        return Err(mismatch(ActionKind::Talk));
    };
    let Some(name) = target else {
        let names: Vec<String> = s.npcs_here()?.iter().map(|n| n.name.clone()).collect();
        let line = if names.is_empty() {
            "这里没有人可以交谈。".to_string()
        } else {
            format!("这里的人: {}", names.join("、"))
        };
        return Ok(ActionOutcome::Continue(vec![line]));
    };

    let (npc, completable) = s.talk(&name)?;
    let mut lines = vec![format!("{}: \"{}\"", npc.name, npc.dialogue)];
    for quest in npc.quests.iter().filter_map(|q| s.progress.quest(q)) {
        lines.push(format!("任务 [{}] {}: {}", quest.status.as_str(), quest.name, quest.description));
    }
    if !npc.trades.is_empty() {
        lines.push("出售:".to_string());
        for (item, price) in &npc.trades {
            lines.push(format!("  {} - {} 金币", item, price));
        }
    }
    push_completable(&mut lines, &completable);
    Ok(ActionOutcome::Continue(lines))
}

fn buy(s: &mut GameSession, action: Action, _: &mut dyn RngCore) -> Result<ActionOutcome, GameError> {
    let Action::Buy { npc, item } = action else {
        return Err(mismatch(ActionKind::Buy));
    };
    let price = s.buy(&npc, &item)?;
    Ok(ActionOutcome::Continue(vec![format!("你购买了 {}，花费了 {} 金币。", item, price)]))
}

fn sell(s: &mut GameSession, action: Action, _: &mut dyn RngCore) -> Result<ActionOutcome, GameError> {
    let Action::Sell { item, qty } = action else {
        return Err(mismatch(ActionKind::Sell));
    };
    let (sold, earned) = s.sell(&item, qty)?;
    Ok(ActionOutcome::Continue(vec![format!(
        "你出售了 {} 个 {}，获得了 {} 金币。",
        sold, item, earned
    )]))
}

fn inn(s: &mut GameSession, _: Action, _: &mut dyn RngCore) -> Result<ActionOutcome, GameError> {
    let slept = s.stay_at_inn()?;
    Ok(ActionOutcome::Continue(vec![format!(
        "你花费 {} 金币在旅馆睡了 {} 小时，生命值完全恢复。今天是第 {} 天。",
        INN_PRICE, slept.hours, s.world.day_count
    )]))
}

fn save(_: &mut GameSession, action: Action, _: &mut dyn RngCore) -> Result<ActionOutcome, GameError> {
    let Action::Save(slot) = action else {
        return Err(mismatch(ActionKind::Save));
    };
    Ok(ActionOutcome::Save(slot))
}

fn menu(_: &mut GameSession, _: Action, _: &mut dyn RngCore) -> Result<ActionOutcome, GameError> {
    Ok(ActionOutcome::Menu)
}

fn help(_: &mut GameSession, _: Action, _: &mut dyn RngCore) -> Result<ActionOutcome, GameError> {
    Ok(ActionOutcome::Continue(help_text().lines().map(str::to_string).collect()))
}

fn scene_action(s: &mut GameSession, action: Action, rng: &mut dyn RngCore) -> Result<ActionOutcome, GameError> {
    let Action::SceneAction(target) = action else {
        return Err(mismatch(ActionKind::SceneAction));
    };
    let Some(name) = target else {
        let mut lines = Vec::new();
        for def in s.scene_actions_here()? {
            let mut gate = Vec::new();
            if def.min_level > 0 {
                gate.push(format!("需要 {} 级", def.min_level));
            }
            if def.gold_cost > 0 {
                gate.push(format!("{} 金币", def.gold_cost));
            }
            if let Some(item) = &def.item_cost {
                gate.push(format!("消耗 {}", item));
            }
            if gate.is_empty() {
                lines.push(def.name.clone());
            } else {
                lines.push(format!("{} ({})", def.name, gate.join("，")));
            }
        }
        if lines.is_empty() {
            lines.push("这里没有可以进行的活动。".to_string());
        }
        return Ok(ActionOutcome::Continue(lines));
    };

    let report = s.perform_scene_action(&name, rng)?;
    let mut lines = vec![report.text.clone()];
    lines.extend(report.changes.iter().map(|c| c.to_string()));
    for up in &report.levels {
        lines.push(format!("升级了！现在是 {} 级", up.new_level));
    }
    push_completable(&mut lines, &report.completable);
    Ok(ActionOutcome::Continue(lines))
}

fn push_completable(lines: &mut Vec<String>, quests: &[String]) {
    for quest in quests {
        lines.push(format!("任务 {} 可以完成了！", quest));
    }
}

fn mismatch(kind: ActionKind) -> GameError {
    GameError::Input(format!("handler for {} called with another action", kind))
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Item kinds the sell command accepts, for the help text.
fn sellable_kinds() -> String {
    [ItemKind::Material, ItemKind::Treasure, ItemKind::Consumable]
        .iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join("/")
}

const HELP: &str = "\
1 explore          探索当前区域
2 rest             休息一小时
3 inventory        查看物品和装备
  use <物品>       使用消耗品
  drop <物品> [n]  丢弃物品
  equip <物品>     装备物品
4 status           角色状态
5 quests           任务列表
  accept <任务>    接受任务
  complete <任务>  完成任务
6 map [场景]       查看地图或前往场景
  unlock <场景>    解锁场景
7 talk [NPC]       与NPC交谈
  buy <NPC> <物品> 购买物品
  sell <物品> [n]  出售物品
  inn              在旅馆过夜
8 save [槽位]      保存游戏
9 menu             返回主菜单
0 do [活动]        查看或进行场景活动";

/// Full help, including which item kinds can be sold.
pub fn help_text() -> String {
    format!("{}\n可出售的物品类型: {}", HELP, sellable_kinds())
}
