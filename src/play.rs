//! Interactive play loop.
//!
//! Reads one command per line, turns it into an [`Action`], hands it to
//! [`dispatch`] and prints whatever comes back. Encounters switch to a combat
//! prompt until the fight resolves. All game rules live in [`crate::game`];
//! this module only moves text between the player and the engine.

use anyhow::Result;
use chrono::Local;
use log::{debug, info, warn};
use rand::Rng;
use std::io::{BufRead, Write};

use crate::game::actions::{dispatch, Action, ActionKind, ActionOutcome};
use crate::config::GameConfig;
use crate::game::achievement;
use crate::game::catalog::ContentCatalog;
use crate::game::combat::{CombatAction, CombatSession};
use crate::game::errors::GameError;
use crate::game::session::GameSession;
use crate::game::world::START_SCENE;
use crate::logutil::loggable;
use crate::storage::SaveStore;

/// Per-run settings taken from config and CLI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayOptions {
    /// Probability of an auto-save after each successful action.
    pub auto_save_chance: f64,
    /// Slot used by `save` without an argument and by auto-saves.
    pub slot: Option<u32>,
}

/// Why the loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Menu,
    EndOfInput,
}

pub fn welcome_message(session: &GameSession) -> String {
    format!(
        "欢迎，{}！输入 help 查看命令。\n{}",
        session.character.name,
        status_line(session)
    )
}

fn status_line(session: &GameSession) -> String {
    let scene = session
        .current_scene()
        .map(|s| s.name.clone())
        .unwrap_or_else(|_| session.world.current_scene.clone());
    format!(
        "[{} 第{}天 {} | 生命 {}/{} | 金币 {}]",
        scene,
        session.world.day_count,
        session.world.game_time.format("%H:%M"),
        session.character.hp,
        session.character.max_hp,
        session.character.gold
    )
}

fn read_line<I: BufRead>(input: &mut I) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn print_lines<O: Write>(out: &mut O, lines: &[String]) -> Result<()> {
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

fn print_notifications<O: Write>(session: &mut GameSession, out: &mut O) -> Result<()> {
    for id in session.take_notifications() {
        match achievement::describe(&id) {
            Some(desc) => writeln!(out, "🏆 成就解锁：{} - {}", id, desc)?,
            None => writeln!(out, "🏆 成就解锁：{}", id)?,
        }
    }
    Ok(())
}

fn save_game<O: Write>(
    session: &GameSession,
    store: &SaveStore,
    slot: Option<u32>,
    out: &mut O,
    done: &str,
) -> Result<()> {
    let record = session.snapshot(Local::now().naive_local());
    match store.save(&record, slot) {
        Ok(name) => writeln!(out, "{} ({})", done, name)?,
        Err(e) => {
            warn!("save failed: {}", e);
            writeln!(out, "保存失败：{}", e)?;
        }
    }
    Ok(())
}

/// Resume `save`. When there is no save or it cannot be read, say why and
/// offer a new character instead. `None` means the player declined.
pub fn load_or_start_new<I, O, R>(
    store: &SaveStore,
    save: Option<&str>,
    game: &GameConfig,
    input: &mut I,
    out: &mut O,
    rng: &mut R,
) -> Result<Option<GameSession>>
where
    I: BufRead,
    O: Write,
    R: Rng + ?Sized,
{
    match save {
        Some(name) => {
            let catalog = ContentCatalog::standard();
            match store.load(name, &catalog) {
                Ok(record) => {
                    info!("Resuming {}", loggable(name));
                    return Ok(Some(GameSession::restore(record, catalog)));
                }
                Err(e) => {
                    warn!("cannot resume {}: {}", loggable(name), e);
                    writeln!(out, "无法读取存档 {}：{}", name, e)?;
                }
            }
        }
        None => writeln!(out, "没有找到存档。")?,
    }

    let difficulty = game.difficulty()?;
    loop {
        write!(out, "输入角色名开始新游戏（留空返回）：")?;
        out.flush()?;
        let name = match read_line(input)? {
            Some(name) if !name.is_empty() => name,
            _ => return Ok(None),
        };
        match GameSession::new_game(&name, None, difficulty, ContentCatalog::standard(), rng) {
            Ok(mut session) => {
                if game.start_scene != START_SCENE {
                    session.place_at_start(&game.start_scene)?;
                }
                info!("Starting new game on {}", difficulty);
                return Ok(Some(session));
            }
            Err(e) => writeln!(out, "{}", e)?,
        }
    }
}

/// Parse a line typed at the combat prompt.
pub fn parse_combat_action(line: &str) -> Result<CombatAction, GameError> {
    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or_default().to_lowercase();
    let item = words.collect::<Vec<_>>().join(" ");
    match command.as_str() {
        "1" | "attack" | "a" | "攻击" => Ok(CombatAction::Attack),
        "2" | "magic" | "m" | "魔法" => Ok(CombatAction::Magic),
        "3" | "use" | "u" | "使用" => {
            if item.is_empty() {
                Err(GameError::Input("使用哪个物品？例如: 3 新手药水".into()))
            } else {
                Ok(CombatAction::UseItem(item))
            }
        }
        "4" | "flee" | "f" | "逃跑" => Ok(CombatAction::Flee),
        "" => Err(GameError::Input("请选择行动".into())),
        other => Err(GameError::Input(format!("未知的战斗指令 '{}'", other))),
    }
}

fn combat_status(combat: &CombatSession<'_>) -> String {
    let enemy = combat.enemy();
    let me = combat.character();
    format!(
        "--- 第 {} 回合 | {} 生命 {}/{} | 你 生命 {}/{} ---\n1.攻击 2.魔法 3.使用物品 <名称> 4.逃跑",
        combat.round(),
        enemy.name,
        enemy.hp.max(0),
        enemy.max_hp,
        me.hp,
        me.max_hp
    )
}

/// Run one encounter at the combat prompt. Returns false when input ran out
/// before the fight resolved; the unfinished fight is discarded.
pub fn run_encounter<I, O, R>(
    session: &mut GameSession,
    enemy: &str,
    input: &mut I,
    out: &mut O,
    rng: &mut R,
) -> Result<bool>
where
    I: BufRead,
    O: Write,
    R: Rng,
{
    let outcome = {
        let mut combat = match session.begin_combat(enemy) {
            Ok(combat) => combat,
            Err(e) => {
                writeln!(out, "{}", e)?;
                return Ok(true);
            }
        };
        writeln!(out, "战斗开始！你遇到了 {}", combat.enemy().name)?;
        while !combat.is_resolved() {
            writeln!(out, "{}", combat_status(&combat))?;
            write!(out, "战斗> ")?;
            out.flush()?;
            let Some(line) = read_line(input)? else {
                debug!("input closed during combat with {}", enemy);
                return Ok(false);
            };
            let action = match parse_combat_action(&line) {
                Ok(action) => action,
                Err(e) => {
                    writeln!(out, "{}", e)?;
                    continue;
                }
            };
            match combat.step(action, rng) {
                Ok(report) => {
                    for event in &report.events {
                        writeln!(out, "{}", event)?;
                    }
                }
                Err(e) => writeln!(out, "{}", e)?,
            }
        }
        combat.outcome()
    };
    if let Some(outcome) = outcome {
        for quest in session.finish_combat(&outcome) {
            writeln!(out, "任务 {} 可以完成了！", quest)?;
        }
    }
    Ok(true)
}

/// Play until the player goes back to the menu or input ends.
pub fn run<I, O, R>(
    session: &mut GameSession,
    store: &SaveStore,
    options: &PlayOptions,
    input: &mut I,
    out: &mut O,
    rng: &mut R,
) -> Result<LoopExit>
where
    I: BufRead,
    O: Write,
    R: Rng,
{
    writeln!(out, "{}", welcome_message(session))?;
    print_notifications(session, out)?;
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = read_line(input)? else {
            info!("input closed, leaving play loop");
            return Ok(LoopExit::EndOfInput);
        };
        if line.is_empty() {
            continue;
        }
        let action = match Action::parse(&line) {
            Ok(action) => action,
            Err(e) => {
                writeln!(out, "{}", e)?;
                writeln!(out, "输入 help 查看命令。")?;
                continue;
            }
        };
        let kind = action.kind();
        match dispatch(session, action, rng) {
            Ok(ActionOutcome::Continue(lines)) => print_lines(out, &lines)?,
            Ok(ActionOutcome::Encounter { lines, enemy }) => {
                print_lines(out, &lines)?;
                if !run_encounter(session, &enemy, input, out, rng)? {
                    return Ok(LoopExit::EndOfInput);
                }
            }
            Ok(ActionOutcome::Save(slot)) => {
                save_game(session, store, slot.or(options.slot), out, "游戏已保存")?;
            }
            Ok(ActionOutcome::Menu) => {
                print_notifications(session, out)?;
                return Ok(LoopExit::Menu);
            }
            Err(e) => {
                if !e.is_recoverable_input() {
                    warn!("{} failed: {}", kind, e);
                }
                writeln!(out, "{}", e)?;
                if matches!(e, GameError::Closed { .. }) {
                    writeln!(out, "现在只能移动、查看状态、保存或返回菜单。")?;
                }
                continue;
            }
        }
        print_notifications(session, out)?;
        if kind != ActionKind::Save
            && options.auto_save_chance > 0.0
            && rng.gen_bool(options.auto_save_chance.min(1.0))
        {
            save_game(session, store, options.slot, out, "自动保存完成")?;
        }
        writeln!(out, "{}", status_line(session))?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::ContentCatalog;
    use crate::game::difficulty::Difficulty;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn session(rng: &mut StdRng) -> GameSession {
        GameSession::new_game("Aria", None, Difficulty::Easy, ContentCatalog::standard(), rng).unwrap()
    }

    fn options(chance: f64) -> PlayOptions {
        PlayOptions {
            auto_save_chance: chance,
            slot: Some(1),
        }
    }

    #[test]
    fn combat_commands() {
        assert_eq!(parse_combat_action("1").unwrap(), CombatAction::Attack);
        assert_eq!(parse_combat_action("魔法").unwrap(), CombatAction::Magic);
        assert_eq!(
            parse_combat_action("3 新手药水").unwrap(),
            CombatAction::UseItem("新手药水".into())
        );
        assert_eq!(parse_combat_action("FLEE").unwrap(), CombatAction::Flee);
        assert!(parse_combat_action("3").is_err());
        assert!(parse_combat_action("dance").is_err());
    }

    #[test]
    fn save_then_menu() {
        let dir = tempdir().unwrap();
        let store = SaveStore::open(dir.path()).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let mut s = session(&mut rng);
        let mut input = Cursor::new("status\nsave\nmenu\n");
        let mut out = Vec::new();
        let exit = run(&mut s, &store, &options(0.0), &mut input, &mut out, &mut rng).unwrap();
        assert_eq!(exit, LoopExit::Menu);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("=== Aria ==="));
        assert!(text.contains("游戏已保存 (save_slot_1)"));
        assert!(text.contains("初次冒险"));
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn bad_commands_keep_the_loop_going() {
        let dir = tempdir().unwrap();
        let store = SaveStore::open(dir.path()).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let mut s = session(&mut rng);
        let gold = s.character.gold;
        let mut input = Cursor::new("dance\n\nbuy 商人 不存在的东西\n");
        let mut out = Vec::new();
        let exit = run(&mut s, &store, &options(0.0), &mut input, &mut out, &mut rng).unwrap();
        assert_eq!(exit, LoopExit::EndOfInput);
        assert_eq!(s.character.gold, gold);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("输入 help 查看命令。"));
    }

    #[test]
    fn auto_save_always_fires_at_full_chance() {
        let dir = tempdir().unwrap();
        let store = SaveStore::open(dir.path()).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let mut s = session(&mut rng);
        let mut input = Cursor::new("rest\n");
        let mut out = Vec::new();
        run(&mut s, &store, &options(1.0), &mut input, &mut out, &mut rng).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("自动保存完成"));
        assert!(dir.path().join("save_slot_1").exists());
    }

    #[test]
    fn encounter_runs_to_resolution() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut s = session(&mut rng);
        let mut input = Cursor::new("1\n".repeat(500));
        let mut out = Vec::new();
        let finished = run_encounter(&mut s, "野狼", &mut input, &mut out, &mut rng).unwrap();
        assert!(finished);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("战斗胜利") || text.contains("你被击败了"));
    }

    #[test]
    fn encounter_stops_when_input_ends() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut s = session(&mut rng);
        let mut input = Cursor::new("");
        let mut out = Vec::new();
        assert!(!run_encounter(&mut s, "野狼", &mut input, &mut out, &mut rng).unwrap());
    }

    #[test]
    fn unreadable_save_offers_a_new_game() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("save_broken"), "not a save at all\n").unwrap();
        let store = SaveStore::open(dir.path()).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let game = GameConfig::default();

        let mut input = Cursor::new("a\u{7}b\nMei\n");
        let mut out = Vec::new();
        let session = load_or_start_new(&store, Some("save_broken"), &game, &mut input, &mut out, &mut rng)
            .unwrap()
            .unwrap();
        assert_eq!(session.character.name, "Mei");
        assert_eq!(session.character.level, 1);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("无法读取存档 save_broken"));

        let mut out = Vec::new();
        let declined =
            load_or_start_new(&store, Some("save_missing"), &game, &mut Cursor::new("\n"), &mut out, &mut rng)
                .unwrap();
        assert!(declined.is_none());
        assert!(String::from_utf8(out).unwrap().contains("save_missing"));
    }

    #[test]
    fn readable_save_resumes_without_prompting() {
        let dir = tempdir().unwrap();
        let store = SaveStore::open(dir.path()).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        let s = session(&mut rng);
        let name = store.save(&s.snapshot(Local::now().naive_local()), Some(3)).unwrap();
        let mut out = Vec::new();
        let resumed = load_or_start_new(
            &store,
            Some(&name),
            &GameConfig::default(),
            &mut Cursor::new(""),
            &mut out,
            &mut rng,
        )
        .unwrap()
        .unwrap();
        assert_eq!(resumed.character, s.character);
        assert!(out.is_empty());
    }

    #[test]
    fn unknown_enemy_is_reported() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut s = session(&mut rng);
        let mut out = Vec::new();
        let finished = run_encounter(&mut s, "幽灵", &mut Cursor::new(""), &mut out, &mut rng).unwrap();
        assert!(finished);
        assert!(String::from_utf8(out).unwrap().contains("not found"));
    }
}
