/// Integration tests for quest acceptance, tracking and hand-in.
use rand::rngs::StdRng;
use rand::SeedableRng;
use retrorpg::game::achievement::{self, AchievementSet};
use retrorpg::game::actions::{dispatch, Action, ActionOutcome};
use retrorpg::game::catalog::ContentCatalog;
use retrorpg::game::character::Character;
use retrorpg::game::combat::CombatResult;
use retrorpg::game::difficulty::Difficulty;
use retrorpg::game::errors::GameError;
use retrorpg::game::progression::ProgressionTracker;
use retrorpg::game::quest::{QuestKind, QuestRecord, QuestStatus, QuestTarget};
use retrorpg::game::session::GameSession;

fn tracker() -> ProgressionTracker {
    ProgressionTracker::new(ContentCatalog::standard().initial_quests())
}

#[test]
fn wolf_hunt_from_kills_to_reward() {
    let mut progress = tracker();
    let mut sink = AchievementSet::default();
    let mut c = Character::blank("Aria");
    let mut rng = StdRng::seed_from_u64(1);

    // Kills before accepting do not count towards the hunt
    assert!(progress.on_enemy_defeated("野狼", 2, &mut c, &mut sink).is_empty());
    assert!(!c.inventory.contains("野狼"));

    progress.accept_quest("猎狼任务").unwrap();
    for _ in 0..4 {
        assert!(progress.on_enemy_defeated("野狼", 1, &mut c, &mut sink).is_empty());
    }
    assert!(progress.completable_quests(&c.inventory).is_empty());
    assert_eq!(
        progress.on_enemy_defeated("野狼", 1, &mut c, &mut sink),
        vec!["猎狼任务".to_string()]
    );
    // Already reported once
    assert!(progress.on_inventory_changed(&c.inventory).is_empty());
    assert_eq!(progress.counters().enemies_defeated, 7);

    let done = progress.complete_quest("猎狼任务", &mut c, &mut rng, &mut sink).unwrap();
    assert_eq!(done.reward.exp, 100);
    assert_eq!(done.levels.len(), 1);
    assert_eq!(c.level, 2);
    assert_eq!(c.gold, 50);
    assert!(c.inventory.contains("猎人的弓"));
    // Hand-in keeps the trophies
    assert_eq!(c.inventory.count("野狼"), 5);
    assert_eq!(progress.quest("猎狼任务").unwrap().status, QuestStatus::Completed);
    assert_eq!(progress.counters().quests_completed, 1);

    assert!(matches!(
        progress.complete_quest("猎狼任务", &mut c, &mut rng, &mut sink),
        Err(GameError::Input(_))
    ));
    assert!(matches!(progress.accept_quest("猎狼任务"), Err(GameError::Input(_))));
}

#[test]
fn hand_in_errors_leave_state_alone() {
    let mut progress = tracker();
    let mut sink = AchievementSet::default();
    let mut c = Character::blank("Aria");
    let mut rng = StdRng::seed_from_u64(2);

    assert!(matches!(
        progress.complete_quest("收集熊皮", &mut c, &mut rng, &mut sink),
        Err(GameError::Input(_))
    ));
    progress.accept_quest("收集熊皮").unwrap();
    c.inventory.add("熊皮", 2);
    assert!(matches!(
        progress.complete_quest("收集熊皮", &mut c, &mut rng, &mut sink),
        Err(GameError::InsufficientResource(_))
    ));
    assert!(matches!(
        progress.complete_quest("屠龙", &mut c, &mut rng, &mut sink),
        Err(GameError::NotFound(_))
    ));
    assert_eq!(c.gold, 0);
    assert_eq!(c.experience, 0);
    assert_eq!(progress.quest("收集熊皮").unwrap().status, QuestStatus::Active);

    c.inventory.add("熊皮", 1);
    assert_eq!(progress.on_inventory_changed(&c.inventory), vec!["收集熊皮".to_string()]);
    progress.complete_quest("收集熊皮", &mut c, &mut rng, &mut sink).unwrap();
    assert!(c.inventory.contains("熊皮大衣"));
}

#[test]
fn condition_quests_wait_for_their_key() {
    let mut progress = tracker();
    let mut sink = AchievementSet::default();
    let mut c = Character::blank("Aria");
    let mut rng = StdRng::seed_from_u64(3);

    // A condition met before acceptance still counts once the quest is active
    assert!(progress.satisfy_condition("explore_cave_deep", &c.inventory).is_empty());
    progress.accept_quest("探索洞穴深处").unwrap();
    progress.accept_quest("送货任务").unwrap();
    assert_eq!(progress.completable_quests(&c.inventory), vec!["探索洞穴深处".to_string()]);

    assert_eq!(
        progress.satisfy_condition("unrelated", &c.inventory),
        vec!["探索洞穴深处".to_string()]
    );
    assert_eq!(
        progress.satisfy_condition("deliver_goods", &c.inventory),
        vec!["送货任务".to_string()]
    );

    let done = progress.complete_quest("送货任务", &mut c, &mut rng, &mut sink).unwrap();
    assert_eq!((done.reward.exp, done.reward.gold), (100, 80));
    assert!(c.inventory.contains("商人的推荐信"));
}

#[test]
fn finishing_every_main_quest_unlocks_savior() {
    let catalog = ContentCatalog::standard();
    let mut progress = tracker();
    let mut sink = AchievementSet::default();
    let mut c = Character::blank("Aria");
    let mut rng = StdRng::seed_from_u64(4);

    let mains: Vec<QuestRecord> = catalog
        .initial_quests()
        .into_values()
        .filter(|q| q.kind == QuestKind::Main)
        .collect();
    assert!(mains.len() > 5);
    for quest in &mains {
        progress.accept_quest(&quest.name).unwrap();
        match &quest.target {
            QuestTarget::Items(needed) => {
                for (item, qty) in needed {
                    c.inventory.add(item, *qty);
                }
            }
            QuestTarget::Condition(key) => {
                progress.satisfy_condition(key, &c.inventory);
            }
        }
    }
    for (i, quest) in mains.iter().enumerate() {
        progress.complete_quest(&quest.name, &mut c, &mut rng, &mut sink).unwrap();
        let last = i == mains.len() - 1;
        assert_eq!(sink.contains(achievement::SAVIOR), last, "after {}", quest.name);
    }
    assert!(c.level > 1);
}

#[test]
fn dungeon_activity_frees_the_princess() {
    let mut rng = StdRng::seed_from_u64(6);
    let mut s = GameSession::new_game("Aria", None, Difficulty::Normal, ContentCatalog::standard(), &mut rng)
        .unwrap();
    s.character.gold = 1_000;
    s.character.max_hp = 10_000;
    s.character.hp = 10_000;
    for key in ["castle", "dungeon"] {
        s.unlock_scene(key).unwrap();
    }
    s.travel("castle", &mut rng).unwrap();
    s.world.game_time = retrorpg::game::world::start_time() + chrono::Duration::hours(2);
    dispatch(&mut s, Action::parse("accept 拯救公主").unwrap(), &mut rng).unwrap();
    s.travel("dungeon", &mut rng).unwrap();

    let mut attempts = 0;
    loop {
        attempts += 1;
        assert!(attempts < 50, "the mechanism never gave way");
        let report = s.perform_scene_action("破解机关", &mut rng).unwrap();
        if report.succeeded {
            assert_eq!(report.completable, vec!["拯救公主".to_string()]);
            break;
        }
        assert!(report.completable.is_empty());
    }
    let done = dispatch(&mut s, Action::CompleteQuest("拯救公主".into()), &mut rng).unwrap();
    assert!(matches!(done, ActionOutcome::Continue(_)));
    assert!(s.character.inventory.contains("公主的祝福"));
    assert_eq!(s.progress.quest("拯救公主").unwrap().status, QuestStatus::Completed);
}

#[test]
fn session_fights_feed_the_hunt() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut s = GameSession::new_game(
        "Aria",
        None,
        Difficulty::Normal,
        ContentCatalog::standard(),
        &mut rng,
    )
    .unwrap();
    s.accept_quest("猎狼任务").unwrap();
    s.character.attack = 1_000;
    s.character.max_hp = 10_000;
    s.character.hp = 10_000;

    let mut ready = Vec::new();
    for _ in 0..5 {
        let report = s.fight("野狼", &mut rng).unwrap();
        assert_eq!(report.outcome.result, CombatResult::Victory);
        ready.extend(report.completable);
    }
    assert_eq!(ready, vec!["猎狼任务".to_string()]);

    let gold = s.character.gold;
    let done = s.complete_quest("猎狼任务", &mut rng).unwrap();
    assert_eq!(s.character.gold, gold + done.reward.gold);
    assert_eq!(s.progress.counters().enemies_defeated, 5);
}
