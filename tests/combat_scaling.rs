/// Integration tests for encounter scaling and combat resolution.
use rand::rngs::StdRng;
use rand::SeedableRng;
use retrorpg::game::achievement::AchievementSet;
use retrorpg::game::catalog::ContentCatalog;
use retrorpg::game::character::Character;
use retrorpg::game::combat::{scale_enemy, CombatAction, CombatEvent, CombatResult, CombatSession};
use retrorpg::game::difficulty::Difficulty;
use retrorpg::game::magic::MagicAffinity;
use retrorpg::game::GameContext;

fn template(name: &str) -> retrorpg::game::catalog::EnemyTemplate {
    ContentCatalog::standard().enemy_template(name).cloned().unwrap()
}

#[test]
fn monster_multipliers_apply_per_difficulty() {
    let wolf = template("野狼");
    let stats = |d: Difficulty| {
        let e = scale_enemy(&wolf, 1, 0, 0, &d.profile());
        (e.hp, e.attack, e.defense)
    };
    // Easy multipliers are below one, so the template floor holds
    assert_eq!(stats(Difficulty::Easy), (30, 8, 3));
    assert_eq!(stats(Difficulty::Normal), (30, 8, 3));
    // 45, 10.4 -> 10, 4.2 -> 4
    assert_eq!(stats(Difficulty::Hard), (45, 10, 4));
    // 90, 16, 7.5 -> 7
    assert_eq!(stats(Difficulty::Ultimate), (90, 16, 7));
}

#[test]
fn level_and_player_stats_raise_the_enemy() {
    let wolf = template("野狼");
    let normal = Difficulty::Normal.profile();
    // 30 * 1.5 = 45 at level 6
    assert_eq!(scale_enemy(&wolf, 6, 0, 0, &normal).hp, 45);
    // 8 * (1 + 4 * 0.15) = 12.8 -> 12
    assert_eq!(scale_enemy(&wolf, 1, 0, 4, &normal).attack, 12);
    // 3 * (1 + 12 * 0.2) = 10.2, capped at 9
    assert_eq!(scale_enemy(&wolf, 1, 12, 0, &normal).defense, 9);
    // hp cap is five times the template
    assert_eq!(scale_enemy(&wolf, 100, 0, 0, &normal).hp, 150);
}

#[test]
fn scaled_enemy_starts_at_full_hp() {
    let bear = template("巨熊");
    for difficulty in Difficulty::ALL {
        let e = scale_enemy(&bear, 7, 20, 9, &difficulty.profile());
        assert_eq!(e.hp, e.max_hp);
        assert!(e.hp >= bear.hp && e.hp <= bear.hp * 5);
        assert!(e.attack >= bear.attack && e.attack <= bear.attack * 3);
        assert!(e.defense >= bear.defense && e.defense <= bear.defense * 3);
    }
}

#[test]
fn victory_pays_scaled_rewards() {
    let catalog = ContentCatalog::standard();
    let mut achievements = AchievementSet::default();
    let mut c = Character::blank("Aria");
    c.attack = 1_000;
    let mut rng = StdRng::seed_from_u64(21);
    let outcome = {
        let ctx = GameContext::new(&catalog, Difficulty::Easy, &mut achievements);
        let mut combat = CombatSession::start(ctx, &mut c, "野狼").unwrap();
        let report = combat.step(CombatAction::Attack, &mut rng).unwrap();
        assert_eq!(report.resolved, Some(CombatResult::Victory));
        assert!(report.events.contains(&CombatEvent::EnemyDefeated));
        combat.outcome().unwrap()
    };
    let rewards = outcome.rewards.unwrap();
    // 20 * 1.2 and 15 * 1.3 = 19.5 -> 19
    assert_eq!((rewards.exp, rewards.gold), (24, 19));
    assert_eq!(c.gold, 19);
    assert_eq!(c.experience, 24);
    for drop in &rewards.drops {
        assert!(c.inventory.contains(drop));
    }
}

#[test]
fn defeat_leaves_one_hp_and_costs_gold() {
    let catalog = ContentCatalog::standard();
    let mut achievements = AchievementSet::default();
    let mut c = Character::blank("Aria");
    c.hp = 1;
    c.attack = 0;
    c.defense = 0;
    c.gold = 30;
    let mut rng = StdRng::seed_from_u64(22);
    let outcome = {
        let ctx = GameContext::new(&catalog, Difficulty::Normal, &mut achievements);
        let mut combat = CombatSession::start(ctx, &mut c, "野狼").unwrap();
        let report = combat.step(CombatAction::Attack, &mut rng).unwrap();
        assert_eq!(report.resolved, Some(CombatResult::Defeat));
        combat.outcome().unwrap()
    };
    assert_eq!(outcome.gold_lost, 30);
    assert!(outcome.rewards.is_none());
    assert_eq!(c.hp, 1);
    assert_eq!(c.gold, 0);
}

#[test]
fn fleeing_ends_without_rewards() {
    let catalog = ContentCatalog::standard();
    let mut saw_flight = false;
    for seed in 0..20 {
        let mut achievements = AchievementSet::default();
        let mut c = Character::blank("Aria");
        c.max_hp = 10_000;
        c.hp = 10_000;
        let gold = c.gold;
        let mut rng = StdRng::seed_from_u64(seed);
        let ctx = GameContext::new(&catalog, Difficulty::Normal, &mut achievements);
        let mut combat = CombatSession::start(ctx, &mut c, "巨熊").unwrap();
        let report = combat.step(CombatAction::Flee, &mut rng).unwrap();
        if report.resolved == Some(CombatResult::Fled) {
            saw_flight = true;
            let outcome = combat.outcome().unwrap();
            assert!(outcome.rewards.is_none());
            assert_eq!(outcome.gold_lost, 0);
            assert_eq!(combat.character().gold, gold);
        } else {
            assert!(report.events.contains(&CombatEvent::FleeFailed));
            assert!(!combat.is_resolved());
        }
    }
    assert!(saw_flight);
}

#[test]
fn dark_magic_hits_light_enemies_harder() {
    let catalog = ContentCatalog::standard();
    let mut achievements = AchievementSet::default();
    let mut c = Character::blank("Aria");
    c.magic_affinity = Some(MagicAffinity::Dark);
    c.magic_power = 5;
    let mut rng = StdRng::seed_from_u64(23);
    let ctx = GameContext::new(&catalog, Difficulty::Normal, &mut achievements);
    let mut combat = CombatSession::start(ctx, &mut c, "森林精灵").unwrap();
    let report = combat.step(CombatAction::Magic, &mut rng).unwrap();
    // (11 + 5) * 1.5
    assert!(report.events.contains(&CombatEvent::MagicHit {
        affinity: MagicAffinity::Dark,
        damage: 24
    }));
    assert!(report
        .events
        .iter()
        .any(|e| matches!(e, CombatEvent::MagicExperience { amount, .. } if (5..=15).contains(amount))));
}

#[test]
fn potion_in_combat_is_counted() {
    let catalog = ContentCatalog::standard();
    let mut achievements = AchievementSet::default();
    let mut c = Character::blank("Aria");
    c.inventory.add("新手药水", 1);
    c.hp = 5;
    let mut rng = StdRng::seed_from_u64(24);
    let ctx = GameContext::new(&catalog, Difficulty::Normal, &mut achievements);
    let mut combat = CombatSession::start(ctx, &mut c, "蝙蝠").unwrap();
    combat
        .step(CombatAction::UseItem("新手药水".into()), &mut rng)
        .unwrap();
    combat.auto_resolve(&mut rng).unwrap();
    assert_eq!(combat.outcome().unwrap().consumables_used, 1);
}
