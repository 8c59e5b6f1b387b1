/// Integration tests for character creation, levelling and magic growth.
use rand::rngs::StdRng;
use rand::SeedableRng;
use retrorpg::game::achievement::{self, AchievementSet};
use retrorpg::game::catalog::ContentCatalog;
use retrorpg::game::character::{Character, ItemUse};
use retrorpg::game::difficulty::Difficulty;
use retrorpg::game::errors::GameError;
use retrorpg::game::magic::MagicAffinity;

#[test]
fn rolled_stats_follow_difficulty_multipliers() {
    for difficulty in Difficulty::ALL {
        let p = difficulty.profile();
        for seed in 0..40 {
            let mut rng = StdRng::seed_from_u64(seed);
            let c = Character::roll_new("Aria", None, &p, &mut rng);
            let within = |v: i64, lo: i64, hi: i64, m: f64| {
                v >= (lo as f64 * m) as i64 && v <= (hi as f64 * m) as i64
            };
            assert!(within(c.max_hp, 30, 50, p.player_hp_mult), "{} hp {}", difficulty, c.max_hp);
            assert!(within(c.attack, 5, 12, p.player_attack_mult));
            assert!(within(c.defense, 2, 8, p.player_defense_mult));
            assert_eq!(c.hp, c.max_hp);
            assert_eq!(c.level, 1);
            assert_eq!(c.gold, 50);
            assert_eq!(c.magic_power, 0);
            assert_eq!(c.inventory.count("新手剑"), 1);
            assert_eq!(c.inventory.count("新手药水"), 2);
        }
    }
}

#[test]
fn same_seed_same_character() {
    let p = Difficulty::Hard.profile();
    let a = Character::roll_new("Aria", Some(MagicAffinity::Dark), &p, &mut StdRng::seed_from_u64(99));
    let b = Character::roll_new("Aria", Some(MagicAffinity::Dark), &p, &mut StdRng::seed_from_u64(99));
    assert_eq!(a, b);
    assert_eq!(a.magic_power, 5);
}

#[test]
fn experience_carries_over_between_levels() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut sink = AchievementSet::default();
    let mut c = Character::blank("Aria");
    c.hp = 3;
    let ups = c.gain_experience(250, &mut rng, &mut sink);
    // 100 pays for level 2; the remaining 150 is short of the 200 for level 3
    assert_eq!(ups.len(), 1);
    assert_eq!(c.level, 2);
    assert_eq!(c.experience, 150);
    assert_eq!(c.hp, c.max_hp);
    assert!((5..=15).contains(&ups[0].hp));
}

#[test]
fn several_levels_in_one_gain() {
    let mut rng = StdRng::seed_from_u64(2);
    let mut sink = AchievementSet::default();
    let mut c = Character::blank("Aria");
    // 100 + 200 + 300 = 600 reaches level 4 exactly
    let ups = c.gain_experience(600, &mut rng, &mut sink);
    assert_eq!(ups.iter().map(|u| u.new_level).collect::<Vec<_>>(), vec![2, 3, 4]);
    assert_eq!(c.experience, 0);
}

#[test]
fn level_twenty_unlocks_level_expert() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut sink = AchievementSet::default();
    let mut c = Character::blank("Aria");
    c.level = 19;
    c.gain_experience(19 * 100, &mut rng, &mut sink);
    assert_eq!(c.level, 20);
    assert!(sink.contains(achievement::LEVEL_EXPERT));
}

#[test]
fn gold_threshold_unlocks_wealthy() {
    let mut sink = AchievementSet::default();
    let mut c = Character::blank("Aria");
    c.add_gold(999, &mut sink);
    assert!(!sink.contains(achievement::WEALTHY));
    c.add_gold(1, &mut sink);
    assert!(sink.contains(achievement::WEALTHY));
    assert_eq!(sink.take_notifications(), vec![achievement::WEALTHY.to_string()]);
}

#[test]
fn magic_levels_subtract_a_flat_two_hundred() {
    let mut c = Character::blank("Aria");
    c.magic_affinity = Some(MagicAffinity::Fire);
    c.magic_power = 5;
    assert_eq!(c.gain_magic_experience(450), 1);
    assert_eq!(c.magic_level, 2);
    assert_eq!(c.magic_experience, 250);
    assert_eq!(c.magic_power, 10);

    let mut none = Character::blank("Bo");
    assert_eq!(none.gain_magic_experience(1000), 0);
    assert_eq!(none.magic_experience, 0);
}

#[test]
fn magic_damage_formula() {
    let mut c = Character::blank("Aria");
    assert_eq!(c.calculate_magic_damage(None), None);

    c.magic_affinity = Some(MagicAffinity::Fire);
    c.magic_power = 5;
    assert_eq!(c.calculate_magic_damage(None), Some(15));
    c.magic_level = 3;
    assert_eq!(c.calculate_magic_damage(None), Some(18));

    c.magic_affinity = Some(MagicAffinity::Light);
    c.magic_level = 1;
    assert_eq!(c.calculate_magic_damage(Some(MagicAffinity::Dark)), Some(21));
    assert_eq!(c.calculate_magic_damage(Some(MagicAffinity::Light)), Some(14));
}

#[test]
fn potions_heal_up_to_max_and_failures_change_nothing() {
    let catalog = ContentCatalog::standard();
    let mut rng = StdRng::seed_from_u64(4);
    let mut sink = AchievementSet::default();
    let mut c = Character::roll_new("Aria", None, &Difficulty::Normal.profile(), &mut rng);

    c.hp = c.max_hp - 1;
    assert_eq!(c.use_item("新手药水", &catalog, &mut rng, &mut sink).unwrap(), ItemUse::Healed(1));
    assert_eq!(c.inventory.count("新手药水"), 1);

    let before = c.clone();
    assert!(matches!(
        c.use_item("新手剑", &catalog, &mut rng, &mut sink),
        Err(GameError::Input(_))
    ));
    assert!(matches!(
        c.use_item("治疗药水", &catalog, &mut rng, &mut sink),
        Err(GameError::InsufficientResource(_))
    ));
    assert_eq!(c, before);
}

#[test]
fn normalize_repairs_restored_values() {
    let mut c = Character::blank("Aria");
    c.level = 0;
    c.magic_level = 0;
    c.hp = 500;
    c.normalize();
    assert_eq!(c.level, 1);
    assert_eq!(c.magic_level, 1);
    assert_eq!(c.hp, c.max_hp);
}
