use wave_survivor::progression::*;

use approx::assert_relative_eq;

fn make_progression() -> Progression {
    Progression::default()
}

// ── Stats ─────────────────────────────────────────────────────────────────────

#[test]
fn fresh_progression_uses_starting_stats() {
    let p = make_progression();
    assert_eq!(p.stats, StatBlock::starting());
    assert_eq!(p.level, 1);
    assert_eq!(p.exp_to_next, 100);
}

#[test]
fn upgrades_and_bonus_stack_on_base() {
    let mut upgrades = Upgrades::default();
    upgrades.levels[StatKey::Attack as usize] = 2;
    let mut p = Progression::new(StatBlock::starting(), upgrades);
    p.apply_bonus_stat(StatKey::Attack, 3.0);
    // 10 + 2x5 + 3
    assert_relative_eq!(p.stats.attack, 23.0);
}

#[test]
fn recalculate_floors_derived_stats() {
    let mut p = make_progression();
    p.apply_bonus_stat(StatKey::MaxHp, -500.0);
    p.apply_bonus_stat(StatKey::AttackSpeed, -5.0);
    p.apply_bonus_stat(StatKey::CritDamage, -5.0);
    p.apply_bonus_stat(StatKey::Attack, -50.0);

    assert_relative_eq!(p.stats.max_hp, 1.0);
    assert_relative_eq!(p.stats.attack_speed, 0.1);
    assert_relative_eq!(p.stats.crit_damage, 1.0);
    assert_relative_eq!(p.stats.attack, 0.0);
}

#[test]
fn recalculate_can_preserve_the_hp_ratio() {
    let mut p = make_progression();
    p.stats.hp = 50.0;
    p.apply_bonus_stat(StatKey::MaxHp, 100.0);
    assert_relative_eq!(p.stats.max_hp, 200.0);
    assert_relative_eq!(p.stats.hp, 100.0);

    p.recalculate(false);
    assert_relative_eq!(p.stats.hp, 200.0);
}

#[test]
fn regeneration_caps_at_max_hp() {
    let mut stats = StatBlock::starting();
    stats.hp = 99.5;
    stats.regenerate(1.0);
    assert_relative_eq!(stats.hp, 100.0);

    stats.hp = 10.0;
    stats.heal_ratio(0.3);
    assert_relative_eq!(stats.hp, 40.0);
}

// ── Economy ───────────────────────────────────────────────────────────────────

#[test]
fn exp_carries_over_multiple_levels() {
    let mut p = make_progression();
    assert!(!p.add_exp(99));
    assert!(p.add_exp(151));
    // 250 = 100 + 120 + 30
    assert_eq!(p.level, 3);
    assert_eq!(p.exp, 30);
    assert_eq!(p.exp_to_next, 144);
    assert_eq!(p.skill_points, 2);
}

#[test]
fn mastery_scales_exp() {
    let mut p = make_progression();
    p.apply_bonus_stat(StatKey::Mastery, 0.5);
    p.add_exp(10);
    assert_eq!(p.exp, 15);
}

#[test]
fn luck_scales_gold() {
    let mut p = make_progression();
    p.add_gold(10);
    assert_eq!(p.gold, 10);
    p.apply_bonus_stat(StatKey::Luck, 0.5);
    p.add_gold(10);
    assert_eq!(p.gold, 25);
}

#[test]
fn every_thirtieth_kill_pays_entropy() {
    let mut p = make_progression();
    for _ in 0..29 {
        p.on_enemy_killed();
    }
    assert_eq!(p.entropy, 0);
    p.on_enemy_killed();
    assert_eq!(p.entropy, 1);
    assert_eq!(p.entropy_earned_this_run, 1);

    for _ in 0..30 {
        p.on_enemy_killed();
    }
    assert_eq!(p.kills, 60);
    assert_eq!(p.entropy, 2);
}

#[test]
fn zero_kill_rate_never_pays() {
    let mut p = make_progression();
    p.kills_per_entropy = 0;
    for _ in 0..100 {
        p.on_enemy_killed();
    }
    assert_eq!(p.entropy, 0);
}

// ── Upgrades ──────────────────────────────────────────────────────────────────

#[test]
fn buying_a_stat_upgrade_spends_entropy() {
    let mut p = make_progression();
    p.entropy = 3;
    assert!(p.buy_upgrade(UpgradeKey::Stat(StatKey::MaxHp)));
    assert_eq!(p.entropy, 1);
    assert_eq!(p.upgrades.level(StatKey::MaxHp), 1);
    assert_relative_eq!(p.stats.max_hp, 120.0);

    assert!(!p.buy_upgrade(UpgradeKey::Stat(StatKey::MaxHp)));
    assert_eq!(p.entropy, 1);
}

#[test]
fn revive_and_dash_upgrades_are_capped() {
    let mut p = make_progression();
    p.entropy = 100;
    for _ in 0..MAX_REVIVES {
        assert!(p.buy_upgrade(UpgradeKey::ReviveCount));
    }
    assert!(!p.buy_upgrade(UpgradeKey::ReviveCount));
    assert_eq!(p.upgrades.revive_count, MAX_REVIVES);

    assert!(p.buy_upgrade(UpgradeKey::DashCharges));
    assert!(!p.buy_upgrade(UpgradeKey::DashCharges));
    assert_eq!(p.upgrades.dash_charges, MAX_EXTRA_DASHES);
    // three successful purchases at 10 each
    assert_eq!(p.entropy, 70);
}

#[test]
fn start_run_keeps_permanent_state() {
    let mut p = make_progression();
    p.entropy = 5;
    assert!(p.buy_upgrade(UpgradeKey::Stat(StatKey::Attack)));
    p.apply_bonus_stat(StatKey::Attack, 10.0);
    p.add_exp(500);
    p.add_gold(40);
    p.on_enemy_killed();
    p.grant_entropy(4);

    p.start_run();
    assert_eq!(p.level, 1);
    assert_eq!(p.exp, 0);
    assert_eq!(p.gold, 0);
    assert_eq!(p.kills, 0);
    assert_eq!(p.entropy_earned_this_run, 0);
    assert_eq!(p.bonus, StatBlock::default());
    // the bought level survives, the run bonus does not
    assert_relative_eq!(p.stats.attack, 15.0);
    assert_eq!(p.entropy, 7);
    assert_relative_eq!(p.stats.hp, p.stats.max_hp);
}
