use wave_survivor::collision::SpatialGrid;
use wave_survivor::config::SimConfig;
use wave_survivor::enemy::*;

use approx::assert_relative_eq;
use glam::Vec2;

const PLAYER: Vec2 = Vec2::new(1400.0, 1700.0);

fn make_pool() -> EnemyPool {
    EnemyPool::new(&SimConfig::default())
}

fn make_grid() -> SpatialGrid {
    SpatialGrid::new(2800.0, 200.0)
}

// ── Spawning ──────────────────────────────────────────────────────────────────

#[test]
fn spawn_applies_wave_scaling() {
    let mut pool = make_pool();
    let h = pool.spawn("malakh", Vec2::ZERO, 3).unwrap();
    let e = pool.get(h).unwrap();
    assert_relative_eq!(e.hp, 60.0);
    assert_relative_eq!(e.max_hp, 60.0);
    assert_relative_eq!(e.damage, 6.0);
    assert_eq!(e.wave, 3);
    // rewards are not scaled
    assert_eq!(e.gold, 2);
    assert_eq!(e.exp, 5);
}

#[test]
fn wave_scaling_is_monotonic() {
    let pool = make_pool();
    assert_relative_eq!(pool.wave_multiplier(1), 1.0);
    let mut last = 0.0;
    for wave in 1..=20 {
        let m = pool.wave_multiplier(wave);
        assert!(m > last, "wave {wave} multiplier {m} not above {last}");
        last = m;
    }
}

#[test]
fn unknown_kind_is_rejected() {
    let mut pool = make_pool();
    assert!(pool.spawn("seraph-of-nowhere", Vec2::ZERO, 1).is_none());
    assert_eq!(pool.active_count(), 0);
}

#[test]
fn reused_slot_starts_fresh() {
    let mut pool = make_pool();
    let first = pool.spawn("malakh", Vec2::new(10.0, 10.0), 1).unwrap();
    {
        let e = pool.get_mut(first).unwrap();
        e.take_hit(20.0, 0.25, (14.0, 0.25));
        e.contact_cooldown = 1.0;
    }
    assert!(pool.despawn(first));
    assert!(!pool.despawn(first), "second despawn must be a no-op");

    let second = pool.spawn("malakh", Vec2::new(20.0, 20.0), 1).unwrap();
    assert_eq!(first.index(), second.index());
    assert!(pool.get(first).is_none());

    let e = pool.get(second).unwrap();
    assert_relative_eq!(e.hp, 50.0);
    assert_relative_eq!(e.tint_timer, 0.0);
    assert_relative_eq!(e.contact_cooldown, 0.0);
    assert_eq!(e.pos, Vec2::new(20.0, 20.0));
}

#[test]
fn despawn_all_empties_the_pool() {
    let mut pool = make_pool();
    for _ in 0..5 {
        pool.spawn("dominion", Vec2::ZERO, 1);
    }
    pool.despawn_all();
    assert_eq!(pool.active_count(), 0);
    assert_eq!(pool.iter().count(), 0);
}

// ── Hits ──────────────────────────────────────────────────────────────────────

#[test]
fn take_hit_reports_the_kill_once() {
    let mut pool = make_pool();
    let h = pool.spawn("malakh", Vec2::ZERO, 1).unwrap();
    let e = pool.get_mut(h).unwrap();

    assert!(!e.take_hit(30.0, 0.25, (14.0, 0.25)));
    assert!(e.is_tinted());
    assert!(e.take_hit(30.0, 0.25, (14.0, 0.25)));
    assert!(!e.take_hit(30.0, 0.25, (14.0, 0.25)));
}

// ── Behaviour ─────────────────────────────────────────────────────────────────

#[test]
fn approaches_the_player() {
    let mut pool = make_pool();
    let mut grid = make_grid();
    let h = pool.spawn("malakh", PLAYER - Vec2::new(500.0, 0.0), 1).unwrap();

    pool.update(0.1, PLAYER, 0.0, &mut grid);
    let e = pool.get(h).unwrap();
    assert_relative_eq!(e.pos.x, 915.0, epsilon = 1e-3);
    assert_eq!(e.mode, EnemyMode::Approaching);
    assert_eq!(grid.occupancy(), (1, 0));
}

#[test]
fn stops_inside_attack_range() {
    let mut pool = make_pool();
    let mut grid = make_grid();
    let start = PLAYER - Vec2::new(30.0, 0.0);
    let h = pool.spawn("malakh", start, 1).unwrap();

    pool.update(0.1, PLAYER, 0.0, &mut grid);
    let e = pool.get(h).unwrap();
    assert_eq!(e.pos, start);
    assert_eq!(e.mode, EnemyMode::Attacking);
}

#[test]
fn charger_winds_up_then_rushes() {
    let mut pool = make_pool();
    let mut grid = make_grid();
    let h = pool.spawn("power", PLAYER - Vec2::new(2000.0, 0.0), 1).unwrap();

    // charge cooldown 3.0 with a 0.5 wind-up
    pool.update(1.0, PLAYER, 0.0, &mut grid);
    pool.update(1.0, PLAYER, 0.0, &mut grid);
    assert!(!pool.get(h).unwrap().is_winding_up());
    pool.update(0.6, PLAYER, 0.0, &mut grid);
    assert!(pool.get(h).unwrap().is_winding_up());

    pool.update(0.5, PLAYER, 0.0, &mut grid);
    let e = pool.get(h).unwrap();
    assert!(e.is_charging());
    let before = e.pos;

    pool.update(0.1, PLAYER, 0.0, &mut grid);
    let after = pool.get(h).unwrap().pos;
    assert_relative_eq!(after.x - before.x, 100.0, epsilon = 1e-2);
}

#[test]
fn nearest_within_respects_range() {
    let mut pool = make_pool();
    pool.spawn("malakh", PLAYER + Vec2::new(300.0, 0.0), 1);
    let near = pool.spawn("malakh", PLAYER + Vec2::new(0.0, 150.0), 1).unwrap();

    let (h, pos, dist_sq) = pool.nearest_within(PLAYER, 400.0).unwrap();
    assert_eq!(h, near);
    assert_eq!(pos, PLAYER + Vec2::new(0.0, 150.0));
    assert_relative_eq!(dist_sq, 22_500.0);

    assert!(pool.nearest_within(PLAYER, 100.0).is_none());
}
