use wave_survivor::arena::PlayArea;
use wave_survivor::boss::Boss;
use wave_survivor::collision::*;
use wave_survivor::config::SimConfig;
use wave_survivor::enemy::EnemyPool;
use wave_survivor::entities::Owner;
use wave_survivor::player::Player;
use wave_survivor::projectile::ProjectilePool;

use approx::assert_relative_eq;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

const CENTER: Vec2 = Vec2::new(1400.0, 1700.0);

fn make_config() -> SimConfig {
    SimConfig::default()
}

fn make_system(config: &SimConfig) -> CollisionSystem {
    CollisionSystem::new(config.arena.world_size, &config.grid)
}

fn make_player(config: &SimConfig) -> Player {
    Player::new(config, CENTER, 0, 0)
}

fn make_boss(config: &SimConfig, pos: Vec2) -> Boss {
    let template = config.boss("michael").expect("shipped boss");
    Boss::from_template(template, pos, &config.boss_tuning)
}

// ── Hitboxes ──────────────────────────────────────────────────────────────────

#[test]
fn hitbox_scales_and_centres() {
    let config = make_config();
    let mut pool = EnemyPool::new(&config);
    let h = pool.spawn("malakh", Vec2::new(500.0, 500.0), 1).unwrap();
    let b = hitbox(pool.get(h).unwrap(), HitboxKind::Enemy);

    assert_relative_eq!(b.size.x, 85.0);
    assert_relative_eq!(b.pos.x, 457.5);
    assert_relative_eq!(b.center().y, 500.0);
}

#[test]
fn hitbox_is_deterministic() {
    let config = make_config();
    let player = make_player(&config);
    let a = hitbox(&player, HitboxKind::Player);
    let b = hitbox(&player, HitboxKind::Player);
    assert_eq!(a, b);
}

#[test]
fn boss_hitbox_follows_bob() {
    let config = make_config();
    let mut boss = make_boss(&config, CENTER);
    let still = hitbox(&boss, HitboxKind::Boss);
    boss.bob_offset = 10.0;
    let bobbed = hitbox(&boss, HitboxKind::Boss);

    assert_relative_eq!(bobbed.pos.y - still.pos.y, 10.0);
    assert_relative_eq!(bobbed.pos.x, still.pos.x);
    // other roles ignore the bob
    assert_eq!(hitbox(&boss, HitboxKind::Enemy).center(), CENTER);
}

#[test]
fn touching_boxes_do_not_overlap() {
    let a = Aabb {
        pos: Vec2::ZERO,
        size: Vec2::splat(10.0),
    };
    let touching = Aabb {
        pos: Vec2::new(10.0, 0.0),
        size: Vec2::splat(10.0),
    };
    let inside = Aabb {
        pos: Vec2::new(9.9, 9.9),
        size: Vec2::splat(10.0),
    };
    assert!(!check_aabb(&a, &touching));
    assert!(check_aabb(&a, &inside));
}

#[test]
fn distance_check_is_inclusive() {
    assert!(check_distance(Vec2::ZERO, Vec2::new(3.0, 4.0), 5.0));
    assert!(!check_distance(Vec2::ZERO, Vec2::new(3.0, 4.0), 4.99));
}

// ── Grid ──────────────────────────────────────────────────────────────────────

#[test]
fn grid_coordinates_are_clamped() {
    let grid = SpatialGrid::new(2800.0, 200.0);
    assert_eq!(grid.dimensions(), (14, 14));
    assert_eq!(grid.world_to_grid(Vec2::new(-50.0, -1.0)), (0, 0));
    assert_eq!(grid.world_to_grid(Vec2::new(9000.0, 2800.0)), (13, 13));
    assert_eq!(grid.world_to_grid(Vec2::new(450.0, 1999.0)), (2, 9));
}

#[test]
fn register_skips_duplicates() {
    let config = make_config();
    let mut pool = EnemyPool::new(&config);
    let h = pool.spawn("malakh", CENTER, 1).unwrap();

    let mut grid = SpatialGrid::new(2800.0, 200.0);
    grid.register(GridObject::Enemy(h), CENTER);
    grid.register(GridObject::Enemy(h), CENTER + Vec2::splat(1.0));
    assert_eq!(grid.occupancy(), (1, 0));

    grid.clear();
    assert_eq!(grid.occupancy(), (0, 0));
}

#[test]
fn uninitialised_grid_ignores_registration() {
    let config = make_config();
    let mut pool = EnemyPool::new(&config);
    let h = pool.spawn("malakh", CENTER, 1).unwrap();

    let mut grid = SpatialGrid::default();
    grid.register(GridObject::Enemy(h), CENTER);
    assert!(!grid.is_initialized());
    assert_eq!(grid.occupancy(), (0, 0));
    assert_eq!(grid.neighborhood(CENTER).count(), 0);
}

#[test]
fn neighborhood_is_clipped_at_the_corner() {
    let grid = SpatialGrid::new(2800.0, 200.0);
    assert_eq!(grid.neighborhood(Vec2::new(10.0, 10.0)).count(), 4);
    assert_eq!(grid.neighborhood(CENTER).count(), 9);
}

// ── Queries ───────────────────────────────────────────────────────────────────

#[test]
fn player_enemy_collision_finds_overlap() {
    let config = make_config();
    let mut system = make_system(&config);
    let player = make_player(&config);
    let mut pool = EnemyPool::new(&config);

    let near = pool.spawn("malakh", CENTER + Vec2::new(50.0, 0.0), 1).unwrap();
    let far = pool.spawn("malakh", CENTER + Vec2::new(200.0, 0.0), 1).unwrap();
    for h in [near, far] {
        let pos = pool.get(h).unwrap().pos;
        system.grid.register(GridObject::Enemy(h), pos);
    }

    assert_eq!(
        system.check_player_enemy_collision(&player, pool.pool()),
        Some(near)
    );
}

#[test]
fn player_enemy_collision_needs_registration() {
    let config = make_config();
    let system = make_system(&config);
    let player = make_player(&config);
    let mut pool = EnemyPool::new(&config);
    pool.spawn("malakh", CENTER, 1).unwrap();

    assert_eq!(system.check_player_enemy_collision(&player, pool.pool()), None);
}

#[test]
fn stale_handles_in_grid_are_ignored() {
    let config = make_config();
    let mut system = make_system(&config);
    let player = make_player(&config);
    let mut pool = EnemyPool::new(&config);

    let h = pool.spawn("malakh", CENTER, 1).unwrap();
    system.grid.register(GridObject::Enemy(h), CENTER);
    pool.despawn(h);

    assert_eq!(system.check_player_enemy_collision(&player, pool.pool()), None);
}

#[test]
fn player_boss_collision_skips_dead_bosses() {
    let config = make_config();
    let system = make_system(&config);
    let player = make_player(&config);
    let mut bosses = vec![make_boss(&config, CENTER)];

    assert_eq!(system.check_player_boss_collision(&player, &bosses), Some(0));
    bosses[0].dead = true;
    assert_eq!(system.check_player_boss_collision(&player, &bosses), None);
}

#[test]
fn projectile_collision_pairs_hits() {
    let config = make_config();
    let mut system = make_system(&config);
    let mut enemies = EnemyPool::new(&config);
    let mut projectiles = ProjectilePool::new(8, &config.combat);

    let target = enemies.spawn("dominion", CENTER, 1).unwrap();
    system.grid.register(GridObject::Enemy(target), CENTER);

    let hit = projectiles.spawn(CENTER + Vec2::new(20.0, 0.0), 0.0, 500.0, 10.0, Owner::Player);
    let _miss = projectiles.spawn(CENTER + Vec2::new(400.0, 0.0), 0.0, 500.0, 10.0, Owner::Player);

    let pairs = system.check_projectile_collision(projectiles.iter(), enemies.pool());
    assert_eq!(pairs, vec![(hit, target)]);
}

// ── Play area ─────────────────────────────────────────────────────────────────

fn make_arena() -> PlayArea {
    PlayArea::new(&make_config().arena)
}

#[test]
fn clamp_keeps_inside_points() {
    let arena = make_arena();
    let pos = CENTER + Vec2::new(100.0, -200.0);
    assert_eq!(arena.clamp(pos, 28.8, 28.8), pos);
}

#[test]
fn clamp_pulls_back_along_the_radius() {
    let arena = make_arena();
    let clamped = arena.clamp(CENTER + Vec2::new(1500.0, 0.0), 60.0, 80.0);
    // object radius is 50
    assert_relative_eq!(clamped.x, CENTER.x + 950.0, epsilon = 1e-3);
    assert_relative_eq!(clamped.y, CENTER.y, epsilon = 1e-3);
}

#[test]
fn clamp_is_idempotent() {
    let arena = make_arena();
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..50 {
        let p = arena.random_point(&mut rng) * 1.7 - CENTER * 0.5;
        let once = arena.clamp(p, 85.0, 85.0);
        let twice = arena.clamp(once, 85.0, 85.0);
        assert_eq!(once, twice);
    }
}

#[test]
fn random_points_stay_in_the_circle() {
    let arena = make_arena();
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..100 {
        assert!(arena.contains(arena.random_point(&mut rng)));
    }
}
