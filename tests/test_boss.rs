use wave_survivor::arena::PlayArea;
use wave_survivor::boss::*;
use wave_survivor::collision::SpatialGrid;
use wave_survivor::config::{BossSkillKind, SimConfig};
use wave_survivor::entities::Owner;
use wave_survivor::events::SimEvent;
use wave_survivor::player::Player;
use wave_survivor::progression::StatBlock;
use wave_survivor::projectile::ProjectilePool;

use approx::assert_relative_eq;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

const CENTER: Vec2 = Vec2::new(1400.0, 1700.0);

struct World {
    config: SimConfig,
    bosses: BossSystem,
    player: Player,
    stats: StatBlock,
    projectiles: ProjectilePool,
    arena: PlayArea,
    grid: SpatialGrid,
    events: Vec<SimEvent>,
}

impl World {
    fn tick(&mut self, dt: f32, rng: &mut StdRng) {
        let mut env = BossEnv {
            player: &mut self.player,
            stats: &mut self.stats,
            projectiles: &mut self.projectiles,
            arena: &self.arena,
            grid: &mut self.grid,
            events: &mut self.events,
        };
        self.bosses.update(dt, &mut env, rng);
    }

    fn boss(&self) -> &Boss {
        self.bosses.current().expect("boss spawned")
    }
}

/// A world with Michael at the centre. `skills` replaces the shipped skill
/// list when given; the first skill comes after `first_cooldown` seconds.
fn make_world(skills: Option<Vec<BossSkillKind>>, first_cooldown: f32) -> World {
    let mut config = SimConfig::default();
    if let Some(skills) = skills {
        config.bosses[0].skills = skills;
    }
    config.boss_tuning.skill_cooldown = first_cooldown;

    let mut bosses = BossSystem::new(&config);
    bosses.spawn("michael", CENTER).expect("shipped boss");
    World {
        bosses,
        player: Player::new(&config, CENTER + Vec2::new(600.0, 0.0), 0, 0),
        stats: StatBlock::starting(),
        projectiles: ProjectilePool::new(64, &config.combat),
        arena: PlayArea::new(&config.arena),
        grid: SpatialGrid::new(config.arena.world_size, config.grid.cell_size),
        events: Vec::new(),
        config,
    }
}

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

// ── Roster ────────────────────────────────────────────────────────────────────

#[test]
fn unknown_boss_is_rejected() {
    let config = SimConfig::default();
    let mut bosses = BossSystem::new(&config);
    assert!(bosses.spawn("lucifer", CENTER).is_none());
    assert!(bosses.current().is_none());
    assert!(bosses.attackable_target().is_none());
}

#[test]
fn spawned_boss_is_current_and_attackable() {
    let w = make_world(None, 5.0);
    assert_eq!(w.bosses.current_id(), Some(0));
    assert_eq!(w.bosses.attackable_target(), Some(CENTER));
    assert_relative_eq!(w.boss().hp, 140_000.0);
}

#[test]
fn walks_toward_player_while_idle() {
    let mut w = make_world(None, 5.0);
    let mut rng = seeded_rng();
    w.tick(1.0, &mut rng);
    // speed 50
    assert_relative_eq!(w.boss().pos.x, CENTER.x + 50.0, epsilon = 1e-3);
    assert_eq!(w.boss().skill, BossSkill::None);
    assert_eq!(w.grid.occupancy(), (1, 0));
}

#[test]
fn take_hit_kills_once_and_freezes_the_boss() {
    let mut w = make_world(None, 0.0);
    let mut rng = seeded_rng();
    let boss = w.bosses.get_mut(0).unwrap();
    boss.hp = 10.0;
    assert!(!boss.take_hit(4.0));
    assert!(boss.take_hit(6.0));
    assert!(!boss.take_hit(6.0));
    assert!(boss.dead);

    let before = w.boss().pos;
    w.tick(0.5, &mut rng);
    assert_eq!(w.boss().pos, before);
    assert_eq!(w.boss().skill, BossSkill::None);
    assert!(w.bosses.attackable_target().is_none());
}

// ── Skill selection ───────────────────────────────────────────────────────────

#[test]
fn skills_never_repeat_back_to_back() {
    let mut w = make_world(None, 0.5);
    let mut rng = seeded_rng();
    let mut used = Vec::new();
    let mut previous = None;

    for _ in 0..3000 {
        w.tick(0.05, &mut rng);
        let kind = w.boss().skill.kind();
        assert!(!(w.boss().is_dashing() && w.boss().is_diving()));
        if previous.is_none() {
            if let Some(k) = kind {
                used.push(k);
            }
        }
        previous = kind;
    }

    assert!(used.len() >= 4, "only {} skills used", used.len());
    for pair in used.windows(2) {
        assert_ne!(pair[0], pair[1]);
    }
}

#[test]
fn finished_skill_restarts_the_cooldown() {
    let mut w = make_world(Some(vec![BossSkillKind::DashChain]), 0.0);
    w.bosses.tuning.skill_cooldown = 5.0;
    let mut rng = seeded_rng();
    w.tick(0.05, &mut rng);
    assert!(w.boss().skill.kind().is_some());

    for _ in 0..200 {
        w.tick(0.05, &mut rng);
        if w.boss().skill == BossSkill::None {
            break;
        }
    }
    assert_eq!(w.boss().skill, BossSkill::None);
    assert_relative_eq!(w.boss().skill_cooldown, 5.0);
}

// ── Dash chain ────────────────────────────────────────────────────────────────

#[test]
fn dash_chain_runs_one_to_three_dashes() {
    let mut w = make_world(Some(vec![BossSkillKind::DashChain]), 0.0);
    w.bosses.tuning.skill_cooldown = 0.1;
    let mut rng = seeded_rng();

    let mut chains = 0;
    let mut planned = 0;
    let mut dashes = 0;
    let mut was_dashing = false;
    for _ in 0..2000 {
        let before = w.boss().skill;
        w.tick(0.05, &mut rng);
        let boss = w.boss();

        if before == BossSkill::None {
            if let BossSkill::DashChain(chain) = boss.skill {
                assert!((1..=3).contains(&chain.remaining), "chain of {}", chain.remaining);
                chains += 1;
                planned += chain.remaining;
            }
        }
        if boss.is_dashing() && !was_dashing {
            dashes += 1;
        }
        was_dashing = boss.is_dashing();
    }

    assert!(chains >= 3);
    // an unfinished chain at the end may still owe dashes
    assert!(dashes <= planned && dashes + 3 >= planned);
}

#[test]
fn dashing_boss_is_not_attackable() {
    let mut w = make_world(Some(vec![BossSkillKind::DashChain]), 0.0);
    let mut rng = seeded_rng();
    w.tick(0.05, &mut rng);
    assert!(w.boss().is_dashing());
    assert!(!w.boss().is_attackable());
    assert!(w.bosses.attackable_target().is_none());

    // dash speed is 15x the walk speed
    let before = w.boss().pos;
    w.tick(0.1, &mut rng);
    assert_relative_eq!(w.boss().pos.distance(before), 75.0, epsilon = 1e-2);
}

// ── Dive bomb ─────────────────────────────────────────────────────────────────

fn dive_phase(w: &World) -> Option<DivePhase> {
    match w.boss().skill {
        BossSkill::DiveBomb(dive) => Some(dive.phase),
        _ => None,
    }
}

#[test]
fn dive_telegraph_freezes_before_impact() {
    let mut w = make_world(Some(vec![BossSkillKind::DiveBomb]), 0.0);
    let mut rng = seeded_rng();
    let freeze = w.config.boss_tuning.dive.freeze_window;

    let mut frozen_target = None;
    let mut saw_hidden = false;
    for i in 0..400 {
        // keep the player moving so a tracking target would drift
        w.player.pos = CENTER + Vec2::new((i as f32 * 0.3).sin() * 300.0, 100.0);
        w.tick(0.05, &mut rng);

        if let Some(DivePhase::Telegraph { timer, target }) = dive_phase(&w) {
            saw_hidden |= w.boss().is_hidden();
            assert!(!w.boss().is_attackable());
            if timer <= freeze {
                match frozen_target {
                    None => frozen_target = Some(target),
                    Some(t) => assert_eq!(t, target),
                }
            }
        }
        if let Some(DivePhase::Landing { .. }) = dive_phase(&w) {
            let target = frozen_target.expect("telegraph ran");
            assert_eq!(w.boss().pos, target);
            break;
        }
    }
    assert!(saw_hidden);
}

#[test]
fn dive_ends_with_landing_and_cooldown() {
    let mut w = make_world(Some(vec![BossSkillKind::DiveBomb]), 0.0);
    w.bosses.tuning.skill_cooldown = 5.0;
    let mut rng = seeded_rng();

    let mut landed = false;
    for _ in 0..600 {
        w.tick(0.05, &mut rng);
        if matches!(dive_phase(&w), Some(DivePhase::Landing { .. })) {
            landed = true;
        }
        if landed && w.boss().skill == BossSkill::None {
            break;
        }
    }
    assert!(landed);
    assert_eq!(w.boss().skill, BossSkill::None);
    assert_relative_eq!(w.boss().skill_cooldown, 5.0);
    assert_relative_eq!(w.boss().alpha, 1.0);
    let impact_shakes = w
        .events
        .iter()
        .filter(|e| matches!(e, SimEvent::CameraShake { intensity, .. } if *intensity == 20.0))
        .count();
    assert_eq!(impact_shakes, 1);
}

fn impact_at(player_offset: Vec2) -> World {
    let mut w = make_world(None, 5.0);
    let tuning = w.config.boss_tuning.dive.clone();
    w.player.pos = CENTER + player_offset;

    let boss = w.bosses.get_mut(0).unwrap();
    let mut env = BossEnv {
        player: &mut w.player,
        stats: &mut w.stats,
        projectiles: &mut w.projectiles,
        arena: &w.arena,
        grid: &mut w.grid,
        events: &mut w.events,
    };
    boss.resolve_impact(CENTER, &tuning, &mut env);
    w
}

#[test]
fn impact_hits_on_the_telegraph_edge() {
    let w = impact_at(Vec2::new(150.0, 0.0));
    // 30 damage x2
    assert_relative_eq!(w.stats.hp, 40.0);
    assert!(w
        .events
        .iter()
        .any(|e| matches!(e, SimEvent::PlayerDamaged { .. })));
}

#[test]
fn impact_misses_just_outside() {
    let w = impact_at(Vec2::new(151.0, 0.0));
    assert_relative_eq!(w.stats.hp, 100.0);
}

#[test]
fn impact_spawns_a_ring_of_enemy_shots() {
    let w = impact_at(Vec2::new(500.0, 0.0));
    assert_eq!(w.projectiles.owned_by(Owner::Enemy).count(), 16);
    for (_, shot) in w.projectiles.iter() {
        assert_eq!(shot.pos, CENTER);
        assert_relative_eq!(shot.velocity.length(), 300.0, epsilon = 1e-2);
    }
}
