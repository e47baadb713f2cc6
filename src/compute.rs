//! The simulation context and its fixed-order tick.
//!
//! `SimulationContext` owns every subsystem; nothing is global. One call to
//! `tick` advances the world by `dt` seconds in this order: player, camera,
//! grid rebuild, projectiles, enemies, auto-attack, collision resolution,
//! weapons, waves, boss, ambient timers. Projectiles fired by the
//! auto-attack first move on the following tick.

use glam::Vec2;
use rand::Rng;

use crate::arena::PlayArea;
use crate::boss::{BossEnv, BossSystem};
use crate::camera::Camera;
use crate::collision::{check_aabb, hitbox, CollisionSystem, HitboxKind};
use crate::config::SimConfig;
use crate::enemy::EnemyPool;
use crate::entities::{GameStatus, InputState, Owner, Stage};
use crate::events::{SimEvent, SoundCue, TerminalLatch};
use crate::player::{Player, PlayerSignal, PlayerState};
use crate::pool::Handle;
use crate::progression::Progression;
use crate::projectile::ProjectilePool;
use crate::wave::{WaveProgress, WaveSystem};
use crate::weapon::{Arsenal, Kill, WeaponEnv};

pub struct SimulationContext {
    pub config: SimConfig,
    pub stage: Stage,
    pub arena: PlayArea,
    pub camera: Camera,
    pub collision: CollisionSystem,
    pub player: Player,
    pub progression: Progression,
    pub enemies: EnemyPool,
    pub projectiles: ProjectilePool,
    pub arsenal: Arsenal,
    pub bosses: BossSystem,
    pub waves: WaveSystem,
    /// Remaining time of the wave-clear banner.
    pub wave_clear_timer: Option<f32>,
    pub awaiting_settlement: bool,
    /// Set by the host while a dialogue is on screen.
    pub dialogue_active: bool,
    pub status: GameStatus,
    pub frame: u64,
    pub elapsed: f32,
    latch: TerminalLatch,
    events: Vec<SimEvent>,
}

impl SimulationContext {
    /// Fresh run of `stage`. Permanent upgrades come from `progression`;
    /// its run layer is reset. Wave 1 starts immediately.
    pub fn new(config: SimConfig, stage: Stage, mut progression: Progression) -> Self {
        progression.kills_per_entropy = config.combat.kills_per_entropy;
        progression.start_run();

        let arena = PlayArea::new(&config.arena);
        let player = Player::new(
            &config,
            arena.center,
            progression.upgrades.revive_count,
            progression.upgrades.dash_charges,
        );
        let mut camera = Camera::new(&config.camera);
        camera.snap_to(player.pos, arena.world_size);

        let mut ctx = Self {
            stage,
            collision: CollisionSystem::new(arena.world_size, &config.grid),
            enemies: EnemyPool::new(&config),
            projectiles: ProjectilePool::new(config.pools.projectiles, &config.combat),
            arsenal: Arsenal::new(&config),
            bosses: BossSystem::new(&config),
            waves: WaveSystem::new(&config, stage.max_waves()),
            arena,
            camera,
            player,
            progression,
            wave_clear_timer: None,
            awaiting_settlement: false,
            dialogue_active: false,
            status: GameStatus::Playing,
            frame: 0,
            elapsed: 0.0,
            latch: TerminalLatch::default(),
            events: Vec::new(),
            config,
        };

        if let Some(id) = ctx.config.starting_weapon.clone() {
            ctx.arsenal.equip(&id, 1, &mut ctx.progression);
            ctx.progression.recalculate(false);
        }
        let center = ctx.arena.center;
        ctx.waves
            .start_wave(1, &mut ctx.bosses, center, &mut ctx.events);
        ctx
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Hands the accumulated events to the host.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Leaves the settlement interstitial: heals part of max hp and starts
    /// the following wave. False if there is nothing to continue to.
    pub fn next_wave(&mut self) -> bool {
        if self.status != GameStatus::Playing
            || self.waves.active
            || self.wave_clear_timer.is_some()
            || self.waves.is_final_wave()
        {
            return false;
        }
        self.awaiting_settlement = false;
        self.progression
            .stats
            .heal_ratio(self.config.waves.next_wave_heal_ratio);
        let next = self.waves.current_wave + 1;
        let center = self.arena.center;
        self.waves
            .start_wave(next, &mut self.bosses, center, &mut self.events);
        true
    }

    // ── Tick ─────────────────────────────────────────────────────────────────

    pub fn tick(&mut self, dt: f32, input: &InputState, rng: &mut impl Rng) {
        if self.status != GameStatus::Playing {
            return;
        }
        self.frame += 1;
        self.elapsed += dt;
        let first_event = self.events.len();
        log::trace!(
            "tick: frame={} dt={:.4} enemies={} projectiles={}",
            self.frame,
            dt,
            self.enemies.active_count(),
            self.projectiles.active_count()
        );

        self.update_player(dt, input);
        self.update_camera(dt, rng);

        // cinematic states freeze everything but the player and camera
        if self.player.is_clearing() || self.player.is_down() {
            self.apply_shakes(first_event);
            return;
        }

        self.progression.stats.regenerate(dt);

        self.collision.grid.clear();
        self.projectiles
            .update(dt, &self.arena, &mut self.collision.grid);
        self.enemies
            .update(dt, self.player.pos, self.elapsed, &mut self.collision.grid);

        self.player.auto_attack(
            dt,
            &self.progression.stats,
            &self.enemies,
            self.bosses.attackable_target(),
            &mut self.projectiles,
            rng,
        );

        self.resolve_collisions();
        self.update_weapons(dt, rng);
        self.update_waves(dt, rng);
        self.update_bosses(dt, rng);
        self.update_ambient(dt);
        self.apply_shakes(first_event);
    }

    fn update_player(&mut self, dt: f32, input: &InputState) {
        let signal = self
            .player
            .update(dt, input, &mut self.progression.stats, &self.arena);
        match signal {
            PlayerSignal::None => {}
            PlayerSignal::DashStarted => self.events.push(SimEvent::Sound(SoundCue::Dash)),
            PlayerSignal::Revived => {
                self.events.push(SimEvent::PlayerRevived {
                    revives_left: self.player.revives,
                });
                self.events.push(SimEvent::Sound(SoundCue::Revive));
            }
            PlayerSignal::GameOverDue => self.handle_game_over(),
            PlayerSignal::ClearFinished => self.handle_game_clear(),
        }
    }

    fn update_camera(&mut self, dt: f32, rng: &mut impl Rng) {
        let focus = match &self.player.state {
            PlayerState::Clearing(seq) => seq.boss_pos,
            _ => self.player.pos,
        };
        let zoom = self.player.camera_zoom();
        let reached = self
            .camera
            .update(dt, focus, zoom, self.arena.world_size, rng);
        if reached {
            self.player.notify_camera_reached();
        }
    }

    fn apply_shakes(&mut self, first_event: usize) {
        for event in &self.events[first_event..] {
            if let SimEvent::CameraShake {
                intensity,
                duration,
            } = *event
            {
                self.camera.shake(intensity, duration);
            }
        }
    }

    fn handle_game_over(&mut self) {
        if !self.latch.claim_game_over() {
            return;
        }
        self.status = GameStatus::GameOver;
        log::info!("game over on wave {}", self.waves.current_wave);
        self.events.push(SimEvent::GameOver {
            wave: self.waves.current_wave,
            entropy_earned: self.progression.entropy_earned_this_run,
        });
    }

    fn handle_game_clear(&mut self) {
        if !self.latch.claim_game_clear() {
            return;
        }
        self.status = GameStatus::Cleared;
        self.bosses.despawn_all();
        log::info!("stage {} cleared", self.stage.name());
        self.events.push(SimEvent::Sound(SoundCue::StageClear));
        self.events.push(SimEvent::GameClear {
            wave: self.waves.current_wave,
            gold: self.progression.gold,
        });
    }

    // ── Combat ───────────────────────────────────────────────────────────────

    /// Damages the player and reports what happened.
    fn damage_player(&mut self, amount: f32) {
        let before = self.progression.stats.hp;
        let fatal = self
            .player
            .take_damage(amount, &mut self.progression.stats);
        let hp = self.progression.stats.hp;
        if hp < before {
            self.events.push(SimEvent::PlayerDamaged {
                amount: before - hp,
                hp,
            });
            self.events.push(SimEvent::Sound(SoundCue::PlayerHit));
        }
        if fatal {
            self.events.push(SimEvent::PlayerDied);
            self.events.push(SimEvent::Sound(SoundCue::PlayerDeath));
        }
    }

    fn resolve_collisions(&mut self) {
        let combat = self.config.combat.clone();

        // player <-> enemy contact
        if let Some(handle) = self
            .collision
            .check_player_enemy_collision(&self.player, self.enemies.pool())
        {
            let invincible = self.player.is_invincible();
            if let Some(enemy) = self.enemies.get_mut(handle) {
                if !invincible && enemy.contact_cooldown <= 0.0 {
                    enemy.contact_cooldown = combat.enemy_contact_cooldown;
                    let damage = enemy.damage;
                    self.damage_player(damage);
                }
            }
        }

        // player projectiles -> enemies, one target per projectile
        let hits = self.collision.check_projectile_collision(
            self.projectiles.owned_by(Owner::Player),
            self.enemies.pool(),
        );
        for (proj, target) in hits {
            let Some(damage) = self.projectiles.get(proj).map(|p| p.damage) else {
                continue;
            };
            let Some(enemy) = self.enemies.get_mut(target) else {
                continue;
            };
            self.projectiles.despawn(proj);
            let shake = (combat.hit_shake_intensity, combat.hit_shake_duration);
            if enemy.take_hit(damage, combat.hit_tint, shake) {
                self.kill_enemy(target);
            }
        }

        // player projectiles -> boss
        if let Some(id) = self.bosses.current_id() {
            let shots: Vec<(Handle, f32)> = match self.bosses.current() {
                Some(boss) if boss.is_attackable() => {
                    let boss_box = hitbox(boss, HitboxKind::Boss);
                    self.projectiles
                        .owned_by(Owner::Player)
                        .filter(|(_, p)| check_aabb(&hitbox(*p, HitboxKind::Projectile), &boss_box))
                        .map(|(h, p)| (h, p.damage))
                        .collect()
                }
                _ => Vec::new(),
            };
            for (proj, damage) in shots {
                let Some(boss) = self.bosses.get_mut(id) else {
                    break;
                };
                if boss.dead || boss.projectile_hit_cooldown > 0.0 {
                    continue;
                }
                boss.projectile_hit_cooldown = combat.boss_hit_cooldown;
                let killed = boss.take_hit(damage);
                self.projectiles.despawn(proj);
                if killed {
                    self.on_boss_killed(id);
                }
            }
        }

        // boss body contact; a dashing boss hits harder and more often
        if let Some(id) = self
            .collision
            .check_player_boss_collision(&self.player, self.bosses.bosses())
        {
            let dash = &self.config.boss_tuning.dash;
            let invincible = self.player.is_invincible();
            let mut damage = None;
            if let Some(boss) = self.bosses.get_mut(id) {
                if !invincible {
                    if boss.is_dashing() {
                        if boss.contact_cooldown <= dash.contact_cooldown {
                            boss.contact_cooldown = dash.contact_cooldown;
                            damage = Some(boss.damage * dash.contact_multiplier);
                        }
                    } else if boss.contact_cooldown <= 0.0 {
                        boss.contact_cooldown = combat.boss_contact_cooldown;
                        damage = Some(boss.damage);
                    }
                }
            }
            if let Some(amount) = damage {
                self.damage_player(amount);
            }
        }

        // enemy projectiles -> player; they are spent either way
        let player_box = hitbox(&self.player, HitboxKind::Player);
        let incoming: Vec<(Handle, f32)> = self
            .projectiles
            .owned_by(Owner::Enemy)
            .filter(|(_, p)| check_aabb(&player_box, &hitbox(*p, HitboxKind::Projectile)))
            .map(|(h, p)| (h, p.damage))
            .collect();
        for (proj, damage) in incoming {
            self.projectiles.despawn(proj);
            if !self.player.is_invincible() {
                self.damage_player(damage);
            }
        }
    }

    fn kill_enemy(&mut self, handle: Handle) {
        let Some(enemy) = self.enemies.get(handle) else {
            return;
        };
        let (kind, pos, exp, gold) = (enemy.kind.clone(), enemy.pos, enemy.exp, enemy.gold);
        self.enemies.despawn(handle);

        if self.progression.add_exp(exp) {
            self.events.push(SimEvent::LevelUp {
                level: self.progression.level,
            });
        }
        self.progression.add_gold(gold);
        self.progression.on_enemy_killed();

        let (intensity, duration) = self.config.combat.kill_shake;
        self.events.push(SimEvent::CameraShake {
            intensity,
            duration,
        });
        self.events.push(SimEvent::Sound(SoundCue::EnemyKilled));
        self.events.push(SimEvent::EnemyKilled { kind, pos });
    }

    fn on_boss_killed(&mut self, id: usize) {
        let Some(boss) = self.bosses.bosses().get(id) else {
            return;
        };
        let (name, pos, exp, gold) = (boss.name.clone(), boss.pos, boss.exp, boss.gold);

        if self.progression.add_exp(exp) {
            self.events.push(SimEvent::LevelUp {
                level: self.progression.level,
            });
        }
        self.progression.add_gold(gold);
        self.progression
            .grant_entropy(self.config.combat.boss_kill_entropy);
        self.events.push(SimEvent::Sound(SoundCue::BossDeath));
        self.events.push(SimEvent::BossDefeated { name });

        self.waves.end_wave(&mut self.enemies, &mut self.events);
        self.player.begin_clear(pos);
    }

    // ── Remaining systems ────────────────────────────────────────────────────

    fn update_weapons(&mut self, dt: f32, rng: &mut impl Rng) {
        let kills = {
            let mut env = WeaponEnv {
                player_pos: self.player.pos,
                stats: &self.progression.stats,
                enemies: &mut self.enemies,
                bosses: &mut self.bosses,
                grid: &self.collision.grid,
                arena: &self.arena,
                combat: &self.config.combat,
            };
            self.arsenal.check_collisions(&mut env, rng)
        };
        for kill in kills {
            match kill {
                Kill::Enemy(handle) => self.kill_enemy(handle),
                Kill::Boss(id) => self.on_boss_killed(id),
            }
        }
        self.arsenal
            .update(dt, self.player.pos, &self.enemies, &self.bosses);
    }

    fn update_waves(&mut self, dt: f32, rng: &mut impl Rng) {
        let progress = self.waves.update(
            dt,
            self.player.pos,
            &mut self.enemies,
            self.dialogue_active,
            rng,
            &mut self.events,
        );
        if let WaveProgress::Ended { .. } = progress {
            if !self.waves.boss_wave {
                self.wave_clear_timer = Some(self.config.waves.clear_banner);
                self.events.push(SimEvent::Sound(SoundCue::WaveClear));
            }
        }
    }

    fn update_bosses(&mut self, dt: f32, rng: &mut impl Rng) {
        if self.player.is_clearing() {
            return;
        }
        let mut env = BossEnv {
            player: &mut self.player,
            stats: &mut self.progression.stats,
            projectiles: &mut self.projectiles,
            arena: &self.arena,
            grid: &mut self.collision.grid,
            events: &mut self.events,
        };
        self.bosses.update(dt, &mut env, rng);
    }

    fn update_ambient(&mut self, dt: f32) {
        if let Some(timer) = self.wave_clear_timer.as_mut() {
            *timer -= dt;
            if *timer <= 0.0 {
                self.wave_clear_timer = None;
                self.awaiting_settlement = true;
                self.events.push(SimEvent::SettlementRequested {
                    wave: self.waves.current_wave,
                });
            }
        }
    }

    /// Centre of the view in world space, including shake.
    pub fn view_origin(&self) -> Vec2 {
        self.camera.pos + self.camera.shake_offset
    }
}
