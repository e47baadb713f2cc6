//! Wave pacing: per-type spawn timers, telegraphed spawn points and the
//! final boss wave.

use glam::Vec2;
use rand::Rng;

use crate::boss::BossSystem;
use crate::config::{SimConfig, SpawnRule, WaveConfig};
use crate::enemy::EnemyPool;
use crate::events::SimEvent;

/// A spawn that has been placed but not yet materialised. Rendered as a
/// warning marker until `spawn_time`.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingSpawn {
    pub kind: String,
    pub pos: Vec2,
    pub spawn_time: f32,
}

#[derive(Clone, Debug, PartialEq)]
struct SpawnTimer {
    rule: SpawnRule,
    remaining: f32,
}

/// Result of one wave update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaveProgress {
    Running,
    /// The wave ended this tick (enemies already purged).
    Ended { wave: u32 },
    Idle,
}

#[derive(Clone, Debug)]
pub struct WaveSystem {
    pub current_wave: u32,
    pub max_wave: u32,
    pub wave_timer: f32,
    /// Spawn clock of the wave; pending spawns are stamped against it.
    pub spawn_timer: f32,
    pub boss_wave: bool,
    pub active: bool,
    timers: Vec<SpawnTimer>,
    pending: Vec<PendingSpawn>,
    config: WaveConfig,
}

impl WaveSystem {
    pub fn new(config: &SimConfig, max_wave: u32) -> Self {
        Self {
            current_wave: 0,
            max_wave: max_wave.max(1),
            wave_timer: 0.0,
            spawn_timer: 0.0,
            boss_wave: false,
            active: false,
            timers: config
                .spawn_schedule
                .iter()
                .map(|rule| SpawnTimer {
                    rule: rule.clone(),
                    remaining: 0.0,
                })
                .collect(),
            pending: Vec::new(),
            config: config.waves.clone(),
        }
    }

    pub fn pending_spawns(&self) -> &[PendingSpawn] {
        &self.pending
    }

    pub fn is_final_wave(&self) -> bool {
        self.current_wave >= self.max_wave
    }

    pub fn time_left(&self) -> f32 {
        (self.config.duration - self.wave_timer).max(0.0)
    }

    /// Starts `wave`. The last wave is the boss wave: the boss appears at
    /// `boss_spawn` and no regular enemies are scheduled.
    pub fn start_wave(
        &mut self,
        wave: u32,
        bosses: &mut BossSystem,
        boss_spawn: Vec2,
        events: &mut Vec<SimEvent>,
    ) {
        self.current_wave = wave;
        self.wave_timer = 0.0;
        self.spawn_timer = 0.0;
        self.pending.clear();
        for timer in &mut self.timers {
            timer.remaining = 0.0;
        }
        self.boss_wave = wave >= self.max_wave;
        self.active = true;
        log::info!("wave {wave} started (boss wave: {})", self.boss_wave);
        events.push(SimEvent::WaveStarted {
            wave,
            boss_wave: self.boss_wave,
        });

        if self.boss_wave {
            let name = self.config.boss.clone();
            if bosses.spawn(&name, boss_spawn).is_some() {
                events.push(SimEvent::BossSpawned { name });
            }
        }
    }

    /// Ends the running wave: every enemy and pending spawn is removed.
    pub fn end_wave(&mut self, enemies: &mut EnemyPool, events: &mut Vec<SimEvent>) {
        if !self.active {
            return;
        }
        self.active = false;
        self.pending.clear();
        enemies.despawn_all();
        log::info!("wave {} ended", self.current_wave);
        events.push(SimEvent::WaveEnded {
            wave: self.current_wave,
        });
    }

    /// Random point around `center` between the minimum and maximum spawn
    /// distance. Falls back to exactly the minimum distance.
    pub fn spawn_point(&self, center: Vec2, rng: &mut impl Rng) -> Vec2 {
        let min = self.config.min_spawn_distance;
        let span = (self.config.spawn_radius - min).max(0.0);
        for _ in 0..self.config.spawn_attempts {
            let angle = rng.gen_range(0.0..std::f32::consts::TAU);
            let distance = min + rng.gen::<f32>() * span;
            let pos = center + Vec2::from_angle(angle) * distance;
            if pos.distance_squared(center) >= min * min {
                return pos;
            }
        }
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        center + Vec2::from_angle(angle) * min
    }

    pub fn update(
        &mut self,
        dt: f32,
        player_pos: Vec2,
        enemies: &mut EnemyPool,
        dialogue_active: bool,
        rng: &mut impl Rng,
        events: &mut Vec<SimEvent>,
    ) -> WaveProgress {
        if !self.active {
            return WaveProgress::Idle;
        }
        self.wave_timer += dt;
        if self.boss_wave {
            // ends only through the boss kill
            return WaveProgress::Running;
        }

        if !dialogue_active {
            self.spawn_timer += dt;
            self.schedule_spawns(dt, player_pos, rng);
            self.materialize(enemies);
        }

        let timed_out = self.wave_timer >= self.config.duration;
        let emptied = self.wave_timer >= self.config.early_end_wave_time
            && self.spawn_timer >= self.config.early_end_spawn_time
            && enemies.active_count() == 0
            && self.pending.is_empty();
        if timed_out || emptied {
            let wave = self.current_wave;
            self.end_wave(enemies, events);
            return WaveProgress::Ended { wave };
        }
        WaveProgress::Running
    }

    fn schedule_spawns(&mut self, dt: f32, player_pos: Vec2, rng: &mut impl Rng) {
        let wave = self.current_wave;
        let spawn_time = self.spawn_timer + self.config.spawn_delay;
        let mut batch = Vec::new();
        for timer in &mut self.timers {
            timer.remaining -= dt;
            if timer.remaining <= 0.0 {
                timer.remaining = timer.rule.interval;
                let count = timer.rule.base_count + wave;
                batch.push((timer.rule.enemy.clone(), count));
            }
        }
        for (kind, count) in batch {
            for _ in 0..count {
                let pos = self.spawn_point(player_pos, rng);
                self.pending.push(PendingSpawn {
                    kind: kind.clone(),
                    pos,
                    spawn_time,
                });
            }
        }
    }

    fn materialize(&mut self, enemies: &mut EnemyPool) {
        let now = self.spawn_timer;
        let wave = self.current_wave;
        self.pending.retain(|p| {
            if now >= p.spawn_time {
                enemies.spawn(&p.kind, p.pos, wave);
                false
            } else {
                true
            }
        });
    }
}
