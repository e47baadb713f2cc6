//! Pooled enemies and their per-tick behaviour.

use glam::Vec2;

use crate::collision::{Collider, GridObject, SpatialGrid};
use crate::config::{ChargeTemplate, EnemyTemplate, SimConfig};
use crate::entities::Facing;
use crate::pool::{Handle, Pool};

const BOB_SPEED: f32 = 4.0;
const BOB_AMOUNT: f32 = 5.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum EnemyMode {
    #[default]
    Approaching,
    /// Inside attack range; damage itself is dealt by contact.
    Attacking,
    /// Locked-direction rush of charge archetypes.
    Charging { remaining: f32, direction: Vec2 },
}

/// Charge bookkeeping for archetypes that have one.
#[derive(Clone, Debug, PartialEq)]
pub struct ChargeState {
    pub params: ChargeTemplate,
    /// Counts down to the next charge while not charging.
    pub timer: f32,
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub kind: String,
    pub pos: Vec2,
    pub hp: f32,
    pub max_hp: f32,
    pub damage: f32,
    pub speed: f32,
    pub gold: u32,
    pub exp: u32,
    pub width: f32,
    pub height: f32,
    pub render_size: f32,
    pub attack_range: f32,
    pub attack_cooldown: f32,
    pub attack_timer: f32,
    pub facing: Facing,
    pub mode: EnemyMode,
    pub charge: Option<ChargeState>,
    pub tint_timer: f32,
    pub hit_shake: f32,
    pub hit_shake_intensity: f32,
    pub contact_cooldown: f32,
    pub frame: u32,
    pub frame_timer: f32,
    pub frame_count: u32,
    pub frame_time: f32,
    pub bob_offset: f32,
    pub wave: u32,
}

impl Enemy {
    /// Fresh instance of `template` at `pos`, hp and damage scaled by
    /// `multiplier`.
    pub fn from_template(template: &EnemyTemplate, pos: Vec2, wave: u32, multiplier: f32) -> Self {
        let hp = template.hp * multiplier;
        Self {
            kind: template.name.clone(),
            pos,
            hp,
            max_hp: hp,
            damage: template.damage * multiplier,
            speed: template.speed,
            gold: template.gold,
            exp: template.exp,
            width: template.width,
            height: template.height,
            render_size: template.render_size,
            attack_range: template.attack_range,
            attack_cooldown: template.attack_cooldown,
            attack_timer: 0.0,
            facing: Facing::Right,
            mode: EnemyMode::Approaching,
            charge: template.charge.clone().map(|params| ChargeState {
                timer: params.cooldown,
                params,
            }),
            tint_timer: 0.0,
            hit_shake: 0.0,
            hit_shake_intensity: 0.0,
            contact_cooldown: 0.0,
            frame: 0,
            frame_timer: 0.0,
            frame_count: template.frame_count,
            frame_time: template.frame_time,
            bob_offset: 0.0,
            wave,
        }
    }

    pub fn is_charging(&self) -> bool {
        matches!(self.mode, EnemyMode::Charging { .. })
    }

    /// Brief warning before a charge starts.
    pub fn is_winding_up(&self) -> bool {
        match &self.charge {
            Some(c) => !self.is_charging() && c.timer > 0.0 && c.timer <= c.params.windup,
            None => false,
        }
    }

    pub fn is_tinted(&self) -> bool {
        self.tint_timer > 0.0 || self.is_winding_up()
    }

    /// Applies damage and hit feedback. Returns true when this hit killed it.
    pub fn take_hit(&mut self, amount: f32, tint: f32, shake: (f32, f32)) -> bool {
        if self.hp <= 0.0 {
            return false;
        }
        self.hp -= amount;
        self.tint_timer = tint;
        self.hit_shake_intensity = shake.0;
        self.hit_shake = shake.1;
        self.hp <= 0.0
    }

    pub fn update(&mut self, dt: f32, player_pos: Vec2, time: f32) {
        self.tint_timer = (self.tint_timer - dt).max(0.0);
        self.hit_shake = (self.hit_shake - dt).max(0.0);
        self.attack_timer = (self.attack_timer - dt).max(0.0);
        self.contact_cooldown = (self.contact_cooldown - dt).max(0.0);

        let offset = player_pos - self.pos;
        let dist_sq = offset.length_squared();
        let distance = dist_sq.sqrt();
        let dir = if dist_sq > 0.0 {
            offset / distance
        } else {
            Vec2::ZERO
        };
        self.facing = Facing::toward(offset.x);

        match self.charge.as_mut() {
            Some(charge) => match self.mode {
                EnemyMode::Charging {
                    remaining,
                    direction,
                } => {
                    self.pos += direction * charge.params.speed * dt;
                    let remaining = remaining - dt;
                    if remaining <= 0.0 {
                        self.mode = EnemyMode::Approaching;
                        charge.timer = charge.params.cooldown;
                    } else {
                        self.mode = EnemyMode::Charging {
                            remaining,
                            direction,
                        };
                    }
                }
                _ => {
                    charge.timer -= dt;
                    if charge.timer <= 0.0 && distance > self.attack_range {
                        self.mode = EnemyMode::Charging {
                            remaining: charge.params.duration,
                            direction: if dir == Vec2::ZERO { Vec2::X } else { dir },
                        };
                        // a fresh charge may hit even right after a contact
                        self.contact_cooldown = 0.0;
                    } else {
                        self.approach_or_attack(dt, dir, distance);
                    }
                }
            },
            None => self.approach_or_attack(dt, dir, distance),
        }

        if self.frame_count > 1 {
            self.frame_timer += dt;
            if self.frame_timer >= self.frame_time {
                self.frame_timer -= self.frame_time;
                self.frame = (self.frame + 1) % self.frame_count;
            }
        }
        self.bob_offset = (time * BOB_SPEED).sin() * BOB_AMOUNT;
    }

    fn approach_or_attack(&mut self, dt: f32, dir: Vec2, distance: f32) {
        if distance > self.attack_range {
            self.mode = EnemyMode::Approaching;
            self.pos += dir * self.speed * dt;
        } else {
            self.mode = EnemyMode::Attacking;
            if self.attack_timer <= 0.0 {
                self.attack_timer = self.attack_cooldown;
            }
        }
    }
}

impl Collider for Enemy {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    fn is_alive(&self) -> bool {
        self.hp > 0.0
    }
}

// ── Pool ──────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct EnemyPool {
    pool: Pool<Enemy>,
    catalog: Vec<EnemyTemplate>,
    scale_per_wave: f32,
}

impl EnemyPool {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            pool: Pool::with_capacity(config.pools.enemies),
            catalog: config.enemy_types.clone(),
            scale_per_wave: config.waves.scale_per_wave,
        }
    }

    /// hp and damage multiplier for a wave; wave 1 is unscaled.
    pub fn wave_multiplier(&self, wave: u32) -> f32 {
        1.0 + wave.saturating_sub(1) as f32 * self.scale_per_wave
    }

    pub fn template(&self, kind: &str) -> Option<&EnemyTemplate> {
        self.catalog.iter().find(|t| t.name == kind)
    }

    /// Spawns `kind` at `pos`. Unknown kinds are logged and yield `None`.
    pub fn spawn(&mut self, kind: &str, pos: Vec2, wave: u32) -> Option<Handle> {
        let multiplier = self.wave_multiplier(wave);
        let Some(template) = self.template(kind) else {
            log::warn!("spawn requested for unknown enemy type '{kind}'");
            return None;
        };
        let enemy = Enemy::from_template(template, pos, wave, multiplier);
        Some(self.pool.spawn(enemy))
    }

    /// Returns the slot to the pool. Stale handles are ignored.
    pub fn despawn(&mut self, handle: Handle) -> bool {
        self.pool.despawn(handle).is_some()
    }

    pub fn despawn_all(&mut self) {
        self.pool.clear();
    }

    pub fn get(&self, handle: Handle) -> Option<&Enemy> {
        self.pool.get(handle)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut Enemy> {
        self.pool.get_mut(handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &Enemy)> {
        self.pool.iter()
    }

    pub fn handles(&self) -> Vec<Handle> {
        self.pool.handles()
    }

    pub fn active_count(&self) -> usize {
        self.pool.active_count()
    }

    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    pub fn pool(&self) -> &Pool<Enemy> {
        &self.pool
    }

    /// Moves every live enemy and registers it in the grid.
    pub fn update(&mut self, dt: f32, player_pos: Vec2, time: f32, grid: &mut SpatialGrid) {
        for (handle, enemy) in self.pool.iter_mut() {
            enemy.update(dt, player_pos, time);
            grid.register(GridObject::Enemy(handle), enemy.pos);
        }
    }

    /// Nearest live enemy within `range` of `from`.
    pub fn nearest_within(&self, from: Vec2, range: f32) -> Option<(Handle, Vec2, f32)> {
        let range_sq = range * range;
        self.pool
            .iter()
            .map(|(h, e)| (h, e.pos, e.pos.distance_squared(from)))
            .filter(|&(_, _, d)| d <= range_sq)
            .min_by(|a, b| a.2.total_cmp(&b.2))
    }
}
