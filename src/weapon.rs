//! Orbiting weapons.
//!
//! Each equipped weapon circles the player, flies at the nearest target in
//! range when its cooldown is up, then comes back. Targets are held as
//! generation-checked handles and re-validated every tick.

use std::collections::HashMap;

use glam::Vec2;
use rand::Rng;

use crate::arena::PlayArea;
use crate::boss::BossSystem;
use crate::collision::{check_aabb, hitbox, Collider, HitboxKind, SpatialGrid};
use crate::config::{CombatConfig, SimConfig, WeaponTemplate, WeaponTuning};
use crate::enemy::EnemyPool;
use crate::pool::Handle;
use crate::progression::{Progression, StatBlock, StatKey};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WeaponTarget {
    Enemy(Handle),
    Boss(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FireState {
    Orbiting,
    Fired { target: WeaponTarget },
    Returning,
}

/// Something a weapon killed this tick; rewards are the caller's job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kill {
    Enemy(Handle),
    Boss(usize),
}

#[derive(Clone, Debug)]
pub struct Weapon {
    pub id: String,
    pub name: String,
    pub grade: u8,
    pub damage: f32,
    pub crit_rate: f32,
    pub crit_damage: f32,
    pub cooldown: f32,
    pub knockback: f32,
    pub range: f32,
    pub rotating: bool,
    pub pos: Vec2,
    pub orbit_angle: f32,
    /// Visual spin of rotating blades.
    pub spin: f32,
    pub cooldown_timer: f32,
    pub state: FireState,
    pub hit_cooldowns: HashMap<Handle, f32>,
    width: f32,
    height: f32,
}

/// `base x multiplier^(grade-1)`.
pub fn grade_stat(base: f32, grade: u8, multiplier: f32) -> f32 {
    base * multiplier.powi(grade.max(1) as i32 - 1)
}

/// Grade of a newly granted weapon. Later waves and more luck make higher
/// grades likelier; both saturate (wave 15, luck 2.0).
pub fn roll_initial_grade(wave: u32, luck: f32, rng: &mut impl Rng) -> u8 {
    let wave_factor = (wave as f32 / 15.0).min(1.0);
    let luck_factor = (luck / 2.0).clamp(0.0, 1.0);
    let chance = (wave_factor + luck_factor) / 2.0;
    let roll: f32 = rng.gen();
    if roll < chance * 0.1 {
        4
    } else if roll < chance * 0.25 {
        3
    } else if roll < chance * 0.5 {
        2
    } else {
        1
    }
}

impl Weapon {
    pub fn from_template(template: &WeaponTemplate, grade: u8, tuning: &WeaponTuning) -> Self {
        let grade = grade.clamp(1, tuning.max_grade);
        let m = tuning.grade_multiplier;
        Self {
            id: template.id.clone(),
            name: template.name.clone(),
            grade,
            damage: grade_stat(template.damage, grade, m),
            crit_rate: grade_stat(template.crit_rate, grade, m),
            crit_damage: grade_stat(template.crit_damage, grade, m),
            cooldown: template.cooldown,
            knockback: template.knockback,
            range: template.range,
            rotating: template.rotating,
            pos: Vec2::ZERO,
            orbit_angle: 0.0,
            spin: 0.0,
            cooldown_timer: 0.0,
            state: FireState::Orbiting,
            hit_cooldowns: HashMap::new(),
            width: tuning.width,
            height: tuning.height,
        }
    }

    fn orbit_point(&self, player_pos: Vec2, radius: f32) -> Vec2 {
        player_pos + Vec2::from_angle(self.orbit_angle) * radius
    }

    fn apply_stats(&self, progression: &mut Progression, sign: f32) {
        progression.apply_bonus_stat(StatKey::Attack, self.damage * sign);
        progression.apply_bonus_stat(StatKey::CritRate, self.crit_rate * sign);
        progression.apply_bonus_stat(StatKey::CritDamage, self.crit_damage * sign);
    }
}

impl Collider for Weapon {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

/// What a weapon collision pass needs from the rest of the world.
pub struct WeaponEnv<'a> {
    pub player_pos: Vec2,
    pub stats: &'a StatBlock,
    pub enemies: &'a mut EnemyPool,
    pub bosses: &'a mut BossSystem,
    pub grid: &'a SpatialGrid,
    pub arena: &'a PlayArea,
    pub combat: &'a CombatConfig,
}

// ── Arsenal ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Arsenal {
    slots: Vec<Option<Weapon>>,
    catalog: Vec<WeaponTemplate>,
    pub tuning: WeaponTuning,
}

impl Arsenal {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            slots: vec![None; config.weapon_tuning.slots],
            catalog: config.weapons.clone(),
            tuning: config.weapon_tuning.clone(),
        }
    }

    pub fn slots(&self) -> &[Option<Weapon>] {
        &self.slots
    }

    pub fn weapons(&self) -> impl Iterator<Item = &Weapon> {
        self.slots.iter().flatten()
    }

    pub fn equipped_count(&self) -> usize {
        self.weapons().count()
    }

    /// Puts weapon `id` of `grade` in the first free slot and adds its stats
    /// to the bonus layer. `None` if the id is unknown or every slot is full.
    pub fn equip(&mut self, id: &str, grade: u8, progression: &mut Progression) -> Option<usize> {
        let Some(template) = self.catalog.iter().find(|w| w.id == id) else {
            log::warn!("unknown weapon '{id}'");
            return None;
        };
        let slot = self.slots.iter().position(Option::is_none)?;
        let weapon = Weapon::from_template(template, grade, &self.tuning);
        weapon.apply_stats(progression, 1.0);
        self.slots[slot] = Some(weapon);
        self.relayout();
        Some(slot)
    }

    pub fn remove(&mut self, slot: usize, progression: &mut Progression) -> Option<Weapon> {
        let weapon = self.slots.get_mut(slot)?.take()?;
        weapon.apply_stats(progression, -1.0);
        self.relayout();
        Some(weapon)
    }

    pub fn can_merge(&self, a: usize, b: usize) -> bool {
        if a == b {
            return false;
        }
        match (self.slots.get(a), self.slots.get(b)) {
            (Some(Some(x)), Some(Some(y))) => {
                x.id == y.id && x.grade == y.grade && x.grade < self.tuning.max_grade
            }
            _ => false,
        }
    }

    /// Fuses the weapon in `b` into `a`, raising `a` one grade. Range grows
    /// and cooldown shrinks with each merge.
    pub fn merge(&mut self, a: usize, b: usize, progression: &mut Progression) -> bool {
        if !self.can_merge(a, b) {
            return false;
        }
        let Some(template) = self.slots[a]
            .as_ref()
            .and_then(|w| self.catalog.iter().find(|t| t.id == w.id))
        else {
            return false;
        };
        let (Some(first), Some(second)) = (self.slots[a].take(), self.slots[b].take()) else {
            return false;
        };
        first.apply_stats(progression, -1.0);
        second.apply_stats(progression, -1.0);

        let mut merged = Weapon::from_template(template, first.grade + 1, &self.tuning);
        merged.range = first.range * self.tuning.merge_range_multiplier;
        merged.cooldown = first.cooldown * self.tuning.merge_cooldown_multiplier;
        merged.apply_stats(progression, 1.0);
        self.slots[a] = Some(merged);
        self.relayout();
        true
    }

    /// Spreads equipped weapons evenly around the orbit.
    pub fn relayout(&mut self) {
        let n = self.equipped_count();
        for (i, weapon) in self.slots.iter_mut().flatten().enumerate() {
            weapon.orbit_angle = if n <= 1 {
                0.0
            } else {
                std::f32::consts::TAU * i as f32 / n as f32
            };
        }
    }

    pub fn clear(&mut self, progression: &mut Progression) {
        for slot in 0..self.slots.len() {
            self.remove(slot, progression);
        }
    }

    // ── Per-tick ─────────────────────────────────────────────────────────────

    /// Hits enemies or the boss with every weapon in flight. At most one hit
    /// per weapon per tick.
    pub fn check_collisions(&mut self, env: &mut WeaponEnv<'_>, rng: &mut impl Rng) -> Vec<Kill> {
        let mut kills = Vec::new();
        let hit_cooldown = self.tuning.hit_cooldown;
        let knockback_scale = self.tuning.knockback_scale;

        for weapon in self.slots.iter_mut().flatten() {
            if !matches!(weapon.state, FireState::Fired { .. }) {
                continue;
            }
            let weapon_box = hitbox(weapon, HitboxKind::PlayerAttack);

            let mut hit_enemy = None;
            for cell in env.grid.neighborhood(weapon.pos) {
                let found = cell.enemies.iter().copied().find(|h| {
                    let ready = weapon.hit_cooldowns.get(h).map_or(true, |&t| t <= 0.0);
                    ready
                        && env
                            .enemies
                            .get(*h)
                            .is_some_and(|e| check_aabb(&weapon_box, &hitbox(e, HitboxKind::Enemy)))
                });
                if found.is_some() {
                    hit_enemy = found;
                    break;
                }
            }

            if let Some(handle) = hit_enemy {
                let damage = roll_damage(env.stats, rng);
                let Some(enemy) = env.enemies.get_mut(handle) else {
                    continue;
                };
                let shake = (env.combat.hit_shake_intensity, env.combat.hit_shake_duration);
                let killed = enemy.take_hit(damage, env.combat.hit_tint, shake);
                if weapon.knockback > 0.0 {
                    let away = (enemy.pos - env.player_pos).try_normalize().unwrap_or(Vec2::X);
                    let pushed = enemy.pos + away * weapon.knockback * knockback_scale;
                    enemy.pos = env.arena.clamp(pushed, enemy.width, enemy.height);
                }
                weapon.hit_cooldowns.insert(handle, hit_cooldown);
                if killed {
                    kills.push(Kill::Enemy(handle));
                }
                continue;
            }

            let Some(id) = env.bosses.current_id() else {
                continue;
            };
            if let Some(boss) = env.bosses.get_mut(id) {
                if boss.is_attackable()
                    && boss.weapon_hit_cooldown <= 0.0
                    && check_aabb(&weapon_box, &hitbox(boss, HitboxKind::Boss))
                {
                    let damage = roll_damage(env.stats, rng);
                    boss.weapon_hit_cooldown = hit_cooldown;
                    if boss.take_hit(damage) {
                        kills.push(Kill::Boss(id));
                    }
                }
            }
        }
        kills
    }

    /// Orbit, acquire, fly and return.
    pub fn update(&mut self, dt: f32, player_pos: Vec2, enemies: &EnemyPool, bosses: &BossSystem) {
        let tuning = &self.tuning;
        for weapon in self.slots.iter_mut().flatten() {
            weapon.cooldown_timer = (weapon.cooldown_timer - dt).max(0.0);
            weapon.hit_cooldowns.retain(|h, t| {
                *t -= dt;
                *t > 0.0 && enemies.get(*h).is_some()
            });
            if weapon.rotating {
                weapon.spin = (weapon.spin + std::f32::consts::TAU * 2.0 * dt) % std::f32::consts::TAU;
            }

            match weapon.state {
                FireState::Orbiting => {
                    weapon.pos = weapon.orbit_point(player_pos, tuning.orbit_radius);
                    if weapon.cooldown_timer <= 0.0 {
                        if let Some(target) = acquire_target(player_pos, weapon.range, enemies, bosses)
                        {
                            weapon.state = FireState::Fired { target };
                            weapon.cooldown_timer = weapon.cooldown;
                        }
                    }
                }
                FireState::Fired { target } => {
                    let target_pos = match target {
                        WeaponTarget::Enemy(h) => enemies.get(h).map(|e| e.pos),
                        WeaponTarget::Boss(id) => bosses
                            .bosses()
                            .get(id)
                            .filter(|b| b.is_attackable())
                            .map(|b| b.pos),
                    };
                    match target_pos {
                        Some(pos) => {
                            if move_toward(&mut weapon.pos, pos, tuning.fire_speed * dt)
                                < tuning.arrive_epsilon_sq
                            {
                                weapon.state = FireState::Returning;
                            }
                        }
                        None => weapon.state = FireState::Returning,
                    }
                }
                FireState::Returning => {
                    let home = weapon.orbit_point(player_pos, tuning.orbit_radius);
                    if move_toward(&mut weapon.pos, home, tuning.return_speed * dt)
                        < tuning.arrive_epsilon_sq
                    {
                        weapon.pos = home;
                        weapon.state = FireState::Orbiting;
                    }
                }
            }
        }
    }
}

fn roll_damage(stats: &StatBlock, rng: &mut impl Rng) -> f32 {
    if rng.gen::<f32>() < stats.crit_rate {
        stats.attack * stats.crit_damage
    } else {
        stats.attack
    }
}

/// Moves `pos` up to `step` toward `target`; returns the squared distance left.
fn move_toward(pos: &mut Vec2, target: Vec2, step: f32) -> f32 {
    let offset = target - *pos;
    let distance = offset.length();
    if distance <= step {
        *pos = target;
        return 0.0;
    }
    *pos += offset / distance * step;
    let left = distance - step;
    left * left
}

fn acquire_target(
    player_pos: Vec2,
    range: f32,
    enemies: &EnemyPool,
    bosses: &BossSystem,
) -> Option<WeaponTarget> {
    let enemy = enemies
        .nearest_within(player_pos, range)
        .map(|(h, _, d)| (WeaponTarget::Enemy(h), d));
    let boss = bosses.bosses().iter().enumerate().find_map(|(id, b)| {
        let d = b.pos.distance_squared(player_pos);
        (b.is_attackable() && d <= range * range).then_some((WeaponTarget::Boss(id), d))
    });
    match (enemy, boss) {
        (Some(e), Some(b)) => Some(if b.1 < e.1 { b.0 } else { e.0 }),
        (e, b) => e.or(b).map(|(t, _)| t),
    }
}
