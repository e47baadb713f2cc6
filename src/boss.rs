//! Scripted boss encounter.
//!
//! A boss walks toward the player until its skill cooldown runs out, then
//! picks one of its skills (never the same one twice in a row) and plays it
//! to the end. Skills are timer driven and cannot be interrupted; only death
//! stops them.

use glam::Vec2;
use rand::Rng;

use crate::arena::PlayArea;
use crate::collision::{Collider, GridObject, SpatialGrid};
use crate::config::{BossSkillKind, BossTemplate, BossTuning, DiveTuning, SimConfig};
use crate::entities::{Facing, Owner};
use crate::events::{SimEvent, SoundCue};
use crate::player::Player;
use crate::progression::StatBlock;
use crate::projectile::ProjectilePool;

// ── Skill state ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DashPhase {
    Dashing { timer: f32, direction: Vec2 },
    Pause { timer: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DashChain {
    /// Dashes still to finish, including the one in progress.
    pub remaining: u32,
    pub phase: DashPhase,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DivePhase {
    /// Shaking in place.
    WindUp { timer: f32 },
    /// Flying up and fading out.
    Ascend { timer: f32 },
    /// Hidden; the warning circle tracks the player, then freezes.
    Telegraph { timer: f32, target: Vec2 },
    Descend { target: Vec2 },
    /// Grace period after the impact.
    Landing { timer: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiveBomb {
    pub phase: DivePhase,
    /// Where the boss stood when the dive began.
    pub origin: Vec2,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum BossSkill {
    #[default]
    None,
    DashChain(DashChain),
    DiveBomb(DiveBomb),
}

impl BossSkill {
    pub fn kind(&self) -> Option<BossSkillKind> {
        match self {
            BossSkill::None => None,
            BossSkill::DashChain(_) => Some(BossSkillKind::DashChain),
            BossSkill::DiveBomb(_) => Some(BossSkillKind::DiveBomb),
        }
    }
}

/// Everything outside the boss that a boss tick touches.
pub struct BossEnv<'a> {
    pub player: &'a mut Player,
    pub stats: &'a mut StatBlock,
    pub projectiles: &'a mut ProjectilePool,
    pub arena: &'a PlayArea,
    pub grid: &'a mut SpatialGrid,
    pub events: &'a mut Vec<SimEvent>,
}

// ── Boss ──────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Boss {
    pub name: String,
    pub pos: Vec2,
    pub hp: f32,
    pub max_hp: f32,
    pub damage: f32,
    pub speed: f32,
    pub gold: u32,
    pub exp: u32,
    pub width: f32,
    pub height: f32,
    pub facing: Facing,
    pub skills: Vec<BossSkillKind>,
    pub skill: BossSkill,
    pub skill_cooldown: f32,
    pub last_skill: Option<usize>,
    pub dead: bool,
    pub weapon_hit_cooldown: f32,
    pub projectile_hit_cooldown: f32,
    pub contact_cooldown: f32,
    pub bob_offset: f32,
    /// Draw opacity, fades during the dive ascent.
    pub alpha: f32,
    clock: f32,
}

impl Boss {
    pub fn from_template(template: &BossTemplate, pos: Vec2, tuning: &BossTuning) -> Self {
        Self {
            name: template.name.clone(),
            pos,
            hp: template.hp,
            max_hp: template.hp,
            damage: template.damage,
            speed: template.speed,
            gold: template.gold,
            exp: template.exp,
            width: template.width,
            height: template.height,
            facing: Facing::Right,
            skills: template.skills.clone(),
            skill: BossSkill::None,
            skill_cooldown: tuning.skill_cooldown,
            last_skill: None,
            dead: false,
            weapon_hit_cooldown: 0.0,
            projectile_hit_cooldown: 0.0,
            contact_cooldown: 0.0,
            bob_offset: 0.0,
            alpha: 1.0,
            clock: 0.0,
        }
    }

    pub fn is_dashing(&self) -> bool {
        matches!(
            self.skill,
            BossSkill::DashChain(DashChain {
                phase: DashPhase::Dashing { .. },
                ..
            })
        )
    }

    pub fn is_diving(&self) -> bool {
        matches!(self.skill, BossSkill::DiveBomb(_))
    }

    pub fn is_hidden(&self) -> bool {
        matches!(
            self.skill,
            BossSkill::DiveBomb(DiveBomb {
                phase: DivePhase::Telegraph { .. },
                ..
            })
        )
    }

    /// Valid for player damage and auto-targeting only in the neutral move
    /// pose: alive, not mid-dash and not anywhere in a dive.
    pub fn is_attackable(&self) -> bool {
        if self.dead || self.hp <= 0.0 {
            return false;
        }
        match self.skill {
            BossSkill::None => true,
            BossSkill::DashChain(chain) => matches!(chain.phase, DashPhase::Pause { .. }),
            BossSkill::DiveBomb(_) => false,
        }
    }

    /// Warning circle centre while the dive telegraph or descent is running.
    pub fn telegraph_target(&self) -> Option<Vec2> {
        match self.skill {
            BossSkill::DiveBomb(DiveBomb {
                phase: DivePhase::Telegraph { target, .. } | DivePhase::Descend { target },
                ..
            }) => Some(target),
            _ => None,
        }
    }

    /// Applies damage. Returns true when this hit killed the boss.
    pub fn take_hit(&mut self, amount: f32) -> bool {
        if self.dead {
            return false;
        }
        self.hp = (self.hp - amount).max(0.0);
        if self.hp <= 0.0 {
            self.dead = true;
            log::info!("boss {} defeated", self.name);
            return true;
        }
        false
    }

    pub fn update(
        &mut self,
        dt: f32,
        tuning: &BossTuning,
        env: &mut BossEnv<'_>,
        rng: &mut impl Rng,
    ) {
        if self.dead {
            return;
        }
        self.clock += dt;
        self.weapon_hit_cooldown = (self.weapon_hit_cooldown - dt).max(0.0);
        self.projectile_hit_cooldown = (self.projectile_hit_cooldown - dt).max(0.0);
        self.contact_cooldown = (self.contact_cooldown - dt).max(0.0);

        let landing = matches!(
            self.skill,
            BossSkill::DiveBomb(DiveBomb {
                phase: DivePhase::Landing { .. },
                ..
            })
        );
        self.bob_offset = if landing {
            let jitter = tuning.dive.landing_jitter;
            rng.gen_range(-jitter..=jitter)
        } else {
            (self.clock * tuning.bob_speed).sin() * tuning.bob_amount
        };

        let player_pos = env.player.pos;
        let offset = player_pos - self.pos;
        if !landing && !self.is_hidden() && offset.x != 0.0 {
            self.facing = Facing::toward(offset.x);
        }

        let skill = std::mem::take(&mut self.skill);
        self.skill = match skill {
            BossSkill::None => {
                self.skill_cooldown = (self.skill_cooldown - dt).max(0.0);
                if self.skill_cooldown <= 0.0 && !self.skills.is_empty() {
                    self.select_skill(tuning, player_pos, env, rng)
                } else {
                    BossSkill::None
                }
            }
            BossSkill::DashChain(chain) => self.step_dash_chain(chain, dt, tuning, player_pos, env),
            BossSkill::DiveBomb(dive) => self.step_dive(dive, dt, tuning, env),
        };
        if self.skill == BossSkill::None {
            self.alpha = 1.0;
        }

        let walks = match self.skill {
            BossSkill::None => true,
            BossSkill::DashChain(chain) => matches!(chain.phase, DashPhase::Pause { .. }),
            BossSkill::DiveBomb(_) => false,
        };
        if walks {
            let offset = player_pos - self.pos;
            if offset.length_squared() > 0.0 {
                self.pos += offset.normalize() * self.speed * dt;
            }
        }

        if !self.is_diving() {
            self.pos = env.arena.clamp(self.pos, self.width, self.height);
        }
    }

    fn select_skill(
        &mut self,
        tuning: &BossTuning,
        player_pos: Vec2,
        env: &mut BossEnv<'_>,
        rng: &mut impl Rng,
    ) -> BossSkill {
        let n = self.skills.len();
        let index = match self.last_skill {
            Some(last) if n > 1 => {
                let i = rng.gen_range(0..n - 1);
                if i >= last {
                    i + 1
                } else {
                    i
                }
            }
            _ => rng.gen_range(0..n),
        };
        self.last_skill = Some(index);
        log::debug!("boss {} uses {:?}", self.name, self.skills[index]);

        match self.skills[index] {
            BossSkillKind::DashChain => {
                let dash = &tuning.dash;
                let count = rng.gen_range(dash.min_dashes..=dash.max_dashes.max(dash.min_dashes));
                env.events.push(SimEvent::Sound(SoundCue::BossDash));
                BossSkill::DashChain(DashChain {
                    remaining: count.max(1),
                    phase: self.dash_toward(player_pos, tuning),
                })
            }
            BossSkillKind::DiveBomb => {
                let (intensity, duration) = tuning.dive.windup_shake;
                env.events.push(SimEvent::CameraShake {
                    intensity,
                    duration,
                });
                BossSkill::DiveBomb(DiveBomb {
                    phase: DivePhase::WindUp {
                        timer: tuning.dive.windup,
                    },
                    origin: self.pos,
                })
            }
        }
    }

    fn dash_toward(&self, player_pos: Vec2, tuning: &BossTuning) -> DashPhase {
        let direction = (player_pos - self.pos).try_normalize().unwrap_or(Vec2::X);
        DashPhase::Dashing {
            timer: tuning.dash.duration,
            direction,
        }
    }

    fn step_dash_chain(
        &mut self,
        mut chain: DashChain,
        dt: f32,
        tuning: &BossTuning,
        player_pos: Vec2,
        env: &mut BossEnv<'_>,
    ) -> BossSkill {
        match chain.phase {
            DashPhase::Dashing { timer, direction } => {
                self.pos += direction * self.speed * tuning.dash.speed_multiplier * dt;
                let timer = timer - dt;
                if timer <= 0.0 {
                    chain.remaining = chain.remaining.saturating_sub(1);
                    let pause = if chain.remaining > 0 {
                        tuning.dash.chain_pause
                    } else {
                        tuning.dash.final_pause
                    };
                    chain.phase = DashPhase::Pause { timer: pause };
                } else {
                    chain.phase = DashPhase::Dashing { timer, direction };
                }
                BossSkill::DashChain(chain)
            }
            DashPhase::Pause { timer } => {
                let timer = timer - dt;
                if timer > 0.0 {
                    chain.phase = DashPhase::Pause { timer };
                    return BossSkill::DashChain(chain);
                }
                if chain.remaining > 0 {
                    env.events.push(SimEvent::Sound(SoundCue::BossDash));
                    chain.phase = self.dash_toward(player_pos, tuning);
                    return BossSkill::DashChain(chain);
                }
                self.skill_cooldown = tuning.skill_cooldown;
                BossSkill::None
            }
        }
    }

    fn step_dive(
        &mut self,
        mut dive: DiveBomb,
        dt: f32,
        boss_tuning: &BossTuning,
        env: &mut BossEnv<'_>,
    ) -> BossSkill {
        let tuning = &boss_tuning.dive;
        dive.phase = match dive.phase {
            DivePhase::WindUp { timer } => {
                let timer = timer - dt;
                if timer <= 0.0 {
                    env.events.push(SimEvent::Sound(SoundCue::BossDive));
                    DivePhase::Ascend {
                        timer: tuning.ascend,
                    }
                } else {
                    DivePhase::WindUp { timer }
                }
            }
            DivePhase::Ascend { timer } => {
                self.pos.y -= tuning.ascend_speed * dt;
                let timer = timer - dt;
                self.alpha = (timer / tuning.ascend).clamp(0.0, 1.0);
                if timer <= 0.0 {
                    DivePhase::Telegraph {
                        timer: tuning.telegraph,
                        target: dive.origin,
                    }
                } else {
                    DivePhase::Ascend { timer }
                }
            }
            DivePhase::Telegraph { timer, mut target } => {
                let timer = timer - dt;
                if timer > tuning.freeze_window {
                    target += (env.player.pos - target) * tuning.follow_lerp;
                }
                if timer <= 0.0 {
                    self.pos = target - Vec2::new(0.0, tuning.descend_height);
                    self.alpha = 1.0;
                    DivePhase::Descend { target }
                } else {
                    DivePhase::Telegraph { timer, target }
                }
            }
            DivePhase::Descend { target } => {
                let to_target = target - self.pos;
                let distance = to_target.length();
                if distance * distance < tuning.land_epsilon * tuning.land_epsilon {
                    self.pos = target;
                    self.resolve_impact(target, tuning, env);
                    DivePhase::Landing {
                        timer: tuning.landing,
                    }
                } else {
                    let step = (tuning.descend_speed * dt).min(distance);
                    self.pos += to_target / distance * step;
                    DivePhase::Descend { target }
                }
            }
            DivePhase::Landing { timer } => {
                let timer = timer - dt;
                if timer <= 0.0 {
                    self.alpha = 1.0;
                    self.skill_cooldown = boss_tuning.skill_cooldown;
                    return BossSkill::None;
                }
                DivePhase::Landing { timer }
            }
        };
        BossSkill::DiveBomb(dive)
    }

    /// Impact of a dive: a ring of enemy projectiles around `target` plus
    /// area damage to the player if within the telegraph radius (inclusive).
    pub fn resolve_impact(&mut self, target: Vec2, tuning: &DiveTuning, env: &mut BossEnv<'_>) {
        let count = tuning.ring_count.max(1);
        for i in 0..count {
            let angle = std::f32::consts::TAU * i as f32 / count as f32;
            env.projectiles
                .spawn(target, angle, tuning.ring_speed, self.damage, Owner::Enemy);
        }

        let radius_sq = tuning.telegraph_radius * tuning.telegraph_radius;
        if env.player.pos.distance_squared(target) <= radius_sq && !env.player.is_invincible() {
            let before = env.stats.hp;
            let fatal = env
                .player
                .take_damage(self.damage * tuning.aoe_multiplier, env.stats);
            if env.stats.hp < before {
                env.events.push(SimEvent::PlayerDamaged {
                    amount: before - env.stats.hp,
                    hp: env.stats.hp,
                });
            }
            if fatal {
                env.events.push(SimEvent::PlayerDied);
                env.events.push(SimEvent::Sound(SoundCue::PlayerDeath));
            }
        }

        let (intensity, duration) = tuning.impact_shake;
        env.events.push(SimEvent::CameraShake {
            intensity,
            duration,
        });
        env.events.push(SimEvent::Sound(SoundCue::BossImpact));
    }
}

impl Collider for Boss {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    fn bob_offset(&self) -> f32 {
        self.bob_offset
    }

    fn is_alive(&self) -> bool {
        !self.dead && self.hp > 0.0
    }
}

// ── Roster ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct BossSystem {
    roster: Vec<Boss>,
    current: Option<usize>,
    templates: Vec<BossTemplate>,
    pub tuning: BossTuning,
}

impl BossSystem {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            roster: Vec::new(),
            current: None,
            templates: config.bosses.clone(),
            tuning: config.boss_tuning.clone(),
        }
    }

    /// Spawns boss `name` at `pos` and makes it current. Unknown names are
    /// logged and yield `None`.
    pub fn spawn(&mut self, name: &str, pos: Vec2) -> Option<usize> {
        let Some(template) = self.templates.iter().find(|t| t.name == name) else {
            log::warn!("spawn requested for unknown boss '{name}'");
            return None;
        };
        let boss = Boss::from_template(template, pos, &self.tuning);
        self.roster.push(boss);
        let id = self.roster.len() - 1;
        self.current = Some(id);
        log::info!("boss {name} spawned");
        Some(id)
    }

    pub fn despawn_all(&mut self) {
        self.roster.clear();
        self.current = None;
    }

    pub fn bosses(&self) -> &[Boss] {
        &self.roster
    }

    pub fn get_mut(&mut self, id: usize) -> Option<&mut Boss> {
        self.roster.get_mut(id)
    }

    pub fn current_id(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&Boss> {
        self.current.and_then(|i| self.roster.get(i))
    }

    pub fn current_mut(&mut self) -> Option<&mut Boss> {
        self.current.and_then(|i| self.roster.get_mut(i))
    }

    /// Position of the current boss if it may be targeted right now.
    pub fn attackable_target(&self) -> Option<Vec2> {
        self.current()
            .filter(|b| b.is_attackable())
            .map(|b| b.pos)
    }

    pub fn update(&mut self, dt: f32, env: &mut BossEnv<'_>, rng: &mut impl Rng) {
        for (id, boss) in self.roster.iter_mut().enumerate() {
            boss.update(dt, &self.tuning, env, rng);
            if !boss.dead {
                env.grid.register(GridObject::Boss(id), boss.pos);
            }
        }
    }
}
