//! The player: movement, dash, auto-attack and the death, revive and
//! stage-clear state machines.

use glam::Vec2;
use rand::Rng;

use crate::arena::PlayArea;
use crate::collision::{Collider, HitboxKind};
use crate::config::{ClearConfig, DashConfig, DeathConfig, PlayerConfig, SimConfig};
use crate::enemy::EnemyPool;
use crate::entities::{Facing, InputState, Owner};
use crate::pool::Handle;
use crate::progression::StatBlock;
use crate::projectile::ProjectilePool;

// ── Dash charges ──────────────────────────────────────────────────────────────

/// Bank of dash charges; one charge comes back per cooldown interval.
#[derive(Clone, Debug, PartialEq)]
pub struct DashBank {
    pub charges: u32,
    pub max_charges: u32,
    pub cooldown: f32,
    pub cooldown_max: f32,
}

impl DashBank {
    pub fn new(max_charges: u32, cooldown_max: f32) -> Self {
        Self {
            charges: max_charges,
            max_charges,
            cooldown: 0.0,
            cooldown_max,
        }
    }

    pub fn update(&mut self, dt: f32) {
        if self.cooldown > 0.0 {
            self.cooldown -= dt;
        }
        if self.cooldown <= 0.0 {
            self.cooldown = 0.0;
            if self.charges < self.max_charges {
                self.charges += 1;
                self.cooldown = self.cooldown_max;
            }
        }
    }

    pub fn try_consume(&mut self) -> bool {
        if self.charges == 0 {
            return false;
        }
        self.charges -= 1;
        self.cooldown = self.cooldown_max;
        true
    }
}

// ── State machines ────────────────────────────────────────────────────────────

/// Typing "revive countdown" shown while dead with revives left.
#[derive(Clone, Debug, PartialEq)]
pub struct RevivePrompt {
    pub typed: usize,
    pub char_timer: f32,
    /// Time held after the text finished typing.
    pub hold: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClearPhase {
    /// Camera travels to the fallen boss.
    ConvergeOnBoss,
    HoldCenter { timer: f32 },
    ZoomIn { timer: f32 },
    VictoryHold { timer: f32 },
    Finished,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClearSequence {
    pub phase: ClearPhase,
    pub boss_pos: Vec2,
    pub camera_reached: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PlayerState {
    Normal,
    Dashing { remaining: f32, direction: Vec2 },
    Dying { timer: f32 },
    DeadWaiting { timer: f32, prompt: Option<RevivePrompt> },
    Reviving { timer: f32 },
    Clearing(ClearSequence),
}

/// What the owner of the player has to act on after an update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerSignal {
    None,
    DashStarted,
    Revived,
    /// Dead with no revives left and the final wait is over.
    GameOverDue,
    /// The clear cinematic has played out.
    ClearFinished,
}

// ── Player ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
    pub facing: Facing,
    pub state: PlayerState,
    pub dash: DashBank,
    pub last_dash_direction: Option<Vec2>,
    /// Post-revive grace; dashing is tracked by the state itself.
    pub invincible_timer: f32,
    pub revives: u32,
    pub attack_timer: f32,
    pub moving: bool,
    tuning: PlayerConfig,
    dash_tuning: DashConfig,
    death: DeathConfig,
    clear: ClearConfig,
}

impl Player {
    pub fn new(config: &SimConfig, spawn: Vec2, revives: u32, extra_dashes: u32) -> Self {
        Self {
            pos: spawn,
            width: config.player.width,
            height: config.player.height,
            facing: Facing::Right,
            state: PlayerState::Normal,
            dash: DashBank::new(config.dash.base_charges + extra_dashes, config.dash.cooldown),
            last_dash_direction: None,
            invincible_timer: 0.0,
            revives,
            attack_timer: 0.0,
            moving: false,
            tuning: config.player.clone(),
            dash_tuning: config.dash.clone(),
            death: config.death.clone(),
            clear: config.clear.clone(),
        }
    }

    pub fn is_dashing(&self) -> bool {
        matches!(self.state, PlayerState::Dashing { .. })
    }

    pub fn is_invincible(&self) -> bool {
        self.is_dashing() || self.invincible_timer > 0.0
    }

    /// Dying, dead or coming back.
    pub fn is_down(&self) -> bool {
        matches!(
            self.state,
            PlayerState::Dying { .. } | PlayerState::DeadWaiting { .. } | PlayerState::Reviving { .. }
        )
    }

    pub fn is_clearing(&self) -> bool {
        matches!(self.state, PlayerState::Clearing(_))
    }

    /// Gameplay collision size, also used for the boundary clamp.
    pub fn hitbox_size(&self) -> Vec2 {
        Vec2::new(self.width, self.height) * HitboxKind::Player.scale()
    }

    /// Applies `amount` minus defense (never below 1). Returns true when the
    /// hit was fatal. Ignored while invincible or down.
    pub fn take_damage(&mut self, amount: f32, stats: &mut StatBlock) -> bool {
        if self.is_invincible() || self.is_down() || self.is_clearing() {
            return false;
        }
        let actual = (amount - stats.defense).max(1.0);
        stats.hp = (stats.hp - actual).max(0.0);
        if stats.hp <= 0.0 {
            self.start_death();
            return true;
        }
        false
    }

    pub fn start_death(&mut self) {
        if self.is_down() {
            return;
        }
        log::info!("player died, {} revives left", self.revives);
        self.state = PlayerState::Dying { timer: 0.0 };
        self.moving = false;
    }

    /// Enters the clear cinematic. Takes over from any death state, so a
    /// boss killed on the tick the player fell still ends the stage.
    pub fn begin_clear(&mut self, boss_pos: Vec2) -> bool {
        if self.is_clearing() {
            return false;
        }
        if self.is_down() {
            log::info!("boss fell while the player was down, clearing anyway");
        }
        self.state = PlayerState::Clearing(ClearSequence {
            phase: ClearPhase::ConvergeOnBoss,
            boss_pos,
            camera_reached: false,
        });
        self.moving = false;
        true
    }

    pub fn notify_camera_reached(&mut self) {
        if let PlayerState::Clearing(seq) = &mut self.state {
            seq.camera_reached = true;
        }
    }

    pub fn clear_phase(&self) -> Option<ClearPhase> {
        match &self.state {
            PlayerState::Clearing(seq) => Some(seq.phase),
            _ => None,
        }
    }

    /// Camera zoom implied by the current state.
    pub fn camera_zoom(&self) -> f32 {
        let max = self.death.max_zoom;
        match &self.state {
            PlayerState::Dying { timer } => {
                1.0 + (max - 1.0) * (timer / self.death.dying_duration).min(1.0)
            }
            PlayerState::DeadWaiting { .. } => max,
            PlayerState::Reviving { timer } => {
                max - (max - 1.0) * (timer / self.death.reviving_duration).min(1.0)
            }
            PlayerState::Clearing(seq) => {
                let target = self.clear.zoom_target;
                match seq.phase {
                    ClearPhase::ZoomIn { timer } => {
                        1.0 + (target - 1.0) * (timer / self.clear.zoom_duration).min(1.0)
                    }
                    ClearPhase::VictoryHold { .. } | ClearPhase::Finished => target,
                    _ => 1.0,
                }
            }
            _ => 1.0,
        }
    }

    /// Typed part of the revive prompt, if it is showing.
    pub fn revive_prompt(&self) -> Option<&str> {
        match &self.state {
            PlayerState::DeadWaiting {
                prompt: Some(p), ..
            } => {
                let end = self
                    .death
                    .prompt_text
                    .char_indices()
                    .nth(p.typed)
                    .map(|(i, _)| i)
                    .unwrap_or(self.death.prompt_text.len());
                Some(&self.death.prompt_text[..end])
            }
            _ => None,
        }
    }

    pub fn victory_text(&self) -> Option<&str> {
        match self.clear_phase() {
            Some(ClearPhase::VictoryHold { .. }) | Some(ClearPhase::Finished) => {
                Some(&self.clear.victory_text)
            }
            _ => None,
        }
    }

    // ── Per-tick update ──────────────────────────────────────────────────────

    pub fn update(
        &mut self,
        dt: f32,
        input: &InputState,
        stats: &mut StatBlock,
        arena: &PlayArea,
    ) -> PlayerSignal {
        self.dash.update(dt);
        if self.invincible_timer > 0.0 {
            self.invincible_timer = (self.invincible_timer - dt).max(0.0);
        }

        match &mut self.state {
            PlayerState::Dying { timer } => {
                *timer += dt;
                if *timer >= self.death.dying_duration {
                    self.state = PlayerState::DeadWaiting {
                        timer: 0.0,
                        prompt: None,
                    };
                }
                return PlayerSignal::None;
            }
            PlayerState::DeadWaiting { .. } => return self.update_dead(dt),
            PlayerState::Reviving { timer } => {
                *timer += dt;
                if *timer >= self.death.reviving_duration {
                    self.finish_revive(stats);
                    return PlayerSignal::Revived;
                }
                return PlayerSignal::None;
            }
            PlayerState::Clearing(seq) => {
                return advance_clear(seq, dt, &self.clear);
            }
            PlayerState::Dashing {
                remaining,
                direction,
            } => {
                *remaining -= dt;
                if *remaining > 0.0 {
                    let delta = *direction * self.dash_tuning.speed * dt;
                    self.apply_move(delta, arena);
                    return PlayerSignal::None;
                }
                self.state = PlayerState::Normal;
            }
            PlayerState::Normal => {}
        }

        if input.dash_requested && self.dash.try_consume() {
            let direction = if input.movement != Vec2::ZERO {
                input.movement.normalize_or_zero()
            } else {
                self.last_dash_direction.unwrap_or(Vec2::X)
            };
            self.last_dash_direction = Some(direction);
            self.state = PlayerState::Dashing {
                remaining: self.dash_tuning.duration,
                direction,
            };
            self.apply_move(direction * self.dash_tuning.speed * dt, arena);
            return PlayerSignal::DashStarted;
        }

        let delta = input.movement * stats.move_speed * dt;
        self.apply_move(delta, arena);
        PlayerSignal::None
    }

    fn apply_move(&mut self, delta: Vec2, arena: &PlayArea) {
        self.moving = delta != Vec2::ZERO;
        if delta.x != 0.0 {
            self.facing = Facing::toward(delta.x);
        }
        let size = self.hitbox_size();
        self.pos = arena.clamp(self.pos + delta, size.x, size.y);
    }

    fn update_dead(&mut self, dt: f32) -> PlayerSignal {
        let has_revive = self.revives > 0;
        let PlayerState::DeadWaiting { timer, prompt } = &mut self.state else {
            return PlayerSignal::None;
        };
        *timer += dt;
        if !has_revive {
            if *timer >= self.death.final_wait {
                return PlayerSignal::GameOverDue;
            }
            return PlayerSignal::None;
        }
        if *timer < self.death.revive_wait {
            return PlayerSignal::None;
        }
        let text_len = self.death.prompt_text.chars().count();
        let p = prompt.get_or_insert(RevivePrompt {
            typed: 0,
            char_timer: 0.0,
            hold: 0.0,
        });
        if p.typed < text_len {
            p.char_timer += dt;
            while p.typed < text_len && p.char_timer >= self.death.prompt_char_interval {
                p.char_timer -= self.death.prompt_char_interval;
                p.typed += 1;
            }
            return PlayerSignal::None;
        }
        p.hold += dt;
        if p.hold >= self.death.prompt_hold {
            self.state = PlayerState::Reviving { timer: 0.0 };
        }
        PlayerSignal::None
    }

    fn finish_revive(&mut self, stats: &mut StatBlock) {
        self.revives = self.revives.saturating_sub(1);
        stats.hp = stats.max_hp * self.tuning.revive_heal_ratio;
        self.invincible_timer = self.tuning.post_revive_invincibility;
        self.state = PlayerState::Normal;
        log::info!("player revived, {} revives left", self.revives);
    }

    // ── Auto-attack ──────────────────────────────────────────────────────────

    /// Fires at the nearest enemy (or the attackable boss, if nearer) once
    /// per `1 / attack_speed` seconds. Returns the spawned projectile.
    pub fn auto_attack(
        &mut self,
        dt: f32,
        stats: &StatBlock,
        enemies: &EnemyPool,
        boss_target: Option<Vec2>,
        projectiles: &mut ProjectilePool,
        rng: &mut impl Rng,
    ) -> Option<Handle> {
        let interval = 1.0 / stats.attack_speed.max(0.1);
        self.attack_timer = (self.attack_timer + dt).min(interval);
        if self.attack_timer < interval {
            return None;
        }

        let range = self.tuning.attack_range;
        let mut target = enemies
            .nearest_within(self.pos, range)
            .map(|(_, pos, dist_sq)| (pos, dist_sq));
        if let Some(boss_pos) = boss_target {
            let dist_sq = boss_pos.distance_squared(self.pos);
            let closer = target.map_or(true, |(_, best)| dist_sq < best);
            if dist_sq <= range * range && closer {
                target = Some((boss_pos, dist_sq));
            }
        }
        let (target_pos, _) = target?;

        let offset = target_pos - self.pos;
        let angle = offset.y.atan2(offset.x);
        let mut damage = stats.attack;
        if rng.gen::<f32>() < stats.crit_rate {
            damage *= stats.crit_damage;
        }
        self.attack_timer = 0.0;
        Some(projectiles.spawn(
            self.pos,
            angle,
            self.tuning.projectile_speed,
            damage,
            Owner::Player,
        ))
    }
}

fn advance_clear(seq: &mut ClearSequence, dt: f32, clear: &ClearConfig) -> PlayerSignal {
    seq.phase = match seq.phase {
        ClearPhase::ConvergeOnBoss if seq.camera_reached => ClearPhase::HoldCenter { timer: 0.0 },
        ClearPhase::ConvergeOnBoss => ClearPhase::ConvergeOnBoss,
        ClearPhase::HoldCenter { timer } => {
            let timer = timer + dt;
            if timer >= clear.center_hold {
                ClearPhase::ZoomIn { timer: 0.0 }
            } else {
                ClearPhase::HoldCenter { timer }
            }
        }
        ClearPhase::ZoomIn { timer } => {
            let timer = timer + dt;
            if timer >= clear.zoom_duration {
                ClearPhase::VictoryHold { timer: 0.0 }
            } else {
                ClearPhase::ZoomIn { timer }
            }
        }
        ClearPhase::VictoryHold { timer } => {
            let timer = timer + dt;
            if timer >= clear.victory_hold {
                seq.phase = ClearPhase::Finished;
                return PlayerSignal::ClearFinished;
            }
            ClearPhase::VictoryHold { timer }
        }
        ClearPhase::Finished => ClearPhase::Finished,
    };
    PlayerSignal::None
}

impl Collider for Player {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}
