//! Tunables and content tables.
//!
//! `SimConfig::default()` is the shipped tuning. A JSON file may override any
//! subset of it; every section falls back to its defaults field by field.

use std::path::{Path, PathBuf};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ── World ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Side of the square world the camera may roam.
    pub world_size: f32,
    pub center: Vec2,
    pub radius: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            world_size: 2800.0,
            center: Vec2::new(1400.0, 1700.0),
            radius: 1000.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub cell_size: f32,
    /// Extra slack added to the centre-distance prefilter of player queries.
    pub player_query_slack: f32,
    /// Extra slack for projectile queries.
    pub projectile_query_slack: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: 200.0,
            player_query_slack: 50.0,
            projectile_query_slack: 30.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub enemies: usize,
    pub projectiles: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            enemies: 300,
            projectiles: 500,
        }
    }
}

// ── Player ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub width: f32,
    pub height: f32,
    pub attack_range: f32,
    pub projectile_speed: f32,
    pub post_revive_invincibility: f32,
    pub revive_heal_ratio: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            width: 96.0,
            height: 96.0,
            attack_range: 400.0,
            projectile_speed: 500.0,
            post_revive_invincibility: 3.0,
            revive_heal_ratio: 0.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    pub speed: f32,
    pub duration: f32,
    /// Seconds to refill one charge.
    pub cooldown: f32,
    /// Charges before dash upgrades.
    pub base_charges: u32,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            speed: 750.0,
            duration: 0.25,
            cooldown: 2.0,
            base_charges: 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeathConfig {
    /// Length of the death animation (7 frames at 0.5 s).
    pub dying_duration: f32,
    /// Hold before the revive prompt starts when revives remain.
    pub revive_wait: f32,
    /// Hold before game over when no revives remain.
    pub final_wait: f32,
    pub prompt_text: String,
    pub prompt_char_interval: f32,
    /// Hold after the prompt finished typing.
    pub prompt_hold: f32,
    /// Length of the revive animation (5 frames at 0.1 s).
    pub reviving_duration: f32,
    pub max_zoom: f32,
}

impl Default for DeathConfig {
    fn default() -> Self {
        Self {
            dying_duration: 3.5,
            revive_wait: 3.0,
            final_wait: 5.0,
            prompt_text: "?".to_string(),
            prompt_char_interval: 0.05,
            prompt_hold: 2.0,
            reviving_duration: 0.5,
            max_zoom: 2.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClearConfig {
    pub center_hold: f32,
    pub zoom_duration: f32,
    pub zoom_target: f32,
    pub victory_hold: f32,
    pub victory_text: String,
}

impl Default for ClearConfig {
    fn default() -> Self {
        Self {
            center_hold: 1.0,
            zoom_duration: 1.0,
            zoom_target: 2.5,
            victory_hold: 5.0,
            victory_text: "HUNTED".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub viewport: Vec2,
    pub follow_lerp: f32,
    /// Squared distance under which the camera counts as arrived.
    pub reach_epsilon_sq: f32,
    pub screen_shake: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            viewport: Vec2::new(1280.0, 720.0),
            follow_lerp: 0.15,
            reach_epsilon_sq: 100.0,
            screen_shake: true,
        }
    }
}

// ── Combat ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub enemy_contact_cooldown: f32,
    pub boss_contact_cooldown: f32,
    pub boss_hit_cooldown: f32,
    pub hit_tint: f32,
    pub hit_shake_duration: f32,
    pub hit_shake_intensity: f32,
    pub kill_shake: (f32, f32),
    pub boss_kill_entropy: u32,
    pub kills_per_entropy: u32,
    pub projectile_lifetime: f32,
    pub player_projectile_size: f32,
    pub enemy_projectile_size: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            enemy_contact_cooldown: 1.0,
            boss_contact_cooldown: 1.0,
            boss_hit_cooldown: 0.1,
            hit_tint: 0.25,
            hit_shake_duration: 0.25,
            hit_shake_intensity: 14.0,
            kill_shake: (8.0, 0.2),
            boss_kill_entropy: 10,
            kills_per_entropy: 30,
            projectile_lifetime: 3.0,
            player_projectile_size: 8.0,
            enemy_projectile_size: 12.0,
        }
    }
}

// ── Boss ──────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashChainTuning {
    pub min_dashes: u32,
    pub max_dashes: u32,
    pub duration: f32,
    pub speed_multiplier: f32,
    /// Pause between two dashes of the same chain.
    pub chain_pause: f32,
    /// Pause after the last dash, before the skill resolves.
    pub final_pause: f32,
    pub contact_multiplier: f32,
    pub contact_cooldown: f32,
}

impl Default for DashChainTuning {
    fn default() -> Self {
        Self {
            min_dashes: 1,
            max_dashes: 3,
            duration: 0.9,
            speed_multiplier: 15.0,
            chain_pause: 0.2,
            final_pause: 1.0,
            contact_multiplier: 5.0,
            contact_cooldown: 0.1,
        }
    }
}

/// Dive-bomb timings. The telegraph follows the player while more than
/// `freeze_window` seconds remain, then holds still until it expires.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiveTuning {
    pub windup: f32,
    pub ascend: f32,
    pub ascend_speed: f32,
    pub telegraph: f32,
    pub freeze_window: f32,
    pub follow_lerp: f32,
    pub telegraph_radius: f32,
    pub descend_height: f32,
    pub descend_speed: f32,
    pub land_epsilon: f32,
    pub landing: f32,
    pub ring_count: u32,
    pub ring_speed: f32,
    pub aoe_multiplier: f32,
    pub windup_shake: (f32, f32),
    pub impact_shake: (f32, f32),
    pub landing_jitter: f32,
}

impl Default for DiveTuning {
    fn default() -> Self {
        Self {
            windup: 2.0,
            ascend: 1.0,
            ascend_speed: 3000.0,
            telegraph: 5.0,
            freeze_window: 0.5,
            follow_lerp: 0.15,
            telegraph_radius: 150.0,
            descend_height: 200.0,
            descend_speed: 2000.0,
            land_epsilon: 10.0,
            landing: 3.0,
            ring_count: 16,
            ring_speed: 300.0,
            aoe_multiplier: 2.0,
            windup_shake: (10.0, 0.2),
            impact_shake: (20.0, 0.5),
            landing_jitter: 5.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossTuning {
    pub skill_cooldown: f32,
    pub bob_speed: f32,
    pub bob_amount: f32,
    pub dash: DashChainTuning,
    pub dive: DiveTuning,
}

impl Default for BossTuning {
    fn default() -> Self {
        Self {
            skill_cooldown: 5.0,
            bob_speed: 4.0,
            bob_amount: 15.0,
            dash: DashChainTuning::default(),
            dive: DiveTuning::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BossSkillKind {
    DashChain,
    DiveBomb,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BossTemplate {
    pub name: String,
    pub hp: f32,
    pub damage: f32,
    pub speed: f32,
    pub gold: u32,
    pub exp: u32,
    pub width: f32,
    pub height: f32,
    pub skills: Vec<BossSkillKind>,
}

// ── Enemies ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChargeTemplate {
    /// Seconds between charges.
    pub cooldown: f32,
    pub speed: f32,
    pub duration: f32,
    /// Tinted warning window before a charge.
    pub windup: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyTemplate {
    pub name: String,
    pub category: String,
    pub hp: f32,
    pub damage: f32,
    pub speed: f32,
    pub gold: u32,
    pub exp: u32,
    pub width: f32,
    pub height: f32,
    pub render_size: f32,
    pub attack_range: f32,
    pub attack_cooldown: f32,
    #[serde(default = "default_frame_count")]
    pub frame_count: u32,
    #[serde(default = "default_frame_time")]
    pub frame_time: f32,
    #[serde(default)]
    pub charge: Option<ChargeTemplate>,
}

fn default_frame_count() -> u32 {
    4
}

fn default_frame_time() -> f32 {
    0.15
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnRule {
    pub enemy: String,
    pub interval: f32,
    /// Enemies per batch before adding the wave number.
    pub base_count: u32,
}

// ── Weapons ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeaponTemplate {
    pub id: String,
    pub name: String,
    pub damage: f32,
    pub crit_rate: f32,
    pub crit_damage: f32,
    pub cooldown: f32,
    pub knockback: f32,
    pub range: f32,
    #[serde(default)]
    pub rotating: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponTuning {
    pub slots: usize,
    pub orbit_radius: f32,
    pub fire_speed: f32,
    pub return_speed: f32,
    pub hit_cooldown: f32,
    pub arrive_epsilon_sq: f32,
    pub knockback_scale: f32,
    pub max_grade: u8,
    pub grade_multiplier: f32,
    pub merge_range_multiplier: f32,
    pub merge_cooldown_multiplier: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for WeaponTuning {
    fn default() -> Self {
        Self {
            slots: 6,
            orbit_radius: 50.0,
            fire_speed: 800.0,
            return_speed: 1000.0,
            hit_cooldown: 0.1,
            arrive_epsilon_sq: 25.0,
            knockback_scale: 10.0,
            max_grade: 4,
            grade_multiplier: 1.2,
            merge_range_multiplier: 1.4,
            merge_cooldown_multiplier: 0.96,
            width: 48.0,
            height: 48.0,
        }
    }
}

// ── Waves ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    pub duration: f32,
    pub spawn_radius: f32,
    pub min_spawn_distance: f32,
    pub spawn_attempts: u32,
    pub spawn_delay: f32,
    /// An emptied wave may end once both timers pass these marks.
    pub early_end_wave_time: f32,
    pub early_end_spawn_time: f32,
    pub clear_banner: f32,
    pub next_wave_heal_ratio: f32,
    pub scale_per_wave: f32,
    pub boss: String,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            duration: 60.0,
            spawn_radius: 900.0,
            min_spawn_distance: 600.0,
            spawn_attempts: 20,
            spawn_delay: 1.0,
            early_end_wave_time: 2.0,
            early_end_spawn_time: 1.0,
            clear_banner: 3.0,
            next_wave_heal_ratio: 0.3,
            scale_per_wave: 0.1,
            boss: "michael".to_string(),
        }
    }
}

// ── Root ──────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub arena: ArenaConfig,
    pub grid: GridConfig,
    pub pools: PoolConfig,
    pub player: PlayerConfig,
    pub dash: DashConfig,
    pub death: DeathConfig,
    pub clear: ClearConfig,
    pub camera: CameraConfig,
    pub combat: CombatConfig,
    pub boss_tuning: BossTuning,
    pub weapon_tuning: WeaponTuning,
    pub waves: WaveConfig,
    pub enemy_types: Vec<EnemyTemplate>,
    pub bosses: Vec<BossTemplate>,
    pub weapons: Vec<WeaponTemplate>,
    pub spawn_schedule: Vec<SpawnRule>,
    pub starting_weapon: Option<String>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            arena: ArenaConfig::default(),
            grid: GridConfig::default(),
            pools: PoolConfig::default(),
            player: PlayerConfig::default(),
            dash: DashConfig::default(),
            death: DeathConfig::default(),
            clear: ClearConfig::default(),
            camera: CameraConfig::default(),
            combat: CombatConfig::default(),
            boss_tuning: BossTuning::default(),
            weapon_tuning: WeaponTuning::default(),
            waves: WaveConfig::default(),
            enemy_types: default_enemy_types(),
            bosses: default_bosses(),
            weapons: default_weapons(),
            spawn_schedule: default_spawn_schedule(),
            starting_weapon: Some("vorpal-sword".to_string()),
        }
    }
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn enemy_type(&self, name: &str) -> Option<&EnemyTemplate> {
        self.enemy_types.iter().find(|t| t.name == name)
    }

    pub fn boss(&self, name: &str) -> Option<&BossTemplate> {
        self.bosses.iter().find(|b| b.name == name)
    }

    pub fn weapon(&self, id: &str) -> Option<&WeaponTemplate> {
        self.weapons.iter().find(|w| w.id == id)
    }

    /// Rejects values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.cell_size <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "grid cell size must be positive, got {}",
                self.grid.cell_size
            )));
        }
        if self.arena.radius <= 0.0 || self.arena.world_size <= 0.0 {
            return Err(ConfigError::Invalid(
                "arena radius and world size must be positive".to_string(),
            ));
        }
        if self.pools.enemies == 0 || self.pools.projectiles == 0 {
            return Err(ConfigError::Invalid("pool sizes must be non-zero".to_string()));
        }
        if self.weapon_tuning.slots == 0 || self.weapon_tuning.max_grade == 0 {
            return Err(ConfigError::Invalid(
                "weapon slots and max grade must be non-zero".to_string(),
            ));
        }
        let dive = &self.boss_tuning.dive;
        let shakes = [
            ("combat.kill_shake", self.combat.kill_shake.0),
            ("combat.hit_shake_intensity", self.combat.hit_shake_intensity),
            ("boss_tuning.dive.windup_shake", dive.windup_shake.0),
            ("boss_tuning.dive.impact_shake", dive.impact_shake.0),
            ("boss_tuning.dive.landing_jitter", dive.landing_jitter),
        ];
        for (name, value) in shakes {
            // also catches NaN
            if !(value >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must not be negative, got {value}"
                )));
            }
        }
        for rule in &self.spawn_schedule {
            if self.enemy_type(&rule.enemy).is_none() {
                return Err(ConfigError::Invalid(format!(
                    "spawn schedule names unknown enemy type '{}'",
                    rule.enemy
                )));
            }
            if rule.interval <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "spawn interval for '{}' must be positive",
                    rule.enemy
                )));
            }
        }
        if self.boss(&self.waves.boss).is_none() {
            return Err(ConfigError::Invalid(format!(
                "boss wave names unknown boss '{}'",
                self.waves.boss
            )));
        }
        if let Some(id) = &self.starting_weapon {
            if self.weapon(id).is_none() {
                return Err(ConfigError::Invalid(format!(
                    "starting weapon '{id}' is not in the weapon table"
                )));
            }
        }
        Ok(())
    }
}

// ── Shipped content ───────────────────────────────────────────────────────────

fn default_enemy_types() -> Vec<EnemyTemplate> {
    vec![
        EnemyTemplate {
            name: "malakh".to_string(),
            category: "heaven".to_string(),
            hp: 50.0,
            damage: 5.0,
            speed: 150.0,
            gold: 2,
            exp: 5,
            width: 100.0,
            height: 100.0,
            render_size: 230.0,
            attack_range: 40.0,
            attack_cooldown: 1.5,
            frame_count: 4,
            frame_time: 0.15,
            charge: None,
        },
        EnemyTemplate {
            name: "power".to_string(),
            category: "heaven".to_string(),
            hp: 80.0,
            damage: 7.0,
            speed: 180.0,
            gold: 3,
            exp: 7,
            width: 100.0,
            height: 100.0,
            render_size: 240.0,
            attack_range: 40.0,
            attack_cooldown: 1.5,
            frame_count: 4,
            frame_time: 0.15,
            charge: Some(ChargeTemplate {
                cooldown: 3.0,
                speed: 1000.0,
                duration: 0.8,
                windup: 0.5,
            }),
        },
        EnemyTemplate {
            name: "dominion".to_string(),
            category: "heaven".to_string(),
            hp: 120.0,
            damage: 8.0,
            speed: 150.0,
            gold: 4,
            exp: 10,
            width: 130.0,
            height: 130.0,
            render_size: 280.0,
            attack_range: 50.0,
            attack_cooldown: 1.5,
            frame_count: 4,
            frame_time: 0.15,
            charge: None,
        },
    ]
}

fn default_bosses() -> Vec<BossTemplate> {
    vec![BossTemplate {
        name: "michael".to_string(),
        hp: 140_000.0,
        damage: 30.0,
        speed: 50.0,
        gold: 150,
        exp: 80,
        width: 400.0,
        height: 400.0,
        skills: vec![BossSkillKind::DashChain, BossSkillKind::DiveBomb],
    }]
}

fn weapon(
    id: &str,
    name: &str,
    stats: (f32, f32, f32, f32, f32, f32),
    rotating: bool,
) -> WeaponTemplate {
    let (damage, crit_rate, crit_damage, cooldown, knockback, range) = stats;
    WeaponTemplate {
        id: id.to_string(),
        name: name.to_string(),
        damage,
        crit_rate,
        crit_damage,
        cooldown,
        knockback,
        range,
        rotating,
    }
}

fn default_weapons() -> Vec<WeaponTemplate> {
    vec![
        weapon("seraphic-edge", "Seraphic Edge", (40.0, 0.2, 0.1, 2.0, 1.0, 300.0), false),
        weapon("vorpal-sword", "Vorpal Sword", (30.0, 0.3, 0.15, 1.0, 0.0, 300.0), false),
        weapon("durandal", "Durandal", (50.0, 0.05, 0.2, 2.5, 2.0, 300.0), false),
        weapon("estoc", "Estoc", (20.0, 0.5, 0.5, 1.0, 0.0, 200.0), false),
        weapon("morning-star", "Morning Star", (60.0, 0.0, 0.2, 3.0, 3.0, 200.0), false),
        weapon("guillotine", "Guillotine", (40.0, 0.2, 0.4, 2.0, 0.0, 250.0), true),
        weapon("longinus", "Longinus", (50.0, 0.4, 0.5, 2.5, 0.0, 350.0), false),
    ]
}

fn default_spawn_schedule() -> Vec<SpawnRule> {
    vec![
        SpawnRule {
            enemy: "malakh".to_string(),
            interval: 5.0,
            base_count: 4,
        },
        SpawnRule {
            enemy: "power".to_string(),
            interval: 5.0,
            base_count: 0,
        },
        SpawnRule {
            enemy: "dominion".to_string(),
            interval: 10.0,
            base_count: 1,
        },
    ]
}
