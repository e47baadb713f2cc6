//! Stat block, permanent upgrades and the run economy (exp, gold, entropy).
//!
//! Stats are layered: `base + upgrade levels x step + bonus`. The computed
//! block is what the rest of the simulation reads and damages.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatBlock {
    pub max_hp: f32,
    pub hp: f32,
    pub hp_regen: f32,
    pub defense: f32,
    pub attack: f32,
    pub attack_speed: f32,
    pub crit_rate: f32,
    pub crit_damage: f32,
    pub move_speed: f32,
    pub luck: f32,
    pub mastery: f32,
}

impl StatBlock {
    /// Starting stats of a fresh character.
    pub fn starting() -> Self {
        Self {
            max_hp: 100.0,
            hp: 100.0,
            hp_regen: 1.0,
            defense: 0.0,
            attack: 10.0,
            attack_speed: 1.0,
            crit_rate: 0.05,
            crit_damage: 1.5,
            move_speed: 300.0,
            luck: 0.0,
            mastery: 0.0,
        }
    }

    pub fn get(&self, key: StatKey) -> f32 {
        match key {
            StatKey::MaxHp => self.max_hp,
            StatKey::HpRegen => self.hp_regen,
            StatKey::Defense => self.defense,
            StatKey::Attack => self.attack,
            StatKey::AttackSpeed => self.attack_speed,
            StatKey::CritRate => self.crit_rate,
            StatKey::CritDamage => self.crit_damage,
            StatKey::MoveSpeed => self.move_speed,
            StatKey::Luck => self.luck,
            StatKey::Mastery => self.mastery,
        }
    }

    pub fn get_mut(&mut self, key: StatKey) -> &mut f32 {
        match key {
            StatKey::MaxHp => &mut self.max_hp,
            StatKey::HpRegen => &mut self.hp_regen,
            StatKey::Defense => &mut self.defense,
            StatKey::Attack => &mut self.attack,
            StatKey::AttackSpeed => &mut self.attack_speed,
            StatKey::CritRate => &mut self.crit_rate,
            StatKey::CritDamage => &mut self.crit_damage,
            StatKey::MoveSpeed => &mut self.move_speed,
            StatKey::Luck => &mut self.luck,
            StatKey::Mastery => &mut self.mastery,
        }
    }

    pub fn regenerate(&mut self, dt: f32) {
        self.hp = (self.hp + self.hp_regen * dt).min(self.max_hp);
    }

    pub fn heal_ratio(&mut self, ratio: f32) {
        self.hp = (self.hp + self.max_hp * ratio).min(self.max_hp);
    }
}

/// Every stat except current hp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKey {
    MaxHp,
    HpRegen,
    Defense,
    Attack,
    AttackSpeed,
    CritRate,
    CritDamage,
    MoveSpeed,
    Luck,
    Mastery,
}

impl StatKey {
    pub const ALL: [StatKey; 10] = [
        StatKey::MaxHp,
        StatKey::HpRegen,
        StatKey::Defense,
        StatKey::Attack,
        StatKey::AttackSpeed,
        StatKey::CritRate,
        StatKey::CritDamage,
        StatKey::MoveSpeed,
        StatKey::Luck,
        StatKey::Mastery,
    ];

    fn slot(self) -> usize {
        self as usize
    }

    /// Gain per permanent upgrade level.
    pub fn upgrade_step(self) -> f32 {
        match self {
            StatKey::MaxHp => 20.0,
            StatKey::HpRegen => 0.5,
            StatKey::Defense => 2.0,
            StatKey::Attack => 5.0,
            StatKey::AttackSpeed => 0.2,
            StatKey::CritRate => 0.05,
            StatKey::CritDamage => 0.1,
            StatKey::MoveSpeed => 10.0,
            StatKey::Luck => 0.1,
            StatKey::Mastery => 0.1,
        }
    }

    /// Entropy price of one level.
    pub fn upgrade_cost(self) -> u32 {
        match self {
            StatKey::MaxHp => 2,
            StatKey::HpRegen => 1,
            StatKey::Defense => 2,
            StatKey::Attack => 2,
            StatKey::AttackSpeed => 2,
            StatKey::CritRate => 3,
            StatKey::CritDamage => 3,
            StatKey::MoveSpeed => 2,
            StatKey::Luck => 1,
            StatKey::Mastery => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpgradeKey {
    Stat(StatKey),
    ReviveCount,
    DashCharges,
}

pub const MAX_REVIVES: u32 = 2;
pub const MAX_EXTRA_DASHES: u32 = 1;
const REVIVE_COST: u32 = 10;
const DASH_COST: u32 = 10;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Upgrades {
    pub levels: [u32; 10],
    pub revive_count: u32,
    pub dash_charges: u32,
}

impl Upgrades {
    pub fn level(&self, key: StatKey) -> u32 {
        self.levels[key.slot()]
    }
}

// ── Progression ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Progression {
    pub base: StatBlock,
    pub upgrades: Upgrades,
    /// Run-scoped additions (weapons, level-up picks).
    pub bonus: StatBlock,
    pub stats: StatBlock,
    pub level: u32,
    pub exp: u32,
    pub exp_to_next: u32,
    pub skill_points: u32,
    pub gold: u32,
    /// Permanent currency spent on upgrades.
    pub entropy: u32,
    pub entropy_earned_this_run: u32,
    pub kills: u32,
    pub kills_per_entropy: u32,
}

impl Default for Progression {
    fn default() -> Self {
        Self::new(StatBlock::starting(), Upgrades::default())
    }
}

impl Progression {
    pub fn new(base: StatBlock, upgrades: Upgrades) -> Self {
        let mut p = Self {
            base,
            upgrades,
            bonus: StatBlock::default(),
            stats: base,
            level: 1,
            exp: 0,
            exp_to_next: 100,
            skill_points: 0,
            gold: 0,
            entropy: 0,
            entropy_earned_this_run: 0,
            kills: 0,
            kills_per_entropy: 30,
        };
        p.recalculate(false);
        p
    }

    /// Clears the run layer and refills hp. Upgrades and entropy persist.
    pub fn start_run(&mut self) {
        self.bonus = StatBlock::default();
        self.level = 1;
        self.exp = 0;
        self.exp_to_next = 100;
        self.skill_points = 0;
        self.gold = 0;
        self.kills = 0;
        self.entropy_earned_this_run = 0;
        self.recalculate(false);
    }

    /// Rebuilds `stats` from the three layers. With `preserve_ratio` the hp
    /// fraction survives a max-hp change, otherwise hp is refilled.
    pub fn recalculate(&mut self, preserve_ratio: bool) {
        let ratio = if self.stats.max_hp > 0.0 {
            (self.stats.hp / self.stats.max_hp).clamp(0.0, 1.0)
        } else {
            1.0
        };

        let mut next = StatBlock::default();
        for key in StatKey::ALL {
            let value = self.base.get(key)
                + self.upgrades.level(key) as f32 * key.upgrade_step()
                + self.bonus.get(key);
            *next.get_mut(key) = value;
        }
        next.max_hp = next.max_hp.max(1.0);
        next.attack = next.attack.max(0.0);
        next.attack_speed = next.attack_speed.max(0.1);
        next.crit_rate = next.crit_rate.max(0.0);
        next.crit_damage = next.crit_damage.max(1.0);
        next.move_speed = next.move_speed.max(0.0);
        next.hp = if preserve_ratio {
            next.max_hp * ratio
        } else {
            next.max_hp
        };
        self.stats = next;
    }

    pub fn apply_bonus_stat(&mut self, key: StatKey, amount: f32) {
        *self.bonus.get_mut(key) += amount;
        self.recalculate(true);
    }

    /// Adds experience scaled by mastery. Returns true if at least one level
    /// was gained.
    pub fn add_exp(&mut self, amount: u32) -> bool {
        let gained = (amount as f32 * (1.0 + self.stats.mastery)).floor() as u32;
        self.exp += gained;
        let mut leveled = false;
        while self.exp >= self.exp_to_next {
            self.exp -= self.exp_to_next;
            self.level += 1;
            self.skill_points += 1;
            self.exp_to_next = (100.0 * 1.2f32.powi(self.level as i32 - 1)).floor() as u32;
            leveled = true;
            log::info!("level up: {}", self.level);
        }
        leveled
    }

    /// Adds gold scaled by luck.
    pub fn add_gold(&mut self, amount: u32) {
        self.gold += (amount as f32 * (1.0 + self.stats.luck)).floor() as u32;
    }

    pub fn grant_entropy(&mut self, amount: u32) {
        self.entropy += amount;
        self.entropy_earned_this_run += amount;
    }

    /// Counts a kill; every `kills_per_entropy` kills pays one entropy.
    pub fn on_enemy_killed(&mut self) {
        self.kills += 1;
        if self.kills_per_entropy > 0 && self.kills % self.kills_per_entropy == 0 {
            self.grant_entropy(1);
        }
    }

    pub fn upgrade_cost(&self, key: UpgradeKey) -> u32 {
        match key {
            UpgradeKey::Stat(stat) => stat.upgrade_cost(),
            UpgradeKey::ReviveCount => REVIVE_COST,
            UpgradeKey::DashCharges => DASH_COST,
        }
    }

    /// Spends entropy on a permanent upgrade. False when unaffordable or
    /// already at its cap.
    pub fn buy_upgrade(&mut self, key: UpgradeKey) -> bool {
        let cost = self.upgrade_cost(key);
        if self.entropy < cost {
            return false;
        }
        match key {
            UpgradeKey::Stat(stat) => self.upgrades.levels[stat.slot()] += 1,
            UpgradeKey::ReviveCount => {
                if self.upgrades.revive_count >= MAX_REVIVES {
                    return false;
                }
                self.upgrades.revive_count += 1;
            }
            UpgradeKey::DashCharges => {
                if self.upgrades.dash_charges >= MAX_EXTRA_DASHES {
                    return false;
                }
                self.upgrades.dash_charges += 1;
            }
        }
        self.entropy -= cost;
        self.recalculate(true);
        true
    }
}
