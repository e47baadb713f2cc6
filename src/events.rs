//! Things that happened during a tick, for the host to react to.

use glam::Vec2;

/// Fire-and-forget audio triggers. The host may drop any of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoundCue {
    PlayerHit,
    PlayerDeath,
    Revive,
    Dash,
    EnemyKilled,
    BossDash,
    BossDive,
    BossImpact,
    BossDeath,
    WaveClear,
    StageClear,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SimEvent {
    PlayerDamaged { amount: f32, hp: f32 },
    PlayerDied,
    PlayerRevived { revives_left: u32 },
    EnemyKilled { kind: String, pos: Vec2 },
    LevelUp { level: u32 },
    WaveStarted { wave: u32, boss_wave: bool },
    WaveEnded { wave: u32 },
    /// The wave-clear banner finished; the host shows its interstitial and
    /// then calls `next_wave`.
    SettlementRequested { wave: u32 },
    BossSpawned { name: String },
    BossDefeated { name: String },
    CameraShake { intensity: f32, duration: f32 },
    Sound(SoundCue),
    GameOver { wave: u32, entropy_earned: u32 },
    GameClear { wave: u32, gold: u32 },
}

/// Makes sure each terminal callback fires at most once per run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TerminalLatch {
    game_over: bool,
    game_clear: bool,
}

impl TerminalLatch {
    /// True the first time only.
    pub fn claim_game_over(&mut self) -> bool {
        !std::mem::replace(&mut self.game_over, true)
    }

    /// True the first time only.
    pub fn claim_game_clear(&mut self) -> bool {
        !std::mem::replace(&mut self.game_clear, true)
    }

    pub fn is_handled(&self) -> bool {
        self.game_over || self.game_clear
    }
}
