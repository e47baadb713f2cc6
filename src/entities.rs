//! Small shared types: pure data, no logic beyond trivial constructors.

use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    Player,
    Enemy,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    /// Facing used by actors that look toward a horizontal offset.
    /// Zero offset counts as right.
    pub fn toward(dx: f32) -> Self {
        if dx >= 0.0 {
            Facing::Right
        } else {
            Facing::Left
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Short stage, boss on wave 10.
    Gate,
    /// Full stage, boss on wave 20.
    Paradise,
}

impl Stage {
    pub fn max_waves(self) -> u32 {
        match self {
            Stage::Gate => 10,
            Stage::Paradise => 20,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::Gate => "Gate",
            Stage::Paradise => "Paradise",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Playing,
    GameOver,
    Cleared,
}

// ── Input snapshot ────────────────────────────────────────────────────────────

/// One tick worth of polled input.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputState {
    /// Unit-length (or zero) movement direction.
    pub movement: Vec2,
    /// Edge signal: true only on the tick the dash key went down.
    pub dash_requested: bool,
}

impl InputState {
    /// Builds input from 8-way axis values in {-1, 0, 1}; diagonals are
    /// normalised so they are not faster than straight moves.
    pub fn from_axes(x: i8, y: i8, dash_requested: bool) -> Self {
        let raw = Vec2::new(x.signum() as f32, y.signum() as f32);
        Self {
            movement: raw.normalize_or_zero(),
            dash_requested,
        }
    }

    pub fn idle() -> Self {
        Self::default()
    }
}
