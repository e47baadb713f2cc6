//! Simulation core of a top-down wave survival game.
//!
//! Everything in here is pure game logic driven by `compute::SimulationContext`.
//! Rendering and input live in the binary.

pub mod arena;
pub mod boss;
pub mod camera;
pub mod collision;
pub mod compute;
pub mod config;
pub mod enemy;
pub mod entities;
pub mod events;
pub mod player;
pub mod pool;
pub mod progression;
pub mod projectile;
pub mod wave;
pub mod weapon;
