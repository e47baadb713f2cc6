//! Follow camera with screen shake.

use glam::Vec2;
use rand::Rng;

use crate::config::CameraConfig;

#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    /// Top-left corner of the view in world space.
    pub pos: Vec2,
    pub viewport: Vec2,
    pub zoom: f32,
    pub shake_offset: Vec2,
    shake_intensity: f32,
    shake_remaining: f32,
    follow_lerp: f32,
    reach_epsilon_sq: f32,
    shake_enabled: bool,
}

impl Camera {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            pos: Vec2::ZERO,
            viewport: config.viewport,
            zoom: 1.0,
            shake_offset: Vec2::ZERO,
            shake_intensity: 0.0,
            shake_remaining: 0.0,
            follow_lerp: config.follow_lerp,
            reach_epsilon_sq: config.reach_epsilon_sq,
            shake_enabled: config.screen_shake,
        }
    }

    /// World-space size of what is on screen at the current zoom.
    pub fn view_size(&self) -> Vec2 {
        self.viewport / self.zoom.max(0.01)
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.view_size() * 0.5
    }

    /// Jumps straight to `focus`.
    pub fn snap_to(&mut self, focus: Vec2, world_size: f32) {
        self.pos = self.clamped(focus - self.view_size() * 0.5, world_size);
    }

    pub fn shake(&mut self, intensity: f32, duration: f32) {
        if !self.shake_enabled || !(intensity > 0.0) {
            return;
        }
        // a weaker shake never cuts a stronger one short
        if intensity >= self.shake_intensity || self.shake_remaining <= 0.0 {
            self.shake_intensity = intensity;
            self.shake_remaining = duration;
        }
    }

    /// Eases toward `focus` and returns whether the view centre has
    /// arrived.
    pub fn update(
        &mut self,
        dt: f32,
        focus: Vec2,
        zoom: f32,
        world_size: f32,
        rng: &mut impl Rng,
    ) -> bool {
        self.zoom = zoom;
        let target = self.clamped(focus - self.view_size() * 0.5, world_size);
        self.pos += (target - self.pos) * self.follow_lerp;

        if self.shake_remaining > 0.0 {
            self.shake_remaining -= dt;
            let i = self.shake_intensity;
            self.shake_offset = Vec2::new(rng.gen_range(-i..=i), rng.gen_range(-i..=i));
        } else {
            self.shake_intensity = 0.0;
            self.shake_offset = Vec2::ZERO;
        }

        self.pos.distance_squared(target) < self.reach_epsilon_sq
    }

    fn clamped(&self, pos: Vec2, world_size: f32) -> Vec2 {
        let max = (Vec2::splat(world_size) - self.view_size()).max(Vec2::ZERO);
        pos.clamp(Vec2::ZERO, max)
    }
}
