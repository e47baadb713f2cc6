//! Circular playable region inside the square world.

use glam::Vec2;
use rand::Rng;

use crate::config::ArenaConfig;

/// Slack that keeps an object sitting exactly on the rim from being
/// projected again by rounding noise.
const RIM_TOLERANCE: f32 = 1e-3;

#[derive(Clone, Debug, PartialEq)]
pub struct PlayArea {
    pub world_size: f32,
    pub center: Vec2,
    pub radius: f32,
}

impl PlayArea {
    pub fn new(config: &ArenaConfig) -> Self {
        Self {
            world_size: config.world_size,
            center: config.center,
            radius: config.radius,
        }
    }

    /// Radius of the circle that encloses a `width` x `height` box.
    pub fn object_radius(width: f32, height: f32) -> f32 {
        (width * width + height * height).sqrt() / 2.0
    }

    /// Keeps an object of the given size inside the circle by pulling its
    /// centre back along the radial direction.
    pub fn clamp(&self, pos: Vec2, width: f32, height: f32) -> Vec2 {
        let object_radius = Self::object_radius(width, height);
        let offset = pos - self.center;
        let distance = offset.length();
        if distance + object_radius <= self.radius + RIM_TOLERANCE {
            return pos;
        }
        let allowed = (self.radius - object_radius).max(0.0);
        match offset.try_normalize() {
            Some(dir) => self.center + dir * allowed,
            None => self.center,
        }
    }

    pub fn contains(&self, pos: Vec2) -> bool {
        pos.distance_squared(self.center) <= self.radius * self.radius
    }

    /// Whether `pos` lies inside the rectangular world.
    pub fn in_world(&self, pos: Vec2) -> bool {
        pos.x >= 0.0 && pos.x <= self.world_size && pos.y >= 0.0 && pos.y <= self.world_size
    }

    /// Uniformly distributed point inside the circle.
    pub fn random_point(&self, rng: &mut impl Rng) -> Vec2 {
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let r = self.radius * rng.gen::<f32>().sqrt();
        self.center + Vec2::from_angle(angle) * r
    }
}
