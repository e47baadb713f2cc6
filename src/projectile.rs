//! Pooled ballistic projectiles for both sides.

use glam::Vec2;

use crate::arena::PlayArea;
use crate::collision::{Collider, GridObject, SpatialGrid};
use crate::config::CombatConfig;
use crate::entities::Owner;
use crate::pool::{Handle, Pool};

#[derive(Clone, Debug, PartialEq)]
pub struct Projectile {
    pub pos: Vec2,
    pub velocity: Vec2,
    pub damage: f32,
    pub width: f32,
    pub height: f32,
    pub lifetime: f32,
    pub max_lifetime: f32,
    pub owner: Owner,
}

impl Collider for Projectile {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

#[derive(Clone, Debug)]
pub struct ProjectilePool {
    pool: Pool<Projectile>,
    max_lifetime: f32,
    player_size: f32,
    enemy_size: f32,
}

impl ProjectilePool {
    pub fn new(capacity: usize, combat: &CombatConfig) -> Self {
        Self {
            pool: Pool::with_capacity(capacity),
            max_lifetime: combat.projectile_lifetime,
            player_size: combat.player_projectile_size,
            enemy_size: combat.enemy_projectile_size,
        }
    }

    /// Launches a projectile along `angle` (radians). Enemy shots are drawn
    /// larger so they read clearly.
    pub fn spawn(
        &mut self,
        pos: Vec2,
        angle: f32,
        speed: f32,
        damage: f32,
        owner: Owner,
    ) -> Handle {
        let size = match owner {
            Owner::Player => self.player_size,
            Owner::Enemy => self.enemy_size,
        };
        self.pool.spawn(Projectile {
            pos,
            velocity: Vec2::from_angle(angle) * speed,
            damage,
            width: size,
            height: size,
            lifetime: 0.0,
            max_lifetime: self.max_lifetime,
            owner,
        })
    }

    pub fn despawn(&mut self, handle: Handle) -> bool {
        self.pool.despawn(handle).is_some()
    }

    pub fn despawn_all(&mut self) {
        self.pool.clear();
    }

    pub fn get(&self, handle: Handle) -> Option<&Projectile> {
        self.pool.get(handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &Projectile)> {
        self.pool.iter()
    }

    pub fn owned_by(&self, owner: Owner) -> impl Iterator<Item = (Handle, &Projectile)> {
        self.pool.iter().filter(move |(_, p)| p.owner == owner)
    }

    pub fn active_count(&self) -> usize {
        self.pool.active_count()
    }

    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Integrates motion, expires old or escaped shots, registers the rest.
    pub fn update(&mut self, dt: f32, arena: &PlayArea, grid: &mut SpatialGrid) {
        let mut expired = Vec::new();
        for (handle, p) in self.pool.iter_mut() {
            p.pos += p.velocity * dt;
            p.lifetime += dt;
            if p.lifetime >= p.max_lifetime || !arena.in_world(p.pos) {
                expired.push(handle);
            } else {
                grid.register(GridObject::Projectile(handle), p.pos);
            }
        }
        for handle in expired {
            self.pool.despawn(handle);
        }
    }
}
