//! Uniform-grid broad phase and hitbox queries.
//!
//! The grid is rebuilt every tick: cleared once, then each live entity
//! registers itself while it updates. Queries only look at the 3x3 cells
//! around the querying entity. Detection is kept apart from effect; callers
//! decide what a hit does.

use glam::Vec2;

use crate::config::GridConfig;
use crate::pool::{Handle, Pool};

// ── Hitboxes ──────────────────────────────────────────────────────────────────

/// Collision role. Each role scales the visual size by its own factor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitboxKind {
    Player,
    Enemy,
    Boss,
    PlayerAttack,
    Item,
    Projectile,
}

impl HitboxKind {
    pub fn scale(self) -> f32 {
        match self {
            HitboxKind::Player => 0.3,
            HitboxKind::Enemy => 0.85,
            HitboxKind::Boss => 0.3,
            HitboxKind::PlayerAttack => 1.3,
            HitboxKind::Item => 2.0,
            HitboxKind::Projectile => 0.8,
        }
    }
}

/// Anything with a position and a visual size.
pub trait Collider {
    fn position(&self) -> Vec2;
    fn size(&self) -> Vec2;

    /// Vertical draw offset; only bosses bob.
    fn bob_offset(&self) -> f32 {
        0.0
    }

    /// Dead bodies are skipped by queries.
    fn is_alive(&self) -> bool {
        true
    }
}

/// Axis-aligned box, `pos` is the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Aabb {
    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Strict overlap: touching edges do not collide.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.pos.x < other.pos.x + other.size.x
            && self.pos.x + self.size.x > other.pos.x
            && self.pos.y < other.pos.y + other.size.y
            && self.pos.y + self.size.y > other.pos.y
    }
}

/// Gameplay box of `obj` in the given role. Pure in position, size, role and
/// (for bosses) bob offset.
pub fn hitbox(obj: &impl Collider, kind: HitboxKind) -> Aabb {
    let size = obj.size() * kind.scale();
    let mut center = obj.position();
    if kind == HitboxKind::Boss {
        center.y += obj.bob_offset();
    }
    Aabb {
        pos: center - size * 0.5,
        size,
    }
}

pub fn check_aabb(a: &Aabb, b: &Aabb) -> bool {
    a.overlaps(b)
}

/// Inclusive squared-distance test.
pub fn check_distance(a: Vec2, b: Vec2, max_distance: f32) -> bool {
    a.distance_squared(b) <= max_distance * max_distance
}

// ── Spatial grid ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridObject {
    Enemy(Handle),
    Boss(usize),
    Projectile(Handle),
}

#[derive(Clone, Debug, Default)]
pub struct GridCell {
    pub enemies: Vec<Handle>,
    pub bosses: Vec<usize>,
    pub projectiles: Vec<Handle>,
}

impl GridCell {
    fn clear(&mut self) {
        self.enemies.clear();
        self.bosses.clear();
        self.projectiles.clear();
    }
}

/// `Default` is an uninitialised grid: registration is a no-op.
#[derive(Clone, Debug, Default)]
pub struct SpatialGrid {
    cell_size: f32,
    cols: usize,
    rows: usize,
    cells: Vec<GridCell>,
}

impl SpatialGrid {
    pub fn new(world_size: f32, cell_size: f32) -> Self {
        let cols = (world_size / cell_size).ceil().max(1.0) as usize;
        let rows = cols;
        Self {
            cell_size,
            cols,
            rows,
            cells: vec![GridCell::default(); cols * rows],
        }
    }

    pub fn is_initialized(&self) -> bool {
        !self.cells.is_empty()
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Cell coordinate of a world point, clamped to the grid.
    pub fn world_to_grid(&self, pos: Vec2) -> (usize, usize) {
        let clamp = |v: f32, n: usize| -> usize {
            let i = (v / self.cell_size).floor();
            if i.is_nan() || i < 0.0 {
                0
            } else {
                (i as usize).min(n.saturating_sub(1))
            }
        };
        (clamp(pos.x, self.cols), clamp(pos.y, self.rows))
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    /// Adds `obj` to the cell containing `pos`, at most once per cell.
    pub fn register(&mut self, obj: GridObject, pos: Vec2) {
        if !self.is_initialized() {
            return;
        }
        let (cx, cy) = self.world_to_grid(pos);
        let cell = &mut self.cells[cy * self.cols + cx];
        match obj {
            GridObject::Enemy(h) => {
                if !cell.enemies.contains(&h) {
                    cell.enemies.push(h);
                }
            }
            GridObject::Boss(id) => {
                if !cell.bosses.contains(&id) {
                    cell.bosses.push(id);
                }
            }
            GridObject::Projectile(h) => {
                if !cell.projectiles.contains(&h) {
                    cell.projectiles.push(h);
                }
            }
        }
    }

    pub fn cell(&self, cx: usize, cy: usize) -> Option<&GridCell> {
        if cx >= self.cols || cy >= self.rows {
            return None;
        }
        self.cells.get(cy * self.cols + cx)
    }

    /// The 3x3 block of cells around `pos`, clipped at the grid edge.
    pub fn neighborhood(&self, pos: Vec2) -> impl Iterator<Item = &GridCell> + '_ {
        let (cx, cy) = if self.is_initialized() {
            self.world_to_grid(pos)
        } else {
            (0, 0)
        };
        let (cx, cy) = (cx as i64, cy as i64);
        (-1..=1i64)
            .flat_map(move |dy| (-1..=1i64).map(move |dx| (cx + dx, cy + dy)))
            .filter_map(move |(x, y)| {
                if x < 0 || y < 0 {
                    None
                } else {
                    self.cell(x as usize, y as usize)
                }
            })
    }

    /// Total registrations, for diagnostics.
    pub fn occupancy(&self) -> (usize, usize) {
        self.cells.iter().fold((0, 0), |(e, p), c| {
            (e + c.enemies.len() + c.bosses.len(), p + c.projectiles.len())
        })
    }
}

// ── Queries ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct CollisionSystem {
    pub grid: SpatialGrid,
    player_slack: f32,
    projectile_slack: f32,
}

impl CollisionSystem {
    pub fn new(world_size: f32, config: &GridConfig) -> Self {
        Self {
            grid: SpatialGrid::new(world_size, config.cell_size),
            player_slack: config.player_query_slack,
            projectile_slack: config.projectile_query_slack,
        }
    }

    /// First enemy near the player whose box overlaps the player's box.
    pub fn check_player_enemy_collision<E: Collider>(
        &self,
        player: &impl Collider,
        enemies: &Pool<E>,
    ) -> Option<Handle> {
        let player_box = hitbox(player, HitboxKind::Player);
        let player_pos = player.position();
        for cell in self.grid.neighborhood(player_pos) {
            for &handle in &cell.enemies {
                let Some(enemy) = enemies.get(handle) else {
                    continue;
                };
                let enemy_box = hitbox(enemy, HitboxKind::Enemy);
                let reach = (player_box.size.x + enemy_box.size.x) / 2.0 + self.player_slack;
                if !check_distance(player_pos, enemy.position(), reach) {
                    continue;
                }
                if check_aabb(&player_box, &enemy_box) {
                    return Some(handle);
                }
            }
        }
        None
    }

    /// Bosses skip the grid; the roster is scanned directly.
    pub fn check_player_boss_collision<B: Collider>(
        &self,
        player: &impl Collider,
        bosses: &[B],
    ) -> Option<usize> {
        let player_box = hitbox(player, HitboxKind::Player);
        bosses.iter().position(|boss| {
            if !boss.is_alive() {
                return false;
            }
            let boss_box = hitbox(boss, HitboxKind::Boss);
            let reach = (player_box.size.x + boss_box.size.x) / 2.0 + self.player_slack;
            check_distance(player.position(), boss.position(), reach)
                && check_aabb(&player_box, &boss_box)
        })
    }

    /// Every (projectile, enemy) pair that overlaps, for the given projectiles.
    pub fn check_projectile_collision<'a, P, E>(
        &self,
        projectiles: impl Iterator<Item = (Handle, &'a P)>,
        enemies: &Pool<E>,
    ) -> Vec<(Handle, Handle)>
    where
        P: Collider + 'a,
        E: Collider,
    {
        let mut hits = Vec::new();
        for (proj_handle, projectile) in projectiles {
            let proj_box = hitbox(projectile, HitboxKind::Projectile);
            for cell in self.grid.neighborhood(projectile.position()) {
                for &enemy_handle in &cell.enemies {
                    let Some(enemy) = enemies.get(enemy_handle) else {
                        continue;
                    };
                    let enemy_box = hitbox(enemy, HitboxKind::Enemy);
                    let reach =
                        (proj_box.size.x + enemy_box.size.x) / 2.0 + self.projectile_slack;
                    if check_distance(projectile.position(), enemy.position(), reach)
                        && check_aabb(&proj_box, &enemy_box)
                    {
                        hits.push((proj_handle, enemy_handle));
                    }
                }
            }
        }
        hits
    }
}
