/// Rendering layer: all terminal I/O lives here.
///
/// Each function receives a writer and an immutable view of the simulation.
/// The world is projected through the camera onto the terminal grid; one
/// cell covers `view_size / (cols, rows)` world units.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal,
    QueueableCommand,
};
use glam::Vec2;
use wave_survivor::compute::SimulationContext;
use wave_survivor::entities::{GameStatus, Owner, Stage};
use wave_survivor::player::ClearPhase;

// ── Colour palette ────────────────────────────────────────────────────────────

const C_RIM: Color = Color::DarkBlue;
const C_HUD: Color = Color::Yellow;
const C_HP: Color = Color::Red;
const C_PLAYER: Color = Color::White;
const C_PLAYER_INVINCIBLE: Color = Color::DarkGrey;
const C_ENEMY: Color = Color::Green;
const C_ENEMY_HIT: Color = Color::White;
const C_ENEMY_CHARGE: Color = Color::Red;
const C_BOSS: Color = Color::Magenta;
const C_TELEGRAPH: Color = Color::Red;
const C_PENDING: Color = Color::DarkRed;
const C_SHOT_PLAYER: Color = Color::Cyan;
const C_SHOT_ENEMY: Color = Color::Magenta;
const C_WEAPON: Color = Color::Yellow;
const C_HINT: Color = Color::DarkGrey;

/// Rows reserved above and below the play field.
const HUD_ROWS: u16 = 1;
const HINT_ROWS: u16 = 1;

/// Maps world positions onto terminal cells.
struct Projection {
    origin: Vec2,
    cell: Vec2,
    cols: u16,
    rows: u16,
}

impl Projection {
    fn new(sim: &SimulationContext, cols: u16, rows: u16) -> Self {
        let field_rows = rows.saturating_sub(HUD_ROWS + HINT_ROWS).max(1);
        let view = sim.camera.view_size();
        Self {
            origin: sim.view_origin(),
            cell: Vec2::new(view.x / cols.max(1) as f32, view.y / field_rows as f32),
            cols,
            rows: field_rows,
        }
    }

    fn to_cell(&self, pos: Vec2) -> Option<(u16, u16)> {
        let local = (pos - self.origin) / self.cell;
        if local.x < 0.0 || local.y < 0.0 {
            return None;
        }
        let (x, y) = (local.x as u16, local.y as u16);
        (x < self.cols && y < self.rows).then_some((x, y + HUD_ROWS))
    }
}

fn put<W: Write>(
    out: &mut W,
    proj: &Projection,
    pos: Vec2,
    glyph: &str,
    color: Color,
) -> std::io::Result<()> {
    if let Some((x, y)) = proj.to_cell(pos) {
        out.queue(cursor::MoveTo(x, y))?;
        out.queue(style::SetForegroundColor(color))?;
        out.queue(Print(glyph))?;
    }
    Ok(())
}

// ── Public entry points ───────────────────────────────────────────────────────

/// Render one complete frame of a running simulation.
pub fn render<W: Write>(
    out: &mut W,
    sim: &SimulationContext,
    cols: u16,
    rows: u16,
) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;
    let proj = Projection::new(sim, cols, rows);

    draw_rim(out, sim, &proj)?;
    draw_pending(out, sim, &proj)?;
    draw_enemies(out, sim, &proj)?;
    draw_boss(out, sim, &proj)?;
    draw_projectiles(out, sim, &proj)?;
    draw_weapons(out, sim, &proj)?;
    draw_player(out, sim, &proj)?;

    draw_hud(out, sim, cols)?;
    draw_banners(out, sim, cols, rows)?;
    draw_controls_hint(out, rows)?;

    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, rows.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

/// Title screen with stage selection.
pub fn render_menu<W: Write>(
    out: &mut W,
    selected: Stage,
    entropy: u32,
    cols: u16,
    rows: u16,
) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;
    let cx = cols / 2;
    let top = (rows / 2).saturating_sub(4);

    let title = "W A V E   S U R V I V O R";
    centered(out, cx, top, title, Color::Magenta)?;

    for (i, stage) in [Stage::Gate, Stage::Paradise].into_iter().enumerate() {
        let marker = if stage == selected { ">" } else { " " };
        let line = format!("{marker} {:<10} {:>2} waves", stage.name(), stage.max_waves());
        let color = if stage == selected {
            Color::Yellow
        } else {
            Color::DarkGrey
        };
        centered(out, cx, top + 2 + i as u16, &line, color)?;
    }

    centered(out, cx, top + 5, &format!("Entropy: {entropy}"), Color::Cyan)?;
    centered(out, cx, top + 7, "↑ ↓ : Choose   ENTER : Start   Q : Quit", C_HINT)?;

    out.queue(style::ResetColor)?;
    out.flush()?;
    Ok(())
}

// ── World ─────────────────────────────────────────────────────────────────────

fn draw_rim<W: Write>(
    out: &mut W,
    sim: &SimulationContext,
    proj: &Projection,
) -> std::io::Result<()> {
    let arena = &sim.arena;
    // enough samples for one point per cell along the visible arc
    let samples = ((std::f32::consts::TAU * arena.radius) / proj.cell.x.max(1.0)) as usize;
    for i in 0..samples.max(16) {
        let angle = std::f32::consts::TAU * i as f32 / samples.max(16) as f32;
        put(out, proj, arena.center + Vec2::from_angle(angle) * arena.radius, "·", C_RIM)?;
    }
    Ok(())
}

fn draw_pending<W: Write>(
    out: &mut W,
    sim: &SimulationContext,
    proj: &Projection,
) -> std::io::Result<()> {
    for spawn in sim.waves.pending_spawns() {
        put(out, proj, spawn.pos, "x", C_PENDING)?;
    }
    Ok(())
}

fn draw_enemies<W: Write>(
    out: &mut W,
    sim: &SimulationContext,
    proj: &Projection,
) -> std::io::Result<()> {
    for (_, enemy) in sim.enemies.iter() {
        let glyph = match enemy.kind.chars().next() {
            Some(c) => c.to_ascii_lowercase().to_string(),
            None => "e".to_string(),
        };
        let color = if enemy.is_tinted() {
            C_ENEMY_HIT
        } else if enemy.is_charging() || enemy.is_winding_up() {
            C_ENEMY_CHARGE
        } else {
            C_ENEMY
        };
        let pos = enemy.pos + Vec2::new(0.0, enemy.bob_offset);
        put(out, proj, pos, &glyph, color)?;
    }
    Ok(())
}

fn draw_boss<W: Write>(
    out: &mut W,
    sim: &SimulationContext,
    proj: &Projection,
) -> std::io::Result<()> {
    let Some(boss) = sim.bosses.current() else {
        return Ok(());
    };

    if let Some(target) = boss.telegraph_target() {
        let radius = sim.config.boss_tuning.dive.telegraph_radius;
        for i in 0..24 {
            let angle = std::f32::consts::TAU * i as f32 / 24.0;
            put(out, proj, target + Vec2::from_angle(angle) * radius, "*", C_TELEGRAPH)?;
        }
        put(out, proj, target, "+", C_TELEGRAPH)?;
    }

    if boss.is_hidden() || boss.dead {
        return Ok(());
    }
    let pos = boss.pos + Vec2::new(0.0, boss.bob_offset);
    put(out, proj, pos, "M", C_BOSS)?;

    // hp bar under the boss, ten cells wide
    if let Some((x, y)) = proj.to_cell(pos) {
        let filled = ((boss.hp / boss.max_hp).clamp(0.0, 1.0) * 10.0).ceil() as usize;
        let bar = format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled));
        out.queue(cursor::MoveTo(x.saturating_sub(5), y + 1))?;
        out.queue(style::SetForegroundColor(C_HP))?;
        out.queue(Print(bar))?;
    }
    Ok(())
}

fn draw_projectiles<W: Write>(
    out: &mut W,
    sim: &SimulationContext,
    proj: &Projection,
) -> std::io::Result<()> {
    for (_, shot) in sim.projectiles.iter() {
        let (glyph, color) = match shot.owner {
            Owner::Player => ("•", C_SHOT_PLAYER),
            Owner::Enemy => ("o", C_SHOT_ENEMY),
        };
        put(out, proj, shot.pos, glyph, color)?;
    }
    Ok(())
}

fn draw_weapons<W: Write>(
    out: &mut W,
    sim: &SimulationContext,
    proj: &Projection,
) -> std::io::Result<()> {
    for weapon in sim.arsenal.weapons() {
        let glyph = if weapon.rotating { "✦" } else { "†" };
        put(out, proj, weapon.pos, glyph, C_WEAPON)?;
    }
    Ok(())
}

fn draw_player<W: Write>(
    out: &mut W,
    sim: &SimulationContext,
    proj: &Projection,
) -> std::io::Result<()> {
    let player = &sim.player;
    let glyph = if player.is_down() { "X" } else { "@" };
    let color = if player.is_invincible() {
        C_PLAYER_INVINCIBLE
    } else {
        C_PLAYER
    };
    put(out, proj, player.pos, glyph, color)
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

fn draw_hud<W: Write>(out: &mut W, sim: &SimulationContext, cols: u16) -> std::io::Result<()> {
    let stats = &sim.progression.stats;
    let waves = &sim.waves;

    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(style::SetForegroundColor(C_HP))?;
    out.queue(Print(format!("HP {:>4.0}/{:<4.0}", stats.hp.max(0.0), stats.max_hp)))?;

    out.queue(style::SetForegroundColor(C_HUD))?;
    out.queue(Print(format!(
        "  Lv{} ({}/{})  Gold:{}  Ent:{}",
        sim.progression.level,
        sim.progression.exp,
        sim.progression.exp_to_next,
        sim.progression.gold,
        sim.progression.entropy
    )))?;

    let wave_str = if waves.boss_wave {
        format!("[ {} {}/{}  BOSS ]", sim.stage.name(), waves.current_wave, waves.max_wave)
    } else {
        format!(
            "[ {} {}/{}  {:>2.0}s ]",
            sim.stage.name(),
            waves.current_wave,
            waves.max_wave,
            waves.time_left()
        )
    };
    let lx = (cols / 2).saturating_sub(wave_str.chars().count() as u16 / 2);
    out.queue(cursor::MoveTo(lx, 0))?;
    out.queue(Print(&wave_str))?;

    let dash = &sim.player.dash;
    let right = format!(
        "Dash:{}{}  Revive:{}",
        "■".repeat(dash.charges as usize),
        "□".repeat(dash.max_charges.saturating_sub(dash.charges) as usize),
        sim.player.revives
    );
    let rx = cols.saturating_sub(right.chars().count() as u16 + 1);
    out.queue(cursor::MoveTo(rx, 0))?;
    out.queue(style::SetForegroundColor(Color::Cyan))?;
    out.queue(Print(&right))?;
    Ok(())
}

// ── Overlays ──────────────────────────────────────────────────────────────────

fn centered<W: Write>(
    out: &mut W,
    cx: u16,
    row: u16,
    msg: &str,
    color: Color,
) -> std::io::Result<()> {
    let col = cx.saturating_sub(msg.chars().count() as u16 / 2);
    out.queue(cursor::MoveTo(col, row))?;
    out.queue(style::SetForegroundColor(color))?;
    out.queue(Print(msg))?;
    Ok(())
}

fn draw_banners<W: Write>(
    out: &mut W,
    sim: &SimulationContext,
    cols: u16,
    rows: u16,
) -> std::io::Result<()> {
    let cx = cols / 2;
    let cy = rows / 2;

    if let Some(prompt) = sim.player.revive_prompt() {
        centered(out, cx, cy.saturating_sub(3), prompt, Color::White)?;
    }

    match sim.status {
        GameStatus::GameOver => {
            centered(out, cx, cy.saturating_sub(1), "╔════════════════════╗", Color::Red)?;
            centered(out, cx, cy, "║    GAME  OVER      ║", Color::Red)?;
            centered(out, cx, cy + 1, "╚════════════════════╝", Color::Red)?;
            let line = format!(
                "Wave {}   Entropy +{}",
                sim.waves.current_wave, sim.progression.entropy_earned_this_run
            );
            centered(out, cx, cy + 2, &line, Color::Yellow)?;
            centered(out, cx, cy + 3, "R - Menu  Q - Quit", Color::White)?;
            return Ok(());
        }
        GameStatus::Cleared => {
            centered(out, cx, cy, "S T A G E   C L E A R", Color::Yellow)?;
            let line = format!(
                "Gold {}   Entropy +{}",
                sim.progression.gold, sim.progression.entropy_earned_this_run
            );
            centered(out, cx, cy + 1, &line, Color::Yellow)?;
            centered(out, cx, cy + 2, "R - Menu  Q - Quit", Color::White)?;
            return Ok(());
        }
        GameStatus::Playing => {}
    }

    if let Some(ClearPhase::VictoryHold { .. }) = sim.player.clear_phase() {
        if let Some(text) = sim.player.victory_text() {
            centered(out, cx, cy.saturating_sub(2), text, Color::Red)?;
        }
    }

    if sim.wave_clear_timer.is_some() {
        let line = format!("WAVE {} CLEAR", sim.waves.current_wave);
        centered(out, cx, cy.saturating_sub(2), &line, Color::Yellow)?;
    } else if sim.awaiting_settlement {
        let line = format!("WAVE {} CLEAR", sim.waves.current_wave);
        centered(out, cx, cy.saturating_sub(2), &line, Color::Yellow)?;
        centered(out, cx, cy.saturating_sub(1), "ENTER : Next wave", Color::White)?;
    }
    Ok(())
}

// ── Controls hint (last row) ──────────────────────────────────────────────────

fn draw_controls_hint<W: Write>(out: &mut W, rows: u16) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(1, rows.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print("WASD / ←↑↓→ : Move   SPACE : Dash   R : Menu   Q : Quit"))?;
    Ok(())
}
