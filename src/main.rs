mod display;

use std::collections::HashMap;
use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    terminal, ExecutableCommand,
};
use rand::thread_rng;

use wave_survivor::compute::SimulationContext;
use wave_survivor::config::SimConfig;
use wave_survivor::entities::{GameStatus, InputState, Stage};
use wave_survivor::events::SimEvent;
use wave_survivor::progression::Progression;

const FRAME: Duration = Duration::from_millis(16); // ≈60 FPS

/// Longest step fed to the simulation; a stalled terminal must not teleport
/// everything across the arena.
const MAX_DT: f32 = 0.05;

// ── Held-key input ────────────────────────────────────────────────────────────

/// A key counts as held if its last press/repeat event arrived within this
/// many frames. Classic terminals never send releases, and OS key repeat
/// (≥ 15 Hz) refreshes the key well inside 8 frames at 60 FPS.
const HOLD_WINDOW: u64 = 8;

/// Returns true if `key` was seen within the last `HOLD_WINDOW` frames.
fn is_held(key_frame: &HashMap<KeyCode, u64>, key: &KeyCode, frame: u64) -> bool {
    key_frame
        .get(key)
        .map(|&last| frame.saturating_sub(last) <= HOLD_WINDOW)
        .unwrap_or(false)
}

fn any_held(key_frame: &HashMap<KeyCode, u64>, keys: &[KeyCode], frame: u64) -> bool {
    keys.iter().any(|k| is_held(key_frame, k, frame))
}

fn read_input(key_frame: &HashMap<KeyCode, u64>, frame: u64, dash: bool) -> InputState {
    let left = any_held(key_frame, &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')], frame);
    let right = any_held(key_frame, &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')], frame);
    let up = any_held(key_frame, &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')], frame);
    let down = any_held(key_frame, &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')], frame);
    InputState::from_axes(
        right as i8 - left as i8,
        down as i8 - up as i8,
        dash,
    )
}

// ── Logging ───────────────────────────────────────────────────────────────────

/// The terminal is owned by the game, so log lines go to a file instead.
fn init_logging() -> anyhow::Result<PathBuf> {
    let path = std::env::temp_dir().join("wave_survivor.log");
    let file = File::create(&path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .context("initialising logger")?;
    Ok(path)
}

fn config_from_args() -> anyhow::Result<SimConfig> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            let path = args.next().context("--config needs a path")?;
            return SimConfig::from_path(&path)
                .with_context(|| format!("loading config from {path}"));
        }
    }
    Ok(SimConfig::default())
}

// ── Menu ──────────────────────────────────────────────────────────────────────

enum MenuResult {
    Start(Stage),
    Quit,
}

fn show_menu<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    entropy: u32,
) -> anyhow::Result<MenuResult> {
    let mut selected = Stage::Gate;
    loop {
        let (cols, rows) = terminal::size()?;
        display::render_menu(out, selected, entropy, cols, rows)?;

        // Block until the user makes a choice
        if let Ok(Event::Key(KeyEvent { code, kind: KeyEventKind::Press, .. })) = rx.recv() {
            match code {
                KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('1') => selected = Stage::Gate,
                KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('2') => {
                    selected = Stage::Paradise
                }
                KeyCode::Enter => return Ok(MenuResult::Start(selected)),
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                    return Ok(MenuResult::Quit);
                }
                _ => {}
            }
        }
    }
}

// ── Game loop ─────────────────────────────────────────────────────────────────

/// Returns `true` → quit program, `false` → back to menu.
///
/// Input model: a `key_frame` map records the frame of the last press/repeat
/// event for every key, and each frame reads which keys are still fresh.
/// Diagonal movement and dashing can be held together this way. Terminals
/// with keyboard enhancement report releases and drop keys immediately.
fn game_loop<W: Write>(
    out: &mut W,
    sim: &mut SimulationContext,
    rx: &mpsc::Receiver<Event>,
) -> anyhow::Result<bool> {
    let mut rng = thread_rng();
    let mut key_frame: HashMap<KeyCode, u64> = HashMap::new();
    let mut frame: u64 = 0;
    let mut last = Instant::now();

    loop {
        let frame_start = Instant::now();
        frame += 1;
        let mut dash = false;

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(Event::Key(KeyEvent { code, kind, modifiers, .. })) = rx.try_recv() {
            match kind {
                KeyEventKind::Press => {
                    key_frame.insert(code, frame);
                    match code {
                        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                            return Ok(true);
                        }
                        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                            return Ok(true);
                        }
                        KeyCode::Char('r') | KeyCode::Char('R')
                            if sim.status != GameStatus::Playing =>
                        {
                            return Ok(false);
                        }
                        // dash is edge-triggered so a held Space fires once
                        KeyCode::Char(' ') => dash = true,
                        KeyCode::Enter if sim.awaiting_settlement => {
                            sim.next_wave();
                        }
                        _ => {}
                    }
                }
                KeyEventKind::Repeat => {
                    key_frame.insert(code, frame);
                }
                KeyEventKind::Release => {
                    key_frame.remove(&code);
                }
            }
        }

        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32().min(MAX_DT);
        last = now;

        let input = read_input(&key_frame, frame, dash);
        sim.tick(dt, &input, &mut rng);

        for event in sim.drain_events() {
            match event {
                SimEvent::GameOver { wave, entropy_earned } => {
                    log::info!("run ended on wave {wave}, entropy +{entropy_earned}");
                }
                SimEvent::GameClear { wave, gold } => {
                    log::info!("run cleared at wave {wave} with {gold} gold");
                }
                other => log::debug!("{other:?}"),
            }
        }

        let (cols, rows) = terminal::size()?;
        display::render(out, sim, cols, rows)?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME {
            std::thread::sleep(FRAME - elapsed);
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let log_path = init_logging()?;
    let config = config_from_args()?;
    log::info!("logging to {}", log_path.display());

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode().context("enabling raw mode")?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Ask for key release/repeat events; unsupported terminals fall back to
    // the hold window.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Blocking reads happen on their own thread so the loop never waits on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || loop {
        match event::read() {
            Ok(ev) => {
                if tx.send(ev).is_err() {
                    break; // receiver dropped → program exiting
                }
            }
            Err(_) => break,
        }
    });

    let result = run(&mut out, &rx, config);

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result
}

fn run<W: Write>(out: &mut W, rx: &mpsc::Receiver<Event>, config: SimConfig) -> anyhow::Result<()> {
    // entropy and bought upgrades outlive a single run
    let mut progression = Progression::default();

    loop {
        match show_menu(out, rx, progression.entropy)? {
            MenuResult::Quit => break,
            MenuResult::Start(stage) => {
                let mut sim = SimulationContext::new(config.clone(), stage, progression);
                let quit = game_loop(out, &mut sim, rx)?;
                progression = sim.progression;
                if quit {
                    break;
                }
            }
        }
    }
    Ok(())
}
