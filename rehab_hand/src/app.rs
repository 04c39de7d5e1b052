//! Top-level application state and the main loop.
//!
//! `AppState` owns the `GameFlow`, the on-screen effects and the cue
//! player.  Each tick it turns the newest landmarks into a `HandFrame`,
//! runs the flow and routes the engine's feedback to screen and speaker.

use std::sync::mpsc;
use std::time::Duration;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;

use rehab_core::{
    classify, Bounds, Clock, GameFlow, HighScoreStore, JsonHighScoreStore, Landmarks, Phase,
    RoundJournal, SystemClock,
};

use crate::audio::CuePlayer;
use crate::config::AppConfig;
use crate::effects::EffectBoard;
use crate::landmarks::{
    spawn_landmark_source, DetectorSource, FrameFeed, SimInput, SimLandmarkSource,
};
use crate::visualizer::{button_at, Scene, UiCommand, Visualizer};

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState<S: HighScoreStore> {
    flow:         GameFlow<S, StdRng>,
    effects:      EffectBoard,
    player:       CuePlayer,
    hand:         Option<Landmarks>,
    was_pinching: bool,
}

impl<S: HighScoreStore> AppState<S> {
    pub fn new(flow: GameFlow<S, StdRng>, player: CuePlayer) -> Self {
        AppState { flow, effects: EffectBoard::default(), player, hand: None, was_pinching: false }
    }

    pub fn flow(&self) -> &GameFlow<S, StdRng> { &self.flow }
    pub fn effects(&self) -> &EffectBoard { &self.effects }

    /// Apply one key or button command.  Returns `false` once quit was
    /// requested; a round in progress is finished first so its score counts.
    pub fn handle_command(&mut self, cmd: UiCommand, now: Duration) -> bool {
        let phase = self.flow.phase();
        let changed = match (cmd, phase) {
            (UiCommand::Quit, _) => {
                self.flow.finish(now);
                return false;
            }
            (UiCommand::ToggleSound, _) => {
                let on = self.flow.toggle_sound();
                log::info!("sound {}", if on { "on" } else { "off" });
                true
            }
            (UiCommand::Start, Phase::Menu)              => self.flow.start(),
            (UiCommand::Start, Phase::ModeSelect)        => {
                let mode = self.flow.mode();
                self.flow.select_mode(mode, now)
            }
            (UiCommand::Start, Phase::GameOver { .. })   => self.flow.play_again(now),
            (UiCommand::SelectMode(m), Phase::Menu)      => self.flow.start() && self.flow.select_mode(m, now),
            (UiCommand::SelectMode(m), Phase::ModeSelect) => self.flow.select_mode(m, now),
            (UiCommand::Back, Phase::Playing)            => self.flow.finish(now),
            (UiCommand::Back, Phase::ModeSelect)         => self.flow.back(),
            (UiCommand::Back, Phase::GameOver { .. })    => self.flow.exit_to_menu(),
            (UiCommand::PlayAgain, _)                    => self.flow.play_again(now),
            _                                            => false,
        };
        if changed && self.flow.phase() != phase {
            self.effects.clear();
        }
        true
    }

    /// One tick.  Returns the command of a menu button pressed by a pinch
    /// this tick, for the caller to apply before the next one.
    pub fn tick(&mut self, landmarks: Option<Landmarks>, now: Duration, dt: Duration) -> Option<UiCommand> {
        let frame = classify(landmarks.as_ref());
        self.hand = landmarks;

        let pressed = frame.pinch_active && !self.was_pinching;
        self.was_pinching = frame.pinch_active;

        let clicked = match frame.pointer {
            Some(p) if pressed => button_at(self.flow.phase(), p.x, p.y),
            _ => None,
        };

        if let Some(report) = self.flow.tick(&frame, now, dt) {
            for effect in report.effects {
                self.effects.trigger(effect, now);
            }
            for cue in report.cues {
                self.player.play(cue);
            }
        }
        self.effects.tick(now);
        clicked
    }

    pub fn scene(&self, now: Duration) -> Scene<'_> {
        Scene {
            snapshot:  self.flow.snapshot(),
            landmarks: self.hand.as_ref(),
            effects:   self.effects.active(),
            now,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// This is the entry point called from `main.rs`.  It opens the landmark
/// source (the configured detector, or mouse simulation), the window, the
/// cue player and the data files, then drives the loop at `tick_rate`.
/// Commands are applied between ticks only.
pub fn run(cfg: AppConfig) -> Result<()> {
    // ── Landmark source ───────────────────────────────────────────────────
    let (_detector, sim_tx, frames) = match &cfg.detector {
        Some(det) => {
            let (process, source) = DetectorSource::launch(det)?;
            log::info!("hand detector ready: {}", det.command.join(" "));
            (Some(process), None, spawn_landmark_source(source))
        }
        None => {
            let (tx, rx) = mpsc::channel::<SimInput>();
            log::info!("no detector configured; the mouse drives the hand");
            (None, Some(tx), spawn_landmark_source(SimLandmarkSource { rx }))
        }
    };
    let mut feed = FrameFeed::new(frames, Duration::from_millis(cfg.stale_frame_ms));

    // ── Window ────────────────────────────────────────────────────────────
    let mut vis = Visualizer::new(sim_tx, cfg.tick_rate)?;

    // ── Game ──────────────────────────────────────────────────────────────
    let flow = GameFlow::new(
        JsonHighScoreStore::in_dir(&cfg.data_dir),
        StdRng::from_entropy(),
        Bounds::default(),
    )
    .with_journal(RoundJournal::in_dir(&cfg.data_dir))
    .with_mode(cfg.initial_mode)
    .with_sound(cfg.sound_enabled);

    let player = CuePlayer::spawn(cfg.midi_program, cfg.cue_velocity);
    let mut app = AppState::new(flow, player);

    // ── Main loop ─────────────────────────────────────────────────────────
    let clock = SystemClock::new();
    let mut last = clock.now();
    let mut pending: Option<UiCommand> = None;

    'main: while vis.is_open() {
        // 1. Commands from the last frame and the keyboard
        for cmd in pending.take().into_iter().chain(vis.poll_input()) {
            if !app.handle_command(cmd, clock.now()) { break 'main; }
        }

        // 2. One tick on the newest hand
        let now = clock.now();
        let dt = now.saturating_sub(last);
        last = now;
        pending = app.tick(feed.poll(), now, dt);

        // 3. Render
        vis.render(&app.scene(now))?;
    }

    // Window closed mid-round: still record it.
    app.flow.finish(clock.now());
    log::info!("bye");
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
