//! Game flow — Menu → ModeSelect → Playing → GameOver → (Playing | Menu).
//!
//! `GameFlow` owns the session, the item model and the engine for the
//! current round and is the only thing that mutates them.  Transitions that
//! do not apply in the current phase are ignored and reported as `false`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::engine::{Engine, GameEvent, TickReport};
use crate::gesture::HandFrame;
use crate::item::{Bounds, Item, ItemModel};
use crate::journal::{RoundJournal, RoundRecord};
use crate::session::{GameMode, SessionState};
use crate::storage::HighScoreStore;

/// Nominal ticks per second.  Item speeds are pixels per nominal tick, so
/// real-time speed does not depend on how often the caller ticks.
pub const TICK_RATE: u32 = 30;

/// Longest frame gap that still moves items in one step, in ticks.
const MAX_CATCHUP_TICKS: f32 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Menu,
    ModeSelect,
    Playing,
    GameOver { score: u32, high_score: u32, new_record: bool },
}

/// What presentation gets each tick.
#[derive(Debug)]
pub struct Snapshot<'a> {
    pub phase:         Phase,
    pub mode:          GameMode,
    pub items:         &'a [Item],
    pub session:       Option<&'a SessionState>,
    pub last_event:    Option<GameEvent>,
    pub high_score:    u32,
    pub sound_enabled: bool,
}

#[derive(Debug)]
struct RoundStats {
    started_at:    DateTime<Utc>,
    started_mono:  Duration,
    hits:          u32,
    timeouts:      u32,
}

impl RoundStats {
    fn begin(now: Duration) -> Self {
        RoundStats { started_at: Utc::now(), started_mono: now, hits: 0, timeouts: 0 }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GameFlow
// ════════════════════════════════════════════════════════════════════════════

pub struct GameFlow<S: HighScoreStore, R: Rng> {
    phase:         Phase,
    mode:          GameMode,
    sound_enabled: bool,
    high_score:    u32,
    store:         S,
    journal:       Option<RoundJournal>,
    model:         ItemModel<R>,
    engine:        Engine,
    session:       Option<SessionState>,
    stats:         Option<RoundStats>,
}

impl<S: HighScoreStore, R: Rng> GameFlow<S, R> {
    /// Load the stored high score and start at the menu.
    pub fn new(store: S, rng: R, bounds: Bounds) -> Self {
        let high_score = store.load();
        log::info!("high score loaded: {}", high_score);
        GameFlow {
            phase:         Phase::Menu,
            mode:          GameMode::default(),
            sound_enabled: true,
            high_score,
            store,
            journal:       None,
            model:         ItemModel::new(bounds, rng),
            engine:        Engine::new(),
            session:       None,
            stats:         None,
        }
    }

    pub fn with_journal(mut self, journal: RoundJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn with_mode(mut self, mode: GameMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_sound(mut self, enabled: bool) -> Self {
        self.sound_enabled = enabled;
        self
    }

    // ── accessors ────────────────────────────────────────────────────────

    pub fn phase(&self)         -> Phase                   { self.phase }
    pub fn mode(&self)          -> GameMode                { self.mode }
    pub fn high_score(&self)    -> u32                     { self.high_score }
    pub fn sound_enabled(&self) -> bool                    { self.sound_enabled }
    pub fn session(&self)       -> Option<&SessionState>   { self.session.as_ref() }
    pub fn items(&self)         -> &[Item]                 { self.model.items() }
    pub fn store(&self)         -> &S                      { &self.store }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            phase:         self.phase,
            mode:          self.mode,
            items:         self.model.items(),
            session:       self.session.as_ref(),
            last_event:    self.engine.last_event(),
            high_score:    self.high_score,
            sound_enabled: self.sound_enabled,
        }
    }

    // ── transitions ──────────────────────────────────────────────────────

    /// Menu → ModeSelect.
    pub fn start(&mut self) -> bool {
        if self.phase != Phase::Menu { return false; }
        self.phase = Phase::ModeSelect;
        true
    }

    /// ModeSelect → Menu.
    pub fn back(&mut self) -> bool {
        if self.phase != Phase::ModeSelect { return false; }
        self.phase = Phase::Menu;
        true
    }

    /// ModeSelect → Playing with a fresh session.
    pub fn select_mode(&mut self, mode: GameMode, now: Duration) -> bool {
        if self.phase != Phase::ModeSelect { return false; }
        self.mode = mode;
        self.begin_round(now);
        true
    }

    /// Playing → GameOver.  Persists a new high score; a failed save is
    /// logged and otherwise ignored.
    pub fn finish(&mut self, now: Duration) -> bool {
        if self.phase != Phase::Playing { return false; }
        let (score, level) = self.session
            .as_ref()
            .map(|s| (s.score(), s.level()))
            .unwrap_or((0, 1));

        let new_record = score > self.high_score;
        if new_record {
            self.high_score = score;
            if let Err(e) = self.store.save(score) {
                log::warn!("could not save high score {}: {}", score, e);
            }
        }

        if let (Some(journal), Some(stats)) = (&self.journal, self.stats.take()) {
            let record = RoundRecord {
                mode: self.mode,
                score,
                level,
                hits: stats.hits,
                timeouts: stats.timeouts,
                started_at: stats.started_at,
                finished_at: Utc::now(),
                duration_ms: now.saturating_sub(stats.started_mono).as_millis() as u64,
            };
            if let Err(e) = journal.append(&record) {
                log::warn!("could not write round journal: {}", e);
            }
        }

        log::info!(
            "round over: mode={} score={} high={}{}",
            self.mode.name(), score, self.high_score,
            if new_record { " (new record)" } else { "" },
        );
        self.phase = Phase::GameOver { score, high_score: self.high_score, new_record };
        true
    }

    /// GameOver → Playing, same mode, score back to 0.
    pub fn play_again(&mut self, now: Duration) -> bool {
        if !matches!(self.phase, Phase::GameOver { .. }) { return false; }
        self.begin_round(now);
        true
    }

    /// GameOver → Menu, discarding the session.
    pub fn exit_to_menu(&mut self) -> bool {
        if !matches!(self.phase, Phase::GameOver { .. }) { return false; }
        self.session = None;
        self.stats = None;
        self.model.clear();
        self.engine.reset();
        self.phase = Phase::Menu;
        true
    }

    pub fn toggle_sound(&mut self) -> bool {
        self.sound_enabled = !self.sound_enabled;
        if let Some(s) = self.session.as_mut() {
            s.sound_enabled = self.sound_enabled;
        }
        self.sound_enabled
    }

    // ── per-tick ─────────────────────────────────────────────────────────

    /// Run one tick of gameplay: engine first, then item movement.
    /// Returns `None` outside the Playing phase.
    pub fn tick(&mut self, frame: &HandFrame, now: Duration, dt: Duration) -> Option<TickReport> {
        if self.phase != Phase::Playing { return None; }
        let session = self.session.as_mut()?;

        let report = self.engine.tick(frame, &mut self.model, session, now, dt);

        if let (Some(ev), Some(stats)) = (report.event, self.stats.as_mut()) {
            match ev {
                GameEvent::Hit { .. } | GameEvent::SequenceHit { .. } => stats.hits += 1,
                GameEvent::Timeout { .. }                              => stats.timeouts += 1,
                GameEvent::HoldTick { .. }                             => {}
            }
        }

        let dt_ticks = (dt.as_secs_f32() * TICK_RATE as f32).min(MAX_CATCHUP_TICKS);
        self.model.advance_all(dt_ticks);
        Some(report)
    }

    fn begin_round(&mut self, now: Duration) {
        let session = SessionState::new(self.mode, self.sound_enabled);
        self.model.spawn(self.mode, session.level(), now);
        self.engine.reset();
        self.session = Some(session);
        self.stats = Some(RoundStats::begin(now));
        self.phase = Phase::Playing;
        log::info!("round started: mode={}", self.mode.name());
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
