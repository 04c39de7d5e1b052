//! Interaction engine — the per-tick state machine.
//!
//! Each tick the engine looks at one [`HandFrame`], the live items and the
//! session, picks at most one [`GameEvent`] through the active mode's
//! [`ModeRules`], and applies it: score, level, respawn, sequence advance,
//! plus the visual and audio feedback the presentation layer should show.
//!
//! Priority within a tick is Hit > Timeout > HoldTick.

use std::time::Duration;

use rand::Rng;

use crate::gesture::{HandFrame, Point};
use crate::item::{Item, ItemId, ItemModel, SEQUENCE_LEN};
use crate::session::{GameMode, SessionState};

/// Contiguous dwell needed to clear a Hold target.
pub const HOLD_REQUIRED: Duration = Duration::from_secs(3);

// ════════════════════════════════════════════════════════════════════════════
// GameEvent
// ════════════════════════════════════════════════════════════════════════════

/// The single discrete outcome of one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GameEvent {
    /// Target cleared (Tap, Grip, Hold).
    Hit { item: ItemId, position: Point },
    /// The expected sequence target was tapped.
    SequenceHit { item: ItemId, index: u32, position: Point },
    /// Target lived past its lifetime.
    Timeout { item: ItemId, position: Point },
    /// Hold dwell is accumulating but not complete; no score change.
    HoldTick { item: ItemId, progress: Duration },
}

impl GameEvent {
    pub fn is_scoring(&self) -> bool {
        matches!(self, GameEvent::Hit { .. } | GameEvent::SequenceHit { .. })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Feedback
// ════════════════════════════════════════════════════════════════════════════

/// Visual feedback requested from presentation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Effect {
    /// Ring burst where a Tap or sequence target was hit.
    Hit { at: Point },
    /// Golden ring where a Grip or Hold target was cleared.
    Grip { at: Point },
    /// Fail mark after a timeout.
    Fail,
    LevelUp { level: u32 },
}

/// Sound cue requested from the audio collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    Correct,
    Fail,
}

/// Everything one tick produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub event:   Option<GameEvent>,
    pub effects: Vec<Effect>,
    /// Empty when sound is disabled.
    pub cues:    Vec<Cue>,
}

// ════════════════════════════════════════════════════════════════════════════
// ModeRules — one implementation per mode
// ════════════════════════════════════════════════════════════════════════════

/// Inputs visible to a mode's rules for one tick.
pub struct TickContext<'a> {
    pub frame:   &'a HandFrame,
    pub items:   &'a mut [Item],
    pub session: &'a SessionState,
    pub now:     Duration,
    /// Real time since the previous tick.
    pub dt:      Duration,
}

impl TickContext<'_> {
    fn pointer_in(&self, item: &Item) -> bool {
        self.frame.pointer.is_some_and(|p| item.contains_point(p))
    }
}

/// Decides which event, if any, a tick produces for one game mode.
pub trait ModeRules {
    fn evaluate(&self, ctx: &mut TickContext<'_>) -> Option<GameEvent>;
}

pub struct TapRules;
pub struct GripRules;
pub struct HoldRules;
pub struct SequentialRules;

impl ModeRules for TapRules {
    fn evaluate(&self, ctx: &mut TickContext<'_>) -> Option<GameEvent> {
        let item = ctx.items.first()?;
        if ctx.pointer_in(item) {
            Some(GameEvent::Hit { item: item.id, position: item.position })
        } else if item.is_expired(ctx.now, GameMode::Tap) {
            Some(GameEvent::Timeout { item: item.id, position: item.position })
        } else {
            None
        }
    }
}

impl ModeRules for GripRules {
    fn evaluate(&self, ctx: &mut TickContext<'_>) -> Option<GameEvent> {
        let item = ctx.items.first()?;
        if ctx.frame.pinch_active && ctx.pointer_in(item) {
            Some(GameEvent::Hit { item: item.id, position: item.position })
        } else if item.is_expired(ctx.now, GameMode::Grip) {
            Some(GameEvent::Timeout { item: item.id, position: item.position })
        } else {
            None
        }
    }
}

impl ModeRules for HoldRules {
    fn evaluate(&self, ctx: &mut TickContext<'_>) -> Option<GameEvent> {
        let inside = ctx.items.first().is_some_and(|it| ctx.pointer_in(it));
        let (now, dt) = (ctx.now, ctx.dt);
        let item = ctx.items.first_mut()?;

        if inside {
            item.hold_progress += dt;
            if item.hold_progress >= HOLD_REQUIRED {
                return Some(GameEvent::Hit { item: item.id, position: item.position });
            }
        } else {
            item.hold_progress = Duration::ZERO;
        }

        if item.is_expired(now, GameMode::Hold) {
            Some(GameEvent::Timeout { item: item.id, position: item.position })
        } else if inside {
            Some(GameEvent::HoldTick { item: item.id, progress: item.hold_progress })
        } else {
            None
        }
    }
}

impl ModeRules for SequentialRules {
    fn evaluate(&self, ctx: &mut TickContext<'_>) -> Option<GameEvent> {
        let expected = ctx.session.sequence_next();
        let target = ctx.items.iter().find(|it| it.sequence_index == Some(expected))?;
        // Touching any other index is ignored.
        if ctx.pointer_in(target) {
            Some(GameEvent::SequenceHit {
                item:     target.id,
                index:    expected,
                position: target.position,
            })
        } else {
            None
        }
    }
}

pub fn rules_for(mode: GameMode) -> &'static dyn ModeRules {
    match mode {
        GameMode::Tap           => &TapRules,
        GameMode::Grip          => &GripRules,
        GameMode::Hold          => &HoldRules,
        GameMode::SequentialTap => &SequentialRules,
    }
}

/// Run the rules for `mode` over one tick without applying the result.
pub fn evaluate_tick(
    mode:    GameMode,
    frame:   &HandFrame,
    items:   &mut [Item],
    session: &SessionState,
    now:     Duration,
    dt:      Duration,
) -> Option<GameEvent> {
    let mut ctx = TickContext { frame, items, session, now, dt };
    rules_for(mode).evaluate(&mut ctx)
}

// ════════════════════════════════════════════════════════════════════════════
// Engine
// ════════════════════════════════════════════════════════════════════════════

/// Evaluates and applies one event per tick.
#[derive(Debug, Default)]
pub struct Engine {
    last_event: Option<GameEvent>,
}

impl Engine {
    pub fn new() -> Self { Self::default() }

    pub fn last_event(&self) -> Option<GameEvent> { self.last_event }

    pub fn reset(&mut self) { self.last_event = None; }

    /// Process one tick: evaluate the active mode's rules and apply the
    /// resulting event to `session` and `model`.
    pub fn tick<R: Rng>(
        &mut self,
        frame:   &HandFrame,
        model:   &mut ItemModel<R>,
        session: &mut SessionState,
        now:     Duration,
        dt:      Duration,
    ) -> TickReport {
        let mode = session.mode;
        let event = {
            let mut ctx = TickContext {
                frame,
                items: model.items_mut(),
                session,
                now,
                dt,
            };
            rules_for(mode).evaluate(&mut ctx)
        };

        let mut report = TickReport { event, ..TickReport::default() };
        if let Some(ev) = event {
            self.apply(ev, model, session, now, &mut report);
            self.last_event = Some(ev);
        }
        report
    }

    fn apply<R: Rng>(
        &mut self,
        event:   GameEvent,
        model:   &mut ItemModel<R>,
        session: &mut SessionState,
        now:     Duration,
        report:  &mut TickReport,
    ) {
        let sound = session.sound_enabled;
        match event {
            GameEvent::Hit { item, position } | GameEvent::SequenceHit { item, position, .. } => {
                let change = session.apply_hit();
                if matches!(event, GameEvent::SequenceHit { .. }) {
                    session.advance_sequence(SEQUENCE_LEN);
                }
                model.respawn(item, session.level(), now);

                report.effects.push(match session.mode {
                    GameMode::Grip | GameMode::Hold => Effect::Grip { at: position },
                    _                               => Effect::Hit  { at: position },
                });
                if change.leveled_up() {
                    log::info!("level up → {}", change.to);
                    report.effects.push(Effect::LevelUp { level: change.to });
                }
                if sound { report.cues.push(Cue::Correct); }
            }

            GameEvent::Timeout { item, .. } => {
                let change = session.apply_timeout();
                if change.to < change.from {
                    log::debug!("level down → {}", change.to);
                }
                model.respawn(item, session.level(), now);
                report.effects.push(Effect::Fail);
                if sound { report.cues.push(Cue::Fail); }
            }

            GameEvent::HoldTick { .. } => {}
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
