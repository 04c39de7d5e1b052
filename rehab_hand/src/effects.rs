//! Short-lived visual feedback: hit rings, fail mark, level-up banner.
//!
//! Each effect has a deadline on the game clock.  The engine's [`Effect`]s
//! are turned into [`ActiveEffect`]s here and dropped once expired.

use std::time::Duration;

use rehab_core::{Effect, Point};

pub const HIT_FLASH:    Duration = Duration::from_millis(300);
pub const GRIP_FLASH:   Duration = Duration::from_millis(300);
pub const FAIL_MARK:    Duration = Duration::from_millis(500);
pub const LEVEL_BANNER: Duration = Duration::from_millis(1000);

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EffectKind {
    HitRings { at: Point },
    GripRing { at: Point },
    FailMark,
    LevelUp  { level: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveEffect {
    pub kind:    EffectKind,
    pub started: Duration,
    pub until:   Duration,
}

impl ActiveEffect {
    /// 0.0 when it starts, 1.0 when it ends.
    pub fn progress(&self, now: Duration) -> f32 {
        let span = self.until.saturating_sub(self.started).as_secs_f32();
        if span <= 0.0 { return 1.0; }
        (now.saturating_sub(self.started).as_secs_f32() / span).clamp(0.0, 1.0)
    }
}

/// All effects currently on screen.  At most one of each kind: a new hit
/// replaces the previous hit flash.
#[derive(Debug, Default)]
pub struct EffectBoard {
    active: Vec<ActiveEffect>,
}

impl EffectBoard {
    pub fn trigger(&mut self, effect: Effect, now: Duration) {
        let (kind, span) = match effect {
            Effect::Hit { at }        => (EffectKind::HitRings { at }, HIT_FLASH),
            Effect::Grip { at }       => (EffectKind::GripRing { at }, GRIP_FLASH),
            Effect::Fail              => (EffectKind::FailMark, FAIL_MARK),
            Effect::LevelUp { level } => (EffectKind::LevelUp { level }, LEVEL_BANNER),
        };
        self.active.retain(|e| std::mem::discriminant(&e.kind) != std::mem::discriminant(&kind));
        self.active.push(ActiveEffect { kind, started: now, until: now + span });
    }

    /// Drop everything past its deadline.
    pub fn tick(&mut self, now: Duration) {
        self.active.retain(|e| now <= e.until);
    }

    pub fn clear(&mut self) { self.active.clear(); }

    pub fn active(&self) -> &[ActiveEffect] { &self.active }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: fn(u64) -> Duration = Duration::from_millis;

    #[test]
    fn effects_expire_on_their_own_clocks() {
        let mut b = EffectBoard::default();
        b.trigger(Effect::Hit { at: Point::new(1.0, 2.0) }, MS(0));
        b.trigger(Effect::LevelUp { level: 2 }, MS(0));
        b.tick(MS(300));
        assert_eq!(b.active().len(), 2);
        b.tick(MS(301));
        assert_eq!(b.active().len(), 1);
        assert!(matches!(b.active()[0].kind, EffectKind::LevelUp { level: 2 }));
        b.tick(MS(1001));
        assert!(b.active().is_empty());
    }

    #[test]
    fn retrigger_replaces_same_kind() {
        let mut b = EffectBoard::default();
        b.trigger(Effect::Fail, MS(0));
        b.trigger(Effect::Fail, MS(400));
        assert_eq!(b.active().len(), 1);
        b.tick(MS(800));
        assert_eq!(b.active().len(), 1);
    }

    #[test]
    fn progress_runs_zero_to_one() {
        let mut b = EffectBoard::default();
        b.trigger(Effect::Grip { at: Point::default() }, MS(100));
        let e = b.active()[0];
        assert_eq!(e.progress(MS(100)), 0.0);
        assert!((e.progress(MS(250)) - 0.5).abs() < 1e-4);
        assert_eq!(e.progress(MS(900)), 1.0);
    }
}
