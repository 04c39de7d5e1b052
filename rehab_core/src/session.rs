//! Per-run session state: score, derived level, mode and sequence progress.

use serde::{Deserialize, Serialize};

/// Points needed per level step.
pub const POINTS_PER_LEVEL: u32 = 5;

/// `level = max(1, score / 5 + 1)`.
pub fn level_for(score: u32) -> u32 {
    (score / POINTS_PER_LEVEL + 1).max(1)
}

// ════════════════════════════════════════════════════════════════════════════
// GameMode
// ════════════════════════════════════════════════════════════════════════════

/// The four exercise variants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Touch the target with the index fingertip.
    #[default]
    Tap,
    /// Pinch thumb and index together over the target.
    Grip,
    /// Keep the fingertip inside the zone for 3 s.
    Hold,
    /// Tap numbered targets in order 1..K.
    SequentialTap,
}

impl GameMode {
    pub const ALL: [GameMode; 4] =
        [GameMode::Tap, GameMode::Grip, GameMode::Hold, GameMode::SequentialTap];

    pub fn name(self) -> &'static str {
        match self {
            GameMode::Tap           => "Tap",
            GameMode::Grip          => "Grip",
            GameMode::Hold          => "Hold",
            GameMode::SequentialTap => "Seq",
        }
    }

    /// One-line instruction shown on the mode picker.
    pub fn hint(self) -> &'static str {
        match self {
            GameMode::Tap           => "Touch item with index finger",
            GameMode::Grip          => "Pinch thumb + index on item",
            GameMode::Hold          => "Hold index inside zone 3 seconds",
            GameMode::SequentialTap => "Tap targets in order 1-5",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SessionState
// ════════════════════════════════════════════════════════════════════════════

/// Outcome of a score change, for level-up feedback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelChange {
    pub from: u32,
    pub to:   u32,
}

impl LevelChange {
    pub fn leveled_up(&self) -> bool { self.to > self.from }
}

/// Mutable state of one game run.
///
/// `level` is not stored: it is always derived from `score`, so the two can
/// never disagree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    score:             u32,
    pub mode:          GameMode,
    /// Next expected sequence index (1..=K).  Only meaningful in
    /// [`GameMode::SequentialTap`].
    sequence_next:     u32,
    pub sound_enabled: bool,
}

impl SessionState {
    pub fn new(mode: GameMode, sound_enabled: bool) -> Self {
        SessionState { score: 0, mode, sequence_next: 1, sound_enabled }
    }

    pub fn score(&self)         -> u32 { self.score }
    pub fn level(&self)         -> u32 { level_for(self.score) }
    pub fn sequence_next(&self) -> u32 { self.sequence_next }

    pub fn apply_hit(&mut self) -> LevelChange {
        let from = self.level();
        self.score += 1;
        LevelChange { from, to: self.level() }
    }

    /// Lose a point, never going below zero.
    pub fn apply_timeout(&mut self) -> LevelChange {
        let from = self.level();
        self.score = self.score.saturating_sub(1);
        LevelChange { from, to: self.level() }
    }

    /// Move to the next sequence index, wrapping to 1 after `k`.
    pub fn advance_sequence(&mut self, k: u32) {
        self.sequence_next = if self.sequence_next >= k { 1 } else { self.sequence_next + 1 };
    }

    /// Back to initial values, keeping mode and sound preference.
    pub fn reset(&mut self) {
        self.score = 0;
        self.sequence_next = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn starts_at_level_one() {
        let s = SessionState::new(GameMode::Tap, true);
        assert_eq!(s.score(), 0);
        assert_eq!(s.level(), 1);
        assert_eq!(s.sequence_next(), 1);
    }

    #[test]
    fn fifth_hit_levels_up() {
        let mut s = SessionState::new(GameMode::Tap, true);
        for _ in 0..4 {
            assert!(!s.apply_hit().leveled_up());
        }
        let change = s.apply_hit();
        assert!(change.leveled_up());
        assert_eq!(change, LevelChange { from: 1, to: 2 });
        assert_eq!(s.score(), 5);
    }

    #[test]
    fn timeout_drops_level() {
        let mut s = SessionState::new(GameMode::Tap, true);
        for _ in 0..5 { s.apply_hit(); }
        let change = s.apply_timeout();
        assert_eq!(s.score(), 4);
        assert_eq!(change, LevelChange { from: 2, to: 1 });
    }

    #[test]
    fn score_floors_at_zero() {
        let mut s = SessionState::new(GameMode::Hold, false);
        for _ in 0..10 { s.apply_timeout(); }
        assert_eq!(s.score(), 0);
        assert_eq!(s.level(), 1);
    }

    #[test]
    fn sequence_wraps_after_k() {
        let mut s = SessionState::new(GameMode::SequentialTap, true);
        for expected in [2, 3, 4, 5, 1, 2] {
            s.advance_sequence(5);
            assert_eq!(s.sequence_next(), expected);
        }
    }

    #[test]
    fn reset_keeps_mode_and_sound() {
        let mut s = SessionState::new(GameMode::Grip, false);
        s.apply_hit();
        s.advance_sequence(5);
        s.reset();
        assert_eq!(s, SessionState::new(GameMode::Grip, false));
    }

    proptest! {
        #[test]
        fn level_tracks_score(ops in proptest::collection::vec(any::<bool>(), 0..200)) {
            let mut s = SessionState::new(GameMode::Tap, true);
            for hit in ops {
                if hit { s.apply_hit(); } else { s.apply_timeout(); }
                prop_assert_eq!(s.level(), std::cmp::max(1, s.score() / 5 + 1));
            }
        }
    }
}
