//! # rehab_core
//!
//! The gesture-to-game-event pipeline behind the rehab hand game.
//!
//! Per tick:
//!
//! ```text
//! landmarks ──▶ gesture::classify ──▶ HandFrame
//!                                        │
//!             ItemModel ◀── engine::Engine::tick ──▶ SessionState
//!                 │                      │
//!           advance_all            TickReport (effects, cues)
//! ```
//!
//! ## Modes
//!
//! | Mode | Clears the target when | Timeout |
//! |---|---|---|
//! | Tap | fingertip inside | 5 s, −1 point |
//! | Grip | fingertip inside **and** thumb–index pinch < 40 px | 5 s, −1 point |
//! | Hold | fingertip inside for 3 s without leaving | 10 s, −1 point |
//! | SequentialTap | fingertip on target `sequence_next` (1..5) | none |
//!
//! Every hit is worth one point; `level = max(1, score / 5 + 1)`.  From
//! level 2 targets drift at `level × 0.5` px per tick and bounce off the
//! edges.
//!
//! ## Quick start
//!
//! ```rust
//! use std::time::Duration;
//! use rand::SeedableRng;
//! use rehab_core::{Bounds, GameFlow, GameMode, HandFrame, MemoryHighScoreStore, Phase};
//!
//! let rng = rand::rngs::StdRng::seed_from_u64(0);
//! let mut flow = GameFlow::new(MemoryHighScoreStore::default(), rng, Bounds::default());
//! flow.start();
//! flow.select_mode(GameMode::Tap, Duration::ZERO);
//!
//! let target = flow.items()[0].position;
//! let dt = Duration::from_millis(33);
//! let report = flow.tick(&HandFrame::pointing(target, false), dt, dt).unwrap();
//! assert!(report.event.is_some());
//! assert_eq!(flow.session().unwrap().score(), 1);
//!
//! flow.finish(dt * 2);
//! assert!(matches!(flow.phase(), Phase::GameOver { score: 1, .. }));
//! ```

pub mod clock;
pub mod gesture;
pub mod item;
pub mod session;
pub mod engine;
pub mod storage;
pub mod journal;
pub mod flow;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{Cue, Effect, Engine, GameEvent, TickReport};
pub use flow::{GameFlow, Phase, Snapshot, TICK_RATE};
pub use gesture::{classify, HandFrame, LandmarkError, Landmarks, Point};
pub use item::{Bounds, Item, ItemModel};
pub use journal::{RoundJournal, RoundRecord};
pub use session::{level_for, GameMode, SessionState};
pub use storage::{HighScoreStore, JsonHighScoreStore, MemoryHighScoreStore, StorageError};
