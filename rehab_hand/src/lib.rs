//! # rehab_hand
//!
//! Hand-gesture rehabilitation mini-game: touch, pinch or dwell on targets
//! shown in a 640×480 window, driven by a webcam hand detector or the mouse.
//!
//! ## Hand → Action mapping
//!
//! | Mode | Hand | Action |
//! |---|---|---|
//! | Tap | Index tip inside the red target | +1 point, new target |
//! | Grip | Thumb–index pinch on the target | +1 point, new target |
//! | Hold | Index tip in the zone for 3 s | +1 point, new zone |
//! | Seq | Index tip on targets 1→5 in order | +1 point per target |
//!
//! A target left alone for 5 s (10 s for Hold) costs a point.  Every five
//! points is a level; from level 2 targets start to drift.
//!
//! ## Landmark sources
//!
//! * (default) — **Simulation mode**: the mouse is the index fingertip and
//!   the left button is a pinch.
//! * `detector` in `rehab_hand.json` — **Camera mode**: an external process
//!   prints one JSON line of 21 hand landmarks per frame.
//!
//! ### Keyboard shortcuts
//!
//! | Key | Action |
//! |---|---|
//! | `Enter` / `Space` | Start / play selected mode |
//! | `1`–`4` | Tap, Grip, Hold, Seq |
//! | `M` | Sound on/off |
//! | `Esc` | End round / back |
//! | `R` | Play again |
//! | `Q` | Quit |

pub mod config;
pub mod landmarks;
pub mod audio;
pub mod effects;
pub mod visualizer;
pub mod app;
