//! Gesture classification — raw hand landmarks → pointer and pinch signals.
//!
//! Landmarks arrive already in display pixel space (640×480) and already
//! mirrored for the selfie view.  Classification is a pure function of one
//! frame: no smoothing, no memory of earlier frames.

use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════
// Landmark indices (MediaPipe hand model convention)
// ════════════════════════════════════════════════════════════════════════════

pub const LANDMARK_COUNT:   usize = 21;
pub const WRIST:            usize = 0;
pub const THUMB_TIP:        usize = 4;
pub const INDEX_FINGER_MCP: usize = 5;
pub const INDEX_FINGER_TIP: usize = 8;
pub const MIDDLE_FINGER_TIP: usize = 12;

/// Thumb-tip to index-tip distance (pixels) below which the hand pinches.
pub const PINCH_THRESHOLD_PX: f32 = 40.0;

// ════════════════════════════════════════════════════════════════════════════
// Point
// ════════════════════════════════════════════════════════════════════════════

/// A position in display pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self { Point { x, y } }

    pub fn distance(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self { Point::new(x as f32, y as f32) }
}

// ════════════════════════════════════════════════════════════════════════════
// Landmarks
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LandmarkError {
    #[error("expected {LANDMARK_COUNT} hand landmarks, got {0}")]
    WrongCount(usize),
}

/// The 21 landmarks of one detected hand, in pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Landmarks {
    points: [Point; LANDMARK_COUNT],
}

impl Landmarks {
    pub fn new(points: [Point; LANDMARK_COUNT]) -> Self { Landmarks { points } }

    pub fn from_points(points: Vec<Point>) -> Result<Self, LandmarkError> {
        let n = points.len();
        let points: [Point; LANDMARK_COUNT] =
            points.try_into().map_err(|_| LandmarkError::WrongCount(n))?;
        Ok(Landmarks { points })
    }

    pub fn get(&self, index: usize) -> Option<Point> { self.points.get(index).copied() }
    pub fn points(&self) -> &[Point] { &self.points }
    pub fn index_tip(&self) -> Point { self.points[INDEX_FINGER_TIP] }
    pub fn thumb_tip(&self) -> Point { self.points[THUMB_TIP] }
}

// ════════════════════════════════════════════════════════════════════════════
// HandFrame
// ════════════════════════════════════════════════════════════════════════════

/// Semantic gesture signals for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HandFrame {
    /// Index fingertip position, `None` when no hand was detected.
    pub pointer:        Option<Point>,
    pub pinch_active:   bool,
    pub pinch_distance: Option<f32>,
}

impl HandFrame {
    /// "No hand detected."
    pub fn empty() -> Self { HandFrame::default() }

    /// A frame with a pointer and an explicit pinch state, bypassing
    /// landmark classification.
    pub fn pointing(at: Point, pinch_active: bool) -> Self {
        HandFrame { pointer: Some(at), pinch_active, pinch_distance: None }
    }
}

/// Derive pointer and pinch from one frame's landmarks (or their absence).
pub fn classify(landmarks: Option<&Landmarks>) -> HandFrame {
    let Some(hand) = landmarks else {
        return HandFrame::empty();
    };
    let pointer = hand.index_tip();
    let pinch   = hand.thumb_tip().distance(&pointer);
    HandFrame {
        pointer:        Some(pointer),
        pinch_active:   pinch < PINCH_THRESHOLD_PX,
        pinch_distance: Some(pinch),
    }
}
