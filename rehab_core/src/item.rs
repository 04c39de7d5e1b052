//! On-screen targets: placement, movement, lifetime and hit geometry.
//!
//! [`ItemModel`] owns every live [`Item`].  The interaction engine reads and
//! mutates existing items but never creates one itself; it asks the model to
//! [`respawn`](ItemModel::respawn) a consumed slot instead.

use std::f32::consts::TAU;
use std::time::Duration;

use rand::Rng;

use crate::gesture::Point;
use crate::session::GameMode;

// ════════════════════════════════════════════════════════════════════════════
// Constants
// ════════════════════════════════════════════════════════════════════════════

pub const SCREEN_W: f32 = 640.0;
pub const SCREEN_H: f32 = 480.0;

/// Radius of the single Tap/Grip/Hold target.
pub const ITEM_RADIUS: f32 = 20.0;
/// Radius of each numbered sequence target.
pub const SEQUENCE_RADIUS: f32 = 18.0;
/// Targets per sequence (K).
pub const SEQUENCE_LEN: u32 = 5;
/// Speed per level, pixels per tick.
pub const SPEED_PER_LEVEL: f32 = 0.5;

pub const TAP_LIFETIME:  Duration = Duration::from_secs(5);
pub const HOLD_LIFETIME: Duration = Duration::from_secs(10);

/// How long a target may stay on screen before it times out.
/// Sequence targets never time out.
pub fn lifetime(mode: GameMode) -> Option<Duration> {
    match mode {
        GameMode::Tap | GameMode::Grip => Some(TAP_LIFETIME),
        GameMode::Hold                 => Some(HOLD_LIFETIME),
        GameMode::SequentialTap        => None,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Bounds / Velocity
// ════════════════════════════════════════════════════════════════════════════

/// The playfield rectangle, origin top-left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub width:  f32,
    pub height: f32,
}

impl Default for Bounds {
    fn default() -> Self { Bounds { width: SCREEN_W, height: SCREEN_H } }
}

/// Pixels per tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Velocity {
    pub vx: f32,
    pub vy: f32,
}

impl Velocity {
    pub fn speed(&self) -> f32 { (self.vx * self.vx + self.vy * self.vy).sqrt() }
    pub fn is_zero(&self) -> bool { self.vx == 0.0 && self.vy == 0.0 }
}

// ════════════════════════════════════════════════════════════════════════════
// Item
// ════════════════════════════════════════════════════════════════════════════

pub type ItemId = u64;

/// One live target.
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub id:             ItemId,
    /// 1..=K in sequential mode, `None` otherwise.
    pub sequence_index: Option<u32>,
    pub position:       Point,
    pub radius:         f32,
    pub created_at:     Duration,
    pub velocity:       Velocity,
    /// Contiguous dwell time inside the zone (Hold mode).
    pub hold_progress:  Duration,
}

impl Item {
    /// Inclusive circular hit test.
    pub fn contains_point(&self, p: Point) -> bool {
        self.position.distance(&p) <= self.radius
    }

    pub fn age(&self, now: Duration) -> Duration {
        now.saturating_sub(self.created_at)
    }

    pub fn is_expired(&self, now: Duration, mode: GameMode) -> bool {
        lifetime(mode).is_some_and(|l| self.age(now) >= l)
    }

    /// Remaining lifetime for the HUD countdown.
    pub fn time_left(&self, now: Duration, mode: GameMode) -> Option<Duration> {
        lifetime(mode).map(|l| l.saturating_sub(self.age(now)))
    }

    /// Move by `velocity * dt_ticks`, reflecting off the edges.  The whole
    /// disc stays inside `bounds`.
    pub fn advance(&mut self, dt_ticks: f32, bounds: Bounds) {
        if self.velocity.is_zero() { return; }

        self.position.x += self.velocity.vx * dt_ticks;
        self.position.y += self.velocity.vy * dt_ticks;

        let r = self.radius;
        if self.position.x - r < 0.0 {
            self.position.x = r;
            self.velocity.vx = -self.velocity.vx;
        } else if self.position.x + r > bounds.width {
            self.position.x = bounds.width - r;
            self.velocity.vx = -self.velocity.vx;
        }

        if self.position.y - r < 0.0 {
            self.position.y = r;
            self.velocity.vy = -self.velocity.vy;
        } else if self.position.y + r > bounds.height {
            self.position.y = bounds.height - r;
            self.velocity.vy = -self.velocity.vy;
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ItemModel
// ════════════════════════════════════════════════════════════════════════════

/// Owner of all live targets for the current mode.
///
/// Tap, Grip and Hold keep exactly one item; SequentialTap keeps
/// [`SEQUENCE_LEN`] items, one per index.
#[derive(Debug)]
pub struct ItemModel<R: Rng> {
    items:   Vec<Item>,
    bounds:  Bounds,
    rng:     R,
    next_id: ItemId,
}

impl<R: Rng> ItemModel<R> {
    pub fn new(bounds: Bounds, rng: R) -> Self {
        ItemModel { items: Vec::new(), bounds, rng, next_id: 1 }
    }

    pub fn bounds(&self) -> Bounds { self.bounds }
    pub fn items(&self)  -> &[Item] { &self.items }

    pub(crate) fn items_mut(&mut self) -> &mut [Item] { &mut self.items }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|it| it.id == id)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|it| it.id == id)
    }

    /// The single target of Tap/Grip/Hold.
    pub fn current(&self) -> Option<&Item> { self.items.first() }

    pub fn by_sequence_index(&self, index: u32) -> Option<&Item> {
        self.items.iter().find(|it| it.sequence_index == Some(index))
    }

    pub fn clear(&mut self) { self.items.clear(); }

    /// Replace every item with a fresh set for `mode`.
    pub fn spawn(&mut self, mode: GameMode, level: u32, now: Duration) -> &[Item] {
        self.items.clear();
        match mode {
            GameMode::SequentialTap => {
                for index in 1..=SEQUENCE_LEN {
                    let item = self.make_item(SEQUENCE_RADIUS, 1, now, Some(index));
                    self.items.push(item);
                }
            }
            _ => {
                let item = self.make_item(ITEM_RADIUS, level, now, None);
                self.items.push(item);
            }
        }
        &self.items
    }

    /// Replace item `id` with a new one in the same slot.  Sequence targets
    /// keep their index and stay still; single targets pick up `level`'s speed.
    /// Returns the new item's id.
    pub fn respawn(&mut self, id: ItemId, level: u32, now: Duration) -> Option<ItemId> {
        let slot = self.items.iter().position(|it| it.id == id)?;
        let old  = &self.items[slot];
        let (radius, index) = (old.radius, old.sequence_index);
        let level = if index.is_some() { 1 } else { level };
        let fresh = self.make_item(radius, level, now, index);
        let new_id = fresh.id;
        self.items[slot] = fresh;
        Some(new_id)
    }

    /// Advance every moving item by `dt_ticks`.
    pub fn advance_all(&mut self, dt_ticks: f32) {
        let bounds = self.bounds;
        for item in &mut self.items {
            item.advance(dt_ticks, bounds);
        }
    }

    fn make_item(&mut self, radius: f32, level: u32, now: Duration, index: Option<u32>) -> Item {
        let r  = radius as i32;
        let hi_x = (self.bounds.width  as i32 - r).max(r);
        let hi_y = (self.bounds.height as i32 - r).max(r);
        let x = self.rng.gen_range(r..=hi_x) as f32;
        let y = self.rng.gen_range(r..=hi_y) as f32;

        let velocity = if level <= 1 {
            Velocity::default()
        } else {
            let angle = self.rng.gen_range(0.0..TAU);
            let speed = level as f32 * SPEED_PER_LEVEL;
            Velocity { vx: angle.cos() * speed, vy: angle.sin() * speed }
        };

        let id = self.next_id;
        self.next_id += 1;

        Item {
            id,
            sequence_index: index,
            position: Point::new(x, y),
            radius,
            created_at: now,
            velocity,
            hold_progress: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn model() -> ItemModel<StdRng> {
        ItemModel::new(Bounds::default(), StdRng::seed_from_u64(7))
    }

    fn still_item(x: f32, y: f32) -> Item {
        Item {
            id: 1,
            sequence_index: None,
            position: Point::new(x, y),
            radius: ITEM_RADIUS,
            created_at: Duration::ZERO,
            velocity: Velocity::default(),
            hold_progress: Duration::ZERO,
        }
    }

    #[test]
    fn spawn_single_inside_bounds() {
        let mut m = model();
        for _ in 0..200 {
            let items = m.spawn(GameMode::Tap, 1, Duration::ZERO);
            assert_eq!(items.len(), 1);
            let it = &items[0];
            assert!(it.position.x >= ITEM_RADIUS && it.position.x <= SCREEN_W - ITEM_RADIUS);
            assert!(it.position.y >= ITEM_RADIUS && it.position.y <= SCREEN_H - ITEM_RADIUS);
            assert!(it.velocity.is_zero());
        }
    }

    #[test]
    fn spawn_sequence_has_k_indexed_items() {
        let mut m = model();
        let items = m.spawn(GameMode::SequentialTap, 4, Duration::ZERO);
        assert_eq!(items.len(), SEQUENCE_LEN as usize);
        for k in 1..=SEQUENCE_LEN {
            let it = m.by_sequence_index(k).unwrap();
            assert_eq!(it.radius, SEQUENCE_RADIUS);
            assert!(it.velocity.is_zero());
        }
    }

    #[test]
    fn speed_scales_with_level() {
        let mut m = model();
        m.spawn(GameMode::Tap, 3, Duration::ZERO);
        let speed = m.current().unwrap().velocity.speed();
        assert!((speed - 1.5).abs() < 1e-4, "speed was {}", speed);
    }

    #[test]
    fn level_one_is_stationary() {
        let mut m = model();
        m.spawn(GameMode::Grip, 1, Duration::ZERO);
        let before = m.current().unwrap().position;
        for _ in 0..100 { m.advance_all(1.0); }
        assert_eq!(m.current().unwrap().position, before);
    }

    #[test]
    fn bounce_stays_in_bounds() {
        let mut m = model();
        m.spawn(GameMode::Tap, 3, Duration::ZERO);
        for _ in 0..5_000 {
            m.advance_all(1.0);
            let it = m.current().unwrap();
            assert!(it.position.x >= it.radius && it.position.x <= SCREEN_W - it.radius);
            assert!(it.position.y >= it.radius && it.position.y <= SCREEN_H - it.radius);
            assert!((it.velocity.speed() - 1.5).abs() < 1e-4);
        }
    }

    #[test]
    fn bounce_reflects_velocity() {
        let mut it = still_item(21.0, 200.0);
        it.velocity = Velocity { vx: -2.0, vy: 0.0 };
        it.advance(1.0, Bounds::default());
        assert_eq!(it.position.x, ITEM_RADIUS);
        assert_eq!(it.velocity.vx, 2.0);
    }

    #[test]
    fn contains_point_is_circular_and_inclusive() {
        let it = still_item(100.0, 100.0);
        assert!(it.contains_point(Point::new(100.0, 100.0)));
        assert!(it.contains_point(Point::new(120.0, 100.0)));
        assert!(!it.contains_point(Point::new(115.0, 115.0)));
    }

    #[test]
    fn expiry_per_mode() {
        let it = still_item(100.0, 100.0);
        let five = Duration::from_secs(5);
        assert!(!it.is_expired(five - Duration::from_millis(1), GameMode::Tap));
        assert!(it.is_expired(five, GameMode::Tap));
        assert!(it.is_expired(five, GameMode::Grip));
        assert!(!it.is_expired(five, GameMode::Hold));
        assert!(it.is_expired(Duration::from_secs(10), GameMode::Hold));
        assert!(!it.is_expired(Duration::from_secs(3600), GameMode::SequentialTap));
    }

    #[test]
    fn time_left_counts_down() {
        let it = still_item(100.0, 100.0);
        assert_eq!(it.time_left(Duration::from_secs(2), GameMode::Tap), Some(Duration::from_secs(3)));
        assert_eq!(it.time_left(Duration::from_secs(9), GameMode::Tap), Some(Duration::ZERO));
        assert_eq!(it.time_left(Duration::ZERO, GameMode::SequentialTap), None);
    }

    #[test]
    fn respawn_keeps_sequence_slot() {
        let mut m = model();
        m.spawn(GameMode::SequentialTap, 1, Duration::ZERO);
        let old = m.by_sequence_index(3).unwrap().id;
        let new = m.respawn(old, 5, Duration::from_secs(1)).unwrap();
        assert_ne!(old, new);
        let it = m.by_sequence_index(3).unwrap();
        assert_eq!(it.id, new);
        assert_eq!(it.created_at, Duration::from_secs(1));
        assert!(it.velocity.is_zero());
        assert_eq!(m.items().len(), SEQUENCE_LEN as usize);
    }

    #[test]
    fn respawn_unknown_id_is_none() {
        let mut m = model();
        m.spawn(GameMode::Tap, 1, Duration::ZERO);
        assert_eq!(m.respawn(999, 1, Duration::ZERO), None);
    }
}
