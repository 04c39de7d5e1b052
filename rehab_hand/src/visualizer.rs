//! Software-rendered visualizer using `minifb`.
//!
//! Layout while playing:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ SCORE 7                                        LV 2  TAP     │
//! │                                                              │
//! │            (●)  target                                       │
//! │                          · · landmarks                       │
//! │                         ·  ·                                 │
//! │                                                              │
//! │                          TIME 3.2                            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything is drawn in the 640×480 display space the core uses, exactly
//! as given.  Mirroring has already happened upstream.

use std::sync::mpsc::Sender;
use std::time::Duration;

use anyhow::{anyhow, Result};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use rehab_core::engine::HOLD_REQUIRED;
use rehab_core::{GameMode, Item, Landmarks, Phase, Snapshot};

use crate::effects::{ActiveEffect, EffectKind};
use crate::landmarks::SimInput;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:      usize = 640;
pub const WIN_H:      usize = 480;
const BG_COLOR:       u32   = 0xFF1A1A2E;
const PANEL_BG:       u32   = 0xFF16213E;
const BUTTON_BG:      u32   = 0xFF0F3460;
const TEXT_COLOR:     u32   = 0xFFEEEEEE;
const DIM_TEXT:       u32   = 0xFF888888;
const ITEM_COLOR:     u32   = 0xFFE53935;
const HOLD_COLOR:     u32   = 0xFF42A5F5;
const SEQ_COLOR:      u32   = 0xFFB0BEC5;
const GOLD:           u32   = 0xFFFFD700;
const LANDMARK_COLOR: u32   = 0xFF00E676;
const FAIL_COLOR:     u32   = 0xFFFF1744;

// ════════════════════════════════════════════════════════════════════════════
// UI commands
// ════════════════════════════════════════════════════════════════════════════

/// What a key press or button click asks the app to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiCommand {
    Start,
    SelectMode(GameMode),
    ToggleSound,
    Back,
    PlayAgain,
    Quit,
}

const KEYMAP: &[(Key, UiCommand)] = &[
    (Key::Enter,  UiCommand::Start),
    (Key::Space,  UiCommand::Start),
    (Key::Key1,   UiCommand::SelectMode(GameMode::Tap)),
    (Key::Key2,   UiCommand::SelectMode(GameMode::Grip)),
    (Key::Key3,   UiCommand::SelectMode(GameMode::Hold)),
    (Key::Key4,   UiCommand::SelectMode(GameMode::SequentialTap)),
    (Key::M,      UiCommand::ToggleSound),
    (Key::Escape, UiCommand::Back),
    (Key::R,      UiCommand::PlayAgain),
    (Key::Q,      UiCommand::Quit),
];

pub fn key_command(key: Key) -> Option<UiCommand> {
    KEYMAP.iter().find(|(k, _)| *k == key).map(|(_, c)| *c)
}

/// A clickable rectangle on one of the menu screens.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Button {
    pub x:       usize,
    pub y:       usize,
    pub w:       usize,
    pub h:       usize,
    pub label:   &'static str,
    pub command: UiCommand,
}

impl Button {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x as f32 && x < (self.x + self.w) as f32
            && y >= self.y as f32 && y < (self.y + self.h) as f32
    }
}

const BUTTON_W: usize = 240;
const BUTTON_H: usize = 40;

fn column(labels: &[(&'static str, UiCommand)], top: usize) -> Vec<Button> {
    labels.iter().enumerate().map(|(i, &(label, command))| Button {
        x: (WIN_W - BUTTON_W) / 2,
        y: top + i * (BUTTON_H + 12),
        w: BUTTON_W,
        h: BUTTON_H,
        label,
        command,
    }).collect()
}

/// Buttons shown in `phase`.  None while playing.
pub fn buttons(phase: Phase) -> Vec<Button> {
    match phase {
        Phase::Menu => column(&[
            ("START",      UiCommand::Start),
            ("SOUND",      UiCommand::ToggleSound),
            ("QUIT",       UiCommand::Quit),
        ], 200),
        Phase::ModeSelect => {
            let mut v: Vec<(&'static str, UiCommand)> = GameMode::ALL.iter()
                .map(|&m| (m.name(), UiCommand::SelectMode(m)))
                .collect();
            v.push(("BACK", UiCommand::Back));
            column(&v, 120)
        }
        Phase::GameOver { .. } => column(&[
            ("PLAY AGAIN", UiCommand::PlayAgain),
            ("MENU",       UiCommand::Back),
        ], 280),
        Phase::Playing => Vec::new(),
    }
}

pub fn button_at(phase: Phase, x: f32, y: f32) -> Option<UiCommand> {
    buttons(phase).into_iter().find(|b| b.contains(x, y)).map(|b| b.command)
}

// ════════════════════════════════════════════════════════════════════════════
// Scene — everything one frame needs
// ════════════════════════════════════════════════════════════════════════════

pub struct Scene<'a> {
    pub snapshot:  Snapshot<'a>,
    pub landmarks: Option<&'a Landmarks>,
    pub effects:   &'a [ActiveEffect],
    /// Game clock, for time-left and effect progress.
    pub now:       Duration,
}

// ════════════════════════════════════════════════════════════════════════════
// Canvas — the framebuffer and its drawing primitives
// ════════════════════════════════════════════════════════════════════════════

pub struct Canvas {
    buf: Vec<u32>,
}

impl Default for Canvas {
    fn default() -> Self { Canvas { buf: vec![BG_COLOR; WIN_W * WIN_H] } }
}

impl Canvas {
    pub fn pixels(&self) -> &[u32] { &self.buf }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        if x < WIN_W && y < WIN_H { Some(self.buf[y * WIN_W + x]) } else { None }
    }

    /// Draw one whole frame.
    pub fn draw_scene(&mut self, scene: &Scene<'_>) {
        self.buf.fill(BG_COLOR);
        let snap = &scene.snapshot;

        match snap.phase {
            Phase::Menu            => self.draw_menu(snap),
            Phase::ModeSelect      => self.draw_mode_select(snap),
            Phase::Playing         => self.draw_playing(scene),
            Phase::GameOver { score, high_score, new_record } =>
                self.draw_game_over(score, high_score, new_record),
        }

        // Drawn on every screen; a pinch over a button presses it.
        if let Some(lm) = scene.landmarks {
            self.draw_landmarks(lm);
        }
    }

    // ── screens ───────────────────────────────────────────────────────────

    fn draw_menu(&mut self, snap: &Snapshot<'_>) {
        self.draw_text_centered("REHAB HAND", 80, 5, GOLD);
        self.draw_text_centered(&format!("HIGH SCORE {}", snap.high_score), 150, 2, TEXT_COLOR);
        self.draw_buttons(Phase::Menu);
        let sound = if snap.sound_enabled { "SOUND ON" } else { "SOUND OFF" };
        self.draw_text_centered(sound, 380, 2, DIM_TEXT);
        self.draw_text_centered("ENTER=START  M=SOUND  Q=QUIT", WIN_H - 24, 1, DIM_TEXT);
    }

    fn draw_mode_select(&mut self, snap: &Snapshot<'_>) {
        self.draw_text_centered("SELECT MODE", 50, 4, GOLD);
        self.draw_buttons(Phase::ModeSelect);
        for (b, mode) in buttons(Phase::ModeSelect).iter().zip(GameMode::ALL) {
            if mode == snap.mode {
                self.draw_border(b.x.saturating_sub(3), b.y.saturating_sub(3), b.w + 6, b.h + 6, GOLD);
            }
        }
        let y = buttons(Phase::ModeSelect).last().map(|b| b.y + b.h + 20).unwrap_or(400);
        self.draw_text_centered(snap.mode.hint(), y, 1, TEXT_COLOR);
        self.draw_text_centered("1-4=MODE  ENTER=PLAY  ESC=BACK", WIN_H - 24, 1, DIM_TEXT);
    }

    fn draw_game_over(&mut self, score: u32, high_score: u32, new_record: bool) {
        self.draw_text_centered("GAME OVER", 70, 5, FAIL_COLOR);
        self.draw_text_centered(&format!("SCORE {}", score), 150, 3, TEXT_COLOR);
        self.draw_text_centered(&format!("HIGH SCORE {}", high_score), 190, 2, TEXT_COLOR);
        if new_record {
            self.draw_text_centered("NEW RECORD!", 225, 3, GOLD);
        }
        self.draw_buttons(Phase::GameOver { score, high_score, new_record });
        self.draw_text_centered("R=PLAY AGAIN  ESC=MENU  Q=QUIT", WIN_H - 24, 1, DIM_TEXT);
    }

    fn draw_playing(&mut self, scene: &Scene<'_>) {
        let snap = &scene.snapshot;
        let expected = snap.session.map(|s| s.sequence_next());

        for item in snap.items {
            match item.sequence_index {
                Some(idx) => self.draw_sequence_target(item, idx, expected == Some(idx)),
                None if snap.mode == GameMode::Hold => self.draw_hold_zone(item),
                None => {
                    self.fill_circle(item.position.x, item.position.y, item.radius, ITEM_COLOR);
                }
            }
        }

        for fx in scene.effects {
            self.draw_effect(fx, scene.now);
        }

        self.draw_hud(scene);
    }

    fn draw_hud(&mut self, scene: &Scene<'_>) {
        let snap = &scene.snapshot;
        let (score, level) = snap.session.map(|s| (s.score(), s.level())).unwrap_or((0, 1));

        self.fill_rect(0, 0, WIN_W, 24, PANEL_BG);
        self.draw_text(&format!("SCORE {}", score), 8, 5, 3, TEXT_COLOR);

        let right = format!("LV {}  {}", level, snap.mode.name());
        let w = text_width(&right, 3);
        self.draw_text(&right, WIN_W.saturating_sub(w + 8), 5, 3, TEXT_COLOR);

        if !snap.sound_enabled {
            self.draw_text("MUTE", WIN_W / 2 - 8, 8, 1, DIM_TEXT);
        }

        let bottom = match snap.mode {
            GameMode::SequentialTap => snap.session.map(|s| format!("NEXT {}", s.sequence_next())),
            mode => snap.items.first()
                .and_then(|i| i.time_left(scene.now, mode))
                .map(|t| format!("TIME {:.1}", t.as_secs_f32())),
        };
        if let Some(text) = bottom {
            self.draw_text_centered(&text, WIN_H - 30, 3, TEXT_COLOR);
        }
    }

    // ── items ─────────────────────────────────────────────────────────────

    fn draw_sequence_target(&mut self, item: &Item, index: u32, expected: bool) {
        let (x, y, r) = (item.position.x, item.position.y, item.radius);
        let color = if expected { GOLD } else { SEQ_COLOR };
        if expected {
            self.fill_circle(x, y, r, blend(BG_COLOR, GOLD, 0.25));
        }
        self.draw_ring(x, y, r, 3.0, color);
        let label = index.to_string();
        let w = text_width(&label, 2) as f32;
        self.draw_text(&label, (x - w / 2.0).max(0.0) as usize, (y - 5.0).max(0.0) as usize, 2, color);
    }

    fn draw_hold_zone(&mut self, item: &Item) {
        let (x, y, r) = (item.position.x, item.position.y, item.radius);
        let progress = item.hold_progress.as_secs_f32() / HOLD_REQUIRED.as_secs_f32();
        self.draw_ring(x, y, r, 3.0, HOLD_COLOR);
        if progress > 0.0 {
            self.fill_circle(x, y, (r - 3.0) * progress.min(1.0), blend(HOLD_COLOR, GOLD, progress));
            let pct = format!("{}%", (progress.min(1.0) * 100.0) as u32);
            let w = text_width(&pct, 1) as f32;
            self.draw_text(&pct, (x - w / 2.0).max(0.0) as usize, (y + r + 4.0).max(0.0) as usize, 1, TEXT_COLOR);
        }
    }

    fn draw_landmarks(&mut self, lm: &Landmarks) {
        for p in lm.points() {
            self.fill_circle(p.x, p.y, 3.0, LANDMARK_COLOR);
        }
        let tip = lm.index_tip();
        self.draw_ring(tip.x, tip.y, 7.0, 2.0, LANDMARK_COLOR);
    }

    // ── effects ───────────────────────────────────────────────────────────

    fn draw_effect(&mut self, fx: &ActiveEffect, now: Duration) {
        let t = fx.progress(now);
        match fx.kind {
            EffectKind::HitRings { at } => {
                let color = blend(TEXT_COLOR, BG_COLOR, t);
                for k in 0..3 {
                    self.draw_ring(at.x, at.y, 20.0 + 30.0 * t + 8.0 * k as f32, 2.0, color);
                }
            }
            EffectKind::GripRing { at } => {
                self.draw_ring(at.x, at.y, 24.0 + 20.0 * t, 4.0, blend(GOLD, BG_COLOR, t));
            }
            EffectKind::FailMark => {
                let color = blend(FAIL_COLOR, BG_COLOR, t);
                for i in 0..6 {
                    self.draw_border(i, i, WIN_W - 2 * i, WIN_H - 2 * i, color);
                }
                self.draw_text_centered("MISS", WIN_H / 2 - 20, 5, color);
            }
            EffectKind::LevelUp { level } => {
                let color = blend(GOLD, BG_COLOR, t * t);
                self.draw_text_centered(&format!("LEVEL {}", level), WIN_H / 3, 6, color);
            }
        }
    }

    fn draw_buttons(&mut self, phase: Phase) {
        for b in buttons(phase) {
            self.fill_rect(b.x, b.y, b.w, b.h, BUTTON_BG);
            self.draw_border(b.x, b.y, b.w, b.h, TEXT_COLOR);
            let w = text_width(b.label, 3);
            self.draw_text(b.label, b.x + b.w.saturating_sub(w) / 2, b.y + (b.h - 15) / 2, 3, TEXT_COLOR);
        }
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y+h).min(WIN_H) {
            for col in x..(x+w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 { return; }
        for col in x..(x+w).min(WIN_W) {
            if y < WIN_H           { self.buf[y           * WIN_W + col] = color; }
            if y+h-1 < WIN_H       { self.buf[(y+h-1)     * WIN_W + col] = color; }
        }
        for row in y..(y+h).min(WIN_H) {
            if x < WIN_W           { self.buf[row * WIN_W + x    ] = color; }
            if x+w-1 < WIN_W       { self.buf[row * WIN_W + x+w-1] = color; }
        }
    }

    fn set_pixel(&mut self, x: isize, y: isize, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < WIN_W && (y as usize) < WIN_H {
            self.buf[y as usize * WIN_W + x as usize] = color;
        }
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, color: u32) {
        self.annulus(cx, cy, 0.0, r, color);
    }

    fn draw_ring(&mut self, cx: f32, cy: f32, r: f32, thickness: f32, color: u32) {
        self.annulus(cx, cy, (r - thickness).max(0.0), r, color);
    }

    /// Pixels whose distance from the centre lies in `[inner, outer]`.
    fn annulus(&mut self, cx: f32, cy: f32, inner: f32, outer: f32, color: u32) {
        if outer <= 0.0 { return; }
        let (in2, out2) = (inner * inner, outer * outer);
        let x0 = (cx - outer).floor() as isize;
        let x1 = (cx + outer).ceil() as isize;
        let y0 = (cy - outer).floor() as isize;
        let y1 = (cy + outer).ceil() as isize;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let (dx, dy) = (x as f32 - cx, y as f32 - cy);
                let d2 = dx * dx + dy * dy;
                if d2 >= in2 && d2 <= out2 {
                    self.set_pixel(x, y, color);
                }
            }
        }
    }

    /// Minimal bitmap font — 3×5 glyphs, scaled by an integer factor.
    fn draw_text(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let scale = scale.max(1);
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
            if cx + 4 * scale > WIN_W { break; }
        }
    }

    fn draw_text_centered(&mut self, text: &str, y: usize, scale: usize, color: u32) {
        let w = text_width(text, scale);
        self.draw_text(text, WIN_W.saturating_sub(w) / 2, y, scale, color);
    }
}

fn text_width(text: &str, scale: usize) -> usize {
    (text.chars().count() * 4).saturating_sub(1) * scale.max(1)
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer — the window
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    canvas: Canvas,
    /// `None` when a real detector drives the hand.
    sim_tx: Option<Sender<SimInput>>,
}

impl Visualizer {
    pub fn new(sim_tx: Option<Sender<SimInput>>, tick_rate: u32) -> Result<Self> {
        let mut window = Window::new(
            "Rehab Hand",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| anyhow!("Cannot open window: {}", e))?;

        window.limit_update_rate(Some(Duration::from_micros(1_000_000 / tick_rate.max(1) as u64)));

        Ok(Visualizer { window, canvas: Canvas::default(), sim_tx })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Forward the mouse to the simulated hand and collect key commands.
    pub fn poll_input(&mut self) -> Vec<UiCommand> {
        if let Some(tx) = &self.sim_tx {
            let input = match self.window.get_mouse_pos(MouseMode::Discard) {
                Some((x, y)) => SimInput::Pointer {
                    x, y,
                    pinch: self.window.get_mouse_down(MouseButton::Left),
                },
                None => SimInput::HandLost,
            };
            let _ = tx.send(input);
        }

        self.window.get_keys_pressed(KeyRepeat::No)
            .into_iter()
            .filter_map(key_command)
            .collect()
    }

    /// Render one frame.
    pub fn render(&mut self, scene: &Scene<'_>) -> Result<()> {
        self.canvas.draw_scene(scene);
        self.window.update_with_buffer(self.canvas.pixels(), WIN_W, WIN_H)
            .map_err(|e| anyhow!("window update failed: {}", e))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

/// Alpha-blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0-t) + cb as f32 * t) as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    0xFF000000 | (lerp(ar,br) << 16) | (lerp(ag,bg) << 8) | lerp(ab,bb)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rehab_core::item::Velocity;
    use rehab_core::{Bounds, GameFlow, MemoryHighScoreStore, Point, SessionState};

    use crate::landmarks::synthetic_hand;

    fn flow() -> GameFlow<MemoryHighScoreStore, StdRng> {
        GameFlow::new(MemoryHighScoreStore::default(), StdRng::seed_from_u64(3), Bounds::default())
    }

    fn render(flow: &GameFlow<MemoryHighScoreStore, StdRng>, lm: Option<&Landmarks>) -> Canvas {
        let mut c = Canvas::default();
        c.draw_scene(&Scene { snapshot: flow.snapshot(), landmarks: lm, effects: &[], now: Duration::ZERO });
        c
    }

    #[test]
    fn keymap_covers_every_command() {
        assert_eq!(key_command(Key::Enter),  Some(UiCommand::Start));
        assert_eq!(key_command(Key::Key3),   Some(UiCommand::SelectMode(GameMode::Hold)));
        assert_eq!(key_command(Key::Key4),   Some(UiCommand::SelectMode(GameMode::SequentialTap)));
        assert_eq!(key_command(Key::M),      Some(UiCommand::ToggleSound));
        assert_eq!(key_command(Key::Escape), Some(UiCommand::Back));
        assert_eq!(key_command(Key::R),      Some(UiCommand::PlayAgain));
        assert_eq!(key_command(Key::Q),      Some(UiCommand::Quit));
        assert_eq!(key_command(Key::Z),      None);
    }

    #[test]
    fn buttons_fit_and_do_not_overlap() {
        let phases = [
            Phase::Menu,
            Phase::ModeSelect,
            Phase::GameOver { score: 1, high_score: 2, new_record: false },
        ];
        for phase in phases {
            let bs = buttons(phase);
            assert!(!bs.is_empty());
            for b in &bs {
                assert!(b.x + b.w <= WIN_W && b.y + b.h <= WIN_H);
            }
            for w in bs.windows(2) {
                assert!(w[0].y + w[0].h <= w[1].y);
            }
        }
        assert!(buttons(Phase::Playing).is_empty());
    }

    #[test]
    fn button_hit_test() {
        let b = buttons(Phase::ModeSelect)[1];
        let (cx, cy) = ((b.x + b.w / 2) as f32, (b.y + b.h / 2) as f32);
        assert_eq!(button_at(Phase::ModeSelect, cx, cy), Some(UiCommand::SelectMode(GameMode::Grip)));
        assert_eq!(button_at(Phase::ModeSelect, 2.0, 2.0), None);
        assert_eq!(button_at(Phase::Playing, cx, cy), None);
    }

    fn playing<'a>(mode: GameMode, items: &'a [Item], session: &'a SessionState) -> Snapshot<'a> {
        Snapshot {
            phase:         Phase::Playing,
            mode,
            items,
            session:       Some(session),
            last_event:    None,
            high_score:    0,
            sound_enabled: true,
        }
    }

    #[test]
    fn items_are_drawn_where_they_are() {
        let item = |id, seq: Option<u32>, x, y| Item {
            id,
            sequence_index: seq,
            position:       Point::new(x, y),
            radius:         20.0,
            created_at:     Duration::ZERO,
            velocity:       Velocity::default(),
            hold_progress:  Duration::ZERO,
        };
        let session = SessionState::new(GameMode::SequentialTap, true);
        let items = [item(1, Some(1), 300.0, 200.0), item(2, Some(2), 100.0, 120.0)];
        let mut c = Canvas::default();
        let scene = Scene {
            snapshot:  playing(GameMode::SequentialTap, &items, &session),
            landmarks: None,
            effects:   &[],
            now:       Duration::ZERO,
        };
        c.draw_scene(&scene);

        // expected target is filled and ringed in gold, the other only ringed
        assert_eq!(c.pixel(300 + 19, 200), Some(GOLD));
        assert_eq!(c.pixel(100 + 19, 120), Some(SEQ_COLOR));
        assert_eq!(c.pixel(100 + 12, 120), Some(BG_COLOR));

        let single = [item(3, None, 400.0, 300.0)];
        let scene = Scene {
            snapshot:  playing(GameMode::Tap, &single, &session),
            landmarks: None,
            effects:   &[],
            now:       Duration::ZERO,
        };
        c.draw_scene(&scene);
        assert_eq!(c.pixel(400, 300), Some(ITEM_COLOR));
        assert_eq!(c.pixel(400 - 19, 300), Some(ITEM_COLOR));
    }

    #[test]
    fn landmarks_are_not_flipped() {
        let f = flow();
        let hand = synthetic_hand(Point::new(100.0, 300.0), false);
        let c = render(&f, Some(&hand));
        let wrist = hand.points()[0];
        assert_eq!(c.pixel(wrist.x as usize, wrist.y as usize), Some(LANDMARK_COLOR));
        assert_ne!(c.pixel(WIN_W - 1 - wrist.x as usize, wrist.y as usize), Some(LANDMARK_COLOR));
    }

    #[test]
    fn shapes_clip_at_the_edges() {
        let mut c = Canvas::default();
        c.fill_circle(-5.0, -5.0, 30.0, ITEM_COLOR);
        c.draw_ring(WIN_W as f32, WIN_H as f32, 25.0, 3.0, GOLD);
        c.draw_text("NEW RECORD! 100%", WIN_W - 20, WIN_H - 3, 4, GOLD);
        assert_eq!(c.pixel(0, 0), Some(ITEM_COLOR));
    }

    #[test]
    fn blend_endpoints() {
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 0.0), 0xFF000000);
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 1.0), 0xFFFFFFFF);
    }
}
