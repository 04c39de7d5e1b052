//! Landmark sources — an external detector process or mouse simulation.
//!
//! Both run on their own thread and deliver [`LandmarkFrame`]s over an
//! `mpsc` channel in capture order.  The game loop reads them through a
//! [`FrameFeed`], which keeps only the newest frame per tick.  Consumers
//! don't need to know whether a frame came from a camera or the mouse.

use std::io::{BufRead, BufReader};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use rehab_core::gesture::{
    LandmarkError, Landmarks, Point, INDEX_FINGER_MCP, INDEX_FINGER_TIP, LANDMARK_COUNT,
    MIDDLE_FINGER_TIP, THUMB_TIP, WRIST,
};
use rehab_core::item::{SCREEN_H, SCREEN_W};

use crate::config::DetectorConfig;

// ════════════════════════════════════════════════════════════════════════════
// LandmarkFrame / LandmarkSource
// ════════════════════════════════════════════════════════════════════════════

/// One capture: a hand in display pixels, or no hand.
#[derive(Clone, Debug)]
pub struct LandmarkFrame {
    pub landmarks:   Option<Landmarks>,
    pub captured_at: Instant,
}

impl LandmarkFrame {
    pub fn now(landmarks: Option<Landmarks>) -> Self {
        LandmarkFrame { landmarks, captured_at: Instant::now() }
    }
}

/// Anything that can deliver [`LandmarkFrame`]s over a channel.
pub trait LandmarkSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<LandmarkFrame>);
}

/// Spawn a landmark source on its own thread and return the receiving end.
pub fn spawn_landmark_source<L: LandmarkSource>(source: L) -> Receiver<LandmarkFrame> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// FrameFeed
// ════════════════════════════════════════════════════════════════════════════

/// Per-tick view of a landmark channel.
pub struct FrameFeed {
    rx:          Receiver<LandmarkFrame>,
    latest:      Option<LandmarkFrame>,
    stale_after: Duration,
    connected:   bool,
}

impl FrameFeed {
    pub fn new(rx: Receiver<LandmarkFrame>, stale_after: Duration) -> Self {
        FrameFeed { rx, latest: None, stale_after, connected: true }
    }

    /// Drain pending frames (oldest first) and return the newest hand, if
    /// it is still fresh.
    pub fn poll(&mut self) -> Option<Landmarks> {
        self.poll_at(Instant::now())
    }

    pub fn poll_at(&mut self, now: Instant) -> Option<Landmarks> {
        loop {
            match self.rx.try_recv() {
                Ok(frame) => self.latest = Some(frame),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.connected {
                        log::warn!("landmark source stopped; continuing without a hand");
                        self.connected = false;
                    }
                    break;
                }
            }
        }
        let frame = self.latest.as_ref()?;
        if now.saturating_duration_since(frame.captured_at) > self.stale_after {
            return None;
        }
        frame.landmarks.clone()
    }

    pub fn is_connected(&self) -> bool { self.connected }
}

// ════════════════════════════════════════════════════════════════════════════
// Coordinate conversion
// ════════════════════════════════════════════════════════════════════════════

/// Convert detector output to display pixels: scale 0..1 fractions to
/// 640×480 and mirror x for the selfie view (`x' = width - 1 - x`).
pub fn to_display(raw: &[[f32; 2]], normalized: bool, mirror: bool) -> Result<Landmarks, LandmarkError> {
    let points = raw
        .iter()
        .map(|&[x, y]| {
            let (mut px, py) = if normalized {
                ((x * SCREEN_W).trunc(), (y * SCREEN_H).trunc())
            } else {
                (x, y)
            };
            if mirror {
                px = (SCREEN_W - 1.0) - px;
            }
            Point::new(px, py)
        })
        .collect();
    Landmarks::from_points(points)
}

// ════════════════════════════════════════════════════════════════════════════
// DetectorSource — external process
// ════════════════════════════════════════════════════════════════════════════

/// One line of detector output.
#[derive(Deserialize, Debug)]
struct DetectorLine {
    #[serde(default)]
    landmarks: Option<Vec<[f32; 2]>>,
    #[serde(default)]
    error:     Option<String>,
}

/// Owns the detector child process; kills it when dropped.
pub struct DetectorProcess {
    child: Child,
}

impl Drop for DetectorProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Reads the detector's stdout: a `READY` line, then one JSON object per
/// captured frame.
pub struct DetectorSource {
    reader:     BufReader<ChildStdout>,
    normalized: bool,
    mirror:     bool,
}

impl DetectorSource {
    /// Launch the detector and wait for it to report `READY`.  Any failure
    /// here means there is no camera, which is fatal for the game.
    pub fn launch(cfg: &DetectorConfig) -> Result<(DetectorProcess, DetectorSource)> {
        let Some((program, args)) = cfg.command.split_first() else {
            bail!("Detector command is empty");
        };

        log::info!("starting hand detector: {}", cfg.command.join(" "));
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("Failed to start hand detector `{}`", program))?;

        let stdout = child.stdout.take().context("Failed to get detector stdout")?;
        let process = DetectorProcess { child };

        // Handshake read runs off-thread; on timeout dropping `process` kills the child.
        let (ready_tx, ready_rx) = mpsc::channel();
        thread::Builder::new()
            .name("detector-handshake".to_string())
            .spawn(move || {
                let mut reader = BufReader::new(stdout);
                let mut line = String::new();
                let res = reader.read_line(&mut line).map(|_| line);
                let _ = ready_tx.send((reader, res));
            })
            .context("Failed to start detector handshake thread")?;

        let wait = Duration::from_millis(cfg.ready_timeout_ms);
        let Ok((reader, first)) = ready_rx.recv_timeout(wait) else {
            bail!(
                "Cannot open webcam: detector did not signal ready within {:.1} s. \
                 Please check camera connection and index.",
                wait.as_secs_f32()
            );
        };
        let ready = first.context("Failed to read from hand detector")?;
        if ready.trim() != "READY" {
            bail!(
                "Cannot open webcam: detector did not signal ready (got {:?}). \
                 Please check camera connection and index.",
                ready.trim()
            );
        }
        log::info!("hand detector ready");

        Ok((process, DetectorSource { reader, normalized: cfg.normalized, mirror: cfg.mirror }))
    }

    fn parse_line(&self, line: &str) -> Option<Landmarks> {
        let parsed: DetectorLine = match serde_json::from_str(line) {
            Ok(p)  => p,
            Err(e) => {
                log::debug!("unparseable detector line ({}): {}", e, line.trim());
                return None;
            }
        };
        if let Some(err) = parsed.error {
            log::warn!("detector error: {}", err);
            return None;
        }
        match to_display(parsed.landmarks.as_deref()?, self.normalized, self.mirror) {
            Ok(hand) => Some(hand),
            Err(e)   => {
                log::warn!("{}", e);
                None
            }
        }
    }
}

impl LandmarkSource for DetectorSource {
    fn run(mut self: Box<Self>, tx: Sender<LandmarkFrame>) {
        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => {
                    log::warn!("hand detector closed its output");
                    return;
                }
                Ok(_) => {
                    let hand = self.parse_line(&line);
                    if tx.send(LandmarkFrame::now(hand)).is_err() { return; }
                }
                Err(e) => {
                    log::warn!("hand detector read failed: {}", e);
                    return;
                }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimLandmarkSource — mouse simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw pointer input from the simulation window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimInput {
    /// Mouse inside the window; `pinch` while the left button is held.
    Pointer { x: f32, y: f32, pinch: bool },
    /// Mouse left the window.
    HandLost,
}

/// Landmark source driven by [`SimInput`] events from the visualizer's
/// window.  Each input becomes one synthetic 21-point hand whose index tip
/// sits under the mouse.
pub struct SimLandmarkSource {
    pub rx: Receiver<SimInput>,
}

impl LandmarkSource for SimLandmarkSource {
    fn run(self: Box<Self>, tx: Sender<LandmarkFrame>) {
        for input in self.rx {
            let hand = match input {
                SimInput::Pointer { x, y, pinch } => Some(synthetic_hand(Point::new(x, y), pinch)),
                SimInput::HandLost                => None,
            };
            if tx.send(LandmarkFrame::now(hand)).is_err() { return; }
        }
    }
}

/// A plausible right hand pointing up with the index tip at `tip`.  The
/// thumb tip sits ~23 px from the index tip when pinching, ~78 px otherwise.
pub fn synthetic_hand(tip: Point, pinch: bool) -> Landmarks {
    let at = |dx: f32, dy: f32| Point::new(tip.x + dx, tip.y + dy);
    let mut pts = [at(0.0, 0.0); LANDMARK_COUNT];

    pts[WRIST]            = at(10.0, 150.0);
    pts[INDEX_FINGER_MCP] = at(0.0, 70.0);
    pts[6]                = at(0.0, 45.0);
    pts[7]                = at(0.0, 20.0);
    pts[INDEX_FINGER_TIP] = tip;
    pts[MIDDLE_FINGER_TIP] = at(25.0, 30.0);
    for (i, dx) in [(9, 25.0), (13, 45.0), (17, 62.0)] {
        pts[i] = at(dx, 75.0);
    }
    for (i, dx) in [(10, 25.0), (11, 25.0), (14, 45.0), (15, 45.0), (16, 45.0),
                    (18, 62.0), (19, 62.0), (20, 62.0)] {
        pts[i] = at(dx, 60.0);
    }

    let thumb = if pinch { at(-12.0, 20.0) } else { at(-60.0, 50.0) };
    pts[1] = at(-30.0, 120.0);
    pts[2] = at(-45.0, 95.0);
    pts[3] = Point::new((pts[2].x + thumb.x) / 2.0, (pts[2].y + thumb.y) / 2.0);
    pts[THUMB_TIP] = thumb;

    Landmarks::new(pts)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use rehab_core::gesture::classify;

    #[test]
    fn synthetic_hand_pinches_only_when_asked() {
        let tip = Point::new(200.0, 200.0);
        let open = classify(Some(&synthetic_hand(tip, false)));
        let closed = classify(Some(&synthetic_hand(tip, true)));
        assert_eq!(open.pointer, Some(tip));
        assert!(!open.pinch_active);
        assert!(closed.pinch_active);
    }

    #[test]
    fn to_display_scales_and_mirrors() {
        let mut raw = vec![[0.5, 0.5]; LANDMARK_COUNT];
        raw[INDEX_FINGER_TIP] = [0.25, 0.5];
        let hand = to_display(&raw, true, true).unwrap();
        // 0.25 * 640 = 160 → mirrored 639 - 160 = 479
        assert_eq!(hand.index_tip(), Point::new(479.0, 240.0));

        let plain = to_display(&raw, true, false).unwrap();
        assert_eq!(plain.index_tip(), Point::new(160.0, 240.0));
    }

    #[test]
    fn to_display_rejects_partial_hand() {
        let raw = vec![[0.5, 0.5]; 9];
        assert_eq!(to_display(&raw, true, true).unwrap_err(), LandmarkError::WrongCount(9));
    }

    #[test]
    fn sim_source_forwards_in_order() {
        let (sim_tx, sim_rx) = mpsc::channel();
        let rx = spawn_landmark_source(SimLandmarkSource { rx: sim_rx });
        sim_tx.send(SimInput::Pointer { x: 10.0, y: 20.0, pinch: false }).unwrap();
        sim_tx.send(SimInput::HandLost).unwrap();
        sim_tx.send(SimInput::Pointer { x: 30.0, y: 40.0, pinch: true }).unwrap();
        drop(sim_tx);

        let frames: Vec<_> = rx.iter().collect();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].landmarks.as_ref().unwrap().index_tip(), Point::new(10.0, 20.0));
        assert!(frames[1].landmarks.is_none());
        assert_eq!(frames[2].landmarks.as_ref().unwrap().index_tip(), Point::new(30.0, 40.0));
    }

    #[test]
    fn feed_keeps_newest_frame() {
        let (tx, rx) = mpsc::channel();
        let mut feed = FrameFeed::new(rx, Duration::from_millis(150));
        let t0 = Instant::now();
        for x in [10.0, 20.0, 30.0] {
            let hand = synthetic_hand(Point::new(x, 100.0), false);
            tx.send(LandmarkFrame { landmarks: Some(hand), captured_at: t0 }).unwrap();
        }
        let hand = feed.poll_at(t0).unwrap();
        assert_eq!(hand.index_tip().x, 30.0);
        // Nothing new, still fresh → same frame
        assert!(feed.poll_at(t0 + Duration::from_millis(100)).is_some());
        // Too old
        assert!(feed.poll_at(t0 + Duration::from_millis(200)).is_none());
    }

    #[test]
    fn feed_survives_disconnect() {
        let (tx, rx) = mpsc::channel::<LandmarkFrame>();
        let mut feed = FrameFeed::new(rx, Duration::from_millis(150));
        drop(tx);
        assert!(feed.poll().is_none());
        assert!(!feed.is_connected());
    }

    #[test]
    fn detector_line_parsing() {
        let (process, source) = match DetectorSource::launch(&DetectorConfig {
            command: vec!["sh".into(), "-c".into(), "echo READY; sleep 5".into()],
            ..DetectorConfig::default()
        }) {
            Ok(pair) => pair,
            // No POSIX shell on this machine
            Err(_) => return,
        };
        let coords: Vec<[f32; 2]> = vec![[0.1, 0.2]; LANDMARK_COUNT];
        let line = serde_json::json!({ "landmarks": coords }).to_string();
        assert!(source.parse_line(&line).is_some());
        assert!(source.parse_line(r#"{"landmarks": null}"#).is_none());
        assert!(source.parse_line(r#"{"error": "camera busy"}"#).is_none());
        assert!(source.parse_line("garbage").is_none());
        drop(process);
    }

    #[test]
    fn detector_without_ready_is_fatal() {
        let res = DetectorSource::launch(&DetectorConfig {
            command: vec!["sh".into(), "-c".into(), "echo nope".into()],
            ..DetectorConfig::default()
        });
        assert!(res.is_err());
    }

    #[test]
    fn silent_detector_times_out() {
        let started = Instant::now();
        let res = DetectorSource::launch(&DetectorConfig {
            command: vec!["sh".into(), "-c".into(), "sleep 30".into()],
            ready_timeout_ms: 300,
            ..DetectorConfig::default()
        });
        let err = match res {
            Ok(_)  => panic!("a detector that never says READY must not launch"),
            Err(e) => format!("{:#}", e),
        };
        assert!(started.elapsed() < Duration::from_secs(10), "took {:?}", started.elapsed());
        // No POSIX shell on this machine
        if err.contains("Failed to start") { return; }
        assert!(err.contains("within"), "{}", err);
    }

    #[test]
    fn empty_detector_command_is_fatal() {
        assert!(DetectorSource::launch(&DetectorConfig::default()).is_err());
    }
}
