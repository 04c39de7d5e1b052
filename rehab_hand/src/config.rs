//! Application configuration.
//!
//! Read from `rehab_hand.json` in the working directory, or from the file
//! named by `REHAB_HAND_CONFIG`.  Every field has a default, so a missing
//! file (or a partial one) is fine; a file that exists but does not parse is
//! a startup error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use rehab_core::{GameMode, TICK_RATE};

pub const CONFIG_FILE: &str = "rehab_hand.json";
pub const CONFIG_ENV:  &str = "REHAB_HAND_CONFIG";

/// External hand-landmark detector launched as a child process.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Program and arguments, e.g. `["python3", "hand_detect.py"]`.
    pub command:    Vec<String>,
    /// Mirror x for the selfie view.
    pub mirror:     bool,
    /// Coordinates arrive as 0..1 fractions rather than pixels.
    pub normalized: bool,
    /// How long to wait for the `READY` line before giving up.
    pub ready_timeout_ms: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig { command: Vec::new(), mirror: true, normalized: true, ready_timeout_ms: 10_000 }
    }
}

/// Configuration for the full application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// High score and round journal live here.
    pub data_dir:       PathBuf,
    pub tick_rate:      u32,
    pub sound_enabled:  bool,
    pub initial_mode:   GameMode,
    /// `None` → mouse simulation.
    pub detector:       Option<DetectorConfig>,
    /// General MIDI program for the cues.
    pub midi_program:   u8,
    pub cue_velocity:   u8,
    /// A detector frame older than this counts as "no hand".
    pub stale_frame_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            data_dir:       PathBuf::from("data"),
            tick_rate:      TICK_RATE,
            sound_enabled:  true,
            initial_mode:   GameMode::Tap,
            detector:       None,
            midi_program:   11, // vibraphone
            cue_velocity:   100,
            stale_frame_ms: 150,
        }
    }
}

impl AppConfig {
    /// Load from `$REHAB_HAND_CONFIG` or `./rehab_hand.json`.
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("no config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read config {}", path.display()));
            }
        };
        let cfg: AppConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        log::info!("config loaded from {}", path.display());
        Ok(cfg.sanitized())
    }

    fn sanitized(mut self) -> Self {
        self.tick_rate    = self.tick_rate.clamp(10, 120);
        self.midi_program = self.midi_program.min(127);
        self.cue_velocity = self.cue_velocity.min(127);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let cfg = AppConfig::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, r#"{ "initial_mode": "hold", "sound_enabled": false,
                             "detector": { "command": ["python3", "hand_detect.py"] } }"#).unwrap();
        let cfg = AppConfig::load_from(&path).unwrap();
        assert_eq!(cfg.initial_mode, GameMode::Hold);
        assert!(!cfg.sound_enabled);
        assert_eq!(cfg.tick_rate, TICK_RATE);
        let det = cfg.detector.unwrap();
        assert_eq!(det.command, vec!["python3", "hand_detect.py"]);
        assert!(det.mirror && det.normalized);
        assert_eq!(det.ready_timeout_ms, 10_000);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "{ tick_rate: ").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn tick_rate_is_clamped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, r#"{ "tick_rate": 1000 }"#).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap().tick_rate, 120);
    }
}
