//! High-score persistence.
//!
//! The file holds a single JSON object: `{"high_score": <int>}`.  Reading
//! never fails from the caller's point of view: a missing, unreadable or
//! malformed file is a high score of 0.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not encode high score: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Where the best score lives between runs.
pub trait HighScoreStore {
    /// The stored value, or 0 when there is none.
    fn load(&self) -> u32;
    fn save(&mut self, score: u32) -> Result<(), StorageError>;
}

// ════════════════════════════════════════════════════════════════════════════
// JsonHighScoreStore
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize, Deserialize)]
struct HighScoreFile {
    high_score: u32,
}

/// High score kept in a small JSON file.
#[derive(Debug, Clone)]
pub struct JsonHighScoreStore {
    path: PathBuf,
}

impl JsonHighScoreStore {
    pub const FILE_NAME: &'static str = "highscore.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonHighScoreStore { path: path.into() }
    }

    /// `<data_dir>/highscore.json`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path { &self.path }
}

impl HighScoreStore for JsonHighScoreStore {
    fn load(&self) -> u32 {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return 0,
            Err(e) => {
                log::warn!("cannot read high score {}: {} — using 0", self.path.display(), e);
                return 0;
            }
        };
        match serde_json::from_str::<HighScoreFile>(&contents) {
            Ok(f)  => f.high_score,
            Err(e) => {
                log::warn!("corrupt high score {}: {} — using 0", self.path.display(), e);
                0
            }
        }
    }

    fn save(&mut self, score: u32) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .map_err(|source| StorageError::Io { path: dir.to_path_buf(), source })?;
        }
        let body = serde_json::to_string_pretty(&HighScoreFile { high_score: score })?;
        fs::write(&self.path, body)
            .map_err(|source| StorageError::Io { path: self.path.clone(), source })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MemoryHighScoreStore
// ════════════════════════════════════════════════════════════════════════════

/// In-process store for tests and runs without a data directory.
#[derive(Debug, Default, Clone)]
pub struct MemoryHighScoreStore {
    pub value: u32,
    pub saves: usize,
}

impl HighScoreStore for MemoryHighScoreStore {
    fn load(&self) -> u32 { self.value }

    fn save(&mut self, score: u32) -> Result<(), StorageError> {
        self.value = score;
        self.saves += 1;
        Ok(())
    }
}
