//! Round journal — one JSON line per finished round, for progress tracking.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::GameMode;
use crate::storage::StorageError;

/// Summary of one round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub mode:        GameMode,
    pub score:       u32,
    pub level:       u32,
    pub hits:        u32,
    pub timeouts:    u32,
    pub started_at:  DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Append-only `rounds.jsonl` under the data directory.
#[derive(Debug, Clone)]
pub struct RoundJournal {
    path: PathBuf,
}

impl RoundJournal {
    pub const FILE_NAME: &'static str = "rounds.jsonl";

    pub fn in_dir(data_dir: &Path) -> Self {
        RoundJournal { path: data_dir.join(Self::FILE_NAME) }
    }

    pub fn path(&self) -> &Path { &self.path }

    pub fn append(&self, record: &RoundRecord) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io { path: self.path.clone(), source };
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        file.write_all(line.as_bytes()).map_err(io_err)
    }

    /// Every readable record, skipping malformed lines.
    pub fn read_all(&self) -> Vec<RoundRecord> {
        let Ok(contents) = fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        contents
            .lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| serde_json::from_str(l).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(score: u32) -> RoundRecord {
        let t = Utc::now();
        RoundRecord {
            mode: GameMode::Hold,
            score,
            level: score / 5 + 1,
            hits: score,
            timeouts: 2,
            started_at: t,
            finished_at: t,
            duration_ms: 61_000,
        }
    }

    #[test]
    fn appends_lines_in_order() {
        let dir = tempdir().unwrap();
        let j = RoundJournal::in_dir(dir.path());
        j.append(&record(3)).unwrap();
        j.append(&record(8)).unwrap();
        let all = j.read_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].score, 3);
        assert_eq!(all[1].score, 8);
        assert_eq!(all[1].mode, GameMode::Hold);
        let raw = fs::read_to_string(j.path()).unwrap();
        assert!(raw.contains("\"mode\":\"hold\""));
    }

    #[test]
    fn skips_garbage_lines() {
        let dir = tempdir().unwrap();
        let j = RoundJournal::in_dir(dir.path());
        j.append(&record(1)).unwrap();
        let mut f = OpenOptions::new().append(true).open(j.path()).unwrap();
        writeln!(f, "{{broken").unwrap();
        j.append(&record(2)).unwrap();
        assert_eq!(j.read_all().iter().map(|r| r.score).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn missing_journal_reads_empty() {
        let dir = tempdir().unwrap();
        assert!(RoundJournal::in_dir(dir.path()).read_all().is_empty());
    }
}
