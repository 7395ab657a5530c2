//! Per-user calculation history stored as JSON files.
//!
//! Each user has one file, `<user>.json`, under the store directory holding
//! their saved runs oldest first along with the next id to hand out, so ids
//! are never reused after a delete. Only the most recent
//! [`MAX_ENTRIES_PER_USER`] entries are kept. Files are replaced atomically.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use carbonlex_emissions::EmissionResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::StoreError;

pub const MAX_ENTRIES_PER_USER: usize = 50;

/// One saved calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Increases with every save for a user.
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    /// Number of uploaded rows the run was computed from.
    pub row_count: usize,
    pub result: EmissionResult,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UserHistory {
    next_id: u64,
    calculations: Vec<HistoryEntry>,
}

/// Directory-backed history store.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    /// Open the store at `dir`, creating the directory if needed.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        if dir.exists() && !dir.is_dir() {
            return Err(StoreError::NotADirectory(dir.to_path_buf()));
        }
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Append a result to `user`'s history and return its id.
    pub fn save(
        &self,
        user: &str,
        result: &EmissionResult,
        row_count: usize,
    ) -> Result<u64, StoreError> {
        let path = self.user_path(user)?;
        let mut history = read_history(&path)?;
        let id = history.next_id.max(1);
        history.next_id = id + 1;
        history.calculations.push(HistoryEntry {
            id,
            timestamp: Utc::now(),
            row_count,
            result: result.clone(),
        });
        if history.calculations.len() > MAX_ENTRIES_PER_USER {
            let excess = history.calculations.len() - MAX_ENTRIES_PER_USER;
            history.calculations.drain(..excess);
        }
        self.write_history(&path, &history)?;
        info!(user, id, total_kg = result.total_co2_kg(), "saved calculation");
        Ok(id)
    }

    /// Remove entry `id` from `user`'s history. Returns false when there is
    /// no such entry.
    pub fn delete(&self, user: &str, id: u64) -> Result<bool, StoreError> {
        let path = self.user_path(user)?;
        let mut history = read_history(&path)?;
        let before = history.calculations.len();
        history.calculations.retain(|e| e.id != id);
        if history.calculations.len() == before {
            debug!(user, id, "no such calculation");
            return Ok(false);
        }
        self.write_history(&path, &history)?;
        info!(user, id, "deleted calculation");
        Ok(true)
    }

    /// Up to `limit` of `user`'s entries, newest first.
    pub fn list(&self, user: &str, limit: usize) -> Result<Vec<HistoryEntry>, StoreError> {
        let path = self.user_path(user)?;
        let entries = read_history(&path)?.calculations;
        debug!(user, count = entries.len(), "read history");
        Ok(entries.into_iter().rev().take(limit).collect())
    }

    fn user_path(&self, user: &str) -> Result<PathBuf, StoreError> {
        let key = encode_user(user).ok_or_else(|| StoreError::InvalidUser(user.to_string()))?;
        Ok(self.dir.join(format!("{key}.json")))
    }

    fn write_history(&self, path: &Path, history: &UserHistory) -> Result<(), StoreError> {
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer_pretty(&mut tmp, history)?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

fn read_history(path: &Path) -> Result<UserHistory, StoreError> {
    if !path.exists() {
        return Ok(UserHistory::default());
    }
    let file = fs::File::open(path)?;
    Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
}

/// Map a user key to a file stem. Lowercase ASCII letters, digits, `-` and
/// `_` are kept; every other byte (uppercase and `%` included) becomes `%XX`.
/// Distinct keys give distinct stems, even on case-insensitive filesystems.
/// Blank keys are rejected.
fn encode_user(user: &str) -> Option<String> {
    let user = user.trim();
    if user.is_empty() {
        return None;
    }
    let mut out = String::with_capacity(user.len());
    for b in user.bytes() {
        match b {
            b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' => out.push(char::from(b)),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    Some(out)
}
