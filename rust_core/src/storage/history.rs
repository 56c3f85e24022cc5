//! Session history store
//!
//! Keeps the last [`HISTORY_CAPACITY`] watched items, most recently inserted
//! first, unique per (title, user). Used as the report fallback when nothing
//! is playing. Every mutation is written through to disk.

use super::json_file::AtomicJsonFile;
use crate::models::{HistoryEntry, LiveSession};
use chrono::Utc;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const HISTORY_CAPACITY: usize = 10;

/// Sessions watched for less than this are not recorded.
pub const MIN_WATCH_SECONDS: f64 = 60.0;

/// On-disk shape. Older files may hold a single object instead of a list.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredHistory {
    Many(Vec<HistoryEntry>),
    One(HistoryEntry),
}

#[derive(Debug)]
pub struct SessionHistoryStore {
    file: AtomicJsonFile<StoredHistory>,
    entries: Vec<HistoryEntry>,
}

impl SessionHistoryStore {
    /// Open the store at `path`. A missing or unreadable file yields an
    /// empty history.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let file = AtomicJsonFile::new(path);
        let entries = match file.load() {
            Ok(Some(StoredHistory::Many(entries))) => entries,
            Ok(Some(StoredHistory::One(entry))) => vec![entry],
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Ignoring unreadable session history: {:#}", e);
                Vec::new()
            }
        };

        let mut store = Self { file, entries };
        store.normalize();
        store
    }

    /// Entries in stored order: index 0 is the most recently inserted.
    pub fn list(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a live session. Returns whether the history changed.
    pub fn record(&mut self, session: &LiveSession) -> bool {
        self.record_at(session, Utc::now().timestamp())
    }

    /// Record a live session with an explicit update time (unix seconds).
    ///
    /// An existing (title, user) entry is refreshed in place and keeps its
    /// position; a new one is inserted at the front and the list truncated.
    pub fn record_at(&mut self, session: &LiveSession, now: i64) -> bool {
        let elapsed = session.elapsed_seconds();
        if elapsed < MIN_WATCH_SECONDS {
            return false;
        }

        match self
            .entries
            .iter_mut()
            .find(|e| e.matches(&session.title, &session.user))
        {
            Some(entry) => {
                entry.elapsed_seconds = elapsed;
                entry.resolution = session.display_resolution().to_string();
                entry.is_transcoded = session.is_transcoding();
                entry.last_updated_at = now;
            }
            None => {
                debug!("New history entry: {} ({})", session.title, session.user);
                self.entries.insert(0, HistoryEntry::from_session(session, now));
                self.entries.truncate(HISTORY_CAPACITY);
            }
        }

        self.persist();
        true
    }

    fn persist(&self) {
        if let Err(e) = self.file.save(&StoredHistory::Many(self.entries.clone())) {
            warn!("Failed to persist session history: {:#}", e);
        }
    }

    /// Drop duplicate keys (first occurrence wins) and enforce the cap.
    fn normalize(&mut self) {
        let mut seen: Vec<(String, String)> = Vec::with_capacity(self.entries.len());
        self.entries.retain(|e| {
            let key = (e.title.clone(), e.user.clone());
            if seen.contains(&key) {
                false
            } else {
                seen.push(key);
                true
            }
        });
        self.entries.truncate(HISTORY_CAPACITY);
    }
}
