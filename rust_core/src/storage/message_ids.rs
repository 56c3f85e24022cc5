use super::json_file::AtomicJsonFile;
use crate::models::MessageId;
use anyhow::Result;
use log::warn;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Persisted `chat_id -> message_id` map for the live status messages.
#[derive(Debug)]
pub struct MessageIdStore {
    file: AtomicJsonFile<BTreeMap<String, MessageId>>,
}

impl MessageIdStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: AtomicJsonFile::new(path),
        }
    }

    /// Missing or corrupt files load as an empty map.
    pub fn load(&self) -> BTreeMap<String, MessageId> {
        match self.file.load() {
            Ok(ids) => ids.unwrap_or_default(),
            Err(e) => {
                warn!("Ignoring unreadable message id file: {:#}", e);
                BTreeMap::new()
            }
        }
    }

    /// Replace the whole document in one atomic write.
    pub fn save(&self, ids: &BTreeMap<String, MessageId>) -> Result<()> {
        self.file.save(ids)
    }
}
