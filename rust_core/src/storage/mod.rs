//! Process-local persisted state: session history and status message ids.

pub mod history;
pub mod json_file;
pub mod message_ids;

pub use history::{SessionHistoryStore, HISTORY_CAPACITY, MIN_WATCH_SECONDS};
pub use json_file::AtomicJsonFile;
pub use message_ids::MessageIdStore;
