//! Sessionwatch Core - media session reporting and live chat status sync.
//!
//! This module provides:
//! - Typed session and history records built from loose monitoring API JSON
//! - Formatting helpers (progress bars, durations, sizes, timestamps)
//! - A persisted, size-bounded session history used as a report fallback
//! - Three-tier report building (live, stored history, remote history)
//! - Reconciliation of one continuously edited status message per chat

pub mod clients;
pub mod formatters;
pub mod models;
pub mod reconciler;
pub mod report;
pub mod storage;

pub use clients::{ChatApi, ChatError, MonitoringApi, TautulliClient, TelegramClient};
pub use models::{Destination, HistoryEntry, LiveSession, MessageId, RemoteHistoryItem};
pub use reconciler::{DeliveryState, MessageReconciler, SyncSummary};
pub use report::ReportBuilder;
pub use storage::{MessageIdStore, SessionHistoryStore};
