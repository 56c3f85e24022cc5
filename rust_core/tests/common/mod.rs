//! Fake collaborators shared by the integration tests.
#![allow(dead_code)]

use anyhow::anyhow;
use async_trait::async_trait;
use sessionwatch_core::{
    ChatApi, ChatError, Destination, LiveSession, MessageId, MonitoringApi, RemoteHistoryItem,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

// ============================================================================
// Monitoring API
// ============================================================================

pub struct FakeMonitoring {
    pub activity: Mutex<Result<Vec<LiveSession>, String>>,
    pub history: Mutex<Result<Vec<RemoteHistoryItem>, String>>,
    pub activity_calls: AtomicUsize,
    pub history_calls: AtomicUsize,
}

impl Default for FakeMonitoring {
    fn default() -> Self {
        Self {
            activity: Mutex::new(Ok(Vec::new())),
            history: Mutex::new(Ok(Vec::new())),
            activity_calls: AtomicUsize::new(0),
            history_calls: AtomicUsize::new(0),
        }
    }
}

impl FakeMonitoring {
    pub fn with_sessions(sessions: Vec<LiveSession>) -> Self {
        let fake = Self::default();
        *fake.activity.lock().unwrap() = Ok(sessions);
        fake
    }

    pub fn unreachable() -> Self {
        let fake = Self::default();
        *fake.activity.lock().unwrap() = Err("connection refused".to_string());
        *fake.history.lock().unwrap() = Err("connection refused".to_string());
        fake
    }
}

#[async_trait]
impl MonitoringApi for FakeMonitoring {
    async fn get_activity(&self) -> anyhow::Result<Vec<LiveSession>> {
        self.activity_calls.fetch_add(1, Ordering::SeqCst);
        self.activity.lock().unwrap().clone().map_err(|e| anyhow!(e))
    }

    async fn get_history(&self, limit: usize) -> anyhow::Result<Vec<RemoteHistoryItem>> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        let items = self.history.lock().unwrap().clone().map_err(|e| anyhow!(e))?;
        Ok(items.into_iter().take(limit).collect())
    }
}

// ============================================================================
// Chat API
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCall {
    Send { chat_id: String, text: String },
    Edit { chat_id: String, message_id: MessageId, text: String },
}

pub struct FakeChat {
    pub calls: Mutex<Vec<ChatCall>>,
    next_id: AtomicI64,
    edit_failures: Mutex<HashMap<String, VecDeque<ChatError>>>,
    send_failures: Mutex<HashMap<String, VecDeque<ChatError>>>,
}

impl FakeChat {
    pub fn new(first_id: MessageId) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(first_id),
            edit_failures: Mutex::new(HashMap::new()),
            send_failures: Mutex::new(HashMap::new()),
        }
    }

    /// Fail the next edit in `chat_id` with `err`.
    pub fn fail_next_edit(&self, chat_id: &str, err: ChatError) {
        self.edit_failures
            .lock()
            .unwrap()
            .entry(chat_id.to_string())
            .or_default()
            .push_back(err);
    }

    /// Fail the next send to `chat_id` with `err`.
    pub fn fail_next_send(&self, chat_id: &str, err: ChatError) {
        self.send_failures
            .lock()
            .unwrap()
            .entry(chat_id.to_string())
            .or_default()
            .push_back(err);
    }

    pub fn calls(&self) -> Vec<ChatCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn take_calls(&self) -> Vec<ChatCall> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    fn pop_failure(
        map: &Mutex<HashMap<String, VecDeque<ChatError>>>,
        chat_id: &str,
    ) -> Option<ChatError> {
        map.lock()
            .unwrap()
            .get_mut(chat_id)
            .and_then(|q| q.pop_front())
    }
}

pub fn rejected(description: &str) -> ChatError {
    ChatError::Rejected {
        code: 400,
        description: description.to_string(),
    }
}

#[async_trait]
impl ChatApi for FakeChat {
    async fn send_message(&self, destination: &Destination, text: &str) -> Result<MessageId, ChatError> {
        self.calls.lock().unwrap().push(ChatCall::Send {
            chat_id: destination.chat_id.clone(),
            text: text.to_string(),
        });
        if let Some(err) = Self::pop_failure(&self.send_failures, &destination.chat_id) {
            return Err(err);
        }
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn edit_message(
        &self,
        destination: &Destination,
        message_id: MessageId,
        text: &str,
    ) -> Result<(), ChatError> {
        self.calls.lock().unwrap().push(ChatCall::Edit {
            chat_id: destination.chat_id.clone(),
            message_id,
            text: text.to_string(),
        });
        match Self::pop_failure(&self.edit_failures, &destination.chat_id) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

// ============================================================================
// Builders
// ============================================================================

pub fn session(title: &str, user: &str, offset_ms: f64, duration_ms: f64) -> LiveSession {
    LiveSession {
        title: title.to_string(),
        user: user.to_string(),
        view_offset_ms: offset_ms,
        duration_ms,
        progress_percent: if duration_ms > 0.0 {
            offset_ms / duration_ms * 100.0
        } else {
            0.0
        },
        ..LiveSession::default()
    }
}
