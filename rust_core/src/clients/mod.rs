//! External collaborators: the media monitoring API and the chat API.
//!
//! Both are traits so the report builder and reconciler can run against
//! fakes in tests.

pub mod tautulli;
pub mod telegram;

use crate::models::{Destination, LiveSession, MessageId, RemoteHistoryItem};
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

// Re-export commonly used types
pub use tautulli::TautulliClient;
pub use telegram::TelegramClient;

/// Read access to the media server monitoring API.
///
/// Any `Err` means the service is unreachable for this poll (network error,
/// timeout, non-2xx or malformed body).
#[async_trait]
pub trait MonitoringApi: Send + Sync {
    /// Sessions currently playing, in API order.
    async fn get_activity(&self) -> Result<Vec<LiveSession>>;

    /// The `limit` most recent watched items, newest first.
    async fn get_history(&self, limit: usize) -> Result<Vec<RemoteHistoryItem>>;
}

#[derive(Debug, Error)]
pub enum ChatError {
    /// The tracked message was deleted remotely.
    #[error("message {0} no longer exists")]
    MessageNotFound(MessageId),

    #[error("chat API request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("chat API rejected request ({code}): {description}")]
    Rejected { code: i64, description: String },
}

// The request URL embeds the bot token, so it never reaches the error text.
impl From<reqwest::Error> for ChatError {
    fn from(e: reqwest::Error) -> Self {
        ChatError::Transport(e.without_url())
    }
}

/// Delivery of status messages to chat destinations.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn send_message(&self, destination: &Destination, text: &str) -> Result<MessageId, ChatError>;

    /// `Err(ChatError::MessageNotFound)` when the message is gone; any other
    /// error leaves the message in an unknown state.
    async fn edit_message(
        &self,
        destination: &Destination,
        message_id: MessageId,
        text: &str,
    ) -> Result<(), ChatError>;
}
