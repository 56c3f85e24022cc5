//! Telegram Bot API client for posting and editing status messages.

use super::{ChatApi, ChatError};
use crate::models::{Destination, MessageId};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

const PARSE_MODE: &str = "Markdown";

#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    api_base: String,
    token: String,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_thread_id: Option<i64>,
}

#[derive(Debug, Serialize)]
struct EditRequest<'a> {
    chat_id: &'a str,
    message_id: MessageId,
    text: &'a str,
    parse_mode: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    error_code: Option<i64>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: MessageId,
}

impl TelegramClient {
    pub fn new(api_base: String, token: String, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Telegram HTTP client")?;
        Ok(Self {
            http,
            api_base,
            token,
        })
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<ApiResponse<T>, ChatError>
    where
        B: Serialize + ?Sized,
        T: for<'de> Deserialize<'de>,
    {
        let url = format!(
            "{}/bot{}/{}",
            self.api_base.trim_end_matches('/'),
            self.token,
            method
        );
        let resp = self.http.post(&url).json(body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        serde_json::from_str(&text).map_err(|_| ChatError::Rejected {
            code: i64::from(status.as_u16()),
            description: text,
        })
    }
}

/// Map a failed Bot API reply onto the edit outcomes.
fn classify_failure(
    message_id: Option<MessageId>,
    error_code: Option<i64>,
    description: Option<String>,
) -> ChatError {
    let description = description.unwrap_or_else(|| "no description".to_string());
    let lowered = description.to_lowercase();
    match message_id {
        Some(id) if lowered.contains("message to edit not found") => ChatError::MessageNotFound(id),
        _ => ChatError::Rejected {
            code: error_code.unwrap_or_default(),
            description,
        },
    }
}

#[async_trait]
impl ChatApi for TelegramClient {
    async fn send_message(&self, destination: &Destination, text: &str) -> Result<MessageId, ChatError> {
        let body = SendRequest {
            chat_id: &destination.chat_id,
            text,
            parse_mode: PARSE_MODE,
            message_thread_id: destination.thread_id,
        };
        let resp: ApiResponse<SentMessage> = self.call("sendMessage", &body).await?;

        match resp.result {
            Some(sent) if resp.ok => Ok(sent.message_id),
            _ => Err(classify_failure(None, resp.error_code, resp.description)),
        }
    }

    async fn edit_message(
        &self,
        destination: &Destination,
        message_id: MessageId,
        text: &str,
    ) -> Result<(), ChatError> {
        let body = EditRequest {
            chat_id: &destination.chat_id,
            message_id,
            text,
            parse_mode: PARSE_MODE,
        };
        let resp: ApiResponse<serde_json::Value> = self.call("editMessageText", &body).await?;

        if resp.ok {
            return Ok(());
        }
        // The remote already shows this text.
        if resp
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains("message is not modified"))
        {
            return Ok(());
        }
        Err(classify_failure(Some(message_id), resp.error_code, resp.description))
    }
}
