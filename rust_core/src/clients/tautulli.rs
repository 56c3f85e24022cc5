//! Tautulli API v2 client (read-only activity and history).

use super::MonitoringApi;
use crate::models::{LiveSession, RemoteHistoryItem};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

#[derive(Clone)]
pub struct TautulliClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for TautulliClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TautulliClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl TautulliClient {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Tautulli HTTP client")?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Call `cmd` and return `response.data`.
    async fn command(&self, cmd: &str, extra: &[(&str, String)]) -> Result<Value> {
        let mut query: Vec<(&str, String)> = vec![
            ("apikey", self.api_key.clone()),
            ("cmd", cmd.to_string()),
        ];
        query.extend(extra.iter().cloned());

        let resp = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("Tautulli request failed: cmd={cmd}"))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("Tautulli non-2xx: {status} cmd={cmd}"));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("Tautulli returned malformed JSON: cmd={cmd}"))?;
        unwrap_envelope(body).with_context(|| format!("cmd={cmd}"))
    }
}

/// Extract `response.data`, failing unless `response.result == "success"`.
fn unwrap_envelope(mut body: Value) -> Result<Value> {
    let response = body
        .get_mut("response")
        .ok_or_else(|| anyhow!("Tautulli response envelope missing"))?;

    let result = response
        .get("result")
        .and_then(|r| r.as_str())
        .unwrap_or("success");
    if result != "success" {
        let message = response
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("no message");
        return Err(anyhow!("Tautulli reported {result}: {message}"));
    }

    Ok(response.get_mut("data").map(Value::take).unwrap_or(Value::Null))
}

fn parse_sessions(data: &Value) -> Vec<LiveSession> {
    data.get("sessions")
        .and_then(|s| s.as_array())
        .map(|arr| arr.iter().map(LiveSession::from_value).collect())
        .unwrap_or_default()
}

fn parse_history(data: &Value) -> Vec<RemoteHistoryItem> {
    data.get("data")
        .and_then(|d| d.as_array())
        .map(|arr| arr.iter().map(RemoteHistoryItem::from_value).collect())
        .unwrap_or_default()
}

#[async_trait]
impl MonitoringApi for TautulliClient {
    async fn get_activity(&self) -> Result<Vec<LiveSession>> {
        let data = self.command("get_activity", &[]).await?;
        let sessions = parse_sessions(&data);
        debug!("Tautulli activity: {} sessions", sessions.len());
        Ok(sessions)
    }

    async fn get_history(&self, limit: usize) -> Result<Vec<RemoteHistoryItem>> {
        let data = self
            .command("get_history", &[("length", limit.to_string())])
            .await?;
        Ok(parse_history(&data))
    }
}
