use anyhow::{anyhow, Context, Result};
use sessionwatch_core::clients::telegram::DEFAULT_API_BASE;
use sessionwatch_core::Destination;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub tautulli_base_url: String,
    pub tautulli_api_key: String,

    pub telegram_api_base: String,
    pub telegram_bot_token: String,
    pub destinations: Vec<Destination>,

    pub poll_interval: Duration,
    pub http_timeout: Duration,
    pub max_bandwidth_kbps: f64,

    pub history_path: PathBuf,
    pub message_ids_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let tautulli_base_url = env::var("TAUTULLI_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8181/api/v2".to_string());
        let tautulli_api_key =
            env::var("TAUTULLI_API_KEY").context("TAUTULLI_API_KEY must be set")?;

        let telegram_api_base =
            env::var("TELEGRAM_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        let telegram_bot_token =
            env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN must be set")?;

        let destinations = parse_csv_env("CHAT_DESTINATIONS")?
            .iter()
            .map(|raw| parse_destination(raw))
            .collect::<Result<Vec<_>>>()
            .context("CHAT_DESTINATIONS")?;

        let poll_interval =
            Duration::from_secs(parse_u64_env("POLL_INTERVAL_SECS", 15)?.max(1));
        let http_timeout =
            Duration::from_secs(parse_u64_env("HTTP_TIMEOUT_SECS", 10)?.max(1));
        let max_bandwidth_kbps = parse_f64_env("MAX_BANDWIDTH_KBPS", 120_000.0)?;

        let state_dir = PathBuf::from(env::var("STATE_DIR").unwrap_or_else(|_| ".".to_string()));
        let history_path = state_dir.join(
            env::var("HISTORY_FILE").unwrap_or_else(|_| "session_history.json".to_string()),
        );
        let message_ids_path = state_dir.join(
            env::var("MESSAGE_IDS_FILE").unwrap_or_else(|_| "message_ids.json".to_string()),
        );

        Ok(Self {
            tautulli_base_url,
            tautulli_api_key,
            telegram_api_base,
            telegram_bot_token,
            destinations,
            poll_interval,
            http_timeout,
            max_bandwidth_kbps,
            history_path,
            message_ids_path,
        })
    }
}

/// `chat_id` or `chat_id:thread_id`. The split is on the last colon so
/// `@channel` style ids stay intact.
pub fn parse_destination(raw: &str) -> Result<Destination> {
    let raw = raw.trim();
    match raw.rsplit_once(':') {
        Some((chat_id, thread)) => {
            let chat_id = chat_id.trim();
            if chat_id.is_empty() {
                return Err(anyhow!("Invalid destination: {raw} (empty chat id)"));
            }
            let thread_id = thread
                .trim()
                .parse::<i64>()
                .with_context(|| format!("Invalid thread id in destination: {raw}"))?;
            Ok(Destination::new(chat_id).with_thread(thread_id))
        }
        None if !raw.is_empty() => Ok(Destination::new(raw)),
        None => Err(anyhow!("Invalid destination: empty")),
    }
}

fn parse_csv_env(key: &str) -> Result<Vec<String>> {
    let raw = env::var(key).with_context(|| format!("{key} must be set (comma-separated)"))?;
    split_csv(key, &raw)
}

fn split_csv(key: &str, raw: &str) -> Result<Vec<String>> {
    let vals: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if vals.is_empty() {
        return Err(anyhow!("{key} must contain at least one destination"));
    }
    Ok(vals)
}

fn parse_u64_env(key: &str, default: u64) -> Result<u64> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<u64>()
        .with_context(|| format!("Invalid {key}: {raw} (expected integer)"))
}

fn parse_f64_env(key: &str, default: f64) -> Result<f64> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<f64>()
        .with_context(|| format!("Invalid {key}: {raw} (expected number)"))
}
