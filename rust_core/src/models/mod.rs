// Shared models for the session status services
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const UNTITLED: &str = "Untitled";
pub const UNKNOWN: &str = "Unknown";
pub const UNSPECIFIED: &str = "Unspecified";

/// Transcode decision reported for sessions that stream the source file untouched.
pub const DIRECT_PLAY: &str = "direct play";

/// Chat message identifier as returned by the chat API.
pub type MessageId = i64;

// ============================================================================
// Field extraction (monitoring API payloads are loosely typed)
// ============================================================================

/// Read a non-empty string field. Numbers are accepted and stringified.
pub fn get_str(v: &Value, key: &str) -> Option<String> {
    match v.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Read a numeric field that may arrive as a JSON number or a numeric string.
pub fn get_f64(v: &Value, key: &str) -> Option<f64> {
    let parsed = match v.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|x| x.is_finite())
}

fn get_i64(v: &Value, key: &str) -> Option<i64> {
    get_f64(v, key).map(|x| x as i64)
}

// ============================================================================
// Live sessions (get_activity)
// ============================================================================

/// A session currently playing on the media server.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveSession {
    pub title: String,
    pub user: String,
    pub progress_percent: f64,
    /// Playback position in milliseconds.
    pub view_offset_ms: f64,
    /// Total length in milliseconds.
    pub duration_ms: f64,
    pub bandwidth_kbps: f64,
    pub transcode_decision: String,
    pub transcode_progress: f64,
    pub transcode_speed: String,
    pub video_resolution: String,
    pub stream_video_resolution: Option<String>,
    pub file_size: f64,
    pub library: String,
    pub device: String,
    pub player: String,
}

impl Default for LiveSession {
    fn default() -> Self {
        Self {
            title: UNTITLED.to_string(),
            user: UNKNOWN.to_string(),
            progress_percent: 0.0,
            view_offset_ms: 0.0,
            duration_ms: 0.0,
            bandwidth_kbps: 0.0,
            transcode_decision: DIRECT_PLAY.to_string(),
            transcode_progress: 0.0,
            transcode_speed: "N/A".to_string(),
            video_resolution: UNSPECIFIED.to_string(),
            stream_video_resolution: None,
            file_size: 0.0,
            library: UNKNOWN.to_string(),
            device: UNSPECIFIED.to_string(),
            player: UNSPECIFIED.to_string(),
        }
    }
}

impl LiveSession {
    /// Build a session from one entry of `response.data.sessions`.
    /// Missing or malformed fields fall back to defaults.
    pub fn from_value(v: &Value) -> Self {
        let d = Self::default();
        Self {
            title: get_str(v, "full_title").unwrap_or(d.title),
            user: get_str(v, "user").unwrap_or(d.user),
            progress_percent: get_f64(v, "progress_percent").unwrap_or(0.0),
            view_offset_ms: get_f64(v, "view_offset").unwrap_or(0.0),
            duration_ms: get_f64(v, "duration").unwrap_or(0.0),
            bandwidth_kbps: get_f64(v, "bandwidth").unwrap_or(0.0),
            transcode_decision: get_str(v, "transcode_decision").unwrap_or(d.transcode_decision),
            transcode_progress: get_f64(v, "transcode_progress").unwrap_or(0.0),
            transcode_speed: get_str(v, "transcode_speed").unwrap_or(d.transcode_speed),
            video_resolution: get_str(v, "video_resolution").unwrap_or(d.video_resolution),
            stream_video_resolution: get_str(v, "stream_video_resolution"),
            file_size: get_f64(v, "file_size").unwrap_or(0.0),
            library: get_str(v, "library_name").unwrap_or(d.library),
            device: get_str(v, "device").unwrap_or(d.device),
            player: get_str(v, "player").unwrap_or(d.player),
        }
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.view_offset_ms.max(0.0) / 1000.0
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_ms.max(0.0) / 1000.0
    }

    pub fn is_transcoding(&self) -> bool {
        !self.transcode_decision.trim().eq_ignore_ascii_case(DIRECT_PLAY)
    }

    /// Stream resolution while transcoding (when reported), else the source resolution.
    pub fn display_resolution(&self) -> &str {
        match &self.stream_video_resolution {
            Some(stream) if self.is_transcoding() => stream,
            _ => &self.video_resolution,
        }
    }
}

// ============================================================================
// Persisted history
// ============================================================================

/// A recently watched item, keyed by (title, user).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub title: String,
    pub user: String,
    pub elapsed_seconds: f64,
    pub duration_seconds: f64,
    #[serde(default)]
    pub file_size: f64,
    #[serde(default = "unknown")]
    pub library: String,
    #[serde(default = "unspecified")]
    pub device: String,
    #[serde(default = "unspecified")]
    pub player: String,
    #[serde(default = "unspecified")]
    pub resolution: String,
    #[serde(default)]
    pub is_transcoded: bool,
    /// Unix seconds of the last upsert.
    #[serde(default)]
    pub last_updated_at: i64,
}

fn unknown() -> String {
    UNKNOWN.to_string()
}

fn unspecified() -> String {
    UNSPECIFIED.to_string()
}

impl HistoryEntry {
    pub fn from_session(session: &LiveSession, now: i64) -> Self {
        Self {
            title: session.title.clone(),
            user: session.user.clone(),
            elapsed_seconds: session.elapsed_seconds(),
            duration_seconds: session.duration_seconds(),
            file_size: session.file_size,
            library: session.library.clone(),
            device: session.device.clone(),
            player: session.player.clone(),
            resolution: session.display_resolution().to_string(),
            is_transcoded: session.is_transcoding(),
            last_updated_at: now,
        }
    }

    pub fn matches(&self, title: &str, user: &str) -> bool {
        self.title == title && self.user == user
    }

    /// Watched share in percent; 0 when the duration is unknown.
    pub fn progress_percent(&self) -> f64 {
        if self.duration_seconds > 0.0 {
            self.elapsed_seconds / self.duration_seconds * 100.0
        } else {
            0.0
        }
    }
}

// ============================================================================
// Remote history (get_history)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteHistoryItem {
    pub title: String,
    pub user: String,
    /// Unix seconds; `watched_at` with `date` as fallback.
    pub watched_at: Option<i64>,
    pub view_offset: f64,
    pub duration: f64,
}

impl RemoteHistoryItem {
    pub fn from_value(v: &Value) -> Self {
        Self {
            title: get_str(v, "full_title").unwrap_or_else(|| UNTITLED.to_string()),
            user: get_str(v, "user").unwrap_or_else(|| UNKNOWN.to_string()),
            watched_at: get_i64(v, "watched_at").or_else(|| get_i64(v, "date")),
            view_offset: get_f64(v, "view_offset").unwrap_or(0.0),
            duration: get_f64(v, "duration").unwrap_or(0.0),
        }
    }
}

// ============================================================================
// Chat destinations
// ============================================================================

/// A chat that carries one continuously edited status message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Destination {
    pub chat_id: String,
    /// Forum topic new messages are posted into.
    pub thread_id: Option<i64>,
}

impl Destination {
    pub fn new(chat_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            thread_id: None,
        }
    }

    pub fn with_thread(mut self, thread_id: i64) -> Self {
        self.thread_id = Some(thread_id);
        self
    }
}
