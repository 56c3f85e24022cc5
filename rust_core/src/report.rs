//! Status report assembly
//!
//! Each poll walks three tiers in order:
//! 1. live sessions from the monitoring API (recorded into history as a side effect)
//! 2. the locally persisted session history
//! 3. the monitoring API's own history endpoint
//!
//! An unreachable API short-circuits to [`UNREACHABLE_TEXT`].

use crate::clients::MonitoringApi;
use crate::formatters::{
    code, format_duration, format_size, format_timestamp, progress_bar, BANDWIDTH_CELL,
    BAR_LENGTH, DATE_UNAVAILABLE, PLAYBACK_CELL, TRANSCODE_CELL,
};
use crate::models::{HistoryEntry, LiveSession, RemoteHistoryItem};
use crate::storage::SessionHistoryStore;
use log::{debug, warn};

pub const UNREACHABLE_TEXT: &str = "Cannot reach the monitoring service. Waiting...";
pub const NO_ACTIVITY_TEXT: &str = "No active playback and no recent history.";

pub const DIRECT_PLAY_ICON: &str = "✅";
pub const TRANSCODE_ICON: &str = "⚠️";

/// Items requested from the remote history endpoint.
pub const REMOTE_HISTORY_LIMIT: usize = 10;

pub struct ReportBuilder<M> {
    api: M,
    history: SessionHistoryStore,
    max_bandwidth_kbps: f64,
}

impl<M: MonitoringApi> ReportBuilder<M> {
    pub fn new(api: M, history: SessionHistoryStore, max_bandwidth_kbps: f64) -> Self {
        Self {
            api,
            history,
            max_bandwidth_kbps,
        }
    }

    pub fn api(&self) -> &M {
        &self.api
    }

    pub fn history(&self) -> &SessionHistoryStore {
        &self.history
    }

    pub async fn build(&mut self) -> String {
        let sessions = match self.api.get_activity().await {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!("Activity query failed: {:#}", e);
                return UNREACHABLE_TEXT.to_string();
            }
        };

        if !sessions.is_empty() {
            for session in &sessions {
                self.history.record(session);
            }
            debug!("Rendering {} live sessions", sessions.len());
            return render_live_sessions(&sessions, self.max_bandwidth_kbps);
        }

        if !self.history.is_empty() {
            debug!("No live sessions; rendering {} stored entries", self.history.len());
            return render_stored_history(self.history.list());
        }

        match self.api.get_history(REMOTE_HISTORY_LIMIT).await {
            Ok(items) if items.is_empty() => NO_ACTIVITY_TEXT.to_string(),
            Ok(items) => render_remote_history(&items),
            Err(e) => {
                warn!("History query failed: {:#}", e);
                UNREACHABLE_TEXT.to_string()
            }
        }
    }
}

fn status_icon(transcoded: bool) -> &'static str {
    if transcoded {
        TRANSCODE_ICON
    } else {
        DIRECT_PLAY_ICON
    }
}

fn bandwidth_percent(bandwidth_kbps: f64, max_bandwidth_kbps: f64) -> f64 {
    if max_bandwidth_kbps <= 0.0 {
        return 0.0;
    }
    (bandwidth_kbps / max_bandwidth_kbps * 100.0).min(100.0)
}

/// One numbered block per session, in API order.
pub fn render_live_sessions(sessions: &[LiveSession], max_bandwidth_kbps: f64) -> String {
    sessions
        .iter()
        .enumerate()
        .map(|(i, s)| render_live_session(i + 1, s, max_bandwidth_kbps))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_live_session(idx: usize, s: &LiveSession, max_bandwidth_kbps: f64) -> String {
    let time = format!(
        "{} / {}",
        format_duration(s.elapsed_seconds()),
        format_duration(s.duration_seconds())
    );
    let transcoding = s.is_transcoding();

    let mut out = String::new();
    out.push_str(&format!("*Session {idx}:*\n"));
    out.push_str(&format!("🎬 *Playing:* {}\n", code(&s.title)));
    out.push_str(&format!("👤 *User:* {}\n", code(&s.user)));
    out.push_str(&format!("⏱️ *Time:* {}\n", code(&time)));
    out.push_str("📊 *Playback progress:*\n");
    out.push_str(&progress_bar(s.progress_percent, BAR_LENGTH, PLAYBACK_CELL));
    out.push('\n');
    out.push_str(&format!(
        "📶 *Bandwidth:* {}\n",
        code(&format!("{:.0} kbps", s.bandwidth_kbps))
    ));
    out.push_str(&progress_bar(
        bandwidth_percent(s.bandwidth_kbps, max_bandwidth_kbps),
        BAR_LENGTH,
        BANDWIDTH_CELL,
    ));
    out.push('\n');

    if transcoding {
        out.push_str("🍊 *Transcode progress:*\n");
        out.push_str(&progress_bar(s.transcode_progress, BAR_LENGTH, TRANSCODE_CELL));
        out.push('\n');
        out.push_str(&format!("⚡ *Transcode speed:* {}\n", code(&s.transcode_speed)));
    }

    out.push_str(&format!("📦 *File size:* {}\n", code(&format_size(s.file_size))));
    out.push('\n');
    out.push_str(&format!("🏛️ *Library:* {}\n", code(&s.library)));
    out.push_str(&format!("💻 *Device:* {}\n", code(&s.device)));
    out.push_str(&format!("🎥 *Player:* {}\n", code(&s.player)));
    out.push_str(&format!(
        "{} *Resolution:* {}\n",
        status_icon(transcoding),
        code(s.display_resolution())
    ));
    out
}

/// Stored entries oldest-inserted first, so the newest insert ends up last.
pub fn render_stored_history(entries: &[HistoryEntry]) -> String {
    entries
        .iter()
        .rev()
        .map(render_stored_entry)
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_stored_entry(e: &HistoryEntry) -> String {
    let when = if e.last_updated_at > 0 {
        format_timestamp(e.last_updated_at)
    } else {
        DATE_UNAVAILABLE.to_string()
    };
    let time = format!(
        "{} / {}",
        format_duration(e.elapsed_seconds),
        format_duration(e.duration_seconds)
    );

    let mut out = String::new();
    out.push_str(&format!("*{when} Playback:*\n"));
    out.push_str(&format!("🎬 *Played:* {}\n", code(&e.title)));
    out.push_str(&format!("👤 *User:* {}\n", code(&e.user)));
    out.push_str(&format!("⏱️ *Time:* {}\n", code(&time)));
    out.push_str(&progress_bar(e.progress_percent(), BAR_LENGTH, PLAYBACK_CELL));
    out.push('\n');
    out.push_str(&format!("📦 *File size:* {}\n", code(&format_size(e.file_size))));
    out.push_str(&format!("🏛️ *Library:* {}\n", code(&e.library)));
    out.push_str(&format!("💻 *Device:* {}\n", code(&e.device)));
    out.push_str(&format!("🎥 *Player:* {}\n", code(&e.player)));
    out.push_str(&format!(
        "{} *Resolution:* {}\n",
        status_icon(e.is_transcoded),
        code(&e.resolution)
    ));
    out
}

/// Remote items arrive newest first; render them chronologically.
pub fn render_remote_history(items: &[RemoteHistoryItem]) -> String {
    let mut blocks = vec![format!("*Last {} plays:*", items.len())];
    blocks.extend(
        items
            .iter()
            .rev()
            .enumerate()
            .map(|(i, item)| render_remote_item(i + 1, item)),
    );
    blocks.join("\n")
}

fn render_remote_item(idx: usize, item: &RemoteHistoryItem) -> String {
    let watched_at = item
        .watched_at
        .map(format_timestamp)
        .unwrap_or_else(|| DATE_UNAVAILABLE.to_string());
    let time = format!(
        "{} / {}",
        format_duration(item.view_offset),
        format_duration(item.duration)
    );

    let mut out = String::new();
    out.push_str(&format!("*Play {idx}:*\n"));
    out.push_str(&format!("🎬 *Title:* {}\n", code(&item.title)));
    out.push_str(&format!("👤 *User:* {}\n", code(&item.user)));
    out.push_str(&format!("🗓 *Date:* {}\n", code(&watched_at)));
    out.push_str(&format!("⏱️ *Watched:* {}\n", code(&time)));
    out
}
