//! Plain-text formatting helpers for status reports
//!
//! Pure functions: progress bars, durations, byte sizes, timestamps and
//! code-span quoting for the chat markup.

use chrono::{Local, TimeZone};

pub const BAR_LENGTH: usize = 15;
pub const EMPTY_CELL: &str = "⬜";
pub const PLAYBACK_CELL: &str = "🟩";
pub const BANDWIDTH_CELL: &str = "🟦";
pub const TRANSCODE_CELL: &str = "🟧";

pub const DATE_UNAVAILABLE: &str = "Date unavailable";

const KB: f64 = 1024.0;
const MB: f64 = KB * 1024.0;
const GB: f64 = MB * 1024.0;

/// Render `length` cells, `round(length * percent / 100)` of them filled,
/// followed by the clamped percentage with one decimal.
pub fn progress_bar(percent: f64, length: usize, filled_cell: &str) -> String {
    let percent = clamp_percent(percent);
    let filled = filled_cells(percent, length);

    let mut out = String::with_capacity(length * 4 + 8);
    for _ in 0..filled {
        out.push_str(filled_cell);
    }
    for _ in filled..length {
        out.push_str(EMPTY_CELL);
    }
    out.push_str(&format!(" {percent:.1}%"));
    out
}

fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    }
}

fn filled_cells(percent: f64, length: usize) -> usize {
    ((length as f64 * percent / 100.0).round() as usize).min(length)
}

/// `"1h 02m 03.5s"` from one hour up, `"2m 03.5s"` below.
pub fn format_duration(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let hours = (seconds / 3600.0).floor() as u64;
    let minutes = ((seconds % 3600.0) / 60.0).floor() as u64;
    let secs = seconds % 60.0;

    if hours > 0 {
        format!("{hours}h {minutes:02}m {secs:04.1}s")
    } else {
        format!("{minutes}m {secs:04.1}s")
    }
}

/// Largest fitting unit among B/KB/MB/GB (1024 base). Negative or
/// non-finite input counts as zero.
pub fn format_size(bytes: f64) -> String {
    let bytes = if bytes.is_finite() { bytes.max(0.0) } else { 0.0 };

    if bytes < KB {
        format!("{bytes:.0} B")
    } else if bytes < MB {
        format!("{:.1} KB", bytes / KB)
    } else if bytes < GB {
        format!("{:.1} MB", bytes / MB)
    } else {
        format!("{:.1} GB", bytes / GB)
    }
}

/// `"DD/MM/YYYY HH:MM:SS"` in local time, or [`DATE_UNAVAILABLE`].
pub fn format_timestamp(epoch_seconds: i64) -> String {
    match Local.timestamp_opt(epoch_seconds, 0).single() {
        Some(dt) => dt.format("%d/%m/%Y %H:%M:%S").to_string(),
        None => DATE_UNAVAILABLE.to_string(),
    }
}

/// Quote a user-controlled value as a Markdown code span. Backticks are
/// replaced so the value cannot terminate the span.
pub fn code(value: &str) -> String {
    format!("`{}`", value.replace('`', "'"))
}
