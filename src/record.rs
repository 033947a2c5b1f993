use chrono::{DateTime, Duration, Local};
use serde::Serialize;

/// Timestamp layout written to both sinks.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp layout for on-screen clock times.
pub const CLOCK_FORMAT: &str = "%H:%M:%S";

/// Render whole seconds as `HH:MM:SS`. Hours keep counting past a day.
pub fn format_hms(total_secs: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        total_secs / 3600,
        (total_secs % 3600) / 60,
        total_secs % 60
    )
}

/// Fractional seconds are truncated; negative durations render as zero.
pub fn format_duration(duration: Duration) -> String {
    format_hms(duration.num_seconds().max(0) as u64)
}

pub fn format_timestamp(at: &DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Snapshot of a finished, annotated session handed to a sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRecord {
    pub owner_name: String,
    pub start_time: String,
    pub end_time: String,
    pub duration_formatted: String,
    pub description: String,
    pub location: String,
}

impl SessionRecord {
    pub fn new(
        owner_name: &str,
        started_at: &DateTime<Local>,
        ended_at: &DateTime<Local>,
        description: &str,
        location: &str,
    ) -> Self {
        Self {
            owner_name: owner_name.to_string(),
            start_time: format_timestamp(started_at),
            end_time: format_timestamp(ended_at),
            duration_formatted: format_duration(*ended_at - *started_at),
            description: description.to_string(),
            location: location.to_string(),
        }
    }

    /// The four columns a worksheet row carries: start, end, duration, description.
    pub fn sheet_row(&self) -> [&str; 4] {
        [
            self.start_time.as_str(),
            self.end_time.as_str(),
            self.duration_formatted.as_str(),
            self.description.as_str(),
        ]
    }
}

/// What the user sees right after ending a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub started_at: DateTime<Local>,
    pub ended_at: DateTime<Local>,
    pub duration_formatted: String,
}

impl SessionSummary {
    pub fn new(started_at: DateTime<Local>, ended_at: DateTime<Local>) -> Self {
        Self {
            started_at,
            ended_at,
            duration_formatted: format_duration(ended_at - started_at),
        }
    }

    pub fn start_clock(&self) -> String {
        self.started_at.format(CLOCK_FORMAT).to_string()
    }

    pub fn end_clock(&self) -> String {
        self.ended_at.format(CLOCK_FORMAT).to_string()
    }
}
