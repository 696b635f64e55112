// SPDX-FileCopyrightText: 2026 Grabbit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across the Grabbit workspace.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Seconds in the daily free-quota reset window.
pub const RESET_WINDOW_SECS: i64 = 86_400;

/// Telegram user identifier, treated as opaque by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an ephemeral conversation session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether an acquisition targets the video or the audio-only track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    pub fn is_audio(self) -> bool {
        matches!(self, MediaKind::Audio)
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Video => f.write_str("video"),
            MediaKind::Audio => f.write_str("audio"),
        }
    }
}

/// One row from the source's raw format list.
///
/// `filesize == 0` means the source did not declare a size. That is an
/// expected uncertainty, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingCandidate {
    pub format_id: String,
    pub has_video: bool,
    /// Vertical resolution for video entries.
    pub height: Option<u32>,
    /// Average bitrate in kbps for audio entries.
    pub abr: Option<f64>,
    /// Source-provided descriptive label, used when no numeric quality exists.
    pub note: Option<String>,
    pub filesize: u64,
}

/// Source metadata resolved without fetching the media body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub title: String,
    pub uploader: Option<String>,
    pub duration_secs: Option<u64>,
    pub view_count: Option<u64>,
    pub upload_date: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    /// Canonical URL, used for the actual fetch.
    pub webpage_url: String,
    pub formats: Vec<EncodingCandidate>,
}

/// The locally materialized output of a successful acquisition.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub path: PathBuf,
    pub title: String,
    pub size: u64,
    pub kind: MediaKind,
}

/// Progress events emitted by the extractor during a fetch.
///
/// Intermediate events may be dropped by the UI throttle, never reordered.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Downloading {
        percent: Option<f64>,
        speed: Option<String>,
        downloaded: u64,
        total: u64,
        eta_secs: Option<u64>,
    },
    Finished,
}

/// Per-user premium status and daily free-usage counter.
///
/// `daily_count` is meaningful only relative to `last_reset`: once the
/// reset window has elapsed the counter is logically zero regardless of
/// the stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitlementRecord {
    pub premium_until: Option<DateTime<Utc>>,
    pub plan: Option<String>,
    pub daily_count: u32,
    /// Unix timestamp of the current window start.
    pub last_reset: i64,
}

impl EntitlementRecord {
    /// Whether the daily window has elapsed at `now` (unix seconds).
    pub fn window_elapsed(&self, now: i64) -> bool {
        now - self.last_reset > RESET_WINDOW_SECS
    }

    /// Whether premium is active at `now`.
    pub fn premium_active(&self, now: DateTime<Utc>) -> bool {
        self.premium_until.is_some_and(|until| until > now)
    }
}

/// Append-only record of a delivered download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRecord {
    pub user: UserId,
    pub title: String,
    pub path: String,
    pub size: u64,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

/// Renders a byte count as a human-readable size ("1.25 GB").
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 B".to_string();
    }
    let exp = (bytes.ilog2() / 10).min(UNITS.len() as u32 - 1) as usize;
    let value = bytes as f64 / 1024f64.powi(exp as i32);
    if exp == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.2} {}", UNITS[exp])
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn human_size_scales_units() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.00 KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(human_size(1_900 * 1024 * 1024), "1.86 GB");
    }

    #[test]
    fn window_elapsed_after_24h() {
        let record = EntitlementRecord {
            last_reset: 1_000,
            ..Default::default()
        };
        assert!(!record.window_elapsed(1_000 + RESET_WINDOW_SECS));
        assert!(record.window_elapsed(1_000 + RESET_WINDOW_SECS + 1));
    }

    #[test]
    fn premium_active_respects_expiry() {
        let now = Utc::now();
        let record = EntitlementRecord {
            premium_until: Some(now + Duration::days(3)),
            ..Default::default()
        };
        assert!(record.premium_active(now));
        assert!(!record.premium_active(now + Duration::days(4)));

        let expired = EntitlementRecord::default();
        assert!(!expired.premium_active(now));
    }

    #[test]
    fn entitlement_record_round_trips_through_json() {
        let record = EntitlementRecord {
            premium_until: Some(Utc::now()),
            plan: Some("Gold".into()),
            daily_count: 2,
            last_reset: 1_700_000_000,
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: EntitlementRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }
}
