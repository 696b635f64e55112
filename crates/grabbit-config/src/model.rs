// SPDX-FileCopyrightText: 2026 Grabbit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Grabbit download bot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Grabbit configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GrabbitConfig {
    /// Bot identity and operator settings.
    #[serde(default)]
    pub bot: BotConfig,

    /// Telegram transport settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Entitlement store backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Download directory, delivery limits, and tier ceilings.
    #[serde(default)]
    pub download: DownloadConfig,

    /// Premium plan settings.
    #[serde(default)]
    pub premium: PremiumConfig,
}

/// Bot identity and operator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Display name used in captions and the start message.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Telegram user IDs allowed to run administrative commands.
    #[serde(default)]
    pub owner_ids: Vec<i64>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
            owner_ids: Vec::new(),
        }
    }
}

fn default_bot_name() -> String {
    "grabbit".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram transport configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. Required to serve.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Operator-controlled channel receiving archived oversized artifacts.
    /// `None` disables the archival path (oversized free-tier downloads fail
    /// with a notice instead).
    #[serde(default)]
    pub archive_channel_id: Option<i64>,
}

/// Entitlement store backend configuration.
///
/// Backends are probed in order at startup: remote document store (when
/// `remote_url` is set), embedded SQLite, flat JSON file. The first probe
/// that succeeds becomes the sole backend for the process lifetime.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Base URL of the remote document-store service. `None` skips the
    /// remote backend entirely.
    #[serde(default)]
    pub remote_url: Option<String>,

    /// Path of the embedded SQLite database.
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,

    /// Path of the flat JSON fallback document.
    #[serde(default = "default_json_path")]
    pub json_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            remote_url: None,
            sqlite_path: default_sqlite_path(),
            json_path: default_json_path(),
        }
    }
}

fn default_sqlite_path() -> String {
    "grabbit.sqlite3".to_string()
}

fn default_json_path() -> String {
    "grabbit.json".to_string()
}

/// Download directory, delivery ceiling, and tier limit configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DownloadConfig {
    /// Directory where fetched artifacts are materialized.
    #[serde(default = "default_download_dir")]
    pub dir: String,

    /// Delivery size ceiling in bytes. Artifacts above it take the
    /// disposition branch (split or archive).
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,

    /// Chunk size in bytes for the premium split path.
    #[serde(default = "default_split_chunk_bytes")]
    pub split_chunk_bytes: u64,

    /// Free-tier downloads allowed per daily window.
    #[serde(default = "default_free_daily_limit")]
    pub free_daily_limit: u32,

    /// Highest video resolution shown to free users.
    #[serde(default = "default_free_max_height")]
    pub free_max_height: u32,

    /// Highest audio bitrate (kbps) shown to free users.
    #[serde(default = "default_free_max_abr")]
    pub free_max_abr_kbps: u32,

    /// Extractor binary name or path.
    #[serde(default = "default_ytdlp_bin")]
    pub ytdlp_bin: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            dir: default_download_dir(),
            max_upload_bytes: default_max_upload_bytes(),
            split_chunk_bytes: default_split_chunk_bytes(),
            free_daily_limit: default_free_daily_limit(),
            free_max_height: default_free_max_height(),
            free_max_abr_kbps: default_free_max_abr(),
            ytdlp_bin: default_ytdlp_bin(),
        }
    }
}

fn default_download_dir() -> String {
    "downloads".to_string()
}

fn default_max_upload_bytes() -> u64 {
    // Just under Telegram's 2 GB bot upload ceiling.
    1_900 * 1024 * 1024
}

fn default_split_chunk_bytes() -> u64 {
    1_800 * 1024 * 1024
}

fn default_free_daily_limit() -> u32 {
    2
}

fn default_free_max_height() -> u32 {
    720
}

fn default_free_max_abr() -> u32 {
    192
}

fn default_ytdlp_bin() -> String {
    "yt-dlp".to_string()
}

/// Premium plan configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PremiumConfig {
    /// Default grant length when `/add_premium` is given without days.
    #[serde(default = "default_premium_days")]
    pub default_days: i64,

    /// Default plan label for grants.
    #[serde(default = "default_plan")]
    pub default_plan: String,

    /// Payment QR image URL shown with the premium offer.
    #[serde(default)]
    pub qr_url: Option<String>,
}

impl Default for PremiumConfig {
    fn default() -> Self {
        Self {
            default_days: default_premium_days(),
            default_plan: default_plan(),
            qr_url: None,
        }
    }
}

fn default_premium_days() -> i64 {
    30
}

fn default_plan() -> String {
    "Gold".to_string()
}
