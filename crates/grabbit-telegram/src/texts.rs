// SPDX-FileCopyrightText: 2026 Grabbit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User-facing message templates.
//!
//! All copy the bot sends lives here so the handlers stay free of
//! string literals.

use grabbit_core::{human_size, MediaInfo};

pub const FETCHING_INFO: &str = "🔎 Fetching video info...";
pub const PREPARING_DOWNLOAD: &str = "⏳ Preparing download...";
pub const DOWNLOAD_FINISHED: &str = "✅ Download finished, preparing upload...";
pub const SESSION_EXPIRED: &str = "Session expired";
pub const NO_VIDEO_FORMATS: &str = "No video formats found";
pub const NO_AUDIO_FORMATS: &str = "No audio formats found";
pub const VIDEO_PREMIUM_ONLY: &str = "Higher qualities are premium only";
pub const AUDIO_PREMIUM_ONLY: &str = "High bitrates are premium only";
pub const SELECT_VIDEO: &str = "Select video quality (lowest → highest):";
pub const SELECT_AUDIO: &str = "Select audio quality (lowest → highest):";
pub const ACQUISITION_STARTED: &str = "Download started. Progress will update shortly.";
pub const UNKNOWN_ACTION: &str = "Unknown action";
pub const RENAME_PROMPT: &str =
    "✏️ Send the new filename (without extension) — Premium only. Reply /skip to keep original.";
pub const PREMIUM_CTA: &str = "💎 Want more features? Upgrade:";
pub const CORRECT_ADD_CMD: &str =
    "❌ Wrong command format.\n\n✅ Correct format:\n`/add_premium [user_id] [days]`";
pub const CORRECT_RM_CMD: &str =
    "❌ Wrong command format.\n\n✅ Correct format:\n`/rmpremium [user_id]`";
pub const NOT_PREMIUM: &str = "You are not premium. Use /add_premium (owner) or upgrade link.";
pub const NO_STORAGE_CHANNEL: &str = "Failed to store file: no storage channel configured.";

pub const HELP: &str = "🛠️ Commands\n\
/start - start\n\
/help - this help\n\
/add_premium [user_id] [days] - owner only\n\
/rmpremium [user_id] - owner only\n\
/check_premium - check your premium status\n";

pub fn start(bot_name: &str) -> String {
    format!(
        "👋 Hi — *{bot_name}*\n\n\
         Send a YouTube link and I'll show info + download options.\n\n\
         ✅ I only help you download videos you *own*.\n\
         💎 Use /add_premium to add premium users (owner only)."
    )
}

pub fn premium_plans(free_limit: u32) -> String {
    format!(
        "💎 *Premium Plans*\n\n\
         Free: {free_limit} free downloads/day\n\n\
         Silver: 7 days — Faster downloads, up to 1080p\n\
         Gold: 30 days — Up to 4K, 320kbps audio, larger uploads, instant queue\n\
         Platinum: 365 days — All Gold perks + file splitting, priority support\n\n\
         Scan QR to pay & contact admin for activation."
    )
}

pub fn failed_info(error: &str) -> String {
    format!("⚠️ Failed to fetch info: {error}")
}

pub fn download_error(error: &str) -> String {
    format!("❌ Download error: {error}")
}

pub fn free_limit_reached(limit: u32) -> String {
    format!(
        "⚠️ You reached your free daily download limit ({limit}/day). \
         Upgrade to Premium to remove the limit."
    )
}

pub fn file_too_large(size: u64) -> String {
    format!(
        "⚠️ File too large to send via Telegram ({}). \
         I can store in storage channel or split (Premium only).",
        human_size(size)
    )
}

pub fn stored_in_channel(channel_id: i64) -> String {
    format!("Your file was uploaded to storage channel {channel_id}.")
}

pub fn delivery_caption(title: &str, bot_name: &str) -> String {
    format!("✅ *{title}*\nDownloaded by @{bot_name}")
}

pub fn part_caption(title: &str, index: usize, total: usize, bot_name: &str) -> String {
    format!("{title} (part {index}/{total}) - by {bot_name}")
}

pub fn archive_caption(user_id: i64, title: &str) -> String {
    format!("Stored for user {user_id} - {title}")
}

/// Overview card shown after a successful probe, with a truncated
/// single-line description.
pub fn overview(info: &MediaInfo) -> String {
    let desc: String = info
        .description
        .as_deref()
        .unwrap_or("")
        .chars()
        .take(300)
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect();
    format!(
        "🎬 *{}*\n👤 {}\n🕒 {}s | 👁️ {}\n📅 {}\n\n{desc}...\n\nChoose an action:",
        info.title,
        info.uploader.as_deref().unwrap_or("Unknown"),
        info.duration_secs.unwrap_or(0),
        info.view_count.unwrap_or(0),
        info.upload_date.as_deref().unwrap_or("?"),
    )
}

/// Compact card shown when navigating back from a quality menu.
pub fn overview_compact(info: &MediaInfo) -> String {
    format!("🎬 *{}*\nChoose an action:", info.title)
}

/// Full detail view for the Info button.
pub fn details(info: &MediaInfo) -> String {
    let desc: String = info
        .description
        .as_deref()
        .unwrap_or("")
        .chars()
        .take(800)
        .collect();
    let desc = if desc.is_empty() {
        "No description".to_string()
    } else {
        desc
    };
    format!("📋 *{}*\n\n{desc}", info.title)
}

pub fn premium_status(days_left: i64) -> String {
    format!("💎 You are premium. Days left: {days_left}")
}

pub fn premium_granted(user_id: i64, days: i64) -> String {
    format!("✅ Added premium for {user_id} for {days} days.")
}

pub fn premium_revoked(user_id: i64) -> String {
    format!("✅ Removed premium for {user_id}.")
}

pub fn stats(download_count: u64, active_sessions: usize) -> String {
    format!("📊 Downloads recorded: {download_count}\nActive sessions: {active_sessions}")
}
