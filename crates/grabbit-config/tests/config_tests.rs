// SPDX-FileCopyrightText: 2026 Grabbit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Grabbit configuration system.

use grabbit_config::model::GrabbitConfig;
use grabbit_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_grabbit_config() {
    let toml = r#"
[bot]
name = "test-bot"
log_level = "debug"
owner_ids = [111, 222]

[telegram]
bot_token = "123:ABC"
archive_channel_id = -1001234567890

[storage]
remote_url = "https://store.example.com"
sqlite_path = "/tmp/test.sqlite3"
json_path = "/tmp/test.json"

[download]
dir = "/tmp/dl"
max_upload_bytes = 1992294400
split_chunk_bytes = 1887436800
free_daily_limit = 3
free_max_height = 1080
free_max_abr_kbps = 256
ytdlp_bin = "/usr/local/bin/yt-dlp"

[premium]
default_days = 7
default_plan = "Silver"
qr_url = "https://example.com/qr.jpg"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.bot.name, "test-bot");
    assert_eq!(config.bot.log_level, "debug");
    assert_eq!(config.bot.owner_ids, vec![111, 222]);
    assert_eq!(config.telegram.bot_token.as_deref(), Some("123:ABC"));
    assert_eq!(config.telegram.archive_channel_id, Some(-1001234567890));
    assert_eq!(
        config.storage.remote_url.as_deref(),
        Some("https://store.example.com")
    );
    assert_eq!(config.storage.sqlite_path, "/tmp/test.sqlite3");
    assert_eq!(config.download.free_daily_limit, 3);
    assert_eq!(config.download.free_max_height, 1080);
    assert_eq!(config.premium.default_days, 7);
    assert_eq!(config.premium.default_plan, "Silver");
}

/// Defaults match the documented limits.
#[test]
fn defaults_are_sensible() {
    let config = GrabbitConfig::default();
    assert_eq!(config.bot.name, "grabbit");
    assert!(config.telegram.bot_token.is_none());
    assert!(config.storage.remote_url.is_none());
    assert_eq!(config.download.max_upload_bytes, 1_900 * 1024 * 1024);
    assert_eq!(config.download.split_chunk_bytes, 1_800 * 1024 * 1024);
    assert_eq!(config.download.free_daily_limit, 2);
    assert_eq!(config.download.free_max_height, 720);
    assert_eq!(config.download.free_max_abr_kbps, 192);
    assert_eq!(config.download.ytdlp_bin, "yt-dlp");
    assert_eq!(config.premium.default_days, 30);
}

/// An override merged at the `telegram.bot_token` key wins over TOML, the
/// same shape `GRABBIT_TELEGRAM_BOT_TOKEN` takes after section mapping
/// (`telegram.bot_token`, NOT `telegram.bot.token`).
#[test]
fn env_style_override_maps_to_bot_token() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let toml = r#"
[telegram]
bot_token = "from-toml"
"#;
    let config: GrabbitConfig = Figment::new()
        .merge(Serialized::defaults(GrabbitConfig::default()))
        .merge(Toml::string(toml))
        .merge(("telegram.bot_token", "from-env"))
        .extract()
        .expect("should merge env-style override");

    assert_eq!(config.telegram.bot_token.as_deref(), Some("from-env"));
}

/// An override merged at `download.free_daily_limit` keeps the underscores
/// inside the key name after the leading section is split off.
#[test]
fn env_style_override_maps_underscored_key() {
    use figment::{Figment, providers::Serialized};

    let config: GrabbitConfig = Figment::new()
        .merge(Serialized::defaults(GrabbitConfig::default()))
        .merge(("download.free_daily_limit", 9u32))
        .extract()
        .expect("should set free_daily_limit via dot notation");

    assert_eq!(config.download.free_daily_limit, 9);
}

/// Unknown fields are rejected at parse time.
#[test]
fn unknown_field_is_rejected() {
    let toml = r#"
[download]
max_upload_byts = 100
"#;
    assert!(load_config_from_str(toml).is_err());
}

/// An empty config passes the full load-and-validate path with defaults.
#[test]
fn empty_config_validates() {
    let config = load_and_validate_str("").expect("defaults should validate");
    assert_eq!(config.download.free_daily_limit, 2);
}

/// Semantic validation rejects a chunk size above the delivery ceiling.
#[test]
fn validation_rejects_chunk_above_ceiling() {
    let toml = r#"
[download]
max_upload_bytes = 100
split_chunk_bytes = 200
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(
        errors
            .iter()
            .any(|e| e.to_string().contains("split_chunk_bytes"))
    );
}

/// Partial sections keep defaults for unspecified fields.
#[test]
fn partial_section_keeps_defaults() {
    let toml = r#"
[download]
free_daily_limit = 5
"#;
    let config = load_config_from_str(toml).unwrap();
    assert_eq!(config.download.free_daily_limit, 5);
    assert_eq!(config.download.free_max_height, 720);
    assert_eq!(config.download.dir, "downloads");
}
