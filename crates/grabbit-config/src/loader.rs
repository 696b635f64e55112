// SPDX-FileCopyrightText: 2026 Grabbit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./grabbit.toml` > `~/.config/grabbit/grabbit.toml`
//! > `/etc/grabbit/grabbit.toml` with environment variable overrides via the
//! `GRABBIT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::GrabbitConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/grabbit/grabbit.toml` (system-wide)
/// 3. `~/.config/grabbit/grabbit.toml` (user XDG config)
/// 4. `./grabbit.toml` (local directory)
/// 5. `GRABBIT_*` environment variables
pub fn load_config() -> Result<GrabbitConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GrabbitConfig::default()))
        .merge(Toml::file("/etc/grabbit/grabbit.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("grabbit/grabbit.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("grabbit.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<GrabbitConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GrabbitConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<GrabbitConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GrabbitConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `GRABBIT_TELEGRAM_BOT_TOKEN` must map
/// to `telegram.bot_token`, not `telegram.bot.token`.
fn env_provider() -> Env {
    const SECTIONS: [&str; 5] = ["bot", "telegram", "storage", "download", "premium"];

    Env::prefixed("GRABBIT_").map(|key| {
        // `key` is the lowercased env var name with the prefix stripped.
        // Example: GRABBIT_TELEGRAM_BOT_TOKEN -> "telegram_bot_token".
        // Only the leading section name becomes a dot; the rest of the key
        // keeps its underscores.
        let key_str = key.as_str();
        for section in SECTIONS {
            if let Some(rest) = key_str.strip_prefix(&format!("{section}_")) {
                return format!("{section}.{rest}").into();
            }
        }
        key_str.to_string().into()
    })
}
