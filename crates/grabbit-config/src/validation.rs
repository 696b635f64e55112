// SPDX-FileCopyrightText: 2026 Grabbit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes. Collects all violations instead of failing fast.

use thiserror::Error;

use crate::model::GrabbitConfig;

/// A single configuration problem, either a parse failure or a semantic
/// validation failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    Parse(#[from] Box<figment::Error>),

    #[error("{message}")]
    Validation { message: String },
}

impl ConfigError {
    fn validation(message: impl Into<String>) -> Self {
        ConfigError::Validation {
            message: message.into(),
        }
    }
}

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or all collected errors.
pub fn validate_config(config: &GrabbitConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.bot.name.trim().is_empty() {
        errors.push(ConfigError::validation("bot.name must not be empty"));
    }

    if config.storage.sqlite_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.sqlite_path must not be empty",
        ));
    }

    if config.storage.json_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.json_path must not be empty",
        ));
    }

    if let Some(url) = &config.storage.remote_url
        && !(url.starts_with("http://") || url.starts_with("https://"))
    {
        errors.push(ConfigError::validation(format!(
            "storage.remote_url `{url}` must be an http(s) URL"
        )));
    }

    if config.download.dir.trim().is_empty() {
        errors.push(ConfigError::validation("download.dir must not be empty"));
    }

    if config.download.max_upload_bytes == 0 {
        errors.push(ConfigError::validation(
            "download.max_upload_bytes must be positive",
        ));
    }

    if config.download.split_chunk_bytes == 0 {
        errors.push(ConfigError::validation(
            "download.split_chunk_bytes must be positive",
        ));
    } else if config.download.split_chunk_bytes > config.download.max_upload_bytes {
        errors.push(ConfigError::validation(format!(
            "download.split_chunk_bytes ({}) must not exceed download.max_upload_bytes ({})",
            config.download.split_chunk_bytes, config.download.max_upload_bytes
        )));
    }

    if config.premium.default_days < 1 {
        errors.push(ConfigError::validation(format!(
            "premium.default_days must be at least 1, got {}",
            config.premium.default_days
        )));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Print collected configuration errors to stderr, one per line.
pub fn render_errors(errors: &[ConfigError]) {
    eprintln!("grabbit: invalid configuration:");
    for err in errors {
        eprintln!("  - {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&GrabbitConfig::default()).is_ok());
    }

    #[test]
    fn chunk_size_above_ceiling_is_rejected() {
        let mut config = GrabbitConfig::default();
        config.download.split_chunk_bytes = config.download.max_upload_bytes + 1;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("split_chunk_bytes"));
    }

    #[test]
    fn non_http_remote_url_is_rejected() {
        let mut config = GrabbitConfig::default();
        config.storage.remote_url = Some("mongodb://example".into());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("remote_url"));
    }

    #[test]
    fn multiple_errors_are_collected() {
        let mut config = GrabbitConfig::default();
        config.bot.name = " ".into();
        config.download.max_upload_bytes = 0;
        config.download.split_chunk_bytes = 0;
        config.premium.default_days = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }
}
