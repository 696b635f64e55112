// SPDX-FileCopyrightText: 2026 Grabbit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Grabbit download bot.

use thiserror::Error;

/// The primary error type used across all Grabbit crates.
#[derive(Debug, Error)]
pub enum GrabbitError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Entitlement store errors (backend connection, query failure, serialization).
    ///
    /// Quota-check callers must treat this as "deny by default"; administrative
    /// callers surface it verbatim.
    #[error("store error: {source}")]
    Store {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Transport errors (message send/edit failure, rate limiting).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Media extraction errors (probe failure, fetch failure, transcode failure).
    #[error("extractor error: {message}")]
    Extractor {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A menu action referenced a session that no longer exists.
    ///
    /// Expected after a process restart or once a flow has completed; handled
    /// with a user-visible notice, never logged as an error.
    #[error("session expired")]
    SessionExpired,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GrabbitError {
    /// Wraps an I/O error as a store error.
    pub fn store<E: std::error::Error + Send + Sync + 'static>(source: E) -> Self {
        GrabbitError::Store {
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_includes_context() {
        let err = GrabbitError::Channel {
            message: "send failed".into(),
            source: None,
        };
        assert_eq!(err.to_string(), "channel error: send failed");

        let err = GrabbitError::store(std::io::Error::other("disk gone"));
        assert_eq!(err.to_string(), "store error: disk gone");
    }

    #[test]
    fn session_expired_is_unit_variant() {
        assert_eq!(GrabbitError::SessionExpired.to_string(), "session expired");
    }
}
