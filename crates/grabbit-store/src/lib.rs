// SPDX-FileCopyrightText: 2026 Grabbit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entitlement and quota persistence for the Grabbit download bot.
//!
//! Three backends implement [`EntitlementStore`]: a remote HTTP document
//! store, an embedded SQLite database, and a flat JSON file. They are
//! probed in that order once at startup; the first backend that
//! initializes successfully becomes the sole active backend for the
//! process lifetime. There is no per-call fallback and no migration
//! between backends.

pub mod jsonfile;
pub mod remote;
pub mod sqlite;

use std::sync::Arc;

use grabbit_config::model::StorageConfig;
use grabbit_core::types::EntitlementRecord;
use grabbit_core::{EntitlementStore, GrabbitError};
use tracing::{info, warn};

pub use jsonfile::JsonFileStore;
pub use remote::RemoteStore;
pub use sqlite::SqliteStore;

/// Probes the configured backends in order and returns the first that
/// initializes.
///
/// Probe failures are logged and observable; an error is returned only
/// when every backend fails.
pub async fn select_backend(
    config: &StorageConfig,
) -> Result<Arc<dyn EntitlementStore>, GrabbitError> {
    if let Some(url) = &config.remote_url {
        match RemoteStore::connect(url.clone()).await {
            Ok(store) => {
                info!(backend = store.name(), url = %url, "entitlement store selected");
                return Ok(Arc::new(store));
            }
            Err(err) => {
                warn!(error = %err, "remote store probe failed, trying sqlite");
            }
        }
    }

    match SqliteStore::open(&config.sqlite_path).await {
        Ok(store) => {
            info!(backend = store.name(), path = %config.sqlite_path, "entitlement store selected");
            return Ok(Arc::new(store));
        }
        Err(err) => {
            warn!(error = %err, "sqlite store probe failed, trying json file");
        }
    }

    match JsonFileStore::open(&config.json_path).await {
        Ok(store) => {
            info!(backend = store.name(), path = %config.json_path, "entitlement store selected");
            Ok(Arc::new(store))
        }
        Err(err) => {
            warn!(error = %err, "json store probe failed");
            Err(GrabbitError::Config(
                "no entitlement store backend could be initialized".into(),
            ))
        }
    }
}

/// Applies the eager daily-window reset to a record at `now` (unix
/// seconds). Returns `true` when a reset was applied and must be
/// persisted before the count is read as current.
pub(crate) fn reset_if_elapsed(record: &mut EntitlementRecord, now: i64) -> bool {
    if record.window_elapsed(now) {
        record.daily_count = 0;
        record.last_reset = now;
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_applies_only_after_window() {
        let mut record = EntitlementRecord {
            daily_count: 5,
            last_reset: 1_000,
            ..Default::default()
        };
        assert!(!reset_if_elapsed(&mut record, 1_000 + 86_400));
        assert_eq!(record.daily_count, 5);

        assert!(reset_if_elapsed(&mut record, 1_000 + 86_401));
        assert_eq!(record.daily_count, 0);
        assert_eq!(record.last_reset, 1_000 + 86_401);
    }

    #[tokio::test]
    async fn probe_falls_through_to_json_when_sqlite_path_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            remote_url: None,
            // A directory is not a valid database file.
            sqlite_path: dir.path().display().to_string(),
            json_path: dir.path().join("store.json").display().to_string(),
        };
        let store = select_backend(&config).await.unwrap();
        assert_eq!(store.name(), "json");
    }

    #[tokio::test]
    async fn probe_prefers_sqlite_over_json() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            remote_url: None,
            sqlite_path: dir.path().join("store.sqlite3").display().to_string(),
            json_path: dir.path().join("store.json").display().to_string(),
        };
        let store = select_backend(&config).await.unwrap();
        assert_eq!(store.name(), "sqlite");
    }
}
