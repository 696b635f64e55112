// SPDX-FileCopyrightText: 2026 Grabbit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded SQLite backend for the entitlement store.
//!
//! All access goes through tokio-rusqlite's single background thread.
//! Counter increments are expressed as atomic `UPDATE ... SET
//! daily_count = daily_count + 1` statements rather than read-modify-write.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rusqlite::params;

#[cfg(test)]
use grabbit_core::types::EntitlementRecord;
use grabbit_core::types::UserId;
use grabbit_core::{EntitlementStore, GrabbitError};

/// SQLite-backed entitlement store.
#[derive(Debug)]
pub struct SqliteStore {
    conn: tokio_rusqlite::Connection,
}

/// Maps a tokio-rusqlite error into the store error taxonomy.
fn map_tr_err(err: tokio_rusqlite::Error) -> GrabbitError {
    GrabbitError::Store {
        source: Box::new(err),
    }
}

impl SqliteStore {
    /// Opens (creating if necessary) the database at `path` and applies
    /// the schema. A failure here fails the startup probe.
    pub async fn open(path: &str) -> Result<Self, GrabbitError> {
        // `open` fails with a bare rusqlite error, unlike `call`.
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(GrabbitError::store)?;

        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 CREATE TABLE IF NOT EXISTS users (
                     user_id       INTEGER PRIMARY KEY,
                     premium_until TEXT,
                     plan          TEXT,
                     daily_count   INTEGER NOT NULL DEFAULT 0,
                     last_reset    INTEGER NOT NULL DEFAULT 0
                 );
                 CREATE TABLE IF NOT EXISTS downloads (
                     id         INTEGER PRIMARY KEY AUTOINCREMENT,
                     user_id    INTEGER NOT NULL,
                     title      TEXT NOT NULL,
                     filepath   TEXT NOT NULL,
                     filesize   INTEGER NOT NULL,
                     created_at TEXT NOT NULL
                 );",
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        Ok(Self { conn })
    }

    /// Reads the premium expiry for `user`, if any. Unparseable stored
    /// timestamps are treated as no premium.
    async fn premium_until(&self, user: UserId) -> Result<Option<DateTime<Utc>>, GrabbitError> {
        let stored: Option<String> = self
            .conn
            .call(move |conn| {
                let result = conn.query_row(
                    "SELECT premium_until FROM users WHERE user_id = ?1",
                    params![user.0],
                    |row| row.get::<_, Option<String>>(0),
                );
                match result {
                    Ok(value) => Ok(value),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(map_tr_err)?;

        Ok(stored
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc)))
    }

    #[cfg(test)]
    async fn set_last_reset(&self, user: UserId, ts: i64) -> Result<(), GrabbitError> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE users SET last_reset = ?1 WHERE user_id = ?2",
                    params![ts, user.0],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    #[cfg(test)]
    async fn record(&self, user: UserId) -> Result<Option<EntitlementRecord>, GrabbitError> {
        self.conn
            .call(move |conn| {
                let result = conn.query_row(
                    "SELECT premium_until, plan, daily_count, last_reset
                     FROM users WHERE user_id = ?1",
                    params![user.0],
                    |row| {
                        Ok((
                            row.get::<_, Option<String>>(0)?,
                            row.get::<_, Option<String>>(1)?,
                            row.get::<_, u32>(2)?,
                            row.get::<_, i64>(3)?,
                        ))
                    },
                );
                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(map_tr_err)
            .map(|row| {
                row.map(|(until, plan, daily_count, last_reset)| EntitlementRecord {
                    premium_until: until
                        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                        .map(|dt| dt.with_timezone(&Utc)),
                    plan,
                    daily_count,
                    last_reset,
                })
            })
    }
}

#[async_trait]
impl EntitlementStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn is_premium(&self, user: UserId) -> Result<bool, GrabbitError> {
        Ok(self
            .premium_until(user)
            .await?
            .is_some_and(|until| until > Utc::now()))
    }

    async fn remaining_days(&self, user: UserId) -> Result<i64, GrabbitError> {
        Ok(self
            .premium_until(user)
            .await?
            .map(|until| (until - Utc::now()).num_days().max(0))
            .unwrap_or(0))
    }

    async fn grant_premium(&self, user: UserId, days: i64, plan: &str) -> Result<(), GrabbitError> {
        // Absolute expiry: each grant overwrites, never extends.
        let until = (Utc::now() + Duration::days(days)).to_rfc3339();
        let plan = plan.to_string();
        let now = Utc::now().timestamp();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO users (user_id, premium_until, plan, daily_count, last_reset)
                     VALUES (?1, ?2, ?3, 0, ?4)
                     ON CONFLICT(user_id) DO UPDATE SET
                         premium_until = excluded.premium_until,
                         plan          = excluded.plan,
                         daily_count   = 0,
                         last_reset    = excluded.last_reset",
                    params![user.0, until, plan, now],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn revoke_premium(&self, user: UserId) -> Result<(), GrabbitError> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE users SET premium_until = NULL, plan = NULL WHERE user_id = ?1",
                    params![user.0],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn can_consume_free(&self, user: UserId, daily_limit: u32) -> Result<bool, GrabbitError> {
        let now = Utc::now().timestamp();
        self.conn
            .call(move |conn| {
                let result = conn.query_row(
                    "SELECT daily_count, last_reset FROM users WHERE user_id = ?1",
                    params![user.0],
                    |row| Ok((row.get::<_, u32>(0)?, row.get::<_, i64>(1)?)),
                );
                let count = match result {
                    Ok((count, last_reset)) => {
                        if now - last_reset > grabbit_core::types::RESET_WINDOW_SECS {
                            // Persist the reset eagerly before reading the count.
                            conn.execute(
                                "UPDATE users SET daily_count = 0, last_reset = ?1
                                 WHERE user_id = ?2",
                                params![now, user.0],
                            )?;
                            0
                        } else {
                            count
                        }
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => {
                        conn.execute(
                            "INSERT INTO users (user_id, daily_count, last_reset)
                             VALUES (?1, 0, ?2)",
                            params![user.0, now],
                        )?;
                        0
                    }
                    Err(e) => return Err(e.into()),
                };
                Ok(count < daily_limit)
            })
            .await
            .map_err(map_tr_err)
    }

    async fn record_free_consumption(&self, user: UserId) -> Result<(), GrabbitError> {
        let now = Utc::now().timestamp();
        self.conn
            .call(move |conn| {
                let result = conn.query_row(
                    "SELECT last_reset FROM users WHERE user_id = ?1",
                    params![user.0],
                    |row| row.get::<_, i64>(0),
                );
                match result {
                    Ok(last_reset) => {
                        if now - last_reset > grabbit_core::types::RESET_WINDOW_SECS {
                            conn.execute(
                                "UPDATE users SET daily_count = 1, last_reset = ?1
                                 WHERE user_id = ?2",
                                params![now, user.0],
                            )?;
                        } else {
                            conn.execute(
                                "UPDATE users SET daily_count = daily_count + 1
                                 WHERE user_id = ?1",
                                params![user.0],
                            )?;
                        }
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => {
                        conn.execute(
                            "INSERT INTO users (user_id, daily_count, last_reset)
                             VALUES (?1, 1, ?2)",
                            params![user.0, now],
                        )?;
                    }
                    Err(e) => return Err(e.into()),
                }
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn record_download(
        &self,
        user: UserId,
        title: &str,
        path: &str,
        size: u64,
    ) -> Result<(), GrabbitError> {
        let title = title.to_string();
        let path = path.to_string();
        let created = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO downloads (user_id, title, filepath, filesize, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![user.0, title, path, size as i64, created],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn download_count(&self) -> Result<u64, GrabbitError> {
        self.conn
            .call(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM downloads", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(map_tr_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sqlite3");
        let store = SqliteStore::open(path.to_str().unwrap()).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn open_fails_on_unwritable_path() {
        let err = SqliteStore::open("/nonexistent-dir/test.sqlite3")
            .await
            .unwrap_err();
        assert!(matches!(err, grabbit_core::GrabbitError::Store { .. }));
    }

    #[tokio::test]
    async fn unknown_user_is_not_premium() {
        let (_dir, store) = store().await;
        assert!(!store.is_premium(UserId(1)).await.unwrap());
        assert_eq!(store.remaining_days(UserId(1)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn regrant_overwrites_instead_of_extending() {
        let (_dir, store) = store().await;
        let user = UserId(10);

        store.grant_premium(user, 30, "Gold").await.unwrap();
        store.grant_premium(user, 5, "Silver").await.unwrap();

        assert!(store.is_premium(user).await.unwrap());
        let days = store.remaining_days(user).await.unwrap();
        assert!((4..=5).contains(&days), "expiry must be now + 5, got {days}");
    }

    #[tokio::test]
    async fn revoke_clears_premium_but_keeps_counters() {
        let (_dir, store) = store().await;
        let user = UserId(11);

        store.grant_premium(user, 7, "Gold").await.unwrap();
        store.record_free_consumption(user).await.unwrap();
        store.revoke_premium(user).await.unwrap();

        assert!(!store.is_premium(user).await.unwrap());
        let record = store.record(user).await.unwrap().unwrap();
        assert!(record.plan.is_none());
        assert_eq!(record.daily_count, 1);
        assert!(record.last_reset > 0);
    }

    #[tokio::test]
    async fn free_limit_two_allows_twice_then_denies() {
        let (_dir, store) = store().await;
        let user = UserId(12);

        assert!(store.can_consume_free(user, 2).await.unwrap());
        store.record_free_consumption(user).await.unwrap();
        assert!(store.can_consume_free(user, 2).await.unwrap());
        store.record_free_consumption(user).await.unwrap();
        assert!(!store.can_consume_free(user, 2).await.unwrap());
    }

    #[tokio::test]
    async fn window_reset_restores_quota() {
        let (_dir, store) = store().await;
        let user = UserId(13);

        store.record_free_consumption(user).await.unwrap();
        store.record_free_consumption(user).await.unwrap();
        assert!(!store.can_consume_free(user, 2).await.unwrap());

        // Backdate the window start past the 24h boundary.
        let stale = Utc::now().timestamp() - 86_401;
        store.set_last_reset(user, stale).await.unwrap();

        assert!(store.can_consume_free(user, 2).await.unwrap());
        // The reset was persisted eagerly.
        let record = store.record(user).await.unwrap().unwrap();
        assert_eq!(record.daily_count, 0);
        assert!(record.last_reset > stale);
    }

    #[tokio::test]
    async fn check_is_not_a_reservation() {
        let (_dir, store) = store().await;
        let user = UserId(14);
        store.record_free_consumption(user).await.unwrap();

        // Two checks before the consumption both observe "allowed":
        // the documented check-then-consume race.
        assert!(store.can_consume_free(user, 2).await.unwrap());
        assert!(store.can_consume_free(user, 2).await.unwrap());
    }

    #[tokio::test]
    async fn downloads_are_appended_and_counted() {
        let (_dir, store) = store().await;
        assert_eq!(store.download_count().await.unwrap(), 0);
        store
            .record_download(UserId(1), "Clip", "/tmp/clip.mp4", 1024)
            .await
            .unwrap();
        store
            .record_download(UserId(2), "Song", "/tmp/song.mp3", 2048)
            .await
            .unwrap();
        assert_eq!(store.download_count().await.unwrap(), 2);
    }
}
