// SPDX-FileCopyrightText: 2026 Grabbit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flat-file JSON backend, the last link of the fallback chain.
//!
//! The on-disk document has two top-level collections: a `users` mapping
//! and an append-only `downloads` list. Every operation is a
//! read-modify-write of the whole document behind an async mutex, which
//! is adequate for the single-process deployments this backend serves.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use grabbit_core::types::{DownloadRecord, EntitlementRecord, UserId};
use grabbit_core::{EntitlementStore, GrabbitError};

use crate::reset_if_elapsed;

/// The persisted document layout.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    users: BTreeMap<String, EntitlementRecord>,
    downloads: Vec<DownloadRecord>,
}

/// JSON-file-backed entitlement store.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Opens the store, creating an empty document when the file does not
    /// exist. An unreadable or unparseable existing file fails the probe.
    pub async fn open(path: &str) -> Result<Self, GrabbitError> {
        let store = Self {
            path: PathBuf::from(path),
            lock: Mutex::new(()),
        };
        if tokio::fs::try_exists(&store.path)
            .await
            .map_err(GrabbitError::store)?
        {
            // Probe parseability up front rather than on first use.
            store.load().await?;
        } else {
            store.save(&StoreDocument::default()).await?;
        }
        Ok(store)
    }

    async fn load(&self) -> Result<StoreDocument, GrabbitError> {
        let raw = tokio::fs::read(&self.path)
            .await
            .map_err(GrabbitError::store)?;
        serde_json::from_slice(&raw).map_err(GrabbitError::store)
    }

    async fn save(&self, doc: &StoreDocument) -> Result<(), GrabbitError> {
        let raw = serde_json::to_vec_pretty(doc).map_err(GrabbitError::store)?;
        tokio::fs::write(&self.path, raw)
            .await
            .map_err(GrabbitError::store)
    }

    /// Loads the document, applies `f` to the user's record (created as
    /// zero if absent), persists, and returns what `f` produced.
    async fn with_user<T>(
        &self,
        user: UserId,
        f: impl FnOnce(&mut EntitlementRecord) -> T,
    ) -> Result<T, GrabbitError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        let record = doc.users.entry(user.0.to_string()).or_default();
        let result = f(record);
        self.save(&doc).await?;
        Ok(result)
    }

    async fn read_user(&self, user: UserId) -> Result<Option<EntitlementRecord>, GrabbitError> {
        let _guard = self.lock.lock().await;
        let doc = self.load().await?;
        Ok(doc.users.get(&user.0.to_string()).cloned())
    }
}

#[async_trait]
impl EntitlementStore for JsonFileStore {
    fn name(&self) -> &str {
        "json"
    }

    async fn is_premium(&self, user: UserId) -> Result<bool, GrabbitError> {
        Ok(self
            .read_user(user)
            .await?
            .is_some_and(|r| r.premium_active(Utc::now())))
    }

    async fn remaining_days(&self, user: UserId) -> Result<i64, GrabbitError> {
        Ok(self
            .read_user(user)
            .await?
            .and_then(|r| r.premium_until)
            .map(|until| (until - Utc::now()).num_days().max(0))
            .unwrap_or(0))
    }

    async fn grant_premium(&self, user: UserId, days: i64, plan: &str) -> Result<(), GrabbitError> {
        let until = Utc::now() + Duration::days(days);
        let plan = plan.to_string();
        let now = Utc::now().timestamp();
        self.with_user(user, |record| {
            record.premium_until = Some(until);
            record.plan = Some(plan);
            record.daily_count = 0;
            record.last_reset = now;
        })
        .await
    }

    async fn revoke_premium(&self, user: UserId) -> Result<(), GrabbitError> {
        self.with_user(user, |record| {
            record.premium_until = None;
            record.plan = None;
        })
        .await
    }

    async fn can_consume_free(&self, user: UserId, daily_limit: u32) -> Result<bool, GrabbitError> {
        let now = Utc::now().timestamp();
        self.with_user(user, |record| {
            reset_if_elapsed(record, now);
            record.daily_count < daily_limit
        })
        .await
    }

    async fn record_free_consumption(&self, user: UserId) -> Result<(), GrabbitError> {
        let now = Utc::now().timestamp();
        self.with_user(user, |record| {
            reset_if_elapsed(record, now);
            record.daily_count += 1;
        })
        .await
    }

    async fn record_download(
        &self,
        user: UserId,
        title: &str,
        path: &str,
        size: u64,
    ) -> Result<(), GrabbitError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        doc.downloads.push(DownloadRecord {
            user,
            title: title.to_string(),
            path: path.to_string(),
            size,
            created_at: Utc::now().to_rfc3339(),
        });
        self.save(&doc).await
    }

    async fn download_count(&self) -> Result<u64, GrabbitError> {
        let _guard = self.lock.lock().await;
        let doc = self.load().await?;
        Ok(doc.downloads.len() as u64)
    }
}
