// SPDX-FileCopyrightText: 2026 Grabbit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote HTTP document-store backend, first in the fallback chain.
//!
//! Talks to a self-hosted document service with a small REST surface:
//! `GET /health` (startup probe), `GET`/`PUT /users/:id` (entitlement
//! documents), `POST /downloads` and `GET /downloads/count`. Quota
//! updates are client-side read-modify-write of the user document; the
//! service is the source of truth, not a cache.

use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;

use grabbit_core::types::{DownloadRecord, EntitlementRecord, UserId};
use grabbit_core::{EntitlementStore, GrabbitError};

use crate::reset_if_elapsed;

/// HTTP document-store entitlement backend.
#[derive(Debug, Clone)]
pub struct RemoteStore {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u64,
}

fn store_err(err: reqwest::Error) -> GrabbitError {
    GrabbitError::Store {
        source: Box::new(err),
    }
}

impl RemoteStore {
    /// Connects to the document service and probes `GET /health`.
    ///
    /// The probe failing means the whole backend is skipped at startup;
    /// there is no lazy reconnect later.
    pub async fn connect(base_url: String) -> Result<Self, GrabbitError> {
        let client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(10))
            .build()
            .map_err(store_err)?;

        let base_url = base_url.trim_end_matches('/').to_string();
        let store = Self { client, base_url };

        let response = store
            .client
            .get(format!("{}/health", store.base_url))
            .send()
            .await
            .map_err(store_err)?;
        if !response.status().is_success() {
            return Err(GrabbitError::Store {
                source: format!("health probe returned {}", response.status()).into(),
            });
        }
        Ok(store)
    }

    async fn fetch_user(&self, user: UserId) -> Result<Option<EntitlementRecord>, GrabbitError> {
        let response = self
            .client
            .get(format!("{}/users/{}", self.base_url, user.0))
            .send()
            .await
            .map_err(store_err)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(GrabbitError::Store {
                source: format!("GET user returned {}", response.status()).into(),
            });
        }
        response.json().await.map(Some).map_err(store_err)
    }

    async fn put_user(&self, user: UserId, record: &EntitlementRecord) -> Result<(), GrabbitError> {
        let response = self
            .client
            .put(format!("{}/users/{}", self.base_url, user.0))
            .json(record)
            .send()
            .await
            .map_err(store_err)?;
        if !response.status().is_success() {
            return Err(GrabbitError::Store {
                source: format!("PUT user returned {}", response.status()).into(),
            });
        }
        Ok(())
    }

    /// Fetches (or defaults) the user document, applies `f`, writes it back.
    async fn with_user<T>(
        &self,
        user: UserId,
        f: impl FnOnce(&mut EntitlementRecord) -> T + Send,
    ) -> Result<T, GrabbitError> {
        let mut record = self.fetch_user(user).await?.unwrap_or_default();
        let result = f(&mut record);
        self.put_user(user, &record).await?;
        Ok(result)
    }
}

#[async_trait]
impl EntitlementStore for RemoteStore {
    fn name(&self) -> &str {
        "remote"
    }

    async fn is_premium(&self, user: UserId) -> Result<bool, GrabbitError> {
        Ok(self
            .fetch_user(user)
            .await?
            .is_some_and(|r| r.premium_active(Utc::now())))
    }

    async fn remaining_days(&self, user: UserId) -> Result<i64, GrabbitError> {
        Ok(self
            .fetch_user(user)
            .await?
            .and_then(|r| r.premium_until)
            .map(|until| (until - Utc::now()).num_days().max(0))
            .unwrap_or(0))
    }

    async fn grant_premium(&self, user: UserId, days: i64, plan: &str) -> Result<(), GrabbitError> {
        let until = Utc::now() + Duration::days(days);
        let now = Utc::now().timestamp();
        let plan = plan.to_string();
        self.with_user(user, move |record| {
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
        self.with_user(user, move |record| {
            reset_if_elapsed(record, now);
            record.daily_count < daily_limit
        })
        .await
    }

    async fn record_free_consumption(&self, user: UserId) -> Result<(), GrabbitError> {
        let now = Utc::now().timestamp();
        self.with_user(user, move |record| {
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
        let record = DownloadRecord {
            user,
            title: title.to_string(),
            path: path.to_string(),
            size,
            created_at: Utc::now().to_rfc3339(),
        };
        let response = self
            .client
            .post(format!("{}/downloads", self.base_url))
            .json(&record)
            .send()
            .await
            .map_err(store_err)?;
        if !response.status().is_success() {
            return Err(GrabbitError::Store {
                source: format!("POST download returned {}", response.status()).into(),
            });
        }
        Ok(())
    }

    async fn download_count(&self) -> Result<u64, GrabbitError> {
        let response = self
            .client
            .get(format!("{}/downloads/count", self.base_url))
            .send()
            .await
            .map_err(store_err)?;
        if !response.status().is_success() {
            return Err(GrabbitError::Store {
                source: format!("GET count returned {}", response.status()).into(),
            });
        }
        let body: CountResponse = response.json().await.map_err(store_err)?;
        Ok(body.count)
    }
}
