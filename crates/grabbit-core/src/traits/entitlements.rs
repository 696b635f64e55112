// SPDX-FileCopyrightText: 2026 Grabbit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entitlement store trait: premium status, daily free quota, download log.

use async_trait::async_trait;

use crate::error::GrabbitError;
use crate::types::UserId;

/// Persistence backend for per-user entitlements and quota counters.
///
/// One backend is selected at process start and all operations must
/// produce identical observable semantics regardless of which backend is
/// active. Backend failures surface as [`GrabbitError::Store`]: quota
/// callers deny by default, administrative callers report the error.
#[async_trait]
pub trait EntitlementStore: Send + Sync {
    /// Short backend name for startup logging ("remote", "sqlite", "json").
    fn name(&self) -> &str;

    /// Whether the user currently holds an unexpired premium grant.
    async fn is_premium(&self, user: UserId) -> Result<bool, GrabbitError>;

    /// Whole days of premium remaining, never negative.
    async fn remaining_days(&self, user: UserId) -> Result<i64, GrabbitError>;

    /// Grants premium until `now + days`.
    ///
    /// Each grant overwrites the expiry rather than extending it, so
    /// repeated grants do not compound. The daily counter is reset.
    async fn grant_premium(&self, user: UserId, days: i64, plan: &str) -> Result<(), GrabbitError>;

    /// Clears premium expiry and plan, leaving quota counters untouched.
    /// The record itself is never deleted.
    async fn revoke_premium(&self, user: UserId) -> Result<(), GrabbitError>;

    /// Whether the user may consume a free download right now.
    ///
    /// Creates a zero record if absent. If the daily window has elapsed
    /// the reset is persisted eagerly before the comparison. This is a
    /// check, not a reservation: a second call before
    /// [`record_free_consumption`](Self::record_free_consumption) can
    /// observe the same "allowed" result.
    async fn can_consume_free(&self, user: UserId, daily_limit: u32) -> Result<bool, GrabbitError>;

    /// Records one free-tier consumption in the current window.
    async fn record_free_consumption(&self, user: UserId) -> Result<(), GrabbitError>;

    /// Appends a download record.
    async fn record_download(
        &self,
        user: UserId,
        title: &str,
        path: &str,
        size: u64,
    ) -> Result<(), GrabbitError>;

    /// Total number of recorded downloads.
    async fn download_count(&self) -> Result<u64, GrabbitError>;
}
