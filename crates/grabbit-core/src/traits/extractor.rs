// SPDX-FileCopyrightText: 2026 Grabbit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media extraction trait: metadata probe and the actual fetch.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::GrabbitError;
use crate::types::{Artifact, MediaInfo, MediaKind, ProgressEvent};

/// External engine that resolves source metadata and materializes media.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Resolves source metadata without fetching the media body.
    async fn probe(&self, url: &str) -> Result<MediaInfo, GrabbitError>;

    /// Fetches the media for `format_id`, transcoding audio to the
    /// configured codec when `kind` is audio.
    ///
    /// Progress events are pushed onto `progress`; the receiver drains
    /// them at its own cadence and may drop sends once it is gone, which
    /// the implementation must tolerate.
    async fn fetch(
        &self,
        url: &str,
        format_id: &str,
        kind: MediaKind,
        progress: mpsc::Sender<ProgressEvent>,
    ) -> Result<Artifact, GrabbitError>;
}
