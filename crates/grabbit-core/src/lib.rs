// SPDX-FileCopyrightText: 2026 Grabbit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Grabbit download bot.
//!
//! This crate provides the foundational error type, domain types, and
//! collaborator traits used throughout the Grabbit workspace, plus the
//! format catalog resolver and the in-process session registry.

pub mod catalog;
pub mod error;
pub mod session;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use catalog::{filter_for_tier, resolve_audio_catalog, resolve_video_catalog, QualityOption};
pub use error::GrabbitError;
pub use session::{Session, SessionRegistry, StagedArtifact};
pub use types::{
    human_size, Artifact, DownloadRecord, EncodingCandidate, EntitlementRecord, MediaInfo,
    MediaKind, ProgressEvent, SessionId, UserId, RESET_WINDOW_SECS,
};

pub use traits::{EntitlementStore, MediaExtractor};
