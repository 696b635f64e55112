// SPDX-FileCopyrightText: 2026 Grabbit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits implemented by the backend and extractor crates.

pub mod entitlements;
pub mod extractor;

pub use entitlements::EntitlementStore;
pub use extractor::MediaExtractor;
