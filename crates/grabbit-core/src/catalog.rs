// SPDX-FileCopyrightText: 2026 Grabbit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Format catalog resolution: raw encoding lists into ordered quality menus.
//!
//! Two catalogs are resolved independently per source: video (any entry
//! with a video stream) and audio (audio-only entries). Within a catalog
//! at most one entry survives per quality key; when sizes are known the
//! smallest-size candidate at that key wins.

use std::collections::BTreeMap;

use crate::types::EncodingCandidate;

/// One selectable entry of a resolved quality catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityOption {
    /// Rendered quality label ("720p", "128kbps", or a source note fallback).
    pub label: String,
    pub format_id: String,
    /// Numeric quality key used for ordering and tier filtering.
    /// 0 when no numeric quality is derivable.
    pub key: u32,
}

/// Resolves the video catalog: entries with a video stream, keyed by
/// vertical resolution, ascending.
pub fn resolve_video_catalog(formats: &[EncodingCandidate]) -> Vec<QualityOption> {
    let candidates = formats.iter().filter(|f| f.has_video).map(|f| {
        let key = f.height.unwrap_or(0);
        let label = if key > 0 {
            format!("{key}p")
        } else {
            fallback_label(f)
        };
        (key, label, f)
    });
    dedup_and_order(candidates)
}

/// Resolves the audio catalog: audio-only entries, keyed by integer-rounded
/// bitrate, ascending.
pub fn resolve_audio_catalog(formats: &[EncodingCandidate]) -> Vec<QualityOption> {
    let candidates = formats.iter().filter(|f| !f.has_video).map(|f| {
        let key = f.abr.map(|abr| abr.round() as u32).unwrap_or(0);
        let label = if key > 0 {
            format!("{key}kbps")
        } else {
            fallback_label(f)
        };
        (key, label, f)
    });
    dedup_and_order(candidates)
}

/// Hides entries above the free-tier quality ceiling from non-premium users.
///
/// An emptied result means every available quality is premium-gated; the
/// caller must distinguish that from a source with no formats at all.
pub fn filter_for_tier(
    options: Vec<QualityOption>,
    is_premium: bool,
    free_ceiling: u32,
) -> Vec<QualityOption> {
    if is_premium {
        return options;
    }
    options
        .into_iter()
        .filter(|opt| opt.key <= free_ceiling)
        .collect()
}

fn fallback_label(candidate: &EncodingCandidate) -> String {
    candidate
        .note
        .clone()
        .unwrap_or_else(|| candidate.format_id.clone())
}

/// Groups candidates by key, keeping the smallest known size per key, then
/// emits the survivors in ascending key order. A candidate with unknown
/// size never evicts a known-size winner.
fn dedup_and_order<'a>(
    candidates: impl Iterator<Item = (u32, String, &'a EncodingCandidate)>,
) -> Vec<QualityOption> {
    let mut by_key: BTreeMap<u32, (String, &EncodingCandidate)> = BTreeMap::new();
    for (key, label, candidate) in candidates {
        match by_key.get(&key) {
            Some((_, incumbent)) => {
                let wins = candidate.filesize > 0
                    && (incumbent.filesize == 0 || candidate.filesize < incumbent.filesize);
                if wins {
                    by_key.insert(key, (label, candidate));
                }
            }
            None => {
                by_key.insert(key, (label, candidate));
            }
        }
    }
    by_key
        .into_iter()
        .map(|(key, (label, candidate))| QualityOption {
            label,
            format_id: candidate.format_id.clone(),
            key,
        })
        .collect()
}
