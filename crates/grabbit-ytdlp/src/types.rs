// SPDX-FileCopyrightText: 2026 Grabbit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serde models for `yt-dlp -J` metadata output.
//!
//! Only the fields the bot consumes are modeled; yt-dlp emits far more
//! and unknown fields are ignored by design.

use serde::Deserialize;

use grabbit_core::types::{EncodingCandidate, MediaInfo};

/// Top-level metadata document from `yt-dlp -J`.
#[derive(Debug, Deserialize)]
pub struct RawInfo {
    pub title: Option<String>,
    pub uploader: Option<String>,
    pub duration: Option<f64>,
    pub view_count: Option<u64>,
    pub upload_date: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub webpage_url: Option<String>,
    pub original_url: Option<String>,
    #[serde(default)]
    pub formats: Vec<RawFormat>,
}

/// One entry of the raw format list.
#[derive(Debug, Deserialize)]
pub struct RawFormat {
    pub format_id: Option<String>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    pub height: Option<u32>,
    pub abr: Option<f64>,
    pub tbr: Option<f64>,
    pub format_note: Option<String>,
    pub filesize: Option<f64>,
    pub filesize_approx: Option<f64>,
}

impl RawFormat {
    fn has_video(&self) -> bool {
        self.vcodec.as_deref().is_some_and(|v| v != "none")
    }

    fn is_audio_only(&self) -> bool {
        !self.has_video() && self.acodec.as_deref().is_some_and(|a| a != "none")
    }
}

impl RawInfo {
    /// Maps the raw document into the core metadata record.
    ///
    /// Entries that carry neither a video nor an audio stream
    /// (storyboards, images) are dropped here so neither catalog sees
    /// them.
    pub fn into_media_info(self, requested_url: &str) -> MediaInfo {
        let formats = self
            .formats
            .into_iter()
            .filter(|f| f.has_video() || f.is_audio_only())
            .map(|f| {
                let has_video = f.has_video();
                EncodingCandidate {
                    format_id: f.format_id.unwrap_or_default(),
                    has_video,
                    height: f.height,
                    abr: f.abr.or(f.tbr).filter(|_| !has_video),
                    note: f.format_note,
                    filesize: f.filesize.or(f.filesize_approx).unwrap_or(0.0) as u64,
                }
            })
            .collect();

        MediaInfo {
            title: self.title.unwrap_or_else(|| "Unknown".to_string()),
            uploader: self.uploader,
            duration_secs: self.duration.map(|d| d as u64),
            view_count: self.view_count,
            upload_date: self.upload_date,
            description: self.description,
            thumbnail_url: self.thumbnail,
            webpage_url: self
                .webpage_url
                .or(self.original_url)
                .unwrap_or_else(|| requested_url.to_string()),
            formats,
        }
    }
}
