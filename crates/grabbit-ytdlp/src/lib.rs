// SPDX-FileCopyrightText: 2026 Grabbit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! yt-dlp backed media extraction.
//!
//! Wraps the `yt-dlp` binary behind the [`MediaExtractor`] trait: `probe`
//! runs a metadata-only pass (`-J`) and `fetch` streams `--newline`
//! progress output into a channel while the download runs.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use grabbit_core::{
    Artifact, GrabbitError, MediaExtractor, MediaInfo, MediaKind, ProgressEvent,
};

mod progress;
mod split;
mod types;

pub use progress::parse_progress_line;
pub use split::split_file;

fn ext_err(message: String) -> GrabbitError {
    GrabbitError::Extractor {
        message,
        source: None,
    }
}

/// [`MediaExtractor`] implementation shelling out to `yt-dlp`.
pub struct YtDlpExtractor {
    bin: String,
    download_dir: PathBuf,
}

impl YtDlpExtractor {
    pub fn new(bin: impl Into<String>, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            bin: bin.into(),
            download_dir: download_dir.into(),
        }
    }

    /// Locates the downloaded file by its unique stem and recovers the
    /// human title yt-dlp expanded into the name.
    async fn locate_artifact(
        &self,
        stem: &str,
        kind: MediaKind,
    ) -> Result<Artifact, GrabbitError> {
        let marker = format!("{stem}__");
        let mut entries = tokio::fs::read_dir(&self.download_dir)
            .await
            .map_err(|e| ext_err(format!("failed to list download dir: {e}")))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ext_err(format!("failed to list download dir: {e}")))?
        {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(rest) = name.strip_prefix(&marker) else {
                continue;
            };
            // yt-dlp writes `.part`/`.ytdl` scratch files next to the output.
            if rest.ends_with(".part") || rest.ends_with(".ytdl") {
                continue;
            }
            let title = match rest.rsplit_once('.') {
                Some((title, _ext)) => title.to_string(),
                None => rest.to_string(),
            };
            let path = entry.path();
            let size = tokio::fs::metadata(&path)
                .await
                .map_err(|e| ext_err(format!("failed to stat artifact: {e}")))?
                .len();
            return Ok(Artifact {
                path,
                title,
                size,
                kind,
            });
        }
        Err(ext_err("yt-dlp produced no output file".to_string()))
    }
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    async fn probe(&self, url: &str) -> Result<MediaInfo, GrabbitError> {
        let output = Command::new(&self.bin)
            .arg("-J")
            .arg("--no-warnings")
            .arg(url)
            .output()
            .await
            .map_err(|e| GrabbitError::Extractor {
                message: format!("failed to launch {}: {e}", self.bin),
                source: Some(Box::new(e)),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ext_err(format!(
                "yt-dlp probe failed: {}",
                stderr.lines().last().unwrap_or("unknown error")
            )));
        }

        let raw: types::RawInfo =
            serde_json::from_slice(&output.stdout).map_err(|e| GrabbitError::Extractor {
                message: format!("failed to parse yt-dlp metadata: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(raw.into_media_info(url))
    }

    async fn fetch(
        &self,
        url: &str,
        format_id: &str,
        kind: MediaKind,
        progress: mpsc::Sender<ProgressEvent>,
    ) -> Result<Artifact, GrabbitError> {
        tokio::fs::create_dir_all(&self.download_dir)
            .await
            .map_err(|e| ext_err(format!("failed to create download dir: {e}")))?;

        let stem = Uuid::new_v4().simple().to_string();
        let template = self
            .download_dir
            .join(format!("{stem}__%(title)s.%(ext)s"));

        let mut cmd = Command::new(&self.bin);
        cmd.arg("--newline")
            .arg("--no-warnings")
            .arg("-f")
            .arg(format_id)
            .arg("-o")
            .arg(&template);
        if kind.is_audio() {
            cmd.arg("-x")
                .arg("--audio-format")
                .arg("mp3")
                .arg("--audio-quality")
                .arg("192K");
        }
        cmd.arg(url);

        let mut child = cmd
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| GrabbitError::Extractor {
                message: format!("failed to launch {}: {e}", self.bin),
                source: Some(Box::new(e)),
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ext_err("yt-dlp stdout was not captured".to_string()))?;
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| ext_err(format!("failed to read yt-dlp output: {e}")))?
        {
            if let Some(event) = parse_progress_line(&line) {
                // A full channel means the consumer is mid-edit; stale
                // snapshots are dropped rather than queued.
                progress.try_send(event).ok();
            } else {
                debug!(line, "yt-dlp");
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ext_err(format!("failed to wait for yt-dlp: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, "yt-dlp download failed");
            return Err(ext_err(format!(
                "yt-dlp download failed: {}",
                stderr.lines().last().unwrap_or("unknown error")
            )));
        }

        let artifact = self.locate_artifact(&stem, kind).await?;
        progress.try_send(ProgressEvent::Finished).ok();
        Ok(artifact)
    }
}
