// SPDX-FileCopyrightText: 2026 Grabbit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-size file splitting for the oversized premium delivery path.
//!
//! Prefers the external `split(1)` utility; falls back to a pure
//! read/write chunking loop when the binary is unavailable. Both paths
//! produce sequentially ordered parts whose concatenation reproduces the
//! original bytes exactly.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::debug;

use grabbit_core::GrabbitError;

fn split_err(message: String) -> GrabbitError {
    GrabbitError::Extractor {
        message,
        source: None,
    }
}

/// Splits `path` into parts of at most `chunk_size` bytes, returned in
/// delivery order.
pub async fn split_file(path: &Path, chunk_size: u64) -> Result<Vec<PathBuf>, GrabbitError> {
    match split_with_external(path, chunk_size).await {
        Ok(parts) if !parts.is_empty() => Ok(parts),
        Ok(_) => split_with_io_loop(path, chunk_size).await,
        Err(err) => {
            debug!(error = %err, "external split unavailable, using io fallback");
            split_with_io_loop(path, chunk_size).await
        }
    }
}

/// Delegates to `split(1)` with a `.part_` suffix prefix, then collects
/// the produced parts in lexicographic (creation) order.
async fn split_with_external(path: &Path, chunk_size: u64) -> Result<Vec<PathBuf>, GrabbitError> {
    let prefix = format!("{}.part_", path.display());
    let status = Command::new("split")
        .arg("-b")
        .arg(chunk_size.to_string())
        .arg(path)
        .arg(&prefix)
        .status()
        .await
        .map_err(|e| split_err(format!("failed to launch split: {e}")))?;
    if !status.success() {
        return Err(split_err(format!("split exited with {status}")));
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| split_err("artifact path has no file name".into()))?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let marker = format!("{file_name}.part_");

    let mut parts = Vec::new();
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| split_err(format!("failed to list parts: {e}")))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| split_err(format!("failed to list parts: {e}")))?
    {
        if entry
            .file_name()
            .to_str()
            .is_some_and(|n| n.starts_with(&marker))
        {
            parts.push(entry.path());
        }
    }
    parts.sort();
    Ok(parts)
}

/// Pure chunking fallback: copies `chunk_size` bytes at a time into
/// sequentially numbered `.partN` files.
pub(crate) async fn split_with_io_loop(
    path: &Path,
    chunk_size: u64,
) -> Result<Vec<PathBuf>, GrabbitError> {
    let mut input = fs::File::open(path)
        .await
        .map_err(|e| split_err(format!("failed to open artifact: {e}")))?;

    let mut parts = Vec::new();
    let mut index = 0usize;
    loop {
        let part_path = PathBuf::from(format!("{}.part{index}", path.display()));
        let mut limited = (&mut input).take(chunk_size);
        let mut out = fs::File::create(&part_path)
            .await
            .map_err(|e| split_err(format!("failed to create part: {e}")))?;
        let copied = tokio::io::copy(&mut limited, &mut out)
            .await
            .map_err(|e| split_err(format!("failed to write part: {e}")))?;

        if copied == 0 {
            // Past the end of input: the probe part is empty, drop it.
            drop(out);
            fs::remove_file(&part_path).await.ok();
            break;
        }
        parts.push(part_path);
        index += 1;
        if copied < chunk_size {
            break;
        }
    }
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn write_input(dir: &Path, len: usize) -> PathBuf {
        let path = dir.join("artifact.bin");
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &data).await.unwrap();
        path
    }

    async fn concat(parts: &[PathBuf]) -> Vec<u8> {
        let mut all = Vec::new();
        for part in parts {
            all.extend(fs::read(part).await.unwrap());
        }
        all
    }

    #[tokio::test]
    async fn io_loop_produces_ceil_s_over_c_parts() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(dir.path(), 10_000).await;

        let parts = split_with_io_loop(&path, 3_000).await.unwrap();
        assert_eq!(parts.len(), 4); // ceil(10000 / 3000)

        let sizes: Vec<u64> = {
            let mut v = Vec::new();
            for p in &parts {
                v.push(fs::metadata(p).await.unwrap().len());
            }
            v
        };
        assert_eq!(sizes, vec![3_000, 3_000, 3_000, 1_000]);

        let original = fs::read(&path).await.unwrap();
        assert_eq!(concat(&parts).await, original);
    }

    #[tokio::test]
    async fn io_loop_exact_multiple_has_no_empty_tail() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(dir.path(), 6_000).await;

        let parts = split_with_io_loop(&path, 3_000).await.unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(concat(&parts).await, fs::read(&path).await.unwrap());
    }

    #[tokio::test]
    async fn io_loop_single_part_when_chunk_exceeds_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(dir.path(), 100).await;

        let parts = split_with_io_loop(&path, 3_000).await.unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(fs::metadata(&parts[0]).await.unwrap().len(), 100);
    }

    #[tokio::test]
    async fn split_file_reassembles_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(dir.path(), 7_500).await;

        let parts = split_file(&path, 2_000).await.unwrap();
        assert_eq!(parts.len(), 4);
        assert_eq!(concat(&parts).await, fs::read(&path).await.unwrap());
    }
}
