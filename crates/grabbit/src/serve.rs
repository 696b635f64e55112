// SPDX-FileCopyrightText: 2026 Grabbit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `grabbit serve` command implementation.
//!
//! Initializes logging, selects an entitlement store backend, builds
//! the yt-dlp extractor, and hands control to the Telegram front end.

use std::sync::Arc;

use tracing::info;

use grabbit_config::model::GrabbitConfig;
use grabbit_core::{GrabbitError, SessionRegistry};
use grabbit_telegram::AppContext;
use grabbit_ytdlp::YtDlpExtractor;

/// Runs the `grabbit serve` command until shutdown.
pub async fn run_serve(config: GrabbitConfig) -> Result<(), GrabbitError> {
    init_tracing(&config.bot.log_level);

    info!(
        bot = %config.bot.name,
        download_dir = %config.download.dir,
        "starting grabbit"
    );

    tokio::fs::create_dir_all(&config.download.dir)
        .await
        .map_err(|e| {
            GrabbitError::Config(format!(
                "cannot create download dir {}: {e}",
                config.download.dir
            ))
        })?;

    let store = grabbit_store::select_backend(&config.storage).await?;
    info!(backend = store.name(), "entitlement store ready");

    let extractor = Arc::new(YtDlpExtractor::new(
        config.download.ytdlp_bin.clone(),
        config.download.dir.clone(),
    ));

    let ctx = Arc::new(AppContext {
        config,
        store,
        extractor,
        sessions: SessionRegistry::new(),
    });

    grabbit_telegram::run(ctx).await
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("grabbit={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
