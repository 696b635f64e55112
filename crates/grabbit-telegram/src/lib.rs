// SPDX-FileCopyrightText: 2026 Grabbit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram front end for the Grabbit download bot.
//!
//! Wires teloxide long polling into the conversation flow: private
//! text messages feed link intake and commands, callback queries feed
//! the inline menus, and acquisitions run as detached tasks.

pub mod acquire;
pub mod action;
pub mod commands;
pub mod flow;
pub mod progress;
pub mod texts;

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::ChatKind;
use tracing::{debug, error, info};

use grabbit_config::model::GrabbitConfig;
use grabbit_core::{EntitlementStore, GrabbitError, MediaExtractor, SessionRegistry};

/// Shared dependencies handed to every handler.
pub struct AppContext {
    pub config: GrabbitConfig,
    pub store: Arc<dyn EntitlementStore>,
    pub extractor: Arc<dyn MediaExtractor>,
    pub sessions: SessionRegistry,
}

/// Wraps a teloxide request error into the channel error variant.
pub(crate) fn channel_err(context: &str, e: teloxide::RequestError) -> GrabbitError {
    GrabbitError::Channel {
        message: format!("{context}: {e}"),
        source: Some(Box::new(e)),
    }
}

fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

/// Starts long polling and blocks until shutdown.
pub async fn run(ctx: Arc<AppContext>) -> Result<(), GrabbitError> {
    let token = ctx
        .config
        .telegram
        .bot_token
        .as_deref()
        .ok_or_else(|| GrabbitError::Config("telegram.bot_token is required".into()))?;
    if token.is_empty() {
        return Err(GrabbitError::Config(
            "telegram.bot_token cannot be empty".into(),
        ));
    }
    let bot = Bot::new(token);

    info!(bot = %ctx.config.bot.name, "starting Telegram long polling");

    let message_ctx = Arc::clone(&ctx);
    let callback_ctx = Arc::clone(&ctx);

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
            let ctx = Arc::clone(&message_ctx);
            async move {
                if !is_dm(&msg) {
                    debug!(chat_id = msg.chat.id.0, "ignoring non-DM message");
                    return respond(());
                }
                if let Err(e) = flow::handle_message(&ctx, &bot, &msg).await {
                    error!(error = %e, chat_id = msg.chat.id.0, "message handler failed");
                }
                respond(())
            }
        }))
        .branch(
            Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
                let ctx = Arc::clone(&callback_ctx);
                async move {
                    if let Err(e) = flow::handle_callback(&ctx, &bot, &q).await {
                        error!(error = %e, "callback handler failed");
                    }
                    respond(())
                }
            }),
        );

    Dispatcher::builder(bot, handler)
        .default_handler(|_| async {}) // Silently ignore other update kinds
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

/// Stand-ins and fixtures shared by the handler tests.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use grabbit_core::{Artifact, MediaInfo, MediaKind, ProgressEvent, SessionRegistry, UserId};

    pub(crate) struct NoopStore;

    #[async_trait::async_trait]
    impl EntitlementStore for NoopStore {
        fn name(&self) -> &str {
            "noop"
        }
        async fn is_premium(&self, _user: UserId) -> Result<bool, GrabbitError> {
            Ok(false)
        }
        async fn remaining_days(&self, _user: UserId) -> Result<i64, GrabbitError> {
            Ok(0)
        }
        async fn grant_premium(
            &self,
            _user: UserId,
            _days: i64,
            _plan: &str,
        ) -> Result<(), GrabbitError> {
            Ok(())
        }
        async fn revoke_premium(&self, _user: UserId) -> Result<(), GrabbitError> {
            Ok(())
        }
        async fn can_consume_free(
            &self,
            _user: UserId,
            _daily_limit: u32,
        ) -> Result<bool, GrabbitError> {
            Ok(true)
        }
        async fn record_free_consumption(&self, _user: UserId) -> Result<(), GrabbitError> {
            Ok(())
        }
        async fn record_download(
            &self,
            _user: UserId,
            _title: &str,
            _path: &str,
            _size: u64,
        ) -> Result<(), GrabbitError> {
            Ok(())
        }
        async fn download_count(&self) -> Result<u64, GrabbitError> {
            Ok(0)
        }
    }

    pub(crate) struct NoopExtractor;

    #[async_trait::async_trait]
    impl MediaExtractor for NoopExtractor {
        async fn probe(&self, _url: &str) -> Result<MediaInfo, GrabbitError> {
            Err(GrabbitError::Internal("unreachable in tests".into()))
        }
        async fn fetch(
            &self,
            _url: &str,
            _format_id: &str,
            _kind: MediaKind,
            _progress: tokio::sync::mpsc::Sender<ProgressEvent>,
        ) -> Result<Artifact, GrabbitError> {
            Err(GrabbitError::Internal("unreachable in tests".into()))
        }
    }

    pub(crate) fn app_context() -> Arc<AppContext> {
        Arc::new(AppContext {
            config: GrabbitConfig::default(),
            store: Arc::new(NoopStore),
            extractor: Arc::new(NoopExtractor),
            sessions: SessionRegistry::new(),
        })
    }

    pub(crate) fn media_info() -> MediaInfo {
        MediaInfo {
            title: "Test Clip".into(),
            uploader: None,
            duration_secs: Some(30),
            view_count: None,
            upload_date: None,
            description: None,
            thumbnail_url: None,
            webpage_url: "https://example.com/watch?v=x".into(),
            formats: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{NoopExtractor, NoopStore};
    use super::*;
    use grabbit_config::model::GrabbitConfig;
    use grabbit_core::SessionRegistry;

    #[tokio::test]
    async fn run_requires_bot_token() {
        let ctx = testing::app_context();
        let err = run(ctx).await.unwrap_err();
        assert!(matches!(err, GrabbitError::Config(_)));
    }

    #[tokio::test]
    async fn run_rejects_empty_token() {
        let mut config = GrabbitConfig::default();
        config.telegram.bot_token = Some(String::new());
        let ctx = Arc::new(AppContext {
            config,
            store: Arc::new(NoopStore),
            extractor: Arc::new(NoopExtractor),
            sessions: SessionRegistry::new(),
        });
        let err = run(ctx).await.unwrap_err();
        assert!(matches!(err, GrabbitError::Config(_)));
    }
}
