// SPDX-FileCopyrightText: 2026 Grabbit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Acquisition orchestrator: drives a fetch to completion and decides
//! how the resulting artifact reaches the user.
//!
//! Disposition rules for an artifact over the upload ceiling: premium
//! users get it split into chunks, free users get it parked in the
//! operator's storage channel. Under the ceiling, premium users enter
//! the rename sub-flow and free users get direct delivery.

use std::path::Path;
use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{
    ChatId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId,
};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use grabbit_core::{
    Artifact, GrabbitError, MediaKind, Session, SessionId, StagedArtifact, UserId,
};
use grabbit_ytdlp::split_file;

use crate::{channel_err, progress, texts, AppContext};

/// Runs one acquisition end to end. Spawned as a detached task; all
/// failures are reported to the chat rather than propagated.
pub async fn run(
    ctx: Arc<AppContext>,
    bot: Bot,
    sid: SessionId,
    url: String,
    format_id: String,
    kind: MediaKind,
    is_premium: bool,
) {
    let Some(session) = ctx.sessions.get(&sid) else {
        warn!(session = %sid, "acquisition started for vanished session");
        return;
    };
    let chat_id = ChatId(session.chat_id);

    let (tx, rx) = mpsc::channel(8);
    let updater = session
        .status_message_id
        .map(|mid| progress::spawn_updater(bot.clone(), chat_id, MessageId(mid), rx));

    let result = ctx.extractor.fetch(&url, &format_id, kind, tx).await;
    if let Some(handle) = updater {
        // The sender is dropped once fetch returns, so the updater
        // drains its backlog and exits.
        handle.await.ok();
    }

    let outcome = match result {
        Ok(artifact) => {
            info!(
                session = %sid,
                size = artifact.size,
                title = %artifact.title,
                "fetch complete"
            );
            dispose(&ctx, &bot, &session, artifact, is_premium).await
        }
        Err(e) => Err(e),
    };

    match outcome {
        Ok(staged_rename) => {
            metrics::counter!("grabbit_downloads_total", "outcome" => "ok").increment(1);
            if !staged_rename {
                close_flow(&ctx, &bot, &sid, chat_id).await;
            }
        }
        Err(e) => {
            metrics::counter!("grabbit_downloads_total", "outcome" => "error").increment(1);
            error!(session = %sid, error = %e, "acquisition failed");
            ctx.sessions.remove(&sid);
            bot.send_message(chat_id, texts::download_error(&e.to_string()))
                .await
                .ok();
        }
    }
}

/// The four delivery branches of the size/tier matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    SplitChunks,
    Archive,
    StageRename,
    Direct,
}

fn disposition_for(size: u64, ceiling: u64, is_premium: bool) -> Disposition {
    match (size > ceiling, is_premium) {
        (true, true) => Disposition::SplitChunks,
        (true, false) => Disposition::Archive,
        (false, true) => Disposition::StageRename,
        (false, false) => Disposition::Direct,
    }
}

/// Applies the size/tier disposition matrix. Returns `true` when the
/// artifact was staged for rename and the session must stay alive.
async fn dispose(
    ctx: &Arc<AppContext>,
    bot: &Bot,
    session: &Session,
    artifact: Artifact,
    is_premium: bool,
) -> Result<bool, GrabbitError> {
    let chat_id = ChatId(session.chat_id);

    match disposition_for(
        artifact.size,
        ctx.config.download.max_upload_bytes,
        is_premium,
    ) {
        Disposition::SplitChunks => {
            deliver_parts(ctx, bot, chat_id, &artifact).await?;
            ctx.store
                .record_download(
                    session.user,
                    &artifact.title,
                    &artifact.path.to_string_lossy(),
                    artifact.size,
                )
                .await?;
            Ok(false)
        }
        Disposition::Archive => {
            archive(ctx, bot, chat_id, session.user, &artifact).await?;
            Ok(false)
        }
        Disposition::StageRename => {
            ctx.sessions.update(&session.id, |s| {
                s.awaiting_rename = true;
                s.staged = Some(StagedArtifact {
                    path: artifact.path.clone(),
                    title: artifact.title.clone(),
                    kind: artifact.kind,
                });
            });
            bot.send_message(chat_id, texts::RENAME_PROMPT)
                .await
                .map_err(|e| channel_err("failed to send rename prompt", e))?;
            Ok(true)
        }
        Disposition::Direct => {
            let thumbnail = session.info.thumbnail_url.as_deref();
            deliver(ctx, bot, chat_id, session.user, &artifact, thumbnail).await?;
            Ok(false)
        }
    }
}

/// Splits the artifact and sends each chunk as a document, deleting
/// each part as soon as it has been delivered.
async fn deliver_parts(
    ctx: &Arc<AppContext>,
    bot: &Bot,
    chat_id: ChatId,
    artifact: &Artifact,
) -> Result<(), GrabbitError> {
    let parts = split_file(&artifact.path, ctx.config.download.split_chunk_bytes).await?;
    let total = parts.len();
    for (index, part) in parts.iter().enumerate() {
        bot.send_document(chat_id, InputFile::file(part))
            .caption(texts::part_caption(
                &artifact.title,
                index + 1,
                total,
                &ctx.config.bot.name,
            ))
            .await
            .map_err(|e| channel_err("failed to send part", e))?;
        tokio::fs::remove_file(part).await.ok();
    }
    Ok(())
}

/// Parks an oversized free-tier artifact in the storage channel. The
/// local copy is kept so the operator can re-send it on request.
async fn archive(
    ctx: &Arc<AppContext>,
    bot: &Bot,
    chat_id: ChatId,
    user: UserId,
    artifact: &Artifact,
) -> Result<(), GrabbitError> {
    bot.send_message(chat_id, texts::file_too_large(artifact.size))
        .await
        .map_err(|e| channel_err("failed to send size notice", e))?;

    let Some(channel) = ctx.config.telegram.archive_channel_id else {
        warn!("no storage channel configured, oversized artifact stays local");
        bot.send_message(chat_id, texts::NO_STORAGE_CHANNEL)
            .await
            .map_err(|e| channel_err("failed to report archive failure", e))?;
        return Ok(());
    };

    bot.send_document(ChatId(channel), InputFile::file(&artifact.path))
        .caption(texts::archive_caption(user.0, &artifact.title))
        .await
        .map_err(|e| channel_err("failed to archive artifact", e))?;
    bot.send_message(chat_id, texts::stored_in_channel(channel))
        .await
        .map_err(|e| channel_err("failed to confirm archive", e))?;
    Ok(())
}

/// Direct delivery: sends the media, records it, and deletes the local
/// copy.
async fn deliver(
    ctx: &Arc<AppContext>,
    bot: &Bot,
    chat_id: ChatId,
    user: UserId,
    artifact: &Artifact,
    thumbnail_url: Option<&str>,
) -> Result<(), GrabbitError> {
    let caption = texts::delivery_caption(&artifact.title, &ctx.config.bot.name);
    match artifact.kind {
        MediaKind::Audio => {
            bot.send_audio(chat_id, InputFile::file(&artifact.path))
                .caption(caption)
                .await
                .map_err(|e| channel_err("failed to send audio", e))?;
        }
        MediaKind::Video => {
            let mut request = bot
                .send_video(chat_id, InputFile::file(&artifact.path))
                .caption(caption);
            if let Some(url) = thumbnail_url.and_then(|u| reqwest::Url::parse(u).ok()) {
                request = request.thumbnail(InputFile::url(url));
            }
            request
                .await
                .map_err(|e| channel_err("failed to send video", e))?;
        }
    }

    ctx.store
        .record_download(
            user,
            &artifact.title,
            &artifact.path.to_string_lossy(),
            artifact.size,
        )
        .await?;
    tokio::fs::remove_file(&artifact.path).await.ok();
    Ok(())
}

/// Derives the renamed path, keeping the staged extension. Path
/// separators in the requested name are flattened.
fn renamed_path(staged: &Path, new_name: &str) -> Option<std::path::PathBuf> {
    let safe: String = new_name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    if safe.trim().is_empty() {
        return None;
    }
    let parent = staged.parent()?;
    let file_name = match staged.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{safe}.{ext}"),
        None => safe,
    };
    Some(parent.join(file_name))
}

/// Completes the rename sub-flow: `/skip` keeps the original title,
/// anything else becomes the new filename and caption.
pub async fn complete_rename(
    ctx: &Arc<AppContext>,
    bot: &Bot,
    mut session: Session,
    reply: &str,
) -> Result<(), GrabbitError> {
    let Some(staged) = session.staged.take() else {
        // Flag without an artifact; drop the stale session.
        ctx.sessions.remove(&session.id);
        return Ok(());
    };
    let chat_id = ChatId(session.chat_id);

    let new_name = if reply == "/skip" { None } else { Some(reply) };
    let mut path = staged.path.clone();
    let mut title = staged.title.clone();
    if let Some(name) = new_name {
        if let Some(new_path) = renamed_path(&staged.path, name) {
            match tokio::fs::rename(&staged.path, &new_path).await {
                Ok(()) => {
                    path = new_path;
                    title = name.to_string();
                }
                Err(e) => {
                    warn!(error = %e, "rename failed, keeping original name");
                }
            }
        }
    }

    let size = tokio::fs::metadata(&path).await.map(|m| m.len()).unwrap_or(0);
    let artifact = Artifact {
        path,
        title,
        size,
        kind: staged.kind,
    };
    let thumbnail = session.info.thumbnail_url.clone();
    match deliver(ctx, bot, chat_id, session.user, &artifact, thumbnail.as_deref()).await {
        Ok(()) => close_flow(ctx, bot, &session.id, chat_id).await,
        Err(e) => {
            ctx.sessions.remove(&session.id);
            bot.send_message(chat_id, texts::download_error(&e.to_string()))
                .await
                .ok();
        }
    }
    Ok(())
}

/// Terminal step shared by the direct and rename flows: the session is
/// dropped and the upsell footer follows the delivery.
async fn close_flow(ctx: &Arc<AppContext>, bot: &Bot, sid: &SessionId, chat_id: ChatId) {
    ctx.sessions.remove(sid);
    send_premium_cta(ctx, bot, chat_id).await;
}

/// Upsell footer sent after every successful acquisition.
async fn send_premium_cta(ctx: &Arc<AppContext>, bot: &Bot, chat_id: ChatId) {
    let mut request = bot.send_message(chat_id, texts::PREMIUM_CTA);
    if let Some(url) = ctx
        .config
        .premium
        .qr_url
        .as_deref()
        .and_then(|u| reqwest::Url::parse(u).ok())
    {
        request = request.reply_markup(InlineKeyboardMarkup::new([[
            InlineKeyboardButton::url("💎 Get Premium", url),
        ]]));
    }
    request.await.ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    const CEILING: u64 = 1_900 * 1024 * 1024;

    #[test]
    fn oversized_premium_splits() {
        let size = (2.5 * 1024.0 * 1024.0 * 1024.0) as u64;
        assert_eq!(
            disposition_for(size, CEILING, true),
            Disposition::SplitChunks
        );
    }

    #[test]
    fn oversized_free_archives() {
        let size = (2.5 * 1024.0 * 1024.0 * 1024.0) as u64;
        assert_eq!(disposition_for(size, CEILING, false), Disposition::Archive);
    }

    #[test]
    fn within_ceiling_premium_stages_rename() {
        assert_eq!(
            disposition_for(500 * 1024 * 1024, CEILING, true),
            Disposition::StageRename
        );
    }

    #[test]
    fn within_ceiling_free_delivers_directly() {
        assert_eq!(
            disposition_for(500 * 1024 * 1024, CEILING, false),
            Disposition::Direct
        );
    }

    #[test]
    fn exact_ceiling_is_not_oversized() {
        assert_eq!(
            disposition_for(CEILING, CEILING, false),
            Disposition::Direct
        );
    }

    #[test]
    fn renamed_path_keeps_extension() {
        let path = renamed_path(Path::new("/tmp/dl/abc__Old.mp4"), "New Name").unwrap();
        assert_eq!(path, Path::new("/tmp/dl/New Name.mp4"));
    }

    #[test]
    fn renamed_path_flattens_separators() {
        let path = renamed_path(Path::new("/tmp/dl/abc__Old.mp4"), "../etc/passwd").unwrap();
        assert_eq!(path, Path::new("/tmp/dl/.._etc_passwd.mp4"));
    }

    #[test]
    fn renamed_path_rejects_blank_names() {
        assert!(renamed_path(Path::new("/tmp/dl/abc__Old.mp4"), "   ").is_none());
        assert!(renamed_path(Path::new("/tmp/dl/abc__Old.mp4"), "").is_none());
    }

    #[test]
    fn renamed_path_without_extension() {
        let path = renamed_path(Path::new("/tmp/dl/abc__Old"), "New").unwrap();
        assert_eq!(path, Path::new("/tmp/dl/New"));
    }

    #[tokio::test]
    async fn close_flow_drops_session_and_sends_upsell() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": false,
                "error_code": 400,
                "description": "short-circuited",
            })))
            .mount(&server)
            .await;

        let ctx = crate::testing::app_context();
        let sid = ctx
            .sessions
            .create(Session::new(UserId(1), 1, crate::testing::media_info()));
        let api_url = server.uri().parse().unwrap();
        let bot = Bot::new("123:ABC").set_api_url(api_url);

        close_flow(&ctx, &bot, &sid, ChatId(1)).await;

        assert!(ctx.sessions.get(&sid).is_none());
        let requests = server.received_requests().await.unwrap();
        assert!(
            requests
                .iter()
                .any(|r| r.url.path().to_lowercase().ends_with("sendmessage")),
            "expected an upsell message send"
        );
    }

    #[tokio::test]
    async fn rename_claim_without_staged_artifact_drops_session() {
        let ctx = crate::testing::app_context();
        let sid = ctx
            .sessions
            .create(Session::new(UserId(1), 1, crate::testing::media_info()));
        let session = ctx.sessions.get(&sid).unwrap();
        let bot = Bot::new("123:ABC");

        complete_rename(&ctx, &bot, session, "new name").await.unwrap();

        assert!(ctx.sessions.get(&sid).is_none());
    }
}
