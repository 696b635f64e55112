// SPDX-FileCopyrightText: 2026 Grabbit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation state machine: link intake, inline menus, and the
//! rename sub-flow.
//!
//! Every inline button round-trips through a [`MenuAction`]; a session
//! that has vanished from the registry answers with an expired alert
//! instead of a stale menu.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId};
use tracing::{debug, warn};

use grabbit_core::{
    filter_for_tier, resolve_audio_catalog, resolve_video_catalog, GrabbitError, MediaKind,
    QualityOption, Session, SessionId, UserId,
};

use crate::action::MenuAction;
use crate::{acquire, channel_err, commands, texts, AppContext};

/// The original bot only ever accepted YouTube links; everything else
/// in a private chat is ignored.
pub fn looks_like_media_url(text: &str) -> bool {
    text.contains("youtube.com") || text.contains("youtu.be")
}

/// The four-row action card shown under the overview.
pub fn overview_keyboard(sid: &SessionId) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([
        [InlineKeyboardButton::callback(
            "ℹ️ Info",
            MenuAction::Info(sid.clone()).encode(),
        )],
        [InlineKeyboardButton::callback(
            "🎞️ Video",
            MenuAction::VideoMenu(sid.clone()).encode(),
        )],
        [InlineKeyboardButton::callback(
            "🎧 Audio",
            MenuAction::AudioMenu(sid.clone()).encode(),
        )],
        [InlineKeyboardButton::callback(
            "💎 Premium",
            MenuAction::Premium(sid.clone()).encode(),
        )],
    ])
}

/// One button per quality, lowest first, with a Back row appended.
pub fn quality_keyboard(
    options: &[QualityOption],
    kind: MediaKind,
    sid: &SessionId,
) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = options
        .iter()
        .map(|opt| {
            vec![InlineKeyboardButton::callback(
                opt.label.clone(),
                MenuAction::Acquire {
                    kind,
                    session: sid.clone(),
                    format_id: opt.format_id.clone(),
                }
                .encode(),
            )]
        })
        .collect();
    rows.push(vec![InlineKeyboardButton::callback(
        "↩️ Back",
        MenuAction::Back(sid.clone()).encode(),
    )]);
    InlineKeyboardMarkup::new(rows)
}

/// Entry point for every private text message.
pub async fn handle_message(
    ctx: &Arc<AppContext>,
    bot: &Bot,
    msg: &Message,
) -> Result<(), GrabbitError> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let user = UserId(from.id.0 as i64);

    let parsed = commands::parse(text);

    // A pending rename claims the next plain text message. Recognized
    // commands still dispatch instead of becoming the filename; /skip
    // is deliberately unregistered so it reaches the rename handler.
    if claims_pending_rename(&parsed)
        && let Some(session) = ctx.sessions.find_awaiting_rename_for(user)
    {
        return acquire::complete_rename(ctx, bot, session, text.trim()).await;
    }

    match parsed {
        commands::Parsed::Command(cmd) => commands::dispatch(ctx, bot, msg, cmd).await,
        commands::Parsed::Malformed(usage) => {
            bot.send_message(msg.chat.id, usage)
                .await
                .map_err(|e| channel_err("failed to send usage hint", e))?;
            Ok(())
        }
        commands::Parsed::NotACommand => {
            if looks_like_media_url(text) {
                intake(ctx, bot, msg.chat.id, user, text.trim()).await
            } else {
                debug!(chat_id = msg.chat.id.0, "ignoring non-link text");
                Ok(())
            }
        }
    }
}

/// Whether a pending rename should absorb this message as the new
/// filename.
fn claims_pending_rename(parsed: &commands::Parsed) -> bool {
    matches!(parsed, commands::Parsed::NotACommand)
}

/// Probes the link and presents the overview card with action buttons.
async fn intake(
    ctx: &Arc<AppContext>,
    bot: &Bot,
    chat_id: ChatId,
    user: UserId,
    url: &str,
) -> Result<(), GrabbitError> {
    // Pre-check only; the quota is consumed when a download is triggered.
    if !ctx.store.is_premium(user).await?
        && !ctx
            .store
            .can_consume_free(user, ctx.config.download.free_daily_limit)
            .await?
    {
        bot.send_message(
            chat_id,
            texts::free_limit_reached(ctx.config.download.free_daily_limit),
        )
        .await
        .map_err(|e| channel_err("failed to send limit notice", e))?;
        return Ok(());
    }

    let probe_msg = bot
        .send_message(chat_id, texts::FETCHING_INFO)
        .await
        .map_err(|e| channel_err("failed to send probe notice", e))?;

    let info = match ctx.extractor.probe(url).await {
        Ok(info) => info,
        Err(e) => {
            warn!(error = %e, "probe failed");
            bot.edit_message_text(chat_id, probe_msg.id, texts::failed_info(&e.to_string()))
                .await
                .map_err(|e| channel_err("failed to report probe error", e))?;
            return Ok(());
        }
    };
    metrics::counter!("grabbit_probes_total").increment(1);

    let thumbnail = info
        .thumbnail_url
        .as_deref()
        .and_then(|u| reqwest::Url::parse(u).ok());
    let text = texts::overview(&info);
    let sid = ctx.sessions.create(Session::new(user, chat_id.0, info));
    let kb = overview_keyboard(&sid);

    // The placeholder is replaced by the card, not edited, so the card
    // can carry a photo.
    bot.delete_message(chat_id, probe_msg.id).await.ok();
    match thumbnail {
        Some(url) => {
            bot.send_photo(chat_id, InputFile::url(url))
                .caption(text)
                .reply_markup(kb)
                .await
                .map_err(|e| channel_err("failed to send overview card", e))?;
        }
        None => {
            bot.send_message(chat_id, text)
                .reply_markup(kb)
                .await
                .map_err(|e| channel_err("failed to send overview card", e))?;
        }
    }
    Ok(())
}

async fn answer_alert(bot: &Bot, q: &CallbackQuery, text: &str) -> Result<(), GrabbitError> {
    bot.answer_callback_query(q.id.clone())
        .text(text)
        .show_alert(true)
        .await
        .map_err(|e| channel_err("failed to answer callback", e))?;
    Ok(())
}

/// Entry point for every inline-button press.
pub async fn handle_callback(
    ctx: &Arc<AppContext>,
    bot: &Bot,
    q: &CallbackQuery,
) -> Result<(), GrabbitError> {
    let Some(action) = q.data.as_deref().and_then(MenuAction::parse) else {
        return answer_alert(bot, q, texts::UNKNOWN_ACTION).await;
    };
    let Some(message) = q.message.as_ref() else {
        // The source message is too old for Telegram to reference.
        return answer_alert(bot, q, texts::SESSION_EXPIRED).await;
    };
    let chat_id = message.chat().id;
    let message_id = message.id();
    let user = UserId(q.from.id.0 as i64);

    match action {
        MenuAction::Info(sid) => {
            let Some(session) = ctx.sessions.get(&sid) else {
                return answer_alert(bot, q, texts::SESSION_EXPIRED).await;
            };
            bot.answer_callback_query(q.id.clone())
                .await
                .map_err(|e| channel_err("failed to answer callback", e))?;
            bot.edit_message_text(chat_id, message_id, texts::details(&session.info))
                .await
                .map_err(|e| channel_err("failed to show details", e))?;
        }
        MenuAction::VideoMenu(sid) => {
            quality_menu(ctx, bot, q, chat_id, message_id, user, &sid, MediaKind::Video).await?;
        }
        MenuAction::AudioMenu(sid) => {
            quality_menu(ctx, bot, q, chat_id, message_id, user, &sid, MediaKind::Audio).await?;
        }
        MenuAction::Back(sid) => {
            let Some(session) = ctx.sessions.get(&sid) else {
                return answer_alert(bot, q, texts::SESSION_EXPIRED).await;
            };
            bot.edit_message_text(chat_id, message_id, texts::overview_compact(&session.info))
                .reply_markup(overview_keyboard(&sid))
                .await
                .map_err(|e| channel_err("failed to show overview", e))?;
            bot.answer_callback_query(q.id.clone())
                .await
                .map_err(|e| channel_err("failed to answer callback", e))?;
        }
        MenuAction::Premium(_sid) => {
            bot.answer_callback_query(q.id.clone())
                .await
                .map_err(|e| channel_err("failed to answer callback", e))?;
            send_premium_card(ctx, bot, chat_id).await?;
        }
        MenuAction::Acquire {
            kind,
            session: sid,
            format_id,
        } => {
            trigger_acquisition(ctx, bot, q, chat_id, message_id, user, sid, format_id, kind)
                .await?;
        }
    }
    Ok(())
}

async fn send_premium_card(
    ctx: &Arc<AppContext>,
    bot: &Bot,
    chat_id: ChatId,
) -> Result<(), GrabbitError> {
    let text = texts::premium_plans(ctx.config.download.free_daily_limit);
    let qr = ctx
        .config
        .premium
        .qr_url
        .as_deref()
        .and_then(|u| reqwest::Url::parse(u).ok());
    match qr {
        Some(url) => {
            let kb = InlineKeyboardMarkup::new([[InlineKeyboardButton::url(
                "Open QR image",
                url.clone(),
            )]]);
            bot.send_photo(chat_id, InputFile::url(url))
                .caption(text)
                .reply_markup(kb)
                .await
                .map_err(|e| channel_err("failed to send premium card", e))?;
        }
        None => {
            bot.send_message(chat_id, text)
                .await
                .map_err(|e| channel_err("failed to send premium card", e))?;
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn quality_menu(
    ctx: &Arc<AppContext>,
    bot: &Bot,
    q: &CallbackQuery,
    chat_id: ChatId,
    message_id: MessageId,
    user: UserId,
    sid: &SessionId,
    kind: MediaKind,
) -> Result<(), GrabbitError> {
    let Some(session) = ctx.sessions.get(sid) else {
        return answer_alert(bot, q, texts::SESSION_EXPIRED).await;
    };

    let (options, empty_text, gated_text, prompt, ceiling) = match kind {
        MediaKind::Video => (
            resolve_video_catalog(&session.info.formats),
            texts::NO_VIDEO_FORMATS,
            texts::VIDEO_PREMIUM_ONLY,
            texts::SELECT_VIDEO,
            ctx.config.download.free_max_height,
        ),
        MediaKind::Audio => (
            resolve_audio_catalog(&session.info.formats),
            texts::NO_AUDIO_FORMATS,
            texts::AUDIO_PREMIUM_ONLY,
            texts::SELECT_AUDIO,
            ctx.config.download.free_max_abr_kbps,
        ),
    };
    if options.is_empty() {
        return answer_alert(bot, q, empty_text).await;
    }

    let is_premium = ctx.store.is_premium(user).await?;
    let allowed = filter_for_tier(options, is_premium, ceiling);
    if allowed.is_empty() {
        return answer_alert(bot, q, gated_text).await;
    }

    bot.edit_message_text(chat_id, message_id, prompt)
        .reply_markup(quality_keyboard(&allowed, kind, sid))
        .await
        .map_err(|e| channel_err("failed to show quality menu", e))?;
    bot.answer_callback_query(q.id.clone())
        .await
        .map_err(|e| channel_err("failed to answer callback", e))?;
    Ok(())
}

/// Re-checks entitlements, consumes the free quota, pins the status
/// message, and hands off to the orchestrator.
#[allow(clippy::too_many_arguments)]
async fn trigger_acquisition(
    ctx: &Arc<AppContext>,
    bot: &Bot,
    q: &CallbackQuery,
    chat_id: ChatId,
    message_id: MessageId,
    user: UserId,
    sid: SessionId,
    format_id: String,
    kind: MediaKind,
) -> Result<(), GrabbitError> {
    let Some(session) = ctx.sessions.get(&sid) else {
        return answer_alert(bot, q, texts::SESSION_EXPIRED).await;
    };
    let url = session.info.webpage_url.clone();

    // The menu-time check may be stale by now; the quota is consumed
    // here, at the moment of commitment.
    let is_premium = ctx.store.is_premium(user).await?;
    if !is_premium {
        let limit = ctx.config.download.free_daily_limit;
        if !ctx.store.can_consume_free(user, limit).await? {
            return answer_alert(bot, q, &texts::free_limit_reached(limit)).await;
        }
        ctx.store.record_free_consumption(user).await?;
    }

    let status = bot
        .edit_message_text(chat_id, message_id, texts::PREPARING_DOWNLOAD)
        .await
        .map_err(|e| channel_err("failed to pin status message", e))?;
    ctx.sessions.update(&sid, |s| {
        s.status_message_id = Some(status.id.0);
    });

    bot.answer_callback_query(q.id.clone())
        .text(texts::ACQUISITION_STARTED)
        .await
        .map_err(|e| channel_err("failed to answer callback", e))?;

    let ctx = Arc::clone(ctx);
    let bot = bot.clone();
    tokio::spawn(async move {
        acquire::run(ctx, bot, sid, url, format_id, kind, is_premium).await;
    });
    Ok(())
}
