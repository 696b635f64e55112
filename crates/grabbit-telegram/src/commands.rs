// SPDX-FileCopyrightText: 2026 Grabbit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slash-command parsing and execution.
//!
//! Commands are parsed by hand rather than with the teloxide macro so
//! malformed invocations can answer with the exact usage hint instead
//! of being silently dropped.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::info;

use grabbit_core::{GrabbitError, UserId};

use crate::{channel_err, texts, AppContext};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    CheckPremium,
    AddPremium { user: UserId, days: Option<i64> },
    RmPremium { user: UserId },
    Stats,
}

/// Outcome of trying to read a slash command out of a text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Command(Command),
    /// A known command with bad arguments; carries the usage hint.
    Malformed(&'static str),
    NotACommand,
}

pub fn parse(text: &str) -> Parsed {
    let text = text.trim();
    if !text.starts_with('/') {
        return Parsed::NotACommand;
    }
    let mut parts = text.split_whitespace();
    let verb = parts.next().unwrap_or_default();
    // Strip an @botname suffix so commands work from the chat menu.
    let verb = verb.split('@').next().unwrap_or(verb);

    match verb {
        "/start" => Parsed::Command(Command::Start),
        "/help" => Parsed::Command(Command::Help),
        "/check_premium" => Parsed::Command(Command::CheckPremium),
        "/stats" => Parsed::Command(Command::Stats),
        "/add_premium" => {
            let Some(user) = parts.next().and_then(|p| p.parse::<i64>().ok()) else {
                return Parsed::Malformed(texts::CORRECT_ADD_CMD);
            };
            let days = match parts.next() {
                Some(raw) => match raw.parse::<i64>() {
                    Ok(days) if days >= 1 => Some(days),
                    _ => return Parsed::Malformed(texts::CORRECT_ADD_CMD),
                },
                None => None,
            };
            Parsed::Command(Command::AddPremium {
                user: UserId(user),
                days,
            })
        }
        "/rmpremium" => match parts.next().and_then(|p| p.parse::<i64>().ok()) {
            Some(user) => Parsed::Command(Command::RmPremium {
                user: UserId(user),
            }),
            None => Parsed::Malformed(texts::CORRECT_RM_CMD),
        },
        _ => Parsed::NotACommand,
    }
}

fn is_owner(ctx: &AppContext, user: UserId) -> bool {
    ctx.config.bot.owner_ids.contains(&user.0)
}

/// Inline keyboard with a single URL button, omitted when the URL does
/// not parse.
fn url_keyboard(label: &str, url: &str) -> Option<InlineKeyboardMarkup> {
    let url = reqwest::Url::parse(url).ok()?;
    Some(InlineKeyboardMarkup::new([[InlineKeyboardButton::url(
        label, url,
    )]]))
}

pub async fn dispatch(
    ctx: &Arc<AppContext>,
    bot: &Bot,
    msg: &Message,
    cmd: Command,
) -> Result<(), GrabbitError> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let user = UserId(from.id.0 as i64);
    let chat_id = msg.chat.id;

    match cmd {
        Command::Start => {
            bot.send_message(chat_id, texts::start(&ctx.config.bot.name))
                .await
                .map_err(|e| channel_err("failed to send start reply", e))?;
        }
        Command::Help => {
            bot.send_message(chat_id, texts::HELP)
                .await
                .map_err(|e| channel_err("failed to send help reply", e))?;
        }
        Command::CheckPremium => {
            if ctx.store.is_premium(user).await? {
                let days = ctx.store.remaining_days(user).await?;
                bot.send_message(chat_id, texts::premium_status(days))
                    .await
                    .map_err(|e| channel_err("failed to send premium status", e))?;
            } else {
                let mut request = bot.send_message(chat_id, texts::NOT_PREMIUM);
                if let Some(kb) = ctx
                    .config
                    .premium
                    .qr_url
                    .as_deref()
                    .and_then(|url| url_keyboard("💎 Premium", url))
                {
                    request = request.reply_markup(kb);
                }
                request
                    .await
                    .map_err(|e| channel_err("failed to send premium status", e))?;
            }
        }
        Command::AddPremium { user: target, days } => {
            if !is_owner(ctx, user) {
                return Ok(());
            }
            let days = days.unwrap_or(ctx.config.premium.default_days);
            ctx.store
                .grant_premium(target, days, &ctx.config.premium.default_plan)
                .await?;
            info!(user = target.0, days, "premium granted");
            bot.send_message(chat_id, texts::premium_granted(target.0, days))
                .await
                .map_err(|e| channel_err("failed to confirm grant", e))?;
        }
        Command::RmPremium { user: target } => {
            if !is_owner(ctx, user) {
                return Ok(());
            }
            ctx.store.revoke_premium(target).await?;
            info!(user = target.0, "premium revoked");
            bot.send_message(chat_id, texts::premium_revoked(target.0))
                .await
                .map_err(|e| channel_err("failed to confirm revoke", e))?;
        }
        Command::Stats => {
            if !is_owner(ctx, user) {
                return Ok(());
            }
            let count = ctx.store.download_count().await?;
            bot.send_message(chat_id, texts::stats(count, ctx.sessions.len()))
                .await
                .map_err(|e| channel_err("failed to send stats", e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_commands() {
        assert_eq!(parse("/start"), Parsed::Command(Command::Start));
        assert_eq!(parse("/help"), Parsed::Command(Command::Help));
        assert_eq!(parse("/check_premium"), Parsed::Command(Command::CheckPremium));
        assert_eq!(parse("/stats"), Parsed::Command(Command::Stats));
    }

    #[test]
    fn parses_command_with_bot_suffix() {
        assert_eq!(parse("/start@grabbit_bot"), Parsed::Command(Command::Start));
    }

    #[test]
    fn parses_add_premium_with_days() {
        assert_eq!(
            parse("/add_premium 42 7"),
            Parsed::Command(Command::AddPremium {
                user: UserId(42),
                days: Some(7),
            })
        );
    }

    #[test]
    fn add_premium_days_are_optional() {
        assert_eq!(
            parse("/add_premium 42"),
            Parsed::Command(Command::AddPremium {
                user: UserId(42),
                days: None,
            })
        );
    }

    #[test]
    fn malformed_add_premium_carries_usage() {
        assert_eq!(parse("/add_premium"), Parsed::Malformed(texts::CORRECT_ADD_CMD));
        assert_eq!(
            parse("/add_premium notanumber"),
            Parsed::Malformed(texts::CORRECT_ADD_CMD)
        );
        assert_eq!(
            parse("/add_premium 42 zero"),
            Parsed::Malformed(texts::CORRECT_ADD_CMD)
        );
        assert_eq!(
            parse("/add_premium 42 0"),
            Parsed::Malformed(texts::CORRECT_ADD_CMD)
        );
    }

    #[test]
    fn malformed_rmpremium_carries_usage() {
        assert_eq!(parse("/rmpremium"), Parsed::Malformed(texts::CORRECT_RM_CMD));
    }

    #[test]
    fn parses_rmpremium() {
        assert_eq!(
            parse("/rmpremium 42"),
            Parsed::Command(Command::RmPremium { user: UserId(42) })
        );
    }

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(parse("hello"), Parsed::NotACommand);
        assert_eq!(parse("https://youtu.be/x"), Parsed::NotACommand);
    }

    #[test]
    fn unknown_command_is_not_a_command() {
        assert_eq!(parse("/frobnicate"), Parsed::NotACommand);
    }
}
