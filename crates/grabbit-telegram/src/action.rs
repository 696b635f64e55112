// SPDX-FileCopyrightText: 2026 Grabbit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed callback-data actions for the inline menus.
//!
//! Telegram limits callback data to 64 bytes, so actions encode to a
//! compact pipe-delimited form: a one-letter verb, the session id, and
//! for acquisitions the media kind and format id.

use grabbit_core::{MediaKind, SessionId};

/// Everything an inline button can ask the bot to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    /// Show the full title/description view.
    Info(SessionId),
    /// Show the video quality menu.
    VideoMenu(SessionId),
    /// Show the audio quality menu.
    AudioMenu(SessionId),
    /// Return to the overview card.
    Back(SessionId),
    /// Show the premium plans card.
    Premium(SessionId),
    /// Start an acquisition for the chosen format.
    Acquire {
        kind: MediaKind,
        session: SessionId,
        format_id: String,
    },
}

impl MenuAction {
    pub fn encode(&self) -> String {
        match self {
            MenuAction::Info(sid) => format!("i|{sid}"),
            MenuAction::VideoMenu(sid) => format!("v|{sid}"),
            MenuAction::AudioMenu(sid) => format!("a|{sid}"),
            MenuAction::Back(sid) => format!("b|{sid}"),
            MenuAction::Premium(sid) => format!("p|{sid}"),
            MenuAction::Acquire {
                kind,
                session,
                format_id,
            } => {
                let k = if kind.is_audio() { "a" } else { "v" };
                format!("d|{k}|{session}|{format_id}")
            }
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        let mut parts = data.splitn(2, '|');
        let verb = parts.next()?;
        let rest = parts.next()?;
        match verb {
            "i" => Some(MenuAction::Info(SessionId(rest.to_string()))),
            "v" => Some(MenuAction::VideoMenu(SessionId(rest.to_string()))),
            "a" => Some(MenuAction::AudioMenu(SessionId(rest.to_string()))),
            "b" => Some(MenuAction::Back(SessionId(rest.to_string()))),
            "p" => Some(MenuAction::Premium(SessionId(rest.to_string()))),
            "d" => {
                let mut fields = rest.splitn(3, '|');
                let kind = match fields.next()? {
                    "v" => MediaKind::Video,
                    "a" => MediaKind::Audio,
                    _ => return None,
                };
                let session = SessionId(fields.next()?.to_string());
                let format_id = fields.next()?.to_string();
                if session.0.is_empty() || format_id.is_empty() {
                    return None;
                }
                Some(MenuAction::Acquire {
                    kind,
                    session,
                    format_id,
                })
            }
            _ => None,
        }
    }
}
