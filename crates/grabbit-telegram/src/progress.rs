// SPDX-FileCopyrightText: 2026 Grabbit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Progress reporting via edit-in-place status messages.
//!
//! The extractor pushes [`ProgressEvent`]s into a channel; a background
//! task drains it and edits the status message, throttled to one edit
//! per second. Events arriving inside the throttle window are dropped,
//! never queued, so the display only ever shows the latest snapshot.

use std::time::{Duration, Instant};

use teloxide::prelude::*;
use teloxide::types::{ChatId, MessageId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use grabbit_core::{human_size, ProgressEvent};

use crate::texts;

/// Minimum interval between status-message edits.
const EDIT_INTERVAL: Duration = Duration::from_secs(1);

/// Pure throttle: `tick` returns whether an edit is allowed now.
///
/// The first tick always passes.
pub struct ThrottleGate {
    last_edit: Option<Instant>,
    interval: Duration,
}

impl ThrottleGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            last_edit: None,
            interval,
        }
    }

    pub fn tick(&mut self, now: Instant) -> bool {
        match self.last_edit {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last_edit = Some(now);
                true
            }
        }
    }
}

/// Renders a progress snapshot into the status-message body.
pub fn render(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::Downloading {
            percent,
            speed,
            downloaded,
            total,
            eta_secs,
        } => {
            let percent = match percent {
                Some(p) => format!("{p:.1}%"),
                None => "??%".to_string(),
            };
            let speed = speed.as_deref().unwrap_or("?");
            let eta = match eta_secs {
                Some(secs) => format!("{secs}s"),
                None => "??".to_string(),
            };
            format!(
                "⬇️ Downloading: {percent}\n{} / {} at {speed}\nETA {eta}",
                human_size(*downloaded),
                human_size(*total),
            )
        }
        ProgressEvent::Finished => texts::DOWNLOAD_FINISHED.to_string(),
    }
}

/// Spawns the updater task that drains `rx` and edits the status message.
///
/// Edit failures are logged and swallowed; progress display is
/// best-effort and must never abort the acquisition.
pub fn spawn_updater(
    bot: Bot,
    chat_id: ChatId,
    message_id: MessageId,
    mut rx: mpsc::Receiver<ProgressEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut gate = ThrottleGate::new(EDIT_INTERVAL);
        let mut last_text = String::new();
        while let Some(event) = rx.recv().await {
            let finished = matches!(event, ProgressEvent::Finished);
            if !finished && !gate.tick(Instant::now()) {
                continue;
            }
            let text = render(&event);
            if text == last_text {
                continue;
            }
            match bot.edit_message_text(chat_id, message_id, &text).await {
                Ok(_) => last_text = text,
                Err(e) => {
                    let err_str = e.to_string();
                    if err_str.contains("message is not modified") {
                        last_text = text;
                    } else {
                        debug!(error = %e, "progress edit failed");
                    }
                }
            }
            if finished {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_allows_first_tick() {
        let mut gate = ThrottleGate::new(Duration::from_secs(1));
        assert!(gate.tick(Instant::now()));
    }

    #[test]
    fn gate_blocks_within_interval() {
        let mut gate = ThrottleGate::new(Duration::from_secs(1));
        let start = Instant::now();
        assert!(gate.tick(start));
        assert!(!gate.tick(start + Duration::from_millis(400)));
        assert!(!gate.tick(start + Duration::from_millis(900)));
    }

    #[test]
    fn gate_reopens_after_interval() {
        let mut gate = ThrottleGate::new(Duration::from_secs(1));
        let start = Instant::now();
        assert!(gate.tick(start));
        assert!(gate.tick(start + Duration::from_millis(1100)));
        assert!(!gate.tick(start + Duration::from_millis(1500)));
    }

    #[test]
    fn render_downloading_snapshot() {
        let event = ProgressEvent::Downloading {
            percent: Some(42.5),
            speed: Some("1.00MiB/s".into()),
            downloaded: 4_456_448,
            total: 10_485_760,
            eta_secs: Some(6),
        };
        let text = render(&event);
        assert!(text.contains("42.5%"));
        assert!(text.contains("1.00MiB/s"));
        assert!(text.contains("ETA 6s"));
    }

    #[test]
    fn render_unknown_eta() {
        let event = ProgressEvent::Downloading {
            percent: Some(10.0),
            speed: None,
            downloaded: 0,
            total: 0,
            eta_secs: None,
        };
        let text = render(&event);
        assert!(text.contains("ETA ??"));
        assert!(text.contains("at ?"));
    }

    #[test]
    fn render_finished() {
        assert_eq!(render(&ProgressEvent::Finished), texts::DOWNLOAD_FINISHED);
    }
}
