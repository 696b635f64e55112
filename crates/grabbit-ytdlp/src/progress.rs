// SPDX-FileCopyrightText: 2026 Grabbit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsing of yt-dlp `--newline` progress output into progress events.
//!
//! A progress line looks like:
//!
//! ```text
//! [download]  42.5% of ~120.00MiB at 4.23MiB/s ETA 00:12
//! ```
//!
//! Lines that are not downloading ticks (destinations, merge notices)
//! yield `None` and are ignored by the caller.

use std::sync::LazyLock;

use regex::Regex;

use grabbit_core::types::ProgressEvent;

static PROGRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)^\[download\]\s+
          (?P<pct>[\d.]+)%\s+of\s+~?\s*
          (?P<total>[\d.]+[KMGT]?i?B)
          (?:\s+in\s+[\d:]+)?
          (?:\s+at\s+(?P<speed>\S+))?
          (?:\s+ETA\s+(?P<eta>[\d:]+))?",
    )
    .expect("progress regex is valid")
});

/// Parses one output line; `None` for anything that is not a progress tick.
pub fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    let caps = PROGRESS_RE.captures(line.trim())?;

    let percent: f64 = caps.name("pct")?.as_str().parse().ok()?;
    let total = parse_size(caps.name("total")?.as_str())?;
    let downloaded = (total as f64 * percent / 100.0) as u64;
    let speed = caps
        .name("speed")
        .map(|m| m.as_str().to_string())
        .filter(|s| s != "Unknown");
    let eta_secs = caps.name("eta").and_then(|m| parse_clock(m.as_str()));

    Some(ProgressEvent::Downloading {
        percent: Some(percent),
        speed,
        downloaded,
        total,
        eta_secs,
    })
}

/// Parses a yt-dlp size token ("120.00MiB", "900.5KiB", "512B").
fn parse_size(token: &str) -> Option<u64> {
    const SUFFIXES: [(&str, u64); 9] = [
        ("TiB", 1 << 40),
        ("GiB", 1 << 30),
        ("MiB", 1 << 20),
        ("KiB", 1 << 10),
        ("TB", 1 << 40),
        ("GB", 1 << 30),
        ("MB", 1 << 20),
        ("KB", 1 << 10),
        ("B", 1),
    ];
    for (suffix, scale) in SUFFIXES {
        if let Some(number) = token.strip_suffix(suffix) {
            let value: f64 = number.parse().ok()?;
            return Some((value * scale as f64) as u64);
        }
    }
    None
}

/// Parses "SS", "MM:SS", or "HH:MM:SS" into seconds.
fn parse_clock(token: &str) -> Option<u64> {
    let mut secs: u64 = 0;
    for part in token.split(':') {
        secs = secs * 60 + part.parse::<u64>().ok()?;
    }
    Some(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downloading_tick_parses_all_fields() {
        let event =
            parse_progress_line("[download]  42.5% of ~120.00MiB at 4.23MiB/s ETA 00:12").unwrap();
        match event {
            ProgressEvent::Downloading {
                percent,
                speed,
                downloaded,
                total,
                eta_secs,
            } => {
                assert_eq!(percent, Some(42.5));
                assert_eq!(speed.as_deref(), Some("4.23MiB/s"));
                assert_eq!(total, (120.0 * 1024.0 * 1024.0) as u64);
                assert_eq!(downloaded, (total as f64 * 0.425) as u64);
                assert_eq!(eta_secs, Some(12));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn completed_line_parses_without_eta() {
        let event =
            parse_progress_line("[download] 100% of 10.00MiB in 00:01:02 at 165.16KiB/s").unwrap();
        match event {
            ProgressEvent::Downloading {
                percent, eta_secs, ..
            } => {
                assert_eq!(percent, Some(100.0));
                assert_eq!(eta_secs, None);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn non_progress_lines_are_ignored() {
        assert!(parse_progress_line("[download] Destination: downloads/a.mp4").is_none());
        assert!(parse_progress_line("[Merger] Merging formats into out.mkv").is_none());
        assert!(parse_progress_line("").is_none());
    }

    #[test]
    fn unknown_speed_is_dropped() {
        let event =
            parse_progress_line("[download]   0.0% of 5.00GiB at Unknown ETA Unknown").unwrap();
        match event {
            ProgressEvent::Downloading { speed, .. } => assert!(speed.is_none()),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn size_tokens_scale_correctly() {
        assert_eq!(parse_size("512B"), Some(512));
        assert_eq!(parse_size("1.00KiB"), Some(1024));
        assert_eq!(parse_size("2.50GiB"), Some((2.5 * (1u64 << 30) as f64) as u64));
        assert_eq!(parse_size("bogus"), None);
    }

    #[test]
    fn clock_tokens_accumulate() {
        assert_eq!(parse_clock("45"), Some(45));
        assert_eq!(parse_clock("01:05"), Some(65));
        assert_eq!(parse_clock("01:00:05"), Some(3605));
        assert_eq!(parse_clock("xx"), None);
    }
}
