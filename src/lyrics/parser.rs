//! Lyrics text parser
//!
//! Takes raw lyrics text (an embedded tag or a downloaded LRC body) and
//! decides whether it is time-synced:
//!
//! [00:12.34] Hello world
//! [00:15.00] Another line
//!
//! A single timestamped line makes the whole track synced; otherwise the
//! text is kept as plain scrolling lines.

use std::cmp::Ordering;

/// A single lyric line with its start offset.
#[derive(Debug, Clone, PartialEq)]
pub struct LyricLine {
    /// Seconds from track start. Plain (unsynced) lines keep 0.0.
    pub time_secs: f64,
    /// The lyrics text
    pub text: String,
}

impl LyricLine {
    pub fn new(time_secs: f64, text: impl Into<String>) -> Self {
        Self {
            time_secs,
            text: text.into(),
        }
    }
}

/// Parsed lyrics ready for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LyricsTrack {
    /// Whether the lines carry usable timestamps.
    pub synced: bool,
    /// Individual lyric lines, non-decreasing by time when synced.
    pub lines: Vec<LyricLine>,
}

impl LyricsTrack {
    /// A plain one-line track, used for inline status messages in the
    /// lyrics pane ("Error finding lyrics." and friends).
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            synced: false,
            lines: vec![LyricLine::new(0.0, text)],
        }
    }

    /// Parse raw lyrics text.
    ///
    /// If any line carries a `[mm:ss.ff]` timestamp (2 or 3 fractional
    /// digits) the track is synced: timestamped lines with empty text are
    /// dropped, lines without a timestamp are discarded. If nothing
    /// matches, every non-blank line is kept verbatim.
    pub fn parse(text: &str) -> Self {
        let mut synced_lines = Vec::new();
        let mut any_match = false;

        for line in text.lines() {
            if let Some((time_secs, rest)) = parse_timed_line(line) {
                any_match = true;
                let text = rest.trim();
                if !text.is_empty() {
                    synced_lines.push(LyricLine::new(time_secs, text));
                }
            }
        }

        if any_match {
            // Stable sort: equal timestamps keep their input order.
            synced_lines
                .sort_by(|a, b| a.time_secs.partial_cmp(&b.time_secs).unwrap_or(Ordering::Equal));
            return Self {
                synced: true,
                lines: synced_lines,
            };
        }

        Self {
            synced: false,
            lines: text
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| LyricLine::new(0.0, line))
                .collect(),
        }
    }

    /// Index of the line to highlight at `position_secs`, honoring the
    /// per-track display offset. None before the first line, or for
    /// unsynced tracks.
    pub fn active_line(&self, position_secs: f64, offset_secs: f64) -> Option<usize> {
        if !self.synced {
            return None;
        }
        for i in (0..self.lines.len()).rev() {
            if position_secs >= self.lines[i].time_secs + offset_secs {
                return Some(i);
            }
        }
        None
    }
}

/// Split a line like `[00:12.34]Lyrics` into (seconds, text).
fn parse_timed_line(line: &str) -> Option<(f64, &str)> {
    let start = line.find('[')?;
    let rest = &line[start + 1..];
    let end = rest.find(']')?;
    let time_secs = parse_timestamp(&rest[..end])?;
    Some((time_secs, &rest[end + 1..]))
}

/// Parse a timestamp like "00:12.34" or "00:12.345" to seconds.
fn parse_timestamp(s: &str) -> Option<f64> {
    let (mins, rest) = s.split_once(':')?;
    let (secs, frac) = rest.split_once('.')?;

    if mins.len() != 2 || secs.len() != 2 || !(frac.len() == 2 || frac.len() == 3) {
        return None;
    }
    if ![mins, secs, frac]
        .iter()
        .all(|part| part.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }

    let minutes: f64 = mins.parse().ok()?;
    let seconds: f64 = secs.parse().ok()?;
    let fraction: f64 = frac.parse().ok()?;
    Some(minutes * 60.0 + seconds + fraction / 10f64.powi(frac.len() as i32))
}
