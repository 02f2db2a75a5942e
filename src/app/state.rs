use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::library::Track;
use crate::lyrics::LyricsTrack;

/// Volume moves in these steps and may boost past unity, up to the cap.
pub const VOLUME_STEP: f32 = 0.05;
pub const MAX_VOLUME: f32 = 2.0;

/// Seconds moved by a single seek command.
pub const SEEK_STEP: f64 = 5.0;

/// Seconds nudged by a single lyrics-offset command.
pub const OFFSET_STEP: f64 = 0.1;

/// What happens when the current track finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    #[default]
    None,
    All,
    One,
}

impl LoopMode {
    pub fn next(self) -> Self {
        match self {
            LoopMode::None => LoopMode::All,
            LoopMode::All => LoopMode::One,
            LoopMode::One => LoopMode::None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LoopMode::None => "Loop: Off",
            LoopMode::All => "Loop: All",
            LoopMode::One => "Loop: One",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeDisplay {
    #[default]
    Remaining,
    Total,
}

impl TimeDisplay {
    pub fn toggle(self) -> Self {
        match self {
            TimeDisplay::Remaining => TimeDisplay::Total,
            TimeDisplay::Total => TimeDisplay::Remaining,
        }
    }
}

pub struct PlayerState {
    pub should_quit: bool,

    // Playback
    pub current_track: Option<Track>,
    pub is_playing: bool,
    pub position_secs: f64,
    pub duration_secs: f64,
    pub volume: f32,
    pub muted: bool,
    pub loop_mode: LoopMode,
    pub time_display: TimeDisplay,

    // Lyrics
    pub lyrics: LyricsTrack,
    pub lyrics_loading: bool,
    pub lyrics_offset: f64,
    pub lyric_offsets: HashMap<String, f64>,
    pub show_lyrics: bool,

    // Status message (for errors/info)
    pub status: String,
}

impl PlayerState {
    pub fn new(volume: f32, show_lyrics: bool) -> Self {
        Self {
            should_quit: false,
            current_track: None,
            is_playing: false,
            position_secs: 0.0,
            duration_secs: 0.0,
            volume,
            muted: false,
            loop_mode: LoopMode::default(),
            time_display: TimeDisplay::default(),
            lyrics: LyricsTrack::default(),
            lyrics_loading: false,
            lyrics_offset: 0.0,
            lyric_offsets: HashMap::new(),
            show_lyrics,
            status: String::new(),
        }
    }

    /// The gain actually sent to the transport.
    pub fn effective_gain(&self) -> f32 {
        if self.muted { 0.0 } else { self.volume }
    }

    /// Identity of the current track, once a usable duration exists. The
    /// measured duration wins; the tag reader's hint fills in while the
    /// transport is still loading.
    pub fn fingerprint(&self) -> Option<String> {
        let track = self.current_track.as_ref()?;
        let duration = if self.duration_secs > 0.0 {
            self.duration_secs
        } else {
            track.duration_hint.filter(|d| *d > 0.0)?
        };
        Some(crate::library::fingerprint(
            &track.artist,
            &track.title,
            duration,
        ))
    }
}
