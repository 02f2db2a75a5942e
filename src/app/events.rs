use crate::library::Track;
use crate::lyrics::LyricsTrack;

#[derive(Debug, Clone)]
pub enum Event {
    Input(InputEvent),
    Player(PlayerEvent),
    /// Metadata extraction finished for the load issued under `ticket`.
    Loaded { ticket: u64, track: Track },
    /// Remote lyrics resolution finished for the load issued under `ticket`.
    Lyrics { ticket: u64, lyrics: LyricsTrack },
    /// Periodic session snapshot timer.
    SnapshotTick,
}

#[derive(Debug, Clone)]
pub enum InputEvent {
    Key(crossterm::event::KeyEvent),
    Resize,
}

/// Transport lifecycle, each event tagged with the load ticket it belongs
/// to so the controller can discard completions from superseded loads.
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    Ready { ticket: u64, duration_secs: f64 },
    LoadError { ticket: u64, message: String },
    PlayError { ticket: u64, message: String },
    Started { ticket: u64 },
    Paused { ticket: u64 },
    Ended { ticket: u64 },
    Position { ticket: u64, seconds: f64 },
}

impl PlayerEvent {
    pub fn ticket(&self) -> u64 {
        match self {
            PlayerEvent::Ready { ticket, .. }
            | PlayerEvent::LoadError { ticket, .. }
            | PlayerEvent::PlayError { ticket, .. }
            | PlayerEvent::Started { ticket }
            | PlayerEvent::Paused { ticket }
            | PlayerEvent::Ended { ticket }
            | PlayerEvent::Position { ticket, .. } => *ticket,
        }
    }
}
