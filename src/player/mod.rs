//! Audio transport
//!
//! A dedicated thread owns the output stream and the single active sink;
//! the controller drives it with commands and hears back through the app
//! event channel. At most one voice is ever loaded: loading a new file
//! drops the previous sink first.

pub mod thread;

use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};

use crate::app::events::Event;

/// Commands accepted by the audio thread.
#[derive(Debug)]
pub enum PlayerCmd {
    /// Unload whatever is playing and load `path`, pre-seeked to
    /// `start_at` seconds.
    Load {
        path: PathBuf,
        start_at: f64,
        start_paused: bool,
        gain: f32,
        duration_hint: Option<f64>,
        ticket: u64,
    },
    Play,
    Pause,
    SeekTo(f64),
    /// Unclamped: values above 1.0 boost past unity.
    SetGain(f32),
    Unload,
    Quit,
}

/// Cheap cloneable handle the controller talks to the audio thread with.
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    tx: Sender<PlayerCmd>,
}

impl PlayerHandle {
    /// Spawn the audio thread. Opening the output device happens on the
    /// thread itself; a missing device surfaces later as per-load play
    /// errors, never as a startup failure.
    pub fn spawn(event_tx: tokio::sync::mpsc::Sender<Event>) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(rx, event_tx);
        Self { tx }
    }

    /// A handle whose commands are only recorded, for driving the
    /// controller in tests without an audio device.
    #[cfg(test)]
    pub fn detached() -> (Self, mpsc::Receiver<PlayerCmd>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }

    pub fn send(&self, cmd: PlayerCmd) {
        if self.tx.send(cmd).is_err() {
            tracing::warn!("audio thread is gone; dropping command");
        }
    }
}
