//! Resumable playback state
//!
//! Captured on a timer and at shutdown, applied once at startup (always
//! paused) or after a shell-driven state transfer (resuming playback if
//! it was running). Only the original playlist order is persisted; a
//! shuffled active order is regenerated on restore.

use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::app::state::LoopMode;
use crate::storage::{self, StorageHandle};

pub const SESSION_KEY: &str = "last_playback_state";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSession {
    pub playlist: Vec<PathBuf>,
    pub last_played: PathBuf,
    pub seek_secs: f64,
    pub shuffled: bool,
    pub volume: f32,
    pub muted: bool,
    pub loop_mode: LoopMode,
    /// Only meaningful for in-session transfer; a cold restore never
    /// auto-plays regardless.
    #[serde(default)]
    pub is_playing: bool,
}

/// Read the persisted session. Any failure (no row, unreadable JSON,
/// broken database) counts as "no prior session".
pub fn load(storage: &StorageHandle) -> Option<PlaybackSession> {
    match storage.get_kv(SESSION_KEY) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!("discarding unreadable session: {e}");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            tracing::warn!("session read failed: {e:#}");
            None
        }
    }
}

pub fn save(storage: &StorageHandle, session: &PlaybackSession) -> anyhow::Result<()> {
    let raw = serde_json::to_string(session).context("serialize session")?;
    storage.set_kv(SESSION_KEY, &raw, storage::now_unix())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> PlaybackSession {
        PlaybackSession {
            playlist: vec![PathBuf::from("/music/a.mp3"), PathBuf::from("/music/b.mp3")],
            last_played: PathBuf::from("/music/b.mp3"),
            seek_secs: 42.5,
            shuffled: true,
            volume: 1.2,
            muted: false,
            loop_mode: LoopMode::All,
            is_playing: true,
        }
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let storage = StorageHandle::new(dir.path().join("s.sqlite3"));

        let session = sample();
        save(&storage, &session).unwrap();
        assert_eq!(load(&storage), Some(session));
    }

    #[test]
    fn test_load_missing_is_none() {
        let dir = tempdir().unwrap();
        let storage = StorageHandle::new(dir.path().join("s.sqlite3"));
        assert_eq!(load(&storage), None);
    }

    #[test]
    fn test_load_corrupt_is_none() {
        let dir = tempdir().unwrap();
        let storage = StorageHandle::new(dir.path().join("s.sqlite3"));
        storage
            .set_kv(SESSION_KEY, "not json at all", crate::storage::now_unix())
            .unwrap();
        assert_eq!(load(&storage), None);
    }
}
