//! The player controller
//!
//! One task owns all mutable state. Everything asynchronous (tag reading,
//! the audio thread, lyrics search, storage writes) reports back through
//! the event channel, and every completion carries the load ticket it was
//! issued under: a completion whose ticket is no longer current is
//! dropped. That ticket check is the only cancellation mechanism in the
//! player.

pub mod actions;
pub mod events;
pub mod state;

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::config::{self, Config};
use crate::input;
use crate::library::{self, Track};
use crate::lyrics::{self, LrclibClient, LyricsTrack};
use crate::player::{PlayerCmd, PlayerHandle};
use crate::playlist::Playlist;
use crate::session::{self, PlaybackSession};
use crate::storage::{self, StorageHandle};
use crate::tui::{self, TuiTerminal};

use actions::Action;
use events::{Event, PlayerEvent};
use state::{LoopMode, MAX_VOLUME, OFFSET_STEP, PlayerState, SEEK_STEP, VOLUME_STEP};

/// How a track load should begin.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayOptions {
    pub start_paused: bool,
    pub seek_secs: f64,
}

pub struct App {
    cfg: Config,
    cfg_path: PathBuf,
    state: PlayerState,
    playlist: Playlist,
    storage: StorageHandle,
    lrclib: LrclibClient,
    player: PlayerHandle,
    /// Monotonic load ticket; completions from older tickets are no-ops.
    ticket: u64,
    /// Options for the load currently in flight, consumed when its
    /// metadata arrives.
    pending_load: Option<(u64, PlayOptions)>,
}

impl App {
    pub fn new(
        cfg: Config,
        cfg_path: PathBuf,
        storage: StorageHandle,
        player: PlayerHandle,
    ) -> Self {
        let mut state = PlayerState::new(cfg.player.volume, cfg.ui.show_lyrics);
        state.lyric_offsets = storage.load_offsets().unwrap_or_else(|e| {
            tracing::warn!("offset map load failed: {e:#}");
            HashMap::new()
        });

        Self {
            cfg,
            cfg_path,
            state,
            playlist: Playlist::new(),
            storage,
            lrclib: LrclibClient::new(),
            player,
            ticket: 0,
            pending_load: None,
        }
    }

    pub async fn run(
        &mut self,
        terminal: &mut TuiTerminal,
        tx: mpsc::Sender<Event>,
        mut rx: mpsc::Receiver<Event>,
        initial: Vec<PathBuf>,
    ) -> anyhow::Result<()> {
        input::spawn_input_task(tx.clone());

        // Periodic snapshots bound what an abrupt kill can lose.
        let interval_secs = self.cfg.player.snapshot_interval_secs.max(1);
        let tick_tx = tx.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
            interval.tick().await; // the first tick fires immediately
            loop {
                interval.tick().await;
                if tick_tx.send(Event::SnapshotTick).await.is_err() {
                    break;
                }
            }
        });

        if initial.is_empty() {
            self.restore_last_session(&tx);
        } else {
            self.load_playlist_and_play(initial, &tx);
        }

        tui::draw(terminal, &self.state, &self.playlist)?;

        while let Some(ev) = rx.recv().await {
            self.handle_event(ev, &tx);

            if self.state.should_quit {
                break;
            }

            tui::draw(terminal, &self.state, &self.playlist)?;
        }

        self.save_state_on_quit();

        Ok(())
    }

    pub fn handle_event(&mut self, ev: Event, tx: &mpsc::Sender<Event>) {
        match ev {
            Event::Input(input_ev) => {
                if let Some(action) = input::map_input_to_action(input_ev) {
                    self.handle_action(action, tx);
                }
            }
            Event::Player(pe) => self.handle_player(pe, tx),
            Event::Loaded { ticket, track } => self.on_track_loaded(ticket, track, tx),
            Event::Lyrics { ticket, lyrics } => self.on_lyrics_resolved(ticket, lyrics),
            Event::SnapshotTick => self.spawn_snapshot(),
        }
    }

    pub fn handle_action(&mut self, action: Action, tx: &mpsc::Sender<Event>) {
        match action {
            Action::Quit => self.state.should_quit = true,
            Action::TogglePause => {
                if self.playlist.current().is_some() {
                    if self.state.is_playing {
                        self.player.send(PlayerCmd::Pause);
                    } else {
                        self.player.send(PlayerCmd::Play);
                    }
                }
            }
            Action::PlayNext => {
                // From the empty state this starts at the top.
                let next = self.playlist.current().map_or(0, |i| i + 1);
                if next < self.playlist.len() {
                    self.play_track(next, PlayOptions::default(), tx);
                }
            }
            Action::PlayPrev => self.play_prev(tx),
            Action::ToggleShuffle => {
                if self.playlist.is_empty() {
                    return;
                }
                self.playlist.toggle_shuffle();
                self.state.status = if self.playlist.shuffled() {
                    "Shuffle on".into()
                } else {
                    "Shuffle off".into()
                };
            }
            Action::CycleLoopMode => {
                self.state.loop_mode = self.state.loop_mode.next();
                self.state.status = self.state.loop_mode.label().into();
            }
            Action::ToggleMute => {
                self.state.muted = !self.state.muted;
                self.player
                    .send(PlayerCmd::SetGain(self.state.effective_gain()));
            }
            Action::VolumeUp => self.change_volume(VOLUME_STEP),
            Action::VolumeDown => self.change_volume(-VOLUME_STEP),
            Action::SeekForward => self.seek_relative(SEEK_STEP),
            Action::SeekBack => self.seek_relative(-SEEK_STEP),
            Action::LyricsOffsetPlus => self.adjust_lyrics_offset(OFFSET_STEP),
            Action::LyricsOffsetMinus => self.adjust_lyrics_offset(-OFFSET_STEP),
            Action::RefreshLyrics => {
                if self.state.current_track.is_some() {
                    self.state.status = "Refreshing lyrics...".into();
                    self.spawn_lyrics_resolution(self.ticket, true, tx);
                }
            }
            Action::ToggleTimeDisplay => {
                self.state.time_display = self.state.time_display.toggle();
            }
            Action::ToggleLyricsPane => {
                self.state.show_lyrics = !self.state.show_lyrics;
            }
            Action::Resize => {}
        }
    }

    /// The single entry point for externally supplied file lists (CLI
    /// arguments, or anything a shell wants queued).
    pub fn load_playlist_and_play(&mut self, paths: Vec<PathBuf>, tx: &mpsc::Sender<Event>) {
        if paths.is_empty() {
            return;
        }
        self.playlist.replace(paths);
        self.play_track(0, PlayOptions::default(), tx);
    }

    /// Start loading the track at `index` in the active order.
    ///
    /// Bumps the load ticket first, so every completion still in flight
    /// for the previous load becomes a no-op. Out-of-range indices stop
    /// playback (this is how "advance past the end" terminates); empty
    /// path entries from a corrupted session are skipped linearly.
    pub fn play_track(&mut self, index: usize, opts: PlayOptions, tx: &mpsc::Sender<Event>) {
        self.ticket += 1;
        let ticket = self.ticket;

        self.player.send(PlayerCmd::Unload);

        let mut index = index;
        let path = loop {
            match self.playlist.path_at(index) {
                None => {
                    self.playlist.clear_current();
                    self.state.is_playing = false;
                    self.state.position_secs = 0.0;
                    self.state.duration_secs = 0.0;
                    return;
                }
                Some(p) if p.as_os_str().is_empty() => {
                    tracing::warn!("skipping empty playlist entry at index {index}");
                    index += 1;
                }
                Some(p) => break p.to_path_buf(),
            }
        };

        self.playlist.set_current(index);
        self.state.position_secs = opts.seek_secs.max(0.0);
        self.state.duration_secs = 0.0;
        self.state.lyrics_offset = 0.0;
        self.pending_load = Some((ticket, opts));

        let tx = tx.clone();
        tokio::spawn(async move {
            let extracted = tokio::task::spawn_blocking(move || library::extract(&path)).await;
            if let Ok(track) = extracted {
                let _ = tx.send(Event::Loaded { ticket, track }).await;
            }
        });
    }

    fn on_track_loaded(&mut self, ticket: u64, track: Track, tx: &mpsc::Sender<Event>) {
        if ticket != self.ticket {
            tracing::debug!("dropping stale metadata for {}", track.basename);
            return;
        }

        // Optimistic UI: metadata and embedded lyrics show immediately,
        // independent of when the transport finishes loading.
        let lyrics = LyricsTrack::parse(track.embedded_lyrics.as_deref().unwrap_or(""));
        let embedded_synced = lyrics.synced;
        self.state.lyrics = lyrics;
        self.state.lyrics_loading = false;
        self.state.status.clear();
        self.state.current_track = Some(track.clone());

        let opts = match self.pending_load.take() {
            Some((t, opts)) if t == ticket => opts,
            _ => PlayOptions::default(),
        };

        // Fire-and-forget: audible start is whenever the transport is ready.
        self.player.send(PlayerCmd::Load {
            path: track.path,
            start_at: opts.seek_secs,
            start_paused: opts.start_paused,
            gain: self.state.effective_gain(),
            duration_hint: track.duration_hint,
            ticket,
        });

        // Embedded synced lyrics always win; anything else is worth a
        // cache/remote lookup.
        if !embedded_synced {
            self.spawn_lyrics_resolution(ticket, false, tx);
        }
    }

    fn spawn_lyrics_resolution(&mut self, ticket: u64, force_refresh: bool, tx: &mpsc::Sender<Event>) {
        let Some(track) = self.state.current_track.as_ref() else {
            return;
        };
        let artist = track.artist.clone();
        let title = track.title.clone();
        let fingerprint = self.state.fingerprint();
        self.state.lyrics_loading = true;

        let storage = self.storage.clone();
        let client = self.lrclib.clone();
        let tx = tx.clone();

        tokio::spawn(async move {
            let lyrics =
                lyrics::resolve(storage, client, artist, title, fingerprint, force_refresh).await;
            let _ = tx.send(Event::Lyrics { ticket, lyrics }).await;
        });
    }

    fn on_lyrics_resolved(&mut self, ticket: u64, lyrics: LyricsTrack) {
        // Resolution is also ticket-gated: a slow search for a track the
        // user has already skipped must not clobber the current lyrics.
        if ticket != self.ticket {
            return;
        }
        self.state.lyrics = lyrics;
        self.state.lyrics_loading = false;
    }

    fn handle_player(&mut self, pe: PlayerEvent, tx: &mpsc::Sender<Event>) {
        if pe.ticket() != self.ticket {
            tracing::debug!("dropping stale transport event: {pe:?}");
            return;
        }

        match pe {
            PlayerEvent::Ready { duration_secs, .. } => {
                self.state.duration_secs = duration_secs;
                // The fingerprint is complete now that the duration is
                // measured; pick up this track's stored display offset.
                if let Some(id) = self.state.fingerprint() {
                    self.state.lyrics_offset =
                        self.state.lyric_offsets.get(&id).copied().unwrap_or(0.0);
                }
                self.player
                    .send(PlayerCmd::SetGain(self.state.effective_gain()));
            }
            PlayerEvent::LoadError { message, .. } | PlayerEvent::PlayError { message, .. } => {
                let basename = self
                    .state
                    .current_track
                    .as_ref()
                    .map(|t| t.basename.clone())
                    .unwrap_or_default();
                tracing::warn!("unplayable track {basename}: {message}");
                self.state.status = format!("Unplayable: {basename}");
                self.state.is_playing = false;
                // Skip ahead; play_track stops cleanly at the playlist end.
                if let Some(current) = self.playlist.current() {
                    self.play_track(current + 1, PlayOptions::default(), tx);
                }
            }
            PlayerEvent::Started { .. } => self.state.is_playing = true,
            PlayerEvent::Paused { .. } => self.state.is_playing = false,
            PlayerEvent::Ended { .. } => self.on_track_ended(tx),
            PlayerEvent::Position { seconds, .. } => self.state.position_secs = seconds,
        }
    }

    fn on_track_ended(&mut self, tx: &mpsc::Sender<Event>) {
        self.state.is_playing = false;
        self.state.position_secs = 0.0;
        let Some(current) = self.playlist.current() else {
            return;
        };

        match self.state.loop_mode {
            LoopMode::One => self.play_track(current, PlayOptions::default(), tx),
            LoopMode::All => {
                let next = if current + 1 >= self.playlist.len() {
                    0
                } else {
                    current + 1
                };
                self.play_track(next, PlayOptions::default(), tx);
            }
            LoopMode::None => self.play_track(current + 1, PlayOptions::default(), tx),
        }
    }

    fn play_prev(&mut self, tx: &mpsc::Sender<Event>) {
        let Some(current) = self.playlist.current() else {
            return;
        };
        // A few seconds in, "previous" means "restart this one".
        if self.state.position_secs > 3.0 {
            self.state.position_secs = 0.0;
            self.player.send(PlayerCmd::SeekTo(0.0));
        } else if current > 0 {
            self.play_track(current - 1, PlayOptions::default(), tx);
        }
    }

    fn change_volume(&mut self, delta: f32) {
        self.state.volume = (self.state.volume + delta).clamp(0.0, MAX_VOLUME);
        self.state.muted = false;
        self.player
            .send(PlayerCmd::SetGain(self.state.effective_gain()));
    }

    fn seek_relative(&mut self, delta: f64) {
        if self.playlist.current().is_none() {
            return;
        }
        let target =
            (self.state.position_secs + delta).clamp(0.0, self.state.duration_secs.max(0.0));
        self.state.position_secs = target;
        self.player.send(PlayerCmd::SeekTo(target));
    }

    fn adjust_lyrics_offset(&mut self, delta: f64) {
        self.state.lyrics_offset += delta;
        if let Some(id) = self.state.fingerprint() {
            let offset = self.state.lyrics_offset;
            self.state.lyric_offsets.insert(id.clone(), offset);

            let storage = self.storage.clone();
            tokio::spawn(async move {
                let result = tokio::task::spawn_blocking(move || {
                    storage.set_offset(&id, offset, storage::now_unix())
                })
                .await;
                if let Ok(Err(e)) = result {
                    tracing::warn!("offset save failed: {e:#}");
                }
            });
        }
    }

    /// The full resumable state, or None when nothing is loaded.
    pub fn snapshot(&self) -> Option<PlaybackSession> {
        let last_played = self.playlist.current_path()?.to_path_buf();
        Some(PlaybackSession {
            playlist: self.playlist.original().to_vec(),
            last_played,
            seek_secs: self.state.position_secs,
            shuffled: self.playlist.shuffled(),
            volume: self.state.volume,
            muted: self.state.muted,
            loop_mode: self.state.loop_mode,
            is_playing: self.state.is_playing,
        })
    }

    /// Re-import a snapshot: rebuild orders, re-apply modes, and reload
    /// the last-played track at its seek position. A cold start always
    /// comes back paused; an in-session transfer resumes playing state.
    pub fn apply_session(
        &mut self,
        session: PlaybackSession,
        cold_start: bool,
        tx: &mpsc::Sender<Event>,
    ) {
        self.playlist.restore(session.playlist, session.shuffled);
        self.state.volume = session.volume;
        self.state.muted = session.muted;
        self.state.loop_mode = session.loop_mode;
        self.player
            .send(PlayerCmd::SetGain(self.state.effective_gain()));

        if let Some(index) = self.playlist.position_of(&session.last_played) {
            let start_paused = cold_start || !session.is_playing;
            self.play_track(
                index,
                PlayOptions {
                    start_paused,
                    seek_secs: session.seek_secs,
                },
                tx,
            );
        }
    }

    fn restore_last_session(&mut self, tx: &mpsc::Sender<Event>) {
        if let Some(session) = session::load(&self.storage) {
            self.apply_session(session, true, tx);
        }
    }

    fn spawn_snapshot(&self) {
        let Some(session) = self.snapshot() else {
            return;
        };
        let storage = self.storage.clone();
        tokio::spawn(async move {
            let result =
                tokio::task::spawn_blocking(move || session::save(&storage, &session)).await;
            if let Ok(Err(e)) = result {
                tracing::warn!("snapshot failed: {e:#}");
            }
        });
    }

    fn save_state_on_quit(&mut self) {
        if let Some(session) = self.snapshot()
            && let Err(e) = session::save(&self.storage, &session)
        {
            tracing::warn!("final snapshot failed: {e:#}");
        }

        self.cfg.ui.show_lyrics = self.state.show_lyrics;
        if let Err(e) = config::save(&self.cfg, Some(&self.cfg_path)) {
            tracing::warn!("config save failed: {e:#}");
        }

        self.player.send(PlayerCmd::Quit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::Receiver as CmdReceiver;
    use tempfile::TempDir;

    fn test_app(dir: &TempDir) -> (App, CmdReceiver<PlayerCmd>) {
        let storage = StorageHandle::new(dir.path().join("test.sqlite3"));
        let (player, cmds) = PlayerHandle::detached();
        let app = App::new(
            Config::default(),
            dir.path().join("config.toml"),
            storage,
            player,
        );
        (app, cmds)
    }

    fn chan() -> (mpsc::Sender<Event>, mpsc::Receiver<Event>) {
        mpsc::channel(64)
    }

    /// Synthetic metadata. Embedded synced lyrics keep the remote
    /// resolver out of these tests entirely.
    fn track(name: &str) -> Track {
        Track {
            path: PathBuf::from(name),
            basename: name.to_string(),
            title: name.trim_end_matches(".mp3").to_string(),
            artist: "Test Artist".to_string(),
            cover: None,
            embedded_lyrics: Some("[00:01.00]la".to_string()),
            duration_hint: Some(180.0),
        }
    }

    fn sent_loads(cmds: &CmdReceiver<PlayerCmd>) -> Vec<(u64, bool, f64)> {
        cmds.try_iter()
            .filter_map(|cmd| match cmd {
                PlayerCmd::Load {
                    ticket,
                    start_paused,
                    start_at,
                    ..
                } => Some((ticket, start_paused, start_at)),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_stale_completions_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, cmds) = test_app(&dir);
        let (tx, _rx) = chan();

        app.playlist
            .replace(vec!["a.mp3".into(), "b.mp3".into()]);
        app.play_track(0, PlayOptions::default(), &tx); // ticket 1
        app.play_track(1, PlayOptions::default(), &tx); // ticket 2

        app.handle_event(
            Event::Loaded {
                ticket: 1,
                track: track("a.mp3"),
            },
            &tx,
        );
        assert!(app.state.current_track.is_none());

        app.handle_event(
            Event::Loaded {
                ticket: 2,
                track: track("b.mp3"),
            },
            &tx,
        );
        assert_eq!(app.state.current_track.as_ref().unwrap().basename, "b.mp3");

        // A late Ready from the superseded load changes nothing either.
        app.handle_event(
            Event::Player(PlayerEvent::Ready {
                ticket: 1,
                duration_secs: 99.0,
            }),
            &tx,
        );
        assert_eq!(app.state.duration_secs, 0.0);

        // Only the live ticket reached the transport.
        let loads = sent_loads(&cmds);
        assert_eq!(loads.len(), 1);
        assert_eq!(loads[0].0, 2);
    }

    #[tokio::test]
    async fn test_stale_lyrics_resolution_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _cmds) = test_app(&dir);
        let (tx, _rx) = chan();

        app.playlist
            .replace(vec!["a.mp3".into(), "b.mp3".into()]);
        app.play_track(0, PlayOptions::default(), &tx);
        app.handle_event(
            Event::Loaded {
                ticket: 1,
                track: track("a.mp3"),
            },
            &tx,
        );
        let embedded = app.state.lyrics.clone();

        app.play_track(1, PlayOptions::default(), &tx);
        app.handle_event(
            Event::Loaded {
                ticket: 2,
                track: track("b.mp3"),
            },
            &tx,
        );

        // Resolution result for the old track arrives late.
        app.handle_event(
            Event::Lyrics {
                ticket: 1,
                lyrics: LyricsTrack::message("stale"),
            },
            &tx,
        );
        assert_eq!(app.state.lyrics, embedded);
    }

    #[tokio::test]
    async fn test_ended_advances_then_stops_at_playlist_end() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _cmds) = test_app(&dir);
        let (tx, _rx) = chan();

        app.playlist
            .replace(vec!["a.mp3".into(), "b.mp3".into()]);
        app.play_track(0, PlayOptions::default(), &tx);
        app.handle_event(
            Event::Loaded {
                ticket: 1,
                track: track("a.mp3"),
            },
            &tx,
        );
        app.handle_event(Event::Player(PlayerEvent::Started { ticket: 1 }), &tx);
        assert!(app.state.is_playing);

        app.handle_event(Event::Player(PlayerEvent::Ended { ticket: 1 }), &tx);
        assert_eq!(app.playlist.current(), Some(1));

        app.handle_event(
            Event::Loaded {
                ticket: 2,
                track: track("b.mp3"),
            },
            &tx,
        );
        app.handle_event(Event::Player(PlayerEvent::Ended { ticket: 2 }), &tx);
        assert_eq!(app.playlist.current(), None);
        assert!(!app.state.is_playing);
    }

    #[tokio::test]
    async fn test_ended_wraps_with_loop_all() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _cmds) = test_app(&dir);
        let (tx, _rx) = chan();

        app.state.loop_mode = LoopMode::All;
        app.playlist
            .replace(vec!["a.mp3".into(), "b.mp3".into()]);
        app.play_track(1, PlayOptions::default(), &tx);
        app.handle_event(Event::Player(PlayerEvent::Ended { ticket: 1 }), &tx);
        assert_eq!(app.playlist.current(), Some(0));
    }

    #[tokio::test]
    async fn test_ended_replays_with_loop_one() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _cmds) = test_app(&dir);
        let (tx, _rx) = chan();

        app.state.loop_mode = LoopMode::One;
        app.playlist
            .replace(vec!["a.mp3".into(), "b.mp3".into()]);
        app.play_track(0, PlayOptions::default(), &tx);
        app.handle_event(Event::Player(PlayerEvent::Ended { ticket: 1 }), &tx);
        assert_eq!(app.playlist.current(), Some(0));
        // Replaying is a fresh load under a new ticket.
        assert_eq!(app.ticket, 2);
    }

    #[tokio::test]
    async fn test_load_error_auto_skips_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _cmds) = test_app(&dir);
        let (tx, _rx) = chan();

        app.playlist
            .replace(vec!["a.mp3".into(), "b.mp3".into()]);
        app.play_track(0, PlayOptions::default(), &tx);
        app.handle_event(
            Event::Loaded {
                ticket: 1,
                track: track("a.mp3"),
            },
            &tx,
        );
        app.handle_event(
            Event::Player(PlayerEvent::LoadError {
                ticket: 1,
                message: "broken".into(),
            }),
            &tx,
        );
        assert_eq!(app.playlist.current(), Some(1));

        // Second failure runs off the end and stops; no wrap-around.
        app.handle_event(
            Event::Loaded {
                ticket: 2,
                track: track("b.mp3"),
            },
            &tx,
        );
        app.handle_event(
            Event::Player(PlayerEvent::LoadError {
                ticket: 2,
                message: "also broken".into(),
            }),
            &tx,
        );
        assert_eq!(app.playlist.current(), None);
        assert!(!app.state.is_playing);
    }

    #[tokio::test]
    async fn test_out_of_range_play_stops() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _cmds) = test_app(&dir);
        let (tx, _rx) = chan();

        app.playlist.replace(vec!["a.mp3".into()]);
        app.play_track(5, PlayOptions::default(), &tx);
        assert_eq!(app.playlist.current(), None);
        assert!(!app.state.is_playing);
    }

    #[tokio::test]
    async fn test_corrupt_playlist_entries_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _cmds) = test_app(&dir);
        let (tx, _rx) = chan();

        app.playlist.replace(vec!["".into(), "b.mp3".into()]);
        app.play_track(0, PlayOptions::default(), &tx);
        assert_eq!(app.playlist.current(), Some(1));
    }

    #[tokio::test]
    async fn test_offset_accumulates_per_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _cmds) = test_app(&dir);
        let (tx, _rx) = chan();

        app.playlist
            .replace(vec!["a.mp3".into(), "b.mp3".into()]);
        app.play_track(0, PlayOptions::default(), &tx);
        app.handle_event(
            Event::Loaded {
                ticket: 1,
                track: track("a.mp3"),
            },
            &tx,
        );
        app.handle_event(
            Event::Player(PlayerEvent::Ready {
                ticket: 1,
                duration_secs: 180.0,
            }),
            &tx,
        );
        assert_eq!(app.state.lyrics_offset, 0.0);

        app.handle_action(Action::LyricsOffsetPlus, &tx);
        app.handle_action(Action::LyricsOffsetPlus, &tx);

        let id = library::fingerprint("Test Artist", "a", 180.0);
        assert!((app.state.lyric_offsets[&id] - 0.2).abs() < 1e-9);

        // A different track starting to load does not disturb the entry.
        app.play_track(1, PlayOptions::default(), &tx);
        assert_eq!(app.state.lyrics_offset, 0.0);
        assert!((app.state.lyric_offsets[&id] - 0.2).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_snapshot_restore_never_autoplays_cold() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _cmds) = test_app(&dir);
        let (tx, _rx) = chan();

        app.playlist
            .replace(vec!["a.mp3".into(), "b.mp3".into()]);
        app.play_track(1, PlayOptions::default(), &tx);
        app.handle_event(
            Event::Loaded {
                ticket: 1,
                track: track("b.mp3"),
            },
            &tx,
        );
        app.handle_event(Event::Player(PlayerEvent::Started { ticket: 1 }), &tx);
        app.handle_event(
            Event::Player(PlayerEvent::Position {
                ticket: 1,
                seconds: 42.0,
            }),
            &tx,
        );

        let session = app.snapshot().unwrap();
        assert_eq!(session.last_played, PathBuf::from("b.mp3"));
        assert!(session.is_playing);
        assert_eq!(session.seek_secs, 42.0);

        let dir2 = tempfile::tempdir().unwrap();
        let (mut restored, cmds2) = test_app(&dir2);
        let (tx2, _rx2) = chan();
        restored.apply_session(session, true, &tx2);

        assert_eq!(
            restored.playlist.current_path().unwrap(),
            std::path::Path::new("b.mp3")
        );
        restored.handle_event(
            Event::Loaded {
                ticket: 1,
                track: track("b.mp3"),
            },
            &tx2,
        );

        let loads = sent_loads(&cmds2);
        assert_eq!(loads.len(), 1);
        let (_, start_paused, start_at) = loads[0];
        assert!(start_paused, "cold restore must come back paused");
        assert_eq!(start_at, 42.0);
    }

    #[tokio::test]
    async fn test_restore_with_missing_track_stays_empty() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _cmds) = test_app(&dir);
        let (tx, _rx) = chan();

        let session = PlaybackSession {
            playlist: vec!["a.mp3".into()],
            last_played: "gone.mp3".into(),
            seek_secs: 10.0,
            shuffled: false,
            volume: 0.7,
            muted: true,
            loop_mode: LoopMode::All,
            is_playing: true,
        };
        app.apply_session(session, true, &tx);

        assert_eq!(app.playlist.current(), None);
        assert_eq!(app.state.volume, 0.7);
        assert!(app.state.muted);
        assert_eq!(app.state.loop_mode, LoopMode::All);
    }
}
