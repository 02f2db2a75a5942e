//! The audio thread
//!
//! Decodes files into a rodio sink (one at a time) and reports transport
//! edges back through the app event channel. Seeking is implemented by
//! rebuilding the sink with `Source::skip_duration`, which works for all
//! supported formats.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::Context;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tokio::sync::mpsc::Sender;

use super::PlayerCmd;
use crate::app::events::{Event, PlayerEvent};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

pub(super) fn spawn(rx: Receiver<PlayerCmd>, event_tx: Sender<Event>) -> JoinHandle<()> {
    thread::spawn(move || run(rx, event_tx))
}

/// The one loaded voice, plus the bookkeeping to report its position.
struct Voice {
    sink: Sink,
    path: PathBuf,
    ticket: u64,
    duration_secs: f64,
    gain: f32,
    paused: bool,
    /// Elapsed time banked across pauses and seeks.
    accumulated: Duration,
    /// Set while actually playing.
    started_at: Option<Instant>,
}

impl Voice {
    fn elapsed_secs(&self) -> f64 {
        let elapsed =
            self.accumulated + self.started_at.map_or(Duration::ZERO, |st| st.elapsed());
        let seconds = elapsed.as_secs_f64();
        if self.duration_secs > 0.0 {
            seconds.min(self.duration_secs)
        } else {
            seconds
        }
    }
}

fn run(rx: Receiver<PlayerCmd>, event_tx: Sender<Event>) {
    // rodio logs to stderr when OutputStream is dropped; that would tear
    // up the TUI.
    let stream = match OutputStreamBuilder::open_default_stream() {
        Ok(mut s) => {
            s.log_on_drop(false);
            Some(s)
        }
        Err(e) => {
            tracing::error!("no audio output device: {e}");
            None
        }
    };

    let mut voice: Option<Voice> = None;

    loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(PlayerCmd::Load {
                path,
                start_at,
                start_paused,
                gain,
                duration_hint,
                ticket,
            }) => {
                // At most one loaded voice: drop the old one first.
                voice = None;

                let Some(stream) = stream.as_ref() else {
                    send(
                        &event_tx,
                        PlayerEvent::PlayError {
                            ticket,
                            message: "no audio output device".into(),
                        },
                    );
                    continue;
                };

                let start_at = Duration::from_secs_f64(start_at.max(0.0));
                match create_sink(stream, &path, start_at) {
                    Ok((sink, total)) => {
                        let duration_secs = total
                            .map(|d| d.as_secs_f64())
                            .or(duration_hint)
                            .unwrap_or(0.0);
                        sink.set_volume(gain);
                        send(
                            &event_tx,
                            PlayerEvent::Ready {
                                ticket,
                                duration_secs,
                            },
                        );
                        if start_paused {
                            send(&event_tx, PlayerEvent::Paused { ticket });
                        } else {
                            sink.play();
                            send(&event_tx, PlayerEvent::Started { ticket });
                        }
                        voice = Some(Voice {
                            sink,
                            path,
                            ticket,
                            duration_secs,
                            gain,
                            paused: start_paused,
                            accumulated: start_at,
                            started_at: (!start_paused).then(Instant::now),
                        });
                    }
                    Err(e) => {
                        send(
                            &event_tx,
                            PlayerEvent::LoadError {
                                ticket,
                                message: format!("{e:#}"),
                            },
                        );
                    }
                }
            }

            Ok(PlayerCmd::Play) => {
                if let Some(v) = voice.as_mut()
                    && v.paused
                {
                    v.sink.play();
                    v.paused = false;
                    v.started_at = Some(Instant::now());
                    send(&event_tx, PlayerEvent::Started { ticket: v.ticket });
                }
            }

            Ok(PlayerCmd::Pause) => {
                if let Some(v) = voice.as_mut()
                    && !v.paused
                {
                    v.sink.pause();
                    if let Some(st) = v.started_at.take() {
                        v.accumulated += st.elapsed();
                    }
                    v.paused = true;
                    send(&event_tx, PlayerEvent::Paused { ticket: v.ticket });
                }
            }

            Ok(PlayerCmd::SeekTo(secs)) => {
                let Some(stream) = stream.as_ref() else {
                    continue;
                };
                if let Some(v) = voice.as_mut() {
                    let target = if v.duration_secs > 0.0 {
                        secs.clamp(0.0, v.duration_secs)
                    } else {
                        secs.max(0.0)
                    };
                    match create_sink(stream, &v.path, Duration::from_secs_f64(target)) {
                        Ok((sink, _)) => {
                            sink.set_volume(v.gain);
                            if v.paused {
                                v.started_at = None;
                            } else {
                                sink.play();
                                v.started_at = Some(Instant::now());
                            }
                            v.sink = sink;
                            v.accumulated = Duration::from_secs_f64(target);
                            send(
                                &event_tx,
                                PlayerEvent::Position {
                                    ticket: v.ticket,
                                    seconds: target,
                                },
                            );
                        }
                        Err(e) => tracing::warn!("seek rebuild failed: {e:#}"),
                    }
                }
            }

            Ok(PlayerCmd::SetGain(gain)) => {
                if let Some(v) = voice.as_mut() {
                    v.gain = gain;
                    v.sink.set_volume(gain);
                }
            }

            Ok(PlayerCmd::Unload) => {
                voice = None;
            }

            Ok(PlayerCmd::Quit) => break,

            Err(RecvTimeoutError::Timeout) => {
                // Periodic check: auto-advance detection + position report.
                let mut finished = None;
                if let Some(v) = voice.as_ref()
                    && !v.paused
                {
                    if v.sink.empty() {
                        finished = Some(v.ticket);
                    } else {
                        send(
                            &event_tx,
                            PlayerEvent::Position {
                                ticket: v.ticket,
                                seconds: v.elapsed_secs(),
                            },
                        );
                    }
                }
                if let Some(ticket) = finished {
                    voice = None;
                    send(&event_tx, PlayerEvent::Ended { ticket });
                }
            }

            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// Open and decode `path`, returning a paused sink skipped to `start_at`
/// and the decoder's total duration when it knows one.
fn create_sink(
    stream: &OutputStream,
    path: &Path,
    start_at: Duration,
) -> anyhow::Result<(Sink, Option<Duration>)> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let source = Decoder::new(BufReader::new(file))
        .with_context(|| format!("decode {}", path.display()))?;
    let total = source.total_duration();

    let sink = Sink::connect_new(stream.mixer());
    sink.append(source.skip_duration(start_at));
    sink.pause();
    Ok((sink, total))
}

fn send(event_tx: &Sender<Event>, event: PlayerEvent) {
    // The app side owns the channel's lifetime; a closed channel just
    // means we are shutting down.
    let _ = event_tx.blocking_send(Event::Player(event));
}
