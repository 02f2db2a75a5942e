use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEventKind};
use tokio::sync::mpsc;

use crate::app::actions::Action;
use crate::app::events::{Event, InputEvent};

pub fn spawn_input_task(tx: mpsc::Sender<Event>) {
    tokio::task::spawn_blocking(move || {
        loop {
            if event::poll(std::time::Duration::from_millis(250)).unwrap_or(false) {
                match event::read() {
                    Ok(CtEvent::Key(k)) => {
                        if k.kind == KeyEventKind::Press
                            && tx.blocking_send(Event::Input(InputEvent::Key(k))).is_err()
                        {
                            break;
                        }
                    }
                    Ok(CtEvent::Resize(_, _)) => {
                        if tx
                            .blocking_send(Event::Input(InputEvent::Resize))
                            .is_err()
                        {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(_) => {}
                }
            }
        }
    });
}

pub fn map_input_to_action(ev: InputEvent) -> Option<Action> {
    match ev {
        InputEvent::Resize => Some(Action::Resize),
        InputEvent::Key(k) => match k.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),

            // Transport
            KeyCode::Char(' ') => Some(Action::TogglePause),
            KeyCode::Right | KeyCode::Char('n') => Some(Action::PlayNext),
            KeyCode::Left | KeyCode::Char('p') => Some(Action::PlayPrev),
            KeyCode::Char(']') => Some(Action::SeekForward),
            KeyCode::Char('[') => Some(Action::SeekBack),

            // Volume
            KeyCode::Up | KeyCode::Char('=') | KeyCode::Char('+') => Some(Action::VolumeUp),
            KeyCode::Down | KeyCode::Char('-') | KeyCode::Char('_') => Some(Action::VolumeDown),
            KeyCode::Char('m') => Some(Action::ToggleMute),

            // Modes
            KeyCode::Char('s') => Some(Action::ToggleShuffle),
            KeyCode::Char('r') => Some(Action::CycleLoopMode),

            // Lyrics
            KeyCode::Char('.') | KeyCode::Char('>') => Some(Action::LyricsOffsetPlus),
            KeyCode::Char(',') | KeyCode::Char('<') => Some(Action::LyricsOffsetMinus),
            KeyCode::Char('L') => Some(Action::RefreshLyrics),
            KeyCode::Char('l') => Some(Action::ToggleLyricsPane),

            KeyCode::Char('t') => Some(Action::ToggleTimeDisplay),

            _ => None,
        },
    }
}
