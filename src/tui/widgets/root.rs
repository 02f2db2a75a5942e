use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};

use crate::app::state::PlayerState;
use crate::playlist::Playlist;

pub fn render(frame: &mut Frame, state: &PlayerState, playlist: &Playlist) {
    let area = frame.area();

    if state.show_lyrics {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(8), // player
                Constraint::Min(3),    // lyrics
            ])
            .split(area);
        super::now_playing::render(frame, state, playlist, rows[0]);
        super::lyrics::render(frame, state, rows[1]);
    } else {
        super::now_playing::render(frame, state, playlist, area);
    }
}
