//! Lyrics pane: highlight-as-you-play for synced tracks, slow
//! progress-proportional scroll for plain text.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::app::state::PlayerState;

pub fn render(frame: &mut Frame, state: &PlayerState, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Lyrics ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 {
        return;
    }
    let height = inner.height as usize;

    if state.lyrics.lines.is_empty() {
        let placeholder = if state.lyrics_loading {
            "Searching for lyrics..."
        } else {
            "No lyrics available."
        };
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                placeholder,
                Style::default().fg(Color::DarkGray),
            ))),
            inner,
        );
        return;
    }

    let total = state.lyrics.lines.len();
    let (start, active) = if state.lyrics.synced {
        let active = state
            .lyrics
            .active_line(state.position_secs, state.lyrics_offset);
        // Keep the active line vertically centered where possible.
        let anchor = active.unwrap_or(0);
        let start = anchor
            .saturating_sub(height / 2)
            .min(total.saturating_sub(height));
        (start, active)
    } else {
        // Plain text creeps down with playback progress.
        let overflow = total.saturating_sub(height);
        let ratio = if state.duration_secs > 0.0 {
            (state.position_secs / state.duration_secs).clamp(0.0, 1.0)
        } else {
            0.0
        };
        ((overflow as f64 * ratio).round() as usize, None)
    };

    let lines: Vec<Line> = state
        .lyrics
        .lines
        .iter()
        .enumerate()
        .skip(start)
        .take(height)
        .map(|(i, line)| {
            let style = if Some(i) == active {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            Line::from(Span::styled(line.text.clone(), style))
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}
