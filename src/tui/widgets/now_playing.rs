//! Now Playing widget: track header, progress and the controls line.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::app::state::{LoopMode, PlayerState, TimeDisplay};
use crate::playlist::Playlist;

pub fn render(frame: &mut Frame, state: &PlayerState, playlist: &Playlist, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" verse ")
        .title_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let padded = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(inner)[1];

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // title
            Constraint::Length(1), // artist + file
            Constraint::Length(1), // progress bar
            Constraint::Length(1), // time + controls
            Constraint::Min(0),    // status
        ])
        .split(padded);

    let width = padded.width as usize;

    let title = state
        .current_track
        .as_ref()
        .map(|t| t.title.as_str())
        .unwrap_or("Not playing");
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            truncate_str(title, width),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ))),
        rows[0],
    );

    let subtitle = state
        .current_track
        .as_ref()
        .map(|t| {
            // No pixels for the actual cover; at least say one is there.
            let art = if t.cover.is_some() { " ♪" } else { "" };
            format!("{}  ({}){}", t.artist, t.basename, art)
        })
        .unwrap_or_default();
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            truncate_str(&subtitle, width),
            Style::default().fg(Color::DarkGray),
        ))),
        rows[1],
    );

    let ratio = if state.duration_secs > 0.0 {
        (state.position_secs / state.duration_secs).clamp(0.0, 1.0)
    } else {
        0.0
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            render_progress_bar(rows[2].width as usize, ratio),
            Style::default().fg(Color::Cyan),
        ))),
        rows[2],
    );

    frame.render_widget(Paragraph::new(controls_line(state, playlist)), rows[3]);

    if !state.status.is_empty() {
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                truncate_str(&state.status, width),
                Style::default().fg(Color::Yellow),
            ))),
            rows[4],
        );
    }
}

fn controls_line(state: &PlayerState, playlist: &Playlist) -> Line<'static> {
    let time = match state.time_display {
        TimeDisplay::Remaining => format!(
            "{} / -{}",
            format_time(state.position_secs),
            format_time((state.duration_secs - state.position_secs).max(0.0))
        ),
        TimeDisplay::Total => format!(
            "{} / {}",
            format_time(state.position_secs),
            format_time(state.duration_secs)
        ),
    };

    let play = if state.is_playing { "⏸" } else { "▶" };
    let volume = if state.muted {
        "vol muted".to_string()
    } else {
        format!("vol {:.0}%", f64::from(state.volume) * 100.0)
    };

    let mut spans = vec![
        Span::styled(time, Style::default().fg(Color::DarkGray)),
        Span::raw("  "),
        Span::styled(play.to_string(), Style::default().fg(Color::Green)),
        Span::raw("  "),
        Span::styled(volume, Style::default().fg(Color::DarkGray)),
    ];

    if let Some(current) = playlist.current() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("{}/{}", current + 1, playlist.len()),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if playlist.shuffled() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled("shuffle", Style::default().fg(Color::Magenta)));
    }
    if state.loop_mode != LoopMode::None {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            state.loop_mode.label(),
            Style::default().fg(Color::Magenta),
        ));
    }
    if state.lyrics.synced && state.lyrics_offset != 0.0 {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("lyr {:+.1}s", state.lyrics_offset),
            Style::default().fg(Color::DarkGray),
        ));
    }

    Line::from(spans)
}

fn render_progress_bar(width: usize, ratio: f64) -> String {
    if width < 3 {
        return String::new();
    }

    let filled = ((width - 1) as f64 * ratio).round() as usize;
    let empty = width.saturating_sub(filled + 1);

    let mut bar = String::with_capacity(width * 3);
    for _ in 0..filled {
        bar.push('━');
    }
    bar.push('●');
    for _ in 0..empty {
        bar.push('─');
    }
    bar
}

fn format_time(secs: f64) -> String {
    let secs = secs.max(0.0);
    let minutes = (secs / 60.0).floor() as u32;
    let seconds = (secs % 60.0).floor() as u32;
    format!("{}:{:02}", minutes, seconds)
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if max_len == 0 {
        return String::new();
    }

    let char_count = s.chars().count();
    if char_count <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    } else {
        s.chars().take(max_len).collect()
    }
}
