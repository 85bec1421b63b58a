//! Main dashboard layout

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::viewer::state::AppState;

use super::{alerts, endpoints};

/// Render the dashboard
///
/// Returns the height of the alert pane so scrolling can page by it.
pub fn render(frame: &mut Frame, state: &AppState) -> u16 {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),      // Header
            Constraint::Percentage(45), // Endpoints
            Constraint::Min(5),         // Alerts
            Constraint::Length(3),      // Footer
        ])
        .split(frame.area());

    render_header(frame, chunks[0], state);
    endpoints::render(frame, chunks[1], state);
    alerts::render(frame, chunks[2], state);
    render_footer(frame, chunks[3]);

    chunks[2].height
}

fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
    let down = state
        .endpoints
        .iter()
        .filter(|e| e.short.is_down || e.long.is_down)
        .count();

    let mut text = vec![
        Span::styled(
            format!("{} endpoints", state.endpoints.len()),
            Style::default().fg(Color::White),
        ),
        Span::raw(" | "),
        Span::styled(
            format!("{down} down"),
            Style::default().fg(if down > 0 { Color::Red } else { Color::Green }),
        ),
    ];

    if let Some((window, at)) = &state.last_refresh {
        text.push(Span::raw(" | "));
        text.push(Span::styled(
            format!("last {window} refresh at {}", at.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let header = Paragraph::new(Line::from(text)).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Site Watch"),
    );

    frame.render_widget(header, area);
}

/// Render footer with keybindings
fn render_footer(frame: &mut Frame, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));

    let footer_text = vec![
        Span::raw("Scroll: "),
        key("j/k ↑/↓"),
        Span::raw(" | Half page: "),
        key("^d/^u"),
        Span::raw(" | Page: "),
        key("^f/^b"),
        Span::raw(" | Top/Bottom: "),
        key("Home/G"),
        Span::raw(" | Quit: "),
        key("q"),
    ];

    let footer =
        Paragraph::new(Line::from(footer_text)).block(Block::default().borders(Borders::ALL));

    frame.render_widget(footer, area);
}
