//! Alerts timeline

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::actors::messages::AlertKind;
use crate::viewer::state::{AppState, describe_alert};

/// Render the alert timeline, oldest first
pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
    if state.alerts.is_empty() {
        let message = Paragraph::new("No alerts yet")
            .block(Block::default().borders(Borders::ALL).title("Alerts"))
            .style(Style::default().fg(Color::Gray));

        frame.render_widget(message, area);
        return;
    }

    let items: Vec<ListItem> = state
        .alerts
        .iter()
        .map(|alert| {
            let (icon, color) = match alert.kind {
                AlertKind::Down { .. } => ("⚠ ", Color::Red),
                AlertKind::Recovered { .. } => ("✔ ", Color::Green),
            };

            ListItem::new(Line::from(vec![
                Span::styled(icon, Style::default().fg(color)),
                Span::styled(describe_alert(alert), Style::default().fg(color)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Alerts ({} total)", state.alerts.len())),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );

    let mut list_state = ListState::default().with_selected(state.selected_alert);
    frame.render_stateful_widget(list, area, &mut list_state);
}
