//! Endpoint table

use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph, Row, Table},
};

use crate::actors::messages::NO_RESPONSE;
use crate::fleet::WindowSnapshot;
use crate::viewer::state::AppState;

/// Render one row per endpoint with both windows side by side
pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
    if state.endpoints.is_empty() {
        let message = Paragraph::new("Waiting for the first refresh...")
            .block(Block::default().borders(Borders::ALL).title("Endpoints"))
            .style(Style::default().fg(Color::Gray));

        frame.render_widget(message, area);
        return;
    }

    let header = Row::new(vec![
        "State",
        "Endpoint",
        "Every",
        "Short avail",
        "Long avail",
        "Connect avg/max",
        "First byte avg/max",
        "Status codes",
    ])
    .style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )
    .bottom_margin(1);

    let rows: Vec<Row> = state
        .endpoints
        .iter()
        .map(|endpoint| {
            let long = &endpoint.long;
            let (label, color) = if endpoint.short.is_down || long.is_down {
                ("● down", Color::Red)
            } else if endpoint.short.has_recovered || long.has_recovered {
                ("● recovered", Color::Cyan)
            } else {
                ("● up", Color::Green)
            };

            Row::new(vec![
                label.to_string(),
                endpoint.endpoint.clone(),
                format!("{}s", endpoint.polling_interval.as_secs()),
                availability(&endpoint.short),
                availability(long),
                format!(
                    "{} / {}",
                    duration(long.metrics.avg_connect),
                    duration(long.metrics.max_connect)
                ),
                format!(
                    "{} / {}",
                    duration(long.metrics.avg_first_byte),
                    duration(long.metrics.max_first_byte)
                ),
                status_codes(long),
            ])
            .style(Style::default().fg(color))
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Percentage(30),
            Constraint::Length(6),
            Constraint::Length(11),
            Constraint::Length(11),
            Constraint::Length(18),
            Constraint::Length(19),
            Constraint::Percentage(20),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Endpoints ({})", state.endpoints.len())),
    );

    frame.render_widget(table, area);
}

fn availability(window: &WindowSnapshot) -> String {
    format!(
        "{:>5.1}% ({})",
        window.availability * 100.0,
        window.metrics.samples
    )
}

fn duration(value: Option<Duration>) -> String {
    match value {
        Some(d) => format!("{}ms", d.as_millis()),
        None => "-".to_string(),
    }
}

fn status_codes(window: &WindowSnapshot) -> String {
    window
        .metrics
        .status_codes
        .iter()
        .map(|(code, count)| {
            if *code == NO_RESPONSE {
                format!("err:{count}")
            } else {
                format!("{code}:{count}")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
