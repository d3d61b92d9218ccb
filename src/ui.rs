//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).
//!
//! The layout is a two-row split: the scrollable timeline on top and a
//! one-line status bar at the bottom.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::app::App;

/// Summary lines are cut to this many characters.
const SUMMARY_WIDTH: usize = 120;

/// Draw the complete UI for one frame.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let [main_area, status_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_timeline(app, frame, main_area);
    draw_status_bar(app, frame, status_area);
}

/// Render the scrollable timeline.
fn draw_timeline(app: &mut App, frame: &mut Frame, area: Rect) {
    let list_items: Vec<ListItem> = app
        .timeline
        .iter()
        .map(|msg| {
            let (name_color, text_color) = if msg.is_error {
                (Color::Red, Color::Red)
            } else {
                (Color::Cyan, Color::White)
            };

            let line = Line::from(vec![
                Span::styled(
                    msg.delivered_at.format("%H:%M:%S").to_string(),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(" "),
                Span::styled(
                    format!("[{}]", msg.source_name),
                    Style::default().fg(name_color),
                ),
                Span::raw(" "),
                Span::styled(msg.headline(), Style::default().fg(text_color)),
                Span::styled(
                    msg.created_at.format("  %Y-%m-%d %H:%M").to_string(),
                    Style::default().fg(Color::DarkGray),
                ),
            ]);

            let mut lines = vec![line];
            if let Some(summary) = msg.summary.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
                let summary: String = summary.chars().take(SUMMARY_WIDTH).collect();
                lines.push(Line::from(Span::styled(
                    format!("    {summary}"),
                    Style::default().fg(Color::DarkGray),
                )));
            }

            ListItem::new(lines)
        })
        .collect();

    let list = List::new(list_items)
        .block(
            Block::default()
                .title(" RSS Mix-in ")
                .borders(Borders::ALL),
        )
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::DarkGray),
        )
        .highlight_symbol("▸ ");

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let link = app.selected_link().unwrap_or_default();
    let status = Paragraph::new(Line::from(vec![
        Span::styled(" ", Style::default()),
        Span::styled(&app.status, Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(
            format!("{} messages", app.timeline.len()),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  q: quit  ↑/↓: scroll  Home/End: jump  r: reload  "),
        Span::styled(link, Style::default().fg(Color::Blue)),
    ]));
    frame.render_widget(status, area);
}

// ---------------------------------------------------------------------------
// Tests (rendering smoke tests)
// ---------------------------------------------------------------------------
