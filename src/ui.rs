//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).
//!
//! ## For contributors
//!
//! * The layout is a three-row split: the scrollable transcript, a bordered
//!   input box, and a one-line status bar.
//! * Colours and styles are defined inline.
//! * [`ratatui`] is the TUI framework; see its docs for widget details.

use ratatui::{
    layout::{Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::app::App;

/// Draw the complete UI for one frame.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let [transcript_area, input_area, status_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_transcript(app, frame, transcript_area);
    draw_input(app, frame, input_area);
    draw_status_bar(app, frame, status_area);
}

/// Render the scrollable chat transcript.
fn draw_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    let list_items: Vec<ListItem> = app
        .transcript
        .iter()
        .map(|line| {
            let nick_style = if line.message.nick == app.nick {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Cyan)
            };

            ListItem::new(Line::from(vec![
                Span::styled(
                    line.received_at.format("%H:%M").to_string(),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(" "),
                Span::styled(format!("{}:", line.message.nick), nick_style),
                Span::raw(" "),
                Span::styled(&line.message.text, Style::default().fg(Color::White)),
            ]))
        })
        .collect();

    let list = List::new(list_items)
        .block(Block::default().title(" Chat ").borders(Borders::ALL))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD))
        .highlight_symbol("▸ ");

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

/// Render the input box and place the cursor at the end of the text.
fn draw_input(app: &App, frame: &mut Frame, area: Rect) {
    let input = Paragraph::new(app.input.as_str()).block(
        Block::default()
            .title(format!(" {} ", app.nick))
            .borders(Borders::ALL),
    );
    frame.render_widget(input, area);

    let typed = u16::try_from(app.input.chars().count()).unwrap_or(u16::MAX);
    let max_x = area.right().saturating_sub(2);
    frame.set_cursor_position(Position::new(
        area.x.saturating_add(1).saturating_add(typed).min(max_x),
        area.y + 1,
    ));
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let (mode, mode_color) = if app.live {
        ("live", Color::Green)
    } else {
        ("paused", Color::DarkGray)
    };

    let status = Paragraph::new(Line::from(vec![
        Span::styled(" ", Style::default()),
        Span::styled(&app.status, Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(
            format!("{} messages", app.transcript.len()),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  "),
        Span::styled(mode, Style::default().fg(mode_color)),
        Span::raw("  Enter: send  ↑/↓: scroll  Esc: quit"),
    ]));
    frame.render_widget(status, area);
}
