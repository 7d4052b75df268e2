use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};
use std::time::Instant;

use super::app::App;
use crate::session::feedback::FeedbackKind;
use crate::session::state::Mode;
use crate::types::interval::catalog;

/// Render the TUI
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Mode body
            Constraint::Length(3), // Feedback
            Constraint::Length(4), // Help text
        ])
        .split(frame.size());

    render_title(frame, chunks[0], app);
    match app.session.mode() {
        Mode::Recognition => render_recognition(frame, chunks[1], app),
        Mode::Production => render_production(frame, chunks[1], app),
    }
    render_feedback(frame, chunks[2], app);
    render_help(frame, chunks[3], app);

    if app.show_help {
        render_help_screen(frame);
    }
}

/// Render title bar
fn render_title(frame: &mut Frame, area: Rect, app: &App) {
    let description = match app.session.mode() {
        Mode::Recognition => "Guess the interval.",
        Mode::Production => "Produce the challenge interval.",
    };
    let title = Paragraph::new(format!(
        "Interval Trainer - {} Mode: {}",
        app.session.mode().name(),
        description
    ))
    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));

    frame.render_widget(title, area);
}

/// Render the guess list
fn render_recognition(frame: &mut Frame, area: Rect, app: &App) {
    let busy = app.session.is_busy(Instant::now());
    let status = if busy { "Playing..." } else { "Ready" };

    let mut items = vec![ListItem::new(if app.selected_guess.is_none() {
        "► -- Select your guess --"
    } else {
        "  -- Select your guess --"
    })
    .style(Style::default().fg(Color::DarkGray))];

    items.extend(catalog().iter().enumerate().map(|(i, interval)| {
        let selected = app.selected_guess == Some(i);
        let style = if selected {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        let prefix = if selected { "► " } else { "  " };
        ListItem::new(format!("{}{}", prefix, interval.name)).style(style)
    }));

    let list = List::new(items).block(
        Block::default()
            .title(format!("Your Guess [{}]", status))
            .borders(Borders::ALL),
    );
    frame.render_widget(list, area);
}

/// Render challenge, live pitch and captured notes
fn render_production(frame: &mut Frame, area: Rect, app: &App) {
    let session = &app.session;
    let label = Style::default().fg(Color::Gray);
    let value = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);

    let challenge = session.target().map(|t| t.name).unwrap_or("");

    let pitch = match (session.live_pitch(), session.live_note()) {
        (Some(hz), Some(note)) => {
            let tune = if note.in_tune { "in tune" } else { "out of tune" };
            let color = if note.in_tune { Color::Green } else { Color::Yellow };
            Span::styled(
                format!("{:.2} Hz ({} = {:.2} Hz, {})", hz, note.name, note.frequency, tune),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )
        }
        (Some(hz), None) => Span::styled(format!("{:.2} Hz", hz), value),
        _ => Span::styled("-- Hz", value),
    };

    let captured = if session.notes().is_empty() {
        "none".to_string()
    } else {
        session
            .notes()
            .as_slice()
            .iter()
            .map(|hz| format!("{:.2} Hz", hz))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let result = match session.verdict() {
        Some(verdict) => {
            let color = if verdict.correct { Color::Green } else { Color::Red };
            Span::styled(
                format!("{} ({} semitones)", verdict.played_name, verdict.played_semitones),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )
        }
        None => Span::styled("-", label),
    };

    let lines = vec![
        Line::from(vec![
            Span::styled("Challenge: ", label),
            Span::styled(challenge, value),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled("Detected:  ", label), pitch]),
        Line::from(vec![
            Span::styled("Notes:     ", label),
            Span::styled(captured, value),
        ]),
        Line::from(vec![Span::styled("Played:    ", label), result]),
        Line::from(vec![
            Span::styled("Mic:       ", label),
            Span::styled(session.tracker_state().name(), value),
        ]),
    ];

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .title("Production Challenge")
            .borders(Borders::ALL),
    );
    frame.render_widget(paragraph, area);
}

/// Render feedback line
fn render_feedback(frame: &mut Frame, area: Rect, app: &App) {
    let (text, style) = match app.session.feedback() {
        Some(feedback) => {
            let color = match feedback.kind {
                FeedbackKind::Info => Color::White,
                FeedbackKind::Correct => Color::Green,
                FeedbackKind::Wrong => Color::Red,
            };
            (
                feedback.text.as_str(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )
        }
        None => ("", Style::default()),
    };

    let paragraph = Paragraph::new(text)
        .style(style)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(paragraph, area);
}

/// Render help text
/// Production keys follow button visibility
fn render_help(frame: &mut Frame, area: Rect, app: &App) {
    let keys = match app.session.mode() {
        Mode::Recognition => {
            "  Space: Play interval  |  ↑/↓ or 1-9,0,-,=: Select guess  |  Enter: Submit".to_string()
        }
        Mode::Production => {
            let controls = app.session.controls();
            let mut keys = Vec::new();
            if controls.start {
                keys.push("S: Start listening");
            }
            if controls.stop {
                keys.push("X: Stop");
            }
            if controls.reset {
                keys.push("R: Reset");
            }
            if controls.replay {
                keys.push("Space: Play my interval");
            }
            keys.push("N: New challenge");
            format!("  {}", keys.join("  |  "))
        }
    };

    let help_text = vec![
        Line::from(keys),
        Line::from("  Tab: Switch mode  |  ?: Help  |  Q/Esc: Quit"),
    ];

    let paragraph = Paragraph::new(help_text)
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(Color::Gray));

    frame.render_widget(paragraph, area);
}

/// Full key reference overlay
fn render_help_screen(frame: &mut Frame) {
    let area = centered(frame.size(), 60, 18);

    let lines = vec![
        Line::from(Span::styled(
            "Recognition",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from("  Space / p     Play a random interval"),
        Line::from("  j/k, ↑/↓      Move guess selection"),
        Line::from("  1-9, 0, -, =  Select 1 to 12 semitones"),
        Line::from("  Enter         Submit guess"),
        Line::from(""),
        Line::from(Span::styled(
            "Production",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from("  s / Enter     Start listening"),
        Line::from("  x             Stop listening"),
        Line::from("  r             Reset challenge"),
        Line::from("  n             New challenge"),
        Line::from("  Space / p     Play back your interval"),
        Line::from(""),
        Line::from("  Tab / m       Switch mode"),
        Line::from("  q, Esc        Quit"),
    ];

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .title("Help (any key to close)")
            .borders(Borders::ALL)
            .style(Style::default().fg(Color::White)),
    );

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
