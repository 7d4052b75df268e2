use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::{Duration, Instant};

use super::app::App;
use crate::session::state::Mode;

/// Handle keyboard events and update app state
pub fn handle_events(app: &mut App) -> anyhow::Result<()> {
    // Poll for events with timeout
    if event::poll(Duration::from_millis(10))? {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                handle_key_event(app, key, Instant::now());
            }
        }
    }
    Ok(())
}

/// Process individual key press
fn handle_key_event(app: &mut App, key: KeyEvent, now: Instant) {
    // Check for Ctrl+C
    if key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c')) {
        app.quit();
        return;
    }

    // Any key closes help
    if app.show_help {
        app.toggle_help();
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
        KeyCode::Char('?') => app.toggle_help(),
        KeyCode::Tab | KeyCode::Char('m') => app.toggle_mode(),
        KeyCode::Char(' ') | KeyCode::Char('p') => app.play(now),
        _ => match app.session.mode() {
            Mode::Recognition => handle_recognition_key(app, key),
            Mode::Production => handle_production_key(app, key),
        },
    }
}

fn handle_recognition_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.next_guess(),
        KeyCode::Char('k') | KeyCode::Up => app.prev_guess(),
        KeyCode::Enter => app.submit_guess(),

        // Quick select: 1-9, 0 = minor 7th, '-' = major 7th, '=' = octave
        KeyCode::Char(c @ '1'..='9') => app.select_semitones(c as u8 - b'0'),
        KeyCode::Char('0') => app.select_semitones(10),
        KeyCode::Char('-') => app.select_semitones(11),
        KeyCode::Char('=') => app.select_semitones(12),

        _ => {}
    }
}

fn handle_production_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('s') | KeyCode::Enter => app.start_listening(),
        KeyCode::Char('x') => app.stop_listening(),
        KeyCode::Char('r') => app.reset(),
        KeyCode::Char('n') => app.new_challenge(),
        _ => {}
    }
}
