//! Keyboard input handling.
//!
//! Maps terminal key events to [`App`] edits.  Adding a new keybinding is a
//! single match arm in [`handle_key_event`].
//!
//! ## For contributors
//!
//! Printable characters always go to the input line, so bindings must use
//! non-character keys or modifiers.  Remember to update the help text in
//! [`crate::ui`] when you add one.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::App;

/// Process a single key event, updating app state accordingly.
///
/// Returns the input line when the user pressed Enter; the caller is
/// responsible for submitting it.  Only key-press events are handled.
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Option<String> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit = true,
        KeyCode::Esc => app.quit = true,
        KeyCode::Enter => return Some(app.take_input()),
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Char(c) => app.input.push(c),
        KeyCode::Down => app.select_next(),
        KeyCode::Up => app.select_previous(),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),
        _ => {}
    }
    None
}
