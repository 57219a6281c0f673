//! Event handling for the story TUI

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};

use story_core::Choice;

use crate::app::{App, Screen};

/// Result of handling an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    Quit,
    NeedsRedraw,
}

/// Handle a terminal event
pub fn handle_event(app: &mut App, event: Event) -> EventResult {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key_event(app, key),
        Event::Mouse(mouse) => handle_mouse_event(app, mouse),
        Event::Resize(_, _) => EventResult::NeedsRedraw,
        _ => EventResult::Continue,
    }
}

/// Handle a mouse event
fn handle_mouse_event(app: &mut App, mouse: MouseEvent) -> EventResult {
    if app.screen != Screen::Reading {
        return EventResult::Continue;
    }
    match mouse.kind {
        MouseEventKind::ScrollUp => {
            app.scroll_up(3);
            EventResult::NeedsRedraw
        }
        MouseEventKind::ScrollDown => {
            app.scroll_down(3);
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

/// Handle a key event
fn handle_key_event(app: &mut App, key: KeyEvent) -> EventResult {
    // Global shortcuts (always work)
    if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (key.code, key.modifiers) {
        return EventResult::Quit;
    }

    if app.has_overlay() {
        return handle_overlay_key(app, key);
    }

    match key.code {
        KeyCode::Char('?') | KeyCode::F(1) => {
            app.toggle_help();
            return EventResult::NeedsRedraw;
        }
        KeyCode::Char('q') => return EventResult::Quit,
        _ => {}
    }

    match app.screen {
        Screen::StoryList => handle_story_list(app, key),
        Screen::Reading => handle_reading(app, key),
    }
}

fn handle_overlay_key(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') | KeyCode::Enter => {
            app.close_overlay();
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

/// Keys on the story list
fn handle_story_list(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            app.select_next();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.select_prev();
            EventResult::NeedsRedraw
        }
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => {
            app.open_selected();
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

/// Keys while reading a story
fn handle_reading(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        // Decisions
        KeyCode::Char('a') | KeyCode::Char('A') => {
            app.choose(Choice::A);
            EventResult::NeedsRedraw
        }
        KeyCode::Char('b') | KeyCode::Char('B') => {
            app.choose(Choice::B);
            EventResult::NeedsRedraw
        }
        KeyCode::Char('r') => {
            app.restart();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('s') | KeyCode::Esc => {
            app.show_story_list();
            EventResult::NeedsRedraw
        }

        // Navigation
        KeyCode::Char('j') | KeyCode::Down => {
            app.scroll_down(1);
            EventResult::NeedsRedraw
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.scroll_up(1);
            EventResult::NeedsRedraw
        }
        KeyCode::Char('G') | KeyCode::End => {
            app.scroll_to_bottom();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('g') | KeyCode::Home => {
            app.scroll_to_top();
            EventResult::NeedsRedraw
        }
        KeyCode::PageUp => {
            app.scroll_up(10);
            EventResult::NeedsRedraw
        }
        KeyCode::PageDown => {
            app.scroll_down(10);
            EventResult::NeedsRedraw
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_up(10);
            EventResult::NeedsRedraw
        }
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_down(10);
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::PendingAction;
    use story_core::testing::TestHarness;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn app() -> App {
        App::new(TestHarness::new().game)
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        assert_eq!(handle_event(&mut app, key(KeyCode::Char('q'))), EventResult::Quit);
        let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(handle_event(&mut app, ctrl_c), EventResult::Quit);
    }

    #[test]
    fn test_enter_opens_story() {
        let mut app = app();
        handle_event(&mut app, key(KeyCode::Enter));
        assert_eq!(app.screen, Screen::Reading);
        assert_eq!(app.pending, Some(PendingAction::Start));
    }

    #[test]
    fn test_escape_returns_to_list() {
        let mut app = app();
        handle_event(&mut app, key(KeyCode::Enter));
        handle_event(&mut app, key(KeyCode::Esc));
        assert_eq!(app.screen, Screen::StoryList);
    }

    #[test]
    fn test_help_overlay_swallows_keys() {
        let mut app = app();
        handle_event(&mut app, key(KeyCode::Char('?')));
        assert!(app.has_overlay());
        assert_eq!(handle_event(&mut app, key(KeyCode::Char('j'))), EventResult::Continue);
        handle_event(&mut app, key(KeyCode::Esc));
        assert!(!app.has_overlay());
    }
}
