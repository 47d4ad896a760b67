use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::App;
use crate::controller::Request;

/// Lines moved by PageUp/PageDown in the content panel.
const PAGE_SCROLL: usize = 20;

/// Handle a key event. Returns the request the key triggered, if any.
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Option<Request> {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
        KeyCode::Home | KeyCode::Char('g') => app.select_first(),
        KeyCode::End | KeyCode::Char('G') => app.select_last(),
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => return app.open_cursor(),
        KeyCode::Backspace | KeyCode::Char('h') | KeyCode::Left => {
            return app.controller.navigate_up()
        }
        KeyCode::Char('f') => return app.controller.toggle_auto_follow(),
        KeyCode::Char('r') => return Some(app.controller.poll()),
        KeyCode::Char('J') => app.scroll_preview_down(1),
        KeyCode::Char('K') => app.scroll_preview_up(1),
        KeyCode::PageDown => app.scroll_preview_down(PAGE_SCROLL),
        KeyCode::PageUp => app.scroll_preview_up(PAGE_SCROLL),
        _ => {}
    }
    None
}
