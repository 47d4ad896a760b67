use std::path::{Path, PathBuf};

use ratatui::text::Line;

use crate::controller::{Controller, Request, Response, Update};
use crate::fs::listing::Entry;
use crate::preview_content::Highlighter;
use crate::theme::ThemeColors;

/// Cursor and scroll position in the file list.
#[derive(Debug, Default)]
pub struct ListState {
    pub cursor: usize,
    pub scroll_offset: usize,
}

impl ListState {
    /// Update the scroll offset to ensure the cursor is visible.
    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.cursor < self.scroll_offset {
            self.scroll_offset = self.cursor;
        } else if self.cursor >= self.scroll_offset + visible_height {
            self.scroll_offset = self.cursor - visible_height + 1;
        }
    }
}

/// Rendered content of the selected file.
#[derive(Debug, Default)]
pub struct PreviewState {
    pub path: Option<PathBuf>,
    pub content_lines: Vec<Line<'static>>,
    pub scroll_offset: usize,
    /// Controller content version these lines were built from.
    pub version: u64,
}

/// Main application state for the terminal viewer.
pub struct App {
    pub controller: Controller,
    pub list_state: ListState,
    pub preview: PreviewState,
    pub theme: ThemeColors,
    pub source: String,
    pub should_quit: bool,
    highlighter: Highlighter,
}

impl App {
    pub fn new(
        controller: Controller,
        highlighter: Highlighter,
        theme: ThemeColors,
        source: String,
    ) -> Self {
        Self {
            controller,
            list_state: ListState::default(),
            preview: PreviewState::default(),
            theme,
            source,
            should_quit: false,
            highlighter,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.controller.session().entries
    }

    /// Entry under the cursor.
    pub fn cursor_entry(&self) -> Option<&Entry> {
        self.entries().get(self.list_state.cursor)
    }

    /// Feed a completed request to the controller and refresh the view.
    pub fn handle_response(&mut self, response: Response) -> Option<Request> {
        let cursor_path = self.cursor_entry().map(|e| e.path.clone());
        let Update { follow_up, .. } = self.controller.apply(response);
        self.restore_cursor(cursor_path.as_deref());
        self.sync_preview();
        follow_up
    }

    /// Keep the cursor on the same path across listings when it survives.
    fn restore_cursor(&mut self, previous: Option<&Path>) {
        let entries = self.entries();
        let found = previous.and_then(|p| entries.iter().position(|e| e.path == p));
        let len = entries.len();
        self.list_state.cursor = match found {
            Some(i) => i,
            None if len == 0 => 0,
            None => self.list_state.cursor.min(len - 1),
        };
    }

    /// Rebuild the preview when the controller loaded new content.
    fn sync_preview(&mut self) {
        let version = self.controller.content_version();
        if version == self.preview.version {
            return;
        }
        let session = self.controller.session();
        if let (Some(path), Some(content)) = (&session.selected_path, &session.content) {
            self.preview.content_lines = self.highlighter.highlight(path, content);
            self.preview.path = Some(path.clone());
            self.preview.scroll_offset = 0;
        }
        self.preview.version = version;
    }

    /// Quit the application.
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Move the cursor down by one entry.
    pub fn select_next(&mut self) {
        let len = self.entries().len();
        if len > 0 && self.list_state.cursor < len - 1 {
            self.list_state.cursor += 1;
        }
    }

    /// Move the cursor up by one entry.
    pub fn select_previous(&mut self) {
        if self.list_state.cursor > 0 {
            self.list_state.cursor -= 1;
        }
    }

    pub fn select_first(&mut self) {
        self.list_state.cursor = 0;
    }

    pub fn select_last(&mut self) {
        let len = self.entries().len();
        if len > 0 {
            self.list_state.cursor = len - 1;
        }
    }

    /// Open the entry under the cursor.
    pub fn open_cursor(&mut self) -> Option<Request> {
        let entry = self.cursor_entry()?.clone();
        Some(self.controller.open(&entry))
    }

    pub fn scroll_preview_down(&mut self, lines: usize) {
        let max = self.preview.content_lines.len().saturating_sub(1);
        self.preview.scroll_offset = (self.preview.scroll_offset + lines).min(max);
    }

    pub fn scroll_preview_up(&mut self, lines: usize) {
        self.preview.scroll_offset = self.preview.scroll_offset.saturating_sub(lines);
    }
}
