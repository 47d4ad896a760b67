use std::fmt::Display;
use std::path::Path;

use chrono::{DateTime, Local, TimeZone, Utc};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::app::ListState;
use crate::fs::listing::Entry;
use crate::theme::ThemeColors;

/// File list widget: directories first, then files newest first.
pub struct FileListWidget<'a> {
    entries: &'a [Entry],
    list_state: &'a ListState,
    theme: &'a ThemeColors,
    latest: Option<&'a Path>,
    shown: Option<&'a Path>,
    block: Option<Block<'a>>,
}

impl<'a> FileListWidget<'a> {
    pub fn new(entries: &'a [Entry], list_state: &'a ListState, theme: &'a ThemeColors) -> Self {
        Self {
            entries,
            list_state,
            theme,
            latest: None,
            shown: None,
            block: None,
        }
    }

    /// Mark the newest file with a badge.
    pub fn latest(mut self, path: Option<&'a Path>) -> Self {
        self.latest = path;
        self
    }

    /// Mark the file whose content is displayed.
    pub fn shown(mut self, path: Option<&'a Path>) -> Self {
        self.shown = path;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }

    fn indicator(entry: &Entry) -> &'static str {
        if entry.is_directory {
            "[D] "
        } else {
            "[F] "
        }
    }
}

/// Format a millisecond mtime as a wall-clock `HH:MM:SS` in `tz`.
pub fn format_mtime<Tz>(mtime_ms: u64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    i64::try_from(mtime_ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.with_timezone(tz).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}

impl<'a> Widget for FileListWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        let visible_height = inner_area.height as usize;
        if visible_height == 0 || inner_area.width == 0 {
            return;
        }

        if self.entries.is_empty() {
            let line = Line::from(Span::styled(
                "(empty directory)",
                Style::default().fg(self.theme.dim_fg),
            ));
            buf.set_line(inner_area.x, inner_area.y, &line, inner_area.width);
            return;
        }

        let scroll = self.list_state.scroll_offset;
        let visible = self
            .entries
            .iter()
            .enumerate()
            .skip(scroll)
            .take(visible_height);

        for (row, (idx, entry)) in visible.enumerate() {
            let y = inner_area.y + row as u16;
            let is_cursor = idx == self.list_state.cursor;
            let is_shown = self.shown == Some(entry.path.as_path());

            let style = if is_cursor {
                Style::default()
                    .bg(self.theme.list_selected_bg)
                    .fg(self.theme.list_selected_fg)
                    .add_modifier(Modifier::BOLD)
            } else if entry.is_directory {
                Style::default()
                    .fg(self.theme.list_dir_fg)
                    .add_modifier(Modifier::BOLD)
            } else if is_shown {
                Style::default().fg(self.theme.accent_fg)
            } else {
                Style::default().fg(self.theme.list_file_fg)
            };

            let marker = if is_shown { "▶ " } else { "  " };
            let mut spans = vec![Span::styled(
                format!("{}{}{}", marker, Self::indicator(entry), entry.name),
                style,
            )];
            if self.latest == Some(entry.path.as_path()) {
                spans.push(Span::styled(
                    " NEW",
                    Style::default()
                        .fg(self.theme.badge_fg)
                        .add_modifier(Modifier::BOLD),
                ));
            }

            let time = format_mtime(entry.mtime, &Local);
            let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
            let width = inner_area.width as usize;
            if used + time.len() < width {
                spans.push(Span::raw(" ".repeat(width - used - time.len())));
                spans.push(Span::styled(time, Style::default().fg(self.theme.dim_fg)));
            }

            buf.set_line(inner_area.x, y, &Line::from(spans), inner_area.width);
        }
    }
}
