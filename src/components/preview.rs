use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::app::PreviewState;
use crate::theme::ThemeColors;

/// Content panel: the highlighted text of the displayed file.
pub struct PreviewWidget<'a> {
    preview_state: &'a PreviewState,
    theme: &'a ThemeColors,
    placeholder: &'a str,
    block: Option<Block<'a>>,
}

impl<'a> PreviewWidget<'a> {
    pub fn new(preview_state: &'a PreviewState, theme: &'a ThemeColors) -> Self {
        Self {
            preview_state,
            theme,
            placeholder: "No file selected",
            block: None,
        }
    }

    /// Text shown while nothing has been loaded.
    pub fn placeholder(mut self, text: &'a str) -> Self {
        self.placeholder = text;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }
}

impl<'a> Widget for PreviewWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = if let Some(block) = self.block {
            let inner = block.inner(area);
            block.render(area, buf);
            inner
        } else {
            area
        };

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let lines = &self.preview_state.content_lines;
        if lines.is_empty() {
            let line = Line::from(Span::styled(
                self.placeholder,
                Style::default().fg(self.theme.dim_fg),
            ));
            buf.set_line(inner.x, inner.y, &line, inner.width);
            return;
        }

        let visible_height = inner.height as usize;
        let start = self.preview_state.scroll_offset.min(lines.len());
        let end = (start + visible_height).min(lines.len());

        for (i, line) in lines[start..end].iter().enumerate() {
            buf.set_line(inner.x, inner.y + i as u16, line, inner.width);
        }

        // Position indicator when the file does not fit.
        if lines.len() > visible_height {
            let indicator = format!(" {}/{} ", end, lines.len());
            let width = indicator.chars().count() as u16;
            if width < inner.width {
                let x = inner.x + inner.width - width;
                let y = inner.y + inner.height - 1;
                let line = Line::from(Span::styled(
                    indicator,
                    Style::default().fg(self.theme.info_fg),
                ));
                buf.set_line(x, y, &line, width);
            }
        }
    }
}
