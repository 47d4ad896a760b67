use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::controller::Mode;
use crate::theme::ThemeColors;

const KEY_HINTS: &str = " ⏎:open  ⌫:up  f:follow  r:refresh  q:quit ";

/// Status bar: mode badge, current directory, poll generation and source,
/// with key hints on the right.
pub struct StatusBarWidget<'a> {
    mode: Mode,
    path_str: &'a str,
    generation: u64,
    source: &'a str,
    theme: &'a ThemeColors,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(mode: Mode, path_str: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            mode,
            path_str,
            generation: 0,
            source: "",
            theme,
        }
    }

    pub fn generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    pub fn source(mut self, source: &'a str) -> Self {
        self.source = source;
        self
    }

    fn mode_style(&self) -> Style {
        let fg = match self.mode {
            Mode::Following => self.theme.success_fg,
            Mode::Browsing => self.theme.warning_fg,
            Mode::Loading => self.theme.info_fg,
        };
        Style::default().fg(fg).add_modifier(Modifier::BOLD)
    }
}

/// Keep the tail of `s` within `budget` characters.
fn truncate_left(s: &str, budget: usize) -> String {
    let len = s.chars().count();
    if len <= budget {
        return s.to_string();
    }
    if budget <= 3 {
        return s.chars().take(budget).collect();
    }
    let tail: String = s.chars().skip(len - (budget - 3)).collect();
    format!("...{tail}")
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let width = area.width as usize;
        let base = Style::default()
            .bg(self.theme.status_bg)
            .fg(self.theme.status_fg);
        buf.set_style(area, base);

        let badge = format!(" {} ", self.mode.label());
        let info = format!(" #{} {} ", self.generation, self.source);
        let hints_len = KEY_HINTS.chars().count();

        let fixed = badge.chars().count() + info.chars().count() + hints_len;
        let path_display = truncate_left(self.path_str, width.saturating_sub(fixed));
        let gap = width
            .saturating_sub(fixed)
            .saturating_sub(path_display.chars().count());

        let spans = vec![
            Span::styled(badge, self.mode_style()),
            Span::styled(path_display, Style::default().fg(self.theme.status_fg)),
            Span::raw(" ".repeat(gap)),
            Span::styled(info, Style::default().fg(self.theme.accent_fg)),
            Span::styled(
                KEY_HINTS,
                Style::default()
                    .fg(self.theme.dim_fg)
                    .add_modifier(Modifier::DIM),
            ),
        ];

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}
