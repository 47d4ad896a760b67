use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::Style,
    widgets::{Block, Borders},
    Frame,
};

use crate::app::App;
use crate::components::file_list::FileListWidget;
use crate::components::preview::PreviewWidget;
use crate::components::status_bar::StatusBarWidget;

/// Render the application UI: file list on the left, content on the right,
/// status bar at the bottom.
pub fn render(app: &mut App, frame: &mut Frame) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(rows[0]);

    // Keep the cursor visible inside the bordered list
    let visible_height = panes[0].height.saturating_sub(2) as usize;
    app.list_state.update_scroll(visible_height);

    let theme = &app.theme;
    let session = app.controller.session();
    let current = session
        .current_path
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(loading)".to_string());

    let list_block = Block::default()
        .title(" Files ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused_fg));
    let file_list = FileListWidget::new(&session.entries, &app.list_state, theme)
        .latest(app.controller.latest().map(|e| e.path.as_path()))
        .shown(app.preview.path.as_deref())
        .block(list_block);
    frame.render_widget(file_list, panes[0]);

    let preview_title = match &app.preview.path {
        Some(path) => format!(
            " {} ",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string())
        ),
        None => " Content ".to_string(),
    };
    let placeholder = if session.auto_follow {
        "Waiting for a file to appear..."
    } else {
        "Select a file and press Enter"
    };
    let preview_block = Block::default()
        .title(preview_title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_fg));
    let preview = PreviewWidget::new(&app.preview, theme)
        .placeholder(placeholder)
        .block(preview_block);
    frame.render_widget(preview, panes[1]);

    let status = StatusBarWidget::new(app.controller.mode(), &current, theme)
        .generation(app.controller.generation().0)
        .source(&app.source);
    frame.render_widget(status, rows[1]);
}
