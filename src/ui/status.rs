use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{Model, ToastLevel};
use crate::sync::MAX_TEXT_LEN;

const STATUS_STYLE: Style = Style::new().bg(Color::DarkGray).fg(Color::White);

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let path = model.file_path();
    let filename = path.file_name().map_or_else(
        || "untitled".to_string(),
        |s| s.to_string_lossy().to_string(),
    );
    let modified = if model.has_unsaved_changes() {
        " [modified]"
    } else {
        ""
    };
    let cursor_info = model.widget.editor().map_or_else(String::new, |b| {
        let c = b.cursor();
        format!("  Ln {}, Col {}", c.line + 1, c.col + 1)
    });
    let mode = if model.widget.layout().is_split() {
        "split"
    } else {
        "tabbed"
    };
    let watching = if model.watch_enabled {
        " [watching]"
    } else {
        ""
    };

    let len = model.widget.text().chars().count();
    let len_style = if len >= MAX_TEXT_LEN {
        STATUS_STYLE.fg(Color::LightRed).add_modifier(Modifier::BOLD)
    } else {
        STATUS_STYLE
    };

    let line = Line::from(vec![
        Span::raw(format!(" {filename}{modified}{cursor_info}  ")),
        Span::styled(format!("{len}/{MAX_TEXT_LEN}"), len_style),
        Span::raw(format!("  [{mode}]{watching}  F1:help")),
    ]);
    frame.render_widget(Paragraph::new(line).style(STATUS_STYLE), area);
}

pub fn render_image_prompt(model: &Model, frame: &mut Frame, area: Rect) {
    let input = model.image_prompt.as_deref().unwrap_or_default();
    let text = format!("Image path: {input}_  Enter: insert  Esc: cancel");
    let bar = Paragraph::new(text).style(Style::default().bg(Color::Blue).fg(Color::White));
    frame.render_widget(bar, area);
}

pub fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        ToastLevel::Info => ("[info]", STATUS_STYLE),
        ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        ToastLevel::Error => ("[error]", Style::default().bg(Color::Red).fg(Color::White)),
    };
    let toast = Paragraph::new(format!("{prefix} {message}")).style(style);
    frame.render_widget(toast, area);
}
