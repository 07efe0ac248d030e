use ratatui::prelude::*;
use ratatui::widgets::{Block, Clear, Padding, Paragraph};

use crate::app::Model;
use crate::editor::ToolbarCommand;

pub fn render_help_overlay(model: &Model, frame: &mut Frame, area: Rect) {
    let popup_width = area.width.saturating_sub(12).max(48);
    let popup_height = area.height.saturating_sub(4).max(12);
    let popup = centered_popup_rect(popup_width, popup_height, area);

    let global_cfg = model
        .config_global_path
        .as_ref()
        .map_or_else(|| "<unknown>".to_string(), |p| p.display().to_string());
    let local_cfg = model
        .config_local_path
        .as_ref()
        .map_or_else(|| "<none>".to_string(), |p| p.display().to_string());

    let section_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::styled("Editing", section_style));
    lines.push(Line::raw("  Arrows, Home/End    Move"));
    lines.push(Line::raw("  Ctrl+Left/Right     Word movement"));
    lines.push(Line::raw("  Ctrl+End            End of text"));
    lines.push(Line::raw("  Ctrl+S              Save"));
    lines.push(Line::raw("  Ctrl+G              Insert image by path"));
    lines.push(Line::raw(""));

    lines.push(Line::styled("Toolbar", section_style));
    lines.push(Line::raw("  Ctrl+B / Ctrl+T / Ctrl+K  Bold / italic / link"));
    for (idx, command) in ToolbarCommand::ALL.iter().take(9).enumerate() {
        lines.push(Line::raw(format!("  Alt+{}               {}", idx + 1, command.label())));
    }
    lines.push(Line::raw("  Alt+-               Rule"));
    lines.push(Line::raw(""));

    lines.push(Line::styled("Preview", section_style));
    lines.push(Line::raw("  Ctrl+R              Render now"));
    lines.push(Line::raw("  Ctrl+Y              Copy HTML"));
    lines.push(Line::raw("  PageUp/PageDown     Scroll preview"));
    lines.push(Line::raw("  Tab                 Switch tab (narrow terminals)"));
    lines.push(Line::raw(""));

    lines.push(Line::styled("Other", section_style));
    lines.push(Line::raw("  Ctrl+W              Toggle watch"));
    lines.push(Line::raw("  Ctrl+Q              Quit"));
    lines.push(Line::raw("  F1                  Toggle help"));
    lines.push(Line::raw(""));

    lines.push(Line::styled("Config", section_style));
    lines.push(Line::raw(format!("  Global: {global_cfg}")));
    lines.push(Line::raw(format!("  Local override: {local_cfg}")));

    let block = Block::bordered()
        .title("Help")
        .title_bottom(Line::styled(
            " any key closes ",
            Style::default().fg(Color::Indexed(245)),
        ))
        .padding(Padding::uniform(1))
        .style(Style::default().bg(Color::Black).fg(Color::White));

    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

fn centered_popup_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(w) / 2);
    let y = area.y + (area.height.saturating_sub(h) / 2);
    Rect::new(x, y, w, h)
}
