use ratatui::prelude::*;
use ratatui::widgets::{Block, Clear, Paragraph, Tabs};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::{Model, focused_pane};
use crate::editor::{EditorBuffer, ToolbarCommand};
use crate::layout::Pane;

use super::{overlays, status};

const FOCUS_STYLE: Style = Style::new().fg(Color::Yellow);
const DIM_STYLE: Style = Style::new().fg(Color::DarkGray);

/// Render the complete UI.
pub fn view(model: &Model, frame: &mut Frame) {
    let area = frame.area();
    let layout = model.widget.layout();
    let tabbed = !layout.is_split();

    let [tabs_area, panes_area, status_area] = Layout::vertical([
        Constraint::Length(u16::from(tabbed)),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(area);

    let focus = focused_pane(model);
    if tabbed {
        render_tab_bar(focus, frame, tabs_area);
        match focus {
            Pane::Editor => render_editor_pane(model, frame, panes_area, true),
            Pane::Preview => render_preview_pane(model, frame, panes_area, true),
        }
    } else {
        let [editor_area, preview_area] =
            Layout::horizontal([Constraint::Percentage(50); 2]).areas(panes_area);
        render_editor_pane(model, frame, editor_area, true);
        render_preview_pane(model, frame, preview_area, false);
    }

    // The toast sits on the row just above the status line.
    if model.active_toast().is_some() && panes_area.height > 0 {
        let toast_area = Rect {
            y: panes_area.bottom().saturating_sub(1),
            height: 1,
            ..panes_area
        };
        status::render_toast_bar(model, frame, toast_area);
    }

    if model.image_prompt.is_some() {
        status::render_image_prompt(model, frame, status_area);
    } else {
        status::render_status_bar(model, frame, status_area);
    }

    if model.help_visible {
        overlays::render_help_overlay(model, frame, area);
    }
}

fn render_tab_bar(active: Pane, frame: &mut Frame, area: Rect) {
    let selected = match active {
        Pane::Editor => 0,
        Pane::Preview => 1,
    };
    let tabs = Tabs::new([Pane::Editor.label(), Pane::Preview.label()])
        .select(selected)
        .style(Style::default().bg(Color::DarkGray).fg(Color::White))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .divider("|");
    frame.render_widget(tabs, area);
}

fn render_editor_pane(model: &Model, frame: &mut Frame, area: Rect, focused: bool) {
    let key = &model.widget.options().update_key;
    let block = Block::bordered()
        .title(format!(" {key} "))
        .title_bottom(toolbar_hint())
        .border_style(if focused { FOCUS_STYLE } else { Style::default() });
    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let Some(buf) = model.widget.editor() else {
        frame.render_widget(Paragraph::new("Loading editor...").style(DIM_STYLE), inner);
        return;
    };
    frame.render_widget(
        Paragraph::new(editor_lines(buf, model.editor_scroll, inner)),
        inner,
    );
}

/// Gutter plus visible text, scrolled so the cursor column stays on screen.
fn editor_lines(buf: &EditorBuffer, scroll: usize, area: Rect) -> Vec<Line<'static>> {
    let total_lines = buf.line_count();
    let gutter = usize::from(line_number_width(total_lines));
    let text_width = usize::from(area.width).saturating_sub(gutter + 1).max(1);
    let cursor = buf.cursor();
    let cursor_line = buf.line(cursor.line).unwrap_or_default();
    let cursor_x = cursor_line
        .get(..cursor.col)
        .map_or(0, UnicodeWidthStr::width);
    let hscroll = (cursor_x + 1).saturating_sub(text_width);

    let end = (scroll + usize::from(area.height)).min(total_lines);
    (scroll..end)
        .map(|idx| {
            let text = buf.line(idx).unwrap_or_default();
            let mut spans = vec![Span::styled(
                format!("{:>gutter$} ", idx + 1),
                DIM_STYLE,
            )];
            if idx == cursor.line {
                let col = cursor.col.min(text.len());
                let (before, rest) = text.split_at(col);
                let mut rest_chars = rest.chars();
                let under = rest_chars.next().map_or_else(|| " ".to_string(), String::from);
                let after: String = rest_chars.collect();
                let before = skip_columns(before, hscroll);
                if !before.is_empty() {
                    spans.push(Span::raw(before));
                }
                spans.push(Span::styled(
                    under,
                    Style::default().bg(Color::White).fg(Color::Black),
                ));
                if !after.is_empty() {
                    spans.push(Span::raw(after));
                }
            } else {
                spans.push(Span::raw(skip_columns(&text, hscroll)));
            }
            Line::from(spans)
        })
        .collect()
}

/// Drop the first `columns` display columns of `text`.
fn skip_columns(text: &str, columns: usize) -> String {
    let mut skipped = 0;
    let mut chars = text.chars();
    while skipped < columns {
        let Some(ch) = chars.next() else {
            break;
        };
        skipped += ch.width().unwrap_or(0);
    }
    chars.collect()
}

fn toolbar_hint() -> Line<'static> {
    let mut spans = vec![Span::raw(" ")];
    for (idx, command) in ToolbarCommand::ALL.iter().take(9).enumerate() {
        spans.push(Span::styled(format!("{}", idx + 1), FOCUS_STYLE));
        spans.push(Span::raw(format!(":{} ", command.label())));
    }
    Line::from(spans)
}

fn render_preview_pane(model: &Model, frame: &mut Frame, area: Rect, focused: bool) {
    let renderer = model.widget.sync().renderer();
    let title = if renderer.is_busy() || renderer.has_pending_timer() {
        " Preview (HTML) rendering... "
    } else {
        " Preview (HTML) "
    };
    let block = Block::bordered()
        .title(title)
        .border_style(if focused { FOCUS_STYLE } else { Style::default() });
    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    if model.widget.preview().is_none() {
        frame.render_widget(Paragraph::new("Preview disabled").style(DIM_STYLE), inner);
        return;
    }
    let lines = model.preview_lines();
    if lines.is_empty() {
        frame.render_widget(Paragraph::new("Nothing to preview").style(DIM_STYLE), inner);
        return;
    }
    let start = model.preview_scroll.min(lines.len());
    let end = (start + usize::from(inner.height)).min(lines.len());
    frame.render_widget(Paragraph::new(lines[start..end].to_vec()), inner);
}

/// Calculate the width needed for line numbers.
pub const fn line_number_width(total_lines: usize) -> u16 {
    if total_lines < 10 {
        1
    } else if total_lines < 100 {
        2
    } else if total_lines < 1_000 {
        3
    } else if total_lines < 10_000 {
        4
    } else if total_lines < 100_000 {
        5
    } else {
        6
    }
}
