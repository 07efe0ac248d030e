use std::path::PathBuf;

use crate::app::{Model, ToastLevel};
use crate::editor::{Direction, EditorBuffer, ToolbarCommand};
use crate::layout::Pane;

/// Everything that can happen to the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// The editing surface finished mounting.
    EditorReady,
    /// Event-loop heartbeat: fire due render timers, collect conversions.
    Tick,

    // Editing
    Insert(char),
    Paste(String),
    Newline,
    Backspace,
    Delete,
    Move(Direction),
    Home,
    End,
    WordLeft,
    WordRight,
    BufferEnd,
    Toolbar(ToolbarCommand),

    // Image prompt
    OpenImagePrompt,
    PromptInput(char),
    PromptBackspace,
    PromptSubmit,
    PromptCancel,

    // Preview and layout
    SyncNow,
    SwitchTab,
    PreviewScrollUp(usize),
    PreviewScrollDown(usize),
    Resize(u16, u16),

    // Handled as side effects after the state change
    Save,
    CopyHtml,
    ToggleWatch,
    FileChanged,

    ToggleHelp,
    HideHelp,
    Quit,
}

/// Apply `msg` at time `now_ms` and return the next model.
pub fn update(mut model: Model, msg: Message, now_ms: u64) -> Model {
    if !matches!(msg, Message::Quit | Message::Save | Message::Tick) {
        model.quit_confirmed = false;
    }
    if !matches!(msg, Message::Tick) {
        model.redraw = true;
    }

    match msg {
        Message::EditorReady => {
            if model.widget.editor().is_none() {
                model.widget.attach_editor(EditorBuffer::default(), now_ms);
            }
        }
        Message::Tick => {
            let report = model.widget.tick(now_ms);
            for error in report.failures() {
                model.show_toast(ToastLevel::Warning, format!("Preview not updated: {error}"));
            }
            if model.refresh_preview_lines() {
                model.redraw = true;
            }
        }
        Message::Insert(ch) => edit(&mut model, now_ms, |b| b.insert_char(ch)),
        Message::Paste(text) => edit(&mut model, now_ms, |b| {
            b.insert_str(&text.replace("\r\n", "\n"));
        }),
        Message::Newline => edit(&mut model, now_ms, EditorBuffer::newline),
        Message::Backspace => edit(&mut model, now_ms, |b| {
            b.backspace();
        }),
        Message::Delete => edit(&mut model, now_ms, |b| {
            b.delete();
        }),
        Message::Move(direction) => move_cursor(&mut model, |b| b.move_cursor(direction)),
        Message::Home => move_cursor(&mut model, EditorBuffer::move_home),
        Message::End => move_cursor(&mut model, EditorBuffer::move_end),
        Message::WordLeft => move_cursor(&mut model, EditorBuffer::move_word_left),
        Message::WordRight => move_cursor(&mut model, EditorBuffer::move_word_right),
        Message::BufferEnd => move_cursor(&mut model, EditorBuffer::move_to_end),
        Message::Toolbar(command) => {
            model.widget.apply_toolbar(command, now_ms);
            model.follow_cursor();
        }
        Message::OpenImagePrompt => model.image_prompt = Some(String::new()),
        Message::PromptInput(ch) => {
            if let Some(input) = model.image_prompt.as_mut() {
                input.push(ch);
            }
        }
        Message::PromptBackspace => {
            if let Some(input) = model.image_prompt.as_mut() {
                input.pop();
            }
        }
        Message::PromptCancel => model.image_prompt = None,
        Message::PromptSubmit => {
            let path = model.image_prompt.take().unwrap_or_default();
            let path = path.trim();
            if !path.is_empty() {
                model.widget.insert_image(&PathBuf::from(path), now_ms);
                model.follow_cursor();
            }
        }
        Message::SyncNow => {
            model.widget.sync_now(now_ms);
        }
        Message::SwitchTab => {
            let next = model.widget.layout().selected_tab().other();
            model.widget.select_tab(next, now_ms);
        }
        Message::PreviewScrollUp(n) => {
            model.preview_scroll = model.preview_scroll.saturating_sub(n);
        }
        Message::PreviewScrollDown(n) => {
            let max = model.preview_lines.len().saturating_sub(1);
            model.preview_scroll = model.preview_scroll.saturating_add(n).min(max);
        }
        Message::Resize(width, height) => {
            model.size = (width, height);
            model.widget.resize(width, now_ms);
            model.follow_cursor();
        }
        Message::ToggleWatch => model.watch_enabled = !model.watch_enabled,
        Message::ToggleHelp => model.help_visible = !model.help_visible,
        Message::HideHelp => model.help_visible = false,
        Message::Quit => {
            if model.has_unsaved_changes() && !model.quit_confirmed {
                model.show_toast(
                    ToastLevel::Warning,
                    "Unsaved changes! Press Ctrl+Q again to quit, or Ctrl+S to save",
                );
                model.quit_confirmed = true;
            } else {
                model.should_quit = true;
            }
        }
        Message::Save | Message::CopyHtml | Message::FileChanged => {}
    }
    model
}

/// Edit the surface and, if the text changed, propose it upstream.
fn edit(model: &mut Model, now_ms: u64, change: impl FnOnce(&mut EditorBuffer)) {
    let Some(buf) = model.widget.editor_mut() else {
        return;
    };
    let before = buf.revision();
    change(buf);
    if buf.revision() != before {
        model.widget.editor_changed(now_ms);
    }
    model.follow_cursor();
}

fn move_cursor(model: &mut Model, motion: impl FnOnce(&mut EditorBuffer)) {
    if let Some(buf) = model.widget.editor_mut() {
        motion(buf);
    }
    model.follow_cursor();
}

/// Where keyboard focus is: the editor unless the preview tab is showing.
pub fn focused_pane(model: &Model) -> Pane {
    let layout = model.widget.layout();
    if layout.is_split() || layout.selected_tab() == Pane::Editor {
        Pane::Editor
    } else {
        Pane::Preview
    }
}
