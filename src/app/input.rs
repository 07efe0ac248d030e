use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{App, Message, Model, focused_pane};
use crate::editor::{Direction, ToolbarCommand};
use crate::layout::Pane;

const TAB_INDENT: &str = "    ";

impl App {
    pub(super) fn handle_event(event: &Event, model: &Model) -> Option<Message> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => Self::handle_key(*key, model),
            Event::Paste(text) if model.image_prompt.is_none() && !model.help_visible => {
                (focused_pane(model) == Pane::Editor).then(|| Message::Paste(text.clone()))
            }
            Event::Resize(width, height) => {
                crate::perf::log_event("event.resize", format!("width={width} height={height}"));
                Some(Message::Resize(*width, *height))
            }
            _ => None,
        }
    }

    pub(super) fn handle_key(key: KeyEvent, model: &Model) -> Option<Message> {
        if model.help_visible {
            return Some(Message::HideHelp);
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        if model.image_prompt.is_some() {
            return match key.code {
                KeyCode::Esc => Some(Message::PromptCancel),
                KeyCode::Enter => Some(Message::PromptSubmit),
                KeyCode::Backspace => Some(Message::PromptBackspace),
                KeyCode::Char(c) if !ctrl && !alt => Some(Message::PromptInput(c)),
                _ => None,
            };
        }

        // The toolbar and cursor keys act only on a visible editor.
        let editing = focused_pane(model) == Pane::Editor;

        if ctrl {
            let msg = match key.code {
                KeyCode::Char('q' | 'c') => Message::Quit,
                KeyCode::Char('s') => Message::Save,
                KeyCode::Char('r') => Message::SyncNow,
                KeyCode::Char('y') => Message::CopyHtml,
                KeyCode::Char('w') => Message::ToggleWatch,
                _ if !editing => return None,
                KeyCode::Char('b') => Message::Toolbar(ToolbarCommand::Bold),
                KeyCode::Char('t') => Message::Toolbar(ToolbarCommand::Italic),
                KeyCode::Char('k') => Message::Toolbar(ToolbarCommand::Link),
                KeyCode::Char('g') => Message::OpenImagePrompt,
                KeyCode::Left => Message::WordLeft,
                KeyCode::Right => Message::WordRight,
                KeyCode::End => Message::BufferEnd,
                _ => return None,
            };
            return Some(msg);
        }

        if alt {
            if !editing {
                return None;
            }
            return match key.code {
                KeyCode::Char('-') => Some(Message::Toolbar(ToolbarCommand::Rule)),
                KeyCode::Char(c) => ToolbarCommand::from_digit(c).map(Message::Toolbar),
                _ => None,
            };
        }

        let page = model.pane_height().max(1);
        match key.code {
            KeyCode::F(1) => return Some(Message::ToggleHelp),
            KeyCode::Tab if !model.widget.layout().is_split() => return Some(Message::SwitchTab),
            KeyCode::PageUp => return Some(Message::PreviewScrollUp(page)),
            KeyCode::PageDown => return Some(Message::PreviewScrollDown(page)),
            _ => {}
        }

        if focused_pane(model) == Pane::Preview {
            return match key.code {
                KeyCode::Up => Some(Message::PreviewScrollUp(1)),
                KeyCode::Down => Some(Message::PreviewScrollDown(1)),
                KeyCode::Home => Some(Message::PreviewScrollUp(usize::MAX)),
                KeyCode::End => Some(Message::PreviewScrollDown(usize::MAX)),
                _ => None,
            };
        }

        match key.code {
            KeyCode::Char(c) => Some(Message::Insert(c)),
            KeyCode::Tab => Some(Message::Paste(TAB_INDENT.to_string())),
            KeyCode::Enter => Some(Message::Newline),
            KeyCode::Backspace => Some(Message::Backspace),
            KeyCode::Delete => Some(Message::Delete),
            KeyCode::Left => Some(Message::Move(Direction::Left)),
            KeyCode::Right => Some(Message::Move(Direction::Right)),
            KeyCode::Up => Some(Message::Move(Direction::Up)),
            KeyCode::Down => Some(Message::Move(Direction::Down)),
            KeyCode::Home => Some(Message::Home),
            KeyCode::End => Some(Message::End),
            _ => None,
        }
    }
}
