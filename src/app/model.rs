use std::path::PathBuf;
use std::time::{Duration, Instant};

use ratatui::text::Line;

use crate::render::RenderExecutor;
use crate::store::{RecordFile, StoreError};
use crate::widget::{EditorOptions, MarkdownEditor};

/// Executor the app renders through; boxed so tests can swap in an inline one.
pub type Executor = Box<dyn RenderExecutor>;

/// The widget as the terminal app hosts it.
pub type Editor = MarkdownEditor<RecordFile, Executor>;

const TOAST_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// Everything the terminal app draws from.
#[derive(Debug)]
pub struct Model {
    pub widget: Editor,
    /// Terminal size in columns and rows.
    pub size: (u16, u16),
    /// First editor line on screen.
    pub editor_scroll: usize,
    /// First preview line on screen.
    pub preview_scroll: usize,
    /// Highlighted HTML of the committed preview.
    pub(super) preview_lines: Vec<Line<'static>>,
    /// Input typed at the image path prompt, while it is open.
    pub image_prompt: Option<String>,
    pub help_visible: bool,
    pub watch_enabled: bool,
    pub should_quit: bool,
    pub(super) quit_confirmed: bool,
    /// Set when something on screen changed; the loop clears it on draw.
    pub(super) redraw: bool,
    pub config_global_path: Option<PathBuf>,
    pub config_local_path: Option<PathBuf>,
    toast: Option<Toast>,
}

impl Model {
    /// Mount the widget over `store` for a terminal of `size`.
    ///
    /// # Errors
    /// Fails if the edited field is not a string in the record.
    pub fn new(
        store: RecordFile,
        options: EditorOptions,
        executor: Executor,
        size: (u16, u16),
        now_ms: u64,
    ) -> Result<Self, StoreError> {
        let widget = MarkdownEditor::mount(store, options, executor, size.0, now_ms)?;
        Ok(Self {
            widget,
            size,
            editor_scroll: 0,
            preview_scroll: 0,
            preview_lines: Vec::new(),
            image_prompt: None,
            help_visible: false,
            watch_enabled: false,
            should_quit: false,
            quit_confirmed: false,
            redraw: true,
            config_global_path: None,
            config_local_path: None,
            toast: None,
        })
    }

    pub fn file_path(&self) -> PathBuf {
        self.widget.store().path().to_path_buf()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.widget.store().is_modified()
    }

    pub fn preview_lines(&self) -> &[Line<'static>] {
        &self.preview_lines
    }

    /// Rows available to a pane's content: the terminal minus the status
    /// bar, the pane border and, in tabbed mode, the tab bar.
    pub fn pane_height(&self) -> usize {
        let tabs = u16::from(!self.widget.layout().is_split());
        usize::from(self.size.1.saturating_sub(3 + tabs))
    }

    /// Re-highlight the preview if a render committed since the last call.
    pub(super) fn refresh_preview_lines(&mut self) -> bool {
        let Some(preview) = self.widget.preview_mut() else {
            let had_lines = !self.preview_lines.is_empty();
            self.preview_lines.clear();
            return had_lines;
        };
        if !preview.take_changed() {
            return false;
        }
        self.preview_lines = crate::highlight::highlight_html(preview.html());
        let max = self.preview_lines.len().saturating_sub(1);
        self.preview_scroll = self.preview_scroll.min(max);
        true
    }

    /// Keep the cursor line inside the editor pane.
    pub(super) fn follow_cursor(&mut self) {
        let Some(cursor_line) = self.widget.editor().map(|b| b.cursor().line) else {
            return;
        };
        let height = self.pane_height().max(1);
        if cursor_line < self.editor_scroll {
            self.editor_scroll = cursor_line;
        } else if cursor_line >= self.editor_scroll + height {
            self.editor_scroll = cursor_line + 1 - height;
        }
    }

    pub fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + TOAST_TTL,
        });
        self.redraw = true;
    }

    pub fn expire_toast(&mut self, now: Instant) -> bool {
        if self.toast.as_ref().is_some_and(|t| t.expires_at <= now) {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast.as_ref().map(|t| (t.message.as_str(), t.level))
    }
}
