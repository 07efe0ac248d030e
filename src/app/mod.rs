//! The terminal editor application.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: Pure function for state transitions
//! - [`App::run`]: Main event loop with rendering

mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use model::{Editor, Executor, Model, ToastLevel};
pub use update::{Message, focused_pane, update};

use std::path::PathBuf;

use crate::render::QUIET_PERIOD_MS;
use crate::store::BODY_FIELD;
use crate::widget::EditorOptions;

/// Terminal width, in columns, below which one pane shows at a time.
pub const DEFAULT_SPLIT_WIDTH: u16 = 100;

const DEFAULT_RENDER_WORKERS: usize = 2;

/// Main application struct that owns the terminal and runs the event loop.
#[derive(Debug, Clone)]
pub struct App {
    file_path: PathBuf,
    field: String,
    preview: bool,
    quiet_period_ms: u64,
    split_width: u16,
    render_workers: usize,
    watch_enabled: bool,
    config_global_path: Option<PathBuf>,
    config_local_path: Option<PathBuf>,
}

impl App {
    /// Create a new application editing `file_path`.
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            file_path,
            field: BODY_FIELD.to_string(),
            preview: true,
            quiet_period_ms: QUIET_PERIOD_MS,
            split_width: DEFAULT_SPLIT_WIDTH,
            render_workers: DEFAULT_RENDER_WORKERS,
            watch_enabled: false,
            config_global_path: None,
            config_local_path: None,
        }
    }

    /// Edit `field` of a JSON record instead of the markdown body.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    #[must_use]
    pub const fn with_preview(mut self, enabled: bool) -> Self {
        self.preview = enabled;
        self
    }

    #[must_use]
    pub const fn with_quiet_period(mut self, ms: u64) -> Self {
        self.quiet_period_ms = ms;
        self
    }

    #[must_use]
    pub const fn with_split_width(mut self, width: u16) -> Self {
        self.split_width = width;
        self
    }

    #[must_use]
    pub const fn with_render_workers(mut self, workers: usize) -> Self {
        self.render_workers = workers;
        self
    }

    /// Enable or disable file watching.
    #[must_use]
    pub const fn with_watch(mut self, enabled: bool) -> Self {
        self.watch_enabled = enabled;
        self
    }

    /// Set config paths to show in help.
    #[must_use]
    pub fn with_config_paths(
        mut self,
        global_path: Option<PathBuf>,
        local_path: Option<PathBuf>,
    ) -> Self {
        self.config_global_path = global_path;
        self.config_local_path = local_path;
        self
    }

    /// Widget options for this app's settings.
    pub fn editor_options(&self) -> EditorOptions {
        EditorOptions::new(self.field.clone())
            .with_preview(self.preview)
            .with_quiet_period(self.quiet_period_ms)
            .with_split_min_width(self.split_width)
    }
}
