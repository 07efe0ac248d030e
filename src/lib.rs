// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. render::RenderError)
    clippy::module_name_repetitions
)]

//! # markpane
//!
//! A markdown editor widget with a debounced live HTML preview, and a
//! terminal app built on it.
//!
//! The widget binds one string field of a host-owned record to an editing
//! surface. Edits flow back to the record through a size guard; the
//! preview re-renders once typing pauses, on worker threads, and only the
//! newest render is ever shown.
//!
//! ## Architecture
//!
//! The terminal app uses The Elm Architecture (TEA) pattern:
//! - **Model**: Application state
//! - **Message**: Events and actions
//! - **Update**: State transitions, with time passed in explicitly
//! - **View**: Render to terminal
//!
//! ## Modules
//!
//! - [`render`]: Markdown conversion, quiet-period timers, executors, the
//!   debounced render pipeline
//! - [`preview`]: The committed preview output
//! - [`sync`]: Keeps the preview in step with the text; the size guard
//! - [`layout`]: Split vs tabbed presentation
//! - [`editor`]: The editing surface, its handle cell, toolbar commands
//! - [`store`]: Records and record files
//! - [`widget`]: The host-facing [`MarkdownEditor`](widget::MarkdownEditor)
//! - [`app`], [`ui`]: The terminal application
//! - [`highlight`]: Syntax highlighting of the preview HTML
//! - [`watcher`]: File watching
//! - [`config`]: Saved default flags
//! - [`perf`]: Timing scopes and the render debug log

pub mod app;
pub mod config;
pub mod editor;
pub mod highlight;
pub mod layout;
pub mod perf;
pub mod preview;
pub mod render;
pub mod store;
pub mod sync;
pub mod ui;
pub mod watcher;
pub mod widget;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model};
    pub use crate::render::{ComrakRenderer, InlineExecutor, MarkdownRenderer, WorkerExecutor};
    pub use crate::store::{Record, RecordFile, TextStore};
    pub use crate::widget::{EditorOptions, MarkdownEditor};
}
