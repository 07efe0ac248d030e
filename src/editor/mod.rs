//! The editing surface.
//!
//! A rope-backed text buffer with one cursor, the handle cell the widget
//! reaches it through, and the toolbar commands that edit it.

mod buffer;
mod handle;
pub mod toolbar;

pub use buffer::{Cursor, Direction, EditorBuffer};
pub use handle::EditorHandle;
pub use toolbar::{Markup, ToolbarCommand, image_markdown};
