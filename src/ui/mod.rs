//! Terminal UI components.
//!
//! [`view`] draws the whole screen from the [`Model`](crate::app::Model):
//! the editor and preview panes (side by side or behind tabs), the status
//! line, toasts and overlays.

mod overlays;
mod render;
mod status;

pub use render::{line_number_width, view};
