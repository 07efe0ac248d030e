//! Markdown to HTML rendering.
//!
//! This module handles:
//! - The [`MarkdownRenderer`] seam and its comrak implementation
//! - Quiet-period timers ([`debounce`])
//! - Where conversions run ([`executor`])
//! - The debounced render pipeline with ordered commits ([`pipeline`])

pub mod debounce;
pub mod executor;
pub mod pipeline;

use std::panic::{AssertUnwindSafe, catch_unwind};

use thiserror::Error;

pub use debounce::Debouncer;
pub use executor::{InlineExecutor, RenderCompletion, RenderExecutor, RenderRequest, WorkerExecutor};
pub use pipeline::{DebouncedRenderer, QUIET_PERIOD_MS, RenderOutcome};

/// Errors produced while converting markdown to HTML.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The converter rejected or crashed on the input.
    #[error("markdown conversion failed: {0}")]
    Conversion(String),
    /// The worker pool shut down before the request could run.
    #[error("render worker is no longer running")]
    WorkerGone,
}

/// Converts markdown source to HTML.
///
/// Implementations must be side-effect free; they may be called repeatedly
/// and from several worker threads at once.
pub trait MarkdownRenderer: Send + Sync {
    /// Render `text` to an HTML string.
    ///
    /// # Errors
    /// Returns [`RenderError::Conversion`] when the input cannot be converted.
    fn render(&self, text: &str) -> Result<String, RenderError>;
}

impl<F> MarkdownRenderer for F
where
    F: Fn(&str) -> Result<String, RenderError> + Send + Sync,
{
    fn render(&self, text: &str) -> Result<String, RenderError> {
        self(text)
    }
}

/// GitHub-flavoured markdown rendering through comrak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComrakRenderer {
    unsafe_html: bool,
}

impl ComrakRenderer {
    pub const fn new() -> Self {
        Self { unsafe_html: false }
    }

    /// Pass raw HTML in the source through to the output instead of
    /// replacing it with a comment.
    pub const fn with_unsafe_html(mut self, enabled: bool) -> Self {
        self.unsafe_html = enabled;
        self
    }
}

impl Default for ComrakRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer for ComrakRenderer {
    fn render(&self, text: &str) -> Result<String, RenderError> {
        let mut options = comrak::Options::default();
        options.extension.strikethrough = true;
        options.extension.table = true;
        options.extension.autolink = true;
        options.extension.tasklist = true;
        options.extension.footnotes = true;
        options.render.unsafe_ = self.unsafe_html;

        Ok(comrak::markdown_to_html(text, &options))
    }
}

/// Run `renderer` on `text`, turning a panic into [`RenderError::Conversion`].
///
/// Executors call this so a crashing renderer fails one request instead of
/// taking down the thread that ran it.
pub fn render_contained<R: MarkdownRenderer + ?Sized>(
    renderer: &R,
    text: &str,
) -> Result<String, RenderError> {
    catch_unwind(AssertUnwindSafe(|| renderer.render(text))).unwrap_or_else(|payload| {
        let detail = payload
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "renderer panicked".to_string());
        Err(RenderError::Conversion(detail))
    })
}
