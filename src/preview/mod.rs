//! The preview's display state.
//!
//! [`PreviewSurface`] stores the last committed HTML exactly as the renderer
//! produced it. It performs no sanitization: whatever reaches
//! [`PreviewSurface::set_output`] is trusted, and a host that renders
//! untrusted markdown must sanitize before committing or display the HTML
//! as text (the terminal app does the latter).

/// Holds the latest committed HTML and tracks when it changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewSurface {
    html: String,
    revision: u64,
    observed_revision: u64,
}

impl PreviewSurface {
    /// An empty surface, as shown before the first render commits.
    pub const fn new() -> Self {
        Self {
            html: String::new(),
            revision: 0,
            observed_revision: 0,
        }
    }

    /// Replace the displayed HTML.
    ///
    /// Returns `true` if the stored HTML changed. Committing identical HTML
    /// leaves the revision untouched so observers do not redraw.
    pub fn set_output(&mut self, html: String) -> bool {
        if html == self.html {
            return false;
        }
        self.html = html;
        self.revision += 1;
        true
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub const fn is_empty(&self) -> bool {
        self.html.is_empty()
    }

    /// Number of changes committed since the surface was mounted.
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns `true` once for every change since the last call.
    pub const fn take_changed(&mut self) -> bool {
        let changed = self.observed_revision != self.revision;
        self.observed_revision = self.revision;
        changed
    }
}
