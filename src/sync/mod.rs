//! Keeps the preview in step with the authoritative text.
//!
//! [`SyncController`] decides when the renderer runs (text changes, preview
//! mount and unmount, the sync-now trigger) and guards the path that
//! proposes editor text back to the store.

use crate::preview::PreviewSurface;
use crate::render::{DebouncedRenderer, RenderExecutor, RenderOutcome};

/// Once the stored text reaches this many characters, further edits are
/// dropped.
pub const MAX_TEXT_LEN: usize = 2500;

/// Rejects edits once the current text is at or past a length cap.
///
/// The check looks at the text already stored, not at the proposed value: a
/// single paste may push the text past the cap, and the edit after that is
/// the first one refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeGuard {
    max_len: usize,
}

impl SizeGuard {
    pub const fn new(max_len: usize) -> Self {
        Self { max_len }
    }

    pub const fn max_len(&self) -> usize {
        self.max_len
    }

    /// Length of `text` in the unit the cap is expressed in (chars).
    pub fn measure(text: &str) -> usize {
        text.chars().count()
    }

    /// Whether an edit may be applied on top of `current`.
    pub fn admits(&self, current: &str) -> bool {
        Self::measure(current) < self.max_len
    }
}

impl Default for SizeGuard {
    fn default() -> Self {
        Self::new(MAX_TEXT_LEN)
    }
}

/// Result of proposing editor text to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposeOutcome {
    /// The value should be written to the store.
    Forward(String),
    /// The size guard refused the edit. Not an error.
    Dropped,
}

/// What one [`SyncController::tick`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Sequence number of a request issued by the quiet-period timer.
    pub fired: Option<u64>,
    pub outcomes: Vec<RenderOutcome>,
}

impl TickReport {
    /// Whether any completion committed new display state.
    pub fn committed(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o, RenderOutcome::Committed { .. }))
    }

    pub fn failures(&self) -> impl Iterator<Item = &crate::render::RenderError> {
        self.outcomes.iter().filter_map(|o| match o {
            RenderOutcome::Failed { error, .. } => Some(error),
            _ => None,
        })
    }
}

/// Drives a [`DebouncedRenderer`] from observed text and owns the preview.
#[derive(Debug)]
pub struct SyncController<E> {
    renderer: DebouncedRenderer<E>,
    preview: Option<PreviewSurface>,
    observed: Option<String>,
    guard: SizeGuard,
}

impl<E: RenderExecutor> SyncController<E> {
    pub fn new(renderer: DebouncedRenderer<E>) -> Self {
        Self {
            renderer,
            preview: None,
            observed: None,
            guard: SizeGuard::default(),
        }
    }

    #[must_use]
    pub const fn with_guard(mut self, guard: SizeGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Mount an empty preview and schedule a render of `text`.
    ///
    /// Does nothing when the preview is already mounted.
    pub fn mount_preview(&mut self, text: &str, now_ms: u64) {
        if self.preview.is_some() {
            return;
        }
        tracing::debug!("preview mounted");
        self.preview = Some(PreviewSurface::new());
        self.observed = Some(text.to_string());
        self.renderer.schedule(text, now_ms);
    }

    /// Cancel all render work, then drop the preview.
    pub fn unmount_preview(&mut self) {
        self.renderer.cancel();
        if self.preview.take().is_some() {
            tracing::debug!("preview unmounted");
        }
    }

    /// React to the current authoritative text.
    ///
    /// Only a change from the last observed value reschedules; the previous
    /// render subscription is cancelled before the new one is scheduled.
    pub fn observe(&mut self, text: &str, now_ms: u64) -> bool {
        if self.observed.as_deref() == Some(text) {
            return false;
        }
        self.observed = Some(text.to_string());
        if self.preview.is_none() {
            return false;
        }
        self.renderer.cancel();
        self.renderer.schedule(text, now_ms);
        true
    }

    /// Run one render cycle immediately, skipping the quiet period.
    ///
    /// Only applies to a mounted preview with non-empty text.
    pub fn sync_now(&mut self, text: &str, now_ms: u64) -> bool {
        if self.preview.is_none() || text.is_empty() {
            return false;
        }
        self.observed = Some(text.to_string());
        self.renderer.render_now(text, now_ms);
        true
    }

    /// Fire an expired timer, then commit whatever conversions finished.
    pub fn tick(&mut self, now_ms: u64) -> TickReport {
        let fired = self.renderer.poll(now_ms);
        let outcomes = self.renderer.drain(self.preview.as_mut());
        TickReport { fired, outcomes }
    }

    /// Apply the size guard to an edit of `current` into `proposed`.
    pub fn propose(&self, current: &str, proposed: String) -> ProposeOutcome {
        if self.guard.admits(current) {
            ProposeOutcome::Forward(proposed)
        } else {
            tracing::trace!(
                current_len = SizeGuard::measure(current),
                max = self.guard.max_len(),
                "edit dropped by size guard"
            );
            ProposeOutcome::Dropped
        }
    }

    pub const fn preview(&self) -> Option<&PreviewSurface> {
        self.preview.as_ref()
    }

    pub const fn preview_mut(&mut self) -> Option<&mut PreviewSurface> {
        self.preview.as_mut()
    }

    pub const fn is_preview_mounted(&self) -> bool {
        self.preview.is_some()
    }

    pub const fn renderer(&self) -> &DebouncedRenderer<E> {
        &self.renderer
    }

    pub const fn renderer_mut(&mut self) -> &mut DebouncedRenderer<E> {
        &mut self.renderer
    }

    pub const fn guard(&self) -> SizeGuard {
        self.guard
    }
}
