//! The host-facing markdown editor widget.
//!
//! [`MarkdownEditor`] ties one string field of a [`TextStore`] to an
//! editing surface and a live preview. Hosts drive it with explicit
//! timestamps: input events go through the `*_changed` and toolbar methods,
//! and [`MarkdownEditor::tick`] is called from the event loop to fire the
//! render timer and collect finished conversions.

use std::path::Path;

use crate::editor::{EditorBuffer, EditorHandle, ToolbarCommand, image_markdown, toolbar};
use crate::layout::{LayoutState, Pane, SPLIT_MIN_WIDTH};
use crate::preview::PreviewSurface;
use crate::render::{DebouncedRenderer, QUIET_PERIOD_MS, RenderExecutor};
use crate::store::{StoreError, TextStore};
use crate::sync::{ProposeOutcome, SyncController, TickReport};

/// Host configuration for a [`MarkdownEditor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorOptions {
    /// The string field the editor edits.
    pub update_key: String,
    /// Whether a preview is mounted at all.
    pub preview: bool,
    pub quiet_period_ms: u64,
    /// Widths below this show one pane at a time.
    pub split_min_width: u16,
}

impl EditorOptions {
    pub fn new(update_key: impl Into<String>) -> Self {
        Self {
            update_key: update_key.into(),
            preview: true,
            quiet_period_ms: QUIET_PERIOD_MS,
            split_min_width: SPLIT_MIN_WIDTH,
        }
    }

    #[must_use]
    pub const fn with_preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    #[must_use]
    pub const fn with_quiet_period(mut self, ms: u64) -> Self {
        self.quiet_period_ms = ms;
        self
    }

    #[must_use]
    pub const fn with_split_min_width(mut self, width: u16) -> Self {
        self.split_min_width = width;
        self
    }
}

pub struct MarkdownEditor<S, E> {
    store: S,
    options: EditorOptions,
    sync: SyncController<E>,
    layout: LayoutState,
    editor: EditorHandle<EditorBuffer>,
    live: bool,
}

impl<S: TextStore, E: RenderExecutor> MarkdownEditor<S, E> {
    /// Mount the widget over `store`.
    ///
    /// The layout is computed from `viewport_width` and, if the preview is
    /// enabled and visible, a first render of the current text is scheduled.
    ///
    /// # Errors
    /// Fails if `options.update_key` does not name a string field.
    pub fn mount(
        store: S,
        options: EditorOptions,
        executor: E,
        viewport_width: u16,
        now_ms: u64,
    ) -> Result<Self, StoreError> {
        if !store.has_text_field(&options.update_key) {
            return Err(StoreError::NotATextField {
                key: options.update_key,
            });
        }
        let renderer = DebouncedRenderer::with_quiet_period(executor, options.quiet_period_ms);
        let layout = LayoutState::with_threshold(viewport_width, options.split_min_width);
        let mut widget = Self {
            store,
            options,
            sync: SyncController::new(renderer),
            layout,
            editor: EditorHandle::new(),
            live: true,
        };
        widget.reconcile_preview(now_ms);
        tracing::debug!(key = %widget.options.update_key, mode = ?widget.layout.mode(), "editor mounted");
        Ok(widget)
    }

    /// The current authoritative text.
    pub fn text(&self) -> &str {
        self.store.text(&self.options.update_key).unwrap_or_default()
    }

    /// Install the editing surface once it is ready.
    ///
    /// The surface is loaded with the stored text, and a non-empty text is
    /// synchronized to the preview right away.
    pub fn attach_editor(&mut self, mut buffer: EditorBuffer, now_ms: u64) {
        if !self.live {
            return;
        }
        let text = self.text().to_string();
        if buffer.text() != text {
            buffer.set_text(&text);
        }
        self.editor.attach(buffer);
        if !text.is_empty() {
            self.sync.sync_now(&text, now_ms);
        }
    }

    /// Push the editing surface's text upstream through the size guard.
    ///
    /// A dropped edit resets the surface to the stored text. With no surface
    /// attached there is nothing to propose and the result is `Dropped`.
    pub fn editor_changed(&mut self, now_ms: u64) -> ProposeOutcome {
        let Some(proposed) = self.editor.get().map(EditorBuffer::text) else {
            return ProposeOutcome::Dropped;
        };
        if !self.live {
            return ProposeOutcome::Dropped;
        }
        let key = &self.options.update_key;
        let current = self.store.text(key).unwrap_or_default();
        let outcome = self.sync.propose(current, proposed);
        match &outcome {
            ProposeOutcome::Forward(value) => {
                self.store.update(key, value.clone());
                self.sync.observe(value, now_ms);
            }
            ProposeOutcome::Dropped => {
                let current = current.to_string();
                self.editor.with_mut(|buffer| buffer.set_text(&current));
            }
        }
        outcome
    }

    /// Route a toolbar command to the editing surface, then commit.
    pub fn apply_toolbar(&mut self, command: ToolbarCommand, now_ms: u64) -> ProposeOutcome {
        let markup = command.markup();
        if self
            .editor
            .with_mut(|buffer| toolbar::apply(buffer, markup))
            .is_none()
        {
            return ProposeOutcome::Dropped;
        }
        self.editor_changed(now_ms)
    }

    /// Insert a markdown reference to a picked image, then commit.
    pub fn insert_image(&mut self, path: &Path, now_ms: u64) -> ProposeOutcome {
        let reference = image_markdown(path);
        if self
            .editor
            .with_mut(|buffer| buffer.insert_str(&reference))
            .is_none()
        {
            return ProposeOutcome::Dropped;
        }
        self.editor_changed(now_ms)
    }

    /// The host changed the record; reload the surface and re-render.
    pub fn data_changed(&mut self, now_ms: u64) -> bool {
        if !self.live {
            return false;
        }
        let text = self.text().to_string();
        self.editor.with_mut(|buffer| {
            if buffer.text() != text {
                buffer.set_text(&text);
            }
        });
        self.sync.observe(&text, now_ms)
    }

    /// Render the current text now, skipping the quiet period.
    pub fn sync_now(&mut self, now_ms: u64) -> bool {
        if !self.live {
            return false;
        }
        let text = self.store.text(&self.options.update_key).unwrap_or_default();
        self.sync.sync_now(text, now_ms)
    }

    /// Returns `true` if the layout mode changed.
    pub fn resize(&mut self, width: u16, now_ms: u64) -> bool {
        let changed = self.layout.on_resize(width);
        if changed {
            self.reconcile_preview(now_ms);
        }
        changed
    }

    pub fn select_tab(&mut self, pane: Pane, now_ms: u64) -> bool {
        if !self.live {
            return false;
        }
        let changed = self.layout.select_tab(pane);
        if changed {
            self.reconcile_preview(now_ms);
        }
        changed
    }

    /// Fire an expired render timer and commit finished conversions.
    pub fn tick(&mut self, now_ms: u64) -> TickReport {
        if !self.live {
            return TickReport::default();
        }
        self.sync.tick(now_ms)
    }

    /// Stop everything: resizes are ignored, render work is cancelled, the
    /// preview and the editing surface are released.
    pub fn teardown(&mut self) {
        if !self.live {
            return;
        }
        self.live = false;
        self.layout.teardown();
        self.sync.unmount_preview();
        self.editor.detach();
        tracing::debug!("editor torn down");
    }

    pub const fn is_live(&self) -> bool {
        self.live
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access for host-side changes; follow with [`Self::data_changed`].
    pub const fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub const fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub const fn layout(&self) -> &LayoutState {
        &self.layout
    }

    pub const fn preview(&self) -> Option<&PreviewSurface> {
        self.sync.preview()
    }

    pub const fn preview_mut(&mut self) -> Option<&mut PreviewSurface> {
        self.sync.preview_mut()
    }

    pub const fn editor(&self) -> Option<&EditorBuffer> {
        self.editor.get()
    }

    /// The live editing surface; follow edits with [`Self::editor_changed`].
    pub const fn editor_mut(&mut self) -> Option<&mut EditorBuffer> {
        self.editor.get_mut()
    }

    pub const fn sync(&self) -> &SyncController<E> {
        &self.sync
    }

    fn reconcile_preview(&mut self, now_ms: u64) {
        let wanted = self.live && self.options.preview && self.layout.is_visible(Pane::Preview);
        if wanted == self.sync.is_preview_mounted() {
            return;
        }
        if wanted {
            let text = self.store.text(&self.options.update_key).unwrap_or_default();
            self.sync.mount_preview(text, now_ms);
        } else {
            self.sync.unmount_preview();
        }
    }
}

impl<S, E> std::fmt::Debug for MarkdownEditor<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkdownEditor")
            .field("options", &self.options)
            .field("layout", &self.layout)
            .field("editor_attached", &self.editor.is_attached())
            .field("live", &self.live)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{InlineExecutor, RenderError};
    use crate::store::Record;
    use crate::sync::MAX_TEXT_LEN;

    type EchoFn = fn(&str) -> Result<String, RenderError>;
    type TestEditor<S> = MarkdownEditor<S, InlineExecutor<EchoFn>>;

    fn echo(text: &str) -> Result<String, RenderError> {
        Ok(format!("<p>{text}</p>"))
    }

    /// Counts `update` calls, standing in for the host's update callback.
    #[derive(Debug, Default)]
    struct CountingStore {
        record: Record,
        updates: usize,
    }

    impl TextStore for CountingStore {
        fn text(&self, key: &str) -> Option<&str> {
            self.record.text(key)
        }

        fn update(&mut self, key: &str, value: String) {
            self.updates += 1;
            self.record.update(key, value);
        }
    }

    fn counting(text: &str) -> CountingStore {
        CountingStore {
            record: Record::with_text("body", text),
            updates: 0,
        }
    }

    fn mount<S: TextStore>(store: S, width: u16) -> TestEditor<S> {
        MarkdownEditor::mount(
            store,
            EditorOptions::new("body"),
            InlineExecutor::new(echo as EchoFn),
            width,
            0,
        )
        .unwrap()
    }

    fn type_char<S: TextStore>(widget: &mut TestEditor<S>, ch: char, now: u64) -> ProposeOutcome {
        widget.editor_mut().unwrap().insert_char(ch);
        widget.editor_changed(now)
    }

    fn preview_html<S: TextStore>(widget: &TestEditor<S>) -> Option<&str> {
        widget.preview().map(PreviewSurface::html)
    }

    #[test]
    fn test_mount_rejects_missing_field() {
        let err = MarkdownEditor::mount(
            Record::new(),
            EditorOptions::new("body"),
            InlineExecutor::new(echo as EchoFn),
            1200,
            0,
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::NotATextField { key } if key == "body"));
    }

    #[test]
    fn test_burst_of_keystrokes_commits_only_final_text() {
        let mut widget = mount(counting(""), 1200);
        widget.attach_editor(EditorBuffer::default(), 0);

        type_char(&mut widget, 'a', 0);
        widget.tick(0);
        type_char(&mut widget, 'b', 50);
        widget.tick(50);
        type_char(&mut widget, 'c', 100);
        widget.tick(100);
        assert_eq!(preview_html(&widget), Some(""));

        assert!(!widget.tick(399).committed());
        assert!(widget.tick(400).committed());
        assert_eq!(preview_html(&widget), Some("<p>abc</p>"));
        assert_eq!(widget.preview().map(PreviewSurface::revision), Some(1));
        assert_eq!(widget.store().updates, 3);
    }

    #[test]
    fn test_oversized_buffer_drops_edit_and_resets_surface() {
        let original = "x".repeat(MAX_TEXT_LEN + 1);
        let mut widget = mount(counting(&original), 1200);
        widget.attach_editor(EditorBuffer::default(), 0);
        widget.editor_mut().unwrap().move_to_end();

        assert_eq!(type_char(&mut widget, 'y', 10), ProposeOutcome::Dropped);
        assert_eq!(widget.store().updates, 0);
        assert_eq!(widget.text().chars().count(), MAX_TEXT_LEN + 1);
        assert_eq!(widget.editor().map(EditorBuffer::text), Some(original));
    }

    #[test]
    fn test_paste_past_cap_is_accepted_then_next_edit_dropped() {
        let mut widget = mount(counting("start"), 1200);
        widget.attach_editor(EditorBuffer::default(), 0);
        widget
            .editor_mut()
            .unwrap()
            .insert_str(&"p".repeat(MAX_TEXT_LEN * 2));
        assert!(matches!(widget.editor_changed(5), ProposeOutcome::Forward(_)));
        assert_eq!(type_char(&mut widget, 'z', 6), ProposeOutcome::Dropped);
        assert_eq!(widget.store().updates, 1);
    }

    #[test]
    fn test_attach_loads_store_text_and_syncs_immediately() {
        let mut widget = mount(counting("# Title"), 1200);
        widget.attach_editor(EditorBuffer::from_text("stale"), 5);
        assert_eq!(widget.editor().map(EditorBuffer::text), Some("# Title".to_string()));
        assert!(widget.tick(5).committed());
        assert_eq!(preview_html(&widget), Some("<p># Title</p>"));
    }

    #[test]
    fn test_attach_with_empty_text_waits_for_timer() {
        let mut widget = mount(counting(""), 1200);
        widget.attach_editor(EditorBuffer::default(), 0);
        assert!(widget.tick(0).outcomes.is_empty());
    }

    #[test]
    fn test_preview_disabled_never_renders() {
        let mut widget = MarkdownEditor::mount(
            counting("text"),
            EditorOptions::new("body").with_preview(false),
            InlineExecutor::new(echo as EchoFn),
            1200,
            0,
        )
        .unwrap();
        widget.attach_editor(EditorBuffer::default(), 0);
        type_char(&mut widget, '!', 10);
        assert!(widget.preview().is_none());
        assert_eq!(widget.tick(10_000), TickReport::default());
        assert_eq!(widget.store().updates, 1);
    }

    #[test]
    fn test_tabbed_mode_mounts_preview_only_on_its_tab() {
        let mut widget = mount(counting("hi"), 800);
        assert!(widget.preview().is_none());
        assert!(widget.select_tab(Pane::Preview, 10));
        assert!(widget.preview().is_some_and(PreviewSurface::is_empty));
        widget.tick(310);
        assert_eq!(preview_html(&widget), Some("<p>hi</p>"));
        assert!(widget.select_tab(Pane::Editor, 400));
        assert!(widget.preview().is_none());
    }

    #[test]
    fn test_switching_tab_mid_burst_cancels_render() {
        let mut widget = mount(counting("a"), 800);
        widget.select_tab(Pane::Preview, 0);
        widget.select_tab(Pane::Editor, 100);
        assert!(!widget.sync().renderer().is_busy());
        assert!(widget.tick(1_000).outcomes.is_empty());
    }

    #[test]
    fn test_resize_between_layouts() {
        let mut widget = mount(counting("a"), 1500);
        assert!(widget.layout().is_split());
        assert!(widget.resize(999, 10));
        assert!(widget.preview().is_none());
        assert!(widget.resize(1000, 20));
        assert!(widget.preview().is_some());
    }

    #[test]
    fn test_toolbar_routes_to_surface_and_commits() {
        let mut widget = mount(counting("word"), 1200);
        widget.attach_editor(EditorBuffer::default(), 0);
        let outcome = widget.apply_toolbar(ToolbarCommand::Quote, 10);
        assert_eq!(outcome, ProposeOutcome::Forward("> word".to_string()));
        assert_eq!(widget.text(), "> word");
    }

    #[test]
    fn test_toolbar_without_surface_does_nothing() {
        let mut widget = mount(counting("word"), 1200);
        assert_eq!(
            widget.apply_toolbar(ToolbarCommand::Bold, 0),
            ProposeOutcome::Dropped
        );
        assert_eq!(widget.store().updates, 0);
    }

    #[test]
    fn test_insert_image_writes_reference() {
        let mut widget = mount(counting(""), 1200);
        widget.attach_editor(EditorBuffer::default(), 0);
        widget.insert_image(Path::new("pics/dog.png"), 10);
        assert_eq!(widget.text(), "![dog](pics/dog.png)");
    }

    #[test]
    fn test_data_changed_reloads_surface_and_reschedules() {
        let mut widget = mount(counting("old"), 1200);
        widget.attach_editor(EditorBuffer::default(), 0);
        widget.tick(0);
        widget.store_mut().record.update("body", "new".to_string());
        assert!(widget.data_changed(100));
        assert_eq!(widget.editor().map(EditorBuffer::text), Some("new".to_string()));
        widget.tick(400);
        assert_eq!(preview_html(&widget), Some("<p>new</p>"));
    }

    #[test]
    fn test_teardown_stops_everything() {
        let mut widget = mount(counting("a"), 1200);
        widget.attach_editor(EditorBuffer::default(), 0);
        widget.store_mut().record.update("body", "b".to_string());
        widget.data_changed(10);
        widget.teardown();

        assert!(!widget.is_live());
        assert!(widget.editor().is_none());
        assert!(widget.preview().is_none());
        assert!(!widget.resize(10, 20));
        assert_eq!(widget.tick(10_000), TickReport::default());
        assert!(!widget.sync_now(20));
    }
}
