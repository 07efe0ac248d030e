//! Split vs tabbed presentation.
//!
//! Wide viewports show the editor and preview side by side; narrow ones
//! show one pane at a time behind tabs. The mode is recomputed on every
//! resize, with no debouncing, for as long as the layout is live.

/// Viewport widths at or above this use the split layout.
pub const SPLIT_MIN_WIDTH: u16 = 1000;

/// One of the two panes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pane {
    #[default]
    Editor,
    Preview,
}

impl Pane {
    pub const fn other(self) -> Self {
        match self {
            Self::Editor => Self::Preview,
            Self::Preview => Self::Editor,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Editor => "Editor",
            Self::Preview => "Preview",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    /// Both panes mounted and visible.
    Split,
    /// Exactly one pane mounted and visible.
    Tabbed { active: Pane },
}

/// Per-widget layout state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutState {
    mode: LayoutMode,
    threshold: u16,
    /// The tab the user picked last; survives trips through split mode.
    tab: Pane,
    live: bool,
}

impl LayoutState {
    /// Compute the initial mode from the viewport width.
    pub fn new(width: u16) -> Self {
        Self::with_threshold(width, SPLIT_MIN_WIDTH)
    }

    pub fn with_threshold(width: u16, threshold: u16) -> Self {
        let tab = Pane::default();
        Self {
            mode: mode_for(width, threshold, tab),
            threshold,
            tab,
            live: true,
        }
    }

    pub const fn mode(&self) -> LayoutMode {
        self.mode
    }

    pub const fn threshold(&self) -> u16 {
        self.threshold
    }

    pub const fn is_split(&self) -> bool {
        matches!(self.mode, LayoutMode::Split)
    }

    /// Re-evaluate for a new viewport width.
    ///
    /// Returns `true` if the mode changed. Ignored after [`Self::teardown`].
    pub fn on_resize(&mut self, width: u16) -> bool {
        if !self.live {
            return false;
        }
        let next = mode_for(width, self.threshold, self.tab);
        if next == self.mode {
            return false;
        }
        tracing::debug!(width, ?next, "layout mode changed");
        self.mode = next;
        true
    }

    /// Pick the tab to show in tabbed mode.
    ///
    /// In split mode the choice is remembered for the next switch to tabs.
    pub fn select_tab(&mut self, pane: Pane) -> bool {
        self.tab = pane;
        match self.mode {
            LayoutMode::Tabbed { active } if active != pane => {
                self.mode = LayoutMode::Tabbed { active: pane };
                true
            }
            _ => false,
        }
    }

    pub const fn selected_tab(&self) -> Pane {
        self.tab
    }

    pub const fn is_visible(&self, pane: Pane) -> bool {
        match self.mode {
            LayoutMode::Split => true,
            LayoutMode::Tabbed { active } => matches!(
                (active, pane),
                (Pane::Editor, Pane::Editor) | (Pane::Preview, Pane::Preview)
            ),
        }
    }

    /// Stop reacting to resizes.
    pub const fn teardown(&mut self) {
        self.live = false;
    }

    pub const fn is_live(&self) -> bool {
        self.live
    }
}

const fn mode_for(width: u16, threshold: u16, tab: Pane) -> LayoutMode {
    if width < threshold {
        LayoutMode::Tabbed { active: tab }
    } else {
        LayoutMode::Split
    }
}
