//! Watches the record file for changes made by other programs.
//!
//! The parent directory is watched non-recursively, since editors often
//! save by replacing the file. Bursts of events settle through the same
//! time-injected [`Debouncer`] the render pipeline uses.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::render::Debouncer;

/// Quiet period before a burst of file events is reported.
pub const WATCH_DEBOUNCE_MS: u64 = 200;

pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    events: Receiver<notify::Result<Event>>,
    root: PathBuf,
    target: PathBuf,
    target_name: Option<OsString>,
    settle: Debouncer<()>,
}

impl FileWatcher {
    /// Start watching `path`.
    ///
    /// # Errors
    /// Returns an error if the platform watcher cannot be created or the
    /// directory cannot be watched.
    pub fn new(path: impl AsRef<Path>, debounce_ms: u64) -> notify::Result<Self> {
        let path = path.as_ref();
        // Backends report canonical paths.
        let target = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let target_name = target.file_name().map(ToOwned::to_owned);
        let root = watch_root_for(&target);

        let (tx, events) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&root, RecursiveMode::NonRecursive)?;
        tracing::debug!(target = %target.display(), root = %root.display(), "watching file");

        Ok(Self {
            _watcher: watcher,
            events,
            root,
            target,
            target_name,
            settle: Debouncer::new(debounce_ms),
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Drain pending events; returns `true` once a burst has settled.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        let mut relevant = 0u32;
        while let Ok(event) = self.events.try_recv() {
            match event {
                Ok(event) if self.is_relevant(&event) => relevant += 1,
                Ok(event) => crate::perf::log_event(
                    "watcher.irrelevant",
                    format!("kind={:?} paths={:?}", event.kind, event.paths),
                ),
                Err(err) => tracing::warn!(%err, "file watcher error"),
            }
        }
        if relevant > 0 {
            crate::perf::log_event("watcher.events", format!("relevant={relevant}"));
            self.settle.queue((), now_ms);
        }
        self.settle.take_ready(now_ms).is_some()
    }

    /// When a settled change will be reported, if one is pending.
    pub fn deadline_ms(&self) -> Option<u64> {
        self.settle.deadline_ms()
    }

    fn is_relevant(&self, event: &Event) -> bool {
        event.paths.iter().any(|path| {
            path == &self.root
                || path == &self.target
                || self
                    .target_name
                    .as_ref()
                    .is_some_and(|name| path.file_name() == Some(name.as_os_str()))
        })
    }
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("target", &self.target)
            .field("root", &self.root)
            .field("settle", &self.settle)
            .finish_non_exhaustive()
    }
}

fn watch_root_for(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}
