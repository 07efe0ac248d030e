use std::io::{Write, stdout};

use base64::Engine;

use crate::app::{App, Message, Model, ToastLevel};
use crate::watcher::{FileWatcher, WATCH_DEBOUNCE_MS};

impl App {
    pub(super) fn make_file_watcher(model: &Model) -> notify::Result<FileWatcher> {
        FileWatcher::new(model.file_path(), WATCH_DEBOUNCE_MS)
    }

    pub(super) fn handle_message_side_effects(
        model: &mut Model,
        file_watcher: &mut Option<FileWatcher>,
        msg: &Message,
        now_ms: u64,
    ) {
        match msg {
            Message::Save => save(model),
            Message::CopyHtml => copy_html(model),
            Message::ToggleWatch => {
                if model.watch_enabled {
                    match Self::make_file_watcher(model) {
                        Ok(watcher) => {
                            *file_watcher = Some(watcher);
                            model.show_toast(ToastLevel::Info, "Watching file changes");
                        }
                        Err(err) => {
                            model.watch_enabled = false;
                            *file_watcher = None;
                            model.show_toast(
                                ToastLevel::Warning,
                                format!("Watch unavailable: {err}"),
                            );
                            crate::perf::log_event(
                                "watcher.error",
                                format!("failed path={} err={err}", model.file_path().display()),
                            );
                        }
                    }
                } else {
                    *file_watcher = None;
                    model.show_toast(ToastLevel::Info, "Watch disabled");
                }
            }
            Message::FileChanged => reload(model, now_ms),
            _ => {}
        }
    }
}

fn save(model: &mut Model) {
    match model.widget.store_mut().save() {
        Ok(()) => {
            if let Some(buffer) = model.widget.editor_mut() {
                buffer.mark_clean();
            }
            let name = model
                .file_path()
                .file_name()
                .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
            model.show_toast(ToastLevel::Info, format!("Saved {name}"));
        }
        Err(err) => {
            tracing::warn!(%err, "save failed");
            model.show_toast(ToastLevel::Error, format!("Save failed: {err}"));
        }
    }
}

/// Pull in a change another program made to the file.
///
/// Local edits win: an unsaved record is left alone and the user is told.
fn reload(model: &mut Model, now_ms: u64) {
    if model.has_unsaved_changes() {
        model.show_toast(
            ToastLevel::Warning,
            "File changed on disk; save to overwrite or quit to discard",
        );
        return;
    }
    match model.widget.store_mut().reload() {
        Ok(false) => {}
        Ok(true) => {
            model.widget.data_changed(now_ms);
            model.widget.sync_now(now_ms);
            if let Some(buffer) = model.widget.editor_mut() {
                buffer.mark_clean();
            }
            model.show_toast(ToastLevel::Info, "Reloaded from disk");
        }
        Err(err) => {
            model.show_toast(ToastLevel::Error, format!("Reload failed: {err}"));
            crate::perf::log_event(
                "reload.error",
                format!("failed path={} err={err}", model.file_path().display()),
            );
        }
    }
}

fn copy_html(model: &mut Model) {
    let Some(preview) = model.widget.preview() else {
        model.show_toast(ToastLevel::Warning, "Preview is not mounted");
        return;
    };
    let html = preview.html().to_string();
    if html.is_empty() {
        model.show_toast(ToastLevel::Info, "Nothing rendered yet");
        return;
    }
    match copy_to_clipboard_osc52(&html) {
        Ok(()) => model.show_toast(ToastLevel::Info, format!("Copied {} bytes of HTML", html.len())),
        Err(err) => model.show_toast(ToastLevel::Error, format!("Copy failed: {err}")),
    }
}

fn copy_to_clipboard_osc52(text: &str) -> std::io::Result<()> {
    let osc = osc52_sequence(text);
    let mut out = stdout();
    out.write_all(osc.as_bytes())?;
    out.flush()
}

fn osc52_sequence(text: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{encoded}\x07")
}
