//! Opt-in timing scopes and the render debug event log.
//!
//! Timing scopes report through `tracing` under the `markpane::perf` target
//! when enabled with `--perf`. The debug log is a plain text file of
//! timestamped pipeline events (schedule, cancel, commit, discard), written
//! only when a path was configured.
//!
//! [`log_filter`] and [`log_writer`] configure the process-wide `tracing`
//! subscriber installed in `main`.

use std::fs::File;
use std::io::{BufWriter, IsTerminal, Stderr, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::writer::OptionalWriter;

/// Environment variable naming a render debug log file.
pub const DEBUG_LOG_ENV: &str = "MARKPANE_RENDER_DEBUG_LOG";

static ENABLED: AtomicBool = AtomicBool::new(false);
static DEBUG_LOG_ON: AtomicBool = AtomicBool::new(false);
static TERMINAL_ACTIVE: AtomicBool = AtomicBool::new(false);
static DEBUG_LOG: LazyLock<Mutex<DebugLog>> = LazyLock::new(|| Mutex::new(DebugLog::closed()));

#[derive(Debug)]
pub struct Scope {
    name: &'static str,
    start: Instant,
}

impl Drop for Scope {
    fn drop(&mut self) {
        if !is_enabled() {
            return;
        }
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        tracing::info!(target: "markpane::perf", scope = self.name, elapsed_ms, "timing");
    }
}

#[derive(Debug)]
struct DebugLog {
    start: Instant,
    writer: Option<BufWriter<File>>,
}

impl DebugLog {
    fn closed() -> Self {
        Self {
            start: Instant::now(),
            writer: None,
        }
    }
}

fn debug_log() -> MutexGuard<'static, DebugLog> {
    DEBUG_LOG.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Time the enclosing block; reported when the guard drops.
pub fn scope(name: &'static str) -> Scope {
    Scope {
        name,
        start: Instant::now(),
    }
}

/// Subscriber filter: warnings by default, timing scopes too with `--perf`.
///
/// `RUST_LOG` directives are honoured on top.
///
/// # Errors
/// Returns an error if the timing directive fails to parse.
pub fn log_filter(perf: bool) -> Result<EnvFilter, ParseError> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into());
    if perf {
        return Ok(filter.add_directive("markpane::perf=info".parse()?));
    }
    Ok(filter)
}

/// Record whether the full-screen UI currently owns the terminal.
pub fn set_terminal_active(active: bool) {
    TERMINAL_ACTIVE.store(active, Ordering::Relaxed);
}

/// Where log lines go: stderr, except while the UI is drawn on it.
///
/// A redirected stderr (`2>markpane.log`) keeps receiving everything.
pub fn log_writer() -> OptionalWriter<Stderr> {
    let stderr = std::io::stderr();
    if TERMINAL_ACTIVE.load(Ordering::Relaxed) && stderr.is_terminal() {
        OptionalWriter::none()
    } else {
        OptionalWriter::some(stderr)
    }
}

/// Open (or with `None`, close) the render debug log.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn set_debug_log_path(path: Option<&Path>) -> std::io::Result<()> {
    let mut log = debug_log();
    match path {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            writeln!(writer, "markpane render debug log start")?;
            writer.flush()?;
            log.start = Instant::now();
            log.writer = Some(writer);
            DEBUG_LOG_ON.store(true, Ordering::Relaxed);
        }
        None => {
            if let Some(mut writer) = log.writer.take() {
                writer.flush()?;
            }
            DEBUG_LOG_ON.store(false, Ordering::Relaxed);
        }
    }
    Ok(())
}

pub fn is_debug_log_enabled() -> bool {
    DEBUG_LOG_ON.load(Ordering::Relaxed)
}

/// Append one event line to the debug log, if it is open.
pub fn log_event(name: &str, detail: impl AsRef<str>) {
    if !is_debug_log_enabled() {
        return;
    }
    let mut log = debug_log();
    let elapsed_ms = log.start.elapsed().as_secs_f64() * 1000.0;
    if let Some(writer) = log.writer.as_mut() {
        let _ = writeln!(writer, "[{elapsed_ms:>10.3} ms] {name}: {}", detail.as_ref());
        let _ = writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_set_enabled_toggles_runtime_flag() {
        set_enabled(true);
        assert!(is_enabled());
        set_enabled(false);
        assert!(!is_enabled());
    }

    #[test]
    fn test_perf_flag_adds_timing_directive() {
        let with_perf = log_filter(true).unwrap().to_string();
        assert!(with_perf.contains("markpane::perf=info"), "got {with_perf}");
        let without = log_filter(false).unwrap().to_string();
        assert!(!without.contains("markpane::perf"), "got {without}");
    }

    #[test]
    fn test_log_writer_writes_to_stderr_while_ui_is_down() {
        set_terminal_active(false);
        assert!(matches!(
            log_writer(),
            tracing_subscriber::fmt::writer::EitherWriter::A(_)
        ));
    }

    #[test]
    fn test_debug_log_records_events_until_closed() {
        let file = NamedTempFile::new().unwrap();
        set_debug_log_path(Some(file.path())).unwrap();
        assert!(is_debug_log_enabled());
        log_event("render.commit", "seq=3 changed=true");
        set_debug_log_path(None).unwrap();
        log_event("render.commit", "after close");

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert!(content.starts_with("markpane render debug log start"));
        assert!(content.contains("render.commit: seq=3 changed=true"));
        assert!(!content.contains("after close"));
    }
}
