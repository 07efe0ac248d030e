use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, DisableBracketedPaste, EnableBracketedPaste};
use crossterm::execute;
use ratatui::DefaultTerminal;

use crate::app::{App, Executor, Message, Model, ToastLevel, update};
use crate::render::{ComrakRenderer, WorkerExecutor};
use crate::store::RecordFile;
use crate::watcher::FileWatcher;

/// Upper bound on an idle wait, so toasts expire on time.
const IDLE_POLL_MS: u64 = 250;

impl App {
    /// Run the main event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened as a record, the
    /// render workers cannot start, or terminal I/O fails.
    pub fn run(&mut self) -> Result<()> {
        let _run_scope = crate::perf::scope("app.run.total");

        let store = RecordFile::open(&self.file_path)
            .with_context(|| format!("Failed to open {}", self.file_path.display()))?;
        let executor: Executor = Box::new(
            WorkerExecutor::spawn(ComrakRenderer::new(), self.render_workers)
                .context("Failed to start render workers")?,
        );

        let init_scope = crate::perf::scope("app.ratatui_init");
        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal; markpane requires an interactive terminal")?;
        crate::perf::set_terminal_active(true);
        let size = match terminal.size() {
            Ok(size) => size,
            Err(err) => {
                ratatui::restore();
                crate::perf::set_terminal_active(false);
                return Err(err).context("Failed to read terminal size");
            }
        };
        drop(init_scope);

        let start = Instant::now();
        let mut model = match Model::new(
            store,
            self.editor_options(),
            executor,
            (size.width, size.height),
            elapsed_ms(start),
        ) {
            Ok(model) => model,
            Err(err) => {
                ratatui::restore();
                crate::perf::set_terminal_active(false);
                return Err(err).context("Failed to mount the editor");
            }
        };
        model.watch_enabled = self.watch_enabled;
        model
            .config_global_path
            .clone_from(&self.config_global_path);
        model.config_local_path.clone_from(&self.config_local_path);
        crate::perf::log_event(
            "init.layout",
            format!(
                "terminal={}x{} split_width={} mode={:?}",
                size.width,
                size.height,
                self.split_width,
                model.widget.layout().mode()
            ),
        );

        let _ = execute!(std::io::stdout(), EnableBracketedPaste);
        let result = Self::event_loop(&mut terminal, model, start);
        let _ = execute!(std::io::stdout(), DisableBracketedPaste);
        ratatui::restore();
        crate::perf::set_terminal_active(false);

        result
    }

    fn event_loop(terminal: &mut DefaultTerminal, mut model: Model, start: Instant) -> Result<()> {
        let mut file_watcher = if model.watch_enabled {
            match Self::make_file_watcher(&model) {
                Ok(watcher) => Some(watcher),
                Err(err) => {
                    model.watch_enabled = false;
                    model.show_toast(ToastLevel::Warning, format!("Watch unavailable: {err}"));
                    None
                }
            }
        } else {
            None
        };
        let mut frame_idx: u64 = 0;

        // The surface mounts once the terminal is up.
        model = update(model, Message::EditorReady, elapsed_ms(start));

        loop {
            let now_ms = elapsed_ms(start);
            model = update(model, Message::Tick, now_ms);

            if model.expire_toast(Instant::now()) {
                model.redraw = true;
            }

            if model.watch_enabled
                && file_watcher
                    .as_mut()
                    .is_some_and(|watcher| watcher.poll(now_ms))
            {
                model = update(model, Message::FileChanged, now_ms);
                Self::handle_message_side_effects(
                    &mut model,
                    &mut file_watcher,
                    &Message::FileChanged,
                    now_ms,
                );
            }

            if model.redraw {
                frame_idx += 1;
                let draw_start = Instant::now();
                terminal.draw(|frame| crate::ui::view(&model, frame))?;
                crate::perf::log_event(
                    "frame.draw",
                    format!(
                        "frame={} draw_ms={:.3}",
                        frame_idx,
                        draw_start.elapsed().as_secs_f64() * 1000.0
                    ),
                );
                model.redraw = false;
            }

            if model.should_quit {
                break;
            }

            let poll_ms = poll_timeout_ms(&model, file_watcher.as_ref(), elapsed_ms(start));
            if event::poll(Duration::from_millis(poll_ms))? {
                model = Self::dispatch(model, &mut file_watcher, &event::read()?, start);

                // Coalesce key repeat bursts into a single render.
                let mut drained = 0_u32;
                while event::poll(Duration::from_millis(0))? {
                    drained += 1;
                    model = Self::dispatch(model, &mut file_watcher, &event::read()?, start);
                }
                if drained > 0 {
                    crate::perf::log_event(
                        "event.drain",
                        format!("frame={frame_idx} drained={drained}"),
                    );
                }
            }
        }

        model.widget.teardown();
        Ok(())
    }

    fn dispatch(
        model: Model,
        file_watcher: &mut Option<FileWatcher>,
        event: &event::Event,
        start: Instant,
    ) -> Model {
        let Some(msg) = Self::handle_event(event, &model) else {
            return model;
        };
        let now_ms = elapsed_ms(start);
        crate::perf::log_event("event.message", format!("msg={msg:?}"));
        let mut model = update(model, msg.clone(), now_ms);
        Self::handle_message_side_effects(&mut model, file_watcher, &msg, now_ms);
        model
    }
}

/// How long the loop may block on input before something needs doing.
pub(super) fn poll_timeout_ms(model: &Model, watcher: Option<&FileWatcher>, now_ms: u64) -> u64 {
    if model.redraw {
        return 0;
    }
    let renderer = model.widget.sync().renderer();
    // A conversion is in flight; check back soon.
    if renderer.is_busy() && !renderer.has_pending_timer() {
        return 10;
    }
    [
        renderer.deadline_ms(),
        watcher.and_then(FileWatcher::deadline_ms),
    ]
    .into_iter()
    .flatten()
    .map(|deadline| deadline.saturating_sub(now_ms))
    .min()
    .map_or(IDLE_POLL_MS, |wait| wait.min(IDLE_POLL_MS))
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
