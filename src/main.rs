//! markpane - a terminal markdown editor with a live HTML preview.
//!
//! # Usage
//!
//! ```bash
//! markpane notes.md
//! markpane --watch notes.md
//! markpane --field summary post.json
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use markpane::app::App;
use markpane::config::{
    ConfigFlags, ThemeMode, clear_config_flags, global_config_path, load_config_flags,
    local_override_path, parse_flag_tokens, save_config_flags,
};
use markpane::highlight::{Background, set_background};
use markpane::perf;
use markpane::store::BODY_FIELD;

/// A terminal markdown editor with a debounced live HTML preview
#[derive(Parser, Debug)]
#[command(name = "markpane", version, about, long_about = None)]
struct Cli {
    /// Markdown file, or JSON record file, to edit
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// String field of a JSON record to edit
    #[arg(long, value_name = "KEY", default_value = BODY_FIELD)]
    field: String,

    /// Watch the file for changes made by other programs
    #[arg(short, long)]
    watch: bool,

    /// Edit without a preview pane
    #[arg(long)]
    no_preview: bool,

    /// Quiet period before the preview re-renders
    #[arg(long, value_name = "MS")]
    quiet_ms: Option<u64>,

    /// Terminal width below which panes are shown one at a time
    #[arg(long, value_name = "COLS")]
    split_width: Option<u16>,

    /// Force the preview highlight theme background (light or dark)
    #[arg(long, value_enum, default_value = "auto")]
    theme: ThemeMode,

    /// Enable performance timing logs
    #[arg(long)]
    perf: bool,

    /// Write detailed render pipeline events to a file
    #[arg(long, value_name = "PATH")]
    render_debug_log: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

fn main() -> Result<()> {
    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    tracing_subscriber::fmt()
        .with_writer(perf::log_writer)
        .with_env_filter(perf::log_filter(effective.perf).context("Failed to build log filter")?)
        .init();

    perf::set_enabled(effective.perf);
    let render_debug_log_path = effective
        .render_debug_log
        .clone()
        .or_else(|| std::env::var_os(perf::DEBUG_LOG_ENV).map(PathBuf::from));
    if let Err(err) = perf::set_debug_log_path(render_debug_log_path.as_deref()) {
        tracing::warn!(
            path = ?render_debug_log_path,
            %err,
            "failed to initialize render debug log"
        );
    }

    set_background(match effective.theme.unwrap_or(ThemeMode::Auto) {
        ThemeMode::Auto => None,
        ThemeMode::Light => Some(Background::Light),
        ThemeMode::Dark => Some(Background::Dark),
    });

    if !cli.file.exists() {
        anyhow::bail!("File not found: {}", cli.file.display());
    }

    let mut app = App::new(cli.file)
        .with_field(cli.field)
        .with_preview(!effective.no_preview)
        .with_watch(effective.watch)
        .with_config_paths(
            Some(global_path),
            local_path.exists().then_some(local_path),
        );
    if let Some(ms) = effective.quiet_ms {
        app = app.with_quiet_period(ms);
    }
    if let Some(cols) = effective.split_width {
        app = app.with_split_width(cols);
    }

    app.run().context("Application error")
}
