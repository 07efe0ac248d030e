//! Saved default flags.
//!
//! Defaults live in plain-text rc files holding the same flags the command
//! line accepts, one or more per line, `#` starting a comment. The global
//! file is merged with a local `.markpanerc` and then with the command line.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const LOCAL_RC: &str = ".markpanerc";

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Auto,
    Light,
    Dark,
}

impl ThemeMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "auto" => Some(Self::Auto),
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub watch: bool,
    pub no_preview: bool,
    pub perf: bool,
    pub quiet_ms: Option<u64>,
    pub split_width: Option<u16>,
    pub theme: Option<ThemeMode>,
    pub render_debug_log: Option<PathBuf>,
}

impl ConfigFlags {
    /// Merge `other` on top of `self`: switches OR together, values from
    /// `other` win when set.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            watch: self.watch || other.watch,
            no_preview: self.no_preview || other.no_preview,
            perf: self.perf || other.perf,
            quiet_ms: other.quiet_ms.or(self.quiet_ms),
            split_width: other.split_width.or(self.split_width),
            theme: other.theme.or(self.theme),
            render_debug_log: other
                .render_debug_log
                .clone()
                .or_else(|| self.render_debug_log.clone()),
        }
    }

    fn to_lines(&self) -> Vec<String> {
        let mut lines = vec!["# markpane defaults (saved with --save)".to_string()];
        for (on, flag) in [
            (self.watch, "--watch"),
            (self.no_preview, "--no-preview"),
            (self.perf, "--perf"),
        ] {
            if on {
                lines.push(flag.to_string());
            }
        }
        if let Some(ms) = self.quiet_ms {
            lines.push(format!("--quiet-ms {ms}"));
        }
        if let Some(cols) = self.split_width {
            lines.push(format!("--split-width {cols}"));
        }
        if let Some(theme) = self.theme {
            lines.push(format!("--theme {}", theme.as_str()));
        }
        if let Some(path) = &self.render_debug_log {
            lines.push(format!("--render-debug-log {}", path.display()));
        }
        lines
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("markpane").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library/Application Support/markpane/config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("markpane").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config/markpane/config");
        }
    }

    PathBuf::from(LOCAL_RC)
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(LOCAL_RC)
}

/// Read flags from an rc file. A missing file yields the defaults.
///
/// # Errors
/// Fails if the file exists but cannot be read.
pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(str::split_whitespace)
        .map(ToOwned::to_owned)
        .collect();
    Ok(parse_flag_tokens(&tokens))
}

/// # Errors
/// Fails if the config directory or file cannot be written.
pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", flags.to_lines().join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

/// # Errors
/// Fails if the file exists but cannot be removed.
pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick the known flags out of a token list; anything else is skipped.
///
/// Valued flags accept both `--flag value` and `--flag=value`. Values that
/// do not parse are ignored.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut rest = tokens.iter();
    while let Some(token) = rest.next() {
        let (name, inline) = match token.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (token.as_str(), None),
        };
        match name {
            "--watch" => flags.watch = true,
            "--no-preview" => flags.no_preview = true,
            "--perf" => flags.perf = true,
            "--quiet-ms" | "--split-width" | "--theme" | "--render-debug-log" => {
                let Some(value) = inline.or_else(|| rest.next().map(String::as_str)) else {
                    continue;
                };
                match name {
                    "--quiet-ms" => flags.quiet_ms = value.parse().ok(),
                    "--split-width" => flags.split_width = value.parse().ok(),
                    "--theme" => flags.theme = ThemeMode::parse(value),
                    _ => flags.render_debug_log = Some(PathBuf::from(value)),
                }
            }
            _ => {}
        }
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tokens(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let flags = parse_flag_tokens(&tokens(&[
            "markpane",
            "--watch",
            "--no-preview",
            "--quiet-ms",
            "150",
            "--split-width=120",
            "--theme",
            "dark",
            "--render-debug-log=render.log",
            "note.md",
        ]));
        assert!(flags.watch);
        assert!(flags.no_preview);
        assert_eq!(flags.quiet_ms, Some(150));
        assert_eq!(flags.split_width, Some(120));
        assert_eq!(flags.theme, Some(ThemeMode::Dark));
        assert_eq!(flags.render_debug_log, Some(PathBuf::from("render.log")));
        assert!(!flags.perf);
    }

    #[test]
    fn test_parse_ignores_bad_values_and_dangling_flags() {
        let flags = parse_flag_tokens(&tokens(&["--quiet-ms", "soon", "--theme"]));
        assert_eq!(flags.quiet_ms, None);
        assert_eq!(flags.theme, None);
    }

    #[test]
    fn test_union_prefers_later_values() {
        let file = ConfigFlags {
            watch: true,
            quiet_ms: Some(500),
            theme: Some(ThemeMode::Light),
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            perf: true,
            theme: Some(ThemeMode::Dark),
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert!(merged.watch);
        assert!(merged.perf);
        assert_eq!(merged.quiet_ms, Some(500));
        assert_eq!(merged.theme, Some(ThemeMode::Dark));
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config");
        let flags = ConfigFlags {
            watch: true,
            no_preview: true,
            perf: true,
            quiet_ms: Some(250),
            split_width: Some(90),
            theme: Some(ThemeMode::Auto),
            render_debug_log: Some(PathBuf::from("render.log")),
        };

        save_config_flags(&path, &flags).unwrap();
        assert_eq!(load_config_flags(&path).unwrap(), flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
        assert_eq!(load_config_flags(&path).unwrap(), ConfigFlags::default());
    }
}
