//! Syntax highlighting for the preview's HTML source.
//!
//! The preview shows the renderer's HTML as text; syntect colors it with
//! the bundled HTML grammar and a theme picked for the terminal background.

use std::sync::{Mutex, OnceLock, PoisonError};

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    Light,
    Dark,
}

static BACKGROUND_OVERRIDE: Mutex<Option<Background>> = Mutex::new(None);

/// Force a background instead of detecting it from `COLORFGBG`.
///
/// Must run before the first highlight; the theme is chosen once.
pub fn set_background(mode: Option<Background>) {
    *BACKGROUND_OVERRIDE
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = mode;
}

pub fn background() -> Background {
    let forced = *BACKGROUND_OVERRIDE
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    forced.unwrap_or_else(|| background_from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref()))
}

/// `COLORFGBG` is `fg;bg` (sometimes `fg;default;bg`); palette entries 7
/// and up are light.
fn background_from_colorfgbg(value: Option<&str>) -> Background {
    let bg = value
        .and_then(|v| v.rsplit(';').next())
        .and_then(|bg| bg.parse::<u8>().ok());
    match bg {
        Some(bg) if bg >= 7 => Background::Light,
        _ => Background::Dark,
    }
}

/// Color `html` line by line.
///
/// Falls back to unstyled lines if the grammar fails on some input.
pub fn highlight_html(html: &str) -> Vec<Line<'static>> {
    let _scope = crate::perf::scope("highlight.html");
    let syntaxes = syntax_set();
    let Some(syntax) = syntaxes.find_syntax_by_extension("html") else {
        return plain_lines(html);
    };
    let mode = background();
    let mut highlighter = HighlightLines::new(syntax, theme());
    let mut lines = Vec::new();
    for line in LinesWithEndings::from(html) {
        let Ok(ranges) = highlighter.highlight_line(line, syntaxes) else {
            tracing::debug!("html highlighting failed; showing plain text");
            return plain_lines(html);
        };
        let spans: Vec<Span<'static>> = ranges
            .into_iter()
            .map(|(style, text)| {
                let text = text.trim_end_matches(['\n', '\r']).to_string();
                let fg = readable_on(style.foreground, mode);
                Span::styled(text, Style::default().fg(fg))
            })
            .filter(|span| !span.content.is_empty())
            .collect();
        lines.push(Line::from(spans));
    }
    lines
}

fn plain_lines(text: &str) -> Vec<Line<'static>> {
    text.lines().map(|l| Line::raw(l.to_string())).collect()
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAXES: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAXES.get_or_init(|| {
        let _scope = crate::perf::scope("highlight.syntax_set");
        SyntaxSet::load_defaults_newlines()
    })
}

fn theme() -> &'static Theme {
    static THEME: OnceLock<Theme> = OnceLock::new();
    THEME.get_or_init(|| {
        let _scope = crate::perf::scope("highlight.theme");
        let mut themes = ThemeSet::load_defaults().themes;
        let preferred: &[&str] = match background() {
            Background::Dark => &["base16-ocean.dark", "Solarized (dark)", "base16-eighties.dark"],
            Background::Light => &["InspiredGitHub", "Solarized (light)", "base16-ocean.light"],
        };
        preferred
            .iter()
            .find_map(|name| themes.remove(*name))
            .or_else(|| themes.into_values().next())
            .unwrap_or_default()
    })
}

/// Dim bright foregrounds on light backgrounds so they stay legible.
fn readable_on(color: syntect::highlighting::Color, mode: Background) -> Color {
    let (r, g, b) = (color.r, color.g, color.b);
    if mode == Background::Dark {
        return Color::Rgb(r, g, b);
    }
    let luma = 0.0722f32.mul_add(
        f32::from(b),
        0.2126f32.mul_add(f32::from(r), 0.7152 * f32::from(g)),
    );
    if luma < 155.0 {
        return Color::Rgb(r, g, b);
    }
    let dim = |c: u8| (f32::from(c) * 0.42).round() as u8;
    Color::Rgb(dim(r), dim(g), dim(b))
}
