//! Toolbar commands and the markup each one inserts.
//!
//! Commands describe a text edit and nothing more; no markdown is parsed.

use std::path::Path;

use super::EditorBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarCommand {
    Heading,
    Bold,
    Italic,
    Strikethrough,
    Quote,
    InlineCode,
    BulletList,
    NumberedList,
    TaskList,
    Link,
    Rule,
}

/// The edit a command performs on the editing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Markup {
    /// Toggle a prefix at the start of the cursor line.
    LinePrefix(&'static str),
    /// Insert `before`, a placeholder and `after` at the cursor.
    Wrap {
        before: &'static str,
        placeholder: &'static str,
        after: &'static str,
    },
    /// Insert text on its own line.
    Block(&'static str),
}

impl ToolbarCommand {
    /// Toolbar order, also the Alt+digit order in the terminal app.
    pub const ALL: [Self; 11] = [
        Self::Heading,
        Self::Bold,
        Self::Italic,
        Self::Strikethrough,
        Self::Quote,
        Self::InlineCode,
        Self::BulletList,
        Self::NumberedList,
        Self::TaskList,
        Self::Link,
        Self::Rule,
    ];

    pub const fn markup(self) -> Markup {
        match self {
            Self::Heading => Markup::LinePrefix("# "),
            Self::Quote => Markup::LinePrefix("> "),
            Self::BulletList => Markup::LinePrefix("- "),
            Self::NumberedList => Markup::LinePrefix("1. "),
            Self::TaskList => Markup::LinePrefix("- [ ] "),
            Self::Bold => wrap("**", "bold", "**"),
            Self::Italic => wrap("_", "italic", "_"),
            Self::Strikethrough => wrap("~~", "text", "~~"),
            Self::InlineCode => wrap("`", "code", "`"),
            Self::Link => wrap("[", "text", "](https://)"),
            Self::Rule => Markup::Block("---"),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Heading => "Heading",
            Self::Bold => "Bold",
            Self::Italic => "Italic",
            Self::Strikethrough => "Strike",
            Self::Quote => "Quote",
            Self::InlineCode => "Code",
            Self::BulletList => "List",
            Self::NumberedList => "Numbered",
            Self::TaskList => "Task",
            Self::Link => "Link",
            Self::Rule => "Rule",
        }
    }

    /// The command bound to Alt+`digit` (1-based).
    pub fn from_digit(digit: char) -> Option<Self> {
        let idx = digit.to_digit(10)?.checked_sub(1)?;
        Self::ALL.get(usize::try_from(idx).ok()?).copied()
    }
}

const fn wrap(before: &'static str, placeholder: &'static str, after: &'static str) -> Markup {
    Markup::Wrap {
        before,
        placeholder,
        after,
    }
}

/// Perform `markup` on `buffer`.
pub fn apply(buffer: &mut EditorBuffer, markup: Markup) {
    match markup {
        Markup::LinePrefix(prefix) => buffer.toggle_line_prefix(prefix),
        Markup::Wrap {
            before,
            placeholder,
            after,
        } => buffer.wrap_at_cursor(before, placeholder, after),
        Markup::Block(text) => buffer.insert_block(text),
    }
}

/// The markdown reference inserted for a picked image.
///
/// The alt text is the file stem; spaces in the path are percent-encoded so
/// the link target stays a single token.
pub fn image_markdown(path: &Path) -> String {
    let alt = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let target = path.to_string_lossy().replace(' ', "%20");
    format!("![{alt}]({target})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_toggles_prefix() {
        let mut buf = EditorBuffer::from_text("Title");
        apply(&mut buf, ToolbarCommand::Heading.markup());
        assert_eq!(buf.text(), "# Title");
        apply(&mut buf, ToolbarCommand::Heading.markup());
        assert_eq!(buf.text(), "Title");
    }

    #[test]
    fn test_bold_wraps_placeholder_at_cursor() {
        let mut buf = EditorBuffer::from_text("say ");
        buf.move_end();
        apply(&mut buf, ToolbarCommand::Bold.markup());
        assert_eq!(buf.text(), "say **bold**");
    }

    #[test]
    fn test_link_inserts_target_after_cursor() {
        let mut buf = EditorBuffer::default();
        apply(&mut buf, ToolbarCommand::Link.markup());
        assert_eq!(buf.text(), "[text](https://)");
        assert_eq!(buf.cursor().col, 5);
    }

    #[test]
    fn test_rule_goes_on_its_own_line() {
        let mut buf = EditorBuffer::from_text("para");
        apply(&mut buf, ToolbarCommand::Rule.markup());
        assert_eq!(buf.text(), "para\n---");
    }

    #[test]
    fn test_task_list_prefix() {
        let mut buf = EditorBuffer::from_text("todo");
        apply(&mut buf, ToolbarCommand::TaskList.markup());
        assert_eq!(buf.text(), "- [ ] todo");
    }

    #[test]
    fn test_from_digit_follows_toolbar_order() {
        assert_eq!(ToolbarCommand::from_digit('1'), Some(ToolbarCommand::Heading));
        assert_eq!(ToolbarCommand::from_digit('9'), Some(ToolbarCommand::TaskList));
        assert_eq!(ToolbarCommand::from_digit('0'), None);
        assert_eq!(ToolbarCommand::from_digit('x'), None);
    }

    #[test]
    fn test_image_markdown_uses_stem_as_alt() {
        assert_eq!(
            image_markdown(Path::new("img/cat photo.png")),
            "![cat photo](img/cat%20photo.png)"
        );
    }
}
