use ropey::Rope;

/// Insertion point inside an [`EditorBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub line: usize,
    /// Byte offset within the line.
    pub col: usize,
    /// Column to return to when moving vertically through short lines.
    goal: usize,
}

impl Cursor {
    pub const fn at(line: usize, col: usize) -> Self {
        Self {
            line,
            col,
            goal: col,
        }
    }

    const fn place(&mut self, col: usize) {
        self.col = col;
        self.goal = col;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// The editing surface: a rope of markdown text and one cursor.
///
/// `revision` counts user edits so the host can tell whether a key press
/// changed the text without comparing strings. Programmatic replacement
/// through [`EditorBuffer::set_text`] is not an edit.
pub struct EditorBuffer {
    rope: Rope,
    cursor: Cursor,
    dirty: bool,
    revision: u64,
}

impl Default for EditorBuffer {
    fn default() -> Self {
        Self::from_text("")
    }
}

impl EditorBuffer {
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            cursor: Cursor::default(),
            dirty: false,
            revision: 0,
        }
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Number of characters, the unit the size guard counts in.
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub const fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub const fn revision(&self) -> u64 {
        self.revision
    }

    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Line content without its line ending.
    pub fn line(&self, idx: usize) -> Option<String> {
        if idx >= self.rope.len_lines() {
            return None;
        }
        let mut text = self.rope.line(idx).to_string();
        while text.ends_with(['\n', '\r']) {
            text.pop();
        }
        Some(text)
    }

    pub fn line_len(&self, idx: usize) -> usize {
        self.line(idx).map_or(0, |l| l.len())
    }

    /// Replace the whole text, keeping the cursor as close to where it was
    /// as the new text allows.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        let line = self.cursor.line.min(self.line_count().saturating_sub(1));
        let col = floor_char_boundary(&self.line(line).unwrap_or_default(), self.cursor.col);
        self.cursor = Cursor::at(line, col);
    }

    pub fn insert_char(&mut self, ch: char) {
        if ch == '\n' {
            self.newline();
            return;
        }
        let at = self.char_index();
        self.rope.insert_char(at, ch);
        self.cursor.place(self.cursor.col + ch.len_utf8());
        self.touch();
    }

    pub fn insert_str(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let at = self.char_index();
        self.rope.insert(at, text);
        match text.rsplit_once('\n') {
            Some((head, tail)) => {
                self.cursor.line += head.matches('\n').count() + 1;
                self.cursor.place(tail.len());
            }
            None => self.cursor.place(self.cursor.col + text.len()),
        }
        self.touch();
    }

    pub fn newline(&mut self) {
        let at = self.char_index();
        self.rope.insert_char(at, '\n');
        self.cursor.line += 1;
        self.cursor.place(0);
        self.touch();
    }

    /// Delete the character before the cursor, joining lines at column 0.
    pub fn backspace(&mut self) -> bool {
        let at = self.char_index();
        if at == 0 {
            return false;
        }
        if self.cursor.col == 0 {
            let prev_len = self.line_len(self.cursor.line - 1);
            let start = at - self.break_len_before(at);
            self.rope.remove(start..at);
            self.cursor.line -= 1;
            self.cursor.place(prev_len);
        } else {
            let removed = self.rope.char(at - 1).len_utf8();
            self.rope.remove(at - 1..at);
            self.cursor.place(self.cursor.col - removed);
        }
        self.touch();
        true
    }

    /// Delete the character under the cursor.
    pub fn delete(&mut self) -> bool {
        let at = self.char_index();
        if at >= self.rope.len_chars() {
            return false;
        }
        let end = if self.cursor.col >= self.line_len(self.cursor.line) {
            at + self.break_len_at(at)
        } else {
            at + 1
        };
        self.rope.remove(at..end);
        self.touch();
        true
    }

    pub fn move_cursor(&mut self, direction: Direction) {
        match direction {
            Direction::Left => self.step_left(),
            Direction::Right => self.step_right(),
            Direction::Up if self.cursor.line > 0 => self.jump_line(self.cursor.line - 1),
            Direction::Down if self.cursor.line + 1 < self.line_count() => {
                self.jump_line(self.cursor.line + 1);
            }
            Direction::Up | Direction::Down => {}
        }
    }

    pub const fn move_home(&mut self) {
        self.cursor.place(0);
    }

    pub fn move_end(&mut self) {
        self.cursor.place(self.line_len(self.cursor.line));
    }

    pub fn move_word_left(&mut self) {
        if self.cursor.col == 0 {
            if self.cursor.line > 0 {
                self.cursor.line -= 1;
                self.move_end();
            }
            return;
        }
        let line = self.line(self.cursor.line).unwrap_or_default();
        let head = line[..self.cursor.col].trim_end();
        let Some(last) = head.chars().next_back() else {
            self.cursor.place(0);
            return;
        };
        let in_word = is_word_char(last);
        let start = head
            .char_indices()
            .rev()
            .find(|&(_, c)| c.is_whitespace() || is_word_char(c) != in_word)
            .map_or(0, |(i, c)| i + c.len_utf8());
        self.cursor.place(start);
    }

    pub fn move_word_right(&mut self) {
        let line = self.line(self.cursor.line).unwrap_or_default();
        if self.cursor.col >= line.len() {
            if self.cursor.line + 1 < self.line_count() {
                self.cursor.line += 1;
                self.cursor.place(0);
            }
            return;
        }
        let tail = &line[self.cursor.col..];
        let word = tail.find(|c| !is_word_char(c)).unwrap_or(tail.len());
        let gap = tail[word..].find(is_word_char).unwrap_or(tail.len() - word);
        self.cursor.place(self.cursor.col + word + gap);
    }

    pub fn move_to(&mut self, line: usize, col: usize) {
        let line = line.min(self.line_count().saturating_sub(1));
        let text = self.line(line).unwrap_or_default();
        self.cursor.line = line;
        self.cursor.place(floor_char_boundary(&text, col));
    }

    pub fn move_to_end(&mut self) {
        let last = self.line_count().saturating_sub(1);
        self.cursor.line = last;
        self.move_end();
    }

    /// Add `prefix` to the start of the cursor line, or remove it if the
    /// line already starts with it.
    pub fn toggle_line_prefix(&mut self, prefix: &str) {
        if prefix.is_empty() {
            return;
        }
        let line_start = self.rope.line_to_char(self.cursor.line);
        let line = self.line(self.cursor.line).unwrap_or_default();
        if line.starts_with(prefix) {
            let end = line_start + prefix.chars().count();
            self.rope.remove(line_start..end);
            self.cursor
                .place(self.cursor.col.saturating_sub(prefix.len()));
        } else {
            self.rope.insert(line_start, prefix);
            self.cursor.place(self.cursor.col + prefix.len());
        }
        self.touch();
    }

    /// Insert `before`, `placeholder`, `after` at the cursor and leave the
    /// cursor at the end of the placeholder.
    pub fn wrap_at_cursor(&mut self, before: &str, placeholder: &str, after: &str) {
        self.insert_str(before);
        self.insert_str(placeholder);
        let at = self.char_index();
        self.rope.insert(at, after);
        self.touch();
    }

    /// Insert `block` on a line of its own below any text on the cursor line.
    pub fn insert_block(&mut self, block: &str) {
        if self.line_len(self.cursor.line) > 0 {
            self.move_end();
            self.newline();
        }
        self.insert_str(block);
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.revision += 1;
    }

    /// Chars in the line break ending just before char `at`: 2 for CRLF.
    fn break_len_before(&self, at: usize) -> usize {
        if at >= 2 && self.rope.char(at - 1) == '\n' && self.rope.char(at - 2) == '\r' {
            2
        } else {
            1
        }
    }

    /// Chars in the line break starting at char `at`: 2 for CRLF.
    fn break_len_at(&self, at: usize) -> usize {
        if self.rope.char(at) == '\r' && self.rope.get_char(at + 1) == Some('\n') {
            2
        } else {
            1
        }
    }

    fn char_index(&self) -> usize {
        let line = self.rope.line(self.cursor.line);
        let col = self.cursor.col.min(line.len_bytes());
        self.rope.line_to_char(self.cursor.line) + line.byte_to_char(col)
    }

    fn step_left(&mut self) {
        if self.cursor.col > 0 {
            let at = self.char_index();
            let width = self.rope.char(at - 1).len_utf8();
            self.cursor.place(self.cursor.col - width);
        } else if self.cursor.line > 0 {
            self.cursor.line -= 1;
            self.move_end();
        }
    }

    fn step_right(&mut self) {
        if self.cursor.col < self.line_len(self.cursor.line) {
            let width = self.rope.char(self.char_index()).len_utf8();
            self.cursor.place(self.cursor.col + width);
        } else if self.cursor.line + 1 < self.line_count() {
            self.cursor.line += 1;
            self.cursor.place(0);
        }
    }

    fn jump_line(&mut self, line: usize) {
        let text = self.line(line).unwrap_or_default();
        self.cursor.line = line;
        self.cursor.col = floor_char_boundary(&text, self.cursor.goal);
    }
}

impl std::fmt::Debug for EditorBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorBuffer")
            .field("chars", &self.rope.len_chars())
            .field("cursor", &self.cursor)
            .field("dirty", &self.dirty)
            .field("revision", &self.revision)
            .finish()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn floor_char_boundary(text: &str, col: usize) -> usize {
    let mut col = col.min(text.len());
    while !text.is_char_boundary(col) {
        col -= 1;
    }
    col
}
