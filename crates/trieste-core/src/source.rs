//! Source buffers and locations.
//!
//! A [`SourceDef`] is an immutable text buffer with a precomputed line index,
//! shared via [`Source`]. A [`Location`] is a byte span into one buffer.
//! Locations compare by their textual view, not by buffer identity, so two
//! spans over different buffers that select the same text are equal.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Shared handle to an immutable source buffer.
pub type Source = Arc<SourceDef>;

/// An immutable text buffer with an origin label and a line index.
///
/// The line index stores `(start_byte, length)` per line, where the length
/// excludes the terminator. `\n`, `\r\n` and `\r` all terminate a line. An
/// empty buffer has no lines.
#[derive(Debug)]
pub struct SourceDef {
    origin: String,
    contents: String,
    lines: Vec<(usize, usize)>,
}

impl SourceDef {
    /// Loads a file from disk.
    pub fn load(path: &Path) -> io::Result<Source> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::synthetic_named(contents, path.display().to_string()))
    }

    /// Creates a buffer with no origin.
    pub fn synthetic(contents: impl Into<String>) -> Source {
        Self::synthetic_named(contents, String::new())
    }

    /// Creates a buffer with an origin label used in error coordinates.
    pub fn synthetic_named(contents: impl Into<String>, origin: impl Into<String>) -> Source {
        let contents = contents.into();
        let lines = find_lines(&contents);
        Arc::new(SourceDef {
            origin: origin.into(),
            contents,
            lines,
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn view(&self) -> &str {
        &self.contents
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Zero-based `(line, column)` of a byte position. O(log lines).
    pub fn linecol(&self, pos: usize) -> (usize, usize) {
        if self.lines.is_empty() {
            // Empty buffer; realistically only pos == 0 lands here.
            return (0, pos);
        }

        // Index of the first line starting after `pos`, then step back one.
        let line = self
            .lines
            .partition_point(|&(start, _)| start <= pos)
            .saturating_sub(1);
        let col = pos - self.lines[line].0;
        (line, col)
    }

    /// `(start_byte, length)` of a zero-based line. O(1).
    ///
    /// Out-of-range lines index the end of the buffer with length zero, so a
    /// bad line number renders as a blank span rather than slicing wildly.
    pub fn linepos(&self, line: usize) -> (usize, usize) {
        match self.lines.get(line) {
            Some(&span) => span,
            None => (self.contents.len(), 0),
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

fn find_lines(contents: &str) -> Vec<(usize, usize)> {
    let bytes = contents.as_bytes();
    let mut lines = Vec::new();
    let mut line_start = 0;
    let mut cursor = 0;

    while cursor < bytes.len() {
        let terminator = match bytes[cursor] {
            b'\r' if bytes.get(cursor + 1) == Some(&b'\n') => 2,
            b'\r' | b'\n' => 1,
            _ => {
                cursor += 1;
                continue;
            }
        };

        lines.push((line_start, cursor - line_start));
        cursor += terminator;
        line_start = cursor;
    }

    // Trailing content with no terminator.
    if line_start < bytes.len() {
        lines.push((line_start, bytes.len() - line_start));
    }

    lines
}

/// A byte span into a source buffer.
///
/// A default location has no source and an empty view. Constructing one from
/// a bare string creates a synthetic source holding exactly that text.
#[derive(Clone, Default)]
pub struct Location {
    pub source: Option<Source>,
    pub pos: usize,
    pub len: usize,
}

impl Location {
    pub fn new(source: Source, pos: usize, len: usize) -> Self {
        Location {
            source: Some(source),
            pos,
            len,
        }
    }

    /// A location covering a whole synthetic source made from `text`.
    pub fn synthetic(text: impl Into<String>) -> Self {
        let text = text.into();
        let len = text.len();
        Location {
            source: Some(SourceDef::synthetic(text)),
            pos: 0,
            len,
        }
    }

    /// The selected text. Empty when there is no source.
    pub fn view(&self) -> &str {
        match &self.source {
            Some(source) => {
                let end = (self.pos + self.len).min(source.view().len());
                let start = self.pos.min(end);
                &source.view()[start..end]
            }
            None => "",
        }
    }

    /// Zero-based `(line, column)` of the span start.
    pub fn linecol(&self) -> (usize, usize) {
        match &self.source {
            Some(source) => source.linecol(self.pos),
            None => (0, 0),
        }
    }

    /// `origin:line:col` with one-based coordinates, or empty when the
    /// source has no origin.
    pub fn origin_linecol(&self) -> String {
        match &self.source {
            Some(source) if !source.origin().is_empty() => {
                let (line, col) = self.linecol();
                format!("{}:{}:{}:", source.origin(), line + 1, col + 1)
            }
            _ => String::new(),
        }
    }

    /// Renders the covered line(s) with a `~~~` underline for error output.
    pub fn str(&self) -> String {
        let Some(source) = &self.source else {
            return String::new();
        };

        let mut out = String::new();
        let (line, col) = self.linecol();
        let (line_start, mut line_len) = source.linepos(line);

        if self.view().contains('\n') {
            // Multi-line span: underline the first line, print the whole
            // span, underline up to the end column on the last line.
            let cover = self.len.min(line_len - col.min(line_len));
            out.push_str(&" ".repeat(col));
            out.push_str(&"~".repeat(cover));
            out.push('\n');

            let (line2, col2) = source.linecol(self.pos + self.len);
            let (line2_start, line2_len) = source.linepos(line2);
            line_len = (line2_start - line_start) + line2_len;

            out.push_str(&source.view()[line_start..line_start + line_len]);
            out.push('\n');
            out.push_str(&"~".repeat(col2));
            out.push('\n');
        } else {
            out.push_str(&source.view()[line_start..line_start + line_len]);
            out.push('\n');
            out.push_str(&" ".repeat(col));
            out.push_str(&"~".repeat(self.len.max(1)));
            out.push('\n');
        }

        out
    }

    /// Smallest location covering both spans. When the sources differ, the
    /// receiver wins.
    pub fn union(&self, that: &Location) -> Location {
        match (&self.source, &that.source) {
            (Some(a), Some(b)) if Arc::ptr_eq(a, b) => {
                let lo = self.pos.min(that.pos);
                let hi = (self.pos + self.len).max(that.pos + that.len);
                Location {
                    source: Some(a.clone()),
                    pos: lo,
                    len: hi - lo,
                }
            }
            (None, Some(_)) => that.clone(),
            _ => self.clone(),
        }
    }

    /// Definition-ordering test used by `defbeforeuse` lookup filtering.
    ///
    /// The restriction is a same-file ordering constraint: spans in
    /// different sources always count as "before". Within one source a span
    /// at the same start position still counts, so a binding resolves at its
    /// own definition site.
    pub fn before(&self, that: &Location) -> bool {
        match (&self.source, &that.source) {
            (Some(a), Some(b)) if Arc::ptr_eq(a, b) => self.pos <= that.pos,
            _ => true,
        }
    }

    /// True when both spans point into the same buffer.
    pub fn same_source(&self, that: &Location) -> bool {
        match (&self.source, &that.source) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for Location {
    fn from(text: &str) -> Self {
        Location::synthetic(text)
    }
}

impl From<String> for Location {
    fn from(text: String) -> Self {
        Location::synthetic(text)
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.view() == other.view()
    }
}

impl Eq for Location {}

impl PartialOrd for Location {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Location {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.view().cmp(other.view())
    }
}

impl Hash for Location {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.view().hash(state);
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}+{}", self.view(), self.pos, self.len)
    }
}
