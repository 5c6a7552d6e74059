use std::rc::Rc;

use crate::common::source::SourceFile;

/// A half-open byte range `[offset, offset + length)` into a `SourceFile`.
/// Every `Span` carries a handle to the source it indexes so two `Span`s
/// from different files can never be silently combined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    source: Rc<SourceFile>,
    offset: usize,
    length: usize,
}

impl Span {
    pub fn new(source: &Rc<SourceFile>, offset: usize, length: usize) -> Span {
        Span { source: Rc::clone(source), offset, length }
    }

    /// A `Span` pointing at a single byte, used for lex errors that have no
    /// token to anchor to yet.
    pub fn point(source: &Rc<SourceFile>, offset: usize) -> Span {
        Span { source: Rc::clone(source), offset, length: 1 }
    }

    /// Spans the union of two `Span`s from the same source.
    pub fn combine(a: &Span, b: &Span) -> Span {
        assert!(Rc::ptr_eq(&a.source, &b.source), "can't combine spans from different sources");
        let offset = a.offset.min(b.offset);
        let end = (a.offset + a.length).max(b.offset + b.length);
        Span::new(&a.source, offset, end - offset)
    }

    pub fn offset(&self) -> usize { self.offset }
    pub fn length(&self) -> usize { self.length }
    pub fn end(&self) -> usize { self.offset + self.length }

    pub fn text(&self) -> &str {
        &self.source.text[self.offset..self.offset + self.length]
    }

    /// Resolves this span's start and end byte offsets to 1-indexed
    /// line/column pairs and fetches the source line the span starts on.
    pub fn format(&self) -> Formatted {
        let start = Location::for_offset(&self.source.text, self.offset);
        let end = Location::for_offset(&self.source.text, self.end().saturating_sub(1).max(self.offset));
        let line = self
            .source
            .text
            .lines()
            .nth(start.line - 1)
            .unwrap_or("")
            .to_string();

        Formatted {
            path: self.source.name.display().to_string(),
            start,
            end,
            line,
        }
    }
}

/// A 1-indexed line/column pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    /// Walks `text` up to `offset`, counting newlines. Returns 1-indexed
    /// line and column, mirroring the original source's
    /// `Util::line_and_column_for`.
    pub fn for_offset(text: &str, offset: usize) -> Location {
        let mut line = 1;
        let mut column = 1;
        for ch in text[..offset.min(text.len())].chars() {
            if ch == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        Location { line, column }
    }
}

/// The resolved, printable form of a `Span`: a file path, a start/end
/// location, and the source line the span begins on. Resolution happens
/// only here, at display time — the hot parsing path never builds this.
#[derive(Debug, Clone)]
pub struct Formatted {
    pub path: String,
    pub start: Location,
    pub end: Location,
    pub line: String,
}

impl Formatted {
    pub fn is_multiline(&self) -> bool {
        self.start.line != self.end.line
    }

    /// Width of a caret underline for a single-line span.
    pub fn carets(&self) -> usize {
        if self.is_multiline() {
            1
        } else {
            self.end.column.saturating_sub(self.start.column).max(1)
        }
    }
}

/// A wrapper pairing a value with the `Span` it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned<T> {
    pub item: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(item: T, span: Span) -> Spanned<T> {
        Spanned { item, span }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn combination() {
        let source = SourceFile::from_str("heck, that's awesome");
        let a = Span::new(&source, 0, 5);
        let b = Span::new(&source, 11, 2);
        assert_eq!(Span::combine(&a, &b), Span::new(&source, 0, 13));
    }

    #[test]
    fn location_tracks_newlines() {
        let source = SourceFile::from_str("ab\ncd\nef");
        let loc = Location::for_offset(&source.text, 4);
        assert_eq!(loc, Location { line: 2, column: 2 });
    }

    #[test]
    fn format_reports_source_path() {
        let source = SourceFile::new("x = 1;", &PathBuf::from("snippet.em"));
        let span = Span::new(&source, 0, 1);
        assert_eq!(span.format().path, "snippet.em");
    }
}
