//! Diagnostic types for each pipeline stage. Every diagnostic carries a
//! `Span`, not a formatted string: line/column lookup and the caret
//! underline happen only in `Display`, so the hot lexing/parsing path never
//! builds a rendered message that might be thrown away by a caller that
//! only checks `is_ok()`.

use std::fmt;

use crate::common::span::Span;

/// `{message, source-byte-index}`. Produced by the lexer on the first byte
/// it cannot classify.
#[derive(Debug)]
pub struct LexError {
    pub message: String,
    pub span: Span,
}

impl LexError {
    pub fn new(message: impl Into<String>, span: Span) -> LexError {
        LexError { message: message.into(), span }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = self.span.format();
        writeln!(
            f,
            "Lex error: {} [{}:{}:{}]",
            self.message, formatted.path, formatted.start.line, formatted.start.column
        )?;
        writeln!(f, "{}", formatted.line)?;
        writeln!(f, "{}^", " ".repeat(formatted.start.column.saturating_sub(1)))
    }
}

/// `{message, optional-hint, offending-token, originating-parser-function}`.
/// The parser-function name is supplied explicitly by each production at
/// its call site, standing in for the original source's
/// `__builtin_FUNCTION()` default argument.
#[derive(Debug)]
pub struct ParseError {
    pub message: String,
    pub hint: Option<String>,
    pub offending: Span,
    pub production: &'static str,
}

impl ParseError {
    pub fn new(
        message: impl Into<String>,
        hint: Option<&str>,
        offending: Span,
        production: &'static str,
    ) -> ParseError {
        ParseError {
            message: message.into(),
            hint: hint.map(str::to_string),
            offending,
            production,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = self.offending.format();
        writeln!(
            f,
            "Parse error @ {}: {} [{}:{}:{}]",
            self.production, self.message, formatted.path, formatted.start.line, formatted.start.column
        )?;
        writeln!(f, "{}", formatted.line)?;
        writeln!(
            f,
            "{}{}",
            " ".repeat(formatted.start.column.saturating_sub(1)),
            "^".repeat(formatted.carets())
        )?;
        if let Some(hint) = &self.hint {
            writeln!(f, "Hint: {}", hint)?;
        }
        Ok(())
    }
}

/// `{message, offending-expression-index}`. Reserved: the typecheck pass
/// currently only gathers forward declarations and never produces one, but
/// the type exists so future per-variant checks have somewhere to report.
#[derive(Debug)]
pub struct TypecheckError {
    pub message: String,
    pub span: Span,
}

impl TypecheckError {
    pub fn new(message: impl Into<String>, span: Span) -> TypecheckError {
        TypecheckError { message: message.into(), span }
    }
}

impl fmt::Display for TypecheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = self.span.format();
        writeln!(
            f,
            "Typecheck error: {} [{}:{}:{}]",
            self.message, formatted.path, formatted.start.line, formatted.start.column
        )?;
        writeln!(f, "{}", formatted.line)?;
        writeln!(f, "{}^", " ".repeat(formatted.start.column.saturating_sub(1)))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::source::SourceFile;

    #[test]
    fn parse_error_renders_production_and_location() {
        let source = SourceFile::from_str("fn f() -> i32 { return 1 }");
        let offending = Span::new(&source, 25, 1);
        let error =
            ParseError::new("expected ';'", Some("did you forget a semicolon?"), offending, "parse_block");

        let rendered = format!("{}", error);
        assert!(rendered.starts_with("Parse error @ parse_block: expected ';' [./source:1:26]"));
        assert!(rendered.contains("Hint: did you forget a semicolon?"));
    }
}
