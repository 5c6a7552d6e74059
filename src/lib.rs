//! # emberc
//!
//! `emberc` is a single-file source-to-C translator for a small,
//! statically-typed C-family language. It never evaluates anything itself;
//! it lexes, parses, and type-checks one source file, then emits a C
//! translation unit which a real C compiler (`clang` by default, see the
//! `CC` environment variable) turns into a binary.
//!
//! ## Overview of the compilation process
//!
//! Source text flows through four stages, each turning one datatype into
//! the next:
//!
//! ```text
//! SourceFile -> Tokens -> ParsedExpressions -> TypecheckedExpressions -> C
//! ```
//!
//! - [`common::source::SourceFile`] pairs a file's bytes with a path, so
//!   diagnostics can report where they came from. [`common::span::Span`]
//!   marks a byte range within one; [`common::span::Spanned`] attaches a
//!   span to an arbitrary value (most importantly, to a [`construct::Token`]
//!   — see [`construct::expression::Lexeme`]).
//! - [`compiler::lex`] turns a `SourceFile` into a flat token stream.
//! - [`compiler::parse`] turns that token stream into a
//!   [`construct::ParsedExpressions`] arena: every AST node lives in a
//!   per-variant vector and is referred to elsewhere only by a typed
//!   [`construct::Id`], never by pointer.
//! - [`compiler::typecheck`] walks the arena's root items, gathers the
//!   forward-declaration table the generator needs, and drains root-level
//!   `@import_c`/`inline_c` items out into their own lists.
//! - [`compiler::gen`] walks the typechecked arena and writes a C
//!   translation unit into an [`compiler::sink::OutputSink`].
//!
//! Each stage's failure mode is its own diagnostic type in
//! [`compiler::syntax`], carrying a `Span` rather than a pre-rendered
//! string, so a caller that only checks `is_ok()` never pays for formatting
//! a diagnostic it discards.

pub mod common;
pub mod compiler;
pub mod construct;

pub use common::{source::SourceFile, span::Spanned};
pub use compiler::syntax::{LexError, ParseError, TypecheckError};
pub use construct::{Id, ParsedExpressions};
