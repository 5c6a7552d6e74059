//! Types shared across every pipeline stage: the immutable source buffer
//! and the span/location machinery used to locate diagnostics within it.

pub mod source;
pub mod span;

pub use source::SourceFile;
pub use span::{Location, Span, Spanned};
