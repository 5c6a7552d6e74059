// Each step in the pipeline turns one datatype into another:
// ~> SourceFile (name + bytes)
// -> Tokens                 : lex.rs
// -> ParsedExpressions      : parse.rs
// -> TypecheckedExpressions : typecheck.rs
// -> C translation unit     : gen.rs

pub mod lex;
pub mod parse;
pub mod typecheck;
pub mod gen;
pub mod sink;
pub mod syntax;
