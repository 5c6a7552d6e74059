//! Walks a `ParsedExpressions` arena and produces the typed intermediate
//! form the code generator consumes: a forward-declaration table (what
//! names exist, and which of the four function partitions each function
//! belongs to) plus the root-level `@import_c`/`inline_c` items drained
//! out into their own lists.
//!
//! This is deliberately not a full semantic checker — it does not resolve
//! types, check argument counts, or validate that every name referenced in
//! a body was declared. Its job is narrower: gather enough information for
//! the generator to emit forward declarations and a prelude in the right
//! order.

use crate::compiler::syntax::TypecheckError;
use crate::construct::expression::{ExpressionKind, Function, Id, ImportC, InlineC, Lexeme};
use crate::construct::ParsedExpressions;

/// Which names the generator needs to forward-declare, partitioned the
/// way the four function-kind tags in `ExpressionKind` partition them.
#[derive(Debug, Default)]
pub struct ForwardDeclarations {
    pub structs: Vec<Lexeme>,
    pub enums: Vec<Lexeme>,
    pub unions: Vec<Lexeme>,
    pub variants: Vec<Lexeme>,
    pub public_functions: Vec<Id<Function>>,
    pub private_functions: Vec<Id<Function>>,
    pub public_c_functions: Vec<Id<Function>>,
    pub private_c_functions: Vec<Id<Function>>,
}

/// The typed intermediate form: the same arena the parser built, with
/// every root-level `@import_c`/`inline_c` item drained into `imports`/
/// `preamble` and its root entry tombstoned to `ExpressionKind::Moved`,
/// plus the forward-declaration table gathered from the remaining roots.
pub struct TypecheckedExpressions {
    pub expressions: ParsedExpressions,
    pub declarations: ForwardDeclarations,
    pub imports: Vec<ImportC>,
    pub preamble: Vec<InlineC>,
}

pub fn typecheck(mut expressions: ParsedExpressions) -> Result<TypecheckedExpressions, TypecheckError> {
    log::trace!("typechecking {} root expressions", expressions.roots.len());
    let mut declarations = ForwardDeclarations::default();
    let mut imports = Vec::new();
    let mut preamble = Vec::new();

    // Indexed rather than `expressions.roots.iter_mut()`: each arm below
    // needs to call back into `expressions` (e.g. `expressions.import_c`),
    // which borrows the whole arena, not just `roots`, so `roots` can't
    // stay mutably borrowed for the loop's duration. Copying `kind` out
    // (it's `Copy`) ends the borrow before any such call.
    for index in 0..expressions.roots.len() {
        let kind = expressions.roots[index].kind;
        match kind {
            ExpressionKind::StructDeclaration(id) => {
                declarations.structs.push(expressions.struct_declaration(id).name.clone());
            },
            ExpressionKind::EnumDeclaration(id) => {
                declarations.enums.push(expressions.name_declaration(id).name.clone());
            },
            ExpressionKind::UnionDeclaration(id) => {
                declarations.unions.push(expressions.name_declaration(id).name.clone());
            },
            ExpressionKind::VariantDeclaration(id) => {
                declarations.variants.push(expressions.name_declaration(id).name.clone());
            },
            ExpressionKind::PublicFunction(id) => declarations.public_functions.push(id),
            ExpressionKind::PrivateFunction(id) => declarations.private_functions.push(id),
            ExpressionKind::PublicCFunction(id) => declarations.public_c_functions.push(id),
            ExpressionKind::PrivateCFunction(id) => declarations.private_c_functions.push(id),
            ExpressionKind::ImportC(id) => {
                let import = expressions.import_c(id).clone();
                if import.filename.span.length() <= 2 {
                    log::warn!("@import_c with an empty header filename");
                }
                imports.push(import);
                expressions.roots[index].kind = ExpressionKind::Moved;
            },
            ExpressionKind::InlineC(id) => {
                preamble.push(expressions.inline_c(id).clone());
                expressions.roots[index].kind = ExpressionKind::Moved;
            },
            // Variable/constant declarations need no forward declaration;
            // the generator emits their definitions directly.
            ExpressionKind::PublicVariableDeclaration(_)
            | ExpressionKind::PrivateVariableDeclaration(_)
            | ExpressionKind::PublicConstantDeclaration(_)
            | ExpressionKind::PrivateConstantDeclaration(_) => {},
            _ => {},
        }
    }

    log::debug!(
        "gathered {} struct, {} function forward declarations, {} imports, {} inline_c blocks",
        declarations.structs.len(),
        declarations.public_functions.len()
            + declarations.private_functions.len()
            + declarations.public_c_functions.len()
            + declarations.private_c_functions.len(),
        imports.len(),
        preamble.len(),
    );

    Ok(TypecheckedExpressions { expressions, declarations, imports, preamble })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::source::SourceFile;
    use crate::compiler::lex::Lexer;
    use crate::compiler::parse::parse;
    use std::rc::Rc;

    fn typecheck_ok(text: &str) -> TypecheckedExpressions {
        let source = SourceFile::from_str(text);
        let tokens = Lexer::lex(Rc::clone(&source)).unwrap();
        let parsed = parse(source, tokens).unwrap();
        typecheck(parsed).unwrap()
    }

    #[test]
    fn drains_root_level_import_c_and_tombstones_it() {
        let typechecked = typecheck_ok("@import_c(\"stdio.h\"); pub fn main() -> i32 { return 0; }");
        assert_eq!(typechecked.imports.len(), 1);
        assert!(matches!(typechecked.expressions.roots[0].kind, ExpressionKind::Moved));
    }

    #[test]
    fn partitions_functions_by_visibility_and_abi() {
        let typechecked = typecheck_ok(
            "pub fn a() -> i32 { return 0; } fn b() -> i32 { return 0; } \
             pub c_fn c() -> i32 { return 0; } c_fn d() -> i32 { return 0; }",
        );
        assert_eq!(typechecked.declarations.public_functions.len(), 1);
        assert_eq!(typechecked.declarations.private_functions.len(), 1);
        assert_eq!(typechecked.declarations.public_c_functions.len(), 1);
        assert_eq!(typechecked.declarations.private_c_functions.len(), 1);
    }

    #[test]
    fn an_empty_import_c_header_still_typechecks() {
        // Exercises the log::warn! path for a recoverable oddity; there's
        // nothing here to reject, so this must still succeed.
        let typechecked = typecheck_ok("@import_c(\"\");");
        assert_eq!(typechecked.imports.len(), 1);
        assert_eq!(typechecked.imports[0].filename.span.text(), "\"\"");
    }

    #[test]
    fn collects_struct_forward_declarations() {
        let typechecked = typecheck_ok("let Point = struct { x: i32, y: i32, };");
        assert_eq!(typechecked.declarations.structs.len(), 1);
        assert_eq!(typechecked.declarations.structs[0].span.text(), "Point");
    }
}
