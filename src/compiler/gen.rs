//! Walks a `TypecheckedExpressions` and writes a C translation unit into an
//! `OutputSink`. Emission order is fixed and does not follow source order
//! for the first few zones: fixed prelude, `#include`s, root-level
//! `inline_c` passthrough, struct typedef forward declarations, then
//! function forward declarations (public native, private native, public
//! C-ABI, private C-ABI, in that order — private ones prefixed `static`).
//! Only after those five zones does the generator walk the remaining roots
//! in source order, emitting full definitions.

use std::io::{self, Write};

use crate::compiler::sink::{OutputSink, DEFAULT_CAPACITY};
use crate::compiler::typecheck::{ForwardDeclarations, TypecheckedExpressions};
use crate::construct::expression::{
    Block, Expression, ExpressionKind, Function, FunctionCall, Id, RValue, StructDeclaration,
    StructInitializer, Variable, VariableDeclaration,
};
use crate::construct::ParsedExpressions;

/// Fixed aliases and macros every generated translation unit opens with.
/// `let`/`var` expand via `__auto_type` so a declaration's storage type can
/// be recovered from its initializer without the generator ever inferring
/// types itself; this is also why the compiler is invoked with
/// `-Wno-duplicate-decl-specifier` — an explicit `: TYPE` on a `let` still
/// carries its own `const`, so `let const` expands to `__auto_type const
/// const`.
const PRELUDE: &str = "\
#include <stdint.h>
#include <stddef.h>

typedef int8_t i8;
typedef int16_t i16;
typedef int32_t i32;
typedef int64_t i64;
typedef uint8_t u8;
typedef uint16_t u16;
typedef uint32_t u32;
typedef uint64_t u64;
typedef float f32;
typedef double f64;

typedef int c_int;
typedef unsigned int c_uint;
typedef long c_long;
typedef unsigned long c_ulong;
typedef size_t usize;
typedef char const *c_string;

#define true 1
#define false 0
#define let __auto_type const
#define var __auto_type

";

pub fn generate(typechecked: &TypecheckedExpressions) -> io::Result<Vec<u8>> {
    log::trace!("generating C for {} root expressions", typechecked.expressions.roots.len());
    let mut generator = Generator { expressions: &typechecked.expressions, sink: OutputSink::new(DEFAULT_CAPACITY) };

    generator.write_prelude()?;
    generator.write_imports(typechecked)?;
    generator.write_preamble(typechecked)?;
    generator.write_struct_forward_declarations(&typechecked.declarations)?;
    generator.write_function_forward_declarations(&typechecked.declarations)?;
    generator.write_bodies()?;

    let generated = generator.sink.finish();
    log::debug!("generated {} bytes of C", generated.len());
    Ok(generated)
}

struct Generator<'a> {
    expressions: &'a ParsedExpressions,
    sink: OutputSink,
}

impl<'a> Generator<'a> {
    fn write_prelude(&mut self) -> io::Result<()> {
        write!(self.sink, "{}", PRELUDE)
    }

    fn write_imports(&mut self, typechecked: &TypecheckedExpressions) -> io::Result<()> {
        for import in &typechecked.imports {
            writeln!(self.sink, "#include {}", import.filename.span.text())?;
        }
        Ok(())
    }

    fn write_preamble(&mut self, typechecked: &TypecheckedExpressions) -> io::Result<()> {
        for item in &typechecked.preamble {
            writeln!(self.sink, "{}", item.span.text())?;
        }
        Ok(())
    }

    fn write_struct_forward_declarations(&mut self, declarations: &ForwardDeclarations) -> io::Result<()> {
        for name in &declarations.structs {
            writeln!(self.sink, "typedef struct {0} {0};", name.span.text())?;
        }
        Ok(())
    }

    /// Four passes, in a fixed order: public native, private native, public
    /// C-ABI, private C-ABI. A C-ABI function forward
    /// declares identically to a native one — the ABI tag only changes which
    /// pass a function is visited in, not what text is emitted for it.
    fn write_function_forward_declarations(&mut self, declarations: &ForwardDeclarations) -> io::Result<()> {
        for &id in &declarations.public_functions {
            self.write_function_forward_declaration(id, true)?;
        }
        for &id in &declarations.private_functions {
            self.write_function_forward_declaration(id, false)?;
        }
        for &id in &declarations.public_c_functions {
            self.write_function_forward_declaration(id, true)?;
        }
        for &id in &declarations.private_c_functions {
            self.write_function_forward_declaration(id, false)?;
        }
        Ok(())
    }

    fn write_function_forward_declaration(&mut self, id: Id<Function>, is_public: bool) -> io::Result<()> {
        let function = self.expressions.function(id);
        if !is_public {
            write!(self.sink, "static ")?;
        }
        write!(self.sink, "{} {}", function.return_type.span.text(), function.name.span.text())?;
        self.dump_parameters(self.expressions.parameters_list(function.parameters))?;
        writeln!(self.sink, ";")
    }

    fn dump_parameters(&mut self, parameters: &[Variable]) -> io::Result<()> {
        if parameters.is_empty() {
            return write!(self.sink, "(void)");
        }
        write!(self.sink, "(")?;
        for (index, parameter) in parameters.iter().enumerate() {
            if index > 0 {
                write!(self.sink, ", ")?;
            }
            write!(self.sink, "{} {}", parameter.type_token.span.text(), parameter.name.span.text())?;
        }
        write!(self.sink, ")")
    }

    /// The remaining roots, in source order. `Moved` roots (drained
    /// `@import_c`/`inline_c` items, already emitted above) are skipped;
    /// anything else reaching here outside this set of kinds is a parser
    /// bug, since nothing else can appear at the root.
    fn write_bodies(&mut self) -> io::Result<()> {
        let roots = self.expressions.roots.clone();
        for root in &roots {
            match root.kind {
                ExpressionKind::PublicFunction(id) => self.dump_function_definition(id, true)?,
                ExpressionKind::PrivateFunction(id) => self.dump_function_definition(id, false)?,
                ExpressionKind::PublicCFunction(id) => self.dump_function_definition(id, true)?,
                ExpressionKind::PrivateCFunction(id) => self.dump_function_definition(id, false)?,
                ExpressionKind::PublicVariableDeclaration(id) => self.dump_variable_declaration(id, true, false)?,
                ExpressionKind::PrivateVariableDeclaration(id) => self.dump_variable_declaration(id, false, false)?,
                ExpressionKind::PublicConstantDeclaration(id) => self.dump_variable_declaration(id, true, true)?,
                ExpressionKind::PrivateConstantDeclaration(id) => self.dump_variable_declaration(id, false, true)?,
                ExpressionKind::StructDeclaration(id) => self.dump_struct_declaration(id)?,
                ExpressionKind::EnumDeclaration(_)
                | ExpressionKind::UnionDeclaration(_)
                | ExpressionKind::VariantDeclaration(_) => {
                    // Name-only forward declarations; no body to emit yet.
                },
                ExpressionKind::Moved => {},
                other => unreachable!("{:?} cannot appear as a root expression", other),
            }
        }
        Ok(())
    }

    fn dump_function_definition(&mut self, id: Id<Function>, is_public: bool) -> io::Result<()> {
        let function = self.expressions.function(id);
        if !is_public {
            write!(self.sink, "static ")?;
        }
        write!(self.sink, "{} {}", function.return_type.span.text(), function.name.span.text())?;
        self.dump_parameters(self.expressions.parameters_list(function.parameters))?;
        writeln!(self.sink, "{{")?;
        self.dump_block_contents(function.block)?;
        writeln!(self.sink, "}}")
    }

    fn dump_variable_declaration(
        &mut self,
        id: Id<VariableDeclaration>,
        is_public: bool,
        is_constant: bool,
    ) -> io::Result<()> {
        let declaration = self.expressions.variable_declaration(id);
        if !is_public {
            write!(self.sink, "static ")?;
        }
        write!(self.sink, "{}", declaration.type_token.span.text())?;
        if is_constant {
            write!(self.sink, " const")?;
        }
        write!(self.sink, " {} = ", declaration.name.span.text())?;
        self.dump_rvalue(declaration.value, true)?;
        writeln!(self.sink, ";")
    }

    fn dump_struct_declaration(&mut self, id: Id<StructDeclaration>) -> io::Result<()> {
        let declaration = self.expressions.struct_declaration(id);
        writeln!(self.sink, "struct {}{{", declaration.name.span.text())?;
        for member in self.expressions.members_list(declaration.members) {
            writeln!(self.sink, "{} {};", member.type_token.span.text(), member.name.span.text())?;
        }
        writeln!(self.sink, "}};")
    }

    /// A bare `{ ... }` block statement, or an `if`/`while` body: writes its
    /// own braces. A function's own body uses `dump_block_contents` directly
    /// instead, since its opening brace attaches to the signature with no
    /// intervening space.
    fn dump_block(&mut self, id: Id<Block>) -> io::Result<()> {
        writeln!(self.sink, "{{")?;
        self.dump_block_contents(id)?;
        writeln!(self.sink, "}}")
    }

    fn dump_block_contents(&mut self, id: Id<Block>) -> io::Result<()> {
        let statements = self.expressions.block(id).expressions.clone();
        for statement in &statements {
            self.dump_statement(statement)?;
        }
        Ok(())
    }

    fn dump_statement(&mut self, statement: &Expression) -> io::Result<()> {
        match statement.kind {
            ExpressionKind::Block(id) => self.dump_block(id),
            ExpressionKind::If(id) => self.dump_if(id),
            ExpressionKind::While(id) => self.dump_while(id),
            ExpressionKind::Return(id) => self.dump_return(id),
            // Only reachable for inline_c nested inside a function body:
            // root-level inline_c was already drained into the preamble and
            // tombstoned to `Moved` before the generator ever sees it.
            ExpressionKind::InlineC(id) => writeln!(self.sink, "{}", self.expressions.inline_c(id).span.text()),
            ExpressionKind::RValue(id) => {
                self.dump_rvalue(id, true)?;
                writeln!(self.sink, ";")
            },
            ExpressionKind::PublicVariableDeclaration(id) => self.dump_variable_declaration(id, true, false),
            ExpressionKind::PrivateVariableDeclaration(id) => self.dump_variable_declaration(id, false, false),
            ExpressionKind::PublicConstantDeclaration(id) => self.dump_variable_declaration(id, true, true),
            ExpressionKind::PrivateConstantDeclaration(id) => self.dump_variable_declaration(id, false, true),
            other => unreachable!("{:?} cannot appear as a block statement", other),
        }
    }

    fn dump_if(&mut self, id: Id<crate::construct::expression::If>) -> io::Result<()> {
        let node = self.expressions.if_(id);
        write!(self.sink, "if (")?;
        self.dump_rvalue(node.condition, true)?;
        write!(self.sink, ") ")?;
        self.dump_block(node.block)
    }

    fn dump_while(&mut self, id: Id<crate::construct::expression::While>) -> io::Result<()> {
        let node = self.expressions.while_(id);
        write!(self.sink, "while (")?;
        self.dump_rvalue(node.condition, true)?;
        write!(self.sink, ") ")?;
        self.dump_block(node.block)
    }

    fn dump_return(&mut self, id: Id<crate::construct::expression::Return>) -> io::Result<()> {
        let rvalue = self.expressions.return_(id).rvalue;
        write!(self.sink, "return ")?;
        self.dump_rvalue(rvalue, true)?;
        writeln!(self.sink, ";")
    }

    /// Emits each item's own text, concatenated with no inserted separators
    /// — operators and operands are copied through exactly as they were
    /// lexed. `in_rvalue_expression` is threaded down to suppress a nested
    /// `FunctionCall`'s own trailing `;`; only a call that is itself an
    /// entire statement gets one, and statements supply that via their own
    /// wrapper (`dump_statement`'s `RValue` arm), so every item dumped from
    /// here is always "inside" an rvalue from the call's point of view.
    fn dump_rvalue(&mut self, id: Id<RValue>, in_rvalue_expression: bool) -> io::Result<()> {
        let items = self.expressions.rvalue(id).expressions.clone();
        for item in &items {
            self.dump_expression(item, in_rvalue_expression)?;
        }
        Ok(())
    }

    fn dump_expression(&mut self, expression: &Expression, in_rvalue_expression: bool) -> io::Result<()> {
        match expression.kind {
            ExpressionKind::Literal(id) => write!(self.sink, "{}", self.expressions.literal(id).token.span.text()),
            ExpressionKind::LValue(id) => write!(self.sink, "{}", self.expressions.lvalue(id).token.span.text()),
            ExpressionKind::RValue(id) => self.dump_rvalue(id, in_rvalue_expression),
            // `@uninitialized()` materializes as an empty block expression.
            ExpressionKind::Block(id) => self.dump_block(id),
            ExpressionKind::FunctionCall(id) => self.dump_function_call(id, in_rvalue_expression),
            ExpressionKind::StructInitializer(id) => self.dump_struct_initializer(id),
            ExpressionKind::CompilerProvidedU64(id) => {
                write!(self.sink, "{}", self.expressions.compiler_provided_u64(id).value)
            },
            other => unreachable!("{:?} cannot appear inside an rvalue", other),
        }
    }

    fn dump_function_call(&mut self, id: Id<FunctionCall>, in_rvalue_expression: bool) -> io::Result<()> {
        let call = self.expressions.function_call(id);
        write!(self.sink, "{}(", call.name.span.text())?;
        let arguments = call.arguments.clone();
        for (index, argument) in arguments.iter().enumerate() {
            if index > 0 {
                write!(self.sink, ", ")?;
            }
            self.dump_expression(argument, true)?;
        }
        write!(self.sink, ")")?;
        if !in_rvalue_expression {
            write!(self.sink, ";")?;
        }
        Ok(())
    }

    /// `(T){ .f1 = RV1, .f2 = RV2 };` — the trailing `;` is emitted even
    /// when the initializer is itself used as an rvalue (e.g. the right side
    /// of `var p: Point = Point { ... };`), which then carries a second `;`
    /// from the declaration statement. Harmless in valid C, and left as-is.
    fn dump_struct_initializer(&mut self, id: Id<StructInitializer>) -> io::Result<()> {
        let initializer = self.expressions.struct_initializer(id);
        write!(self.sink, "({}){{ ", initializer.type_token.span.text())?;
        let fields = self.expressions.field_inits(initializer.fields).to_vec();
        for (index, field) in fields.iter().enumerate() {
            if index > 0 {
                write!(self.sink, ", ")?;
            }
            write!(self.sink, ".{} = ", field.name.span.text())?;
            self.dump_rvalue(field.value, true)?;
        }
        write!(self.sink, " }};")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::source::SourceFile;
    use crate::compiler::lex::Lexer;
    use crate::compiler::parse::parse;
    use crate::compiler::typecheck::typecheck;
    use std::rc::Rc;

    fn generate_text(text: &str) -> String {
        let source = SourceFile::from_str(text);
        let tokens = Lexer::lex(Rc::clone(&source)).unwrap();
        let parsed = parse(source, tokens).unwrap();
        let typechecked = typecheck(parsed).unwrap();
        String::from_utf8(generate(&typechecked).unwrap()).unwrap()
    }

    fn assert_contains(haystack: &str, needle: &str) {
        assert!(haystack.contains(needle), "expected output to contain {:?}, got:\n{}", needle, haystack);
    }

    #[test]
    fn prelude_is_always_first() {
        let output = generate_text("pub fn main() -> i32 { return 0; }");
        assert!(output.starts_with("#include <stdint.h>"));
    }

    #[test]
    fn minimal_function_emits_signature_and_return() {
        let output = generate_text("pub fn main() -> i32 { return 0; }");
        assert_contains(&output, "i32 main(void){\nreturn 0;\n}");
    }

    #[test]
    fn private_functions_forward_declare_as_static() {
        let output = generate_text("fn helper() -> i32 { return 0; } pub fn main() -> i32 { return 0; }");
        assert_contains(&output, "static i32 helper(void);");
        assert_contains(&output, "i32 main(void);");
    }

    #[test]
    fn inline_c_preamble_passes_through_verbatim() {
        let output = generate_text("inline_c { int g = 7; } pub fn main() -> i32 { return 0; }");
        assert_contains(&output, "int g = 7;");
    }

    #[test]
    fn struct_declaration_emits_typedef_and_body() {
        let output = generate_text("let Point = struct { x: i32, y: i32, };");
        assert_contains(&output, "typedef struct Point Point;");
        assert_contains(&output, "struct Point{\ni32 x;\ni32 y;\n};");
    }

    #[test]
    fn import_c_becomes_an_include_directive() {
        let output = generate_text("@import_c(\"stdio.h\"); pub fn main() -> i32 { return 0; }");
        assert_contains(&output, "#include \"stdio.h\"");
    }

    #[test]
    fn function_call_statement_gets_a_trailing_semicolon() {
        let output = generate_text(
            "c_fn puts(message: c_string) -> i32 { return 0; } \
             pub fn main() -> i32 { puts(\"hi\"); return 0; }",
        );
        assert_contains(&output, "puts(\"hi\");");
    }

    #[test]
    fn nested_function_call_argument_has_no_semicolon_of_its_own() {
        let output = generate_text(
            "c_fn puts(message: c_string) -> i32 { return 0; } \
             c_fn greeting() -> c_string { return 0; } \
             pub fn main() -> i32 { puts(greeting()); return 0; }",
        );
        assert_contains(&output, "puts(greeting());");
        assert!(!output.contains("greeting();"));
    }

    #[test]
    fn variable_declaration_defaults_to_auto_type_macro() {
        let output = generate_text("pub fn main() -> i32 { var counter = 0; return 0; }");
        assert_contains(&output, "var counter = 0;");
    }

    #[test]
    fn explicit_type_variable_declaration_uses_the_annotation() {
        let output = generate_text("pub fn main() -> i32 { var counter: i32 = 0; return 0; }");
        assert_contains(&output, "i32 counter = 0;");
    }

    #[test]
    fn constant_declaration_adds_const_after_the_type() {
        let output = generate_text("let ANSWER: i32 = 42; pub fn main() -> i32 { return 0; }");
        assert_contains(&output, "i32 const ANSWER = 42;");
    }

    #[test]
    fn if_and_while_wrap_their_block_with_a_space_before_the_brace() {
        let output = generate_text(
            "pub fn main() -> i32 { var i: i32 = 0; while i <= 10 { i = i + 1; } if i <= 10 { return 1; } return 0; }",
        );
        assert_contains(&output, "while (i<=10) {\n");
        assert_contains(&output, "if (i<=10) {\n");
    }

    #[test]
    fn struct_initializer_keeps_its_trailing_semicolon() {
        let output = generate_text(
            "let Point = struct { x: i32, y: i32, }; \
             pub fn main() -> i32 { var p: Point = Point { x: 1, y: 2, }; return 0; }",
        );
        assert_contains(&output, "(Point){ .x = 1, .y = 2 };");
    }

    /// Testable property 5: prelude, then `#include`s, then inline-C,
    /// then struct forward declarations, then function forward
    /// declarations, then bodies — in that order, regardless of source
    /// order (the struct declaration and the `@import_c`/`inline_c` items
    /// are deliberately interleaved with the function in the input below).
    #[test]
    fn emission_order_matches_the_fixed_five_zone_layout() {
        let output = generate_text(
            "pub fn main() -> i32 { return 0; }\n\
             let Point = struct { x: i32, y: i32, };\n\
             inline_c { int g = 7; }\n\
             @import_c(\"stdio.h\");",
        );

        let prelude_at = output.find("#include <stdint.h>").unwrap();
        let include_at = output.find("#include \"stdio.h\"").unwrap();
        let inline_c_at = output.find("int g = 7;").unwrap();
        let struct_fwd_at = output.find("typedef struct Point Point;").unwrap();
        let fn_fwd_at = output.find("i32 main(void);").unwrap();
        let struct_body_at = output.find("struct Point{").unwrap();
        let fn_body_at = output.find("i32 main(void){").unwrap();

        assert!(prelude_at < include_at, "prelude must come before #include lines");
        assert!(include_at < inline_c_at, "#include lines must come before inline_c passthrough");
        assert!(inline_c_at < struct_fwd_at, "inline_c must come before struct forward declarations");
        assert!(struct_fwd_at < fn_fwd_at, "struct forward declarations must come before function ones");
        assert!(fn_fwd_at < fn_body_at, "all forward declarations must come before any body");
        assert!(fn_body_at < struct_body_at, "bodies are emitted in source order");
    }

    #[test]
    fn moved_root_items_leave_no_trace_in_the_body_walk() {
        let output =
            generate_text("@import_c(\"stdio.h\"); inline_c { int g = 7; } pub fn main() -> i32 { return 0; }");
        // Exactly one copy of each: the pre-body zone, never repeated in the
        // body walk since the root was tombstoned to `Moved`.
        assert_eq!(output.matches("#include \"stdio.h\"").count(), 1);
        assert_eq!(output.matches("int g = 7;").count(), 1);
    }
}
