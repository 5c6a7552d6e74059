//! The AST arena. Every node lives in a per-variant `Vec` owned by
//! `ParsedExpressions`; nodes refer to each other through typed `Id<T>`
//! indices, never through pointers or references. This keeps the tree
//! free of cycles by construction and makes "move a node's payload out"
//! (used by the typechecker to drain `ImportC`/`InlineC`) a simple
//! tombstone: rewrite the `Expression`'s kind to `Moved`.

use std::marker::PhantomData;

use crate::common::span::Spanned;
use crate::construct::token::Token;

/// A token together with the source span it was lexed from. AST nodes
/// store this instead of a bare `Token` wherever the generator needs to
/// recover the original text (names, type names, literal values).
pub type Lexeme = Spanned<Token>;

/// A typed index into one of `ParsedExpressions`'s per-variant vectors.
/// `PhantomData<fn() -> T>` avoids requiring `T: Copy` for `Id<T>` itself
/// to be `Copy`.
pub struct Id<T> {
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    fn new(index: u32) -> Id<T> {
        Id { index, _marker: PhantomData }
    }

    pub fn index(&self) -> usize {
        self.index as usize
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Id<T> { *self }
}
impl<T> Copy for Id<T> {}
impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Id<T>) -> bool { self.index == other.index }
}
impl<T> Eq for Id<T> {}
impl<T> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Id({})", self.index)
    }
}

/// A name/type pair, used for both function parameters and struct members.
/// Order matters: iteration order must match source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: Lexeme,
    pub type_token: Lexeme,
}

pub type Parameters = Vec<Variable>;
pub type Members = Vec<Variable>;

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub token: Lexeme,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LValue {
    pub token: Lexeme,
}

/// A flat, unparsed sequence of sub-expressions: operands and operator
/// tokens-as-literals interleaved in source order. Operator precedence is
/// not resolved here.
#[derive(Debug, Clone, PartialEq)]
pub struct RValue {
    pub expressions: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub expressions: Vec<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct If {
    pub condition: Id<RValue>,
    pub block: Id<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct While {
    pub condition: Id<RValue>,
    pub block: Id<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Return {
    pub rvalue: Id<RValue>,
}

/// Shared record for all four function kinds (private/public x native/C-ABI).
/// Which kind a given node is, is carried by the `ExpressionKind` tag that
/// wraps its `Id<Function>`, not by this struct.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Lexeme,
    pub return_type: Lexeme,
    pub parameters: Id<Parameters>,
    pub block: Id<Block>,
}

/// Shared record for all four variable/constant declaration kinds.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub name: Lexeme,
    pub type_token: Lexeme,
    pub value: Id<RValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDeclaration {
    pub name: Lexeme,
    pub members: Id<Members>,
}

/// Enum/union/variant forward declarations hold only a name at this design
/// tier; no parser production constructs them yet, but the variant set
/// stays forward-compatible with the future richer declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct NameDeclaration {
    pub name: Lexeme,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInit {
    pub name: Lexeme,
    pub value: Id<RValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructInitializer {
    pub type_token: Lexeme,
    pub fields: Id<Vec<FieldInit>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: Lexeme,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportC {
    pub filename: Lexeme,
}

/// Raw C text is not itself a token kind, so an `InlineC` node records the
/// source span its content covers directly (excluding the `inline_c`
/// keyword, the surrounding braces or trailing `;`); the code generator
/// recovers the original bytes with `span.text()`. Computed at parse time
/// by combining the first and last content token's spans, so the
/// generator never needs the token stream itself.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineC {
    pub span: crate::common::span::Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerProvidedU64 {
    pub value: u64,
}

/// The tag plus payload identifier of an `Expression`. Each non-sentinel
/// arm carries the `Id<T>` of its record in the matching `ParsedExpressions`
/// vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionKind {
    Literal(Id<Literal>),
    LValue(Id<LValue>),
    RValue(Id<RValue>),
    Block(Id<Block>),
    If(Id<If>),
    While(Id<While>),
    Return(Id<Return>),
    PrivateFunction(Id<Function>),
    PublicFunction(Id<Function>),
    PrivateCFunction(Id<Function>),
    PublicCFunction(Id<Function>),
    PrivateVariableDeclaration(Id<VariableDeclaration>),
    PublicVariableDeclaration(Id<VariableDeclaration>),
    PrivateConstantDeclaration(Id<VariableDeclaration>),
    PublicConstantDeclaration(Id<VariableDeclaration>),
    StructDeclaration(Id<StructDeclaration>),
    EnumDeclaration(Id<NameDeclaration>),
    UnionDeclaration(Id<NameDeclaration>),
    VariantDeclaration(Id<NameDeclaration>),
    StructInitializer(Id<StructInitializer>),
    FunctionCall(Id<FunctionCall>),
    ImportC(Id<ImportC>),
    InlineC(Id<InlineC>),
    CompilerProvidedU64(Id<CompilerProvidedU64>),
    /// A node whose payload was drained by the typechecker (`ImportC`/
    /// `InlineC` move-out). Should never reach the code generator's body
    /// walk — it is skipped there by construction.
    Moved,
    /// Diagnostic sentinel; should never be reached in a successful
    /// compilation.
    Invalid,
}

/// A node in the AST: a tagged payload identifier plus the half-open token
/// span `[start_token, end_token)` it was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub start_token: u32,
    pub end_token: u32,
}

impl Expression {
    pub fn new(kind: ExpressionKind, start_token: u32, end_token: u32) -> Expression {
        Expression { kind, start_token, end_token }
    }
}

macro_rules! arena {
    ($field:ident, $push:ident, $get:ident, $get_mut:ident, $ty:ty) => {
        pub fn $push(&mut self, value: $ty) -> Id<$ty> {
            self.$field.push(value);
            Id::new((self.$field.len() - 1) as u32)
        }

        pub fn $get(&self, id: Id<$ty>) -> &$ty {
            &self.$field[id.index()]
        }

        pub fn $get_mut(&mut self, id: Id<$ty>) -> &mut $ty {
            &mut self.$field[id.index()]
        }
    };
}

/// The single owner of every AST node produced for one compilation. Root
/// expressions (top-level declarations, in source order) live in `roots`;
/// everything else lives in one of the per-variant arenas below and is
/// reached only through an `Id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedExpressions {
    pub roots: Vec<Expression>,

    literals: Vec<Literal>,
    lvalues: Vec<LValue>,
    rvalues: Vec<RValue>,
    blocks: Vec<Block>,
    ifs: Vec<If>,
    whiles: Vec<While>,
    returns: Vec<Return>,
    functions: Vec<Function>,
    variable_declarations: Vec<VariableDeclaration>,
    struct_declarations: Vec<StructDeclaration>,
    name_declarations: Vec<NameDeclaration>,
    struct_initializers: Vec<StructInitializer>,
    field_inits: Vec<Vec<FieldInit>>,
    function_calls: Vec<FunctionCall>,
    import_cs: Vec<ImportC>,
    inline_cs: Vec<InlineC>,
    compiler_provided_u64s: Vec<CompilerProvidedU64>,
    parameters: Vec<Parameters>,
    members: Vec<Members>,
}

impl ParsedExpressions {
    pub fn new() -> ParsedExpressions {
        ParsedExpressions::default()
    }

    arena!(literals, push_literal, literal, literal_mut, Literal);
    arena!(lvalues, push_lvalue, lvalue, lvalue_mut, LValue);
    arena!(rvalues, push_rvalue, rvalue, rvalue_mut, RValue);
    arena!(blocks, push_block, block, block_mut, Block);
    arena!(ifs, push_if, if_, if_mut, If);
    arena!(whiles, push_while, while_, while_mut, While);
    arena!(returns, push_return, return_, return_mut, Return);
    arena!(functions, push_function, function, function_mut, Function);
    arena!(
        variable_declarations,
        push_variable_declaration,
        variable_declaration,
        variable_declaration_mut,
        VariableDeclaration
    );
    arena!(
        struct_declarations,
        push_struct_declaration,
        struct_declaration,
        struct_declaration_mut,
        StructDeclaration
    );
    arena!(
        name_declarations,
        push_name_declaration,
        name_declaration,
        name_declaration_mut,
        NameDeclaration
    );
    arena!(
        struct_initializers,
        push_struct_initializer,
        struct_initializer,
        struct_initializer_mut,
        StructInitializer
    );
    arena!(function_calls, push_function_call, function_call, function_call_mut, FunctionCall);
    arena!(import_cs, push_import_c, import_c, import_c_mut, ImportC);
    arena!(inline_cs, push_inline_c, inline_c, inline_c_mut, InlineC);
    arena!(
        compiler_provided_u64s,
        push_compiler_provided_u64,
        compiler_provided_u64,
        compiler_provided_u64_mut,
        CompilerProvidedU64
    );
    arena!(parameters, push_parameters, parameters_list, parameters_list_mut, Parameters);
    arena!(members, push_members, members_list, members_list_mut, Members);

    pub fn push_field_inits(&mut self, fields: Vec<FieldInit>) -> Id<Vec<FieldInit>> {
        self.field_inits.push(fields);
        Id::new((self.field_inits.len() - 1) as u32)
    }

    pub fn field_inits(&self, id: Id<Vec<FieldInit>>) -> &[FieldInit] {
        &self.field_inits[id.index()]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::source::SourceFile;
    use crate::common::span::Span;

    fn lexeme(kind: Token) -> Lexeme {
        let source = SourceFile::from_str("x");
        Spanned::new(kind, Span::point(&source, 0))
    }

    #[test]
    fn arena_round_trips_by_id() {
        let mut expressions = ParsedExpressions::new();
        let token = lexeme(Token::Number);
        let id = expressions.push_literal(Literal { token: token.clone() });
        assert_eq!(expressions.literal(id).token, token);
    }

    #[test]
    fn ids_are_not_interchangeable_across_arenas() {
        let mut expressions = ParsedExpressions::new();
        let literal_id = expressions.push_literal(Literal { token: lexeme(Token::Number) });
        let lvalue_id = expressions.push_lvalue(LValue { token: lexeme(Token::Identifier) });
        assert_ne!(literal_id.index(), usize::MAX);
        assert_eq!(lvalue_id.index(), 0);
    }
}
