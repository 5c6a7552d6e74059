//! Recursive-descent parser: `Tokens` in, a `ParsedExpressions` arena plus
//! root-level `Expression`s out. Parsing never backtracks across a root
//! item: a production that fails returns its `ParseError` immediately and
//! the whole parse is abandoned rather than attempting recovery mid-file.
//!
//! Operator precedence is deliberately NOT resolved here. An `RValue` is a
//! flat, source-ordered sequence of sub-expressions (operands and operator
//! tokens alike); whatever consumes the typed IR later is responsible for
//! giving those tokens meaning.

use std::rc::Rc;

use crate::common::source::SourceFile;
use crate::common::span::Span;
use crate::compiler::syntax::ParseError;
use crate::construct::expression::{
    Block, CompilerProvidedU64, Expression, ExpressionKind, FieldInit, Function, FunctionCall,
    Id, ImportC, InlineC, If, LValue, Lexeme, Literal, Parameters, RValue, Return,
    StructDeclaration, StructInitializer, Variable, VariableDeclaration, While,
};
use crate::construct::token::{Token, Tokens};
use crate::construct::ParsedExpressions;

pub fn parse(source: Rc<SourceFile>, tokens: Tokens) -> Result<ParsedExpressions, ParseError> {
    log::trace!("parsing {} ({} tokens)", source.name.display(), tokens.len());
    let mut parser = Parser { source, tokens, index: 0, expressions: ParsedExpressions::new() };
    parser.parse_root()?;
    log::debug!("parsed {} root expressions", parser.expressions.roots.len());
    Ok(parser.expressions)
}

/// What a flat rvalue scan should stop at, without consuming it.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Stop {
    /// Statement context: `;` ends it.
    Semicolon,
    /// `if`/`while` condition context: the block's `{` ends it.
    OpenCurly,
    /// Call-argument context: `,` or `)` ends it, whichever comes first.
    ArgumentBoundary,
}

struct Parser {
    source: Rc<SourceFile>,
    tokens: Tokens,
    index: usize,
    expressions: ParsedExpressions,
}

impl Parser {
    fn at_end(&self) -> bool {
        self.index >= self.tokens.len()
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.index).map(|t| t.item)
    }

    fn check(&self, token: Token) -> bool {
        self.peek() == Some(token)
    }

    /// A byte span to anchor an error at: the current token's span, or a
    /// point at end-of-file when there are no more tokens.
    fn current_span(&self) -> Span {
        match self.tokens.get(self.index) {
            Some(spanned) => spanned.span.clone(),
            None => Span::point(&self.source, self.source.text.len().saturating_sub(1)),
        }
    }

    fn advance(&mut self) -> Lexeme {
        let spanned = self.tokens[self.index].clone();
        self.index += 1;
        spanned
    }

    fn expect(&mut self, token: Token, production: &'static str) -> Result<Lexeme, ParseError> {
        if self.check(token) {
            Ok(self.advance())
        } else {
            let found = self.peek().map(|t| t.to_string()).unwrap_or_else(|| "end of file".to_string());
            Err(ParseError::new(
                format!("expected {}, found {}", token, found),
                None,
                self.current_span(),
                production,
            ))
        }
    }

    fn error(&self, message: impl Into<String>, hint: Option<&str>, production: &'static str) -> ParseError {
        ParseError::new(message, hint, self.current_span(), production)
    }

    // ---- root items ------------------------------------------------------

    fn parse_root(&mut self) -> Result<(), ParseError> {
        while !self.at_end() {
            let item = self.parse_root_item()?;
            self.expressions.roots.push(item);
        }
        Ok(())
    }

    fn parse_root_item(&mut self) -> Result<Expression, ParseError> {
        let start = self.index as u32;
        let is_public = if self.check(Token::Pub) {
            self.advance();
            true
        } else {
            false
        };

        match self.peek() {
            Some(Token::Fn) => self.parse_function(start, is_public, false),
            Some(Token::CFn) => self.parse_function(start, is_public, true),
            Some(Token::Let) => self.parse_let(start, is_public),
            Some(Token::Var) => self.parse_variable_declaration(start, is_public, false),
            Some(Token::ImportC) => self.parse_import_c(start),
            Some(Token::InlineC) => self.parse_inline_c_statement(start, "parse_root_item"),
            _ => Err(self.error("expected a root item", None, "parse_root_item")),
        }
    }

    /// Shared by all four function-kind root items: only the visibility
    /// and calling-convention tags differ, not the grammar.
    fn parse_function(&mut self, start: u32, is_public: bool, is_c: bool) -> Result<Expression, ParseError> {
        let production = "parse_function";
        self.expect(if is_c { Token::CFn } else { Token::Fn }, production)?;
        let name = self.expect(Token::Identifier, production)?;
        self.expect(Token::OpenParen, production)?;
        let parameters = self.parse_parameters(production)?;
        self.expect(Token::Arrow, production)?;
        let return_type = self.expect(Token::Identifier, production)?;
        let block = self.parse_block(production)?;
        let end = self.index as u32;

        let parameters_id = self.expressions.push_parameters(parameters);
        let function_id =
            self.expressions.push_function(Function { name, return_type, parameters: parameters_id, block });

        let kind = match (is_public, is_c) {
            (true, false) => ExpressionKind::PublicFunction(function_id),
            (false, false) => ExpressionKind::PrivateFunction(function_id),
            (true, true) => ExpressionKind::PublicCFunction(function_id),
            (false, true) => ExpressionKind::PrivateCFunction(function_id),
        };
        Ok(Expression::new(kind, start, end))
    }

    fn parse_parameters(&mut self, production: &'static str) -> Result<Parameters, ParseError> {
        let mut parameters = Vec::new();
        if self.check(Token::CloseParen) {
            self.advance();
            return Ok(parameters);
        }
        loop {
            let name = self.expect(Token::Identifier, production)?;
            self.expect(Token::Colon, production)?;
            let type_token = self.expect(Token::Identifier, production)?;
            parameters.push(Variable { name, type_token });
            if self.check(Token::Comma) {
                self.advance();
                continue;
            }
            self.expect(Token::CloseParen, production)?;
            break;
        }
        Ok(parameters)
    }

    /// `let NAME [: TYPE] = struct { MEMBERS } ;` or `let NAME [: TYPE] =
    /// RVALUE ;`. Both forms share the `NAME [: TYPE] =` prefix; only after
    /// consuming `=` do we know which production we're in, by peeking for
    /// the `struct` keyword. An omitted `: TYPE` defaults to the `let`
    /// keyword's own lexeme, so the generator emits `let` verbatim and the
    /// prelude's `#define let __auto_type const` resolves it.
    fn parse_let(&mut self, start: u32, is_public: bool) -> Result<Expression, ParseError> {
        let production = "parse_top_level_constant_or_struct";
        let let_keyword = self.expect(Token::Let, production)?;
        let name = self.expect(Token::Identifier, production)?;
        let annotation = if self.check(Token::Colon) {
            self.advance();
            Some(self.expect(Token::Identifier, production)?)
        } else {
            None
        };
        self.expect(Token::Assign, production)?;

        if self.check(Token::Struct) {
            self.parse_struct_body(start, name)
        } else {
            let value = self.parse_rvalue(Stop::Semicolon, production)?;
            self.expect(Token::Semicolon, production).map_err(|e| hinted(e, "did you forget a semicolon?"))?;
            let end = self.index as u32;
            let type_token = annotation.unwrap_or(let_keyword);
            let id = self.expressions.push_variable_declaration(VariableDeclaration { name, type_token, value });
            let kind = if is_public {
                ExpressionKind::PublicConstantDeclaration(id)
            } else {
                ExpressionKind::PrivateConstantDeclaration(id)
            };
            Ok(Expression::new(kind, start, end))
        }
    }

    /// `struct { NAME : TYPE , ... , }` — a trailing comma is required
    /// before the closing brace, not merely accepted.
    fn parse_struct_body(&mut self, start: u32, name: Lexeme) -> Result<Expression, ParseError> {
        let production = "parse_struct";
        self.expect(Token::Struct, production)?;
        self.expect(Token::OpenCurly, production)?;

        let mut members = Vec::new();
        while !self.check(Token::CloseCurly) {
            let member_name = self.expect(Token::Identifier, production)?;
            self.expect(Token::Colon, production)?;
            let type_token = self.expect(Token::Identifier, production)?;
            members.push(Variable { name: member_name, type_token });
            self.expect(Token::Comma, production)
                .map_err(|e| hinted(e, "struct members need a trailing comma before '}'"))?;
        }
        self.expect(Token::CloseCurly, production)?;
        self.expect(Token::Semicolon, production)
            .map_err(|e| hinted(e, "did you forget a semicolon after the struct declaration?"))?;
        let end = self.index as u32;

        let members_id = self.expressions.push_members(members);
        let id = self.expressions.push_struct_declaration(StructDeclaration { name, members: members_id });
        Ok(Expression::new(ExpressionKind::StructDeclaration(id), start, end))
    }

    /// Shared by `let`/`var`, public/private: `NAME [: TYPE] = RVALUE ;`. An
    /// omitted `: TYPE` defaults to the `let`/`var` keyword's own lexeme, so
    /// the generator emits it verbatim and the prelude's
    /// `#define let __auto_type const` / `#define var __auto_type` resolves
    /// it to the right C storage type.
    fn parse_variable_declaration(
        &mut self,
        start: u32,
        is_public: bool,
        is_constant: bool,
    ) -> Result<Expression, ParseError> {
        let production = "parse_variable_declaration";
        let keyword = self.advance(); // `let` or `var`
        let name = self.expect(Token::Identifier, production)?;
        let type_token = if self.check(Token::Colon) {
            self.advance();
            self.expect(Token::Identifier, production)?
        } else {
            keyword
        };
        self.expect(Token::Assign, production)?;
        let value = self.parse_rvalue(Stop::Semicolon, production)?;
        self.expect(Token::Semicolon, production).map_err(|e| hinted(e, "did you forget a semicolon?"))?;
        let end = self.index as u32;

        let id = self.expressions.push_variable_declaration(VariableDeclaration { name, type_token, value });
        let kind = match (is_public, is_constant) {
            (true, true) => ExpressionKind::PublicConstantDeclaration(id),
            (false, true) => ExpressionKind::PrivateConstantDeclaration(id),
            (true, false) => ExpressionKind::PublicVariableDeclaration(id),
            (false, false) => ExpressionKind::PrivateVariableDeclaration(id),
        };
        Ok(Expression::new(kind, start, end))
    }

    fn parse_import_c(&mut self, start: u32) -> Result<Expression, ParseError> {
        let production = "parse_import_c";
        self.expect(Token::ImportC, production)?;
        self.expect(Token::OpenParen, production)?;
        let filename = self.expect(Token::Quoted, production)?;
        self.expect(Token::CloseParen, production)?;
        self.expect(Token::Semicolon, production)?;
        let end = self.index as u32;

        let id = self.expressions.push_import_c(ImportC { filename });
        Ok(Expression::new(ExpressionKind::ImportC(id), start, end))
    }

    /// `inline_c { ... }` or `inline_c ... ;`. The braced form tracks brace
    /// depth so embedded `{`/`}` in the C text don't end it early. Either
    /// way, the surrounding keyword/braces/semicolon are excluded from the
    /// recorded span — only the raw content's span is kept, computed by
    /// combining the first and last content token's spans, so the code
    /// generator can recover the exact original bytes without needing the
    /// token stream itself.
    fn parse_inline_c_statement(&mut self, start: u32, production: &'static str) -> Result<Expression, ParseError> {
        self.expect(Token::InlineC, production)?;
        let span = if self.check(Token::OpenCurly) {
            self.parse_braced_inline_c(production)?
        } else {
            self.parse_semicolon_inline_c(production)?
        };
        let end = self.index as u32;
        let id = self.expressions.push_inline_c(InlineC { span });
        Ok(Expression::new(ExpressionKind::InlineC(id), start, end))
    }

    /// Combines the spans of `tokens[start_index..end_index]`. An empty
    /// range (no content tokens) yields a zero-length span anchored where
    /// the content would have started.
    fn span_of_token_range(&self, start_index: usize, end_index: usize) -> Span {
        if start_index >= end_index {
            let offset = self
                .tokens
                .get(start_index)
                .map(|t| t.span.offset())
                .unwrap_or_else(|| self.source.text.len());
            Span::new(&self.source, offset, 0)
        } else {
            Span::combine(&self.tokens[start_index].span, &self.tokens[end_index - 1].span)
        }
    }

    fn parse_braced_inline_c(&mut self, production: &'static str) -> Result<Span, ParseError> {
        self.expect(Token::OpenCurly, production)?;
        let content_start = self.index;
        let mut level: i32 = 1;
        loop {
            if self.at_end() {
                return Err(self.error("unterminated inline_c block", None, production));
            }
            match self.peek().unwrap() {
                Token::OpenCurly => {
                    level += 1;
                    self.advance();
                },
                Token::CloseCurly => {
                    level -= 1;
                    if level == 0 {
                        let content_end = self.index;
                        self.advance();
                        return Ok(self.span_of_token_range(content_start, content_end));
                    }
                    self.advance();
                },
                _ => {
                    self.advance();
                },
            }
        }
    }

    fn parse_semicolon_inline_c(&mut self, production: &'static str) -> Result<Span, ParseError> {
        let content_start = self.index;
        let mut level: i32 = 0;
        loop {
            if self.at_end() {
                return Err(self.error("unterminated inline_c statement", None, production));
            }
            match self.peek().unwrap() {
                Token::OpenCurly => {
                    level += 1;
                    self.advance();
                },
                Token::CloseCurly => {
                    level -= 1;
                    if level < 0 {
                        return Err(self.error("suspicious curly brace in inline_c", None, production));
                    }
                    self.advance();
                },
                Token::Semicolon if level == 0 => break,
                _ => {
                    self.advance();
                },
            }
        }
        let content_end = self.index;
        self.expect(Token::Semicolon, production)?;
        Ok(self.span_of_token_range(content_start, content_end))
    }

    // ---- blocks & statements ----------------------------------------------

    /// Parses `{ statement* }`, consuming the closing brace as part of the
    /// block rather than leaving it for the caller.
    fn parse_block(&mut self, production: &'static str) -> Result<Id<Block>, ParseError> {
        self.expect(Token::OpenCurly, production)?;
        let mut expressions = Vec::new();
        while !self.check(Token::CloseCurly) {
            if self.at_end() {
                return Err(self.error("expected '}'", None, production));
            }
            expressions.push(self.parse_statement()?);
        }
        self.expect(Token::CloseCurly, production)?;
        Ok(self.expressions.push_block(Block { expressions }))
    }

    fn parse_statement(&mut self) -> Result<Expression, ParseError> {
        let start = self.index as u32;
        match self.peek() {
            Some(Token::OpenCurly) => {
                let block = self.parse_block("parse_block")?;
                Ok(Expression::new(ExpressionKind::Block(block), start, self.index as u32))
            },
            Some(Token::InlineC) => self.parse_inline_c_statement(start, "parse_block"),
            Some(Token::Let) => self.parse_variable_declaration(start, false, true),
            Some(Token::Var) => self.parse_variable_declaration(start, false, false),
            Some(Token::Return) => self.parse_return(start),
            Some(Token::If) => self.parse_if(start),
            Some(Token::While) => self.parse_while(start),
            Some(Token::Identifier) => self.parse_expression_statement(start),
            _ => Err(self.error("expected a statement", Some("did you forget a semicolon?"), "parse_block")),
        }
    }

    fn parse_return(&mut self, start: u32) -> Result<Expression, ParseError> {
        let production = "parse_return";
        self.expect(Token::Return, production)?;
        let rvalue = self.parse_rvalue(Stop::Semicolon, production)?;
        self.expect(Token::Semicolon, production).map_err(|e| hinted(e, "did you forget a semicolon?"))?;
        let end = self.index as u32;
        let id = self.expressions.push_return(Return { rvalue });
        Ok(Expression::new(ExpressionKind::Return(id), start, end))
    }

    fn parse_if(&mut self, start: u32) -> Result<Expression, ParseError> {
        let production = "parse_if";
        self.expect(Token::If, production)?;
        let condition = self.parse_rvalue(Stop::OpenCurly, production)?;
        let block = self.parse_block(production)?;
        let end = self.index as u32;
        let id = self.expressions.push_if(If { condition, block });
        Ok(Expression::new(ExpressionKind::If(id), start, end))
    }

    fn parse_while(&mut self, start: u32) -> Result<Expression, ParseError> {
        let production = "parse_while";
        self.expect(Token::While, production)?;
        let condition = self.parse_rvalue(Stop::OpenCurly, production)?;
        let block = self.parse_block(production)?;
        let end = self.index as u32;
        let id = self.expressions.push_while(While { condition, block });
        Ok(Expression::new(ExpressionKind::While(id), start, end))
    }

    /// An identifier-led statement: either a bare call (`foo();`) or an
    /// assignment (`foo = rvalue;`). Both are represented as a flat
    /// `RValue` — the first item is an `LValue` for an assignment target,
    /// or the call itself when the statement is a bare call.
    fn parse_expression_statement(&mut self, start: u32) -> Result<Expression, ParseError> {
        let production = "parse_expression_statement";
        let rvalue = self.parse_rvalue(Stop::Semicolon, production)?;
        self.expect(Token::Semicolon, production).map_err(|e| hinted(e, "did you forget a semicolon?"))?;
        let end = self.index as u32;
        Ok(Expression::new(ExpressionKind::RValue(rvalue), start, end))
    }

    // ---- rvalues -----------------------------------------------------------

    fn stop_here(&self, stop: Stop) -> bool {
        match (stop, self.peek()) {
            (_, None) => true,
            (Stop::Semicolon, Some(Token::Semicolon)) => true,
            (Stop::OpenCurly, Some(Token::OpenCurly)) => true,
            (Stop::ArgumentBoundary, Some(Token::Comma)) => true,
            (Stop::ArgumentBoundary, Some(Token::CloseParen)) => true,
            _ => false,
        }
    }

    fn parse_rvalue(&mut self, stop: Stop, production: &'static str) -> Result<Id<RValue>, ParseError> {
        let mut expressions = Vec::new();
        while !self.stop_here(stop) {
            expressions.push(self.parse_rvalue_item(production)?);
        }
        if expressions.is_empty() {
            return Err(self.error("expected an expression", None, production));
        }
        Ok(self.expressions.push_rvalue(RValue { expressions }))
    }

    fn parse_rvalue_item(&mut self, production: &'static str) -> Result<Expression, ParseError> {
        let start = self.index as u32;
        match self.peek().unwrap() {
            Token::Number
            | Token::Quoted
            | Token::Plus
            | Token::Minus
            | Token::LessThanOrEqual
            | Token::GreaterThan
            | Token::Equals
            | Token::Assign
            | Token::Ampersand
            | Token::RefMut => {
                let token = self.advance();
                let id = self.expressions.push_literal(Literal { token });
                Ok(Expression::new(ExpressionKind::Literal(id), start, self.index as u32))
            },
            Token::Uninitialized => {
                self.advance();
                self.expect(Token::OpenParen, production)?;
                self.expect(Token::CloseParen, production)?;
                let block = self.expressions.push_block(Block { expressions: Vec::new() });
                Ok(Expression::new(ExpressionKind::Block(block), start, self.index as u32))
            },
            Token::SizeOf => {
                self.advance();
                self.expect(Token::OpenParen, production)?;
                self.expect(Token::Identifier, production)?;
                self.expect(Token::CloseParen, production)?;
                let id = self.expressions.push_compiler_provided_u64(CompilerProvidedU64 { value: 0 });
                Ok(Expression::new(ExpressionKind::CompilerProvidedU64(id), start, self.index as u32))
            },
            Token::Identifier => self.parse_identifier_led_rvalue_item(start, production),
            // A token that can't start (or continue) an rvalue almost always
            // means the rvalue we were scanning has already ended and the
            // caller's terminator was missed — e.g. a block's closing `}`
            // reached while still scanning a `return`'s rvalue because the
            // statement's `;` was never written. Report it as a missing
            // terminator rather than a generic "unexpected token", matching
            // the original parser's fall-through for this case.
            _ => Err(self.error(
                "expected ';' or '{'",
                Some("did you forget a semicolon?"),
                production,
            )),
        }
    }

    fn parse_identifier_led_rvalue_item(
        &mut self,
        start: u32,
        production: &'static str,
    ) -> Result<Expression, ParseError> {
        let name = self.advance();
        match self.peek() {
            Some(Token::OpenParen) => {
                self.advance();
                let arguments = self.parse_arguments(production)?;
                let id = self.expressions.push_function_call(FunctionCall { name, arguments });
                Ok(Expression::new(ExpressionKind::FunctionCall(id), start, self.index as u32))
            },
            Some(Token::OpenCurly) => {
                let fields_id = self.parse_struct_initializer_fields(production)?;
                let id = self
                    .expressions
                    .push_struct_initializer(StructInitializer { type_token: name, fields: fields_id });
                Ok(Expression::new(ExpressionKind::StructInitializer(id), start, self.index as u32))
            },
            _ => {
                let id = self.expressions.push_lvalue(LValue { token: name });
                Ok(Expression::new(ExpressionKind::LValue(id), start, self.index as u32))
            },
        }
    }

    /// Each comma-separated argument becomes one `Expression` wrapping its
    /// own flat `RValue`, so the boundary between arguments survives.
    fn parse_arguments(&mut self, production: &'static str) -> Result<Vec<Expression>, ParseError> {
        let mut arguments = Vec::new();
        if self.check(Token::CloseParen) {
            self.advance();
            return Ok(arguments);
        }
        loop {
            let arg_start = self.index as u32;
            let rvalue_id = self.parse_rvalue(Stop::ArgumentBoundary, production)?;
            arguments.push(Expression::new(ExpressionKind::RValue(rvalue_id), arg_start, self.index as u32));
            if self.check(Token::Comma) {
                self.advance();
                continue;
            }
            self.expect(Token::CloseParen, production)?;
            break;
        }
        Ok(arguments)
    }

    fn parse_struct_initializer_fields(
        &mut self,
        production: &'static str,
    ) -> Result<Id<Vec<FieldInit>>, ParseError> {
        self.expect(Token::OpenCurly, production)?;
        let mut fields = Vec::new();
        while !self.check(Token::CloseCurly) {
            let name = self.expect(Token::Identifier, production)?;
            self.expect(Token::Colon, production)?;
            let value = self.parse_rvalue(Stop::ArgumentBoundary, production)?;
            fields.push(FieldInit { name, value });
            if self.check(Token::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(Token::CloseCurly, production)?;
        Ok(self.expressions.push_field_inits(fields))
    }
}

fn hinted(mut error: ParseError, hint: &str) -> ParseError {
    if error.hint.is_none() {
        error.hint = Some(hint.to_string());
    }
    error
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::compiler::lex::Lexer;

    fn parse_ok(text: &str) -> ParsedExpressions {
        let source = SourceFile::from_str(text);
        let tokens = Lexer::lex(Rc::clone(&source)).expect("expected a successful lex");
        parse(source, tokens).expect("expected a successful parse")
    }

    #[test]
    fn parses_a_public_function_returning_a_literal() {
        let expressions = parse_ok("pub fn main() -> i32 { return 0; }");
        assert_eq!(expressions.roots.len(), 1);
        assert!(matches!(expressions.roots[0].kind, ExpressionKind::PublicFunction(_)));
    }

    #[test]
    fn parses_a_c_function() {
        let expressions = parse_ok("c_fn puts(message: c_string) -> i32 { return 0; }");
        assert!(matches!(expressions.roots[0].kind, ExpressionKind::PrivateCFunction(_)));
    }

    #[test]
    fn parses_struct_declarations() {
        let expressions = parse_ok("let Point = struct { x: i32, y: i32, };");
        assert!(matches!(expressions.roots[0].kind, ExpressionKind::StructDeclaration(_)));
    }

    #[test]
    fn parses_top_level_constant_and_variable() {
        let expressions = parse_ok("let ANSWER: i32 = 42; var counter: i32 = 0;");
        assert!(matches!(expressions.roots[0].kind, ExpressionKind::PrivateConstantDeclaration(_)));
        assert!(matches!(expressions.roots[1].kind, ExpressionKind::PrivateVariableDeclaration(_)));
    }

    #[test]
    fn parses_import_c() {
        let expressions = parse_ok("@import_c(\"stdio.h\");");
        assert!(matches!(expressions.roots[0].kind, ExpressionKind::ImportC(_)));
    }

    #[test]
    fn missing_semicolon_hints_at_the_fix() {
        let source = SourceFile::from_str("fn f() -> i32 { return 1 }");
        let tokens = Lexer::lex(Rc::clone(&source)).unwrap();
        let err = parse(source, tokens).unwrap_err();
        assert_eq!(err.hint.as_deref(), Some("did you forget a semicolon?"));
        assert!(err.message.contains("';'"), "message was {:?}", err.message);
        assert_eq!(err.offending.text(), "}");
    }

    #[test]
    fn parses_if_and_while_with_a_flat_condition() {
        let expressions = parse_ok(
            "pub fn main() -> i32 { var i: i32 = 0; while i <= 10 { i = i + 1; } if i <= 10 { return 1; } return 0; }",
        );
        assert!(matches!(expressions.roots[0].kind, ExpressionKind::PublicFunction(_)));
    }

    #[test]
    fn parses_function_calls_as_statements_and_as_arguments() {
        let expressions = parse_ok("pub fn main() -> i32 { puts(greeting(name)); return 0; }");
        assert!(matches!(expressions.roots[0].kind, ExpressionKind::PublicFunction(_)));
    }

    #[test]
    fn parses_braced_inline_c_tracking_brace_depth() {
        let expressions = parse_ok("inline_c { if (1) { return; } }");
        assert!(matches!(expressions.roots[0].kind, ExpressionKind::InlineC(_)));
    }

    #[test]
    fn parses_struct_initializers() {
        let expressions = parse_ok(
            "pub fn main() -> i32 { var p: Point = Point { x: 1, y: 2, }; return 0; }",
        );
        assert!(matches!(expressions.roots[0].kind, ExpressionKind::PublicFunction(_)));
    }

    #[test]
    fn lexemes_recover_their_exact_source_text() {
        let expressions = parse_ok("pub fn greet() -> i32 { return 0; }");
        let ExpressionKind::PublicFunction(id) = expressions.roots[0].kind else { panic!("expected a function") };
        assert_eq!(expressions.function(id).name.span.text(), "greet");
        assert_eq!(expressions.function(id).return_type.span.text(), "i32");
    }

    #[test]
    fn omitted_annotation_defaults_variable_type_token_to_its_keyword() {
        let expressions = parse_ok("var counter = 0;");
        let ExpressionKind::PrivateVariableDeclaration(id) = expressions.roots[0].kind else {
            panic!("expected a variable declaration")
        };
        assert_eq!(expressions.variable_declaration(id).type_token.span.text(), "var");
    }

    #[test]
    fn omitted_annotation_defaults_constant_type_token_to_let() {
        let expressions = parse_ok("let ANSWER = 42;");
        let ExpressionKind::PrivateConstantDeclaration(id) = expressions.roots[0].kind else {
            panic!("expected a constant declaration")
        };
        assert_eq!(expressions.variable_declaration(id).type_token.span.text(), "let");
    }

    #[test]
    fn explicit_annotation_overrides_the_keyword_default() {
        let expressions = parse_ok("let ANSWER: i32 = 42;");
        let ExpressionKind::PrivateConstantDeclaration(id) = expressions.roots[0].kind else {
            panic!("expected a constant declaration")
        };
        assert_eq!(expressions.variable_declaration(id).type_token.span.text(), "i32");
    }

    #[test]
    fn inline_c_span_excludes_keyword_and_braces() {
        let expressions = parse_ok("inline_c { return 0; }");
        let ExpressionKind::InlineC(id) = expressions.roots[0].kind else { panic!("expected inline_c") };
        assert_eq!(expressions.inline_c(id).span.text(), "return 0;");
    }

    #[test]
    fn inline_c_statement_form_span_excludes_trailing_semicolon() {
        let expressions = parse_ok("inline_c x += 1;");
        let ExpressionKind::InlineC(id) = expressions.roots[0].kind else { panic!("expected inline_c") };
        assert_eq!(expressions.inline_c(id).span.text(), "x += 1");
    }

    /// Testable property 2: the root expressions' `[start_token, end_token)`
    /// spans tile the whole token stream, back to back, with no gaps and no
    /// overlaps.
    #[test]
    fn root_expression_token_spans_cover_the_whole_stream_with_no_overlaps() {
        let source = SourceFile::from_str(
            "@import_c(\"stdio.h\");\n\
             inline_c { int g = 7; }\n\
             let Point = struct { x: i32, y: i32, };\n\
             let ANSWER: i32 = 42;\n\
             pub fn main() -> i32 { return 0; }",
        );
        let tokens = Lexer::lex(Rc::clone(&source)).unwrap();
        let total = tokens.len() as u32;
        let expressions = parse(source, tokens).unwrap();

        let mut cursor = 0u32;
        for root in &expressions.roots {
            assert_eq!(root.start_token, cursor, "expected no gap or overlap before this root");
            assert!(root.end_token > root.start_token, "every root spans at least one token");
            cursor = root.end_token;
        }
        assert_eq!(cursor, total, "roots must cover every token up to the end of the stream");
    }
}
