//! Parser state and token-stream helpers.
//!
//! The grammar itself is split across `decl_parser`, `stmt_parser`,
//! `expr_parser` and `type_parser`, each adding methods to [`Parser`].

use bumpalo::Bump;
use goop_core::{ExprId, ExprIdGen, ParseError, ParseErrorKind, ParseErrors, Span};

use crate::ast::{Expr, SourceFile};
use crate::lexer::{Lexer, Token, TokenKind};

pub(crate) type PResult<T> = Result<T, ParseError>;

/// Recursive-descent parser for Go sources.
///
/// Expression ids are drawn from an [`ExprIdGen`] supplied by the caller, so
/// several files parsed with the same generator never share an id.
pub struct Parser<'ast> {
    pub(crate) tokens: Vec<Token<'ast>>,
    pub(crate) pos: usize,
    pub(crate) arena: &'ast Bump,
    pub(crate) ids: ExprIdGen,
    pub(crate) errors: ParseErrors,
    /// Nesting level used to disambiguate `{` after an expression.
    ///
    /// Negative inside control clauses, where `T {` starts a block rather
    /// than a composite literal unless parenthesised.
    pub(crate) expr_lev: i32,
}

impl<'ast> Parser<'ast> {
    /// Lex `source` and prepare to parse it.
    pub fn new(source: &str, arena: &'ast Bump, ids: ExprIdGen) -> Self {
        let (tokens, lex_errors) = Lexer::new(source, arena).tokenize();
        let mut errors = ParseErrors::new();
        for error in lex_errors {
            errors.push(error.into());
        }
        Self {
            tokens,
            pos: 0,
            arena,
            ids,
            errors,
            expr_lev: 0,
        }
    }

    /// Parse a complete file, failing if any syntax error was found.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse_file(
        source: &str,
        arena: &'ast Bump,
        ids: &mut ExprIdGen,
    ) -> Result<SourceFile<'ast>, ParseErrors> {
        let (file, errors) = Self::parse_file_lenient(source, arena, ids);
        if errors.is_empty() {
            Ok(file)
        } else {
            Err(errors)
        }
    }

    /// Parse a file, returning whatever could be parsed along with all errors.
    pub fn parse_file_lenient(
        source: &str,
        arena: &'ast Bump,
        ids: &mut ExprIdGen,
    ) -> (SourceFile<'ast>, ParseErrors) {
        let mut parser = Parser::new(source, arena, *ids);
        let file = parser.parse_source_file();
        *ids = parser.ids;
        (file, parser.errors)
    }

    /// Parse a single expression (useful for tests and tools).
    pub fn parse_expression(
        source: &str,
        arena: &'ast Bump,
        ids: &mut ExprIdGen,
    ) -> Result<Expr<'ast>, ParseErrors> {
        let mut parser = Parser::new(source, arena, *ids);
        let result = parser.parse_expr();
        *ids = parser.ids;
        match result {
            Ok(expr) => {
                parser.eat(TokenKind::Semicolon);
                if !parser.check(TokenKind::Eof) {
                    let token = *parser.peek();
                    parser.errors.push(ParseError::new(
                        ParseErrorKind::UnexpectedToken,
                        token.span,
                        format!("unexpected {} after expression", describe(&token)),
                    ));
                }
                if parser.errors.is_empty() {
                    Ok(expr)
                } else {
                    Err(parser.errors)
                }
            }
            Err(error) => {
                parser.errors.push(error);
                Err(parser.errors)
            }
        }
    }

    // =========================================
    // Token access
    // =========================================

    #[inline]
    pub(crate) fn peek(&self) -> &Token<'ast> {
        self.peek_nth(0)
    }

    /// The token `n` positions ahead; `Eof` past the end.
    #[inline]
    pub(crate) fn peek_nth(&self, n: usize) -> &Token<'ast> {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + n).min(last)]
    }

    #[inline]
    pub(crate) fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    #[inline]
    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub(crate) fn advance(&mut self) -> Token<'ast> {
        let token = *self.peek();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> PResult<Token<'ast>> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        let token = *self.peek();
        Err(self.unexpected(&token, &format!("'{}'", kind.as_str())))
    }

    pub(crate) fn expect_ident(&mut self) -> PResult<crate::ast::Ident<'ast>> {
        let token = *self.peek();
        if token.kind == TokenKind::Ident {
            self.advance();
            Ok(crate::ast::Ident::new(token.lexeme, token.span))
        } else {
            Err(ParseError::expected_identifier(token.span, &describe(&token)))
        }
    }

    /// Expect a statement terminator. A closing `)` or `}` also ends the
    /// statement without being consumed.
    pub(crate) fn expect_semi(&mut self) -> PResult<()> {
        match self.peek_kind() {
            TokenKind::Semicolon => {
                self.advance();
                Ok(())
            }
            TokenKind::RParen | TokenKind::RBrace | TokenKind::Eof => Ok(()),
            _ => {
                let token = *self.peek();
                Err(self.unexpected(&token, "';' or newline"))
            }
        }
    }

    pub(crate) fn unexpected(&self, token: &Token<'ast>, expected: &str) -> ParseError {
        if token.kind == TokenKind::Eof {
            return ParseError::new(
                ParseErrorKind::UnexpectedEof,
                token.span,
                format!("expected {expected}, found end of file"),
            );
        }
        ParseError::expected_token(token.span, expected, &describe(token))
    }

    /// Span of the most recently consumed token.
    pub(crate) fn prev_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .map(|i| self.tokens[i].span)
            .unwrap_or_default()
    }

    // =========================================
    // Allocation
    // =========================================

    #[inline]
    pub(crate) fn next_id(&mut self) -> ExprId {
        self.ids.fresh()
    }

    #[inline]
    pub(crate) fn alloc<T>(&self, value: T) -> &'ast T {
        self.arena.alloc(value)
    }

    pub(crate) fn alloc_slice<T>(&self, items: Vec<T>) -> &'ast [T] {
        self.arena.alloc_slice_fill_iter(items)
    }

    // =========================================
    // Recovery
    // =========================================

    /// Skip to the start of the next top-level declaration.
    pub(crate) fn synchronize_decl(&mut self) {
        loop {
            match self.peek_kind() {
                TokenKind::Eof => return,
                TokenKind::Func
                | TokenKind::Type
                | TokenKind::Var
                | TokenKind::Const
                | TokenKind::Import
                    if self.prev_is_line_start() =>
                {
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn prev_is_line_start(&self) -> bool {
        self.pos == 0
            || self.tokens[self.pos - 1].kind == TokenKind::Semicolon
    }
}

/// Describe a token for diagnostics.
pub(crate) fn describe(token: &Token<'_>) -> String {
    match token.kind {
        TokenKind::Semicolon if token.is_implicit_semicolon() => "newline".to_string(),
        TokenKind::Ident => format!("identifier '{}'", token.lexeme),
        kind if kind.is_literal() => format!("{} {}", kind.as_str(), token.lexeme),
        TokenKind::Eof => "end of file".to_string(),
        kind => format!("'{}'", kind.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_continue_across_files() {
        let arena = Bump::new();
        let mut ids = ExprIdGen::new();
        Parser::parse_file("package a\nvar x = 1\n", &arena, &mut ids).unwrap();
        let after_first = ids.issued();
        assert!(after_first > 0);
        Parser::parse_file("package a\nvar y = 2\n", &arena, &mut ids).unwrap();
        assert!(ids.issued() > after_first);
    }

    #[test]
    fn lex_errors_become_parse_errors() {
        let arena = Bump::new();
        let mut ids = ExprIdGen::new();
        let errors = Parser::parse_file("package a\nvar x = $\n", &arena, &mut ids).unwrap_err();
        assert_eq!(errors.first().unwrap().kind, ParseErrorKind::Lexical);
    }

    #[test]
    fn trailing_tokens_after_expression() {
        let arena = Bump::new();
        let mut ids = ExprIdGen::new();
        let errors = Parser::parse_expression("a b", &arena, &mut ids).unwrap_err();
        assert_eq!(errors.first().unwrap().kind, ParseErrorKind::UnexpectedToken);
    }

    #[test]
    fn describe_newline() {
        let token = Token::new(TokenKind::Semicolon, "\n", Span::point(1, 1));
        assert_eq!(describe(&token), "newline");
    }
}
