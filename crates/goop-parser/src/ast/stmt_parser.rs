//! Statement parsing.

use goop_core::Span;

use super::parser::{PResult, Parser};
use crate::ast::stmt::*;
use crate::ast::{AssignOp, Expr, ParseError, ParseErrorKind};
use crate::lexer::TokenKind;

/// Result of parsing a simple statement, which may turn out to be the
/// header of a range clause.
pub(crate) enum SimpleStmt<'ast> {
    Stmt(Stmt<'ast>),
    Range {
        key: Option<Expr<'ast>>,
        value: Option<Expr<'ast>>,
        define: bool,
        x: Expr<'ast>,
        start: Span,
    },
}

impl<'ast> Parser<'ast> {
    /// `{ stmts }`
    pub(crate) fn parse_block(&mut self) -> PResult<&'ast BlockStmt<'ast>> {
        let open = self.expect(TokenKind::LBrace)?;
        let stmts = self.parse_stmt_list()?;
        let close = self.expect(TokenKind::RBrace)?;
        let stmts = self.alloc_slice(stmts);
        Ok(self.alloc(BlockStmt {
            stmts,
            span: open.span.to(close.span),
            rbrace: close.span,
        }))
    }

    /// Statements up to a closing brace or the next case clause.
    fn parse_stmt_list(&mut self) -> PResult<Vec<Stmt<'ast>>> {
        let mut stmts = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::RBrace | TokenKind::Case | TokenKind::Default | TokenKind::Eof => {
                    return Ok(stmts);
                }
                TokenKind::Semicolon => {
                    self.advance();
                }
                _ => {
                    stmts.push(self.parse_stmt()?);
                    self.expect_semi()?;
                }
            }
        }
    }

    /// Parse one statement.
    pub(crate) fn parse_stmt(&mut self) -> PResult<Stmt<'ast>> {
        let token = *self.peek();
        match token.kind {
            TokenKind::Var | TokenKind::Const | TokenKind::Type => {
                Ok(Stmt::Decl(self.parse_gen_decl()?))
            }
            TokenKind::LBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::Switch => self.parse_switch_stmt(),
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::Return => {
                self.advance();
                let results = if matches!(
                    self.peek_kind(),
                    TokenKind::Semicolon | TokenKind::RBrace
                ) {
                    Vec::new()
                } else {
                    self.parse_expr_list()?
                };
                let span = token.span.to(self.prev_span());
                let results = self.alloc_slice(results);
                Ok(Stmt::Return(self.alloc(ReturnStmt { results, span })))
            }
            TokenKind::Break | TokenKind::Continue | TokenKind::Fallthrough => {
                self.advance();
                if self.check(TokenKind::Ident) {
                    return Err(ParseError::new(
                        ParseErrorKind::Unsupported,
                        self.peek().span,
                        "labels are not supported",
                    ));
                }
                let kind = match token.kind {
                    TokenKind::Break => BranchKind::Break,
                    TokenKind::Continue => BranchKind::Continue,
                    _ => BranchKind::Fallthrough,
                };
                Ok(Stmt::Branch(self.alloc(BranchStmt {
                    kind,
                    span: token.span,
                })))
            }
            TokenKind::Go | TokenKind::Defer => {
                self.advance();
                let call = self.parse_expr()?;
                if !matches!(call.unparen(), Expr::Call(_)) {
                    return Err(ParseError::new(
                        ParseErrorKind::InvalidSyntax,
                        call.span(),
                        format!("expression in {} must be function call", token.lexeme),
                    ));
                }
                let keyword = if token.kind == TokenKind::Go {
                    CallKeyword::Go
                } else {
                    CallKeyword::Defer
                };
                Ok(Stmt::Call(self.alloc(CallStmt {
                    keyword,
                    call,
                    span: token.span.to(call.span()),
                })))
            }
            TokenKind::Goto | TokenKind::Select => Err(ParseError::new(
                ParseErrorKind::Unsupported,
                token.span,
                format!("'{}' statements are not supported", token.lexeme),
            )),
            TokenKind::Ident if self.peek_nth(1).kind == TokenKind::Colon => {
                Err(ParseError::new(
                    ParseErrorKind::Unsupported,
                    token.span,
                    "labels are not supported",
                ))
            }
            TokenKind::Semicolon => Ok(Stmt::Empty(token.span)),
            _ => match self.parse_simple_stmt(false)? {
                SimpleStmt::Stmt(stmt) => Ok(stmt),
                SimpleStmt::Range { start, .. } => Err(ParseError::new(
                    ParseErrorKind::InvalidSyntax,
                    start,
                    "range clause outside for statement",
                )),
            },
        }
    }

    /// Expression, send, inc/dec, or assignment statement.
    pub(crate) fn parse_simple_stmt(&mut self, range_ok: bool) -> PResult<SimpleStmt<'ast>> {
        let start = self.peek().span;

        if range_ok && self.check(TokenKind::Range) {
            self.advance();
            let x = self.parse_expr()?;
            return Ok(SimpleStmt::Range {
                key: None,
                value: None,
                define: false,
                x,
                start,
            });
        }

        let lhs = self.parse_expr_list()?;
        let token = *self.peek();

        if let Some(op) = AssignOp::from_token(token.kind) {
            self.advance();
            if range_ok && self.check(TokenKind::Range) && !matches!(op, AssignOp::Compound(_)) {
                self.advance();
                if lhs.len() > 2 {
                    return Err(ParseError::new(
                        ParseErrorKind::InvalidSyntax,
                        lhs[2].span(),
                        "range clause permits at most two iteration variables",
                    ));
                }
                let x = self.parse_expr()?;
                return Ok(SimpleStmt::Range {
                    key: lhs.first().copied(),
                    value: lhs.get(1).copied(),
                    define: op == AssignOp::Define,
                    x,
                    start,
                });
            }
            let rhs = self.parse_expr_list()?;
            let span = start.to(self.prev_span());
            let lhs = self.alloc_slice(lhs);
            let rhs = self.alloc_slice(rhs);
            return Ok(SimpleStmt::Stmt(Stmt::Assign(self.alloc(AssignStmt {
                lhs,
                op,
                rhs,
                span,
            }))));
        }

        if lhs.len() > 1 {
            return Err(self.unexpected(&token, "':=', '=' or ','"));
        }
        let x = lhs[0];

        match token.kind {
            TokenKind::Inc | TokenKind::Dec => {
                self.advance();
                Ok(SimpleStmt::Stmt(Stmt::IncDec(self.alloc(IncDecStmt {
                    x,
                    inc: token.kind == TokenKind::Inc,
                    span: start.to(token.span),
                }))))
            }
            TokenKind::Arrow => Err(ParseError::new(
                ParseErrorKind::Unsupported,
                token.span,
                "channel sends are not supported",
            )),
            _ => Ok(SimpleStmt::Stmt(Stmt::Expr(self.alloc(ExprStmt {
                x,
                span: x.span(),
            })))),
        }
    }

    /// Require a simple statement to be a plain expression.
    fn expect_expr_stmt(&self, stmt: SimpleStmt<'ast>, what: &str) -> PResult<Expr<'ast>> {
        match stmt {
            SimpleStmt::Stmt(Stmt::Expr(e)) => Ok(e.x),
            SimpleStmt::Stmt(other) => Err(ParseError::new(
                ParseErrorKind::InvalidSyntax,
                other.span(),
                format!("cannot use statement as {what}"),
            )),
            SimpleStmt::Range { start, .. } => Err(ParseError::new(
                ParseErrorKind::InvalidSyntax,
                start,
                format!("cannot use range clause as {what}"),
            )),
        }
    }

    fn expect_plain_stmt(&self, stmt: SimpleStmt<'ast>) -> PResult<Stmt<'ast>> {
        match stmt {
            SimpleStmt::Stmt(stmt) => Ok(stmt),
            SimpleStmt::Range { start, .. } => Err(ParseError::new(
                ParseErrorKind::InvalidSyntax,
                start,
                "range clause outside for header",
            )),
        }
    }

    // =========================================
    // Control flow
    // =========================================

    fn parse_if_stmt(&mut self) -> PResult<Stmt<'ast>> {
        let start = self.expect(TokenKind::If)?.span;

        let prev_lev = self.expr_lev;
        self.expr_lev = -1;
        let header = self.parse_if_header();
        self.expr_lev = prev_lev;
        let (init, cond) = header?;

        let then = self.parse_block()?;
        let els = if self.eat(TokenKind::Else) {
            match self.peek_kind() {
                TokenKind::If => Some(self.parse_if_stmt()?),
                TokenKind::LBrace => Some(Stmt::Block(self.parse_block()?)),
                _ => {
                    let token = *self.peek();
                    return Err(self.unexpected(&token, "'if' or '{' after else"));
                }
            }
        } else {
            None
        };

        let end = els.map(|s| s.span()).unwrap_or(then.span);
        Ok(Stmt::If(self.alloc(IfStmt {
            init,
            cond,
            then,
            els,
            span: start.to(end),
        })))
    }

    fn parse_if_header(&mut self) -> PResult<(Option<Stmt<'ast>>, Expr<'ast>)> {
        if self.check(TokenKind::LBrace) {
            let span = self.peek().span;
            return Err(ParseError::new(
                ParseErrorKind::ExpectedExpression,
                span,
                "missing condition in if statement",
            ));
        }
        let init = if self.check(TokenKind::Semicolon) {
            None
        } else {
            let first = self.parse_simple_stmt(false)?;
            if !self.check(TokenKind::Semicolon) {
                return Ok((None, self.expect_expr_stmt(first, "condition")?));
            }
            Some(self.expect_plain_stmt(first)?)
        };
        self.expect(TokenKind::Semicolon)?;
        let cond = self.parse_simple_stmt(false)?;
        Ok((init, self.expect_expr_stmt(cond, "condition")?))
    }

    fn parse_switch_stmt(&mut self) -> PResult<Stmt<'ast>> {
        let start = self.expect(TokenKind::Switch)?.span;

        let prev_lev = self.expr_lev;
        self.expr_lev = -1;
        let header = self.parse_switch_header();
        self.expr_lev = prev_lev;
        let (init, tag) = header?;

        self.expect(TokenKind::LBrace)?;
        let mut clauses = Vec::new();
        while matches!(self.peek_kind(), TokenKind::Case | TokenKind::Default) {
            clauses.push(self.parse_case_clause()?);
        }
        let close = self.expect(TokenKind::RBrace)?;
        let clauses = self.alloc_slice(clauses);
        Ok(Stmt::Switch(self.alloc(SwitchStmt {
            init,
            tag,
            clauses,
            span: start.to(close.span),
        })))
    }

    fn parse_switch_header(&mut self) -> PResult<(Option<Stmt<'ast>>, Option<Expr<'ast>>)> {
        if self.check(TokenKind::LBrace) {
            return Ok((None, None));
        }
        let first = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_simple_stmt(false)?)
        };
        if !self.eat(TokenKind::Semicolon) {
            let tag = first
                .map(|s| self.expect_expr_stmt(s, "switch tag"))
                .transpose()?;
            return Ok((None, tag));
        }
        let init = first.map(|s| self.expect_plain_stmt(s)).transpose()?;
        let tag = if self.check(TokenKind::LBrace) {
            None
        } else {
            let s = self.parse_simple_stmt(false)?;
            Some(self.expect_expr_stmt(s, "switch tag")?)
        };
        Ok((init, tag))
    }

    fn parse_case_clause(&mut self) -> PResult<CaseClause<'ast>> {
        let token = self.advance();
        let list = if token.kind == TokenKind::Case {
            self.parse_expr_list()?
        } else {
            Vec::new()
        };
        self.expect(TokenKind::Colon)?;
        let body = self.parse_stmt_list()?;
        let span = token.span.to(self.prev_span());
        let list = self.alloc_slice(list);
        let body = self.alloc_slice(body);
        Ok(CaseClause { list, body, span })
    }

    fn parse_for_stmt(&mut self) -> PResult<Stmt<'ast>> {
        let start = self.expect(TokenKind::For)?.span;

        let prev_lev = self.expr_lev;
        self.expr_lev = -1;
        let header = self.parse_for_header();
        self.expr_lev = prev_lev;
        let header = header?;

        let body = self.parse_block()?;
        let span = start.to(body.span);
        match header {
            ForHeader::Range {
                key,
                value,
                define,
                x,
            } => Ok(Stmt::Range(self.alloc(RangeStmt {
                key,
                value,
                define,
                x,
                body,
                span,
            }))),
            ForHeader::Loop { init, cond, post } => Ok(Stmt::For(self.alloc(ForStmt {
                init,
                cond,
                post,
                body,
                span,
            }))),
        }
    }

    fn parse_for_header(&mut self) -> PResult<ForHeader<'ast>> {
        if self.check(TokenKind::LBrace) {
            return Ok(ForHeader::Loop {
                init: None,
                cond: None,
                post: None,
            });
        }

        let first = if self.check(TokenKind::Semicolon) {
            None
        } else {
            match self.parse_simple_stmt(true)? {
                SimpleStmt::Range {
                    key,
                    value,
                    define,
                    x,
                    ..
                } => {
                    return Ok(ForHeader::Range {
                        key,
                        value,
                        define,
                        x,
                    });
                }
                other => Some(other),
            }
        };

        if !self.check(TokenKind::Semicolon) {
            let cond = first
                .map(|s| self.expect_expr_stmt(s, "for condition"))
                .transpose()?;
            return Ok(ForHeader::Loop {
                init: None,
                cond,
                post: None,
            });
        }

        self.advance();
        let init = first.map(|s| self.expect_plain_stmt(s)).transpose()?;
        let cond = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Semicolon)?;
        let post = if self.check(TokenKind::LBrace) {
            None
        } else {
            let s = self.parse_simple_stmt(false)?;
            let post = self.expect_plain_stmt(s)?;
            if let Stmt::Assign(assign) = post
                && assign.op == AssignOp::Define
            {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidSyntax,
                    assign.span,
                    "cannot declare in post statement of for loop",
                ));
            }
            Some(post)
        };
        Ok(ForHeader::Loop { init, cond, post })
    }
}

enum ForHeader<'ast> {
    Loop {
        init: Option<Stmt<'ast>>,
        cond: Option<Expr<'ast>>,
        post: Option<Stmt<'ast>>,
    },
    Range {
        key: Option<Expr<'ast>>,
        value: Option<Expr<'ast>>,
        define: bool,
        x: Expr<'ast>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use goop_core::ExprIdGen;

    fn block<'a>(source: &str, arena: &'a Bump) -> &'a BlockStmt<'a> {
        let mut parser = Parser::new(source, arena, ExprIdGen::new());
        let block = parser.parse_block().unwrap();
        assert!(parser.errors.is_empty(), "{}", parser.errors);
        block
    }

    fn parse_err(source: &str) -> ParseError {
        let arena = Bump::new();
        let mut parser = Parser::new(source, &arena, ExprIdGen::new());
        parser.parse_block().unwrap_err()
    }

    #[test]
    fn assignment_forms() {
        let arena = Bump::new();
        let b = block("{\n\tx := 1\n\tx, y = y, x\n\tx += 2\n\tx++\n}", &arena);
        assert_eq!(b.stmts.len(), 4);
        assert!(matches!(b.stmts[0], Stmt::Assign(a) if a.op == AssignOp::Define));
        assert!(matches!(b.stmts[1], Stmt::Assign(a) if a.lhs.len() == 2));
        assert!(matches!(
            b.stmts[2],
            Stmt::Assign(a) if matches!(a.op, AssignOp::Compound(_))
        ));
        assert!(matches!(b.stmts[3], Stmt::IncDec(s) if s.inc));
    }

    #[test]
    fn if_with_init_and_else_chain() {
        let arena = Bump::new();
        let b = block(
            "{\n\tif v := f(); v > 0 {\n\t} else if v < 0 {\n\t} else {\n\t}\n}",
            &arena,
        );
        let Stmt::If(stmt) = b.stmts[0] else {
            panic!("expected if");
        };
        assert!(stmt.init.is_some());
        assert!(matches!(stmt.els, Some(Stmt::If(inner)) if inner.els.is_some()));
    }

    #[test]
    fn composite_literal_in_condition_needs_parens() {
        let arena = Bump::new();
        let b = block("{\n\tif v == (T{}) {\n\t}\n}", &arena);
        assert!(matches!(b.stmts[0], Stmt::If(_)));

        // Without parentheses `T {` opens the body.
        let b = block("{\n\tif ok {\n\t\tx = T{}\n\t}\n}", &arena);
        let Stmt::If(stmt) = b.stmts[0] else {
            panic!("expected if");
        };
        assert_eq!(stmt.then.stmts.len(), 1);
    }

    #[test]
    fn for_forms() {
        let arena = Bump::new();
        let b = block(
            "{\n\tfor {\n\t}\n\tfor i < n {\n\t}\n\tfor i := 0; i < n; i++ {\n\t}\n\tfor k, v := range m {\n\t}\n\tfor range 3 {\n\t}\n}",
            &arena,
        );
        assert_eq!(b.stmts.len(), 5);
        assert!(matches!(b.stmts[0], Stmt::For(f) if f.cond.is_none()));
        assert!(matches!(b.stmts[1], Stmt::For(f) if f.cond.is_some() && f.init.is_none()));
        assert!(matches!(b.stmts[2], Stmt::For(f) if f.init.is_some() && f.post.is_some()));
        assert!(matches!(b.stmts[3], Stmt::Range(r) if r.define && r.value.is_some()));
        assert!(matches!(b.stmts[4], Stmt::Range(r) if r.key.is_none()));
    }

    #[test]
    fn switch_clauses() {
        let arena = Bump::new();
        let b = block(
            "{\n\tswitch x := f(); x {\n\tcase 1, 2:\n\t\tg()\n\t\tfallthrough\n\tdefault:\n\t}\n}",
            &arena,
        );
        let Stmt::Switch(sw) = b.stmts[0] else {
            panic!("expected switch");
        };
        assert!(sw.init.is_some());
        assert!(sw.tag.is_some());
        assert_eq!(sw.clauses.len(), 2);
        assert_eq!(sw.clauses[0].list.len(), 2);
        assert_eq!(sw.clauses[0].body.len(), 2);
        assert!(sw.clauses[1].is_default());
    }

    #[test]
    fn tagless_switch() {
        let arena = Bump::new();
        let b = block("{\n\tswitch {\n\tcase a < b:\n\t}\n}", &arena);
        assert!(matches!(b.stmts[0], Stmt::Switch(sw) if sw.tag.is_none()));
    }

    #[test]
    fn return_and_defer() {
        let arena = Bump::new();
        let b = block("{\n\tdefer f()\n\treturn a, b\n}", &arena);
        assert!(matches!(b.stmts[0], Stmt::Call(c) if c.keyword == CallKeyword::Defer));
        assert!(matches!(b.stmts[1], Stmt::Return(r) if r.results.len() == 2));
    }

    #[test]
    fn defer_requires_call() {
        assert_eq!(parse_err("{\n\tdefer x\n}").kind, ParseErrorKind::InvalidSyntax);
    }

    #[test]
    fn labels_are_unsupported() {
        assert_eq!(parse_err("{\nloop:\n\tfor {\n\t}\n}").kind, ParseErrorKind::Unsupported);
    }

    #[test]
    fn declaration_in_post_statement() {
        let err = parse_err("{\n\tfor i := 0; i < 3; j := 1 {\n\t}\n}");
        assert!(err.message.contains("post statement"));
    }
}
