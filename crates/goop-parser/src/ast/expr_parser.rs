//! Expression parsing: Pratt parsing for binary operators, recursive descent
//! for operands and postfix forms.

use super::parser::{PResult, Parser, describe};
use crate::ast::expr::*;
use crate::ast::{BinaryOp, ParseError, ParseErrorKind, UnaryOp};
use crate::lexer::TokenKind;

impl<'ast> Parser<'ast> {
    /// Parse an expression (or a type, where the grammar allows one).
    pub fn parse_expr(&mut self) -> PResult<Expr<'ast>> {
        self.parse_expr_bp(0)
    }

    /// Pratt loop: consume binary operators whose left binding power is at
    /// least `min_bp`.
    pub(crate) fn parse_expr_bp(&mut self, min_bp: u8) -> PResult<Expr<'ast>> {
        let mut lhs = self.parse_unary_expr()?;

        while let Some(op) = BinaryOp::from_token(self.peek_kind()) {
            let (l_bp, r_bp) = op.binding_power();
            if l_bp < min_bp {
                break;
            }
            let op_span = self.advance().span;
            let rhs = self.parse_expr_bp(r_bp)?;
            let id = self.next_id();
            lhs = Expr::Binary(self.alloc(BinaryExpr {
                id,
                op,
                left: lhs,
                right: rhs,
                op_span,
                span: lhs.span().to(rhs.span()),
            }));
        }

        Ok(lhs)
    }

    /// A comma-separated list of expressions.
    pub(crate) fn parse_expr_list(&mut self) -> PResult<Vec<Expr<'ast>>> {
        let mut list = vec![self.parse_expr()?];
        while self.eat(TokenKind::Comma) {
            list.push(self.parse_expr()?);
        }
        Ok(list)
    }

    fn parse_unary_expr(&mut self) -> PResult<Expr<'ast>> {
        let token = *self.peek();

        if let Some(op) = UnaryOp::from_token(token.kind) {
            self.advance();
            let x = self.parse_unary_expr()?;
            let id = self.next_id();
            return Ok(Expr::Unary(self.alloc(UnaryExpr {
                id,
                op,
                x,
                span: token.span.to(x.span()),
            })));
        }

        match token.kind {
            TokenKind::Mul => {
                self.advance();
                let x = self.parse_unary_expr()?;
                let id = self.next_id();
                Ok(Expr::Star(self.alloc(StarExpr {
                    id,
                    x,
                    span: token.span.to(x.span()),
                })))
            }
            TokenKind::Arrow => Err(ParseError::new(
                ParseErrorKind::Unsupported,
                token.span,
                "channel operations are not supported",
            )),
            _ => self.parse_primary_expr(),
        }
    }

    fn parse_primary_expr(&mut self) -> PResult<Expr<'ast>> {
        let mut x = self.parse_operand()?;

        loop {
            match self.peek_kind() {
                TokenKind::Period => {
                    self.advance();
                    if self.check(TokenKind::LParen) {
                        return Err(ParseError::new(
                            ParseErrorKind::Unsupported,
                            self.peek().span,
                            "type assertions are not supported",
                        ));
                    }
                    let sel = self.expect_ident()?;
                    let id = self.next_id();
                    x = Expr::Selector(self.alloc(SelectorExpr {
                        id,
                        x,
                        sel,
                        span: x.span().to(sel.span),
                    }));
                }
                TokenKind::LBrack => x = self.parse_index_or_slice(x)?,
                TokenKind::LParen => x = self.parse_call(x)?,
                TokenKind::LBrace
                    if is_literal_type(x) && (self.expr_lev >= 0 || !is_type_name(x)) =>
                {
                    x = self.parse_composite_lit(Some(x))?;
                }
                _ => return Ok(x),
            }
        }
    }

    fn parse_operand(&mut self) -> PResult<Expr<'ast>> {
        let token = *self.peek();
        match token.kind {
            TokenKind::Ident => {
                self.advance();
                let id = self.next_id();
                Ok(Expr::Ident(self.alloc(IdentExpr {
                    id,
                    name: token.lexeme,
                    span: token.span,
                })))
            }
            TokenKind::Int | TokenKind::Float | TokenKind::Rune | TokenKind::String => {
                self.advance();
                let kind = match token.kind {
                    TokenKind::Int => LitKind::Int,
                    TokenKind::Float => LitKind::Float,
                    TokenKind::Rune => LitKind::Rune,
                    _ => LitKind::String,
                };
                let id = self.next_id();
                Ok(Expr::BasicLit(self.alloc(BasicLit {
                    id,
                    kind,
                    value: token.lexeme,
                    span: token.span,
                })))
            }
            TokenKind::LParen => {
                self.advance();
                self.expr_lev += 1;
                let x = self.parse_type_or_expr();
                self.expr_lev -= 1;
                let x = x?;
                let close = self.expect(TokenKind::RParen)?;
                let id = self.next_id();
                Ok(Expr::Paren(self.alloc(ParenExpr {
                    id,
                    x,
                    span: token.span.to(close.span),
                })))
            }
            TokenKind::Func => {
                let ty = self.parse_func_type()?;
                if self.check(TokenKind::LBrace) {
                    return Err(ParseError::new(
                        ParseErrorKind::Unsupported,
                        token.span,
                        "function literals are not supported",
                    ));
                }
                Ok(Expr::FuncType(ty))
            }
            TokenKind::LBrack
            | TokenKind::Map
            | TokenKind::Struct
            | TokenKind::Interface
            | TokenKind::Chan => self.parse_type(),
            _ => Err(ParseError::expected_expression(token.span, &describe(&token))),
        }
    }

    /// Expressions in positions that also accept types (call arguments,
    /// parenthesised operands).
    pub(crate) fn parse_type_or_expr(&mut self) -> PResult<Expr<'ast>> {
        self.parse_expr()
    }

    fn parse_index_or_slice(&mut self, x: Expr<'ast>) -> PResult<Expr<'ast>> {
        let open = self.expect(TokenKind::LBrack)?;
        self.expr_lev += 1;
        let result = self.parse_index_parts();
        self.expr_lev -= 1;
        let (parts, colons) = result?;
        let close = self.expect(TokenKind::RBrack)?;
        let span = x.span().to(close.span);
        let id = self.next_id();

        if colons == 0 {
            let index = parts[0].ok_or_else(|| {
                ParseError::expected_expression(open.span.end(), "']'")
            })?;
            return Ok(Expr::Index(self.alloc(IndexExpr { id, x, index, span })));
        }

        let slice3 = colons == 2;
        if slice3 && (parts[1].is_none() || parts[2].is_none()) {
            return Err(ParseError::new(
                ParseErrorKind::InvalidSyntax,
                close.span,
                "middle and final index required in 3-index slice",
            ));
        }
        Ok(Expr::Slice(self.alloc(SliceExpr {
            id,
            x,
            low: parts[0],
            high: parts[1],
            max: parts[2],
            slice3,
            span,
        })))
    }

    /// Up to three optional expressions separated by colons.
    fn parse_index_parts(&mut self) -> PResult<([Option<Expr<'ast>>; 3], usize)> {
        let mut parts = [None; 3];
        let mut colons = 0;
        loop {
            if !self.check(TokenKind::Colon) && !self.check(TokenKind::RBrack) {
                parts[colons] = Some(self.parse_type_or_expr()?);
            }
            if colons < 2 && self.eat(TokenKind::Colon) {
                colons += 1;
            } else {
                return Ok((parts, colons));
            }
        }
    }

    fn parse_call(&mut self, fun: Expr<'ast>) -> PResult<Expr<'ast>> {
        self.expect(TokenKind::LParen)?;
        self.expr_lev += 1;
        let result = self.parse_call_args();
        self.expr_lev -= 1;
        let (args, has_ellipsis) = result?;
        let close = self.expect(TokenKind::RParen)?;
        let id = self.next_id();
        let args = self.alloc_slice(args);
        Ok(Expr::Call(self.alloc(CallExpr {
            id,
            fun,
            args,
            has_ellipsis,
            span: fun.span().to(close.span),
        })))
    }

    fn parse_call_args(&mut self) -> PResult<(Vec<Expr<'ast>>, bool)> {
        let mut args = Vec::new();
        let mut has_ellipsis = false;
        while !self.check(TokenKind::RParen) && !self.check(TokenKind::Eof) {
            args.push(self.parse_type_or_expr()?);
            if self.eat(TokenKind::Ellipsis) {
                has_ellipsis = true;
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
            if has_ellipsis {
                break;
            }
        }
        Ok((args, has_ellipsis))
    }

    /// `{ elements }`, with `ty` already parsed (or `None` when elided).
    pub(crate) fn parse_composite_lit(&mut self, ty: Option<Expr<'ast>>) -> PResult<Expr<'ast>> {
        let open = self.expect(TokenKind::LBrace)?;
        self.expr_lev += 1;
        let result = self.parse_composite_elements();
        self.expr_lev -= 1;
        let elts = result?;
        let close = self.expect(TokenKind::RBrace)?;
        let start = ty.map(|t| t.span()).unwrap_or(open.span);
        let id = self.next_id();
        let elts = self.alloc_slice(elts);
        Ok(Expr::CompositeLit(self.alloc(CompositeLit {
            id,
            ty,
            elts,
            span: start.to(close.span),
        })))
    }

    fn parse_composite_elements(&mut self) -> PResult<Vec<Expr<'ast>>> {
        let mut elts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::Eof) {
            let key = self.parse_element_value()?;
            let elt = if self.eat(TokenKind::Colon) {
                let value = self.parse_element_value()?;
                let id = self.next_id();
                Expr::KeyValue(self.alloc(KeyValueExpr {
                    id,
                    key,
                    value,
                    span: key.span().to(value.span()),
                }))
            } else {
                key
            };
            elts.push(elt);

            if self.eat(TokenKind::Comma) {
                continue;
            }
            if !self.check(TokenKind::RBrace) {
                let token = *self.peek();
                let expected = if token.is_implicit_semicolon() {
                    "',' before newline in composite literal"
                } else {
                    "',' or '}'"
                };
                return Err(self.unexpected(&token, expected));
            }
        }
        Ok(elts)
    }

    fn parse_element_value(&mut self) -> PResult<Expr<'ast>> {
        if self.check(TokenKind::LBrace) {
            self.parse_composite_lit(None)
        } else {
            self.parse_type_or_expr()
        }
    }
}

/// Whether `x` can be the type of a composite literal.
fn is_literal_type(x: Expr<'_>) -> bool {
    match x {
        Expr::Ident(_) | Expr::ArrayType(_) | Expr::StructType(_) | Expr::MapType(_) => true,
        Expr::Selector(sel) => matches!(sel.x, Expr::Ident(_)),
        _ => false,
    }
}

/// Whether `x` is a (possibly qualified) type name.
fn is_type_name(x: Expr<'_>) -> bool {
    match x {
        Expr::Ident(_) => true,
        Expr::Selector(sel) => matches!(sel.x, Expr::Ident(_)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use goop_core::ExprIdGen;

    fn parse<'a>(source: &str, arena: &'a Bump) -> Expr<'a> {
        let mut ids = ExprIdGen::new();
        Parser::parse_expression(source, arena, &mut ids).unwrap()
    }

    #[test]
    fn multiplication_binds_tighter() {
        let arena = Bump::new();
        let Expr::Binary(add) = parse("a + b * c", &arena) else {
            panic!("expected binary expression");
        };
        assert_eq!(add.op, BinaryOp::Add);
        assert!(matches!(add.right, Expr::Binary(mul) if mul.op == BinaryOp::Mul));
    }

    #[test]
    fn left_associative_chain() {
        let arena = Bump::new();
        // ((2*v1)*v2 + v1) - 4
        let Expr::Binary(sub) = parse("2*v1*v2 + v1 - 4", &arena) else {
            panic!("expected binary expression");
        };
        assert_eq!(sub.op, BinaryOp::Sub);
        let Expr::Binary(add) = sub.left else {
            panic!("expected addition on the left");
        };
        assert_eq!(add.op, BinaryOp::Add);
        let Expr::Binary(mul) = add.left else {
            panic!("expected multiplication");
        };
        assert!(matches!(mul.left, Expr::Binary(inner) if inner.op == BinaryOp::Mul));
    }

    #[test]
    fn unary_and_star() {
        let arena = Bump::new();
        let Expr::Binary(bin) = parse("-x * *p", &arena) else {
            panic!("expected binary expression");
        };
        assert!(matches!(bin.left, Expr::Unary(u) if u.op == UnaryOp::Neg));
        assert!(matches!(bin.right, Expr::Star(_)));
    }

    #[test]
    fn postfix_forms() {
        let arena = Bump::new();
        let Expr::Call(call) = parse("a.b[1][2:3](x, ys...)", &arena) else {
            panic!("expected call");
        };
        assert!(call.has_ellipsis);
        assert_eq!(call.args.len(), 2);
        let Expr::Slice(slice) = call.fun else {
            panic!("expected slice");
        };
        assert!(!slice.slice3);
        assert!(matches!(slice.x, Expr::Index(_)));
    }

    #[test]
    fn three_index_slice() {
        let arena = Bump::new();
        let Expr::Slice(slice) = parse("s[:2:4]", &arena) else {
            panic!("expected slice");
        };
        assert!(slice.slice3);
        assert!(slice.low.is_none());
        assert!(slice.max.is_some());
    }

    #[test]
    fn composite_literals() {
        let arena = Bump::new();
        let Expr::CompositeLit(lit) = parse("[]vec{{1, 2}, {x: 3}}", &arena) else {
            panic!("expected composite literal");
        };
        assert!(matches!(lit.ty, Some(Expr::ArrayType(a)) if a.len.is_none()));
        assert_eq!(lit.elts.len(), 2);
        assert!(matches!(lit.elts[0], Expr::CompositeLit(inner) if inner.ty.is_none()));
        let Expr::CompositeLit(second) = lit.elts[1] else {
            panic!("expected elided literal");
        };
        assert!(matches!(second.elts[0], Expr::KeyValue(_)));
    }

    #[test]
    fn conversion_with_type_argument() {
        let arena = Bump::new();
        let Expr::Call(call) = parse("make([]int, 3)", &arena) else {
            panic!("expected call");
        };
        assert!(matches!(call.args[0], Expr::ArrayType(_)));
    }

    #[test]
    fn ids_are_unique() {
        let arena = Bump::new();
        let Expr::Binary(bin) = parse("a + b", &arena) else {
            panic!("expected binary expression");
        };
        assert_ne!(bin.left.id(), bin.right.id());
        assert_ne!(bin.id, bin.left.id());
    }

    #[test]
    fn spans_cover_operands() {
        let arena = Bump::new();
        let e = parse("foo + barbaz", &arena);
        assert_eq!(e.span().col, 1);
        assert_eq!(e.span().len, 12);
    }

    #[test]
    fn missing_comma_before_newline() {
        let arena = Bump::new();
        let mut ids = ExprIdGen::new();
        let errors = Parser::parse_expression("T{1\n}", &arena, &mut ids).unwrap_err();
        assert!(errors.first().unwrap().message.contains("before newline"));
    }

    #[test]
    fn function_literals_are_rejected() {
        let arena = Bump::new();
        let mut ids = ExprIdGen::new();
        let errors = Parser::parse_expression("func() {}", &arena, &mut ids).unwrap_err();
        assert_eq!(errors.first().unwrap().kind, ParseErrorKind::Unsupported);
    }
}
