//! Type expressions, parameter lists and struct/interface bodies.

use goop_core::Span;

use super::parser::{PResult, Parser, describe};
use crate::ast::expr::*;
use crate::ast::{ParseError, ParseErrorKind};
use crate::lexer::TokenKind;

/// One entry of a parameter list before names are grouped with types.
enum ParamEntry<'ast> {
    Named(crate::ast::Ident<'ast>, Expr<'ast>),
    Bare(Expr<'ast>),
}

impl<'ast> Parser<'ast> {
    /// Parse a type.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn parse_type(&mut self) -> PResult<Expr<'ast>> {
        let token = *self.peek();
        match token.kind {
            TokenKind::Ident => self.parse_type_name(),
            TokenKind::Mul => {
                self.advance();
                let x = self.parse_type()?;
                let id = self.next_id();
                Ok(Expr::Star(self.alloc(StarExpr {
                    id,
                    x,
                    span: token.span.to(x.span()),
                })))
            }
            TokenKind::LBrack => self.parse_array_type(),
            TokenKind::Map => self.parse_map_type(),
            TokenKind::Struct => self.parse_struct_type(),
            TokenKind::Interface => self.parse_interface_type(),
            TokenKind::Func => Ok(Expr::FuncType(self.parse_func_type()?)),
            TokenKind::LParen => {
                self.advance();
                let x = self.parse_type()?;
                let close = self.expect(TokenKind::RParen)?;
                let id = self.next_id();
                Ok(Expr::Paren(self.alloc(ParenExpr {
                    id,
                    x,
                    span: token.span.to(close.span),
                })))
            }
            TokenKind::Chan | TokenKind::Arrow => Err(ParseError::new(
                ParseErrorKind::Unsupported,
                token.span,
                "channel types are not supported",
            )),
            _ => Err(ParseError::expected_type(token.span, &describe(&token))),
        }
    }

    /// `T` or `pkg.T`.
    fn parse_type_name(&mut self) -> PResult<Expr<'ast>> {
        let name = self.expect_ident()?;
        let id = self.next_id();
        let mut x = Expr::Ident(self.alloc(IdentExpr {
            id,
            name: name.name,
            span: name.span,
        }));
        if self.check(TokenKind::Period) {
            self.advance();
            let sel = self.expect_ident()?;
            let id = self.next_id();
            x = Expr::Selector(self.alloc(SelectorExpr {
                id,
                x,
                sel,
                span: name.span.to(sel.span),
            }));
        }
        Ok(x)
    }

    fn parse_array_type(&mut self) -> PResult<Expr<'ast>> {
        let open = self.expect(TokenKind::LBrack)?;
        let len = match self.peek_kind() {
            TokenKind::RBrack => None,
            TokenKind::Ellipsis => {
                let token = self.advance();
                let id = self.next_id();
                Some(Expr::Ellipsis(self.alloc(EllipsisExpr {
                    id,
                    elem: None,
                    span: token.span,
                })))
            }
            _ => {
                self.expr_lev += 1;
                let len = self.parse_expr();
                self.expr_lev -= 1;
                Some(len?)
            }
        };
        self.expect(TokenKind::RBrack)?;
        let elem = self.parse_type()?;
        let id = self.next_id();
        Ok(Expr::ArrayType(self.alloc(ArrayTypeExpr {
            id,
            len,
            elem,
            span: open.span.to(elem.span()),
        })))
    }

    fn parse_map_type(&mut self) -> PResult<Expr<'ast>> {
        let start = self.expect(TokenKind::Map)?.span;
        self.expect(TokenKind::LBrack)?;
        let key = self.parse_type()?;
        self.expect(TokenKind::RBrack)?;
        let value = self.parse_type()?;
        let id = self.next_id();
        Ok(Expr::MapType(self.alloc(MapTypeExpr {
            id,
            key,
            value,
            span: start.to(value.span()),
        })))
    }

    // =========================================
    // Structs
    // =========================================

    fn parse_struct_type(&mut self) -> PResult<Expr<'ast>> {
        let start = self.expect(TokenKind::Struct)?.span;
        self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::Eof) {
            fields.push(self.parse_field_decl()?);
            self.expect_semi()?;
        }
        let close = self.expect(TokenKind::RBrace)?;
        let id = self.next_id();
        let fields = self.alloc_slice(fields);
        Ok(Expr::StructType(self.alloc(StructTypeExpr {
            id,
            fields,
            span: start.to(close.span),
        })))
    }

    fn parse_field_decl(&mut self) -> PResult<Field<'ast>> {
        let start = self.peek().span;
        let embedded = match self.peek_kind() {
            TokenKind::Mul => true,
            TokenKind::Ident => matches!(
                self.peek_nth(1).kind,
                TokenKind::Period | TokenKind::Semicolon | TokenKind::RBrace | TokenKind::String
            ),
            _ => {
                let token = *self.peek();
                return Err(self.unexpected(&token, "field name or embedded type"));
            }
        };

        let (names, ty) = if embedded {
            (Vec::new(), self.parse_type()?)
        } else {
            let mut names = vec![self.expect_ident()?];
            while self.eat(TokenKind::Comma) {
                names.push(self.expect_ident()?);
            }
            (names, self.parse_type()?)
        };

        let tag = if self.check(TokenKind::String) {
            Some(self.advance().lexeme)
        } else {
            None
        };

        let names = self.alloc_slice(names);
        Ok(Field {
            names,
            ty,
            tag,
            span: start.to(self.prev_span()),
        })
    }

    // =========================================
    // Interfaces
    // =========================================

    fn parse_interface_type(&mut self) -> PResult<Expr<'ast>> {
        let start = self.expect(TokenKind::Interface)?.span;
        self.expect(TokenKind::LBrace)?;
        let mut elems = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::Eof) {
            let elem = if self.check(TokenKind::Ident) && self.peek_nth(1).kind == TokenKind::LParen
            {
                let name = self.expect_ident()?;
                let ty = self.parse_signature(name.span)?;
                InterfaceElem::Method { name, ty }
            } else if self.check(TokenKind::Tilde) {
                return Err(ParseError::new(
                    ParseErrorKind::Unsupported,
                    self.peek().span,
                    "type constraints are not supported",
                ));
            } else {
                InterfaceElem::Embedded(self.parse_type()?)
            };
            elems.push(elem);
            self.expect_semi()?;
        }
        let close = self.expect(TokenKind::RBrace)?;
        let id = self.next_id();
        let elems = self.alloc_slice(elems);
        Ok(Expr::InterfaceType(self.alloc(InterfaceTypeExpr {
            id,
            elems,
            span: start.to(close.span),
        })))
    }

    // =========================================
    // Signatures
    // =========================================

    /// `func(params) results`
    pub(crate) fn parse_func_type(&mut self) -> PResult<&'ast FuncTypeExpr<'ast>> {
        let start = self.expect(TokenKind::Func)?.span;
        self.parse_signature(start)
    }

    /// `(params) results`, with `start` marking where the node begins.
    pub(crate) fn parse_signature(&mut self, start: Span) -> PResult<&'ast FuncTypeExpr<'ast>> {
        let params = self.parse_params()?;
        let results = if self.check(TokenKind::LParen) {
            self.parse_params()?
        } else if starts_type(self.peek_kind()) {
            let ty = self.parse_type()?;
            vec![Field {
                names: &[],
                ty,
                tag: None,
                span: ty.span(),
            }]
        } else {
            Vec::new()
        };
        let id = self.next_id();
        let params = self.alloc_slice(params);
        let results = self.alloc_slice(results);
        Ok(self.alloc(FuncTypeExpr {
            id,
            params,
            results,
            span: start.to(self.prev_span()),
        }))
    }

    /// A parenthesised parameter list, grouping `a, b int` into one field.
    pub(crate) fn parse_params(&mut self) -> PResult<Vec<Field<'ast>>> {
        let open = self.expect(TokenKind::LParen)?;
        let mut entries = Vec::new();
        while !self.check(TokenKind::RParen) && !self.check(TokenKind::Eof) {
            entries.push(self.parse_param_entry()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;

        let named = entries.iter().any(|e| matches!(e, ParamEntry::Named(..)));
        if !named {
            return Ok(entries
                .into_iter()
                .map(|entry| {
                    let ty = match entry {
                        ParamEntry::Bare(ty) | ParamEntry::Named(_, ty) => ty,
                    };
                    Field {
                        names: &[],
                        ty,
                        tag: None,
                        span: ty.span(),
                    }
                })
                .collect());
        }

        let mut fields = Vec::new();
        let mut pending = Vec::new();
        for entry in entries {
            match entry {
                ParamEntry::Bare(Expr::Ident(ident)) => pending.push(ident.ident()),
                ParamEntry::Bare(other) => {
                    return Err(ParseError::new(
                        ParseErrorKind::InvalidSyntax,
                        other.span(),
                        "mixed named and unnamed parameters",
                    ));
                }
                ParamEntry::Named(name, ty) => {
                    pending.push(name);
                    let span = pending[0].span.to(ty.span());
                    let names = self.alloc_slice(std::mem::take(&mut pending));
                    fields.push(Field {
                        names,
                        ty,
                        tag: None,
                        span,
                    });
                }
            }
        }
        if let Some(name) = pending.first() {
            return Err(ParseError::new(
                ParseErrorKind::InvalidSyntax,
                name.span.to(open.span),
                "mixed named and unnamed parameters",
            ));
        }
        Ok(fields)
    }

    fn parse_param_entry(&mut self) -> PResult<ParamEntry<'ast>> {
        if self.check(TokenKind::Ident) {
            let next = self.peek_nth(1).kind;
            if next != TokenKind::Comma
                && next != TokenKind::RParen
                && next != TokenKind::Period
                && (starts_type(next) || next == TokenKind::Ellipsis)
            {
                let name = self.expect_ident()?;
                let ty = self.parse_param_type()?;
                return Ok(ParamEntry::Named(name, ty));
            }
        }
        Ok(ParamEntry::Bare(self.parse_param_type()?))
    }

    /// A parameter type, allowing a leading `...`.
    fn parse_param_type(&mut self) -> PResult<Expr<'ast>> {
        if self.check(TokenKind::Ellipsis) {
            let start = self.advance().span;
            let elem = self.parse_type()?;
            let id = self.next_id();
            return Ok(Expr::Ellipsis(self.alloc(EllipsisExpr {
                id,
                elem: Some(elem),
                span: start.to(elem.span()),
            })));
        }
        self.parse_type()
    }
}

/// Tokens that can begin a type.
fn starts_type(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Ident
            | TokenKind::LBrack
            | TokenKind::Struct
            | TokenKind::Map
            | TokenKind::Chan
            | TokenKind::Func
            | TokenKind::Interface
            | TokenKind::Mul
            | TokenKind::LParen
            | TokenKind::Arrow
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use goop_core::ExprIdGen;

    fn func_type<'a>(source: &str, arena: &'a Bump) -> &'a FuncTypeExpr<'a> {
        let mut parser = Parser::new(source, arena, ExprIdGen::new());
        parser.parse_func_type().unwrap()
    }

    #[test]
    fn grouped_parameter_names() {
        let arena = Bump::new();
        let ty = func_type("func(a, b int, s string) bool", &arena);
        assert_eq!(ty.params.len(), 2);
        assert_eq!(ty.params[0].names.len(), 2);
        assert_eq!(ty.params[0].names[1].name, "b");
        assert_eq!(ty.params[1].names[0].name, "s");
        assert_eq!(ty.results.len(), 1);
    }

    #[test]
    fn unnamed_parameters() {
        let arena = Bump::new();
        let ty = func_type("func(int, *pkg.T) (int, error)", &arena);
        assert_eq!(ty.params.len(), 2);
        assert!(ty.params.iter().all(|p| p.names.is_empty()));
        assert!(matches!(ty.params[1].ty, Expr::Star(_)));
        assert_eq!(ty.results.len(), 2);
    }

    #[test]
    fn variadic_parameter() {
        let arena = Bump::new();
        let ty = func_type("func(format string, args ...int)", &arena);
        assert!(ty.is_variadic());
        assert!(ty.results.is_empty());

        let ty = func_type("func(...float64)", &arena);
        assert!(ty.is_variadic());
    }

    #[test]
    fn mixed_parameters_are_rejected() {
        let arena = Bump::new();
        let mut parser = Parser::new("func(a int, []int)", &arena, ExprIdGen::new());
        let err = parser.parse_func_type().unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidSyntax);
    }

    #[test]
    fn struct_fields_and_embedding() {
        let arena = Bump::new();
        let mut parser = Parser::new(
            "struct {\n\tX, Y float64\n\tBase\n\t*pkg.Other\n\tName string `json:\"name\"`\n}",
            &arena,
            ExprIdGen::new(),
        );
        let Expr::StructType(st) = parser.parse_type().unwrap() else {
            panic!("expected struct type");
        };
        assert_eq!(st.fields.len(), 4);
        assert_eq!(st.fields[0].names.len(), 2);
        assert!(st.fields[1].names.is_empty());
        assert!(st.fields[2].names.is_empty());
        assert!(matches!(st.fields[2].ty, Expr::Star(_)));
        assert_eq!(st.fields[3].tag, Some("`json:\"name\"`"));
    }

    #[test]
    fn interface_methods() {
        let arena = Bump::new();
        let mut parser = Parser::new(
            "interface {\n\tLen() int\n\tfmt.Stringer\n}",
            &arena,
            ExprIdGen::new(),
        );
        let Expr::InterfaceType(it) = parser.parse_type().unwrap() else {
            panic!("expected interface type");
        };
        assert_eq!(it.elems.len(), 2);
        assert!(matches!(it.elems[0], InterfaceElem::Method { name, .. } if name.name == "Len"));
        assert!(matches!(it.elems[1], InterfaceElem::Embedded(Expr::Selector(_))));
    }

    #[test]
    fn array_and_map_types() {
        let arena = Bump::new();
        let mut parser = Parser::new("map[string][4]float64", &arena, ExprIdGen::new());
        let Expr::MapType(m) = parser.parse_type().unwrap() else {
            panic!("expected map type");
        };
        assert!(matches!(m.value, Expr::ArrayType(a) if a.len.is_some()));
    }

    #[test]
    fn channels_are_unsupported() {
        let arena = Bump::new();
        let mut parser = Parser::new("chan int", &arena, ExprIdGen::new());
        assert_eq!(parser.parse_type().unwrap_err().kind, ParseErrorKind::Unsupported);
    }
}
