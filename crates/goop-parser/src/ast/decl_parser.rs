//! Source files and declarations.

use super::parser::{PResult, Parser, describe};
use crate::ast::decl::*;
use crate::ast::{Ident, ParseError, ParseErrorKind, SourceFile};
use crate::lexer::TokenKind;

impl<'ast> Parser<'ast> {
    /// `package name; imports; decls`. Errors are collected in
    /// `self.errors`; parsing resumes at the next top-level keyword.
    pub(crate) fn parse_source_file(&mut self) -> SourceFile<'ast> {
        let start = self.peek().span;
        let package = match self.parse_package_clause() {
            Ok(name) => name,
            Err(error) => {
                self.errors.push(error);
                return SourceFile {
                    package: Ident::new("", start),
                    decls: &[],
                    span: start,
                };
            }
        };

        let mut decls = Vec::new();
        loop {
            let token = *self.peek();
            let result = match token.kind {
                TokenKind::Eof => break,
                TokenKind::Semicolon => {
                    self.advance();
                    continue;
                }
                TokenKind::Func => self.parse_func_decl().map(Decl::Func),
                TokenKind::Import | TokenKind::Const | TokenKind::Var | TokenKind::Type => {
                    self.parse_gen_decl().map(Decl::Gen)
                }
                _ => {
                    self.advance();
                    Err(ParseError::new(
                        ParseErrorKind::ExpectedDeclaration,
                        token.span,
                        format!("expected declaration, found {}", describe(&token)),
                    ))
                }
            };

            match result.and_then(|decl| self.expect_semi().map(|()| decl)) {
                Ok(decl) => decls.push(decl),
                Err(error) => {
                    self.errors.push(error);
                    self.synchronize_decl();
                }
            }
        }

        let decls = self.alloc_slice(decls);
        SourceFile {
            package,
            decls,
            span: start.to(self.prev_span()),
        }
    }

    fn parse_package_clause(&mut self) -> PResult<Ident<'ast>> {
        while self.eat(TokenKind::Semicolon) {}
        if !self.check(TokenKind::Package) {
            let token = *self.peek();
            return Err(ParseError::new(
                ParseErrorKind::MissingPackageClause,
                token.span,
                format!("expected 'package', found {}", describe(&token)),
            ));
        }
        self.advance();
        let name = self.expect_ident()?;
        if name.is_blank() {
            return Err(ParseError::new(
                ParseErrorKind::InvalidSyntax,
                name.span,
                "invalid package name _",
            ));
        }
        self.expect_semi()?;
        Ok(name)
    }

    /// `keyword spec` or `keyword ( spec; ... )`.
    pub(crate) fn parse_gen_decl(&mut self) -> PResult<&'ast GenDecl<'ast>> {
        let token = self.advance();
        let keyword = match token.kind {
            TokenKind::Import => DeclKeyword::Import,
            TokenKind::Const => DeclKeyword::Const,
            TokenKind::Var => DeclKeyword::Var,
            TokenKind::Type => DeclKeyword::Type,
            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::ExpectedDeclaration,
                    token.span,
                    format!("expected declaration, found {}", describe(&token)),
                ));
            }
        };

        let mut specs = Vec::new();
        let grouped = self.eat(TokenKind::LParen);
        if grouped {
            let mut iota = 0;
            while !self.check(TokenKind::RParen) && !self.check(TokenKind::Eof) {
                specs.push(self.parse_spec(keyword, iota)?);
                self.expect_semi()?;
                iota += 1;
            }
            self.expect(TokenKind::RParen)?;
        } else {
            specs.push(self.parse_spec(keyword, 0)?);
        }

        let specs = self.alloc_slice(specs);
        Ok(self.alloc(GenDecl {
            keyword,
            specs,
            grouped,
            span: token.span.to(self.prev_span()),
        }))
    }

    fn parse_spec(&mut self, keyword: DeclKeyword, iota: u32) -> PResult<Spec<'ast>> {
        let start = self.peek().span;
        match keyword {
            DeclKeyword::Import => {
                let name = match self.peek_kind() {
                    TokenKind::Ident => Some(self.expect_ident()?),
                    TokenKind::Period => {
                        return Err(ParseError::new(
                            ParseErrorKind::Unsupported,
                            self.peek().span,
                            "dot imports are not supported",
                        ));
                    }
                    _ => None,
                };
                let path = self.expect(TokenKind::String)?;
                Ok(Spec::Import(self.alloc(ImportSpec {
                    name,
                    path: path.lexeme,
                    span: start.to(path.span),
                })))
            }
            DeclKeyword::Const | DeclKeyword::Var => {
                let mut names = vec![self.expect_ident()?];
                while self.eat(TokenKind::Comma) {
                    names.push(self.expect_ident()?);
                }
                let ty = match self.peek_kind() {
                    TokenKind::Assign | TokenKind::Semicolon | TokenKind::RParen => None,
                    _ => Some(self.parse_type()?),
                };
                let values = if self.eat(TokenKind::Assign) {
                    self.parse_expr_list()?
                } else {
                    Vec::new()
                };
                if keyword == DeclKeyword::Var && ty.is_none() && values.is_empty() {
                    let token = *self.peek();
                    return Err(self.unexpected(&token, "type or '='"));
                }
                if keyword == DeclKeyword::Const && iota == 0 && values.is_empty() {
                    return Err(ParseError::new(
                        ParseErrorKind::InvalidSyntax,
                        start,
                        "missing init expr for const declaration",
                    ));
                }
                let names = self.alloc_slice(names);
                let values = self.alloc_slice(values);
                Ok(Spec::Value(self.alloc(ValueSpec {
                    names,
                    ty,
                    values,
                    iota,
                    span: start.to(self.prev_span()),
                })))
            }
            DeclKeyword::Type => {
                let name = self.expect_ident()?;
                let alias = self.eat(TokenKind::Assign);
                let ty = self.parse_type()?;
                Ok(Spec::Type(self.alloc(TypeSpec {
                    name,
                    alias,
                    ty,
                    span: start.to(ty.span()),
                })))
            }
        }
    }

    /// `func [recv] name signature [body]`
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn parse_func_decl(&mut self) -> PResult<&'ast FuncDecl<'ast>> {
        let start = self.expect(TokenKind::Func)?.span;

        let recv = if self.check(TokenKind::LParen) {
            let open = self.peek().span;
            let mut params = self.parse_params()?;
            if params.len() != 1 || params[0].names.len() > 1 {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidSyntax,
                    open,
                    "method has multiple receivers",
                ));
            }
            params.pop().map(|field| self.alloc(field))
        } else {
            None
        };

        let name = self.expect_ident()?;
        if self.check(TokenKind::LBrack) {
            return Err(ParseError::new(
                ParseErrorKind::Unsupported,
                self.peek().span,
                "type parameters are not supported",
            ));
        }
        let ty = self.parse_signature(start)?;
        let body = if self.check(TokenKind::LBrace) {
            let prev_lev = self.expr_lev;
            self.expr_lev = 0;
            let body = self.parse_block();
            self.expr_lev = prev_lev;
            Some(body?)
        } else {
            None
        };

        Ok(self.alloc(FuncDecl {
            recv,
            name,
            ty,
            body,
            span: start.to(self.prev_span()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expr, Stmt};
    use bumpalo::Bump;
    use goop_core::ExprIdGen;

    fn parse<'a>(source: &str, arena: &'a Bump) -> SourceFile<'a> {
        let mut ids = ExprIdGen::new();
        match Parser::parse_file(source, arena, &mut ids) {
            Ok(file) => file,
            Err(errors) => panic!("{errors}"),
        }
    }

    #[test]
    fn imports_and_package() {
        let arena = Bump::new();
        let file = parse(
            "package main\n\nimport (\n\t\"fmt\"\n\tm \"math\"\n)\n\nimport \"strings\"\n",
            &arena,
        );
        assert_eq!(file.package.name, "main");
        let imports: Vec<_> = file.imports().collect();
        assert_eq!(imports.len(), 3);
        assert_eq!(imports[0].path_value(), "fmt");
        assert_eq!(imports[1].name.map(|n| n.name), Some("m"));
    }

    #[test]
    fn grouped_consts_carry_iota() {
        let arena = Bump::new();
        let file = parse("package p\n\nconst (\n\tA = iota\n\tB\n\tC\n)\n", &arena);
        let Decl::Gen(decl) = file.decls[0] else {
            panic!("expected const decl");
        };
        assert!(decl.grouped);
        let iotas: Vec<_> = decl
            .specs
            .iter()
            .map(|spec| match spec {
                Spec::Value(v) => v.iota,
                _ => panic!("expected value spec"),
            })
            .collect();
        assert_eq!(iotas, [0, 1, 2]);
    }

    #[test]
    fn method_with_pointer_receiver() {
        let arena = Bump::new();
        let file = parse(
            "package p\n\ntype vec4 [4]float64\n\nfunc (v *vec4) Op_Add(o vec4) vec4 {\n\treturn o\n}\n",
            &arena,
        );
        let func = file.funcs().next().unwrap();
        assert_eq!(func.name.name, "Op_Add");
        let recv = func.recv.unwrap();
        assert_eq!(recv.names[0].name, "v");
        assert!(matches!(recv.ty, Expr::Star(_)));
        assert_eq!(func.ty.results.len(), 1);
        assert!(matches!(func.body.unwrap().stmts[0], Stmt::Return(_)));
    }

    #[test]
    fn type_alias_and_struct() {
        let arena = Bump::new();
        let file = parse(
            "package p\n\ntype (\n\tF = float64\n\tP struct {\n\t\tX, Y F\n\t}\n)\n",
            &arena,
        );
        let Decl::Gen(decl) = file.decls[0] else {
            panic!("expected type decl");
        };
        assert!(matches!(decl.specs[0], Spec::Type(t) if t.alias));
        assert!(matches!(decl.specs[1], Spec::Type(t) if matches!(t.ty, Expr::StructType(_))));
    }

    #[test]
    fn missing_package_clause() {
        let arena = Bump::new();
        let mut ids = ExprIdGen::new();
        let errors = Parser::parse_file("func main() {}\n", &arena, &mut ids).unwrap_err();
        assert_eq!(errors.first().unwrap().kind, ParseErrorKind::MissingPackageClause);
    }

    #[test]
    fn recovers_at_next_declaration() {
        let arena = Bump::new();
        let mut ids = ExprIdGen::new();
        let (file, errors) = Parser::parse_file_lenient(
            "package p\n\nfunc a() {\n\tx := \n}\n\nfunc b() {}\n\nvar = 3\n\nfunc c() {}\n",
            &arena,
            &mut ids,
        );
        assert_eq!(errors.len(), 2);
        let names: Vec<_> = file.funcs().map(|f| f.name.name).collect();
        assert_eq!(names, ["b", "c"]);
    }

    #[test]
    fn multiple_receivers_rejected() {
        let arena = Bump::new();
        let mut ids = ExprIdGen::new();
        let errors =
            Parser::parse_file("package p\nfunc (a, b T) f() {}\n", &arena, &mut ids).unwrap_err();
        assert!(errors.first().unwrap().message.contains("multiple receivers"));
    }
}
