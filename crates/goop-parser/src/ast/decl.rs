//! Declaration nodes.

use goop_core::Span;

use crate::ast::{BlockStmt, Expr, Field, FuncTypeExpr, Ident};

/// A top-level declaration.
#[derive(Debug, Clone, Copy)]
pub enum Decl<'ast> {
    Gen(&'ast GenDecl<'ast>),
    Func(&'ast FuncDecl<'ast>),
}

impl Decl<'_> {
    pub fn span(&self) -> Span {
        match self {
            Decl::Gen(d) => d.span,
            Decl::Func(d) => d.span,
        }
    }
}

/// The keyword introducing a [`GenDecl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKeyword {
    Import,
    Const,
    Var,
    Type,
}

impl DeclKeyword {
    pub fn as_str(self) -> &'static str {
        match self {
            DeclKeyword::Import => "import",
            DeclKeyword::Const => "const",
            DeclKeyword::Var => "var",
            DeclKeyword::Type => "type",
        }
    }
}

/// `import`, `const`, `var` or `type`, single or parenthesised.
#[derive(Debug, Clone, Copy)]
pub struct GenDecl<'ast> {
    pub keyword: DeclKeyword,
    pub specs: &'ast [Spec<'ast>],
    /// Whether the specs were written inside `( )`.
    pub grouped: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy)]
pub enum Spec<'ast> {
    Import(&'ast ImportSpec<'ast>),
    Value(&'ast ValueSpec<'ast>),
    Type(&'ast TypeSpec<'ast>),
}

#[derive(Debug, Clone, Copy)]
pub struct ImportSpec<'ast> {
    /// Local name override, if any.
    pub name: Option<Ident<'ast>>,
    /// The path literal, quotes included.
    pub path: &'ast str,
    pub span: Span,
}

impl<'ast> ImportSpec<'ast> {
    /// The import path without quotes.
    pub fn path_value(&self) -> &'ast str {
        self.path
            .strip_prefix(['"', '`'])
            .and_then(|p| p.strip_suffix(['"', '`']))
            .unwrap_or(self.path)
    }
}

/// A `const` or `var` spec: `names [type] [= values]`.
#[derive(Debug, Clone, Copy)]
pub struct ValueSpec<'ast> {
    pub names: &'ast [Ident<'ast>],
    pub ty: Option<Expr<'ast>>,
    pub values: &'ast [Expr<'ast>],
    /// Position of the spec within its group; the value of `iota` for consts.
    pub iota: u32,
    pub span: Span,
}

/// `name T` or the alias form `name = T`.
#[derive(Debug, Clone, Copy)]
pub struct TypeSpec<'ast> {
    pub name: Ident<'ast>,
    pub alias: bool,
    pub ty: Expr<'ast>,
    pub span: Span,
}

/// A function or method declaration.
#[derive(Debug, Clone, Copy)]
pub struct FuncDecl<'ast> {
    pub recv: Option<&'ast Field<'ast>>,
    pub name: Ident<'ast>,
    pub ty: &'ast FuncTypeExpr<'ast>,
    /// `None` for declarations without a body.
    pub body: Option<&'ast BlockStmt<'ast>>,
    pub span: Span,
}
