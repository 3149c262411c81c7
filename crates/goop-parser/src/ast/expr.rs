//! Expression nodes.
//!
//! Types are expressions too, as in Go: `[]int`, `*T` and `map[K]V` parse to
//! the same [`Expr`] enum as values, and the checker decides which is which.
//!
//! Every node carries an [`ExprId`] assigned by the parser. The id survives
//! tree rebuilding, so tables keyed by it stay valid across the rewrite pass.
//!
//! # Precedence
//!
//! 1. `||`
//! 2. `&&`
//! 3. `==` `!=` `<` `<=` `>` `>=`
//! 4. `+` `-` `|` `^`
//! 5. `*` `/` `%` `<<` `>>` `&` `&^`
//! 6. prefix `+` `-` `!` `^` `*` `&`
//! 7. postfix selectors, indexing, slicing, calls

use goop_core::{ExprId, Span};

use crate::ast::{BinaryOp, UnaryOp};

/// A name in declaration position (not an expression).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident<'ast> {
    pub name: &'ast str,
    pub span: Span,
}

impl<'ast> Ident<'ast> {
    pub fn new(name: &'ast str, span: Span) -> Self {
        Self { name, span }
    }

    /// Whether this is the blank identifier `_`.
    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }

    /// Whether the name starts with an upper-case letter.
    pub fn is_exported(&self) -> bool {
        self.name.chars().next().is_some_and(char::is_uppercase)
    }
}

/// An expression or type expression.
#[derive(Debug, Clone, Copy)]
pub enum Expr<'ast> {
    Ident(&'ast IdentExpr<'ast>),
    BasicLit(&'ast BasicLit<'ast>),
    CompositeLit(&'ast CompositeLit<'ast>),
    Paren(&'ast ParenExpr<'ast>),
    Selector(&'ast SelectorExpr<'ast>),
    Index(&'ast IndexExpr<'ast>),
    Slice(&'ast SliceExpr<'ast>),
    Call(&'ast CallExpr<'ast>),
    /// Dereference `*x`, or pointer type `*T`.
    Star(&'ast StarExpr<'ast>),
    Unary(&'ast UnaryExpr<'ast>),
    Binary(&'ast BinaryExpr<'ast>),
    /// `key: value`, only inside composite literals.
    KeyValue(&'ast KeyValueExpr<'ast>),
    /// `[N]T`, `[...]T` or `[]T`.
    ArrayType(&'ast ArrayTypeExpr<'ast>),
    MapType(&'ast MapTypeExpr<'ast>),
    StructType(&'ast StructTypeExpr<'ast>),
    FuncType(&'ast FuncTypeExpr<'ast>),
    InterfaceType(&'ast InterfaceTypeExpr<'ast>),
    /// `...T` in a parameter list, or `...` as an array length.
    Ellipsis(&'ast EllipsisExpr<'ast>),
}

impl<'ast> Expr<'ast> {
    /// Stable identity of this node.
    pub fn id(&self) -> ExprId {
        match self {
            Expr::Ident(e) => e.id,
            Expr::BasicLit(e) => e.id,
            Expr::CompositeLit(e) => e.id,
            Expr::Paren(e) => e.id,
            Expr::Selector(e) => e.id,
            Expr::Index(e) => e.id,
            Expr::Slice(e) => e.id,
            Expr::Call(e) => e.id,
            Expr::Star(e) => e.id,
            Expr::Unary(e) => e.id,
            Expr::Binary(e) => e.id,
            Expr::KeyValue(e) => e.id,
            Expr::ArrayType(e) => e.id,
            Expr::MapType(e) => e.id,
            Expr::StructType(e) => e.id,
            Expr::FuncType(e) => e.id,
            Expr::InterfaceType(e) => e.id,
            Expr::Ellipsis(e) => e.id,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Expr::Ident(e) => e.span,
            Expr::BasicLit(e) => e.span,
            Expr::CompositeLit(e) => e.span,
            Expr::Paren(e) => e.span,
            Expr::Selector(e) => e.span,
            Expr::Index(e) => e.span,
            Expr::Slice(e) => e.span,
            Expr::Call(e) => e.span,
            Expr::Star(e) => e.span,
            Expr::Unary(e) => e.span,
            Expr::Binary(e) => e.span,
            Expr::KeyValue(e) => e.span,
            Expr::ArrayType(e) => e.span,
            Expr::MapType(e) => e.span,
            Expr::StructType(e) => e.span,
            Expr::FuncType(e) => e.span,
            Expr::InterfaceType(e) => e.span,
            Expr::Ellipsis(e) => e.span,
        }
    }

    /// Strip any number of enclosing parentheses.
    pub fn unparen(self) -> Expr<'ast> {
        let mut e = self;
        while let Expr::Paren(p) = e {
            e = p.x;
        }
        e
    }

    /// The identifier name, if this is a plain identifier.
    pub fn as_ident(&self) -> Option<&'ast IdentExpr<'ast>> {
        match self {
            Expr::Ident(ident) => Some(ident),
            _ => None,
        }
    }
}

/// Identifier reference.
#[derive(Debug, Clone, Copy)]
pub struct IdentExpr<'ast> {
    pub id: ExprId,
    pub name: &'ast str,
    pub span: Span,
}

impl<'ast> IdentExpr<'ast> {
    pub fn ident(&self) -> Ident<'ast> {
        Ident::new(self.name, self.span)
    }
}

/// Kind of a basic literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LitKind {
    Int,
    Float,
    Rune,
    String,
}

/// A literal, kept as its source spelling (quotes included).
#[derive(Debug, Clone, Copy)]
pub struct BasicLit<'ast> {
    pub id: ExprId,
    pub kind: LitKind,
    pub value: &'ast str,
    pub span: Span,
}

/// `T{elts}`, or `{elts}` with the type elided inside an outer literal.
#[derive(Debug, Clone, Copy)]
pub struct CompositeLit<'ast> {
    pub id: ExprId,
    pub ty: Option<Expr<'ast>>,
    pub elts: &'ast [Expr<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy)]
pub struct ParenExpr<'ast> {
    pub id: ExprId,
    pub x: Expr<'ast>,
    pub span: Span,
}

/// `x.sel`
#[derive(Debug, Clone, Copy)]
pub struct SelectorExpr<'ast> {
    pub id: ExprId,
    pub x: Expr<'ast>,
    pub sel: Ident<'ast>,
    pub span: Span,
}

/// `x[index]`
#[derive(Debug, Clone, Copy)]
pub struct IndexExpr<'ast> {
    pub id: ExprId,
    pub x: Expr<'ast>,
    pub index: Expr<'ast>,
    pub span: Span,
}

/// `x[low:high]` or `x[low:high:max]`
#[derive(Debug, Clone, Copy)]
pub struct SliceExpr<'ast> {
    pub id: ExprId,
    pub x: Expr<'ast>,
    pub low: Option<Expr<'ast>>,
    pub high: Option<Expr<'ast>>,
    pub max: Option<Expr<'ast>>,
    /// Whether the three-index form was written.
    pub slice3: bool,
    pub span: Span,
}

/// `fun(args)`, `fun(args...)`, or a conversion `T(x)`.
#[derive(Debug, Clone, Copy)]
pub struct CallExpr<'ast> {
    pub id: ExprId,
    pub fun: Expr<'ast>,
    pub args: &'ast [Expr<'ast>],
    /// Whether the last argument is spread with `...`.
    pub has_ellipsis: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy)]
pub struct StarExpr<'ast> {
    pub id: ExprId,
    pub x: Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy)]
pub struct UnaryExpr<'ast> {
    pub id: ExprId,
    pub op: UnaryOp,
    pub x: Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy)]
pub struct BinaryExpr<'ast> {
    pub id: ExprId,
    pub op: BinaryOp,
    pub left: Expr<'ast>,
    pub right: Expr<'ast>,
    /// Location of the operator token.
    pub op_span: Span,
    pub span: Span,
}

#[derive(Debug, Clone, Copy)]
pub struct KeyValueExpr<'ast> {
    pub id: ExprId,
    pub key: Expr<'ast>,
    pub value: Expr<'ast>,
    pub span: Span,
}

/// `[len]elem`; `len` is `None` for slices and an [`EllipsisExpr`] for `[...]`.
#[derive(Debug, Clone, Copy)]
pub struct ArrayTypeExpr<'ast> {
    pub id: ExprId,
    pub len: Option<Expr<'ast>>,
    pub elem: Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy)]
pub struct MapTypeExpr<'ast> {
    pub id: ExprId,
    pub key: Expr<'ast>,
    pub value: Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy)]
pub struct StructTypeExpr<'ast> {
    pub id: ExprId,
    pub fields: &'ast [Field<'ast>],
    pub span: Span,
}

/// A function signature: `func(params) results`.
#[derive(Debug, Clone, Copy)]
pub struct FuncTypeExpr<'ast> {
    pub id: ExprId,
    pub params: &'ast [Field<'ast>],
    pub results: &'ast [Field<'ast>],
    pub span: Span,
}

impl FuncTypeExpr<'_> {
    /// Whether the last parameter is `...T`.
    pub fn is_variadic(&self) -> bool {
        self.params
            .last()
            .is_some_and(|p| matches!(p.ty, Expr::Ellipsis(_)))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InterfaceTypeExpr<'ast> {
    pub id: ExprId,
    pub elems: &'ast [InterfaceElem<'ast>],
    pub span: Span,
}

/// A method signature or an embedded interface inside `interface { ... }`.
#[derive(Debug, Clone, Copy)]
pub enum InterfaceElem<'ast> {
    Method {
        name: Ident<'ast>,
        ty: &'ast FuncTypeExpr<'ast>,
    },
    Embedded(Expr<'ast>),
}

#[derive(Debug, Clone, Copy)]
pub struct EllipsisExpr<'ast> {
    pub id: ExprId,
    pub elem: Option<Expr<'ast>>,
    pub span: Span,
}

/// A struct field group, parameter group, or receiver.
///
/// In a struct, an empty `names` list marks an embedded field.
#[derive(Debug, Clone, Copy)]
pub struct Field<'ast> {
    pub names: &'ast [Ident<'ast>],
    pub ty: Expr<'ast>,
    /// Raw tag literal, quotes included.
    pub tag: Option<&'ast str>,
    pub span: Span,
}
