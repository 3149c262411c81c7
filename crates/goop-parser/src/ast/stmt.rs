//! Statement nodes.

use goop_core::Span;

use crate::ast::{AssignOp, Expr, GenDecl};

/// A statement.
#[derive(Debug, Clone, Copy)]
pub enum Stmt<'ast> {
    /// `var`, `const` or `type` inside a function body.
    Decl(&'ast GenDecl<'ast>),
    Expr(&'ast ExprStmt<'ast>),
    IncDec(&'ast IncDecStmt<'ast>),
    Assign(&'ast AssignStmt<'ast>),
    /// `go f()` or `defer f()`.
    Call(&'ast CallStmt<'ast>),
    Return(&'ast ReturnStmt<'ast>),
    Branch(&'ast BranchStmt),
    Block(&'ast BlockStmt<'ast>),
    If(&'ast IfStmt<'ast>),
    Switch(&'ast SwitchStmt<'ast>),
    For(&'ast ForStmt<'ast>),
    Range(&'ast RangeStmt<'ast>),
    Empty(Span),
}

impl Stmt<'_> {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Decl(s) => s.span,
            Stmt::Expr(s) => s.span,
            Stmt::IncDec(s) => s.span,
            Stmt::Assign(s) => s.span,
            Stmt::Call(s) => s.span,
            Stmt::Return(s) => s.span,
            Stmt::Branch(s) => s.span,
            Stmt::Block(s) => s.span,
            Stmt::If(s) => s.span,
            Stmt::Switch(s) => s.span,
            Stmt::For(s) => s.span,
            Stmt::Range(s) => s.span,
            Stmt::Empty(span) => *span,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExprStmt<'ast> {
    pub x: Expr<'ast>,
    pub span: Span,
}

/// `x++` or `x--`
#[derive(Debug, Clone, Copy)]
pub struct IncDecStmt<'ast> {
    pub x: Expr<'ast>,
    pub inc: bool,
    pub span: Span,
}

/// `lhs op rhs` for `=`, `:=` and compound operators.
#[derive(Debug, Clone, Copy)]
pub struct AssignStmt<'ast> {
    pub lhs: &'ast [Expr<'ast>],
    pub op: AssignOp,
    pub rhs: &'ast [Expr<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKeyword {
    Go,
    Defer,
}

#[derive(Debug, Clone, Copy)]
pub struct CallStmt<'ast> {
    pub keyword: CallKeyword,
    pub call: Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy)]
pub struct ReturnStmt<'ast> {
    pub results: &'ast [Expr<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    Break,
    Continue,
    Fallthrough,
}

impl BranchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BranchKind::Break => "break",
            BranchKind::Continue => "continue",
            BranchKind::Fallthrough => "fallthrough",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BranchStmt {
    pub kind: BranchKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy)]
pub struct BlockStmt<'ast> {
    pub stmts: &'ast [Stmt<'ast>],
    pub span: Span,
    /// Location of the closing brace.
    pub rbrace: Span,
}

#[derive(Debug, Clone, Copy)]
pub struct IfStmt<'ast> {
    pub init: Option<Stmt<'ast>>,
    pub cond: Expr<'ast>,
    pub then: &'ast BlockStmt<'ast>,
    /// An `IfStmt` or a `BlockStmt`.
    pub els: Option<Stmt<'ast>>,
    pub span: Span,
}

/// `case list:` or `default:` with its statements.
#[derive(Debug, Clone, Copy)]
pub struct CaseClause<'ast> {
    /// Empty for `default`.
    pub list: &'ast [Expr<'ast>],
    pub body: &'ast [Stmt<'ast>],
    pub span: Span,
}

impl CaseClause<'_> {
    pub fn is_default(&self) -> bool {
        self.list.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SwitchStmt<'ast> {
    pub init: Option<Stmt<'ast>>,
    pub tag: Option<Expr<'ast>>,
    pub clauses: &'ast [CaseClause<'ast>],
    pub span: Span,
}

/// `for init; cond; post { }`, `for cond { }`, or `for { }`.
#[derive(Debug, Clone, Copy)]
pub struct ForStmt<'ast> {
    pub init: Option<Stmt<'ast>>,
    pub cond: Option<Expr<'ast>>,
    pub post: Option<Stmt<'ast>>,
    pub body: &'ast BlockStmt<'ast>,
    pub span: Span,
}

/// `for key, value := range x { }`
#[derive(Debug, Clone, Copy)]
pub struct RangeStmt<'ast> {
    pub key: Option<Expr<'ast>>,
    pub value: Option<Expr<'ast>>,
    /// `:=` rather than `=`.
    pub define: bool,
    pub x: Expr<'ast>,
    pub body: &'ast BlockStmt<'ast>,
    pub span: Span,
}
