//! Rewrite rules and the context they build replacement nodes in.

use bumpalo::Bump;
use goop_checker::OverloadTable;
use goop_core::{ExprId, ExprIdGen, Span};
use goop_parser::ast::{CallExpr, Expr, Ident, SelectorExpr};
use rustc_hash::FxHashMap;

/// Decides which expressions to replace.
///
/// `rewrite` is called once per expression, after all of its children have
/// been rebuilt. `original` is the node from the input tree and `rebuilt` the
/// same node with rebuilt children (the same reference if nothing below it
/// changed). Returning `Some` replaces the node.
pub trait RewriteRule<'ast> {
    fn rewrite(
        &mut self,
        original: Expr<'ast>,
        rebuilt: Expr<'ast>,
        cx: &mut RewriteCx<'_, 'ast>,
    ) -> Option<Expr<'ast>>;
}

/// What a rule may use while building a replacement.
pub struct RewriteCx<'c, 'ast> {
    pub(crate) arena: &'ast Bump,
    pub(crate) ids: &'c mut ExprIdGen,
    pub(crate) memo: &'c FxHashMap<ExprId, Expr<'ast>>,
}

impl<'c, 'ast> RewriteCx<'c, 'ast> {
    pub fn arena(&self) -> &'ast Bump {
        self.arena
    }

    /// A new id for a synthesised node.
    pub fn fresh_id(&mut self) -> ExprId {
        self.ids.fresh()
    }

    /// The rebuilt form of an already visited expression.
    pub fn rebuilt(&self, id: ExprId) -> Option<Expr<'ast>> {
        self.memo.get(&id).copied()
    }

    /// `receiver.method(args...)`, spanning `span`.
    pub fn method_call(
        &mut self,
        receiver: Expr<'ast>,
        method: &str,
        args: &[Expr<'ast>],
        span: Span,
    ) -> Expr<'ast> {
        let name = self.arena.alloc_str(method);
        let fun = Expr::Selector(self.arena.alloc(SelectorExpr {
            id: self.ids.fresh(),
            x: receiver,
            sel: Ident::new(name, span),
            span,
        }));
        Expr::Call(self.arena.alloc(CallExpr {
            id: self.ids.fresh(),
            fun,
            args: self.arena.alloc_slice_copy(args),
            has_ellipsis: false,
            span,
        }))
    }
}

/// Replaces every operator expression with a resolved overload by a call of
/// the overloading method.
#[derive(Debug, Clone, Copy)]
pub struct OverloadRule<'t> {
    table: &'t OverloadTable,
}

impl<'t> OverloadRule<'t> {
    pub fn new(table: &'t OverloadTable) -> Self {
        Self { table }
    }
}

impl<'ast> RewriteRule<'ast> for OverloadRule<'_> {
    fn rewrite(
        &mut self,
        original: Expr<'ast>,
        _rebuilt: Expr<'ast>,
        cx: &mut RewriteCx<'_, 'ast>,
    ) -> Option<Expr<'ast>> {
        let record = self.table.get(original.id())?;
        let receiver = cx.rebuilt(record.receiver)?;
        let args = match record.operand {
            Some(operand) => vec![cx.rebuilt(operand)?],
            None => Vec::new(),
        };
        tracing::trace!(
            expr = ?original.id(),
            method = %record.method.name,
            "operator replaced"
        );
        Some(cx.method_call(receiver, &record.method.name, &args, original.span()))
    }
}
