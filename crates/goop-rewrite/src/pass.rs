//! Bottom-up tree rebuilding.
//!
//! Every expression is visited after its children. The result of visiting a
//! node is remembered by the node's id, so a rule replacing a parent can ask
//! for the already rewritten form of any child. Subtrees in which nothing was
//! replaced are shared with the input tree instead of being copied; the
//! input tree itself is never modified.

use bumpalo::Bump;
use goop_core::{ExprId, ExprIdGen};
use goop_parser::SourceFile;
use goop_parser::ast::*;
use rustc_hash::FxHashMap;

use crate::rule::{RewriteCx, RewriteRule};

/// One run of a [`RewriteRule`] over a tree.
pub struct RewritePass<'r, 'ast, R> {
    arena: &'ast Bump,
    ids: &'r mut ExprIdGen,
    rule: R,
    memo: FxHashMap<ExprId, Expr<'ast>>,
    replaced: usize,
}

impl<'r, 'ast, R: RewriteRule<'ast>> RewritePass<'r, 'ast, R> {
    pub fn new(arena: &'ast Bump, ids: &'r mut ExprIdGen, rule: R) -> Self {
        Self {
            arena,
            ids,
            rule,
            memo: FxHashMap::default(),
            replaced: 0,
        }
    }

    /// Number of expressions the rule replaced so far.
    pub fn replaced(&self) -> usize {
        self.replaced
    }

    pub fn into_rule(self) -> R {
        self.rule
    }

    pub fn file(&mut self, file: &SourceFile<'ast>) -> SourceFile<'ast> {
        let before = self.replaced;
        let decls: Vec<_> = file.decls.iter().map(|&d| self.decl(d)).collect();
        if self.replaced == before {
            return *file;
        }
        SourceFile {
            package: file.package,
            decls: self.arena.alloc_slice_copy(&decls),
            span: file.span,
        }
    }

    // =========================================
    // Declarations
    // =========================================

    fn decl(&mut self, decl: Decl<'ast>) -> Decl<'ast> {
        match decl {
            Decl::Gen(g) => Decl::Gen(self.gen_decl(g)),
            Decl::Func(f) => Decl::Func(self.func_decl(f)),
        }
    }

    fn gen_decl(&mut self, g: &'ast GenDecl<'ast>) -> &'ast GenDecl<'ast> {
        let before = self.replaced;
        let specs: Vec<_> = g.specs.iter().map(|&s| self.spec(s)).collect();
        if self.replaced == before {
            return g;
        }
        self.arena.alloc(GenDecl {
            specs: self.arena.alloc_slice_copy(&specs),
            ..*g
        })
    }

    fn spec(&mut self, spec: Spec<'ast>) -> Spec<'ast> {
        let before = self.replaced;
        match spec {
            Spec::Import(_) => spec,
            Spec::Value(v) => {
                let ty = self.opt_expr(v.ty);
                let values = self.exprs(v.values);
                if self.replaced == before {
                    return spec;
                }
                Spec::Value(self.arena.alloc(ValueSpec { ty, values, ..*v }))
            }
            Spec::Type(t) => {
                let ty = self.expr(t.ty);
                if self.replaced == before {
                    return spec;
                }
                Spec::Type(self.arena.alloc(TypeSpec { ty, ..*t }))
            }
        }
    }

    fn func_decl(&mut self, f: &'ast FuncDecl<'ast>) -> &'ast FuncDecl<'ast> {
        let before = self.replaced;
        let recv = f.recv.map(|r| self.field(r));
        let ty = self.func_type(f.ty);
        let body = f.body.map(|b| self.block(b));
        if self.replaced == before {
            return f;
        }
        self.arena.alloc(FuncDecl { recv, ty, body, ..*f })
    }

    fn field(&mut self, field: &'ast Field<'ast>) -> &'ast Field<'ast> {
        let before = self.replaced;
        let ty = self.expr(field.ty);
        if self.replaced == before {
            return field;
        }
        self.arena.alloc(Field { ty, ..*field })
    }

    fn fields(&mut self, list: &'ast [Field<'ast>]) -> &'ast [Field<'ast>] {
        let before = self.replaced;
        let rebuilt: Vec<_> = list.iter().map(|f| *self.field(f)).collect();
        if self.replaced == before {
            return list;
        }
        self.arena.alloc_slice_copy(&rebuilt)
    }

    fn func_type(&mut self, ft: &'ast FuncTypeExpr<'ast>) -> &'ast FuncTypeExpr<'ast> {
        let before = self.replaced;
        let params = self.fields(ft.params);
        let results = self.fields(ft.results);
        if self.replaced == before {
            return ft;
        }
        self.arena.alloc(FuncTypeExpr { params, results, ..*ft })
    }

    // =========================================
    // Statements
    // =========================================

    fn block(&mut self, b: &'ast BlockStmt<'ast>) -> &'ast BlockStmt<'ast> {
        let before = self.replaced;
        let stmts = self.stmts(b.stmts);
        if self.replaced == before {
            return b;
        }
        self.arena.alloc(BlockStmt { stmts, ..*b })
    }

    fn stmts(&mut self, list: &'ast [Stmt<'ast>]) -> &'ast [Stmt<'ast>] {
        let before = self.replaced;
        let rebuilt: Vec<_> = list.iter().map(|&s| self.stmt(s)).collect();
        if self.replaced == before {
            return list;
        }
        self.arena.alloc_slice_copy(&rebuilt)
    }

    fn opt_stmt(&mut self, s: Option<Stmt<'ast>>) -> Option<Stmt<'ast>> {
        s.map(|s| self.stmt(s))
    }

    fn stmt(&mut self, stmt: Stmt<'ast>) -> Stmt<'ast> {
        let before = self.replaced;
        let a = self.arena;
        let rebuilt = match stmt {
            Stmt::Decl(g) => Stmt::Decl(self.gen_decl(g)),
            Stmt::Expr(s) => {
                let x = self.expr(s.x);
                Stmt::Expr(a.alloc(ExprStmt { x, ..*s }))
            }
            Stmt::IncDec(s) => {
                let x = self.expr(s.x);
                Stmt::IncDec(a.alloc(IncDecStmt { x, ..*s }))
            }
            Stmt::Assign(s) => {
                let lhs = self.exprs(s.lhs);
                let rhs = self.exprs(s.rhs);
                Stmt::Assign(a.alloc(AssignStmt { lhs, rhs, ..*s }))
            }
            Stmt::Call(s) => {
                let call = self.expr(s.call);
                Stmt::Call(a.alloc(CallStmt { call, ..*s }))
            }
            Stmt::Return(s) => {
                let results = self.exprs(s.results);
                Stmt::Return(a.alloc(ReturnStmt { results, ..*s }))
            }
            Stmt::Block(b) => Stmt::Block(self.block(b)),
            Stmt::If(s) => {
                let init = self.opt_stmt(s.init);
                let cond = self.expr(s.cond);
                let then = self.block(s.then);
                let els = self.opt_stmt(s.els);
                Stmt::If(a.alloc(IfStmt {
                    init,
                    cond,
                    then,
                    els,
                    ..*s
                }))
            }
            Stmt::Switch(s) => {
                let init = self.opt_stmt(s.init);
                let tag = self.opt_expr(s.tag);
                let clauses = self.clauses(s.clauses);
                Stmt::Switch(a.alloc(SwitchStmt {
                    init,
                    tag,
                    clauses,
                    ..*s
                }))
            }
            Stmt::For(s) => {
                let init = self.opt_stmt(s.init);
                let cond = self.opt_expr(s.cond);
                let post = self.opt_stmt(s.post);
                let body = self.block(s.body);
                Stmt::For(a.alloc(ForStmt {
                    init,
                    cond,
                    post,
                    body,
                    ..*s
                }))
            }
            Stmt::Range(s) => {
                let key = self.opt_expr(s.key);
                let value = self.opt_expr(s.value);
                let x = self.expr(s.x);
                let body = self.block(s.body);
                Stmt::Range(a.alloc(RangeStmt {
                    key,
                    value,
                    x,
                    body,
                    ..*s
                }))
            }
            Stmt::Branch(_) | Stmt::Empty(_) => return stmt,
        };
        if self.replaced == before {
            return stmt;
        }
        rebuilt
    }

    fn clauses(&mut self, list: &'ast [CaseClause<'ast>]) -> &'ast [CaseClause<'ast>] {
        let before = self.replaced;
        let rebuilt: Vec<_> = list
            .iter()
            .map(|c| CaseClause {
                list: self.exprs(c.list),
                body: self.stmts(c.body),
                span: c.span,
            })
            .collect();
        if self.replaced == before {
            return list;
        }
        self.arena.alloc_slice_copy(&rebuilt)
    }

    // =========================================
    // Expressions
    // =========================================

    fn exprs(&mut self, list: &'ast [Expr<'ast>]) -> &'ast [Expr<'ast>] {
        let before = self.replaced;
        let rebuilt: Vec<_> = list.iter().map(|&e| self.expr(e)).collect();
        if self.replaced == before {
            return list;
        }
        self.arena.alloc_slice_copy(&rebuilt)
    }

    fn opt_expr(&mut self, e: Option<Expr<'ast>>) -> Option<Expr<'ast>> {
        e.map(|e| self.expr(e))
    }

    /// Rebuild `e` from its rebuilt children, then offer it to the rule.
    pub fn expr(&mut self, e: Expr<'ast>) -> Expr<'ast> {
        let rebuilt = self.children(e);
        let mut cx = RewriteCx {
            arena: self.arena,
            ids: &mut *self.ids,
            memo: &self.memo,
        };
        let out = match self.rule.rewrite(e, rebuilt, &mut cx) {
            Some(replacement) => {
                self.replaced += 1;
                replacement
            }
            None => rebuilt,
        };
        self.memo.insert(e.id(), out);
        out
    }

    fn children(&mut self, e: Expr<'ast>) -> Expr<'ast> {
        let before = self.replaced;
        let a = self.arena;
        let rebuilt = match e {
            Expr::Ident(_) | Expr::BasicLit(_) => return e,
            Expr::CompositeLit(c) => {
                let ty = self.opt_expr(c.ty);
                let elts = self.exprs(c.elts);
                Expr::CompositeLit(a.alloc(CompositeLit { ty, elts, ..*c }))
            }
            Expr::Paren(p) => {
                let x = self.expr(p.x);
                Expr::Paren(a.alloc(ParenExpr { x, ..*p }))
            }
            Expr::Selector(s) => {
                let x = self.expr(s.x);
                Expr::Selector(a.alloc(SelectorExpr { x, ..*s }))
            }
            Expr::Index(i) => {
                let x = self.expr(i.x);
                let index = self.expr(i.index);
                Expr::Index(a.alloc(IndexExpr { x, index, ..*i }))
            }
            Expr::Slice(s) => {
                let x = self.expr(s.x);
                let low = self.opt_expr(s.low);
                let high = self.opt_expr(s.high);
                let max = self.opt_expr(s.max);
                Expr::Slice(a.alloc(SliceExpr {
                    x,
                    low,
                    high,
                    max,
                    ..*s
                }))
            }
            Expr::Call(c) => {
                let fun = self.expr(c.fun);
                let args = self.exprs(c.args);
                Expr::Call(a.alloc(CallExpr { fun, args, ..*c }))
            }
            Expr::Star(s) => {
                let x = self.expr(s.x);
                Expr::Star(a.alloc(StarExpr { x, ..*s }))
            }
            Expr::Unary(u) => {
                let x = self.expr(u.x);
                Expr::Unary(a.alloc(UnaryExpr { x, ..*u }))
            }
            Expr::Binary(b) => {
                let left = self.expr(b.left);
                let right = self.expr(b.right);
                Expr::Binary(a.alloc(BinaryExpr { left, right, ..*b }))
            }
            Expr::KeyValue(kv) => {
                let key = self.expr(kv.key);
                let value = self.expr(kv.value);
                Expr::KeyValue(a.alloc(KeyValueExpr { key, value, ..*kv }))
            }
            Expr::ArrayType(at) => {
                let len = self.opt_expr(at.len);
                let elem = self.expr(at.elem);
                Expr::ArrayType(a.alloc(ArrayTypeExpr { len, elem, ..*at }))
            }
            Expr::MapType(mt) => {
                let key = self.expr(mt.key);
                let value = self.expr(mt.value);
                Expr::MapType(a.alloc(MapTypeExpr { key, value, ..*mt }))
            }
            Expr::StructType(st) => {
                let fields = self.fields(st.fields);
                Expr::StructType(a.alloc(StructTypeExpr { fields, ..*st }))
            }
            Expr::FuncType(ft) => Expr::FuncType(self.func_type(ft)),
            Expr::InterfaceType(it) => {
                let elems: Vec<_> = it
                    .elems
                    .iter()
                    .map(|elem| match *elem {
                        InterfaceElem::Method { name, ty } => InterfaceElem::Method {
                            name,
                            ty: self.func_type(ty),
                        },
                        InterfaceElem::Embedded(e) => InterfaceElem::Embedded(self.expr(e)),
                    })
                    .collect();
                if self.replaced == before {
                    return e;
                }
                Expr::InterfaceType(a.alloc(InterfaceTypeExpr {
                    elems: a.alloc_slice_copy(&elems),
                    ..*it
                }))
            }
            Expr::Ellipsis(dots) => {
                let elem = self.opt_expr(dots.elem);
                Expr::Ellipsis(a.alloc(EllipsisExpr { elem, ..*dots }))
            }
        };
        if self.replaced == before {
            return e;
        }
        rebuilt
    }
}

/// Rewrite one file with `rule`, allocating new nodes in `arena` and drawing
/// ids for synthesised nodes from `ids`.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn rewrite_file<'ast, R: RewriteRule<'ast>>(
    arena: &'ast Bump,
    file: &SourceFile<'ast>,
    ids: &mut ExprIdGen,
    rule: R,
) -> SourceFile<'ast> {
    let mut pass = RewritePass::new(arena, ids, rule);
    let rewritten = pass.file(file);
    tracing::debug!(replaced = pass.replaced(), "file rewritten");
    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;
    use goop_parser::{Parser, PrintConfig, print_file};

    /// Renames identifiers `x` to `y`.
    struct Rename;

    impl<'ast> RewriteRule<'ast> for Rename {
        fn rewrite(
            &mut self,
            original: Expr<'ast>,
            _rebuilt: Expr<'ast>,
            cx: &mut RewriteCx<'_, 'ast>,
        ) -> Option<Expr<'ast>> {
            let ident = original.as_ident().filter(|i| i.name == "x")?;
            let id = cx.fresh_id();
            Some(Expr::Ident(cx.arena().alloc(IdentExpr {
                id,
                name: "y",
                span: ident.span,
            })))
        }
    }

    /// Records the order in which expressions are offered.
    #[derive(Default)]
    struct Trace(Vec<String>);

    impl<'ast> RewriteRule<'ast> for Trace {
        fn rewrite(
            &mut self,
            original: Expr<'ast>,
            _rebuilt: Expr<'ast>,
            _cx: &mut RewriteCx<'_, 'ast>,
        ) -> Option<Expr<'ast>> {
            self.0.push(goop_parser::expr_string(original));
            None
        }
    }

    const SOURCE: &str = "package main\n\nvar v = f(x, 1)\n\nfunc f(a, b int) int {\n\tif x > a {\n\t\treturn x + b\n\t}\n\treturn a\n}\n";

    #[test]
    fn replaces_everywhere_without_touching_input() {
        let arena = Bump::new();
        let mut ids = ExprIdGen::new();
        let file = Parser::parse_file(SOURCE, &arena, &mut ids).unwrap();

        let mut pass = RewritePass::new(&arena, &mut ids, Rename);
        let rewritten = pass.file(&file);
        assert_eq!(pass.replaced(), 3);

        let printed = print_file(&rewritten, &PrintConfig::default());
        assert!(printed.contains("var v = f(y, 1)"), "{printed}");
        assert!(printed.contains("if y > a {"), "{printed}");
        assert!(printed.contains("return y + b"), "{printed}");
        assert_eq!(print_file(&file, &PrintConfig::default()), SOURCE);
    }

    #[test]
    fn unchanged_trees_are_shared() {
        let arena = Bump::new();
        let mut ids = ExprIdGen::new();
        let file = Parser::parse_file("package main\n\nfunc f(a int) int {\n\treturn a\n}\n", &arena, &mut ids)
            .unwrap();
        let rewritten = rewrite_file(&arena, &file, &mut ids, Rename);
        assert!(std::ptr::eq(rewritten.decls, file.decls));
    }

    #[test]
    fn children_are_visited_first() {
        let arena = Bump::new();
        let mut ids = ExprIdGen::new();
        let file = Parser::parse_file("package main\n\nvar v = -(a + b)\n", &arena, &mut ids).unwrap();
        let mut pass = RewritePass::new(&arena, &mut ids, Trace::default());
        pass.file(&file);
        let Trace(order) = pass.into_rule();
        assert_eq!(order, ["a", "b", "a + b", "(a + b)", "-(a + b)"]);
    }
}
