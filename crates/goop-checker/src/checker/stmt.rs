//! Statements and function bodies.

use bitflags::bitflags;
use goop_core::{Span, TypeErrorKind};
use goop_parser::ast::{
    AssignOp, BranchKind, CallKeyword, CaseClause, DeclKeyword, Expr, GenDecl, RangeStmt,
    Spec, Stmt, SwitchStmt, ValueSpec,
};
use goop_parser::expr_string;
use rustc_hash::FxHashMap;

use super::{Checker, Environment, ExprKind, PendingBody};
use crate::constant::ConstValue;
use crate::objects::{Color, Object, ObjectId, ObjectKind, ScopeKind};
use crate::operand::{Mode, Operand};
use crate::types::{BasicKind, Type, TypeId};

bitflags! {
    /// Where a statement appears.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub(crate) struct StmtFlags: u8 {
        const BREAK_OK = 1 << 0;
        const CONTINUE_OK = 1 << 1;
        const FALLTHROUGH_OK = 1 << 2;
        const FINAL_SWITCH_CASE = 1 << 3;
    }
}

/// Trailing empty statements do not count for fallthrough and termination.
fn trim_trailing_empty<'ast>(list: &'ast [Stmt<'ast>]) -> &'ast [Stmt<'ast>] {
    let end = list
        .iter()
        .rposition(|s| !matches!(s, Stmt::Empty(_)))
        .map_or(0, |i| i + 1);
    &list[..end]
}

/// Whether `s` contains an unlabeled `break` that leaves the enclosing
/// statement. Breaks inside nested loops and switches belong to those.
fn has_break(s: &Stmt<'_>) -> bool {
    match s {
        Stmt::Branch(b) => b.kind == BranchKind::Break,
        Stmt::Block(b) => has_break_list(b.stmts),
        Stmt::If(s) => has_break_list(s.then.stmts) || s.els.as_ref().is_some_and(has_break),
        _ => false,
    }
}

fn has_break_list(list: &[Stmt<'_>]) -> bool {
    list.iter().any(has_break)
}

impl<'a, 'ast> Checker<'a, 'ast> {
    /// Check the body of a function or method.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn func_body(&mut self, body: PendingBody<'ast>) {
        let Some(block) = body.decl.body else {
            return;
        };
        tracing::trace!(func = body.decl.name.name, "checking function body");

        let scope = self.scopes.new_scope(Some(self.file_scopes[body.file.0 as usize]), ScopeKind::Function);
        let saved = std::mem::replace(
            &mut self.env,
            Environment {
                file: body.file,
                scope,
                iota: None,
                sig: Some(body.sig),
                result_vars: Vec::new(),
                has_call_or_recv: false,
                err_pos: None,
            },
        );
        let saved_vars = std::mem::take(&mut self.func_vars);

        for param in body.recv.iter().chain(&body.params) {
            if let Some(name) = param.name {
                let id = self.objects.alloc(
                    Object::new(name.name, ObjectKind::Var { used: true }, body.file, name.span)
                        .with_type(param.ty),
                );
                self.declare(scope, id);
            }
        }
        for (i, result) in body.results.iter().enumerate() {
            let (name, pos) = match result.name {
                Some(name) => (name.name, name.span),
                None => ("", body.decl.ty.results.get(i).map_or(body.decl.span, |f| f.span)),
            };
            let id = self.objects.alloc(
                Object::new(name, ObjectKind::Var { used: true }, body.file, pos).with_type(result.ty),
            );
            self.declare(scope, id);
            self.env.result_vars.push(id);
        }

        self.stmt_list(StmtFlags::empty(), block.stmts);

        if !body.results.is_empty() && !self.is_terminating_list(block.stmts) {
            self.error(TypeErrorKind::MissingReturn, block.rbrace, "missing return");
        }
        self.usage();

        self.func_vars = saved_vars;
        self.env = saved;
    }

    /// Report local variables that are never used, in source order.
    fn usage(&mut self) {
        if !self.config.report_unused {
            return;
        }
        let mut unused: Vec<ObjectId> = self
            .func_vars
            .iter()
            .copied()
            .filter(|&v| !self.objects.is_used(v))
            .collect();
        unused.sort_by_key(|&v| (self.objects[v].pos.line, self.objects[v].pos.col));
        for v in unused {
            let object = &self.objects[v];
            let (pos, msg) = (object.pos, format!("declared and not used: {}", object.name));
            self.error(TypeErrorKind::UnusedVariable, pos, msg);
        }
    }

    fn stmt_list(&mut self, ctxt: StmtFlags, list: &'ast [Stmt<'ast>]) {
        let fallthrough_ok = ctxt.contains(StmtFlags::FALLTHROUGH_OK);
        let inner = ctxt - StmtFlags::FALLTHROUGH_OK;
        let list = trim_trailing_empty(list);
        for (i, s) in list.iter().enumerate() {
            let mut inner = inner;
            if fallthrough_ok && i + 1 == list.len() {
                inner |= StmtFlags::FALLTHROUGH_OK;
            }
            self.stmt(inner, *s);
        }
    }

    fn simple_stmt(&mut self, s: Option<Stmt<'ast>>) {
        if let Some(s) = s {
            self.stmt(StmtFlags::empty(), s);
        }
    }

    fn stmt(&mut self, ctxt: StmtFlags, s: Stmt<'ast>) {
        let inner = ctxt - (StmtFlags::FALLTHROUGH_OK | StmtFlags::FINAL_SWITCH_CASE);

        match s {
            Stmt::Empty(_) => {}
            Stmt::Decl(decl) => self.decl_stmt(decl),

            Stmt::Expr(es) => {
                let (x, kind) = self.raw_expr(es.x, None);
                let msg = match x.mode {
                    Mode::Invalid => return,
                    Mode::Builtin(_) => "must be called",
                    Mode::TypeExpr => "is not an expression",
                    _ if kind == ExprKind::Statement => return,
                    _ => "is not used",
                };
                let msg = format!("{} {msg}", self.describe(&x));
                self.error_at(&x, TypeErrorKind::UnusedResult, msg);
            }

            Stmt::IncDec(s) => {
                let x = self.expr(s.x);
                if x.is_invalid() {
                    return;
                }
                if !self.types.is_numeric(x.ty) {
                    let op = if s.inc { "++" } else { "--" };
                    let msg = format!(
                        "invalid operation: {}{op} (non-numeric type {})",
                        expr_string(s.x),
                        self.type_str(x.ty)
                    );
                    self.error(TypeErrorKind::InvalidOperation, s.x.span(), msg);
                    return;
                }
                let mut x = x;
                self.assign_var(s.x, None, Some(&mut x), "assignment");
            }

            Stmt::Assign(s) => match s.op {
                AssignOp::Assign => self.assign_vars(s.lhs, s.rhs),
                AssignOp::Define => self.short_var_decl(s.span, s.lhs, s.rhs),
                AssignOp::Compound(op) => {
                    let ([lhs], [rhs]) = (s.lhs, s.rhs) else {
                        let msg = format!("assignment operation {} requires single-valued expressions", s.op);
                        self.error(TypeErrorKind::WrongCount, s.span, msg);
                        return;
                    };
                    let mut x = Operand::invalid();
                    self.binary(&mut x, None, *lhs, *rhs, op);
                    self.assign_var(*lhs, None, Some(&mut x), "assignment operation");
                }
            },

            Stmt::Call(cs) => {
                let keyword = match cs.keyword {
                    CallKeyword::Go => "go",
                    CallKeyword::Defer => "defer",
                };
                if !matches!(cs.call.unparen(), Expr::Call(_)) {
                    let msg = format!("expression in {keyword} must be function call");
                    self.error(TypeErrorKind::InvalidOperation, cs.call.span(), msg);
                    self.use_exprs(&[cs.call]);
                    return;
                }
                let (x, kind) = self.raw_expr(cs.call, None);
                let msg = match kind {
                    ExprKind::Statement => return,
                    ExprKind::Conversion => "requires function call, not conversion",
                    ExprKind::Expression => "discards result of",
                };
                let msg = format!("{keyword} {msg} {}", self.describe(&x));
                self.error_at(&x, TypeErrorKind::UnusedResult, msg);
            }

            Stmt::Return(rs) => {
                let results = self.env.result_vars.clone();
                if rs.results.is_empty() && !results.is_empty() && !self.objects[results[0]].name.is_empty() {
                    // Bare return with named results.
                    for &r in &results {
                        let name = self.objects[r].name.clone();
                        if let Some(alt) = self.lookup(&name)
                            && alt != r
                        {
                            let msg = format!("result parameter {name} not in scope at return");
                            self.error(TypeErrorKind::Other, rs.span, msg);
                        }
                    }
                } else if !rs.results.is_empty() || !results.is_empty() {
                    self.init_vars(&results, rs.results, Some(rs.span));
                }
            }

            Stmt::Branch(b) => {
                let msg = match b.kind {
                    BranchKind::Break if !ctxt.contains(StmtFlags::BREAK_OK) => {
                        "break is not in a loop, switch, or select"
                    }
                    BranchKind::Continue if !ctxt.contains(StmtFlags::CONTINUE_OK) => {
                        "continue is not in a loop"
                    }
                    BranchKind::Fallthrough if !ctxt.contains(StmtFlags::FALLTHROUGH_OK) => {
                        if ctxt.contains(StmtFlags::FINAL_SWITCH_CASE) {
                            "cannot fallthrough final case in switch"
                        } else {
                            "fallthrough statement out of place"
                        }
                    }
                    _ => return,
                };
                self.error(TypeErrorKind::MisplacedBranch, b.span, msg);
            }

            Stmt::Block(b) => {
                self.open_scope();
                self.stmt_list(inner, b.stmts);
                self.close_scope();
            }

            Stmt::If(s) => {
                self.open_scope();
                self.simple_stmt(s.init);
                let x = self.expr(s.cond);
                if !x.is_invalid() && !self.types.is_boolean(x.ty) {
                    self.error(
                        TypeErrorKind::MismatchedTypes,
                        s.cond.span(),
                        "non-boolean condition in if statement",
                    );
                }
                self.stmt(inner, Stmt::Block(s.then));
                if let Some(els) = s.els {
                    self.stmt(inner, els);
                }
                self.close_scope();
            }

            Stmt::Switch(s) => self.switch_stmt(inner | StmtFlags::BREAK_OK, s),

            Stmt::For(s) => {
                let inner = inner | StmtFlags::BREAK_OK | StmtFlags::CONTINUE_OK;
                self.open_scope();
                self.simple_stmt(s.init);
                if let Some(cond) = s.cond {
                    let x = self.expr(cond);
                    if !x.is_invalid() && !self.types.is_boolean(x.ty) {
                        self.error(
                            TypeErrorKind::MismatchedTypes,
                            cond.span(),
                            "non-boolean condition in for statement",
                        );
                    }
                }
                self.simple_stmt(s.post);
                self.stmt(inner, Stmt::Block(s.body));
                self.close_scope();
            }

            Stmt::Range(s) => {
                self.range_stmt(inner | StmtFlags::BREAK_OK | StmtFlags::CONTINUE_OK, s);
            }
        }
    }

    fn switch_stmt(&mut self, inner: StmtFlags, s: &'ast SwitchStmt<'ast>) {
        self.open_scope();
        self.simple_stmt(s.init);

        let mut x = match s.tag {
            Some(tag) => {
                let mut x = self.expr(tag);
                self.assignment(&mut x, None, "switch expression");
                if !x.is_invalid() && !self.types.comparable(x.ty) && !self.types.has_nil(x.ty) {
                    let msg = format!(
                        "cannot switch on {} ({} is not comparable)",
                        self.describe(&x),
                        self.type_str(x.ty)
                    );
                    self.error_at(&x, TypeErrorKind::InvalidOperation, msg);
                    x.invalidate();
                }
                x
            }
            // A missing tag is the constant `true`.
            None => Operand::new(
                Mode::Constant(ConstValue::Bool(true)),
                None,
                TypeId::basic(BasicKind::Bool),
            ),
        };

        self.multiple_defaults(s.clauses);

        let mut seen: FxHashMap<ConstValue, Vec<TypeId>> = FxHashMap::default();
        for (i, clause) in s.clauses.iter().enumerate() {
            let inner = if i + 1 < s.clauses.len() {
                inner | StmtFlags::FALLTHROUGH_OK
            } else {
                inner | StmtFlags::FINAL_SWITCH_CASE
            };
            self.case_values(&mut x, clause.list, &mut seen);
            self.open_scope();
            self.stmt_list(inner, clause.body);
            self.close_scope();
        }
        self.close_scope();
    }

    fn multiple_defaults(&mut self, clauses: &[CaseClause<'_>]) {
        let mut first: Option<Span> = None;
        for clause in clauses.iter().filter(|c| c.is_default()) {
            match first {
                Some(at) => {
                    let msg = format!("multiple defaults (first at {}:{})", at.line, at.col);
                    self.error(TypeErrorKind::Redeclared, clause.span, msg);
                }
                None => first = Some(clause.span),
            }
        }
    }

    fn case_values(
        &mut self,
        x: &mut Operand<'ast>,
        values: &'ast [Expr<'ast>],
        seen: &mut FxHashMap<ConstValue, Vec<TypeId>>,
    ) {
        for &e in values {
            let mut v = self.expr(e);
            if x.is_invalid() || v.is_invalid() {
                continue;
            }
            self.convert_untyped(&mut v, x.ty);
            if v.is_invalid() {
                continue;
            }
            let mut res = v.clone();
            let mut tag = x.clone();
            self.comparison(&mut res, &mut tag, goop_parser::ast::BinaryOp::Eql, true);
            if res.is_invalid() {
                continue;
            }
            let Some(value) = v.value().cloned() else {
                continue;
            };
            let types = seen.entry(value).or_default();
            if types.iter().any(|&t| self.types.identical_ignore_tags(t, v.ty)) {
                let msg = format!("duplicate case {} in expression switch", self.describe(&v));
                self.error_at(&v, TypeErrorKind::Redeclared, msg);
                continue;
            }
            types.push(v.ty);
        }
    }

    fn range_stmt(&mut self, inner: StmtFlags, s: &'ast RangeStmt<'ast>) {
        let mut x = self.expr(s.x);

        let (mut key, mut val) = (None, None);
        if !x.is_invalid() {
            match self.range_key_val(x.ty) {
                None => {
                    let msg = format!("cannot range over {}", self.describe(&x));
                    self.error_at(&x, TypeErrorKind::InvalidOperation, msg);
                }
                Some((k, v)) => {
                    if let Some(value) = s.value
                        && v.is_none()
                    {
                        let msg = format!(
                            "range over {} permits only one iteration variable",
                            self.describe(&x)
                        );
                        self.error(TypeErrorKind::WrongCount, value.span(), msg);
                    }
                    key = Some(k);
                    val = v;
                }
            }
        }

        self.open_scope();
        let lhs = [s.key, s.value];
        let rhs = [key, val];
        let over_int = self.types.is_integer(x.ty);

        if s.define {
            let mut vars = Vec::new();
            for (lhs, typ) in lhs.into_iter().zip(rhs) {
                let Some(lhs) = lhs else {
                    continue;
                };
                let obj = match lhs {
                    Expr::Ident(ident) => {
                        let obj = self.new_var(ident.name, ident.span);
                        if ident.name != "_" {
                            vars.push(obj);
                        }
                        obj
                    }
                    other => {
                        let msg = format!("cannot declare {}", expr_string(other));
                        self.error(TypeErrorKind::Other, other.span(), msg);
                        self.new_var("_", other.span())
                    }
                };
                match typ {
                    Some(typ) if self.types.is_valid(typ) => {
                        if over_int {
                            self.init_var(obj, &mut x, "range clause");
                        } else {
                            let mut y = Operand::new(Mode::Value, Some(lhs), typ);
                            self.init_var(obj, &mut y, "assignment");
                        }
                    }
                    _ => {
                        self.objects[obj].ty = Some(TypeId::INVALID);
                        self.objects.mark_used(obj);
                    }
                }
                if let Some(ty) = self.objects[obj].ty {
                    self.record_type_and_value(lhs.id(), crate::operand::ModeKind::Variable, ty, None);
                }
            }
            if vars.is_empty() {
                self.error(
                    TypeErrorKind::Other,
                    s.span,
                    "no new variables on left side of :=",
                );
            }
            let scope = self.env.scope;
            for v in vars {
                self.declare(scope, v);
            }
        } else if s.key.is_some() {
            for (lhs, typ) in lhs.into_iter().zip(rhs) {
                let (Some(lhs), Some(typ)) = (lhs, typ) else {
                    continue;
                };
                if !self.types.is_valid(typ) {
                    continue;
                }
                if over_int {
                    self.assign_var(lhs, None, Some(&mut x), "range clause");
                    if !x.is_invalid() && !self.types.is_integer(x.ty) {
                        let msg = format!("cannot use iteration variable of type {}", self.type_str(x.ty));
                        self.error(TypeErrorKind::MismatchedTypes, lhs.span(), msg);
                    }
                } else {
                    let mut y = Operand::new(Mode::Value, Some(lhs), typ);
                    self.assign_var(lhs, None, Some(&mut y), "assignment");
                }
            }
        } else if over_int {
            self.assignment(&mut x, None, "range clause");
        }

        self.stmt(inner, Stmt::Block(s.body));
        self.close_scope();
    }

    /// Key and value types of ranging over `ty`.
    fn range_key_val(&self, ty: TypeId) -> Option<(TypeId, Option<TypeId>)> {
        let int = TypeId::basic(BasicKind::Int);
        let mut under = self.types.underlying(ty);
        if let Some(elem) = self.types.pointer_elem(under)
            && matches!(self.types.get(self.types.underlying(elem)), Type::Array { .. })
        {
            under = self.types.underlying(elem);
        }
        match self.types.get(under) {
            Type::Basic(_) if self.types.is_string(under) => Some((int, Some(TypeId::basic(BasicKind::Int32)))),
            Type::Basic(_) if self.types.is_integer(under) => Some((ty, None)),
            Type::Array { elem, .. } | Type::Slice(elem) => Some((int, Some(*elem))),
            Type::Map { key, value } => Some((*key, Some(*value))),
            _ => None,
        }
    }

    // =========================================
    // Local declarations
    // =========================================

    fn decl_stmt(&mut self, decl: &'ast GenDecl<'ast>) {
        match decl.keyword {
            DeclKeyword::Import => {}
            DeclKeyword::Const => {
                let mut last: Option<&'ast ValueSpec<'ast>> = None;
                for spec in decl.specs {
                    let Spec::Value(s) = spec else {
                        continue;
                    };
                    let inherited = s.ty.is_none() && s.values.is_empty() && last.is_some();
                    if !inherited {
                        last = Some(s);
                    }
                    let source = last.unwrap_or(s);

                    let mut lhs = Vec::with_capacity(s.names.len());
                    for (i, name) in s.names.iter().enumerate() {
                        let obj = self.objects.alloc(Object::new(
                            name.name,
                            ObjectKind::Const { value: None },
                            self.env.file,
                            name.span,
                        ));
                        let init = source.values.get(i).copied();
                        self.const_decl(obj, source.ty, init, s.iota, inherited);
                        lhs.push(obj);
                    }
                    self.arity(s, source.values, true, inherited);
                    let scope = self.env.scope;
                    for obj in lhs {
                        self.declare(scope, obj);
                    }
                }
            }
            DeclKeyword::Var => {
                for spec in decl.specs {
                    let Spec::Value(s) = spec else {
                        continue;
                    };
                    let lhs: Vec<ObjectId> = s.names.iter().map(|n| self.new_var(n.name, n.span)).collect();
                    for (i, &obj) in lhs.iter().enumerate() {
                        let (shared, init) = match s.values.len() {
                            n if n == s.names.len() => (None, Some(s.values[i])),
                            1 => (Some(lhs.clone()), Some(s.values[0])),
                            _ => (None, s.values.get(i).copied()),
                        };
                        self.var_decl(obj, shared.as_deref(), s.ty, init);
                        if s.values.len() == 1 {
                            break;
                        }
                    }
                    if s.ty.is_none() || !s.values.is_empty() {
                        self.arity(s, s.values, false, false);
                    }
                    let scope = self.env.scope;
                    for obj in lhs {
                        self.declare(scope, obj);
                    }
                }
            }
            DeclKeyword::Type => {
                for spec in decl.specs {
                    let Spec::Type(s) = spec else {
                        continue;
                    };
                    let obj = self.objects.alloc(Object::new(
                        s.name.name,
                        ObjectKind::TypeName { alias: s.alias },
                        self.env.file,
                        s.name.span,
                    ));
                    let scope = self.env.scope;
                    self.declare(scope, obj);
                    self.objects[obj].color = Color::Grey;
                    self.type_decl(obj, s);
                    self.objects[obj].color = Color::Black;
                }
            }
        }
    }

    /// Report a mismatch between the names and values of a spec.
    pub(crate) fn arity(&mut self, s: &ValueSpec<'_>, values: &[Expr<'_>], is_const: bool, inherited: bool) {
        let (l, r) = (s.names.len(), values.len());
        if l < r {
            let extra = values[l].span();
            if inherited {
                let msg = format!("extra init expr at {}:{}", extra.line, extra.col);
                self.error(TypeErrorKind::WrongCount, s.span, msg);
            } else {
                self.error(TypeErrorKind::WrongCount, extra, "extra init expr");
            }
        } else if l > r && (is_const || r != 1) {
            let name = s.names[r];
            let msg = format!("missing init expr for {}", name.name);
            self.error(TypeErrorKind::WrongCount, name.span, msg);
        }
    }

    // =========================================
    // Termination
    // =========================================

    fn is_terminating(&self, s: &Stmt<'ast>) -> bool {
        match s {
            Stmt::Expr(es) => matches!(es.x.unparen(), Expr::Call(call) if self.is_panic.contains(&call.id)),
            Stmt::Return(_) => true,
            Stmt::Branch(b) => b.kind == BranchKind::Fallthrough,
            Stmt::Block(b) => self.is_terminating_list(b.stmts),
            Stmt::If(s) => {
                s.els.is_some_and(|els| self.is_terminating_list(s.then.stmts) && self.is_terminating(&els))
            }
            Stmt::Switch(s) => self.is_terminating_switch(s.clauses),
            Stmt::For(s) => s.cond.is_none() && !has_break_list(s.body.stmts),
            _ => false,
        }
    }

    fn is_terminating_list(&self, list: &'ast [Stmt<'ast>]) -> bool {
        trim_trailing_empty(list)
            .last()
            .is_some_and(|s| self.is_terminating(s))
    }

    fn is_terminating_switch(&self, clauses: &'ast [CaseClause<'ast>]) -> bool {
        let mut has_default = false;
        for clause in clauses {
            has_default |= clause.is_default();
            if !self.is_terminating_list(clause.body) || has_break_list(clause.body) {
                return false;
            }
        }
        has_default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_flags_compose() {
        let ctxt = StmtFlags::BREAK_OK | StmtFlags::FALLTHROUGH_OK;
        let inner = ctxt - (StmtFlags::FALLTHROUGH_OK | StmtFlags::FINAL_SWITCH_CASE);
        assert!(inner.contains(StmtFlags::BREAK_OK));
        assert!(!inner.contains(StmtFlags::FALLTHROUGH_OK));
    }

    #[test]
    fn trailing_empty_statements_are_trimmed() {
        let span = Span::default();
        let list = [Stmt::Empty(span), Stmt::Empty(span)];
        assert!(trim_trailing_empty(&list).is_empty());
    }
}
