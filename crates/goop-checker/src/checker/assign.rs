//! Assignments, variable initialization and short variable declarations.

use goop_core::{Span, TypeErrorKind};
use goop_parser::ast::Expr;
use goop_parser::expr_string;

use super::Checker;
use super::conversion::ImplicitError;
use crate::objects::{ObjectId, ObjectKind};
use crate::operand::{Mode, ModeKind, Operand};
use crate::types::{BasicKind, TypeId};

fn measure(n: usize, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

fn is_call(e: Expr<'_>) -> bool {
    matches!(e.unparen(), Expr::Call(_))
}

impl<'a, 'ast> Checker<'a, 'ast> {
    /// Check that `x` can be assigned to a variable of type `t`. With no
    /// type, untyped values take their default type.
    pub(crate) fn assignment(&mut self, x: &mut Operand<'ast>, t: Option<TypeId>, context: &str) {
        self.single_value(x);
        match x.mode.kind() {
            ModeKind::Invalid => return,
            ModeKind::Constant | ModeKind::Variable | ModeKind::MapIndex | ModeKind::Value => {}
            _ => {
                let msg = format!(
                    "cannot assign {} to {} in {context}",
                    self.describe(x),
                    t.map(|t| self.type_str(t)).unwrap_or_else(|| "_".into())
                );
                self.error_at(x, TypeErrorKind::NotAssignable, msg);
                x.invalidate();
                return;
            }
        }

        if self.types.is_untyped(x.ty) {
            let target = match t {
                Some(t) if !self.types.is_interface(t) => t,
                _ => {
                    if t.is_none() && x.is_nil() {
                        self.error_at(
                            x,
                            TypeErrorKind::InvalidOperation,
                            format!("use of untyped nil in {context}"),
                        );
                        x.invalidate();
                        return;
                    }
                    self.types.default_type(x.ty)
                }
            };
            match self.implicit_type_and_value(x, target) {
                Err(err) => {
                    let mut msg = format!(
                        "cannot use {} as {} value in {context}",
                        self.describe(x),
                        self.type_str(target)
                    );
                    match err {
                        ImplicitError::Truncated => msg.push_str(" (truncated)"),
                        ImplicitError::Overflows => msg.push_str(" (overflows)"),
                        ImplicitError::Invalid => {}
                    }
                    let kind = if err == ImplicitError::Invalid {
                        TypeErrorKind::NotAssignable
                    } else {
                        TypeErrorKind::ConstantOverflow
                    };
                    self.error_at(x, kind, msg);
                    x.invalidate();
                    return;
                }
                Ok((ty, value)) => {
                    if let Some(value) = value {
                        self.update_expr_val(x.expr, &value);
                        x.mode = Mode::Constant(value);
                    }
                    if ty != x.ty {
                        x.ty = ty;
                        if let Some(expr) = x.expr {
                            self.update_expr_type(expr, ty, false);
                        }
                    }
                }
            }
        }

        let Some(t) = t else {
            return;
        };
        let (ok, cause) = self.assignable_to(x, t);
        if !ok {
            let mut msg = format!(
                "cannot use {} as {} value in {context}",
                self.describe(x),
                self.type_str(t)
            );
            if let Some(cause) = cause {
                msg.push_str(": ");
                msg.push_str(&cause);
            }
            self.error_at(x, TypeErrorKind::NotAssignable, msg);
            x.invalidate();
        }
    }

    pub(crate) fn init_const(&mut self, lhs: ObjectId, x: &mut Operand<'ast>) {
        let lhs_ty = self.objects[lhs].ty;
        if x.is_invalid()
            || !self.types.is_valid(x.ty)
            || lhs_ty.is_some_and(|t| !self.types.is_valid(t))
        {
            self.objects[lhs].ty.get_or_insert(TypeId::INVALID);
            return;
        }
        if !x.is_constant() {
            let msg = format!("{} is not constant", self.describe(x));
            self.error_at(x, TypeErrorKind::InvalidOperation, msg);
            self.objects[lhs].ty.get_or_insert(TypeId::INVALID);
            return;
        }
        let ty = *self.objects[lhs].ty.get_or_insert(x.ty);
        self.assignment(x, Some(ty), "constant declaration");
        if let Some(value) = x.value().cloned() {
            self.objects[lhs].kind = ObjectKind::Const { value: Some(value) };
        }
    }

    pub(crate) fn init_var(&mut self, lhs: ObjectId, x: &mut Operand<'ast>, context: &str) {
        let lhs_ty = self.objects[lhs].ty;
        if x.is_invalid()
            || !self.types.is_valid(x.ty)
            || lhs_ty.is_some_and(|t| !self.types.is_valid(t))
        {
            self.objects[lhs].ty.get_or_insert(TypeId::INVALID);
            x.invalidate();
            return;
        }
        let ty = match lhs_ty {
            Some(ty) => ty,
            None => {
                let mut ty = x.ty;
                if self.types.is_untyped(ty) {
                    if x.is_nil() {
                        self.error_at(
                            x,
                            TypeErrorKind::InvalidOperation,
                            format!("use of untyped nil in {context}"),
                        );
                        self.objects[lhs].ty = Some(TypeId::INVALID);
                        x.invalidate();
                        return;
                    }
                    ty = self.types.default_type(ty);
                }
                self.objects[lhs].ty = Some(ty);
                ty
            }
        };
        self.assignment(x, Some(ty), context);
    }

    fn set_missing_types(&mut self, lhs: &[ObjectId]) {
        for &v in lhs {
            self.objects[v].ty.get_or_insert(TypeId::INVALID);
        }
    }

    /// Initialize `lhs` from `rhs`; `return_at` marks a return statement.
    pub(crate) fn init_vars(&mut self, lhs: &[ObjectId], rhs: &[Expr<'ast>], return_at: Option<Span>) {
        let context = if return_at.is_some() {
            "return statement"
        } else {
            "assignment"
        };
        let (l, r) = (lhs.len(), rhs.len());
        let single_call = r == 1 && is_call(rhs[0]);

        if l == r && !single_call {
            for (&v, &e) in lhs.iter().zip(rhs) {
                let mut x = self.expr(e);
                self.init_var(v, &mut x, context);
            }
            return;
        }

        if r != 1 {
            if let Some(at) = return_at {
                let xs = self.expr_list(rhs);
                self.return_error(at, lhs, &xs);
            } else {
                if self.use_exprs(rhs) {
                    self.assign_error(rhs, l, r);
                }
                self.set_missing_types(lhs);
            }
            return;
        }

        let mut xs = self.multi_expr(rhs[0], l == 2 && return_at.is_none());
        if xs.len() == l {
            for (&v, x) in lhs.iter().zip(xs.iter_mut()) {
                self.init_var(v, x, context);
            }
            return;
        }
        if xs.first().is_some_and(|x| !x.is_invalid()) {
            match return_at {
                Some(at) => self.return_error(at, lhs, &xs),
                None => self.assign_error(rhs, l, xs.len()),
            }
        }
        self.set_missing_types(lhs);
    }

    fn return_error(&mut self, at: Span, lhs: &[ObjectId], rhs: &[Operand<'ast>]) {
        let (l, r) = (lhs.len(), rhs.len());
        let (qualifier, span) = if r > l {
            ("too many", rhs[l].expr.map(|e| e.span()).unwrap_or(at))
        } else if r > 0 {
            ("not enough", rhs[r - 1].expr.map(|e| e.span()).unwrap_or(at))
        } else {
            ("not enough", at)
        };
        let have: Vec<TypeId> = rhs.iter().map(|x| x.ty).collect();
        let want: Vec<TypeId> = lhs
            .iter()
            .map(|&v| self.objects[v].ty.unwrap_or(TypeId::INVALID))
            .collect();
        let msg = format!(
            "{qualifier} return values\n\thave {}\n\twant {}",
            self.types_summary(&have, false),
            self.types_summary(&want, false)
        );
        self.error(TypeErrorKind::WrongCount, span, msg);
    }

    fn assign_error(&mut self, rhs: &[Expr<'ast>], l: usize, r: usize) {
        let vars = measure(l, "variable");
        let vals = measure(r, "value");
        let rhs0 = rhs[0];
        let msg = match rhs0.unparen() {
            Expr::Call(call) if rhs.len() == 1 => format!(
                "assignment mismatch: {vars} but {} returns {vals}",
                expr_string(call.fun)
            ),
            _ => format!("assignment mismatch: {vars} but {vals}"),
        };
        self.error(TypeErrorKind::WrongCount, rhs0.span(), msg);
    }

    /// `(int, string)`, with untyped numeric kinds spelled `number`.
    pub(crate) fn types_summary(&self, list: &[TypeId], variadic: bool) -> String {
        let parts: Vec<String> = list
            .iter()
            .enumerate()
            .map(|(i, &t)| {
                if !self.types.is_valid(t) {
                    "unknown type".to_string()
                } else if self.types.is_untyped(t) {
                    if self.types.is_numeric(t) {
                        "number".to_string()
                    } else {
                        self.type_str(t).replace("untyped ", "")
                    }
                } else if variadic && i + 1 == list.len() {
                    let elem = self.types.get(self.types.underlying(t));
                    match elem {
                        crate::types::Type::Slice(elem) => format!("...{}", self.type_str(*elem)),
                        _ => self.type_str(t),
                    }
                } else {
                    self.type_str(t)
                }
            })
            .collect();
        format!("({})", parts.join(", "))
    }

    /// Type of an assignment target, or `None` for `_`.
    fn lhs_var(&mut self, lhs: Expr<'ast>) -> Option<TypeId> {
        let ident = lhs.unparen().as_ident();
        if ident.is_some_and(|i| i.name == "_") {
            self.record_type_and_value(lhs.id(), ModeKind::Variable, TypeId::INVALID, None);
            return None;
        }

        // Assigning to a variable does not use it.
        let mut restore = None;
        if let Some(ident) = ident
            && let Some(id) = self.lookup(ident.name)
            && let ObjectKind::Var { used } = self.objects[id].kind
        {
            restore = Some((id, used));
        }
        let x = self.expr(lhs);
        if let Some((id, used)) = restore {
            self.objects[id].kind = ObjectKind::Var { used };
        }

        match x.mode {
            Mode::Invalid => Some(TypeId::INVALID),
            Mode::Variable | Mode::MapIndex => Some(x.ty),
            _ => {
                if let Expr::Selector(sel) = lhs.unparen() {
                    let base = self.expr(sel.x);
                    if base.mode == Mode::MapIndex {
                        let msg = format!("cannot assign to struct field {} in map", expr_string(lhs));
                        self.error_at(&x, TypeErrorKind::NotAssignable, msg);
                        return Some(TypeId::INVALID);
                    }
                }
                let msg = format!(
                    "cannot assign to {} (neither addressable nor a map index expression)",
                    expr_string(lhs)
                );
                self.error_at(&x, TypeErrorKind::NotAssignable, msg);
                Some(TypeId::INVALID)
            }
        }
    }

    /// Assign `x`, or the value of `rhs` when `x` is absent, to `lhs`.
    pub(crate) fn assign_var(
        &mut self,
        lhs: Expr<'ast>,
        rhs: Option<Expr<'ast>>,
        x: Option<&mut Operand<'ast>>,
        context: &str,
    ) {
        let t = self.lhs_var(lhs);
        if t.is_some_and(|t| !self.types.is_valid(t)) {
            match x {
                Some(x) => x.invalidate(),
                None => {
                    if let Some(rhs) = rhs {
                        self.use_exprs(&[rhs]);
                    }
                }
            }
            return;
        }
        let context = if t.is_none() && context == "assignment" {
            "assignment to _ identifier"
        } else {
            context
        };
        match x {
            Some(x) => self.assignment(x, t, context),
            None => {
                if let Some(rhs) = rhs {
                    let mut x = self.expr(rhs);
                    self.assignment(&mut x, t, context);
                }
            }
        }
    }

    pub(crate) fn assign_vars(&mut self, lhs: &[Expr<'ast>], rhs: &[Expr<'ast>]) {
        let (l, r) = (lhs.len(), rhs.len());
        let single_call = r == 1 && is_call(rhs[0]);

        if l == r && !single_call {
            for (&le, &re) in lhs.iter().zip(rhs) {
                self.assign_var(le, Some(re), None, "assignment");
            }
            return;
        }

        if r != 1 {
            let ok_lhs = self.use_lhs(lhs);
            let ok_rhs = self.use_exprs(rhs);
            if ok_lhs && ok_rhs {
                self.assign_error(rhs, l, r);
            }
            return;
        }

        let mut xs = self.multi_expr(rhs[0], l == 2);
        if xs.len() == l {
            for (&le, x) in lhs.iter().zip(xs.iter_mut()) {
                self.assign_var(le, None, Some(x), "assignment");
            }
            return;
        }
        if xs.first().is_some_and(|x| !x.is_invalid()) {
            self.assign_error(rhs, l, xs.len());
        }
        self.use_lhs(lhs);
    }

    /// `a, b := ...`
    pub(crate) fn short_var_decl(&mut self, pos: Span, lhs: &[Expr<'ast>], rhs: &[Expr<'ast>]) {
        let scope = self.env.scope;
        let mut seen: Vec<&str> = Vec::with_capacity(lhs.len());
        let mut lhs_vars: Vec<Option<ObjectId>> = vec![None; lhs.len()];
        let mut new_vars = Vec::new();
        let mut has_err = false;

        for (i, &e) in lhs.iter().enumerate() {
            let Expr::Ident(ident) = e else {
                self.use_lhs(&[e]);
                self.error(
                    TypeErrorKind::Other,
                    e.span(),
                    format!("non-name {} on left side of :=", expr_string(e)),
                );
                has_err = true;
                continue;
            };
            let name = ident.name;
            if name != "_" {
                if seen.contains(&name) {
                    self.error(
                        TypeErrorKind::Redeclared,
                        e.span(),
                        format!("{name} repeated on left side of :="),
                    );
                    has_err = true;
                    continue;
                }
                seen.push(name);
            }

            if let Some(alt) = self.scopes.lookup_local(scope, name) {
                if self.objects[alt].is_var() {
                    lhs_vars[i] = Some(alt);
                } else {
                    self.error(
                        TypeErrorKind::NotAssignable,
                        e.span(),
                        format!("cannot assign to {name}"),
                    );
                    has_err = true;
                }
                continue;
            }

            let v = self.new_var(name, ident.span);
            lhs_vars[i] = Some(v);
            if name != "_" {
                new_vars.push(v);
            }
        }

        let vars: Vec<ObjectId> = lhs_vars
            .into_iter()
            .zip(lhs)
            .map(|(v, e)| v.unwrap_or_else(|| self.new_var("_", e.span())))
            .collect();
        self.init_vars(&vars, rhs, None);

        for (&v, &e) in vars.iter().zip(lhs) {
            if let Some(ty) = self.objects[v].ty {
                self.record_type_and_value(e.id(), ModeKind::Variable, ty, None);
            }
        }

        if new_vars.is_empty() && !has_err {
            self.error(
                TypeErrorKind::Other,
                pos,
                "no new variables on left side of :=",
            );
            return;
        }
        for v in new_vars {
            self.declare(scope, v);
        }
    }

    /// The type of an untyped boolean result of a comparison.
    pub(crate) fn untyped_bool(&self) -> TypeId {
        TypeId::basic(BasicKind::UntypedBool)
    }
}

#[cfg(test)]
mod tests {
    use super::measure;

    #[test]
    fn measure_pluralizes() {
        assert_eq!(measure(1, "value"), "1 value");
        assert_eq!(measure(2, "variable"), "2 variables");
        assert_eq!(measure(0, "value"), "0 values");
    }
}
