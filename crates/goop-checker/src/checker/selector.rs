//! Selector expressions: qualified identifiers, fields, method values and
//! method expressions.

use goop_core::TypeErrorKind;
use goop_parser::ast::{Expr, SelectorExpr};
use goop_parser::expr_string;

use super::Checker;
use crate::objects::ObjectKind;
use crate::operand::{Mode, Operand};
use crate::types::{LookupResult, TypeId, methodset::lookup_field_or_method};

impl<'a, 'ast> Checker<'a, 'ast> {
    pub(crate) fn selector(&mut self, x: &mut Operand<'ast>, e: &'ast SelectorExpr<'ast>) {
        let sel = e.sel.name;

        if let Expr::Ident(ident) = e.x
            && let Some(pkg) = self.lookup(ident.name)
            && let ObjectKind::PkgName { path, .. } = self.objects[pkg].kind.clone()
        {
            self.objects.mark_used(pkg);
            let Some(&scope) = self.imports.get(&path) else {
                x.invalidate();
                return;
            };
            let Some(exp) = self.scopes.lookup_local(scope, sel) else {
                let msg = format!("undefined: {}", expr_string(Expr::Selector(e)));
                self.error(TypeErrorKind::Undeclared, e.sel.span, msg);
                x.invalidate();
                return;
            };
            if !e.sel.is_exported() {
                let msg = format!("name {sel} not exported by package {}", ident.name);
                self.error(TypeErrorKind::Undeclared, e.sel.span, msg);
            }
            let object = &self.objects[exp];
            x.ty = object.ty.unwrap_or(TypeId::INVALID);
            x.mode = match &object.kind {
                ObjectKind::Const { value: Some(value) } => Mode::Constant(value.clone()),
                ObjectKind::TypeName { .. } => Mode::TypeExpr,
                ObjectKind::Var { .. } => Mode::Variable,
                ObjectKind::Func => Mode::Value,
                ObjectKind::Builtin(builtin) => Mode::Builtin(*builtin),
                _ => Mode::Invalid,
            };
            return;
        }

        *x = self.expr_or_type(e.x);
        match x.mode {
            Mode::Invalid => return,
            Mode::Builtin(builtin) => {
                let msg = format!("invalid use of {} in selector expression", builtin.name());
                self.error(TypeErrorKind::InvalidOperation, e.span, msg);
                x.invalidate();
                return;
            }
            _ => {}
        }

        let base = x.expr.map(expr_string).unwrap_or_default();
        let result = lookup_field_or_method(&self.types, x.ty, x.mode == Mode::Variable, sel);
        match result {
            LookupResult::NotFound | LookupResult::Ambiguous | LookupResult::NeedsPointerReceiver
                if !self.types.is_valid(x.ty) =>
            {
                x.invalidate();
            }
            LookupResult::Ambiguous => {
                let msg = format!("ambiguous selector {base}.{sel}");
                self.error(TypeErrorKind::MissingFieldOrMethod, e.sel.span, msg);
                x.invalidate();
            }
            LookupResult::NeedsPointerReceiver => {
                let ty = self.type_str(x.ty);
                let msg = if x.mode == Mode::TypeExpr {
                    format!(
                        "invalid method expression {base}.{sel} (needs pointer receiver (*{ty}).{sel})"
                    )
                } else {
                    format!("cannot call pointer method {sel} on {ty}")
                };
                self.error(TypeErrorKind::MissingFieldOrMethod, e.sel.span, msg);
                x.invalidate();
            }
            LookupResult::NotFound => {
                let why = match self.types.pointer_elem(x.ty) {
                    Some(elem) if self.types.is_interface(elem) => format!(
                        "type {} is pointer to interface, not interface",
                        self.type_str(x.ty)
                    ),
                    _ => format!(
                        "type {} has no field or method {sel}",
                        self.type_str(x.ty)
                    ),
                };
                let msg = format!("{base}.{sel} undefined ({why})");
                self.error(TypeErrorKind::MissingFieldOrMethod, e.sel.span, msg);
                x.invalidate();
            }
            LookupResult::Field { ty, indirect, .. } => {
                if x.mode == Mode::TypeExpr {
                    let msg = format!(
                        "{base}.{sel} undefined (type {} has no method {sel})",
                        self.type_str(x.ty)
                    );
                    self.error(TypeErrorKind::MissingFieldOrMethod, e.sel.span, msg);
                    x.invalidate();
                    return;
                }
                x.mode = if x.mode == Mode::Variable || indirect {
                    Mode::Variable
                } else {
                    Mode::Value
                };
                x.ty = ty;
            }
            LookupResult::Method(method) => {
                if x.mode == Mode::TypeExpr {
                    // The receiver becomes the first parameter.
                    let Some(sig) = self.types.signature_of(method.sig).cloned() else {
                        x.invalidate();
                        return;
                    };
                    let mut params = Vec::with_capacity(sig.params.len() + 1);
                    params.push(x.ty);
                    params.extend(sig.params.iter().copied());
                    x.ty = self.types.signature(params, sig.results.to_vec(), sig.variadic);
                } else {
                    x.ty = method.sig;
                }
                x.mode = Mode::Value;
            }
        }
    }
}
