//! Calls, conversions and built-in functions.

use goop_core::TypeErrorKind;
use goop_parser::ast::{CallExpr, Expr};
use goop_parser::expr_string;

use super::{Checker, ExprKind};
use crate::constant::ConstValue;
use crate::objects::Builtin;
use crate::operand::{Mode, Operand};
use crate::types::{BasicKind, Signature, Type, TypeId};

/// Argument count and statement-ness of each built-in.
fn builtin_arity(builtin: Builtin) -> (usize, bool, ExprKind) {
    match builtin {
        Builtin::Append => (1, true, ExprKind::Expression),
        Builtin::Cap | Builtin::Len | Builtin::New => (1, false, ExprKind::Expression),
        Builtin::Copy | Builtin::Delete => (2, false, ExprKind::Statement),
        Builtin::Make => (1, true, ExprKind::Expression),
        Builtin::Panic => (1, false, ExprKind::Statement),
        Builtin::Print | Builtin::Println => (0, true, ExprKind::Statement),
    }
}

impl<'a, 'ast> Checker<'a, 'ast> {
    pub(crate) fn call_expr(&mut self, x: &mut Operand<'ast>, call: &'ast CallExpr<'ast>) -> ExprKind {
        *x = self.expr_or_type(call.fun);
        match x.mode {
            Mode::Invalid => {
                self.use_exprs(call.args);
                return ExprKind::Statement;
            }
            Mode::TypeExpr => {
                let t = x.ty;
                x.invalidate();
                match call.args {
                    [] => {
                        let msg = format!("missing argument in conversion to {}", self.type_str(t));
                        self.error(TypeErrorKind::WrongCount, call.span, msg);
                    }
                    [arg] => {
                        *x = self.expr(*arg);
                        if !x.is_invalid() {
                            if call.has_ellipsis {
                                let msg = format!("invalid use of ... in conversion to {}", self.type_str(t));
                                self.error(TypeErrorKind::InvalidConversion, arg.span(), msg);
                                x.invalidate();
                            } else {
                                self.conversion(x, t);
                            }
                        }
                    }
                    [.., last] => {
                        self.use_exprs(call.args);
                        let msg = format!("too many arguments in conversion to {}", self.type_str(t));
                        self.error(TypeErrorKind::WrongCount, last.span(), msg);
                    }
                }
                return ExprKind::Conversion;
            }
            Mode::Builtin(builtin) => {
                if !self.builtin(x, call, builtin) {
                    x.invalidate();
                }
                if !x.is_invalid() && !x.is_constant() {
                    self.env.has_call_or_recv = true;
                }
                return builtin_arity(builtin).2;
            }
            _ => {}
        }

        let Some(sig) = self.types.signature_of(x.ty).cloned() else {
            let msg = format!("invalid operation: cannot call non-function {}", self.describe(x));
            self.error_at(x, TypeErrorKind::InvalidOperation, msg);
            self.use_exprs(call.args);
            x.invalidate();
            return ExprKind::Statement;
        };

        let mut args = self.expr_list(call.args);
        self.arguments(call, &sig, &mut args);

        match sig.results.len() {
            0 => {
                x.mode = Mode::NoValue;
                x.ty = TypeId::INVALID;
            }
            1 => {
                x.mode = Mode::Value;
                x.ty = sig.results[0];
            }
            _ => {
                x.mode = Mode::Value;
                x.ty = self.types.tuple(sig.results.to_vec());
            }
        }
        self.env.has_call_or_recv = true;
        ExprKind::Statement
    }

    /// Check call arguments against a signature.
    fn arguments(&mut self, call: &'ast CallExpr<'ast>, sig: &Signature, args: &mut [Operand<'ast>]) {
        for a in args.iter() {
            if a.is_invalid() {
                return;
            }
        }

        let nargs = args.len();
        let mut npars = sig.params.len();
        let mut params: Vec<TypeId> = sig.params.to_vec();
        let fun = expr_string(call.fun);

        if sig.variadic {
            if call.has_ellipsis {
                if call.args.len() == 1 && nargs > 1 {
                    let msg = format!(
                        "cannot use ... with {nargs}-valued {}",
                        expr_string(call.args[0])
                    );
                    self.error(TypeErrorKind::WrongCount, call.span, msg);
                    return;
                }
            } else if nargs + 1 >= npars {
                let last = params.pop().unwrap_or(TypeId::INVALID);
                let elem = match self.types.get(self.types.underlying(last)) {
                    Type::Slice(elem) => *elem,
                    _ => TypeId::INVALID,
                };
                params.resize(nargs, elem);
                npars = nargs;
            } else {
                npars -= 1;
            }
        } else if call.has_ellipsis {
            let msg = format!("cannot use ... in call to non-variadic {fun}");
            self.error(TypeErrorKind::WrongCount, call.span, msg);
            return;
        }

        if nargs != npars {
            let (qualifier, span) = if nargs > npars {
                ("too many", args[npars].expr.map(|e| e.span()).unwrap_or(call.span))
            } else if nargs > 0 {
                ("not enough", args[nargs - 1].expr.map(|e| e.span()).unwrap_or(call.span))
            } else {
                ("not enough", call.span)
            };
            let have: Vec<TypeId> = args.iter().map(|a| a.ty).collect();
            let msg = format!(
                "{qualifier} arguments in call to {fun}\n\thave {}\n\twant {}",
                self.types_summary(&have, false),
                self.types_summary(&sig.params, sig.variadic)
            );
            self.error(TypeErrorKind::WrongCount, span, msg);
            return;
        }

        let context = format!("argument to {fun}");
        for (a, &p) in args.iter_mut().zip(&params) {
            self.assignment(a, Some(p), &context);
        }
    }

    /// A call of a built-in. Returns false if the call is invalid.
    fn builtin(&mut self, x: &mut Operand<'ast>, call: &'ast CallExpr<'ast>, builtin: Builtin) -> bool {
        let name = builtin.name();
        let (min_args, variadic, _) = builtin_arity(builtin);

        if call.has_ellipsis && builtin != Builtin::Append {
            let msg = format!("invalid operation: invalid use of ... with built-in {name}");
            self.error(TypeErrorKind::InvalidOperation, call.span, msg);
            self.use_exprs(call.args);
            return false;
        }

        let saved_call_or_recv = self.env.has_call_or_recv;
        let len_or_cap = matches!(builtin, Builtin::Len | Builtin::Cap);
        if len_or_cap {
            self.env.has_call_or_recv = false;
        }
        let ok = self.builtin_inner(x, call, builtin, name, min_args, variadic);
        if len_or_cap {
            self.env.has_call_or_recv = saved_call_or_recv;
        }
        ok
    }

    fn builtin_inner(
        &mut self,
        x: &mut Operand<'ast>,
        call: &'ast CallExpr<'ast>,
        builtin: Builtin,
        name: &str,
        min_args: usize,
        variadic: bool,
    ) -> bool {
        let takes_types = matches!(builtin, Builtin::Make | Builtin::New);
        let mut args = Vec::new();
        let nargs = if takes_types {
            call.args.len()
        } else {
            args = self.expr_list(call.args);
            if args.iter().any(Operand::is_invalid) {
                return false;
            }
            if let Some(first) = args.first() {
                *x = first.clone();
            }
            args.len()
        };

        let qualifier = if nargs < min_args {
            Some("not enough")
        } else if !variadic && nargs > min_args {
            Some("too many")
        } else {
            None
        };
        if let Some(qualifier) = qualifier {
            let msg = format!(
                "invalid operation: {qualifier} arguments for {} (expected {min_args}, found {nargs})",
                expr_string(Expr::Call(call))
            );
            self.error(TypeErrorKind::WrongCount, call.span, msg);
            return false;
        }

        match builtin {
            Builtin::Append => {
                let s = x.ty;
                let elem = match self.types.get(self.types.underlying(s)) {
                    Type::Slice(elem) => *elem,
                    _ => {
                        let cause = if x.is_nil() {
                            "have untyped nil".to_string()
                        } else {
                            format!("have {}", self.describe(x))
                        };
                        let msg = format!("first argument to append must be a slice; {cause}");
                        self.error_at(x, TypeErrorKind::InvalidOperation, msg);
                        return false;
                    }
                };

                if nargs == 2 && call.has_ellipsis {
                    let bytes = self.types.slice(TypeId::basic(BasicKind::Uint8));
                    if self.assignable_to(x, bytes).0 && self.types.is_string(args[1].ty) {
                        x.mode = Mode::Value;
                        x.ty = s;
                        return true;
                    }
                }

                let variadic_param = self.types.slice(elem);
                let sig = Signature {
                    params: vec![s, variadic_param].into_boxed_slice(),
                    results: vec![s].into_boxed_slice(),
                    variadic: true,
                };
                self.arguments(call, &sig, &mut args);
                x.mode = Mode::Value;
                x.ty = s;
            }

            Builtin::Cap | Builtin::Len => {
                let mut under = self.types.underlying(x.ty);
                if let Some(elem) = self.types.pointer_elem(under)
                    && matches!(self.types.get(self.types.underlying(elem)), Type::Array { .. })
                {
                    under = self.types.underlying(elem);
                }
                let mode = match self.types.get(under) {
                    Type::Basic(_) if self.types.is_string(under) && builtin == Builtin::Len => {
                        match x.value().and_then(ConstValue::as_str) {
                            Some(s) => Some(Mode::Constant(ConstValue::Int(s.len() as i128))),
                            None => Some(Mode::Value),
                        }
                    }
                    Type::Array { len, .. } => {
                        if self.env.has_call_or_recv {
                            Some(Mode::Value)
                        } else {
                            Some(Mode::Constant(ConstValue::Int(*len as i128)))
                        }
                    }
                    Type::Slice(_) => Some(Mode::Value),
                    Type::Map { .. } if builtin == Builtin::Len => Some(Mode::Value),
                    _ => None,
                };
                let Some(mode) = mode else {
                    if self.types.is_valid(x.ty) {
                        let msg = format!("invalid argument: {} for built-in {name}", self.describe(x));
                        self.error_at(x, TypeErrorKind::InvalidOperation, msg);
                    }
                    return false;
                };
                x.mode = mode;
                x.ty = TypeId::basic(BasicKind::Int);
            }

            Builtin::Copy => {
                let y = args[1].clone();
                let dst = match self.types.get(self.types.underlying(x.ty)) {
                    Type::Slice(elem) => Some(*elem),
                    _ => None,
                };
                let src = if self.types.is_string(y.ty) {
                    Some(TypeId::basic(BasicKind::Uint8))
                } else {
                    match self.types.get(self.types.underlying(y.ty)) {
                        Type::Slice(elem) => Some(*elem),
                        _ => None,
                    }
                };
                let (Some(dst), Some(src)) = (dst, src) else {
                    let msg = format!(
                        "invalid argument: copy expects slice arguments; found {} and {}",
                        self.describe(x),
                        self.describe(&y)
                    );
                    self.error_at(x, TypeErrorKind::InvalidOperation, msg);
                    return false;
                };
                if !self.types.identical_ignore_tags(dst, src) {
                    let msg = format!(
                        "invalid argument: arguments to copy {} and {} have different element types {} and {}",
                        self.describe(x),
                        self.describe(&y),
                        self.type_str(dst),
                        self.type_str(src)
                    );
                    self.error_at(x, TypeErrorKind::InvalidOperation, msg);
                    return false;
                }
                x.mode = Mode::Value;
                x.ty = TypeId::basic(BasicKind::Int);
            }

            Builtin::Delete => {
                let key = match self.types.get(self.types.underlying(x.ty)) {
                    Type::Map { key, .. } => *key,
                    _ => {
                        let msg = format!("invalid argument: {} is not a map", self.describe(x));
                        self.error_at(x, TypeErrorKind::InvalidOperation, msg);
                        return false;
                    }
                };
                *x = args[1].clone();
                self.assignment(x, Some(key), "argument to delete");
                if x.is_invalid() {
                    return false;
                }
                x.mode = Mode::NoValue;
            }

            Builtin::Make => {
                let arg0 = call.args[0];
                let t = self.var_type(arg0);
                if !self.types.is_valid(t) {
                    return false;
                }
                let min = match self.types.get(self.types.underlying(t)) {
                    Type::Slice(_) => 2,
                    Type::Map { .. } => 1,
                    _ => {
                        let msg = format!(
                            "invalid argument: cannot make {}; type must be slice, map, or channel",
                            expr_string(arg0)
                        );
                        self.error(TypeErrorKind::InvalidOperation, arg0.span(), msg);
                        return false;
                    }
                };
                if nargs < min || min + 1 < nargs {
                    let msg = format!(
                        "invalid operation: {} expects {min} or {} arguments; found {nargs}",
                        expr_string(Expr::Call(call)),
                        min + 1
                    );
                    self.error(TypeErrorKind::WrongCount, call.span, msg);
                    return false;
                }
                let sizes: Vec<i128> = call.args[1..]
                    .iter()
                    .filter_map(|&arg| self.index(arg, None).1)
                    .collect();
                if let [len, cap] = sizes[..]
                    && len > cap
                {
                    self.error(
                        TypeErrorKind::InvalidIndex,
                        call.args[1].span(),
                        "invalid argument: length and capacity swapped",
                    );
                }
                *x = Operand::new(Mode::Value, x.expr, t);
            }

            Builtin::New => {
                let t = self.var_type(call.args[0]);
                if !self.types.is_valid(t) {
                    return false;
                }
                x.mode = Mode::Value;
                x.ty = self.types.pointer(t);
            }

            Builtin::Panic => {
                if let Some(sig) = self.env.sig
                    && self.types.signature_of(sig).is_some_and(|s| !s.results.is_empty())
                {
                    self.is_panic.insert(call.id);
                }
                let any = self.types.empty_interface();
                self.assignment(x, Some(any), "argument to panic");
                if x.is_invalid() {
                    return false;
                }
                x.mode = Mode::NoValue;
            }

            Builtin::Print | Builtin::Println => {
                let context = format!("argument to built-in {name}");
                for a in args.iter_mut() {
                    self.assignment(a, None, &context);
                    if a.is_invalid() {
                        return false;
                    }
                }
                x.mode = Mode::NoValue;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statement_builtins() {
        for builtin in Builtin::ALL {
            let (_, _, kind) = builtin_arity(builtin);
            assert_eq!(kind == ExprKind::Statement, builtin.is_statement(), "{}", builtin.name());
        }
    }
}
