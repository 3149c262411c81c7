//! Finding the method that implements an operator.

use goop_parser::ast::Expr;

use super::MethodCandidate;
use crate::checker::Checker;
use crate::operand::{Mode, Operand};
use crate::suppress::SuppressionScope;
use crate::types::TypeId;

/// Whether `x` denotes storage whose address may be taken implicitly.
///
/// Slice, composite literal and dereference expressions count even when the
/// checker did not classify them as variables. Array and slice elements are
/// variables already; map elements never are.
pub(crate) fn is_addressable(x: &Operand<'_>) -> bool {
    match x.mode {
        Mode::Variable => true,
        Mode::MapIndex => false,
        _ => matches!(
            x.expr.map(Expr::unparen),
            Some(Expr::Slice(_) | Expr::CompositeLit(_) | Expr::Star(_))
        ),
    }
}

impl<'a, 'ast> Checker<'a, 'ast> {
    /// The first method of `target` whose name starts with `prefix` and that
    /// accepts `arg` (or no argument at all).
    ///
    /// An untyped `arg` is converted to the parameter type on success and
    /// left untouched otherwise. A typed `arg` must match the parameter type
    /// exactly.
    pub(crate) fn lookup_operator_method(
        &mut self,
        target: TypeId,
        mut arg: Option<&mut Operand<'ast>>,
        prefix: &str,
    ) -> Option<MethodCandidate> {
        if !self.types.is_valid(target) || self.types.is_untyped(target) {
            return None;
        }

        let set = self.method_sets.get(&self.types, target);
        for selection in set.with_prefix(prefix) {
            let Some(sig) = self.types.signature_of(selection.sig).cloned() else {
                continue;
            };
            if sig.variadic || sig.results.len() != 1 || !self.types.is_valid(sig.results[0]) {
                continue;
            }

            match arg.as_deref_mut() {
                None if !sig.params.is_empty() => continue,
                None => {}
                Some(_) if sig.params.len() != 1 => continue,
                Some(arg) => {
                    let param = sig.params[0];
                    if self.types.is_untyped(arg.ty) {
                        if !self.try_convert_untyped(arg, param) {
                            continue;
                        }
                    } else if self.types.type_hash(arg.ty) != self.types.type_hash(param) {
                        continue;
                    }
                }
            }

            return Some(MethodCandidate {
                name: selection.name.clone(),
                params: sig.params.to_vec(),
                result: sig.results[0],
                variadic: false,
            });
        }
        None
    }

    /// Look up on `*T` first when `recv` is an addressable `T`, so methods
    /// with pointer receivers are found too.
    pub(crate) fn lookup_addressable(
        &mut self,
        recv: &Operand<'ast>,
        mut arg: Option<&mut Operand<'ast>>,
        prefix: &str,
    ) -> Option<MethodCandidate> {
        if self.types.is_untyped(recv.ty) {
            return None;
        }
        if self.types.pointer_elem(recv.ty).is_none() && is_addressable(recv) {
            let ptr = self.types.pointer(recv.ty);
            if let Some(found) = self.lookup_operator_method(ptr, arg.as_deref_mut(), prefix) {
                return Some(found);
            }
        }
        self.lookup_operator_method(recv.ty, arg, prefix)
    }

    /// Convert `arg` to `target` without reporting anything. On failure
    /// `arg` is restored.
    fn try_convert_untyped(&mut self, arg: &mut Operand<'ast>, target: TypeId) -> bool {
        let saved = arg.clone();
        let ok = {
            let mut scope = SuppressionScope::new(self);
            scope.convert_untyped(arg, target);
            scope.succeeded() && !arg.is_invalid()
        };
        tracing::trace!(target = %self.type_str(target), ok, "speculative conversion");
        if !ok {
            *arg = saved;
        }
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use goop_core::{ExprId, Span};
    use goop_parser::ast::{IdentExpr, IndexExpr, ParenExpr, StarExpr};

    #[test]
    fn addressable_operands() {
        let arena = Bump::new();
        let span = Span::default();
        let ident = Expr::Ident(arena.alloc(IdentExpr {
            id: ExprId::from_raw(0),
            name: "p",
            span,
        }));
        let star = Expr::Star(arena.alloc(StarExpr {
            id: ExprId::from_raw(1),
            x: ident,
            span,
        }));
        let paren = Expr::Paren(arena.alloc(ParenExpr {
            id: ExprId::from_raw(2),
            x: star,
            span,
        }));

        let var = Operand::new(Mode::Variable, Some(ident), TypeId::INVALID);
        assert!(is_addressable(&var));

        let value = Operand::new(Mode::Value, Some(ident), TypeId::INVALID);
        assert!(!is_addressable(&value));

        let deref = Operand::new(Mode::Value, Some(paren), TypeId::INVALID);
        assert!(is_addressable(&deref));

        let detached = Operand::new(Mode::Value, None, TypeId::INVALID);
        assert!(!is_addressable(&detached));

        let index = Expr::Index(arena.alloc(IndexExpr {
            id: ExprId::from_raw(3),
            x: ident,
            index: ident,
            span,
        }));
        let element = Operand::new(Mode::Variable, Some(index), TypeId::INVALID);
        assert!(is_addressable(&element));

        let map_read = Operand::new(Mode::MapIndex, Some(index), TypeId::INVALID);
        assert!(!is_addressable(&map_read));

        let string_byte = Operand::new(Mode::Value, Some(index), TypeId::INVALID);
        assert!(!is_addressable(&string_byte));
    }
}
