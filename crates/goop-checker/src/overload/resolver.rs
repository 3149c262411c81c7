//! Binary and unary operator overload resolution.
//!
//! For `x op y` the checker tries, in order:
//! 1. `x.Op_<Name>...(y)`
//! 2. `y.Op_Pre<Name>...(x)`
//!
//! and for `op x` only `x.Op_<Name>...()`. A miss is never an error: the
//! built-in operator rules take over and report whatever is wrong.

use goop_parser::ast::Expr;

use super::{MethodCandidate, OverloadOp, OverloadRecord};
use crate::checker::Checker;
use crate::operand::{Mode, Operand};

impl<'a, 'ast> Checker<'a, 'ast> {
    /// Resolve `e` as an overloaded binary operator. On success `x` becomes
    /// the value of the method call.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn overload_binary(
        &mut self,
        x: &mut Operand<'ast>,
        y: &mut Operand<'ast>,
        e: Expr<'ast>,
    ) -> bool {
        let Expr::Binary(b) = e else {
            return false;
        };
        if self.types.is_untyped(x.ty) && self.types.is_untyped(y.ty) {
            return false;
        }

        let op = OverloadOp::from_binary(b.op);
        let (method, reversed) = if let Some(method) = self.lookup_addressable(x, Some(y), &op.method_prefix()) {
            (method, false)
        } else if let Some(method) = self.lookup_addressable(y, Some(x), &op.reversed_prefix()) {
            (method, true)
        } else {
            return false;
        };

        let (receiver, operand) = if reversed { (b.right, b.left) } else { (b.left, b.right) };
        tracing::debug!(
            expr = %goop_parser::expr_string(e),
            method = %method.name,
            reversed,
            "binary operator overloaded"
        );
        self.finish_overload(x, e, op, method, receiver, Some(operand), reversed);
        true
    }

    /// Resolve `e` as an overloaded unary operator.
    pub(crate) fn overload_unary(&mut self, x: &mut Operand<'ast>, e: Expr<'ast>) -> bool {
        let Expr::Unary(u) = e else {
            return false;
        };
        if self.types.is_untyped(x.ty) {
            return false;
        }
        let Some(op) = OverloadOp::from_unary(u.op) else {
            return false;
        };
        let Some(method) = self.lookup_addressable(x, None, &op.method_prefix()) else {
            return false;
        };

        tracing::debug!(
            expr = %goop_parser::expr_string(e),
            method = %method.name,
            "unary operator overloaded"
        );
        self.finish_overload(x, e, op, method, u.x, None, false);
        true
    }

    #[allow(clippy::too_many_arguments)]
    fn finish_overload(
        &mut self,
        x: &mut Operand<'ast>,
        e: Expr<'ast>,
        op: OverloadOp,
        method: MethodCandidate,
        receiver: Expr<'ast>,
        operand: Option<Expr<'ast>>,
        reversed: bool,
    ) {
        let result = method.result;
        self.overloads.insert(
            e.id(),
            OverloadRecord {
                op,
                method,
                receiver: receiver.id(),
                operand: operand.map(|o| o.id()),
                reversed,
            },
        );
        x.mode = Mode::Value;
        x.ty = result;
        x.expr = Some(e);
    }
}
