//! Operands: the result of evaluating an expression.

use goop_parser::ast::Expr;

use crate::constant::ConstValue;
use crate::objects::Builtin;
use crate::types::{BasicKind, TypeId};

/// How an evaluated expression may be used.
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    /// Evaluation failed; an error has been reported.
    Invalid,
    /// A call of a function without results.
    NoValue,
    /// A predeclared function that has not been called.
    Builtin(Builtin),
    TypeExpr,
    /// A constant. Its type may be untyped.
    Constant(ConstValue),
    /// Addressable storage.
    Variable,
    /// `m[k]`: assignable but not addressable.
    MapIndex,
    /// Any other value.
    Value,
}

impl Mode {
    pub fn kind(&self) -> ModeKind {
        match self {
            Mode::Invalid => ModeKind::Invalid,
            Mode::NoValue => ModeKind::NoValue,
            Mode::Builtin(_) => ModeKind::Builtin,
            Mode::TypeExpr => ModeKind::TypeExpr,
            Mode::Constant(_) => ModeKind::Constant,
            Mode::Variable => ModeKind::Variable,
            Mode::MapIndex => ModeKind::MapIndex,
            Mode::Value => ModeKind::Value,
        }
    }
}

/// [`Mode`] without its payload, as recorded for each expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeKind {
    Invalid,
    NoValue,
    Builtin,
    TypeExpr,
    Constant,
    Variable,
    MapIndex,
    Value,
}

impl ModeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ModeKind::Invalid => "invalid operand",
            ModeKind::NoValue => "no value",
            ModeKind::Builtin => "built-in",
            ModeKind::TypeExpr => "type",
            ModeKind::Constant => "constant",
            ModeKind::Variable => "variable",
            ModeKind::MapIndex => "map index expression",
            ModeKind::Value => "value",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Operand<'ast> {
    pub mode: Mode,
    /// The expression the operand was computed from.
    pub expr: Option<Expr<'ast>>,
    pub ty: TypeId,
}

impl<'ast> Operand<'ast> {
    pub fn invalid() -> Self {
        Self {
            mode: Mode::Invalid,
            expr: None,
            ty: TypeId::INVALID,
        }
    }

    pub fn new(mode: Mode, expr: Option<Expr<'ast>>, ty: TypeId) -> Self {
        Self { mode, expr, ty }
    }

    pub fn is_invalid(&self) -> bool {
        self.mode == Mode::Invalid
    }

    pub fn invalidate(&mut self) {
        self.mode = Mode::Invalid;
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.mode, Mode::Constant(_))
    }

    pub fn value(&self) -> Option<&ConstValue> {
        match &self.mode {
            Mode::Constant(value) => Some(value),
            _ => None,
        }
    }

    /// The predeclared `nil`.
    pub fn is_nil(&self) -> bool {
        self.mode == Mode::Value && self.ty == TypeId::basic(BasicKind::UntypedNil)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes() {
        let mut x = Operand::new(
            Mode::Constant(ConstValue::Int(2)),
            None,
            TypeId::basic(BasicKind::UntypedInt),
        );
        assert!(x.is_constant());
        assert_eq!(x.value(), Some(&ConstValue::Int(2)));
        assert_eq!(x.mode.kind(), ModeKind::Constant);
        x.invalidate();
        assert!(x.is_invalid());

        let nil = Operand::new(Mode::Value, None, TypeId::basic(BasicKind::UntypedNil));
        assert!(nil.is_nil());
    }
}
