//! Operators that may be overloaded and the method names they map to.

use std::fmt;

use goop_parser::TokenKind;
use goop_parser::ast::{BinaryOp, UnaryOp};

/// An overloadable operator.
///
/// The mapping is by token: `-x` and `a - b` both look for `Subtract`
/// methods, they only differ in arity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverloadOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    BitAnd,
    BitOr,
    BitShiftLeft,
    BitShiftRight,
    BitAndNot,
    BitXor,
    And,
    Or,
    Equal,
    Less,
    Greater,
    Not,
    NotEqual,
    LessOrEqual,
    GreaterOrEqual,
}

impl OverloadOp {
    pub const ALL: [OverloadOp; 20] = [
        OverloadOp::Add,
        OverloadOp::Subtract,
        OverloadOp::Multiply,
        OverloadOp::Divide,
        OverloadOp::Modulo,
        OverloadOp::BitAnd,
        OverloadOp::BitOr,
        OverloadOp::BitShiftLeft,
        OverloadOp::BitShiftRight,
        OverloadOp::BitAndNot,
        OverloadOp::BitXor,
        OverloadOp::And,
        OverloadOp::Or,
        OverloadOp::Equal,
        OverloadOp::Less,
        OverloadOp::Greater,
        OverloadOp::Not,
        OverloadOp::NotEqual,
        OverloadOp::LessOrEqual,
        OverloadOp::GreaterOrEqual,
    ];

    /// The name following `Op_` (or `Op_Pre`) in a method name.
    pub fn name(self) -> &'static str {
        match self {
            OverloadOp::Add => "Add",
            OverloadOp::Subtract => "Subtract",
            OverloadOp::Multiply => "Multiply",
            OverloadOp::Divide => "Divide",
            OverloadOp::Modulo => "Modulo",
            OverloadOp::BitAnd => "BitAnd",
            OverloadOp::BitOr => "BitOr",
            OverloadOp::BitShiftLeft => "BitShiftLeft",
            OverloadOp::BitShiftRight => "BitShiftRight",
            OverloadOp::BitAndNot => "BitAndNot",
            OverloadOp::BitXor => "BitXor",
            OverloadOp::And => "And",
            OverloadOp::Or => "Or",
            OverloadOp::Equal => "Equal",
            OverloadOp::Less => "Less",
            OverloadOp::Greater => "Greater",
            OverloadOp::Not => "Not",
            OverloadOp::NotEqual => "NotEqual",
            OverloadOp::LessOrEqual => "LessOrEqual",
            OverloadOp::GreaterOrEqual => "GreaterOrEqual",
        }
    }

    /// Prefix of the methods implementing `receiver op operand`.
    pub fn method_prefix(self) -> String {
        format!("Op_{}", self.name())
    }

    /// Prefix of the methods implementing `operand op receiver`.
    pub fn reversed_prefix(self) -> String {
        format!("Op_Pre{}", self.name())
    }

    /// Map an operator token. Assignment forms, `&x`, `*p`, `<-` and
    /// punctuation are not overloadable.
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        let op = match kind {
            TokenKind::Add => OverloadOp::Add,
            TokenKind::Sub => OverloadOp::Subtract,
            TokenKind::Mul => OverloadOp::Multiply,
            TokenKind::Quo => OverloadOp::Divide,
            TokenKind::Rem => OverloadOp::Modulo,
            TokenKind::And => OverloadOp::BitAnd,
            TokenKind::Or => OverloadOp::BitOr,
            TokenKind::Shl => OverloadOp::BitShiftLeft,
            TokenKind::Shr => OverloadOp::BitShiftRight,
            TokenKind::AndNot => OverloadOp::BitAndNot,
            TokenKind::Xor => OverloadOp::BitXor,
            TokenKind::LAnd => OverloadOp::And,
            TokenKind::LOr => OverloadOp::Or,
            TokenKind::Eql => OverloadOp::Equal,
            TokenKind::Lss => OverloadOp::Less,
            TokenKind::Gtr => OverloadOp::Greater,
            TokenKind::Not => OverloadOp::Not,
            TokenKind::Neq => OverloadOp::NotEqual,
            TokenKind::Leq => OverloadOp::LessOrEqual,
            TokenKind::Geq => OverloadOp::GreaterOrEqual,
            _ => return None,
        };
        Some(op)
    }

    pub fn from_binary(op: BinaryOp) -> Self {
        match op {
            BinaryOp::LOr => OverloadOp::Or,
            BinaryOp::LAnd => OverloadOp::And,
            BinaryOp::Eql => OverloadOp::Equal,
            BinaryOp::Neq => OverloadOp::NotEqual,
            BinaryOp::Lss => OverloadOp::Less,
            BinaryOp::Leq => OverloadOp::LessOrEqual,
            BinaryOp::Gtr => OverloadOp::Greater,
            BinaryOp::Geq => OverloadOp::GreaterOrEqual,
            BinaryOp::Add => OverloadOp::Add,
            BinaryOp::Sub => OverloadOp::Subtract,
            BinaryOp::Or => OverloadOp::BitOr,
            BinaryOp::Xor => OverloadOp::BitXor,
            BinaryOp::Mul => OverloadOp::Multiply,
            BinaryOp::Quo => OverloadOp::Divide,
            BinaryOp::Rem => OverloadOp::Modulo,
            BinaryOp::Shl => OverloadOp::BitShiftLeft,
            BinaryOp::Shr => OverloadOp::BitShiftRight,
            BinaryOp::And => OverloadOp::BitAnd,
            BinaryOp::AndNot => OverloadOp::BitAndNot,
        }
    }

    /// `&x` takes an address and is never overloaded.
    pub fn from_unary(op: UnaryOp) -> Option<Self> {
        match op {
            UnaryOp::Pos => Some(OverloadOp::Add),
            UnaryOp::Neg => Some(OverloadOp::Subtract),
            UnaryOp::Not => Some(OverloadOp::Not),
            UnaryOp::Xor => Some(OverloadOp::BitXor),
            UnaryOp::Addr => None,
        }
    }
}

impl fmt::Display for OverloadOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_distinct() {
        let mut names: Vec<_> = OverloadOp::ALL.iter().map(|op| op.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), OverloadOp::ALL.len());
    }

    #[test]
    fn token_mapping() {
        assert_eq!(OverloadOp::from_token(TokenKind::Add), Some(OverloadOp::Add));
        assert_eq!(OverloadOp::from_token(TokenKind::AndNot), Some(OverloadOp::BitAndNot));
        assert_eq!(OverloadOp::from_token(TokenKind::Geq), Some(OverloadOp::GreaterOrEqual));
        assert_eq!(OverloadOp::from_token(TokenKind::Not), Some(OverloadOp::Not));
        for kind in [
            TokenKind::Assign,
            TokenKind::AddAssign,
            TokenKind::Define,
            TokenKind::Inc,
            TokenKind::Arrow,
            TokenKind::Tilde,
            TokenKind::Ident,
        ] {
            assert_eq!(OverloadOp::from_token(kind), None, "{kind:?}");
        }
    }

    #[test]
    fn binary_and_token_agree() {
        let pairs = [
            (BinaryOp::Add, TokenKind::Add),
            (BinaryOp::Sub, TokenKind::Sub),
            (BinaryOp::Mul, TokenKind::Mul),
            (BinaryOp::Quo, TokenKind::Quo),
            (BinaryOp::Rem, TokenKind::Rem),
            (BinaryOp::And, TokenKind::And),
            (BinaryOp::Or, TokenKind::Or),
            (BinaryOp::Xor, TokenKind::Xor),
            (BinaryOp::Shl, TokenKind::Shl),
            (BinaryOp::Shr, TokenKind::Shr),
            (BinaryOp::AndNot, TokenKind::AndNot),
            (BinaryOp::LAnd, TokenKind::LAnd),
            (BinaryOp::LOr, TokenKind::LOr),
            (BinaryOp::Eql, TokenKind::Eql),
            (BinaryOp::Neq, TokenKind::Neq),
            (BinaryOp::Lss, TokenKind::Lss),
            (BinaryOp::Leq, TokenKind::Leq),
            (BinaryOp::Gtr, TokenKind::Gtr),
            (BinaryOp::Geq, TokenKind::Geq),
        ];
        for (op, token) in pairs {
            assert_eq!(Some(OverloadOp::from_binary(op)), OverloadOp::from_token(token));
        }
    }

    #[test]
    fn unary_maps_by_token() {
        assert_eq!(OverloadOp::from_unary(UnaryOp::Neg), Some(OverloadOp::Subtract));
        assert_eq!(OverloadOp::from_unary(UnaryOp::Pos), Some(OverloadOp::Add));
        assert_eq!(OverloadOp::from_unary(UnaryOp::Xor), Some(OverloadOp::BitXor));
        assert_eq!(OverloadOp::from_unary(UnaryOp::Addr), None);
    }

    #[test]
    fn prefixes() {
        assert_eq!(OverloadOp::Multiply.method_prefix(), "Op_Multiply");
        assert_eq!(OverloadOp::Multiply.reversed_prefix(), "Op_PreMultiply");
    }
}
