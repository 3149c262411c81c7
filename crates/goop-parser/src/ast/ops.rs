//! Operator enums with precedence information for the Pratt parser.

use crate::lexer::TokenKind;
use std::fmt;

/// Binary operators, ordered by precedence from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Precedence 1
    /// `||`
    LOr,

    // Precedence 2
    /// `&&`
    LAnd,

    // Precedence 3
    /// `==`
    Eql,
    /// `!=`
    Neq,
    /// `<`
    Lss,
    /// `<=`
    Leq,
    /// `>`
    Gtr,
    /// `>=`
    Geq,

    // Precedence 4
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `|`
    Or,
    /// `^`
    Xor,

    // Precedence 5
    /// `*`
    Mul,
    /// `/`
    Quo,
    /// `%`
    Rem,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `&`
    And,
    /// `&^`
    AndNot,
}

impl BinaryOp {
    /// Go operator precedence (1 = loosest, 5 = tightest).
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::LOr => 1,
            BinaryOp::LAnd => 2,
            BinaryOp::Eql
            | BinaryOp::Neq
            | BinaryOp::Lss
            | BinaryOp::Leq
            | BinaryOp::Gtr
            | BinaryOp::Geq => 3,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Or | BinaryOp::Xor => 4,
            BinaryOp::Mul
            | BinaryOp::Quo
            | BinaryOp::Rem
            | BinaryOp::Shl
            | BinaryOp::Shr
            | BinaryOp::And
            | BinaryOp::AndNot => 5,
        }
    }

    /// Left and right binding power. All binary operators associate left.
    pub fn binding_power(self) -> (u8, u8) {
        let prec = self.precedence();
        (prec, prec + 1)
    }

    pub fn from_token(token: TokenKind) -> Option<Self> {
        let op = match token {
            TokenKind::LOr => BinaryOp::LOr,
            TokenKind::LAnd => BinaryOp::LAnd,
            TokenKind::Eql => BinaryOp::Eql,
            TokenKind::Neq => BinaryOp::Neq,
            TokenKind::Lss => BinaryOp::Lss,
            TokenKind::Leq => BinaryOp::Leq,
            TokenKind::Gtr => BinaryOp::Gtr,
            TokenKind::Geq => BinaryOp::Geq,
            TokenKind::Add => BinaryOp::Add,
            TokenKind::Sub => BinaryOp::Sub,
            TokenKind::Or => BinaryOp::Or,
            TokenKind::Xor => BinaryOp::Xor,
            TokenKind::Mul => BinaryOp::Mul,
            TokenKind::Quo => BinaryOp::Quo,
            TokenKind::Rem => BinaryOp::Rem,
            TokenKind::Shl => BinaryOp::Shl,
            TokenKind::Shr => BinaryOp::Shr,
            TokenKind::And => BinaryOp::And,
            TokenKind::AndNot => BinaryOp::AndNot,
            _ => return None,
        };
        Some(op)
    }

    pub fn is_comparison(self) -> bool {
        self.precedence() == 3
    }

    pub fn is_shift(self) -> bool {
        matches!(self, BinaryOp::Shl | BinaryOp::Shr)
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::LAnd | BinaryOp::LOr)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::LOr => "||",
            BinaryOp::LAnd => "&&",
            BinaryOp::Eql => "==",
            BinaryOp::Neq => "!=",
            BinaryOp::Lss => "<",
            BinaryOp::Leq => "<=",
            BinaryOp::Gtr => ">",
            BinaryOp::Geq => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::Mul => "*",
            BinaryOp::Quo => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::And => "&",
            BinaryOp::AndNot => "&^",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prefix operators. Dereference is a separate `StarExpr` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `+x`
    Pos,
    /// `-x`
    Neg,
    /// `!x`
    Not,
    /// `^x`
    Xor,
    /// `&x`
    Addr,
}

impl UnaryOp {
    pub fn from_token(token: TokenKind) -> Option<Self> {
        match token {
            TokenKind::Add => Some(UnaryOp::Pos),
            TokenKind::Sub => Some(UnaryOp::Neg),
            TokenKind::Not => Some(UnaryOp::Not),
            TokenKind::Xor => Some(UnaryOp::Xor),
            TokenKind::And => Some(UnaryOp::Addr),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Pos => "+",
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::Xor => "^",
            UnaryOp::Addr => "&",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assignment operators: plain, defining, and compound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `:=`
    Define,
    /// `op=`, carrying the underlying binary operator.
    Compound(BinaryOp),
}

impl AssignOp {
    pub fn from_token(token: TokenKind) -> Option<Self> {
        let op = match token {
            TokenKind::Assign => AssignOp::Assign,
            TokenKind::Define => AssignOp::Define,
            TokenKind::AddAssign => AssignOp::Compound(BinaryOp::Add),
            TokenKind::SubAssign => AssignOp::Compound(BinaryOp::Sub),
            TokenKind::MulAssign => AssignOp::Compound(BinaryOp::Mul),
            TokenKind::QuoAssign => AssignOp::Compound(BinaryOp::Quo),
            TokenKind::RemAssign => AssignOp::Compound(BinaryOp::Rem),
            TokenKind::AndAssign => AssignOp::Compound(BinaryOp::And),
            TokenKind::OrAssign => AssignOp::Compound(BinaryOp::Or),
            TokenKind::XorAssign => AssignOp::Compound(BinaryOp::Xor),
            TokenKind::ShlAssign => AssignOp::Compound(BinaryOp::Shl),
            TokenKind::ShrAssign => AssignOp::Compound(BinaryOp::Shr),
            TokenKind::AndNotAssign => AssignOp::Compound(BinaryOp::AndNot),
            _ => return None,
        };
        Some(op)
    }
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignOp::Assign => f.write_str("="),
            AssignOp::Define => f.write_str(":="),
            AssignOp::Compound(op) => write!(f, "{op}="),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_levels() {
        assert!(BinaryOp::Mul.precedence() > BinaryOp::Add.precedence());
        assert!(BinaryOp::Add.precedence() > BinaryOp::Eql.precedence());
        assert!(BinaryOp::Eql.precedence() > BinaryOp::LAnd.precedence());
        assert!(BinaryOp::LAnd.precedence() > BinaryOp::LOr.precedence());
        assert_eq!(BinaryOp::AndNot.precedence(), BinaryOp::Shl.precedence());
    }

    #[test]
    fn left_associative() {
        let (l, r) = BinaryOp::Sub.binding_power();
        assert!(r > l);
    }

    #[test]
    fn binary_from_token_round_trips_spelling() {
        for token in [
            TokenKind::LOr,
            TokenKind::Geq,
            TokenKind::Xor,
            TokenKind::AndNot,
            TokenKind::Shr,
        ] {
            let op = BinaryOp::from_token(token).unwrap();
            assert_eq!(op.as_str(), token.as_str());
        }
        assert_eq!(BinaryOp::from_token(TokenKind::Assign), None);
    }

    #[test]
    fn unary_tokens() {
        assert_eq!(UnaryOp::from_token(TokenKind::Sub), Some(UnaryOp::Neg));
        assert_eq!(UnaryOp::from_token(TokenKind::And), Some(UnaryOp::Addr));
        assert_eq!(UnaryOp::from_token(TokenKind::Mul), None);
    }

    #[test]
    fn compound_assignment_display() {
        let op = AssignOp::from_token(TokenKind::ShlAssign).unwrap();
        assert_eq!(op, AssignOp::Compound(BinaryOp::Shl));
        assert_eq!(op.to_string(), "<<=");
        assert_eq!(AssignOp::Define.to_string(), ":=");
    }

    #[test]
    fn classification() {
        assert!(BinaryOp::Leq.is_comparison());
        assert!(!BinaryOp::Shl.is_comparison());
        assert!(BinaryOp::Shl.is_shift());
        assert!(BinaryOp::LAnd.is_logical());
    }
}
