//! Compile-time constant values and their arithmetic.
//!
//! Integers are exact within `i128`; floats are `f64`. Operations that leave
//! those ranges report [`ConstError::Overflow`] instead of wrapping.

use goop_parser::ast::{BinaryOp, LitKind, UnaryOp};
use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

use crate::types::{BasicInfo, BasicKind};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstValue {
    Bool(bool),
    Int(i128),
    Float(OrderedFloat<f64>),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConstError {
    #[error("constant overflow")]
    Overflow,
    #[error("division by zero")]
    DivisionByZero,
    #[error("invalid constant operation")]
    Invalid,
}

/// Why a constant cannot be represented by a basic type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unrepresentable {
    /// A float with a fractional part used as an integer.
    Truncated,
    /// The value is outside the range of the type.
    Overflows,
    /// The value has the wrong kind entirely.
    Mismatch,
}

impl ConstValue {
    /// Value of a literal, or `None` if the spelling is malformed.
    pub fn from_literal(kind: LitKind, text: &str) -> Option<ConstValue> {
        match kind {
            LitKind::Int => parse_int(text).map(ConstValue::Int),
            LitKind::Float => text
                .replace('_', "")
                .parse::<f64>()
                .ok()
                .map(|f| ConstValue::Float(OrderedFloat(f))),
            LitKind::Rune => {
                let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
                let chars = unescape(inner, '\'')?;
                let mut iter = chars.chars();
                let c = iter.next()?;
                iter.next().is_none().then_some(ConstValue::Int(c as i128))
            }
            LitKind::String => {
                if let Some(raw) = text.strip_prefix('`') {
                    let raw = raw.strip_suffix('`')?;
                    Some(ConstValue::String(raw.replace('\r', "")))
                } else {
                    let inner = text.strip_prefix('"')?.strip_suffix('"')?;
                    unescape(inner, '"').map(ConstValue::String)
                }
            }
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConstValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConstValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Exact integer value, converting integral floats.
    pub fn to_int(&self) -> Option<i128> {
        match self {
            ConstValue::Int(i) => Some(*i),
            ConstValue::Float(f) => {
                let f = f.0;
                (f.is_finite() && f.fract() == 0.0 && f.abs() < 1.7e38).then_some(f as i128)
            }
            _ => None,
        }
    }

    pub fn to_float(&self) -> Option<f64> {
        match self {
            ConstValue::Int(i) => Some(*i as f64),
            ConstValue::Float(f) => Some(f.0),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ConstValue::Int(_) | ConstValue::Float(_))
    }

    /// Sign of a numeric value.
    pub fn sign(&self) -> Option<Ordering> {
        match self {
            ConstValue::Int(i) => Some(i.cmp(&0)),
            ConstValue::Float(f) => f.0.partial_cmp(&0.0),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.sign() == Some(Ordering::Equal)
    }

    // =========================================
    // Operations
    // =========================================

    /// Fold a unary operator. `unsigned_bits` limits `^x` for unsigned types.
    pub fn unary_op(
        op: UnaryOp,
        x: &ConstValue,
        unsigned_bits: Option<u32>,
    ) -> Result<ConstValue, ConstError> {
        match (op, x) {
            (UnaryOp::Pos, ConstValue::Int(_) | ConstValue::Float(_)) => Ok(x.clone()),
            (UnaryOp::Neg, ConstValue::Int(i)) => {
                i.checked_neg().map(ConstValue::Int).ok_or(ConstError::Overflow)
            }
            (UnaryOp::Neg, ConstValue::Float(f)) => Ok(ConstValue::Float(-*f)),
            (UnaryOp::Not, ConstValue::Bool(b)) => Ok(ConstValue::Bool(!b)),
            (UnaryOp::Xor, ConstValue::Int(i)) => match unsigned_bits {
                Some(bits) if bits < 128 => Ok(ConstValue::Int(!i & ((1i128 << bits) - 1))),
                _ => Ok(ConstValue::Int(!i)),
            },
            _ => Err(ConstError::Invalid),
        }
    }

    /// Fold a non-comparison, non-shift binary operator.
    ///
    /// With `integer_division`, `/` on integers truncates; otherwise integer
    /// operands of `/` produce an exact float when the division is inexact.
    pub fn binary_op(
        x: &ConstValue,
        op: BinaryOp,
        y: &ConstValue,
        integer_division: bool,
    ) -> Result<ConstValue, ConstError> {
        use ConstValue::*;
        match (x, y) {
            (Bool(a), Bool(b)) => match op {
                BinaryOp::LAnd => Ok(Bool(*a && *b)),
                BinaryOp::LOr => Ok(Bool(*a || *b)),
                _ => Err(ConstError::Invalid),
            },
            (String(a), String(b)) => match op {
                BinaryOp::Add => Ok(String(format!("{a}{b}"))),
                _ => Err(ConstError::Invalid),
            },
            (Int(a), Int(b)) => int_op(*a, op, *b, integer_division),
            (Int(_) | Float(_), Int(_) | Float(_)) => {
                let (Some(a), Some(b)) = (x.to_float(), y.to_float()) else {
                    return Err(ConstError::Invalid);
                };
                float_op(a, op, b)
            }
            _ => Err(ConstError::Invalid),
        }
    }

    /// Evaluate a comparison operator.
    pub fn compare(x: &ConstValue, op: BinaryOp, y: &ConstValue) -> Option<bool> {
        use ConstValue::*;
        let ordering = match (x, y) {
            (Bool(a), Bool(b)) => {
                return match op {
                    BinaryOp::Eql => Some(a == b),
                    BinaryOp::Neq => Some(a != b),
                    _ => None,
                };
            }
            (String(a), String(b)) => a.cmp(b),
            (Int(a), Int(b)) => a.cmp(b),
            _ => x.to_float()?.partial_cmp(&y.to_float()?)?,
        };
        let result = match op {
            BinaryOp::Eql => ordering == Ordering::Equal,
            BinaryOp::Neq => ordering != Ordering::Equal,
            BinaryOp::Lss => ordering == Ordering::Less,
            BinaryOp::Leq => ordering != Ordering::Greater,
            BinaryOp::Gtr => ordering == Ordering::Greater,
            BinaryOp::Geq => ordering != Ordering::Less,
            _ => return None,
        };
        Some(result)
    }

    /// Shift an integer value.
    pub fn shift(x: &ConstValue, op: BinaryOp, count: u32) -> Result<ConstValue, ConstError> {
        let value = x.to_int().ok_or(ConstError::Invalid)?;
        match op {
            BinaryOp::Shl => {
                if value == 0 {
                    return Ok(ConstValue::Int(0));
                }
                if count >= 127 {
                    return Err(ConstError::Overflow);
                }
                let shifted = value << count;
                if shifted >> count != value {
                    return Err(ConstError::Overflow);
                }
                Ok(ConstValue::Int(shifted))
            }
            BinaryOp::Shr => Ok(ConstValue::Int(value >> count.min(127))),
            _ => Err(ConstError::Invalid),
        }
    }

    /// Check that the value fits `kind`, returning it in the kind's
    /// representation (floats rounded to `float32`, integral floats as ints).
    pub fn represent(&self, kind: BasicKind) -> Result<ConstValue, Unrepresentable> {
        let info = kind.info();
        if info.contains(BasicInfo::INTEGER) {
            let value = match self {
                ConstValue::Int(i) => *i,
                ConstValue::Float(_) => self.to_int().ok_or(Unrepresentable::Truncated)?,
                _ => return Err(Unrepresentable::Mismatch),
            };
            if kind.is_untyped() || int_fits(value, kind) {
                return Ok(ConstValue::Int(value));
            }
            return Err(Unrepresentable::Overflows);
        }
        if info.contains(BasicInfo::FLOAT) {
            let value = self.to_float().ok_or(Unrepresentable::Mismatch)?;
            let rounded = match kind {
                BasicKind::Float32 => value as f32 as f64,
                _ => value,
            };
            if rounded.is_infinite() {
                return Err(Unrepresentable::Overflows);
            }
            return Ok(ConstValue::Float(OrderedFloat(rounded)));
        }
        match (self, info) {
            (ConstValue::String(_), i) if i.contains(BasicInfo::STRING) => Ok(self.clone()),
            (ConstValue::Bool(_), i) if i.contains(BasicInfo::BOOLEAN) => Ok(self.clone()),
            _ => Err(Unrepresentable::Mismatch),
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Bool(b) => write!(f, "{b}"),
            ConstValue::Int(i) => write!(f, "{i}"),
            ConstValue::Float(x) => {
                let x = x.0;
                if x.abs() >= 1e21 || (x != 0.0 && x.abs() < 1e-6) {
                    write!(f, "{x:e}")
                } else {
                    write!(f, "{x}")
                }
            }
            ConstValue::String(s) => write!(f, "{s:?}"),
        }
    }
}

fn int_op(a: i128, op: BinaryOp, b: i128, integer_division: bool) -> Result<ConstValue, ConstError> {
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Quo => {
            if b == 0 {
                return Err(ConstError::DivisionByZero);
            }
            if !integer_division && a % b != 0 {
                return Ok(ConstValue::Float(OrderedFloat(a as f64 / b as f64)));
            }
            a.checked_div(b)
        }
        BinaryOp::Rem => {
            if b == 0 {
                return Err(ConstError::DivisionByZero);
            }
            a.checked_rem(b)
        }
        BinaryOp::And => Some(a & b),
        BinaryOp::Or => Some(a | b),
        BinaryOp::Xor => Some(a ^ b),
        BinaryOp::AndNot => Some(a & !b),
        _ => return Err(ConstError::Invalid),
    };
    result.map(ConstValue::Int).ok_or(ConstError::Overflow)
}

fn float_op(a: f64, op: BinaryOp, b: f64) -> Result<ConstValue, ConstError> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Quo => {
            if b == 0.0 {
                return Err(ConstError::DivisionByZero);
            }
            a / b
        }
        _ => return Err(ConstError::Invalid),
    };
    if result.is_finite() {
        Ok(ConstValue::Float(OrderedFloat(result)))
    } else {
        Err(ConstError::Overflow)
    }
}

fn int_fits(value: i128, kind: BasicKind) -> bool {
    let Some(bits) = kind.bits() else {
        return false;
    };
    if kind.info().contains(BasicInfo::UNSIGNED) {
        value >= 0 && value <= (1i128 << bits) - 1
    } else {
        let max = (1i128 << (bits - 1)) - 1;
        value >= -max - 1 && value <= max
    }
}

fn parse_int(text: &str) -> Option<i128> {
    let digits = text.replace('_', "");
    let (radix, body) = match digits.get(..2) {
        Some("0x" | "0X") => (16, &digits[2..]),
        Some("0b" | "0B") => (2, &digits[2..]),
        Some("0o" | "0O") => (8, &digits[2..]),
        _ if digits.len() > 1 && digits.starts_with('0') => (8, &digits[1..]),
        _ => (10, digits.as_str()),
    };
    i128::from_str_radix(body, radix).ok()
}

/// Decode the escapes of a quoted literal body.
fn unescape(body: &str, quote: char) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = chars.next()?;
        let decoded = match escaped {
            'a' => '\u{7}',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\u{b}',
            '\\' => '\\',
            c if c == quote => c,
            'x' => {
                let hex: String = (0..2).filter_map(|_| chars.next()).collect();
                char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?
            }
            'u' | 'U' => {
                let n = if escaped == 'u' { 4 } else { 8 };
                let hex: String = (0..n).filter_map(|_| chars.next()).collect();
                char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?
            }
            '0'..='7' => {
                let mut oct = String::from(escaped);
                for _ in 0..2 {
                    oct.push(chars.next()?);
                }
                char::from_u32(u32::from_str_radix(&oct, 8).ok()?)?
            }
            _ => return None,
        };
        out.push(decoded);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(i: i128) -> ConstValue {
        ConstValue::Int(i)
    }

    fn float(f: f64) -> ConstValue {
        ConstValue::Float(OrderedFloat(f))
    }

    #[test]
    fn literals() {
        assert_eq!(ConstValue::from_literal(LitKind::Int, "1_000"), Some(int(1000)));
        assert_eq!(ConstValue::from_literal(LitKind::Int, "0x1F"), Some(int(31)));
        assert_eq!(ConstValue::from_literal(LitKind::Int, "0755"), Some(int(493)));
        assert_eq!(ConstValue::from_literal(LitKind::Int, "0b101"), Some(int(5)));
        assert_eq!(ConstValue::from_literal(LitKind::Float, "2.5e1"), Some(float(25.0)));
        assert_eq!(ConstValue::from_literal(LitKind::Rune, "'a'"), Some(int(97)));
        assert_eq!(ConstValue::from_literal(LitKind::Rune, "'\\n'"), Some(int(10)));
        assert_eq!(
            ConstValue::from_literal(LitKind::String, "\"a\\tb\\u00e9\""),
            Some(ConstValue::String("a\tbé".into()))
        );
        assert_eq!(
            ConstValue::from_literal(LitKind::String, "`raw\\n`"),
            Some(ConstValue::String("raw\\n".into()))
        );
    }

    #[test]
    fn integer_arithmetic() {
        assert_eq!(ConstValue::binary_op(&int(7), BinaryOp::Quo, &int(2), true), Ok(int(3)));
        assert_eq!(ConstValue::binary_op(&int(7), BinaryOp::Quo, &int(2), false), Ok(float(3.5)));
        assert_eq!(ConstValue::binary_op(&int(6), BinaryOp::AndNot, &int(3), true), Ok(int(4)));
        assert_eq!(
            ConstValue::binary_op(&int(1), BinaryOp::Rem, &int(0), true),
            Err(ConstError::DivisionByZero)
        );
        assert_eq!(
            ConstValue::binary_op(&int(i128::MAX), BinaryOp::Add, &int(1), true),
            Err(ConstError::Overflow)
        );
    }

    #[test]
    fn mixed_arithmetic_promotes_to_float() {
        assert_eq!(
            ConstValue::binary_op(&int(2), BinaryOp::Mul, &float(1.5), false),
            Ok(float(3.0))
        );
        assert_eq!(
            ConstValue::binary_op(&ConstValue::String("a".into()), BinaryOp::Add, &ConstValue::String("b".into()), false),
            Ok(ConstValue::String("ab".into()))
        );
    }

    #[test]
    fn unary() {
        assert_eq!(ConstValue::unary_op(UnaryOp::Neg, &int(3), None), Ok(int(-3)));
        assert_eq!(ConstValue::unary_op(UnaryOp::Xor, &int(0), Some(8)), Ok(int(255)));
        assert_eq!(ConstValue::unary_op(UnaryOp::Xor, &int(0), None), Ok(int(-1)));
        assert_eq!(
            ConstValue::unary_op(UnaryOp::Not, &ConstValue::Bool(true), None),
            Ok(ConstValue::Bool(false))
        );
    }

    #[test]
    fn comparisons() {
        assert_eq!(ConstValue::compare(&int(1), BinaryOp::Lss, &float(1.5)), Some(true));
        assert_eq!(
            ConstValue::compare(&ConstValue::String("b".into()), BinaryOp::Geq, &ConstValue::String("a".into())),
            Some(true)
        );
        assert_eq!(
            ConstValue::compare(&ConstValue::Bool(true), BinaryOp::Lss, &ConstValue::Bool(false)),
            None
        );
    }

    #[test]
    fn shifts() {
        assert_eq!(ConstValue::shift(&int(1), BinaryOp::Shl, 10), Ok(int(1024)));
        assert_eq!(ConstValue::shift(&float(4.0), BinaryOp::Shr, 1), Ok(int(2)));
        assert_eq!(ConstValue::shift(&int(1), BinaryOp::Shl, 200), Err(ConstError::Overflow));
        assert_eq!(ConstValue::shift(&int(0), BinaryOp::Shl, 200), Ok(int(0)));
    }

    #[test]
    fn representability() {
        assert_eq!(int(255).represent(BasicKind::Uint8), Ok(int(255)));
        assert_eq!(int(256).represent(BasicKind::Uint8), Err(Unrepresentable::Overflows));
        assert_eq!(int(-129).represent(BasicKind::Int8), Err(Unrepresentable::Overflows));
        assert_eq!(float(2.0).represent(BasicKind::Int), Ok(int(2)));
        assert_eq!(float(2.5).represent(BasicKind::Int), Err(Unrepresentable::Truncated));
        assert_eq!(int(4).represent(BasicKind::Float32), Ok(float(4.0)));
        assert_eq!(float(1e300).represent(BasicKind::Float32), Err(Unrepresentable::Overflows));
        assert_eq!(
            ConstValue::String("x".into()).represent(BasicKind::Int),
            Err(Unrepresentable::Mismatch)
        );
        assert_eq!(int(1).represent(BasicKind::Bool), Err(Unrepresentable::Mismatch));
    }

    #[test]
    fn display() {
        assert_eq!(int(-4).to_string(), "-4");
        assert_eq!(float(2.5).to_string(), "2.5");
        assert_eq!(ConstValue::String("hi".into()).to_string(), "\"hi\"");
    }
}
