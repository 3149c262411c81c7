//! Predeclared basic types.

use bitflags::bitflags;

bitflags! {
    /// Properties of a basic kind, used by the operator predicates.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BasicInfo: u8 {
        const BOOLEAN = 1 << 0;
        const INTEGER = 1 << 1;
        const UNSIGNED = 1 << 2;
        const FLOAT = 1 << 3;
        const STRING = 1 << 4;
        const UNTYPED = 1 << 5;

        const ORDERED = Self::INTEGER.bits() | Self::FLOAT.bits() | Self::STRING.bits();
        const NUMERIC = Self::INTEGER.bits() | Self::FLOAT.bits();
        const CONST_TYPE = Self::BOOLEAN.bits() | Self::NUMERIC.bits() | Self::STRING.bits();
    }
}

/// Every basic type, typed and untyped.
///
/// The discriminant doubles as the [`TypeId`](super::TypeId) of the basic
/// type, so basic ids are known without a table lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum BasicKind {
    Invalid = 0,

    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    String,

    UntypedBool,
    UntypedInt,
    UntypedRune,
    UntypedFloat,
    UntypedString,
    UntypedNil,
}

impl BasicKind {
    pub const ALL: [BasicKind; 22] = [
        BasicKind::Invalid,
        BasicKind::Bool,
        BasicKind::Int,
        BasicKind::Int8,
        BasicKind::Int16,
        BasicKind::Int32,
        BasicKind::Int64,
        BasicKind::Uint,
        BasicKind::Uint8,
        BasicKind::Uint16,
        BasicKind::Uint32,
        BasicKind::Uint64,
        BasicKind::Uintptr,
        BasicKind::Float32,
        BasicKind::Float64,
        BasicKind::String,
        BasicKind::UntypedBool,
        BasicKind::UntypedInt,
        BasicKind::UntypedRune,
        BasicKind::UntypedFloat,
        BasicKind::UntypedString,
        BasicKind::UntypedNil,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BasicKind::Invalid => "invalid type",
            BasicKind::Bool => "bool",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::String => "string",
            BasicKind::UntypedBool => "untyped bool",
            BasicKind::UntypedInt => "untyped int",
            BasicKind::UntypedRune => "untyped rune",
            BasicKind::UntypedFloat => "untyped float",
            BasicKind::UntypedString => "untyped string",
            BasicKind::UntypedNil => "untyped nil",
        }
    }

    pub fn info(self) -> BasicInfo {
        match self {
            BasicKind::Invalid => BasicInfo::empty(),
            BasicKind::Bool => BasicInfo::BOOLEAN,
            BasicKind::Int
            | BasicKind::Int8
            | BasicKind::Int16
            | BasicKind::Int32
            | BasicKind::Int64 => BasicInfo::INTEGER,
            BasicKind::Uint
            | BasicKind::Uint8
            | BasicKind::Uint16
            | BasicKind::Uint32
            | BasicKind::Uint64
            | BasicKind::Uintptr => BasicInfo::INTEGER | BasicInfo::UNSIGNED,
            BasicKind::Float32 | BasicKind::Float64 => BasicInfo::FLOAT,
            BasicKind::String => BasicInfo::STRING,
            BasicKind::UntypedBool => BasicInfo::BOOLEAN | BasicInfo::UNTYPED,
            BasicKind::UntypedInt | BasicKind::UntypedRune => {
                BasicInfo::INTEGER | BasicInfo::UNTYPED
            }
            BasicKind::UntypedFloat => BasicInfo::FLOAT | BasicInfo::UNTYPED,
            BasicKind::UntypedString => BasicInfo::STRING | BasicInfo::UNTYPED,
            BasicKind::UntypedNil => BasicInfo::UNTYPED,
        }
    }

    /// Size in bits of the integer and float kinds.
    pub fn bits(self) -> Option<u32> {
        match self {
            BasicKind::Int8 | BasicKind::Uint8 => Some(8),
            BasicKind::Int16 | BasicKind::Uint16 => Some(16),
            BasicKind::Int32 | BasicKind::Uint32 | BasicKind::Float32 => Some(32),
            BasicKind::Int
            | BasicKind::Int64
            | BasicKind::Uint
            | BasicKind::Uint64
            | BasicKind::Uintptr
            | BasicKind::Float64 => Some(64),
            _ => None,
        }
    }

    pub fn is_untyped(self) -> bool {
        self.info().contains(BasicInfo::UNTYPED)
    }

    /// The type an untyped value takes when nothing else constrains it.
    pub fn default_kind(self) -> BasicKind {
        match self {
            BasicKind::UntypedBool => BasicKind::Bool,
            BasicKind::UntypedInt => BasicKind::Int,
            BasicKind::UntypedRune => BasicKind::Int32,
            BasicKind::UntypedFloat => BasicKind::Float64,
            BasicKind::UntypedString => BasicKind::String,
            other => other,
        }
    }

    pub(crate) fn from_index(index: u32) -> Option<BasicKind> {
        Self::ALL.get(index as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminants_match_table_order() {
        for (i, kind) in BasicKind::ALL.iter().enumerate() {
            assert_eq!(*kind as usize, i);
            assert_eq!(BasicKind::from_index(i as u32), Some(*kind));
        }
    }

    #[test]
    fn untyped_defaults() {
        assert_eq!(BasicKind::UntypedRune.default_kind(), BasicKind::Int32);
        assert_eq!(BasicKind::UntypedFloat.default_kind(), BasicKind::Float64);
        assert_eq!(BasicKind::UntypedNil.default_kind(), BasicKind::UntypedNil);
        assert_eq!(BasicKind::Int8.default_kind(), BasicKind::Int8);
    }

    #[test]
    fn info_flags() {
        assert!(BasicKind::Uint16.info().contains(BasicInfo::UNSIGNED));
        assert!(BasicInfo::NUMERIC.contains(BasicKind::Float32.info()));
        assert!(!BasicKind::Bool.info().intersects(BasicInfo::ORDERED));
        assert!(BasicKind::UntypedString.is_untyped());
    }
}
