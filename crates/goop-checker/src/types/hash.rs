//! Hashes of canonical type spellings.
//!
//! Overload candidates compare a concretely typed argument against a
//! parameter by canonical spelling. Two types with the same spelling hash the
//! same even when they are distinct named types declared in different scopes.

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Seed separating type hashes from any other use of xxh64.
const TYPE_SEED: u64 = 0x2fac10b63a6cc57c;

/// 64-bit hash of a canonical type string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeHash(pub u64);

impl TypeHash {
    pub fn from_type_string(spelling: &str) -> Self {
        TypeHash(xxh64(spelling.as_bytes(), TYPE_SEED))
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        assert_eq!(
            TypeHash::from_type_string("main.vec4"),
            TypeHash::from_type_string("main.vec4")
        );
        assert_ne!(
            TypeHash::from_type_string("main.vec4"),
            TypeHash::from_type_string("*main.vec4")
        );
    }

    #[test]
    fn display_is_fixed_width() {
        assert_eq!(TypeHash(0xab).to_string(), "00000000000000ab");
    }
}
