//! Stable identities for syntax nodes and source files.
//!
//! Every expression node receives an [`ExprId`] when it is parsed. Side
//! tables built by later phases (recorded types, resolved overloads) are keyed
//! by these ids rather than by node addresses, so they stay meaningful after
//! the tree is rebuilt.

use std::fmt;

/// Identity of one expression node, unique within a package.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(u32);

impl ExprId {
    /// Wrap a raw index.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw index.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Hands out fresh [`ExprId`]s.
///
/// One generator is shared by every file of a package so ids never collide,
/// and the rewrite pass keeps drawing from it when it synthesises nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExprIdGen {
    next: u32,
}

impl ExprIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id.
    #[inline]
    pub fn fresh(&mut self) -> ExprId {
        let id = ExprId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    #[inline]
    pub fn issued(&self) -> u32 {
        self.next
    }
}

/// Index of a source file within a package, in the order files were added.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FileId(pub u32);

impl FileId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_is_monotonic() {
        let mut ids = ExprIdGen::new();
        let a = ids.fresh();
        let b = ids.fresh();
        assert!(a < b);
        assert_eq!(ids.issued(), 2);
    }

    #[test]
    fn copies_continue_independently() {
        let mut ids = ExprIdGen::new();
        ids.fresh();
        let mut snapshot = ids;
        assert_eq!(snapshot.fresh(), ids.fresh());
    }

    #[test]
    fn debug_formats() {
        assert_eq!(format!("{:?}", ExprId::from_raw(7)), "e7");
        assert_eq!(format!("{:?}", FileId(2)), "file#2");
    }
}
