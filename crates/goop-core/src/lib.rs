//! Shared foundation for the goop preprocessor crates.
//!
//! - [`Span`]: source locations
//! - [`ExprId`], [`ExprIdGen`], [`FileId`]: node and file identities
//! - [`error`]: the error hierarchy for every phase

pub mod error;
mod ids;
mod span;

pub use error::{
    GoopError, LexError, ParseError, ParseErrorKind, ParseErrors, TypeError, TypeErrorKind,
    TypeErrors,
};
pub use ids::{ExprId, ExprIdGen, FileId};
pub use span::Span;
