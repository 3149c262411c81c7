//! Operator overloading.
//!
//! A binary or unary operator whose operand type declares a matching
//! `Op_*` method is checked as a call of that method. Each resolution is
//! recorded in the [`OverloadTable`] for the rewrite pass.

mod lookup;
mod ops;
mod resolver;
mod table;

pub use ops::OverloadOp;
pub use table::{MethodCandidate, OverloadRecord, OverloadTable};
