#![allow(clippy::new_without_default)]

//! The Memo of a Cascades-style cost-based query optimizer: groups, logical
//! node interning, the winner's circle, the input-groups reverse index, and
//! the integrator that ties them together.
//!
//! The algebraic plan tree itself, rewrite rules, the cost model and the
//! cardinality estimator are external collaborators, referenced here only
//! through the narrow traits in [`abt`].

pub mod abt;
pub mod error;
pub mod ids;
pub mod memo;
pub mod queue;

#[cfg(test)]
mod test_support;

pub use abt::{Abt, AbtChild, CeInterface, Context, LogicalPropsInterface, LogicalRewriteType, PhysicalRewriteType, RuleId};
pub use error::MemoError;
pub use ids::{GroupId, NodeId};
pub use memo::Memo;
