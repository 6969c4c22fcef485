// Copyright (c) 2023-2024 CMU Database Group
//
// Use of this source code is governed by an MIT-style license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The external contracts the memo consults: the opaque ABT, logical
//! property derivation, cardinality estimation, and the rewrite rule tags.
//!
//! None of these are implemented here — concrete rewrite rules, the cost
//! model and the cardinality estimator are collaborators outside this crate,
//! referenced only through the traits below.

use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::error::MemoError;
use crate::ids::GroupId;
use crate::memo::group::LogicalProperties;

/// A child slot of an un-integrated ABT: either a subtree that still needs
/// to be integrated, or a group reference already resolved by a rewrite
/// rule (mirrors `PlanNodeOrGroup` in the teacher's node representation).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AbtChild<N> {
    Node(N),
    Group(GroupId),
}

impl<N> From<GroupId> for AbtChild<N> {
    fn from(group_id: GroupId) -> Self {
        AbtChild::Group(group_id)
    }
}

/// The opaque algebraic plan tree. Immutable, structurally hashed and
/// compared, recursively substitutable.
///
/// A node stored in the memo always has every child resolved to a
/// `AbtChild::Group`; a node handed to `Memo::integrate` may still carry
/// `AbtChild::Node` subtrees that the integrator will recursively resolve.
pub trait Abt: Clone + Eq + Hash + Debug {
    /// The node's immediate children, in insertion order.
    fn children(&self) -> &[AbtChild<Self>];

    /// A copy of `self` with every child replaced, in order, by a reference
    /// to the given group. Leaves (no children) ignore the argument.
    ///
    /// Fatal precondition: `child_groups.len() == self.children().len()`.
    fn with_child_groups(&self, child_groups: &[GroupId]) -> Self;

    fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }
}

/// Given a node and its child groups' logical properties, derive the node's
/// own logical properties (projections and any cardinality-independent
/// attributes). Must be pure with respect to the memo.
pub trait LogicalPropsInterface<N: Abt>: Send + Sync {
    fn derive(
        &self,
        node: &N,
        child_props: &[&LogicalProperties],
    ) -> Result<LogicalProperties, MemoError>;
}

/// Given a node and its group's logical properties, produce a cardinality
/// estimate. Must be pure with respect to the memo.
pub trait CeInterface<N: Abt>: Send + Sync {
    fn estimate(&self, node: &N, props: &LogicalProperties) -> f64;
}

/// Opaque metadata handle, threaded through `Context` but never inspected by
/// the memo itself.
pub trait Metadata: Send + Sync {}

/// Opaque debug-info handle, threaded through `Context` but never inspected
/// by the memo itself.
pub trait DebugInfo: Send + Sync {}

/// Non-owning bundle of collaborators passed to every memo operation that
/// may need to derive properties or estimate cardinality. All four fields
/// must outlive the call — the type system enforces this via the lifetime
/// parameter, where the source's contract enforced it with runtime
/// non-null checks.
pub struct Context<'a, N: Abt> {
    pub metadata: &'a dyn Metadata,
    pub debug_info: &'a dyn DebugInfo,
    pub logical_props: &'a dyn LogicalPropsInterface<N>,
    pub ce: &'a dyn CeInterface<N>,
}

/// Opaque identifier for an externally-registered rewrite rule.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Serialize, Deserialize)]
pub struct RuleId(pub u32);

/// The tag recorded alongside every logical node, identifying the rewrite
/// that produced it.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum LogicalRewriteType {
    /// The user-supplied input, not the product of any rewrite.
    Root,
    Rule(RuleId),
}

/// The tag recorded alongside every physical candidate, identifying the
/// implementation rule that produced it.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum PhysicalRewriteType {
    Rule(RuleId),
}
