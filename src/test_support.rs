// Copyright (c) 2023-2024 CMU Database Group
//
// Use of this source code is governed by an MIT-style license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! A small fixture ABT used by `memo::tests`, grounded in
//! `optd-ng-kernel/src/tests/common.rs`'s `MemoTestRelTyp`/`scan`/`join`/
//! `project` builder style. The real ABT is out of scope for this crate; this
//! stand-in is only ever compiled under `#[cfg(test)]`.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::abt::{Abt, AbtChild, CeInterface, DebugInfo, LogicalPropsInterface, Metadata};
use crate::error::MemoError;
use crate::memo::group::{LogicalProperties, Projection};

/// A column name that makes `TestLogicalProps::derive` fail, for exercising
/// the property-derivation rollback path.
pub(crate) const POISON_COLUMN: &str = "__poison__";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum TestOp {
    Scan(String),
    Filter(String),
    Project(Vec<String>),
    Join(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct TestNode {
    pub op: TestOp,
    pub children: Vec<AbtChild<TestNode>>,
}

impl std::fmt::Display for TestNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.op)
    }
}

impl Abt for TestNode {
    fn children(&self) -> &[AbtChild<Self>] {
        &self.children
    }

    fn with_child_groups(&self, child_groups: &[crate::ids::GroupId]) -> Self {
        assert_eq!(
            child_groups.len(),
            self.children.len(),
            "with_child_groups arity mismatch"
        );
        Self {
            op: self.op.clone(),
            children: child_groups.iter().copied().map(AbtChild::Group).collect(),
        }
    }
}

pub(crate) fn scan(table: &str) -> TestNode {
    TestNode {
        op: TestOp::Scan(table.to_string()),
        children: vec![],
    }
}

pub(crate) fn filter(input: impl Into<AbtChild<TestNode>>, predicate: &str) -> TestNode {
    TestNode {
        op: TestOp::Filter(predicate.to_string()),
        children: vec![input.into()],
    }
}

pub(crate) fn project(input: impl Into<AbtChild<TestNode>>, columns: &[&str]) -> TestNode {
    TestNode {
        op: TestOp::Project(columns.iter().map(|c| c.to_string()).collect()),
        children: vec![input.into()],
    }
}

pub(crate) fn join(
    left: impl Into<AbtChild<TestNode>>,
    right: impl Into<AbtChild<TestNode>>,
    cond: &str,
) -> TestNode {
    TestNode {
        op: TestOp::Join(cond.to_string()),
        children: vec![left.into(), right.into()],
    }
}

impl From<TestNode> for AbtChild<TestNode> {
    fn from(node: TestNode) -> Self {
        AbtChild::Node(node)
    }
}

pub(crate) struct TestMetadata;
impl Metadata for TestMetadata {}

pub(crate) struct TestDebugInfo;
impl DebugInfo for TestDebugInfo {}

/// Counts calls so tests can assert properties are derived only once per group.
#[derive(Default)]
pub(crate) struct TestLogicalProps {
    pub derive_calls: AtomicU32,
}

impl LogicalPropsInterface<TestNode> for TestLogicalProps {
    fn derive(
        &self,
        node: &TestNode,
        child_props: &[&LogicalProperties],
    ) -> Result<LogicalProperties, MemoError> {
        self.derive_calls.fetch_add(1, Ordering::Relaxed);
        match &node.op {
            TestOp::Scan(table) => Ok(LogicalProperties::new(vec![Projection(format!(
                "{table}.*"
            ))])),
            TestOp::Filter(_) => Ok(LogicalProperties::new(child_props[0].projections.clone())),
            TestOp::Project(cols) => {
                if cols.iter().any(|c| c == POISON_COLUMN) {
                    return Err(MemoError::PropertyDerivation {
                        reason: format!("unknown column {POISON_COLUMN}"),
                    });
                }
                Ok(LogicalProperties::new(
                    cols.iter().map(|c| Projection(c.clone())).collect(),
                ))
            }
            TestOp::Join(_) => {
                let mut projections = child_props[0].projections.clone();
                projections.extend(child_props[1].projections.clone());
                Ok(LogicalProperties::new(projections))
            }
        }
    }
}

/// Counts calls so tests can assert `estimateCE`'s once-only contract.
#[derive(Default)]
pub(crate) struct TestCe {
    pub estimate_calls: AtomicU32,
}

impl CeInterface<TestNode> for TestCe {
    fn estimate(&self, node: &TestNode, _props: &LogicalProperties) -> f64 {
        self.estimate_calls.fetch_add(1, Ordering::Relaxed);
        match &node.op {
            TestOp::Scan(_) => 1000.0,
            TestOp::Filter(_) => 500.0,
            TestOp::Project(_) => 500.0,
            TestOp::Join(_) => 10_000.0,
        }
    }
}

/// A required-physical-properties stand-in: just an interesting sort column,
/// or none.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct TestPhysProps(pub Option<String>);
