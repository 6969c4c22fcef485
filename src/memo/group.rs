// Copyright (c) 2023-2024 CMU Database Group
//
// Use of this source code is governed by an MIT-style license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Group (§4.3): an equivalence class of logically equivalent plan
//! expressions over the same output projections.

use crate::abt::{Abt, LogicalRewriteType};
use crate::ids::NodeId;
use crate::memo::intern::InterningSet;
use crate::memo::phys::{PhysNodes, PhysProps};

use crate::queue::RewriteQueue;

/// A single named output column a group produces. Declared at group
/// creation and immutable thereafter.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Projection(pub String);

impl From<&str> for Projection {
    fn from(s: &str) -> Self {
        Projection(s.to_string())
    }
}

impl From<String> for Projection {
    fn from(s: String) -> Self {
        Projection(s)
    }
}

/// A group's derived logical properties: its projections (restated from the
/// group's own declaration, so `LogicalPropsInterface` implementations can
/// be checked for consistency), a cardinality estimate filled in on demand,
/// and any physical constraints the node shape implies (e.g. a `Sort`
/// implies an interesting order downstream rewrites may want to know about).
#[derive(Clone, Debug, PartialEq)]
pub struct LogicalProperties {
    pub projections: Vec<Projection>,
    pub cardinality: Option<f64>,
    pub constraints: Vec<String>,
}

impl LogicalProperties {
    pub fn new(projections: Vec<Projection>) -> Self {
        Self {
            projections,
            cardinality: None,
            constraints: Vec::new(),
        }
    }
}

/// An equivalence class of logically equivalent plan fragments over the
/// same projections.
///
/// The source's constructor synthesizes an immutable "binder" ABT node
/// representing the group's output variables; this crate has no such
/// synthesis step because the ABT contract (`Abt`) is opaque and exposes no
/// node-construction factory, only structural comparison and child
/// substitution. The projection list itself is the immutable declaration
/// (see `DESIGN.md`).
pub struct Group<N: Abt, P: PhysProps> {
    projections: Vec<Projection>,
    logical_nodes: InterningSet<N>,
    rules: Vec<LogicalRewriteType>,
    logical_queue: RewriteQueue<NodeId>,
    properties: Option<LogicalProperties>,
    phys_nodes: PhysNodes<N, P>,
}

impl<N: Abt, P: PhysProps> Group<N, P> {
    pub fn new(projections: Vec<Projection>) -> Self {
        Self {
            projections,
            logical_nodes: InterningSet::new(),
            rules: Vec::new(),
            logical_queue: RewriteQueue::new(),
            properties: None,
            phys_nodes: PhysNodes::new(),
        }
    }

    pub fn projections(&self) -> &[Projection] {
        &self.projections
    }

    pub fn logical_nodes(&self) -> &InterningSet<N> {
        &self.logical_nodes
    }

    pub fn logical_node_count(&self) -> usize {
        self.logical_nodes.len()
    }

    pub fn rule_of(&self, index: usize) -> LogicalRewriteType {
        self.rules[index]
    }

    pub fn logical_queue(&self) -> &RewriteQueue<NodeId> {
        &self.logical_queue
    }

    pub fn logical_queue_mut(&mut self) -> &mut RewriteQueue<NodeId> {
        &mut self.logical_queue
    }

    pub fn properties(&self) -> Option<&LogicalProperties> {
        self.properties.as_ref()
    }

    pub fn phys_nodes(&self) -> &PhysNodes<N, P> {
        &self.phys_nodes
    }

    pub fn phys_nodes_mut(&mut self) -> &mut PhysNodes<N, P> {
        &mut self.phys_nodes
    }

    /// Appends a structurally new node with its producing rule tag.
    ///
    /// Precondition (enforced by the memo, not here): the node is not
    /// already present under structural equality, unless `force` requests
    /// unconditional append.
    pub(crate) fn append_logical_node(
        &mut self,
        node: N,
        rule: LogicalRewriteType,
        force: bool,
    ) -> (usize, bool) {
        let (index, inserted) = if force {
            (self.logical_nodes.push_forced(node), true)
        } else {
            self.logical_nodes.emplace_back(node)
        };
        if inserted {
            debug_assert_eq!(index, self.rules.len());
            self.rules.push(rule);
        }
        (index, inserted)
    }

    /// Computed once, on first insertion into the group. A programmer error
    /// to call twice.
    pub(crate) fn set_properties(&mut self, properties: LogicalProperties) {
        debug_assert!(
            self.properties.is_none(),
            "logical properties computed more than once for a group"
        );
        self.properties = Some(properties);
    }

    pub(crate) fn set_cardinality(&mut self, cardinality: f64) {
        let props = self
            .properties
            .as_mut()
            .expect("cardinality estimated before logical properties were derived");
        props.cardinality = Some(cardinality);
    }

    /// Drops all logical members, resetting indices within this group.
    /// Physical entries and their winners are untouched.
    pub(crate) fn clear_logical_nodes(&mut self) {
        self.logical_nodes.clear();
        self.rules.clear();
        self.logical_queue.clear();
    }
}
