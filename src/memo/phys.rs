// Copyright (c) 2023-2024 CMU Database Group
//
// Use of this source code is governed by an MIT-style license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The winner's circle (§4.2): a group's physical optimization results,
//! keyed by required physical properties, indexed in request order.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use ordered_float::OrderedFloat;

use crate::abt::{Abt, PhysicalRewriteType};
use crate::ids::NodeId;
use crate::memo::intern::NOT_FOUND;
use crate::queue::RewriteQueue;

/// A compound cost, represented as a single weighted value. The teacher's
/// `Cost(Vec<f64>)` carries a breakdown vector the external cost model
/// understands; the memo itself only ever needs the single comparable,
/// hashable total, so this crate narrows to `OrderedFloat<f64>` and leaves
/// breakdown representation to the (out-of-scope) cost model.
pub type Cost = OrderedFloat<f64>;

/// Blanket bound for a required-physical-properties type: hashable and
/// comparable, as §4.2 requires ("hash + equality on the property struct").
pub trait PhysProps: Clone + Eq + Hash + Debug {}
impl<T: Clone + Eq + Hash + Debug> PhysProps for T {}

/// A materialized physical plan for a group under a specific required
/// property set.
#[derive(Clone, Debug)]
pub struct PhysNodeInfo<N: Abt> {
    pub node: N,
    pub total_cost: Cost,
    pub local_cost: Cost,
    /// Display cardinality, adjusted for Limit/Repetition-style operators
    /// whose output row count differs from their subtree's raw estimate.
    pub display_cardinality: f64,
    pub rule: PhysicalRewriteType,
}

/// One entry in a group's winner's circle.
pub struct PhysOptimizationResult<N: Abt, P: PhysProps> {
    index: usize,
    required: P,
    cost_limit: Cost,
    node_info: Option<PhysNodeInfo<N>>,
    rejected: Vec<PhysNodeInfo<N>>,
    last_implemented_node_pos: usize,
    queue: RewriteQueue<NodeId>,
}

impl<N: Abt, P: PhysProps> PhysOptimizationResult<N, P> {
    fn new(index: usize, required: P, cost_limit: Cost) -> Self {
        Self {
            index,
            required,
            cost_limit,
            node_info: None,
            rejected: Vec::new(),
            last_implemented_node_pos: 0,
            queue: RewriteQueue::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn required(&self) -> &P {
        &self.required
    }

    pub fn cost_limit(&self) -> Cost {
        self.cost_limit
    }

    pub fn node_info(&self) -> Option<&PhysNodeInfo<N>> {
        self.node_info.as_ref()
    }

    pub fn rejected(&self) -> &[PhysNodeInfo<N>] {
        &self.rejected
    }

    pub fn last_implemented_node_pos(&self) -> usize {
        self.last_implemented_node_pos
    }

    pub fn set_last_implemented_node_pos(&mut self, pos: usize) {
        self.last_implemented_node_pos = pos;
    }

    pub fn queue(&self) -> &RewriteQueue<NodeId> {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut RewriteQueue<NodeId> {
        &mut self.queue
    }

    /// Once `node_info` is set the entry is optimized.
    pub fn is_optimized(&self) -> bool {
        self.node_info.is_some()
    }

    /// Monotonically relaxes pruning. Allowed only while unoptimized; a
    /// lowered limit, or raising after a winner has been recorded, is a
    /// fatal programmer error (see `DESIGN.md`'s Open Question resolution).
    pub fn raise_cost_limit(&mut self, new_limit: Cost) {
        assert!(
            !self.is_optimized(),
            "raiseCostLimit called on an already-optimized result; call \
             reset_for_reoptimization first"
        );
        assert!(
            new_limit >= self.cost_limit,
            "raiseCostLimit must be monotonically non-decreasing: {:?} -> {:?}",
            self.cost_limit,
            new_limit
        );
        self.cost_limit = new_limit;
    }

    /// Records the winning candidate. Invariant: its cost must not exceed
    /// the current cost limit.
    pub fn set_winner(&mut self, info: PhysNodeInfo<N>) {
        assert!(
            info.total_cost <= self.cost_limit,
            "winner cost {:?} exceeds cost limit {:?}",
            info.total_cost,
            self.cost_limit
        );
        self.node_info = Some(info);
    }

    pub fn reject(&mut self, info: PhysNodeInfo<N>) {
        self.rejected.push(info);
    }

    /// Explicitly clears a recorded winner so `raise_cost_limit` may be
    /// used again, then raises the limit. Required because `spec.md` §9
    /// forbids silently shadowing a winner already produced by prior
    /// exploration.
    pub fn reset_for_reoptimization(&mut self, new_limit: Cost) {
        assert!(
            new_limit >= self.cost_limit,
            "reset_for_reoptimization must not lower the cost limit"
        );
        self.node_info = None;
        self.cost_limit = new_limit;
    }
}

/// A group's winner's circle: physical optimization results keyed by
/// required physical properties, indexed in the order their property sets
/// were first requested.
pub struct PhysNodes<N: Abt, P: PhysProps> {
    entries: Vec<PhysOptimizationResult<N, P>>,
    index: HashMap<P, usize>,
}

impl<N: Abt, P: PhysProps> Default for PhysNodes<N, P> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<N: Abt, P: PhysProps> PhysNodes<N, P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, props: &P) -> (usize, bool) {
        match self.index.get(props) {
            Some(&idx) => (idx, true),
            None => (NOT_FOUND, false),
        }
    }

    /// Returns the existing entry for `props` if present; otherwise
    /// allocates a new one with a fresh dense index and the caller-supplied
    /// initial cost limit.
    pub fn add_optimization_result(
        &mut self,
        props: P,
        cost_limit: Cost,
    ) -> &mut PhysOptimizationResult<N, P> {
        let (idx, found) = self.find(&props);
        let idx = if found {
            idx
        } else {
            let idx = self.entries.len();
            self.index.insert(props.clone(), idx);
            self.entries.push(PhysOptimizationResult::new(idx, props, cost_limit));
            idx
        };
        &mut self.entries[idx]
    }

    pub fn get(&self, index: usize) -> &PhysOptimizationResult<N, P> {
        &self.entries[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut PhysOptimizationResult<N, P> {
        &mut self.entries[index]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PhysOptimizationResult<N, P>> {
        self.entries.iter()
    }
}
