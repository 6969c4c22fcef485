// Copyright (c) 2023-2024 CMU Database Group
//
// Use of this source code is governed by an MIT-style license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The memo façade (§4.6): owns the dense vector of groups, the reverse and
//! inverse indices, and exploration statistics.

pub mod group;
pub mod integrate;
pub mod intern;
pub mod phys;
mod reverse_index;

use std::collections::HashMap;

use tracing::trace;

use crate::abt::{Abt, Context, LogicalRewriteType};
use crate::error::{fatal_property_derivation, MemoError};
use crate::ids::{GroupId, NodeId};
use crate::memo::group::{Group, LogicalProperties};
use crate::memo::phys::{PhysNodeInfo, PhysOptimizationResult, PhysProps};
use crate::memo::reverse_index::ReverseIndex;

/// `_numIntegrations`, `_physPlanExplorationCount`, `_physMemoCheckCount`.
#[derive(Default, Clone, Copy, Debug)]
pub struct MemoStats {
    pub num_integrations: usize,
    pub phys_plan_exploration_count: usize,
    pub phys_memo_check_count: usize,
}

/// The memo: a forest of groups, deduplicated logical nodes, and per-group
/// winner's circles.
pub struct Memo<N: Abt, P: PhysProps> {
    groups: Vec<Group<N, P>>,
    reverse_index: ReverseIndex,
    stats: MemoStats,
    next_seq: u64,
    insertion_seq: HashMap<NodeId, u64>,
}

impl<N: Abt, P: PhysProps> Default for Memo<N, P> {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            reverse_index: ReverseIndex::new(),
            stats: MemoStats::default(),
            next_seq: 0,
            insertion_seq: HashMap::new(),
        }
    }
}

impl<N: Abt, P: PhysProps> Memo<N, P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_group(&self, group_id: GroupId) -> &Group<N, P> {
        &self.groups[group_id.index()]
    }

    pub(crate) fn get_group_mut(&mut self, group_id: GroupId) -> &mut Group<N, P> {
        &mut self.groups[group_id.index()]
    }

    pub fn get_group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn get_logical_node_count(&self) -> usize {
        self.groups.iter().map(Group::logical_node_count).sum()
    }

    pub fn get_physical_node_count(&self) -> usize {
        self.groups
            .iter()
            .map(|g| g.phys_nodes().iter().filter(|r| r.is_optimized()).count())
            .sum()
    }

    pub fn find_node_in_group(&self, group_id: GroupId, node: &N) -> (usize, bool) {
        self.get_group(group_id).logical_nodes().find(node)
    }

    pub fn get_node(&self, node_id: NodeId) -> &N {
        self.get_group(node_id.group_id)
            .logical_nodes()
            .at(node_id.index)
    }

    pub fn stats(&self) -> MemoStats {
        self.stats
    }

    /// The winner's circle entry for `props` in `group_id`, creating it with
    /// `cost_limit` if it doesn't already exist.
    pub fn add_optimization_result(
        &mut self,
        group_id: GroupId,
        props: P,
        cost_limit: crate::memo::phys::Cost,
    ) -> &mut PhysOptimizationResult<N, P> {
        self.stats.phys_memo_check_count += 1;
        self.get_group_mut(group_id)
            .phys_nodes_mut()
            .add_optimization_result(props, cost_limit)
    }

    /// Records that a scheduler considered one more physical candidate
    /// while implementing `group_id`. The memo never generates candidates
    /// itself; a scheduler above it calls this as bookkeeping.
    pub fn record_phys_plan_exploration(&mut self) {
        self.stats.phys_plan_exploration_count += 1;
    }

    pub fn set_physical_winner(
        &mut self,
        group_id: GroupId,
        phys_index: usize,
        info: PhysNodeInfo<N>,
    ) {
        trace!(event = "set_physical_winner", group_id = %group_id, phys_index = phys_index);
        self.get_group_mut(group_id)
            .phys_nodes_mut()
            .get_mut(phys_index)
            .set_winner(info);
    }

    /// `estimateCE`: derive cardinality for a group's logical properties,
    /// using the first inserted node as representative. Idempotent.
    pub fn estimate_ce(&mut self, ctx: &Context<N>, group_id: GroupId) {
        let group = self.get_group_mut(group_id);
        let already_known = group
            .properties()
            .map(|p| p.cardinality.is_some())
            .unwrap_or(false);
        if already_known {
            return;
        }
        assert!(
            !group.logical_nodes().is_empty(),
            "estimateCE called on group {} with no logical nodes (insert before \
             estimating, or re-seed after clearLogicalNodes)",
            group_id
        );
        let representative = group.logical_nodes().at(0).clone();
        let properties = group
            .properties()
            .expect("group has logical nodes but no properties; violates the group invariant")
            .clone();
        let cardinality = ctx.ce.estimate(&representative, &properties);
        self.get_group_mut(group_id).set_cardinality(cardinality);
    }

    /// Drops the logical members of `group_id` and their reverse-index
    /// entries. Physical entries are untouched. The group's logical
    /// properties (projections) survive — they describe the group's
    /// identity, not its current membership — but a caller must re-seed
    /// logical nodes before calling `estimate_ce` again, since that needs a
    /// representative node.
    pub fn clear_logical_nodes(&mut self, group_id: GroupId) {
        trace!(event = "clear_logical_nodes", group_id = %group_id);
        self.reverse_index.clear_group(group_id);
        self.get_group_mut(group_id).clear_logical_nodes();
        self.insertion_seq.retain(|n, _| n.group_id != group_id);
    }

    /// Full reset.
    pub fn clear(&mut self) {
        trace!(event = "clear");
        *self = Self::default();
    }

    /// Prints a one-line summary per group, for interactive debugging only
    /// — mirrors the teacher's `CascadesOptimizer::dump`.
    pub fn dump(&self)
    where
        N: std::fmt::Display,
    {
        for (idx, group) in self.groups.iter().enumerate() {
            let group_id = GroupId::new(idx);
            println!(
                "group {} projections={:?} cardinality={:?} logical_nodes={} physical_entries={}",
                group_id,
                group.projections(),
                group.properties().and_then(|p| p.cardinality),
                group.logical_node_count(),
                group.phys_nodes().len(),
            );
            for (i, node) in group.logical_nodes().iter().enumerate() {
                println!("  [{}] rule={:?} {}", i, group.rule_of(i), node);
            }
        }
    }

    fn derive_properties(
        &self,
        ctx: &Context<N>,
        node: &N,
        child_groups: &[GroupId],
    ) -> Result<LogicalProperties, MemoError> {
        let child_props: Vec<&LogicalProperties> = child_groups
            .iter()
            .map(|g| {
                self.get_group(*g)
                    .properties()
                    .expect("child group referenced during integration has no properties yet")
            })
            .collect();
        ctx.logical_props.derive(node, &child_props)
    }

    fn new_group(&mut self, properties: LogicalProperties) -> GroupId {
        let group_id = GroupId::new(self.groups.len());
        let mut group = Group::new(properties.projections.clone());
        group.set_properties(properties);
        self.groups.push(group);
        trace!(event = "new_group", group_id = %group_id);
        group_id
    }

    /// `addNode`: single-level insert used by the integrator. `node` is
    /// already rewritten (every child replaced by a `GroupId`).
    ///
    /// Fatal on projection mismatch against an existing target group's
    /// properties. Property-derivation failure is surfaced as `Err` only
    /// when the target group is brand-new and therefore still empty and
    /// safely discardable; otherwise it is fatal (see `spec.md` §7).
    pub(crate) fn add_node(
        &mut self,
        ctx: &Context<N>,
        child_groups: &[GroupId],
        target_group: Option<GroupId>,
        inserted_node_ids: &mut Vec<NodeId>,
        node: N,
        rule: LogicalRewriteType,
        force: bool,
    ) -> Result<GroupId, MemoError> {
        let group_id = match target_group {
            Some(gid) => {
                let candidate = self
                    .derive_properties(ctx, &node, child_groups)
                    .unwrap_or_else(|e| fatal_property_derivation(gid, &e));
                let existing = self
                    .get_group(gid)
                    .properties()
                    .expect("existing target group has no properties");
                assert_eq!(
                    existing.projections, candidate.projections,
                    "projection mismatch inserting into group {}: existing {:?} vs derived {:?}",
                    gid, existing.projections, candidate.projections
                );
                gid
            }
            None => {
                let candidate = self.derive_properties(ctx, &node, child_groups)?;
                self.new_group(candidate)
            }
        };

        let (index, inserted) = self
            .get_group_mut(group_id)
            .append_logical_node(node, rule, force);
        let node_id = NodeId::new(group_id, index);
        if inserted {
            trace!(event = "add_node", node_id = %node_id, ?rule);
            self.reverse_index.insert(child_groups.to_vec(), node_id);
            self.insertion_seq.insert(node_id, self.next_seq);
            self.next_seq += 1;
            inserted_node_ids.push(node_id);
        }
        Ok(group_id)
    }
}
