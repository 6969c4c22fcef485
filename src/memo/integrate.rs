// Copyright (c) 2023-2024 CMU Database Group
//
// Use of this source code is governed by an MIT-style license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The integrator (§4.5): recursive, post-order insertion of an un-integrated
//! ABT tree into the memo, with structural deduplication at every level.

use std::collections::HashMap;

use itertools::Itertools;
use tracing::trace;

use crate::abt::{Abt, AbtChild, Context, LogicalRewriteType};
use crate::error::MemoError;
use crate::ids::{GroupId, NodeId};
use crate::memo::Memo;
use crate::memo::phys::PhysProps;

/// Forces the named node to be inserted as a structurally distinct new entry
/// in its target group even if an equal node is already present there —
/// `addExistingNodeWithNewChild` in `spec.md` §4.5.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertMode {
    /// Ordinary integration: reuse a structural match if one exists.
    Dedup,
    /// Force a new, distinct entry even on a structural match.
    Forced,
}

/// The outcome of integrating one tree: the root's resolved group, and every
/// logical node id actually inserted (nodes reused via dedup are excluded).
pub struct IntegrationResult {
    pub root_group: GroupId,
    pub inserted: Vec<NodeId>,
}

impl<N: Abt, P: PhysProps> Memo<N, P> {
    /// Integrates `node` (and its `AbtChild::Node` subtrees, recursively) into
    /// the memo, returning the group it now belongs to.
    ///
    /// `target_group_map` names, for specific nodes, the group they must land
    /// in rather than wherever structural matching or a fresh group would
    /// otherwise place them — used when a rewrite rule produces an expression
    /// that must join an existing equivalence class by construction rather
    /// than by coincidence of structural equality (`spec.md` §4.5).
    pub fn integrate(
        &mut self,
        ctx: &Context<N>,
        node: &N,
        rule: LogicalRewriteType,
        mode: InsertMode,
        target_group_map: &HashMap<N, GroupId>,
    ) -> Result<IntegrationResult, MemoError> {
        self.stats.num_integrations += 1;
        let mut inserted = Vec::new();
        let root_group = self.integrate_rec(ctx, node, rule, mode, target_group_map, &mut inserted)?;
        Ok(IntegrationResult { root_group, inserted })
    }

    fn integrate_rec(
        &mut self,
        ctx: &Context<N>,
        node: &N,
        rule: LogicalRewriteType,
        mode: InsertMode,
        target_group_map: &HashMap<N, GroupId>,
        inserted: &mut Vec<NodeId>,
    ) -> Result<GroupId, MemoError> {
        // Step 1: resolve every child to a group, post-order.
        let mut child_groups = Vec::with_capacity(node.children().len());
        for child in node.children() {
            let child_group = match child {
                AbtChild::Group(existing) => *existing,
                AbtChild::Node(subtree) => {
                    self.integrate_rec(ctx, subtree, rule, mode, target_group_map, inserted)?
                }
            };
            child_groups.push(child_group);
        }

        let rewritten = node.with_child_groups(&child_groups);

        // Step 2: look for a node already in the Memo with the same child
        // groups and structurally equal to the rewritten node. Candidates are
        // walked in insertion order; the first match wins (determinism).
        let structural_match = self
            .reverse_index
            .nodes_with_children(&child_groups)
            .map(|candidates| candidates.iter().copied().sorted_by_key(|id| self.insertion_seq[id]))
            .into_iter()
            .flatten()
            .find(|candidate| self.get_node(*candidate) == &rewritten);

        // Plain dedup mode short-circuits here: an exact match is reused
        // outright, no new node is recorded anywhere.
        if mode == InsertMode::Dedup {
            if let Some(existing) = structural_match {
                trace!(event = "integrate_rec_reuse", node_id = %existing);
                return Ok(existing.group_id);
            }
        }

        // Step 3: no reuse (or forced insertion) — pick the target group.
        let target_group = target_group_map
            .get(&rewritten)
            .copied()
            .or_else(|| structural_match.map(|m| m.group_id));

        if let Some(gid) = target_group {
            assert!(
                !self.reaches(gid, &child_groups),
                "cycle detected: inserting into group {} would create a cycle through its own children",
                gid
            );
        }

        let force = mode == InsertMode::Forced;
        let group_id =
            self.add_node(ctx, &child_groups, target_group, inserted, rewritten, rule, force)?;

        trace!(event = "integrate_rec", group_id = %group_id, ?rule);
        Ok(group_id)
    }

    /// True if `start` is reachable from any group in `from` by following
    /// logical nodes' child-group edges. Used to reject an insertion that
    /// would make `start` its own (possibly indirect) ancestor.
    fn reaches(&self, start: GroupId, from: &[GroupId]) -> bool {
        let mut stack: Vec<GroupId> = from.to_vec();
        let mut seen = std::collections::HashSet::new();
        while let Some(g) = stack.pop() {
            if g == start {
                return true;
            }
            if !seen.insert(g) {
                continue;
            }
            for child_groups in self
                .get_group(g)
                .logical_nodes()
                .iter()
                .map(|n| n.children())
            {
                for c in child_groups {
                    if let AbtChild::Group(gid) = c {
                        stack.push(*gid);
                    }
                }
            }
        }
        false
    }
}
