// Copyright (c) 2023-2024 CMU Database Group
//
// Use of this source code is governed by an MIT-style license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Input-groups reverse index (§4.4): `childGroups -> {NodeId}` and its
//! inverse, maintained by the integrator on every successful insert.

use std::collections::HashMap;
use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::ids::{GroupId, NodeId};

/// Hashable, order-sensitive key: the ordered tuple of child `GroupId`s a
/// node consumes. Order matters (a commutative-insensitive combiner is
/// exactly what `spec.md` §4.4 says *not* to use for the tuple itself — only
/// the rule matcher above the memo, e.g. join reordering, treats
/// permutations as interesting; the memo's own index is keyed by the exact
/// ordered child tuple).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChildGroups(Vec<GroupId>);

impl ChildGroups {
    pub fn new(children: Vec<GroupId>) -> Self {
        Self(children)
    }

    pub fn as_slice(&self) -> &[GroupId] {
        &self.0
    }
}

/// `InputGroupsToNodeIdMap`: for each ordered child-group tuple, the set of
/// `NodeId`s that use exactly that tuple as immediate children.
#[derive(Default)]
pub struct ReverseIndex {
    forward: HashMap<ChildGroups, HashSet<NodeId>>,
    inverse: HashMap<NodeId, ChildGroups>,
}

fn fingerprint(children: &ChildGroups) -> u64 {
    let mut hasher = DefaultHasher::new();
    children.hash(&mut hasher);
    hasher.finish()
}

impl ReverseIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, children: Vec<GroupId>, node_id: NodeId) {
        let key = ChildGroups::new(children);
        self.forward.entry(key.clone()).or_default().insert(node_id);
        self.inverse.insert(node_id, key);
    }

    pub fn nodes_with_children(&self, children: &[GroupId]) -> Option<&HashSet<NodeId>> {
        self.forward.get(&ChildGroups::new(children.to_vec()))
    }

    pub fn children_of(&self, node_id: NodeId) -> Option<&[GroupId]> {
        self.inverse.get(&node_id).map(ChildGroups::as_slice)
    }

    /// Drops every entry belonging to `group_id`, in both directions. Used
    /// by `clearLogicalNodes`.
    pub fn clear_group(&mut self, group_id: GroupId) {
        let stale: Vec<NodeId> = self
            .inverse
            .keys()
            .copied()
            .filter(|n| n.group_id == group_id)
            .collect();
        for node_id in stale {
            if let Some(children) = self.inverse.remove(&node_id) {
                if let Some(set) = self.forward.get_mut(&children) {
                    set.remove(&node_id);
                    if set.is_empty() {
                        self.forward.remove(&children);
                    }
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn fingerprint_of(&self, children: &[GroupId]) -> u64 {
        fingerprint(&ChildGroups::new(children.to_vec()))
    }
}
