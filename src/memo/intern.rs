// Copyright (c) 2023-2024 CMU Database Group
//
// Use of this source code is governed by an MIT-style license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Order-preserving interning set (§4.1): maps an ABT to a dense index,
//! preserving insertion order, deduplicating on structural equality.
//!
//! Grounded on the teacher's bucket-then-verify `lookup_expr`/
//! `expr_fingerprint_to_ids` pattern in `optd-core`'s memo: a structural hash
//! bucket narrows the candidates, a final `==` check confirms the match.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::abt::Abt;

/// Returned by `find` when no structural match exists. Callers must check
/// the accompanying `bool` before using the index.
pub const NOT_FOUND: usize = usize::MAX;

pub struct InterningSet<N: Abt> {
    nodes: Vec<N>,
    buckets: HashMap<u64, Vec<usize>>,
}

impl<N: Abt> Default for InterningSet<N> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            buckets: HashMap::new(),
        }
    }
}

impl<N: Abt> InterningSet<N> {
    pub fn new() -> Self {
        Self::default()
    }

    fn fingerprint(node: &N) -> u64 {
        let mut hasher = DefaultHasher::new();
        node.hash(&mut hasher);
        hasher.finish()
    }

    /// Looks up `node` by structural equality. Returns `(index, true)` on a
    /// match, `(NOT_FOUND, false)` otherwise.
    pub fn find(&self, node: &N) -> (usize, bool) {
        if let Some(bucket) = self.buckets.get(&Self::fingerprint(node)) {
            for &idx in bucket {
                if &self.nodes[idx] == node {
                    return (idx, true);
                }
            }
        }
        (NOT_FOUND, false)
    }

    /// Inserts `node` at the back unless an equal node already exists, in
    /// which case the argument is discarded and the existing index is
    /// returned with `inserted = false`.
    pub fn emplace_back(&mut self, node: N) -> (usize, bool) {
        let (idx, found) = self.find(&node);
        if found {
            return (idx, false);
        }
        let idx = self.nodes.len();
        let fp = Self::fingerprint(&node);
        self.nodes.push(node);
        self.buckets.entry(fp).or_default().push(idx);
        (idx, true)
    }

    /// Appends `node` unconditionally, never checking for a structural
    /// match. Used by forced-distinct insertion (`addExistingNodeWithNewChild`).
    pub fn push_forced(&mut self, node: N) -> usize {
        let idx = self.nodes.len();
        let fp = Self::fingerprint(&node);
        self.nodes.push(node);
        self.buckets.entry(fp).or_default().push(idx);
        idx
    }

    pub fn at(&self, index: usize) -> &N {
        &self.nodes[index]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &N> {
        self.nodes.iter()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.buckets.clear();
    }
}
