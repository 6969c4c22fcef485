// Copyright (c) 2023-2024 CMU Database Group
//
// Use of this source code is governed by an MIT-style license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The memo's one recoverable error channel.
//!
//! Everything else — projection mismatch, a cycle, a missing `GroupId`, a
//! lowered cost limit, insertion into a cleared group without re-seeding —
//! is a programmer error and is reported by `panic!`/`assert!`, never by
//! `Result`. See `spec.md` §7 and `SPEC_FULL.md` §7 for the classification.

use thiserror::Error;

use crate::ids::GroupId;

#[derive(Debug, Error)]
pub enum MemoError {
    /// The external `LogicalPropsInterface` signaled it could not derive
    /// properties for a node being inserted into a brand-new, still-empty
    /// group. The insertion is rolled back: the group is discarded and no
    /// node is recorded. (If this happens while inserting into an existing,
    /// non-empty group instead, it is fatal to the current integration and
    /// is reported as a panic, not this variant — see `spec.md` §7.)
    #[error("failed to derive logical properties for new group: {reason}")]
    PropertyDerivation { reason: String },
}

/// Convenience used when a derivation failure must instead be escalated to
/// a fatal error (inserting into an existing, non-empty group).
pub(crate) fn fatal_property_derivation(group_id: GroupId, err: &MemoError) -> ! {
    panic!(
        "property derivation failed while inserting into existing group {}: {}",
        group_id, err
    )
}
