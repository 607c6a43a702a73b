#![forbid(unsafe_code)]

use crate::document::Document;
use crate::ids::BranchTag;
use crate::model::{BranchScope, EntityKind, Priority};
use std::cmp::Ordering;

pub fn retain_branch(docs: &mut Vec<Document>, branch: &BranchTag) {
    docs.retain(|doc| doc.branch() == Some(branch.as_str()));
}

/// Priority rank ascending (unknown last), then newest first.
pub fn compare_tasks(a: &Document, b: &Document) -> Ordering {
    let rank_a = Priority::rank_of(a.str_field("priority"));
    let rank_b = Priority::rank_of(b.str_field("priority"));
    rank_a
        .cmp(&rank_b)
        .then_with(|| b.created_at_ms().cmp(&a.created_at_ms()))
}

/// Applies the branch filter and ordering policy of `kind` to a raw
/// subscription snapshot (already newest-first).
pub fn arrange(
    kind: EntityKind,
    scope: BranchScope,
    branch: &BranchTag,
    mut docs: Vec<Document>,
) -> Vec<Document> {
    if scope == BranchScope::Filtered {
        retain_branch(&mut docs, branch);
    }
    if kind == EntityKind::Task {
        docs.sort_by(compare_tasks);
    }
    docs
}
