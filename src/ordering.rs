//! Sibling ordering.
//!
//! Checklists are ordered per user and tasks per checklist through a plain integer
//! `order` field. New entities are appended after the current maximum; an explicit
//! reorder rewrites the orders of the submitted ids to their list positions.
//! Nothing here provides isolation: two concurrent appends may pick the same value,
//! which only affects display order.

use std::cmp::Ordering;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{Checklist, Task};

/// Order value for an entity appended after siblings whose highest order is `current_max`.
pub fn next_order(current_max: Option<i32>) -> i32 {
    match current_max {
        Some(max) => max.saturating_add(1),
        None => 0,
    }
}

/// Maps each submitted id to its position in the list.
///
/// A repeated id keeps its last position, the same result as applying the
/// updates one after another. The output is ordered by first appearance.
pub fn positions(ids: &[Uuid]) -> Vec<(Uuid, i32)> {
    let mut index: HashMap<Uuid, usize> = HashMap::with_capacity(ids.len());
    let mut out: Vec<(Uuid, i32)> = Vec::with_capacity(ids.len());

    for (position, id) in ids.iter().enumerate() {
        let position = i32::try_from(position).unwrap_or(i32::MAX);
        match index.get(id) {
            Some(&slot) => out[slot].1 = position,
            None => {
                index.insert(*id, out.len());
                out.push((*id, position));
            }
        }
    }

    out
}

/// Display order for a user's checklists: `order` ascending, oldest first on ties.
pub fn compare_checklists(a: &Checklist, b: &Checklist) -> Ordering {
    a.order
        .cmp(&b.order)
        .then_with(|| a.created_at.cmp(&b.created_at))
}

/// Display order for a checklist's tasks: pinned first, then `order` ascending,
/// newest first on ties.
pub fn compare_tasks(a: &Task, b: &Task) -> Ordering {
    b.pinned
        .cmp(&a.pinned)
        .then_with(|| a.order.cmp(&b.order))
        .then_with(|| b.created_at.cmp(&a.created_at))
}

/// Display order for the pinned-task listing: newest first.
pub fn compare_pinned(a: &Task, b: &Task) -> Ordering {
    b.created_at.cmp(&a.created_at)
}
