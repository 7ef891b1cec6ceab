//! Pure ordering algorithms over a sibling set.
//!
//! All functions take siblings in canonical order (see [`canonical_sort`])
//! and return the order changes they imply. Applying a plan and later
//! reverting it restores the exact previous order values.

use std::cmp::Ordering;

use super::{Entity, OrderAssignment};
use crate::domain::foundation::EntityId;

/// One entity's order value before and after a planned change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderChange {
    pub id: EntityId,
    pub from: i32,
    pub to: i32,
}

impl OrderChange {
    pub fn assignment(&self) -> OrderAssignment {
        OrderAssignment {
            id: self.id.clone(),
            order: self.to,
        }
    }
}

/// Sorts by order, then creation time, then id.
///
/// The secondary keys make the result repeatable even when the stored
/// order values collide.
pub fn canonical_sort(entities: &mut [Entity]) {
    entities.sort_by(canonical_cmp);
}

fn canonical_cmp(a: &Entity, b: &Entity) -> Ordering {
    a.order()
        .cmp(&b.order())
        .then_with(|| a.created_at().cmp(b.created_at()))
        .then_with(|| a.id().cmp(b.id()))
}

/// Clamps a requested target index into `[0, len - 1]`.
pub fn clamp_index(index: usize, len: usize) -> usize {
    index.min(len.saturating_sub(1))
}

/// Returns true if the siblings' orders are exactly `base, base+1, ...`.
pub fn is_dense(entities: &[Entity], base: i32) -> bool {
    entities
        .iter()
        .enumerate()
        .all(|(i, e)| e.order() == base + i as i32)
}

/// Plans moving the entity at `from` to `to` as a single-slot rotation.
///
/// The moved entity takes position `to`; entities between the two
/// positions shift by one towards the gap; everything else keeps its
/// order. When the input is dense only the rotated range changes.
pub fn plan_move(entities: &[Entity], from: usize, to: usize, base: i32) -> Vec<OrderChange> {
    if entities.is_empty() || from >= entities.len() {
        return Vec::new();
    }
    let to = clamp_index(to, entities.len());
    if from == to {
        return Vec::new();
    }

    let mut positions: Vec<&Entity> = entities.iter().collect();
    let moved = positions.remove(from);
    positions.insert(to, moved);

    diff_against_positions(&positions, base)
}

/// Plans renumbering the siblings densely from `base` in their current
/// sequence.
pub fn plan_compaction(entities: &[Entity], base: i32) -> Vec<OrderChange> {
    let positions: Vec<&Entity> = entities.iter().collect();
    diff_against_positions(&positions, base)
}

fn diff_against_positions(positions: &[&Entity], base: i32) -> Vec<OrderChange> {
    positions
        .iter()
        .enumerate()
        .filter_map(|(index, entity)| {
            let target = base + index as i32;
            (entity.order() != target).then(|| OrderChange {
                id: entity.id().clone(),
                from: entity.order(),
                to: target,
            })
        })
        .collect()
}

/// Applies the `to` side of each change and re-sorts.
pub fn apply_changes(entities: &mut [Entity], changes: &[OrderChange]) {
    for change in changes {
        if let Some(entity) = entities.iter_mut().find(|e| e.id() == &change.id) {
            entity.set_order(change.to);
        }
    }
    canonical_sort(entities);
}

/// Restores the `from` side of each change and re-sorts.
///
/// Entities no longer present are skipped, so reverting one batch never
/// touches siblings outside it.
pub fn revert_changes(entities: &mut [Entity], changes: &[OrderChange]) {
    for change in changes {
        if let Some(entity) = entities.iter_mut().find(|e| e.id() == &change.id) {
            entity.set_order(change.from);
        }
    }
    canonical_sort(entities);
}

/// Order assignments to persist for a plan.
pub fn assignments(changes: &[OrderChange]) -> Vec<OrderAssignment> {
    changes.iter().map(OrderChange::assignment).collect()
}
