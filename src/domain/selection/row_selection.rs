//! Row selection against the visible set of a table.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::domain::foundation::EntityId;

/// Aggregate checkbox state of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectionState {
    #[default]
    Empty,
    Partial,
    All,
}

impl fmt::Display for SelectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SelectionState::Empty => "Empty",
            SelectionState::Partial => "Partial",
            SelectionState::All => "All",
        };
        write!(f, "{}", s)
    }
}

/// Selected ids, always a subset of the visible ids.
///
/// # Invariants
///
/// - every selected id is in `visible`
/// - changing `visible` evicts ids that left it and never adds new ones
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    visible: Vec<EntityId>,
    selected: BTreeSet<EntityId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the visible set, evicting selected ids that are no longer
    /// shown. Returns the evicted ids.
    pub fn set_visible(&mut self, visible: Vec<EntityId>) -> Vec<EntityId> {
        let evicted: Vec<EntityId> = self
            .selected
            .iter()
            .filter(|id| !visible.contains(id))
            .cloned()
            .collect();
        for id in &evicted {
            self.selected.remove(id);
        }
        self.visible = visible;
        evicted
    }

    /// Flips membership of `id`. Returns false (and does nothing) if the
    /// id is not visible.
    pub fn toggle(&mut self, id: &EntityId) -> bool {
        if !self.visible.contains(id) {
            return false;
        }
        if !self.selected.remove(id) {
            self.selected.insert(id.clone());
        }
        true
    }

    /// `All` → `Empty`; anything else → `All` (every visible row).
    pub fn toggle_all(&mut self) {
        if self.state() == SelectionState::All {
            self.selected.clear();
        } else {
            self.selected = self.visible.iter().cloned().collect();
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn state(&self) -> SelectionState {
        if self.selected.is_empty() {
            SelectionState::Empty
        } else if self.selected.len() == self.visible.len() {
            SelectionState::All
        } else {
            SelectionState::Partial
        }
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.selected.contains(id)
    }

    /// Selected ids in display order.
    pub fn ids(&self) -> Vec<EntityId> {
        self.visible
            .iter()
            .filter(|id| self.selected.contains(*id))
            .cloned()
            .collect()
    }

    pub fn visible(&self) -> &[EntityId] {
        &self.visible
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<EntityId> {
        names.iter().map(|n| EntityId::new(*n).unwrap()).collect()
    }

    fn id(name: &str) -> EntityId {
        EntityId::new(name).unwrap()
    }

    fn selection(visible: &[&str]) -> Selection {
        let mut s = Selection::new();
        s.set_visible(ids(visible));
        s
    }

    #[test]
    fn toggling_rows_walks_through_states() {
        let mut s = selection(&["a", "b"]);
        assert_eq!(s.state(), SelectionState::Empty);

        assert!(s.toggle(&id("a")));
        assert_eq!(s.state(), SelectionState::Partial);

        assert!(s.toggle(&id("b")));
        assert_eq!(s.state(), SelectionState::All);

        assert!(s.toggle(&id("a")));
        assert_eq!(s.state(), SelectionState::Partial);
    }

    #[test]
    fn toggling_invisible_row_is_a_no_op() {
        let mut s = selection(&["a"]);
        assert!(!s.toggle(&id("zz")));
        assert!(s.is_empty());
    }

    #[test]
    fn toggle_all_from_partial_selects_every_visible_row() {
        let mut s = selection(&["a", "b", "c"]);
        s.toggle(&id("b"));
        s.toggle_all();
        assert_eq!(s.state(), SelectionState::All);
        assert_eq!(s.ids(), ids(&["a", "b", "c"]));
    }

    #[test]
    fn toggle_all_twice_restores_empty_and_all() {
        let mut empty = selection(&["a", "b"]);
        empty.toggle_all();
        empty.toggle_all();
        assert!(empty.is_empty());

        let mut all = selection(&["a", "b"]);
        all.toggle_all();
        let before = all.clone();
        all.toggle_all();
        all.toggle_all();
        assert_eq!(all, before);
    }

    #[test]
    fn changing_visible_set_evicts_and_never_adds() {
        let mut s = selection(&["a", "b", "c"]);
        s.toggle(&id("a"));
        s.toggle(&id("c"));

        let evicted = s.set_visible(ids(&["c", "d"]));
        assert_eq!(evicted, ids(&["a"]));
        assert_eq!(s.ids(), ids(&["c"]));
        assert!(!s.contains(&id("d")));
    }

    #[test]
    fn empty_visible_set_is_never_all() {
        let mut s = selection(&[]);
        s.toggle_all();
        assert_eq!(s.state(), SelectionState::Empty);
    }

    #[test]
    fn ids_follow_display_order() {
        let mut s = selection(&["c", "a", "b"]);
        s.toggle(&id("b"));
        s.toggle(&id("c"));
        assert_eq!(s.ids(), ids(&["c", "b"]));
    }
}
