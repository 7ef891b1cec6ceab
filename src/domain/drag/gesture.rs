//! Drag gesture state, independent of input modality.
//!
//! A pointer press only becomes a drag once it moves past a threshold, so
//! a plain click on a row never reorders anything.

use crate::domain::foundation::EntityId;

/// Phase of the current drag gesture.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    /// Pointer is down on a row but has not moved far enough yet.
    Pressed {
        id: EntityId,
        start_index: usize,
        origin: (i32, i32),
    },
    /// Row is being dragged; `over` is the sibling index under the pointer.
    Dragging {
        id: EntityId,
        start_index: usize,
        over: Option<usize>,
    },
}

/// How a gesture ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureEnd {
    /// Dropped over a sibling: move `id` from `from` to `to`.
    Drop { id: EntityId, from: usize, to: usize },
    /// Dropped outside the list or cancelled.
    Discarded { id: EntityId },
    /// Pressed and released without moving: a click, not a drag.
    Click { id: EntityId },
    /// Nothing was in progress.
    Idle,
}

#[derive(Debug, Clone, Default)]
pub struct DragGesture {
    phase: DragPhase,
}

impl DragGesture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &DragPhase {
        &self.phase
    }

    /// Records a pointer press on the row at `index`.
    pub fn press(&mut self, id: EntityId, index: usize, x: i32, y: i32) {
        self.phase = DragPhase::Pressed {
            id,
            start_index: index,
            origin: (x, y),
        };
    }

    /// Promotes a press to a drag once the pointer moved more than
    /// `threshold` pixels on either axis. Returns true when the drag starts.
    pub fn pointer_moved(&mut self, x: i32, y: i32, threshold: i32) -> bool {
        let promoted = match &self.phase {
            DragPhase::Pressed {
                id,
                start_index,
                origin,
            } if (x - origin.0).abs() > threshold || (y - origin.1).abs() > threshold => {
                Some(DragPhase::Dragging {
                    id: id.clone(),
                    start_index: *start_index,
                    over: Some(*start_index),
                })
            }
            _ => None,
        };
        match promoted {
            Some(next) => {
                self.phase = next;
                true
            }
            None => false,
        }
    }

    /// Starts a drag immediately (keyboard pick-up or an input layer that
    /// already applied its own threshold).
    pub fn start(&mut self, id: EntityId, index: usize) {
        self.phase = DragPhase::Dragging {
            id,
            start_index: index,
            over: Some(index),
        };
    }

    /// Updates the hovered sibling. Ignored unless dragging.
    pub fn hover(&mut self, index: Option<usize>) {
        if let DragPhase::Dragging { over, .. } = &mut self.phase {
            *over = index;
        }
    }

    /// Ends the gesture at the current hover position.
    pub fn release(&mut self) -> GestureEnd {
        match std::mem::take(&mut self.phase) {
            DragPhase::Idle => GestureEnd::Idle,
            DragPhase::Pressed { id, .. } => GestureEnd::Click { id },
            DragPhase::Dragging {
                id,
                start_index,
                over: Some(to),
            } => GestureEnd::Drop {
                id,
                from: start_index,
                to,
            },
            DragPhase::Dragging { id, over: None, .. } => GestureEnd::Discarded { id },
        }
    }

    /// Abandons the gesture (Escape).
    pub fn cancel(&mut self) -> GestureEnd {
        match std::mem::take(&mut self.phase) {
            DragPhase::Idle => GestureEnd::Idle,
            DragPhase::Pressed { id, .. } | DragPhase::Dragging { id, .. } => {
                GestureEnd::Discarded { id }
            }
        }
    }

    pub fn dragging_id(&self) -> Option<&EntityId> {
        match &self.phase {
            DragPhase::Dragging { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging { .. })
    }
}

/// Live visual order while dragging: the dragged row shown at `over`.
pub fn preview_order(ids: &[EntityId], from: usize, over: usize) -> Vec<EntityId> {
    let mut preview = ids.to_vec();
    if from < preview.len() {
        let moved = preview.remove(from);
        let to = over.min(preview.len());
        preview.insert(to, moved);
    }
    preview
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> EntityId {
        EntityId::new(name).unwrap()
    }

    #[test]
    fn small_movement_stays_a_click() {
        let mut g = DragGesture::new();
        g.press(id("a"), 0, 100, 100);
        assert!(!g.pointer_moved(103, 104, 5));
        assert_eq!(g.release(), GestureEnd::Click { id: id("a") });
    }

    #[test]
    fn movement_past_threshold_starts_drag() {
        let mut g = DragGesture::new();
        g.press(id("a"), 1, 0, 0);
        assert!(g.pointer_moved(0, 6, 5));
        assert!(g.is_dragging());
        assert_eq!(g.dragging_id(), Some(&id("a")));
    }

    #[test]
    fn release_over_sibling_produces_drop() {
        let mut g = DragGesture::new();
        g.start(id("a"), 0);
        g.hover(Some(2));
        assert_eq!(
            g.release(),
            GestureEnd::Drop {
                id: id("a"),
                from: 0,
                to: 2
            }
        );
        assert_eq!(g.phase(), &DragPhase::Idle);
    }

    #[test]
    fn release_outside_list_is_discarded() {
        let mut g = DragGesture::new();
        g.start(id("a"), 0);
        g.hover(None);
        assert_eq!(g.release(), GestureEnd::Discarded { id: id("a") });
    }

    #[test]
    fn cancel_discards_and_resets() {
        let mut g = DragGesture::new();
        g.start(id("a"), 0);
        g.hover(Some(1));
        assert_eq!(g.cancel(), GestureEnd::Discarded { id: id("a") });
        assert_eq!(g.release(), GestureEnd::Idle);
    }

    #[test]
    fn hover_is_ignored_when_not_dragging() {
        let mut g = DragGesture::new();
        g.hover(Some(3));
        assert_eq!(g.phase(), &DragPhase::Idle);
    }

    #[test]
    fn preview_moves_dragged_row() {
        let ids = vec![id("a"), id("b"), id("c")];
        assert_eq!(preview_order(&ids, 0, 2), vec![id("b"), id("c"), id("a")]);
        assert_eq!(preview_order(&ids, 2, 0), vec![id("c"), id("a"), id("b")]);
        assert_eq!(preview_order(&ids, 1, 9), vec![id("a"), id("c"), id("b")]);
    }
}
