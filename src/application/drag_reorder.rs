//! DragReorderController - turns drag gestures and move buttons into
//! `reorder` calls on the Store.
//!
//! While a drag is in progress only the preview changes; the Store is
//! touched once, on drop. Failures are surfaced as a notification and
//! returned; nothing is retried.

use std::sync::Arc;

use crate::application::OrderedCollectionStore;
use crate::domain::collection::CollectionError;
use crate::domain::drag::{preview_order, DragGesture, DragPhase, GestureEnd};
use crate::domain::foundation::{EntityId, ValidationError};
use crate::ports::{Notification, Notifier};

/// What a drop (or a move button) did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Moved { from: usize, to: usize },
    /// Dropped on its own slot, pressed without dragging, or at a boundary.
    Unchanged,
    /// Released outside the list or cancelled.
    Discarded,
}

pub struct DragReorderController {
    store: OrderedCollectionStore,
    notifier: Arc<dyn Notifier>,
    gesture: DragGesture,
    threshold_px: i32,
}

impl DragReorderController {
    pub fn new(
        store: OrderedCollectionStore,
        notifier: Arc<dyn Notifier>,
        threshold_px: u32,
    ) -> Self {
        Self {
            store,
            notifier,
            gesture: DragGesture::new(),
            threshold_px: i32::try_from(threshold_px).unwrap_or(i32::MAX),
        }
    }

    pub fn store(&self) -> &OrderedCollectionStore {
        &self.store
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture.is_dragging()
    }

    pub fn dragging_id(&self) -> Option<&EntityId> {
        self.gesture.dragging_id()
    }

    /// Starts a drag of `id` right away.
    ///
    /// # Errors
    ///
    /// - `Validation` if `id` is not in the list
    pub fn begin_drag(&mut self, id: &EntityId) -> Result<(), CollectionError> {
        let index = self.require_index(id)?;
        self.gesture.start(id.clone(), index);
        tracing::debug!(entity_id = %id, index, "Drag started");
        Ok(())
    }

    /// Records a pointer press; the drag starts once the pointer moves
    /// past the configured threshold.
    pub fn press(&mut self, id: &EntityId, x: i32, y: i32) -> Result<(), CollectionError> {
        let index = self.require_index(id)?;
        self.gesture.press(id.clone(), index, x, y);
        Ok(())
    }

    /// Returns true when this move turned a press into a drag.
    pub fn pointer_moved(&mut self, x: i32, y: i32) -> bool {
        let started = self.gesture.pointer_moved(x, y, self.threshold_px);
        if let (true, Some(id)) = (started, self.gesture.dragging_id()) {
            tracing::debug!(entity_id = %id, "Drag started after threshold");
        }
        started
    }

    /// Updates the sibling under the pointer. `None` (or an id outside the
    /// list) means there is no valid drop target.
    pub fn drag_over(&mut self, target: Option<&EntityId>) {
        let index = target.and_then(|id| self.store.index_of(id));
        self.gesture.hover(index);
    }

    /// Ids in the order the list should currently be drawn.
    pub fn preview(&self) -> Vec<EntityId> {
        let ids = self.store.ids();
        match self.gesture.phase() {
            DragPhase::Dragging {
                start_index,
                over: Some(over),
                ..
            } => preview_order(&ids, *start_index, *over),
            _ => ids,
        }
    }

    /// Ends the drag and commits the move, if any.
    ///
    /// # Errors
    ///
    /// Whatever `reorder` returned; the Store has already rolled back and
    /// an error notification naming the entity has been sent.
    pub async fn drop(&mut self) -> Result<DropOutcome, CollectionError> {
        match self.gesture.release() {
            GestureEnd::Drop { id, to, .. } => self.commit(&id, to).await,
            GestureEnd::Discarded { id } => {
                tracing::debug!(entity_id = %id, "Drag discarded");
                Ok(DropOutcome::Discarded)
            }
            GestureEnd::Click { .. } | GestureEnd::Idle => Ok(DropOutcome::Unchanged),
        }
    }

    /// Abandons the drag without touching the Store.
    pub fn cancel(&mut self) -> DropOutcome {
        match self.gesture.cancel() {
            GestureEnd::Idle => DropOutcome::Unchanged,
            _ => DropOutcome::Discarded,
        }
    }

    /// Moves `id` one slot towards the top. No-op on the first row.
    pub async fn move_up(&mut self, id: &EntityId) -> Result<DropOutcome, CollectionError> {
        let index = self.store.index_of(id).ok_or_else(|| CollectionError::not_found(id.clone()))?;
        if index == 0 {
            return Ok(DropOutcome::Unchanged);
        }
        self.commit(id, index - 1).await
    }

    /// Moves `id` one slot towards the bottom. No-op on the last row.
    pub async fn move_down(&mut self, id: &EntityId) -> Result<DropOutcome, CollectionError> {
        let index = self.store.index_of(id).ok_or_else(|| CollectionError::not_found(id.clone()))?;
        if index + 1 >= self.store.len() {
            return Ok(DropOutcome::Unchanged);
        }
        self.commit(id, index + 1).await
    }

    async fn commit(&self, id: &EntityId, to: usize) -> Result<DropOutcome, CollectionError> {
        let label = self
            .store
            .get(id)
            .map(|e| e.label())
            .unwrap_or_else(|| id.to_string());

        match self.store.reorder(id, to).await {
            Ok(outcome) if outcome.changed == 0 => Ok(DropOutcome::Unchanged),
            Ok(outcome) => Ok(DropOutcome::Moved {
                from: outcome.from,
                to: outcome.to,
            }),
            Err(err) => {
                tracing::warn!(entity_id = %id, error = %err, "Reorder rejected");
                self.notifier.notify(
                    Notification::error(format!("Could not move \"{}\": {}", label, err.message()))
                        .with_entities(vec![id.clone()]),
                );
                Err(err)
            }
        }
    }

    fn require_index(&self, id: &EntityId) -> Result<usize, CollectionError> {
        self.store.index_of(id).ok_or_else(|| {
            ValidationError::invalid_format("id", format!("{} is not part of this list", id)).into()
        })
    }
}
