//! OrderedCollectionStore - authoritative in-memory copy of one scope.
//!
//! Every mutation is applied locally first and then persisted through the
//! injected [`CollectionGateway`]. A failed write rolls back exactly the
//! entity or order batch it touched; other in-flight operations are left
//! alone. The Store is owned by the admin page that loaded it and is
//! closed when that page goes away.

use futures::future::join_all;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::collection::ordering::{
    apply_changes, assignments, canonical_sort, clamp_index, is_dense, plan_compaction,
    plan_move, revert_changes,
};
use crate::domain::collection::{
    validate_new_payload, CollectionError, Entity, NewEntity, Payload, PayloadPatch, Scope,
};
use crate::domain::foundation::{EntityId, PublicationStatus, Timestamp};
use crate::ports::CollectionGateway;

/// Result of a successful `remove`.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveOutcome {
    pub removed: Entity,
    /// Siblings whose order was decremented to close the gap.
    pub renumbered: usize,
    /// The delete succeeded but persisting the renumbering did not; the
    /// remote order has a gap until `compact` succeeds.
    pub order_repair_pending: bool,
}

/// Result of a successful `reorder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderOutcome {
    pub from: usize,
    pub to: usize,
    /// Entities whose order value changed (0 for a no-op move).
    pub changed: usize,
}

/// One id that a bulk mutation could not apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkFailure {
    pub id: EntityId,
    pub error: CollectionError,
}

/// Aggregated per-id results of a bulk mutation.
///
/// Bulk mutations are best-effort: succeeded ids stay applied even when
/// others fail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkReport {
    pub succeeded: Vec<EntityId>,
    pub failed: Vec<BulkFailure>,
}

impl BulkReport {
    pub fn succeeded_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_ids(&self) -> Vec<EntityId> {
        self.failed.iter().map(|f| f.id.clone()).collect()
    }

    fn record(&mut self, id: EntityId, result: Result<(), CollectionError>) {
        match result {
            Ok(()) => self.succeeded.push(id),
            Err(error) => self.failed.push(BulkFailure { id, error }),
        }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    entities: Vec<Entity>,
    loaded: bool,
    needs_compaction: bool,
}

/// Ordered collection Store for one scope.
///
/// Cloning yields another handle to the same Store (used by live-refresh
/// listeners); closing any handle closes them all.
#[derive(Clone)]
pub struct OrderedCollectionStore {
    gateway: Arc<dyn CollectionGateway>,
    scope: Scope,
    state: Arc<Mutex<StoreState>>,
    live: Arc<AtomicBool>,
}

impl OrderedCollectionStore {
    pub fn new(gateway: Arc<dyn CollectionGateway>, scope: Scope) -> Self {
        Self {
            gateway,
            scope,
            state: Arc::new(Mutex::new(StoreState::default())),
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Snapshot of the entities in collection order.
    pub fn entities(&self) -> Vec<Entity> {
        self.state().entities.clone()
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.state().entities.iter().map(|e| e.id().clone()).collect()
    }

    pub fn get(&self, id: &EntityId) -> Option<Entity> {
        self.state().entities.iter().find(|e| e.id() == id).cloned()
    }

    pub fn index_of(&self, id: &EntityId) -> Option<usize> {
        self.state().entities.iter().position(|e| e.id() == id)
    }

    pub fn len(&self) -> usize {
        self.state().entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().entities.is_empty()
    }

    pub fn is_loaded(&self) -> bool {
        self.state().loaded
    }

    /// True when the local or remote order is known to have gaps.
    pub fn needs_compaction(&self) -> bool {
        self.state().needs_compaction
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Tears the Store down. Operations still in flight finish remotely,
    /// leave local state alone and return `Detached`.
    pub fn close(&self) {
        if self.live.swap(false, Ordering::SeqCst) {
            tracing::debug!(scope = %self.scope, "Collection store closed");
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Fetches the scope and replaces local state.
    ///
    /// # Errors
    ///
    /// - `Load` if the gateway fails or returns rows of another scope
    /// - `Detached` if the Store is closed
    pub async fn load(&self) -> Result<Vec<Entity>, CollectionError> {
        self.ensure_live()?;
        let fetched = self.gateway.fetch_ordered(&self.scope).await;
        self.ensure_live()?;
        let mut rows = fetched.map_err(|e| CollectionError::load(e.to_string()))?;

        if let Some(stray) = rows
            .iter()
            .find(|e| !self.scope.contains_parent(e.parent_id()))
        {
            return Err(CollectionError::load(format!(
                "row {} does not belong to scope {}",
                stray.id(),
                self.scope
            )));
        }

        canonical_sort(&mut rows);
        let dense = is_dense(&rows, self.scope.base_index());
        if !dense {
            tracing::warn!(scope = %self.scope, "Loaded collection has non-dense order values");
        }

        {
            let mut state = self.state();
            state.entities = rows.clone();
            state.loaded = true;
            state.needs_compaction = !dense;
        }
        tracing::debug!(scope = %self.scope, count = rows.len(), "Collection loaded");
        Ok(rows)
    }

    /// Re-fetches the scope, discarding the returned rows.
    pub async fn reload(&self) -> Result<(), CollectionError> {
        self.load().await.map(|_| ())
    }

    /// Creates an entity at the end of the scope.
    ///
    /// Nothing is shown locally until the gateway confirms the insert.
    ///
    /// # Errors
    ///
    /// - `Validation` if required fields are missing (nothing is sent)
    /// - `Load` if the scope has not been loaded yet
    /// - `Persist` if the gateway rejects the row
    pub async fn append(&self, payload: Payload) -> Result<Entity, CollectionError> {
        self.ensure_live()?;
        let kind = self.scope.collection;
        validate_new_payload(kind, &payload)?;

        let order = {
            let state = self.state();
            if !state.loaded {
                return Err(CollectionError::load("collection has not been loaded"));
            }
            self.scope.base_index() + state.entities.len() as i32
        };
        let new_entity = NewEntity {
            order,
            parent_id: self.scope.parent.clone(),
            payload,
            status: kind.has_status().then_some(PublicationStatus::Draft),
            created_at: Timestamp::now(),
        };

        let inserted = self.gateway.insert(&self.scope, &new_entity).await;
        self.ensure_live()?;
        let id = inserted.map_err(|e| CollectionError::from_write(e, Vec::new()))?;

        let entity = Entity::reconstitute(
            id,
            new_entity.order,
            new_entity.parent_id,
            new_entity.payload,
            new_entity.status,
            new_entity.created_at,
        );

        {
            let mut state = self.state();
            // A reload during the insert may already have picked the row up.
            if !state.entities.iter().any(|e| e.id() == entity.id()) {
                state.entities.push(entity.clone());
                canonical_sort(&mut state.entities);
            }
            if !is_dense(&state.entities, self.scope.base_index()) {
                state.needs_compaction = true;
            }
        }
        tracing::debug!(scope = %self.scope, entity_id = %entity.id(), order, "Entity appended");
        Ok(entity)
    }

    /// Deletes an entity and closes the gap it leaves.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the id is not in the loaded scope
    /// - `Persist` if the remote delete fails (local state is restored)
    pub async fn remove(&self, id: &EntityId) -> Result<RemoveOutcome, CollectionError> {
        self.ensure_live()?;
        let base = self.scope.base_index();

        let (removed, plan) = {
            let mut state = self.state();
            let index = state
                .entities
                .iter()
                .position(|e| e.id() == id)
                .ok_or_else(|| CollectionError::not_found(id.clone()))?;
            let removed = state.entities.remove(index);
            let plan = plan_compaction(&state.entities, base);
            apply_changes(&mut state.entities, &plan);
            (removed, plan)
        };

        let deleted = self.gateway.delete_by_id(&self.scope, id).await;
        self.ensure_live()?;
        if let Err(e) = deleted {
            {
                let mut state = self.state();
                // A reload while the delete was in flight already restored the row.
                if !state.entities.iter().any(|entity| entity.id() == id) {
                    state.entities.push(removed);
                }
                revert_changes(&mut state.entities, &plan);
            }
            tracing::warn!(scope = %self.scope, entity_id = %id, error = %e, "Delete failed, rolled back");
            return Err(CollectionError::from_write(e, vec![id.clone()]));
        }

        let mut order_repair_pending = false;
        if !plan.is_empty() {
            let renumbered = self
                .gateway
                .update_order_batch(&self.scope, &assignments(&plan))
                .await;
            self.ensure_live()?;
            if let Err(e) = renumbered {
                tracing::warn!(
                    scope = %self.scope,
                    entity_id = %id,
                    error = %e,
                    "Entity deleted but sibling renumbering failed"
                );
                order_repair_pending = true;
                self.state().needs_compaction = true;
            }
        }

        tracing::debug!(scope = %self.scope, entity_id = %id, renumbered = plan.len(), "Entity removed");
        Ok(RemoveOutcome {
            removed,
            renumbered: plan.len(),
            order_repair_pending,
        })
    }

    /// Moves an entity to `new_index` (clamped into range).
    ///
    /// Every sibling between the old and new position shifts by one; the
    /// whole batch is rolled back if persisting it fails.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the id is not in the loaded scope
    /// - `Persist` if the order batch is rejected (local state is restored)
    pub async fn reorder(
        &self,
        id: &EntityId,
        new_index: usize,
    ) -> Result<ReorderOutcome, CollectionError> {
        self.ensure_live()?;
        let base = self.scope.base_index();

        let (from, to, plan) = {
            let mut state = self.state();
            let from = state
                .entities
                .iter()
                .position(|e| e.id() == id)
                .ok_or_else(|| CollectionError::not_found(id.clone()))?;
            let to = clamp_index(new_index, state.entities.len());
            if from == to {
                return Ok(ReorderOutcome {
                    from,
                    to,
                    changed: 0,
                });
            }
            let plan = plan_move(&state.entities, from, to, base);
            apply_changes(&mut state.entities, &plan);
            (from, to, plan)
        };

        tracing::debug!(scope = %self.scope, entity_id = %id, from, to, "Reordering entity");

        let persisted = self
            .gateway
            .update_order_batch(&self.scope, &assignments(&plan))
            .await;
        self.ensure_live()?;
        if let Err(e) = persisted {
            revert_changes(&mut self.state().entities, &plan);
            tracing::warn!(scope = %self.scope, entity_id = %id, error = %e, "Reorder failed, rolled back");
            let affected = plan.iter().map(|c| c.id.clone()).collect();
            return Err(CollectionError::from_write(e, affected));
        }

        Ok(ReorderOutcome {
            from,
            to,
            changed: plan.len(),
        })
    }

    /// Merges `patch` into an entity's payload/status.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the id is not in the loaded scope
    /// - `Validation` if the patch breaks collection rules (nothing is sent)
    /// - `Persist` if the gateway rejects it (prior content is restored)
    pub async fn update(&self, id: &EntityId, patch: PayloadPatch) -> Result<Entity, CollectionError> {
        self.ensure_live()?;
        let kind = self.scope.collection;

        let (previous_payload, previous_status, updated) = {
            let mut state = self.state();
            let entity = state
                .entities
                .iter_mut()
                .find(|e| e.id() == id)
                .ok_or_else(|| CollectionError::not_found(id.clone()))?;
            patch.validate_for(kind, entity)?;
            let previous = (entity.payload().clone(), entity.status());
            entity.apply_patch(&patch);
            (previous.0, previous.1, entity.clone())
        };

        let persisted = self.gateway.update_fields(&self.scope, id, &patch).await;
        self.ensure_live()?;
        if let Err(e) = persisted {
            if let Some(entity) = self.state().entities.iter_mut().find(|e| e.id() == id) {
                entity.restore_content(previous_payload, previous_status);
            }
            tracing::warn!(scope = %self.scope, entity_id = %id, error = %e, "Update failed, rolled back");
            return Err(CollectionError::from_write(e, vec![id.clone()]));
        }

        tracing::debug!(scope = %self.scope, entity_id = %id, "Entity updated");
        Ok(updated)
    }

    /// Renumbers the scope densely and persists the result.
    ///
    /// Returns the number of entities whose order changed.
    ///
    /// # Errors
    ///
    /// - `Persist` if the batch is rejected (local state is restored)
    pub async fn compact(&self) -> Result<usize, CollectionError> {
        self.ensure_live()?;
        let plan = {
            let mut state = self.state();
            let plan = plan_compaction(&state.entities, self.scope.base_index());
            apply_changes(&mut state.entities, &plan);
            plan
        };

        if !plan.is_empty() {
            let persisted = self
                .gateway
                .update_order_batch(&self.scope, &assignments(&plan))
                .await;
            self.ensure_live()?;
            if let Err(e) = persisted {
                revert_changes(&mut self.state().entities, &plan);
                let affected = plan.iter().map(|c| c.id.clone()).collect();
                return Err(CollectionError::from_write(e, affected));
            }
        }

        self.state().needs_compaction = false;
        tracing::debug!(scope = %self.scope, changed = plan.len(), "Collection compacted");
        Ok(plan.len())
    }

    /// Deletes several entities, one remote call per id.
    ///
    /// Succeeded deletes are applied locally; failed ids stay. The
    /// survivors are renumbered once at the end.
    pub async fn remove_many(&self, ids: &[EntityId]) -> Result<BulkReport, CollectionError> {
        self.ensure_live()?;
        let mut report = BulkReport::default();

        let (known, unknown): (Vec<EntityId>, Vec<EntityId>) = {
            let state = self.state();
            ids.iter()
                .cloned()
                .partition(|id| state.entities.iter().any(|e| e.id() == id))
        };
        for id in unknown {
            report.record(id.clone(), Err(CollectionError::not_found(id)));
        }

        let results = join_all(
            known
                .iter()
                .map(|id| async move { (id, self.gateway.delete_by_id(&self.scope, id).await) }),
        )
        .await;
        self.ensure_live()?;

        let mut deleted = Vec::new();
        for (id, result) in results {
            match result {
                Ok(()) => {
                    deleted.push(id.clone());
                    report.record(id.clone(), Ok(()));
                }
                Err(e) => {
                    tracing::warn!(scope = %self.scope, entity_id = %id, error = %e, "Bulk delete failed for entity");
                    report.record(
                        id.clone(),
                        Err(CollectionError::from_write(e, vec![id.clone()])),
                    );
                }
            }
        }

        if deleted.is_empty() {
            return Ok(report);
        }

        let plan = {
            let mut state = self.state();
            state.entities.retain(|e| !deleted.contains(e.id()));
            let plan = plan_compaction(&state.entities, self.scope.base_index());
            apply_changes(&mut state.entities, &plan);
            plan
        };
        if !plan.is_empty() {
            let renumbered = self
                .gateway
                .update_order_batch(&self.scope, &assignments(&plan))
                .await;
            self.ensure_live()?;
            if let Err(e) = renumbered {
                tracing::warn!(scope = %self.scope, error = %e, "Renumbering after bulk delete failed");
                self.state().needs_compaction = true;
            }
        }

        tracing::debug!(
            scope = %self.scope,
            succeeded = report.succeeded_count(),
            failed = report.failed_count(),
            "Bulk delete finished"
        );
        Ok(report)
    }

    /// Applies the same patch to several entities, independently per id.
    pub async fn update_many(
        &self,
        ids: &[EntityId],
        patch: &PayloadPatch,
    ) -> Result<BulkReport, CollectionError> {
        self.ensure_live()?;
        let results = join_all(ids.iter().map(|id| async move {
            (id, self.update(id, patch.clone()).await.map(|_| ()))
        }))
        .await;
        self.ensure_live()?;

        let mut report = BulkReport::default();
        for (id, result) in results {
            report.record(id.clone(), result);
        }
        tracing::debug!(
            scope = %self.scope,
            succeeded = report.succeeded_count(),
            failed = report.failed_count(),
            "Bulk update finished"
        );
        Ok(report)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_live(&self) -> Result<(), CollectionError> {
        if self.is_live() {
            Ok(())
        } else {
            Err(CollectionError::detached())
        }
    }
}
