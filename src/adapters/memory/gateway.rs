//! In-memory collection gateway.
//!
//! Deterministic stand-in for the hosted database, used by tests and local
//! development. Failures can be injected per operation or per entity, and
//! every successful write can be published to an [`InMemoryChangeFeed`].

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use super::InMemoryChangeFeed;
use crate::domain::collection::{
    CollectionKind, Entity, NewEntity, OrderAssignment, PayloadPatch, Scope,
};
use crate::domain::foundation::{DomainError, EntityId, ErrorCode, Timestamp};
use crate::ports::{ChangeEvent, ChangeKind, CollectionGateway};

/// Gateway operation, for fault injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    Fetch,
    Insert,
    UpdateFields,
    Delete,
    OrderBatch,
}

#[derive(Debug, Default)]
struct Faults {
    ops: HashSet<GatewayOp>,
    ids: HashSet<EntityId>,
}

/// Created-at values start here and advance one second per insert.
const CLOCK_START: i64 = 1_700_000_000;

pub struct InMemoryCollectionGateway {
    rows: RwLock<HashMap<CollectionKind, Vec<Entity>>>,
    faults: RwLock<Faults>,
    calls: RwLock<HashMap<GatewayOp, usize>>,
    clock: AtomicI64,
    feed: Option<Arc<InMemoryChangeFeed>>,
}

impl Default for InMemoryCollectionGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCollectionGateway {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            faults: RwLock::new(Faults::default()),
            calls: RwLock::new(HashMap::new()),
            clock: AtomicI64::new(CLOCK_START),
            feed: None,
        }
    }

    /// Publishes every successful write to `feed`.
    pub fn with_feed(mut self, feed: Arc<InMemoryChangeFeed>) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Adds a row to `scope` with the given order, bypassing validation.
    /// Returns the new id.
    pub fn seed(&self, scope: &Scope, order: i32, payload: serde_json::Value) -> EntityId {
        let id = EntityId::generate();
        let entity = Entity::reconstitute(
            id.clone(),
            order,
            scope.parent.clone(),
            payload.as_object().cloned().unwrap_or_default(),
            scope.collection.has_status().then(Default::default),
            self.tick(),
        );
        self.rows_mut().entry(scope.collection).or_default().push(entity);
        id
    }

    /// Current rows of `scope`, ascending by order.
    pub fn rows(&self, scope: &Scope) -> Vec<Entity> {
        let mut rows = self.scoped(scope);
        rows.sort_by_key(|e| e.order());
        rows
    }

    /// Makes every call of `op` fail.
    pub fn fail(&self, op: GatewayOp) {
        self.faults_mut().ops.insert(op);
    }

    /// Makes every write touching `id` fail.
    pub fn fail_for(&self, id: &EntityId) {
        self.faults_mut().ids.insert(id.clone());
    }

    /// Clears all injected faults.
    pub fn heal(&self) {
        *self.faults_mut() = Faults::default();
    }

    /// Number of times `op` was called, failed calls included.
    pub fn calls(&self, op: GatewayOp) -> usize {
        self.calls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&op)
            .copied()
            .unwrap_or(0)
    }

    fn tick(&self) -> Timestamp {
        Timestamp::from_unix_secs(self.clock.fetch_add(1, Ordering::SeqCst))
    }

    fn rows_mut(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<CollectionKind, Vec<Entity>>> {
        self.rows.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn faults_mut(&self) -> std::sync::RwLockWriteGuard<'_, Faults> {
        self.faults.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn scoped(&self, scope: &Scope) -> Vec<Entity> {
        self.rows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&scope.collection)
            .map(|rows| {
                rows.iter()
                    .filter(|e| scope.contains_parent(e.parent_id()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Counts the call and applies injected faults.
    fn check(&self, op: GatewayOp, ids: &[&EntityId]) -> Result<(), DomainError> {
        *self
            .calls
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(op)
            .or_insert(0) += 1;

        let faults = self.faults.read().unwrap_or_else(PoisonError::into_inner);
        if faults.ops.contains(&op) {
            let code = match op {
                GatewayOp::Fetch => ErrorCode::Unreachable,
                _ => ErrorCode::DatabaseError,
            };
            return Err(DomainError::new(code, format!("Injected {:?} failure", op)));
        }
        if let Some(id) = ids.iter().find(|id| faults.ids.contains(**id)) {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                format!("Injected failure for {}", id),
            )
            .with_detail("entity_id", id.as_str()));
        }
        Ok(())
    }

    async fn publish(&self, scope: &Scope, kind: ChangeKind, id: &EntityId) {
        if let Some(feed) = &self.feed {
            if let Err(e) = feed
                .publish(ChangeEvent::new(scope, kind, Some(id.clone())))
                .await
            {
                tracing::warn!(error = %e, "Change notification failed");
            }
        }
    }
}

fn not_found(id: &EntityId) -> DomainError {
    DomainError::new(ErrorCode::EntityNotFound, format!("Entity not found: {}", id))
        .with_detail("entity_id", id.as_str())
}

#[async_trait]
impl CollectionGateway for InMemoryCollectionGateway {
    async fn fetch_ordered(&self, scope: &Scope) -> Result<Vec<Entity>, DomainError> {
        self.check(GatewayOp::Fetch, &[])?;
        Ok(self.rows(scope))
    }

    async fn insert(&self, scope: &Scope, entity: &NewEntity) -> Result<EntityId, DomainError> {
        self.check(GatewayOp::Insert, &[])?;
        if !scope.contains_parent(entity.parent_id.as_ref()) {
            return Err(DomainError::new(
                ErrorCode::ScopeMismatch,
                format!("Row parent does not match scope {}", scope),
            ));
        }

        let id = EntityId::generate();
        let row = Entity::reconstitute(
            id.clone(),
            entity.order,
            entity.parent_id.clone(),
            entity.payload.clone(),
            entity.status,
            entity.created_at,
        );
        self.rows_mut().entry(scope.collection).or_default().push(row);
        self.publish(scope, ChangeKind::Inserted, &id).await;
        Ok(id)
    }

    async fn update_fields(
        &self,
        scope: &Scope,
        id: &EntityId,
        patch: &PayloadPatch,
    ) -> Result<(), DomainError> {
        self.check(GatewayOp::UpdateFields, &[id])?;
        {
            let mut rows = self.rows_mut();
            let row = rows
                .get_mut(&scope.collection)
                .and_then(|rows| {
                    rows.iter_mut()
                        .find(|e| e.id() == id && scope.contains_parent(e.parent_id()))
                })
                .ok_or_else(|| not_found(id))?;
            row.apply_patch(patch);
        }
        self.publish(scope, ChangeKind::Updated, id).await;
        Ok(())
    }

    async fn delete_by_id(&self, scope: &Scope, id: &EntityId) -> Result<(), DomainError> {
        self.check(GatewayOp::Delete, &[id])?;
        {
            let mut rows = self.rows_mut();
            let rows = rows
                .get_mut(&scope.collection)
                .ok_or_else(|| not_found(id))?;
            let index = rows
                .iter()
                .position(|e| e.id() == id && scope.contains_parent(e.parent_id()))
                .ok_or_else(|| not_found(id))?;
            rows.remove(index);
        }
        self.publish(scope, ChangeKind::Deleted, id).await;
        Ok(())
    }

    async fn update_order_batch(
        &self,
        scope: &Scope,
        assignments: &[OrderAssignment],
    ) -> Result<(), DomainError> {
        let ids: Vec<&EntityId> = assignments.iter().map(|a| &a.id).collect();
        self.check(GatewayOp::OrderBatch, &ids)?;
        {
            let mut rows = self.rows_mut();
            let rows = rows.entry(scope.collection).or_default();

            // All or nothing: verify every id before touching any row
            if let Some(missing) = assignments.iter().find(|a| {
                !rows
                    .iter()
                    .any(|e| e.id() == &a.id && scope.contains_parent(e.parent_id()))
            }) {
                return Err(not_found(&missing.id));
            }
            for assignment in assignments {
                if let Some(row) = rows.iter_mut().find(|e| e.id() == &assignment.id) {
                    row.set_order(assignment.order);
                }
            }
        }
        if let Some(first) = assignments.first() {
            self.publish(scope, ChangeKind::Updated, &first.id).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn services() -> Scope {
        Scope::root(CollectionKind::Services)
    }

    #[tokio::test]
    async fn fetch_returns_rows_of_scope_in_order() {
        let gateway = InMemoryCollectionGateway::new();
        let b = gateway.seed(&services(), 1, json!({"title": "Paving"}));
        let a = gateway.seed(&services(), 0, json!({"title": "Roofing"}));
        gateway.seed(&Scope::root(CollectionKind::Projects), 0, json!({"title": "Other"}));

        let rows = gateway.fetch_ordered(&services()).await.unwrap();

        let ids: Vec<_> = rows.iter().map(|e| e.id().clone()).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[tokio::test]
    async fn child_scope_only_sees_its_children() {
        let gateway = InMemoryCollectionGateway::new();
        let root = Scope::root(CollectionKind::Navigation);
        let menu = gateway.seed(&root, 0, json!({"label": "About", "href": "/about"}));
        let children = Scope::children_of(CollectionKind::Navigation, menu).unwrap();
        gateway.seed(&children, 0, json!({"label": "Team", "href": "/about/team"}));

        assert_eq!(gateway.fetch_ordered(&root).await.unwrap().len(), 1);
        assert_eq!(gateway.fetch_ordered(&children).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn order_batch_is_all_or_nothing() {
        let gateway = InMemoryCollectionGateway::new();
        let a = gateway.seed(&services(), 0, json!({"title": "A"}));
        let ghost = EntityId::new("ghost").unwrap();

        let result = gateway
            .update_order_batch(
                &services(),
                &[
                    OrderAssignment { id: a.clone(), order: 5 },
                    OrderAssignment { id: ghost, order: 0 },
                ],
            )
            .await;

        assert_eq!(result.unwrap_err().code, ErrorCode::EntityNotFound);
        assert_eq!(gateway.rows(&services())[0].order(), 0);
    }

    #[tokio::test]
    async fn injected_faults_fail_and_heal() {
        let gateway = InMemoryCollectionGateway::new();
        let a = gateway.seed(&services(), 0, json!({"title": "A"}));

        gateway.fail(GatewayOp::Fetch);
        assert_eq!(
            gateway.fetch_ordered(&services()).await.unwrap_err().code,
            ErrorCode::Unreachable
        );

        gateway.heal();
        gateway.fail_for(&a);
        assert!(gateway.delete_by_id(&services(), &a).await.is_err());
        assert_eq!(gateway.calls(GatewayOp::Delete), 1);

        gateway.heal();
        gateway.delete_by_id(&services(), &a).await.unwrap();
        assert!(gateway.rows(&services()).is_empty());
    }
}
