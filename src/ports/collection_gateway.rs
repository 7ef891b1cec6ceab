//! Collection gateway port.
//!
//! Defines the contract the ordered collection Store requires from the
//! hosted database. Implementations perform the actual reads and writes.
//!
//! # Design
//!
//! - **Row-shaped**: rows in, rows out; no wire format is assumed
//! - **Scope-addressed**: every call names the sibling scope it touches
//! - **Injected**: Stores receive a gateway at construction, never a global

use crate::domain::collection::{Entity, NewEntity, OrderAssignment, PayloadPatch, Scope};
use crate::domain::foundation::{DomainError, EntityId};
use async_trait::async_trait;

/// Port for persisting ordered collections.
///
/// Implementations must ensure:
/// - `fetch_ordered` returns rows sorted ascending by the order column
/// - `insert` allocates a fresh, never reused id
/// - `update_order_batch` is atomic where the backend allows it; if it
///   is not, any partial application must still be reported as an error
#[async_trait]
pub trait CollectionGateway: Send + Sync {
    /// Fetch every entity in `scope`, ascending by order.
    ///
    /// # Errors
    ///
    /// - `Unreachable` if the backend cannot be reached
    /// - `MalformedData` if a row cannot be decoded
    async fn fetch_ordered(&self, scope: &Scope) -> Result<Vec<Entity>, DomainError>;

    /// Create an entity and return its newly assigned id.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if the backend rejects the row
    /// - `DatabaseError` on persistence failure
    async fn insert(&self, scope: &Scope, entity: &NewEntity) -> Result<EntityId, DomainError>;

    /// Partially update payload fields and/or status of one entity.
    ///
    /// # Errors
    ///
    /// - `EntityNotFound` if the entity doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update_fields(
        &self,
        scope: &Scope,
        id: &EntityId,
        patch: &PayloadPatch,
    ) -> Result<(), DomainError>;

    /// Delete one entity.
    ///
    /// # Errors
    ///
    /// - `EntityNotFound` if the entity doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn delete_by_id(&self, scope: &Scope, id: &EntityId) -> Result<(), DomainError>;

    /// Persist new order values for several siblings.
    ///
    /// # Errors
    ///
    /// - `EntityNotFound` if any entity doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update_order_batch(
        &self,
        scope: &Scope,
        assignments: &[OrderAssignment],
    ) -> Result<(), DomainError>;
}
