//! ChangeFeed port - push notifications about rows changed by any session.
//!
//! Listeners only learn that something in a scope changed; they react by
//! reloading, never by patching in-memory state from the event.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::collection::{CollectionKind, Scope};
use crate::domain::foundation::{DomainError, EntityId, SubscriptionId};

/// What happened to a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
}

/// A row change observed on the shared backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub collection: CollectionKind,
    pub parent_id: Option<EntityId>,
    pub kind: ChangeKind,
    pub entity_id: Option<EntityId>,
}

impl ChangeEvent {
    pub fn new(scope: &Scope, kind: ChangeKind, entity_id: Option<EntityId>) -> Self {
        Self {
            collection: scope.collection,
            parent_id: scope.parent.clone(),
            kind,
            entity_id,
        }
    }

    /// Returns true if this change touches rows of `scope`.
    pub fn affects(&self, scope: &Scope) -> bool {
        self.collection == scope.collection && scope.contains_parent(self.parent_id.as_ref())
    }
}

/// Callback invoked for changes in a subscribed scope.
#[async_trait]
pub trait ChangeListener: Send + Sync {
    async fn on_change(&self, event: ChangeEvent) -> Result<(), DomainError>;

    /// Listener name for logging.
    fn name(&self) -> &'static str;
}

/// Port for registering interest in row changes.
pub trait ChangeFeed: Send + Sync {
    /// Register `listener` for changes affecting `scope`.
    fn subscribe(&self, scope: &Scope, listener: Arc<dyn ChangeListener>) -> SubscriptionId;

    /// Remove a registration. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}

/// Scoped registration on a [`ChangeFeed`].
///
/// Unsubscribes when dropped, so a page that goes away cannot leave a
/// listener behind.
pub struct Subscription {
    feed: Arc<dyn ChangeFeed>,
    id: SubscriptionId,
}

impl Subscription {
    pub fn new(feed: Arc<dyn ChangeFeed>, scope: &Scope, listener: Arc<dyn ChangeListener>) -> Self {
        let id = feed.subscribe(scope, listener);
        Self { feed, id }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.feed.unsubscribe(self.id);
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
