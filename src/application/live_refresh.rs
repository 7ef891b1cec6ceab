//! StoreRefresher - reloads a Store when another session changes its scope.
//!
//! Events are treated as "something changed" hints only: the Store is
//! reloaded from the source of truth, never patched from the event.

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::OrderedCollectionStore;
use crate::domain::collection::CollectionError;
use crate::domain::foundation::{DomainError, SubscriptionId};
use crate::ports::{ChangeEvent, ChangeFeed, ChangeListener, Subscription};

/// Change listener bound to one Store.
pub struct StoreRefresher {
    store: OrderedCollectionStore,
}

impl StoreRefresher {
    pub fn new(store: OrderedCollectionStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ChangeListener for StoreRefresher {
    async fn on_change(&self, event: ChangeEvent) -> Result<(), DomainError> {
        if !self.store.is_live() || !event.affects(self.store.scope()) {
            return Ok(());
        }
        tracing::debug!(
            scope = %self.store.scope(),
            kind = ?event.kind,
            "Remote change, reloading collection"
        );
        match self.store.reload().await {
            // The page went away while the reload was in flight.
            Ok(()) | Err(CollectionError::Detached) => Ok(()),
            Err(e) => Err(DomainError::new(e.code(), e.message())),
        }
    }

    fn name(&self) -> &'static str {
        "StoreRefresher"
    }
}

/// Keeps a Store in sync with a change feed for as long as it is held.
///
/// Dropping it unsubscribes.
#[derive(Debug)]
pub struct LiveRefresh {
    subscription: Subscription,
}

impl LiveRefresh {
    pub fn start(feed: Arc<dyn ChangeFeed>, store: &OrderedCollectionStore) -> Self {
        let listener = Arc::new(StoreRefresher::new(store.clone()));
        let subscription = Subscription::new(feed, store.scope(), listener);
        tracing::debug!(scope = %store.scope(), "Live refresh started");
        Self { subscription }
    }

    pub fn subscription_id(&self) -> SubscriptionId {
        self.subscription.id()
    }
}
