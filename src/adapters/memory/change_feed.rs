//! In-memory change feed.
//!
//! Delivers events synchronously to every listener whose scope matches,
//! which keeps tests deterministic. The Postgres feed reuses it as its
//! local dispatcher.

use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::collection::Scope;
use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId};
use crate::ports::{ChangeEvent, ChangeFeed, ChangeListener};

struct Registration {
    id: SubscriptionId,
    scope: Scope,
    listener: Arc<dyn ChangeListener>,
}

#[derive(Default)]
pub struct InMemoryChangeFeed {
    registrations: RwLock<Vec<Registration>>,
}

impl InMemoryChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriber_count(&self) -> usize {
        self.registrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Delivers `event` to every matching listener.
    ///
    /// All listeners run even if some fail; failures are joined into one
    /// error.
    pub async fn publish(&self, event: ChangeEvent) -> Result<(), DomainError> {
        // Clone listeners to release the lock before awaiting
        let listeners: Vec<Arc<dyn ChangeListener>> = {
            let registrations = self
                .registrations
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            registrations
                .iter()
                .filter(|r| event.affects(&r.scope))
                .map(|r| Arc::clone(&r.listener))
                .collect()
        };

        let mut errors = Vec::new();
        for listener in listeners {
            if let Err(e) = listener.on_change(event.clone()).await {
                tracing::warn!(listener = listener.name(), error = %e, "Change listener failed");
                errors.push(format!("{}: {}", listener.name(), e));
            }
        }

        if !errors.is_empty() {
            return Err(DomainError::new(
                ErrorCode::InternalError,
                format!("Listener errors: {}", errors.join(", ")),
            ));
        }
        Ok(())
    }
}

impl ChangeFeed for InMemoryChangeFeed {
    fn subscribe(&self, scope: &Scope, listener: Arc<dyn ChangeListener>) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.registrations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Registration {
                id,
                scope: scope.clone(),
                listener,
            });
        tracing::debug!(subscription = %id, scope = %scope, "Change listener subscribed");
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.registrations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|r| r.id != id);
    }
}
