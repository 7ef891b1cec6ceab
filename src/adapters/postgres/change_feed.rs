//! PostgreSQL change feed over `LISTEN`/`NOTIFY`.
//!
//! The `notify_cms_change()` trigger (see `migrations/`) sends a JSON
//! payload on [`CHANGE_CHANNEL`] for every row written to a collection
//! table. A background task receives them and fans them out to local
//! listeners.

use serde::Deserialize;
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::adapters::memory::InMemoryChangeFeed;
use crate::domain::collection::{CollectionKind, Scope};
use crate::domain::foundation::{DomainError, EntityId, ErrorCode, SubscriptionId};
use crate::ports::{ChangeEvent, ChangeFeed, ChangeKind, ChangeListener};

/// Channel the collection triggers notify on.
pub const CHANGE_CHANNEL: &str = "cms_changes";

const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Payload sent by the trigger.
#[derive(Debug, Deserialize)]
struct TriggerPayload {
    table: String,
    op: String,
    id: Option<String>,
    parent_id: Option<String>,
}

impl TriggerPayload {
    /// `None` for tables and operations this crate does not manage.
    fn into_event(self) -> Option<ChangeEvent> {
        let collection = CollectionKind::from_table(&self.table)?;
        let kind = match self.op.as_str() {
            "INSERT" => ChangeKind::Inserted,
            "UPDATE" => ChangeKind::Updated,
            "DELETE" => ChangeKind::Deleted,
            _ => return None,
        };
        Some(ChangeEvent {
            collection,
            parent_id: self.parent_id.and_then(|p| EntityId::new(p).ok()),
            kind,
            entity_id: self.id.and_then(|id| EntityId::new(id).ok()),
        })
    }
}

fn parse_notification(payload: &str) -> Option<ChangeEvent> {
    match serde_json::from_str::<TriggerPayload>(payload) {
        Ok(p) => p.into_event(),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed change notification");
            None
        }
    }
}

/// Change feed backed by a dedicated listening connection.
///
/// The receive task stops when the feed is dropped.
pub struct PgChangeFeed {
    dispatcher: Arc<InMemoryChangeFeed>,
    task: JoinHandle<()>,
}

impl PgChangeFeed {
    /// Opens a listening connection from `pool` and starts receiving.
    ///
    /// # Errors
    ///
    /// - `Unreachable` if the connection or `LISTEN` fails
    pub async fn listen(pool: &PgPool) -> Result<Self, DomainError> {
        let mut listener = PgListener::connect_with(pool).await.map_err(|e| {
            DomainError::new(ErrorCode::Unreachable, format!("Failed to open listener: {}", e))
        })?;
        listener.listen(CHANGE_CHANNEL).await.map_err(|e| {
            DomainError::new(ErrorCode::Unreachable, format!("Failed to LISTEN: {}", e))
        })?;

        let dispatcher = Arc::new(InMemoryChangeFeed::new());
        let task = tokio::spawn(receive(listener, Arc::clone(&dispatcher)));
        tracing::info!(channel = CHANGE_CHANNEL, "Listening for collection changes");
        Ok(Self { dispatcher, task })
    }
}

async fn receive(mut listener: PgListener, dispatcher: Arc<InMemoryChangeFeed>) {
    loop {
        match listener.recv().await {
            Ok(notification) => {
                if let Some(event) = parse_notification(notification.payload()) {
                    // Listener failures are logged by the dispatcher
                    let _ = dispatcher.publish(event).await;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Change listener connection lost, retrying");
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
    }
}

impl ChangeFeed for PgChangeFeed {
    fn subscribe(&self, scope: &Scope, listener: Arc<dyn ChangeListener>) -> SubscriptionId {
        self.dispatcher.subscribe(scope, listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.dispatcher.unsubscribe(id);
    }
}

impl Drop for PgChangeFeed {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_payload_maps_to_scoped_event() {
        let event = parse_notification(
            r#"{"table":"navigation_items","op":"INSERT","id":"n2","parent_id":"n1"}"#,
        )
        .unwrap();

        let parent = EntityId::new("n1").unwrap();
        assert_eq!(event.collection, CollectionKind::Navigation);
        assert_eq!(event.kind, ChangeKind::Inserted);
        assert!(event.affects(&Scope::children_of(CollectionKind::Navigation, parent).unwrap()));
        assert!(!event.affects(&Scope::root(CollectionKind::Navigation)));
    }

    #[test]
    fn unknown_tables_and_garbage_are_ignored() {
        assert!(parse_notification(r#"{"table":"users","op":"DELETE","id":"u1"}"#).is_none());
        assert!(parse_notification(r#"{"table":"projects","op":"TRUNCATE"}"#).is_none());
        assert!(parse_notification("not json").is_none());
    }
}
