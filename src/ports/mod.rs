//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the admin list editors and the outside world. Adapters implement these
//! ports.
//!
//! - `CollectionGateway` - Reads and writes ordered collections in the hosted database
//! - `ChangeFeed` / `ChangeListener` - Push channel for rows changed by any session
//! - `Notifier` - Non-blocking, dismissible user notifications

mod change_feed;
mod collection_gateway;
mod notifier;

pub use change_feed::{ChangeEvent, ChangeFeed, ChangeKind, ChangeListener, Subscription};
pub use collection_gateway::CollectionGateway;
pub use notifier::{Notification, NotificationLevel, Notifier};
