//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the admin core to external systems:
//! - `memory` - In-process gateway and change feed (tests, local development)
//! - `notify` - Notification sinks
//! - `postgres` - Hosted relational database

pub mod memory;
pub mod notify;
pub mod postgres;

pub use memory::{GatewayOp, InMemoryChangeFeed, InMemoryCollectionGateway};
pub use notify::{NotificationCenter, TracingNotifier};
pub use postgres::{connect, PgChangeFeed, PostgresCollectionGateway};
