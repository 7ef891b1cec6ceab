//! PostgreSQL adapters for the hosted content database.
//!
//! - `PostgresCollectionGateway` - ordered collections, one table per collection
//! - `PgChangeFeed` - row change notifications over `LISTEN`/`NOTIFY`
//! - `connect` - pool construction from `DatabaseConfig`

mod change_feed;
mod collection_gateway;
mod pool;

pub use change_feed::{PgChangeFeed, CHANGE_CHANNEL};
pub use collection_gateway::PostgresCollectionGateway;
pub use pool::connect;
