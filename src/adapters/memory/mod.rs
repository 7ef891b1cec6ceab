//! In-memory adapters for tests and local development.
//!
//! - `InMemoryCollectionGateway` - collection rows kept in process, with fault injection
//! - `InMemoryChangeFeed` - synchronous change delivery

mod change_feed;
mod gateway;

pub use change_feed::InMemoryChangeFeed;
pub use gateway::{GatewayOp, InMemoryCollectionGateway};
