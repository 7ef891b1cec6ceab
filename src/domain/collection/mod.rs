//! Ordered collections: entities, scopes, and the ordering algorithms.

mod entity;
mod errors;
mod kind;
pub mod ordering;

pub use entity::{
    validate_new_payload, validate_payload_keys, Entity, NewEntity, OrderAssignment, Payload,
    PayloadPatch,
};
pub use errors::CollectionError;
pub use kind::{CollectionKind, Scope};
pub use ordering::OrderChange;
