//! Domain layer containing the ordering, selection, and drag logic.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, statuses, errors)
//! - `collection` - Entities, scopes, and the ordering algorithms
//! - `selection` - Table views (filter/sort/paginate) and row selection
//! - `drag` - Drag gesture state independent of input modality

pub mod collection;
pub mod drag;
pub mod foundation;
pub mod selection;
