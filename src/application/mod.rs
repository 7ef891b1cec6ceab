//! Application layer - the Store and the controllers driving it.
//!
//! - `OrderedCollectionStore` owns one scope and applies optimistic mutations
//! - `DragReorderController` maps drag gestures and move buttons to reorders
//! - `BulkSelectionController` manages row selection and bulk actions
//! - `LiveRefresh` reloads a Store when another session changes its scope

mod bulk_actions;
mod collection_store;
mod drag_reorder;
mod live_refresh;

pub use bulk_actions::{BulkAction, BulkRequest, BulkSelectionController, ConfirmationToken};
pub use collection_store::{
    BulkFailure, BulkReport, OrderedCollectionStore, RemoveOutcome, ReorderOutcome,
};
pub use drag_reorder::{DragReorderController, DropOutcome};
pub use live_refresh::{LiveRefresh, StoreRefresher};
