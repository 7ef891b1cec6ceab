//! Table views and row selection for bulk actions.

mod row_selection;
mod view;

pub use row_selection::{Selection, SelectionState};
pub use view::{SortDirection, SortKey, ViewQuery, VisibleView};
