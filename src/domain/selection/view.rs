//! Filter, sort, and pagination of a loaded collection.
//!
//! The admin tables work on the rows already loaded into a Store, so the
//! visible set is computed locally rather than by another query.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

use crate::domain::collection::Entity;
use crate::domain::foundation::{EntityId, PublicationStatus, ValidationError};

/// Direction for field sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Column a table is sorted by.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "by")]
pub enum SortKey {
    /// Collection order (the drag-and-drop order).
    #[default]
    Order,
    /// A payload field; ties fall back to collection order.
    Field {
        name: String,
        direction: SortDirection,
    },
}

/// What the table currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewQuery {
    /// Case-insensitive substring matched against string payload fields.
    pub search: Option<String>,

    /// Only rows with this publication status.
    pub status: Option<PublicationStatus>,

    pub sort: SortKey,

    /// 1-based page number.
    pub page: u32,

    pub per_page: u32,
}

impl Default for ViewQuery {
    fn default() -> Self {
        Self {
            search: None,
            status: None,
            sort: SortKey::Order,
            page: 1,
            per_page: 20,
        }
    }
}

impl ViewQuery {
    /// Create a query for one page.
    pub fn paginated(page: u32, per_page: u32) -> Self {
        Self {
            page,
            per_page,
            ..Self::default()
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_status(mut self, status: PublicationStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn sorted_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = SortKey::Field {
            name: field.into(),
            direction,
        };
        self
    }

    /// Number of rows skipped before this page.
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.per_page as usize
    }

    /// # Errors
    ///
    /// - `OutOfRange` if `page` is 0 or `per_page` is outside `1..=max_per_page`
    pub fn validate(&self, max_per_page: u32) -> Result<(), ValidationError> {
        if self.page == 0 {
            return Err(ValidationError::out_of_range("page", 1, i32::MAX, 0));
        }
        if self.per_page == 0 || self.per_page > max_per_page {
            return Err(ValidationError::out_of_range(
                "per_page",
                1,
                max_per_page as i32,
                self.per_page as i32,
            ));
        }
        Ok(())
    }

    /// Computes the visible rows over entities in collection order.
    pub fn apply(&self, entities: &[Entity]) -> VisibleView {
        let needle = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut matching: Vec<&Entity> = entities
            .iter()
            .filter(|e| self.status.map_or(true, |s| e.status() == Some(s)))
            .filter(|e| needle.as_deref().map_or(true, |n| matches_search(e, n)))
            .collect();

        if let SortKey::Field { name, direction } = &self.sort {
            matching.sort_by(|a, b| {
                let primary = compare_values(a.payload().get(name), b.payload().get(name));
                let primary = match direction {
                    SortDirection::Ascending => primary,
                    SortDirection::Descending => primary.reverse(),
                };
                primary.then_with(|| a.order().cmp(&b.order()))
            });
        }

        let total = matching.len();
        let offset = self.offset();
        let ids: Vec<EntityId> = matching
            .into_iter()
            .skip(offset)
            .take(self.per_page as usize)
            .map(|e| e.id().clone())
            .collect();
        let has_more = offset + ids.len() < total;

        VisibleView {
            ids,
            total,
            page: self.page,
            has_more,
        }
    }
}

/// Rows on screen after filtering, sorting, and pagination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleView {
    /// Visible ids in display order.
    pub ids: Vec<EntityId>,

    /// Total rows matching the filter across all pages.
    pub total: usize,

    pub page: u32,

    pub has_more: bool,
}

impl VisibleView {
    pub fn contains(&self, id: &EntityId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

fn matches_search(entity: &Entity, needle: &str) -> bool {
    entity.payload().values().any(|v| match v {
        Value::String(s) => s.to_lowercase().contains(needle),
        _ => false,
    })
}

/// Missing values sort last; mixed types order null < bool < number < string.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match (a, b) {
            (Value::String(x), Value::String(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
            (Value::Number(x), Value::Number(y)) => {
                let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            _ => type_rank(a).cmp(&type_rank(b)),
        },
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
