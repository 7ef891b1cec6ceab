//! Registry of the admin-managed collections and their scopes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{EntityId, ValidationError};

/// A collection the admin dashboard edits as an ordered list.
///
/// Each kind knows where it is stored, which column carries its rank,
/// and whether ranks start at 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    /// Header/footer navigation builder (menu items with optional parent).
    Navigation,
    /// "Our process" steps, numbered from 1.
    ProcessSteps,
    /// Leadership team members on the about page.
    LeadershipTeam,
    /// Portfolio projects.
    Projects,
    /// Service offerings.
    Services,
}

impl CollectionKind {
    /// All collection kinds.
    pub fn all() -> [CollectionKind; 5] {
        [
            CollectionKind::Navigation,
            CollectionKind::ProcessSteps,
            CollectionKind::LeadershipTeam,
            CollectionKind::Projects,
            CollectionKind::Services,
        ]
    }

    /// Stable identifier used in configuration and change notifications.
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Navigation => "navigation",
            CollectionKind::ProcessSteps => "process_steps",
            CollectionKind::LeadershipTeam => "leadership_team",
            CollectionKind::Projects => "projects",
            CollectionKind::Services => "services",
        }
    }

    /// Backing table name.
    pub fn table(&self) -> &'static str {
        match self {
            CollectionKind::Navigation => "navigation_items",
            CollectionKind::ProcessSteps => "process_steps",
            CollectionKind::LeadershipTeam => "leadership_team",
            CollectionKind::Projects => "projects",
            CollectionKind::Services => "services",
        }
    }

    /// Column holding the entity's rank.
    pub fn order_column(&self) -> &'static str {
        match self {
            CollectionKind::ProcessSteps => "step_number",
            _ => "display_order",
        }
    }

    /// First rank in a scope.
    pub fn base_index(&self) -> i32 {
        match self {
            CollectionKind::ProcessSteps => 1,
            _ => 0,
        }
    }

    /// Whether entities carry a publication status.
    pub fn has_status(&self) -> bool {
        matches!(self, CollectionKind::Projects | CollectionKind::Services)
    }

    /// Whether entities may be nested under a parent entity.
    pub fn is_hierarchical(&self) -> bool {
        matches!(self, CollectionKind::Navigation)
    }

    /// Payload fields that must be present and non-blank.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            CollectionKind::Navigation => &["label", "href"],
            CollectionKind::ProcessSteps => &["title"],
            CollectionKind::LeadershipTeam => &["name"],
            CollectionKind::Projects => &["title"],
            CollectionKind::Services => &["title"],
        }
    }

    /// Column names owned by the ordering layer; never part of a payload.
    pub fn reserved_fields(&self) -> [&'static str; 5] {
        ["id", self.order_column(), "parent_id", "status", "created_at"]
    }

    /// Finds the kind stored in `table`.
    pub fn from_table(table: &str) -> Option<Self> {
        Self::all().into_iter().find(|k| k.table() == table)
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CollectionKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| {
                ValidationError::invalid_format("collection", format!("unknown collection '{}'", s))
            })
    }
}

/// The sibling set an ordered list operates on.
///
/// Within one scope, order values are unique and dense.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub collection: CollectionKind,
    pub parent: Option<EntityId>,
}

impl Scope {
    /// Top-level entities of a collection.
    pub fn root(collection: CollectionKind) -> Self {
        Self {
            collection,
            parent: None,
        }
    }

    /// Children of `parent` in a hierarchical collection.
    ///
    /// # Errors
    ///
    /// - `InvalidFormat` if the collection does not support nesting
    pub fn children_of(collection: CollectionKind, parent: EntityId) -> Result<Self, ValidationError> {
        if !collection.is_hierarchical() {
            return Err(ValidationError::invalid_format(
                "parent_id",
                format!("{} entries cannot be nested", collection),
            ));
        }
        Ok(Self {
            collection,
            parent: Some(parent),
        })
    }

    /// Returns true if an entity with `parent_id` belongs to this scope.
    pub fn contains_parent(&self, parent_id: Option<&EntityId>) -> bool {
        self.parent.as_ref() == parent_id
    }

    pub fn base_index(&self) -> i32 {
        self.collection.base_index()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parent {
            Some(parent) => write!(f, "{}/{}", self.collection, parent),
            None => write!(f, "{}/root", self.collection),
        }
    }
}
