//! PublicationStatus enum for content that can be drafted, published, and archived.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{StateMachine, ValidationError};

/// Publication state of a content entity (project, service, ...).
///
/// Independent of the entity's position in its collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PublicationStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl PublicationStatus {
    /// Returns true if the entity is shown on the public site.
    pub fn is_public(&self) -> bool {
        matches!(self, PublicationStatus::Published)
    }

    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PublicationStatus::Draft => "draft",
            PublicationStatus::Published => "published",
            PublicationStatus::Archived => "archived",
        }
    }
}

impl StateMachine for PublicationStatus {
    /// Valid transitions:
    /// - Draft -> Published | Archived
    /// - Published -> Draft | Archived
    /// - Archived -> Draft | Published
    fn can_transition_to(&self, target: &Self) -> bool {
        use PublicationStatus::*;
        matches!(
            (self, target),
            (Draft, Published)
                | (Draft, Archived)
                | (Published, Draft)
                | (Published, Archived)
                | (Archived, Draft)
                | (Archived, Published)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use PublicationStatus::*;
        match self {
            Draft => vec![Published, Archived],
            Published => vec![Draft, Archived],
            Archived => vec![Draft, Published],
        }
    }
}

impl fmt::Display for PublicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PublicationStatus::Draft => "Draft",
            PublicationStatus::Published => "Published",
            PublicationStatus::Archived => "Archived",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for PublicationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PublicationStatus::Draft),
            "published" => Ok(PublicationStatus::Published),
            "archived" => Ok(PublicationStatus::Archived),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown publication status '{}'", other),
            )),
        }
    }
}
