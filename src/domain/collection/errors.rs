//! Collection-specific error types.

use crate::domain::foundation::{DomainError, EntityId, ErrorCode, ValidationError};

/// Outcome of a failed Store or controller operation.
///
/// Every public operation returns one of these instead of panicking; the
/// caller decides how to show it (error view, notification, inline hint).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// Initial fetch failed; show an empty/error view with retry.
    Load(String),
    /// A mutation was rejected or partially applied; local state was
    /// rolled back.
    Persist {
        entity_ids: Vec<EntityId>,
        message: String,
    },
    /// Caller-supplied data failed a precondition; nothing was sent.
    Validation(ValidationError),
    /// The entity is not part of the loaded scope.
    NotFound(EntityId),
    /// The owning Store was closed while the operation was in flight.
    Detached,
}

impl CollectionError {
    pub fn load(message: impl Into<String>) -> Self {
        CollectionError::Load(message.into())
    }
    pub fn persist(entity_ids: Vec<EntityId>, message: impl Into<String>) -> Self {
        CollectionError::Persist {
            entity_ids,
            message: message.into(),
        }
    }
    pub fn not_found(id: EntityId) -> Self {
        CollectionError::NotFound(id)
    }
    pub fn detached() -> Self {
        CollectionError::Detached
    }

    /// Wraps a gateway error from a write affecting `entity_ids`.
    pub fn from_write(err: DomainError, entity_ids: Vec<EntityId>) -> Self {
        match err.code {
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat => CollectionError::Persist {
                entity_ids,
                message: format!("Rejected by store: {}", err.message),
            },
            _ => CollectionError::Persist {
                entity_ids,
                message: err.to_string(),
            },
        }
    }

    /// Entities named by this error.
    pub fn entity_ids(&self) -> Vec<EntityId> {
        match self {
            CollectionError::Persist { entity_ids, .. } => entity_ids.clone(),
            CollectionError::NotFound(id) => vec![id.clone()],
            _ => Vec::new(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            CollectionError::Load(_) => ErrorCode::Unreachable,
            CollectionError::Persist { .. } => ErrorCode::DatabaseError,
            CollectionError::Validation(_) => ErrorCode::ValidationFailed,
            CollectionError::NotFound(_) => ErrorCode::EntityNotFound,
            CollectionError::Detached => ErrorCode::StoreDetached,
        }
    }

    pub fn message(&self) -> String {
        match self {
            CollectionError::Load(msg) => format!("Could not load collection: {}", msg),
            CollectionError::Persist { message, .. } => format!("Could not save changes: {}", message),
            CollectionError::Validation(err) => err.to_string(),
            CollectionError::NotFound(id) => format!("Entry not found: {}", id),
            CollectionError::Detached => "Editor was closed before the change completed".to_string(),
        }
    }
}

impl std::fmt::Display for CollectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for CollectionError {}

impl From<ValidationError> for CollectionError {
    fn from(err: ValidationError) -> Self {
        CollectionError::Validation(err)
    }
}

impl From<DomainError> for CollectionError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::EntityNotFound => match err.details.get("entity_id").map(EntityId::new) {
                Some(Ok(id)) => CollectionError::NotFound(id),
                _ => CollectionError::persist(Vec::new(), err.message),
            },
            ErrorCode::StoreDetached => CollectionError::Detached,
            ErrorCode::Unreachable | ErrorCode::MalformedData => CollectionError::Load(err.message),
            _ => CollectionError::from_write(err, Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_keep_their_field() {
        let err: CollectionError = ValidationError::empty_field("title").into();
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
        assert_eq!(err.message(), "Field 'title' cannot be empty");
    }

    #[test]
    fn write_errors_name_affected_entities() {
        let id = EntityId::new("p1").unwrap();
        let err = CollectionError::from_write(
            DomainError::new(ErrorCode::DatabaseError, "connection reset"),
            vec![id.clone()],
        );
        assert_eq!(err.entity_ids(), vec![id]);
        assert_eq!(err.code(), ErrorCode::DatabaseError);
        assert!(err.message().contains("connection reset"));
    }

    #[test]
    fn remote_validation_rejection_is_a_persist_error() {
        let err = CollectionError::from_write(
            DomainError::validation("slug", "duplicate slug"),
            vec![],
        );
        assert!(matches!(err, CollectionError::Persist { .. }));
        assert!(err.message().contains("duplicate slug"));
    }

    #[test]
    fn detached_has_its_own_code() {
        assert_eq!(CollectionError::detached().code(), ErrorCode::StoreDetached);
    }
}
