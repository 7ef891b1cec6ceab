//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, enums, and error types
//! that form the vocabulary of the CMS domain.

mod errors;
mod ids;
mod publication_status;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{EntityId, NotificationId, SubscriptionId};
pub use publication_status::PublicationStatus;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
