//! Entity managed by an ordered list editor.
//!
//! The ordering and selection logic only look at `id`, `order`,
//! `parent_id`, and `status`; the payload is opaque to them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::CollectionKind;
use crate::domain::foundation::{
    EntityId, PublicationStatus, StateMachine, Timestamp, ValidationError,
};

/// Entity-specific fields (title, description, image reference, ...).
pub type Payload = Map<String, Value>;

/// Payload keys that are tried, in order, when naming an entity to a user.
const LABEL_FIELDS: [&str; 4] = ["title", "name", "label", "heading"];

/// One row of an ordered collection.
///
/// # Invariants
///
/// - `id` never changes after creation
/// - `order` is unique and dense among siblings when no mutation is in flight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    order: i32,
    parent_id: Option<EntityId>,
    payload: Payload,
    status: Option<PublicationStatus>,
    created_at: Timestamp,
}

impl Entity {
    /// Reconstitute an entity from persistence (no validation).
    pub fn reconstitute(
        id: EntityId,
        order: i32,
        parent_id: Option<EntityId>,
        payload: Payload,
        status: Option<PublicationStatus>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            order,
            parent_id,
            payload,
            status,
            created_at,
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn parent_id(&self) -> Option<&EntityId> {
        self.parent_id.as_ref()
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn status(&self) -> Option<PublicationStatus> {
        self.status
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    /// Returns a string payload field.
    pub fn field_str(&self, field: &str) -> Option<&str> {
        self.payload.get(field).and_then(Value::as_str)
    }

    /// Human-readable name for notifications, falling back to the id.
    pub fn label(&self) -> String {
        LABEL_FIELDS
            .iter()
            .find_map(|f| self.field_str(f))
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.id.to_string())
    }

    pub(crate) fn set_order(&mut self, order: i32) {
        self.order = order;
    }

    /// Merges `patch` into this entity. The patch must already be validated.
    pub(crate) fn apply_patch(&mut self, patch: &PayloadPatch) {
        for (key, value) in &patch.fields {
            if value.is_null() {
                self.payload.remove(key);
            } else {
                self.payload.insert(key.clone(), value.clone());
            }
        }
        if let Some(status) = patch.status {
            self.status = Some(status);
        }
    }

    /// Restores payload and status captured before an optimistic update.
    pub(crate) fn restore_content(&mut self, payload: Payload, status: Option<PublicationStatus>) {
        self.payload = payload;
        self.status = status;
    }
}

/// Data handed to the gateway to create an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEntity {
    pub order: i32,
    pub parent_id: Option<EntityId>,
    pub payload: Payload,
    pub status: Option<PublicationStatus>,
    /// Stored as-is so the local copy and the persisted row sort the same.
    pub created_at: Timestamp,
}

/// A new order value for one entity, as persisted in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAssignment {
    pub id: EntityId,
    pub order: i32,
}

/// Partial update of an entity's payload and status.
///
/// Top-level merge semantics: a key set to `null` removes the field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayloadPatch {
    pub fields: Payload,
    pub status: Option<PublicationStatus>,
}

impl PayloadPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets (or, with `Value::Null`, clears) a payload field.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Changes the publication status.
    pub fn with_status(mut self, status: PublicationStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Status-only patch, as issued by bulk status changes.
    pub fn status_only(status: PublicationStatus) -> Self {
        Self::new().with_status(status)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.status.is_none()
    }

    /// Checks this patch against the collection rules and the entity's
    /// current state.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if a required field would be cleared or blanked
    /// - `InvalidFormat` for reserved/ill-formed keys, status on a
    ///   status-less collection, or a forbidden status transition
    pub fn validate_for(&self, kind: CollectionKind, current: &Entity) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::invalid_format("patch", "nothing to update"));
        }
        validate_payload_keys(kind, &self.fields)?;
        for field in kind.required_fields() {
            if let Some(value) = self.fields.get(*field) {
                if is_blank(value) {
                    return Err(ValidationError::empty_field(*field));
                }
            }
        }
        if let Some(target) = self.status {
            if !kind.has_status() {
                return Err(ValidationError::invalid_format(
                    "status",
                    format!("{} entries have no publication status", kind),
                ));
            }
            let current_status = current.status().unwrap_or_default();
            if current_status != target {
                current_status.transition_to(target)?;
            }
        }
        Ok(())
    }
}

/// Validates a payload for creation in `kind`.
///
/// # Errors
///
/// - `EmptyField` if a required field is missing or blank
/// - `InvalidFormat` if a key is reserved or not a plain identifier
pub fn validate_new_payload(kind: CollectionKind, payload: &Payload) -> Result<(), ValidationError> {
    validate_payload_keys(kind, payload)?;
    for field in kind.required_fields() {
        match payload.get(*field) {
            Some(value) if !is_blank(value) => {}
            _ => return Err(ValidationError::empty_field(*field)),
        }
    }
    Ok(())
}

/// Payload keys double as column names in the relational adapter, so they
/// are restricted to lowercase identifiers.
pub fn validate_payload_keys(kind: CollectionKind, payload: &Payload) -> Result<(), ValidationError> {
    let reserved = kind.reserved_fields();
    for key in payload.keys() {
        if reserved.contains(&key.as_str()) {
            return Err(ValidationError::invalid_format(
                key.clone(),
                "field is managed by the collection and cannot be set directly",
            ));
        }
        let well_formed = key
            .chars()
            .next()
            .map(|c| c.is_ascii_lowercase())
            .unwrap_or(false)
            && key
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !well_formed || key.len() > 63 {
            return Err(ValidationError::invalid_format(
                key.clone(),
                "field names must be lowercase identifiers",
            ));
        }
    }
    Ok(())
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
