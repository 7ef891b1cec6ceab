//! Notifier port - non-blocking user notifications.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{EntityId, NotificationId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A dismissible message shown to the admin user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub level: NotificationLevel,
    pub message: String,
    /// Entities the message is about.
    pub entity_ids: Vec<EntityId>,
    pub created_at: Timestamp,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            id: NotificationId::new(),
            level,
            message: message.into(),
            entity_ids: Vec::new(),
            created_at: Timestamp::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message)
    }

    pub fn with_entities(mut self, ids: Vec<EntityId>) -> Self {
        self.entity_ids = ids;
        self
    }
}

/// Port for surfacing outcomes to the user without blocking the UI.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}
