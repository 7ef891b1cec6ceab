//! Notifier that only writes to the log.

use crate::ports::{Notification, NotificationLevel, Notifier};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl TracingNotifier {
    pub fn new() -> Self {
        Self
    }
}

/// Logs `notification` at the level matching its severity.
pub(super) fn log(notification: &Notification) {
    let entities = notification.entity_ids.len();
    match notification.level {
        NotificationLevel::Info | NotificationLevel::Success => {
            tracing::info!(notification = %notification.id, entities, "{}", notification.message)
        }
        NotificationLevel::Warning => {
            tracing::warn!(notification = %notification.id, entities, "{}", notification.message)
        }
        NotificationLevel::Error => {
            tracing::error!(notification = %notification.id, entities, "{}", notification.message)
        }
    }
}

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        log(&notification);
    }
}
