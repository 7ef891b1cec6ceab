//! In-memory notification list backing the admin toast area.

use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock};

use super::tracing_notifier::log;
use crate::domain::foundation::NotificationId;
use crate::ports::{Notification, NotificationLevel, Notifier};

const DEFAULT_CAPACITY: usize = 50;

/// Holds notifications until the user dismisses them.
///
/// Oldest entries are dropped once `capacity` is reached. Every
/// notification is also logged.
pub struct NotificationCenter {
    items: RwLock<VecDeque<Notification>>,
    capacity: usize,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: RwLock::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Notifications not yet dismissed, oldest first.
    pub fn active(&self) -> Vec<Notification> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn count_at(&self, level: NotificationLevel) -> usize {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|n| n.level == level)
            .count()
    }

    /// Returns false if `id` was not showing.
    pub fn dismiss(&self, id: NotificationId) -> bool {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        let before = items.len();
        items.retain(|n| n.id != id);
        items.len() != before
    }

    pub fn dismiss_all(&self) {
        self.items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Notifier for NotificationCenter {
    fn notify(&self, notification: Notification) {
        log(&notification);
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        if items.len() == self.capacity {
            items.pop_front();
        }
        items.push_back(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifications_stay_until_dismissed() {
        let center = NotificationCenter::new();
        let failure = Notification::error("Could not move \"Roofing\"");
        let failure_id = failure.id;
        center.notify(failure);
        center.notify(Notification::success("3 entries published"));

        assert_eq!(center.active().len(), 2);
        assert_eq!(center.count_at(NotificationLevel::Error), 1);

        assert!(center.dismiss(failure_id));
        assert!(!center.dismiss(failure_id));
        assert_eq!(center.active().len(), 1);
    }

    #[test]
    fn oldest_notification_is_dropped_at_capacity() {
        let center = NotificationCenter::with_capacity(2);
        center.notify(Notification::warning("first"));
        center.notify(Notification::warning("second"));
        center.notify(Notification::warning("third"));

        let messages: Vec<String> = center.active().into_iter().map(|n| n.message).collect();
        assert_eq!(messages, vec!["second", "third"]);
    }

    #[test]
    fn dismiss_all_clears_everything() {
        let center = NotificationCenter::new();
        center.notify(Notification::error("a"));
        center.dismiss_all();
        assert!(center.active().is_empty());
    }
}
