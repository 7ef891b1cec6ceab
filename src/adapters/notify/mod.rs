//! Notifier adapters.
//!
//! - `NotificationCenter` - keeps dismissible notifications for the admin UI
//! - `TracingNotifier` - log-only, for headless use

mod center;
mod tracing_notifier;

pub use center::NotificationCenter;
pub use tracing_notifier::TracingNotifier;
