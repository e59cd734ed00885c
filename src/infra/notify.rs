use tracing::{error, info};

use crate::application::notify::{Notification, Notifier, Severity};

/// Surfaces store notifications through the tracing pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Normal => {
                info!(title = %notification.title, "{}", notification.description);
            }
            Severity::Destructive => {
                error!(title = %notification.title, "{}", notification.description);
            }
        }
    }
}
