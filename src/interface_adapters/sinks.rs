use crate::domain::{Notification, NotificationSink, Severity};
use tokio::sync::mpsc;

// Forwards notifications to whatever display task owns the receiver.
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, notification: Notification) {
        // Fire-and-forget: a closed display side just drops the message.
        let _ = self.tx.send(notification);
    }
}

// Logs notifications instead of displaying them.
#[derive(Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Destructive => tracing::warn!(
                title = %notification.title,
                description = %notification.description,
                "notification"
            ),
            Severity::Default | Severity::Success => tracing::info!(
                title = %notification.title,
                description = %notification.description,
                "notification"
            ),
        }
    }
}
