use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Default,
    Success,
    Destructive,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Default => "info",
            Severity::Success => "success",
            Severity::Destructive => "error",
        })
    }
}

// Transient user-facing message; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notification {
    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Destructive,
        }
    }

    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Success,
        }
    }
}

// Port for the display side of notifications. Implementations must not block the caller.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}
