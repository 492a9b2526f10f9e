//! Notifier implementations.

use super::{Notifier, Severity};
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

/// Writes notifications to stderr and mirrors them to `tracing`.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    /// Creates a console notifier.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, severity: Severity, message: &str, duration: Option<Duration>) {
        tracing::debug!(%severity, ?duration, "{message}");
        // A closed stderr must not take the command down with it.
        let _ = writeln!(std::io::stderr().lock(), "[{severity}] {message}");
    }
}

/// A notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Severity.
    pub severity: Severity,
    /// Message text.
    pub message: String,
    /// Requested display duration.
    pub duration: Option<Duration>,
}

/// Collects notifications in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    entries: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far.
    #[must_use]
    pub fn entries(&self) -> Vec<Notification> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Recorded notifications of one severity.
    #[must_use]
    pub fn with_severity(&self, severity: Severity) -> Vec<Notification> {
        self.entries()
            .into_iter()
            .filter(|n| n.severity == severity)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, severity: Severity, message: &str, duration: Option<Duration>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(Notification {
                severity,
                message: message.to_string(),
                duration,
            });
        }
    }
}
