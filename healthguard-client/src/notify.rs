//! Transient user-facing notices
//!
//! Controllers report outcomes through a [`Notifier`]; the CLI prints them,
//! tests record them. Every notice is also a `tracing` event.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::fmt;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NoticeLevel::Success => "success",
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub id: Uuid,
    pub level: NoticeLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            level,
            message: message.into(),
            at: Utc::now(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn show(&self, notice: &Notice);

    fn notify(&self, level: NoticeLevel, message: &str) {
        let notice = Notice::new(level, message);
        match level {
            NoticeLevel::Error => error!(notice = %notice.id, "{}", message),
            NoticeLevel::Warning => warn!(notice = %notice.id, "{}", message),
            NoticeLevel::Success | NoticeLevel::Info => info!(notice = %notice.id, "{}", message),
        }
        self.show(&notice);
    }

    fn success(&self, message: &str) {
        self.notify(NoticeLevel::Success, message);
    }

    fn info(&self, message: &str) {
        self.notify(NoticeLevel::Info, message);
    }

    fn warning(&self, message: &str) {
        self.notify(NoticeLevel::Warning, message);
    }

    fn error(&self, message: &str) {
        self.notify(NoticeLevel::Error, message);
    }
}

/// Logs only
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn show(&self, _notice: &Notice) {}
}

/// Keeps every notice for later inspection
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    pub fn messages(&self, level: NoticeLevel) -> Vec<String> {
        self.notices
            .lock()
            .iter()
            .filter(|n| n.level == level)
            .map(|n| n.message.clone())
            .collect()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices.lock().last().cloned()
    }

    pub fn clear(&self) {
        self.notices.lock().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn show(&self, notice: &Notice) {
        self.notices.lock().push(notice.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_notifier_keeps_levels() {
        let notifier = RecordingNotifier::new();
        notifier.success("Saved");
        notifier.error("Server connection failed");
        notifier.info("Already checked in today");

        assert_eq!(notifier.notices().len(), 3);
        assert_eq!(notifier.messages(NoticeLevel::Error), vec!["Server connection failed"]);
        assert_eq!(notifier.last().unwrap().level, NoticeLevel::Info);

        notifier.clear();
        assert!(notifier.last().is_none());
    }

    #[test]
    fn test_notice_ids_are_unique() {
        let a = Notice::new(NoticeLevel::Info, "a");
        let b = Notice::new(NoticeLevel::Info, "a");
        assert_ne!(a.id, b.id);
    }
}
