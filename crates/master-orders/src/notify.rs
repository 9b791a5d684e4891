//! Administrative notices.
//!
//! The engine reports what it did (merges, blocked transitions, refused
//! removals) to a [`NotificationSink`]. Recording a notice cannot fail, so a
//! broken sink never aborts an engine operation.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    /// The record the notice is about, e.g. `master_3`.
    pub subject: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Notice {
    pub fn info(subject: impl ToString, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, subject, message)
    }

    pub fn warning(subject: impl ToString, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, subject, message)
    }

    fn new(level: NoticeLevel, subject: impl ToString, message: impl Into<String>) -> Self {
        Self {
            level,
            subject: subject.to_string(),
            message: message.into(),
            at: Utc::now(),
        }
    }
}

pub trait NotificationSink: Send + Sync {
    fn record(&self, notice: Notice);
}

/// Writes notices to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn record(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => info!(subject = %notice.subject, "{}", notice.message),
            NoticeLevel::Warning => warn!(subject = %notice.subject, "{}", notice.message),
        }
    }
}

/// Keeps notices in memory for display and inspection.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|notices| notices.clone())
            .unwrap_or_default()
    }

    pub fn warnings(&self) -> Vec<Notice> {
        self.notices()
            .into_iter()
            .filter(|n| n.level == NoticeLevel::Warning)
            .collect()
    }
}

impl NotificationSink for MemorySink {
    fn record(&self, notice: Notice) {
        // A poisoned lock only loses the notice.
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}

/// Forwards every notice to each inner sink.
#[derive(Clone, Default)]
pub struct Fanout {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl NotificationSink for Fanout {
    fn record(&self, notice: Notice) {
        for sink in &self.sinks {
            sink.record(notice.clone());
        }
    }
}
