//! Transient notifications (toasts) raised by the client.
//!
//! The presentation layer decides how to render them. [`TracingNotifier`]
//! logs them, [`NoticeLog`] keeps them in memory for polling and tests.
//! A notice with a ttl stops being visible once the ttl has elapsed.

use crate::error::BankError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::time::Duration;

pub type NoticeId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub description: Option<String>,
    pub level: Level,
    /// `None` keeps the notice up until it is dismissed.
    pub ttl: Option<Duration>,
}

impl Notice {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { title: title.into(), description: Some(description.into()), level: Level::Info, ttl: None }
    }

    pub fn success(title: impl Into<String>, description: Option<String>, ttl: Duration) -> Self {
        Self { title: title.into(), description, level: Level::Success, ttl: Some(ttl) }
    }

    pub fn error(err: &BankError, ttl: Duration) -> Self {
        Self {
            title: err.title().to_string(),
            description: Some(err.to_string()),
            level: Level::Error,
            ttl: Some(ttl),
        }
    }
}

pub trait Notifier {
    fn show(&self, notice: Notice) -> NoticeId;
    fn dismiss(&self, id: NoticeId);
}

/// Writes every notice to the `tracing` log.
#[derive(Debug, Default)]
pub struct TracingNotifier {
    next: Cell<NoticeId>,
}

impl Notifier for TracingNotifier {
    fn show(&self, notice: Notice) -> NoticeId {
        let id = self.next.get() + 1;
        self.next.set(id);
        let description = notice.description.as_deref().unwrap_or("");
        match notice.level {
            Level::Error => tracing::error!(id, "{}: {}", notice.title, description),
            Level::Success => tracing::info!(id, "{}: {}", notice.title, description),
            Level::Info => tracing::info!(id, pending = notice.ttl.is_none(), "{}: {}", notice.title, description),
        }
        id
    }

    fn dismiss(&self, id: NoticeId) {
        tracing::debug!(id, "notice dismissed");
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoggedNotice {
    pub id: NoticeId,
    #[serde(flatten)]
    pub notice: Notice,
    pub dismissed: bool,
    #[serde(rename = "shownAt")]
    pub shown_at: DateTime<Utc>,
}

impl LoggedNotice {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.notice.ttl.map(chrono::Duration::from_std) {
            Some(Ok(ttl)) => now - self.shown_at >= ttl,
            _ => false,
        }
    }

    fn is_visible(&self, now: DateTime<Utc>) -> bool {
        !self.dismissed && !self.is_expired(now)
    }
}

/// In-memory notice history.
#[derive(Debug, Default)]
pub struct NoticeLog {
    entries: RefCell<Vec<LoggedNotice>>,
    next: Cell<NoticeId>,
}

impl NoticeLog {
    pub fn new() -> Self { Self::default() }

    pub fn all(&self) -> Vec<LoggedNotice> {
        self.entries.borrow().clone()
    }

    /// Notices neither dismissed nor past their ttl.
    pub fn visible(&self) -> Vec<LoggedNotice> {
        self.visible_at(Utc::now())
    }

    pub fn visible_at(&self, now: DateTime<Utc>) -> Vec<LoggedNotice> {
        self.entries.borrow().iter().filter(|e| e.is_visible(now)).cloned().collect()
    }

    /// Drop dismissed and expired entries. Returns how many were removed.
    pub fn prune(&self) -> usize {
        self.prune_at(Utc::now())
    }

    pub fn prune_at(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|e| e.is_visible(now));
        before - entries.len()
    }

    pub fn titles(&self) -> Vec<String> {
        self.entries.borrow().iter().map(|e| e.notice.title.clone()).collect()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

impl Notifier for NoticeLog {
    fn show(&self, notice: Notice) -> NoticeId {
        let id = self.next.get() + 1;
        self.next.set(id);
        self.entries.borrow_mut().push(LoggedNotice { id, notice, dismissed: false, shown_at: Utc::now() });
        id
    }

    fn dismiss(&self, id: NoticeId) {
        if let Some(entry) = self.entries.borrow_mut().iter_mut().find(|e| e.id == id) {
            entry.dismissed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_expire_after_ttl() {
        let log = NoticeLog::new();
        let start = Utc::now();
        let done = log.show(Notice::success("Deposit successful", None, Duration::from_secs(5)));
        let pending = log.show(Notice::info("Transaction Pending", "Your deposit is being processed..."));

        let ids = |at| log.visible_at(at).iter().map(|e| e.id).collect::<Vec<_>>();
        assert_eq!(ids(start + chrono::Duration::seconds(4)), vec![done, pending]);
        assert_eq!(ids(start + chrono::Duration::seconds(6)), vec![pending]);
        assert_eq!(log.all().len(), 2);

        // no ttl: stays until dismissed
        assert_eq!(ids(start + chrono::Duration::days(1)), vec![pending]);
        log.dismiss(pending);
        assert_eq!(log.prune_at(start + chrono::Duration::seconds(6)), 2);
        assert!(log.all().is_empty());
    }

    #[test]
    fn prune_keeps_live_notices() {
        let log = NoticeLog::new();
        let err = BankError::SelfTransfer;
        let id = log.show(Notice::error(&err, Duration::from_secs(5)));
        assert_eq!(log.prune(), 0);
        assert_eq!(log.visible().iter().map(|e| e.id).collect::<Vec<_>>(), vec![id]);
        assert_eq!(log.visible()[0].notice.title, err.title());
    }
}
