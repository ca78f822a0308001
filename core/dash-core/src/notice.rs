//! Transient operator notices.
//!
//! At most one notice is visible. Showing a new one replaces the current one
//! and restarts the expiry clock.

use std::cell::RefCell;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_millis(2600);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub expires_at: Instant,
}

#[derive(Debug)]
pub struct Notifier {
    ttl: Duration,
    current: RefCell<Option<Notice>>,
    changed: Notify,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_NOTICE_TTL)
    }
}

impl Notifier {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            current: RefCell::new(None),
            changed: Notify::new(),
        }
    }

    pub fn show(&self, message: impl Into<String>) -> Notice {
        let notice = Notice {
            message: message.into(),
            expires_at: Instant::now() + self.ttl,
        };
        self.current.replace(Some(notice.clone()));
        self.changed.notify_one();
        notice
    }

    /// The current message, unless it has expired.
    pub fn visible(&self) -> Option<String> {
        let now = Instant::now();
        self.current
            .borrow()
            .as_ref()
            .filter(|notice| notice.expires_at > now)
            .map(|notice| notice.message.clone())
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.current.borrow().as_ref().map(|notice| notice.expires_at)
    }

    /// Drops the current notice if it has expired. Returns whether one was dropped.
    pub fn clear_expired(&self) -> bool {
        let now = Instant::now();
        let mut current = self.current.borrow_mut();
        match current.as_ref() {
            Some(notice) if notice.expires_at <= now => {
                *current = None;
                true
            }
            _ => false,
        }
    }

    /// Resolves once a notice is shown (or was shown since the last wait).
    pub async fn shown(&self) {
        self.changed.notified().await;
    }
}
