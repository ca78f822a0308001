//! Best-effort system health polling.
//!
//! ```text
//! poll ok    → Fresh                  (snapshot + success time recorded)
//! poll fails → Stale { since_ok }     if any poll has ever succeeded
//!            → NeverOk                otherwise
//! ```
//!
//! The last good snapshot is kept while stale so the view can keep showing it
//! next to the offline marker. Retrying is left to the next scheduled poll.

use crate::api::ApiClient;
use crate::error::TransportError;
use crate::transport::Transport;
use chrono::Local;
use nightwatch_protocol::SystemSnapshot;
use std::cell::RefCell;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Liveness {
    #[default]
    NeverOk,
    Fresh,
    /// Most recent poll failed; `since_ok` is measured at that failure.
    Stale { since_ok: Duration },
}

impl Liveness {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Liveness::Fresh)
    }
}

#[derive(Debug, Default)]
struct HealthState {
    liveness: Liveness,
    snapshot: Option<SystemSnapshot>,
    last_ok_at: Option<Instant>,
    consecutive_failures: u32,
    last_error: Option<String>,
}

#[derive(Debug, Default)]
pub struct HealthPoller {
    state: RefCell<HealthState>,
}

impl HealthPoller {
    pub fn new() -> Self {
        Self::default()
    }

    /// One poll attempt. Failures are absorbed into the state machine.
    pub async fn poll<T: Transport>(&self, api: &ApiClient<T>) -> Liveness {
        match api.system().await {
            Ok(snapshot) => self.record_success(snapshot, Instant::now()),
            Err(err) => self.record_failure(&err, Instant::now()),
        }
    }

    pub fn record_success(&self, snapshot: SystemSnapshot, now: Instant) -> Liveness {
        let mut state = self.state.borrow_mut();
        if state.consecutive_failures > 0 {
            debug!(
                failures = state.consecutive_failures,
                "System health recovered"
            );
        }
        state.snapshot = Some(snapshot);
        state.last_ok_at = Some(now);
        state.consecutive_failures = 0;
        state.last_error = None;
        state.liveness = Liveness::Fresh;
        state.liveness
    }

    pub fn record_failure(&self, err: &TransportError, now: Instant) -> Liveness {
        let mut state = self.state.borrow_mut();
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        state.last_error = Some(err.to_string());
        state.liveness = match state.last_ok_at {
            Some(last_ok_at) => Liveness::Stale {
                since_ok: now.saturating_duration_since(last_ok_at),
            },
            None => Liveness::NeverOk,
        };
        warn!(
            error = %err,
            failures = state.consecutive_failures,
            liveness = ?state.liveness,
            "System health poll failed"
        );
        state.liveness
    }

    pub fn liveness(&self) -> Liveness {
        self.state.borrow().liveness
    }

    pub fn snapshot(&self) -> Option<SystemSnapshot> {
        self.state.borrow().snapshot.clone()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.state.borrow().consecutive_failures
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.borrow().last_error.clone()
    }

    /// `updated HH:MM`, `offline (Ns)`, or `offline`.
    pub fn status_label(&self) -> String {
        let state = self.state.borrow();
        match (state.liveness, state.snapshot.as_ref()) {
            (Liveness::Fresh, Some(snapshot)) => format!(
                "updated {}",
                snapshot.at.with_timezone(&Local).format("%H:%M")
            ),
            (Liveness::Stale { since_ok }, _) => {
                format!("offline ({}s)", (since_ok.as_secs_f64()).round() as u64)
            }
            _ => "offline".to_string(),
        }
    }
}
