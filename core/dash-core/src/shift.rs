//! Active-shift tracking.
//!
//! The server is the sole authority on which shift is active. Every operation
//! replaces local state with what the server returned; nothing is inferred by
//! diffing old and new state. A failed call leaves local state untouched.

use crate::api::ApiClient;
use crate::error::{Result, ValidationError};
use crate::transport::Transport;
use nightwatch_protocol::{RecordId, Shift, StartShiftResponse};
use std::cell::RefCell;
use tracing::info;

/// Which of the server's three start outcomes occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyActive,
    /// A new shift inherited this many incomplete tasks.
    Carried(u32),
}

impl StartOutcome {
    pub fn from_response(response: &StartShiftResponse) -> Self {
        if response.carried() > 0 {
            StartOutcome::Carried(response.carried())
        } else if response.was_already_active() {
            StartOutcome::AlreadyActive
        } else {
            StartOutcome::Started
        }
    }

    pub fn message(&self) -> String {
        match self {
            StartOutcome::Started => "Shift started.".to_string(),
            StartOutcome::AlreadyActive => "Shift already active.".to_string(),
            StartOutcome::Carried(count) => format!("Carried {} task(s).", count),
        }
    }
}

#[derive(Debug, Default)]
pub struct ShiftTracker {
    current: RefCell<Option<Shift>>,
}

impl ShiftTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Shift> {
        self.current.borrow().clone()
    }

    pub fn has_active(&self) -> bool {
        self.current.borrow().is_some()
    }

    pub fn active_id(&self) -> Option<RecordId> {
        self.current.borrow().as_ref().map(|shift| shift.id.clone())
    }

    /// Fetches the current shift and replaces local state with it, absent included.
    pub async fn refresh<T: Transport>(&self, api: &ApiClient<T>) -> Result<Option<Shift>> {
        let shift = api.current_shift().await?;
        self.current.replace(shift.clone());
        Ok(shift)
    }

    pub async fn start<T: Transport>(&self, api: &ApiClient<T>) -> Result<StartOutcome> {
        let response = api.start_shift().await?;
        let outcome = StartOutcome::from_response(&response);
        info!(shift_id = %response.shift.id, outcome = ?outcome, "Shift start acknowledged");
        self.current.replace(Some(response.shift));
        Ok(outcome)
    }

    /// Ends the active shift, then re-fetches for authority.
    ///
    /// `on_ended` runs once the end request has succeeded and before the
    /// re-fetch; the dashboard uses it to clear the task ledger.
    pub async fn end<T: Transport>(&self, api: &ApiClient<T>, on_ended: impl FnOnce()) -> Result<()> {
        api.end_shift().await?;
        info!("Shift ended");
        on_ended();
        self.refresh(api).await?;
        Ok(())
    }

    /// Saves notes on the active shift. Fails locally, without a request, when
    /// no shift is active.
    pub async fn save_notes<T: Transport>(&self, api: &ApiClient<T>, notes: &str) -> Result<Shift> {
        let shift_id = self.active_id().ok_or(ValidationError::NoActiveShift)?;
        let shift = api.save_notes(&shift_id, notes).await?;
        self.current.replace(Some(shift.clone()));
        Ok(shift)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClientError, TransportError};
    use crate::testing::{Reply, ScriptedTransport};
    use nightwatch_protocol::Endpoint;
    use serde_json::json;

    fn shift_json(id: &str) -> serde_json::Value {
        json!({"id": id, "started_at": "2024-01-01T00:00:00Z", "ended_at": null, "notes": ""})
    }

    #[tokio::test]
    async fn refresh_replaces_state_with_absent() {
        let transport = ScriptedTransport::new();
        transport.respond(Endpoint::current_shift(), Reply::json(shift_json("s1")));
        transport.respond(Endpoint::current_shift(), Reply::json(json!(null)));
        let api = ApiClient::new(transport);
        let tracker = ShiftTracker::new();

        tracker.refresh(&api).await.unwrap();
        assert_eq!(tracker.active_id(), Some(RecordId::from("s1")));

        tracker.refresh(&api).await.unwrap();
        assert!(!tracker.has_active());
    }

    #[tokio::test]
    async fn start_with_carried_tasks_reports_count() {
        let transport = ScriptedTransport::new();
        transport.respond(
            Endpoint::start_shift(),
            Reply::json(json!({
                "shift": {"id": "s1", "started_at": "2024-01-01T00:00:00Z"},
                "carried_task_count": 2
            })),
        );
        let api = ApiClient::new(transport);
        let tracker = ShiftTracker::new();

        let outcome = tracker.start(&api).await.unwrap();
        assert_eq!(outcome, StartOutcome::Carried(2));
        assert_eq!(outcome.message(), "Carried 2 task(s).");
        assert_eq!(tracker.active_id(), Some(RecordId::from("s1")));
    }

    #[tokio::test]
    async fn start_when_already_active_keeps_server_shift() {
        let transport = ScriptedTransport::new();
        transport.respond(Endpoint::current_shift(), Reply::json(shift_json("s7")));
        transport.respond(
            Endpoint::start_shift(),
            Reply::json(json!({
                "shift": shift_json("s7"),
                "carried_task_count": 0,
                "already_active": true
            })),
        );
        let api = ApiClient::new(transport);
        let tracker = ShiftTracker::new();
        tracker.refresh(&api).await.unwrap();

        let outcome = tracker.start(&api).await.unwrap();
        assert_eq!(outcome, StartOutcome::AlreadyActive);
        assert_eq!(tracker.active_id(), Some(RecordId::from("s7")));
    }

    #[tokio::test]
    async fn end_refetches_and_signals() {
        let transport = ScriptedTransport::new();
        transport.respond(Endpoint::current_shift(), Reply::json(shift_json("s1")));
        transport.respond(Endpoint::end_shift(), Reply::json(shift_json("s1")));
        transport.respond(Endpoint::current_shift(), Reply::json(json!(null)));
        let api = ApiClient::new(transport);
        let tracker = ShiftTracker::new();
        tracker.refresh(&api).await.unwrap();

        let mut signalled = false;
        tracker.end(&api, || signalled = true).await.unwrap();

        assert!(signalled);
        assert_eq!(tracker.current(), None);
        assert_eq!(api.transport().count(&Endpoint::current_shift()), 2);
    }

    #[tokio::test]
    async fn failed_end_keeps_shift_and_skips_signal() {
        let transport = ScriptedTransport::new();
        transport.respond(Endpoint::current_shift(), Reply::json(shift_json("s1")));
        transport.respond(Endpoint::end_shift(), Reply::detail(409, "No active shift."));
        let api = ApiClient::new(transport);
        let tracker = ShiftTracker::new();
        tracker.refresh(&api).await.unwrap();

        let mut signalled = false;
        let err = tracker.end(&api, || signalled = true).await.unwrap_err();

        assert_eq!(err.to_string(), "No active shift.");
        assert!(!signalled);
        assert_eq!(tracker.active_id(), Some(RecordId::from("s1")));
    }

    #[tokio::test]
    async fn save_notes_without_shift_makes_no_request() {
        let api = ApiClient::new(ScriptedTransport::new());
        let tracker = ShiftTracker::new();

        let err = tracker.save_notes(&api, "hello").await.unwrap_err();

        assert_eq!(err, ClientError::Validation(ValidationError::NoActiveShift));
        assert_eq!(api.transport().request_count(), 0);
    }

    #[tokio::test]
    async fn save_notes_adopts_server_shift() {
        let transport = ScriptedTransport::new();
        transport.respond(Endpoint::current_shift(), Reply::json(shift_json("s1")));
        transport.respond(
            Endpoint::shift_notes(&RecordId::from("s1")),
            Reply::json(json!({
                "id": "s1", "started_at": "2024-01-01T00:00:00Z", "notes": "boiler ok"
            })),
        );
        let api = ApiClient::new(transport);
        let tracker = ShiftTracker::new();
        tracker.refresh(&api).await.unwrap();

        tracker.save_notes(&api, "boiler ok").await.unwrap();
        assert_eq!(tracker.current().map(|shift| shift.notes), Some("boiler ok".to_string()));
    }

    #[tokio::test]
    async fn failed_save_leaves_notes_unchanged() {
        let transport = ScriptedTransport::new();
        transport.respond(Endpoint::current_shift(), Reply::json(shift_json("s1")));
        transport.respond(
            Endpoint::shift_notes(&RecordId::from("s1")),
            Reply::network_error("Network error: connection refused"),
        );
        let api = ApiClient::new(transport);
        let tracker = ShiftTracker::new();
        tracker.refresh(&api).await.unwrap();

        let err = tracker.save_notes(&api, "lost").await.unwrap_err();
        assert_eq!(
            err,
            ClientError::Transport(TransportError::Network(
                "Network error: connection refused".to_string()
            ))
        );
        assert_eq!(tracker.current().map(|shift| shift.notes), Some(String::new()));
    }
}
