//! The dashboard state container and command dispatcher.
//!
//! One `Dashboard` is owned by the session root and borrowed by the scheduler,
//! the command loop and the renderer. Every state change is announced on the
//! event channel; the view decides how to redraw.
//!
//! Command handlers return `Result` so they can be driven directly (one-shot
//! CLI, tests). `dispatch` is the interactive boundary: it turns every failure
//! into a notice and never propagates.

use crate::api::ApiClient;
use crate::error::{ClientError, Result, ValidationError};
use crate::health::{HealthPoller, Liveness};
use crate::ledger::{normalize_title, TaskEntry, TaskLedger, TaskSummary};
use crate::notice::Notifier;
use crate::prefs::PreferenceStore;
use crate::scheduler::Cycle;
use crate::shift::{ShiftTracker, StartOutcome};
use crate::transport::Transport;
use nightwatch_protocol::{RecordId, Shift, SystemSnapshot};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

// ═══════════════════════════════════════════════════════════════════════════════
// Commands & Events
// ═══════════════════════════════════════════════════════════════════════════════

/// One operator action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    StartShift,
    EndShift,
    SaveNotes(String),
    CreateTask(String),
    SetTaskCompleted { id: RecordId, completed: bool },
    DeleteTask(RecordId),
    ToggleFocus,
}

/// Re-render signal for the view layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    ShiftChanged,
    TasksChanged,
    HealthChanged,
    Notice(String),
    NoticeCleared,
    FocusChanged(bool),
    /// Bootstrap finished; shift, tasks and health have all been loaded once.
    Ready,
}

/// Everything the view needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub shift: Option<Shift>,
    pub tasks: Vec<TaskEntry>,
    pub summary: TaskSummary,
    pub snapshot: Option<SystemSnapshot>,
    pub liveness: Liveness,
    pub health_label: String,
    pub notice: Option<String>,
    pub focus: bool,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Dashboard
// ═══════════════════════════════════════════════════════════════════════════════

pub struct Dashboard<T: Transport> {
    api: ApiClient<T>,
    shift: ShiftTracker,
    ledger: TaskLedger,
    health: HealthPoller,
    notifier: Notifier,
    prefs: PreferenceStore,
    events: mpsc::UnboundedSender<UiEvent>,
}

impl<T: Transport> Dashboard<T> {
    pub fn new(
        transport: T,
        notice_ttl: Duration,
        prefs: PreferenceStore,
    ) -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let dashboard = Self {
            api: ApiClient::new(transport),
            shift: ShiftTracker::new(),
            ledger: TaskLedger::new(),
            health: HealthPoller::new(),
            notifier: Notifier::new(notice_ttl),
            prefs,
            events,
        };
        (dashboard, receiver)
    }

    pub fn api(&self) -> &ApiClient<T> {
        &self.api
    }

    pub fn shift(&self) -> &ShiftTracker {
        &self.shift
    }

    pub fn ledger(&self) -> &TaskLedger {
        &self.ledger
    }

    pub fn health(&self) -> &HealthPoller {
        &self.health
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn focus(&self) -> bool {
        self.prefs.focus()
    }

    pub fn view(&self) -> DashboardView {
        DashboardView {
            shift: self.shift.current(),
            tasks: self.ledger.entries(),
            summary: self.ledger.summary(),
            snapshot: self.health.snapshot(),
            liveness: self.health.liveness(),
            health_label: self.health.status_label(),
            notice: self.notifier.visible(),
            focus: self.prefs.focus(),
        }
    }

    fn emit(&self, event: UiEvent) {
        // A closed channel only means nobody is rendering.
        let _ = self.events.send(event);
    }

    /// Shows a transient notice, replacing any current one.
    pub fn notify(&self, message: impl Into<String>) {
        let notice = self.notifier.show(message);
        self.emit(UiEvent::Notice(notice.message));
    }

    pub fn notice_deadline(&self) -> Option<Instant> {
        self.notifier.deadline()
    }

    pub async fn notice_shown(&self) {
        self.notifier.shown().await
    }

    pub fn clear_expired_notice(&self) -> bool {
        let cleared = self.notifier.clear_expired();
        if cleared {
            self.emit(UiEvent::NoticeCleared);
        }
        cleared
    }

    fn require_shift(&self) -> std::result::Result<(), ValidationError> {
        if self.shift.has_active() {
            Ok(())
        } else {
            Err(ValidationError::NoActiveShift)
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Command handlers
    // ───────────────────────────────────────────────────────────────────────────

    pub async fn start_shift(&self) -> Result<StartOutcome> {
        let outcome = self.shift.start(&self.api).await?;
        self.emit(UiEvent::ShiftChanged);
        self.notify(outcome.message());
        self.refresh_tasks().await?;
        Ok(outcome)
    }

    /// Ends the shift. The task list is emptied as soon as the server accepts
    /// the end request, before the authoritative shift re-fetch.
    pub async fn end_shift(&self) -> Result<()> {
        let ended = self
            .shift
            .end(&self.api, || {
                self.ledger.clear();
                self.emit(UiEvent::TasksChanged);
            })
            .await;
        self.emit(UiEvent::ShiftChanged);
        ended?;
        self.notify("Shift ended.");
        Ok(())
    }

    pub async fn save_notes(&self, notes: &str) -> Result<Shift> {
        let shift = self.shift.save_notes(&self.api, notes).await?;
        self.emit(UiEvent::ShiftChanged);
        self.notify("Notes saved.");
        Ok(shift)
    }

    pub async fn create_task(&self, title: &str) -> Result<()> {
        self.require_shift()?;
        let title = normalize_title(title)?;
        let created = self.ledger.create(&self.api, &title).await;
        self.emit(UiEvent::TasksChanged);
        created
    }

    pub async fn set_task_completed(&self, task_id: &RecordId, completed: bool) -> Result<()> {
        self.require_shift()?;
        let toggled = self
            .ledger
            .toggle_completion(&self.api, task_id, completed, || {
                self.emit(UiEvent::TasksChanged)
            })
            .await;
        self.emit(UiEvent::TasksChanged);
        toggled
    }

    pub async fn delete_task(&self, task_id: &RecordId) -> Result<()> {
        self.require_shift()?;
        self.ledger.delete(&self.api, task_id).await?;
        self.emit(UiEvent::TasksChanged);
        Ok(())
    }

    /// Flips focus mode. A failed save is reported but the new mode stays.
    pub fn toggle_focus(&self) -> bool {
        let focus = !self.prefs.focus();
        if let Err(err) = self.prefs.set_focus(focus) {
            warn!(error = %err, "Failed to save focus preference");
            self.notify(err);
        }
        self.emit(UiEvent::FocusChanged(focus));
        focus
    }

    /// Runs one command, containing any failure as a notice.
    pub async fn dispatch(&self, command: Command) {
        debug!(command = ?command, "Dispatching command");
        let result = match command {
            Command::StartShift => self.start_shift().await.map(|_| ()),
            Command::EndShift => self.end_shift().await,
            Command::SaveNotes(notes) => self.save_notes(&notes).await.map(|_| ()),
            Command::CreateTask(title) => self.create_task(&title).await,
            Command::SetTaskCompleted { id, completed } => {
                self.set_task_completed(&id, completed).await
            }
            Command::DeleteTask(id) => self.delete_task(&id).await,
            Command::ToggleFocus => {
                self.toggle_focus();
                Ok(())
            }
        };

        match result {
            Ok(()) => {}
            // Blank input is ignored, the same as pressing enter on an empty field.
            Err(ClientError::Validation(ValidationError::EmptyTitle)) => {
                debug!("Ignored empty task title");
            }
            Err(err) => {
                warn!(error = %err, "Command failed");
                self.notify(err.to_string());
            }
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Reconciliation
    // ───────────────────────────────────────────────────────────────────────────

    pub async fn refresh_shift(&self) -> Result<()> {
        self.shift.refresh(&self.api).await?;
        self.emit(UiEvent::ShiftChanged);
        Ok(())
    }

    pub async fn refresh_tasks(&self) -> Result<TaskSummary> {
        let summary = self.ledger.refresh(&self.api).await?;
        self.emit(UiEvent::TasksChanged);
        Ok(summary)
    }

    pub async fn poll_health(&self) -> Liveness {
        let liveness = self.health.poll(&self.api).await;
        self.emit(UiEvent::HealthChanged);
        liveness
    }

    /// One scheduled run. Failures keep prior state and become a notice;
    /// health failures only move the liveness state.
    pub async fn run_cycle(&self, cycle: Cycle) {
        let result = match cycle {
            Cycle::Health => {
                self.poll_health().await;
                Ok(())
            }
            Cycle::Shift => self.refresh_shift().await,
            Cycle::Tasks => self.refresh_tasks().await.map(|_| ()),
        };

        match result {
            Ok(()) => debug!(cycle = cycle.name(), "Cycle completed"),
            Err(err) => {
                warn!(cycle = cycle.name(), error = %err, "Refresh failed; keeping previous state");
                self.notify(err.to_string());
            }
        }
    }

    /// Initial shift fetch, then tasks, then health, strictly in that order.
    pub async fn bootstrap(&self) {
        for cycle in [Cycle::Shift, Cycle::Tasks, Cycle::Health] {
            self.run_cycle(cycle).await;
        }
        info!(
            shift = ?self.shift.active_id().map(|id| id.to_string()),
            tasks = self.ledger.summary().total,
            "Dashboard bootstrapped"
        );
        self.emit(UiEvent::Ready);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Reply, ScriptedTransport};
    use nightwatch_protocol::Endpoint;
    use serde_json::json;

    fn dashboard() -> (Dashboard<ScriptedTransport>, mpsc::UnboundedReceiver<UiEvent>) {
        Dashboard::new(
            ScriptedTransport::new(),
            Duration::from_millis(2600),
            PreferenceStore::in_memory(),
        )
    }

    fn drain(events: &mut mpsc::UnboundedReceiver<UiEvent>) -> Vec<UiEvent> {
        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        seen
    }

    fn shift_json(id: &str) -> serde_json::Value {
        json!({"id": id, "started_at": "2024-01-01T00:00:00Z"})
    }

    #[tokio::test]
    async fn create_without_shift_notifies_and_skips_network() {
        let (dash, mut events) = dashboard();

        dash.dispatch(Command::CreateTask("Check boiler".into())).await;

        assert_eq!(dash.api().transport().request_count(), 0);
        assert_eq!(dash.notifier().visible().as_deref(), Some("Start a shift first."));
        assert_eq!(
            drain(&mut events),
            vec![UiEvent::Notice("Start a shift first.".into())]
        );
    }

    #[tokio::test]
    async fn blank_title_is_silent() {
        let (dash, mut events) = dashboard();
        let transport = dash.api().transport();
        transport.respond(Endpoint::current_shift(), Reply::json(shift_json("s1")));
        dash.refresh_shift().await.unwrap();
        transport.clear_requests();
        drain(&mut events);

        dash.dispatch(Command::CreateTask("   ".into())).await;

        assert_eq!(transport.request_count(), 0);
        assert_eq!(dash.notifier().visible(), None);
        assert!(drain(&mut events).is_empty());
    }

    #[tokio::test]
    async fn blank_title_without_shift_asks_for_a_shift() {
        let (dash, mut events) = dashboard();

        dash.dispatch(Command::CreateTask("   ".into())).await;

        assert_eq!(dash.api().transport().request_count(), 0);
        assert_eq!(dash.notifier().visible().as_deref(), Some("Start a shift first."));
        assert_eq!(
            drain(&mut events),
            vec![UiEvent::Notice("Start a shift first.".into())]
        );
    }

    #[tokio::test]
    async fn start_notifies_outcome_and_loads_carried_tasks() {
        let (dash, _events) = dashboard();
        let transport = dash.api().transport();
        transport.respond(
            Endpoint::start_shift(),
            Reply::json(json!({"shift": shift_json("s1"), "carried_task_count": 2})),
        );
        transport.respond(
            Endpoint::current_tasks(),
            Reply::json(json!([
                {"id": "t1", "title": "a", "completed_at": null},
                {"id": "t2", "title": "b", "completed_at": null}
            ])),
        );

        dash.dispatch(Command::StartShift).await;

        assert_eq!(dash.notifier().visible().as_deref(), Some("Carried 2 task(s)."));
        assert_eq!(dash.ledger().summary().total, 2);
    }

    #[tokio::test]
    async fn end_clears_ledger_even_when_refetch_fails() {
        let (dash, _events) = dashboard();
        let transport = dash.api().transport();
        transport.respond(Endpoint::current_shift(), Reply::json(shift_json("s1")));
        transport.respond(
            Endpoint::current_tasks(),
            Reply::json(json!([{"id": "t1", "title": "a", "completed_at": null}])),
        );
        dash.refresh_shift().await.unwrap();
        dash.refresh_tasks().await.unwrap();
        transport.respond(Endpoint::end_shift(), Reply::no_content());
        transport.respond(Endpoint::current_shift(), Reply::network_error("connection reset"));

        let err = dash.end_shift().await.unwrap_err();

        assert_eq!(err.to_string(), "connection reset");
        assert!(dash.ledger().is_empty());
    }

    #[tokio::test]
    async fn failed_toggle_emits_tentative_and_reverted_frames() {
        let (dash, mut events) = dashboard();
        let transport = dash.api().transport();
        transport.respond(Endpoint::current_shift(), Reply::json(shift_json("s1")));
        transport.respond(
            Endpoint::current_tasks(),
            Reply::json(json!([{"id": "t1", "title": "a", "completed_at": null}])),
        );
        dash.bootstrap().await;
        drain(&mut events);
        let id = RecordId::from("t1");
        transport.respond(Endpoint::complete_task(&id), Reply::detail(409, "No active shift."));

        dash.dispatch(Command::SetTaskCompleted { id: id.clone(), completed: true })
            .await;

        assert_eq!(dash.ledger().is_checked(&id), Some(false));
        assert_eq!(dash.notifier().visible().as_deref(), Some("No active shift."));
        assert_eq!(
            drain(&mut events),
            vec![
                UiEvent::TasksChanged,
                UiEvent::TasksChanged,
                UiEvent::TasksChanged,
                UiEvent::Notice("No active shift.".into()),
            ]
        );
    }

    #[tokio::test]
    async fn bootstrap_runs_shift_tasks_health_in_order_and_contains_failures() {
        let (dash, _events) = dashboard();
        let transport = dash.api().transport();
        transport.respond(Endpoint::current_shift(), Reply::status(500, "oops"));
        transport.respond(Endpoint::current_tasks(), Reply::json(json!([])));
        transport.respond(Endpoint::system(), Reply::network_error("down"));

        dash.bootstrap().await;

        let order: Vec<Endpoint> = transport
            .requests()
            .into_iter()
            .map(|request| request.endpoint)
            .collect();
        assert_eq!(
            order,
            vec![Endpoint::current_shift(), Endpoint::current_tasks(), Endpoint::system()]
        );
        assert_eq!(dash.health().liveness(), Liveness::NeverOk);
        assert_eq!(
            dash.notifier().visible().as_deref(),
            Some("500 Internal Server Error")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn ready_follows_every_bootstrap_step() {
        let (dash, mut events) = dashboard();
        let transport = dash.api().transport();
        transport.respond(Endpoint::current_shift(), Reply::json(shift_json("s1")));
        transport.respond(
            Endpoint::current_tasks(),
            Reply::json(json!([{"id": "t1", "title": "a", "completed_at": null}]))
                .after(Duration::from_secs(1)),
        );
        transport.respond(Endpoint::system(), Reply::network_error("down"));

        let ((), early) = tokio::join!(dash.bootstrap(), async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            drain(&mut events)
        });

        assert_eq!(early, vec![UiEvent::ShiftChanged], "tasks still loading");
        assert_eq!(
            drain(&mut events),
            vec![UiEvent::TasksChanged, UiEvent::HealthChanged, UiEvent::Ready]
        );
        assert_eq!(dash.ledger().summary().total, 1);
    }

    #[tokio::test]
    async fn toggle_focus_flips_and_announces() {
        let (dash, mut events) = dashboard();

        assert!(dash.toggle_focus());
        assert!(!dash.toggle_focus());
        assert_eq!(
            drain(&mut events),
            vec![UiEvent::FocusChanged(true), UiEvent::FocusChanged(false)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn notice_clears_after_ttl() {
        let (dash, mut events) = dashboard();
        dash.notify("Notes saved.");
        assert!(!dash.clear_expired_notice());

        tokio::time::advance(Duration::from_millis(2600)).await;

        assert!(dash.clear_expired_notice());
        assert_eq!(dash.view().notice, None);
        assert_eq!(drain(&mut events).last(), Some(&UiEvent::NoticeCleared));
    }
}
