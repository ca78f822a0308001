//! Single commands run against the API, printing a result and exiting.

use crate::render::{empty_hint, shift_line, system_line, task_line};
use nightwatch_core::{
    ClientError, DashConfig, Dashboard, DashboardView, HttpTransport, PreferenceStore, Transport,
};
use nightwatch_protocol::RecordId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Status,
    StartShift,
    EndShift,
    Tasks,
    Add(String),
    Done(RecordId),
    Reopen(RecordId),
    Remove(RecordId),
    Notes(String),
}

pub fn status_report(view: &DashboardView) -> String {
    let system = match &view.snapshot {
        Some(snapshot) => format!("System: {} ({})", system_line(snapshot), view.health_label),
        None => format!("System: {}", view.health_label),
    };
    [shift_line(view.shift.as_ref()), format!("Tasks: {}", view.summary), system].join("\n")
}

/// Tasks oldest first. Entries without a creation time follow, in server order.
pub fn task_listing(view: &DashboardView) -> String {
    if view.tasks.is_empty() {
        return empty_hint(view.shift.is_some()).to_string();
    }
    let mut entries = view.tasks.clone();
    entries.sort_by_key(|entry| (entry.task.created_at.is_none(), entry.task.created_at));
    entries.iter().map(task_line).collect::<Vec<_>>().join("\n")
}

/// Reconciles shift and tasks, then performs `action`.
pub async fn execute<T: Transport>(
    dashboard: &Dashboard<T>,
    action: Action,
) -> Result<String, ClientError> {
    dashboard.refresh_shift().await?;
    dashboard.refresh_tasks().await?;

    match action {
        Action::Status => {
            dashboard.poll_health().await;
            Ok(status_report(&dashboard.view()))
        }
        Action::StartShift => Ok(dashboard.start_shift().await?.message()),
        Action::EndShift => {
            dashboard.end_shift().await?;
            Ok("Shift ended.".to_string())
        }
        Action::Tasks => Ok(task_listing(&dashboard.view())),
        Action::Add(title) => {
            dashboard.create_task(&title).await?;
            Ok(format!("Added: {}", title.trim()))
        }
        Action::Done(id) => {
            dashboard.set_task_completed(&id, true).await?;
            Ok(format!("Completed {}.", id))
        }
        Action::Reopen(id) => {
            dashboard.set_task_completed(&id, false).await?;
            Ok(format!("Reopened {}.", id))
        }
        Action::Remove(id) => {
            dashboard.delete_task(&id).await?;
            Ok(format!("Deleted {}.", id))
        }
        Action::Notes(text) => {
            dashboard.save_notes(&text).await?;
            Ok("Notes saved.".to_string())
        }
    }
}

pub async fn run(config: &DashConfig, action: Action) -> Result<(), String> {
    let transport = HttpTransport::new(config.base_url.as_str()).map_err(|err| err.to_string())?;
    let (dashboard, _events) = Dashboard::new(transport, config.notice_ttl, PreferenceStore::in_memory());
    let output = execute(&dashboard, action).await.map_err(|err| err.to_string())?;
    println!("{}", output);
    Ok(())
}
