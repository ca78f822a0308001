//! Plain-text frames for the terminal.

use chrono::Local;
use nightwatch_core::{DashboardView, TaskEntry};
use nightwatch_protocol::{Shift, SystemSnapshot};

pub fn shift_line(shift: Option<&Shift>) -> String {
    match shift {
        Some(shift) => format!(
            "Shift {} · started {}",
            shift.id,
            shift.started_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        ),
        None => "No active shift".to_string(),
    }
}

pub fn task_line(entry: &TaskEntry) -> String {
    let mark = if entry.checked { 'x' } else { ' ' };
    format!("[{}] {} {}", mark, entry.task.id, entry.task.title)
}

pub fn system_line(snapshot: &SystemSnapshot) -> String {
    let temp = snapshot
        .temp_c
        .map(|temp| format!("{:.0}°C", temp))
        .unwrap_or_else(|| "n/a".to_string());
    format!(
        "CPU {:.0}% · RAM {:.0}% ({:.0}/{:.0} MB) · Disk {:.0}% ({:.1}/{:.1} GB) · Temp {} · Net {}",
        snapshot.cpu_percent,
        snapshot.ram_percent,
        snapshot.ram_used_mb,
        snapshot.ram_total_mb,
        snapshot.disk_percent,
        snapshot.disk_used_gb,
        snapshot.disk_total_gb,
        temp,
        if snapshot.network_up { "up" } else { "down" }
    )
}

/// Hint shown in place of an empty task list.
pub fn empty_hint(has_shift: bool) -> &'static str {
    if has_shift {
        "No tasks yet."
    } else {
        "Start a shift to use the ledger."
    }
}

/// Focus mode drops the system and notes lines.
pub fn render_frame(view: &DashboardView) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Nightwatch · {}", view.health_label));
    lines.push(shift_line(view.shift.as_ref()));

    if !view.focus {
        if let Some(shift) = &view.shift {
            let notes = if shift.notes.trim().is_empty() {
                "(none)"
            } else {
                shift.notes.as_str()
            };
            lines.push(format!("Notes: {}", notes));
        }
        // A stale snapshot stays visible next to the offline label.
        match &view.snapshot {
            Some(snapshot) => lines.push(format!("System: {}", system_line(snapshot))),
            None => lines.push("System: no data".to_string()),
        }
    }

    lines.push(format!("Tasks: {}", view.summary));
    if view.tasks.is_empty() {
        lines.push(format!("  {}", empty_hint(view.shift.is_some())));
    } else {
        lines.extend(view.tasks.iter().map(|entry| format!("  {}", task_line(entry))));
    }

    if let Some(notice) = &view.notice {
        lines.push(format!("» {}", notice));
    }
    lines.join("\n")
}
