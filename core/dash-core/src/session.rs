//! An interactive dashboard session.

use crate::dashboard::{Command, Dashboard};
use crate::scheduler::{run_scheduler, Schedule};
use crate::transport::Transport;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Bootstraps, then runs the scheduler alongside the command loop.
///
/// Commands are handled one at a time in arrival order; a slow command only
/// delays later commands, never the refresh cycles. Returns when `shutdown`
/// is cancelled or the command channel closes. In-flight work is dropped.
pub async fn run_session<T: Transport>(
    dashboard: &Dashboard<T>,
    schedule: &Schedule,
    mut commands: mpsc::UnboundedReceiver<Command>,
    shutdown: CancellationToken,
) {
    info!(
        health_ms = schedule.health.as_millis() as u64,
        shift_ms = schedule.shift.as_millis() as u64,
        tasks_ms = schedule.tasks.as_millis() as u64,
        "Session started"
    );

    let command_loop = async {
        while let Some(command) = commands.recv().await {
            dashboard.dispatch(command).await;
        }
        info!("Command channel closed");
    };

    let running = async {
        dashboard.bootstrap().await;
        tokio::select! {
            _ = run_scheduler(dashboard, schedule) => {}
            _ = command_loop => {}
        }
    };

    tokio::select! {
        _ = shutdown.cancelled() => info!("Session cancelled"),
        _ = running => {}
    }
}
