//! Periodic refresh cycles.
//!
//! Health, shift and task refreshes each run on their own interval with no
//! shared barrier. A slow or failing cycle never delays the others, and a tick
//! that fires while the previous run of the same cycle is still in flight
//! starts another run alongside it (overlaps are logged, not suppressed).

use crate::config::DashConfig;
use crate::dashboard::Dashboard;
use crate::transport::Transport;
use futures::future::{FutureExt, LocalBoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cycle {
    Health,
    Shift,
    Tasks,
}

impl Cycle {
    pub const ALL: [Cycle; 3] = [Cycle::Health, Cycle::Shift, Cycle::Tasks];

    pub fn name(&self) -> &'static str {
        match self {
            Cycle::Health => "health",
            Cycle::Shift => "shift",
            Cycle::Tasks => "tasks",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub health: Duration,
    pub shift: Duration,
    pub tasks: Duration,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            health: Duration::from_secs(3),
            shift: Duration::from_secs(5),
            tasks: Duration::from_secs(5),
        }
    }
}

impl From<&DashConfig> for Schedule {
    fn from(config: &DashConfig) -> Self {
        Self {
            health: config.health_interval,
            shift: config.shift_interval,
            tasks: config.task_interval,
        }
    }
}

impl Schedule {
    pub fn period(&self, cycle: Cycle) -> Duration {
        match cycle {
            Cycle::Health => self.health,
            Cycle::Shift => self.shift,
            Cycle::Tasks => self.tasks,
        }
    }
}

/// Runs `cycle` every `period`, first firing one period from now. Never returns.
pub async fn run_periodic<T: Transport>(dashboard: &Dashboard<T>, cycle: Cycle, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut in_flight: FuturesUnordered<LocalBoxFuture<'_, ()>> = FuturesUnordered::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !in_flight.is_empty() {
                    debug!(
                        cycle = cycle.name(),
                        pending = in_flight.len(),
                        "Previous run still in flight; starting another"
                    );
                }
                in_flight.push(dashboard.run_cycle(cycle).boxed_local());
            }
            Some(()) = in_flight.next(), if !in_flight.is_empty() => {}
        }
    }
}

/// Clears each notice once its display time has passed. Never returns.
pub async fn expire_notices<T: Transport>(dashboard: &Dashboard<T>) {
    loop {
        match dashboard.notice_deadline() {
            Some(deadline) => {
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => {
                        dashboard.clear_expired_notice();
                    }
                    _ = dashboard.notice_shown() => {}
                }
            }
            None => dashboard.notice_shown().await,
        }
    }
}

/// Drives all three cycles and notice expiry. Never returns; drop it to stop.
pub async fn run_scheduler<T: Transport>(dashboard: &Dashboard<T>, schedule: &Schedule) {
    tokio::join!(
        run_periodic(dashboard, Cycle::Health, schedule.health),
        run_periodic(dashboard, Cycle::Shift, schedule.shift),
        run_periodic(dashboard, Cycle::Tasks, schedule.tasks),
        expire_notices(dashboard),
    );
}
