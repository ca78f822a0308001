//! # nightwatch-core
//!
//! Client-side synchronization and polling engine for the Nightwatch shift
//! ledger dashboard.
//!
//! ## Design Principles
//!
//! - **Server is authoritative**: every refresh replaces local state wholesale.
//! - **Single-threaded**: state lives in `RefCell`s and is driven on one
//!   cooperative runtime; no borrow is held across an `.await`.
//! - **Nothing is fatal**: command and refresh failures become notices or a
//!   stale health state; the session stays interactive.
//! - **Transport is a seam**: the engine runs against `HttpTransport` in
//!   production and `testing::ScriptedTransport` in tests.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nightwatch_core::{Dashboard, HttpTransport, PreferenceStore, Command};
//!
//! let transport = HttpTransport::new("http://127.0.0.1:8037")?;
//! let (dashboard, events) = Dashboard::new(transport, DEFAULT_NOTICE_TTL, PreferenceStore::in_memory());
//! dashboard.bootstrap().await;
//! dashboard.dispatch(Command::StartShift).await;
//! ```

pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod health;
pub mod ledger;
pub mod notice;
pub mod optimistic;
pub mod prefs;
pub mod scheduler;
pub mod session;
pub mod shift;
pub mod storage;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod transport;

pub use api::ApiClient;
pub use config::{load_config, DashConfig};
pub use dashboard::{Command, Dashboard, DashboardView, UiEvent};
pub use error::{ClientError, ConfigError, Result, TransportError, ValidationError};
pub use health::{HealthPoller, Liveness};
pub use ledger::{TaskEntry, TaskLedger, TaskSummary};
pub use notice::{Notifier, DEFAULT_NOTICE_TTL};
pub use optimistic::apply_tentative;
pub use prefs::{PreferenceStore, Preferences};
pub use scheduler::{run_scheduler, Cycle, Schedule};
pub use session::run_session;
pub use shift::{ShiftTracker, StartOutcome};
pub use storage::StorageConfig;
pub use transport::{HttpTransport, Transport};
