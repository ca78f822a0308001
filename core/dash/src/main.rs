//! nightwatch-dash: terminal dashboard for the Nightwatch shift ledger.
//!
//! ## Subcommands
//!
//! - `watch` (default): live dashboard, reads operator commands from stdin
//! - `status`, `tasks`: print current state
//! - `start-shift`, `end-shift`, `add`, `done`, `reopen`, `rm`, `notes`: one change, then exit

mod logging;
mod oneshot;
mod render;
mod watch;

use clap::{Parser, Subcommand};
use nightwatch_core::{load_config, DashConfig};
use nightwatch_protocol::RecordId;
use oneshot::Action;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nightwatch-dash")]
#[command(about = "Terminal dashboard for the Nightwatch shift ledger")]
#[command(version)]
struct Cli {
    /// Config file (default: ./nightwatch.toml, then ~/.config/nightwatch/nightwatch.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// API base URL, overriding config and environment
    #[arg(long, global = true, value_name = "URL")]
    url: Option<String>,

    /// Start in focus mode (hides the system and notes lines)
    #[arg(long)]
    focus: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Live dashboard (default)
    Watch,

    /// Show shift, task counts and system health
    Status,

    /// Start a shift (carries over open tasks)
    StartShift,

    /// End the active shift
    EndShift,

    /// List tasks of the active shift, oldest first
    Tasks,

    /// Add a task to the active shift
    Add {
        #[arg(required = true, num_args = 1.., value_name = "TITLE")]
        title: Vec<String>,
    },

    /// Mark a task done
    Done {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Reopen a completed task
    Reopen {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Delete a task
    Rm {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Replace the active shift's notes
    Notes {
        #[arg(num_args = 0.., value_name = "TEXT")]
        text: Vec<String>,
    },
}

impl Commands {
    /// `None` for the interactive session.
    fn into_action(self) -> Option<Action> {
        let action = match self {
            Commands::Watch => return None,
            Commands::Status => Action::Status,
            Commands::StartShift => Action::StartShift,
            Commands::EndShift => Action::EndShift,
            Commands::Tasks => Action::Tasks,
            Commands::Add { title } => Action::Add(title.join(" ")),
            Commands::Done { id } => Action::Done(RecordId::new(id)),
            Commands::Reopen { id } => Action::Reopen(RecordId::new(id)),
            Commands::Rm { id } => Action::Remove(RecordId::new(id)),
            Commands::Notes { text } => Action::Notes(text.join(" ")),
        };
        Some(action)
    }
}

fn resolve_config(cli: &Cli) -> Result<DashConfig, String> {
    let config = load_config(cli.config.as_deref()).map_err(|err| err.to_string())?;
    match &cli.url {
        Some(url) => config.with_base_url(url).map_err(|err| err.to_string()),
        None => Ok(config),
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            logging::init_stderr();
            tracing::error!(error = %err, "nightwatch-dash config failed");
            eprintln!("{}", err);
            std::process::exit(2);
        }
    };

    let action = cli.command.unwrap_or(Commands::Watch).into_action();
    let logging_guard = match action {
        None => logging::init_file(&config.storage().logs_dir()),
        Some(_) => {
            logging::init_stderr();
            None
        }
    };
    tracing::info!(source = ?config.source, base_url = %config.base_url, "Config loaded");

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            tracing::error!(error = %err, "Failed to start runtime");
            std::process::exit(1);
        }
    };

    let result = runtime.block_on(async {
        match action {
            None => watch::run(&config, cli.focus).await,
            Some(action) => oneshot::run(&config, action).await,
        }
    });
    // The stdin reader thread cannot be interrupted; don't wait for it.
    runtime.shutdown_background();

    if let Err(err) = result {
        tracing::error!(error = %err, "nightwatch-dash failed");
        eprintln!("{}", err);
        drop(logging_guard);
        std::process::exit(1);
    }
}
