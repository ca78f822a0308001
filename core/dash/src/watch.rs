//! Interactive session: scheduler, line-based command input, and a text
//! frame printed on every re-render signal.

use crate::render::render_frame;
use nightwatch_core::{
    run_session, Command, DashConfig, Dashboard, HttpTransport, PreferenceStore, Schedule,
    Transport, UiEvent,
};
use nightwatch_protocol::RecordId;
use std::io::{IsTerminal, Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub const HELP: &str = "\
Commands:
  start            start a shift
  end              end the active shift
  notes <text>     save shift notes
  add <title>      add a task
  done <id>        mark a task done
  reopen <id>      reopen a task
  rm <id>          delete a task
  focus            toggle focus mode
  help             show this help
  quit             leave the dashboard";

/// One parsed line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(Command),
    Help,
    Quit,
    Blank,
    Invalid(String),
}

pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let with_id = |make: fn(RecordId) -> Command| {
        if rest.is_empty() {
            Input::Invalid(format!("Usage: {} <id>", word))
        } else {
            Input::Command(make(RecordId::new(rest)))
        }
    };

    match word.to_ascii_lowercase().as_str() {
        "" => Input::Blank,
        "start" => Input::Command(Command::StartShift),
        "end" => Input::Command(Command::EndShift),
        "notes" => Input::Command(Command::SaveNotes(rest.to_string())),
        "add" => Input::Command(Command::CreateTask(rest.to_string())),
        "done" => with_id(|id| Command::SetTaskCompleted { id, completed: true }),
        "reopen" => with_id(|id| Command::SetTaskCompleted { id, completed: false }),
        "rm" | "delete" => with_id(Command::DeleteTask),
        "focus" => Input::Command(Command::ToggleFocus),
        "help" | "?" => Input::Help,
        "quit" | "exit" | "q" => Input::Quit,
        _ => Input::Invalid(format!("Unknown command: {}. Type help.", word)),
    }
}

/// Forwards operator commands until `quit`, end of input, or shutdown.
/// Cancels `shutdown` on the way out.
pub async fn read_commands<R, T>(
    reader: R,
    dashboard: &Dashboard<T>,
    commands: mpsc::UnboundedSender<Command>,
    shutdown: &CancellationToken,
) where
    R: AsyncBufRead + Unpin,
    T: Transport,
{
    let mut lines = reader.lines();
    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.next_line() => line,
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("Input closed");
                break;
            }
            Err(err) => {
                warn!(error = %err, "Failed to read input");
                break;
            }
        };

        match parse_input(&line) {
            Input::Command(command) => {
                if commands.send(command).is_err() {
                    break;
                }
            }
            Input::Help => print_block(HELP),
            Input::Quit => break,
            Input::Blank => {}
            Input::Invalid(message) => dashboard.notify(message),
        }
    }
    shutdown.cancel();
}

/// Draws nothing until bootstrap reports `Ready`, then one frame per burst
/// of events.
async fn render_loop<T, F>(
    dashboard: &Dashboard<T>,
    events: &mut mpsc::UnboundedReceiver<UiEvent>,
    shutdown: &CancellationToken,
    mut draw: F,
) where
    T: Transport,
    F: FnMut(&str),
{
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            event = events.recv() => match event {
                Some(UiEvent::Ready) => break,
                Some(_) => {}
                None => return,
            },
        }
    }
    draw(&render_frame(&dashboard.view()));

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            event = events.recv() => {
                if event.is_none() {
                    break;
                }
                // Coalesce a burst of events into one frame.
                while events.try_recv().is_ok() {}
                draw(&render_frame(&dashboard.view()));
            }
        }
    }
}

fn print_block(text: &str) {
    let mut out = std::io::stdout().lock();
    let separator = if out.is_terminal() { "─".repeat(60) } else { String::new() };
    let _ = writeln!(out, "{}\n{}", separator, text);
    let _ = out.flush();
}

async fn interrupt(shutdown: &CancellationToken) {
    tokio::select! {
        _ = shutdown.cancelled() => {}
        signal = tokio::signal::ctrl_c() => match signal {
            Ok(()) => {
                info!("Interrupted");
                shutdown.cancel();
            }
            Err(err) => {
                warn!(error = %err, "Failed to listen for Ctrl-C");
                shutdown.cancelled().await;
            }
        },
    }
}

pub async fn run(config: &DashConfig, focus: bool) -> Result<(), String> {
    let transport = HttpTransport::new(config.base_url.as_str()).map_err(|err| err.to_string())?;
    let prefs = PreferenceStore::load(config.storage().preferences_file());
    if focus && !prefs.focus() {
        if let Err(err) = prefs.set_focus(true) {
            warn!(error = %err, "Failed to save focus preference");
        }
    }

    let (dashboard, mut events) = Dashboard::new(transport, config.notice_ttl, prefs);
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let shutdown = CancellationToken::new();
    let schedule = Schedule::from(config);
    info!(base_url = %config.base_url, "Watching");

    tokio::join!(
        run_session(&dashboard, &schedule, commands_rx, shutdown.clone()),
        read_commands(
            BufReader::new(tokio::io::stdin()),
            &dashboard,
            commands_tx,
            &shutdown
        ),
        render_loop(&dashboard, &mut events, &shutdown, print_block),
        interrupt(&shutdown),
    );
    Ok(())
}
