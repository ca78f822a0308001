//! Session timing on a paused tokio clock.

use nightwatch_core::testing::{Reply, ScriptedTransport};
use nightwatch_core::{run_session, Command, Dashboard, PreferenceStore, Schedule, UiEvent};
use nightwatch_protocol::Endpoint;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

fn healthy_dashboard() -> (Dashboard<ScriptedTransport>, mpsc::UnboundedReceiver<UiEvent>) {
    let (dash, events) = Dashboard::new(
        ScriptedTransport::new(),
        Duration::from_millis(2600),
        PreferenceStore::in_memory(),
    );
    let transport = dash.api().transport();
    transport.respond_always(Endpoint::current_shift(), Reply::json(Value::Null));
    transport.respond_always(Endpoint::current_tasks(), Reply::json(json!([])));
    transport.respond_always(
        Endpoint::system(),
        Reply::json(json!({
            "cpu_percent": 1.0, "ram_percent": 2.0, "ram_used_mb": 3, "ram_total_mb": 4,
            "disk_percent": 5.0, "disk_used_gb": 6.0, "disk_total_gb": 7.0,
            "network_up": true, "at": "2024-01-01T00:00:00Z"
        })),
    );
    (dash, events)
}

fn counts(dash: &Dashboard<ScriptedTransport>) -> (usize, usize, usize) {
    let transport = dash.api().transport();
    (
        transport.count(&Endpoint::system()),
        transport.count(&Endpoint::current_shift()),
        transport.count(&Endpoint::current_tasks()),
    )
}

#[tokio::test(start_paused = true)]
async fn cycles_fire_on_their_own_intervals() {
    let (dash, _events) = healthy_dashboard();
    let (_commands_tx, commands) = mpsc::unbounded_channel();
    let shutdown = CancellationToken::new();

    let checks = async {
        sleep(Duration::from_millis(100)).await;
        assert_eq!(counts(&dash), (1, 1, 1), "bootstrap fetches each once");

        sleep(Duration::from_secs(3)).await;
        assert_eq!(counts(&dash), (2, 1, 1));

        sleep(Duration::from_secs(2)).await;
        assert_eq!(counts(&dash), (2, 2, 2));

        sleep(Duration::from_secs(1)).await;
        assert_eq!(counts(&dash), (3, 2, 2));

        shutdown.cancel();
    };

    let schedule = Schedule::default();
    tokio::join!(
        run_session(&dash, &schedule, commands, shutdown.clone()),
        checks
    );
}

#[tokio::test(start_paused = true)]
async fn slow_health_does_not_delay_other_cycles_and_overlaps() {
    let (dash, _events) = healthy_dashboard();
    let transport = dash.api().transport();
    transport.respond(Endpoint::system(), Reply::json(json!({
        "cpu_percent": 1.0, "ram_percent": 2.0, "ram_used_mb": 3, "ram_total_mb": 4,
        "disk_percent": 5.0, "disk_used_gb": 6.0, "disk_total_gb": 7.0,
        "network_up": true, "at": "2024-01-01T00:00:00Z"
    })));
    transport.respond_always(
        Endpoint::system(),
        Reply::network_error("Network error: timed out").after(Duration::from_secs(20)),
    );
    let (_commands_tx, commands) = mpsc::unbounded_channel();
    let shutdown = CancellationToken::new();

    let checks = async {
        sleep(Duration::from_millis(10_100)).await;
        // Health ticks at 3, 6 and 9 are all still pending, yet each started.
        let (health, shift, tasks) = counts(&dash);
        assert_eq!(health, 4);
        assert_eq!((shift, tasks), (3, 3));
        assert!(dash.view().liveness.is_fresh(), "no slow poll has resolved yet");
        shutdown.cancel();
    };

    let schedule = Schedule::default();
    tokio::join!(
        run_session(&dash, &schedule, commands, shutdown.clone()),
        checks
    );
}

#[tokio::test(start_paused = true)]
async fn commands_run_and_notices_expire_during_session() {
    let (dash, mut events) = healthy_dashboard();
    let (commands_tx, commands) = mpsc::unbounded_channel();
    let shutdown = CancellationToken::new();

    let checks = async {
        sleep(Duration::from_millis(100)).await;
        commands_tx
            .send(Command::CreateTask("Check boiler".into()))
            .expect("session is receiving");
        sleep(Duration::from_millis(100)).await;
        assert_eq!(dash.view().notice.as_deref(), Some("Start a shift first."));

        sleep(Duration::from_millis(2600)).await;
        assert_eq!(dash.view().notice, None);
        shutdown.cancel();
    };

    let schedule = Schedule::default();
    tokio::join!(
        run_session(&dash, &schedule, commands, shutdown.clone()),
        checks
    );

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert!(seen.contains(&UiEvent::Notice("Start a shift first.".into())));
    assert!(seen.contains(&UiEvent::NoticeCleared));
}

#[tokio::test(start_paused = true)]
async fn closing_the_command_channel_ends_the_session() {
    let (dash, _events) = healthy_dashboard();
    let (commands_tx, commands) = mpsc::unbounded_channel::<Command>();
    drop(commands_tx);

    let schedule = Schedule::default();
    run_session(&dash, &schedule, commands, CancellationToken::new()).await;

    assert_eq!(counts(&dash), (1, 1, 1));
}
