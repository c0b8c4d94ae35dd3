//! Mounted console: realtime-driven refresh, polling fallback, teardown

mod helpers;

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use cities_console::realtime::{ChannelStatus, EventKind, RealtimeChannel, ReconnectPolicy};
use cities_console::transport::Reply;
use cities_console::{CityConsole, ConsoleConfig, EntityForm, FormOutcome};
use helpers::{
    api_over, city, event_frame, http_error, page_json, ConnectStep, ScriptedConnector,
    ScriptedTransport,
};

const URL: &str = "ws://localhost:8080/ws/cities";

fn config() -> ConsoleConfig {
    ConsoleConfig::default()
        .ws_url(URL)
        .poll_interval(Duration::from_secs(1))
}

fn held_open() -> Arc<ScriptedConnector> {
    ScriptedConnector::new(vec![ConnectStep::Open {
        frames: vec![],
        hold: true,
    }])
}

#[tokio::test(start_paused = true)]
async fn test_mount_loads_first_page_and_subscribes() {
    let transport = ScriptedTransport::new();
    transport.always_json("/all", page_json(&[city(1, "Tver")], 0, 1));
    let connector = held_open();
    let channel = Arc::new(RealtimeChannel::new(URL, connector.clone(), ReconnectPolicy::default()));

    let mut console = CityConsole::mount(api_over(&transport), channel.clone(), &config()).await;
    assert_eq!(transport.count("/all"), 1);
    assert_eq!(console.list().snapshot().cities.len(), 1);
    for kind in EventKind::ALL {
        assert_eq!(channel.listener_count(kind), 1);
    }

    sleep(Duration::from_millis(10)).await;
    assert_eq!(channel.status(), ChannelStatus::Connected);

    console.unmount().await;
    for kind in EventKind::ALL {
        assert_eq!(channel.listener_count(kind), 0);
    }
    assert_eq!(channel.status(), ChannelStatus::Closed);
    assert_eq!(connector.close_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_deleted_event_triggers_one_silent_refetch() {
    let transport = ScriptedTransport::new();
    transport.push_json("/all", page_json(&[city(7, "Tver"), city(8, "Pskov")], 0, 1));
    transport.always(
        "/all",
        Duration::from_millis(200),
        Ok(Reply::Json(page_json(&[city(8, "Pskov")], 0, 1))),
    );
    let channel = Arc::new(RealtimeChannel::new(URL, held_open(), ReconnectPolicy::default()));
    let mut console = CityConsole::mount(api_over(&transport), channel.clone(), &config()).await;
    assert_eq!(console.list().snapshot().cities.len(), 2);

    channel.dispatch_text(&event_frame("CITY_DELETED", json!({ "id": 7 })));

    sleep(Duration::from_millis(100)).await;
    assert_eq!(transport.count("/all"), 2);
    assert!(!console.list().snapshot().loading);

    sleep(Duration::from_millis(200)).await;
    let snapshot = console.list().snapshot();
    assert_eq!(transport.count("/all"), 2);
    assert_eq!(snapshot.cities.len(), 1);
    assert!(!snapshot.loading);

    console.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_channel_falls_back_to_polling() {
    let transport = ScriptedTransport::new();
    transport.always_json("/all", page_json(&[], 0, 0));
    let connector = ScriptedConnector::new(vec![]);
    let policy = ReconnectPolicy {
        base_delay: Duration::from_millis(10),
        max_delay: Duration::from_secs(1),
        max_attempts: 1,
    };
    let channel = Arc::new(RealtimeChannel::new(URL, connector.clone(), policy));
    let mut console = CityConsole::mount(api_over(&transport), channel.clone(), &config()).await;

    let mut status = channel.subscribe_status();
    status
        .wait_for(|s| *s == ChannelStatus::Exhausted)
        .await
        .unwrap();
    assert_eq!(connector.connect_count(), 2);

    sleep(Duration::from_millis(3500)).await;
    assert_eq!(transport.count("/all"), 4, "initial load plus three polls");

    console.unmount().await;
    sleep(Duration::from_secs(5)).await;
    assert_eq!(transport.count("/all"), 4, "polling stops on unmount");
}

#[tokio::test(start_paused = true)]
async fn test_saved_form_refreshes_list() {
    let transport = ScriptedTransport::new();
    transport.always_json("/all", page_json(&[city(42, "Tver")], 0, 1));
    transport.push("/update-by-id/42", Duration::ZERO, Ok(Reply::NoContent));
    let channel = Arc::new(RealtimeChannel::new(URL, held_open(), ReconnectPolicy::default()));
    let mut console = CityConsole::mount(api_over(&transport), channel, &config()).await;

    let mut form = EntityForm::new();
    form.open_for_edit(&console.list().snapshot().cities[0]);
    assert_eq!(console.submit_form(&mut form).await, FormOutcome::Saved);
    assert_eq!(transport.count("/all"), 2);

    console.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn test_update_of_vanished_city_refreshes_list() {
    let transport = ScriptedTransport::new();
    transport.push_json("/all", page_json(&[city(42, "Tver")], 0, 1));
    transport.always_json("/all", page_json(&[], 0, 0));
    transport.push(
        "/update-by-id/42",
        Duration::ZERO,
        Err(http_error(404, "City not found")),
    );
    let channel = Arc::new(RealtimeChannel::new(URL, held_open(), ReconnectPolicy::default()));
    let mut console = CityConsole::mount(api_over(&transport), channel, &config()).await;

    let mut form = EntityForm::new();
    form.open_for_edit(&console.list().snapshot().cities[0]);
    let outcome = console.submit_form(&mut form).await;
    assert!(matches!(outcome, FormOutcome::Failed(ref e) if e.is_not_found()));
    assert_eq!(transport.count("/all"), 2);
    assert!(console.list().snapshot().cities.is_empty());
    assert!(form.take_notices()[0].is_error());

    console.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn test_rejected_update_does_not_refresh_list() {
    let transport = ScriptedTransport::new();
    transport.always_json("/all", page_json(&[city(42, "Tver")], 0, 1));
    transport.push(
        "/update-by-id/42",
        Duration::ZERO,
        Err(http_error(409, "City with this name already exists")),
    );
    let channel = Arc::new(RealtimeChannel::new(URL, held_open(), ReconnectPolicy::default()));
    let mut console = CityConsole::mount(api_over(&transport), channel, &config()).await;

    let mut form = EntityForm::new();
    form.open_for_edit(&console.list().snapshot().cities[0]);
    assert!(matches!(
        console.submit_form(&mut form).await,
        FormOutcome::Failed(_)
    ));
    assert_eq!(transport.count("/all"), 1);
    assert!(form.is_open());

    console.unmount().await;
}
