//! End-to-end tests for the full homewatchd stack.
//!
//! Each test wires the complete application (in-memory `SQLite`, real
//! handlers, real dispatch loop, real axum router) and exercises it through
//! `tower::ServiceExt::oneshot` and direct hub subscriptions. The WebSocket
//! tests serve the router on an ephemeral local port.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures::{SinkExt, StreamExt};
use http_body_util::BodyExt;
use homewatch_adapter_http_axum::router;
use homewatch_adapter_http_axum::state::AppState;
use homewatch_adapter_simulator::SimulatorPlugin;
use homewatch_adapter_storage_sqlite_sqlx::pool::Config;
use homewatch_app::broadcast_hub::{BroadcastHub, Subscription};
use homewatch_app::dispatcher::{Dispatcher, DispatcherState};
use homewatch_app::event_bus;
use homewatch_app::handlers::{AlarmHandler, CommandHandler, LogHandler, ValueHandler};
use homewatch_app::plugin::PluginRegistry;
use homewatch_app::runtime::Runtime;
use homewatch_app::snapshots::StoreSnapshots;
use homewatch_app::ticker::Ticker;
use homewatch_domain::message::{PushMessage, Snapshot};
use homewatch_domain::topic::Topic;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tower::ServiceExt;

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct Stack {
    app: axum::Router,
    hub: Arc<BroadcastHub>,
    runtime: Runtime,
}

/// Wire and start the full stack on an in-memory database.
async fn stack(simulator: bool) -> Stack {
    let database = Config {
        database_url: "sqlite::memory:".to_string(),
    }
    .build()
    .await
    .expect("in-memory database should initialise");
    let store = Arc::new(database.store());

    let (events, receiver) = event_bus::channel(256);
    let hub = Arc::new(BroadcastHub::new(Arc::new(StoreSnapshots::new(
        Arc::clone(&store),
    ))));

    let mut plugins = PluginRegistry::new();
    if simulator {
        plugins.register(Arc::new(SimulatorPlugin::new(events.clone())));
    }

    let dispatcher = Dispatcher::builder()
        .handler(Arc::new(LogHandler::new(Arc::clone(&store), Arc::clone(&hub))))
        .handler(Arc::new(ValueHandler::new(
            Arc::clone(&store),
            Arc::clone(&hub),
            events.clone(),
        )))
        .handler(Arc::new(AlarmHandler::new(Arc::clone(&store), Arc::clone(&hub))))
        .handler(Arc::new(CommandHandler::new(events.clone())))
        .plugins(plugins)
        .poll_interval(Duration::from_millis(10))
        .build();
    let ticker = Ticker::new(Duration::from_secs(3600), events.clone());
    let runtime = Runtime::start(dispatcher, receiver, ticker, &events);

    let app = router::build(AppState::from_arcs(store, Arc::clone(&hub), events));
    Stack { app, hub, runtime }
}

async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post_event(app: &axum::Router, body: Value) -> StatusCode {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/events")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
}

/// Poll `uri` until `accept` holds for its JSON body, or give up after 2s.
async fn wait_for(app: &axum::Router, uri: &str, accept: impl Fn(&Value) -> bool) -> Value {
    for _ in 0..200 {
        let (status, body) = get_json(app, uri).await;
        assert_eq!(status, StatusCode::OK);
        if accept(&body) {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition on {uri} never held");
}

async fn next_push(subscription: &mut Subscription) -> Arc<PushMessage> {
    tokio::time::timeout(Duration::from_secs(2), subscription.recv())
        .await
        .expect("push should arrive")
        .expect("subscription should stay open")
}

fn non_empty(body: &Value) -> bool {
    body.as_array().is_some_and(|items| !items.is_empty())
}

/// Serve `app` on an ephemeral port and open a WebSocket to `path`.
async fn connect(app: &axum::Router, path: &str) -> (WsClient, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = app.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    let (socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}{path}"))
        .await
        .expect("websocket handshake should succeed");
    (socket, server)
}

/// Next JSON text frame from the server, skipping control frames.
async fn next_frame(socket: &mut WsClient) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), socket.next())
            .await
            .expect("frame should arrive")
            .expect("socket should stay open")
            .expect("frame should be readable");
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn raise_alarm(app: &axum::Router) -> Value {
    let status = post_event(
        app,
        serde_json::json!({
            "type": "ALARM",
            "payload": {
                "device_id": "boiler",
                "alarm_type": "Overheat",
                "active": true,
                "priority": 3,
                "message": "boiler too hot"
            }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let alarms = wait_for(app, "/api/alarms", non_empty).await;
    alarms[0]["id"].clone()
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let stack = stack(false).await;

    let response = stack
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    stack.runtime.shutdown().await;
}

// ---------------------------------------------------------------------------
// Event flow
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_persist_and_push_injected_log_entry() {
    let stack = stack(false).await;
    let mut protocol = stack.hub.subscribe(Topic::Protocol).await.unwrap();
    assert_eq!(
        *next_push(&mut protocol).await,
        PushMessage::InitialData(Snapshot::Entries { entries: vec![] })
    );

    let status = post_event(
        &stack.app,
        serde_json::json!({
            "type": "LOG",
            "payload": {"message": "door opened", "protocol": "MEROSS", "level": "WARNING"}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let PushMessage::NewEntry(entry) = next_push(&mut protocol).await.as_ref().clone() else {
        panic!("expected a new entry");
    };
    assert_eq!(entry.message, "door opened");

    let logs = wait_for(&stack.app, "/api/logs", non_empty).await;
    assert_eq!(logs[0]["protocol"], "MEROSS");
    assert_eq!(logs[0]["level"], "WARNING");
    stack.runtime.shutdown().await;
}

#[tokio::test]
async fn should_keep_first_reading_when_same_key_is_posted_twice() {
    let stack = stack(false).await;
    let mut dashboard = stack.hub.subscribe(Topic::Dashboard).await.unwrap();
    next_push(&mut dashboard).await;

    let reading = |value: f64| {
        serde_json::json!({
            "type": "VALUE",
            "payload": {
                "id": "sensor_1",
                "value_type": "temperature",
                "value": value,
                "unit": "°C",
                "timestamp": "2024-01-01T12:00:00Z"
            }
        })
    };
    assert_eq!(post_event(&stack.app, reading(21.5)).await, StatusCode::ACCEPTED);
    assert_eq!(post_event(&stack.app, reading(99.0)).await, StatusCode::ACCEPTED);

    // Both events refresh the dashboard; each carries the first stored value.
    for _ in 0..2 {
        let PushMessage::ValuesUpdate(Snapshot::Values { values }) =
            next_push(&mut dashboard).await.as_ref().clone()
        else {
            panic!("expected a values update");
        };
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].value, "21.5");
    }

    let current = wait_for(&stack.app, "/api/values", non_empty).await;
    assert_eq!(current[0]["device_id"], "sensor_1");
    assert_eq!(current[0]["value"], "21.5");
    stack.runtime.shutdown().await;
}

#[tokio::test]
async fn should_acknowledge_alarm_through_command() {
    let stack = stack(false).await;
    let alarm_id = raise_alarm(&stack.app).await;

    let mut alarm_channel = stack.hub.subscribe(Topic::Alarm).await.unwrap();
    let PushMessage::InitialData(Snapshot::Alarms { alarms }) =
        next_push(&mut alarm_channel).await.as_ref().clone()
    else {
        panic!("expected alarm initial_data");
    };
    assert_eq!(alarms.len(), 1);
    assert!(!alarms[0].acknowledged);

    let status = post_event(
        &stack.app,
        serde_json::json!({
            "type": "COMMAND",
            "payload": {"command_type": "acknowledge_alarm", "alarm_id": alarm_id}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    // An update from the ALARM event itself may still be in flight.
    loop {
        let PushMessage::AlarmUpdate(Snapshot::Alarms { alarms }) =
            next_push(&mut alarm_channel).await.as_ref().clone()
        else {
            panic!("expected an alarm update");
        };
        if alarms[0].acknowledged {
            break;
        }
    }

    let alarms = wait_for(&stack.app, "/api/alarms", |body| {
        body[0]["acknowledged"] == true
    })
    .await;
    assert_eq!(alarms.as_array().unwrap().len(), 1);
    stack.runtime.shutdown().await;
}

#[tokio::test]
async fn should_reject_internal_event_types() {
    let stack = stack(false).await;

    for event_type in ["START", "STOP", "CYCLE", "VALUE_CHANGED"] {
        let status = post_event(
            &stack.app,
            serde_json::json!({"type": event_type, "payload": {}}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{event_type}");
    }
    stack.runtime.shutdown().await;
}

// ---------------------------------------------------------------------------
// WebSocket
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_acknowledge_alarm_sent_over_websocket() {
    let stack = stack(false).await;
    let alarm_id = raise_alarm(&stack.app).await;
    let (mut socket, server) = connect(&stack.app, "/alarm/ws").await;

    let initial = next_frame(&mut socket).await;
    assert_eq!(initial["type"], "initial_data");
    assert_eq!(initial["data"]["alarms"][0]["id"], alarm_id);

    let ack = serde_json::json!({"type": "acknowledge_alarm", "data": {"alarm_id": alarm_id}});
    socket.send(Message::text(ack.to_string())).await.unwrap();

    loop {
        let update = next_frame(&mut socket).await;
        assert_eq!(update["type"], "alarm_update");
        if update["data"]["alarms"][0]["acknowledged"] == true {
            break;
        }
    }

    let _ = socket.close(None).await;
    server.abort();
    stack.runtime.shutdown().await;
}

#[tokio::test]
async fn should_keep_websocket_open_when_client_sends_malformed_frame() {
    let stack = stack(false).await;
    let alarm_id = raise_alarm(&stack.app).await;
    let (mut socket, server) = connect(&stack.app, "/alarm/ws").await;
    next_frame(&mut socket).await;

    socket.send(Message::text("not json")).await.unwrap();
    socket
        .send(Message::text(r#"{"type": "silence_alarm", "data": {}}"#))
        .await
        .unwrap();
    let ack = serde_json::json!({"type": "acknowledge_alarm", "data": {"alarm_id": alarm_id}});
    socket.send(Message::text(ack.to_string())).await.unwrap();

    loop {
        let update = next_frame(&mut socket).await;
        if update["data"]["alarms"][0]["acknowledged"] == true {
            break;
        }
    }
    let alarms = wait_for(&stack.app, "/api/alarms", |body| {
        body[0]["acknowledged"] == true
    })
    .await;
    assert_eq!(alarms.as_array().unwrap().len(), 1);

    let _ = socket.close(None).await;
    server.abort();
    stack.runtime.shutdown().await;
}

// ---------------------------------------------------------------------------
// Simulator and lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_record_simulated_telemetry_on_first_cycle() {
    let stack = stack(true).await;

    let values = wait_for(&stack.app, "/api/values", non_empty).await;
    assert_eq!(values[0]["device_id"], "simulated_device_1");
    assert_eq!(values[0]["value"], "22.1");

    let alarms = wait_for(&stack.app, "/api/alarms", non_empty).await;
    assert_eq!(alarms[0]["alarm_type"], "TemperatureThreshold");

    let logs = wait_for(&stack.app, "/api/logs", non_empty).await;
    assert_eq!(logs[0]["protocol"], "SIM");
    stack.runtime.shutdown().await;
}

#[tokio::test]
async fn should_stop_runtime_cleanly() {
    let stack = stack(true).await;
    let state = stack.runtime.state();

    tokio::time::timeout(Duration::from_secs(5), stack.runtime.shutdown())
        .await
        .expect("shutdown should complete");

    assert_eq!(*state.borrow(), DispatcherState::Stopped);
}
