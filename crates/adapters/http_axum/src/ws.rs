//! WebSocket push channels, one endpoint per topic.
//!
//! Each connection subscribes to the broadcast hub, then runs two halves
//! until either ends: a writer draining the subscription into the socket
//! and a reader feeding client frames to ingestion. The subscriber is
//! removed from the hub whichever way the connection closes.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};

use homewatch_app::broadcast_hub::{BroadcastHub, Subscription};
use homewatch_app::event_bus::EventSender;
use homewatch_app::ingest;
use homewatch_app::ports::Store;
use homewatch_domain::topic::Topic;

use crate::state::AppState;

/// `GET /dashboard/ws` — current value per device.
pub async fn dashboard<S>(ws: WebSocketUpgrade, State(state): State<AppState<S>>) -> Response
where
    S: Store + 'static,
{
    upgrade(ws, &state, Topic::Dashboard)
}

/// `GET /protocol/ws` — log entries.
pub async fn protocol<S>(ws: WebSocketUpgrade, State(state): State<AppState<S>>) -> Response
where
    S: Store + 'static,
{
    upgrade(ws, &state, Topic::Protocol)
}

/// `GET /alarm/ws` — alarm list; accepts `acknowledge_alarm` frames.
pub async fn alarm<S>(ws: WebSocketUpgrade, State(state): State<AppState<S>>) -> Response
where
    S: Store + 'static,
{
    upgrade(ws, &state, Topic::Alarm)
}

fn upgrade<S>(ws: WebSocketUpgrade, state: &AppState<S>, topic: Topic) -> Response {
    let hub = Arc::clone(&state.hub);
    let events = state.events.clone();
    ws.on_upgrade(move |socket| serve(socket, hub, events, topic))
}

async fn serve(socket: WebSocket, hub: Arc<BroadcastHub>, events: EventSender, topic: Topic) {
    let subscription = match hub.subscribe(topic).await {
        Ok(subscription) => subscription,
        Err(err) => {
            tracing::warn!(%topic, error = ?err, "could not subscribe, closing connection");
            return;
        }
    };
    let id = subscription.id;
    let (sink, stream) = socket.split();

    tokio::select! {
        () = write(sink, subscription) => {}
        () = read(stream, topic, &events) => {}
    }

    hub.unsubscribe(topic, id).await;
    tracing::debug!(%topic, subscriber = %id, "connection closed");
}

async fn write(
    mut sink: futures::stream::SplitSink<WebSocket, Message>,
    mut subscription: Subscription,
) {
    while let Some(message) = subscription.recv().await {
        let text = match serde_json::to_string(message.as_ref()) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(%err, kind = message.kind(), "could not encode push message");
                continue;
            }
        };
        if sink.send(Message::Text(text.into())).await.is_err() {
            break;
        }
    }
    // Hub dropped us (slow consumer) or the peer went away.
    let _ = sink.close().await;
}

async fn read(mut stream: futures::stream::SplitStream<WebSocket>, topic: Topic, events: &EventSender) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                if let Some(event) = ingest::decode_client_message(topic, text.as_str()) {
                    // Bus pressure is logged by the sender.
                    let _ = events.enqueue(event);
                }
            }
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }
}
