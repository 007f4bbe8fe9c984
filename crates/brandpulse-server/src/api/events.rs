use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
    Extension,
};
use brandpulse_core::MonitorEvent;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_monitor_error, parse_brand_id, ApiError, AppState};

/// Upgrade to a WebSocket that streams the brand's snapshots and alerts as
/// JSON text frames.
pub(super) async fn brand_events(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(brand_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let brand_id = parse_brand_id(&brand_id)?;
    let monitor = state.scheduler.monitor();
    monitor
        .brand(brand_id)
        .await
        .map_err(|e| map_monitor_error(&req_id.0, e))?;

    let events = monitor.notifier().subscribe(brand_id);
    Ok(ws.on_upgrade(move |socket| relay(socket, brand_id, events)))
}

async fn relay(socket: WebSocket, brand_id: Uuid, mut events: broadcast::Receiver<MonitorEvent>) {
    let (mut sender, mut receiver) = socket.split();
    tracing::info!(brand_id = %brand_id, "event stream opened");

    loop {
        tokio::select! {
            result = events.recv() => {
                let event = match result {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(brand_id = %brand_id, skipped, "event stream lagged");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                let Some(frame) = encode_event(&event) else {
                    continue;
                };
                if sender.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    tracing::info!(brand_id = %brand_id, "event stream closed");
}

pub(super) fn encode_event(event: &MonitorEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(frame) => Some(frame),
        Err(e) => {
            tracing::warn!(brand_id = %event.brand_id(), error = %e, "failed to encode event");
            None
        }
    }
}
