use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use cadence_core::types::DbId;
use cadence_db::models::notification::Notification;
use cadence_events::{DeliveryCallback, DeliveryError, DeliveryRegistry};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::middleware::auth::LiveAuthUser;
use crate::state::AppState;

/// How long the sender task gets to flush a final Close frame.
const CLOSE_FLUSH_SECS: u64 = 5;

/// Frames a viewer may have queued before it counts as stalled.
const LIVE_QUEUE_CAPACITY: usize = 64;

/// A frame pushed to live viewers.
#[derive(Debug, Serialize)]
pub struct LiveFrame<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub data: &'a Notification,
}

impl<'a> LiveFrame<'a> {
    pub fn notification(data: &'a Notification) -> Self {
        Self {
            kind: "notification",
            data,
        }
    }
}

/// GET /api/v1/notifications/live
///
/// Authenticates before upgrading, so a bad token is a plain 401.
pub async fn live_handler(
    LiveAuthUser(auth): LiveAuthUser,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let heartbeat = Duration::from_secs(state.config.ws_heartbeat_secs);
    let registry = state.registry.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, auth.user_id, registry, heartbeat))
}

/// Delivery callback that queues a text frame for the socket's sender task.
///
/// A full queue means the viewer is not keeping up; the error tears the
/// channel down and the viewer reconnects and re-reads its inbox.
fn queue_callback(frames: mpsc::Sender<Message>) -> DeliveryCallback {
    Arc::new(move |notification: &Notification| {
        let text = serde_json::to_string(&LiveFrame::notification(notification))
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        frames
            .try_send(Message::Text(text.into()))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    DeliveryError::Transport("live viewer queue is full".into())
                }
                mpsc::error::TrySendError::Closed(_) => DeliveryError::Disconnected,
            })
    })
}

/// Manage a single live connection after upgrade.
///
/// 1. Subscribes a callback that queues notification frames.
/// 2. Spawns a sender task that forwards queued frames to the sink.
/// 3. Reads inbound frames, pings on the heartbeat, and watches for the
///    registry tearing the channel down.
/// 4. Drops the subscription and flushes a Close frame on exit.
async fn handle_socket(
    socket: WebSocket,
    user_id: DbId,
    registry: DeliveryRegistry,
    heartbeat: Duration,
) {
    let conn_id = uuid::Uuid::new_v4().to_string();

    let (tx, mut rx) = mpsc::channel::<Message>(LIVE_QUEUE_CAPACITY);
    let subscription = registry.subscribe(user_id, queue_callback(tx.clone()));

    tracing::info!(
        conn_id = %conn_id,
        user_id,
        channel_id = subscription.channel_id(),
        "Live channel connected"
    );

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
            if closing {
                break;
            }
        }
    });

    let mut ping = tokio::time::interval(heartbeat);
    // The first tick completes immediately.
    ping.tick().await;

    loop {
        tokio::select! {
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(Message::Pong(_))) => {
                    tracing::trace!(conn_id = %conn_id, "Pong received");
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                    break;
                }
            },
            () = subscription.closed() => {
                tracing::debug!(conn_id = %conn_id, "Live channel torn down");
                let _ = tokio::time::timeout(
                    Duration::from_secs(CLOSE_FLUSH_SECS),
                    tx.send(Message::Close(None)),
                )
                .await;
                break;
            }
            _ = ping.tick() => {
                // A full queue already has traffic in flight; skip this ping.
                if let Err(mpsc::error::TrySendError::Closed(_)) =
                    tx.try_send(Message::Ping(Bytes::new()))
                {
                    break;
                }
            }
        }
    }

    subscription.unsubscribe();
    drop(tx);

    let abort = send_task.abort_handle();
    if tokio::time::timeout(Duration::from_secs(CLOSE_FLUSH_SECS), send_task)
        .await
        .is_err()
    {
        abort.abort();
    }

    tracing::info!(conn_id = %conn_id, user_id, "Live channel disconnected");
}
