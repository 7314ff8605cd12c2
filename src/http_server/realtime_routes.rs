//! Realtime WebSocket Handler
//!
//! Each socket gets a task that drains the connection's outbound queue onto
//! the socket and reports pongs back to the broadcaster. A write that does
//! not complete within `SEND_TIMEOUT` ends the task, so a client that stops
//! reading cannot keep its socket open after eviction.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{Sink, SinkExt, StreamExt};

use crate::observability::{Event, Logger};
use crate::realtime::{outbound_queue, Broadcaster, Connection, Outbound};

/// Default per-connection outbound queue capacity
pub const DEFAULT_OUTBOUND_QUEUE_CAPACITY: usize = 64;

/// Longest a single frame write may take
pub const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Realtime state shared across handlers
pub struct RealtimeState {
    pub broadcaster: Arc<Broadcaster>,
    pub queue_capacity: usize,
}

impl RealtimeState {
    pub fn new(broadcaster: Arc<Broadcaster>) -> Self {
        Self {
            broadcaster,
            queue_capacity: DEFAULT_OUTBOUND_QUEUE_CAPACITY,
        }
    }
}

/// Create realtime routes
pub fn realtime_routes(state: Arc<RealtimeState>) -> Router {
    Router::new()
        .route("/", get(websocket_handler))
        .with_state(state)
}

/// Handle WebSocket upgrade request
async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<RealtimeState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// How the socket loop ended
enum Exit {
    /// Client closed or the transport failed
    Closed,
    /// Removed by the broadcaster
    Terminated,
}

/// Handle individual WebSocket connection
async fn handle_websocket(socket: WebSocket, state: Arc<RealtimeState>) {
    let (tx, mut rx) = outbound_queue(state.queue_capacity);
    let conn = Connection::new(tx);
    let connection_id = conn.id().to_string();

    if let Err(e) = state.broadcaster.join(conn) {
        let reason = e.to_string();
        Logger::event(
            Event::SendFailed,
            &[("connection", connection_id.as_str()), ("reason", reason.as_str())],
        );
        return;
    }

    let (mut sender, mut receiver) = socket.split();

    let exit = loop {
        tokio::select! {
            frame = rx.recv() => {
                let message = match frame {
                    Some(Outbound::Revision(revision)) => Message::Text(revision.to_string()),
                    Some(Outbound::Ping) => Message::Ping(Vec::new()),
                    Some(Outbound::Terminate) | None => break Exit::Terminated,
                };
                if !send_within(&mut sender, message, SEND_TIMEOUT).await {
                    break Exit::Closed;
                }
            }

            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Pong(_))) => {
                        state.broadcaster.mark_alive(&connection_id);
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break Exit::Closed,
                    // Client payloads carry no meaning here.
                    Some(Ok(_)) => {}
                }
            }
        }
    };

    match exit {
        Exit::Closed => {
            state.broadcaster.leave(&connection_id);
        }
        // Socket halves are dropped without a close frame.
        Exit::Terminated => {}
    }
}

/// Write one frame, giving up after `limit`.
///
/// Returns false if the write failed or timed out.
async fn send_within<S>(sink: &mut S, message: Message, limit: Duration) -> bool
where
    S: Sink<Message> + Unpin,
{
    matches!(
        tokio::time::timeout(limit, sink.send(message)).await,
        Ok(Ok(()))
    )
}
