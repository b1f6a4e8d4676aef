use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink, stream::SplitStream};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

use super::api::{ProjectReview, SharedState, to_rows};
use crate::review::ReviewEvent;

/// Interval between keepalive pings.
const PING_EVERY: Duration = Duration::from_secs(30);

/// A client silent for this long after a ping is dropped.
const PONG_DEADLINE: Duration = Duration::from_secs(60);

/// Ping/pong bookkeeping for one socket.
#[derive(Debug)]
struct Keepalive {
    last_pong: Instant,
    pending_ping: bool,
}

impl Keepalive {
    fn new(now: Instant) -> Self {
        Self {
            last_pong: now,
            pending_ping: false,
        }
    }

    /// Called when a ping is due. Returns `false` if the peer is dead.
    fn ping_due(&mut self, now: Instant) -> bool {
        if self.pending_ping && now.duration_since(self.last_pong) > PONG_DEADLINE {
            return false;
        }
        self.pending_ping = true;
        true
    }

    fn pong(&mut self, now: Instant) {
        self.last_pong = now;
        self.pending_ping = false;
    }
}

// ── WebSocket message types ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    /// Sent once on connect so the client can render without polling.
    /// Only events with a higher `revision` follow it.
    Snapshot {
        revision: u64,
        reviews: Vec<ProjectReview>,
    },
    Review { event: ReviewEvent },
}

impl WsMessage {
    fn to_text(&self) -> Option<String> {
        match serde_json::to_string(self) {
            Ok(json) => Some(json),
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize WsMessage");
                None
            }
        }
    }
}

// ── WebSocket handler ────────────────────────────────────────────────

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: SharedState) {
    let (mut sender, receiver) = socket.split();
    // Subscribe before taking the snapshot so no event falls in between; the
    // ones already in it are skipped by revision.
    let rx = state.controller.subscribe();
    let (revision, reviews) = state.controller.snapshot_with_revision();
    let snapshot = WsMessage::Snapshot {
        revision,
        reviews: to_rows(reviews),
    };
    if let Some(text) = snapshot.to_text()
        && sender.send(Message::Text(text.into())).await.is_err()
    {
        return;
    }
    run_socket_loop(sender, receiver, rx, revision).await;
}

/// Forward review events to the client until it leaves or stops answering pings.
async fn run_socket_loop(
    mut sender: SplitSink<WebSocket, Message>,
    mut receiver: SplitStream<WebSocket>,
    mut rx: broadcast::Receiver<ReviewEvent>,
    snapshot_revision: u64,
) {
    let mut pings = tokio::time::interval_at(Instant::now() + PING_EVERY, PING_EVERY);
    let mut keepalive = Keepalive::new(Instant::now());

    loop {
        tokio::select! {
            _ = pings.tick() => {
                if !keepalive.ping_due(Instant::now()) {
                    tracing::debug!("websocket client stopped answering pings");
                    break;
                }
                if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }
            received = rx.recv() => {
                let event = match received {
                    Ok(event) if event.is_newer_than(snapshot_revision) => event,
                    Ok(_) => continue,
                    // Later events carry full state, so dropped ticks are harmless.
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "websocket client lagged");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let Some(text) = (WsMessage::Review { event }).to_text() else {
                    continue;
                };
                if sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            frame = receiver.next() => match frame {
                Some(Ok(Message::Pong(_))) => keepalive.pong(Instant::now()),
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    let _ = sender.send(Message::Close(None)).await;
}
