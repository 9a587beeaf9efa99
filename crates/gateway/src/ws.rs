//! WebSocket transport: the live view onto session lifecycle events.
//!
//! A connection subscribes to one or more sessions; the bridge fans each
//! session's events to the most recent subscriber. Handshake codes are
//! rendered to PNG data URLs here, on the way out, so the core stays free
//! of presentation concerns.

use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use {
    axum::extract::ws::{Message, WebSocket},
    futures::{SinkExt, StreamExt},
    tokio::{sync::mpsc, task::JoinHandle},
    tracing::{debug, warn},
};

use herald_protocol::{
    ErrorShape, SessionEvent, error_codes,
    frames::{ClientFrame, ServerFrame},
};

use crate::{qr, state::GatewayState};

pub async fn handle_connection(socket: WebSocket, state: Arc<GatewayState>, addr: SocketAddr) {
    debug!(%addr, "websocket connected");
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Single writer: everything funnels through one channel so frames
    // from handlers and event forwarders interleave safely.
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ServerFrame>();
    let writer = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            let Ok(json) = serde_json::to_string(&frame) else {
                continue;
            };
            if ws_tx.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut forwarders: HashMap<String, JoinHandle<()>> = HashMap::new();
    while let Some(Ok(msg)) = ws_rx.next().await {
        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        match serde_json::from_str::<ClientFrame>(text.as_str()) {
            Ok(frame) => handle_frame(frame, &state, &out_tx, &mut forwarders).await,
            Err(e) => {
                let _ = out_tx.send(ServerFrame::Error {
                    error: ErrorShape::new(error_codes::BAD_FRAME, e.to_string()),
                });
            },
        }
    }

    // A later connection may already have replaced our bridge senders;
    // stale ones are pruned on the next publish. Just stop the tasks.
    for (_, task) in forwarders {
        task.abort();
    }
    writer.abort();
    debug!(%addr, "websocket closed");
}

async fn handle_frame(
    frame: ClientFrame,
    state: &Arc<GatewayState>,
    out_tx: &mpsc::UnboundedSender<ServerFrame>,
    forwarders: &mut HashMap<String, JoinHandle<()>>,
) {
    match frame {
        ClientFrame::Subscribe { session_id } => {
            subscribe(state, out_tx, forwarders, &session_id);
            send_status(state, out_tx, &session_id).await;
        },
        ClientFrame::CreateSession { session_id } => {
            // Subscribe before creating so the first handshake code can't
            // slip past us.
            subscribe(state, out_tx, forwarders, &session_id);
            state.registry.get_or_create(&session_id).await;
            send_status(state, out_tx, &session_id).await;
        },
        ClientFrame::Teardown { session_id } => {
            let removed = state.registry.remove(&session_id).await;
            let _ = out_tx.send(ServerFrame::Teardown {
                session_id,
                removed,
            });
        },
    }
}

fn subscribe(
    state: &Arc<GatewayState>,
    out_tx: &mpsc::UnboundedSender<ServerFrame>,
    forwarders: &mut HashMap<String, JoinHandle<()>>,
    session_id: &str,
) {
    let events = state.bridge.attach(session_id);
    let task = tokio::spawn(forward_events(
        session_id.to_string(),
        events,
        out_tx.clone(),
    ));
    if let Some(previous) = forwarders.insert(session_id.to_string(), task) {
        previous.abort();
    }
}

async fn send_status(
    state: &Arc<GatewayState>,
    out_tx: &mpsc::UnboundedSender<ServerFrame>,
    session_id: &str,
) {
    let status = match state.registry.get(session_id).await {
        Some(session) => session.state().await.as_str().to_string(),
        None => "absent".to_string(),
    };
    let _ = out_tx.send(ServerFrame::Status {
        session_id: session_id.to_string(),
        state: status,
    });
}

async fn forward_events(
    session_id: String,
    mut events: mpsc::UnboundedReceiver<SessionEvent>,
    out_tx: mpsc::UnboundedSender<ServerFrame>,
) {
    while let Some(event) = events.recv().await {
        let handshake_image = match &event {
            SessionEvent::HandshakeIssued { code } => match qr::handshake_data_url(code) {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!(session_id, error = %e, "handshake render failed");
                    None
                },
            },
            _ => None,
        };
        let frame = ServerFrame::Event {
            session_id: session_id.clone(),
            event,
            handshake_image,
        };
        if out_tx.send(frame).is_err() {
            break;
        }
    }
}
