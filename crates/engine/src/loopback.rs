//! In-process engine for local deployments and tests.
//!
//! The loopback engine performs no network I/O. In auto-advance mode a
//! connect immediately issues a handshake code and walks the session to
//! ready, which is what the default binary wiring uses; manual mode emits
//! nothing until the test drives it through [`LoopbackEngine::emit`].

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use {
    async_trait::async_trait,
    dashmap::DashMap,
    rand::Rng,
    tokio::sync::{Mutex, mpsc},
    tracing::debug,
};

use herald_common::MediaPayload;

use crate::{EngineClient, EngineConnection, EngineError, EngineEvent, MessengerEngine};

const EVENT_BUFFER: usize = 16;

/// One delivered message, recorded for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRecord {
    pub session_id: String,
    pub to: String,
    /// "text" or "media".
    pub kind: &'static str,
}

#[derive(Default)]
pub struct LoopbackEngine {
    auto_advance: bool,
    deny_marker: Option<String>,
    connect_error: Option<String>,
    connects: AtomicUsize,
    outbox: Arc<Mutex<Vec<SentRecord>>>,
    controls: DashMap<String, mpsc::Sender<EngineEvent>>,
}

impl LoopbackEngine {
    /// Auto-advancing engine: handshake code, authenticated, ready.
    pub fn new() -> Self {
        Self {
            auto_advance: true,
            ..Self::default()
        }
    }

    /// Engine that only issues the handshake code; everything after that
    /// comes from [`emit`](Self::emit).
    pub fn manual() -> Self {
        Self::default()
    }

    /// Fail every delivery to a recipient whose address contains `marker`.
    pub fn with_deny_marker(mut self, marker: impl Into<String>) -> Self {
        self.deny_marker = Some(marker.into());
        self
    }

    /// Fail every connect with the given message.
    pub fn with_connect_error(mut self, message: impl Into<String>) -> Self {
        self.connect_error = Some(message.into());
        self
    }

    /// How many clients this engine has constructed.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Push an event into a live session's stream. Returns false when the
    /// session has no live client.
    pub async fn emit(&self, session_id: &str, event: EngineEvent) -> bool {
        let Some(tx) = self.controls.get(session_id).map(|e| e.value().clone()) else {
            return false;
        };
        tx.send(event).await.is_ok()
    }

    /// Snapshot of everything sent through this engine, in send order.
    pub async fn outbox(&self) -> Vec<SentRecord> {
        self.outbox.lock().await.clone()
    }
}

#[async_trait]
impl MessengerEngine for LoopbackEngine {
    fn id(&self) -> &'static str {
        "loopback"
    }

    async fn connect(&self, session_id: &str) -> Result<EngineConnection, EngineError> {
        if let Some(msg) = &self.connect_error {
            return Err(EngineError::Connect(msg.clone()));
        }
        self.connects.fetch_add(1, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        self.controls.insert(session_id.to_string(), tx.clone());

        let client = Arc::new(LoopbackClient {
            session_id: session_id.to_string(),
            deny_marker: self.deny_marker.clone(),
            closed: AtomicBool::new(false),
            outbox: Arc::clone(&self.outbox),
        });

        let code = format!("LOOPBACK:{session_id}:{:08x}", rand::rng().random::<u32>());
        let auto_advance = self.auto_advance;
        tokio::spawn(async move {
            let _ = tx.send(EngineEvent::HandshakeCode(code)).await;
            if auto_advance {
                let _ = tx.send(EngineEvent::Authenticated).await;
                let _ = tx.send(EngineEvent::Ready).await;
            }
        });

        debug!(session_id, "loopback client connected");
        Ok(EngineConnection {
            client,
            events: rx,
        })
    }
}

struct LoopbackClient {
    session_id: String,
    deny_marker: Option<String>,
    closed: AtomicBool,
    outbox: Arc<Mutex<Vec<SentRecord>>>,
}

impl LoopbackClient {
    async fn deliver(&self, to: &str, kind: &'static str) -> Result<(), EngineError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(EngineError::Closed);
        }
        if let Some(marker) = &self.deny_marker {
            if to.contains(marker.as_str()) {
                return Err(EngineError::Delivery(format!(
                    "recipient {to} rejected by loopback deny rule"
                )));
            }
        }
        self.outbox.lock().await.push(SentRecord {
            session_id: self.session_id.clone(),
            to: to.to_string(),
            kind,
        });
        Ok(())
    }
}

#[async_trait]
impl EngineClient for LoopbackClient {
    async fn send_text(&self, to: &str, _body: &str) -> Result<(), EngineError> {
        self.deliver(to, "text").await
    }

    async fn send_media(
        &self,
        to: &str,
        _media: &MediaPayload,
        _caption: Option<&str>,
    ) -> Result<(), EngineError> {
        self.deliver(to, "media").await
    }

    async fn disconnect(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
