//! Interface boundary to the underlying messaging engine.
//!
//! The engine is the component that actually speaks the messaging
//! network's protocol; herald treats it as an opaque collaborator. A
//! connected client delivers lifecycle events over a channel and accepts
//! outbound sends through [`EngineClient`]. The in-process
//! [`loopback::LoopbackEngine`] implements the same boundary for local
//! deployments and tests.

pub mod address;
pub mod event;
pub mod loopback;

use std::sync::Arc;

use {async_trait::async_trait, tokio::sync::mpsc};

use herald_common::MediaPayload;

pub use event::EngineEvent;

/// Errors crossing the engine boundary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine client is closed")]
    Closed,
    #[error("engine connect failed: {0}")]
    Connect(String),
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// One live connection: the send handle plus the event stream feeding the
/// session state machine. The receiver closing means the engine dropped
/// the connection without saying goodbye.
pub struct EngineConnection {
    pub client: Arc<dyn EngineClient>,
    pub events: mpsc::Receiver<EngineEvent>,
}

impl std::fmt::Debug for EngineConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConnection")
            .field("client", &"Arc<dyn EngineClient>")
            .field("events", &self.events)
            .finish()
    }
}

/// Factory for engine clients, one per session.
#[async_trait]
pub trait MessengerEngine: Send + Sync {
    /// Engine identifier (e.g. "loopback").
    fn id(&self) -> &'static str;

    /// Construct a fresh client for `session_id` and start driving it.
    async fn connect(&self, session_id: &str) -> Result<EngineConnection, EngineError>;
}

/// Outbound operations on one connected client.
///
/// Sends against a disconnected handle must fail with
/// [`EngineError::Closed`] rather than silently dropping the message.
#[async_trait]
pub trait EngineClient: Send + Sync {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), EngineError>;

    async fn send_media(
        &self,
        to: &str,
        media: &MediaPayload,
        caption: Option<&str>,
    ) -> Result<(), EngineError>;

    /// Release the underlying connection. Idempotent.
    async fn disconnect(&self);
}
