use serde::{Deserialize, Serialize};

/// A session lifecycle event, published through the notification bridge to
/// whichever transport subscriber is attached to the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum SessionEvent {
    /// A fresh handshake code was issued. Re-issued codes re-emit this
    /// event; the previous code is dead the moment a new one arrives.
    HandshakeIssued { code: String },
    Authenticated,
    Ready,
    Disconnected { reason: String },
    Failed { reason: String },
}

impl SessionEvent {
    /// The kebab-case tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::HandshakeIssued { .. } => "handshake-issued",
            Self::Authenticated => "authenticated",
            Self::Ready => "ready",
            Self::Disconnected { .. } => "disconnected",
            Self::Failed { .. } => "failed",
        }
    }

    /// True for events after which the session is gone from the registry
    /// (unless the deployment reinitializes on disconnect).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Disconnected { .. } | Self::Failed { .. })
    }
}
