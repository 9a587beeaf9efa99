use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use {
    serde::{Deserialize, Serialize},
    tokio::sync::RwLock,
    tokio_util::sync::CancellationToken,
};

use {
    herald_common::time::now_ms,
    herald_engine::{EngineClient, EngineEvent},
};

/// Where a session is in its lifecycle. `Disconnected` and `Failed` are
/// terminal: the registry entry is gone and callers must re-create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionState {
    Uninitialized,
    AwaitingHandshake,
    Authenticated,
    Ready,
    Disconnected,
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Disconnected | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::AwaitingHandshake => "awaiting-handshake",
            Self::Authenticated => "authenticated",
            Self::Ready => "ready",
            Self::Disconnected => "disconnected",
            Self::Failed => "failed",
        }
    }

    /// The state after an engine event. Events that don't move the machine
    /// (a handshake re-issue, a duplicate ready) leave it where it is.
    pub(crate) fn on_event(self, event: &EngineEvent) -> SessionState {
        match (self, event) {
            (_, EngineEvent::AuthFailure(_)) => Self::Failed,
            (_, EngineEvent::Disconnected(_)) => Self::Disconnected,
            (Self::AwaitingHandshake, EngineEvent::Authenticated) => Self::Authenticated,
            // Restored credentials may skip the handshake entirely.
            (Self::AwaitingHandshake | Self::Authenticated, EngineEvent::Ready) => Self::Ready,
            (state, _) => state,
        }
    }
}

/// Diagnostic snapshot returned by the status endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    pub session_id: String,
    pub state: SessionState,
    pub created_at: u64,
    pub last_event_at: u64,
}

/// One live session: exclusive owner of one engine client.
///
/// State transitions are applied by the registry's driver task; everything
/// else only reads. The cancellation token is how teardown reaches a
/// driver that is blocked on the engine's event stream.
pub struct ClientSession {
    id: String,
    state: RwLock<SessionState>,
    client: RwLock<Option<Arc<dyn EngineClient>>>,
    created_at: u64,
    last_event_at: AtomicU64,
    cancel: CancellationToken,
}

impl ClientSession {
    pub(crate) fn new(id: &str) -> Self {
        let now = now_ms();
        Self {
            id: id.to_string(),
            state: RwLock::new(SessionState::Uninitialized),
            client: RwLock::new(None),
            created_at: now,
            last_event_at: AtomicU64::new(now),
            cancel: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn state(&self) -> SessionState {
        *self.state.read().await
    }

    /// True only in [`SessionState::Ready`]; dispatch must reject work
    /// against anything else.
    pub async fn is_ready(&self) -> bool {
        self.state().await == SessionState::Ready
    }

    /// The engine client handle, if one is attached.
    pub async fn client(&self) -> Option<Arc<dyn EngineClient>> {
        self.client.read().await.clone()
    }

    pub async fn snapshot(&self) -> SessionStatus {
        SessionStatus {
            session_id: self.id.clone(),
            state: self.state().await,
            created_at: self.created_at,
            last_event_at: self.last_event_at.load(Ordering::Relaxed),
        }
    }

    pub(crate) async fn set_state(&self, next: SessionState) {
        *self.state.write().await = next;
    }

    pub(crate) fn touch(&self) {
        self.last_event_at.store(now_ms(), Ordering::Relaxed);
    }

    pub(crate) async fn attach_client(&self, client: Arc<dyn EngineClient>) {
        *self.client.write().await = Some(client);
    }

    /// Detach and disconnect the engine client, making further sends fail.
    pub(crate) async fn release_client(&self) {
        let client = self.client.write().await.take();
        if let Some(client) = client {
            client.disconnect().await;
        }
    }

    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }

    pub(crate) fn cancelled(&self) -> tokio_util::sync::WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_failure() -> EngineEvent {
        EngineEvent::AuthFailure("rejected".into())
    }

    fn disconnected() -> EngineEvent {
        EngineEvent::Disconnected("gone".into())
    }

    #[test]
    fn happy_path_transitions() {
        let s = SessionState::AwaitingHandshake;
        let s = s.on_event(&EngineEvent::HandshakeCode("abc".into()));
        assert_eq!(s, SessionState::AwaitingHandshake);
        let s = s.on_event(&EngineEvent::Authenticated);
        assert_eq!(s, SessionState::Authenticated);
        let s = s.on_event(&EngineEvent::Ready);
        assert_eq!(s, SessionState::Ready);
    }

    #[test]
    fn handshake_reissue_keeps_state() {
        let s = SessionState::AwaitingHandshake
            .on_event(&EngineEvent::HandshakeCode("first".into()))
            .on_event(&EngineEvent::HandshakeCode("second".into()));
        assert_eq!(s, SessionState::AwaitingHandshake);
    }

    #[test]
    fn restored_credentials_skip_authenticated() {
        let s = SessionState::AwaitingHandshake.on_event(&EngineEvent::Ready);
        assert_eq!(s, SessionState::Ready);
    }

    #[test]
    fn failures_terminal_from_any_state() {
        for state in [
            SessionState::Uninitialized,
            SessionState::AwaitingHandshake,
            SessionState::Authenticated,
            SessionState::Ready,
        ] {
            assert_eq!(state.on_event(&auth_failure()), SessionState::Failed);
            assert_eq!(state.on_event(&disconnected()), SessionState::Disconnected);
        }
        assert!(SessionState::Failed.is_terminal());
        assert!(SessionState::Disconnected.is_terminal());
        assert!(!SessionState::Ready.is_terminal());
    }

    #[test]
    fn stray_events_ignored() {
        // Ready out of nowhere in Uninitialized: the machine stays put.
        let s = SessionState::Uninitialized.on_event(&EngineEvent::Ready);
        assert_eq!(s, SessionState::Uninitialized);
        // Authenticated twice.
        let s = SessionState::Authenticated.on_event(&EngineEvent::Authenticated);
        assert_eq!(s, SessionState::Authenticated);
    }

    #[tokio::test]
    async fn is_ready_only_in_ready() {
        let session = ClientSession::new("u1");
        assert!(!session.is_ready().await);
        session.set_state(SessionState::Ready).await;
        assert!(session.is_ready().await);
        session.set_state(SessionState::Disconnected).await;
        assert!(!session.is_ready().await);
    }
}
