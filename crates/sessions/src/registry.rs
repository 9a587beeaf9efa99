use std::{collections::HashMap, sync::Arc};

use {
    serde::{Deserialize, Serialize},
    tokio::sync::{RwLock, mpsc},
    tracing::{debug, info, warn},
};

use {
    herald_engine::{EngineEvent, MessengerEngine},
    herald_protocol::SessionEvent,
};

use crate::{
    notify::NotificationBridge,
    session::{ClientSession, SessionState},
};

/// What to do when a session's engine connection drops without an explicit
/// teardown. The default tears the session down and lets the caller
/// re-create; `reinitialize` re-runs the engine connect with a fresh
/// client under the same session id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReconnectPolicy {
    #[default]
    Teardown,
    Reinitialize,
}

/// Owns the only mutable map from session id to live session.
///
/// Creation is serialized through the map's write lock, so concurrent
/// `get_or_create` calls for one unseen id construct exactly one engine
/// client. Different ids proceed fully in parallel.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<Inner>,
}

struct Inner {
    engine: Arc<dyn MessengerEngine>,
    bridge: NotificationBridge,
    reconnect: ReconnectPolicy,
    sessions: RwLock<HashMap<String, Arc<ClientSession>>>,
}

impl SessionRegistry {
    pub fn new(
        engine: Arc<dyn MessengerEngine>,
        bridge: NotificationBridge,
        reconnect: ReconnectPolicy,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                engine,
                bridge,
                reconnect,
                sessions: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Return the live session for `session_id`, creating and initializing
    /// one if none exists. A session already in a terminal state counts as
    /// absent and is replaced.
    pub async fn get_or_create(&self, session_id: &str) -> Arc<ClientSession> {
        let mut sessions = self.inner.sessions.write().await;
        if let Some(existing) = sessions.get(session_id).map(Arc::clone) {
            if !existing.state().await.is_terminal() {
                return existing;
            }
            sessions.remove(session_id);
        }

        let session = Arc::new(ClientSession::new(session_id));
        sessions.insert(session_id.to_string(), Arc::clone(&session));
        drop(sessions);

        info!(session_id, engine = self.inner.engine.id(), "session created");
        let inner = Arc::clone(&self.inner);
        let driven = Arc::clone(&session);
        tokio::spawn(async move {
            drive_session(inner, driven).await;
        });
        session
    }

    /// Pure lookup; terminal or removed sessions read as absent.
    pub async fn get(&self, session_id: &str) -> Option<Arc<ClientSession>> {
        let session = {
            let sessions = self.inner.sessions.read().await;
            sessions.get(session_id).map(Arc::clone)
        }?;
        if session.state().await.is_terminal() {
            return None;
        }
        Some(session)
    }

    /// Tear down and remove a session. Safe to call when absent; returns
    /// whether anything was actually removed.
    pub async fn remove(&self, session_id: &str) -> bool {
        let removed = self.inner.sessions.write().await.remove(session_id);
        match removed {
            Some(session) => {
                debug!(session_id, "session teardown requested");
                session.cancel();
                true
            },
            None => false,
        }
    }

    /// Tear down every session. Called at process shutdown.
    pub async fn drain(&self) {
        let sessions: Vec<_> = {
            let mut map = self.inner.sessions.write().await;
            map.drain().map(|(_, s)| s).collect()
        };
        if !sessions.is_empty() {
            info!(count = sessions.len(), "draining sessions");
        }
        for session in sessions {
            session.cancel();
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Inner {
    /// Remove the entry for `id` only if it still holds this exact
    /// session. A re-created session under the same id stays untouched.
    async fn remove_entry(&self, id: &str, session: &Arc<ClientSession>) {
        let mut map = self.sessions.write().await;
        let same = map.get(id).is_some_and(|current| Arc::ptr_eq(current, session));
        if same {
            map.remove(id);
        }
    }
}

/// How one connect's event pump ended.
enum PumpEnd {
    /// Teardown was requested through the registry.
    Cancelled,
    Disconnected(String),
    Failed,
}

/// Drive one session: connect the engine, pump its events into state
/// transitions, and reconnect or remove on exit per policy.
async fn drive_session(inner: Arc<Inner>, session: Arc<ClientSession>) {
    let id = session.id().to_string();
    loop {
        let conn = match inner.engine.connect(&id).await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(session_id = %id, error = %e, "engine initialization failed");
                session.set_state(SessionState::Failed).await;
                inner.bridge.publish(&id, SessionEvent::Failed {
                    reason: e.to_string(),
                });
                break;
            },
        };
        session.attach_client(conn.client).await;
        session.set_state(SessionState::AwaitingHandshake).await;

        let end = pump_events(&inner, &session, conn.events).await;
        session.release_client().await;

        match end {
            PumpEnd::Cancelled => {
                session.set_state(SessionState::Disconnected).await;
                inner.bridge.publish(&id, SessionEvent::Disconnected {
                    reason: "session torn down".into(),
                });
                // remove() already dropped the entry.
                return;
            },
            PumpEnd::Disconnected(reason) => {
                if inner.reconnect == ReconnectPolicy::Reinitialize {
                    info!(session_id = %id, reason, "reinitializing after disconnect");
                    session.set_state(SessionState::Uninitialized).await;
                    continue;
                }
                break;
            },
            PumpEnd::Failed => break,
        }
    }
    inner.remove_entry(&id, &session).await;
    debug!(session_id = %id, "session removed");
}

/// Translate engine events into state transitions and bridge publishes
/// until the stream ends, the session fails, or teardown is requested.
async fn pump_events(
    inner: &Inner,
    session: &ClientSession,
    mut events: mpsc::Receiver<EngineEvent>,
) -> PumpEnd {
    let id = session.id();
    loop {
        let event = tokio::select! {
            _ = session.cancelled() => return PumpEnd::Cancelled,
            event = events.recv() => match event {
                Some(event) => event,
                None => {
                    let reason = "engine event stream closed".to_string();
                    session.set_state(SessionState::Disconnected).await;
                    inner.bridge.publish(id, SessionEvent::Disconnected {
                        reason: reason.clone(),
                    });
                    return PumpEnd::Disconnected(reason);
                },
            },
        };

        session.touch();
        let current = session.state().await;
        let next = current.on_event(&event);
        if next != current {
            debug!(session_id = id, from = current.as_str(), to = next.as_str(), "transition");
            session.set_state(next).await;
        }

        match event {
            EngineEvent::HandshakeCode(code) => {
                inner.bridge.publish(id, SessionEvent::HandshakeIssued { code });
            },
            EngineEvent::Authenticated => {
                inner.bridge.publish(id, SessionEvent::Authenticated);
            },
            EngineEvent::Ready => {
                inner.bridge.publish(id, SessionEvent::Ready);
            },
            EngineEvent::AuthFailure(reason) => {
                warn!(session_id = id, reason, "authentication failed");
                inner.bridge.publish(id, SessionEvent::Failed { reason });
                return PumpEnd::Failed;
            },
            EngineEvent::Disconnected(reason) => {
                inner.bridge.publish(id, SessionEvent::Disconnected {
                    reason: reason.clone(),
                });
                return PumpEnd::Disconnected(reason);
            },
        }
    }
}
