use std::sync::Arc;

use {dashmap::DashMap, tokio::sync::mpsc, tracing::trace};

use herald_protocol::SessionEvent;

/// Fans session lifecycle events out to whichever transport subscriber is
/// currently attached for a session id.
///
/// Delivery is fire-and-forget over an unbounded channel: publishing never
/// blocks, and events published while no subscriber is attached are
/// dropped, not queued. Attaching replaces any previous subscriber.
#[derive(Clone, Default)]
pub struct NotificationBridge {
    subscribers: Arc<DashMap<String, mpsc::UnboundedSender<SessionEvent>>>,
}

impl NotificationBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a subscriber for `session_id`, returning its event stream.
    /// A previously attached subscriber's stream ends.
    pub fn attach(&self, session_id: &str) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.insert(session_id.to_string(), tx);
        rx
    }

    /// Drop the subscriber for `session_id`, if any.
    pub fn detach(&self, session_id: &str) {
        self.subscribers.remove(session_id);
    }

    /// Publish one lifecycle event. Best-effort: no subscriber, no delivery.
    pub fn publish(&self, session_id: &str, event: SessionEvent) {
        let Some(entry) = self.subscribers.get(session_id) else {
            trace!(session_id, kind = event.kind(), "no subscriber, event dropped");
            return;
        };
        if entry.value().send(event).is_err() {
            // Receiver went away; clean up so the next publish is cheap.
            drop(entry);
            self.subscribers.remove(session_id);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
