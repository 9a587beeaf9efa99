use std::sync::Arc;

use {
    herald_config::{HeraldConfig, ReconnectMode},
    herald_dispatch::PacingPolicy,
    herald_engine::MessengerEngine,
    herald_sessions::{NotificationBridge, ReconnectPolicy, SessionRegistry},
};

/// Shared gateway runtime state, wrapped in Arc for use across async tasks.
pub struct GatewayState {
    pub registry: SessionRegistry,
    pub bridge: NotificationBridge,
    pub config: HeraldConfig,
    pub engine_id: &'static str,
    pub version: String,
}

impl GatewayState {
    pub fn new(config: HeraldConfig, engine: Arc<dyn MessengerEngine>) -> Arc<Self> {
        let bridge = NotificationBridge::new();
        let reconnect = match config.sessions.reconnect {
            ReconnectMode::Teardown => ReconnectPolicy::Teardown,
            ReconnectMode::Reinitialize => ReconnectPolicy::Reinitialize,
        };
        let engine_id = engine.id();
        let registry = SessionRegistry::new(engine, bridge.clone(), reconnect);
        Arc::new(Self {
            registry,
            bridge,
            config,
            engine_id,
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// The configured default pacing, used when a request has no override.
    pub fn default_policy(&self) -> PacingPolicy {
        PacingPolicy::from_millis(
            self.config.pacing.per_message_delay_ms,
            self.config.pacing.batch_size,
            self.config.pacing.inter_batch_delay_ms,
        )
    }
}
