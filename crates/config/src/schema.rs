//! Config schema: gateway bind address, default pacing, session policy.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeraldConfig {
    pub gateway: GatewayConfig,
    pub pacing: PacingConfig,
    pub sessions: SessionsConfig,
}

/// Where the HTTP/WebSocket server listens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 18790,
        }
    }
}

/// Default dispatch pacing, used when a request carries no override.
/// All delays may be zero; `batch_size` must stay at least 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub per_message_delay_ms: u64,
    pub batch_size: usize,
    pub inter_batch_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            per_message_delay_ms: 0,
            batch_size: 1,
            inter_batch_delay_ms: 0,
        }
    }
}

/// Session lifecycle policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    /// "teardown" (default) or "reinitialize" after an engine disconnect.
    pub reconnect: ReconnectMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReconnectMode {
    #[default]
    Teardown,
    Reinitialize,
}

impl HeraldConfig {
    /// Reject values a running gateway cannot work with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.pacing.batch_size == 0 {
            anyhow::bail!("pacing.batch_size must be at least 1");
        }
        if self.gateway.bind.is_empty() {
            anyhow::bail!("gateway.bind must not be empty");
        }
        Ok(())
    }
}
