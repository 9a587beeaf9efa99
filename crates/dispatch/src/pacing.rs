use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Delay rules limiting send rate within one dispatch.
///
/// After each send except the last the engine waits `per_message_delay`;
/// at a batch boundary (1-based sent count divisible by `batch_size`) it
/// waits `inter_batch_delay` *instead of* the per-message delay, never in
/// addition to it. The default policy is unthrottled sequential sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingPolicy {
    pub per_message_delay: Duration,
    pub batch_size: usize,
    pub inter_batch_delay: Duration,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            per_message_delay: Duration::ZERO,
            batch_size: 1,
            inter_batch_delay: Duration::ZERO,
        }
    }
}

impl PacingPolicy {
    pub fn from_millis(per_message_ms: u64, batch_size: usize, inter_batch_ms: u64) -> Self {
        Self {
            per_message_delay: Duration::from_millis(per_message_ms),
            batch_size,
            inter_batch_delay: Duration::from_millis(inter_batch_ms),
        }
    }

    /// The pause owed after the `sent`-th delivery (1-based) of `total`.
    /// `None` after the last send or when the applicable delay is zero.
    pub fn pause_after(&self, sent: usize, total: usize) -> Option<Duration> {
        if sent >= total {
            return None;
        }
        let batch = self.batch_size.max(1);
        let delay = if sent % batch == 0 {
            self.inter_batch_delay
        } else {
            self.per_message_delay
        };
        (delay > Duration::ZERO).then_some(delay)
    }
}
