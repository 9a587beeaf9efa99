use serde::{Deserialize, Serialize};

use herald_common::MediaPayload;

use crate::{DispatchError, pacing::PacingPolicy};

/// What gets delivered to every recipient of a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "payload", rename_all = "kebab-case")]
pub enum Payload {
    Text {
        body: String,
    },
    Media {
        media: MediaPayload,
        caption: Option<String>,
    },
}

/// One bulk-send request: created per request, consumed by
/// [`dispatch`](crate::dispatch), discarded with its report.
#[derive(Debug, Clone)]
pub struct DispatchJob {
    /// Raw recipient addresses, order significant for result reporting.
    pub recipients: Vec<String>,
    pub payload: Payload,
    pub policy: PacingPolicy,
}

impl DispatchJob {
    pub fn text(recipients: Vec<String>, body: impl Into<String>, policy: PacingPolicy) -> Self {
        Self {
            recipients,
            payload: Payload::Text { body: body.into() },
            policy,
        }
    }

    pub fn media(
        recipients: Vec<String>,
        media: MediaPayload,
        caption: Option<String>,
        policy: PacingPolicy,
    ) -> Self {
        Self {
            recipients,
            payload: Payload::Media { media, caption },
            policy,
        }
    }

    /// Check everything that can be rejected before work starts.
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.recipients.is_empty() {
            return Err(DispatchError::InvalidJob("recipient list is empty".into()));
        }
        if self.policy.batch_size == 0 {
            return Err(DispatchError::InvalidJob("batch size must be at least 1".into()));
        }
        if let Payload::Media { media, .. } = &self.payload {
            if !media.is_complete() {
                return Err(DispatchError::InvalidJob(
                    "media payload needs mime type, filename and bytes".into(),
                ));
            }
        }
        Ok(())
    }
}
