use serde::{Deserialize, Serialize};

/// What happened to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum Outcome {
    Sent,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientOutcome {
    /// Normalized engine address the delivery was attempted against.
    pub recipient: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Per-recipient outcomes, one entry per job recipient, in input order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchReport {
    pub outcomes: Vec<RecipientOutcome>,
}

impl DispatchReport {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn sent_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.outcome == Outcome::Sent)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.len() - self.sent_count()
    }

    /// One human-readable line per recipient, in input order.
    pub fn lines(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .map(|entry| match &entry.outcome {
                Outcome::Sent => format!("Message sent to {}", entry.recipient),
                Outcome::Failed { reason } => {
                    format!("Failed to send to {}: {reason}", entry.recipient)
                },
            })
            .collect()
    }
}
