use {
    tokio::time::sleep,
    tracing::{debug, warn},
};

use {
    herald_engine::{EngineClient, address::normalize_recipient},
    herald_sessions::ClientSession,
};

use crate::{
    DispatchError,
    job::{DispatchJob, Payload},
    report::{DispatchReport, Outcome, RecipientOutcome},
};

/// Execute one bulk send against a ready session.
///
/// Recipients are processed strictly in input order, one send at a time;
/// the pacing delays are the only suspension points. The call runs for
/// roughly the sum of its delays, so transports must treat it as a
/// long-running operation, not a fast request/response call.
///
/// A recipient whose delivery errors gets `Failed(reason)` and the batch
/// continues. If the session stops being ready mid-run (teardown,
/// disconnect), the remaining recipients are recorded as failures.
pub async fn dispatch(
    session: &ClientSession,
    job: &DispatchJob,
) -> Result<DispatchReport, DispatchError> {
    job.validate()?;
    if !session.is_ready().await {
        return Err(DispatchError::NotReady);
    }
    let client = session.client().await.ok_or(DispatchError::NotReady)?;

    let total = job.recipients.len();
    let mut report = DispatchReport::default();
    for (index, raw) in job.recipients.iter().enumerate() {
        let sent = index + 1;
        let recipient = normalize_recipient(raw);

        let outcome = if session.is_ready().await {
            match deliver(client.as_ref(), &recipient, &job.payload).await {
                Ok(()) => {
                    debug!(
                        session_id = session.id(),
                        recipient, sent, total, "delivered"
                    );
                    Outcome::Sent
                },
                Err(e) => {
                    warn!(
                        session_id = session.id(),
                        recipient, sent, total, error = %e, "delivery failed"
                    );
                    Outcome::Failed {
                        reason: e.to_string(),
                    }
                },
            }
        } else {
            Outcome::Failed {
                reason: "session no longer ready".into(),
            }
        };
        report.outcomes.push(RecipientOutcome { recipient, outcome });

        if let Some(pause) = job.policy.pause_after(sent, total) {
            sleep(pause).await;
        }
    }
    Ok(report)
}

async fn deliver(
    client: &dyn EngineClient,
    recipient: &str,
    payload: &Payload,
) -> Result<(), herald_engine::EngineError> {
    match payload {
        Payload::Text { body } => client.send_text(recipient, body).await,
        Payload::Media { media, caption } => {
            client.send_media(recipient, media, caption.as_deref()).await
        },
    }
}
