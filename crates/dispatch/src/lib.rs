//! Rate-limited bulk dispatch.
//!
//! A [`DispatchJob`] pairs an ordered recipient list with one payload and
//! a [`PacingPolicy`]; [`dispatch`] walks the recipients strictly in
//! order through a ready session's engine client, sleeping between sends
//! so bursts never trip the messaging network's abuse detection. Each
//! recipient gets exactly one outcome in the [`DispatchReport`]; a single
//! failed delivery never aborts the batch.

pub mod job;
pub mod pacing;
pub mod report;
mod run;

pub use {
    job::{DispatchJob, Payload},
    pacing::PacingPolicy,
    report::{DispatchReport, Outcome, RecipientOutcome},
    run::dispatch,
};

/// Errors surfaced to the caller before any send is attempted.
/// Per-recipient delivery failures live in the report instead.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("session is not ready for dispatch")]
    NotReady,
    #[error("invalid dispatch job: {0}")]
    InvalidJob(String),
}
