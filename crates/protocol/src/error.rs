use serde::{Deserialize, Serialize};

/// Stable error codes surfaced to external clients.
pub mod error_codes {
    pub const SESSION_NOT_FOUND: &str = "SESSION_NOT_FOUND";
    pub const SESSION_NOT_READY: &str = "SESSION_NOT_READY";
    pub const INVALID_JOB: &str = "INVALID_JOB";
    pub const BAD_FRAME: &str = "BAD_FRAME";
    pub const INTERNAL: &str = "INTERNAL";
}

/// The JSON error body every endpoint and frame uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorShape {
    pub code: String,
    pub message: String,
}

impl ErrorShape {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(session_id: &str) -> Self {
        Self::new(
            error_codes::SESSION_NOT_FOUND,
            format!("no session with id {session_id:?}"),
        )
    }

    pub fn not_ready(session_id: &str) -> Self {
        Self::new(
            error_codes::SESSION_NOT_READY,
            format!("session {session_id:?} is not ready for dispatch"),
        )
    }

    pub fn invalid_job(message: impl Into<String>) -> Self {
        Self::new(error_codes::INVALID_JOB, message)
    }
}

impl std::fmt::Display for ErrorShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}
