//! REST handlers: session lifecycle and bulk dispatch.
//!
//! Dispatch responses always carry one line per recipient in input order;
//! per-recipient delivery failures are data, not HTTP errors, so a partly
//! failed batch still returns 200. Only precondition violations (unknown
//! session, not ready, invalid job) map to error statuses.

use std::sync::Arc;

use {
    axum::{
        Json,
        extract::{Multipart, Path, State},
        http::StatusCode,
        response::{IntoResponse, Response},
    },
    serde::{Deserialize, Serialize},
    tracing::info,
};

use {
    herald_common::MediaPayload,
    herald_dispatch::{DispatchError, DispatchJob, DispatchReport, PacingPolicy, RecipientOutcome, dispatch},
    herald_protocol::{ErrorShape, error_codes, frames::RecipientInput},
    herald_sessions::{ClientSession, SessionStatus},
};

use crate::state::GatewayState;

// ── Wire shapes ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DispatchRequest {
    pub recipients: RecipientInput,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub policy: Option<PolicyOverride>,
}

/// Per-request pacing override; unset fields keep the configured default.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct PolicyOverride {
    pub per_message_delay_ms: Option<u64>,
    pub batch_size: Option<usize>,
    pub inter_batch_delay_ms: Option<u64>,
}

impl PolicyOverride {
    pub fn apply(&self, base: PacingPolicy) -> PacingPolicy {
        PacingPolicy::from_millis(
            self.per_message_delay_ms
                .unwrap_or(base.per_message_delay.as_millis() as u64),
            self.batch_size.unwrap_or(base.batch_size),
            self.inter_batch_delay_ms
                .unwrap_or(base.inter_batch_delay.as_millis() as u64),
        )
    }
}

#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    /// One human-readable line per recipient, in input order.
    pub status: Vec<String>,
    pub sent: usize,
    pub failed: usize,
    pub outcomes: Vec<RecipientOutcome>,
}

impl From<DispatchReport> for DispatchResponse {
    fn from(report: DispatchReport) -> Self {
        Self {
            status: report.lines(),
            sent: report.sent_count(),
            failed: report.failed_count(),
            outcomes: report.outcomes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TeardownResponse {
    pub session_id: String,
    pub removed: bool,
}

// ── Error mapping ────────────────────────────────────────────────────────────

pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorShape,
}

impl ApiError {
    fn not_found(session_id: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: ErrorShape::not_found(session_id),
        }
    }

    fn from_dispatch(session_id: &str, err: DispatchError) -> Self {
        match err {
            DispatchError::NotReady => Self {
                status: StatusCode::CONFLICT,
                body: ErrorShape::not_ready(session_id),
            },
            DispatchError::InvalidJob(msg) => Self {
                status: StatusCode::BAD_REQUEST,
                body: ErrorShape::invalid_job(msg),
            },
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorShape::new(error_codes::INVALID_JOB, message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/sessions/{id}: create or re-attach. Initialization runs in
/// the background and progress arrives as lifecycle events.
pub async fn create_session(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> Json<SessionStatus> {
    let session = state.registry.get_or_create(&id).await;
    Json(session.snapshot().await)
}

/// GET /api/sessions/{id}
pub async fn session_status(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionStatus>, ApiError> {
    let session = lookup(&state, &id).await?;
    Ok(Json(session.snapshot().await))
}

/// DELETE /api/sessions/{id}: idempotent teardown.
pub async fn teardown_session(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> Json<TeardownResponse> {
    let removed = state.registry.remove(&id).await;
    Json(TeardownResponse {
        session_id: id,
        removed,
    })
}

/// POST /api/sessions/{id}/dispatch: text bulk send. Long-running; the
/// response arrives once every recipient has an outcome.
pub async fn dispatch_text(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
    Json(req): Json<DispatchRequest>,
) -> Result<Json<DispatchResponse>, ApiError> {
    let session = lookup(&state, &id).await?;
    let policy = req.policy.unwrap_or_default().apply(state.default_policy());
    let job = DispatchJob::text(req.recipients.into_vec(), req.message, policy);
    run_job(&state, &session, &job).await
}

/// POST /api/sessions/{id}/dispatch/media: multipart bulk send. Without a
/// `file` part this degrades to a text dispatch of `message`.
pub async fn dispatch_media(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<DispatchResponse>, ApiError> {
    let session = lookup(&state, &id).await?;

    let mut media: Option<MediaPayload> = None;
    let mut message = String::new();
    let mut recipients: Vec<String> = Vec::new();
    let mut policy = PolicyOverride::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let mime_type = field.content_type().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("failed to read upload: {e}")))?;
                media = Some(MediaPayload::new(mime_type, filename, data.to_vec()));
            },
            "message" => message = text_field(field).await?,
            "recipients" => {
                recipients = RecipientInput::Csv(text_field(field).await?).into_vec();
            },
            "per_message_delay_ms" => {
                policy.per_message_delay_ms = text_field(field).await?.parse().ok();
            },
            "batch_size" => policy.batch_size = text_field(field).await?.parse().ok(),
            "inter_batch_delay_ms" => {
                policy.inter_batch_delay_ms = text_field(field).await?.parse().ok();
            },
            _ => {},
        }
    }

    let policy = policy.apply(state.default_policy());
    let job = match media {
        Some(media) => {
            let caption = (!message.is_empty()).then_some(message);
            DispatchJob::media(recipients, media, caption, policy)
        },
        None => DispatchJob::text(recipients, message, policy),
    };
    run_job(&state, &session, &job).await
}

// ── Helpers ──────────────────────────────────────────────────────────────────

async fn lookup(state: &GatewayState, id: &str) -> Result<Arc<ClientSession>, ApiError> {
    state
        .registry
        .get(id)
        .await
        .ok_or_else(|| ApiError::not_found(id))
}

async fn run_job(
    state: &GatewayState,
    session: &ClientSession,
    job: &DispatchJob,
) -> Result<Json<DispatchResponse>, ApiError> {
    let report = dispatch(session, job)
        .await
        .map_err(|e| ApiError::from_dispatch(session.id(), e))?;
    info!(
        session_id = session.id(),
        engine = state.engine_id,
        sent = report.sent_count(),
        failed = report.failed_count(),
        "dispatch finished"
    );
    Ok(Json(report.into()))
}

async fn text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart field: {e}")))
}
