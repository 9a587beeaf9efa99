use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        Router,
        extract::{ConnectInfo, DefaultBodyLimit, State, WebSocketUpgrade},
        response::{IntoResponse, Json},
        routing::{get, post},
    },
    tower_http::{
        cors::{Any, CorsLayer},
        trace::TraceLayer,
    },
    tracing::info,
};

use {herald_config::HeraldConfig, herald_engine::MessengerEngine, herald_protocol::PROTOCOL_VERSION};

use crate::{api, state::GatewayState, ws::handle_connection};

/// Uploads land in memory as dispatch payloads; cap them well below
/// anything that would hurt the process.
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

// ── Server startup ───────────────────────────────────────────────────────────

/// Build the gateway router (shared between production startup and tests).
pub fn build_gateway_app(state: Arc<GatewayState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_upgrade_handler))
        .route(
            "/api/sessions/{id}",
            post(api::create_session)
                .get(api::session_status)
                .delete(api::teardown_session),
        )
        .route("/api/sessions/{id}/dispatch", post(api::dispatch_text))
        .route("/api/sessions/{id}/dispatch/media", post(api::dispatch_media))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the gateway HTTP + WebSocket server and run until shutdown.
pub async fn start_gateway(
    config: HeraldConfig,
    engine: Arc<dyn MessengerEngine>,
) -> anyhow::Result<()> {
    config.validate()?;
    let state = GatewayState::new(config, engine);
    let app = build_gateway_app(Arc::clone(&state));

    let addr: SocketAddr = format!(
        "{}:{}",
        state.config.gateway.bind, state.config.gateway.port
    )
    .parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Startup banner.
    let lines = [
        format!("herald gateway v{}", state.version),
        format!("protocol v{PROTOCOL_VERSION}, listening on {addr}"),
        format!("engine: {}", state.engine_id),
        format!(
            "pacing: {}ms/msg, batch {} every {}ms",
            state.config.pacing.per_message_delay_ms,
            state.config.pacing.batch_size,
            state.config.pacing.inter_batch_delay_ms,
        ),
    ];
    let width = lines.iter().map(|l| l.len()).max().unwrap_or(0) + 4;
    info!("┌{}┐", "─".repeat(width));
    for line in &lines {
        info!("│  {:<w$}│", line, w = width - 2);
    }
    info!("└{}┘", "─".repeat(width));

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // Sessions are in-memory only; tear them down before exit so engine
    // clients release cleanly.
    state.registry.drain().await;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn health_handler(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": state.version,
        "protocol": PROTOCOL_VERSION,
        "engine": state.engine_id,
        "sessions": state.registry.len().await,
    }))
}

async fn ws_upgrade_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<Arc<GatewayState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state, addr))
}
