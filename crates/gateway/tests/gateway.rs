//! End-to-end tests against a real listener: REST session lifecycle,
//! dispatch outcomes, and the WebSocket event stream.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use {futures::SinkExt, futures::StreamExt, serde_json::Value, tokio_tungstenite::tungstenite::Message};

use {
    herald_config::HeraldConfig,
    herald_engine::{MessengerEngine, loopback::LoopbackEngine},
    herald_gateway::{server::build_gateway_app, state::GatewayState},
};

async fn spawn_app(engine: Arc<LoopbackEngine>) -> (String, Arc<GatewayState>) {
    let state = GatewayState::new(
        HeraldConfig::default(),
        Arc::clone(&engine) as Arc<dyn MessengerEngine>,
    );
    let app = build_gateway_app(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    (format!("http://{addr}"), state)
}

async fn create_and_wait_ready(client: &reqwest::Client, base: &str, id: &str) {
    let resp = client
        .post(format!("{base}/api/sessions/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let status: Value = client
                .get(format!("{base}/api/sessions/{id}"))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            if status["state"] == "ready" {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("session never became ready");
}

#[tokio::test]
async fn health_reports_ok() {
    let (base, _state) = spawn_app(Arc::new(LoopbackEngine::new())).await;
    let body: Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["engine"], "loopback");
    assert_eq!(body["sessions"], 0);
}

#[tokio::test]
async fn dispatch_to_unknown_session_is_404() {
    let (base, _state) = spawn_app(Arc::new(LoopbackEngine::new())).await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base}/api/sessions/ghost/dispatch"))
        .json(&serde_json::json!({"recipients": "111", "message": "hi"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "SESSION_NOT_FOUND");
}

#[tokio::test]
async fn dispatch_before_ready_is_409_with_zero_sends() {
    let engine = Arc::new(LoopbackEngine::manual());
    let (base, _state) = spawn_app(Arc::clone(&engine)).await;
    let client = reqwest::Client::new();

    client
        .post(format!("{base}/api/sessions/u1"))
        .send()
        .await
        .unwrap();
    // Session exists but is still awaiting its handshake.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let resp = client
        .post(format!("{base}/api/sessions/u1/dispatch"))
        .json(&serde_json::json!({"recipients": ["111"], "message": "hi"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "SESSION_NOT_READY");
    assert!(engine.outbox().await.is_empty());
}

#[tokio::test]
async fn dispatch_reports_mixed_outcomes_with_200() {
    let engine = Arc::new(LoopbackEngine::new().with_deny_marker("222"));
    let (base, _state) = spawn_app(Arc::clone(&engine)).await;
    let client = reqwest::Client::new();
    create_and_wait_ready(&client, &base, "u1").await;

    let resp = client
        .post(format!("{base}/api/sessions/u1/dispatch"))
        .json(&serde_json::json!({"recipients": "111, 222", "message": "hello"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    let status = body["status"].as_array().unwrap();
    assert_eq!(status.len(), 2);
    assert_eq!(status[0], "Message sent to 111@c.us");
    assert!(
        status[1]
            .as_str()
            .unwrap()
            .starts_with("Failed to send to 222@c.us:")
    );
    assert_eq!(body["sent"], 1);
    assert_eq!(body["failed"], 1);
    assert_eq!(body["outcomes"][1]["outcome"], "failed");
}

#[tokio::test]
async fn empty_recipients_is_400() {
    let (base, _state) = spawn_app(Arc::new(LoopbackEngine::new())).await;
    let client = reqwest::Client::new();
    create_and_wait_ready(&client, &base, "u1").await;

    let resp = client
        .post(format!("{base}/api/sessions/u1/dispatch"))
        .json(&serde_json::json!({"recipients": [], "message": "hi"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_JOB");
}

#[tokio::test]
async fn media_upload_dispatches_media_payload() {
    let engine = Arc::new(LoopbackEngine::new());
    let (base, _state) = spawn_app(Arc::clone(&engine)).await;
    let client = reqwest::Client::new();
    create_and_wait_ready(&client, &base, "u1").await;

    let file = reqwest::multipart::Part::bytes(vec![0u8; 64])
        .file_name("cat.png")
        .mime_str("image/png")
        .unwrap();
    let form = reqwest::multipart::Form::new()
        .part("file", file)
        .text("message", "look at this")
        .text("recipients", "111,333");

    let resp = client
        .post(format!("{base}/api/sessions/u1/dispatch/media"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["sent"], 2);

    let outbox = engine.outbox().await;
    assert_eq!(outbox.len(), 2);
    assert!(outbox.iter().all(|r| r.kind == "media"));
}

#[tokio::test]
async fn media_endpoint_without_file_sends_text() {
    let engine = Arc::new(LoopbackEngine::new());
    let (base, _state) = spawn_app(Arc::clone(&engine)).await;
    let client = reqwest::Client::new();
    create_and_wait_ready(&client, &base, "u1").await;

    let form = reqwest::multipart::Form::new()
        .text("message", "plain text after all")
        .text("recipients", "111");
    let resp = client
        .post(format!("{base}/api/sessions/u1/dispatch/media"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(engine.outbox().await[0].kind, "text");
}

#[tokio::test]
async fn teardown_is_idempotent_over_http() {
    let (base, _state) = spawn_app(Arc::new(LoopbackEngine::new())).await;
    let client = reqwest::Client::new();
    create_and_wait_ready(&client, &base, "u1").await;

    let first: Value = client
        .delete(format!("{base}/api/sessions/u1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["removed"], true);

    let second: Value = client
        .delete(format!("{base}/api/sessions/u1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second["removed"], false);

    let status = client
        .get(format!("{base}/api/sessions/u1"))
        .send()
        .await
        .unwrap()
        .status();
    assert_eq!(status, 404);
}

#[tokio::test]
async fn ws_create_streams_handshake_then_ready() {
    let (base, _state) = spawn_app(Arc::new(LoopbackEngine::new())).await;
    let ws_url = format!("ws://{}/ws", base.trim_start_matches("http://"));
    let (mut ws, _) = tokio_tungstenite::connect_async(ws_url).await.unwrap();

    ws.send(Message::Text(
        r#"{"type":"create-session","session_id":"u1"}"#.into(),
    ))
    .await
    .unwrap();

    let mut saw_handshake = false;
    let mut saw_ready = false;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !(saw_handshake && saw_ready) {
        let msg = tokio::time::timeout_at(deadline, ws.next())
            .await
            .expect("timed out waiting for frames")
            .expect("socket closed early")
            .unwrap();
        let Ok(text) = msg.into_text() else { continue };
        let frame: Value = serde_json::from_str(text.as_str()).unwrap();
        match frame["event"].as_str() {
            Some("handshake-issued") => {
                assert_eq!(frame["session_id"], "u1");
                assert!(
                    frame["handshake_image"]
                        .as_str()
                        .unwrap()
                        .starts_with("data:image/png;base64,")
                );
                saw_handshake = true;
            },
            Some("ready") => saw_ready = true,
            _ => {},
        }
    }

    // Teardown over the same socket gets an ack and a disconnected event.
    ws.send(Message::Text(
        r#"{"type":"teardown","session_id":"u1"}"#.into(),
    ))
    .await
    .unwrap();
    let mut saw_ack = false;
    let mut saw_disconnected = false;
    while !(saw_ack && saw_disconnected) {
        let msg = tokio::time::timeout_at(deadline, ws.next())
            .await
            .expect("timed out waiting for teardown frames")
            .expect("socket closed early")
            .unwrap();
        let Ok(text) = msg.into_text() else { continue };
        let frame: Value = serde_json::from_str(text.as_str()).unwrap();
        if frame["type"] == "teardown" {
            assert_eq!(frame["removed"], true);
            saw_ack = true;
        }
        if frame["event"] == "disconnected" {
            saw_disconnected = true;
        }
    }
}
