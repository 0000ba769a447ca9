//! Integration tests for the relay endpoints.
//!
//! HTTP endpoints are driven through Axum's `Router` via
//! `tower::ServiceExt` without starting a TCP server. The channel tests
//! bind an ephemeral port and connect real `WebSocket` clients.

#![allow(clippy::unwrap_used)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chatguessr_geo::Point;
use chatguessr_relay::handlers::HealthResponse;
use chatguessr_relay::router::build_router;
use chatguessr_relay::server::serve;
use chatguessr_relay::state::AppState;
use chatguessr_sync::endpoint::{Mode, channel_endpoint, fetch_mode};
use chatguessr_sync::socket::{ReconnectPolicy, ReconnectingSocket};
use chatguessr_sync::transport::{Transport, TransportEvent};
use chatguessr_types::{OpCode, WireGuess};
use serde_json::Value;
use tower::ServiceExt;

const WAIT: Duration = Duration::from_secs(5);

async fn get_json(state: Arc<AppState>, uri: &str) -> (StatusCode, Value) {
    let app = build_router(state);
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn config_reports_group_mode() {
    let (status, json) = get_json(Arc::new(AppState::new(true)), "/config").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!({ "group": true }));
}

#[tokio::test]
async fn config_reports_solo_mode() {
    let (status, json) = get_json(Arc::new(AppState::new(false)), "/config").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!({ "group": false }));
}

#[tokio::test]
async fn health_reports_participants() {
    let state = Arc::new(AppState::new(true));
    state.join();
    let (status, json) = get_json(Arc::clone(&state), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["participants"], 1);
}

#[tokio::test]
async fn channel_requires_websocket_upgrade() {
    let app = build_router(Arc::new(AppState::default()));
    let response = app
        .oneshot(Request::builder().uri("/chatguessr").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn unknown_path_without_static_dir_is_404() {
    let (status, _) = get_json(Arc::new(AppState::default()), "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn static_dir_falls_back_to_index() {
    let dir: PathBuf = std::env::temp_dir().join(format!("chatguessr-site-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), "<html>map</html>").unwrap();
    std::fs::write(dir.join("app.js"), "console.log(1)").unwrap();

    let state = Arc::new(AppState::default().with_static_dir(Some(dir.clone())));

    for (uri, expected) in [
        ("/app.js", "console.log(1)"),
        ("/", "<html>map</html>"),
        ("/some/client/route", "<html>map</html>"),
    ] {
        let response = build_router(Arc::clone(&state))
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(std::str::from_utf8(&body).unwrap(), expected, "{uri}");
    }

    // The API routes still win over the static site.
    let (_, json) = get_json(Arc::clone(&state), "/config").await;
    assert_eq!(json, serde_json::json!({ "group": true }));

    std::fs::remove_dir_all(&dir).unwrap();
}

// ---------------------------------------------------------------------------
// Live channel
// ---------------------------------------------------------------------------

async fn start_relay(group: bool) -> (SocketAddr, Arc<AppState>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = Arc::new(AppState::new(group));
    tokio::spawn(serve(listener, Arc::clone(&state), std::future::pending()));
    (addr, state)
}

fn open_socket(addr: SocketAddr) -> ReconnectingSocket {
    let url = channel_endpoint(&format!("http://{addr}/")).unwrap();
    ReconnectingSocket::connect(url.as_str(), ReconnectPolicy::fixed(Duration::from_millis(50)))
}

async fn wait_open(socket: &mut ReconnectingSocket) {
    loop {
        let event = tokio::time::timeout(WAIT, socket.next_event()).await.unwrap();
        if event.unwrap() == TransportEvent::Open {
            return;
        }
    }
}

async fn next_guess(socket: &mut ReconnectingSocket) -> WireGuess {
    loop {
        let event = tokio::time::timeout(WAIT, socket.next_event()).await.unwrap();
        if let Some(TransportEvent::Message(text)) = event {
            return WireGuess::from_json(&text).unwrap();
        }
    }
}

async fn wait_participants(state: &AppState, expected: usize) {
    tokio::time::timeout(WAIT, async {
        while state.participants() != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn guesses_are_relayed_with_sender_identity() {
    let (addr, state) = start_relay(true).await;

    let mut a = open_socket(addr);
    wait_open(&mut a).await;
    wait_participants(&state, 1).await;

    let mut b = open_socket(addr);
    wait_open(&mut b).await;
    wait_participants(&state, 2).await;

    // A hears B join.
    let joined = next_guess(&mut a).await;
    assert_eq!(joined.op, OpCode::Connect);
    let b_ident = joined.ident.unwrap();

    // A's guess reaches B tagged with A's identity.
    let outbound = WireGuess::outbound(Point::new(48.0, 2.0), 1500.0);
    a.send(outbound.to_json().unwrap()).unwrap();
    let relayed = next_guess(&mut b).await;
    assert_eq!(relayed.op, OpCode::Message);
    assert_eq!(relayed.location, Some(Point::new(48.0, 2.0)));
    assert!((relayed.distance - 1500.0).abs() < f64::EPSILON);
    let a_ident = relayed.ident.unwrap();
    assert_ne!(a_ident, b_ident);

    // B's reply is the next thing A sees: A's own guess was not echoed.
    b.send(WireGuess::outbound(Point::new(-33.0, 151.0), 0.0).to_json().unwrap())
        .unwrap();
    let reply = next_guess(&mut a).await;
    assert_eq!(reply.ident.as_deref(), Some(b_ident.as_str()));
    assert_eq!(reply.op, OpCode::Message);

    // A malformed frame is dropped without closing the connection.
    b.send(String::from("not json")).unwrap();
    b.send(WireGuess::outbound(Point::new(1.0, 1.0), 0.0).to_json().unwrap())
        .unwrap();
    let after = next_guess(&mut a).await;
    assert_eq!(after.location, Some(Point::new(1.0, 1.0)));

    // A hears B leave.
    b.shutdown().await;
    let left = next_guess(&mut a).await;
    assert_eq!(left.op, OpCode::Disconnect);
    assert_eq!(left.ident.as_deref(), Some(b_ident.as_str()));
    wait_participants(&state, 1).await;

    a.shutdown().await;
}

#[tokio::test]
async fn live_health_and_mode() {
    let (addr, _state) = start_relay(false).await;
    let client = reqwest::Client::new();
    let page = format!("http://{addr}/");

    let mode = fetch_mode(&client, &page).await.unwrap();
    assert_eq!(mode, Mode::Solo);

    let health: HealthResponse = client
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.participants, 0);
}

#[tokio::test]
async fn bot_guesses_reach_every_participant() {
    let (addr, state) = start_relay(true).await;

    let mut a = open_socket(addr);
    wait_open(&mut a).await;
    wait_participants(&state, 1).await;

    assert_eq!(state.broadcast(WireGuess::bot(Point::new(5.0, 6.0))), 1);
    let guess = next_guess(&mut a).await;
    assert_eq!(guess.op, OpCode::Bot);
    assert_eq!(guess.location, Some(Point::new(5.0, 6.0)));

    a.shutdown().await;
}
