//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures::StreamExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tower::ServiceExt;

use gameroom_api::{AppState, build_app};
use gameroom_core::config::AppConfig;
use gameroom_core::error::AppError;
use gameroom_core::types::SessionId;

/// Client side of a relay WebSocket.
pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Response captured from a one-shot request.
pub struct TestResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Test application context
pub struct TestApp {
    /// Address of the live server
    pub addr: SocketAddr,
    /// State shared with the live server
    pub state: AppState,
    shutdown: Option<oneshot::Sender<()>>,
    server: Option<JoinHandle<Result<(), AppError>>>,
}

impl TestApp {
    /// Start a server on an ephemeral port with heartbeats disabled.
    pub async fn spawn() -> Self {
        let mut config = AppConfig::default();
        config.realtime.ping_interval_seconds = 0;
        config.server.shutdown_grace_seconds = 2;
        Self::spawn_with(config).await
    }

    /// Start a server on an ephemeral port with the given configuration.
    pub async fn spawn_with(config: AppConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");

        let state = AppState::new(config);
        let (tx, rx) = oneshot::channel::<()>();
        let server = tokio::spawn(gameroom_api::serve(listener, state.clone(), async move {
            let _ = rx.await;
        }));

        Self {
            addr,
            state,
            shutdown: Some(tx),
            server: Some(server),
        }
    }

    /// Open a WebSocket to `path` (e.g. `/host?id=abc`).
    pub async fn connect(&self, path: &str) -> Client {
        let url = format!("ws://{}{}", self.addr, path);
        let (client, _response) = tokio_tungstenite::connect_async(url)
            .await
            .expect("WebSocket handshake failed");
        client
    }

    /// Open a WebSocket and wait until the server has joined it to `session`.
    pub async fn connect_and_join(&self, path: &str, session: &str) -> Client {
        let before = self.member_count(session);
        let client = self.connect(path).await;
        self.wait_for_members(session, before + 1).await;
        client
    }

    /// Send a request through the router without a socket.
    pub async fn request(&self, method: &str, uri: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("Invalid test request");

        let response = build_app(self.state.clone())
            .oneshot(request)
            .await
            .expect("Router failed");

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");

        TestResponse {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        }
    }

    /// Number of members the registry holds for `session`.
    pub fn member_count(&self, session: &str) -> usize {
        let id = SessionId::parse(session).expect("Invalid session id");
        self.state.relay.registry.member_count(&id)
    }

    /// Whether the registry has an entry for `session`.
    pub fn has_session(&self, session: &str) -> bool {
        let id = SessionId::parse(session).expect("Invalid session id");
        self.state.relay.registry.contains_session(&id)
    }

    /// Wait until `session` has exactly `count` members.
    pub async fn wait_for_members(&self, session: &str, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.member_count(session) != count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("session {session} never reached {count} members"));
    }

    /// Trigger graceful shutdown and wait for the server to stop.
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let server = self.server.take().expect("Server already stopped");
        tokio::time::timeout(Duration::from_secs(10), server)
            .await
            .expect("Server did not stop")
            .expect("Server task panicked")
    }
}

/// Next data or close message, skipping pings and pongs.
pub async fn next_message(client: &mut Client) -> Message {
    loop {
        let next = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("Timed out waiting for a message")
            .expect("Connection ended")
            .expect("WebSocket error");

        match next {
            Message::Ping(_) | Message::Pong(_) => continue,
            other => return other,
        }
    }
}

/// Assert nothing but control frames arrives within a short window.
pub async fn assert_silent(client: &mut Client) {
    let result = tokio::time::timeout(Duration::from_millis(200), async {
        loop {
            match client.next().await {
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                other => return other,
            }
        }
    })
    .await;
    assert!(result.is_err(), "unexpected message: {:?}", result);
}
