//! End-to-end tests for hosting, joining, relaying, and closing sessions.

mod helpers;

use axum::http::StatusCode;
use futures::SinkExt;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

use helpers::{TestApp, assert_silent, next_message};

#[tokio::test]
async fn test_message_reaches_every_member_including_sender() {
    let app = TestApp::spawn().await;
    let mut host = app.connect_and_join("/host?id=abc", "abc").await;
    let mut player = app.connect_and_join("/join?id=abc", "abc").await;

    host.send(Message::text("ping")).await.unwrap();

    assert_eq!(next_message(&mut host).await, Message::text("ping"));
    assert_eq!(next_message(&mut player).await, Message::text("ping"));
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let app = TestApp::spawn().await;
    let mut a = app.connect_and_join("/host?id=a", "a").await;
    let mut b = app.connect_and_join("/host?id=b", "b").await;

    a.send(Message::text("only a")).await.unwrap();

    assert_eq!(next_message(&mut a).await, Message::text("only a"));
    assert_silent(&mut b).await;
}

#[tokio::test]
async fn test_binary_payload_is_relayed_verbatim() {
    let app = TestApp::spawn().await;
    let mut host = app.connect_and_join("/host?id=bin", "bin").await;
    let mut player = app.connect_and_join("/join?id=bin", "bin").await;

    let payload = vec![0u8, 159, 146, 150, 255];
    player.send(Message::binary(payload.clone())).await.unwrap();

    assert_eq!(next_message(&mut host).await, Message::binary(payload.clone()));
    assert_eq!(next_message(&mut player).await, Message::binary(payload));
}

#[tokio::test]
async fn test_messages_from_one_sender_keep_order() {
    let app = TestApp::spawn().await;
    let mut host = app.connect_and_join("/host?id=order", "order").await;
    let mut player = app.connect_and_join("/join?id=order", "order").await;

    for i in 0..20 {
        host.send(Message::text(format!("move-{i}"))).await.unwrap();
    }

    for i in 0..20 {
        assert_eq!(next_message(&mut player).await, Message::text(format!("move-{i}")));
    }
}

#[tokio::test]
async fn test_join_creates_session_without_host() {
    let app = TestApp::spawn().await;
    let mut player = app.connect_and_join("/join?id=xyz", "xyz").await;

    player.send(Message::text("alone")).await.unwrap();
    assert_eq!(next_message(&mut player).await, Message::text("alone"));
}

#[tokio::test]
async fn test_disconnect_leaves_session_and_keeps_entry() {
    let app = TestApp::spawn().await;
    let mut host = app.connect_and_join("/host?id=s", "s").await;
    let player = app.connect_and_join("/join?id=s", "s").await;

    drop(player);
    app.wait_for_members("s", 1).await;

    host.send(Message::text("still here")).await.unwrap();
    assert_eq!(next_message(&mut host).await, Message::text("still here"));

    host.close(None).await.unwrap();
    app.wait_for_members("s", 0).await;
    assert!(app.has_session("s"));
}

#[tokio::test]
async fn test_close_notifies_every_member() {
    let app = TestApp::spawn().await;
    let mut host = app.connect_and_join("/host?id=abc", "abc").await;
    let mut player = app.connect_and_join("/join?id=abc", "abc").await;

    let response = app.request("POST", "/close?id=abc").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "Game closed");

    for client in [&mut host, &mut player] {
        match next_message(client).await {
            Message::Close(Some(frame)) => {
                assert_eq!(frame.code, CloseCode::Normal);
                assert_eq!(frame.reason.as_str(), "Game closed");
            }
            other => panic!("expected close frame, got {other:?}"),
        }
    }

    assert!(!app.has_session("abc"));

    let again = app.request("POST", "/close?id=abc").await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
    assert_eq!(again.body, "Session not found");
}

#[tokio::test]
async fn test_repeated_id_uses_first_value() {
    let app = TestApp::spawn().await;
    let mut first = app.connect_and_join("/join?id=a&id=b", "a").await;
    assert!(!app.has_session("b"));

    let response = app.request("POST", "/close?id=a&id=b").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "Game closed");

    match next_message(&mut first).await {
        Message::Close(Some(frame)) => assert_eq!(frame.code, CloseCode::Normal),
        other => panic!("expected close frame, got {other:?}"),
    }
}

#[tokio::test]
async fn test_session_id_can_be_reused_after_close() {
    let app = TestApp::spawn().await;
    let _old = app.connect_and_join("/host?id=again", "again").await;

    assert_eq!(app.request("GET", "/close?id=again").await.status, StatusCode::OK);

    let mut fresh = app.connect_and_join("/host?id=again", "again").await;
    assert_eq!(app.member_count("again"), 1);

    fresh.send(Message::text("round two")).await.unwrap();
    assert_eq!(next_message(&mut fresh).await, Message::text("round two"));
}

#[tokio::test]
async fn test_upgrade_without_id_is_rejected() {
    let app = TestApp::spawn().await;
    let url = format!("ws://{}/host", app.addr);

    match tokio_tungstenite::connect_async(url).await {
        Err(tokio_tungstenite::tungstenite::Error::Http(response)) => {
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
        other => panic!("expected HTTP 400, got {:?}", other.map(|_| ())),
    }

    assert_eq!(app.state.relay.registry.session_count(), 0);
}

#[tokio::test]
async fn test_shutdown_closes_sessions_with_going_away() {
    let mut app = TestApp::spawn().await;
    let mut host = app.connect_and_join("/host?id=late", "late").await;

    app.shutdown().await.unwrap();

    match next_message(&mut host).await {
        Message::Close(Some(frame)) => {
            assert_eq!(frame.code, CloseCode::Away);
            assert_eq!(frame.reason.as_str(), "Server shutting down");
        }
        other => panic!("expected close frame, got {other:?}"),
    }
    assert_eq!(app.state.relay.registry.session_count(), 0);
}
