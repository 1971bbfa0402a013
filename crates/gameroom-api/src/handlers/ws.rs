//! WebSocket upgrade handlers for hosts and players.
//!
//! Both routes behave the same once upgraded: the socket joins the session
//! named by `?id=` and every message it sends is relayed to the whole
//! session. The role only changes what gets logged.

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use futures::future::{self, Ready};
use futures::{SinkExt, StreamExt};
use tracing::{debug, warn};

use gameroom_core::error::AppError;
use gameroom_core::types::SessionId;
use gameroom_realtime::message::frame::{CloseNotice, Frame};
use gameroom_realtime::session::driver::JoinRole;

use crate::dto::request::SessionQuery;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /host?id={session}: open a session as its host
pub async fn host(
    State(state): State<AppState>,
    query: SessionQuery,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    upgrade(state, query, ws, JoinRole::Host)
}

/// GET /join?id={session}: join an existing or new session as a player
pub async fn join(
    State(state): State<AppState>,
    query: SessionQuery,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    upgrade(state, query, ws, JoinRole::Player)
}

fn upgrade(
    state: AppState,
    query: SessionQuery,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    role: JoinRole,
) -> Result<Response, ApiError> {
    // The id check comes first so a plain HTTP request without one gets 400.
    let session_id = query.session_id().map_err(ApiError::plain)?;

    if state.relay.is_shutting_down() {
        return Err(ApiError::plain(AppError::service_unavailable(
            "Server is shutting down",
        )));
    }

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            warn!(
                session_id = %session_id,
                role = %role,
                error = %rejection,
                "WebSocket upgrade rejected"
            );
            return Ok(rejection.into_response());
        }
    };

    let failed_session = session_id.clone();
    let response = ws
        .max_message_size(state.config.realtime.max_message_size_bytes)
        .on_failed_upgrade(move |e| {
            warn!(session_id = %failed_session, error = %e, "WebSocket upgrade failed");
        })
        .on_upgrade(move |socket| serve_socket(state, session_id, role, socket));

    Ok(response)
}

/// Runs an upgraded socket through the relay until it disconnects.
async fn serve_socket(state: AppState, session_id: SessionId, role: JoinRole, socket: WebSocket) {
    let (ws_tx, ws_rx) = socket.split();

    let sink = ws_tx.with(encode_frame);
    let inbound = ws_rx.map(|result| result.map(decode_message));

    match state
        .relay
        .run_connection(session_id.clone(), role, inbound, sink)
        .await
    {
        Ok(termination) => debug!(
            session_id = %session_id,
            reason = %termination,
            "WebSocket connection finished"
        ),
        Err(e) => warn!(
            session_id = %session_id,
            error = %e,
            "WebSocket connection refused after upgrade"
        ),
    }
}

/// Converts an axum message into a relay frame.
pub fn decode_message(message: Message) -> Frame {
    match message {
        Message::Text(text) => Frame::Text(text.as_str().to_owned()),
        Message::Binary(data) => Frame::Binary(data),
        Message::Ping(data) => Frame::Ping(data),
        Message::Pong(data) => Frame::Pong(data),
        Message::Close(frame) => {
            Frame::Close(frame.map(|f| CloseNotice::new(f.code, f.reason.as_str())))
        }
    }
}

/// Converts a relay frame into an axum message.
pub fn encode_message(frame: Frame) -> Message {
    match frame {
        Frame::Text(text) => Message::Text(text.into()),
        Frame::Binary(data) => Message::Binary(data),
        Frame::Ping(data) => Message::Ping(data),
        Frame::Pong(data) => Message::Pong(data),
        Frame::Close(notice) => Message::Close(notice.map(|n| CloseFrame {
            code: n.code,
            reason: n.reason.into(),
        })),
    }
}

fn encode_frame(frame: Frame) -> Ready<Result<Message, axum::Error>> {
    future::ready(Ok(encode_message(frame)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_text_and_binary_keep_their_kind() {
        let text = decode_message(Message::Text("hello".into()));
        assert_eq!(text, Frame::Text("hello".to_string()));

        let binary = decode_message(Message::Binary(Bytes::from_static(&[0, 159, 146])));
        assert_eq!(binary, Frame::Binary(Bytes::from_static(&[0, 159, 146])));

        assert!(matches!(encode_message(text), Message::Text(t) if t.as_str() == "hello"));
        assert!(matches!(encode_message(binary), Message::Binary(b) if b.len() == 3));
    }

    #[test]
    fn test_close_notice_maps_to_close_frame() {
        match encode_message(Frame::Close(Some(CloseNotice::game_closed()))) {
            Message::Close(Some(frame)) => {
                assert_eq!(frame.code, 1000);
                assert_eq!(frame.reason.as_str(), "Game closed");
            }
            other => panic!("unexpected message: {other:?}"),
        }

        let decoded = decode_message(Message::Close(None));
        assert_eq!(decoded, Frame::Close(None));
    }
}
