//! Session close handler.

use axum::extract::State;
use axum::http::StatusCode;
use tracing::info;

use gameroom_core::error::AppError;

use crate::dto::request::SessionQuery;
use crate::error::ApiError;
use crate::state::AppState;

/// ANY /close?id={session}: end a game for every participant
pub async fn close_session(
    State(state): State<AppState>,
    query: SessionQuery,
) -> Result<(StatusCode, &'static str), ApiError> {
    let session_id = query.session_id().map_err(ApiError::plain)?;

    if !state.relay.close_session(&session_id) {
        info!(session_id = %session_id, "Close requested for unknown session");
        return Err(ApiError::plain(AppError::not_found("Session not found")));
    }

    Ok((StatusCode::OK, "Game closed"))
}
