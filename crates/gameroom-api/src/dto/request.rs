//! Request DTOs.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;

use gameroom_core::error::AppError;
use gameroom_core::types::SessionId;

/// Query string shared by the relay routes: `?id=<session>`.
///
/// Extracted leniently: a repeated `id` takes its first value, and a query
/// string that cannot be parsed counts as having no `id`.
#[derive(Debug, Clone, Default)]
pub struct SessionQuery {
    /// Raw session identifier; absent and empty are both rejected.
    pub id: Option<String>,
}

impl SessionQuery {
    /// Builds the query from decoded key/value pairs; the first `id` wins.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let id = pairs
            .into_iter()
            .find(|(key, _)| key == "id")
            .map(|(_, value)| value);
        Self { id }
    }

    /// Validated session identifier.
    pub fn session_id(self) -> Result<SessionId, AppError> {
        SessionId::parse(self.id.unwrap_or_default())
    }
}

impl<S> FromRequestParts<S> for SessionQuery
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let pairs = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map(|Query(pairs)| pairs)
            .unwrap_or_default();
        Ok(Self::from_pairs(pairs))
    }
}
