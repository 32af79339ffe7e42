//! Bearer authentication for the `/api` routes.

use api_shared::{parse_bearer, AuthError};
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::RestError;
use crate::AppState;

/// Resolves the bearer token to a [`Provider`](crate::store::Provider) and stores it
/// in the request extensions for the handlers.
pub async fn require_bearer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, RestError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let provider = match parse_bearer(header) {
        Ok(token) => state.config.provider_for(token).cloned(),
        Err(err) => {
            tracing::debug!(error = %err, path = %req.uri().path(), "rejected request");
            return Err(err.into());
        }
    };
    let Some(provider) = provider else {
        tracing::warn!(path = %req.uri().path(), "unknown bearer token");
        return Err(AuthError::InvalidToken.into());
    };

    req.extensions_mut().insert(provider);
    Ok(next.run(req).await)
}
