//! Error responses.
//!
//! Every failure is rendered as JSON: `{"detail": "..."}` for authentication and
//! lookup failures, and `{"field": ["message", ...]}` for rejected input.

use std::collections::BTreeMap;

use api_shared::AuthError;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Messages per offending field, in field order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), RestError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(RestError::Validation(self))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RestError {
    #[error(transparent)]
    Unauthorized(#[from] AuthError),
    #[error("Not found.")]
    NotFound,
    #[error("Invalid page.")]
    InvalidPage,
    #[error("request rejected: {0:?}")]
    Validation(FieldErrors),
}

pub type RestResult<T> = std::result::Result<T, RestError>;

#[derive(Serialize)]
struct Detail {
    detail: String,
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        match self {
            RestError::Unauthorized(err) => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Bearer")],
                Json(Detail {
                    detail: err.to_string(),
                }),
            )
                .into_response(),
            RestError::NotFound | RestError::InvalidPage => (
                StatusCode::NOT_FOUND,
                Json(Detail {
                    detail: self.to_string(),
                }),
            )
                .into_response(),
            RestError::Validation(errors) => {
                tracing::debug!(?errors, "request rejected");
                (StatusCode::BAD_REQUEST, Json(errors)).into_response()
            }
        }
    }
}
