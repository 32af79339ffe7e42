//! Turning extractor rejections into the JSON error shapes clients expect.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::Path;
use axum::Json;

use crate::error::{FieldErrors, RestError, RestResult};

/// Unwraps a JSON body, reporting malformed input under `non_field_errors`.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> RestResult<T> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            let message = rejection.body_text();
            tracing::debug!(%message, "malformed request body");
            Err(RestError::Validation(FieldErrors::single(
                "non_field_errors",
                message,
            )))
        }
    }
}

/// Unwraps a numeric id; anything else cannot name a record.
pub fn record_id(id: Result<Path<i64>, PathRejection>) -> RestResult<i64> {
    id.map(|Path(id)| id).map_err(|_| RestError::NotFound)
}
