pub mod ops;
pub mod payments;
pub mod webhooks;

use std::str::FromStr;

use axum::Json;
use axum::extract::rejection::JsonRejection;

use crate::error::ApiError;

pub(crate) fn parse_id<T>(field: &str, raw: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = uuid::Error>,
{
    raw.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid {field} format: {e}")))
}

/// Unwraps a JSON body, reporting any extractor rejection as one plain 400.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|_| ApiError::BadRequest("Invalid request body".to_string()))
}
