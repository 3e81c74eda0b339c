pub mod bookings;
pub mod catalog;
pub mod ops;
pub mod webhooks;

use std::str::FromStr;

use crate::error::ApiError;

/// Parses a path or body identifier, naming the field in the error.
pub(crate) fn parse_id<T>(field: &str, raw: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = uuid::Error>,
{
    raw.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid {field} format: {e}")))
}
