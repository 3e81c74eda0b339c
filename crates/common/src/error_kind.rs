//! Failure taxonomy shared by both services.

use serde::{Deserialize, Serialize};

/// Coarse classification of a failure, independent of which service raised it.
///
/// HTTP layers map this to a status code; saga code uses it to decide whether
/// a rejected notification is a duplicate (`Conflict`) or a real fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed or missing fields, non-positive amounts, unsupported values.
    InvalidInput,
    /// A referenced event, ticket, booking, payment or user does not exist.
    NotFound,
    /// The request is well formed but contradicts current state.
    Conflict,
    /// A collaborating service was unreachable or answered with an error.
    Upstream,
    /// Storage or other local infrastructure failed.
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Upstream => "upstream",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
