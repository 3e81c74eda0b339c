//! Publish error types.

use thiserror::Error;

/// Errors raised while delivering a notification to a peer service.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The peer could not be reached or the request could not be built.
    #[error("failed to deliver notification: {0}")]
    Transport(#[from] reqwest::Error),

    /// The peer answered with a non-success status.
    #[error("peer returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The message was refused before leaving the process.
    #[error("notification rejected: {0}")]
    Rejected(String),
}
