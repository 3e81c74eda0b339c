//! Resolves bearer credentials to users through the identity service.

use std::time::Duration;

use async_trait::async_trait;
use common::UserId;
use serde::Deserialize;
use thiserror::Error;

/// Why a credential could not be resolved to a user.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authorization token is required")]
    MissingCredential,

    #[error("Failed to authenticate user: {0}")]
    Rejected(String),

    #[error("Failed to authenticate user: identity service unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),
}

/// Turns the raw `Authorization` header into the caller's user id.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, authorization: &str) -> Result<UserId, AuthError>;
}

#[derive(Deserialize)]
struct AuthenticatedUser {
    id: String,
}

#[derive(Deserialize)]
struct AuthResponse {
    data: AuthenticatedUser,
}

/// Asks the identity service's `GET /api/v1/users/auth` who the caller is.
#[derive(Debug, Clone)]
pub struct HttpIdentityClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdentityClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Authenticator for HttpIdentityClient {
    #[tracing::instrument(skip_all)]
    async fn authenticate(&self, authorization: &str) -> Result<UserId, AuthError> {
        if authorization.trim().is_empty() {
            return Err(AuthError::MissingCredential);
        }

        let response = self
            .client
            .get(format!("{}/api/v1/users/auth", self.base_url))
            .header(reqwest::header::AUTHORIZATION, authorization)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected(format!(
                "identity service returned status {}: {body}",
                status.as_u16()
            )));
        }

        let auth: AuthResponse = response.json().await?;
        auth.data
            .id
            .parse()
            .map_err(|_| AuthError::Rejected("invalid user data received".to_string()))
    }
}

/// Accepts one fixed token. Used by tests and local runs without an
/// identity service.
#[derive(Debug, Clone)]
pub struct StaticAuthenticator {
    token: String,
    user_id: UserId,
}

impl StaticAuthenticator {
    pub fn new(token: impl Into<String>, user_id: UserId) -> Self {
        Self {
            token: token.into(),
            user_id,
        }
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authenticate(&self, authorization: &str) -> Result<UserId, AuthError> {
        if authorization.trim().is_empty() {
            return Err(AuthError::MissingCredential);
        }
        let token = authorization
            .strip_prefix("Bearer ")
            .unwrap_or(authorization);
        if token == self.token {
            Ok(self.user_id)
        } else {
            Err(AuthError::Rejected("invalid token".to_string()))
        }
    }
}
