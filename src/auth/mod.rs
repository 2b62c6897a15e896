use std::sync::Arc;

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::backend::{Backend, Client, Credential};

/// Why a request was not authenticated. Both variants answer 401; they are
/// kept apart for logging.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing token")]
    Unauthenticated,

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

impl AuthError {
    /// Short message returned to the caller.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated => "Missing token",
            AuthError::InvalidToken(_) => "Invalid token",
        }
    }
}

/// User identity resolved from the identity provider, valid for one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    /// Everything else the provider returned (app/user metadata, timestamps...)
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

/// Pull the raw credential out of `Authorization`.
///
/// A leading `Bearer ` is stripped; a bare value is taken as the token.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AuthError> {
    let value = match headers.get(header::AUTHORIZATION) {
        Some(value) => value,
        None => return Err(AuthError::Unauthenticated),
    };

    let raw = value
        .to_str()
        .map_err(|_| AuthError::InvalidToken("authorization header is not visible ASCII".to_string()))?;

    let token = raw.strip_prefix("Bearer ").unwrap_or(raw);
    if token.is_empty() {
        return Err(AuthError::Unauthenticated);
    }

    Ok(token.to_string())
}

/// Confirms bearer tokens against the identity provider's session endpoint.
#[derive(Clone)]
pub struct TokenValidator {
    backend: Arc<dyn Backend>,
}

impl TokenValidator {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// One introspection call, no retry: any provider error is a rejection.
    pub async fn validate(&self, token: &str) -> Result<AuthUser, AuthError> {
        let user = self
            .backend
            .get_user(token)
            .await
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        if user.is_null() {
            return Err(AuthError::InvalidToken("provider returned no user".to_string()));
        }

        serde_json::from_value::<AuthUser>(user)
            .map_err(|e| AuthError::InvalidToken(format!("unusable user object: {}", e)))
    }
}

/// Backend handle authorised as one user. Built per request and dropped with it.
#[derive(Debug, Clone)]
pub struct ScopedClient(pub Client);

impl std::ops::Deref for ScopedClient {
    type Target = Client;

    fn deref(&self) -> &Client {
        &self.0
    }
}

/// Hands out backend handles. Construction never touches the network.
#[derive(Clone)]
pub struct ClientFactory {
    backend: Arc<dyn Backend>,
}

impl ClientFactory {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub fn for_user(&self, token: &str) -> ScopedClient {
        ScopedClient(Client::new(self.backend.clone(), Credential::User(token.to_string())))
    }

    /// Handle with no user context, for public reads.
    pub fn anonymous(&self) -> Client {
        Client::new(self.backend.clone(), Credential::Anonymous)
    }
}
