//! Outbound seam to the hosted backend.
//!
//! Every call the gateway makes leaves through the [`Backend`] trait: session
//! introspection for bearer tokens, table reads and writes with equality
//! filters, remote procedures and serverless functions. The production
//! implementation is [`SupabaseBackend`]; tests plug in an in-memory fake.

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

pub mod client;
pub mod supabase;

pub use client::{Client, TableRequest};
pub use supabase::SupabaseBackend;

/// Failure reported by (or while talking to) the backend.
///
/// The payload is relayed to callers as-is; no attempt is made to model the
/// backend's error shapes.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("backend returned {status}: {payload}")]
    Api { status: u16, payload: Value },

    #[error("backend unreachable: {0}")]
    Transport(String),

    #[error("backend response could not be decoded: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn api(status: u16, payload: Value) -> Self {
        BackendError::Api { status, payload }
    }

    /// Opaque error value handed back to the HTTP caller.
    pub fn payload(&self) -> Value {
        match self {
            BackendError::Api { payload, .. } => payload.clone(),
            BackendError::Transport(msg) | BackendError::Decode(msg) => json!({ "message": msg }),
        }
    }
}

/// Which key authorises a backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// Project anon key only; no user context.
    Anonymous,
    /// A user's bearer token; row-level security applies to this user.
    User(String),
}

impl Credential {
    pub fn token(&self) -> Option<&str> {
        match self {
            Credential::Anonymous => None,
            Credential::User(token) => Some(token),
        }
    }
}

/// `column = value` filter on a table request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

/// Table plus the equality filters accumulated by a [`TableRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    pub table: String,
    pub filters: Vec<Filter>,
}

impl TableQuery {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
        }
    }

    /// True when `row` satisfies every filter (string comparison, the way the
    /// REST layer compares query-string values).
    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|f| match row.get(&f.column) {
            Some(Value::String(s)) => *s == f.value,
            Some(Value::Null) | None => false,
            Some(other) => other.to_string() == f.value,
        })
    }
}

#[async_trait]
pub trait Backend: Send + Sync {
    /// Session introspection: resolve a bearer token to the provider's user object.
    async fn get_user(&self, token: &str) -> Result<Value, BackendError>;

    async fn select(&self, credential: &Credential, query: &TableQuery) -> Result<Vec<Value>, BackendError>;

    /// Exactly one row; zero or several rows is an error.
    async fn select_single(&self, credential: &Credential, query: &TableQuery) -> Result<Value, BackendError>;

    async fn upsert(&self, credential: &Credential, table: &str, row: Value) -> Result<(), BackendError>;

    async fn delete(&self, credential: &Credential, query: &TableQuery) -> Result<(), BackendError>;

    async fn rpc(&self, credential: &Credential, name: &str, params: Value) -> Result<Value, BackendError>;

    async fn invoke(&self, credential: &Credential, name: &str, body: Option<Value>) -> Result<Value, BackendError>;
}
