use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::{Backend, BackendError, Credential, Filter, TableQuery};

/// Backend-access handle bound to one credential.
///
/// Handles are cheap: an `Arc` to the shared backend plus the credential.
/// Building one performs no I/O.
#[derive(Clone)]
pub struct Client {
    backend: Arc<dyn Backend>,
    credential: Credential,
}

impl Client {
    pub fn new(backend: Arc<dyn Backend>, credential: Credential) -> Self {
        Self { backend, credential }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Start a request against `table`.
    pub fn from(&self, table: &str) -> TableRequest<'_> {
        TableRequest {
            client: self,
            query: TableQuery::new(table),
        }
    }

    pub async fn rpc(&self, name: &str, params: Value) -> Result<Value, BackendError> {
        self.backend.rpc(&self.credential, name, params).await
    }

    /// Call a serverless function, optionally with a JSON body.
    pub async fn invoke(&self, name: &str, body: Option<Value>) -> Result<Value, BackendError> {
        self.backend.invoke(&self.credential, name, body).await
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the token itself
        let credential = match self.credential {
            Credential::Anonymous => "anonymous",
            Credential::User(_) => "user",
        };
        f.debug_struct("Client").field("credential", &credential).finish()
    }
}

/// Builder for one table operation, finished by one of the async terminals.
pub struct TableRequest<'a> {
    client: &'a Client,
    query: TableQuery,
}

impl<'a> TableRequest<'a> {
    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.query.filters.push(Filter {
            column: column.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub async fn select(self) -> Result<Vec<Value>, BackendError> {
        self.client.backend.select(&self.client.credential, &self.query).await
    }

    pub async fn single(self) -> Result<Value, BackendError> {
        self.client.backend.select_single(&self.client.credential, &self.query).await
    }

    pub async fn delete(self) -> Result<(), BackendError> {
        self.client.backend.delete(&self.client.credential, &self.query).await
    }

    /// Insert or overwrite by primary key. Filters are ignored.
    pub async fn upsert(self, row: Value) -> Result<(), BackendError> {
        self.client.backend.upsert(&self.client.credential, &self.query.table, row).await
    }
}
