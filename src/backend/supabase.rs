use async_trait::async_trait;
use reqwest::{header, Method, RequestBuilder, Response};
use serde_json::{json, Value};
use url::Url;

use super::{Backend, BackendError, Credential, TableQuery};
use crate::config::{BackendConfig, ConfigError};

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// HTTP client for a Supabase project: GoTrue auth, PostgREST tables and
/// procedures, and edge functions.
///
/// One instance (and one `reqwest` connection pool) serves the whole
/// process; per-user scoping travels in the `Authorization` header of each
/// call, never in this struct.
#[derive(Debug, Clone)]
pub struct SupabaseBackend {
    http: reqwest::Client,
    base: Url,
    anon_key: String,
}

impl SupabaseBackend {
    pub fn new(url: &str, anon_key: &str) -> Result<Self, ConfigError> {
        let base = Url::parse(url).map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", url, e)))?;
        if base.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl(url.to_string()));
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base,
            anon_key: anon_key.to_string(),
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, ConfigError> {
        let (url, anon_key) = config.validate()?;
        Self::new(url, anon_key)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::Transport(format!("backend URL {} cannot be a base", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn table_url(&self, query: &TableQuery, select: bool) -> Result<Url, BackendError> {
        let mut url = self.endpoint(&["rest", "v1", query.table.as_str()])?;
        {
            let mut pairs = url.query_pairs_mut();
            if select {
                pairs.append_pair("select", "*");
            }
            for filter in &query.filters {
                pairs.append_pair(&filter.column, &format!("eq.{}", filter.value));
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, credential: &Credential) -> RequestBuilder {
        let bearer = credential.token().unwrap_or(&self.anon_key);
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", bearer))
    }

    async fn send(request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from(response).await)
        }
    }
}

/// Turn a non-2xx response into an opaque error carrying the body.
async fn error_from(response: Response) -> BackendError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    let payload = if text.trim().is_empty() {
        json!({ "message": status.canonical_reason().unwrap_or("backend error") })
    } else {
        serde_json::from_str(&text).unwrap_or_else(|_| json!({ "message": text }))
    };

    BackendError::api(status.as_u16(), payload)
}

/// Decode a success body: JSON when declared as such, text otherwise,
/// `null` when empty.
async fn body_value(response: Response) -> Result<Value, BackendError> {
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains("json"))
        .unwrap_or(false);

    let text = response
        .text()
        .await
        .map_err(|e| BackendError::Transport(e.to_string()))?;

    if text.is_empty() {
        return Ok(Value::Null);
    }
    if is_json {
        serde_json::from_str(&text).map_err(|e| BackendError::Decode(e.to_string()))
    } else {
        Ok(Value::String(text))
    }
}

#[async_trait]
impl Backend for SupabaseBackend {
    async fn get_user(&self, token: &str) -> Result<Value, BackendError> {
        let url = self.endpoint(&["auth", "v1", "user"])?;
        let credential = Credential::User(token.to_string());
        let response = Self::send(self.request(Method::GET, url, &credential)).await?;

        response
            .json::<Value>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn select(&self, credential: &Credential, query: &TableQuery) -> Result<Vec<Value>, BackendError> {
        let url = self.table_url(query, true)?;
        let response = Self::send(self.request(Method::GET, url, credential)).await?;

        match body_value(response).await? {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Err(BackendError::Decode(format!(
                "expected an array of rows from '{}', got {}",
                query.table, other
            ))),
        }
    }

    async fn select_single(&self, credential: &Credential, query: &TableQuery) -> Result<Value, BackendError> {
        let url = self.table_url(query, true)?;
        let request = self
            .request(Method::GET, url, credential)
            .header(header::ACCEPT, SINGLE_OBJECT);
        let response = Self::send(request).await?;

        body_value(response).await
    }

    async fn upsert(&self, credential: &Credential, table: &str, row: Value) -> Result<(), BackendError> {
        let url = self.endpoint(&["rest", "v1", table])?;
        let request = self
            .request(Method::POST, url, credential)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&row);
        Self::send(request).await?;
        Ok(())
    }

    async fn delete(&self, credential: &Credential, query: &TableQuery) -> Result<(), BackendError> {
        let url = self.table_url(query, false)?;
        let request = self
            .request(Method::DELETE, url, credential)
            .header("Prefer", "return=minimal");
        Self::send(request).await?;
        Ok(())
    }

    async fn rpc(&self, credential: &Credential, name: &str, params: Value) -> Result<Value, BackendError> {
        let url = self.endpoint(&["rest", "v1", "rpc", name])?;
        let response = Self::send(self.request(Method::POST, url, credential).json(&params)).await?;

        body_value(response).await
    }

    async fn invoke(&self, credential: &Credential, name: &str, body: Option<Value>) -> Result<Value, BackendError> {
        let url = self.endpoint(&["functions", "v1", name])?;
        let mut request = self.request(Method::POST, url, credential);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = Self::send(request).await?;

        body_value(response).await
    }
}
