#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use journal_gateway::app::{app, AppState};
use journal_gateway::backend::{Backend, BackendError, Credential, TableQuery};
use journal_gateway::config::AppConfig;

pub const ADA: &str = "token-ada";
pub const BOB: &str = "token-bob";

/// One backend call as the fake saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub op: &'static str,
    pub target: String,
    pub token: Option<String>,
    pub payload: Value,
}

#[derive(Default)]
struct Store {
    tables: HashMap<String, Vec<Value>>,
    failures: HashMap<String, Value>,
    calls: Vec<Call>,
    next_id: u64,
}

/// In-memory stand-in for the hosted backend.
///
/// Emulates enough row-level security for the gateway's tables: `entries`
/// rows are visible to their `user_id`, `profiles` rows to their `id`, every
/// other table is public.
pub struct MemoryBackend {
    users: HashMap<String, Value>,
    store: Mutex<Store>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        let mut users = HashMap::new();
        users.insert(ADA.to_string(), json!({ "id": "u-ada", "email": "ada@example.com", "role": "authenticated" }));
        users.insert(BOB.to_string(), json!({ "id": "u-bob", "email": "bob@example.com", "role": "authenticated" }));

        Self {
            users,
            store: Mutex::new(Store { next_id: 1, ..Store::default() }),
        }
    }

    pub fn with_rows(self, table: &str, rows: Value) -> Self {
        let rows = match rows {
            Value::Array(rows) => rows,
            other => vec![other],
        };
        self.store.lock().unwrap().tables.insert(table.to_string(), rows);
        self
    }

    /// Make every call against `target` (table, function or procedure) fail with `payload`.
    pub fn failing(self, target: &str, payload: Value) -> Self {
        self.store.lock().unwrap().failures.insert(target.to_string(), payload);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.store.lock().unwrap().calls.clone()
    }

    pub fn calls_to(&self, op: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.op == op).collect()
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.store.lock().unwrap().tables.get(table).cloned().unwrap_or_default()
    }

    fn uid(&self, credential: &Credential) -> Result<Option<String>, BackendError> {
        match credential {
            Credential::Anonymous => Ok(None),
            Credential::User(token) => self
                .users
                .get(token)
                .and_then(|u| u["id"].as_str())
                .map(|id| Some(id.to_string()))
                .ok_or_else(|| BackendError::api(401, json!({ "message": "JWT expired" }))),
        }
    }

    /// Record the call, then fail it if `target` was set up to fail.
    fn begin(&self, op: &'static str, target: &str, credential: &Credential, payload: Value) -> Result<(), BackendError> {
        let mut store = self.store.lock().unwrap();
        store.calls.push(Call {
            op,
            target: target.to_string(),
            token: credential.token().map(str::to_string),
            payload,
        });
        match store.failures.get(target) {
            Some(payload) => Err(BackendError::api(400, payload.clone())),
            None => Ok(()),
        }
    }
}

fn visible(table: &str, row: &Value, uid: Option<&str>) -> bool {
    match table {
        "entries" => uid.is_some() && row.get("user_id").and_then(Value::as_str) == uid,
        "profiles" => uid.is_some() && row.get("id").and_then(Value::as_str) == uid,
        _ => true,
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn get_user(&self, token: &str) -> Result<Value, BackendError> {
        self.begin("get_user", "auth", &Credential::User(token.to_string()), Value::Null)?;
        self.users
            .get(token)
            .cloned()
            .ok_or_else(|| BackendError::api(401, json!({ "msg": "invalid JWT" })))
    }

    async fn select(&self, credential: &Credential, query: &TableQuery) -> Result<Vec<Value>, BackendError> {
        self.begin("select", &query.table, credential, Value::Null)?;
        let uid = self.uid(credential)?;
        Ok(self
            .rows(&query.table)
            .into_iter()
            .filter(|row| visible(&query.table, row, uid.as_deref()) && query.matches(row))
            .collect())
    }

    async fn select_single(&self, credential: &Credential, query: &TableQuery) -> Result<Value, BackendError> {
        let mut rows = self.select(credential, query).await?;
        if rows.len() == 1 {
            Ok(rows.remove(0))
        } else {
            Err(BackendError::api(
                406,
                json!({
                    "code": "PGRST116",
                    "details": format!("The result contains {} rows", rows.len()),
                    "message": "JSON object requested, multiple (or no) rows returned"
                }),
            ))
        }
    }

    async fn upsert(&self, credential: &Credential, table: &str, row: Value) -> Result<(), BackendError> {
        self.begin("upsert", table, credential, row.clone())?;
        let uid = self.uid(credential)?;
        if !visible(table, &row, uid.as_deref()) {
            return Err(BackendError::api(
                403,
                json!({ "code": "42501", "message": "new row violates row-level security policy" }),
            ));
        }

        let mut store = self.store.lock().unwrap();
        let rows = store.tables.entry(table.to_string()).or_default();
        match rows.iter().position(|r| r.get("id") == row.get("id")) {
            Some(i) => merge(&mut rows[i], &row),
            None => rows.push(row),
        }
        Ok(())
    }

    async fn delete(&self, credential: &Credential, query: &TableQuery) -> Result<(), BackendError> {
        self.begin("delete", &query.table, credential, Value::Null)?;
        let uid = self.uid(credential)?;

        let mut store = self.store.lock().unwrap();
        if let Some(rows) = store.tables.get_mut(&query.table) {
            rows.retain(|row| !(visible(&query.table, row, uid.as_deref()) && query.matches(row)));
        }
        Ok(())
    }

    async fn rpc(&self, credential: &Credential, name: &str, params: Value) -> Result<Value, BackendError> {
        self.begin("rpc", name, credential, params.clone())?;
        self.uid(credential)?;

        match name {
            "mark_user_deleted" => {
                let mut store = self.store.lock().unwrap();
                store.tables.entry("deleted_users".to_string()).or_default().push(params);
                Ok(Value::Null)
            }
            _ => Err(BackendError::api(404, json!({ "message": format!("function {} not found", name) }))),
        }
    }

    async fn invoke(&self, credential: &Credential, name: &str, body: Option<Value>) -> Result<Value, BackendError> {
        self.begin("invoke", name, credential, body.clone().unwrap_or(Value::Null))?;
        let uid = self
            .uid(credential)?
            .ok_or_else(|| BackendError::api(401, json!({ "message": "login required" })))?;

        let mut store = self.store.lock().unwrap();
        match name {
            "insert_entry" => {
                let mut entry = match body {
                    Some(Value::Object(map)) => map,
                    _ => Map::new(),
                };
                entry.insert("id".to_string(), json!(store.next_id));
                entry.insert("user_id".to_string(), json!(uid));
                store.next_id += 1;
                store.tables.entry("entries".to_string()).or_default().push(Value::Object(entry));
                Ok(json!({ "ok": true }))
            }
            "update_entry" => {
                let body = body.unwrap_or(Value::Null);
                let entries = store.tables.entry("entries".to_string()).or_default();
                let target = entries
                    .iter_mut()
                    .find(|e| e.get("id") == body.get("id") && e["user_id"] == json!(uid));
                match target {
                    Some(existing) => {
                        merge(existing, &body);
                        Ok(json!({ "ok": true }))
                    }
                    None => Err(BackendError::api(400, json!({ "message": "entry not found" }))),
                }
            }
            "get_entries" => {
                let mine: Vec<Value> = store
                    .tables
                    .get("entries")
                    .map(|rows| rows.iter().filter(|e| e["user_id"] == json!(uid)).cloned().collect())
                    .unwrap_or_default();
                Ok(Value::Array(mine))
            }
            _ => Err(BackendError::api(404, json!({ "message": format!("function {} not found", name) }))),
        }
    }
}

fn merge(existing: &mut Value, update: &Value) {
    if let (Some(existing), Some(update)) = (existing.as_object_mut(), update.as_object()) {
        for (k, v) in update {
            existing.insert(k.clone(), v.clone());
        }
    }
}

/// Gateway router served on a free local port over a [`MemoryBackend`].
static TRACING: Once = Once::new();

/// Route gateway logs through the test harness; `RUST_LOG` widens the filter.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub backend: Arc<MemoryBackend>,
    pub client: reqwest::Client,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn(backend: MemoryBackend) -> Result<Self> {
        init_tracing();
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let backend = Arc::new(backend);
        let mut config = AppConfig::development();
        config.api.enable_request_logging = false;
        let router = app(AppState::new(backend.clone()), &config);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind {}", base_url))?;
        tracing::debug!("test gateway listening on {}", base_url);
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Ok(Self {
            port,
            base_url,
            backend,
            client: reqwest::Client::new(),
            handle,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path))
    }

    pub fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.put(self.url(path))
    }

    pub fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.delete(self.url(path))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub async fn ensure_server() -> Result<TestServer> {
    TestServer::spawn(MemoryBackend::new()).await
}
