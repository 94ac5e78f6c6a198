//! Realtime Database client.
//!
//! # Transports
//!
//! - **REST**: `{url}/{path}.json` with an optional `auth` query parameter
//!   (a database secret or ID token). Filtered reads use
//!   `orderBy="child"&equalTo=value`, which needs an `.indexOn` rule for the
//!   child (see `database.rules.json`). When the rule is missing the server
//!   answers 400 "Index not defined"; the query then falls back to reading
//!   the whole path and filtering locally.
//! - **Memory**: an in-process JSON tree with the same path semantics. Selected
//!   with the URL `memory://`; used for local development and tests.
//!
//! Both transports follow the database's storage model: `null` means absent,
//! writing `null` deletes, and empty objects are not stored.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::{FirebaseError, excerpt};

/// URL selecting the in-memory transport.
pub const MEMORY_URL: &str = "memory://";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const FORBIDDEN_KEY_CHARS: [char; 5] = ['.', '#', '$', '[', ']'];

/// Handle to a Realtime Database. Cheap to clone.
#[derive(Clone)]
pub struct RealtimeDatabase {
    transport: Transport,
}

#[derive(Clone)]
enum Transport {
    Rest(Arc<RestTransport>),
    Memory(Arc<MemoryTransport>),
}

struct RestTransport {
    client: reqwest::Client,
    base: Url,
    auth: Option<SecretString>,
}

#[derive(Default)]
struct MemoryTransport {
    root: RwLock<Value>,
}

impl std::fmt::Debug for RealtimeDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.transport {
            Transport::Rest(rest) => f
                .debug_struct("RealtimeDatabase")
                .field("url", &rest.base.as_str())
                .field("auth", &rest.auth.as_ref().map(|_| "[REDACTED]"))
                .finish(),
            Transport::Memory(_) => f.debug_struct("RealtimeDatabase").field("url", &MEMORY_URL).finish(),
        }
    }
}

impl RealtimeDatabase {
    /// Connect to the database at `url`, or create an in-memory one for `memory://`.
    ///
    /// # Errors
    ///
    /// Returns `FirebaseError::InvalidUrl` if the URL cannot be parsed, or
    /// `FirebaseError::Http` if the HTTP client cannot be built.
    pub fn connect(url: &str, auth: Option<SecretString>) -> Result<Self, FirebaseError> {
        let url = url.trim();
        if url.starts_with(MEMORY_URL) {
            return Ok(Self::memory());
        }

        let base = Url::parse(url)?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            transport: Transport::Rest(Arc::new(RestTransport { client, base, auth })),
        })
    }

    /// Create an empty in-memory database.
    #[must_use]
    pub fn memory() -> Self {
        Self {
            transport: Transport::Memory(Arc::new(MemoryTransport::default())),
        }
    }

    /// Whether this handle uses the in-memory transport.
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self.transport, Transport::Memory(_))
    }

    /// Short transport name for logs.
    #[must_use]
    pub const fn backend_name(&self) -> &'static str {
        match self.transport {
            Transport::Rest(_) => "rest",
            Transport::Memory(_) => "memory",
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Raw value at `path`; `Value::Null` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid or the request fails.
    #[instrument(level = "debug", skip(self), fields(backend = self.backend_name()))]
    pub async fn get_value(&self, path: &str) -> Result<Value, FirebaseError> {
        let segments = segments(path)?;
        match &self.transport {
            Transport::Rest(rest) => rest.send(Method::GET, &segments, &[], None).await,
            Transport::Memory(memory) => {
                let root = memory.root.read().await;
                Ok(lookup(&root, &segments).cloned().unwrap_or(Value::Null))
            }
        }
    }

    /// Typed value at `path`, `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the value does not decode as `T`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, FirebaseError> {
        match self.get_value(path).await? {
            Value::Null => Ok(None),
            value => Ok(Some(serde_json::from_value(value)?)),
        }
    }

    /// Children of `path` as `(key, value)` pairs in key order.
    ///
    /// Children that fail to decode are logged and skipped so one bad record
    /// cannot hide the rest of a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Vec<(String, T)>, FirebaseError> {
        let value = self.get_value(path).await?;
        Ok(decode_children(path, value))
    }

    /// Children of `path` whose `child` field equals `value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(level = "debug", skip(self, value), fields(backend = self.backend_name()))]
    pub async fn query_equal_to<T: DeserializeOwned>(
        &self,
        path: &str,
        child: &str,
        value: impl Into<Value> + Send,
    ) -> Result<Vec<(String, T)>, FirebaseError> {
        let segments = segments(path)?;
        let value = value.into();
        let matches = match &self.transport {
            Transport::Rest(rest) => {
                let query = [
                    ("orderBy", Value::String(child.to_string()).to_string()),
                    ("equalTo", value.to_string()),
                ];
                match rest.send(Method::GET, &segments, &query, None).await {
                    Ok(matches) => matches,
                    Err(e) if is_missing_index(&e) => {
                        warn!(
                            path,
                            child,
                            "No .indexOn rule for query; filtering the full listing instead"
                        );
                        let all = rest.send(Method::GET, &segments, &[], None).await?;
                        filter_children(Some(&all), child, &value)
                    }
                    Err(e) => return Err(e),
                }
            }
            Transport::Memory(memory) => {
                let root = memory.root.read().await;
                filter_children(lookup(&root, &segments), child, &value)
            }
        };
        Ok(decode_children(path, matches))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Replace the value at `path` (PUT).
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized or the request fails.
    #[instrument(level = "debug", skip(self, value), fields(backend = self.backend_name()))]
    pub async fn set<T: Serialize + ?Sized + Sync>(
        &self,
        path: &str,
        value: &T,
    ) -> Result<(), FirebaseError> {
        let segments = segments(path)?;
        let value = serde_json::to_value(value)?;
        match &self.transport {
            Transport::Rest(rest) => {
                rest.send(Method::PUT, &segments, &[], Some(&value)).await?;
            }
            Transport::Memory(memory) => {
                let mut root = memory.root.write().await;
                write(&mut root, &segments, value);
            }
        }
        Ok(())
    }

    /// Merge fields into the object at `path` (PATCH).
    ///
    /// Keys may contain `/` to address nested children; `null` values delete.
    ///
    /// # Errors
    ///
    /// Returns `FirebaseError::InvalidPath` if `fields` is not a JSON object or
    /// contains an invalid key, or an error if the request fails.
    #[instrument(level = "debug", skip(self, fields), fields(backend = self.backend_name()))]
    pub async fn update<T: Serialize + ?Sized + Sync>(
        &self,
        path: &str,
        fields: &T,
    ) -> Result<(), FirebaseError> {
        let base = segments(path)?;
        let Value::Object(fields) = serde_json::to_value(fields)? else {
            return Err(FirebaseError::InvalidPath(format!(
                "update of '{path}' requires an object"
            )));
        };
        for key in fields.keys() {
            segments(key)?;
        }

        match &self.transport {
            Transport::Rest(rest) => {
                let body = Value::Object(fields);
                rest.send(Method::PATCH, &base, &[], Some(&body)).await?;
            }
            Transport::Memory(memory) => {
                let mut root = memory.root.write().await;
                for (key, value) in fields {
                    let mut target = base.clone();
                    target.extend(key.split('/').filter(|s| !s.is_empty()).map(str::to_string));
                    write(&mut root, &target, value);
                }
            }
        }
        Ok(())
    }

    /// Delete the value at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(level = "debug", skip(self), fields(backend = self.backend_name()))]
    pub async fn remove(&self, path: &str) -> Result<(), FirebaseError> {
        let segments = segments(path)?;
        match &self.transport {
            Transport::Rest(rest) => {
                rest.send(Method::DELETE, &segments, &[], None).await?;
            }
            Transport::Memory(memory) => {
                let mut root = memory.root.write().await;
                write(&mut root, &segments, Value::Null);
            }
        }
        Ok(())
    }

    /// Whether the database is reachable.
    pub async fn connected(&self) -> bool {
        match &self.transport {
            Transport::Memory(_) => true,
            Transport::Rest(rest) => {
                let segments = [".info".to_string(), "connected".to_string()];
                match rest.send(Method::GET, &segments, &[], None).await {
                    Ok(Value::Bool(connected)) => connected,
                    Ok(_) => true,
                    Err(e) => {
                        warn!(error = %e, "Realtime Database connectivity check failed");
                        false
                    }
                }
            }
        }
    }
}

impl RestTransport {
    fn url_for(&self, segments: &[String]) -> Result<Url, FirebaseError> {
        let mut url = self.base.clone();
        {
            let mut parts = url
                .path_segments_mut()
                .map_err(|()| FirebaseError::InvalidPath(self.base.to_string()))?;
            parts.pop_if_empty();
            match segments.split_last() {
                Some((last, rest)) => {
                    parts.extend(rest);
                    parts.push(&format!("{last}.json"));
                }
                None => {
                    parts.push(".json");
                }
            }
        }
        if let Some(auth) = &self.auth {
            url.query_pairs_mut().append_pair("auth", auth.expose_secret());
        }
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        segments: &[String],
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, FirebaseError> {
        let mut url = self.url_for(segments)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        let mut request = self.client.request(method.clone(), url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            warn!(%method, path = %segments.join("/"), "Realtime Database denied access");
            return Err(FirebaseError::PermissionDenied(excerpt(&text)));
        }
        if !status.is_success() {
            tracing::error!(
                %method,
                status = %status,
                body = %excerpt(&text),
                "Realtime Database returned non-success status"
            );
            return Err(FirebaseError::Status {
                status: status.as_u16(),
                body: excerpt(&text),
            });
        }

        debug!(%method, path = %segments.join("/"), bytes = text.len(), "Realtime Database response");
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Split a path into validated key segments. Empty segments are ignored.
fn segments(path: &str) -> Result<Vec<String>, FirebaseError> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|segment| {
            if segment.contains(FORBIDDEN_KEY_CHARS) || segment.chars().any(char::is_control) {
                Err(FirebaseError::InvalidPath(path.to_string()))
            } else {
                Ok(segment.to_string())
            }
        })
        .collect()
}

fn decode_children<T: DeserializeOwned>(path: &str, value: Value) -> Vec<(String, T)> {
    let entries: Vec<(String, Value)> = match value {
        Value::Object(map) => map.into_iter().collect(),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Vec::new(),
    };

    entries
        .into_iter()
        .filter_map(|(key, value)| match serde_json::from_value(value) {
            Ok(decoded) => Some((key, decoded)),
            Err(e) => {
                warn!(path, key = %key, error = %e, "Skipping record that failed to decode");
                None
            }
        })
        .collect()
}

// =============================================================================
// In-memory tree operations
// =============================================================================

fn lookup<'a>(node: &'a Value, segments: &[String]) -> Option<&'a Value> {
    segments.iter().try_fold(node, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Store `value` at `segments`, deleting on `null` and pruning empty parents.
fn write(root: &mut Value, segments: &[String], value: Value) {
    let value = strip_nulls(value);
    if value.is_null() {
        remove_at(root, segments);
    } else {
        set_at(root, segments, value);
    }
}

fn set_at(node: &mut Value, segments: &[String], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        *node = value;
        return;
    };
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        let child = map.entry(first.clone()).or_insert(Value::Null);
        set_at(child, rest, value);
    }
}

fn remove_at(node: &mut Value, segments: &[String]) {
    let Some((first, rest)) = segments.split_first() else {
        *node = Value::Null;
        return;
    };
    if let Value::Object(map) = node {
        if rest.is_empty() {
            map.remove(first);
        } else if let Some(child) = map.get_mut(first) {
            remove_at(child, rest);
            if is_vacant(child) {
                map.remove(first);
            }
        }
    }
}

fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let cleaned: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, strip_nulls(v)))
                .filter(|(_, v)| !is_vacant(v))
                .collect();
            if cleaned.is_empty() {
                Value::Null
            } else {
                Value::Object(cleaned)
            }
        }
        Value::Array(items) => {
            let cleaned: Vec<Value> = items.into_iter().map(strip_nulls).collect();
            if cleaned.iter().all(Value::is_null) {
                Value::Null
            } else {
                Value::Array(cleaned)
            }
        }
        other => other,
    }
}

fn is_vacant(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// The server rejected an `orderBy` query because the child has no `.indexOn` rule.
fn is_missing_index(err: &FirebaseError) -> bool {
    matches!(err, FirebaseError::Status { status: 400, body } if body.contains("Index not defined"))
}

/// Children of `node` whose `child` field equals `value`.
fn filter_children(node: Option<&Value>, child: &str, value: &Value) -> Value {
    let filtered: Map<String, Value> = match node {
        Some(Value::Object(children)) => children
            .iter()
            .filter(|(_, record)| record.get(child) == Some(value))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        _ => Map::new(),
    };
    Value::Object(filtered)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_set_get_remove() {
        let db = RealtimeDatabase::memory();
        db.set("products/p1", &json!({"name": "Mango", "price": 250}))
            .await
            .unwrap();

        assert_eq!(
            db.get_value("products/p1/name").await.unwrap(),
            json!("Mango")
        );

        db.remove("products/p1").await.unwrap();
        assert_eq!(db.get_value("products").await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_memory_set_strips_nulls() {
        let db = RealtimeDatabase::memory();
        db.set("orders/o1", &json!({"couponCode": null, "total": 10}))
            .await
            .unwrap();
        assert_eq!(db.get_value("orders/o1").await.unwrap(), json!({"total": 10}));

        db.set("orders/o2", &json!({"empty": {}})).await.unwrap();
        assert_eq!(db.get_value("orders/o2").await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_memory_update_merges_and_deletes() {
        let db = RealtimeDatabase::memory();
        db.set("coupons/c1", &json!({"code": "A", "usedCount": 1, "lastUsed": 5}))
            .await
            .unwrap();
        db.update(
            "coupons/c1",
            &json!({"usedCount": 2, "lastUsed": null, "meta/by": "admin"}),
        )
        .await
        .unwrap();

        assert_eq!(
            db.get_value("coupons/c1").await.unwrap(),
            json!({"code": "A", "usedCount": 2, "meta": {"by": "admin"}})
        );
    }

    #[tokio::test]
    async fn test_update_requires_object() {
        let db = RealtimeDatabase::memory();
        let err = db.update("settings", &json!(5)).await.unwrap_err();
        assert!(matches!(err, FirebaseError::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_memory_query_equal_to() {
        let db = RealtimeDatabase::memory();
        db.set("orders/a", &json!({"userId": "u1", "n": 1})).await.unwrap();
        db.set("orders/b", &json!({"userId": "u2", "n": 2})).await.unwrap();
        db.set("orders/c", &json!({"userId": "u1", "n": 3})).await.unwrap();

        let found: Vec<(String, Value)> = db.query_equal_to("orders", "userId", "u1").await.unwrap();
        let keys: Vec<_> = found.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn test_missing_index_is_recognized() {
        let missing = FirebaseError::Status {
            status: 400,
            body: r#"{"error":"Index not defined, add \".indexOn\": \"userId\", for path \"/orders\", to the rules"}"#
                .to_string(),
        };
        assert!(is_missing_index(&missing));

        let other = FirebaseError::Status {
            status: 400,
            body: r#"{"error":"Invalid data"}"#.to_string(),
        };
        assert!(!is_missing_index(&other));
        assert!(!is_missing_index(&FirebaseError::PermissionDenied("denied".into())));
    }

    /// Serves `/orders.json` like a database without an `.indexOn` rule:
    /// filtered reads fail with 400, plain reads return the whole listing.
    async fn unindexed_server() -> String {
        use std::collections::HashMap;

        use axum::Json;
        use axum::extract::Query;
        use axum::http::StatusCode;
        use axum::routing::get;

        async fn orders(Query(params): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
            if params.contains_key("orderBy") {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "Index not defined, add \".indexOn\": \"userId\", for path \"/orders\", to the rules"
                    })),
                );
            }
            (
                StatusCode::OK,
                Json(json!({
                    "a": {"userId": "u1", "n": 1},
                    "b": {"userId": "u2", "n": 2},
                    "c": {"userId": "u1", "n": 3}
                })),
            )
        }

        let app = axum::Router::new().route("/orders.json", get(orders));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn test_rest_query_without_index_filters_full_listing() {
        let url = unindexed_server().await;
        let db = RealtimeDatabase::connect(&url, None).unwrap();

        let found: Vec<(String, Value)> = db.query_equal_to("orders", "userId", "u1").await.unwrap();
        let keys: Vec<_> = found.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_list_skips_bad_records() {
        #[derive(serde::Deserialize)]
        struct Named {
            #[allow(dead_code)]
            name: String,
        }

        let db = RealtimeDatabase::memory();
        db.set("items/a", &json!({"name": "ok"})).await.unwrap();
        db.set("items/b", &json!({"other": 1})).await.unwrap();

        let items: Vec<(String, Named)> = db.list("items").await.unwrap();
        assert_eq!(items.len(), 1);
        assert!(db.list::<Named>("missing").await.unwrap().is_empty());
    }

    #[test]
    fn test_invalid_path_segments() {
        assert!(segments("products/p1").is_ok());
        assert!(segments("products/p.1").is_err());
        assert!(segments("orders/#1").is_err());
        assert_eq!(segments("/a//b/").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_rest_url_building() {
        let db = RealtimeDatabase::connect(
            "https://demo-default-rtdb.firebaseio.com/",
            Some(SecretString::from("s3cret".to_string())),
        )
        .unwrap();
        let Transport::Rest(rest) = &db.transport else {
            panic!("expected REST transport");
        };
        let url = rest.url_for(&segments("orders/abc").unwrap()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://demo-default-rtdb.firebaseio.com/orders/abc.json?auth=s3cret"
        );
        let root = rest.url_for(&[]).unwrap();
        assert!(root.as_str().starts_with("https://demo-default-rtdb.firebaseio.com/.json"));
        assert!(!format!("{db:?}").contains("s3cret"));
    }

    #[tokio::test]
    async fn test_memory_selected_by_url() {
        let db = RealtimeDatabase::connect("memory://", None).unwrap();
        assert!(db.is_memory());
        assert!(db.connected().await);
    }
}
