//! Cloud Firestore adapter (REST v1).
//!
//! Maps the four `DocumentStore` primitives onto the documents API:
//!
//! - list   → `GET    …/documents/{collection}` (follows `nextPageToken`)
//! - get    → `GET    …/documents/{collection}/{key}` (404 = absent)
//! - set    → `PATCH  …/documents/{collection}/{key}` (full field replacement)
//! - delete → `DELETE …/documents/{collection}/{key}`
//!
//! Preconditions become `currentDocument.exists=false` or
//! `currentDocument.updateTime=…`; the document's `updateTime` is its revision.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue, json};

use pantry_inventory::{
    Document, DocumentStore, FieldValue, Fields, Precondition, Revision, StoreError,
};

use crate::config::ApiKey;

pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_DATABASE: &str = "(default)";

const PAGE_SIZE: &str = "300";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirestoreConfig {
    pub base_url: String,
    pub project_id: String,
    pub database: String,
    pub api_key: Option<ApiKey>,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id: project_id.into(),
            database: DEFAULT_DATABASE.to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<WireDocument>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDocument {
    name: String,
    #[serde(default)]
    fields: BTreeMap<String, JsonValue>,
    update_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Firestore-backed document store.
#[derive(Debug, Clone)]
pub struct FirestoreStore {
    client: reqwest::Client,
    documents_url: Url,
    api_key: Option<ApiKey>,
}

impl FirestoreStore {
    pub fn new(config: FirestoreConfig, client: reqwest::Client) -> Result<Self, StoreError> {
        let raw = format!(
            "{}/projects/{}/databases/{}/documents",
            config.base_url.trim_end_matches('/'),
            config.project_id,
            config.database
        );
        let documents_url = Url::parse(&raw)
            .map_err(|e| StoreError::Transport(format!("invalid Firestore url {raw}: {e}")))?;
        if documents_url.cannot_be_a_base() {
            return Err(StoreError::Transport(format!(
                "invalid Firestore url {raw}: not a base url"
            )));
        }

        Ok(Self {
            client,
            documents_url,
            api_key: config.api_key,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.documents_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Transport("Firestore url cannot take a path".to_string()))?
            .extend(segments);
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key.expose());
        }
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<JsonValue>,
    ) -> Result<reqwest::Response, StoreError> {
        tracing::debug!(%method, path = url.path(), "firestore request");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        req.send()
            .await
            .map_err(|e| StoreError::Transport(e.without_url().to_string()))
    }
}

fn with_precondition(mut url: Url, precondition: &Precondition) -> Url {
    match precondition {
        Precondition::None => {}
        Precondition::Missing => {
            url.query_pairs_mut()
                .append_pair("currentDocument.exists", "false");
        }
        Precondition::Revision(rev) => {
            url.query_pairs_mut()
                .append_pair("currentDocument.updateTime", rev.as_str());
        }
    }
    url
}

/// Translate an error response. `conditional` marks writes carrying a
/// precondition, where a missing document also means the precondition failed.
async fn error_from(resp: reqwest::Response, key: &str, conditional: bool) -> StoreError {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    let (message, code) = match serde_json::from_str::<ErrorResponse>(&text) {
        Ok(parsed) => (parsed.error.message, parsed.error.status),
        Err(_) => (text, String::new()),
    };

    let precondition_failed = status == StatusCode::CONFLICT
        || code == "FAILED_PRECONDITION"
        || code == "ALREADY_EXISTS"
        || (conditional && status == StatusCode::NOT_FOUND);
    if precondition_failed {
        return StoreError::PreconditionFailed {
            key: key.to_string(),
        };
    }

    StoreError::Status {
        status: status.as_u16(),
        message,
    }
}

fn decode_value(value: &JsonValue) -> Option<FieldValue> {
    let obj = value.as_object()?;
    if obj.contains_key("nullValue") {
        return Some(FieldValue::Null);
    }
    if let Some(v) = obj.get("booleanValue") {
        return v.as_bool().map(FieldValue::Boolean);
    }
    if let Some(v) = obj.get("integerValue") {
        // int64 travels as a JSON string; accept a bare number as well.
        return match v {
            JsonValue::String(s) => s.parse().ok().map(FieldValue::Integer),
            other => other.as_i64().map(FieldValue::Integer),
        };
    }
    if let Some(v) = obj.get("doubleValue") {
        return v.as_f64().map(FieldValue::Double);
    }
    if let Some(v) = obj.get("stringValue") {
        return v.as_str().map(|s| FieldValue::String(s.to_string()));
    }
    None
}

fn encode_value(value: &FieldValue) -> JsonValue {
    match value {
        FieldValue::Null => json!({ "nullValue": null }),
        FieldValue::Boolean(b) => json!({ "booleanValue": b }),
        FieldValue::Integer(i) => json!({ "integerValue": i.to_string() }),
        FieldValue::Double(d) => json!({ "doubleValue": d }),
        FieldValue::String(s) => json!({ "stringValue": s }),
    }
}

fn encode_fields(fields: &Fields) -> JsonValue {
    let map: Map<String, JsonValue> = fields
        .iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect();
    json!({ "fields": map })
}

fn decode_document(wire: WireDocument) -> Result<Document, StoreError> {
    let key = wire
        .name
        .rsplit('/')
        .next()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| StoreError::Decode(format!("bad document name {}", wire.name)))?
        .to_string();
    let update_time = wire
        .update_time
        .ok_or_else(|| StoreError::Decode(format!("document {key} has no updateTime")))?;

    let mut fields = Fields::new();
    for (name, value) in &wire.fields {
        match decode_value(value) {
            Some(v) => {
                fields.insert(name.clone(), v);
            }
            None => tracing::debug!(%key, field = %name, "ignoring unsupported Firestore value"),
        }
    }

    Ok(Document {
        key,
        fields,
        revision: Revision::new(update_time),
    })
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.url(&[collection])?;
            url.query_pairs_mut().append_pair("pageSize", PAGE_SIZE);
            if let Some(token) = &page_token {
                url.query_pairs_mut().append_pair("pageToken", token);
            }

            let resp = self.send(Method::GET, url, None).await?;
            if !resp.status().is_success() {
                return Err(error_from(resp, collection, false).await);
            }
            let page: ListResponse = resp
                .json()
                .await
                .map_err(|e| StoreError::Decode(e.without_url().to_string()))?;

            for wire in page.documents {
                documents.push(decode_document(wire)?);
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        Ok(documents)
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError> {
        let url = self.url(&[collection, key])?;
        let resp = self.send(Method::GET, url, None).await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(error_from(resp, key, false).await);
        }

        let wire: WireDocument = resp
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.without_url().to_string()))?;
        decode_document(wire).map(Some)
    }

    async fn set(
        &self,
        collection: &str,
        key: &str,
        fields: Fields,
        precondition: Precondition,
    ) -> Result<(), StoreError> {
        let url = with_precondition(self.url(&[collection, key])?, &precondition);
        let resp = self
            .send(Method::PATCH, url, Some(encode_fields(&fields)))
            .await?;

        if !resp.status().is_success() {
            let conditional = precondition != Precondition::None;
            return Err(error_from(resp, key, conditional).await);
        }
        Ok(())
    }

    async fn delete(
        &self,
        collection: &str,
        key: &str,
        precondition: Precondition,
    ) -> Result<(), StoreError> {
        let url = with_precondition(self.url(&[collection, key])?, &precondition);
        let resp = self.send(Method::DELETE, url, None).await?;

        if !resp.status().is_success() {
            let conditional = precondition != Precondition::None;
            return Err(error_from(resp, key, conditional).await);
        }
        Ok(())
    }
}
