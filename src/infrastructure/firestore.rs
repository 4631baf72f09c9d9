//! Firestore REST client implementing [`DocumentStore`].
//!
//! Firestore stores typed values (`{"stringValue": "x"}`), so records are
//! converted from and to plain JSON at this boundary.

use crate::domain::ports::{Document, DocumentStore, StoreError};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Map, Number, Value};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com";
const PAGE_SIZE: &str = "300";

#[derive(Clone)]
pub struct FirestoreDocumentStore {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    api_key: Option<SecretString>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    next_page_token: Option<String>,
}

impl FirestoreDocumentStore {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, project_id: impl Into<String>, api_key: Option<SecretString>) -> Self {
        Self { client, base_url: base_url.into().trim_end_matches('/').to_string(), project_id: project_id.into(), api_key }
    }

    fn url(&self, path: &str) -> Result<Url, StoreError> {
        let raw = format!("{}/v1/projects/{}/databases/(default)/documents/{}", self.base_url, self.project_id, path);
        let mut url = Url::parse(&raw).map_err(|e| StoreError::Unavailable(format!("bad store URL {raw}: {e}")))?;
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key.expose_secret());
        }
        Ok(url)
    }

    async fn error_from(response: reqwest::Response) -> StoreError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        StoreError::Api { status, message }
    }
}

#[async_trait]
impl DocumentStore for FirestoreDocumentStore {
    async fn add(&self, collection: &str, data: Value) -> Result<String, StoreError> {
        let Value::Object(fields) = data else {
            return Err(StoreError::Codec("documents must be JSON objects".to_string()));
        };
        let response = self.client.post(self.url(collection)?).json(&encode_fields(&fields)).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        let created: RawDocument = response.json().await?;
        let id = document_id(&created.name);
        debug!(collection, id = %id, "document created");
        Ok(id)
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut url = self.url(collection)?;
            url.query_pairs_mut().append_pair("pageSize", PAGE_SIZE);
            if let Some(token) = &page_token {
                url.query_pairs_mut().append_pair("pageToken", token);
            }
            let response = self.client.get(url).send().await?;
            if !response.status().is_success() {
                return Err(Self::error_from(response).await);
            }
            let page: ListResponse = response.json().await?;
            for raw in page.documents {
                documents.push(Document { id: document_id(&raw.name), data: decode_fields(&raw.fields)? });
            }
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(documents)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let response = self.client.get(self.url(&format!("{collection}/{id}"))?).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        let raw: RawDocument = response.json().await?;
        Ok(Some(Document { id: document_id(&raw.name), data: decode_fields(&raw.fields)? }))
    }
}

fn document_id(name: &str) -> String {
    name.rsplit('/').next().unwrap_or(name).to_string()
}

/// Wraps a JSON object as a Firestore document body.
pub fn encode_fields(fields: &Map<String, Value>) -> Value {
    json!({ "fields": encode_map(fields) })
}

fn encode_map(fields: &Map<String, Value>) -> Value {
    Value::Object(fields.iter().map(|(k, v)| (k.clone(), encode_value(v))).collect())
}

pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) if n.is_i64() || n.is_u64() => json!({ "integerValue": n.to_string() }),
        Value::Number(n) => json!({ "doubleValue": n }),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({ "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() } }),
        Value::Object(fields) => json!({ "mapValue": { "fields": encode_map(fields) } }),
    }
}

pub fn decode_fields(fields: &Map<String, Value>) -> Result<Value, StoreError> {
    let mut out = Map::with_capacity(fields.len());
    for (key, value) in fields {
        out.insert(key.clone(), decode_value(value)?);
    }
    Ok(Value::Object(out))
}

pub fn decode_value(value: &Value) -> Result<Value, StoreError> {
    let Some((kind, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return Err(StoreError::Codec(value.to_string()));
    };
    Ok(match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => Value::Bool(inner.as_bool().unwrap_or_default()),
        "integerValue" => {
            let n = match inner {
                Value::String(s) => s.parse::<i64>().map_err(|e| StoreError::Codec(format!("integerValue {s}: {e}")))?,
                other => other.as_i64().ok_or_else(|| StoreError::Codec(other.to_string()))?,
            };
            Value::Number(n.into())
        }
        "doubleValue" => inner
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| StoreError::Codec(inner.to_string()))?,
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "arrayValue" => {
            let values = inner.get("values").and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default();
            Value::Array(values.iter().map(decode_value).collect::<Result<_, _>>()?)
        }
        "mapValue" => match inner.get("fields").and_then(Value::as_object) {
            Some(fields) => decode_fields(fields)?,
            None => Value::Object(Map::new()),
        },
        other => return Err(StoreError::Codec(format!("unsupported Firestore value type {other}"))),
    })
}
