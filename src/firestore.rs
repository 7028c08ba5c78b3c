//! Firestore-backed [`DocumentStore`] over the Firestore REST API.
//!
//! Report documents live at
//! `{base_url}/v1/projects/{project}/databases/(default)/documents/{collection}/{id}`.
//!
//! # Operations
//!
//! | Store call | HTTP |
//! |-----------|------|
//! | `get_report` | `GET` document; `404` means absent |
//! | `merge_update` | `PATCH` with one `updateMask.fieldPaths` per field and `currentDocument.exists=true` |
//! | `ping` | `GET` the collection with `pageSize=1` |
//!
//! A bearer token from `FIRESTORE_ACCESS_TOKEN` is attached when set. The
//! Firestore emulator accepts unauthenticated requests, so pointing
//! `store.base_url` at it needs no token.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{StatusCode, Url};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, instrument};

use smehub_report_core::models::{check_document_id, ReportDocument, ReportStatus, ReportUpdate};
use smehub_report_core::store::DocumentStore;

use crate::config::StoreConfig;

pub struct FirestoreStore {
    client: reqwest::Client,
    base_url: Url,
    project_id: String,
    collection: String,
    access_token: Option<String>,
}

impl FirestoreStore {
    pub fn new(config: &StoreConfig, access_token: Option<String>) -> Result<Self> {
        let project_id = config
            .project_id
            .clone()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| anyhow!("store.project_id required for Firestore"))?;
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid store.base_url: {}", config.base_url))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            project_id,
            collection: config.collection.clone(),
            access_token: access_token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// Create a store using `FIRESTORE_ACCESS_TOKEN` from the environment, if set.
    pub fn from_env(config: &StoreConfig) -> Result<Self> {
        Self::new(config, std::env::var("FIRESTORE_ACCESS_TOKEN").ok())
    }

    fn collection_url(&self) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("store.base_url cannot be a base URL"))?
            .pop_if_empty()
            .extend([
                "v1",
                "projects",
                self.project_id.as_str(),
                "databases",
                "(default)",
                "documents",
                self.collection.as_str(),
            ]);
        Ok(url)
    }

    fn document_url(&self, id: &str) -> Result<Url> {
        check_document_id(id)?;
        let mut url = self.collection_url()?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("store.base_url cannot be a base URL"))?
            .push(id);
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

fn string_value(s: &str) -> Value {
    json!({ "stringValue": s })
}

fn timestamp_value(ts: &DateTime<Utc>) -> Value {
    json!({ "timestampValue": ts.to_rfc3339_opts(SecondsFormat::Micros, true) })
}

/// Encode the fields of an update as a Firestore `fields` map.
fn encode_update(update: &ReportUpdate) -> Map<String, Value> {
    let mut fields = Map::new();
    if let Some(status) = update.status {
        fields.insert("status".to_string(), string_value(status.as_str()));
    }
    if let Some(report) = &update.generated_report {
        fields.insert("generatedReport".to_string(), string_value(report));
    }
    if let Some(error) = &update.error {
        fields.insert("error".to_string(), string_value(error));
    }
    if let Some(ts) = &update.updated_at {
        fields.insert("updatedAt".to_string(), timestamp_value(ts));
    }
    if let Some(ts) = &update.completed_at {
        fields.insert("completedAt".to_string(), timestamp_value(ts));
    }
    fields
}

fn field_str<'a>(fields: &'a Value, name: &str) -> Option<&'a str> {
    fields.get(name)?.get("stringValue")?.as_str()
}

fn field_ts(fields: &Value, name: &str) -> Option<DateTime<Utc>> {
    let raw = fields.get(name)?.get("timestampValue")?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Decode a Firestore document resource into a [`ReportDocument`].
fn decode_document(id: &str, json: &Value) -> ReportDocument {
    let empty = Value::Object(Map::new());
    let fields = json.get("fields").unwrap_or(&empty);

    let status = field_str(fields, "status").and_then(|s| s.parse::<ReportStatus>().ok());

    ReportDocument {
        id: id.to_string(),
        status,
        generated_report: field_str(fields, "generatedReport")
            .unwrap_or_default()
            .to_string(),
        error: field_str(fields, "error").map(str::to_string),
        created_at: field_ts(fields, "createdAt"),
        updated_at: field_ts(fields, "updatedAt"),
        completed_at: field_ts(fields, "completedAt"),
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    fn name(&self) -> &str {
        "firestore"
    }

    #[instrument(skip(self))]
    async fn get_report(&self, id: &str) -> Result<Option<ReportDocument>> {
        let url = self.document_url(id)?;
        let response = self.authorize(self.client.get(url)).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Firestore read failed {}: {}", status, body_text);
        }

        let json: Value = response.json().await?;
        Ok(Some(decode_document(id, &json)))
    }

    #[instrument(skip(self, update), fields(fields = ?update.field_names()))]
    async fn merge_update(&self, id: &str, update: &ReportUpdate) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }

        let url = self.document_url(id)?;
        let mut query: Vec<(&str, &str)> = update
            .field_names()
            .into_iter()
            .map(|f| ("updateMask.fieldPaths", f))
            .collect();
        query.push(("currentDocument.exists", "true"));

        let response = self
            .authorize(self.client.patch(url))
            .query(&query)
            .json(&json!({ "fields": encode_update(update) }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Firestore update failed {}: {}", status, body_text);
        }

        debug!(report_id = id, "Firestore document updated");
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let url = self.collection_url()?;
        let response = self
            .authorize(self.client.get(url))
            .query(&[("pageSize", "1")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            bail!("Firestore ping failed {}", status);
        }
        Ok(())
    }
}
