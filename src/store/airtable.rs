//! HTTP client for an Airtable-style REST record store.

use crate::config::AppSettings;
use crate::errors::{AppError, AppResult};
use crate::models::{ListQuery, RawRecord, RecordId};
use crate::redaction::redact;
use crate::store::RecordStore;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use std::time::Duration;

const MAX_PAGES: usize = 1_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirtableConfig {
    pub api_url: String,
    pub base_id: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl AirtableConfig {
    pub fn from_settings(settings: &AppSettings, token: Option<String>) -> Self {
        Self {
            api_url: settings.api_url.clone(),
            base_id: settings.base_id.clone(),
            token,
            timeout_secs: settings.timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordPage {
    #[serde(default)]
    pub records: Vec<RawRecord>,
    pub offset: Option<String>,
}

#[derive(Debug, Serialize)]
struct FieldsBody<'a> {
    fields: &'a Map<String, Value>,
}

pub struct AirtableStore {
    config: AirtableConfig,
    client: Client,
}

impl AirtableStore {
    pub fn new(config: AirtableConfig) -> AppResult<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = config.token.as_deref() {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| AppError::Config("Store token contains invalid header characters".to_string()))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| AppError::Config(error.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn table_url(&self, table: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.api_url.trim_end_matches('/'),
            urlencoding::encode(&self.config.base_id),
            urlencoding::encode(table)
        )
    }

    pub fn record_url(&self, table: &str, id: &str) -> String {
        format!("{}/{}", self.table_url(table), urlencoding::encode(id))
    }

    async fn fetch_page(&self, table: &str, query: &ListQuery, offset: Option<String>) -> AppResult<RecordPage> {
        let response = self
            .client
            .get(self.table_url(table))
            .query(&list_params(query, offset.as_deref()))
            .send()
            .await?;
        handle_response(response).await
    }
}

impl RecordStore for AirtableStore {
    async fn fetch_all(&self, table: &str, query: &ListQuery) -> AppResult<Vec<RawRecord>> {
        let records = collect_pages(|offset| self.fetch_page(table, query, offset)).await?;
        tracing::debug!(table, count = records.len(), "fetched records");
        Ok(records)
    }

    async fn fetch_one(&self, table: &str, id: &str) -> AppResult<RawRecord> {
        let response = self.client.get(self.record_url(table, id)).send().await?;
        handle_response(response).await
    }

    async fn create(&self, table: &str, fields: Map<String, Value>) -> AppResult<RecordId> {
        let response = self
            .client
            .post(self.table_url(table))
            .json(&FieldsBody { fields: &fields })
            .send()
            .await?;
        let created: RawRecord = handle_response(response).await?;
        tracing::info!(table, record_id = %created.id, "created record");
        Ok(created.id)
    }

    async fn update(&self, table: &str, id: &str, fields: Map<String, Value>) -> AppResult<()> {
        let response = self
            .client
            .patch(self.record_url(table, id))
            .json(&FieldsBody { fields: &fields })
            .send()
            .await?;
        let _: RawRecord = handle_response(response).await?;
        tracing::info!(table, record_id = %id, "updated record");
        Ok(())
    }

    async fn delete(&self, table: &str, id: &str) -> AppResult<()> {
        let response = self.client.delete(self.record_url(table, id)).send().await?;
        let _: Value = handle_response(response).await?;
        tracing::info!(table, record_id = %id, "deleted record");
        Ok(())
    }
}

pub fn list_params(query: &ListQuery, offset: Option<&str>) -> Vec<(String, String)> {
    let mut params = Vec::new();
    if let Some(formula) = query.filter_by_formula.as_deref().filter(|value| !value.is_empty()) {
        params.push(("filterByFormula".to_string(), formula.to_string()));
    }
    if let Some(field) = query.sort_field.as_deref().filter(|value| !value.is_empty()) {
        params.push(("sort[0][field]".to_string(), field.to_string()));
        params.push((
            "sort[0][direction]".to_string(),
            query.sort_direction.as_str().to_string(),
        ));
    }
    if let Some(offset) = offset {
        params.push(("offset".to_string(), offset.to_string()));
    }
    params
}

pub async fn collect_pages<F, Fut>(mut fetch_page: F) -> AppResult<Vec<RawRecord>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = AppResult<RecordPage>>,
{
    let mut records = Vec::new();
    let mut offset: Option<String> = None;

    for _ in 0..MAX_PAGES {
        let page = fetch_page(offset.take()).await?;
        records.extend(page.records);
        match page.offset {
            Some(next) if !next.is_empty() => offset = Some(next),
            _ => return Ok(records),
        }
    }

    Err(AppError::Fetch(format!(
        "Listing did not finish after {} pages",
        MAX_PAGES
    )))
}

async fn handle_response<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> AppResult<T> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(AppError::NotFound(format!("{} returned 404", response.url().path())));
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Fetch(format!(
            "store responded {}: {}",
            status.as_u16(),
            redact(&body).content
        )));
    }

    Ok(response.json().await?)
}
