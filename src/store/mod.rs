pub mod airtable;
pub mod sqlite;

use crate::errors::AppResult;
use crate::models::{ListQuery, RawRecord, RecordId};
use serde_json::{Map, Value};
use std::future::Future;

pub use airtable::{AirtableConfig, AirtableStore};
pub use sqlite::SqliteStore;

/// Tabular record backend: rows are `{id, fields}` grouped by table name.
///
/// `fetch_all` returns rows in the store's own order; callers never re-sort it.
pub trait RecordStore: Send + Sync {
    fn fetch_all(
        &self,
        table: &str,
        query: &ListQuery,
    ) -> impl Future<Output = AppResult<Vec<RawRecord>>> + Send;

    fn fetch_one(&self, table: &str, id: &str) -> impl Future<Output = AppResult<RawRecord>> + Send;

    fn create(
        &self,
        table: &str,
        fields: Map<String, Value>,
    ) -> impl Future<Output = AppResult<RecordId>> + Send;

    fn update(
        &self,
        table: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> impl Future<Output = AppResult<()>> + Send;

    fn delete(&self, table: &str, id: &str) -> impl Future<Output = AppResult<()>> + Send;
}
