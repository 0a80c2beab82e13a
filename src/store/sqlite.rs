use crate::errors::{AppError, AppResult};
use crate::models::{ListQuery, RawRecord, RecordId, SortDirection};
use crate::store::RecordStore;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Local record store kept in a single SQLite file, one row per record.
///
/// Listing order is insertion order unless a sort field is requested.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| AppError::Io(err.to_string()))?;
            }
        }
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> AppResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> AppResult<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Internal("record store mutex poisoned".to_string()))
    }

    pub fn import(&self, table: &str, records: &[RawRecord]) -> AppResult<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for record in records {
            let created_at = record.created_time.unwrap_or_else(Utc::now).to_rfc3339();
            tx.execute(
                "INSERT INTO records (table_name, id, fields_json, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)
                 ON CONFLICT(table_name, id) DO UPDATE SET fields_json = excluded.fields_json, updated_at = excluded.updated_at",
                params![table, record.id, serde_json::to_string(&record.fields)?, created_at],
            )?;
        }
        tx.commit()?;
        Ok(records.len())
    }

    pub fn list(&self, table: &str, query: &ListQuery) -> AppResult<Vec<RawRecord>> {
        if query.filter_by_formula.as_deref().is_some_and(|formula| !formula.is_empty()) {
            return Err(AppError::Validation(
                "filterByFormula is not supported by the sqlite store".to_string(),
            ));
        }

        let conn = self.lock()?;
        let mut statement = conn.prepare(
            "SELECT id, fields_json, created_at FROM records WHERE table_name = ?1 ORDER BY seq ASC",
        )?;
        let rows = statement.query_map([table], parse_record_row)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }

        if let Some(field) = query.sort_field.as_deref() {
            records.sort_by(|a, b| {
                let ordering = compare_field_values(a.fields.get(field), b.fields.get(field));
                match query.sort_direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }
        Ok(records)
    }

    pub fn get(&self, table: &str, id: &str) -> AppResult<RawRecord> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, fields_json, created_at FROM records WHERE table_name = ?1 AND id = ?2",
            params![table, id],
            parse_record_row,
        )
        .optional()?
        .ok_or_else(|| AppError::NotFound(format!("Record {} not found in {}", id, table)))
    }

    pub fn insert(&self, table: &str, fields: &Map<String, Value>) -> AppResult<RecordId> {
        let id = format!("rec{}", Uuid::new_v4().simple());
        let now = Utc::now().to_rfc3339();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO records (table_name, id, fields_json, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
            params![table, id, serde_json::to_string(fields)?, now],
        )?;
        Ok(id)
    }

    pub fn patch(&self, table: &str, id: &str, fields: &Map<String, Value>) -> AppResult<()> {
        let mut current = self.get(table, id)?.fields;
        for (key, value) in fields {
            current.insert(key.clone(), value.clone());
        }
        let conn = self.lock()?;
        conn.execute(
            "UPDATE records SET fields_json = ?1, updated_at = ?2 WHERE table_name = ?3 AND id = ?4",
            params![serde_json::to_string(&current)?, Utc::now().to_rfc3339(), table, id],
        )?;
        Ok(())
    }

    pub fn remove(&self, table: &str, id: &str) -> AppResult<()> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM records WHERE table_name = ?1 AND id = ?2",
            params![table, id],
        )?;
        if deleted == 0 {
            return Err(AppError::NotFound(format!("Record {} not found in {}", id, table)));
        }
        Ok(())
    }
}

impl RecordStore for SqliteStore {
    async fn fetch_all(&self, table: &str, query: &ListQuery) -> AppResult<Vec<RawRecord>> {
        self.list(table, query)
    }

    async fn fetch_one(&self, table: &str, id: &str) -> AppResult<RawRecord> {
        self.get(table, id)
    }

    async fn create(&self, table: &str, fields: Map<String, Value>) -> AppResult<RecordId> {
        self.insert(table, &fields)
    }

    async fn update(&self, table: &str, id: &str, fields: Map<String, Value>) -> AppResult<()> {
        self.patch(table, id, &fields)
    }

    async fn delete(&self, table: &str, id: &str) -> AppResult<()> {
        self.remove(table, id)
    }
}

fn parse_record_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRecord> {
    let id: String = row.get(0)?;
    let fields_json: String = row.get(1)?;
    let created_at: String = row.get(2)?;
    let fields = serde_json::from_str(&fields_json)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(error)))?;
    Ok(RawRecord {
        id,
        fields,
        created_time: DateTime::parse_from_rfc3339(&created_at)
            .ok()
            .map(|value| value.with_timezone(&Utc)),
    })
}

/// Total order over field values: missing/null, then bools, numbers, strings, anything else.
fn compare_field_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.total_cmp(&y)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_) | Value::Object(_)) => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteStore;
    use crate::errors::AppError;
    use crate::models::{ListQuery, RawRecord, SortDirection};
    use crate::store::RecordStore;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn lists_in_insertion_order_per_table() {
        let store = SqliteStore::open_in_memory().expect("store");
        store
            .import(
                "members",
                &[
                    RawRecord::new("m2", fields(json!({ "name": "Bob" }))),
                    RawRecord::new("m1", fields(json!({ "name": "Alice" }))),
                ],
            )
            .expect("import");
        store
            .import("Events", &[RawRecord::new("e1", fields(json!({ "Name": "Demo" })))])
            .expect("import");

        let members = store.list("members", &ListQuery::default()).expect("list");
        let ids: Vec<&str> = members.iter().map(|record| record.id.as_str()).collect();
        assert_eq!(ids, vec!["m2", "m1"]);
        assert!(members[0].created_time.is_some());
    }

    #[test]
    fn sorts_by_requested_field_keeping_ties_stable() {
        let store = SqliteStore::open_in_memory().expect("store");
        store
            .import(
                "members",
                &[
                    RawRecord::new("a", fields(json!({ "Points": 5 }))),
                    RawRecord::new("b", fields(json!({ "Points": 9 }))),
                    RawRecord::new("c", fields(json!({ "Points": 5 }))),
                    RawRecord::new("d", fields(json!({}))),
                ],
            )
            .expect("import");

        let query = ListQuery {
            filter_by_formula: None,
            sort_field: Some("Points".to_string()),
            sort_direction: SortDirection::Desc,
        };
        let ids: Vec<String> = store
            .list("members", &query)
            .expect("list")
            .into_iter()
            .map(|record| record.id)
            .collect();
        assert_eq!(ids, vec!["b", "a", "c", "d"]);

        let formula = ListQuery {
            filter_by_formula: Some("{Active}".to_string()),
            ..ListQuery::default()
        };
        assert!(matches!(store.list("members", &formula), Err(AppError::Validation(_))));
    }

    #[test]
    fn mixed_type_sort_groups_by_type_then_value() {
        let store = SqliteStore::open_in_memory().expect("store");
        let records: Vec<RawRecord> = (0..60)
            .map(|i| {
                let points = match i % 4 {
                    0 => json!(i),
                    1 => json!(format!("n{}", i)),
                    2 => json!(i % 3 == 0),
                    _ => serde_json::Value::Null,
                };
                RawRecord::new(format!("r{}", i), fields(json!({ "Points": points })))
            })
            .collect();
        store.import("members", &records).expect("import");

        let query = ListQuery {
            filter_by_formula: None,
            sort_field: Some("Points".to_string()),
            sort_direction: SortDirection::Desc,
        };
        let listed = store.list("members", &query).expect("list");
        assert_eq!(listed.len(), 60);

        let numbers: Vec<i64> = listed
            .iter()
            .filter_map(|record| record.fields.get("Points").and_then(serde_json::Value::as_i64))
            .collect();
        assert_eq!(numbers.len(), 15);
        assert!(numbers.windows(2).all(|pair| pair[0] >= pair[1]));

        let kinds: Vec<u8> = listed
            .iter()
            .map(|record| match record.fields.get("Points") {
                Some(serde_json::Value::String(_)) => 3,
                Some(serde_json::Value::Number(_)) => 2,
                Some(serde_json::Value::Bool(_)) => 1,
                _ => 0,
            })
            .collect();
        assert!(kinds.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn corrupt_stored_fields_surface_as_error() {
        let store = SqliteStore::open_in_memory().expect("store");
        store
            .import("members", &[RawRecord::new("m1", fields(json!({ "name": "Alice" })))])
            .expect("import");
        store
            .lock()
            .expect("lock")
            .execute("UPDATE records SET fields_json = '{not json' WHERE id = 'm1'", [])
            .expect("corrupt row");

        assert!(store.list("members", &ListQuery::default()).is_err());
        assert!(store.get("members", "m1").is_err());
    }

    #[tokio::test]
    async fn crud_round_trip_through_trait() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SqliteStore::open(&dir.path().join("nested").join("records.db")).expect("store");

        let id = store
            .create("members", fields(json!({ "name": "Alice", "Bonus_points": 1 })))
            .await
            .expect("create");
        assert!(id.starts_with("rec"));

        store
            .update("members", &id, fields(json!({ "Bonus_points": 4 })))
            .await
            .expect("update");
        let fetched = store.fetch_one("members", &id).await.expect("fetch one");
        assert_eq!(fetched.fields.get("name"), Some(&json!("Alice")));
        assert_eq!(fetched.fields.get("Bonus_points"), Some(&json!(4)));

        store.delete("members", &id).await.expect("delete");
        assert!(matches!(
            store.fetch_one("members", &id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(store.delete("members", &id).await, Err(AppError::NotFound(_))));
        assert!(store
            .fetch_all("members", &ListQuery::default())
            .await
            .expect("fetch all")
            .is_empty());
    }
}
