use crate::errors::{AppError, AppResult};
use crate::ingest::member_fields as f;
use crate::models::{RawRecord, RecordId};
use crate::store::RecordStore;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDraft {
    pub name: String,
    pub department: String,
    pub phone_number: String,
    pub year_joined: String,
    pub position: String,
    pub active: bool,
    pub bonus_points: i64,
}

impl Default for MemberDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            department: String::new(),
            phone_number: String::new(),
            year_joined: String::new(),
            position: String::new(),
            active: true,
            bonus_points: 0,
        }
    }
}

impl MemberDraft {
    pub fn from_record(record: &RawRecord) -> Self {
        let text = |key: &str| {
            record
                .fields
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            name: text(f::NAME),
            department: text(f::DEPARTMENT),
            phone_number: text(f::PHONE_NUMBER),
            year_joined: text(f::YEAR_JOINED),
            position: text(f::POSITION),
            active: record.fields.get(f::ACTIVE).and_then(Value::as_bool).unwrap_or(true),
            bonus_points: record
                .fields
                .get(f::BONUS_POINTS)
                .and_then(Value::as_i64)
                .unwrap_or(0),
        }
    }

    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert(f::NAME.to_string(), json!(self.name.trim()));
        fields.insert(f::DEPARTMENT.to_string(), json!(self.department.trim()));
        fields.insert(f::PHONE_NUMBER.to_string(), json!(self.phone_number.trim()));
        fields.insert(f::YEAR_JOINED.to_string(), json!(self.year_joined.trim()));
        fields.insert(f::POSITION.to_string(), json!(self.position.trim()));
        fields.insert(f::ACTIVE.to_string(), json!(self.active));
        fields.insert(f::BONUS_POINTS.to_string(), json!(self.bonus_points));
        fields
    }

    pub fn validate(&self) -> AppResult<Map<String, Value>> {
        let fields = self.to_fields();
        let errors = validate_member_fields(&Value::Object(fields.clone()))?;
        if errors.is_empty() {
            Ok(fields)
        } else {
            Err(AppError::Validation(errors.join("; ")))
        }
    }
}

fn member_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            (f::NAME): { "type": "string", "minLength": 1 },
            (f::DEPARTMENT): { "type": "string", "minLength": 1 },
            (f::PHONE_NUMBER): { "type": "string", "pattern": "^[0-9]{10}$" },
            (f::YEAR_JOINED): { "type": "string", "pattern": "^[0-9]{4}$" },
            (f::POSITION): { "type": "string", "minLength": 1 },
            (f::ACTIVE): { "type": "boolean" },
            (f::BONUS_POINTS): { "type": "integer", "minimum": 0 }
        },
        "required": [f::NAME, f::DEPARTMENT, f::PHONE_NUMBER, f::YEAR_JOINED, f::POSITION]
    })
}

fn validate_member_fields(value: &Value) -> AppResult<Vec<String>> {
    let schema = member_schema();
    let compiled = jsonschema::JSONSchema::compile(&schema)
        .map_err(|error| AppError::Internal(format!("Invalid member schema: {}", error)))?;

    let errors = compiled
        .validate(value)
        .err()
        .map(|errors| {
            errors
                .map(|error| {
                    let path = error.instance_path.to_string();
                    if path.is_empty() {
                        error.to_string()
                    } else {
                        format!("{}: {}", path, error)
                    }
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    Ok(errors)
}

pub async fn create_member<S: RecordStore>(store: &S, table: &str, draft: &MemberDraft) -> AppResult<RecordId> {
    let fields = draft.validate()?;
    store.create(table, fields).await
}

pub async fn update_member<S: RecordStore>(
    store: &S,
    table: &str,
    id: &str,
    draft: &MemberDraft,
) -> AppResult<()> {
    let fields = draft.validate()?;
    store.update(table, id, fields).await
}

pub async fn load_member_draft<S: RecordStore>(store: &S, table: &str, id: &str) -> AppResult<MemberDraft> {
    let record = store.fetch_one(table, id).await?;
    Ok(MemberDraft::from_record(&record))
}
