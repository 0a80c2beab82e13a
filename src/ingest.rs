use crate::errors::{AppError, AppResult};
use crate::models::{Event, EventMode, Member, RawRecord, RecordId};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod member_fields {
    pub const NAME: &str = "name";
    pub const DEPARTMENT: &str = "department";
    pub const BATCH: &str = "Batch";
    pub const POSITION: &str = "Position";
    pub const ACTIVE: &str = "Active";
    pub const EVENTS_COORDINATED: &str = "Events_Coordinated";
    pub const EVENTS_VOLUNTEERED: &str = "Events_Volunteer";
    pub const EVENTS_ATTENDED: &str = "Events_Attended";
    pub const BONUS_POINTS: &str = "Bonus_points";
    pub const POINTS: &str = "Points";
    pub const PHONE_NUMBER: &str = "phone_number";
    pub const YEAR_JOINED: &str = "Year_Joined";
}

pub mod event_fields {
    pub const NAME: &str = "Name";
    pub const VENUE: &str = "Venue";
    pub const DATE: &str = "Date";
    pub const MODE: &str = "Mode";
    pub const TYPE: &str = "Type";
    pub const DESCRIPTION: &str = "Description";
    pub const IMAGE: &str = "Image";
    pub const COORDINATORS: &str = "Coordinators";
    pub const VOLUNTEERS: &str = "Volunteers";
    pub const ATTENDEES: &str = "Attendees";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRecord {
    pub id: RecordId,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport<T> {
    pub records: Vec<T>,
    pub skipped: Vec<SkippedRecord>,
}

impl<T> Default for IngestReport<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

pub fn ingest_members(table: &str, raw: &[RawRecord]) -> IngestReport<Member> {
    ingest_with(table, raw, member_from_record)
}

pub fn ingest_events(table: &str, raw: &[RawRecord]) -> IngestReport<Event> {
    ingest_with(table, raw, event_from_record)
}

fn ingest_with<T>(
    table: &str,
    raw: &[RawRecord],
    parse: impl Fn(&RawRecord) -> AppResult<T>,
) -> IngestReport<T> {
    let mut report = IngestReport::default();
    for record in raw {
        match parse(record) {
            Ok(parsed) => report.records.push(parsed),
            Err(error) => {
                tracing::warn!(table, record_id = %record.id, error = %error, "skipping malformed record");
                report.skipped.push(SkippedRecord {
                    id: record.id.clone(),
                    reason: error.to_string(),
                });
            }
        }
    }
    report
}

pub fn member_from_record(record: &RawRecord) -> AppResult<Member> {
    use member_fields as f;

    let id = require_id(record)?;
    let fields = &record.fields;
    let name = require_text(record, f::NAME)?;

    let bonus = signed_field(fields, f::BONUS_POINTS);
    if bonus < 0 {
        tracing::warn!(record_id = %id, bonus, "negative bonus points clamped to zero");
    }

    Ok(Member {
        id,
        name,
        department: text_field(fields, f::DEPARTMENT),
        batch: text_field(fields, f::BATCH),
        position: text_field(fields, f::POSITION),
        active: fields.get(f::ACTIVE).and_then(Value::as_bool).unwrap_or(false),
        events_coordinated: count_field(fields, f::EVENTS_COORDINATED),
        events_volunteered: count_field(fields, f::EVENTS_VOLUNTEERED),
        events_attended: count_field(fields, f::EVENTS_ATTENDED),
        bonus_points: clamp_count(bonus),
        points: signed_field(fields, f::POINTS),
    })
}

pub fn event_from_record(record: &RawRecord) -> AppResult<Event> {
    use event_fields as f;

    let id = require_id(record)?;
    let fields = &record.fields;
    let name = require_text(record, f::NAME)?;

    Ok(Event {
        id,
        name,
        venue: text_field(fields, f::VENUE),
        date: fields.get(f::DATE).and_then(Value::as_str).and_then(parse_date),
        mode: EventMode::from(text_field(fields, f::MODE)),
        r#type: text_field(fields, f::TYPE),
        description: text_field(fields, f::DESCRIPTION),
        image: fields.get(f::IMAGE).and_then(image_url),
        coordinators: id_list(fields, f::COORDINATORS),
        volunteers: id_list(fields, f::VOLUNTEERS),
        attendees: id_list(fields, f::ATTENDEES),
    })
}

fn require_id(record: &RawRecord) -> AppResult<RecordId> {
    let id = record.id.trim();
    if id.is_empty() {
        return Err(AppError::MalformedRecord("record has an empty id".to_string()));
    }
    Ok(id.to_string())
}

fn require_text(record: &RawRecord, key: &str) -> AppResult<String> {
    match record.fields.get(key) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(other) => Err(AppError::MalformedRecord(format!(
            "record {} has non-text '{}' field: {}",
            record.id, key, other
        ))),
        None => Err(AppError::MalformedRecord(format!(
            "record {} is missing '{}'",
            record.id, key
        ))),
    }
}

fn text_field(fields: &Map<String, Value>, key: &str) -> String {
    match fields.get(key) {
        Some(Value::String(value)) => value.clone(),
        Some(Value::Number(value)) => value.to_string(),
        Some(Value::Bool(value)) => value.to_string(),
        _ => String::new(),
    }
}

fn signed_field(fields: &Map<String, Value>, key: &str) -> i64 {
    match fields.get(key).and_then(coerce_integer) {
        Some((value, true)) => {
            tracing::warn!(field = key, value, "fractional value rounded to nearest integer");
            value
        }
        Some((value, false)) => value,
        None => 0,
    }
}

/// Integer reading of a number or numeric string, flagged when a fraction was rounded away.
fn coerce_integer(value: &Value) -> Option<(i64, bool)> {
    let raw = match value {
        Value::Number(number) => match number.as_i64() {
            Some(exact) => return Some((exact, false)),
            None => number.as_f64()?,
        },
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    let rounded = raw.round();
    Some((rounded as i64, rounded != raw))
}

fn count_field(fields: &Map<String, Value>, key: &str) -> u32 {
    clamp_count(signed_field(fields, key))
}

fn clamp_count(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(trimmed).ok().map(|value| value.date_naive()))
}

fn image_url(value: &Value) -> Option<String> {
    match value {
        Value::String(url) if !url.is_empty() => Some(url.clone()),
        Value::Array(attachments) => attachments
            .first()
            .and_then(|attachment| attachment.get("url"))
            .and_then(Value::as_str)
            .map(ToString::to_string),
        _ => None,
    }
}

fn id_list(fields: &Map<String, Value>, key: &str) -> Vec<RecordId> {
    fields
        .get(key)
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}
