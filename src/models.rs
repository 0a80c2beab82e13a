use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type RecordId = String;

pub const UNKNOWN_MEMBER: &str = "Unknown Member";
pub const UNKNOWN_DEPARTMENT: &str = "Unknown Department";
pub const UNKNOWN_BATCH: &str = "Unknown Batch";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    pub id: RecordId,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
}

impl RawRecord {
    pub fn new(id: impl Into<RecordId>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
            created_time: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: RecordId,
    pub name: String,
    pub department: String,
    pub batch: String,
    pub position: String,
    pub active: bool,
    pub events_coordinated: u32,
    pub events_volunteered: u32,
    pub events_attended: u32,
    pub bonus_points: u32,
    pub points: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventMode {
    Online,
    Offline,
    Other(String),
}

impl EventMode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Online => "Online",
            Self::Offline => "Offline",
            Self::Other(value) => value.as_str(),
        }
    }
}

impl From<String> for EventMode {
    fn from(value: String) -> Self {
        match value.trim() {
            "Online" => Self::Online,
            "Offline" => Self::Offline,
            _ => Self::Other(value),
        }
    }
}

impl From<EventMode> for String {
    fn from(value: EventMode) -> Self {
        value.as_str().to_string()
    }
}

impl Default for EventMode {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: RecordId,
    pub name: String,
    pub venue: String,
    pub date: Option<NaiveDate>,
    pub mode: EventMode,
    pub r#type: String,
    pub description: String,
    pub image: Option<String>,
    pub coordinators: Vec<RecordId>,
    pub volunteers: Vec<RecordId>,
    pub attendees: Vec<RecordId>,
}

impl Event {
    pub fn references(&self, category: ReferenceCategory) -> &[RecordId] {
        match category {
            ReferenceCategory::Coordinators => &self.coordinators,
            ReferenceCategory::Volunteers => &self.volunteers,
            ReferenceCategory::Attendees => &self.attendees,
        }
    }

    /// Long-form date such as "March 5, 2024".
    pub fn display_date(&self) -> Option<String> {
        self.date.map(|date| date.format("%B %-d, %Y").to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceCategory {
    Coordinators,
    Volunteers,
    Attendees,
}

impl ReferenceCategory {
    pub const ALL: [ReferenceCategory; 3] = [
        ReferenceCategory::Coordinators,
        ReferenceCategory::Volunteers,
        ReferenceCategory::Attendees,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Coordinators => "coordinators",
            Self::Volunteers => "volunteers",
            Self::Attendees => "attendees",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedReference {
    pub name: String,
    pub department: String,
    pub batch: String,
}

impl ResolvedReference {
    pub fn unresolved() -> Self {
        Self {
            name: UNKNOWN_MEMBER.to_string(),
            department: UNKNOWN_DEPARTMENT.to_string(),
            batch: UNKNOWN_BATCH.to_string(),
        }
    }

    pub fn is_unresolved(&self) -> bool {
        self.name == UNKNOWN_MEMBER && self.department == UNKNOWN_DEPARTMENT && self.batch == UNKNOWN_BATCH
    }
}

impl From<&Member> for ResolvedReference {
    fn from(member: &Member) -> Self {
        Self {
            name: member.name.clone(),
            department: member.department.clone(),
            batch: member.batch.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    pub member: Member,
    pub rank: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationTotals {
    pub coordinated: u32,
    pub volunteered: u32,
    pub attended: u32,
    pub bonus: u32,
    pub total_events: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardSummary {
    pub member_count: usize,
    pub active_count: usize,
    pub top_points: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryView {
    pub category: ReferenceCategory,
    pub total: usize,
    pub expanded: bool,
    pub entries: Vec<ResolvedReference>,
    pub hidden: usize,
    pub toggle_label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub filter_by_formula: Option<String>,
    pub sort_field: Option<String>,
    #[serde(default)]
    pub sort_direction: SortDirection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooleanResponse {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::{Event, EventMode, ReferenceCategory, ResolvedReference};
    use chrono::NaiveDate;

    #[test]
    fn event_mode_keeps_unknown_values() {
        assert_eq!(EventMode::from("Online".to_string()), EventMode::Online);
        assert_eq!(
            EventMode::from("Hybrid".to_string()),
            EventMode::Other("Hybrid".to_string())
        );
        let encoded = serde_json::to_value(EventMode::Other("Hybrid".to_string())).expect("encode");
        assert_eq!(encoded, serde_json::json!("Hybrid"));
    }

    #[test]
    fn sentinel_reference_is_detected() {
        assert!(ResolvedReference::unresolved().is_unresolved());
    }

    #[test]
    fn formats_long_date_and_exposes_categories() {
        let event = Event {
            id: "e1".to_string(),
            name: "Hack Night".to_string(),
            venue: "Lab 2".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 5),
            mode: EventMode::Offline,
            r#type: "Workshop".to_string(),
            description: String::new(),
            image: None,
            coordinators: vec!["m1".to_string()],
            volunteers: vec![],
            attendees: vec!["m2".to_string(), "m3".to_string()],
        };
        assert_eq!(event.display_date().as_deref(), Some("March 5, 2024"));
        assert_eq!(event.references(ReferenceCategory::Attendees).len(), 2);
        assert_eq!(ReferenceCategory::Volunteers.as_str(), "volunteers");
    }
}
