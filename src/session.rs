use crate::config::AppSettings;
use crate::directory::DirectoryIndex;
use crate::disclosure::DisclosureState;
use crate::errors::AppResult;
use crate::ingest::{ingest_events, ingest_members, SkippedRecord};
use crate::models::{
    CategoryView, Event, LeaderboardSummary, ListQuery, Member, ParticipationTotals, RankedEntry, RawRecord,
    ReferenceCategory, ResolvedReference,
};
use crate::redaction::redact_error;
use crate::store::RecordStore;
use crate::{ranking, resolver, search};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "status", content = "error")]
pub enum SourceState {
    #[default]
    Pending,
    Loaded,
    Failed(String),
}

impl SourceState {
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadState {
    pub members: SourceState,
    pub events: SourceState,
}

impl LoadState {
    pub fn is_ready(&self) -> bool {
        self.members.is_settled() && self.events.is_settled()
    }

    pub fn has_failure(&self) -> bool {
        matches!(self.members, SourceState::Failed(_)) || matches!(self.events, SourceState::Failed(_))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    pub rank: usize,
    pub member: Member,
    pub participation: ParticipationTotals,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCard {
    pub event: Event,
    pub display_date: Option<String>,
    pub categories: Vec<CategoryView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub query: String,
    pub load_state: LoadState,
    pub summary: LeaderboardSummary,
    pub leaderboard: Vec<LeaderboardRow>,
    pub events: Vec<EventCard>,
    pub skipped: Vec<SkippedRecord>,
}

/// Each arrival swaps in new `Arc`s for its sequence and anything derived from it;
/// nothing is patched in place.
#[derive(Debug, Clone)]
pub struct ViewSession {
    members_table: String,
    events_table: String,
    members: Arc<Vec<Member>>,
    events: Arc<Vec<Event>>,
    index: Arc<DirectoryIndex>,
    skipped_members: Vec<SkippedRecord>,
    skipped_events: Vec<SkippedRecord>,
    disclosure: DisclosureState,
    state: LoadState,
}

impl ViewSession {
    pub fn new(members_table: impl Into<String>, events_table: impl Into<String>) -> Self {
        Self {
            members_table: members_table.into(),
            events_table: events_table.into(),
            members: Arc::new(Vec::new()),
            events: Arc::new(Vec::new()),
            index: Arc::new(DirectoryIndex::default()),
            skipped_members: Vec::new(),
            skipped_events: Vec::new(),
            disclosure: DisclosureState::new(),
            state: LoadState::default(),
        }
    }

    pub fn for_settings(settings: &AppSettings) -> Self {
        Self::new(settings.members_table.clone(), settings.events_table.clone())
    }

    pub async fn load<S: RecordStore>(store: &S, settings: &AppSettings) -> Self {
        let mut session = Self::for_settings(settings);
        session.refresh(store, &settings.list_query()).await;
        session
    }

    pub async fn refresh<S: RecordStore>(&mut self, store: &S, query: &ListQuery) {
        let (members, events) = tokio::join!(
            store.fetch_all(&self.members_table, query),
            store.fetch_all(&self.events_table, query)
        );
        self.apply_members(members);
        self.apply_events(events);
    }

    pub fn apply_members(&mut self, fetched: AppResult<Vec<RawRecord>>) {
        match fetched {
            Ok(raw) => {
                let report = ingest_members(&self.members_table, &raw);
                tracing::info!(
                    table = %self.members_table,
                    loaded = report.records.len(),
                    skipped = report.skipped.len(),
                    "members loaded"
                );
                self.index = Arc::new(DirectoryIndex::build(&report.records));
                self.members = Arc::new(report.records);
                self.skipped_members = report.skipped;
                self.state.members = SourceState::Loaded;
            }
            Err(error) => {
                let message = redact_error(&error);
                tracing::warn!(table = %self.members_table, error = %message, "member fetch failed");
                self.index = Arc::new(DirectoryIndex::default());
                self.members = Arc::new(Vec::new());
                self.skipped_members.clear();
                self.state.members = SourceState::Failed(message);
            }
        }
    }

    pub fn apply_events(&mut self, fetched: AppResult<Vec<RawRecord>>) {
        match fetched {
            Ok(raw) => {
                let report = ingest_events(&self.events_table, &raw);
                tracing::info!(
                    table = %self.events_table,
                    loaded = report.records.len(),
                    skipped = report.skipped.len(),
                    "events loaded"
                );
                self.events = Arc::new(report.records);
                self.skipped_events = report.skipped;
                self.state.events = SourceState::Loaded;
            }
            Err(error) => {
                let message = redact_error(&error);
                tracing::warn!(table = %self.events_table, error = %message, "event fetch failed");
                self.events = Arc::new(Vec::new());
                self.skipped_events.clear();
                self.state.events = SourceState::Failed(message);
            }
        }
    }

    pub fn load_state(&self) -> &LoadState {
        &self.state
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn directory(&self) -> Arc<DirectoryIndex> {
        Arc::clone(&self.index)
    }

    pub fn event(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|event| event.id == id)
    }

    pub fn ranked_members(&self, query: &str) -> Vec<RankedEntry> {
        ranking::filter_then_rank(&self.members, query)
    }

    pub fn filtered_events(&self, query: &str) -> Vec<&Event> {
        search::filter(&self.events, query)
    }

    /// Empty until both sources have settled, so references are never resolved
    /// against a directory that is still loading.
    pub fn resolved_category(
        &self,
        event: &Event,
        category: ReferenceCategory,
        disclosure: &DisclosureState,
    ) -> Vec<ResolvedReference> {
        if !self.state.is_ready() {
            tracing::debug!(event_id = %event.id, "resolution deferred until both sources load");
            return Vec::new();
        }
        let expanded = disclosure.is_expanded(category, &event.id);
        resolver::resolve_preview(event.references(category), &self.index, expanded)
    }

    pub fn category_view(&self, event: &Event, category: ReferenceCategory) -> CategoryView {
        let expanded = self.disclosure.is_expanded(category, &event.id);
        if !self.state.is_ready() {
            return CategoryView {
                category,
                total: event.references(category).len(),
                expanded,
                entries: Vec::new(),
                hidden: event.references(category).len(),
                toggle_label: None,
            };
        }
        resolver::category_view(event, category, &self.index, expanded)
    }

    pub fn disclosure(&self) -> &DisclosureState {
        &self.disclosure
    }

    pub fn toggle_disclosure(&mut self, category: ReferenceCategory, entity_id: &str) -> DisclosureState {
        let expanded = self.disclosure.toggle(category, entity_id);
        tracing::debug!(category = category.as_str(), entity_id, expanded, "disclosure toggled");
        self.disclosure.clone()
    }

    pub fn teardown(&mut self) {
        self.disclosure.reset();
    }

    pub fn skipped(&self) -> Vec<SkippedRecord> {
        self.skipped_members
            .iter()
            .chain(self.skipped_events.iter())
            .cloned()
            .collect()
    }

    pub fn snapshot(&self, query: &str) -> BoardSnapshot {
        let leaderboard = self
            .ranked_members(query)
            .into_iter()
            .map(|entry| LeaderboardRow {
                rank: entry.rank,
                participation: ranking::participation(&entry.member),
                member: entry.member,
            })
            .collect();

        let events = self
            .filtered_events(query)
            .into_iter()
            .map(|event| EventCard {
                display_date: event.display_date(),
                categories: ReferenceCategory::ALL
                    .into_iter()
                    .map(|category| self.category_view(event, category))
                    .collect(),
                event: event.clone(),
            })
            .collect();

        BoardSnapshot {
            query: query.to_string(),
            load_state: self.state.clone(),
            summary: ranking::summarize(&self.members),
            leaderboard,
            events,
            skipped: self.skipped(),
        }
    }
}
