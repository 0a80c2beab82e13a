use connect_board_lib::config::{AppSettings, StoreBackend};
use connect_board_lib::disclosure::DisclosureState;
use connect_board_lib::member_writes::{create_member, MemberDraft};
use connect_board_lib::models::{RawRecord, ReferenceCategory, UNKNOWN_MEMBER};
use connect_board_lib::session::{SourceState, ViewSession};
use connect_board_lib::store::SqliteStore;
use serde_json::json;

fn record(id: &str, fields: serde_json::Value) -> RawRecord {
    RawRecord::new(id, fields.as_object().cloned().unwrap_or_default())
}

fn settings(path: std::path::PathBuf) -> AppSettings {
    AppSettings {
        store: StoreBackend::Sqlite,
        sqlite_path: Some(path),
        sort_field: None,
        ..AppSettings::default()
    }
}

fn seeded_store(path: &std::path::Path) -> SqliteStore {
    let store = SqliteStore::open(path).expect("open store");
    store
        .import(
            "members",
            &[
                record("m1", json!({ "name": "Alice", "department": "CSE", "Batch": "2022", "Points": 10, "Active": true })),
                record("m2", json!({ "name": "Bob", "department": "ECE", "Batch": "2023", "Points": 20 })),
                record("m3", json!({ "name": "Carol", "department": "ME", "Batch": "2021", "Points": 20, "Active": true })),
                record("broken", json!({ "department": "nameless" })),
            ],
        )
        .expect("import members");
    store
        .import(
            "Events",
            &[
                record(
                    "e1",
                    json!({
                        "Name": "Orientation",
                        "Date": "2024-03-09",
                        "Mode": "Offline",
                        "Coordinators": ["m1", "mX"],
                        "Attendees": ["m1", "m2", "m3", "m1", "m2"]
                    }),
                ),
                record("e2", json!({ "Name": "Workshop", "Coordinators": ["m3"] })),
            ],
        )
        .expect("import events");
    store
}

#[tokio::test]
async fn loads_board_from_sqlite_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("board.db");
    let store = seeded_store(&path);
    let settings = settings(path);

    let session = ViewSession::load(&store, &settings).await;
    assert!(session.load_state().is_ready());
    assert_eq!(session.load_state().members, SourceState::Loaded);
    assert_eq!(session.skipped().len(), 1);

    let ranked: Vec<(String, usize)> = session
        .ranked_members("")
        .into_iter()
        .map(|entry| (entry.member.id, entry.rank))
        .collect();
    assert_eq!(
        ranked,
        vec![("m2".to_string(), 1), ("m3".to_string(), 2), ("m1".to_string(), 3)]
    );

    let e1 = session.event("e1").cloned().expect("e1");
    let coordinators = session.resolved_category(&e1, ReferenceCategory::Coordinators, session.disclosure());
    assert_eq!(coordinators[0].name, "Alice");
    assert_eq!(coordinators[0].department, "CSE");
    assert_eq!(coordinators[1].name, UNKNOWN_MEMBER);
    assert!(coordinators[1].is_unresolved());
}

#[tokio::test]
async fn disclosure_expands_only_the_toggled_pair() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("board.db");
    let store = seeded_store(&path);
    let mut session = ViewSession::load(&store, &settings(path)).await;
    let e1 = session.event("e1").cloned().expect("e1");
    let e2 = session.event("e2").cloned().expect("e2");

    let collapsed = session.category_view(&e1, ReferenceCategory::Attendees);
    assert_eq!(collapsed.entries.len(), 2);
    assert_eq!(collapsed.hidden, 3);
    assert_eq!(collapsed.toggle_label.as_deref(), Some("Show all 5 attendees"));

    let state = session.toggle_disclosure(ReferenceCategory::Attendees, "e1");
    assert_eq!(session.resolved_category(&e1, ReferenceCategory::Attendees, &state).len(), 5);
    assert_eq!(
        session.category_view(&e1, ReferenceCategory::Attendees).toggle_label.as_deref(),
        Some("Show less")
    );
    assert!(!state.is_expanded(ReferenceCategory::Coordinators, "e1"));
    assert!(!state.is_expanded(ReferenceCategory::Attendees, "e2"));
    assert!(session
        .resolved_category(&e2, ReferenceCategory::Attendees, &state)
        .is_empty());

    let restored = session.toggle_disclosure(ReferenceCategory::Attendees, "e1");
    assert_eq!(restored, DisclosureState::new());
}

#[tokio::test]
async fn search_filters_before_ranking_and_keeps_event_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("board.db");
    let store = seeded_store(&path);
    let session = ViewSession::load(&store, &settings(path)).await;

    let ranked = session.ranked_members("AL");
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].member.name, "Alice");
    assert_eq!(ranked[0].rank, 1);

    let names: Vec<&str> = session
        .filtered_events("o")
        .into_iter()
        .map(|event| event.name.as_str())
        .collect();
    assert_eq!(names, vec!["Orientation", "Workshop"]);

    let snapshot = session.snapshot("work");
    assert_eq!(snapshot.events.len(), 1);
    assert_eq!(snapshot.events[0].display_date, None);
    let full = session.snapshot("");
    assert_eq!(full.events[0].display_date.as_deref(), Some("March 9, 2024"));
    assert_eq!(full.summary.active_count, 2);
}

#[tokio::test]
async fn created_member_appears_on_next_load() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("board.db");
    let store = seeded_store(&path);
    let settings = settings(path);

    let draft = MemberDraft {
        name: "Dave".to_string(),
        department: "CIVIL".to_string(),
        phone_number: "9123456780".to_string(),
        year_joined: "2024".to_string(),
        position: "Member".to_string(),
        active: true,
        bonus_points: 3,
    };
    create_member(&store, "members", &draft).await.expect("create");

    let session = ViewSession::load(&store, &settings).await;
    let ranked = session.ranked_members("dave");
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].member.bonus_points, 3);
    assert_eq!(session.ranked_members("").last().map(|entry| entry.rank), Some(4));
}

#[tokio::test]
async fn failing_source_is_flagged_not_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("board.db");
    let store = seeded_store(&path);
    let mut settings = settings(path);
    settings.sort_field = Some("Points".to_string());

    let mut session = ViewSession::for_settings(&settings);
    let query = connect_board_lib::models::ListQuery {
        filter_by_formula: Some("{Active}".to_string()),
        ..settings.list_query()
    };
    session.refresh(&store, &query).await;

    assert!(session.load_state().is_ready());
    assert!(matches!(session.load_state().members, SourceState::Failed(_)));
    assert!(matches!(session.load_state().events, SourceState::Failed(_)));
    assert!(session.members().is_empty());
    assert!(session.snapshot("").leaderboard.is_empty());
}
