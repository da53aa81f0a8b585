use serde_json::{json, Value};
use taskline_core::db::open_db;
use taskline_core::{
    schedule_depth, Activity, ActivityDraft, ActivityRepository, ActivityStore, FaultKind,
    ListKey, MemorySlotStore, Schedule, ScheduleTree, SlotStore, SqliteSlotStore, StoreError,
};

const SLOT: &str = "activities";

fn activity(id: &str, schedule: Option<Schedule>) -> Activity {
    let draft = ActivityDraft {
        schedule,
        ..ActivityDraft::new(1000)
            .named(format!("task {id}"))
            .checked_off(false)
    };
    Activity::from_draft(id.to_string(), draft)
}

fn sample_tree() -> ScheduleTree {
    let mut tree = ScheduleTree::new();
    tree.insert(activity("root", None));
    tree.insert(activity("year", Some(Schedule::in_year(2024))));
    tree.insert(activity("month", Some(Schedule::in_month(2024, 3))));
    tree.insert(activity("day", Some(Schedule::on_day(2024, 3, 5))));
    tree.insert(activity("timed", Some(Schedule::at_time(2024, 3, 5, 9, 30))));
    tree.insert(activity("other-year", Some(Schedule::on_day(2025, 12, 31))));
    tree
}

fn load_raw(payload: &str) -> Result<ScheduleTree, StoreError> {
    let slots = MemorySlotStore::with_slot(SLOT, payload);
    ActivityStore::new(&slots, SLOT).load()
}

#[test]
fn save_then_load_returns_equal_tree() {
    let slots = MemorySlotStore::new();
    let store = ActivityStore::new(&slots, SLOT);
    let tree = sample_tree();

    store.save(&tree).unwrap();

    assert_eq!(store.load().unwrap(), tree);
}

#[test]
fn absent_slot_loads_as_empty_tree() {
    let slots = MemorySlotStore::new();
    let store = ActivityStore::new(&slots, SLOT);

    assert!(store.load().unwrap().is_empty());
}

#[test]
fn saved_payload_uses_nested_string_keys() {
    let slots = MemorySlotStore::new();
    let store = ActivityStore::new(&slots, SLOT);
    let mut tree = ScheduleTree::new();
    tree.insert(activity("day", Some(Schedule::on_day(2024, 3, 5))));
    tree.insert(activity("year", Some(Schedule::in_year(2024))));

    store.save(&tree).unwrap();

    let saved: Value = serde_json::from_str(&slots.raw(SLOT).unwrap()).unwrap();
    assert_eq!(
        saved,
        json!({
            "2024": {
                "loose": [{
                    "id": "year",
                    "creation": 1000,
                    "name": "task year",
                    "checked_off": false,
                    "schedule": { "year": 2024 }
                }],
                "3": {
                    "5": [{
                        "id": "day",
                        "creation": 1000,
                        "name": "task day",
                        "checked_off": false,
                        "schedule": { "year": 2024, "month": 3, "day": 5 }
                    }]
                }
            }
        })
    );
}

#[test]
fn clear_writes_empty_object() {
    let slots = MemorySlotStore::new();
    let store = ActivityStore::new(&slots, SLOT);
    store.save(&sample_tree()).unwrap();

    store.clear().unwrap();

    assert_eq!(slots.raw(SLOT).as_deref(), Some("{}"));
    assert!(store.load().unwrap().is_empty());
}

#[test]
fn json_array_is_corrupt_not_empty() {
    let err = load_raw("[]").unwrap_err();

    assert!(matches!(err, StoreError::Corrupt { .. }));
    assert_eq!(err.kind(), FaultKind::CorruptPersistedData);
}

#[test]
fn invalid_json_is_unparsable() {
    let err = load_raw("{\"2024\": ").unwrap_err();

    assert!(matches!(err, StoreError::Unparsable { .. }));
    assert_eq!(err.kind(), FaultKind::UnparsablePersistedData);
}

#[test]
fn wrong_node_kind_is_structural_violation() {
    let day_as_object = json!({ "2024": { "3": { "5": { "id": "x" } } } });
    let year_as_list = json!({ "2024": [] });

    for payload in [day_as_object, year_as_list] {
        let err = load_raw(&payload.to_string()).unwrap_err();
        assert_eq!(err.kind(), FaultKind::StructuralInvariantViolation);
    }
}

#[test]
fn non_numeric_branch_key_is_corrupt() {
    let err = load_raw(r#"{ "march": {} }"#).unwrap_err();

    assert_eq!(err.kind(), FaultKind::CorruptPersistedData);
}

#[test]
fn misplaced_activity_is_corrupt() {
    let payload = json!({
        "2024": {
            "loose": [{ "id": "a", "creation": 1, "schedule": { "year": 2025 } }]
        }
    });

    let err = load_raw(&payload.to_string()).unwrap_err();

    assert_eq!(err.kind(), FaultKind::CorruptPersistedData);
    assert!(err.to_string().contains("2025/loose"));
}

#[test]
fn duplicate_ids_are_corrupt() {
    let payload = json!({
        "loose": [
            { "id": "a", "creation": 1 },
            { "id": "a", "creation": 2 }
        ]
    });

    let err = load_raw(&payload.to_string()).unwrap_err();

    assert_eq!(err.kind(), FaultKind::CorruptPersistedData);
}

#[test]
fn activity_without_id_is_corrupt() {
    let payload = json!({ "loose": [{ "creation": 1 }] });

    let err = load_raw(&payload.to_string()).unwrap_err();

    assert_eq!(err.kind(), FaultKind::CorruptPersistedData);
}

#[test]
fn empty_branches_are_dropped_on_load() {
    let payload = json!({ "2024": { "3": { "5": [] }, "loose": [] } });

    let tree = load_raw(&payload.to_string()).unwrap();

    assert!(tree.is_empty());
}

#[test]
fn lenient_schedule_fields_load_as_absent() {
    let payload = json!({
        "loose": [{
            "id": "a",
            "creation": 1,
            "schedule": { "year": "2024", "month": 3 }
        }]
    });

    let tree = load_raw(&payload.to_string()).unwrap();

    let loaded = tree.flatten()[0];
    let schedule = loaded.schedule.as_ref().unwrap();
    assert_eq!(schedule.year, None);
    assert_eq!(schedule.month, Some(3));
    assert_eq!(schedule_depth(Some(schedule)), 0);
}

#[test]
fn uninterpreted_fields_survive_load_and_save_byte_for_byte() {
    let payload = concat!(
        r#"{"loose":["#,
        r#"{"id":"a","creation":1,"schedule":{"month":3,"year":"x"},"group":"work"},"#,
        r#"{"id":"b","creation":2,"schedule":"tomorrow","tags":["home"]}"#,
        r#"]}"#
    );
    let slots = MemorySlotStore::with_slot(SLOT, payload);
    let store = ActivityStore::new(&slots, SLOT);

    let tree = store.load().unwrap();
    store.save(&tree).unwrap();

    assert_eq!(slots.raw(SLOT).as_deref(), Some(payload));
    let unscheduled = tree.find(ListKey::ROOT, "b").unwrap();
    assert_eq!(unscheduled.schedule, None);
    assert_eq!(unscheduled.extra.get("tags"), Some(&json!(["home"])));
}

#[test]
fn repository_writes_keep_uninterpreted_fields_of_other_activities() {
    let stored = json!({
        "id": "a",
        "creation": 1,
        "group": "work",
        "schedule": { "year": "x", "month": 3 }
    });
    let payload = json!({ "loose": [stored.clone()] });
    let slots = MemorySlotStore::with_slot(SLOT, payload.to_string());
    let mut repo = ActivityRepository::open(&slots, SLOT).unwrap();

    repo.create_activity(ActivityDraft::new(2)).unwrap();

    let saved: Value = serde_json::from_str(&slots.raw(SLOT).unwrap()).unwrap();
    assert_eq!(saved["loose"][0], stored);
    assert_eq!(saved["loose"].as_array().unwrap().len(), 2);
}

#[test]
fn sqlite_slots_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskline.db");
    let tree = sample_tree();

    {
        let conn = open_db(&path).unwrap();
        let slots = SqliteSlotStore::try_new(&conn).unwrap();
        ActivityStore::new(&slots, SLOT).save(&tree).unwrap();
        slots.write_slot("development", "{}").unwrap();
    }

    let conn = open_db(&path).unwrap();
    let slots = SqliteSlotStore::try_new(&conn).unwrap();
    assert_eq!(ActivityStore::new(&slots, SLOT).load().unwrap(), tree);
    assert_eq!(
        slots.slot_keys().unwrap(),
        vec!["activities".to_string(), "development".to_string()]
    );
}

#[test]
fn sqlite_write_overwrites_existing_slot() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db(dir.path().join("taskline.db")).unwrap();
    let slots = SqliteSlotStore::try_new(&conn).unwrap();

    slots.write_slot(SLOT, "{\"loose\": []}").unwrap();
    slots.write_slot(SLOT, "{}").unwrap();

    assert_eq!(slots.read_slot(SLOT).unwrap().as_deref(), Some("{}"));
    assert_eq!(slots.read_slot("missing").unwrap(), None);
}
