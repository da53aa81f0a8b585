use chrono::NaiveDate;
use taskline_core::{
    ActivityRepository, ActivityService, FaultKind, MemorySlotStore, Schedule, ServiceError,
    DEFAULT_ACTIVITIES_SLOT, DEVELOPMENT_ACTIVITIES_SLOT,
};

fn service(slots: &MemorySlotStore) -> ActivityService<&MemorySlotStore> {
    ActivityService::new(ActivityRepository::open_default(slots).unwrap())
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

#[test]
fn add_activity_fills_creation_and_checked_off() {
    let slots = MemorySlotStore::new();
    let mut service = service(&slots);

    let id = service
        .add_activity("Buy milk", Some(Schedule::on_day(2024, 3, 5)))
        .unwrap();

    let activity = service.repo().get_activity(&id).unwrap();
    assert_eq!(activity.name.as_deref(), Some("Buy milk"));
    assert_eq!(activity.checked_off, Some(false));
    assert!(activity.creation > 0);
}

#[test]
fn add_activity_rejects_blank_names() {
    let slots = MemorySlotStore::new();
    let mut service = service(&slots);

    let err = service.add_activity("   ", None).unwrap_err();

    assert!(matches!(err, ServiceError::InvalidName));
    assert_eq!(err.kind(), FaultKind::InvalidArgumentType);
    assert!(service.repo().is_empty());
}

#[test]
fn toggle_checked_off_flips_and_treats_absent_as_unchecked() {
    let slots = MemorySlotStore::new();
    let mut service = service(&slots);
    let id = service
        .add_activity_created_at("water plants", None, 1000)
        .unwrap();

    assert!(service.toggle_checked_off(&id).unwrap());
    assert!(!service.toggle_checked_off(&id).unwrap());

    let bare = service
        .repo_mut()
        .create_activity(taskline_core::ActivityDraft::new(2000))
        .unwrap();
    assert!(service.toggle_checked_off(&bare).unwrap());

    let missing = service.toggle_checked_off("missing").unwrap_err();
    assert_eq!(missing.kind(), FaultKind::NotFound);
}

#[test]
fn reschedule_moves_activity() {
    let slots = MemorySlotStore::new();
    let mut service = service(&slots);
    let id = service
        .add_activity_created_at("dentist", Some(Schedule::in_month(2024, 3)), 1000)
        .unwrap();

    service
        .reschedule(&id, Schedule::at_time(2024, 4, 2, 14, 30))
        .unwrap();

    assert_eq!(
        service.repo().get_activity(&id).unwrap().schedule,
        Some(Schedule::at_time(2024, 4, 2, 14, 30))
    );
    assert_eq!(service.repo().tree().len(), 1);
}

#[test]
fn copy_into_day_records_origin() {
    let slots = MemorySlotStore::new();
    let mut service = service(&slots);
    let id = service
        .add_activity_created_at("stretch", Some(Schedule::in_year(2024)), 1000)
        .unwrap();

    let copy = service.copy_into_day(&id, date(2024, 7, 9)).unwrap();

    let copied = service.repo().get_activity(&copy).unwrap();
    assert_eq!(copied.origin.as_deref(), Some(id.as_str()));
    assert_eq!(copied.schedule, Some(Schedule::on_day(2024, 7, 9)));
    assert_eq!(copied.name.as_deref(), Some("stretch"));
    assert_eq!(service.repo().get_activity(&id).unwrap().origin, None);
}

#[test]
fn toggle_storage_environment_flips_between_known_slots() {
    let slots = MemorySlotStore::new();
    let mut service = service(&slots);

    assert_eq!(
        service.toggle_storage_environment().unwrap(),
        DEVELOPMENT_ACTIVITIES_SLOT
    );
    assert_eq!(
        service.toggle_storage_environment().unwrap(),
        DEFAULT_ACTIVITIES_SLOT
    );

    service.repo_mut().set_storage_slot("archive").unwrap();
    let err = service.toggle_storage_environment().unwrap_err();
    assert!(matches!(err, ServiceError::UnexpectedSlot(slot) if slot == "archive"));
}

#[test]
fn due_by_and_upcoming_split_around_today() {
    let slots = MemorySlotStore::new();
    let mut service = service(&slots);
    let overdue = service
        .add_activity_created_at("overdue", Some(Schedule::on_day(2024, 3, 1)), 1)
        .unwrap();
    let today = service
        .add_activity_created_at("today", Some(Schedule::at_time(2024, 3, 5, 18, 0)), 2)
        .unwrap();
    let tomorrow = service
        .add_activity_created_at("tomorrow", Some(Schedule::on_day(2024, 3, 6)), 3)
        .unwrap();
    let later = service
        .add_activity_created_at("later", Some(Schedule::in_month(2024, 4)), 4)
        .unwrap();
    let finished = service
        .add_activity_created_at("finished", Some(Schedule::on_day(2024, 3, 2)), 5)
        .unwrap();
    service.toggle_checked_off(&finished).unwrap();

    let now = date(2024, 3, 5);
    assert_eq!(service.due_by(now), vec![today, overdue]);
    assert_eq!(service.upcoming(now), vec![tomorrow, later]);
}

#[test]
fn upcoming_rolls_over_month_end() {
    let slots = MemorySlotStore::new();
    let mut service = service(&slots);
    let april_first = service
        .add_activity_created_at("april", Some(Schedule::on_day(2024, 4, 1)), 1)
        .unwrap();
    let march_last = service
        .add_activity_created_at("march", Some(Schedule::on_day(2024, 3, 31)), 2)
        .unwrap();

    let now = date(2024, 3, 31);
    assert_eq!(service.due_by(now), vec![march_last]);
    assert_eq!(service.upcoming(now), vec![april_first]);
}
