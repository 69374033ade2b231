use calendar_core::config::CalendarConfig;
use calendar_core::domain::{EventType, Recurrence};
use calendar_core::errors::CalendarError;
use calendar_core::service::{CalendarService, CreateEventRequest, UpdateEventRequest};
use calendar_core::storage::JsonEventStore;
use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use tempfile::TempDir;
use uuid::Uuid;

fn service_in(dir: &TempDir) -> CalendarService<JsonEventStore> {
    let store = JsonEventStore::open(dir.path().join("events.json")).expect("open store");
    CalendarService::new(store)
}

fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn create_request(
    user_id: Uuid,
    title: &str,
    scheduled_at: DateTime<Utc>,
    recurrence: Recurrence,
) -> CreateEventRequest {
    CreateEventRequest {
        user_id,
        title: title.into(),
        notes: None,
        event_type: EventType::PaymentReminder,
        scheduled_at: scheduled_at.fixed_offset(),
        reminder_offset_minutes: None,
        linked_expense_id: None,
        recurrence,
    }
}

fn update_request(
    event_id: Uuid,
    user_id: Uuid,
    title: &str,
    scheduled_at: DateTime<Utc>,
    recurrence: Recurrence,
) -> UpdateEventRequest {
    UpdateEventRequest {
        event_id,
        user_id,
        title: title.into(),
        notes: None,
        event_type: EventType::PaymentReminder,
        scheduled_at: scheduled_at.fixed_offset(),
        reminder_offset_minutes: None,
        linked_expense_id: None,
        recurrence,
    }
}

#[test]
fn create_rejects_empty_title() {
    let dir = TempDir::new().unwrap();
    let mut service = service_in(&dir);
    let err = service
        .create_event(create_request(
            Uuid::new_v4(),
            "   ",
            utc(2024, 5, 1),
            Recurrence::None,
        ))
        .expect_err("blank title must be rejected");
    assert!(matches!(err, CalendarError::Validation(_)));
}

#[test]
fn create_normalizes_offset_anchors_to_utc() {
    let dir = TempDir::new().unwrap();
    let mut service = service_in(&dir);
    let user_id = Uuid::new_v4();

    let offset = FixedOffset::east_opt(5 * 3600).unwrap();
    let local_anchor = offset.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
    let event_id = service
        .create_event(CreateEventRequest {
            scheduled_at: local_anchor,
            ..create_request(user_id, "Rent", utc(2024, 5, 1), Recurrence::None)
        })
        .unwrap();

    let found = service
        .upcoming_events(user_id, utc(2024, 5, 1), utc(2024, 5, 2))
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].event_id, event_id);
    assert_eq!(
        found[0].occurs_at,
        Utc.with_ymd_and_hms(2024, 5, 1, 4, 0, 0).unwrap()
    );
}

#[test]
fn write_paths_report_missing_events_as_false() {
    let dir = TempDir::new().unwrap();
    let mut service = service_in(&dir);
    let user_id = Uuid::new_v4();
    let unknown = Uuid::new_v4();

    let updated = service
        .update_event(update_request(
            unknown,
            user_id,
            "Ghost",
            utc(2024, 5, 1),
            Recurrence::None,
        ))
        .unwrap();
    assert!(!updated);

    assert!(!service.delete_event(user_id, unknown).unwrap());
    assert!(!service
        .dismiss_occurrence(user_id, unknown, utc(2024, 5, 1).fixed_offset())
        .unwrap());
}

#[test]
fn events_are_invisible_to_other_users() {
    let dir = TempDir::new().unwrap();
    let mut service = service_in(&dir);
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();

    let event_id = service
        .create_event(create_request(
            owner,
            "Private bill",
            utc(2024, 5, 10),
            Recurrence::None,
        ))
        .unwrap();

    assert!(service
        .upcoming_events(stranger, utc(2024, 5, 1), utc(2024, 5, 31))
        .unwrap()
        .is_empty());
    assert!(!service.delete_event(stranger, event_id).unwrap());
    assert!(service.delete_event(owner, event_id).unwrap());
}

#[test]
fn upcoming_events_merge_and_sort_with_title_tie_break() {
    let dir = TempDir::new().unwrap();
    let mut service = service_in(&dir);
    let user_id = Uuid::new_v4();

    let shared_instant = utc(2024, 6, 15);
    service
        .create_event(create_request(
            user_id,
            "Water",
            shared_instant,
            Recurrence::None,
        ))
        .unwrap();
    service
        .create_event(create_request(
            user_id,
            "Electricity",
            shared_instant,
            Recurrence::None,
        ))
        .unwrap();
    // Weekly series anchored before the window still lands inside it.
    service
        .create_event(create_request(
            user_id,
            "Gym",
            utc(2024, 6, 1),
            Recurrence::Weekly,
        ))
        .unwrap();

    let found = service
        .upcoming_events(user_id, utc(2024, 6, 10), utc(2024, 6, 16))
        .unwrap();
    // All three land on June 15; the tie breaks on title.
    let titles: Vec<_> = found.iter().map(|item| item.title.as_str()).collect();
    assert_eq!(titles, vec!["Electricity", "Gym", "Water"]);
    assert_eq!(found[0].occurs_at, utc(2024, 6, 15));
}

#[test]
fn upcoming_occurrences_carry_the_recurrence_flag() {
    let dir = TempDir::new().unwrap();
    let mut service = service_in(&dir);
    let user_id = Uuid::new_v4();

    service
        .create_event(create_request(
            user_id,
            "One-off",
            utc(2024, 6, 5),
            Recurrence::None,
        ))
        .unwrap();
    service
        .create_event(create_request(
            user_id,
            "Daily",
            utc(2024, 6, 5),
            Recurrence::Daily,
        ))
        .unwrap();

    let found = service
        .upcoming_occurrences(user_id, utc(2024, 6, 5), utc(2024, 6, 6))
        .unwrap();
    assert_eq!(found.len(), 3);
    assert!(found
        .iter()
        .all(|item| item.is_recurring == item.recurrence.is_recurring()));
}

#[test]
fn dismissal_suppresses_until_the_watermark() {
    let dir = TempDir::new().unwrap();
    let mut service = service_in(&dir);
    let user_id = Uuid::new_v4();
    let anchor = utc(2024, 3, 4);

    let event_id = service
        .create_event(create_request(user_id, "Standup", anchor, Recurrence::Weekly))
        .unwrap();
    assert!(service
        .dismiss_occurrence(
            user_id,
            event_id,
            (anchor + Duration::days(14)).fixed_offset()
        )
        .unwrap());

    let found = service
        .upcoming_occurrences(user_id, anchor, anchor + Duration::days(21))
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].occurs_at, anchor + Duration::days(21));
}

#[test]
fn rescheduling_past_the_watermark_revives_a_one_off_event() {
    let dir = TempDir::new().unwrap();
    let mut service = service_in(&dir);
    let user_id = Uuid::new_v4();
    let anchor = utc(2024, 7, 1);

    let event_id = service
        .create_event(create_request(user_id, "Insurance", anchor, Recurrence::None))
        .unwrap();
    assert!(service
        .dismiss_occurrence(user_id, event_id, anchor.fixed_offset())
        .unwrap());
    assert!(service
        .upcoming_events(user_id, utc(2024, 6, 1), utc(2024, 8, 1))
        .unwrap()
        .is_empty());

    let new_anchor = anchor + Duration::days(7);
    assert!(service
        .update_event(update_request(
            event_id,
            user_id,
            "Insurance",
            new_anchor,
            Recurrence::None,
        ))
        .unwrap());

    let found = service
        .upcoming_events(user_id, utc(2024, 6, 1), utc(2024, 8, 1))
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].occurs_at, new_anchor);
    assert_eq!(found[0].dismissed_until_utc, None);
}

#[test]
fn inverted_window_returns_empty_lists() {
    let dir = TempDir::new().unwrap();
    let mut service = service_in(&dir);
    let user_id = Uuid::new_v4();
    service
        .create_event(create_request(user_id, "Rent", utc(2024, 5, 1), Recurrence::None))
        .unwrap();

    assert!(service
        .upcoming_events(user_id, utc(2024, 6, 1), utc(2024, 5, 1))
        .unwrap()
        .is_empty());
    assert!(service
        .upcoming_occurrences(user_id, utc(2024, 6, 1), utc(2024, 5, 1))
        .unwrap()
        .is_empty());
}

#[test]
fn dashboard_narrows_to_the_local_day() {
    let dir = TempDir::new().unwrap();
    let mut service = service_in(&dir);
    let user_id = Uuid::new_v4();
    let now_utc = Utc.with_ymd_and_hms(2024, 5, 10, 8, 0, 0).unwrap();

    // Later today, tomorrow, and next week.
    service
        .create_event(create_request(
            user_id,
            "Today",
            Utc.with_ymd_and_hms(2024, 5, 10, 18, 0, 0).unwrap(),
            Recurrence::None,
        ))
        .unwrap();
    service
        .create_event(create_request(
            user_id,
            "Tomorrow",
            Utc.with_ymd_and_hms(2024, 5, 11, 9, 0, 0).unwrap(),
            Recurrence::None,
        ))
        .unwrap();
    service
        .create_event(create_request(
            user_id,
            "Next week",
            Utc.with_ymd_and_hms(2024, 5, 17, 9, 0, 0).unwrap(),
            Recurrence::None,
        ))
        .unwrap();

    let reminders = service
        .dashboard_reminders_at(user_id, now_utc, &Utc)
        .unwrap();
    assert_eq!(reminders.len(), 1);
    assert_eq!(reminders[0].title, "Today");
}

#[test]
fn dashboard_day_boundary_respects_the_zone_offset() {
    let dir = TempDir::new().unwrap();
    let mut service = service_in(&dir);
    let user_id = Uuid::new_v4();
    // 23:00 UTC on May 10 is already May 11 at +02:00.
    let now_utc = Utc.with_ymd_and_hms(2024, 5, 10, 23, 0, 0).unwrap();
    let tz = FixedOffset::east_opt(2 * 3600).unwrap();

    service
        .create_event(create_request(
            user_id,
            "Early local morning",
            Utc.with_ymd_and_hms(2024, 5, 11, 5, 0, 0).unwrap(),
            Recurrence::None,
        ))
        .unwrap();

    let in_zone = service
        .dashboard_reminders_at(user_id, now_utc, &tz)
        .unwrap();
    assert_eq!(in_zone.len(), 1);

    // Interpreted as a UTC day instead, May 11 05:00 belongs to tomorrow.
    let in_utc = service
        .dashboard_reminders_at(user_id, now_utc, &Utc)
        .unwrap();
    assert!(in_utc.is_empty());
}

#[test]
fn widened_horizon_from_config_revives_stale_series() {
    let dir = TempDir::new().unwrap();
    let store = JsonEventStore::open(dir.path().join("events.json")).unwrap();
    let config = CalendarConfig {
        expansion_horizon_days: 3650,
        ..CalendarConfig::default()
    };
    let mut service = CalendarService::with_config(store, &config);
    let user_id = Uuid::new_v4();

    let now = utc(2024, 8, 1);
    let anchor = now - Duration::days(400);
    service
        .create_event(create_request(user_id, "Old series", anchor, Recurrence::Monthly))
        .unwrap();

    let found = service
        .upcoming_occurrences(user_id, now, now + Duration::days(30))
        .unwrap();
    assert!(!found.is_empty());
}

#[test]
fn stale_series_yields_nothing_under_default_horizon() {
    let dir = TempDir::new().unwrap();
    let mut service = service_in(&dir);
    let user_id = Uuid::new_v4();

    let now = utc(2024, 8, 1);
    let anchor = now - Duration::days(400);
    service
        .create_event(create_request(user_id, "Old series", anchor, Recurrence::Monthly))
        .unwrap();

    assert!(service
        .upcoming_occurrences(user_id, now, now + Duration::days(30))
        .unwrap()
        .is_empty());
}
