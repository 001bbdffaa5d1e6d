mod common;

use absen::model::schedule::ScheduleEntry;
use chrono::{Duration as ChronoDuration, Timelike};
use common::{Harness, monday_at};

#[tokio::test]
async fn stale_cache_alone_plans_nothing() {
    let h = Harness::new().await;
    h.state
        .attendance
        .cache()
        .save(&ScheduleEntry::new("minggu", "09:00", "12:00"))
        .unwrap();

    assert!(h.state.reminders.replan().is_none());
}

#[tokio::test]
async fn refresh_replaces_yesterdays_schedule_before_planning() {
    let h = Harness::new().await;
    h.state
        .attendance
        .cache()
        .save(&ScheduleEntry::new("minggu", "09:00", "12:00"))
        .unwrap();

    let fire_at = h
        .state
        .reminders
        .refresh_and_replan(&h.state.attendance)
        .await
        .unwrap();

    assert_eq!((fire_at.hour(), fire_at.minute()), (7, 45));
    assert_eq!(
        h.state.attendance.cache().load(),
        Some(ScheduleEntry::new("senin", "08:00", "17:00"))
    );
}

#[tokio::test]
async fn day_without_schedule_gets_no_reminder() {
    let h = Harness::new().await;
    h.state
        .attendance
        .cache()
        .save(&ScheduleEntry::new("sabtu", "09:30", "12:00"))
        .unwrap();
    // Sunday 2026-03-08, just after midnight
    h.clock.set(monday_at(0, 0) + ChronoDuration::days(6) + ChronoDuration::seconds(1));

    assert!(
        h.state
            .reminders
            .refresh_and_replan(&h.state.attendance)
            .await
            .is_none()
    );
}

#[tokio::test]
async fn failed_refresh_still_plans_from_todays_cache() {
    let h = Harness::new().await;
    h.state
        .attendance
        .cache()
        .save(&ScheduleEntry::new("senin", "08:00", "17:00"))
        .unwrap();
    h.store.fail_schedule_reads(true);

    let fire_at = h
        .state
        .reminders
        .refresh_and_replan(&h.state.attendance)
        .await
        .unwrap();

    assert_eq!((fire_at.hour(), fire_at.minute()), (7, 45));
}
