mod common;

use absen::{
    cache::{LocalPreferences, ScheduleCache},
    clock::{Clock, FixedClock},
    error::AbsenError,
    model::{
        attendance::{AttendanceType, NewAttendance},
        geo::Coordinate,
        schedule::ScheduleEntry,
    },
    service::{AttendanceService, Submission, Submitter},
    store::{AttendanceStore, MemoryStore},
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use common::{Harness, OFFICE, monday_at, settings};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

/// Moves `step` forward after every read.
struct SteppingClock {
    now: Mutex<DateTime<Utc>>,
    step: ChronoDuration,
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut now = self.now.lock().unwrap();
        let current = *now;
        *now = current + self.step;
        current
    }
}

fn budi() -> Submitter {
    Submitter {
        user_id: 7,
        display_name: "budi@kantor.id".into(),
    }
}

fn at_office() -> Submission {
    Submission {
        position: OFFICE,
        photo: vec![0xFF, 0xD8, 0xFF],
    }
}

#[tokio::test]
async fn early_check_in_records_positive_offset() {
    let h = Harness::new().await;
    h.at(7, 50);

    let outcome = h.state.attendance.submit(&budi(), at_office()).await.unwrap();

    assert_eq!(outcome.kind, AttendanceType::Masuk);
    assert_eq!(outcome.time_note, "+10");
    assert_eq!(outcome.time_note_text, "Lebih cepat 10 menit");
}

#[tokio::test]
async fn late_check_in_records_negative_offset() {
    let h = Harness::new().await;
    h.at(8, 15);

    let outcome = h.state.attendance.submit(&budi(), at_office()).await.unwrap();

    assert_eq!(outcome.kind, AttendanceType::Masuk);
    assert_eq!(outcome.time_note, "-15");
    assert_eq!(outcome.time_note_text, "Telat 15 menit");
}

#[tokio::test]
async fn entry_and_exit_minutes_are_still_check_ins() {
    let h = Harness::new().await;
    h.at(8, 0);
    let on_time = h.state.attendance.submit(&budi(), at_office()).await.unwrap();
    assert_eq!(on_time.time_note, "+0");

    let other = Submitter {
        user_id: 8,
        display_name: "sari@kantor.id".into(),
    };
    h.at(17, 0);
    let at_exit = h.state.attendance.submit(&other, at_office()).await.unwrap();
    assert_eq!(at_exit.kind, AttendanceType::Masuk);
    assert_eq!(at_exit.time_note, "-540");
    assert_eq!(at_exit.time_note_text, "Telat 9 jam 0 menit");
}

#[tokio::test]
async fn checkout_reports_time_present() {
    let h = Harness::new().await;
    h.at(8, 15);
    h.state.attendance.submit(&budi(), at_office()).await.unwrap();

    h.at(18, 0);
    let outcome = h.state.attendance.submit(&budi(), at_office()).await.unwrap();

    assert_eq!(outcome.kind, AttendanceType::Keluar);
    assert_eq!(outcome.time_note, "Hadir selama 9 jam 45 menit");
    assert_eq!(outcome.time_note_text, outcome.time_note);
}

#[tokio::test]
async fn checkout_without_check_in_is_flagged() {
    let h = Harness::new().await;
    h.at(18, 0);

    let outcome = h.state.attendance.submit(&budi(), at_office()).await.unwrap();

    assert_eq!(outcome.kind, AttendanceType::Keluar);
    assert_eq!(outcome.time_note, "Tidak absen masuk");
}

#[tokio::test]
async fn repeated_checkout_keeps_only_the_latest() {
    let h = Harness::new().await;
    h.at(8, 0);
    h.state.attendance.submit(&budi(), at_office()).await.unwrap();

    h.at(18, 0);
    let first = h.state.attendance.submit(&budi(), at_office()).await.unwrap();
    h.at(18, 30);
    let second = h.state.attendance.submit(&budi(), at_office()).await.unwrap();

    let keluar = h
        .state
        .attendance
        .history(7, Some(AttendanceType::Keluar))
        .await
        .unwrap();
    assert_eq!(keluar.len(), 1);
    assert_eq!(keluar[0].id, second.id);
    assert_eq!(keluar[0].time_note, "Hadir selama 10 jam 30 menit");
    assert!(h.store.get(first.id).await.unwrap().is_none());
}

#[tokio::test]
async fn checkouts_of_earlier_days_are_kept() {
    let h = Harness::new().await;
    h.at(18, 0);
    h.state.attendance.submit(&budi(), at_office()).await.unwrap();

    // next Monday
    h.clock.advance(ChronoDuration::days(7));
    h.state.attendance.submit(&budi(), at_office()).await.unwrap();

    let keluar = h
        .state
        .attendance
        .history(7, Some(AttendanceType::Keluar))
        .await
        .unwrap();
    assert_eq!(keluar.len(), 2);
}

#[tokio::test]
async fn second_check_in_on_the_same_day_is_rejected() {
    let h = Harness::new().await;
    h.at(7, 50);
    h.state.attendance.submit(&budi(), at_office()).await.unwrap();

    h.at(8, 10);
    let err = h.state.attendance.submit(&budi(), at_office()).await.unwrap_err();

    assert!(matches!(err, AbsenError::AlreadyCheckedIn));
    assert_eq!(h.state.attendance.history(7, None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn submission_outside_the_geofence_writes_nothing() {
    let h = Harness::new().await;
    h.at(7, 50);

    let far = Submission {
        // roughly 1.1 km north of the office
        position: Coordinate::new(OFFICE.latitude + 0.01, OFFICE.longitude),
        photo: vec![1, 2, 3],
    };
    let err = h.state.attendance.submit(&budi(), far).await.unwrap_err();

    match err {
        AbsenError::OutsideGeofence { distance_m, limit_m } => {
            assert!(distance_m > 1_000.0);
            assert_eq!(limit_m, 100.0);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(h.state.attendance.history(7, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_photo_is_rejected() {
    let h = Harness::new().await;
    h.at(7, 50);

    let err = h
        .state
        .attendance
        .submit(
            &budi(),
            Submission {
                position: OFFICE,
                photo: Vec::new(),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AbsenError::InvalidInput(_)));
}

#[tokio::test]
async fn day_without_schedule_is_not_found() {
    let h = Harness::new().await;
    h.at(7, 50);
    // Tuesday
    h.clock.advance(ChronoDuration::days(1));

    let err = h.state.attendance.submit(&budi(), at_office()).await.unwrap_err();

    match err {
        AbsenError::ScheduleNotFound(day) => assert_eq!(day, "selasa"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn operator_geofence_overrides_the_configured_default() {
    let h = Harness::new().await;
    h.at(7, 50);
    let branch = Coordinate::new(-6.9147, 107.6098);
    h.store
        .set_geofence(&absen::model::geo::GeofenceSettings {
            reference: branch,
            limit_m: 50.0,
        })
        .await
        .unwrap();

    let err = h.state.attendance.submit(&budi(), at_office()).await.unwrap_err();
    assert!(matches!(err, AbsenError::OutsideGeofence { .. }));

    let outcome = h
        .state
        .attendance
        .submit(
            &budi(),
            Submission {
                position: branch,
                photo: vec![1],
            },
        )
        .await
        .unwrap();
    assert_eq!(outcome.time_note, "+10");
}

#[tokio::test]
async fn successful_fetch_refreshes_the_cache() {
    let h = Harness::new().await;
    h.at(7, 50);
    assert!(h.state.attendance.cache().load().is_none());

    let resolved = h.state.attendance.resolve_schedule("senin").await.unwrap().unwrap();

    assert!(!resolved.from_cache);
    assert_eq!(
        h.state.attendance.cache().load(),
        Some(ScheduleEntry::new("senin", "08:00", "17:00"))
    );
}

#[tokio::test]
async fn slow_fetch_falls_back_to_a_stale_cache() {
    let h = Harness::with_timeout(Duration::from_millis(50)).await;
    // yesterday's schedule is what the device remembers
    h.state
        .attendance
        .cache()
        .save(&ScheduleEntry::new("minggu", "08:00", "17:00"))
        .unwrap();
    h.store
        .upsert_schedule(&ScheduleEntry::new("senin", "07:00", "16:00"))
        .await
        .unwrap();
    h.store.delay_schedule_reads(Duration::from_millis(300));
    h.at(8, 5);

    let outcome = h.state.attendance.submit(&budi(), at_office()).await.unwrap();
    assert_eq!(outcome.time_note, "-5");

    // the pending fetch still lands and replaces the stale entry
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(
        h.state.attendance.cache().load(),
        Some(ScheduleEntry::new("senin", "07:00", "16:00"))
    );
}

#[tokio::test]
async fn slow_fetch_with_empty_cache_is_not_found() {
    let h = Harness::with_timeout(Duration::from_millis(20)).await;
    h.store.delay_schedule_reads(Duration::from_millis(200));
    h.at(7, 50);

    let err = h.state.attendance.submit(&budi(), at_office()).await.unwrap_err();
    assert!(matches!(err, AbsenError::ScheduleNotFound(_)));
}

#[tokio::test]
async fn failed_fetch_surfaces_even_with_a_cache() {
    let h = Harness::new().await;
    h.state
        .attendance
        .cache()
        .save(&ScheduleEntry::new("senin", "08:00", "17:00"))
        .unwrap();
    h.store.fail_schedule_reads(true);
    h.at(7, 50);

    let err = h.state.attendance.submit(&budi(), at_office()).await.unwrap_err();
    assert!(matches!(err, AbsenError::Read(_)));
}

#[tokio::test]
async fn failed_checkout_insert_does_not_restore_the_old_checkout() {
    let h = Harness::new().await;
    h.at(18, 0);
    h.state.attendance.submit(&budi(), at_office()).await.unwrap();

    h.store.fail_inserts(true);
    h.at(18, 30);
    let err = h.state.attendance.submit(&budi(), at_office()).await.unwrap_err();

    assert!(matches!(err, AbsenError::Write(_)));
    assert!(
        h.state
            .attendance
            .history(7, Some(AttendanceType::Keluar))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn users_only_delete_their_own_records() {
    let h = Harness::new().await;
    h.at(7, 50);
    let mine = h.state.attendance.submit(&budi(), at_office()).await.unwrap();

    let err = h.state.attendance.delete_own(99, mine.id).await.unwrap_err();
    assert!(matches!(err, AbsenError::NotFound));

    h.state.attendance.delete_own(7, mine.id).await.unwrap();
    assert!(h.state.attendance.history(7, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn wipe_history_counts_what_it_removed() {
    let h = Harness::new().await;
    h.at(7, 50);
    h.state.attendance.submit(&budi(), at_office()).await.unwrap();
    h.at(18, 0);
    h.state.attendance.submit(&budi(), at_office()).await.unwrap();

    assert_eq!(h.state.attendance.wipe_history(7).await.unwrap(), 2);
    assert_eq!(h.state.attendance.wipe_history(7).await.unwrap(), 0);
}

#[tokio::test]
async fn subscribers_see_each_write_in_order() {
    let h = Harness::new().await;
    let mut sub = h.store.subscribe(7);

    h.at(8, 0);
    h.state.attendance.submit(&budi(), at_office()).await.unwrap();
    h.at(18, 0);
    h.state.attendance.submit(&budi(), at_office()).await.unwrap();

    assert_eq!(sub.next().await.unwrap().len(), 1);
    let latest = sub.next().await.unwrap();
    assert_eq!(latest.len(), 2);
    assert_eq!(latest[0].kind, AttendanceType::Keluar);
}

#[tokio::test]
async fn checkout_uses_the_instant_it_was_classified_at() {
    let stamps = Arc::new(FixedClock::new(monday_at(8, 0)));
    let store = Arc::new(MemoryStore::new(stamps));
    store
        .upsert_schedule(&ScheduleEntry::new("senin", "08:00", "17:00"))
        .await
        .unwrap();
    store
        .insert(NewAttendance {
            user_id: 7,
            display_name: "budi@kantor.id".into(),
            kind: AttendanceType::Masuk,
            photo: vec![1],
            time_note: "+0".into(),
        })
        .await
        .unwrap();

    // 23:59:59 on Monday; any second read would already be Tuesday
    let clock = Arc::new(SteppingClock {
        now: Mutex::new(monday_at(23, 59) + ChronoDuration::seconds(59)),
        step: ChronoDuration::seconds(1),
    });
    let service = AttendanceService::new(
        store,
        ScheduleCache::new(Arc::new(LocalPreferences::in_memory())),
        clock,
        settings(Duration::from_secs(1)),
    );

    let outcome = service.submit(&budi(), at_office()).await.unwrap();

    assert_eq!(outcome.kind, AttendanceType::Keluar);
    assert_eq!(outcome.time_note, "Hadir selama 15 jam 59 menit");
}

#[tokio::test]
async fn fetched_schedule_is_written_to_the_preferences_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preferences.json");
    let clock = Arc::new(FixedClock::new(monday_at(7, 0)));
    let store = Arc::new(MemoryStore::new(clock.clone()));
    let senin = ScheduleEntry::new("senin", "08:00", "17:00");
    store.upsert_schedule(&senin).await.unwrap();

    let service = AttendanceService::new(
        store,
        ScheduleCache::new(Arc::new(LocalPreferences::open(&path).unwrap())),
        clock,
        settings(Duration::from_secs(1)),
    );
    service.resolve_schedule("senin").await.unwrap();

    let reopened = ScheduleCache::new(Arc::new(LocalPreferences::open(&path).unwrap()));
    assert_eq!(reopened.load(), Some(senin));
}
