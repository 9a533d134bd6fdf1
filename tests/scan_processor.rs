mod common;

use attendance::error::AttendanceError;
use attendance::model::attendance::{AttendanceDetail, JustificationStatus};
use attendance::model::person::PersonRef;
use common::{School, at, day};
use futures::future::join_all;

#[actix_web::test]
async fn on_time_scan_then_duplicate() {
    let school = School::new();

    let record = school
        .scanner
        .scan_badge("LRN-0001", at(2026, 3, 2, 8, 10, 0))
        .await
        .unwrap();
    assert!(record.is_present);
    assert!(!record.is_late);
    assert_eq!(record.date, day(2026, 3, 2));
    assert_eq!(
        record.justification().map(|j| j.status),
        Some(JustificationStatus::Pending)
    );

    let err = school
        .scanner
        .scan_badge("LRN-0001", at(2026, 3, 2, 12, 30, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, AttendanceError::DuplicateScan { .. }));
    assert_eq!(err.to_string(), "Awa Diop already scanned today at 08:10:00");
    assert_eq!(school.store.len(), 1);
}

#[actix_web::test]
async fn duplicate_by_id_still_names_the_person() {
    let school = School::new();
    let awa = PersonRef::learner(1);

    school.scanner.scan(awa, at(2026, 3, 2, 7, 59, 0)).await.unwrap();
    let err = school
        .scanner
        .scan(awa, at(2026, 3, 2, 8, 0, 0))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Awa Diop already scanned today at 07:59:00");
}

#[actix_web::test]
async fn lateness_cutoff_boundary() {
    let school = School::new();

    let on_time = school
        .scanner
        .scan(PersonRef::learner(1), at(2026, 3, 2, 8, 15, 0))
        .await
        .unwrap();
    let late = school
        .scanner
        .scan(PersonRef::learner(2), at(2026, 3, 2, 8, 15, 1))
        .await
        .unwrap();

    assert!(!on_time.is_late);
    assert!(late.is_late);
    assert_eq!(
        late.justification().map(|j| j.status),
        Some(JustificationStatus::ToJustify)
    );
}

#[actix_web::test]
async fn next_day_is_a_new_record() {
    let school = School::new();
    let awa = PersonRef::learner(1);

    school.scanner.scan(awa, at(2026, 3, 2, 8, 0, 0)).await.unwrap();
    school.scanner.scan(awa, at(2026, 3, 3, 8, 0, 0)).await.unwrap();
    assert_eq!(school.store.len(), 2);
}

#[actix_web::test]
async fn concurrent_scans_create_one_record() {
    let school = School::new();
    let awa = PersonRef::learner(1);
    let when = at(2026, 3, 2, 8, 5, 0);

    let results = join_all((0..25).map(|_| school.scanner.scan(awa, when))).await;

    let created = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(AttendanceError::DuplicateScan { .. })))
        .count();
    assert_eq!(created, 1);
    assert_eq!(duplicates, 24);
    assert_eq!(school.store.len(), 1);
}

#[actix_web::test]
async fn unknown_badge_is_not_found() {
    let school = School::new();
    let err = school
        .scanner
        .scan_badge("LRN-9999", at(2026, 3, 2, 8, 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, AttendanceError::NotFound(_)));
    assert!(school.store.is_empty());
}

#[actix_web::test]
async fn scan_after_sweep_is_rejected() {
    let school = School::new();
    school.sweeper.sweep(day(2026, 3, 2)).await.unwrap();

    let err = school
        .scanner
        .scan(PersonRef::learner(1), at(2026, 3, 2, 19, 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, AttendanceError::DuplicateScan { .. }));
}

#[actix_web::test]
async fn coach_checks_in_once_and_out_once() {
    let school = School::new();

    let check_in = school
        .scanner
        .scan_badge("CCH-0001", at(2026, 3, 2, 8, 20, 0))
        .await
        .unwrap();
    assert!(check_in.is_late);
    assert!(check_in.justification().is_none());

    let err = school
        .scanner
        .scan_badge("CCH-0001", at(2026, 3, 2, 17, 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, AttendanceError::DuplicateScan { .. }));

    let closed = school
        .scanner
        .check_out_badge("CCH-0001", at(2026, 3, 2, 17, 0, 0))
        .await
        .unwrap();
    match closed.detail {
        AttendanceDetail::Coach {
            check_in,
            check_out,
        } => {
            assert_eq!(check_in, Some(at(2026, 3, 2, 8, 20, 0)));
            assert_eq!(check_out, Some(at(2026, 3, 2, 17, 0, 0)));
        }
        other => panic!("expected coach detail, got {:?}", other),
    }

    let again = school
        .scanner
        .check_out_badge("CCH-0001", at(2026, 3, 2, 17, 5, 0))
        .await
        .unwrap_err();
    assert!(matches!(again, AttendanceError::NotFound(_)));
}

#[actix_web::test]
async fn check_out_rules() {
    let school = School::new();

    let no_check_in = school
        .scanner
        .check_out(PersonRef::coach(1), at(2026, 3, 2, 17, 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(no_check_in, AttendanceError::NotFound(_)));

    let learner = school
        .scanner
        .check_out(PersonRef::learner(1), at(2026, 3, 2, 17, 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(learner, AttendanceError::InvalidTransition(_)));

    // an absence row has no check-in to close
    school.sweeper.sweep(day(2026, 3, 3)).await.unwrap();
    let absent = school
        .scanner
        .check_out(PersonRef::coach(1), at(2026, 3, 3, 17, 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(absent, AttendanceError::NotFound(_)));
}

#[actix_web::test]
async fn storage_outage_writes_nothing() {
    let school = School::new();
    school.store.set_offline(true);

    let err = school
        .scanner
        .scan(PersonRef::learner(1), at(2026, 3, 2, 8, 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, AttendanceError::StorageUnavailable(_)));

    school.store.set_offline(false);
    assert!(school.store.is_empty());
}
