mod common;

use assert_matches::assert_matches;
use chrono::Duration;
use tokio_test::assert_ok;
use uuid::Uuid;

use availability_cell::{
    AvailabilityError, AvailabilityValidator, ScheduleCandidate, VisitCandidate, VisitStatus,
};
use common::{monday, t, InMemoryStore};

fn validator() -> AvailabilityValidator<InMemoryStore> {
    AvailabilityValidator::new(InMemoryStore::new(), 15)
}

#[tokio::test]
async fn test_coverage_inside_and_outside_schedule() {
    let v = validator();
    let doctor = Uuid::new_v4();
    v.store().add_schedule(doctor, 0, t(9, 0), t(17, 0));

    assert_ok!(v.validate_doctor_schedule_coverage(doctor, 0, t(10, 0), t(11, 0)).await);
    assert_matches!(
        v.validate_doctor_schedule_coverage(doctor, 0, t(8, 0), t(9, 0)).await,
        Err(AvailabilityError::NotAvailable)
    );
    assert_matches!(
        v.validate_doctor_schedule_coverage(doctor, 1, t(10, 0), t(11, 0)).await,
        Err(AvailabilityError::NotAvailable)
    );
}

#[tokio::test]
async fn test_other_doctors_schedules_do_not_cover() {
    let v = validator();
    let doctor = Uuid::new_v4();
    v.store().add_schedule(Uuid::new_v4(), 0, t(9, 0), t(17, 0));

    assert_matches!(
        v.validate_doctor_schedule_coverage(doctor, 0, t(10, 0), t(11, 0)).await,
        Err(AvailabilityError::NotAvailable)
    );
}

#[tokio::test]
async fn test_overlap_blocks_same_patient_only() {
    let v = validator();
    let doctor = Uuid::new_v4();
    let p = Uuid::new_v4();
    let q = Uuid::new_v4();
    let existing = v.store().add_visit(doctor, p, monday(), t(10, 0), t(11, 0));

    let result = v
        .validate_visit_overlap(doctor, monday(), t(10, 30), t(11, 30), None, Some(p))
        .await;
    assert_matches!(result, Err(AvailabilityError::DoctorBusy { visit }) if visit.id == existing.id);

    assert!(v
        .validate_visit_overlap(doctor, monday(), t(10, 30), t(11, 30), None, Some(q))
        .await
        .is_ok());
    assert!(v
        .validate_visit_overlap(doctor, monday(), t(11, 0), t(12, 0), None, Some(p))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_one_schedule_per_day() {
    let v = validator();
    let doctor = Uuid::new_v4();
    v.store().add_schedule(doctor, 0, t(9, 0), t(12, 0));

    assert_matches!(
        v.validate_schedule_existence(doctor, 0, None).await,
        Err(AvailabilityError::DuplicateSchedule { day_of_week: 0 })
    );
    assert_ok!(v.validate_schedule_existence(doctor, 1, None).await);
}

#[tokio::test]
async fn test_status_timing_for_future_visit() {
    let v = validator();
    let doctor = Uuid::new_v4();
    let patient = Uuid::new_v4();
    v.store().add_schedule(doctor, 0, t(9, 0), t(17, 0));
    let now = (monday() - Duration::days(7)).and_time(t(12, 0));

    let visited = VisitCandidate::new(doctor, monday(), t(10, 0), t(11, 0))
        .for_patient(patient)
        .with_status(VisitStatus::Visited);
    assert_matches!(
        v.validate_visit_submission(&visited, now).await,
        Err(AvailabilityError::StatusTiming { status: VisitStatus::Visited, .. })
    );

    let scheduled = visited.clone().with_status(VisitStatus::Scheduled);
    assert_ok!(v.validate_visit_submission(&scheduled, now).await);
}

#[tokio::test]
async fn test_revalidating_committed_records_is_idempotent() {
    let v = validator();
    let doctor = Uuid::new_v4();
    let patient = Uuid::new_v4();
    let schedule = v.store().add_schedule(doctor, 0, t(9, 0), t(17, 0));
    let visit = v.store().add_visit(doctor, patient, monday(), t(10, 0), t(11, 0));
    let now = (monday() - Duration::days(1)).and_time(t(8, 0));

    assert_ok!(v.validate_schedule_submission(&ScheduleCandidate::from(&schedule)).await);
    assert_ok!(v.validate_schedule_admin(&ScheduleCandidate::from(&schedule)).await);
    assert_ok!(v.validate_visit_submission(&VisitCandidate::from(&visit), now).await);
}

#[tokio::test]
async fn test_visit_submission_checks_run_in_order() {
    let v = validator();
    let doctor = Uuid::new_v4();
    let patient = Uuid::new_v4();
    let now = (monday() - Duration::days(1)).and_time(t(8, 0));
    v.store().add_visit(doctor, patient, monday(), t(10, 0), t(11, 0));

    // Order beats increment.
    let reversed = VisitCandidate::new(doctor, monday(), t(11, 10), t(10, 0)).for_patient(patient);
    assert_matches!(v.validate_visit_submission(&reversed, now).await, Err(AvailabilityError::Order { .. }));

    let ragged = VisitCandidate::new(doctor, monday(), t(10, 10), t(11, 0)).for_patient(patient);
    assert_matches!(
        v.validate_visit_submission(&ragged, now).await,
        Err(AvailabilityError::Increment { increment: 15, .. })
    );

    // Busy beats missing schedule.
    let clash = VisitCandidate::new(doctor, monday(), t(10, 30), t(11, 30)).for_patient(patient);
    assert_matches!(v.validate_visit_submission(&clash, now).await, Err(AvailabilityError::DoctorBusy { .. }));

    let uncovered = VisitCandidate::new(doctor, monday(), t(12, 0), t(13, 0)).for_patient(patient);
    assert_matches!(v.validate_visit_submission(&uncovered, now).await, Err(AvailabilityError::NotAvailable));
}

#[tokio::test]
async fn test_partial_coverage_reports_out_of_schedule() {
    let v = validator();
    let doctor = Uuid::new_v4();
    let block = v.store().add_schedule(doctor, 0, t(9, 0), t(12, 0));

    let candidate = VisitCandidate::new(doctor, monday(), t(11, 30), t(12, 30));
    let now = (monday() - Duration::days(1)).and_time(t(8, 0));

    assert_matches!(
        v.validate_visit_submission(&candidate, now).await,
        Err(AvailabilityError::OutOfSchedule { schedule }) if schedule == block
    );
}

#[tokio::test]
async fn test_admin_schedule_rule_allows_disjoint_blocks_on_same_day() {
    let v = validator();
    let doctor = Uuid::new_v4();
    v.store().add_schedule(doctor, 2, t(9, 0), t(12, 0));

    let afternoon = ScheduleCandidate::new(doctor, 2, t(13, 0), t(17, 0));
    assert_ok!(v.validate_schedule_admin(&afternoon).await);
    assert_matches!(
        v.validate_schedule_submission(&afternoon).await,
        Err(AvailabilityError::DuplicateSchedule { .. })
    );

    let lunch = ScheduleCandidate::new(doctor, 2, t(11, 0), t(14, 0));
    assert_matches!(
        v.validate_schedule_admin(&lunch).await,
        Err(AvailabilityError::ScheduleOverlap { .. })
    );
}

#[tokio::test]
async fn test_schedule_submission_rejects_bad_day_before_querying() {
    let v = AvailabilityValidator::new(InMemoryStore::failing(), 15);
    let candidate = ScheduleCandidate::new(Uuid::new_v4(), 7, t(9, 0), t(10, 0));

    assert_matches!(
        v.validate_schedule_submission(&candidate).await,
        Err(AvailabilityError::InvalidDayOfWeek(7))
    );
}

#[tokio::test]
async fn test_store_failure_propagates() {
    let v = AvailabilityValidator::new(InMemoryStore::failing(), 15);
    let candidate = ScheduleCandidate::new(Uuid::new_v4(), 0, t(9, 0), t(10, 0));

    assert_matches!(v.validate_schedule_submission(&candidate).await, Err(AvailabilityError::Store(_)));
}
