//! Pure admission rules. Each takes the rows a store returned and decides,
//! re-applying the query predicate so a store that over-returns is harmless.

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use uuid::Uuid;

use crate::error::AvailabilityError;
use crate::models::{Schedule, ScheduleCandidate, Visit, VisitCandidate, VisitStatus};
use crate::services::store::{ScheduleQuery, VisitQuery};

/// Half-open intervals `[s1, e1)` and `[s2, e2)` intersect.
pub fn overlaps(s1: NaiveTime, e1: NaiveTime, s2: NaiveTime, e2: NaiveTime) -> bool {
    s1 < e2 && s2 < e1
}

/// `[outer_start, outer_end]` contains `[start, end]`.
pub fn covers(outer_start: NaiveTime, outer_end: NaiveTime, start: NaiveTime, end: NaiveTime) -> bool {
    outer_start <= start && outer_end >= end
}

pub fn validate_time_order(start: NaiveTime, end: NaiveTime) -> Result<(), AvailabilityError> {
    if start >= end {
        return Err(AvailabilityError::Order { start, end });
    }
    Ok(())
}

/// An increment of zero disables quantization.
pub fn validate_time_increment(time: NaiveTime, increment: u32) -> Result<(), AvailabilityError> {
    if increment != 0 && time.minute() % increment != 0 {
        return Err(AvailabilityError::Increment { time, increment });
    }
    Ok(())
}

pub fn validate_day_of_week(day_of_week: i16) -> Result<(), AvailabilityError> {
    if !(0..=6).contains(&day_of_week) {
        return Err(AvailabilityError::InvalidDayOfWeek(day_of_week));
    }
    Ok(())
}

pub fn validate_status_consistency(
    status: VisitStatus,
    visit_at: NaiveDateTime,
    now: NaiveDateTime,
) -> Result<(), AvailabilityError> {
    let invalid = match status {
        VisitStatus::Visited => visit_at > now,
        VisitStatus::Scheduled => visit_at <= now,
        _ => false,
    };
    if invalid {
        return Err(AvailabilityError::StatusTiming { status, visit_at });
    }
    Ok(())
}

/// Any other block for the same doctor and day is a duplicate.
pub fn check_schedule_existence(rows: &[Schedule], query: &ScheduleQuery) -> Result<(), AvailabilityError> {
    if rows.iter().any(|s| query.matches(s)) {
        return Err(AvailabilityError::DuplicateSchedule { day_of_week: query.day_of_week });
    }
    Ok(())
}

/// `rows` are the doctor's blocks for the weekday. A block containing the
/// interval admits it; a block that only intersects it yields
/// `OutOfSchedule`; no intersecting block at all yields `NotAvailable`.
pub fn check_schedule_coverage(
    rows: &[Schedule],
    query: &ScheduleQuery,
    start: NaiveTime,
    end: NaiveTime,
) -> Result<(), AvailabilityError> {
    let blocks: Vec<&Schedule> = rows.iter().filter(|s| query.matches(s)).collect();

    if blocks.iter().any(|s| covers(s.start_time, s.end_time, start, end)) {
        return Ok(());
    }

    match blocks
        .into_iter()
        .filter(|s| overlaps(s.start_time, s.end_time, start, end))
        .min_by_key(|s| s.start_time)
    {
        Some(schedule) => Err(AvailabilityError::OutOfSchedule { schedule: schedule.clone() }),
        None => Err(AvailabilityError::NotAvailable),
    }
}

/// Overlapping visits only block when one of them belongs to `patient_id`.
/// Without a patient nothing blocks.
pub fn check_visit_overlap(
    rows: &[Visit],
    query: &VisitQuery,
    patient_id: Option<Uuid>,
) -> Result<(), AvailabilityError> {
    let Some(patient_id) = patient_id else {
        return Ok(());
    };

    let conflict = rows
        .iter()
        .filter(|v| query.matches(v) && v.patient_id == patient_id)
        .min_by_key(|v| v.start_time);

    match conflict {
        Some(visit) => Err(AvailabilityError::DoctorBusy { visit: visit.clone() }),
        None => Ok(()),
    }
}

pub fn check_schedule_overlap(rows: &[Schedule], query: &ScheduleQuery) -> Result<(), AvailabilityError> {
    match rows.iter().filter(|s| query.matches(s)).min_by_key(|s| s.start_time) {
        Some(schedule) => Err(AvailabilityError::ScheduleOverlap { schedule: schedule.clone() }),
        None => Ok(()),
    }
}

pub fn validate_schedule_shape(candidate: &ScheduleCandidate, increment: u32) -> Result<(), AvailabilityError> {
    validate_day_of_week(candidate.day_of_week)?;
    validate_time_order(candidate.start_time, candidate.end_time)?;
    validate_time_increment(candidate.start_time, increment)?;
    validate_time_increment(candidate.end_time, increment)
}

pub fn validate_visit_shape(candidate: &VisitCandidate, increment: u32) -> Result<(), AvailabilityError> {
    validate_time_order(candidate.start_time, candidate.end_time)?;
    validate_time_increment(candidate.start_time, increment)?;
    validate_time_increment(candidate.end_time, increment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    use crate::services::store::TimeRange;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn schedule(doctor_id: Uuid, day: i16, start: NaiveTime, end: NaiveTime) -> Schedule {
        Schedule { id: Uuid::new_v4(), doctor_id, day_of_week: day, start_time: start, end_time: end }
    }

    fn visit(doctor_id: Uuid, patient_id: Uuid, date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Visit {
        Visit {
            id: Uuid::new_v4(),
            doctor_id,
            patient_id,
            date,
            start_time: start,
            end_time: end,
            status: VisitStatus::Scheduled,
            description: None,
        }
    }

    #[test]
    fn test_time_order_fails_iff_start_not_before_end() {
        assert!(validate_time_order(t(9, 0), t(10, 0)).is_ok());
        assert_matches!(validate_time_order(t(10, 0), t(10, 0)), Err(AvailabilityError::Order { .. }));
        assert_matches!(validate_time_order(t(11, 0), t(10, 0)), Err(AvailabilityError::Order { .. }));
    }

    #[test]
    fn test_time_increment_checks_minute_component() {
        for minute in 0..60 {
            let result = validate_time_increment(t(9, minute), 15);
            assert_eq!(result.is_err(), minute % 15 != 0, "minute {}", minute);
        }
        assert!(validate_time_increment(t(9, 7), 0).is_ok());
    }

    #[test]
    fn test_day_of_week_bounds() {
        assert!(validate_day_of_week(0).is_ok());
        assert!(validate_day_of_week(6).is_ok());
        assert_matches!(validate_day_of_week(7), Err(AvailabilityError::InvalidDayOfWeek(7)));
        assert_matches!(validate_day_of_week(-1), Err(AvailabilityError::InvalidDayOfWeek(-1)));
    }

    #[test]
    fn test_status_consistency_against_now() {
        let now = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_time(t(12, 0));
        let future = now + chrono::Duration::days(1);
        let past = now - chrono::Duration::days(1);

        assert_matches!(
            validate_status_consistency(VisitStatus::Visited, future, now),
            Err(AvailabilityError::StatusTiming { .. })
        );
        assert!(validate_status_consistency(VisitStatus::Visited, past, now).is_ok());
        assert!(validate_status_consistency(VisitStatus::Scheduled, future, now).is_ok());
        assert_matches!(
            validate_status_consistency(VisitStatus::Scheduled, now, now),
            Err(AvailabilityError::StatusTiming { .. })
        );
        assert!(validate_status_consistency(VisitStatus::Cancelled, future, now).is_ok());
    }

    #[test]
    fn test_coverage_distinguishes_partial_from_missing() {
        let doctor = Uuid::new_v4();
        let rows = vec![schedule(doctor, 0, t(9, 0), t(17, 0))];
        let query = ScheduleQuery::for_day(doctor, 0);

        assert!(check_schedule_coverage(&rows, &query, t(10, 0), t(11, 0)).is_ok());
        assert!(check_schedule_coverage(&rows, &query, t(9, 0), t(17, 0)).is_ok());
        assert_matches!(
            check_schedule_coverage(&rows, &query, t(8, 0), t(9, 0)),
            Err(AvailabilityError::NotAvailable)
        );
        assert_matches!(
            check_schedule_coverage(&rows, &query, t(16, 30), t(17, 30)),
            Err(AvailabilityError::OutOfSchedule { .. })
        );
    }

    #[test]
    fn test_coverage_ignores_rows_for_other_days() {
        let doctor = Uuid::new_v4();
        let rows = vec![schedule(doctor, 1, t(9, 0), t(17, 0))];
        let query = ScheduleQuery::for_day(doctor, 0);

        assert_matches!(
            check_schedule_coverage(&rows, &query, t(10, 0), t(11, 0)),
            Err(AvailabilityError::NotAvailable)
        );
    }

    #[test]
    fn test_visit_overlap_is_patient_scoped() {
        let doctor = Uuid::new_v4();
        let p = Uuid::new_v4();
        let q = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let existing = visit(doctor, p, date, t(10, 0), t(11, 0));
        let rows = vec![existing.clone()];
        let query = VisitQuery::for_date(doctor, date).in_range(TimeRange::Overlapping { start: t(10, 30), end: t(11, 30) });

        assert_matches!(
            check_visit_overlap(&rows, &query, Some(p)),
            Err(AvailabilityError::DoctorBusy { visit }) if visit == existing
        );
        assert!(check_visit_overlap(&rows, &query, Some(q)).is_ok());
        assert!(check_visit_overlap(&rows, &query, None).is_ok());
    }

    #[test]
    fn test_touching_intervals_do_not_overlap() {
        assert!(!overlaps(t(10, 0), t(11, 0), t(11, 0), t(12, 0)));
        assert!(overlaps(t(10, 0), t(11, 0), t(10, 45), t(12, 0)));
    }

    #[test]
    fn test_schedule_overlap_respects_exclusion() {
        let doctor = Uuid::new_v4();
        let own = schedule(doctor, 2, t(9, 0), t(12, 0));
        let rows = vec![own.clone()];
        let query = ScheduleQuery::for_day(doctor, 2)
            .in_range(TimeRange::Overlapping { start: t(9, 0), end: t(12, 0) });

        assert_matches!(check_schedule_overlap(&rows, &query), Err(AvailabilityError::ScheduleOverlap { .. }));
        assert!(check_schedule_overlap(&rows, &query.clone().excluding(Some(own.id))).is_ok());
    }
}
