use chrono::{NaiveDateTime, NaiveTime};
use serde_json::{json, Value};
use thiserror::Error;

use shared_models::error::AppError;

use crate::models::{Schedule, Visit, VisitStatus};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AvailabilityError {
    #[error("Start time ({start}) must be before end time ({end})")]
    Order { start: NaiveTime, end: NaiveTime },

    #[error("Time {time} must be in {increment}-minute increments")]
    Increment { time: NaiveTime, increment: u32 },

    #[error("Doctor already has a schedule for day {day_of_week}")]
    DuplicateSchedule { day_of_week: i16 },

    #[error("Doctor is not available at this time")]
    NotAvailable,

    #[error("Doctor is busy at {} - {}", .visit.start_time, .visit.end_time)]
    DoctorBusy { visit: Visit },

    #[error("Status '{status}' is not valid for a visit starting at {visit_at}")]
    StatusTiming { status: VisitStatus, visit_at: NaiveDateTime },

    #[error("Schedule overlaps an existing block ({} - {})", .schedule.start_time, .schedule.end_time)]
    ScheduleOverlap { schedule: Schedule },

    #[error("Requested time exceeds the doctor's schedule ({} - {})", .schedule.start_time, .schedule.end_time)]
    OutOfSchedule { schedule: Schedule },

    #[error("Day of week must be between 0 (Monday) and 6 (Sunday), got {0}")]
    InvalidDayOfWeek(i16),

    #[error("Availability store error: {0}")]
    Store(String),
}

impl AvailabilityError {
    /// Stable machine-readable name of the violated rule.
    pub fn code(&self) -> &'static str {
        match self {
            AvailabilityError::Order { .. } => "time_order",
            AvailabilityError::Increment { .. } => "time_increment",
            AvailabilityError::DuplicateSchedule { .. } => "duplicate_schedule",
            AvailabilityError::NotAvailable => "not_available",
            AvailabilityError::DoctorBusy { .. } => "doctor_busy",
            AvailabilityError::StatusTiming { .. } => "status_timing",
            AvailabilityError::ScheduleOverlap { .. } => "schedule_overlap",
            AvailabilityError::OutOfSchedule { .. } => "out_of_schedule",
            AvailabilityError::InvalidDayOfWeek(_) => "invalid_day_of_week",
            AvailabilityError::Store(_) => "store",
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            AvailabilityError::DuplicateSchedule { .. }
                | AvailabilityError::DoctorBusy { .. }
                | AvailabilityError::ScheduleOverlap { .. }
        )
    }

    /// The committed record the candidate collided with, if any.
    pub fn details(&self) -> Option<Value> {
        match self {
            AvailabilityError::DoctorBusy { visit } => Some(json!({ "conflicting_visit": visit })),
            AvailabilityError::ScheduleOverlap { schedule }
            | AvailabilityError::OutOfSchedule { schedule } => Some(json!({ "schedule": schedule })),
            AvailabilityError::DuplicateSchedule { day_of_week } => Some(json!({ "day_of_week": day_of_week })),
            _ => None,
        }
    }
}

impl From<AvailabilityError> for AppError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::Store(msg) => AppError::Database(msg),
            err if err.is_conflict() => AppError::Conflict {
                message: err.to_string(),
                details: err.details(),
            },
            err => AppError::ValidationError(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_conflicts_map_to_409_and_validation_to_400() {
        let dup: AppError = AvailabilityError::DuplicateSchedule { day_of_week: 0 }.into();
        assert_eq!(dup.status_code(), StatusCode::CONFLICT);

        let order: AppError = AvailabilityError::NotAvailable.into();
        assert_eq!(order.status_code(), StatusCode::BAD_REQUEST);

        let store: AppError = AvailabilityError::Store("boom".into()).into();
        assert_eq!(store.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
