// libs/schedule-cell/src/models.rs
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use availability_cell::AvailabilityError;
use shared_models::error::AppError;

pub use availability_cell::Schedule;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduleRequest {
    /// Required when staff create a block; doctors always create for themselves.
    pub doctor_id: Option<Uuid>,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateScheduleRequest {
    pub day_of_week: Option<i16>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

impl UpdateScheduleRequest {
    pub fn is_empty(&self) -> bool {
        self.day_of_week.is_none() && self.start_time.is_none() && self.end_time.is_none()
    }

    /// The stored block with this request's fields laid over it.
    pub fn apply_to(&self, current: &Schedule) -> Schedule {
        Schedule {
            day_of_week: self.day_of_week.unwrap_or(current.day_of_week),
            start_time: self.start_time.unwrap_or(current.start_time),
            end_time: self.end_time.unwrap_or(current.end_time),
            ..current.clone()
        }
    }
}

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Schedule not found")]
    NotFound,

    #[error("{0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Availability(#[from] AvailabilityError),

    /// The store refused a block intersecting another one on the same day.
    #[error("Schedule overlaps another block on day {day_of_week}")]
    BlockOverlap { day_of_week: i16 },

    #[error("Database error: {0}")]
    Database(String),
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::NotFound => AppError::NotFound("Schedule not found".to_string()),
            ScheduleError::Forbidden(msg) => AppError::Forbidden(msg),
            ScheduleError::Validation(msg) => AppError::ValidationError(msg),
            ScheduleError::Availability(e) => e.into(),
            ScheduleError::BlockOverlap { day_of_week } => AppError::Conflict {
                message: format!("Schedule overlaps another block on day {}", day_of_week),
                details: Some(json!({ "day_of_week": day_of_week })),
            },
            ScheduleError::Database(msg) => AppError::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_merges_only_supplied_fields() {
        let current = Schedule {
            id: Uuid::new_v4(),
            doctor_id: Uuid::new_v4(),
            day_of_week: 1,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        };
        let patch = UpdateScheduleRequest {
            end_time: NaiveTime::from_hms_opt(14, 0, 0),
            ..Default::default()
        };

        let merged = patch.apply_to(&current);
        assert_eq!(merged.id, current.id);
        assert_eq!(merged.day_of_week, 1);
        assert_eq!(merged.end_time, NaiveTime::from_hms_opt(14, 0, 0).unwrap());
        assert!(UpdateScheduleRequest::default().is_empty());
    }

    #[test]
    fn test_block_overlap_is_conflict_with_day() {
        let err: AppError = ScheduleError::BlockOverlap { day_of_week: 4 }.into();
        assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);
        assert!(err.to_string().contains("overlaps another block on day 4"));
    }
}
