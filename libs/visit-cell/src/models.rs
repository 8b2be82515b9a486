// libs/visit-cell/src/models.rs
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use availability_cell::AvailabilityError;
use shared_models::error::AppError;

pub use availability_cell::{Visit, VisitStatus};

/// Staff path: admins book for anyone, doctors for themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVisitRequest {
    pub doctor_id: Option<Uuid>,
    pub patient_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub status: VisitStatus,
    pub description: Option<String>,
}

/// Patient path: the doctor comes from the URL, the patient is the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookVisitRequest {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateVisitRequest {
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub status: Option<VisitStatus>,
    pub description: Option<String>,
}

impl UpdateVisitRequest {
    pub fn apply_to(&self, current: &Visit) -> Visit {
        Visit {
            date: self.date.unwrap_or(current.date),
            start_time: self.start_time.unwrap_or(current.start_time),
            end_time: self.end_time.unwrap_or(current.end_time),
            status: self.status.unwrap_or(current.status),
            description: self.description.clone().or_else(|| current.description.clone()),
            ..current.clone()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct VisitListQuery {
    /// Only visits dated after today.
    #[serde(default)]
    pub upcoming: bool,
}

#[derive(Error, Debug)]
pub enum VisitError {
    #[error("Visit not found")]
    NotFound,

    #[error("{0}")]
    Forbidden(String),

    #[error("Visit can no longer be modified (status: {0})")]
    Closed(VisitStatus),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Availability(#[from] AvailabilityError),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<VisitError> for AppError {
    fn from(err: VisitError) -> Self {
        match err {
            VisitError::NotFound => AppError::NotFound("Visit not found".to_string()),
            VisitError::Forbidden(msg) => AppError::Forbidden(msg),
            VisitError::Closed(status) => {
                AppError::BadRequest(format!("Visit can no longer be modified (status: {})", status))
            }
            VisitError::Validation(msg) => AppError::ValidationError(msg),
            VisitError::Availability(e) => e.into(),
            VisitError::Database(msg) => AppError::Database(msg),
        }
    }
}
