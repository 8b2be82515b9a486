// libs/diagnosis-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::error::AppError;

pub const DESCRIPTION_MIN_LENGTH: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddDiagnosisRequest {
    pub description: String,
}

impl AddDiagnosisRequest {
    /// Trimmed description, at least [`DESCRIPTION_MIN_LENGTH`] characters.
    pub fn validated_description(&self) -> Result<String, DiagnosisError> {
        let description = self.description.trim();
        if description.chars().count() < DESCRIPTION_MIN_LENGTH {
            return Err(DiagnosisError::Validation(format!(
                "Description must be at least {} characters",
                DESCRIPTION_MIN_LENGTH
            )));
        }
        Ok(description.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisStatusRequest {
    pub is_active: bool,
}

#[derive(Error, Debug)]
pub enum DiagnosisError {
    #[error("Diagnosis not found")]
    NotFound,

    #[error("{0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<DiagnosisError> for AppError {
    fn from(err: DiagnosisError) -> Self {
        match err {
            DiagnosisError::NotFound => AppError::NotFound("Diagnosis not found".to_string()),
            DiagnosisError::Forbidden(msg) => AppError::Forbidden(msg),
            DiagnosisError::Validation(msg) => AppError::ValidationError(msg),
            DiagnosisError::Database(msg) => AppError::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_description_length_counts_trimmed_characters() {
        let short = AddDiagnosisRequest { description: "   flu      ".to_string() };
        assert_matches!(short.validated_description(), Err(DiagnosisError::Validation(_)));

        let ok = AddDiagnosisRequest { description: " seasonal flu ".to_string() };
        assert_eq!(ok.validated_description().unwrap(), "seasonal flu");

        // Ten Cyrillic letters are ten characters, not twenty bytes.
        let cyrillic = AddDiagnosisRequest { description: "гриппгрипп".to_string() };
        assert!(cyrillic.validated_description().is_ok());
    }

    #[test]
    fn test_errors_map_to_status_codes() {
        use axum::http::StatusCode;

        let err: AppError = DiagnosisError::Validation("too short".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_matches!(AppError::from(DiagnosisError::NotFound), AppError::NotFound(_));
        assert_matches!(AppError::from(DiagnosisError::Forbidden("no".to_string())), AppError::Forbidden(_));
    }
}
