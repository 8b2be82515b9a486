// libs/user-cell/src/models.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::auth::UserLevel;
use shared_models::error::AppError;

use crate::validation::{validate_name, validate_username};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub user_level: UserLevel,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), UserError> {
        validate_username(&self.username)?;
        validate_name("First name", &self.first_name)?;
        validate_name("Last name", &self.last_name)?;
        if !self.email.contains('@') {
            return Err(UserError::Validation("Email is invalid".to_string()));
        }
        if self.phone.trim().is_empty() {
            return Err(UserError::Validation("Phone is required".to_string()));
        }
        Ok(())
    }
}

/// Partial update from the admin surface. Staff flags, when sent, must agree
/// with the resulting `user_level`; the stored flags are always derived.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminUpdateUserRequest {
    pub user_level: Option<UserLevel>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl AdminUpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        self.user_level.is_none()
            && self.is_active.is_none()
            && self.is_staff.is_none()
            && self.is_superuser.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoctorSearchQuery {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub specialization: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl DoctorSearchQuery {
    /// Blank parameters count as absent.
    pub fn normalized(self) -> Self {
        fn keep(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }
        Self {
            first_name: keep(self.first_name),
            last_name: keep(self.last_name),
            specialization: keep(self.specialization),
            username: keep(self.username),
            email: keep(self.email),
            phone: keep(self.phone),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.specialization.is_none()
            && self.username.is_none()
            && self.email.is_none()
            && self.phone.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecializationRequest {
    pub specialization: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorSpecialization {
    pub doctor_id: Uuid,
    pub specialization: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyDoctorsRequest {
    pub doctor_ids: Vec<Uuid>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Error, Debug)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("{0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound => AppError::NotFound("User not found".to_string()),
            UserError::Forbidden(msg) => AppError::Forbidden(msg),
            UserError::Validation(msg) => AppError::ValidationError(msg),
            UserError::UsernameTaken(username) => {
                AppError::conflict(format!("Username '{}' is already taken", username))
            }
            UserError::Database(msg) => AppError::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn register_request() -> RegisterRequest {
        RegisterRequest {
            username: "jdoe".to_string(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            email: "jdoe@example.com".to_string(),
            phone: "+10000000001".to_string(),
        }
    }

    #[test]
    fn test_register_request_validation() {
        assert!(register_request().validate().is_ok());

        let mut bad = register_request();
        bad.first_name = "J0hn".to_string();
        assert_matches!(bad.validate(), Err(UserError::Validation(_)));

        let mut bad = register_request();
        bad.email = "nope".to_string();
        assert_matches!(bad.validate(), Err(UserError::Validation(_)));
    }

    #[test]
    fn test_search_query_ignores_blank_parameters() {
        let query = DoctorSearchQuery {
            first_name: Some("  ".to_string()),
            phone: Some(String::new()),
            ..Default::default()
        }
        .normalized();
        assert!(query.is_empty());

        let query = DoctorSearchQuery {
            last_name: Some(" Smith ".to_string()),
            ..Default::default()
        }
        .normalized();
        assert_eq!(query.last_name.as_deref(), Some("Smith"));
    }

    #[test]
    fn test_username_taken_maps_to_conflict() {
        let err: AppError = UserError::UsernameTaken("jdoe".to_string()).into();
        assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);
    }
}
