use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Role level stored in `users.user_level`. Ordering follows privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum UserLevel {
    Patient,
    Doctor,
    Admin,
    Superuser,
}

impl UserLevel {
    pub const ALL: [UserLevel; 4] = [
        UserLevel::Patient,
        UserLevel::Doctor,
        UserLevel::Admin,
        UserLevel::Superuser,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserLevel::Patient => "patient",
            UserLevel::Doctor => "doctor",
            UserLevel::Admin => "admin",
            UserLevel::Superuser => "superuser",
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, UserLevel::Admin | UserLevel::Superuser)
    }
}

impl From<UserLevel> for i16 {
    fn from(level: UserLevel) -> Self {
        match level {
            UserLevel::Patient => 0,
            UserLevel::Doctor => 1,
            UserLevel::Admin => 2,
            UserLevel::Superuser => 3,
        }
    }
}

impl TryFrom<i16> for UserLevel {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(UserLevel::Patient),
            1 => Ok(UserLevel::Doctor),
            2 => Ok(UserLevel::Admin),
            3 => Ok(UserLevel::Superuser),
            other => Err(format!("unknown user level {}", other)),
        }
    }
}

impl FromStr for UserLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "patient" => Ok(UserLevel::Patient),
            "doctor" => Ok(UserLevel::Doctor),
            "admin" => Ok(UserLevel::Admin),
            "superuser" => Ok(UserLevel::Superuser),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

impl fmt::Display for UserLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated caller, passed explicitly into every service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub level: UserLevel,
}

impl Actor {
    pub fn new(id: Uuid, level: UserLevel) -> Self {
        Self { id, level }
    }

    /// Roles outside the clinic vocabulary (e.g. Supabase's `authenticated`)
    /// get patient rights.
    pub fn from_user(user: &User) -> Result<Self, AppError> {
        let id = Uuid::parse_str(&user.id)
            .map_err(|_| AppError::Auth(format!("Invalid user id in token: {}", user.id)))?;
        let level = user
            .role
            .as_deref()
            .and_then(|role| role.parse::<UserLevel>().ok())
            .unwrap_or(UserLevel::Patient);
        Ok(Self { id, level })
    }

    pub fn is_staff(&self) -> bool {
        self.level.is_staff()
    }

    pub fn is_doctor(&self) -> bool {
        self.level == UserLevel::Doctor
    }

    pub fn is_patient(&self) -> bool {
        self.level == UserLevel::Patient
    }

    pub fn is_superuser(&self) -> bool {
        self.level == UserLevel::Superuser
    }
}
