// libs/availability-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ==============================================================================
// COMMITTED RECORDS
// ==============================================================================

/// One weekly availability block. `day_of_week` counts from Monday = 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub status: VisitStatus,
    #[serde(default)]
    pub description: Option<String>,
}

impl Visit {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    #[default]
    Scheduled,
    Active,
    Visited,
    Missed,
    Cancelled,
}

impl VisitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitStatus::Scheduled => "scheduled",
            VisitStatus::Active => "active",
            VisitStatus::Visited => "visited",
            VisitStatus::Missed => "missed",
            VisitStatus::Cancelled => "cancelled",
        }
    }

    /// Visits in these states can still be edited.
    pub fn is_open(&self) -> bool {
        matches!(self, VisitStatus::Scheduled | VisitStatus::Active)
    }
}

impl fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisitStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(VisitStatus::Scheduled),
            "active" => Ok(VisitStatus::Active),
            "visited" => Ok(VisitStatus::Visited),
            "missed" => Ok(VisitStatus::Missed),
            "cancelled" => Ok(VisitStatus::Cancelled),
            other => Err(format!("unknown visit status '{}'", other)),
        }
    }
}

// ==============================================================================
// PROPOSED INTERVALS
// ==============================================================================

/// A schedule block as submitted, before it is committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleCandidate {
    pub doctor_id: Uuid,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Id of the record being edited, ignored when looking for collisions.
    pub exclude_id: Option<Uuid>,
}

impl ScheduleCandidate {
    pub fn new(doctor_id: Uuid, day_of_week: i16, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self { doctor_id, day_of_week, start_time, end_time, exclude_id: None }
    }

    pub fn excluding(mut self, id: Option<Uuid>) -> Self {
        self.exclude_id = id;
        self
    }
}

impl From<&Schedule> for ScheduleCandidate {
    fn from(schedule: &Schedule) -> Self {
        Self::new(schedule.doctor_id, schedule.day_of_week, schedule.start_time, schedule.end_time)
            .excluding(Some(schedule.id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitCandidate {
    pub doctor_id: Uuid,
    pub patient_id: Option<Uuid>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: Option<VisitStatus>,
    pub exclude_id: Option<Uuid>,
}

impl VisitCandidate {
    pub fn new(doctor_id: Uuid, date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            doctor_id,
            patient_id: None,
            date,
            start_time,
            end_time,
            status: None,
            exclude_id: None,
        }
    }

    pub fn for_patient(mut self, patient_id: Uuid) -> Self {
        self.patient_id = Some(patient_id);
        self
    }

    pub fn with_status(mut self, status: VisitStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn excluding(mut self, id: Option<Uuid>) -> Self {
        self.exclude_id = id;
        self
    }

    pub fn day_of_week(&self) -> i16 {
        self.date.weekday().num_days_from_monday() as i16
    }

    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }
}

impl From<&Visit> for VisitCandidate {
    fn from(visit: &Visit) -> Self {
        Self::new(visit.doctor_id, visit.date, visit.start_time, visit.end_time)
            .for_patient(visit.patient_id)
            .with_status(visit.status)
            .excluding(Some(visit.id))
    }
}

// ==============================================================================
// CHECK ENDPOINT DTOs
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct VisitCheckQuery {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub patient_id: Option<Uuid>,
    pub status: Option<VisitStatus>,
    pub exclude_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleCheckQuery {
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub exclude_id: Option<Uuid>,
    /// Use the admin rule (no overlapping blocks) instead of one block per day.
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityCheckResponse {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl AvailabilityCheckResponse {
    pub fn available() -> Self {
        Self { available: true, code: None, reason: None, details: None }
    }
}
