use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use availability_cell::{AvailabilityValidator, SupabaseAvailabilityStore, VisitCandidate};
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::{Actor, UserLevel};

use crate::models::{
    BookVisitRequest, CreateVisitRequest, UpdateVisitRequest, Visit, VisitError, VisitStatus,
};

const TABLE: &str = "visits";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Participants of the visit and staff.
pub fn can_view(actor: &Actor, visit: &Visit) -> bool {
    actor.is_staff() || actor.id == visit.doctor_id || actor.id == visit.patient_id
}

/// Same people as [`can_view`], and only while the visit is still open.
pub fn check_can_update(actor: &Actor, visit: &Visit) -> Result<(), VisitError> {
    if !can_view(actor, visit) {
        return Err(VisitError::Forbidden("Not allowed to modify this visit".to_string()));
    }
    if !visit.status.is_open() {
        return Err(VisitError::Closed(visit.status));
    }
    Ok(())
}

fn visit_row(visit: &Visit) -> Value {
    json!({
        "doctor_id": visit.doctor_id,
        "patient_id": visit.patient_id,
        "date": visit.date.format("%Y-%m-%d").to_string(),
        "start_time": visit.start_time.format(TIME_FORMAT).to_string(),
        "end_time": visit.end_time.format(TIME_FORMAT).to_string(),
        "status": visit.status,
        "description": visit.description,
    })
}

pub struct VisitService {
    supabase: Arc<SupabaseClient>,
    increment_minutes: u32,
}

impl VisitService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            increment_minutes: config.time_increment_minutes,
        }
    }

    async fn validate(&self, visit: &Visit, exclude_id: Option<Uuid>, now: NaiveDateTime, auth_token: &str) -> Result<(), VisitError> {
        let validator = AvailabilityValidator::new(
            SupabaseAvailabilityStore::new(self.supabase.clone(), auth_token),
            self.increment_minutes,
        );
        let candidate = VisitCandidate::new(visit.doctor_id, visit.date, visit.start_time, visit.end_time)
            .for_patient(visit.patient_id)
            .with_status(visit.status)
            .excluding(exclude_id);

        validator.validate_visit_submission(&candidate, now).await?;
        Ok(())
    }

    async fn is_doctor(&self, user_id: Uuid, active_only: bool, auth_token: &str) -> Result<bool, VisitError> {
        let mut filters = format!("id=eq.{}&user_level=eq.{}", user_id, i16::from(UserLevel::Doctor));
        if active_only {
            filters.push_str("&is_active=eq.true");
        }
        self.supabase
            .exists("users", &filters, auth_token)
            .await
            .map_err(|e| VisitError::Database(e.to_string()))
    }

    async fn insert(&self, visit: &Visit, now: NaiveDateTime, auth_token: &str) -> Result<Visit, VisitError> {
        self.validate(visit, None, now, auth_token).await?;

        let created: Visit = self.supabase
            .insert(TABLE, visit_row(visit), auth_token)
            .await
            .map_err(|e| VisitError::Database(e.to_string()))?;

        info!("Visit {} created for doctor {} and patient {}", created.id, created.doctor_id, created.patient_id);
        Ok(created)
    }

    /// Staff path. Admins may book any doctor; a doctor only themself.
    pub async fn create_visit(
        &self,
        actor: &Actor,
        request: CreateVisitRequest,
        now: NaiveDateTime,
        auth_token: &str,
    ) -> Result<Visit, VisitError> {
        let doctor_id = if actor.is_staff() {
            request
                .doctor_id
                .ok_or_else(|| VisitError::Validation("doctor_id is required".to_string()))?
        } else if actor.is_doctor() {
            match request.doctor_id {
                Some(id) if id != actor.id => {
                    return Err(VisitError::Forbidden("Doctors can only create their own visits".to_string()))
                }
                _ => actor.id,
            }
        } else {
            return Err(VisitError::Forbidden("Patients must use the booking endpoint".to_string()));
        };

        if doctor_id == request.patient_id {
            return Err(VisitError::Validation("Doctor and patient must be different users".to_string()));
        }
        if !self.is_doctor(doctor_id, false, auth_token).await? {
            return Err(VisitError::Validation(format!("User {} is not a doctor", doctor_id)));
        }

        debug!("Staff {} creating visit for doctor {}", actor.id, doctor_id);

        let visit = Visit {
            id: Uuid::nil(),
            doctor_id,
            patient_id: request.patient_id,
            date: request.date,
            start_time: request.start_time,
            end_time: request.end_time,
            status: request.status,
            description: request.description,
        };
        self.insert(&visit, now, auth_token).await
    }

    /// Patient path: books the caller with an active doctor, status `scheduled`.
    pub async fn book_visit(
        &self,
        actor: &Actor,
        doctor_id: Uuid,
        request: BookVisitRequest,
        now: NaiveDateTime,
        auth_token: &str,
    ) -> Result<Visit, VisitError> {
        if !actor.is_patient() {
            return Err(VisitError::Forbidden("Only patients can book visits".to_string()));
        }
        if doctor_id == actor.id {
            return Err(VisitError::Forbidden("You cannot book an appointment with yourself".to_string()));
        }
        if !self.is_doctor(doctor_id, true, auth_token).await? {
            warn!("Patient {} tried to book non-doctor or inactive user {}", actor.id, doctor_id);
            return Err(VisitError::Forbidden("You can only book appointments with active doctors".to_string()));
        }

        debug!("Patient {} booking doctor {} on {}", actor.id, doctor_id, request.date);

        let visit = Visit {
            id: Uuid::nil(),
            doctor_id,
            patient_id: actor.id,
            date: request.date,
            start_time: request.start_time,
            end_time: request.end_time,
            status: VisitStatus::Scheduled,
            description: request.description,
        };
        self.insert(&visit, now, auth_token).await
    }

    pub async fn get_visit(&self, visit_id: Uuid, auth_token: &str) -> Result<Visit, VisitError> {
        let rows: Vec<Visit> = self.supabase
            .select(TABLE, &format!("id=eq.{}", visit_id), auth_token)
            .await
            .map_err(|e| VisitError::Database(e.to_string()))?;

        rows.into_iter().next().ok_or(VisitError::NotFound)
    }

    pub async fn get_visit_for(&self, actor: &Actor, visit_id: Uuid, auth_token: &str) -> Result<Visit, VisitError> {
        let visit = self.get_visit(visit_id, auth_token).await?;
        if !can_view(actor, &visit) {
            return Err(VisitError::Forbidden("Not allowed to view this visit".to_string()));
        }
        Ok(visit)
    }

    pub async fn update_visit(
        &self,
        actor: &Actor,
        visit_id: Uuid,
        request: UpdateVisitRequest,
        now: NaiveDateTime,
        auth_token: &str,
    ) -> Result<Visit, VisitError> {
        let current = self.get_visit(visit_id, auth_token).await?;
        check_can_update(actor, &current)?;

        let merged = request.apply_to(&current);
        self.validate(&merged, Some(current.id), now, auth_token).await?;

        let rows: Vec<Visit> = self.supabase
            .update(TABLE, &format!("id=eq.{}", visit_id), visit_row(&merged), auth_token)
            .await
            .map_err(|e| VisitError::Database(e.to_string()))?;

        info!("Visit {} updated by {}", visit_id, actor.id);
        rows.into_iter().next().ok_or(VisitError::NotFound)
    }

    /// `upcoming_after` keeps only visits dated strictly after that day.
    pub async fn list_doctor_visits(
        &self,
        actor: &Actor,
        doctor_id: Uuid,
        upcoming_after: Option<NaiveDate>,
        auth_token: &str,
    ) -> Result<Vec<Visit>, VisitError> {
        if !actor.is_staff() && actor.id != doctor_id {
            return Err(VisitError::Forbidden("Not allowed to view these visits".to_string()));
        }

        let mut filters = format!("doctor_id=eq.{}", doctor_id);
        if let Some(day) = upcoming_after {
            filters.push_str(&format!("&date=gt.{}", day.format("%Y-%m-%d")));
        }
        filters.push_str("&order=date.asc,start_time.asc");

        self.supabase
            .select(TABLE, &filters, auth_token)
            .await
            .map_err(|e| VisitError::Database(e.to_string()))
    }

    pub async fn list_patient_visits(&self, actor: &Actor, patient_id: Uuid, auth_token: &str) -> Result<Vec<Visit>, VisitError> {
        if !actor.is_staff() && actor.id != patient_id {
            return Err(VisitError::Forbidden("Not allowed to view these visits".to_string()));
        }

        let filters = format!("patient_id=eq.{}&order=date.asc,start_time.asc", patient_id);
        self.supabase
            .select(TABLE, &filters, auth_token)
            .await
            .map_err(|e| VisitError::Database(e.to_string()))
    }

    pub async fn delete_visit(&self, actor: &Actor, visit_id: Uuid, auth_token: &str) -> Result<(), VisitError> {
        if !actor.is_staff() {
            return Err(VisitError::Forbidden("Administrator access required".to_string()));
        }

        let removed = self.supabase
            .delete(TABLE, &format!("id=eq.{}", visit_id), auth_token)
            .await
            .map_err(|e| VisitError::Database(e.to_string()))?;

        if removed.is_empty() {
            return Err(VisitError::NotFound);
        }
        info!("Visit {} deleted by {}", visit_id, actor.id);
        Ok(())
    }
}
