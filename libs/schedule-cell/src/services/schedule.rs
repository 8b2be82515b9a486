use std::sync::Arc;

use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use availability_cell::{
    AvailabilityError, AvailabilityValidator, ScheduleCandidate, SupabaseAvailabilityStore,
};
use shared_config::AppConfig;
use shared_database::supabase::{is_conflict, SupabaseClient};
use shared_models::auth::Actor;

use crate::models::{CreateScheduleRequest, Schedule, ScheduleError, UpdateScheduleRequest};

const TABLE: &str = "schedules";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Which rule set a save runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SaveMode {
    /// One block per weekday.
    Form,
    /// Several disjoint blocks per weekday, staff only.
    Admin,
}

pub struct ScheduleService {
    supabase: Arc<SupabaseClient>,
    increment_minutes: u32,
}

/// Owners and staff may edit or remove a block.
pub fn can_manage(actor: &Actor, schedule: &Schedule) -> bool {
    actor.is_staff() || (actor.is_doctor() && actor.id == schedule.doctor_id)
}

impl ScheduleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            increment_minutes: config.time_increment_minutes,
        }
    }

    fn validator(&self, auth_token: &str) -> AvailabilityValidator<SupabaseAvailabilityStore> {
        AvailabilityValidator::new(
            SupabaseAvailabilityStore::new(self.supabase.clone(), auth_token),
            self.increment_minutes,
        )
    }

    async fn validate(
        &self,
        mode: SaveMode,
        candidate: &ScheduleCandidate,
        auth_token: &str,
    ) -> Result<(), ScheduleError> {
        let validator = self.validator(auth_token);
        match mode {
            SaveMode::Form => validator.validate_schedule_submission(candidate).await?,
            SaveMode::Admin => validator.validate_schedule_admin(candidate).await?,
        }
        Ok(())
    }

    pub async fn list_doctor_schedules(&self, doctor_id: Uuid, auth_token: &str) -> Result<Vec<Schedule>, ScheduleError> {
        debug!("Listing schedules for doctor {}", doctor_id);

        let filters = format!("doctor_id=eq.{}&order=day_of_week.asc,start_time.asc", doctor_id);
        self.supabase
            .select::<Schedule>(TABLE, &filters, auth_token)
            .await
            .map_err(|e| ScheduleError::Database(e.to_string()))
    }

    pub async fn get_schedule(&self, schedule_id: Uuid, auth_token: &str) -> Result<Schedule, ScheduleError> {
        let filters = format!("id=eq.{}", schedule_id);
        let rows: Vec<Schedule> = self.supabase
            .select(TABLE, &filters, auth_token)
            .await
            .map_err(|e| ScheduleError::Database(e.to_string()))?;

        rows.into_iter().next().ok_or(ScheduleError::NotFound)
    }

    /// Doctors create for themselves; staff must name the doctor.
    fn resolve_owner(actor: &Actor, requested: Option<Uuid>) -> Result<Uuid, ScheduleError> {
        if actor.is_staff() {
            return requested
                .ok_or_else(|| ScheduleError::Validation("doctor_id is required".to_string()));
        }
        if !actor.is_doctor() {
            return Err(ScheduleError::Forbidden("Only doctors and administrators can manage schedules".to_string()));
        }
        match requested {
            Some(doctor_id) if doctor_id != actor.id => {
                Err(ScheduleError::Forbidden("Doctors can only manage their own schedules".to_string()))
            }
            _ => Ok(actor.id),
        }
    }

    pub async fn create_schedule(
        &self,
        actor: &Actor,
        request: CreateScheduleRequest,
        auth_token: &str,
    ) -> Result<Schedule, ScheduleError> {
        let doctor_id = Self::resolve_owner(actor, request.doctor_id)?;
        self.insert(SaveMode::Form, doctor_id, request, auth_token).await
    }

    pub async fn admin_create_schedule(
        &self,
        actor: &Actor,
        request: CreateScheduleRequest,
        auth_token: &str,
    ) -> Result<Schedule, ScheduleError> {
        if !actor.is_staff() {
            return Err(ScheduleError::Forbidden("Administrator access required".to_string()));
        }
        let doctor_id = request
            .doctor_id
            .ok_or_else(|| ScheduleError::Validation("doctor_id is required".to_string()))?;
        self.insert(SaveMode::Admin, doctor_id, request, auth_token).await
    }

    async fn insert(
        &self,
        mode: SaveMode,
        doctor_id: Uuid,
        request: CreateScheduleRequest,
        auth_token: &str,
    ) -> Result<Schedule, ScheduleError> {
        debug!("Creating schedule for doctor {} on day {}", doctor_id, request.day_of_week);

        let candidate = ScheduleCandidate::new(doctor_id, request.day_of_week, request.start_time, request.end_time);
        self.validate(mode, &candidate, auth_token).await?;

        let row = json!({
            "doctor_id": doctor_id,
            "day_of_week": request.day_of_week,
            "start_time": request.start_time.format(TIME_FORMAT).to_string(),
            "end_time": request.end_time.format(TIME_FORMAT).to_string(),
        });

        let schedule: Schedule = self.supabase
            .insert(TABLE, row, auth_token)
            .await
            .map_err(|e| Self::write_error(e, mode, request.day_of_week))?;

        info!("Schedule {} created for doctor {}", schedule.id, doctor_id);
        Ok(schedule)
    }

    pub async fn update_schedule(
        &self,
        actor: &Actor,
        schedule_id: Uuid,
        request: UpdateScheduleRequest,
        auth_token: &str,
    ) -> Result<Schedule, ScheduleError> {
        self.update(SaveMode::Form, actor, schedule_id, request, auth_token).await
    }

    pub async fn admin_update_schedule(
        &self,
        actor: &Actor,
        schedule_id: Uuid,
        request: UpdateScheduleRequest,
        auth_token: &str,
    ) -> Result<Schedule, ScheduleError> {
        if !actor.is_staff() {
            return Err(ScheduleError::Forbidden("Administrator access required".to_string()));
        }
        self.update(SaveMode::Admin, actor, schedule_id, request, auth_token).await
    }

    async fn update(
        &self,
        mode: SaveMode,
        actor: &Actor,
        schedule_id: Uuid,
        request: UpdateScheduleRequest,
        auth_token: &str,
    ) -> Result<Schedule, ScheduleError> {
        debug!("Updating schedule {}", schedule_id);

        let current = self.get_schedule(schedule_id, auth_token).await?;
        if !can_manage(actor, &current) {
            warn!("User {} denied update of schedule {}", actor.id, schedule_id);
            return Err(ScheduleError::Forbidden("Not allowed to modify this schedule".to_string()));
        }
        if request.is_empty() {
            return Ok(current);
        }

        let merged = request.apply_to(&current);
        self.validate(mode, &ScheduleCandidate::from(&merged), auth_token).await?;

        let patch = json!({
            "day_of_week": merged.day_of_week,
            "start_time": merged.start_time.format(TIME_FORMAT).to_string(),
            "end_time": merged.end_time.format(TIME_FORMAT).to_string(),
        });

        let rows: Vec<Schedule> = self.supabase
            .update(TABLE, &format!("id=eq.{}", schedule_id), patch, auth_token)
            .await
            .map_err(|e| Self::write_error(e, mode, merged.day_of_week))?;

        rows.into_iter().next().ok_or(ScheduleError::NotFound)
    }

    pub async fn delete_schedule(&self, actor: &Actor, schedule_id: Uuid, auth_token: &str) -> Result<(), ScheduleError> {
        let current = self.get_schedule(schedule_id, auth_token).await?;
        if !can_manage(actor, &current) {
            warn!("User {} denied deletion of schedule {}", actor.id, schedule_id);
            return Err(ScheduleError::Forbidden("Not allowed to delete this schedule".to_string()));
        }

        self.supabase
            .delete(TABLE, &format!("id=eq.{}", schedule_id), auth_token)
            .await
            .map_err(|e| ScheduleError::Database(e.to_string()))?;

        info!("Schedule {} deleted by {}", schedule_id, actor.id);
        Ok(())
    }

    /// A constraint hit means a concurrent request committed an intersecting
    /// block first. The error names the rule the save ran under.
    fn write_error(err: anyhow::Error, mode: SaveMode, day_of_week: i16) -> ScheduleError {
        if is_conflict(&err) {
            warn!("Store rejected {:?} schedule save for day {}", mode, day_of_week);
            return match mode {
                SaveMode::Form => AvailabilityError::DuplicateSchedule { day_of_week }.into(),
                SaveMode::Admin => ScheduleError::BlockOverlap { day_of_week },
            };
        }
        error!("Failed to write schedule: {}", err);
        ScheduleError::Database(err.to_string())
    }
}
