use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::error::AvailabilityError;
use crate::models::{ScheduleCandidate, VisitCandidate, VisitStatus};
use crate::services::rules;
use crate::services::store::{
    AvailabilityStore, ScheduleQuery, SupabaseAvailabilityStore, TimeRange, VisitQuery,
};

/// Decides whether a proposed schedule block or visit may be committed,
/// given what `store` currently holds.
pub struct AvailabilityValidator<S> {
    store: S,
    increment_minutes: u32,
}

/// Validator reading through PostgREST with the caller's token.
pub fn supabase_validator(config: &AppConfig, auth_token: &str) -> AvailabilityValidator<SupabaseAvailabilityStore> {
    let supabase = Arc::new(SupabaseClient::new(config));
    AvailabilityValidator::new(
        SupabaseAvailabilityStore::new(supabase, auth_token),
        config.time_increment_minutes,
    )
}

impl<S: AvailabilityStore> AvailabilityValidator<S> {
    pub fn new(store: S, increment_minutes: u32) -> Self {
        Self { store, increment_minutes }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn increment_minutes(&self) -> u32 {
        self.increment_minutes
    }

    pub fn validate_time_order(&self, start: NaiveTime, end: NaiveTime) -> Result<(), AvailabilityError> {
        rules::validate_time_order(start, end)
    }

    pub fn validate_time_increment(&self, time: NaiveTime) -> Result<(), AvailabilityError> {
        rules::validate_time_increment(time, self.increment_minutes)
    }

    pub fn validate_status_consistency(
        &self,
        status: VisitStatus,
        visit_at: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Result<(), AvailabilityError> {
        rules::validate_status_consistency(status, visit_at, now)
    }

    /// One block per weekday per doctor.
    pub async fn validate_schedule_existence(
        &self,
        doctor_id: Uuid,
        day_of_week: i16,
        exclude_id: Option<Uuid>,
    ) -> Result<(), AvailabilityError> {
        let query = ScheduleQuery::for_day(doctor_id, day_of_week).excluding(exclude_id);
        let rows = self.store.find_schedules(&query).await?;
        rules::check_schedule_existence(&rows, &query)
    }

    pub async fn validate_doctor_schedule_coverage(
        &self,
        doctor_id: Uuid,
        day_of_week: i16,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<(), AvailabilityError> {
        let query = ScheduleQuery::for_day(doctor_id, day_of_week);
        let rows = self.store.find_schedules(&query).await?;
        rules::check_schedule_coverage(&rows, &query, start, end)
    }

    pub async fn validate_visit_overlap(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        exclude_id: Option<Uuid>,
        patient_id: Option<Uuid>,
    ) -> Result<(), AvailabilityError> {
        let query = VisitQuery::for_date(doctor_id, date)
            .in_range(TimeRange::Overlapping { start, end })
            .excluding(exclude_id);
        let rows = self.store.find_visits(&query).await?;
        rules::check_visit_overlap(&rows, &query, patient_id)
    }

    /// Strict rule used by the admin path: no two blocks of a doctor may
    /// intersect on the same weekday.
    pub async fn validate_schedule_overlap(&self, candidate: &ScheduleCandidate) -> Result<(), AvailabilityError> {
        let query = ScheduleQuery::for_day(candidate.doctor_id, candidate.day_of_week)
            .in_range(TimeRange::Overlapping { start: candidate.start_time, end: candidate.end_time })
            .excluding(candidate.exclude_id);
        let rows = self.store.find_schedules(&query).await?;
        rules::check_schedule_overlap(&rows, &query)
    }

    pub async fn validate_schedule_submission(&self, candidate: &ScheduleCandidate) -> Result<(), AvailabilityError> {
        debug!("Validating schedule for doctor {} on day {}", candidate.doctor_id, candidate.day_of_week);
        log_rejection(self.check_schedule_submission(candidate).await)
    }

    pub async fn validate_schedule_admin(&self, candidate: &ScheduleCandidate) -> Result<(), AvailabilityError> {
        debug!("Validating admin schedule for doctor {} on day {}", candidate.doctor_id, candidate.day_of_week);
        log_rejection(self.check_schedule_admin(candidate).await)
    }

    /// Status consistency is only checked when the candidate carries a status.
    pub async fn validate_visit_submission(
        &self,
        candidate: &VisitCandidate,
        now: NaiveDateTime,
    ) -> Result<(), AvailabilityError> {
        debug!(
            "Validating visit for doctor {} on {} {}-{}",
            candidate.doctor_id, candidate.date, candidate.start_time, candidate.end_time
        );
        log_rejection(self.check_visit_submission(candidate, now).await)
    }

    async fn check_schedule_submission(&self, candidate: &ScheduleCandidate) -> Result<(), AvailabilityError> {
        rules::validate_schedule_shape(candidate, self.increment_minutes)?;
        self.validate_schedule_existence(candidate.doctor_id, candidate.day_of_week, candidate.exclude_id)
            .await
    }

    async fn check_schedule_admin(&self, candidate: &ScheduleCandidate) -> Result<(), AvailabilityError> {
        rules::validate_schedule_shape(candidate, self.increment_minutes)?;
        self.validate_schedule_overlap(candidate).await
    }

    async fn check_visit_submission(
        &self,
        candidate: &VisitCandidate,
        now: NaiveDateTime,
    ) -> Result<(), AvailabilityError> {
        rules::validate_visit_shape(candidate, self.increment_minutes)?;
        self.validate_visit_overlap(
            candidate.doctor_id,
            candidate.date,
            candidate.start_time,
            candidate.end_time,
            candidate.exclude_id,
            candidate.patient_id,
        )
        .await?;
        self.validate_doctor_schedule_coverage(
            candidate.doctor_id,
            candidate.day_of_week(),
            candidate.start_time,
            candidate.end_time,
        )
        .await?;
        match candidate.status {
            Some(status) => rules::validate_status_consistency(status, candidate.starts_at(), now),
            None => Ok(()),
        }
    }
}

fn log_rejection(result: Result<(), AvailabilityError>) -> Result<(), AvailabilityError> {
    match &result {
        Err(AvailabilityError::Store(_)) | Ok(()) => {}
        Err(e) => warn!("Availability rejected ({}): {}", e.code(), e),
    }
    result
}
