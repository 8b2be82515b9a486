use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::Local;
use headers::{authorization::Bearer, Authorization};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;
use shared_utils::extractor::CurrentActor;

use crate::error::AvailabilityError;
use crate::models::{
    AvailabilityCheckResponse, ScheduleCandidate, ScheduleCheckQuery, VisitCandidate, VisitCheckQuery,
};
use crate::services::validator::supabase_validator;

/// Turns a rule rejection into a negative answer; store faults stay errors.
fn into_check_response(result: Result<(), AvailabilityError>) -> Result<Json<AvailabilityCheckResponse>, AppError> {
    match result {
        Ok(()) => Ok(Json(AvailabilityCheckResponse::available())),
        Err(AvailabilityError::Store(msg)) => Err(AppError::Database(msg)),
        Err(e) => Ok(Json(AvailabilityCheckResponse {
            available: false,
            code: Some(e.code().to_string()),
            reason: Some(e.to_string()),
            details: e.details(),
        })),
    }
}

#[axum::debug_handler]
pub async fn check_visit_availability(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<VisitCheckQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<AvailabilityCheckResponse>, AppError> {
    debug!("Visit availability check by {} for doctor {}", actor.id, doctor_id);

    // Only staff may check on behalf of another user; patients default to themselves.
    let patient_id = match query.patient_id {
        Some(patient_id) if !actor.is_staff() && patient_id != actor.id => {
            warn!("User {} denied visit check for patient {}", actor.id, patient_id);
            return Err(AppError::Forbidden("You can only check visits for yourself".to_string()));
        }
        Some(patient_id) => Some(patient_id),
        None => actor.is_patient().then_some(actor.id),
    };

    let mut candidate = VisitCandidate::new(doctor_id, query.date, query.start_time, query.end_time)
        .excluding(query.exclude_id);
    candidate.patient_id = patient_id;
    candidate.status = query.status;

    let validator = supabase_validator(&state, auth.token());
    let now = Local::now().naive_local();

    into_check_response(validator.validate_visit_submission(&candidate, now).await)
}

#[axum::debug_handler]
pub async fn check_schedule_availability(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<ScheduleCheckQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<AvailabilityCheckResponse>, AppError> {
    debug!("Schedule availability check by {} for doctor {}", actor.id, doctor_id);

    let candidate = ScheduleCandidate::new(doctor_id, query.day_of_week, query.start_time, query.end_time)
        .excluding(query.exclude_id);

    let validator = supabase_validator(&state, auth.token());
    let result = if query.strict {
        validator.validate_schedule_admin(&candidate).await
    } else {
        validator.validate_schedule_submission(&candidate).await
    };

    into_check_response(result)
}
