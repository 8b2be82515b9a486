use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;
use shared_utils::extractor::CurrentActor;

use crate::models::{CreateScheduleRequest, UpdateScheduleRequest};
use crate::services::ScheduleService;

#[axum::debug_handler]
pub async fn list_doctor_schedules(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = ScheduleService::new(&state);
    let schedules = service.list_doctor_schedules(doctor_id, auth.token()).await?;

    Ok(Json(json!({
        "schedules": schedules,
        "total": schedules.len()
    })))
}

#[axum::debug_handler]
pub async fn get_schedule(
    State(state): State<Arc<AppConfig>>,
    Path(schedule_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = ScheduleService::new(&state);
    let schedule = service.get_schedule(schedule_id, auth.token()).await?;
    Ok(Json(json!(schedule)))
}

#[axum::debug_handler]
pub async fn create_schedule(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    CurrentActor(actor): CurrentActor,
    Json(request): Json<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = ScheduleService::new(&state);
    let schedule = service.create_schedule(&actor, request, auth.token()).await?;
    Ok((StatusCode::CREATED, Json(json!(schedule))))
}

#[axum::debug_handler]
pub async fn update_schedule(
    State(state): State<Arc<AppConfig>>,
    Path(schedule_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    CurrentActor(actor): CurrentActor,
    Json(request): Json<UpdateScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ScheduleService::new(&state);
    let schedule = service.update_schedule(&actor, schedule_id, request, auth.token()).await?;
    Ok(Json(json!(schedule)))
}

#[axum::debug_handler]
pub async fn delete_schedule(
    State(state): State<Arc<AppConfig>>,
    Path(schedule_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    CurrentActor(actor): CurrentActor,
) -> Result<StatusCode, AppError> {
    let service = ScheduleService::new(&state);
    service.delete_schedule(&actor, schedule_id, auth.token()).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==============================================================================
// ADMIN HANDLERS (STRICT OVERLAP RULE)
// ==============================================================================

#[axum::debug_handler]
pub async fn admin_create_schedule(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    CurrentActor(actor): CurrentActor,
    Json(request): Json<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = ScheduleService::new(&state);
    let schedule = service.admin_create_schedule(&actor, request, auth.token()).await?;
    Ok((StatusCode::CREATED, Json(json!(schedule))))
}

#[axum::debug_handler]
pub async fn admin_update_schedule(
    State(state): State<Arc<AppConfig>>,
    Path(schedule_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    CurrentActor(actor): CurrentActor,
    Json(request): Json<UpdateScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ScheduleService::new(&state);
    let schedule = service.admin_update_schedule(&actor, schedule_id, request, auth.token()).await?;
    Ok(Json(json!(schedule)))
}
