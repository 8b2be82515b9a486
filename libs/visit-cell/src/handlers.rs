use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use chrono::Local;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;
use shared_utils::extractor::CurrentActor;

use crate::models::{BookVisitRequest, CreateVisitRequest, UpdateVisitRequest, VisitListQuery};
use crate::services::VisitService;

#[axum::debug_handler]
pub async fn create_visit(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    CurrentActor(actor): CurrentActor,
    Json(request): Json<CreateVisitRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = VisitService::new(&state);
    let now = Local::now().naive_local();
    let visit = service.create_visit(&actor, request, now, auth.token()).await?;
    Ok((StatusCode::CREATED, Json(json!(visit))))
}

#[axum::debug_handler]
pub async fn book_visit(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    CurrentActor(actor): CurrentActor,
    Json(request): Json<BookVisitRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = VisitService::new(&state);
    let now = Local::now().naive_local();
    let visit = service.book_visit(&actor, doctor_id, request, now, auth.token()).await?;
    Ok((StatusCode::CREATED, Json(json!(visit))))
}

#[axum::debug_handler]
pub async fn get_visit(
    State(state): State<Arc<AppConfig>>,
    Path(visit_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<Value>, AppError> {
    let service = VisitService::new(&state);
    let visit = service.get_visit_for(&actor, visit_id, auth.token()).await?;
    Ok(Json(json!(visit)))
}

#[axum::debug_handler]
pub async fn update_visit(
    State(state): State<Arc<AppConfig>>,
    Path(visit_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    CurrentActor(actor): CurrentActor,
    Json(request): Json<UpdateVisitRequest>,
) -> Result<Json<Value>, AppError> {
    let service = VisitService::new(&state);
    let now = Local::now().naive_local();
    let visit = service.update_visit(&actor, visit_id, request, now, auth.token()).await?;
    Ok(Json(json!(visit)))
}

#[axum::debug_handler]
pub async fn delete_visit(
    State(state): State<Arc<AppConfig>>,
    Path(visit_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    CurrentActor(actor): CurrentActor,
) -> Result<StatusCode, AppError> {
    let service = VisitService::new(&state);
    service.delete_visit(&actor, visit_id, auth.token()).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn list_doctor_visits(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<VisitListQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<Value>, AppError> {
    let service = VisitService::new(&state);
    let upcoming_after = query.upcoming.then(|| Local::now().date_naive());
    let visits = service.list_doctor_visits(&actor, doctor_id, upcoming_after, auth.token()).await?;

    Ok(Json(json!({
        "visits": visits,
        "total": visits.len()
    })))
}

#[axum::debug_handler]
pub async fn list_patient_visits(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<Value>, AppError> {
    let service = VisitService::new(&state);
    let visits = service.list_patient_visits(&actor, patient_id, auth.token()).await?;

    Ok(Json(json!({
        "visits": visits,
        "total": visits.len()
    })))
}
