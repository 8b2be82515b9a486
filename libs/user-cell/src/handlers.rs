use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::UserLevel;
use shared_models::error::AppError;
use shared_utils::extractor::CurrentActor;

use crate::models::{
    AdminUpdateUserRequest, DoctorSearchQuery, RegisterRequest, SpecializationRequest,
    VerifyDoctorsRequest,
};
use crate::services::UserService;

#[axum::debug_handler]
pub async fn register(
    State(state): State<Arc<AppConfig>>,
    Path(role): Path<String>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let level: UserLevel = role
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid role '{}'", role)))?;

    let service = UserService::new(&state);
    let user = service.register(level, request).await?;
    Ok((StatusCode::CREATED, Json(json!(user))))
}

#[axum::debug_handler]
pub async fn get_me(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<Value>, AppError> {
    let service = UserService::new(&state);
    let user = service.get_user(actor.id, auth.token()).await?;
    Ok(Json(json!(user)))
}

#[axum::debug_handler]
pub async fn search_doctors(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<DoctorSearchQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = UserService::new(&state);
    let doctors = service.search_doctors(query, auth.token()).await?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn update_specialization(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    CurrentActor(actor): CurrentActor,
    Json(request): Json<SpecializationRequest>,
) -> Result<Json<Value>, AppError> {
    let service = UserService::new(&state);
    let specialization = service
        .update_specialization(&actor, doctor_id, request, auth.token())
        .await?;
    Ok(Json(json!(specialization)))
}

#[axum::debug_handler]
pub async fn list_users(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<Value>, AppError> {
    let service = UserService::new(&state);
    let users = service.list_users(&actor, auth.token()).await?;

    Ok(Json(json!({
        "users": users,
        "total": users.len()
    })))
}

#[axum::debug_handler]
pub async fn get_field_policy(
    State(state): State<Arc<AppConfig>>,
    Path(user_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<Value>, AppError> {
    let service = UserService::new(&state);
    let policy = service.field_policy(&actor, user_id, auth.token()).await?;
    Ok(Json(json!(policy)))
}

#[axum::debug_handler]
pub async fn admin_update_user(
    State(state): State<Arc<AppConfig>>,
    Path(user_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    CurrentActor(actor): CurrentActor,
    Json(request): Json<AdminUpdateUserRequest>,
) -> Result<Json<Value>, AppError> {
    let service = UserService::new(&state);
    let user = service
        .admin_update_user(&actor, user_id, request, auth.token())
        .await?;
    Ok(Json(json!(user)))
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<Arc<AppConfig>>,
    Path(user_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    CurrentActor(actor): CurrentActor,
) -> Result<StatusCode, AppError> {
    let service = UserService::new(&state);
    service.delete_user(&actor, user_id, auth.token()).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn verify_doctors(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    CurrentActor(actor): CurrentActor,
    Json(request): Json<VerifyDoctorsRequest>,
) -> Result<Json<Value>, AppError> {
    let service = UserService::new(&state);
    let doctors = service.verify_doctors(&actor, request, auth.token()).await?;

    Ok(Json(json!({
        "doctors": doctors,
        "updated": doctors.len()
    })))
}
