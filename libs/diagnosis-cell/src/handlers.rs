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

use crate::models::{AddDiagnosisRequest, DiagnosisStatusRequest};
use crate::services::DiagnosisService;

#[axum::debug_handler]
pub async fn add_diagnosis(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    CurrentActor(actor): CurrentActor,
    Json(request): Json<AddDiagnosisRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = DiagnosisService::new(&state);
    let diagnosis = service.add_diagnosis(&actor, patient_id, request, auth.token()).await?;
    Ok((StatusCode::CREATED, Json(json!(diagnosis))))
}

#[axum::debug_handler]
pub async fn list_patient_diagnoses(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<Value>, AppError> {
    let service = DiagnosisService::new(&state);
    let diagnoses = service.list_patient_diagnoses(&actor, patient_id, auth.token()).await?;

    Ok(Json(json!({
        "diagnoses": diagnoses,
        "total": diagnoses.len()
    })))
}

#[axum::debug_handler]
pub async fn change_diagnosis_status(
    State(state): State<Arc<AppConfig>>,
    Path(diagnosis_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    CurrentActor(actor): CurrentActor,
    Json(request): Json<DiagnosisStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let service = DiagnosisService::new(&state);
    let diagnosis = service
        .change_status(&actor, diagnosis_id, request.is_active, auth.token())
        .await?;
    Ok(Json(json!(diagnosis)))
}
