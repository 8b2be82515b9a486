// libs/diagnosis-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn diagnosis_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route(
            "/patients/{patient_id}",
            get(handlers::list_patient_diagnoses).post(handlers::add_diagnosis),
        )
        .route("/{diagnosis_id}/status", patch(handlers::change_diagnosis_status))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
