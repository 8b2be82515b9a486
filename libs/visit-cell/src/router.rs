// libs/visit-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn visit_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/", post(handlers::create_visit))
        .route(
            "/{visit_id}",
            get(handlers::get_visit)
                .patch(handlers::update_visit)
                .delete(handlers::delete_visit),
        )
        // Patient booking
        .route("/doctors/{doctor_id}/book", post(handlers::book_visit))
        // Listings
        .route("/doctors/{doctor_id}", get(handlers::list_doctor_visits))
        .route("/patients/{patient_id}", get(handlers::list_patient_visits))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
