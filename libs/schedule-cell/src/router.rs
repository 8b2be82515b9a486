// libs/schedule-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn schedule_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/", post(handlers::create_schedule))
        .route(
            "/{schedule_id}",
            get(handlers::get_schedule)
                .patch(handlers::update_schedule)
                .delete(handlers::delete_schedule),
        )
        .route("/doctors/{doctor_id}", get(handlers::list_doctor_schedules))
        .route("/admin", post(handlers::admin_create_schedule))
        .route("/admin/{schedule_id}", patch(handlers::admin_update_schedule))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
