// libs/user-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn user_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/register/{role}", post(handlers::register));

    let protected_routes = Router::new()
        .route("/me", get(handlers::get_me))
        .route("/doctors/search", get(handlers::search_doctors))
        .route("/doctors/{doctor_id}/specialization", put(handlers::update_specialization))
        .route("/admin", get(handlers::list_users))
        .route("/admin/doctors/verify", post(handlers::verify_doctors))
        .route(
            "/admin/{user_id}",
            patch(handlers::admin_update_user).delete(handlers::delete_user),
        )
        .route("/admin/{user_id}/policy", get(handlers::get_field_policy))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
