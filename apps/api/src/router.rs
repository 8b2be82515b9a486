use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use availability_cell::router::availability_routes;
use diagnosis_cell::router::diagnosis_routes;
use schedule_cell::router::schedule_routes;
use shared_config::AppConfig;
use user_cell::router::user_routes;
use visit_cell::router::visit_routes;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic API is running!" }))
        .nest("/availability", availability_routes(state.clone()))
        .nest("/schedules", schedule_routes(state.clone()))
        .nest("/visits", visit_routes(state.clone()))
        .nest("/diagnoses", diagnosis_routes(state.clone()))
        .nest("/users", user_routes(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::{Request, StatusCode}};
    use tower::ServiceExt;

    use shared_utils::test_utils::TestConfig;

    #[tokio::test]
    async fn test_root_is_public() {
        let app = create_router(TestConfig::default().to_arc());
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cells_are_nested_behind_auth() {
        let app = create_router(TestConfig::default().to_arc());
        for uri in ["/schedules/doctors/00000000-0000-0000-0000-000000000001", "/users/me"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }
}
