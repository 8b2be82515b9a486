use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use availability_cell::router::availability_routes;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

async fn send(uri: &str, config: &TestConfig, user: &TestUser) -> (StatusCode, Value) {
    let app = availability_routes(config.to_arc());
    let token = JwtTestUtils::create_test_token(user, &config.jwt_secret, None);

    let response = app
        .oneshot(
            Request::builder()
                .uri(uri)
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_visit_check_reports_doctor_busy_for_same_patient() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(mock_server.uri());
    let patient = TestUser::patient("patient@example.com");
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/visits"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .and(query_param("date", "eq.2030-01-07"))
        .and(query_param("start_time", "lt.11:30:00"))
        .and(query_param("end_time", "gt.10:30:00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::visit_row(
                Uuid::new_v4(), doctor_id, patient.id, "2030-01-07", "10:00:00", "11:00:00", "scheduled"
            )
        ])))
        .mount(&mock_server)
        .await;

    let uri = format!(
        "/doctors/{}/visit-check?date=2030-01-07&start_time=10:30:00&end_time=11:30:00",
        doctor_id
    );
    let (status, body) = send(&uri, &config, &patient).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], false);
    assert_eq!(body["code"], "doctor_busy");
    assert_eq!(body["details"]["conflicting_visit"]["start_time"], "10:00:00");
}

#[tokio::test]
async fn test_patient_cannot_check_visits_of_another_patient() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(mock_server.uri());
    let patient = TestUser::patient("patient@example.com");
    let other_patient = TestUser::patient("other@example.com");
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/visits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::visit_row(
                Uuid::new_v4(), doctor_id, other_patient.id, "2030-01-07", "10:00:00", "11:00:00", "scheduled"
            )
        ])))
        .mount(&mock_server)
        .await;

    let uri = format!(
        "/doctors/{}/visit-check?date=2030-01-07&start_time=10:30:00&end_time=11:30:00&patient_id={}",
        doctor_id, other_patient.id
    );
    let (status, body) = send(&uri, &config, &patient).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.get("details").is_none());
    assert!(!body.to_string().contains(&other_patient.id.to_string()));
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_staff_may_check_on_behalf_of_patient() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(mock_server.uri());
    let admin = TestUser::admin("admin@example.com");
    let patient = TestUser::patient("patient@example.com");
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/visits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::visit_row(
                Uuid::new_v4(), doctor_id, patient.id, "2030-01-07", "10:00:00", "11:00:00", "scheduled"
            )
        ])))
        .mount(&mock_server)
        .await;

    let uri = format!(
        "/doctors/{}/visit-check?date=2030-01-07&start_time=10:30:00&end_time=11:30:00&patient_id={}",
        doctor_id, patient.id
    );
    let (status, body) = send(&uri, &config, &admin).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], "doctor_busy");
}

#[tokio::test]
async fn test_visit_check_available_inside_schedule() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(mock_server.uri());
    let patient = TestUser::patient("patient@example.com");
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/visits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    // 2030-01-07 is a Monday.
    Mock::given(method("GET"))
        .and(path("/rest/v1/schedules"))
        .and(query_param("day_of_week", "eq.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::schedule_row(Uuid::new_v4(), doctor_id, 0, "09:00:00", "17:00:00")
        ])))
        .mount(&mock_server)
        .await;

    let uri = format!(
        "/doctors/{}/visit-check?date=2030-01-07&start_time=10:00:00&end_time=11:00:00&status=scheduled",
        doctor_id
    );
    let (status, body) = send(&uri, &config, &patient).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], true);
    assert!(body.get("code").is_none());
}

#[tokio::test]
async fn test_schedule_check_duplicate_day() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(mock_server.uri());
    let doctor = TestUser::doctor("doctor@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/schedules"))
        .and(query_param("doctor_id", format!("eq.{}", doctor.id)))
        .and(query_param("day_of_week", "eq.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::schedule_row(Uuid::new_v4(), doctor.id, 0, "09:00:00", "12:00:00")
        ])))
        .mount(&mock_server)
        .await;

    let uri = format!(
        "/doctors/{}/schedule-check?day_of_week=0&start_time=13:00:00&end_time=15:00:00",
        doctor.id
    );
    let (status, body) = send(&uri, &config, &doctor).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], false);
    assert_eq!(body["code"], "duplicate_schedule");

    let strict_uri = format!("{}&strict=true", uri);
    let (_, body) = send(&strict_uri, &config, &doctor).await;
    assert_eq!(body["available"], true);
}

#[tokio::test]
async fn test_store_failure_is_internal_error() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(mock_server.uri());
    let doctor = TestUser::doctor("doctor@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/schedules"))
        .respond_with(ResponseTemplate::new(500).set_body_string("db down"))
        .mount(&mock_server)
        .await;

    let uri = format!(
        "/doctors/{}/schedule-check?day_of_week=1&start_time=09:00:00&end_time=10:00:00",
        doctor.id
    );
    let (status, body) = send(&uri, &config, &doctor).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_check_requires_authentication() {
    let app = availability_routes(TestConfig::default().to_arc());
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/doctors/{}/schedule-check?day_of_week=1&start_time=09:00:00&end_time=10:00:00",
                    Uuid::new_v4()
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
