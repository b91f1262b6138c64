//! HTTP-level tests: login, guarded routes, and session lifecycle through
//! the full router.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use gymops_config::AppConfig;
use gymops_database::MIGRATOR;
use gymops_gateway::{create_router, GatewayState};
use gymops_identity::CreateUser;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

async fn setup() -> (Router, GatewayState, tempfile::TempDir) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    MIGRATOR.run(&pool).await.unwrap();

    let media_root = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.storage.media_root = media_root.path().to_string_lossy().into_owned();

    let state = GatewayState::new(pool, &config);
    (create_router(state.clone()), state, media_root)
}

async fn seed_user(state: &GatewayState) {
    state
        .user_service
        .create(CreateUser {
            phone_number: "09123456789".to_string(),
            national_code: "0012345678".to_string(),
            first_name: "Sara".to_string(),
            last_name: "Ahmadi".to_string(),
            password: "pass123".to_string(),
        })
        .await
        .unwrap();
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn login_request() -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .header("IP-Address", "10.0.0.1")
        .header("Device", "firefox")
        .body(Body::from(
            r#"{"phone_number":"09123456789","password":"pass123"}"#,
        ))
        .unwrap()
}

async fn login(router: &Router) -> Value {
    let response = router.clone().oneshot(login_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

#[tokio::test]
async fn login_returns_session_and_token() {
    let (router, state, _guard) = setup().await;
    seed_user(&state).await;

    let body = login(&router).await;
    assert_eq!(body["ip_address"], "10.0.0.1");
    assert_eq!(body["device"], "firefox");
    assert_eq!(body["status"], "active");
    assert!(body["access_token"].as_str().unwrap().contains('.'));
}

#[tokio::test]
async fn wrong_password_is_a_generic_400() {
    let (router, state, _guard) = setup().await;
    seed_user(&state).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .header("IP-Address", "10.0.0.1")
        .header("Device", "firefox")
        .body(Body::from(
            r#"{"phone_number":"09123456789","password":"nope"}"#,
        ))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid username or password.");
}

#[tokio::test]
async fn guarded_route_requires_a_token() {
    let (router, _state, _guard) = setup().await;

    let request = Request::builder()
        .uri("/api/auth/profile")
        .header("IP-Address", "10.0.0.1")
        .header("Device", "firefox")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_round_trip_with_token() {
    let (router, state, _guard) = setup().await;
    seed_user(&state).await;

    let login_body = login(&router).await;
    let token = login_body["access_token"].as_str().unwrap();

    let request = Request::builder()
        .uri("/api/auth/profile")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header("IP-Address", "10.0.0.1")
        .header("Device", "firefox")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["first_name"], "Sara");
    assert_eq!(body["phone_number"], "09123456789");
    assert_eq!(body["avatar_web_path"], "/default/avatar.jpg");
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let (router, state, _guard) = setup().await;
    seed_user(&state).await;

    let login_body = login(&router).await;
    let token = login_body["access_token"].as_str().unwrap().to_string();

    let logout = Request::builder()
        .method("POST")
        .uri("/api/auth/logout")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header("IP-Address", "10.0.0.1")
        .header("Device", "firefox")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(logout).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let profile = Request::builder()
        .uri("/api/auth/profile")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header("IP-Address", "10.0.0.1")
        .header("Device", "firefox")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(profile).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Session is not active.");
}

#[tokio::test]
async fn sessions_endpoint_flags_the_current_session() {
    let (router, state, _guard) = setup().await;
    seed_user(&state).await;

    // Two sessions from different devices; the token belongs to the second.
    let first = login(&router).await;
    let second_request = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .header("IP-Address", "10.0.0.2")
        .header("Device", "chrome")
        .body(Body::from(
            r#"{"phone_number":"09123456789","password":"pass123"}"#,
        ))
        .unwrap();
    let response = router.clone().oneshot(second_request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let second = body_json(response).await;
    assert_ne!(first["session_id"], second["session_id"]);

    let token = second["access_token"].as_str().unwrap();
    let request = Request::builder()
        .uri("/api/auth/sessions")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header("IP-Address", "10.0.0.2")
        .header("Device", "chrome")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let sessions = body_json(response).await;
    let sessions = sessions.as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    for session in sessions {
        let is_current = session["session_id"] == second["session_id"];
        assert_eq!(session["is_current_session"], Value::Bool(is_current));
    }
}

#[tokio::test]
async fn admin_routes_manage_roles_behind_the_guard() {
    let (router, state, _guard) = setup().await;
    seed_user(&state).await;
    state
        .role_service
        .create_role("trainer", "Gym Trainer")
        .await
        .unwrap();

    let login_body = login(&router).await;
    let token = login_body["access_token"].as_str().unwrap();
    let user_id = login_body["user_id"].as_str().unwrap();

    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/users/{user_id}/roles"))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .header("IP-Address", "10.0.0.1")
        .header("Device", "firefox")
        .body(Body::from(r#"{"roles":["trainer"]}"#))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["role_ids"].as_array().unwrap().len(), 1);

    // Unknown role names 400 with the offending name.
    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/users/{user_id}/roles"))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .header("IP-Address", "10.0.0.1")
        .header("Device", "firefox")
        .body(Body::from(r#"{"roles":["ghost"]}"#))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Role 'Ghost' does not exist.");
}
