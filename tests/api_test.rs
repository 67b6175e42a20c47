//! End-to-end tests through the HTTP router.
//!
//! Requests go through `create_router` with a seeded in-memory database, so
//! the bearer middleware, the permission checks and the error bodies are
//! all exercised together.

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use school_api::api::{create_router, AppState};
use school_api::services::{AdminAccount, Seeder};

const ADMIN_PASSWORD: &str = "admin-password-123";

async fn app() -> Router {
    let test = common::empty().await;
    Seeder::new(test.uow.clone())
        .run(Some(AdminAccount {
            username: "admin".to_string(),
            email: "admin@example.com".to_string(),
            password: ADMIN_PASSWORD.to_string(),
        }))
        .await
        .unwrap();

    let state = AppState::from_config(test.database.clone(), &test.config).unwrap();
    create_router(state)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn login(app: &Router, identifier: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "identifier": identifier, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["access_token"].as_str().unwrap().to_string()
}

async fn register_student_account(app: &Router) -> String {
    let (status, _) = send(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "username": "andi",
            "email": "andi@example.com",
            "password": "andi-password-1",
            "full_name": "Andi Pratama"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    login(app, "andi", "andi-password-1").await
}

#[tokio::test]
async fn test_health_check() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "healthy");
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/students", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, _) = send(&app, Method::GET, "/students", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

fn student_body(nik: &str) -> Value {
    json!({
        "nisn": "0012345678",
        "full_name": "Andi Pratama",
        "gender": "MALE",
        "nik": nik,
        "no_kk": "3273000000000077"
    })
}

#[tokio::test]
async fn test_missing_permission_is_forbidden() {
    let app = app().await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;
    let (status, _) = send(
        &app,
        Method::POST,
        "/students",
        Some(&admin),
        Some(student_body("3273010101100009")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let token = register_student_account(&app).await;
    let (status, body) = send(&app, Method::GET, "/students", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
    assert!(!body.to_string().contains("3273010101100009"));

    let (status, _) = send(
        &app,
        Method::POST,
        "/students",
        Some(&token),
        Some(student_body("3273010101100001")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_registered_account_sees_only_linked_student() {
    let app = app().await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;
    let (_, own) = send(
        &app,
        Method::POST,
        "/students",
        Some(&admin),
        Some(student_body("3273010101100001")),
    )
    .await;
    let (_, other) = send(
        &app,
        Method::POST,
        "/students",
        Some(&admin),
        Some(json!({
            "nisn": "0099999999",
            "full_name": "Budi Santoso",
            "gender": "MALE",
            "nik": "3273010101100009"
        })),
    )
    .await;

    let token = register_student_account(&app).await;
    let (status, _) = send(&app, Method::GET, "/students/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, me) = send(&app, Method::GET, "/auth/me", Some(&token), None).await;
    let link = format!("/students/{}/user", own["id"].as_str().unwrap());
    let (status, _) = send(
        &app,
        Method::PUT,
        &link,
        Some(&admin),
        Some(json!({ "user_id": me["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/students/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nik"], "3273010101100001");

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/students/{}", other["id"].as_str().unwrap()),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_register_ignores_requested_roles() {
    let app = app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "username": "mallory",
            "email": "mallory@example.com",
            "password": "mallory-password-1",
            "full_name": "Mallory",
            "roles": ["admin"],
            "permissions": ["users.manage"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["roles"], json!(["student"]));

    let token = login(&app, "mallory", "mallory-password-1").await;
    let (_, me) = send(&app, Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(me["roles"], json!(["student"]));
    assert_eq!(me["permissions"], json!(["students.read_own"]));

    let (status, _) = send(&app, Method::GET, "/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_creates_student_with_decrypted_response() {
    let app = app().await;
    let token = login(&app, "admin", ADMIN_PASSWORD).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/students",
        Some(&token),
        Some(json!({
            "nisn": "0012345678",
            "full_name": "Andi Pratama",
            "gender": "MALE",
            "birth_date": "2010-01-01",
            "nik": "3273010101100001"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["nik"], "3273010101100001");
    assert_eq!(body["guardian"], Value::Null);

    let (status, body) = send(&app, Method::GET, "/students?per_page=5", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["meta"]["per_page"], 5);
}

#[tokio::test]
async fn test_guardian_type_must_be_known() {
    let app = app().await;
    let token = login(&app, "admin", ADMIN_PASSWORD).await;
    let (_, student) = send(
        &app,
        Method::POST,
        "/students",
        Some(&token),
        Some(json!({
            "nisn": "0012345678",
            "full_name": "Andi Pratama",
            "gender": "MALE",
            "nik": "3273010101100001"
        })),
    )
    .await;

    let uri = format!("/students/{}/guardian", student["id"].as_str().unwrap());
    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&token),
        Some(json!({
            "guardian_id": "00000000-0000-0000-0000-000000000001",
            "guardian_type": "teacher"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_logout_invalidates_bearer_token() {
    let app = app().await;
    let token = login(&app, "admin", ADMIN_PASSWORD).await;

    let (status, body) = send(&app, Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "admin");

    let (status, _) = send(&app, Method::POST, "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "TOKEN_REVOKED");
}

#[tokio::test]
async fn test_invalid_registration_body_is_rejected() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "username": "ab",
            "email": "not-an-email",
            "password": "short",
            "full_name": "X"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_user_may_update_only_own_profile() {
    let app = app().await;
    let token = register_student_account(&app).await;
    let (_, me) = send(&app, Method::GET, "/auth/me", Some(&token), None).await;
    let own = format!("/users/{}", me["id"].as_str().unwrap());

    let (status, body) = send(
        &app,
        Method::PUT,
        &own,
        Some(&token),
        Some(json!({ "full_name": "Andi P." })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["full_name"], "Andi P.");
    assert_eq!(body["email"], "andi@example.com");

    let admin_token = login(&app, "admin", ADMIN_PASSWORD).await;
    let (_, admin) = send(&app, Method::GET, "/auth/me", Some(&admin_token), None).await;
    let other = format!("/users/{}", admin["id"].as_str().unwrap());
    let (status, _) = send(
        &app,
        Method::PUT,
        &other,
        Some(&token),
        Some(json!({ "full_name": "Hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
