mod common;

use std::sync::Arc;

use aula::{api::create_app, config::Settings};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> anyhow::Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };

    Ok((status, value))
}

async fn register(app: &Router, name: &str, role: &str) -> anyhow::Result<String> {
    let (status, body) = send(app, Method::POST, "/auth/register", None, Some(json!({
        "email": format!("{}@example.com", name),
        "username": name,
        "full_name": format!("{} Test", name),
        "password": "password123",
        "role": role,
    }))).await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    Ok(body["token"].as_str().unwrap_or_default().to_string())
}

async fn test_app() -> anyhow::Result<Router> {
    let ctx = common::test_context().await?;
    Ok(create_app(ctx, Arc::new(Settings::default())))
}

#[tokio::test]
async fn test_health_and_auth_required() -> anyhow::Result<()> {
    let app = test_app().await?;

    let (status, body) = send(&app, Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/api/vouchers", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");

    let (status, _) = send(&app, Method::GET, "/api/vouchers", Some("not-a-session"), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn test_voucher_flow_over_http() -> anyhow::Result<()> {
    let app = test_app().await?;
    let teacher = register(&app, "profe", "teacher").await?;
    let student = register(&app, "alumno", "student").await?;

    let (status, course) = send(&app, Method::POST, "/api/courses", Some(&teacher), Some(json!({
        "title": "Excel avanzado",
        "is_paid": true,
        "price_cents": 5000,
    }))).await?;
    assert_eq!(status, StatusCode::CREATED, "{}", course);
    let course_id = course["id"].as_str().unwrap_or_default().to_string();

    let (status, enrollment) = send(&app, Method::POST, &format!("/api/courses/{}/enroll", course_id), Some(&student), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(enrollment["is_approved"], false);

    let (status, body) = send(&app, Method::POST, &format!("/api/courses/{}/enroll", course_id), Some(&student), None).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "duplicate_enrollment");

    let (status, voucher) = send(&app, Method::POST, "/api/vouchers", Some(&student), Some(json!({
        "course_id": course_id,
        "voucher_image": "/uploads/images/yape.jpg",
    }))).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(voucher["status"], "pending");
    let voucher_id = voucher["id"].as_str().unwrap_or_default().to_string();

    let (status, notifications) = send(&app, Method::GET, "/api/notifications", Some(&teacher), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(notifications["pending_review_count"], 1);

    let (status, body) = send(&app, Method::POST, &format!("/api/vouchers/{}/approve", voucher_id), Some(&student), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "not_owner");

    let (status, approved) = send(&app, Method::POST, &format!("/api/vouchers/{}/approve", voucher_id), Some(&teacher), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");

    let (status, body) = send(&app, Method::POST, &format!("/api/vouchers/{}/reject", voucher_id), Some(&teacher), Some(json!({
        "notes": "tarde",
    }))).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "already_reviewed");

    let (status, state) = send(&app, Method::GET, &format!("/api/courses/{}/enrollment", course_id), Some(&student), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["enrolled"], true);
    assert_eq!(state["approved"], true);
    assert_eq!(state["state"], "voucher_approved");

    let (_, notifications) = send(&app, Method::GET, "/api/notifications", Some(&student), None).await?;
    assert_eq!(notifications["unseen_decisions"].as_array().map(Vec::len), Some(1));

    let (status, _) = send(&app, Method::POST, &format!("/api/vouchers/{}/mark_as_seen", voucher_id), Some(&student), None).await?;
    assert_eq!(status, StatusCode::OK);

    let (_, notifications) = send(&app, Method::GET, "/api/notifications", Some(&student), None).await?;
    assert_eq!(notifications["unseen_decisions"].as_array().map(Vec::len), Some(0));

    Ok(())
}

#[tokio::test]
async fn test_submit_without_enrollment_is_bad_request() -> anyhow::Result<()> {
    let app = test_app().await?;
    let teacher = register(&app, "profe", "teacher").await?;
    let student = register(&app, "alumno", "student").await?;

    let (_, course) = send(&app, Method::POST, "/api/courses", Some(&teacher), Some(json!({
        "title": "SQL",
        "is_paid": true,
        "price_cents": 3000,
    }))).await?;

    let (status, body) = send(&app, Method::POST, "/api/vouchers", Some(&student), Some(json!({
        "course_id": course["id"],
        "voucher_image": "/uploads/images/plin.png",
    }))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "no_active_enrollment");

    Ok(())
}

#[tokio::test]
async fn test_unenroll_over_http() -> anyhow::Result<()> {
    let app = test_app().await?;
    let teacher = register(&app, "profe", "teacher").await?;
    let other = register(&app, "intruso", "teacher").await?;
    let student = register(&app, "alumno", "student").await?;

    let (_, course) = send(&app, Method::POST, "/api/courses", Some(&teacher), Some(json!({
        "title": "Gratis",
    }))).await?;
    let course_id = course["id"].as_str().unwrap_or_default().to_string();

    let (_, enrollment) = send(&app, Method::POST, &format!("/api/courses/{}/enroll", course_id), Some(&student), None).await?;
    assert_eq!(enrollment["is_approved"], true);
    let enrollment_id = enrollment["id"].as_str().unwrap_or_default().to_string();

    let (status, body) = send(&app, Method::DELETE, &format!("/api/enrollments/{}", enrollment_id), Some(&other), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "not_owner");

    let (status, _) = send(&app, Method::DELETE, &format!("/api/enrollments/{}", enrollment_id), Some(&teacher), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, state) = send(&app, Method::GET, &format!("/api/courses/{}/enrollment", course_id), Some(&student), None).await?;
    assert_eq!(state["state"], "not_enrolled");

    Ok(())
}

#[tokio::test]
async fn test_truncated_multipart_is_bad_request() -> anyhow::Result<()> {
    let app = test_app().await?;
    let teacher = register(&app, "profe", "teacher").await?;

    // The body ends inside the `type` field, before its closing boundary
    let boundary = "AulaBoundary";
    let body = format!(
        "--{}\r\nContent-Disposition: form-data; name=\"type\"\r\n\r\nimag",
        boundary
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/upload")
        .header(header::AUTHORIZATION, format!("Bearer {}", teacher))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
        .body(Body::from(body))?;

    let response = app.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_prices_carry_cents_and_decimal() -> anyhow::Result<()> {
    let app = test_app().await?;
    let teacher = register(&app, "profe", "teacher").await?;

    let (status, course) = send(&app, Method::POST, "/api/courses", Some(&teacher), Some(json!({
        "title": "Power BI",
        "is_paid": true,
        "price_cents": 4990,
    }))).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(course["price_cents"], 4990);
    assert_eq!(course["price"], "49.90");

    let (_, info) = send(&app, Method::GET, "/api", None, None).await?;
    assert!(info["pricing"].as_str().unwrap_or_default().contains("cents"));

    Ok(())
}

#[tokio::test]
async fn test_user_management_over_http() -> anyhow::Result<()> {
    let app = test_app().await?;
    let teacher = register(&app, "profe", "teacher").await?;
    let student = register(&app, "alumno", "student").await?;
    register(&app, "alumna", "student").await?;

    let (status, students) = send(&app, Method::GET, "/api/users?role=student", Some(&teacher), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(students.as_array().map(Vec::len), Some(2));

    let (status, _) = send(&app, Method::GET, "/api/users", Some(&student), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, me) = send(&app, Method::GET, "/api/profile", Some(&teacher), None).await?;
    let my_id = me["id"].as_str().unwrap_or_default().to_string();
    let (status, body) = send(&app, Method::DELETE, &format!("/api/users/{}", my_id), Some(&teacher), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");

    let student_id = students[0]["id"].as_str().unwrap_or_default().to_string();
    let (status, patched) = send(&app, Method::PATCH, &format!("/api/users/{}", student_id), Some(&teacher), Some(json!({
        "phone": "999888777",
    }))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["phone"], "999888777");

    let (status, _) = send(&app, Method::DELETE, &format!("/api/users/{}", student_id), Some(&teacher), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, remaining) = send(&app, Method::GET, "/api/users?role=student", Some(&teacher), None).await?;
    assert_eq!(remaining.as_array().map(Vec::len), Some(1));

    Ok(())
}

#[tokio::test]
async fn test_progress_and_password_reset_routes() -> anyhow::Result<()> {
    let app = test_app().await?;
    let teacher = register(&app, "profe", "teacher").await?;
    let student = register(&app, "alumno", "student").await?;

    let (_, course) = send(&app, Method::POST, "/api/courses", Some(&teacher), Some(json!({
        "title": "Gratis",
    }))).await?;
    let (status, lesson) = send(&app, Method::POST, "/api/lessons", Some(&teacher), Some(json!({
        "course_id": course["id"],
        "title": "Uno",
    }))).await?;
    assert_eq!(status, StatusCode::CREATED, "{}", lesson);
    let lesson_id = lesson["id"].as_str().unwrap_or_default().to_string();

    let (_, enrollment) = send(&app, Method::POST, &format!("/api/courses/{}/enroll", course["id"].as_str().unwrap_or_default()), Some(&student), None).await?;
    let (status, _) = send(&app, Method::POST, &format!("/api/lessons/{}/progress", lesson_id), Some(&student), Some(json!({
        "watched_duration": 42,
    }))).await?;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/api/progress?enrollment={}", enrollment["id"].as_str().unwrap_or_default());
    let (status, rows) = send(&app, Method::GET, &uri, Some(&teacher), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows.as_array().map(Vec::len), Some(1));
    assert_eq!(rows[0]["watched_duration"], 42);

    let (status, body) = send(&app, Method::POST, "/auth/password-reset/request", None, Some(json!({
        "email": "nadie@example.com",
    }))).await?;
    assert_eq!(status, StatusCode::NOT_FOUND, "{}", body);

    let (status, _) = send(&app, Method::POST, "/auth/password-reset/request", None, Some(json!({
        "email": "alumno@example.com",
    }))).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::POST, "/auth/password-reset/confirm", None, Some(json!({
        "email": "alumno@example.com",
        "code": "abcdef",
        "new_password": "nueva-clave-1",
    }))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

    Ok(())
}
