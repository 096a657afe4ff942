mod common;

use axum::http::StatusCode;
use common::setup_test_app;
use lectern_models::UserRole;
use serde_json::json;

#[tokio::test]
async fn test_teacher_creates_studio_with_link() {
    let app = setup_test_app();
    let (teacher, token) = app.create_user("Host", UserRole::Teacher).await;

    let response = app
        .post("/api/studios", Some(&token), Some(json!({ "name": "Office hours" })))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.message(), "Studio created successfully");

    let code = response.body["studio"]["inviteCode"].as_str().unwrap();
    assert_eq!(code.len(), 10);
    assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(
        response.body["studioLink"],
        format!("http://localhost:5173/studio/{}", code)
    );
    assert_eq!(response.body["studio"]["hostId"], teacher.id.to_string());
}

#[tokio::test]
async fn test_student_joins_by_invite_code() {
    let app = setup_test_app();
    let (teacher, teacher_token) = app.create_user("Host", UserRole::Teacher).await;
    let (_, student_token) = app.create_user("Guest", UserRole::Student).await;

    let created = app
        .post(
            "/api/studios",
            Some(&teacher_token),
            Some(json!({ "name": "Review session" })),
        )
        .await;
    let code = created.body["studio"]["inviteCode"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .get(&format!("/api/studios/{}", code), Some(&student_token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["studio"]["name"], "Review session");
    assert_eq!(response.body["studio"]["host"]["name"], "Host");
    assert_eq!(response.body["studio"]["host"]["email"], teacher.email);

    let response = app
        .get(&format!("/api/studios/{}", code), Some(&teacher_token))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_studio_access_rules() {
    let app = setup_test_app();
    let (_, student_token) = app.create_user("Guest", UserRole::Student).await;

    let response = app
        .post(
            "/api/studios",
            Some(&student_token),
            Some(json!({ "name": "Not allowed" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .get("/api/studios/DOESNOTEXIST", Some(&student_token))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.message(), "Studio not found");

    let response = app.get("/api/studios/anything", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
