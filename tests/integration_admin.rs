mod common;

use axum::http::StatusCode;
use common::setup_test_app;
use lectern_models::UserRole;

#[tokio::test]
async fn test_admin_reconcile_repairs_drift() {
    let app = setup_test_app();
    let (_, admin_token) = app.create_user("Admin", UserRole::Admin).await;
    let (teacher, _) = app.create_user("Teacher", UserRole::Teacher).await;
    let (student, _) = app.create_user("Student", UserRole::Student).await;
    let course = app.create_course(&teacher, "Drifted", "general").await;
    app.store.edit_course(course.id, |c| {
        c.enrolled_student_ids.insert(student.id);
    });

    let response = app
        .post("/api/admin/reconcile", Some(&admin_token), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["usersChecked"], 3);
    assert_eq!(response.body["enrolledAdded"], 1);
    assert_eq!(response.body["failures"], 0);
    assert!(
        app.stored_user(&student)
            .await
            .enrolled_course_ids
            .contains(&course.id)
    );

    let response = app
        .post("/api/admin/reconcile", Some(&admin_token), None)
        .await;
    assert_eq!(response.body["enrolledAdded"], 0);
}

#[tokio::test]
async fn test_reconcile_requires_admin() {
    let app = setup_test_app();

    for role in [UserRole::Student, UserRole::Teacher] {
        let (_, token) = app.create_user("Member", role).await;
        let response = app.post("/api/admin/reconcile", Some(&token), None).await;
        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert_eq!(response.message(), "Access denied. Admin role required.");
    }

    let response = app.post("/api/admin/reconcile", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
