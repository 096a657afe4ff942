mod common;

use axum::http::StatusCode;
use common::setup_test_app;
use lectern_db::DocumentStore;
use lectern_models::UserRole;

#[tokio::test]
async fn test_dashboard_lists_courses_with_students() {
    let app = setup_test_app();
    let (teacher, teacher_token) = app.create_user("Teacher", UserRole::Teacher).await;
    let (other, _) = app.create_user("Other", UserRole::Teacher).await;
    let (student, student_token) = app.create_user("Student", UserRole::Student).await;
    let course = app.create_course(&teacher, "Mine", "general").await;
    app.create_course(&other, "Theirs", "general").await;

    app.post(
        &format!("/api/student/enroll/{}", course.id),
        Some(&student_token),
        None,
    )
    .await;

    let response = app.get("/api/teacher/getCourses", Some(&teacher_token)).await;
    assert_eq!(response.status, StatusCode::OK);

    let courses = response.body["courses"].as_array().unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0]["title"], "Mine");
    let students = courses[0]["enrolledStudents"].as_array().unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0]["id"], student.id.to_string());
    assert_eq!(students[0]["email"], student.email);
}

#[tokio::test]
async fn test_dashboard_repairs_created_mirror() {
    let app = setup_test_app();
    let (teacher, token) = app.create_user("Teacher", UserRole::Teacher).await;
    let course = app.create_course(&teacher, "Drifted", "general").await;
    app.store
        .remove_created_course(teacher.id, course.id)
        .await
        .unwrap();

    let response = app.get("/api/teacher/getCourses", Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["courses"].as_array().unwrap().len(), 1);
    assert!(
        app.stored_user(&teacher)
            .await
            .created_course_ids
            .contains(&course.id)
    );
}

#[tokio::test]
async fn test_dashboard_is_teacher_only() {
    let app = setup_test_app();
    let (_, student_token) = app.create_user("Student", UserRole::Student).await;
    let (_, admin_token) = app.create_user("Admin", UserRole::Admin).await;

    for token in [student_token, admin_token] {
        let response = app.get("/api/teacher/getCourses", Some(&token)).await;
        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert_eq!(response.message(), "Access denied. Not a teacher.");
    }
}
