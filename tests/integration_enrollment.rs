mod common;

use axum::http::StatusCode;
use common::setup_test_app;
use lectern_db::{DocumentStore, StoreOp};
use lectern_models::UserRole;

#[tokio::test]
async fn test_enroll_conflict_unenroll_cycle() {
    let app = setup_test_app();
    let (teacher, _) = app.create_user("Teacher", UserRole::Teacher).await;
    let (student, token) = app.create_user("Student", UserRole::Student).await;
    let course = app.create_course(&teacher, "Rust 101", "programming").await;
    let enroll = format!("/api/student/enroll/{}", course.id);
    let unenroll = format!("/api/student/unenroll/{}", course.id);

    let response = app.post(&enroll, Some(&token), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.message(), "Enrolled successfully");

    let stored = app.stored_course(&course).await.unwrap();
    assert_eq!(stored.enrolled_student_ids.len(), 1);
    assert!(stored.enrolled_student_ids.contains(&student.id));
    assert!(
        app.stored_user(&student)
            .await
            .enrolled_course_ids
            .contains(&course.id)
    );

    let response = app.post(&enroll, Some(&token), None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["kind"], "conflict");
    assert_eq!(response.message(), "Already enrolled in this course");
    assert_eq!(
        app.stored_course(&course).await.unwrap().enrolled_student_ids.len(),
        1
    );

    let response = app.post(&unenroll, Some(&token), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.message(), "Unenrolled successfully");

    let response = app.post(&unenroll, Some(&token), None).await;
    assert_eq!(response.status, StatusCode::OK);

    assert!(
        app.stored_course(&course)
            .await
            .unwrap()
            .enrolled_student_ids
            .is_empty()
    );
    assert!(
        app.stored_user(&student)
            .await
            .enrolled_course_ids
            .is_empty()
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_double_enroll_admits_once() {
    let app = setup_test_app();
    let (teacher, _) = app.create_user("Teacher", UserRole::Teacher).await;
    let (student, token) = app.create_user("Student", UserRole::Student).await;
    let course = app.create_course(&teacher, "Concurrency", "programming").await;
    let uri = format!("/api/student/enroll/{}", course.id);

    let attempts: Vec<_> = (0..2)
        .map(|_| {
            let app = app.clone();
            let uri = uri.clone();
            let token = token.clone();
            tokio::spawn(async move { app.post(&uri, Some(&token), None).await.status })
        })
        .collect();

    let mut statuses = Vec::new();
    for attempt in attempts {
        statuses.push(attempt.await.unwrap());
    }
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::BAD_REQUEST]);

    let stored = app.stored_course(&course).await.unwrap();
    assert_eq!(stored.enrolled_student_ids.len(), 1);
    assert_eq!(
        app.stored_user(&student).await.enrolled_course_ids.len(),
        1
    );
}

#[tokio::test]
async fn test_failed_mirror_write_is_repaired_on_listing() {
    let app = setup_test_app();
    let (teacher, _) = app.create_user("Teacher", UserRole::Teacher).await;
    let (student, token) = app.create_user("Student", UserRole::Student).await;
    let course = app.create_course(&teacher, "Databases", "programming").await;

    app.store.fail_next(StoreOp::AddEnrolledCourse);
    let response = app
        .post(&format!("/api/student/enroll/{}", course.id), Some(&token), None)
        .await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.message(), "Service temporarily unavailable");

    assert!(
        app.stored_course(&course)
            .await
            .unwrap()
            .enrolled_student_ids
            .contains(&student.id)
    );
    assert!(
        app.stored_user(&student)
            .await
            .enrolled_course_ids
            .is_empty()
    );

    let response = app.get("/api/student/enrolledCourses", Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    let courses = response.body["courses"].as_array().unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0]["id"], course.id.to_string());

    assert!(
        app.stored_user(&student)
            .await
            .enrolled_course_ids
            .contains(&course.id)
    );
}

#[tokio::test]
async fn test_listing_drops_stale_mirror_entries() {
    let app = setup_test_app();
    let (teacher, _) = app.create_user("Teacher", UserRole::Teacher).await;
    let (student, token) = app.create_user("Student", UserRole::Student).await;
    let course = app.create_course(&teacher, "Compilers", "programming").await;

    app.store
        .add_enrolled_course(student.id, course.id)
        .await
        .unwrap();

    let response = app.get("/api/student/enrolledCourses", Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["courses"].as_array().unwrap().is_empty());
    assert!(
        app.stored_user(&student)
            .await
            .enrolled_course_ids
            .is_empty()
    );
}

#[tokio::test]
async fn test_enroll_requires_student_role() {
    let app = setup_test_app();
    let (teacher, teacher_token) = app.create_user("Teacher", UserRole::Teacher).await;
    let course = app.create_course(&teacher, "Algebra", "mathematics").await;

    let response = app
        .post(
            &format!("/api/student/enroll/{}", course.id),
            Some(&teacher_token),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.message(), "Access denied. Student role required.");
    assert!(
        app.stored_course(&course)
            .await
            .unwrap()
            .enrolled_student_ids
            .is_empty()
    );
}

#[tokio::test]
async fn test_enroll_unknown_course_is_not_found() {
    let app = setup_test_app();
    let (_, token) = app.create_user("Student", UserRole::Student).await;

    let response = app
        .post(
            &format!("/api/student/enroll/{}", uuid::Uuid::new_v4()),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.message(), "Course not found");
}

#[tokio::test]
async fn test_enroll_without_token_is_unauthorized() {
    let app = setup_test_app();
    let (teacher, _) = app.create_user("Teacher", UserRole::Teacher).await;
    let course = app.create_course(&teacher, "Physics", "science").await;

    let response = app
        .post(&format!("/api/student/enroll/{}", course.id), None, None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.store.calls(StoreOp::AddStudentToRoster), 0);
}

#[tokio::test]
async fn test_malformed_course_id_is_structured_not_found() {
    let app = setup_test_app();
    let (_, token) = app.create_user("Student", UserRole::Student).await;

    let response = app
        .post("/api/student/enroll/not-a-uuid", Some(&token), None)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["kind"], "not_found");
    assert!(!response.message().is_empty());
    assert_eq!(app.store.calls(StoreOp::AddStudentToRoster), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_enroll_and_unenroll_leave_documents_aligned() {
    let app = setup_test_app();
    let (teacher, _) = app.create_user("Teacher", UserRole::Teacher).await;
    let course = app.create_course(&teacher, "Races", "programming").await;

    for _ in 0..100 {
        let (student, token) = app.create_user("Student", UserRole::Student).await;

        let attempts: Vec<_> = ["enroll", "unenroll"]
            .into_iter()
            .map(|action| {
                let app = app.clone();
                let token = token.clone();
                let uri = format!("/api/student/{}/{}", action, course.id);
                tokio::spawn(async move { app.post(&uri, Some(&token), None).await.status })
            })
            .collect();
        for attempt in attempts {
            assert_eq!(attempt.await.unwrap(), StatusCode::OK);
        }

        let in_roster = app
            .stored_course(&course)
            .await
            .unwrap()
            .enrolled_student_ids
            .contains(&student.id);
        let in_mirror = app
            .stored_user(&student)
            .await
            .enrolled_course_ids
            .contains(&course.id);
        assert_eq!(in_roster, in_mirror);
    }
}
