//! Runs the enrollment flow against Postgres.
//!
//! Requires `DATABASE_URL`; run with `cargo test -- --ignored`.

mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use common::{build_request, generate_unique_email, send, test_state, token_for};
use lectern::router::init_router;
use lectern_db::{DocumentStore, PgStore};
use lectern_models::{Course, CreateCourseDto, User, UserRole};
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires Postgres"]
async fn test_enrollment_round_trip_on_postgres(pool: PgPool) {
    let store: Arc<dyn DocumentStore> = Arc::new(PgStore::new(pool));
    let state = test_state(store.clone());
    let router = init_router(state.clone());

    let teacher = User::new("Teacher", generate_unique_email(), None, UserRole::Teacher);
    let student = User::new("Student", generate_unique_email(), None, UserRole::Student);
    store.insert_user(&teacher).await.unwrap();
    store.insert_user(&student).await.unwrap();

    let course = Course::new(
        teacher.id,
        CreateCourseDto {
            title: "Postgres internals".to_string(),
            description: "MVCC and WAL".to_string(),
            category: "databases".to_string(),
        },
    );
    store.insert_course(&course).await.unwrap();

    let token = token_for(&state, &student, student.role);
    let uri = format!("/api/student/enroll/{}", course.id);
    let enroll = || build_request(Method::POST, &uri, Some(&token), None);

    let response = send(&router, enroll()).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = send(&router, enroll()).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let stored = store.find_course(course.id).await.unwrap().unwrap();
    assert!(stored.enrolled_student_ids.contains(&student.id));
    let stored = store.find_user(student.id).await.unwrap().unwrap();
    assert!(stored.enrolled_course_ids.contains(&course.id));

    let unenroll = format!("/api/student/unenroll/{}", course.id);
    let response = send(
        &router,
        build_request(Method::POST, &unenroll, Some(&token), None),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);

    let stored = store.find_course(course.id).await.unwrap().unwrap();
    assert!(stored.enrolled_student_ids.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires Postgres"]
async fn test_duplicate_email_is_rejected_by_store(pool: PgPool) {
    let store = PgStore::new(pool);
    let email = generate_unique_email();

    store
        .insert_user(&User::new("First", email.clone(), None, UserRole::Student))
        .await
        .unwrap();
    let err = store
        .insert_user(&User::new("Second", email, None, UserRole::Student))
        .await
        .unwrap_err();
    assert!(err.is_duplicate_key());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires Postgres"]
async fn test_linked_identity_round_trips_and_is_unique(pool: PgPool) {
    let store = PgStore::new(pool);
    let linked = User::linked(
        "Linked",
        generate_unique_email(),
        UserRole::Teacher,
        "google",
        "sub-9",
    );
    store.insert_user(&linked).await.unwrap();

    let found = store.find_user_by_oauth("google", "sub-9").await.unwrap().unwrap();
    assert_eq!(found.id, linked.id);
    assert!(found.password_hash.is_none());
    assert_eq!(found.oauth_provider.as_deref(), Some("google"));

    let err = store
        .insert_user(&User::linked(
            "Again",
            generate_unique_email(),
            UserRole::Student,
            "google",
            "sub-9",
        ))
        .await
        .unwrap_err();
    assert_eq!(err.duplicate_field(), Some("oauth_id"));

    // Password accounts leave both columns NULL and never collide.
    store
        .insert_user(&User::new("A", generate_unique_email(), None, UserRole::Student))
        .await
        .unwrap();
    store
        .insert_user(&User::new("B", generate_unique_email(), None, UserRole::Student))
        .await
        .unwrap();
}
