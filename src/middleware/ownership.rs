//! Course ownership guard.
//!
//! Every course-scoped mutation and every lesson read goes through
//! [`authorize_course`]. The guard reads the course once and decides on that
//! snapshot, so a caller that passes may still race a concurrent delete; the
//! store operations that follow report that as not found.

use lectern_core::AppError;
use lectern_db::DocumentStore;
use lectern_models::{Course, CourseId, Lesson, LessonId, UserRole};

use crate::metrics::track_authorization_denied;
use crate::middleware::auth::Principal;
use crate::security_event;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseAction {
    /// Edit or delete the course, or create, edit or delete its lessons.
    Mutate,
    /// List or fetch the course's lessons.
    ReadLessons,
}

/// Pure decision over a course snapshot.
pub fn is_permitted(principal: &Principal, course: &Course, action: CourseAction) -> bool {
    let is_owner = course.is_taught_by(principal.id);
    let is_admin = principal.role == UserRole::Admin;

    match action {
        CourseAction::Mutate => is_owner || is_admin,
        CourseAction::ReadLessons => is_owner || is_admin || course.has_student(principal.id),
    }
}

pub async fn authorize_course(
    store: &dyn DocumentStore,
    principal: &Principal,
    course_id: CourseId,
    action: CourseAction,
) -> Result<Course, AppError> {
    let course = store
        .find_course(course_id)
        .await?
        .ok_or_else(|| AppError::not_found("Course not found"))?;

    if !is_permitted(principal, &course, action) {
        security_event!(
            "authz.ownership_denied",
            user.id = %principal.id,
            course.id = %course_id,
            action = ?action,
            "Course access denied"
        );
        track_authorization_denied("ownership");
        return Err(AppError::forbidden("Unauthorized"));
    }

    Ok(course)
}

/// Authorizes against the course, then checks the lesson belongs to it.
///
/// A lesson under a different course is reported as not found, never as
/// forbidden.
pub async fn authorize_lesson(
    store: &dyn DocumentStore,
    principal: &Principal,
    course_id: CourseId,
    lesson_id: LessonId,
    action: CourseAction,
) -> Result<(Course, Lesson), AppError> {
    let course = authorize_course(store, principal, course_id, action).await?;

    let lesson = store
        .find_lesson(lesson_id)
        .await?
        .filter(|lesson| lesson.course_id == course_id)
        .ok_or_else(|| AppError::not_found("Lesson not found for this course"))?;

    Ok((course, lesson))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_core::ErrorKind;
    use lectern_db::{MemoryStore, StoreOp};
    use lectern_models::{CreateCourseDto, CreateLessonDto, UserId};

    fn course_for(teacher: UserId) -> Course {
        Course::new(
            teacher,
            CreateCourseDto {
                title: "Compilers".to_string(),
                description: "Parsing and codegen".to_string(),
                category: "cs".to_string(),
            },
        )
    }

    fn principal(role: UserRole) -> Principal {
        Principal {
            id: UserId::new(),
            role,
        }
    }

    #[test]
    fn test_decision_table() {
        let owner = principal(UserRole::Teacher);
        let other_teacher = principal(UserRole::Teacher);
        let admin = principal(UserRole::Admin);
        let student = principal(UserRole::Student);
        let outsider = principal(UserRole::Student);

        let mut course = course_for(owner.id);
        course.enrolled_student_ids.insert(student.id);

        assert!(is_permitted(&owner, &course, CourseAction::Mutate));
        assert!(is_permitted(&admin, &course, CourseAction::Mutate));
        assert!(!is_permitted(&other_teacher, &course, CourseAction::Mutate));
        assert!(!is_permitted(&student, &course, CourseAction::Mutate));

        assert!(is_permitted(&student, &course, CourseAction::ReadLessons));
        assert!(is_permitted(&owner, &course, CourseAction::ReadLessons));
        assert!(is_permitted(&admin, &course, CourseAction::ReadLessons));
        assert!(!is_permitted(&outsider, &course, CourseAction::ReadLessons));
        assert!(!is_permitted(&other_teacher, &course, CourseAction::ReadLessons));
    }

    #[tokio::test]
    async fn test_guard_reads_course_once() {
        let store = MemoryStore::new();
        let owner = principal(UserRole::Teacher);
        let course = course_for(owner.id);
        store.insert_course(&course).await.unwrap();

        authorize_course(&store, &owner, course.id, CourseAction::Mutate)
            .await
            .unwrap();
        assert_eq!(store.calls(StoreOp::FindCourse), 1);
    }

    #[tokio::test]
    async fn test_missing_course_is_not_found() {
        let store = MemoryStore::new();
        let err = authorize_course(
            &store,
            &principal(UserRole::Admin),
            CourseId::new(),
            CourseAction::Mutate,
        )
        .await
        .unwrap_err();
        assert!(err.is(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_store_failure_is_not_a_denial() {
        let store = MemoryStore::new();
        store.fail_next(StoreOp::FindCourse);
        let err = authorize_course(
            &store,
            &principal(UserRole::Admin),
            CourseId::new(),
            CourseAction::Mutate,
        )
        .await
        .unwrap_err();
        assert!(err.is(ErrorKind::Infrastructure));
    }

    #[tokio::test]
    async fn test_lesson_from_other_course_is_not_found() {
        let store = MemoryStore::new();
        let owner = principal(UserRole::Teacher);
        let course_a = course_for(owner.id);
        let course_b = course_for(owner.id);
        store.insert_course(&course_a).await.unwrap();
        store.insert_course(&course_b).await.unwrap();

        let lesson = Lesson::new(
            course_b.id,
            CreateLessonDto {
                title: "Lexing".to_string(),
                content: None,
                video_url: None,
                duration: None,
            },
        );
        store.insert_lesson(&lesson).await.unwrap();

        let err = authorize_lesson(
            &store,
            &owner,
            course_a.id,
            lesson.id,
            CourseAction::ReadLessons,
        )
        .await
        .unwrap_err();
        assert!(err.is(ErrorKind::NotFound));
        assert_eq!(err.public_message(), "Lesson not found for this course");
    }
}
