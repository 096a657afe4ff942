//! Lessons belong to exactly one course.
//!
//! `Lesson::course_id` is authoritative; `Course::lesson_ids` is an ordered
//! mirror kept for clients and repaired when a listing finds it out of step.

use lectern_core::AppError;
use lectern_db::{DocumentStore, SetUpdate};
use lectern_models::{Course, CourseId, LessonId};
use tracing::{instrument, warn};

use super::model::{CreateLessonDto, Lesson, UpdateLessonDto};
use crate::metrics::track_mirror_repair;
use crate::middleware::auth::Principal;
use crate::middleware::ownership::{CourseAction, authorize_course, authorize_lesson};
use crate::{audit_event, reconcile_needed};

/// Aligns `course.lesson_ids` with the lessons that reference the course.
async fn repair_lesson_ids(store: &dyn DocumentStore, course: &Course, lessons: &[Lesson]) {
    let mut added = 0;
    let mut removed = 0;

    for lesson in lessons {
        if course.lesson_ids.contains(&lesson.id) {
            continue;
        }
        match store.append_lesson(course.id, lesson.id).await {
            Ok(SetUpdate::Applied) => added += 1,
            Ok(_) => {}
            Err(e) => reconcile_needed!(
                "course.lesson_ids",
                course.id = %course.id,
                lesson.id = %lesson.id,
                error = %e,
                "Lesson id repair failed"
            ),
        }
    }

    for lesson_id in &course.lesson_ids {
        if lessons.iter().any(|lesson| lesson.id == *lesson_id) {
            continue;
        }
        match store.remove_lesson(course.id, *lesson_id).await {
            Ok(SetUpdate::Applied) => removed += 1,
            Ok(_) => {}
            Err(e) => reconcile_needed!(
                "course.lesson_ids",
                course.id = %course.id,
                lesson.id = %lesson_id,
                error = %e,
                "Stale lesson id removal failed"
            ),
        }
    }

    if added + removed > 0 {
        warn!(course.id = %course.id, added, removed, "Repaired course lesson ids");
    }
    track_mirror_repair("lesson_added", added);
    track_mirror_repair("lesson_removed", removed);
}

pub struct LessonService;

impl LessonService {
    #[instrument(skip(store, principal), fields(user.id = %principal.id))]
    pub async fn list_lessons(
        store: &dyn DocumentStore,
        principal: &Principal,
        course_id: CourseId,
    ) -> Result<Vec<Lesson>, AppError> {
        let course = authorize_course(store, principal, course_id, CourseAction::ReadLessons).await?;

        let lessons = store.lessons_for_course(course_id).await?;
        repair_lesson_ids(store, &course, &lessons).await;

        Ok(lessons)
    }

    #[instrument(skip(store, principal), fields(user.id = %principal.id))]
    pub async fn get_lesson(
        store: &dyn DocumentStore,
        principal: &Principal,
        course_id: CourseId,
        lesson_id: LessonId,
    ) -> Result<Lesson, AppError> {
        let (_, lesson) =
            authorize_lesson(store, principal, course_id, lesson_id, CourseAction::ReadLessons)
                .await?;
        Ok(lesson)
    }

    /// Inserts the lesson, then appends it to the course.
    ///
    /// If the course vanished in between, the lesson is removed again.
    #[instrument(skip(store, principal, dto), fields(user.id = %principal.id))]
    pub async fn create_lesson(
        store: &dyn DocumentStore,
        principal: &Principal,
        course_id: CourseId,
        dto: CreateLessonDto,
    ) -> Result<Lesson, AppError> {
        authorize_course(store, principal, course_id, CourseAction::Mutate).await?;

        let lesson = Lesson::new(course_id, dto);
        store.insert_lesson(&lesson).await?;

        match store.append_lesson(course_id, lesson.id).await {
            Ok(SetUpdate::Applied | SetUpdate::Unchanged) => {}
            Ok(SetUpdate::Missing) => {
                if let Err(e) = store.delete_lesson(lesson.id).await {
                    reconcile_needed!(
                        "lesson.course_id",
                        course.id = %course_id,
                        lesson.id = %lesson.id,
                        error = %e,
                        "Orphan lesson cleanup failed"
                    );
                }
                return Err(AppError::not_found("Course not found"));
            }
            Err(e) => reconcile_needed!(
                "course.lesson_ids",
                course.id = %course_id,
                lesson.id = %lesson.id,
                error = %e,
                "Lesson append failed"
            ),
        }

        audit_event!("create", "lesson", course.id = %course_id, lesson.id = %lesson.id, "Lesson created");

        Ok(lesson)
    }

    #[instrument(skip(store, principal, dto), fields(user.id = %principal.id))]
    pub async fn update_lesson(
        store: &dyn DocumentStore,
        principal: &Principal,
        course_id: CourseId,
        lesson_id: LessonId,
        dto: UpdateLessonDto,
    ) -> Result<Lesson, AppError> {
        authorize_lesson(store, principal, course_id, lesson_id, CourseAction::Mutate).await?;

        let lesson = store
            .update_lesson(lesson_id, &dto)
            .await?
            .ok_or_else(|| AppError::not_found("Lesson not found for this course"))?;

        audit_event!("update", "lesson", course.id = %course_id, lesson.id = %lesson_id, "Lesson updated");

        Ok(lesson)
    }

    #[instrument(skip(store, principal), fields(user.id = %principal.id))]
    pub async fn delete_lesson(
        store: &dyn DocumentStore,
        principal: &Principal,
        course_id: CourseId,
        lesson_id: LessonId,
    ) -> Result<(), AppError> {
        authorize_lesson(store, principal, course_id, lesson_id, CourseAction::Mutate).await?;

        if !store.delete_lesson(lesson_id).await? {
            return Err(AppError::not_found("Lesson not found for this course"));
        }

        if let Err(e) = store.remove_lesson(course_id, lesson_id).await {
            reconcile_needed!(
                "course.lesson_ids",
                course.id = %course_id,
                lesson.id = %lesson_id,
                error = %e,
                "Lesson id removal failed"
            );
        }

        audit_event!("delete", "lesson", course.id = %course_id, lesson.id = %lesson_id, "Lesson deleted");

        Ok(())
    }
}
