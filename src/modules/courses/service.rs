use lectern_core::AppError;
use lectern_db::{DocumentStore, SetUpdate};
use lectern_models::{CourseId, UserRole};
use tracing::instrument;

use super::model::{Course, CourseListResponse, CreateCourseDto, PageParams, UpdateCourseDto};
use crate::metrics::track_course_deleted;
use crate::middleware::auth::Principal;
use crate::middleware::ownership::{CourseAction, authorize_course};
use crate::middleware::role::check_role;
use crate::modules::students::service::EnrollmentService;
use crate::{audit_event, reconcile_needed};

pub struct CourseService;

impl CourseService {
    #[instrument(skip(store))]
    pub async fn list_courses(
        store: &dyn DocumentStore,
        params: &PageParams,
        search: Option<&str>,
    ) -> Result<CourseListResponse, AppError> {
        let (courses, total) = store
            .list_courses(search, params.limit(), params.offset())
            .await?;

        Ok(CourseListResponse {
            courses,
            total,
            page: params.page(),
            total_pages: params.total_pages(total),
        })
    }

    #[instrument(skip(store))]
    pub async fn get_course(
        store: &dyn DocumentStore,
        course_id: CourseId,
    ) -> Result<Course, AppError> {
        store
            .find_course(course_id)
            .await?
            .ok_or_else(|| AppError::not_found("Course not found"))
    }

    /// Inserts the course, then records it on the teacher.
    ///
    /// The teacher-side write is best effort; the dashboard repairs it.
    #[instrument(skip(store, principal, dto), fields(teacher.id = %principal.id))]
    pub async fn create_course(
        store: &dyn DocumentStore,
        principal: &Principal,
        dto: CreateCourseDto,
    ) -> Result<Course, AppError> {
        check_role(principal, UserRole::Teacher, "Only teachers can create courses")?;

        let course = Course::new(principal.id, dto);
        store.insert_course(&course).await?;

        match store.add_created_course(principal.id, course.id).await {
            Ok(SetUpdate::Applied | SetUpdate::Unchanged) => {}
            Ok(SetUpdate::Missing) => reconcile_needed!(
                "user.created_course_ids",
                teacher_id = %principal.id,
                course_id = %course.id,
                "Teacher document missing after course insert"
            ),
            Err(e) => reconcile_needed!(
                "user.created_course_ids",
                teacher_id = %principal.id,
                course_id = %course.id,
                error = %e,
                "Created-course mirror write failed"
            ),
        }

        audit_event!("create", "course", course.id = %course.id, teacher.id = %principal.id, "Course created");

        Ok(course)
    }

    #[instrument(skip(store, principal, dto), fields(user.id = %principal.id))]
    pub async fn update_course(
        store: &dyn DocumentStore,
        principal: &Principal,
        course_id: CourseId,
        dto: UpdateCourseDto,
    ) -> Result<Course, AppError> {
        authorize_course(store, principal, course_id, CourseAction::Mutate).await?;

        let course = store
            .update_course(course_id, &dto)
            .await?
            .ok_or_else(|| AppError::not_found("Course not found"))?;

        audit_event!("update", "course", course.id = %course_id, user.id = %principal.id, "Course updated");

        Ok(course)
    }

    #[instrument(skip(store, principal), fields(user.id = %principal.id))]
    pub async fn delete_course(
        store: &dyn DocumentStore,
        principal: &Principal,
        course_id: CourseId,
    ) -> Result<(), AppError> {
        let course = authorize_course(store, principal, course_id, CourseAction::Mutate).await?;

        let lessons_removed = EnrollmentService::cascade_course_deletion(store, &course).await?;

        audit_event!(
            "delete",
            "course",
            course.id = %course_id,
            user.id = %principal.id,
            lessons_removed,
            "Course deleted"
        );
        track_course_deleted(lessons_removed);

        Ok(())
    }
}
