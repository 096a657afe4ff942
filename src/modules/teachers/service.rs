use std::collections::{BTreeSet, HashMap};

use lectern_core::AppError;
use lectern_db::DocumentStore;
use lectern_models::{UserId, UserRole};
use tracing::instrument;

use super::model::{TeacherCourse, UserSummary};
use crate::middleware::auth::Principal;
use crate::middleware::role::check_role;
use crate::modules::students::service::EnrollmentService;

pub struct TeacherService;

impl TeacherService {
    /// Courses taught by the principal, each with its students resolved.
    ///
    /// Reads courses by `teacher_id` and repairs the teacher's
    /// `created_course_ids` on the way. Roster ids with no user document are
    /// skipped.
    #[instrument(skip(store, principal), fields(teacher.id = %principal.id))]
    pub async fn dashboard(
        store: &dyn DocumentStore,
        principal: &Principal,
    ) -> Result<Vec<TeacherCourse>, AppError> {
        check_role(principal, UserRole::Teacher, "Access denied. Not a teacher.")?;

        let teacher = store
            .find_user(principal.id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Not authorized"))?;

        let courses = store.courses_by_teacher(principal.id).await?;
        EnrollmentService::repair_created_courses(store, &teacher, &courses).await;

        let student_ids: Vec<UserId> = courses
            .iter()
            .flat_map(|course| course.enrolled_student_ids.iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let students: HashMap<UserId, UserSummary> = if student_ids.is_empty() {
            HashMap::new()
        } else {
            store
                .find_users(&student_ids)
                .await?
                .iter()
                .map(|user| (user.id, UserSummary::from(user)))
                .collect()
        };

        Ok(courses
            .into_iter()
            .map(|course| {
                let enrolled_students = course
                    .enrolled_student_ids
                    .iter()
                    .filter_map(|id| students.get(id).cloned())
                    .collect();
                TeacherCourse {
                    course,
                    enrolled_students,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_db::MemoryStore;
    use lectern_models::{Course, CreateCourseDto, User};

    #[tokio::test]
    async fn test_dashboard_resolves_students_and_repairs_mirror() {
        let store = MemoryStore::new();
        let teacher = User::new("Tess", "tess@x.io", None, UserRole::Teacher);
        let student = User::new("Stu", "stu@x.io", None, UserRole::Student);
        store.insert_user(&teacher).await.unwrap();
        store.insert_user(&student).await.unwrap();

        let course = Course::new(
            teacher.id,
            CreateCourseDto {
                title: "Graphics".to_string(),
                description: "Rasterization".to_string(),
                category: "cs".to_string(),
            },
        );
        store.insert_course(&course).await.unwrap();
        store.add_student_to_roster(course.id, student.id).await.unwrap();
        store.add_student_to_roster(course.id, UserId::new()).await.unwrap();

        let principal = Principal {
            id: teacher.id,
            role: UserRole::Teacher,
        };
        let dashboard = TeacherService::dashboard(&store, &principal).await.unwrap();

        assert_eq!(dashboard.len(), 1);
        assert_eq!(dashboard[0].enrolled_students.len(), 1);
        assert_eq!(dashboard[0].enrolled_students[0].email, "stu@x.io");

        let doc = store.find_user(teacher.id).await.unwrap().unwrap();
        assert!(doc.created_course_ids.contains(&course.id));
    }
}
