use std::time::Instant;

use fake::Fake;
use fake::faker::lorem::en::{Paragraph, Sentence, Word};
use fake::faker::name::en::Name;
use lectern_core::{AppError, hash_password};
use lectern_db::DocumentStore;
use lectern_models::{Course, CourseId, CreateCourseDto, CreateLessonDto, User, UserRole};
use rand::seq::SliceRandom;
use tracing::info;

use crate::middleware::auth::Principal;
use crate::modules::courses::service::CourseService;
use crate::modules::lessons::service::LessonService;
use crate::modules::students::service::EnrollmentService;

/// Password shared by every seeded account.
pub const SEED_PASSWORD: &str = "password123";

const CATEGORIES: &[&str] = &["programming", "design", "mathematics", "languages", "music"];

#[derive(Debug, Clone, Copy)]
pub struct SeedConfig {
    pub teachers: usize,
    pub courses_per_teacher: usize,
    pub lessons_per_course: usize,
    pub students: usize,
    pub enrollments_per_student: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            teachers: 3,
            courses_per_teacher: 2,
            lessons_per_course: 4,
            students: 20,
            enrollments_per_student: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub teachers: usize,
    pub students: usize,
    pub courses: usize,
    pub lessons: usize,
    pub enrollments: usize,
}

fn fake_user(prefix: &str, index: usize, password_hash: &str, role: UserRole) -> User {
    let name: String = Name().fake();
    let handle: String = Word().fake();
    let email = format!("{}{}.{}@lectern.test", prefix, index, handle);
    User::new(name, email, Some(password_hash.to_string()), role)
}

fn fake_course() -> CreateCourseDto {
    let category = CATEGORIES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("general");

    CreateCourseDto {
        title: Sentence(2..5).fake::<String>().trim_end_matches('.').to_string(),
        description: Paragraph(1..3).fake(),
        category: category.to_string(),
    }
}

fn fake_lesson(position: usize) -> CreateLessonDto {
    let topic: String = Sentence(2..4).fake();
    CreateLessonDto {
        title: format!("{}. {}", position, topic.trim_end_matches('.')),
        content: Some(Paragraph(2..5).fake()),
        video_url: None,
        duration: Some((5..60).fake()),
    }
}

async fn insert_users(
    store: &dyn DocumentStore,
    prefix: &str,
    count: usize,
    password_hash: &str,
    role: UserRole,
) -> Result<Vec<User>, AppError> {
    let mut users = Vec::with_capacity(count);
    for index in 0..count {
        let user = fake_user(prefix, index, password_hash, role);
        store.insert_user(&user).await?;
        users.push(user);
    }
    Ok(users)
}

/// Fills the store with fake teachers, courses, lessons and students.
///
/// Courses and lessons go through the same services as the API, and every
/// enrollment goes through [`EnrollmentService::enroll`], so the seeded data
/// has consistent mirrors.
pub async fn seed(
    store: &dyn DocumentStore,
    config: SeedConfig,
) -> Result<SeedSummary, AppError> {
    let start = Instant::now();
    let password_hash = hash_password(SEED_PASSWORD)?;
    let mut summary = SeedSummary::default();

    let teachers = insert_users(
        store,
        "teacher",
        config.teachers,
        &password_hash,
        UserRole::Teacher,
    )
    .await?;
    summary.teachers = teachers.len();

    let mut courses: Vec<Course> = Vec::new();
    for teacher in &teachers {
        let principal = Principal {
            id: teacher.id,
            role: teacher.role,
        };
        for _ in 0..config.courses_per_teacher {
            let course = CourseService::create_course(store, &principal, fake_course()).await?;
            for position in 1..=config.lessons_per_course {
                LessonService::create_lesson(store, &principal, course.id, fake_lesson(position))
                    .await?;
                summary.lessons += 1;
            }
            courses.push(course);
        }
    }
    summary.courses = courses.len();

    let students = insert_users(
        store,
        "student",
        config.students,
        &password_hash,
        UserRole::Student,
    )
    .await?;
    summary.students = students.len();

    let picks: Vec<(Principal, CourseId)> = {
        let mut rng = rand::thread_rng();
        students
            .iter()
            .flat_map(|student| {
                let principal = Principal {
                    id: student.id,
                    role: student.role,
                };
                courses
                    .choose_multiple(&mut rng, config.enrollments_per_student)
                    .map(move |course| (principal, course.id))
                    .collect::<Vec<_>>()
            })
            .collect()
    };

    for (principal, course_id) in picks {
        EnrollmentService::enroll(store, &principal, course_id).await?;
        summary.enrollments += 1;
    }

    info!(
        teachers = summary.teachers,
        students = summary.students,
        courses = summary.courses,
        lessons = summary.lessons,
        enrollments = summary.enrollments,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Seeding complete"
    );

    Ok(summary)
}
