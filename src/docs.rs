use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use lectern_core::{ErrorKind, ErrorResponse};
use lectern_models::{
    AuthResponse, Course, CourseListResponse, CourseMessageResponse, CoursesResponse,
    CreateCourseDto, CreateLessonDto, CreateStudioDto, CreateStudioResponse, GoogleLoginRequest,
    Lesson,
    LessonMessageResponse, LessonResponse, LessonsResponse, LoginRequest, MessageResponse,
    RegisterRequest, Studio, StudioResponse, StudioWithHost, TeacherCourse,
    TeacherCoursesResponse, UpdateCourseDto, UpdateLessonDto, User, UserRole, UserSummary,
    VerifyRequest, VerifyResponse,
};

use crate::modules::students::model::ReconcileReport;
use crate::router::HealthResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::router::health_check,
        crate::modules::auth::controller::register_user,
        crate::modules::auth::controller::login_user,
        crate::modules::auth::controller::google_login,
        crate::modules::auth::controller::logout_user,
        crate::modules::auth::controller::verify_user,
        crate::modules::courses::controller::list_courses,
        crate::modules::courses::controller::get_course,
        crate::modules::courses::controller::create_course,
        crate::modules::courses::controller::update_course,
        crate::modules::courses::controller::delete_course,
        crate::modules::lessons::controller::list_lessons,
        crate::modules::lessons::controller::get_lesson,
        crate::modules::lessons::controller::create_lesson,
        crate::modules::lessons::controller::update_lesson,
        crate::modules::lessons::controller::delete_lesson,
        crate::modules::students::controller::enroll_in_course,
        crate::modules::students::controller::unenroll_from_course,
        crate::modules::students::controller::enrolled_courses,
        crate::modules::teachers::controller::teacher_courses,
        crate::modules::studios::controller::create_studio,
        crate::modules::studios::controller::get_studio_by_invite_code,
        crate::modules::admin::controller::reconcile_mirrors,
    ),
    components(
        schemas(
            ErrorKind,
            ErrorResponse,
            HealthResponse,
            User,
            UserRole,
            UserSummary,
            RegisterRequest,
            LoginRequest,
            GoogleLoginRequest,
            AuthResponse,
            VerifyRequest,
            VerifyResponse,
            MessageResponse,
            Course,
            CreateCourseDto,
            UpdateCourseDto,
            CourseListResponse,
            CourseMessageResponse,
            CoursesResponse,
            TeacherCourse,
            TeacherCoursesResponse,
            Lesson,
            CreateLessonDto,
            UpdateLessonDto,
            LessonResponse,
            LessonsResponse,
            LessonMessageResponse,
            Studio,
            StudioWithHost,
            StudioResponse,
            CreateStudioDto,
            CreateStudioResponse,
            ReconcileReport,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Authentication", description = "Registration, login and session checks"),
        (name = "Courses", description = "Public catalog and course management"),
        (name = "Lessons", description = "Lessons scoped to a course"),
        (name = "Students", description = "Enrollment"),
        (name = "Teachers", description = "Teacher dashboard"),
        (name = "Studios", description = "Invite-code studios"),
        (name = "Admin", description = "Operator maintenance")
    ),
    info(
        title = "Lectern API",
        version = "0.1.0",
        description = "Course catalog, enrollment and lessons for students and teachers.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("token"))),
            );
        }
    }
}
