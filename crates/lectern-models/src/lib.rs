//! # Lectern Models
//!
//! Documents and DTOs for the Lectern API.
//!
//! - [`ids`]: Typed document ids
//! - [`id_set`]: Set-valued fields with change reporting
//! - [`users`]: Users, roles and public summaries
//! - [`courses`]: Courses and catalog responses
//! - [`lessons`]: Lessons scoped to a course
//! - [`studios`]: Invite-code studios
//! - [`auth`]: Register, login and verify bodies
//!
//! JSON field names are camelCase on the wire.

pub mod auth;
pub mod courses;
pub mod id_set;
pub mod ids;
pub mod lessons;
pub mod studios;
pub mod users;

pub use auth::{
    AuthResponse, GoogleLoginRequest, LoginRequest, MessageResponse, RegisterRequest,
    VerifyRequest, VerifyResponse,
};
pub use courses::{
    Course, CourseListResponse, CourseMessageResponse, CourseSearch, CoursesResponse,
    CreateCourseDto, TeacherCourse, TeacherCoursesResponse, UpdateCourseDto,
};
pub use id_set::IdSet;
pub use ids::{CourseId, LessonId, StudioId, UserId};
pub use lessons::{
    CreateLessonDto, Lesson, LessonMessageResponse, LessonResponse, LessonsResponse,
    UpdateLessonDto,
};
pub use studios::{CreateStudioDto, CreateStudioResponse, Studio, StudioResponse, StudioWithHost};
pub use users::{UnknownRole, User, UserRole, UserSummary, normalize_email};
