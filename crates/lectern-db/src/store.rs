//! The document store contract.
//!
//! Each document (user, course, lesson, studio) is updated atomically on its
//! own. Nothing here spans two documents; keeping the user and course
//! mirrors aligned is the caller's job.

use async_trait::async_trait;

use lectern_models::{
    Course, CourseId, Lesson, LessonId, Studio, UpdateCourseDto, UpdateLessonDto, User, UserId,
    UserRole,
};

/// Errors raised by a [`DocumentStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// No connection became free in time
    #[error("Store operation timed out")]
    Timeout,

    /// A unique field already holds this value
    #[error("Duplicate value for unique field '{0}'")]
    DuplicateKey(String),

    /// The backend rejected the operation or returned unreadable data
    #[error("Store query failed: {0}")]
    Query(String),
}

impl StoreError {
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, StoreError::DuplicateKey(_))
    }

    /// Name of the unique field a [`StoreError::DuplicateKey`] refers to.
    pub fn duplicate_field(&self) -> Option<&str> {
        match self {
            StoreError::DuplicateKey(field) => Some(field),
            _ => None,
        }
    }
}

/// Outcome of an atomic set operation on a single document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetUpdate {
    /// The set changed.
    Applied,
    /// The document exists but already had (or lacked) the member.
    Unchanged,
    /// No such document.
    Missing,
}

impl SetUpdate {
    pub fn from_flags(found: bool, applied: bool) -> Self {
        match (found, applied) {
            (_, true) => SetUpdate::Applied,
            (true, false) => SetUpdate::Unchanged,
            (false, false) => SetUpdate::Missing,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, SetUpdate::Applied)
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Cheap round trip used by health checks.
    async fn ping(&self) -> Result<(), StoreError>;

    // Users

    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// `email` must already be normalized.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// The account linked to `subject` at `provider`, if any.
    async fn find_user_by_oauth(
        &self,
        provider: &str,
        subject: &str,
    ) -> Result<Option<User>, StoreError>;

    /// Fails with [`StoreError::DuplicateKey`] when the email, or the
    /// external identity, is already taken. The key names which.
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    async fn find_users(&self, ids: &[UserId]) -> Result<Vec<User>, StoreError>;

    async fn user_ids(&self) -> Result<Vec<UserId>, StoreError>;

    /// Returns `false` if the user does not exist.
    async fn set_user_role(&self, id: UserId, role: UserRole) -> Result<bool, StoreError>;

    async fn add_enrolled_course(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<SetUpdate, StoreError>;

    async fn remove_enrolled_course(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<SetUpdate, StoreError>;

    async fn add_created_course(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<SetUpdate, StoreError>;

    async fn remove_created_course(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<SetUpdate, StoreError>;

    /// Users whose enrollment list still names `course_id`.
    async fn users_enrolled_in(&self, course_id: CourseId) -> Result<Vec<UserId>, StoreError>;

    // Courses

    async fn find_course(&self, id: CourseId) -> Result<Option<Course>, StoreError>;

    /// A page of the catalog, newest first, and the total number of matches.
    async fn list_courses(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Course>, i64), StoreError>;

    async fn courses_by_teacher(&self, teacher_id: UserId) -> Result<Vec<Course>, StoreError>;

    /// Courses whose roster contains `student_id`.
    async fn courses_with_student(&self, student_id: UserId) -> Result<Vec<Course>, StoreError>;

    async fn insert_course(&self, course: &Course) -> Result<(), StoreError>;

    async fn update_course(
        &self,
        id: CourseId,
        changes: &UpdateCourseDto,
    ) -> Result<Option<Course>, StoreError>;

    /// Removes the course and returns it as it was at deletion.
    async fn delete_course(&self, id: CourseId) -> Result<Option<Course>, StoreError>;

    async fn add_student_to_roster(
        &self,
        course_id: CourseId,
        student_id: UserId,
    ) -> Result<SetUpdate, StoreError>;

    async fn remove_student_from_roster(
        &self,
        course_id: CourseId,
        student_id: UserId,
    ) -> Result<SetUpdate, StoreError>;

    /// Appends to the end of the lesson sequence unless already present.
    async fn append_lesson(
        &self,
        course_id: CourseId,
        lesson_id: LessonId,
    ) -> Result<SetUpdate, StoreError>;

    async fn remove_lesson(
        &self,
        course_id: CourseId,
        lesson_id: LessonId,
    ) -> Result<SetUpdate, StoreError>;

    // Lessons

    async fn find_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StoreError>;

    /// Lessons of a course in creation order.
    async fn lessons_for_course(&self, course_id: CourseId) -> Result<Vec<Lesson>, StoreError>;

    async fn insert_lesson(&self, lesson: &Lesson) -> Result<(), StoreError>;

    async fn update_lesson(
        &self,
        id: LessonId,
        changes: &UpdateLessonDto,
    ) -> Result<Option<Lesson>, StoreError>;

    /// Returns `false` if the lesson was already gone.
    async fn delete_lesson(&self, id: LessonId) -> Result<bool, StoreError>;

    /// Returns the number of lessons removed.
    async fn delete_lessons_for_course(&self, course_id: CourseId) -> Result<u64, StoreError>;

    // Studios

    /// Fails with [`StoreError::DuplicateKey`] when the invite code is taken.
    async fn insert_studio(&self, studio: &Studio) -> Result<(), StoreError>;

    async fn find_studio_by_invite_code(&self, code: &str) -> Result<Option<Studio>, StoreError>;
}
