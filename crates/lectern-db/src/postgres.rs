//! Postgres-backed [`DocumentStore`].
//!
//! One row per document. Sets and sequences live in `uuid[]` columns and
//! every set operation is a single `UPDATE`, so it is atomic for that row.
//! No operation opens a multi-statement transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use lectern_models::{
    Course, CourseId, IdSet, Lesson, LessonId, Studio, UpdateCourseDto, UpdateLessonDto, User,
    UserId, UserRole,
};

use crate::store::{DocumentStore, SetUpdate, StoreError};

const UNIQUE_VIOLATION: &str = "23505";
const OAUTH_CONSTRAINT: &str = "users_oauth_key";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => StoreError::Timeout,
            other @ (sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_)) => {
                StoreError::Unavailable(other.to_string())
            }
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                StoreError::DuplicateKey(db.constraint().unwrap_or("unknown").to_string())
            }
            other => StoreError::Query(other.to_string()),
        }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: Option<String>,
    role: String,
    oauth_provider: Option<String>,
    oauth_id: Option<String>,
    enrolled_course_ids: Vec<Uuid>,
    created_course_ids: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<UserRole>()
            .map_err(|e| StoreError::Query(format!("user {}: {}", row.id, e)))?;

        Ok(User {
            id: row.id.into(),
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role,
            oauth_provider: row.oauth_provider,
            oauth_id: row.oauth_id,
            enrolled_course_ids: row.enrolled_course_ids.into_iter().map(CourseId::from).collect(),
            created_course_ids: row.created_course_ids.into_iter().map(CourseId::from).collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct CourseRow {
    id: Uuid,
    teacher_id: Uuid,
    enrolled_student_ids: Vec<Uuid>,
    lesson_ids: Vec<Uuid>,
    title: String,
    description: String,
    category: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CourseRow> for Course {
    fn from(row: CourseRow) -> Self {
        Course {
            id: row.id.into(),
            teacher_id: row.teacher_id.into(),
            enrolled_student_ids: row
                .enrolled_student_ids
                .into_iter()
                .map(UserId::from)
                .collect::<IdSet<_>>(),
            lesson_ids: row.lesson_ids.into_iter().map(LessonId::from).collect(),
            title: row.title,
            description: row.description,
            category: row.category,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct SetFlags {
    found: bool,
    applied: bool,
}

const USER_COLUMNS: &str = "id, name, email, password_hash, role, oauth_provider, oauth_id, \
                            enrolled_course_ids, created_course_ids, created_at, updated_at";
const COURSE_COLUMNS: &str = "id, teacher_id, enrolled_student_ids, lesson_ids, title, \
                              description, category, created_at, updated_at";
const LESSON_COLUMNS: &str =
    "id, course_id, title, content, video_url, duration, created_at, updated_at";

#[derive(Debug, Clone, Copy)]
enum SetOp {
    Add,
    Remove,
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Adds or removes `member` in `table.column` for the row `id`.
    ///
    /// `table` and `column` are always compile-time constants.
    async fn update_set(
        &self,
        table: &'static str,
        column: &'static str,
        op: SetOp,
        id: Uuid,
        member: Uuid,
    ) -> Result<SetUpdate, StoreError> {
        let (expr, guard) = match op {
            SetOp::Add => ("array_append", "NOT ($2 = ANY"),
            SetOp::Remove => ("array_remove", "($2 = ANY"),
        };

        let sql = format!(
            "WITH target AS (SELECT id FROM {table} WHERE id = $1), \
             updated AS ( \
                 UPDATE {table} SET {column} = {expr}({column}, $2), updated_at = NOW() \
                 WHERE id = $1 AND {guard}({column})) \
                 RETURNING id) \
             SELECT EXISTS(SELECT 1 FROM target) AS found, \
                    EXISTS(SELECT 1 FROM updated) AS applied"
        );

        let flags = sqlx::query_as::<_, SetFlags>(&sql)
            .bind(id)
            .bind(member)
            .fetch_one(&self.pool)
            .await?;

        Ok(SetUpdate::from_flags(flags.found, flags.applied))
    }
}

fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn uuids<T: Copy + Into<Uuid>>(ids: &[T]) -> Vec<Uuid> {
    ids.iter().map(|id| (*id).into()).collect()
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_user_by_oauth(
        &self,
        provider: &str,
        subject: &str,
    ) -> Result<Option<User>, StoreError> {
        let sql =
            format!("SELECT {USER_COLUMNS} FROM users WHERE oauth_provider = $1 AND oauth_id = $2");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(provider)
            .bind(subject)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, role, oauth_provider, oauth_id, \
             enrolled_course_ids, created_course_ids, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.oauth_provider)
        .bind(&user.oauth_id)
        .bind(user.enrolled_course_ids.to_vec())
        .bind(user.created_course_ids.to_vec())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::DuplicateKey(constraint) if constraint == OAUTH_CONSTRAINT => {
                StoreError::DuplicateKey("oauth_id".to_string())
            }
            StoreError::DuplicateKey(_) => StoreError::DuplicateKey("email".to_string()),
            other => other,
        })?;

        Ok(())
    }

    async fn find_users(&self, ids: &[UserId]) -> Result<Vec<User>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1) ORDER BY name");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(uuids(ids))
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn user_ids(&self) -> Result<Vec<UserId>, StoreError> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().map(UserId::from).collect())
    }

    async fn set_user_role(&self, id: UserId, role: UserRole) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(role.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_enrolled_course(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<SetUpdate, StoreError> {
        self.update_set("users", "enrolled_course_ids", SetOp::Add, user_id.into(), course_id.into())
            .await
    }

    async fn remove_enrolled_course(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<SetUpdate, StoreError> {
        self.update_set(
            "users",
            "enrolled_course_ids",
            SetOp::Remove,
            user_id.into(),
            course_id.into(),
        )
        .await
    }

    async fn add_created_course(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<SetUpdate, StoreError> {
        self.update_set("users", "created_course_ids", SetOp::Add, user_id.into(), course_id.into())
            .await
    }

    async fn remove_created_course(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<SetUpdate, StoreError> {
        self.update_set(
            "users",
            "created_course_ids",
            SetOp::Remove,
            user_id.into(),
            course_id.into(),
        )
        .await
    }

    async fn users_enrolled_in(&self, course_id: CourseId) -> Result<Vec<UserId>, StoreError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM users WHERE $1 = ANY(enrolled_course_ids)",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().map(UserId::from).collect())
    }

    async fn find_course(&self, id: CourseId) -> Result<Option<Course>, StoreError> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1");
        let row = sqlx::query_as::<_, CourseRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Course::from))
    }

    async fn list_courses(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Course>, i64), StoreError> {
        let pattern = search.map(like_pattern);
        let filter = "($1::text IS NULL OR title ILIKE $1 OR description ILIKE $1 \
                      OR category ILIKE $1)";

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM courses WHERE {filter}"
        ))
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE {filter} \
             ORDER BY created_at DESC, id LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, CourseRow>(&sql)
            .bind(&pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((rows.into_iter().map(Course::from).collect(), total))
    }

    async fn courses_by_teacher(&self, teacher_id: UserId) -> Result<Vec<Course>, StoreError> {
        let sql = format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE teacher_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, CourseRow>(&sql)
            .bind(teacher_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Course::from).collect())
    }

    async fn courses_with_student(&self, student_id: UserId) -> Result<Vec<Course>, StoreError> {
        let sql = format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE $1 = ANY(enrolled_student_ids) \
             ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, CourseRow>(&sql)
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Course::from).collect())
    }

    async fn insert_course(&self, course: &Course) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO courses (id, teacher_id, enrolled_student_ids, lesson_ids, title, \
             description, category, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(course.id)
        .bind(course.teacher_id)
        .bind(course.enrolled_student_ids.to_vec())
        .bind(&course.lesson_ids)
        .bind(&course.title)
        .bind(&course.description)
        .bind(&course.category)
        .bind(course.created_at)
        .bind(course.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_course(
        &self,
        id: CourseId,
        changes: &UpdateCourseDto,
    ) -> Result<Option<Course>, StoreError> {
        let sql = format!(
            "UPDATE courses SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                category = COALESCE($4, category), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {COURSE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CourseRow>(&sql)
            .bind(id)
            .bind(changes.title.as_deref().map(str::trim))
            .bind(changes.description.as_deref().map(str::trim))
            .bind(changes.category.as_deref().map(str::trim))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Course::from))
    }

    async fn delete_course(&self, id: CourseId) -> Result<Option<Course>, StoreError> {
        let sql = format!("DELETE FROM courses WHERE id = $1 RETURNING {COURSE_COLUMNS}");
        let row = sqlx::query_as::<_, CourseRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Course::from))
    }

    async fn add_student_to_roster(
        &self,
        course_id: CourseId,
        student_id: UserId,
    ) -> Result<SetUpdate, StoreError> {
        self.update_set(
            "courses",
            "enrolled_student_ids",
            SetOp::Add,
            course_id.into(),
            student_id.into(),
        )
        .await
    }

    async fn remove_student_from_roster(
        &self,
        course_id: CourseId,
        student_id: UserId,
    ) -> Result<SetUpdate, StoreError> {
        self.update_set(
            "courses",
            "enrolled_student_ids",
            SetOp::Remove,
            course_id.into(),
            student_id.into(),
        )
        .await
    }

    async fn append_lesson(
        &self,
        course_id: CourseId,
        lesson_id: LessonId,
    ) -> Result<SetUpdate, StoreError> {
        self.update_set("courses", "lesson_ids", SetOp::Add, course_id.into(), lesson_id.into())
            .await
    }

    async fn remove_lesson(
        &self,
        course_id: CourseId,
        lesson_id: LessonId,
    ) -> Result<SetUpdate, StoreError> {
        self.update_set("courses", "lesson_ids", SetOp::Remove, course_id.into(), lesson_id.into())
            .await
    }

    async fn find_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StoreError> {
        let sql = format!("SELECT {LESSON_COLUMNS} FROM lessons WHERE id = $1");
        Ok(sqlx::query_as::<_, Lesson>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn lessons_for_course(&self, course_id: CourseId) -> Result<Vec<Lesson>, StoreError> {
        let sql = format!(
            "SELECT {LESSON_COLUMNS} FROM lessons WHERE course_id = $1 ORDER BY created_at, id"
        );
        Ok(sqlx::query_as::<_, Lesson>(&sql)
            .bind(course_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn insert_lesson(&self, lesson: &Lesson) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO lessons (id, course_id, title, content, video_url, duration, \
             created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(lesson.id)
        .bind(lesson.course_id)
        .bind(&lesson.title)
        .bind(&lesson.content)
        .bind(&lesson.video_url)
        .bind(lesson.duration)
        .bind(lesson.created_at)
        .bind(lesson.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_lesson(
        &self,
        id: LessonId,
        changes: &UpdateLessonDto,
    ) -> Result<Option<Lesson>, StoreError> {
        let sql = format!(
            "UPDATE lessons SET \
                title = COALESCE($2, title), \
                content = COALESCE($3, content), \
                video_url = COALESCE($4, video_url), \
                duration = COALESCE($5, duration), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {LESSON_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Lesson>(&sql)
            .bind(id)
            .bind(changes.title.as_deref().map(str::trim))
            .bind(&changes.content)
            .bind(&changes.video_url)
            .bind(changes.duration)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_lesson(&self, id: LessonId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM lessons WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_lessons_for_course(&self, course_id: CourseId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM lessons WHERE course_id = $1")
            .bind(course_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_studio(&self, studio: &Studio) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO studios (id, name, host_id, invite_code, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(studio.id)
        .bind(&studio.name)
        .bind(studio.host_id)
        .bind(&studio.invite_code)
        .bind(studio.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_studio_by_invite_code(&self, code: &str) -> Result<Option<Studio>, StoreError> {
        Ok(sqlx::query_as::<_, Studio>(
            "SELECT id, name, host_id, invite_code, created_at FROM studios WHERE invite_code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("rust"), "%rust%");
        assert_eq!(like_pattern("100%_off"), "%100\\%\\_off%");
    }

    #[test]
    fn test_pool_timeout_maps_to_timeout() {
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolTimedOut),
            StoreError::Timeout
        ));
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolClosed),
            StoreError::Unavailable(_)
        ));
    }

    #[test]
    fn test_corrupt_role_is_query_error() {
        let row = UserRow {
            id: Uuid::new_v4(),
            name: "x".into(),
            email: "x@example.com".into(),
            password_hash: None,
            role: "root".into(),
            oauth_provider: None,
            oauth_id: None,
            enrolled_course_ids: vec![],
            created_course_ids: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(matches!(User::try_from(row), Err(StoreError::Query(_))));
    }
}
