//! In-memory [`DocumentStore`] for tests and local tooling.
//!
//! All state sits behind one mutex, so each operation is atomic just like a
//! single-row statement in Postgres. Faults can be injected per operation to
//! exercise partial-failure paths.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use lectern_models::{
    Course, CourseId, Lesson, LessonId, Studio, StudioId, UpdateCourseDto, UpdateLessonDto, User,
    UserId, UserRole,
};

use crate::store::{DocumentStore, SetUpdate, StoreError};

/// Store operations that can be counted or made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Ping,
    FindUser,
    FindUserByEmail,
    FindUserByOauth,
    InsertUser,
    FindUsers,
    UserIds,
    SetUserRole,
    AddEnrolledCourse,
    RemoveEnrolledCourse,
    AddCreatedCourse,
    RemoveCreatedCourse,
    UsersEnrolledIn,
    FindCourse,
    ListCourses,
    CoursesByTeacher,
    CoursesWithStudent,
    InsertCourse,
    UpdateCourse,
    DeleteCourse,
    AddStudentToRoster,
    RemoveStudentFromRoster,
    AppendLesson,
    RemoveLesson,
    FindLesson,
    LessonsForCourse,
    InsertLesson,
    UpdateLesson,
    DeleteLesson,
    DeleteLessonsForCourse,
    InsertStudio,
    FindStudioByInviteCode,
}

#[derive(Default)]
struct State {
    users: HashMap<UserId, User>,
    courses: HashMap<CourseId, Course>,
    lessons: HashMap<LessonId, Lesson>,
    studios: HashMap<StudioId, Studio>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    unavailable: AtomicBool,
    failures: Mutex<HashMap<StoreOp, u32>>,
    calls: Mutex<HashMap<StoreOp, u32>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation fails with [`StoreError::Unavailable`] while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// The next call to `op` fails with [`StoreError::Timeout`].
    pub fn fail_next(&self, op: StoreOp) {
        self.fail_times(op, 1);
    }

    pub fn fail_times(&self, op: StoreOp, times: u32) {
        *lock(&self.failures).entry(op).or_default() += times;
    }

    /// Number of times `op` has been called, failed calls included.
    pub fn calls(&self, op: StoreOp) -> u32 {
        lock(&self.calls).get(&op).copied().unwrap_or(0)
    }

    pub fn reset_calls(&self) {
        lock(&self.calls).clear();
    }

    /// Edits a user document directly, bypassing every invariant.
    pub fn edit_user(&self, id: UserId, edit: impl FnOnce(&mut User)) {
        if let Some(user) = lock(&self.state).users.get_mut(&id) {
            edit(user);
        }
    }

    /// Edits a course document directly, bypassing every invariant.
    pub fn edit_course(&self, id: CourseId, edit: impl FnOnce(&mut Course)) {
        if let Some(course) = lock(&self.state).courses.get_mut(&id) {
            edit(course);
        }
    }

    pub fn lesson_count(&self) -> usize {
        lock(&self.state).lessons.len()
    }

    fn enter(&self, op: StoreOp) -> Result<MutexGuard<'_, State>, StoreError> {
        *lock(&self.calls).entry(op).or_default() += 1;

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store disabled".to_string()));
        }

        let mut failures = lock(&self.failures);
        if let Some(remaining) = failures.get_mut(&op).filter(|n| **n > 0) {
            *remaining -= 1;
            return Err(StoreError::Timeout);
        }
        drop(failures);

        Ok(lock(&self.state))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn add_member<T: Ord + Copy>(set: &mut lectern_models::IdSet<T>, member: T) -> SetUpdate {
    SetUpdate::from_flags(true, set.insert(member))
}

fn remove_member<T: Ord + Copy>(set: &mut lectern_models::IdSet<T>, member: T) -> SetUpdate {
    SetUpdate::from_flags(true, set.remove(&member))
}

fn newest_first(courses: &mut [Course]) {
    courses.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.enter(StoreOp::Ping).map(|_| ())
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let state = self.enter(StoreOp::FindUser)?;
        Ok(state.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let state = self.enter(StoreOp::FindUserByEmail)?;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_oauth(
        &self,
        provider: &str,
        subject: &str,
    ) -> Result<Option<User>, StoreError> {
        let state = self.enter(StoreOp::FindUserByOauth)?;
        Ok(state.users.values().find(|u| u.is_linked_to(provider, subject)).cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut state = self.enter(StoreOp::InsertUser)?;
        let identity_taken = match (&user.oauth_provider, &user.oauth_id) {
            (Some(provider), Some(subject)) => {
                state.users.values().any(|u| u.is_linked_to(provider, subject))
            }
            _ => false,
        };
        if identity_taken {
            return Err(StoreError::DuplicateKey("oauth_id".to_string()));
        }
        if state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateKey("email".to_string()));
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_users(&self, ids: &[UserId]) -> Result<Vec<User>, StoreError> {
        let state = self.enter(StoreOp::FindUsers)?;
        let wanted: BTreeSet<UserId> = ids.iter().copied().collect();
        let mut users: Vec<User> = wanted
            .iter()
            .filter_map(|id| state.users.get(id).cloned())
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn user_ids(&self) -> Result<Vec<UserId>, StoreError> {
        let state = self.enter(StoreOp::UserIds)?;
        let mut users: Vec<&User> = state.users.values().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users.into_iter().map(|u| u.id).collect())
    }

    async fn set_user_role(&self, id: UserId, role: UserRole) -> Result<bool, StoreError> {
        let mut state = self.enter(StoreOp::SetUserRole)?;
        Ok(match state.users.get_mut(&id) {
            Some(user) => {
                user.role = role;
                user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn add_enrolled_course(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<SetUpdate, StoreError> {
        let mut state = self.enter(StoreOp::AddEnrolledCourse)?;
        Ok(match state.users.get_mut(&user_id) {
            Some(user) => add_member(&mut user.enrolled_course_ids, course_id),
            None => SetUpdate::Missing,
        })
    }

    async fn remove_enrolled_course(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<SetUpdate, StoreError> {
        let mut state = self.enter(StoreOp::RemoveEnrolledCourse)?;
        Ok(match state.users.get_mut(&user_id) {
            Some(user) => remove_member(&mut user.enrolled_course_ids, course_id),
            None => SetUpdate::Missing,
        })
    }

    async fn add_created_course(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<SetUpdate, StoreError> {
        let mut state = self.enter(StoreOp::AddCreatedCourse)?;
        Ok(match state.users.get_mut(&user_id) {
            Some(user) => add_member(&mut user.created_course_ids, course_id),
            None => SetUpdate::Missing,
        })
    }

    async fn remove_created_course(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<SetUpdate, StoreError> {
        let mut state = self.enter(StoreOp::RemoveCreatedCourse)?;
        Ok(match state.users.get_mut(&user_id) {
            Some(user) => remove_member(&mut user.created_course_ids, course_id),
            None => SetUpdate::Missing,
        })
    }

    async fn users_enrolled_in(&self, course_id: CourseId) -> Result<Vec<UserId>, StoreError> {
        let state = self.enter(StoreOp::UsersEnrolledIn)?;
        Ok(state
            .users
            .values()
            .filter(|u| u.enrolled_course_ids.contains(&course_id))
            .map(|u| u.id)
            .collect())
    }

    async fn find_course(&self, id: CourseId) -> Result<Option<Course>, StoreError> {
        let state = self.enter(StoreOp::FindCourse)?;
        Ok(state.courses.get(&id).cloned())
    }

    async fn list_courses(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Course>, i64), StoreError> {
        let state = self.enter(StoreOp::ListCourses)?;
        let mut matches: Vec<Course> = state
            .courses
            .values()
            .filter(|c| search.is_none_or(|term| c.matches_search(term)))
            .cloned()
            .collect();
        newest_first(&mut matches);

        let total = matches.len() as i64;
        let page = matches
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn courses_by_teacher(&self, teacher_id: UserId) -> Result<Vec<Course>, StoreError> {
        let state = self.enter(StoreOp::CoursesByTeacher)?;
        let mut courses: Vec<Course> = state
            .courses
            .values()
            .filter(|c| c.teacher_id == teacher_id)
            .cloned()
            .collect();
        newest_first(&mut courses);
        Ok(courses)
    }

    async fn courses_with_student(&self, student_id: UserId) -> Result<Vec<Course>, StoreError> {
        let state = self.enter(StoreOp::CoursesWithStudent)?;
        let mut courses: Vec<Course> = state
            .courses
            .values()
            .filter(|c| c.has_student(student_id))
            .cloned()
            .collect();
        newest_first(&mut courses);
        Ok(courses)
    }

    async fn insert_course(&self, course: &Course) -> Result<(), StoreError> {
        let mut state = self.enter(StoreOp::InsertCourse)?;
        state.courses.insert(course.id, course.clone());
        Ok(())
    }

    async fn update_course(
        &self,
        id: CourseId,
        changes: &UpdateCourseDto,
    ) -> Result<Option<Course>, StoreError> {
        let mut state = self.enter(StoreOp::UpdateCourse)?;
        Ok(state.courses.get_mut(&id).map(|course| {
            changes.apply(course);
            course.clone()
        }))
    }

    async fn delete_course(&self, id: CourseId) -> Result<Option<Course>, StoreError> {
        let mut state = self.enter(StoreOp::DeleteCourse)?;
        Ok(state.courses.remove(&id))
    }

    async fn add_student_to_roster(
        &self,
        course_id: CourseId,
        student_id: UserId,
    ) -> Result<SetUpdate, StoreError> {
        let mut state = self.enter(StoreOp::AddStudentToRoster)?;
        Ok(match state.courses.get_mut(&course_id) {
            Some(course) => add_member(&mut course.enrolled_student_ids, student_id),
            None => SetUpdate::Missing,
        })
    }

    async fn remove_student_from_roster(
        &self,
        course_id: CourseId,
        student_id: UserId,
    ) -> Result<SetUpdate, StoreError> {
        let mut state = self.enter(StoreOp::RemoveStudentFromRoster)?;
        Ok(match state.courses.get_mut(&course_id) {
            Some(course) => remove_member(&mut course.enrolled_student_ids, student_id),
            None => SetUpdate::Missing,
        })
    }

    async fn append_lesson(
        &self,
        course_id: CourseId,
        lesson_id: LessonId,
    ) -> Result<SetUpdate, StoreError> {
        let mut state = self.enter(StoreOp::AppendLesson)?;
        Ok(match state.courses.get_mut(&course_id) {
            Some(course) if course.lesson_ids.contains(&lesson_id) => SetUpdate::Unchanged,
            Some(course) => {
                course.lesson_ids.push(lesson_id);
                SetUpdate::Applied
            }
            None => SetUpdate::Missing,
        })
    }

    async fn remove_lesson(
        &self,
        course_id: CourseId,
        lesson_id: LessonId,
    ) -> Result<SetUpdate, StoreError> {
        let mut state = self.enter(StoreOp::RemoveLesson)?;
        Ok(match state.courses.get_mut(&course_id) {
            Some(course) => {
                let before = course.lesson_ids.len();
                course.lesson_ids.retain(|id| *id != lesson_id);
                SetUpdate::from_flags(true, course.lesson_ids.len() != before)
            }
            None => SetUpdate::Missing,
        })
    }

    async fn find_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StoreError> {
        let state = self.enter(StoreOp::FindLesson)?;
        Ok(state.lessons.get(&id).cloned())
    }

    async fn lessons_for_course(&self, course_id: CourseId) -> Result<Vec<Lesson>, StoreError> {
        let state = self.enter(StoreOp::LessonsForCourse)?;
        let mut lessons: Vec<Lesson> = state
            .lessons
            .values()
            .filter(|l| l.course_id == course_id)
            .cloned()
            .collect();
        lessons.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(lessons)
    }

    async fn insert_lesson(&self, lesson: &Lesson) -> Result<(), StoreError> {
        let mut state = self.enter(StoreOp::InsertLesson)?;
        state.lessons.insert(lesson.id, lesson.clone());
        Ok(())
    }

    async fn update_lesson(
        &self,
        id: LessonId,
        changes: &UpdateLessonDto,
    ) -> Result<Option<Lesson>, StoreError> {
        let mut state = self.enter(StoreOp::UpdateLesson)?;
        Ok(state.lessons.get_mut(&id).map(|lesson| {
            changes.apply(lesson);
            lesson.clone()
        }))
    }

    async fn delete_lesson(&self, id: LessonId) -> Result<bool, StoreError> {
        let mut state = self.enter(StoreOp::DeleteLesson)?;
        Ok(state.lessons.remove(&id).is_some())
    }

    async fn delete_lessons_for_course(&self, course_id: CourseId) -> Result<u64, StoreError> {
        let mut state = self.enter(StoreOp::DeleteLessonsForCourse)?;
        let before = state.lessons.len();
        state.lessons.retain(|_, l| l.course_id != course_id);
        Ok((before - state.lessons.len()) as u64)
    }

    async fn insert_studio(&self, studio: &Studio) -> Result<(), StoreError> {
        let mut state = self.enter(StoreOp::InsertStudio)?;
        if state
            .studios
            .values()
            .any(|s| s.invite_code == studio.invite_code)
        {
            return Err(StoreError::DuplicateKey("invite_code".to_string()));
        }
        state.studios.insert(studio.id, studio.clone());
        Ok(())
    }

    async fn find_studio_by_invite_code(&self, code: &str) -> Result<Option<Studio>, StoreError> {
        let state = self.enter(StoreOp::FindStudioByInviteCode)?;
        Ok(state
            .studios
            .values()
            .find(|s| s.invite_code == code)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_models::CreateCourseDto;

    fn course_for(teacher: UserId) -> Course {
        Course::new(
            teacher,
            CreateCourseDto {
                title: "Algebra".into(),
                description: "Groups and rings".into(),
                category: "math".into(),
            },
        )
    }

    #[tokio::test]
    async fn test_roster_set_semantics() {
        let store = MemoryStore::new();
        let course = course_for(UserId::new());
        store.insert_course(&course).await.unwrap();
        let student = UserId::new();

        assert_eq!(
            store.add_student_to_roster(course.id, student).await.unwrap(),
            SetUpdate::Applied
        );
        assert_eq!(
            store.add_student_to_roster(course.id, student).await.unwrap(),
            SetUpdate::Unchanged
        );
        assert_eq!(
            store.add_student_to_roster(CourseId::new(), student).await.unwrap(),
            SetUpdate::Missing
        );
        assert_eq!(
            store.remove_student_from_roster(course.id, student).await.unwrap(),
            SetUpdate::Applied
        );
        assert_eq!(
            store.remove_student_from_roster(course.id, student).await.unwrap(),
            SetUpdate::Unchanged
        );
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        let first = User::new("A", "a@example.com", None, UserRole::Student);
        let second = User::new("B", "a@example.com", None, UserRole::Teacher);

        store.insert_user(&first).await.unwrap();
        let err = store.insert_user(&second).await.unwrap_err();
        assert!(err.is_duplicate_key());
    }

    #[tokio::test]
    async fn test_linked_identity_is_unique() {
        let store = MemoryStore::new();
        let first = User::linked("A", "a@example.com", UserRole::Student, "google", "sub-1");
        let second = User::linked("B", "b@example.com", UserRole::Student, "google", "sub-1");

        store.insert_user(&first).await.unwrap();
        let err = store.insert_user(&second).await.unwrap_err();
        assert_eq!(err.duplicate_field(), Some("oauth_id"));

        let found = store.find_user_by_oauth("google", "sub-1").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
        assert!(store.find_user_by_oauth("github", "sub-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fail_next_is_one_shot() {
        let store = MemoryStore::new();
        store.fail_next(StoreOp::FindCourse);

        assert!(matches!(
            store.find_course(CourseId::new()).await,
            Err(StoreError::Timeout)
        ));
        assert!(store.find_course(CourseId::new()).await.unwrap().is_none());
        assert_eq!(store.calls(StoreOp::FindCourse), 2);
    }

    #[tokio::test]
    async fn test_unavailable_fails_everything() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(matches!(store.ping().await, Err(StoreError::Unavailable(_))));

        store.set_unavailable(false);
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_list_courses_paginates_and_filters() {
        let store = MemoryStore::new();
        let teacher = UserId::new();
        for _ in 0..3 {
            store.insert_course(&course_for(teacher)).await.unwrap();
        }
        let mut other = course_for(teacher);
        other.title = "Poetry".into();
        other.description = "Sonnets".into();
        other.category = "literature".into();
        store.insert_course(&other).await.unwrap();

        let (page, total) = store.list_courses(None, 2, 0).await.unwrap();
        assert_eq!(total, 4);
        assert_eq!(page.len(), 2);

        let (page, total) = store.list_courses(Some("SONNET"), 10, 0).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(page[0].id, other.id);
    }

    #[tokio::test]
    async fn test_append_lesson_keeps_order_and_uniqueness() {
        let store = MemoryStore::new();
        let course = course_for(UserId::new());
        store.insert_course(&course).await.unwrap();
        let (a, b) = (LessonId::new(), LessonId::new());

        store.append_lesson(course.id, a).await.unwrap();
        store.append_lesson(course.id, b).await.unwrap();
        assert_eq!(
            store.append_lesson(course.id, a).await.unwrap(),
            SetUpdate::Unchanged
        );

        let stored = store.find_course(course.id).await.unwrap().unwrap();
        assert_eq!(stored.lesson_ids, vec![a, b]);
    }
}
