//! Enrollment consistency.
//!
//! A course's `enrolled_student_ids` is the source of truth for membership.
//! A user's `enrolled_course_ids` mirrors it, as `created_course_ids` mirrors
//! course ownership. Writes go to the source first and the mirror second.
//! When the second write fails the mirror is repaired on the user's next
//! listing, or by `lectern-cli reconcile`.

use std::collections::BTreeSet;

use anyhow::anyhow;
use lectern_core::{AppError, ErrorKind};
use lectern_db::{DocumentStore, SetUpdate, StoreError};
use lectern_models::{Course, CourseId, IdSet, User, UserId, UserRole};
use tracing::{field::Empty, instrument, warn};

use super::model::{MirrorRepair, ReconcileReport};
use crate::metrics::{track_enrollment, track_mirror_repair, track_unenrollment};
use crate::middleware::auth::Principal;
use crate::middleware::role::check_role;
use crate::utils::tracing::record_error;
use crate::{audit_event, reconcile_needed};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mirror {
    Enrolled,
    Created,
}

impl Mirror {
    fn field(self) -> &'static str {
        match self {
            Mirror::Enrolled => "user.enrolled_course_ids",
            Mirror::Created => "user.created_course_ids",
        }
    }

    fn cached(self, user: &User) -> &IdSet<CourseId> {
        match self {
            Mirror::Enrolled => &user.enrolled_course_ids,
            Mirror::Created => &user.created_course_ids,
        }
    }

    async fn add(
        self,
        store: &dyn DocumentStore,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<SetUpdate, StoreError> {
        match self {
            Mirror::Enrolled => store.add_enrolled_course(user_id, course_id).await,
            Mirror::Created => store.add_created_course(user_id, course_id).await,
        }
    }

    async fn remove(
        self,
        store: &dyn DocumentStore,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<SetUpdate, StoreError> {
        match self {
            Mirror::Enrolled => store.remove_enrolled_course(user_id, course_id).await,
            Mirror::Created => store.remove_created_course(user_id, course_id).await,
        }
    }

    fn record(self, repair: &MirrorRepair) {
        let (added, removed) = match self {
            Mirror::Enrolled => ("enrolled_added", "enrolled_removed"),
            Mirror::Created => ("created_added", "created_removed"),
        };
        track_mirror_repair(added, repair.added);
        track_mirror_repair(removed, repair.removed);
    }
}

/// Brings one of `user`'s mirror lists in line with `authoritative`.
///
/// Failures are logged and counted, never returned.
async fn repair_mirror(
    store: &dyn DocumentStore,
    user: &User,
    mirror: Mirror,
    authoritative: &[Course],
) -> MirrorRepair {
    let truth: IdSet<CourseId> = authoritative.iter().map(|course| course.id).collect();
    let cached = mirror.cached(user);
    let missing: Vec<CourseId> = truth.difference(cached).collect();
    let stale: Vec<CourseId> = cached.difference(&truth).collect();

    let mut repair = MirrorRepair::default();

    for course_id in missing {
        match mirror.add(store, user.id, course_id).await {
            Ok(SetUpdate::Applied) => repair.added += 1,
            Ok(_) => {}
            Err(e) => {
                repair.failed += 1;
                reconcile_needed!(
                    mirror.field(),
                    user.id = %user.id,
                    course.id = %course_id,
                    error = %e,
                    "Mirror repair add failed"
                );
            }
        }
    }

    for course_id in stale {
        match mirror.remove(store, user.id, course_id).await {
            Ok(SetUpdate::Applied) => repair.removed += 1,
            Ok(_) => {}
            Err(e) => {
                repair.failed += 1;
                reconcile_needed!(
                    mirror.field(),
                    user.id = %user.id,
                    course.id = %course_id,
                    error = %e,
                    "Mirror repair remove failed"
                );
            }
        }
    }

    if repair.added + repair.removed > 0 {
        warn!(
            user.id = %user.id,
            mirror = mirror.field(),
            added = repair.added,
            removed = repair.removed,
            "Repaired drifted mirror"
        );
    }
    mirror.record(&repair);

    repair
}

const SETTLE_ATTEMPTS: usize = 3;

/// Re-reads the roster after an enrollment mirror write and rewrites the
/// mirror until the two agree.
///
/// An enroll and an unenroll of the same pair can interleave so that the
/// last mirror write contradicts the last roster write. Every mirror write
/// here is followed by another roster read, so once the roster stops
/// changing the mirror ends up matching it.
async fn settle_enrolled_mirror(
    store: &dyn DocumentStore,
    student_id: UserId,
    course_id: CourseId,
    mut mirrored: bool,
) {
    for _ in 0..SETTLE_ATTEMPTS {
        let listed = match store.find_course(course_id).await {
            Ok(course) => course.is_some_and(|c| c.has_student(student_id)),
            Err(e) => {
                reconcile_needed!(
                    Mirror::Enrolled.field(),
                    student_id = %student_id,
                    course_id = %course_id,
                    error = %e,
                    "Could not re-read roster after mirror write"
                );
                return;
            }
        };
        if listed == mirrored {
            return;
        }

        let write = if listed {
            Mirror::Enrolled.add(store, student_id, course_id).await
        } else {
            Mirror::Enrolled.remove(store, student_id, course_id).await
        };
        match write {
            Ok(SetUpdate::Missing) => return,
            Ok(update) => {
                if update.is_applied() {
                    let kind = if listed { "enrolled_added" } else { "enrolled_removed" };
                    track_mirror_repair(kind, 1);
                }
                warn!(
                    student_id = %student_id,
                    course_id = %course_id,
                    enrolled = listed,
                    "Roster changed under a concurrent enrollment write"
                );
            }
            Err(e) => {
                reconcile_needed!(
                    Mirror::Enrolled.field(),
                    student_id = %student_id,
                    course_id = %course_id,
                    error = %e,
                    "Mirror settle write failed"
                );
                return;
            }
        }
        mirrored = listed;
    }

    reconcile_needed!(
        Mirror::Enrolled.field(),
        student_id = %student_id,
        course_id = %course_id,
        "Enrollment mirror did not settle"
    );
}

pub struct EnrollmentService;

impl EnrollmentService {
    #[instrument(
        skip(store, principal),
        fields(student.id = %principal.id, otel.status_code = Empty, error.message = Empty)
    )]
    pub async fn enroll(
        store: &dyn DocumentStore,
        principal: &Principal,
        course_id: CourseId,
    ) -> Result<(), AppError> {
        check_role(principal, UserRole::Student, "Only students can enroll")?;

        let course = store
            .find_course(course_id)
            .await?
            .ok_or_else(|| AppError::not_found("Course not found"))?;

        if course.has_student(principal.id) {
            match store.add_enrolled_course(principal.id, course_id).await {
                Ok(SetUpdate::Applied) => track_mirror_repair("enrolled_added", 1),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Opportunistic mirror repair failed"),
            }
            track_enrollment("conflict");
            return Err(AppError::conflict("Already enrolled in this course"));
        }

        match store.add_student_to_roster(course_id, principal.id).await? {
            SetUpdate::Applied => {}
            SetUpdate::Unchanged => {
                track_enrollment("conflict");
                return Err(AppError::conflict("Already enrolled in this course"));
            }
            SetUpdate::Missing => return Err(AppError::not_found("Course not found")),
        }

        match store.add_enrolled_course(principal.id, course_id).await {
            Ok(SetUpdate::Applied | SetUpdate::Unchanged) => {}
            Ok(SetUpdate::Missing) => {
                reconcile_needed!(
                    Mirror::Enrolled.field(),
                    student_id = %principal.id,
                    course_id = %course_id,
                    "Student document missing after roster write"
                );
                track_enrollment("partial");
                return Err(AppError::infrastructure(anyhow!(
                    "student {} vanished during enrollment",
                    principal.id
                )));
            }
            Err(e) => {
                reconcile_needed!(
                    Mirror::Enrolled.field(),
                    student_id = %principal.id,
                    course_id = %course_id,
                    error = %e,
                    "Enrollment mirror write failed"
                );
                record_error(&e.to_string());
                track_enrollment("partial");
                return Err(AppError::infrastructure(e));
            }
        }

        settle_enrolled_mirror(store, principal.id, course_id, true).await;

        audit_event!("enroll", "course", student.id = %principal.id, course.id = %course_id, "Student enrolled");
        track_enrollment("success");

        Ok(())
    }

    /// Idempotent: unenrolling a student who is not enrolled succeeds.
    #[instrument(skip(store, principal), fields(student.id = %principal.id))]
    pub async fn unenroll(
        store: &dyn DocumentStore,
        principal: &Principal,
        course_id: CourseId,
    ) -> Result<(), AppError> {
        check_role(principal, UserRole::Student, "Only students can unenroll")?;

        if store.find_course(course_id).await?.is_none() {
            return Err(AppError::not_found("Course not found"));
        }

        let roster = store
            .remove_student_from_roster(course_id, principal.id)
            .await?;

        if let Err(e) = store.remove_enrolled_course(principal.id, course_id).await {
            reconcile_needed!(
                Mirror::Enrolled.field(),
                student_id = %principal.id,
                course_id = %course_id,
                error = %e,
                "Unenrollment mirror write failed"
            );
            return Err(AppError::infrastructure(e));
        }

        settle_enrolled_mirror(store, principal.id, course_id, false).await;

        if roster == SetUpdate::Missing {
            return Err(AppError::not_found("Course not found"));
        }

        if roster.is_applied() {
            audit_event!("unenroll", "course", student.id = %principal.id, course.id = %course_id, "Student unenrolled");
            track_unenrollment();
        }

        Ok(())
    }

    /// Courses whose roster lists the student, repairing the student's mirror.
    #[instrument(skip(store, principal), fields(student.id = %principal.id))]
    pub async fn enrolled_courses(
        store: &dyn DocumentStore,
        principal: &Principal,
    ) -> Result<Vec<Course>, AppError> {
        check_role(principal, UserRole::Student, "Access denied. Student role required.")?;

        let user = store
            .find_user(principal.id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Not authorized"))?;

        let courses = store.courses_with_student(principal.id).await?;
        repair_mirror(store, &user, Mirror::Enrolled, &courses).await;

        Ok(courses)
    }

    /// Repairs `user.created_course_ids` against the courses the user teaches.
    pub async fn repair_created_courses(
        store: &dyn DocumentStore,
        user: &User,
        taught: &[Course],
    ) -> MirrorRepair {
        repair_mirror(store, user, Mirror::Created, taught).await
    }

    /// Deletes a course with its lessons, then prunes it from user mirrors.
    ///
    /// Returns the number of lessons removed. Once the course document is
    /// gone the deletion has succeeded; pruning failures are only logged.
    #[instrument(skip(store, course), fields(course.id = %course.id))]
    pub async fn cascade_course_deletion(
        store: &dyn DocumentStore,
        course: &Course,
    ) -> Result<u64, AppError> {
        let mut lessons_removed = store.delete_lessons_for_course(course.id).await?;

        let removed = store
            .delete_course(course.id)
            .await?
            .ok_or_else(|| AppError::not_found("Course not found"))?;

        // A lesson appended between the two deletes would otherwise be orphaned.
        match store.delete_lessons_for_course(course.id).await {
            Ok(count) => lessons_removed += count,
            Err(e) => reconcile_needed!(
                "lesson.course_id",
                course.id = %course.id,
                error = %e,
                "Lesson sweep after course delete failed"
            ),
        }

        let mut affected: BTreeSet<UserId> = removed.enrolled_student_ids.iter().copied().collect();
        match store.users_enrolled_in(course.id).await {
            Ok(ids) => affected.extend(ids),
            Err(e) => reconcile_needed!(
                Mirror::Enrolled.field(),
                course.id = %course.id,
                error = %e,
                "Could not list users still mirroring deleted course"
            ),
        }

        for student_id in affected {
            if let Err(e) = store.remove_enrolled_course(student_id, course.id).await {
                reconcile_needed!(
                    Mirror::Enrolled.field(),
                    student_id = %student_id,
                    course_id = %course.id,
                    error = %e,
                    "Prune after course delete failed"
                );
            }
        }

        if let Err(e) = store
            .remove_created_course(removed.teacher_id, course.id)
            .await
        {
            reconcile_needed!(
                Mirror::Created.field(),
                teacher_id = %removed.teacher_id,
                course_id = %course.id,
                error = %e,
                "Prune after course delete failed"
            );
        }

        Ok(lessons_removed)
    }

    #[instrument(skip(store))]
    pub async fn reconcile_user(
        store: &dyn DocumentStore,
        user_id: UserId,
    ) -> Result<ReconcileReport, AppError> {
        let user = store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        let enrolled_in = store.courses_with_student(user_id).await?;
        let teaches = store.courses_by_teacher(user_id).await?;

        let enrolled = repair_mirror(store, &user, Mirror::Enrolled, &enrolled_in).await;
        let created = repair_mirror(store, &user, Mirror::Created, &teaches).await;

        Ok(ReconcileReport {
            users_checked: 1,
            enrolled_added: enrolled.added,
            enrolled_removed: enrolled.removed,
            created_added: created.added,
            created_removed: created.removed,
            failures: enrolled.failed + created.failed,
        })
    }

    /// Runs [`Self::reconcile_user`] over every user, continuing past failures.
    #[instrument(skip(store))]
    pub async fn reconcile_all(store: &dyn DocumentStore) -> Result<ReconcileReport, AppError> {
        let mut report = ReconcileReport::default();

        for user_id in store.user_ids().await? {
            match Self::reconcile_user(store, user_id).await {
                Ok(user_report) => report.merge(user_report),
                Err(e) if e.is(ErrorKind::NotFound) => {}
                Err(e) => {
                    report.users_checked += 1;
                    report.failures += 1;
                    warn!(user.id = %user_id, error = ?e.error, "Reconcile failed for user");
                }
            }
        }

        Ok(report)
    }
}
