//! Extractors and guards for authentication and authorization.
//!
//! # Modules
//!
//! - [`auth`]: Resolves the session credential to a [`auth::Principal`]
//! - [`role`]: Role checks and role-gated extractors
//! - [`ownership`]: Per-course ownership and enrollment checks
//!
//! # Request Flow
//!
//! 1. The credential is read from the session cookie, or from
//!    `Authorization: Bearer <token>` when no cookie is present
//! 2. `AuthUser` verifies it and loads the user, taking the role from the store
//! 3. Role extractors such as `RequireTeacher` reject other roles with 403
//! 4. Course-scoped handlers call `authorize_course` before touching data
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::role::RequireStudent;
//!
//! async fn enroll(
//!     State(state): State<AppState>,
//!     RequireStudent(principal): RequireStudent,
//!     ValidPath(course_id): ValidPath<CourseId>,
//! ) -> Result<Json<MessageResponse>, AppError> {
//!     // Only executes for callers whose stored role is student
//! }
//! ```

pub mod auth;
pub mod ownership;
pub mod role;
