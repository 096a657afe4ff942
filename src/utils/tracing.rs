//! Structured logging helpers shared by the request path and the CLI.
//!
//! Security and audit events get stable field names so log pipelines can
//! filter on them. Writes that leave a mirror out of step with its
//! authoritative copy are logged through [`reconcile_needed!`] so an
//! operator can find them and run `lectern-cli reconcile`.

use tracing::Span;

/// Log a security-relevant event at WARN level
///
/// Use this for failed authentication, role denials and stale credentials.
#[macro_export]
macro_rules! security_event {
    ($event:expr, $($field:tt)*) => {
        tracing::warn!(
            security.event = $event,
            $($field)*
        )
    };
}

/// Log an audit event at INFO level
///
/// Use this for state changes a user initiated: enrollments, course and
/// lesson edits, studio creation.
#[macro_export]
macro_rules! audit_event {
    ($action:expr, $resource:expr, $($field:tt)*) => {
        tracing::info!(
            audit.action = $action,
            audit.resource = $resource,
            $($field)*
        )
    };
}

/// Log a write that left a mirror field disagreeing with its source.
///
/// The entry carries `reconcile = true` and the name of the mirror.
///
/// # Example
/// ```ignore
/// reconcile_needed!("user.enrolled_course_ids", user.id = %id, error = %e);
/// ```
#[macro_export]
macro_rules! reconcile_needed {
    ($mirror:expr, $($field:tt)*) => {
        tracing::error!(
            reconcile = true,
            mirror = $mirror,
            $($field)*
        )
    };
}

/// Record the authenticated user on the current span
pub fn record_user_id(user_id: &str) {
    Span::current().record("user.id", user_id);
}

/// Record a failed operation on the current span with an error message
pub fn record_error(message: &str) {
    let span = Span::current();
    span.record("otel.status_code", "ERROR");
    span.record("error.message", message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_helpers_without_span() {
        record_user_id("00000000-0000-0000-0000-000000000000");
        record_error("store timed out");
    }

    #[test]
    fn test_event_macros_compile() {
        let id = "abc";
        security_event!("auth.test", user.id = %id, "Security event");
        audit_event!("test", "course", course.id = %id, "Audit event");
        reconcile_needed!("course.lesson_ids", course.id = %id, "Mirror drift");
    }
}
