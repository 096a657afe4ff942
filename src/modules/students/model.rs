use serde::Serialize;
use utoipa::ToSchema;

pub use lectern_models::{Course, CoursesResponse, MessageResponse};

/// Entries a reconciliation pass added to or removed from user mirrors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub users_checked: usize,
    pub enrolled_added: usize,
    pub enrolled_removed: usize,
    pub created_added: usize,
    pub created_removed: usize,
    pub failures: usize,
}

impl ReconcileReport {
    pub fn merge(&mut self, other: ReconcileReport) {
        self.users_checked += other.users_checked;
        self.enrolled_added += other.enrolled_added;
        self.enrolled_removed += other.enrolled_removed;
        self.created_added += other.created_added;
        self.created_removed += other.created_removed;
        self.failures += other.failures;
    }

    pub fn is_clean(&self) -> bool {
        self.enrolled_added == 0
            && self.enrolled_removed == 0
            && self.created_added == 0
            && self.created_removed == 0
            && self.failures == 0
    }
}

/// Result of bringing one mirror list in line with its source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorRepair {
    pub added: usize,
    pub removed: usize,
    pub failed: usize,
}
