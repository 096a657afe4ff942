use anyhow::anyhow;
use lectern_core::AppError;
use lectern_db::DocumentStore;
use lectern_models::UserRole;
use rand::{Rng, distributions::Alphanumeric};
use tracing::{instrument, warn};

use super::model::{CreateStudioDto, Studio, StudioWithHost, UserSummary};
use crate::audit_event;
use crate::middleware::auth::Principal;
use crate::middleware::role::check_role;

pub const INVITE_CODE_LEN: usize = 10;
const MAX_CODE_ATTEMPTS: usize = 5;

pub fn generate_invite_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(INVITE_CODE_LEN)
        .map(char::from)
        .collect()
}

pub struct StudioService;

impl StudioService {
    #[instrument(skip(store, principal, dto), fields(host.id = %principal.id))]
    pub async fn create_studio(
        store: &dyn DocumentStore,
        principal: &Principal,
        dto: CreateStudioDto,
    ) -> Result<Studio, AppError> {
        Self::create_studio_with(store, principal, dto, generate_invite_code).await
    }

    /// Creates a studio, drawing a fresh code from `next_code` on collision.
    pub async fn create_studio_with<F>(
        store: &dyn DocumentStore,
        principal: &Principal,
        dto: CreateStudioDto,
        mut next_code: F,
    ) -> Result<Studio, AppError>
    where
        F: FnMut() -> String + Send,
    {
        check_role(principal, UserRole::Teacher, "Only teachers can create studios")?;

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let studio = Studio::new(&dto.name, principal.id, next_code());

            match store.insert_studio(&studio).await {
                Ok(()) => {
                    audit_event!("create", "studio", studio.id = %studio.id, host.id = %principal.id, "Studio created");
                    return Ok(studio);
                }
                Err(e) if e.is_duplicate_key() => {
                    warn!(attempt, "Invite code collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::infrastructure(anyhow!(
            "no unique invite code after {} attempts",
            MAX_CODE_ATTEMPTS
        )))
    }

    #[instrument(skip(store, principal), fields(user.id = %principal.id))]
    pub async fn get_by_invite_code(
        store: &dyn DocumentStore,
        principal: &Principal,
        invite_code: &str,
    ) -> Result<StudioWithHost, AppError> {
        check_role(principal, UserRole::Student, "Access denied. Student role required.")?;

        let studio = store
            .find_studio_by_invite_code(invite_code.trim())
            .await?
            .ok_or_else(|| AppError::not_found("Studio not found"))?;

        let host = store
            .find_user(studio.host_id)
            .await?
            .map(|user| UserSummary::from(&user));

        Ok(StudioWithHost { studio, host })
    }
}
