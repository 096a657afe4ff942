use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::{StudioId, UserId};
use crate::users::UserSummary;

/// A live studio. `invite_code` is globally unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Studio {
    pub id: StudioId,
    pub name: String,
    pub host_id: UserId,
    pub invite_code: String,
    pub created_at: DateTime<Utc>,
}

impl Studio {
    pub fn new(name: &str, host_id: UserId, invite_code: String) -> Self {
        Self {
            id: StudioId::new(),
            name: name.trim().to_string(),
            host_id,
            invite_code,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateStudioDto {
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "Office hours")]
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudioResponse {
    pub message: String,
    pub studio_link: String,
    pub studio: Studio,
}

/// A studio as seen by a joining student.
#[derive(Debug, Serialize, ToSchema)]
pub struct StudioWithHost {
    #[serde(flatten)]
    pub studio: Studio,
    pub host: Option<UserSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StudioResponse {
    pub studio: StudioWithHost,
}
