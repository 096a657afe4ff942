//! Page-based pagination for the public course catalog.
//!
//! `limit` is clamped to [1, 100] and `page` to a minimum of 1. Empty query
//! values (`?page=`) are treated as absent. Offsets saturate, so a page far
//! past the end is simply empty.

use serde::{Deserialize, Deserializer};
use utoipa::{IntoParams, ToSchema};

fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => s.parse::<i64>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// Page number (1-indexed, default: 1)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
    /// Items per page (1-100, default: 10)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
}

impl PageParams {
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }

    #[must_use]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    #[must_use]
    pub fn total_pages(&self, total: i64) -> i64 {
        (total + self.limit() - 1) / self.limit()
    }
}
