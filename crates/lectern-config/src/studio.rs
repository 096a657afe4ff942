use std::env;

#[derive(Clone, Debug)]
pub struct StudioConfig {
    /// Prefix for generated studio links, without a trailing slash.
    pub link_base: String,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            link_base: "http://localhost:5173/studio".to_string(),
        }
    }
}

impl StudioConfig {
    pub fn from_env() -> Self {
        let link_base = env::var("STUDIO_LINK_BASE")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| Self::default().link_base);

        Self { link_base }
    }

    pub fn link_for(&self, invite_code: &str) -> String {
        format!("{}/{}", self.link_base, invite_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_for_joins_code() {
        let config = StudioConfig {
            link_base: "https://lectern.test/studio".to_string(),
        };
        assert_eq!(config.link_for("AbC123xyZ0"), "https://lectern.test/studio/AbC123xyZ0");
    }
}
