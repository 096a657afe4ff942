//! # Lectern Config
//!
//! Configuration types for the Lectern API.
//!
//! This crate provides configuration structures loaded from environment variables:
//!
//! - [`jwt`]: Credential signing and lifetime
//! - [`cookie`]: Session cookie attributes
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`database`]: Connection pool sizing and acquire timeout
//! - [`studio`]: Base URL used when building studio links
//! - [`oauth`]: Google sign-in client id and signing keys
//!
//! Every value has a development default; nothing here panics on a missing
//! variable.
//!
//! # Example
//!
//! ```ignore
//! use lectern_config::{CookieConfig, CorsConfig, JwtConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let cookie_config = CookieConfig::from_env();
//! let cors_config = CorsConfig::from_env();
//! ```

pub mod cookie;
pub mod cors;
pub mod database;
pub mod jwt;
pub mod oauth;
pub mod studio;

pub use cookie::CookieConfig;
pub use cors::CorsConfig;
pub use database::DatabaseConfig;
pub use jwt::JwtConfig;
pub use oauth::OAuthConfig;
pub use studio::StudioConfig;
