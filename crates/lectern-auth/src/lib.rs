//! # Lectern Auth
//!
//! Credential types and JWT utilities for the Lectern API.
//!
//! - [`claims`]: The claims carried inside a session credential
//! - [`jwt`]: Issuing and verifying credentials
//! - [`identity`]: Checking tokens minted by external identity providers
//!
//! The role inside a credential is informational. Request authorization
//! always re-reads the role from the store.

pub mod claims;
pub mod identity;
pub mod jwt;

pub use claims::Claims;
pub use identity::{
    ExternalIdentity, GOOGLE_PROVIDER, GoogleIdTokenVerifier, IdentityError, IdentityProvider,
    UnconfiguredIdentityProvider,
};
pub use jwt::{create_access_token, verify_token};
