//! External identity providers.
//!
//! An [`IdentityProvider`] turns a token minted by a third party into the
//! subject, email and display name it vouches for. Account lookup and
//! creation happen elsewhere; this module only decides whether to believe
//! the token.
//!
//! [`GoogleIdTokenVerifier`] checks Google ID tokens offline against a JSON
//! Web Key Set loaded at startup.

use std::path::Path;

use async_trait::async_trait;
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;

pub const GOOGLE_PROVIDER: &str = "google";

const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// What a provider asserts about the person holding a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    pub subject: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The token is malformed, expired, mis-signed or meant for someone else
    #[error("Identity token rejected: {0}")]
    Rejected(String),

    /// The provider has no keys or client id to check against
    #[error("Identity provider is not configured")]
    NotConfigured,

    /// The key set could not be read at startup
    #[error("Failed to load key set: {0}")]
    KeySet(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Name stored alongside the subject on linked accounts.
    fn provider(&self) -> &'static str;

    async fn verify(&self, token: &str) -> Result<ExternalIdentity, IdentityError>;
}

#[derive(Debug, Deserialize)]
struct GoogleClaims {
    sub: String,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
}

pub struct GoogleIdTokenVerifier {
    client_id: String,
    keys: JwkSet,
}

impl GoogleIdTokenVerifier {
    pub fn new(client_id: impl Into<String>, keys: JwkSet) -> Self {
        Self {
            client_id: client_id.into(),
            keys,
        }
    }

    /// Reads the key set from a JWKS document on disk.
    pub fn from_jwks_file(
        client_id: impl Into<String>,
        path: &Path,
    ) -> Result<Self, IdentityError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| IdentityError::KeySet(format!("{}: {}", path.display(), e)))?;
        let keys: JwkSet =
            serde_json::from_str(&raw).map_err(|e| IdentityError::KeySet(e.to_string()))?;

        if keys.keys.is_empty() {
            return Err(IdentityError::KeySet(format!("{}: no keys", path.display())));
        }

        Ok(Self::new(client_id, keys))
    }

    fn decode_identity(&self, token: &str) -> Result<ExternalIdentity, IdentityError> {
        let header = decode_header(token).map_err(rejected)?;
        let kid = header
            .kid
            .ok_or_else(|| IdentityError::Rejected("token has no key id".to_string()))?;
        let jwk = self
            .keys
            .find(&kid)
            .ok_or_else(|| IdentityError::Rejected(format!("unknown key id '{}'", kid)))?;

        let algorithm = algorithm_for(jwk)?;
        if header.alg != algorithm {
            return Err(IdentityError::Rejected(format!(
                "algorithm {:?} does not match key",
                header.alg
            )));
        }

        let key = DecodingKey::from_jwk(jwk).map_err(rejected)?;
        let mut validation = Validation::new(algorithm);
        validation.set_audience(&[self.client_id.as_str()]);
        validation.set_issuer(&GOOGLE_ISSUERS);

        let claims = decode::<GoogleClaims>(token, &key, &validation)
            .map_err(rejected)?
            .claims;

        if claims.email_verified == Some(false) {
            return Err(IdentityError::Rejected("email not verified".to_string()));
        }
        let email = claims
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| IdentityError::Rejected("token carries no email".to_string()))?;
        let name = claims
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| display_name_from_email(&email));

        Ok(ExternalIdentity {
            subject: claims.sub,
            email,
            name,
        })
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdTokenVerifier {
    fn provider(&self) -> &'static str {
        GOOGLE_PROVIDER
    }

    async fn verify(&self, token: &str) -> Result<ExternalIdentity, IdentityError> {
        self.decode_identity(token)
    }
}

/// Stands in when no provider is configured; every token is refused.
#[derive(Debug, Default)]
pub struct UnconfiguredIdentityProvider;

#[async_trait]
impl IdentityProvider for UnconfiguredIdentityProvider {
    fn provider(&self) -> &'static str {
        GOOGLE_PROVIDER
    }

    async fn verify(&self, _token: &str) -> Result<ExternalIdentity, IdentityError> {
        Err(IdentityError::NotConfigured)
    }
}

fn algorithm_for(jwk: &Jwk) -> Result<Algorithm, IdentityError> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(_) => Ok(Algorithm::RS256),
        AlgorithmParameters::EllipticCurve(_) => Ok(Algorithm::ES256),
        AlgorithmParameters::OctetKey(_) => Ok(Algorithm::HS256),
        AlgorithmParameters::OctetKeyPair(_) => Ok(Algorithm::EdDSA),
    }
}

fn display_name_from_email(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

fn rejected(err: jsonwebtoken::errors::Error) -> IdentityError {
    IdentityError::Rejected(err.to_string())
}
