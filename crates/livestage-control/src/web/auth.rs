//! Admin authentication for the ticket routes
//!
//! The admin secret is kept only as a SHA-256 hash. Requests carry the
//! plaintext secret in the `admin-password` header.

use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const HASH_PREFIX: &str = "$sha256$";

/// Header carrying the admin secret
pub const ADMIN_HEADER: &str = "admin-password";

/// Admin authentication configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Hashed admin secret with `$sha256$` prefix; `None` locks the admin routes
    #[serde(
        default,
        deserialize_with = "deserialize_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub admin_password: Option<String>,
}

impl AuthConfig {
    /// Create a config with no admin secret
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config with the given plaintext secret
    pub fn with_secret(secret: &str) -> Self {
        Self {
            admin_password: Some(hash_secret(secret)),
        }
    }

    /// Whether an admin secret is configured
    pub fn is_enabled(&self) -> bool {
        self.admin_password.is_some()
    }

    /// Check a plaintext candidate against the stored hash
    ///
    /// Always false when no secret is configured.
    pub fn validate(&self, candidate: &str) -> bool {
        match &self.admin_password {
            Some(stored) => {
                let candidate = hash_secret(candidate);
                stored.as_bytes().ct_eq(candidate.as_bytes()).into()
            }
            None => false,
        }
    }
}

/// Always hashes; a stored hash sent as the password does not match itself
fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    format!("{}{}", HASH_PREFIX, hex::encode(hasher.finalize()))
}

/// Accept either a stored hash or a plaintext secret, which gets hashed
fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty()).map(|secret| {
        if secret.starts_with(HASH_PREFIX) {
            secret
        } else {
            hash_secret(&secret)
        }
    }))
}

/// Read the admin secret header
pub fn extract_admin_password(headers: &http::HeaderMap) -> Option<String> {
    headers
        .get(ADMIN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}
