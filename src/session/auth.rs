//! Authentication collaborator
//!
//! Supplies credentials for the login handshake. The session calls it
//! once per connect attempt and treats the challenge answer opaquely —
//! the digest algorithm lives behind the trait, not in the session.
//!
//! Handshake schemas come from the catalog and must expose app fields
//! `user_id`, `nonce` and `signed_password`; the wire names are the
//! catalog author's business.

use sha2::{Digest, Sha256};

/// Credential supplier for the two-step login handshake
pub trait CredentialSource: Send + Sync {
    /// Account identifier sent in both handshake steps
    fn user_id(&self) -> &str;

    /// Answer the server's nonce challenge
    fn respond(&self, nonce: &str) -> String;
}

/// SHA-256 challenge-response credentials
///
/// Answers `hex(sha256(nonce ":" hex(sha256(password))))`. Platforms
/// with a different digest convention implement `CredentialSource`
/// directly.
pub struct DigestCredentials {
    user_id: String,
    password: String,
}

impl DigestCredentials {
    pub fn new(user_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            password: password.into(),
        }
    }
}

impl CredentialSource for DigestCredentials {
    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn respond(&self, nonce: &str) -> String {
        let key = hex::encode(Sha256::digest(self.password.as_bytes()));
        hex::encode(Sha256::digest(format!("{}:{}", nonce, key).as_bytes()))
    }
}

// =============================================================================
// Handshake Vocabulary
// =============================================================================

/// Command id of the first handshake step
pub(crate) const AUTH_REQUEST: &str = "AuthenticationRequest";

/// Command id of the second handshake step
pub(crate) const LOGIN_REQUEST: &str = "LoginRequest";

/// App field carrying the account identifier
pub(crate) const FIELD_USER_ID: &str = "user_id";

/// App field carrying the server's challenge nonce
pub(crate) const FIELD_NONCE: &str = "nonce";

/// App field carrying the challenge answer
pub(crate) const FIELD_SIGNED_PASSWORD: &str = "signed_password";
