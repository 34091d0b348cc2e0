//! Port abstraction for identity-token verification.
//!
//! Credential checks live with the external identity provider; this port only
//! verifies the tokens it issues and surfaces the embedded claims.

/// Claims extracted from a verified identity token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// Stable subject identifier the local user record is keyed by.
    pub subject: String,
    /// Display name claim, when the provider includes one.
    pub name: Option<String>,
    /// Email claim, when the provider includes one.
    pub email: Option<String>,
}

/// Verification failures. All of them surface as 401 to clients.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenVerificationError {
    #[error("token is malformed")]
    Malformed,
    #[error("token has expired")]
    Expired,
    #[error("token is invalid: {message}")]
    Invalid { message: String },
}

impl TokenVerificationError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

pub trait TokenVerifier: Send + Sync {
    /// Verify signature, expiry, and issuer of a bearer token.
    ///
    /// # Errors
    /// Returns a [`TokenVerificationError`] describing why the token was
    /// rejected.
    fn verify(&self, token: &str) -> Result<TokenClaims, TokenVerificationError>;
}
