//! Session/identity gate.
//!
//! Tokens are issued by an external provider; this service verifies them on
//! every protected request and maps the subject onto a local user record,
//! creating one lazily on first sight.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::error::Error;
use super::ports::{
    TokenClaims, TokenVerificationError, TokenVerifier, UserPersistenceError, UserRepository,
};
use super::user::{User, UserId, UserProfile};

/// Identity gate and profile use-cases.
#[derive(Clone)]
pub struct IdentityService {
    verifier: Arc<dyn TokenVerifier>,
    users: Arc<dyn UserRepository>,
}

impl IdentityService {
    /// Create a service over the given verifier and user repository.
    pub fn new(verifier: Arc<dyn TokenVerifier>, users: Arc<dyn UserRepository>) -> Self {
        Self { verifier, users }
    }

    /// Verify a bearer token and resolve the local user, inserting a record
    /// on first successful verification of a new subject.
    ///
    /// # Errors
    /// `Unauthorized` for invalid/expired/malformed tokens;
    /// `ServiceUnavailable`/`InternalError` on repository failure.
    pub async fn authenticate(&self, token: &str) -> Result<User, Error> {
        let claims = self
            .verifier
            .verify(token)
            .map_err(map_verification_error)?;

        if let Some(user) = self
            .users
            .find_by_subject(&claims.subject)
            .await
            .map_err(map_persistence_error)?
        {
            return Ok(user);
        }

        let user = user_from_claims(claims);
        match self.users.insert(&user).await {
            Ok(()) => {
                info!(user = %user.id, subject = user.subject, "registered user on first sight");
                Ok(user)
            }
            Err(insert_error) => {
                // Two first requests for one subject can race; the loser's
                // insert trips the unique subject constraint. Resolve to the
                // row the winner committed.
                if let Some(existing) = self
                    .users
                    .find_by_subject(&user.subject)
                    .await
                    .map_err(map_persistence_error)?
                {
                    return Ok(existing);
                }
                Err(map_persistence_error(insert_error))
            }
        }
    }

    /// Fetch the profile of an authenticated user.
    ///
    /// # Errors
    /// `NotFound` when the record has been removed since authentication.
    pub async fn profile(&self, id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(map_persistence_error)?
            .ok_or_else(|| Error::not_found(format!("user {id} not found")))
    }

    /// Replace the mutable profile fields of an authenticated user.
    ///
    /// # Errors
    /// `InvalidRequest` for profile validation failures; `NotFound` when the
    /// record is gone.
    pub async fn update_profile(
        &self,
        id: &UserId,
        profile: UserProfile,
    ) -> Result<User, Error> {
        profile
            .validate()
            .map_err(|err| Error::invalid_request(err.to_string()))?;

        let updated = self
            .users
            .update_profile(id, &profile)
            .await
            .map_err(map_persistence_error)?;
        if !updated {
            return Err(Error::not_found(format!("user {id} not found")));
        }
        self.profile(id).await
    }
}

fn user_from_claims(claims: TokenClaims) -> User {
    let display_name = claims
        .name
        .clone()
        .or_else(|| claims.email.clone())
        .unwrap_or_else(|| claims.subject.clone());
    User {
        id: UserId::generate(),
        subject: claims.subject,
        profile: UserProfile {
            display_name,
            email: claims.email,
            phone: None,
            location: None,
        },
        created_at: Utc::now().naive_utc(),
    }
}

fn map_verification_error(error: TokenVerificationError) -> Error {
    Error::unauthorized(error.to_string())
}

fn map_persistence_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => Error::service_unavailable(message),
        UserPersistenceError::Query { message } | UserPersistenceError::Corrupt { message } => {
            Error::internal(message)
        }
    }
}
