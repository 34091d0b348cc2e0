//! Port abstraction for user persistence adapters.

use async_trait::async_trait;

use crate::domain::user::{User, UserId, UserProfile};

/// Persistence errors raised by user repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserPersistenceError {
    /// Repository connection could not be established.
    #[error("user repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("user repository query failed: {message}")]
    Query { message: String },
    /// A stored row could not be mapped back into the domain.
    #[error("stored user is corrupt: {message}")]
    Corrupt { message: String },
}

impl UserPersistenceError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new user record.
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user by identity-provider subject.
    async fn find_by_subject(&self, subject: &str)
    -> Result<Option<User>, UserPersistenceError>;

    /// Replace the mutable profile fields of a user.
    async fn update_profile(
        &self,
        id: &UserId,
        profile: &UserProfile,
    ) -> Result<bool, UserPersistenceError>;
}
