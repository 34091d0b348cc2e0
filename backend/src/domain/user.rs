//! User identity and profile.
//!
//! Users are created lazily: the first request carrying a valid identity
//! token inserts a local record keyed by the token subject. The subject is
//! immutable after that; profile fields may change.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Opaque user identifier (UUID v4).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier from its canonical string form.
    ///
    /// # Errors
    /// Returns the underlying parse error when `raw` is not a valid UUID.
    pub fn parse(raw: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(raw).map(Self)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mutable profile fields attached to a user record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Human-readable display name.
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// A registered farmer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    /// Identity-provider subject this record is keyed by. Immutable.
    pub subject: String,
    #[serde(flatten)]
    pub profile: UserProfile,
    pub created_at: NaiveDateTime,
}

/// Validation failures for profile updates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileValidationError {
    #[error("display name must not be empty")]
    EmptyDisplayName,
    #[error("display name must be at most {0} characters")]
    DisplayNameTooLong(usize),
}

const MAX_DISPLAY_NAME_LEN: usize = 100;

impl UserProfile {
    /// Validate invariants shared by creation and update paths.
    ///
    /// # Errors
    /// Returns a [`ProfileValidationError`] naming the violated constraint.
    pub fn validate(&self) -> Result<(), ProfileValidationError> {
        let name = self.display_name.trim();
        if name.is_empty() {
            return Err(ProfileValidationError::EmptyDisplayName);
        }
        if name.chars().count() > MAX_DISPLAY_NAME_LEN {
            return Err(ProfileValidationError::DisplayNameTooLong(
                MAX_DISPLAY_NAME_LEN,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn profile(name: &str) -> UserProfile {
        UserProfile {
            display_name: name.to_owned(),
            ..UserProfile::default()
        }
    }

    #[rstest]
    #[case("Asha Patel")]
    #[case("  padded  ")]
    fn accepts_reasonable_display_names(#[case] name: &str) {
        assert!(profile(name).validate().is_ok());
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn rejects_blank_display_names(#[case] name: &str) {
        assert_eq!(
            profile(name).validate(),
            Err(ProfileValidationError::EmptyDisplayName)
        );
    }

    #[test]
    fn rejects_overlong_display_names() {
        let name = "x".repeat(101);
        assert!(matches!(
            profile(&name).validate(),
            Err(ProfileValidationError::DisplayNameTooLong(_))
        ));
    }

    #[test]
    fn user_id_round_trips_through_string() {
        let id = UserId::generate();
        let parsed = UserId::parse(&id.to_string()).expect("canonical form parses");
        assert_eq!(parsed, id);
    }
}
