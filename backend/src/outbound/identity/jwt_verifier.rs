//! HS256 bearer-token verification for the external identity provider.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;

use crate::domain::ports::{TokenClaims, TokenVerificationError, TokenVerifier};

/// Wire shape of the provider's token payload.
#[derive(Debug, Deserialize)]
struct WireClaims {
    sub: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

/// Verifies provider-issued HS256 tokens against a shared signing key.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Build a verifier for the given signing secret. When `issuer` is set,
    /// tokens from any other issuer are rejected.
    pub fn new(secret: &[u8], issuer: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }
        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<TokenClaims, TokenVerificationError> {
        let data = decode::<WireClaims>(token, &self.key, &self.validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => TokenVerificationError::Expired,
                ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) => {
                    TokenVerificationError::Malformed
                }
                other => TokenVerificationError::invalid(format!("{other:?}")),
            }
        })?;

        if data.claims.sub.trim().is_empty() {
            return Err(TokenVerificationError::invalid("empty subject claim"));
        }
        Ok(TokenClaims {
            subject: data.claims.sub,
            name: data.claims.name.filter(|name| !name.trim().is_empty()),
            email: data.claims.email.filter(|email| !email.trim().is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde::Serialize;

    const SECRET: &[u8] = b"test-signing-key";

    #[derive(Serialize)]
    struct TestClaims {
        sub: String,
        exp: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        iss: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        email: Option<String>,
    }

    fn token(claims: &TestClaims, secret: &[u8]) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .expect("encode")
    }

    fn claims(sub: &str, exp_offset_secs: i64) -> TestClaims {
        TestClaims {
            sub: sub.to_owned(),
            exp: chrono::Utc::now().timestamp() + exp_offset_secs,
            iss: None,
            name: Some("Ada".to_owned()),
            email: Some("ada@example.com".to_owned()),
        }
    }

    #[test]
    fn valid_token_yields_claims() {
        let verifier = JwtVerifier::new(SECRET, None);
        let verified = verifier
            .verify(&token(&claims("auth0|ada", 3600), SECRET))
            .expect("verifies");
        assert_eq!(verified.subject, "auth0|ada");
        assert_eq!(verified.name.as_deref(), Some("Ada"));
        assert_eq!(verified.email.as_deref(), Some("ada@example.com"));
    }

    #[test]
    fn expired_token_is_rejected_as_expired() {
        let verifier = JwtVerifier::new(SECRET, None);
        let result = verifier.verify(&token(&claims("auth0|ada", -3600), SECRET));
        assert_eq!(result, Err(TokenVerificationError::Expired));
    }

    #[test]
    fn wrong_signature_is_rejected() {
        let verifier = JwtVerifier::new(SECRET, None);
        let result = verifier.verify(&token(&claims("auth0|ada", 3600), b"other-key"));
        assert!(result.is_err());
        assert_ne!(result, Err(TokenVerificationError::Expired));
    }

    #[test]
    fn garbage_is_rejected_as_malformed() {
        let verifier = JwtVerifier::new(SECRET, None);
        assert_eq!(
            verifier.verify("not.a.token"),
            Err(TokenVerificationError::Malformed)
        );
    }

    #[test]
    fn issuer_mismatch_is_rejected() {
        let verifier = JwtVerifier::new(SECRET, Some("farm-id"));
        let mut wrong = claims("auth0|ada", 3600);
        wrong.iss = Some("someone-else".to_owned());
        assert!(verifier.verify(&token(&wrong, SECRET)).is_err());

        let mut right = claims("auth0|ada", 3600);
        right.iss = Some("farm-id".to_owned());
        assert!(verifier.verify(&token(&right, SECRET)).is_ok());
    }

    #[test]
    fn blank_optional_claims_become_none() {
        let verifier = JwtVerifier::new(SECRET, None);
        let mut blank = claims("auth0|ada", 3600);
        blank.name = Some("  ".to_owned());
        blank.email = None;
        let verified = verifier.verify(&token(&blank, SECRET)).expect("verifies");
        assert_eq!(verified.name, None);
        assert_eq!(verified.email, None);
    }
}
