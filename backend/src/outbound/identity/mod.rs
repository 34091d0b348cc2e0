//! Identity provider adapter.

pub mod jwt_verifier;

pub use jwt_verifier::JwtVerifier;
