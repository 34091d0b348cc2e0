//! HTTP inbound adapter exposing REST endpoints.

pub mod auth;
pub mod error;
pub mod health;
pub mod listings;
pub mod state;
pub mod users;
pub mod weather;

pub use error::ApiResult;
