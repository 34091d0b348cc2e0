//! Profile HTTP handlers.
//!
//! ```text
//! GET /api/v1/profile   Authenticated user's profile
//! PUT /api/v1/profile   Replace the mutable profile fields
//! ```

use actix_web::{HttpResponse, get, put, web};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, User, UserProfile};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::state::HttpState;

/// Profile as returned to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            display_name: user.profile.display_name,
            email: user.profile.email,
            phone: user.profile.phone,
            location: user.profile.location,
            created_at: user.created_at,
        }
    }
}

/// Request body replacing the mutable profile fields. Absent optional
/// fields are cleared.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    pub display_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl From<ProfileRequest> for UserProfile {
    fn from(request: ProfileRequest) -> Self {
        Self {
            display_name: request.display_name,
            email: request.email,
            phone: request.phone,
            location: request.location,
        }
    }
}

/// Fetch the authenticated user's profile.
#[utoipa::path(
    get,
    path = "/api/v1/profile",
    responses(
        (status = 200, description = "The caller's profile", body = ProfileResponse),
        (status = 401, description = "Missing or invalid token", body = Error)
    ),
    tags = ["users"],
    operation_id = "getProfile"
)]
#[get("/profile")]
pub async fn get_profile(user: AuthenticatedUser) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ProfileResponse::from(user.0)))
}

/// Replace the authenticated user's profile.
#[utoipa::path(
    put,
    path = "/api/v1/profile",
    request_body = ProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = ProfileResponse),
        (status = 400, description = "Validation failure", body = Error),
        (status = 401, description = "Missing or invalid token", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateProfile"
)]
#[put("/profile")]
pub async fn update_profile(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    body: web::Json<ProfileRequest>,
) -> ApiResult<HttpResponse> {
    let updated = state
        .identity
        .update_profile(&user.0.id, body.into_inner().into())
        .await?;
    Ok(HttpResponse::Ok().json(ProfileResponse::from(updated)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_optional_fields_deserialise_as_none() {
        let request: ProfileRequest =
            serde_json::from_str(r#"{"displayName": "Ada"}"#).expect("parses");
        assert_eq!(request.display_name, "Ada");
        assert_eq!(request.email, None);
        assert_eq!(request.phone, None);
        assert_eq!(request.location, None);
    }
}
