//! Bearer-token authentication for HTTP handlers.
//!
//! Handlers take [`AuthenticatedUser`] as an extractor argument; extraction
//! verifies the `Authorization` header against the identity service and
//! resolves the local user record, so handler bodies never see raw tokens.

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Error, User};
use crate::inbound::http::state::HttpState;

const BEARER_PREFIX: &str = "Bearer ";

/// The verified caller, resolved to a local user record.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Pull the bearer token out of the `Authorization` header.
fn bearer_token(req: &HttpRequest) -> Result<String, Error> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized("missing Authorization header"))?;
    let value = header
        .to_str()
        .map_err(|_| Error::unauthorized("Authorization header is not valid UTF-8"))?;
    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or_else(|| Error::unauthorized("Authorization header must use the Bearer scheme"))?
        .trim();
    if token.is_empty() {
        return Err(Error::unauthorized("bearer token is empty"));
    }
    Ok(token.to_owned())
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let state = req
                .app_data::<web::Data<HttpState>>()
                .cloned()
                .ok_or_else(|| Error::internal("http state is not configured"))?;
            let token = bearer_token(&req)?;
            let user = state.identity.authenticate(&token).await?;
            Ok(Self(user))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use actix_web::test::TestRequest;
    use rstest::rstest;

    #[rstest]
    #[case(TestRequest::default())]
    #[case(TestRequest::default().insert_header((header::AUTHORIZATION, "Basic dXNlcg==")))]
    #[case(TestRequest::default().insert_header((header::AUTHORIZATION, "Bearer ")))]
    fn unusable_headers_are_unauthorized(#[case] request: TestRequest) {
        let req = request.to_http_request();
        let err = bearer_token(&req).expect_err("rejected");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[test]
    fn bearer_token_is_extracted_and_trimmed() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer abc.def.ghi "))
            .to_http_request();
        assert_eq!(bearer_token(&req).expect("token"), "abc.def.ghi");
    }
}
