//! HTTP adapter mapping for domain errors.
//!
//! Keeps the domain error type HTTP-agnostic while letting Actix handlers
//! turn domain failures into consistent JSON responses and status codes.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use tracing::error;

use crate::domain::{Error, ErrorCode};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::UpstreamUnavailable => StatusCode::BAD_GATEWAY,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Strip infrastructure detail from failures clients cannot act on. The full
/// message stays in the logs.
fn redacted(err: &Error) -> Error {
    match err.code() {
        ErrorCode::InternalError => Error::internal("internal server error"),
        ErrorCode::ServiceUnavailable => {
            Error::service_unavailable("service temporarily unavailable")
        }
        ErrorCode::UpstreamUnavailable => Error::upstream("weather provider unavailable"),
        _ => err.clone(),
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            error!(code = ?self.code(), message = self.message(), "request failed");
        }
        HttpResponse::build(self.status_code()).json(redacted(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
    #[case(Error::unauthorized("no"), StatusCode::UNAUTHORIZED)]
    #[case(Error::forbidden("no"), StatusCode::FORBIDDEN)]
    #[case(Error::not_found("gone"), StatusCode::NOT_FOUND)]
    #[case(Error::upstream("down"), StatusCode::BAD_GATEWAY)]
    #[case(Error::service_unavailable("down"), StatusCode::SERVICE_UNAVAILABLE)]
    #[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
    fn codes_map_to_expected_statuses(#[case] err: Error, #[case] expected: StatusCode) {
        assert_eq!(err.status_code(), expected);
    }

    #[rstest]
    #[case(Error::internal("secret connection string"))]
    #[case(Error::service_unavailable("pool exhausted at 10.0.0.3"))]
    #[case(Error::upstream("provider key rejected"))]
    fn server_side_detail_is_redacted(#[case] err: Error) {
        let safe = redacted(&err);
        assert_eq!(safe.code(), err.code());
        assert_ne!(safe.message(), err.message());
    }

    #[test]
    fn client_errors_keep_their_message() {
        let err = Error::invalid_request("price must be positive");
        assert_eq!(redacted(&err).message(), "price must be positive");
    }
}
