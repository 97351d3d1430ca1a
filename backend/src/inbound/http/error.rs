//! HTTP adapter mapping for domain errors.
//!
//! Layer errors are folded into the transport-agnostic [`Error`] here, and
//! [`Error`] is rendered as a JSON body with a status derived from its code.
//! Every authentication and authorisation failure becomes `401`.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use tracing::{error, warn};

use crate::domain::ports::StoreError;
use crate::domain::{AuthError, Error, ErrorCode, FriendError, UserValidationError};
use crate::middleware::trace::TRACE_ID_HEADER;

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn redact_if_internal(error: &Error) -> Error {
    if matches!(error.code(), ErrorCode::InternalError) {
        let mut redacted = Error::internal("Internal server error");
        if let Some(id) = error.trace_id() {
            redacted = redacted.with_trace_id(id);
        }
        redacted
    } else {
        error.clone()
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        builder.json(redact_if_internal(self))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "actix error promoted to domain error");
        Error::internal("Internal server error")
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Error::not_found("resource not found"),
            StoreError::DuplicateKey { .. } => Error::conflict("resource already exists"),
            StoreError::Connection { message } => {
                warn!(%message, "document store unavailable");
                Error::service_unavailable("document store unavailable")
            }
            other => {
                error!(error = %other, "document store failure");
                Error::internal(other.to_string())
            }
        }
    }
}

impl From<AuthError> for Error {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AlreadyRegistered => Error::conflict(err.to_string()),
            AuthError::AlreadyAuthenticated { .. }
            | AuthError::Credentials(_)
            | AuthError::UserNotFound
            | AuthError::InvalidCredentials
            | AuthError::NoSession => Error::unauthorized(err.to_string()),
            AuthError::Hash(_) | AuthError::Session(_) => {
                error!(error = %err, "authentication infrastructure failure");
                Error::internal(err.to_string())
            }
            AuthError::Store(store) => store.into(),
        }
    }
}

impl From<FriendError> for Error {
    fn from(err: FriendError) -> Self {
        let description = err.to_string();
        match err {
            FriendError::Invalid | FriendError::Unpersisted => {
                Error::invalid_request(description).with_title("Friend Error")
            }
            FriendError::AlreadyFriend => Error::conflict(description).with_title("Friend Error"),
            FriendError::NotFound => Error::not_found(description).with_title("Friend Error"),
        }
    }
}

impl From<UserValidationError> for Error {
    fn from(err: UserValidationError) -> Self {
        Error::invalid_request(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::ports::CredentialError;
    use crate::domain::{Email, User};
    use actix_web::body::to_bytes;
    use rstest::rstest;
    use serde_json::Value;

    #[rstest]
    #[case(AuthError::UserNotFound)]
    #[case(AuthError::InvalidCredentials)]
    #[case(AuthError::NoSession)]
    #[case(AuthError::Credentials(CredentialError::missing()))]
    #[case(AuthError::AlreadyAuthenticated {
        user: Arc::new(User::new(Email::new("ada@example.com").expect("email"))),
    })]
    fn authentication_failures_are_unauthorised(#[case] err: AuthError) {
        assert_eq!(Error::from(err).status_code(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[case(AuthError::AlreadyRegistered, StatusCode::CONFLICT)]
    #[case(AuthError::Store(StoreError::not_found()), StatusCode::NOT_FOUND)]
    #[case(AuthError::Store(StoreError::connection("refused")), StatusCode::SERVICE_UNAVAILABLE)]
    #[case(AuthError::Store(StoreError::query("bad")), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(AuthError::Store(StoreError::duplicate_key("user.email_1")), StatusCode::CONFLICT)]
    #[case(AuthError::Hash(CredentialError::hash("oom")), StatusCode::INTERNAL_SERVER_ERROR)]
    fn other_failures_map_by_kind(#[case] err: AuthError, #[case] expected: StatusCode) {
        assert_eq!(Error::from(err).status_code(), expected);
    }

    #[rstest]
    #[case(FriendError::Invalid, StatusCode::BAD_REQUEST)]
    #[case(FriendError::AlreadyFriend, StatusCode::CONFLICT)]
    #[case(FriendError::NotFound, StatusCode::NOT_FOUND)]
    fn friend_failures_map_by_kind(#[case] err: FriendError, #[case] expected: StatusCode) {
        assert_eq!(Error::from(err).status_code(), expected);
    }

    #[actix_web::test]
    async fn internal_errors_are_redacted_in_body() {
        let error = Error::internal("connection string leaked").with_trace_id("abc");

        let response = error.error_response();
        assert_eq!(response.headers().get(TRACE_ID_HEADER).map(|v| v.as_bytes()), Some(&b"abc"[..]));
        let body = to_bytes(response.into_body()).await.expect("body");
        let value: Value = serde_json::from_slice(&body).expect("json body");

        assert_eq!(value["description"], "Internal server error");
        assert_eq!(value["traceId"], "abc");
        assert_eq!(value["code"], "internal_error");
    }

    #[actix_web::test]
    async fn unauthorised_body_keeps_description() {
        let response = Error::unauthorized("no session user").error_response();
        let body = to_bytes(response.into_body()).await.expect("body");
        let value: Value = serde_json::from_slice(&body).expect("json body");

        assert_eq!(value["title"], "Authorization Error");
        assert_eq!(value["description"], "no session user");
    }
}
