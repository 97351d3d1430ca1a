//! Transport-agnostic error payload returned at the service boundary.
//!
//! Layer errors (store, authentication, authorisation) are mapped into
//! [`Error`] by the inbound adapters, which then decide the HTTP status from
//! the [`ErrorCode`].

use std::fmt;

use serde::{Deserialize, Serialize};

use super::trace_id::TraceId;

/// Stable machine-readable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is malformed or fails validation.
    InvalidRequest,
    /// Authentication or authorisation failed.
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    Forbidden,
    /// The requested resource does not exist.
    NotFound,
    /// The request conflicts with existing state, e.g. a taken email.
    Conflict,
    /// A backing service could not be reached.
    ServiceUnavailable,
    /// Anything else.
    InternalError,
}

impl ErrorCode {
    /// Title used when the caller does not provide one.
    pub fn default_title(self) -> &'static str {
        match self {
            Self::InvalidRequest => "Invalid Request",
            Self::Unauthorized => "Authorization Error",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "Not Found",
            Self::Conflict => "Conflict",
            Self::ServiceUnavailable => "Service Unavailable",
            Self::InternalError => "Internal Error",
        }
    }
}

/// Error body: `{title, description, code}` plus an optional `traceId`.
///
/// The trace identifier in scope at construction time is captured
/// automatically.
///
/// # Examples
/// ```
/// use accounts::domain::{Error, ErrorCode};
///
/// let err = Error::unauthorized("no session user");
/// assert_eq!(err.code(), ErrorCode::Unauthorized);
/// assert_eq!(err.title(), "Authorization Error");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Error {
    title: String,
    description: String,
    code: ErrorCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,
}

impl Error {
    /// Create an error titled after its code.
    pub fn new(code: ErrorCode, description: impl Into<String>) -> Self {
        Self {
            title: code.default_title().to_owned(),
            description: description.into(),
            code,
            trace_id: TraceId::current().map(|id| id.to_string()),
        }
    }

    /// Replace the default title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Attach an explicit trace identifier.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(description: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, description)
    }

    /// Convenience constructor for [`ErrorCode::Unauthorized`].
    pub fn unauthorized(description: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, description)
    }

    /// Convenience constructor for [`ErrorCode::Forbidden`].
    pub fn forbidden(description: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, description)
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(description: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, description)
    }

    /// Convenience constructor for [`ErrorCode::Conflict`].
    pub fn conflict(description: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, description)
    }

    /// Convenience constructor for [`ErrorCode::ServiceUnavailable`].
    pub fn service_unavailable(description: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, description)
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(description: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, description)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

impl std::error::Error for Error {}
