//! Authentication request and error types used by the user manager.
//!
//! Inbound adapters translate transport details (JSON body, `Authorization`
//! header, session cookie) into an [`AuthRequest`] so the domain never sees
//! HTTP types.

use std::fmt;
use std::sync::Arc;

use zeroize::Zeroizing;

use super::ports::{CredentialError, SessionError, StoreError};
use super::session::{Principal, Session, SessionCookie};

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginValidationError {
    /// Username was missing or blank once trimmed.
    #[error("username must not be empty")]
    EmptyUsername,
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
}

/// Validated login credentials.
///
/// ## Invariants
/// - `username` is trimmed and non-empty.
/// - `password` is non-empty and keeps caller whitespace; it is zeroed on
///   drop.
///
/// # Examples
/// ```
/// use accounts::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" ada@example.com ", "pw").expect("valid");
/// assert_eq!(creds.username(), "ada@example.com");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw username/password inputs.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = username.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyUsername);
        }
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            username: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Username and password exactly as submitted in a login body.
///
/// Not validated; the [`AuthenticationProcessor`](super::ports::AuthenticationProcessor)
/// turns it into [`LoginCredentials`] so blank values fail as credential
/// errors after the session check.
#[derive(Clone, PartialEq, Eq)]
pub struct SubmittedCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl SubmittedCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    /// Validate into [`LoginCredentials`].
    pub fn validate(&self) -> Result<LoginCredentials, LoginValidationError> {
        LoginCredentials::try_from_parts(&self.username, &self.password)
    }
}

impl fmt::Debug for SubmittedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmittedCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything an authentication attempt may draw on, plus the response-side
/// cookie slot the user manager fills on success.
#[derive(Debug, Clone, Default)]
pub struct AuthRequest {
    session: Option<Session>,
    authorization: Option<String>,
    body: Option<SubmittedCredentials>,
    issued_cookie: Option<SessionCookie>,
}

impl AuthRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session already attached to the request context.
    #[must_use]
    pub fn with_session(mut self, session: Option<Session>) -> Self {
        self.session = session;
        self
    }

    /// Raw `Authorization` header value.
    #[must_use]
    pub fn with_authorization(mut self, header: Option<String>) -> Self {
        self.authorization = header;
        self
    }

    /// Credentials submitted in the request body.
    #[must_use]
    pub fn with_body(mut self, credentials: Option<SubmittedCredentials>) -> Self {
        self.body = credentials;
        self
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    pub fn body(&self) -> Option<&SubmittedCredentials> {
        self.body.as_ref()
    }

    /// Record the cookie the response must carry.
    pub fn attach_cookie(&mut self, cookie: SessionCookie) {
        self.issued_cookie = Some(cookie);
    }

    /// Take the cookie issued during authentication, if any.
    pub fn take_cookie(&mut self) -> Option<SessionCookie> {
        self.issued_cookie.take()
    }
}

/// Failures of the account use-cases.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("email is already registered")]
    AlreadyRegistered,
    /// The request already carries a session; the existing user is returned.
    #[error("already authenticated as {}", .user.name())]
    AlreadyAuthenticated { user: Arc<dyn Principal> },
    #[error("failed to retrieve credentials from request: {0}")]
    Credentials(CredentialError),
    #[error("user not found")]
    UserNotFound,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("no active session")]
    NoSession,
    #[error("password hashing failed: {0}")]
    Hash(CredentialError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", LoginValidationError::EmptyUsername)]
    #[case("   ", "pw", LoginValidationError::EmptyUsername)]
    #[case("ada@example.com", "", LoginValidationError::EmptyPassword)]
    fn rejects_blank_parts(
        #[case] username: &str,
        #[case] password: &str,
        #[case] expected: LoginValidationError,
    ) {
        let err = LoginCredentials::try_from_parts(username, password).expect_err("invalid");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn password_keeps_whitespace_and_is_redacted_in_debug() {
        let creds = LoginCredentials::try_from_parts("ada", " secret ").expect("valid");
        assert_eq!(creds.password(), " secret ");
        assert!(!format!("{creds:?}").contains("secret"));
    }

    #[rstest]
    fn submitted_credentials_validate_lazily() {
        let blank = SubmittedCredentials::new("ada@example.com", "");
        assert_eq!(blank.validate(), Err(LoginValidationError::EmptyPassword));
        assert!(format!("{blank:?}").contains("<redacted>"));

        let valid = SubmittedCredentials::new(" ada@example.com ", "pw").validate();
        assert_eq!(
            valid.map(|creds| creds.username().to_owned()),
            Ok("ada@example.com".to_owned())
        );
    }

    #[rstest]
    fn issued_cookie_is_taken_once() {
        let mut request = AuthRequest::new();
        request.attach_cookie(SessionCookie::new(crate::domain::SessionToken::generate()));
        assert!(request.take_cookie().is_some());
        assert!(request.take_cookie().is_none());
    }
}
