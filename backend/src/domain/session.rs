//! Authenticated session values shared between the user manager, the session
//! manager port and the HTTP middleware.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::user::{Authorizer, UserAccount};

/// How long a session stays valid after it is opened. The session cookie's
/// max-age uses the same value.
pub const SESSION_TTL_SECS: i64 = 2 * 60 * 60;

/// Whoever a session was opened for.
///
/// The authorisation view is optional: a principal that cannot report roles
/// is rejected by role checks rather than treated as unprivileged.
pub trait Principal: fmt::Debug + Send + Sync {
    /// Login name, the account email for user accounts.
    fn name(&self) -> &str;

    /// Role-bearing view of the principal, when it has one.
    fn authorizer(&self) -> Option<&dyn Authorizer>;
}

impl<T> Principal for T
where
    T: UserAccount,
{
    fn name(&self) -> &str {
        self.email().as_ref()
    }

    fn authorizer(&self) -> Option<&dyn Authorizer> {
        Some(self)
    }
}

/// Opaque random session token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// Fresh unguessable token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An open session and the principal it belongs to.
#[derive(Debug, Clone)]
pub struct Session {
    token: SessionToken,
    user: Arc<dyn Principal>,
    created_at: DateTime<Utc>,
}

impl Session {
    /// Open a session for `user` now.
    pub fn new(token: SessionToken, user: Arc<dyn Principal>) -> Self {
        Self {
            token,
            user,
            created_at: Utc::now(),
        }
    }

    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    /// The principal the session was opened for.
    pub fn user(&self) -> &Arc<dyn Principal> {
        &self.user
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// True once `ttl` has elapsed between opening and `now`.
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.created_at) >= ttl
    }
}

/// Cookie value to hand back to the client after a session is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    token: SessionToken,
}

impl SessionCookie {
    pub fn new(token: SessionToken) -> Self {
        Self { token }
    }

    pub fn token(&self) -> &SessionToken {
        &self.token
    }
}
