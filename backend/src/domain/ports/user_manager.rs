//! Driving port for account use-cases.
//!
//! Inbound adapters depend on this trait rather than on
//! [`StoreUserManager`](crate::domain::StoreUserManager) so handler tests can
//! substitute a double.

use async_trait::async_trait;

use crate::domain::auth::{AuthError, AuthRequest};
use crate::domain::session::SessionCookie;
use crate::domain::user::{Email, UserAccount};

/// Registration, lookup, login and password management for `U`.
#[async_trait]
pub trait UserManager<U: UserAccount>: Send + Sync {
    /// Hash `password`, store `user` and return the persisted account.
    ///
    /// Fails with [`AuthError::AlreadyRegistered`] when the email is taken,
    /// including when a concurrent registration claims it between the
    /// existence check and the insert.
    async fn register(&self, user: U, password: &str) -> Result<U, AuthError>;

    /// True when an account with `user`'s email exists.
    async fn is_exist(&self, user: &U) -> Result<bool, AuthError>;

    /// Look an account up by email.
    async fn get_by_email(&self, email: &Email) -> Result<U, AuthError>;

    /// Check credentials and open a session, attaching its cookie to
    /// `request`.
    async fn authenticate(&self, request: &mut AuthRequest) -> Result<U, AuthError>;

    /// Replace the stored password hash of `user`.
    async fn reset_password(&self, user: &mut U, password: &str) -> Result<(), AuthError>;

    /// Persist a modified account.
    async fn save(&self, user: &U) -> Result<(), AuthError>;

    /// End the session attached to `request`.
    async fn logout(&self, request: &AuthRequest) -> Result<(), AuthError>;

    /// End the session a freshly issued `cookie` refers to.
    ///
    /// Used to roll back a login whose follow-up work failed before the
    /// cookie reached the client.
    async fn revoke_session(&self, cookie: &SessionCookie) -> Result<(), AuthError>;

    /// Pick a random account.
    async fn random_user(&self) -> Result<U, AuthError>;
}
