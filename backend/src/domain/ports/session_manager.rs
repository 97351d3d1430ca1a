//! Port for session lifecycle management.

use std::sync::Arc;

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::session::{Principal, Session, SessionCookie, SessionToken};

define_port_error! {
    /// Errors raised by session storage.
    pub enum SessionError {
        /// The backing session storage failed.
        Storage { message: String } => "session storage failed: {message}",
    }
}

/// Creates, resolves and ends sessions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionManager: Send + Sync {
    /// Open a session for `user`, returning it with the cookie to issue.
    async fn create_session(
        &self,
        user: Arc<dyn Principal>,
    ) -> Result<(Session, SessionCookie), SessionError>;

    /// Resolve a token to its live session; `None` when unknown.
    async fn find_session(&self, token: &SessionToken) -> Result<Option<Session>, SessionError>;

    /// Close the session; unknown tokens are ignored.
    async fn end_session(&self, token: &SessionToken) -> Result<(), SessionError>;
}
