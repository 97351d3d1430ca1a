//! Port for password hashing and credential extraction.

use super::define_port_error;
use crate::domain::auth::{AuthRequest, LoginCredentials};
use crate::domain::user::PasswordHash;

define_port_error! {
    /// Errors raised while hashing passwords or reading credentials.
    pub enum CredentialError {
        /// The hashing primitive failed.
        Hash { message: String } => "password hashing failed: {message}",
        /// The request carried no credentials at all.
        Missing => "no credentials supplied",
        /// Credentials were present but unreadable.
        Malformed { message: String } => "malformed credentials: {message}",
    }
}

/// Hashing, comparison and credential extraction.
///
/// Implementations are synchronous and CPU-bound; callers run them inline.
#[cfg_attr(test, mockall::automock)]
pub trait AuthenticationProcessor: Send + Sync {
    /// Hash a plaintext password.
    fn hash(&self, password: &[u8]) -> Result<PasswordHash, CredentialError>;

    /// True when `password` matches `hash`. Malformed hashes never match.
    fn compare(&self, password: &[u8], hash: &PasswordHash) -> bool;

    /// Pull a username/password pair out of the request.
    fn get_credentials(&self, request: &AuthRequest) -> Result<LoginCredentials, CredentialError>;
}
