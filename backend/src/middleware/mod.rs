//! Request middleware.
//!
//! Purpose: define middleware components for request lifecycle concerns:
//! tracing, session resolution and role-based authorisation.

pub mod authorization;
pub mod session_loader;
pub mod trace;

pub use authorization::{Authorization, AuthorizationError};
pub use session_loader::SessionLoader;
pub use trace::Trace;
