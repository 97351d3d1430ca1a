//! User accounts over a document store.
//!
//! - [`domain`]: account models, the typed model store, the user manager and
//!   the ports it depends on.
//! - [`outbound`]: MongoDB, Argon2 and session-storage adapters.
//! - [`inbound`]: the HTTP API.
//! - [`middleware`]: request tracing, session loading and role checks.

pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use domain::TraceId;
pub use middleware::Trace;
