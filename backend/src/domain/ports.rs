//! Domain ports.
//!
//! Driven ports ([`DocumentStore`], [`AuthenticationProcessor`],
//! [`SessionManager`]) are implemented by outbound adapters. The driving port
//! [`UserManager`] is what inbound adapters call. Each port carries its own
//! error enum built with `define_port_error!`.

mod authentication;
mod document_store;
mod macros;
mod session_manager;
mod user_manager;

pub(crate) use macros::define_port_error;

pub use authentication::{AuthenticationProcessor, CredentialError};
pub use document_store::{AggregateError, DocumentStore, FindWindow, Query, StoreError};
pub use session_manager::{SessionError, SessionManager};
pub use user_manager::UserManager;

#[cfg(test)]
pub use authentication::MockAuthenticationProcessor;
#[cfg(test)]
pub use document_store::MockDocumentStore;
#[cfg(test)]
pub use session_manager::MockSessionManager;
