//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: MongoDB-backed [`DocumentStore`](crate::domain::ports::DocumentStore).
//! - **security**: Argon2id password hashing and credential extraction.
//! - **session**: process-local session storage.
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business logic.

pub mod persistence;
pub mod security;
pub mod session;

pub use persistence::MongoDocumentStore;
pub use security::Argon2Processor;
pub use session::InMemorySessionManager;
