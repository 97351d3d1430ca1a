//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;

use crate::domain::{ModelStore, StoreUserManager, USER_COLLECTION, UserProfile};
use crate::outbound::{Argon2Processor, InMemorySessionManager};
use crate::test_support::InMemoryDocumentStore;

use super::session_config::SESSION_COOKIE_NAME;
use super::state::HttpState;

/// Cookie session middleware with a fresh key and no `Secure` flag.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name(SESSION_COOKIE_NAME.to_owned())
        .cookie_secure(false)
        .build()
}

/// Fully wired in-memory account stack.
pub struct TestStack {
    pub documents: Arc<InMemoryDocumentStore>,
    pub sessions: Arc<InMemorySessionManager>,
    pub state: HttpState,
}

impl TestStack {
    pub fn new() -> Self {
        let documents = Arc::new(InMemoryDocumentStore::new());
        documents.unique_index(USER_COLLECTION, "email");
        let sessions = Arc::new(InMemorySessionManager::new());
        let manager = StoreUserManager::<UserProfile>::new(
            ModelStore::new(documents.clone()),
            Arc::new(Argon2Processor::new()),
            sessions.clone(),
        );
        Self {
            documents,
            sessions,
            state: HttpState::new(Arc::new(manager)),
        }
    }
}
