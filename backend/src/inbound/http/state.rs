//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only depend
//! on the [`UserManager`] port and stay testable without I/O.

use std::sync::Arc;

use crate::domain::UserProfile;
use crate::domain::ports::UserManager;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub users: Arc<dyn UserManager<UserProfile>>,
}

impl HttpState {
    pub fn new(users: Arc<dyn UserManager<UserProfile>>) -> Self {
        Self { users }
    }
}
