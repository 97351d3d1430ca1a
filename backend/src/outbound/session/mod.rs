//! In-process session storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::debug;

use crate::domain::ports::{SessionError, SessionManager};
use crate::domain::{Principal, SESSION_TTL_SECS, Session, SessionCookie, SessionToken};

/// [`SessionManager`] keeping sessions in a process-local map.
///
/// Sessions do not survive a restart and are not shared between replicas.
/// A session expires once its TTL has elapsed: looking it up then removes
/// it, and every new session prunes whatever else has expired.
#[derive(Debug, Clone)]
pub struct InMemorySessionManager {
    sessions: Arc<RwLock<HashMap<SessionToken, Session>>>,
    ttl: Duration,
}

impl Default for InMemorySessionManager {
    fn default() -> Self {
        Self::with_ttl(Duration::seconds(SESSION_TTL_SECS))
    }
}

impl InMemorySessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Manager whose sessions expire `ttl` after they are opened.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            ttl,
        }
    }

    /// Number of open sessions.
    pub fn len(&self) -> Result<usize, SessionError> {
        self.sessions
            .read()
            .map(|sessions| sessions.len())
            .map_err(|_| poisoned())
    }

    pub fn is_empty(&self) -> Result<bool, SessionError> {
        self.len().map(|len| len == 0)
    }
}

fn poisoned() -> SessionError {
    SessionError::storage("session map lock poisoned")
}

#[async_trait]
impl SessionManager for InMemorySessionManager {
    async fn create_session(
        &self,
        user: Arc<dyn Principal>,
    ) -> Result<(Session, SessionCookie), SessionError> {
        let token = SessionToken::generate();
        let session = Session::new(token.clone(), user);
        let mut sessions = self.sessions.write().map_err(|_| poisoned())?;
        let now = Utc::now();
        let before = sessions.len();
        sessions.retain(|_, open| !open.is_expired(self.ttl, now));
        let pruned = before - sessions.len();
        if pruned > 0 {
            debug!(pruned, "expired sessions pruned");
        }
        sessions.insert(token.clone(), session.clone());
        debug!(user = session.user().name(), "session created");
        Ok((session, SessionCookie::new(token)))
    }

    async fn find_session(&self, token: &SessionToken) -> Result<Option<Session>, SessionError> {
        {
            let sessions = self.sessions.read().map_err(|_| poisoned())?;
            match sessions.get(token) {
                None => return Ok(None),
                Some(session) if !session.is_expired(self.ttl, Utc::now()) => {
                    return Ok(Some(session.clone()));
                }
                Some(_) => {}
            }
        }
        let removed = self
            .sessions
            .write()
            .map_err(|_| poisoned())?
            .remove(token);
        if let Some(session) = removed {
            debug!(user = session.user().name(), "expired session removed");
        }
        Ok(None)
    }

    async fn end_session(&self, token: &SessionToken) -> Result<(), SessionError> {
        let removed = self
            .sessions
            .write()
            .map_err(|_| poisoned())?
            .remove(token);
        if let Some(session) = removed {
            debug!(user = session.user().name(), "session ended");
        }
        Ok(())
    }
}
