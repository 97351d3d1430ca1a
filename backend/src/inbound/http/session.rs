//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! The signed cookie only carries the opaque session token; the session
//! itself lives in the [`SessionManager`](crate::domain::ports::SessionManager)
//! and is attached to request extensions by the
//! [`SessionLoader`](crate::middleware::SessionLoader).

use std::future::{Ready, ready};

use actix_session::Session as CookieSession;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Error, Session, SessionCookie, SessionToken};

pub(crate) const SESSION_TOKEN_KEY: &str = "session_token";

/// Newtype over the cookie session exposing token operations.
#[derive(Clone)]
pub struct SessionContext(CookieSession);

impl SessionContext {
    pub fn new(session: CookieSession) -> Self {
        Self(session)
    }

    /// Store the issued session token in the cookie.
    pub fn persist_cookie(&self, cookie: &SessionCookie) -> Result<(), Error> {
        self.0
            .insert(SESSION_TOKEN_KEY, cookie.token().as_str())
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Session token carried by the cookie, if any.
    pub fn token(&self) -> Result<Option<SessionToken>, Error> {
        read_token(&self.0)
    }

    /// Drop the cookie contents.
    pub fn clear(&self) {
        self.0.purge();
    }
}

pub(crate) fn read_token(session: &CookieSession) -> Result<Option<SessionToken>, Error> {
    session
        .get::<String>(SESSION_TOKEN_KEY)
        .map(|token| token.map(SessionToken::from))
        .map_err(|error| Error::internal(format!("failed to read session: {error}")))
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = CookieSession::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}

/// The session attached to the request by the session loader, if any.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Option<Session>);

impl CurrentSession {
    /// Require a session or fail with `401 Unauthorized`.
    pub fn require(&self) -> Result<&Session, Error> {
        self.0
            .as_ref()
            .ok_or_else(|| Error::unauthorized("login required"))
    }
}

impl FromRequest for CurrentSession {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(Self(req.extensions().get::<Session>().cloned())))
    }
}
