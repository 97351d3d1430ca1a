//! Middleware resolving the cookie's session token into a [`Session`].
//!
//! Runs inside the cookie session middleware. When the token resolves, the
//! [`Session`] is inserted into request extensions where handlers read it via
//! [`CurrentSession`](crate::inbound::http::session::CurrentSession) and the
//! [`Authorization`](super::Authorization) middleware checks its roles.
//! Unknown or ended tokens attach nothing.

use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_session::SessionExt;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpMessage};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{debug, warn};

use crate::domain::ports::SessionManager;
use crate::inbound::http::session::read_token;

/// Attach the live [`Session`](crate::domain::Session), if any, to each
/// request.
#[derive(Clone)]
pub struct SessionLoader {
    sessions: Arc<dyn SessionManager>,
}

impl SessionLoader {
    pub fn new(sessions: Arc<dyn SessionManager>) -> Self {
        Self { sessions }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionLoader
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionLoaderMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionLoaderMiddleware {
            service: Rc::new(service),
            sessions: Arc::clone(&self.sessions),
        }))
    }
}

/// Service wrapper produced by [`SessionLoader`].
pub struct SessionLoaderMiddleware<S> {
    service: Rc<S>,
    sessions: Arc<dyn SessionManager>,
}

impl<S, B> Service<ServiceRequest> for SessionLoaderMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let sessions = Arc::clone(&self.sessions);
        Box::pin(async move {
            let token = match read_token(&req.get_session()) {
                Ok(token) => token,
                Err(error) => {
                    warn!(%error, "unreadable session cookie ignored");
                    None
                }
            };
            if let Some(token) = token {
                match sessions.find_session(&token).await {
                    Ok(Some(session)) => {
                        debug!(user = session.user().name(), "session attached");
                        req.extensions_mut().insert(session);
                    }
                    Ok(None) => debug!("session token no longer valid"),
                    Err(error) => warn!(%error, "session lookup failed"),
                }
            }
            service.call(req).await
        })
    }
}
