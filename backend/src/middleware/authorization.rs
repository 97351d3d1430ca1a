//! Role-based authorisation middleware.
//!
//! Wrap a scope with [`Authorization::new`] and a required [`Role`] mask. A
//! request passes when the session user's granted roles share at least one
//! bit with the mask; otherwise the wrapped service is never called and the
//! client receives `401` with a JSON error body.

use std::rc::Rc;
use std::task::{Context, Poll};

use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error as ActixError, HttpMessage};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{debug, info};

use crate::domain::{Error, Role, Session};

/// Reasons a request is denied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthorizationError {
    #[error("no session user")]
    NoSessionUser,
    #[error("session user has no roles")]
    UserHasNoRoles,
    #[error("roles do not match: granted {granted}, required {required}")]
    RolesNotMatch { granted: String, required: String },
}

impl From<AuthorizationError> for Error {
    fn from(err: AuthorizationError) -> Self {
        Error::unauthorized(err.to_string())
    }
}

/// Decide whether `session` may access a resource requiring `required`.
pub fn authorize(session: Option<&Session>, required: Role) -> Result<(), AuthorizationError> {
    let session = session.ok_or(AuthorizationError::NoSessionUser)?;
    let authorizer = session
        .user()
        .authorizer()
        .ok_or(AuthorizationError::UserHasNoRoles)?;
    let granted = authorizer.role();
    if granted.matches(required) {
        Ok(())
    } else {
        Err(AuthorizationError::RolesNotMatch {
            granted: granted.description(),
            required: required.description(),
        })
    }
}

/// Middleware factory requiring a role mask.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use accounts::domain::Role;
/// use accounts::middleware::Authorization;
///
/// let app = App::new().service(
///     web::scope("/admin").wrap(Authorization::new(Role::ADMIN)),
/// );
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Authorization {
    required: Role,
}

impl Authorization {
    pub fn new(required: Role) -> Self {
        Self { required }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Authorization
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type InitError = ();
    type Transform = AuthorizationMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthorizationMiddleware {
            service: Rc::new(service),
            required: self.required,
        }))
    }
}

/// Service wrapper produced by [`Authorization`].
pub struct AuthorizationMiddleware<S> {
    service: Rc<S>,
    required: Role,
}

impl<S, B> Service<ServiceRequest> for AuthorizationMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let decision = authorize(req.extensions().get::<Session>(), self.required);
        match decision {
            Ok(()) => {
                debug!(path = req.path(), "request authorised");
                let service = Rc::clone(&self.service);
                Box::pin(async move { service.call(req).await })
            }
            Err(reason) => {
                info!(path = req.path(), %reason, "request denied");
                let error: Error = reason.into();
                Box::pin(ready(Err(error.into())))
            }
        }
    }
}
