//! Account use-cases on top of the model store.
//!
//! [`StoreUserManager`] implements [`UserManager`] for any account type. The
//! store, the hashing/credential processor and the session manager are all
//! injected, so the same manager serves base and profile accounts.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::doc;
use tracing::{debug, info, warn};

use super::auth::{AuthError, AuthRequest};
use super::model_store::ModelStore;
use super::ports::{AuthenticationProcessor, SessionManager, UserManager};
use super::session::{Principal, SessionCookie};
use super::user::{Email, UserAccount};

/// [`UserManager`] backed by a [`ModelStore`].
pub struct StoreUserManager<U> {
    store: ModelStore,
    auth: Arc<dyn AuthenticationProcessor>,
    sessions: Arc<dyn SessionManager>,
    _account: PhantomData<fn() -> U>,
}

impl<U> StoreUserManager<U> {
    pub fn new(
        store: ModelStore,
        auth: Arc<dyn AuthenticationProcessor>,
        sessions: Arc<dyn SessionManager>,
    ) -> Self {
        Self {
            store,
            auth,
            sessions,
            _account: PhantomData,
        }
    }
}

impl<U> Clone for StoreUserManager<U> {
    fn clone(&self) -> Self {
        Self::new(self.store.clone(), self.auth.clone(), self.sessions.clone())
    }
}

#[async_trait]
impl<U: UserAccount> UserManager<U> for StoreUserManager<U> {
    async fn register(&self, mut user: U, password: &str) -> Result<U, AuthError> {
        if self.is_exist(&user).await? {
            debug!(email = %user.email(), "registration rejected, email taken");
            return Err(AuthError::AlreadyRegistered);
        }
        let hash = self
            .auth
            .hash(password.as_bytes())
            .map_err(AuthError::Hash)?;
        user.set_password_hash(hash);
        // A concurrent registration can pass the check above; the unique
        // email index decides.
        if let Err(err) = self.store.insert_models(&[&user]).await {
            if err.is_duplicate_key() {
                debug!(email = %user.email(), "registration lost race for email");
                return Err(AuthError::AlreadyRegistered);
            }
            return Err(err.into());
        }
        info!(email = %user.email(), "user registered");
        self.get_by_email(user.email()).await
    }

    async fn is_exist(&self, user: &U) -> Result<bool, AuthError> {
        match self.get_by_email(user.email()).await {
            Ok(_) => Ok(true),
            Err(AuthError::Store(err)) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn get_by_email(&self, email: &Email) -> Result<U, AuthError> {
        debug!(%email, "looking up user");
        let user = self
            .store
            .get_one_model::<U>(doc! { "email": email.as_ref() })
            .await?;
        Ok(user)
    }

    async fn authenticate(&self, request: &mut AuthRequest) -> Result<U, AuthError> {
        if let Some(session) = request.session() {
            return Err(AuthError::AlreadyAuthenticated {
                user: Arc::clone(session.user()),
            });
        }

        let credentials = self
            .auth
            .get_credentials(request)
            .map_err(AuthError::Credentials)?;

        // Any lookup failure is reported as an unknown user; the cause is
        // only logged.
        let user = match Email::new(credentials.username()) {
            Ok(email) => match self.get_by_email(&email).await {
                Ok(user) => user,
                Err(err) => {
                    debug!(error = %err, "login lookup failed");
                    return Err(AuthError::UserNotFound);
                }
            },
            Err(err) => {
                debug!(error = %err, "login username is not an email");
                return Err(AuthError::UserNotFound);
            }
        };

        if !self
            .auth
            .compare(credentials.password().as_bytes(), user.password_hash())
        {
            info!(email = %user.email(), "login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let principal: Arc<dyn Principal> = Arc::new(user.clone());
        let (_session, cookie) = self.sessions.create_session(principal).await?;
        request.attach_cookie(cookie);
        info!(email = %user.email(), "user logged in");
        Ok(user)
    }

    async fn reset_password(&self, user: &mut U, password: &str) -> Result<(), AuthError> {
        let id = *user.id().ok_or(AuthError::UserNotFound)?;
        let hash = self
            .auth
            .hash(password.as_bytes())
            .map_err(AuthError::Hash)?;
        user.set_password_hash(hash);
        self.store.update_model_id(id, &*user).await?;
        info!(%id, "password reset");
        Ok(())
    }

    async fn save(&self, user: &U) -> Result<(), AuthError> {
        let id = *user.id().ok_or(AuthError::UserNotFound)?;
        self.store.update_model_id(id, user).await?;
        debug!(%id, "user saved");
        Ok(())
    }

    async fn logout(&self, request: &AuthRequest) -> Result<(), AuthError> {
        let session = request.session().ok_or(AuthError::NoSession)?;
        self.sessions.end_session(session.token()).await.map_err(|err| {
            warn!(error = %err, "failed to end session");
            AuthError::from(err)
        })?;
        info!(user = session.user().name(), "user logged out");
        Ok(())
    }

    async fn revoke_session(&self, cookie: &SessionCookie) -> Result<(), AuthError> {
        self.sessions.end_session(cookie.token()).await?;
        debug!("issued session revoked");
        Ok(())
    }

    async fn random_user(&self) -> Result<U, AuthError> {
        Ok(self.store.get_random_one_model::<U>().await?)
    }
}
