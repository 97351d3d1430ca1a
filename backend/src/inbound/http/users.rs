//! Users API handlers.
//!
//! ```text
//! POST   /api/v1/users                      register
//! POST   /api/v1/login                      open a session
//! POST   /api/v1/logout                     end the session
//! GET    /api/v1/users/me                   current account   (USER | ADMIN)
//! POST   /api/v1/users/me/friends           add a friend      (USER | ADMIN)
//! DELETE /api/v1/users/me/friends/{id}      remove a friend   (USER | ADMIN)
//! GET    /api/v1/users/random               random account    (ADMIN)
//! ```

use actix_web::http::header::AUTHORIZATION;
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{
    AuthRequest, Authorizer, Email, Error, FriendGraph, Identity, SessionCookie,
    SubmittedCredentials, User, UserId, UserProfile,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::{CurrentSession, SessionContext};
use crate::inbound::http::state::HttpState;

/// Registration body for `POST /api/v1/users`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
}

/// Login body for `POST /api/v1/login`.
///
/// Example JSON: `{"username":"ada@example.com","password":"secret"}`
#[derive(Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Body for `POST /api/v1/users/me/friends`.
#[derive(Debug, Deserialize)]
pub struct AddFriendRequest {
    pub email: String,
}

/// Friend entry as returned to clients.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FriendView {
    pub id: String,
    pub email: String,
}

/// Account as returned to clients. Password hashes are never included.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub email: String,
    pub role: u32,
    pub roles: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_connection: Option<DateTime<Utc>>,
    pub friends: Vec<FriendView>,
}

impl From<&UserProfile> for UserView {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id().map(UserId::to_string),
            email: profile.email().to_string(),
            role: profile.role().bits(),
            roles: profile.role().description(),
            name: profile.name.clone(),
            surname: profile.surname.clone(),
            display_name: profile.display_name.clone(),
            birth_date: profile.birth_date,
            created_at: profile.created_at,
            last_connection: profile.last_connection,
            friends: profile
                .friends()
                .iter()
                .map(|friend| FriendView {
                    id: friend.id().to_string(),
                    email: friend.email().to_string(),
                })
                .collect(),
        }
    }
}

impl RegisterRequest {
    /// Validate the body and split it into the new account and its password.
    pub fn into_parts(self) -> Result<(UserProfile, String), Error> {
        if self.password.is_empty() {
            return Err(Error::invalid_request("password must not be empty"));
        }
        let email = Email::new(self.email)?;
        let mut profile = UserProfile::from_user(User::new(email));
        profile.name = self.name;
        profile.surname = self.surname;
        profile.display_name = self.display_name;
        profile.birth_date = self.birth_date;
        Ok((profile, self.password))
    }
}

/// Register a new account.
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let (profile, password) = payload.into_inner().into_parts()?;
    let stored = state.users.register(profile, &password).await?;
    Ok(HttpResponse::Created().json(UserView::from(&stored)))
}

fn authorization_header(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

/// Authenticate with a JSON body or a Basic header and open a session.
///
/// Body validation happens inside authentication, after the existing-session
/// check, so every rejection is a `401`. The cookie is only written once the
/// connection timestamp is saved; a failed save revokes the new session.
pub async fn login(
    req: HttpRequest,
    state: web::Data<HttpState>,
    session: SessionContext,
    current: CurrentSession,
    payload: Option<web::Json<LoginRequest>>,
) -> ApiResult<HttpResponse> {
    let body = payload.map(|json| {
        let LoginRequest { username, password } = json.into_inner();
        SubmittedCredentials::new(username, password)
    });
    let mut request = AuthRequest::new()
        .with_session(current.0)
        .with_authorization(authorization_header(&req))
        .with_body(body);

    let mut user = state.users.authenticate(&mut request).await?;
    let cookie = request.take_cookie();
    user.touch_connection(Utc::now());
    let persisted = match state.users.save(&user).await {
        Ok(()) => cookie.as_ref().map_or(Ok(()), |issued| session.persist_cookie(issued)),
        Err(err) => Err(Error::from(err)),
    };
    if let Err(err) = persisted {
        if let Some(issued) = &cookie {
            revoke(&state, issued).await;
        }
        return Err(err);
    }
    Ok(HttpResponse::Ok().json(UserView::from(&user)))
}

async fn revoke(state: &HttpState, cookie: &SessionCookie) {
    if let Err(err) = state.users.revoke_session(cookie).await {
        warn!(error = %err, "failed to revoke session after aborted login");
    }
}

/// End the current session and clear the cookie.
pub async fn logout(
    state: web::Data<HttpState>,
    session: SessionContext,
    current: CurrentSession,
) -> ApiResult<HttpResponse> {
    let request = AuthRequest::new().with_session(current.0);
    state.users.logout(&request).await?;
    session.clear();
    Ok(HttpResponse::NoContent().finish())
}

async fn current_profile(state: &HttpState, current: &CurrentSession) -> ApiResult<UserProfile> {
    let session = current.require()?;
    let email = Email::new(session.user().name())?;
    Ok(state.users.get_by_email(&email).await?)
}

/// Current account.
pub async fn me(
    state: web::Data<HttpState>,
    current: CurrentSession,
) -> ApiResult<web::Json<UserView>> {
    let profile = current_profile(&state, &current).await?;
    Ok(web::Json(UserView::from(&profile)))
}

/// Add the account with the given email to the caller's friends.
pub async fn add_friend(
    state: web::Data<HttpState>,
    current: CurrentSession,
    payload: web::Json<AddFriendRequest>,
) -> ApiResult<web::Json<UserView>> {
    let mut profile = current_profile(&state, &current).await?;
    let email = Email::new(payload.into_inner().email)?;
    let friend = state.users.get_by_email(&email).await?;
    profile.add_friend(&friend)?;
    state.users.save(&profile).await?;
    info!(user = %profile.email(), friend = %friend.email(), "friend added");
    Ok(web::Json(UserView::from(&profile)))
}

/// Remove a friend by id.
pub async fn remove_friend(
    state: web::Data<HttpState>,
    current: CurrentSession,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserView>> {
    let id = UserId::new(path.into_inner())?;
    let mut profile = current_profile(&state, &current).await?;
    profile.remove_friend(&id)?;
    state.users.save(&profile).await?;
    info!(user = %profile.email(), friend = %id, "friend removed");
    Ok(web::Json(UserView::from(&profile)))
}

/// A random account.
pub async fn random_user(state: web::Data<HttpState>) -> ApiResult<web::Json<UserView>> {
    let profile = state.users.random_user().await?;
    Ok(web::Json(UserView::from(&profile)))
}

#[cfg(test)]
mod tests;
