//! Route table for the accounts API.

use actix_web::web;

use crate::domain::Role;
use crate::middleware::Authorization;

use super::users;

/// Register every `/api/v1` route.
///
/// Role-protected scopes rely on the [`SessionLoader`](crate::middleware::SessionLoader)
/// being installed further out on the app.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/users", web::post().to(users::register))
            .route("/login", web::post().to(users::login))
            .route("/logout", web::post().to(users::logout))
            .service(
                web::scope("/users/me")
                    .wrap(Authorization::new(Role::USER | Role::ADMIN))
                    .route("", web::get().to(users::me))
                    .route("/friends", web::post().to(users::add_friend))
                    .route("/friends/{id}", web::delete().to(users::remove_friend)),
            )
            .service(
                web::scope("/users/random")
                    .wrap(Authorization::new(Role::ADMIN))
                    .route("", web::get().to(users::random_user)),
            ),
    );
}
