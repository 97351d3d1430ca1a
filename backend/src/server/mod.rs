//! Server construction and middleware wiring.

mod config;

pub use config::AppSettings;

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use accounts::Trace;
use accounts::domain::ports::{DocumentStore, SessionManager};
use accounts::domain::{ModelStore, StoreUserManager, UserProfile};
use accounts::inbound::http::configure_api;
use accounts::inbound::http::session_config::SessionSettings;
use accounts::inbound::http::state::HttpState;
use accounts::middleware::SessionLoader;
use accounts::outbound::{Argon2Processor, InMemorySessionManager};

/// Everything needed to start the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) session: SessionSettings,
    pub(crate) documents: Arc<dyn DocumentStore>,
}

impl ServerConfig {
    #[must_use]
    pub fn new(
        bind_addr: SocketAddr,
        session: SessionSettings,
        documents: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            bind_addr,
            session,
            documents,
        }
    }
}

#[derive(Clone)]
struct AppDependencies {
    http_state: web::Data<HttpState>,
    sessions: Arc<dyn SessionManager>,
    session: Arc<SessionSettings>,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        http_state,
        sessions,
        session,
    } = deps;

    // Registration order is inside-out: Trace runs first, then the cookie
    // session, then the loader that resolves its token.
    App::new()
        .app_data(http_state)
        .wrap(SessionLoader::new(sessions))
        .wrap(session.middleware())
        .wrap(Trace)
        .configure(configure_api)
}

/// Construct the HTTP server over the configured document store.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(config: ServerConfig) -> std::io::Result<Server> {
    let ServerConfig {
        bind_addr,
        session,
        documents,
    } = config;

    let sessions: Arc<dyn SessionManager> = Arc::new(InMemorySessionManager::new());
    let users = StoreUserManager::<UserProfile>::new(
        ModelStore::new(documents),
        Arc::new(Argon2Processor::new()),
        Arc::clone(&sessions),
    );
    let http_state = web::Data::new(HttpState::new(Arc::new(users)));
    let session = Arc::new(session);

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            http_state: http_state.clone(),
            sessions: Arc::clone(&sessions),
            session: Arc::clone(&session),
        })
    })
    .bind(bind_addr)?
    .run();

    Ok(server)
}
