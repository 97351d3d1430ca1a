//! Accounts server entry-point: loads settings, connects the document store
//! and serves the REST API.

mod server;

use std::sync::Arc;

use color_eyre::eyre::WrapErr;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use accounts::inbound::http::session_config::{BuildMode, SessionOptions, load_session_settings};
use accounts::outbound::MongoDocumentStore;
use server::{AppSettings, ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .wrap_err("failed to load configuration")?;

    let session = load_session_settings(
        &SessionOptions {
            key_file: settings.session_key_file(),
            cookie_secure: settings.cookie_secure(),
            allow_ephemeral: settings.allow_ephemeral_session,
        },
        BuildMode::from_debug_assertions(),
    )?;

    let documents = MongoDocumentStore::connect(settings.mongodb_uri(), settings.database())
        .await
        .wrap_err("failed to connect to MongoDB")?;
    info!(database = settings.database(), "document store connected");

    let bind_addr = settings.bind_addr();
    let server = create_server(ServerConfig::new(bind_addr, session, Arc::new(documents)))?;
    info!(%bind_addr, "accounts server listening");
    server.await?;
    Ok(())
}
