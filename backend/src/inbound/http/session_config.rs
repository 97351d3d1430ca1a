//! Session cookie settings.
//!
//! The signing key is read from a file and must hold at least
//! [`SESSION_KEY_MIN_LEN`] bytes. Debug builds may fall back to an ephemeral
//! key when explicitly allowed; release builds never do.

use std::path::{Path, PathBuf};

use actix_session::SessionMiddleware;
use actix_session::config::PersistentSession;
use actix_session::storage::CookieSessionStore;
use actix_web::cookie::{Key, SameSite, time::Duration};
use tracing::{info, warn};
use zeroize::Zeroizing;

pub mod fingerprint;

use fingerprint::key_fingerprint;

use crate::domain::SESSION_TTL_SECS;

/// Minimum accepted key length in bytes.
pub const SESSION_KEY_MIN_LEN: usize = 64;

/// Name of the session cookie.
pub const SESSION_COOKIE_NAME: &str = "session";

/// Build mode for session configuration validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Ephemeral keys may be allowed.
    Debug,
    /// Ephemeral keys are refused.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }
}

/// Inputs controlling the session cookie.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub key_file: PathBuf,
    pub cookie_secure: bool,
    pub allow_ephemeral: bool,
}

/// Validated session cookie settings.
pub struct SessionSettings {
    pub key: Key,
    pub cookie_secure: bool,
}

impl SessionSettings {
    /// Cookie session middleware using these settings.
    ///
    /// The cookie's max-age matches the server-side session lifetime.
    pub fn middleware(&self) -> SessionMiddleware<CookieSessionStore> {
        SessionMiddleware::builder(CookieSessionStore::default(), self.key.clone())
            .cookie_name(SESSION_COOKIE_NAME.to_owned())
            .cookie_secure(self.cookie_secure)
            .cookie_http_only(true)
            .cookie_same_site(SameSite::Lax)
            .session_lifecycle(
                PersistentSession::default().session_ttl(Duration::seconds(SESSION_TTL_SECS)),
            )
            .build()
    }
}

/// Errors raised while loading session settings.
#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    /// Reading the key file failed and no fallback is allowed.
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The key file is too short.
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    /// Release builds must not use ephemeral keys.
    #[error("ephemeral session keys are not allowed in release builds")]
    EphemeralNotAllowed,
}

/// Load session settings, logging the active key's fingerprint.
pub fn load_session_settings(
    options: &SessionOptions,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    if options.allow_ephemeral && mode == BuildMode::Release {
        return Err(SessionConfigError::EphemeralNotAllowed);
    }
    let key = match read_key(&options.key_file) {
        Ok(key) => key,
        Err(error @ SessionConfigError::KeyRead { .. }) if options.allow_ephemeral => {
            warn!(%error, "using ephemeral session key; sessions will not survive restarts");
            Key::generate()
        }
        Err(error) => return Err(error),
    };
    info!(fingerprint = %key_fingerprint(&key), "session key loaded");
    Ok(SessionSettings {
        key,
        cookie_secure: options.cookie_secure,
    })
}

fn read_key(path: &Path) -> Result<Key, SessionConfigError> {
    let bytes = Zeroizing::new(std::fs::read(path).map_err(|source| {
        SessionConfigError::KeyRead {
            path: path.to_path_buf(),
            source,
        }
    })?);
    if bytes.len() < SESSION_KEY_MIN_LEN {
        return Err(SessionConfigError::KeyTooShort {
            path: path.to_path_buf(),
            length: bytes.len(),
            min_len: SESSION_KEY_MIN_LEN,
        });
    }
    Ok(Key::derive_from(&bytes))
}
