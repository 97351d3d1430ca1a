//! Application settings loaded via OrthoConfig.
//!
//! Values come from CLI flags, `ACCOUNTS_*` environment variables and an
//! optional config file. Unset values fall back to the defaults below.

use std::net::SocketAddr;
use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017";
const DEFAULT_DATABASE: &str = "accounts";
const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 8080);
const DEFAULT_SESSION_KEY_FILE: &str = "/var/run/secrets/session_key";

/// Runtime configuration for the accounts server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ACCOUNTS")]
pub struct AppSettings {
    /// MongoDB connection string.
    pub mongodb_uri: Option<String>,
    /// Database holding the account collections.
    pub database: Option<String>,
    /// Socket address the HTTP server listens on.
    pub bind_addr: Option<SocketAddr>,
    /// File holding the session cookie signing key.
    pub session_key_file: Option<PathBuf>,
    /// Mark the session cookie `Secure`.
    pub cookie_secure: Option<bool>,
    /// Fall back to a generated session key when the key file is unreadable.
    #[ortho_config(default = false)]
    pub allow_ephemeral_session: bool,
}

impl AppSettings {
    pub fn mongodb_uri(&self) -> &str {
        self.mongodb_uri.as_deref().unwrap_or(DEFAULT_MONGODB_URI)
    }

    pub fn database(&self) -> &str {
        self.database.as_deref().unwrap_or(DEFAULT_DATABASE)
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
            .unwrap_or_else(|| SocketAddr::from(DEFAULT_BIND_ADDR))
    }

    pub fn session_key_file(&self) -> PathBuf {
        self.session_key_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_KEY_FILE))
    }

    /// Secure cookies unless explicitly disabled.
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing and defaults.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 6] = [
        "ACCOUNTS_MONGODB_URI",
        "ACCOUNTS_DATABASE",
        "ACCOUNTS_BIND_ADDR",
        "ACCOUNTS_SESSION_KEY_FILE",
        "ACCOUNTS_COOKIE_SECURE",
        "ACCOUNTS_ALLOW_EPHEMERAL_SESSION",
    ];

    fn load_from_empty_args() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("accounts")]).expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(settings.mongodb_uri(), DEFAULT_MONGODB_URI);
        assert_eq!(settings.database(), DEFAULT_DATABASE);
        assert_eq!(settings.bind_addr(), SocketAddr::from(DEFAULT_BIND_ADDR));
        assert_eq!(
            settings.session_key_file(),
            PathBuf::from(DEFAULT_SESSION_KEY_FILE)
        );
        assert!(settings.cookie_secure());
        assert!(!settings.allow_ephemeral_session);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("ACCOUNTS_MONGODB_URI", Some("mongodb://db:27017".to_owned())),
            ("ACCOUNTS_DATABASE", Some("staging".to_owned())),
            ("ACCOUNTS_BIND_ADDR", Some("127.0.0.1:9090".to_owned())),
            ("ACCOUNTS_SESSION_KEY_FILE", Some("/tmp/key".to_owned())),
            ("ACCOUNTS_COOKIE_SECURE", Some("false".to_owned())),
            ("ACCOUNTS_ALLOW_EPHEMERAL_SESSION", Some("true".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(settings.mongodb_uri(), "mongodb://db:27017");
        assert_eq!(settings.database(), "staging");
        assert_eq!(
            settings.bind_addr(),
            "127.0.0.1:9090".parse::<SocketAddr>().expect("address")
        );
        assert_eq!(settings.session_key_file(), PathBuf::from("/tmp/key"));
        assert!(!settings.cookie_secure());
        assert!(settings.allow_ephemeral_session);
    }
}
