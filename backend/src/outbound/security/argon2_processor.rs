//! Argon2id implementation of [`AuthenticationProcessor`].
//!
//! Hashes are stored as the PHC string's UTF-8 bytes, so salt and parameters
//! travel with the hash and can change without a migration.

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash as PhcHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;
use zeroize::Zeroizing;

use crate::domain::ports::{AuthenticationProcessor, CredentialError};
use crate::domain::{AuthRequest, LoginCredentials, PasswordHash};

const BASIC_SCHEME: &str = "Basic ";

/// Argon2id hashing with default parameters.
///
/// Credentials come from the parsed request body when present, otherwise
/// from an `Authorization: Basic` header.
#[derive(Default, Clone)]
pub struct Argon2Processor {
    argon2: Argon2<'static>,
}

impl Argon2Processor {
    pub fn new() -> Self {
        Self::default()
    }
}

fn basic_credentials(header: &str) -> Result<LoginCredentials, CredentialError> {
    let encoded = header
        .strip_prefix(BASIC_SCHEME)
        .ok_or_else(|| CredentialError::malformed("unsupported authorization scheme"))?;
    let decoded = Zeroizing::new(
        STANDARD
            .decode(encoded.trim())
            .map_err(|err| CredentialError::malformed(format!("invalid base64: {err}")))?,
    );
    let text = std::str::from_utf8(&decoded)
        .map_err(|_| CredentialError::malformed("credentials are not valid UTF-8"))?;
    let (username, password) = text
        .split_once(':')
        .ok_or_else(|| CredentialError::malformed("missing ':' separator"))?;
    LoginCredentials::try_from_parts(username, password)
        .map_err(|err| CredentialError::malformed(err.to_string()))
}

impl AuthenticationProcessor for Argon2Processor {
    fn hash(&self, password: &[u8]) -> Result<PasswordHash, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password, &salt)
            .map_err(|err| CredentialError::hash(err.to_string()))?;
        Ok(PasswordHash::from_hashed(hash.to_string().into_bytes()))
    }

    fn compare(&self, password: &[u8], hash: &PasswordHash) -> bool {
        let Ok(encoded) = std::str::from_utf8(hash.as_bytes()) else {
            debug!("stored hash is not UTF-8");
            return false;
        };
        match PhcHash::new(encoded) {
            Ok(parsed) => self.argon2.verify_password(password, &parsed).is_ok(),
            Err(err) => {
                debug!(error = %err, "stored hash is not a PHC string");
                false
            }
        }
    }

    fn get_credentials(&self, request: &AuthRequest) -> Result<LoginCredentials, CredentialError> {
        if let Some(body) = request.body() {
            return body
                .validate()
                .map_err(|err| CredentialError::malformed(err.to_string()));
        }
        match request.authorization() {
            Some(header) => basic_credentials(header),
            None => Err(CredentialError::missing()),
        }
    }
}
