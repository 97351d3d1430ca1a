//! User account model and the capability traits it implements.
//!
//! Account behaviour is split into small capabilities so sessions,
//! middleware and the user manager only ask for what they need:
//!
//! - [`Identity`]: store identifier and login email.
//! - [`Credentials`]: the stored password hash.
//! - [`Authorizer`]: the role bitmask.
//! - [`FriendGraph`](super::FriendGraph): one-directional friend list.
//!
//! [`User`] is the base account; [`UserProfile`](super::UserProfile) embeds it
//! and adds optional profile fields.

use std::fmt;

use mongodb::bson::{Bson, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::friend::{Friend, FriendGraph};
use super::model_store::Model;
use super::role::Role;

/// Collection holding user documents.
pub const USER_COLLECTION: &str = "user";

/// Validation errors for user identity values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("user id must be a 24 character hex object id")]
    InvalidId,
    #[error("email must not be empty")]
    EmptyEmail,
    #[error("email must contain a single '@' between a local part and a domain")]
    InvalidEmail,
}

/// Store-assigned user identifier.
///
/// Serialised as a native object id so `_id` lookups hit the primary index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(ObjectId);

impl UserId {
    /// Parse an identifier from its hex representation.
    ///
    /// # Examples
    /// ```
    /// use accounts::domain::UserId;
    ///
    /// let id = UserId::new("65f1c0ffee0000000000beef").expect("valid id");
    /// assert_eq!(id.to_string(), "65f1c0ffee0000000000beef");
    /// assert!(UserId::new("nope").is_err());
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        ObjectId::parse_str(raw.as_ref())
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Mint a fresh identifier, as the store would on insert.
    pub fn generate() -> Self {
        Self(ObjectId::new())
    }

    /// Access the underlying object id.
    pub fn as_object_id(&self) -> &ObjectId {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

impl From<UserId> for Bson {
    fn from(value: UserId) -> Self {
        Bson::ObjectId(value.0)
    }
}

/// Login email, unique per persisted user.
///
/// ## Invariants
/// - Trimmed and non-empty.
/// - Exactly one `@` separating a non-empty local part and domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and construct an email.
    ///
    /// # Examples
    /// ```
    /// use accounts::domain::Email;
    ///
    /// let email = Email::new("  ada@example.com ").expect("valid email");
    /// assert_eq!(email.as_ref(), "ada@example.com");
    /// assert!(Email::new("ada.example.com").is_err());
    /// ```
    pub fn new(raw: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(raw.into())
    }

    fn from_owned(raw: String) -> Result<Self, UserValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        match trimmed.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(Self(trimmed.to_owned()))
            }
            _ => Err(UserValidationError::InvalidEmail),
        }
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Opaque password hash bytes. Never holds plaintext.
///
/// Produced by an
/// [`AuthenticationProcessor`](crate::domain::ports::AuthenticationProcessor);
/// the bytes are stored as a BSON binary.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(#[serde(with = "serde_bytes")] Vec<u8>);

impl PasswordHash {
    /// Wrap bytes returned by a hashing operation.
    pub fn from_hashed(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Raw hash bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// True when no hash has been set yet.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PasswordHash(<{} bytes>)", self.0.len())
    }
}

/// Identifier and login email of an account.
pub trait Identity {
    /// Store identifier; `None` until the account has been persisted.
    fn id(&self) -> Option<&UserId>;
    /// Login email.
    fn email(&self) -> &Email;
}

/// Access to the stored password hash.
pub trait Credentials {
    fn password_hash(&self) -> &PasswordHash;
    fn set_password_hash(&mut self, hash: PasswordHash);
}

/// Role-bearing capability checked by the authorisation middleware.
pub trait Authorizer {
    /// Granted role mask.
    fn role(&self) -> Role;

    /// Replace the granted role mask.
    fn set_role(&mut self, role: Role);

    /// True when the granted mask shares a bit with `required`.
    fn is_authorized(&self, required: Role) -> bool {
        self.role().matches(required)
    }
}

/// Everything the user manager needs from a persisted account type.
pub trait UserAccount:
    Model + Identity + Credentials + Authorizer + FriendGraph + Clone + fmt::Debug + 'static
{
}

impl<T> UserAccount for T where
    T: Model + Identity + Credentials + Authorizer + FriendGraph + Clone + fmt::Debug + 'static
{
}

/// Base user account.
///
/// ## Invariants
/// - `id` is assigned by the store and never changes afterwards.
/// - `password_hash` only ever holds output of the hashing operation.
/// - `friends` holds reduced [`Friend`] records, never nested friend lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub(crate) id: Option<UserId>,
    pub(crate) email: Email,
    #[serde(rename = "password", default)]
    pub(crate) password_hash: PasswordHash,
    #[serde(default)]
    pub(crate) role: Role,
    #[serde(default)]
    pub(crate) friends: Vec<Friend>,
}

impl User {
    /// New, not yet persisted user with the default [`Role::USER`] grant.
    ///
    /// # Examples
    /// ```
    /// use accounts::domain::{Authorizer, Email, Identity, Role, User};
    ///
    /// let user = User::new(Email::new("ada@example.com").expect("email"));
    /// assert!(user.id().is_none());
    /// assert_eq!(user.role(), Role::USER);
    /// ```
    pub fn new(email: Email) -> Self {
        Self {
            id: None,
            email,
            password_hash: PasswordHash::default(),
            role: Role::USER,
            friends: Vec::new(),
        }
    }

    /// Attach a store identifier, e.g. when rebuilding a persisted user.
    #[must_use]
    pub fn with_id(mut self, id: UserId) -> Self {
        self.id = Some(id);
        self
    }

    /// Replace the granted roles.
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

impl Model for User {
    const COLLECTION: &'static str = USER_COLLECTION;
}

impl Identity for User {
    fn id(&self) -> Option<&UserId> {
        self.id.as_ref()
    }

    fn email(&self) -> &Email {
        &self.email
    }
}

impl Credentials for User {
    fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    fn set_password_hash(&mut self, hash: PasswordHash) {
        self.password_hash = hash;
    }
}

impl Authorizer for User {
    fn role(&self) -> Role {
        self.role
    }

    fn set_role(&mut self, role: Role) {
        self.role = role;
    }
}
