//! Domain primitives, account model and use-cases.
//!
//! Purpose: define the account types and the operations on them without
//! depending on HTTP or a concrete database. Adapters plug in through the
//! traits in [`ports`].
//!
//! Public surface:
//! - [`ModelStore`]: typed access to a [`ports::DocumentStore`].
//! - [`User`], [`UserProfile`]: account types implementing the capability
//!   traits [`Identity`], [`Credentials`], [`Authorizer`] and
//!   [`FriendGraph`].
//! - [`Role`]: authorisation bitmask.
//! - [`StoreUserManager`]: registration, login and password use-cases.
//! - [`Error`]: transport-agnostic error payload.

pub mod auth;
pub mod error;
pub mod friend;
pub mod model_store;
pub mod ports;
pub mod profile;
pub mod role;
pub mod session;
pub mod trace_id;
pub mod user;
pub mod user_manager;

pub use self::auth::{
    AuthError, AuthRequest, LoginCredentials, LoginValidationError, SubmittedCredentials,
};
pub use self::error::{Error, ErrorCode};
pub use self::friend::{Friend, FriendError, FriendGraph};
pub use self::model_store::{Model, ModelStore, StoredModel};
pub use self::profile::UserProfile;
pub use self::role::Role;
pub use self::session::{Principal, SESSION_TTL_SECS, Session, SessionCookie, SessionToken};
pub use self::trace_id::TraceId;
pub use self::user::{
    Authorizer, Credentials, Email, Identity, PasswordHash, USER_COLLECTION, User, UserAccount,
    UserId, UserValidationError,
};
pub use self::user_manager::StoreUserManager;

