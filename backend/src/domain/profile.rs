//! Extended account carrying optional profile fields.
//!
//! The base [`User`] is flattened into the same document, so profile
//! accounts live in the `user` collection and can be queried by `email`
//! exactly like base accounts.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::friend::{Friend, FriendError, FriendGraph};
use super::model_store::Model;
use super::role::Role;
use super::user::{
    Authorizer, Credentials, Email, Identity, PasswordHash, USER_COLLECTION, User, UserId,
};

/// Account with profile information layered over [`User`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(flatten)]
    user: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(rename = "pseudo", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "created")]
    pub created_at: DateTime<Utc>,
    #[serde(
        rename = "lastconnection",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_connection: Option<DateTime<Utc>>,
    #[serde(rename = "birthdate", default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
}

impl UserProfile {
    /// New profile account created now, with no optional fields set.
    ///
    /// # Examples
    /// ```
    /// use accounts::domain::{Email, Identity, UserProfile};
    ///
    /// let profile = UserProfile::new(Email::new("ada@example.com").expect("email"));
    /// assert_eq!(profile.email().as_ref(), "ada@example.com");
    /// assert!(profile.last_connection.is_none());
    /// ```
    pub fn new(email: Email) -> Self {
        Self::from_user(User::new(email))
    }

    /// Wrap an existing base account, stamping the creation time.
    pub fn from_user(user: User) -> Self {
        Self {
            user,
            name: None,
            surname: None,
            display_name: None,
            created_at: Utc::now(),
            last_connection: None,
            birth_date: None,
        }
    }

    /// The embedded base account.
    pub fn user(&self) -> &User {
        &self.user
    }

    /// Record a successful connection at `at`.
    pub fn touch_connection(&mut self, at: DateTime<Utc>) {
        self.last_connection = Some(at);
    }
}

impl Model for UserProfile {
    const COLLECTION: &'static str = USER_COLLECTION;
}

impl Identity for UserProfile {
    fn id(&self) -> Option<&UserId> {
        self.user.id()
    }

    fn email(&self) -> &Email {
        self.user.email()
    }
}

impl Credentials for UserProfile {
    fn password_hash(&self) -> &PasswordHash {
        self.user.password_hash()
    }

    fn set_password_hash(&mut self, hash: PasswordHash) {
        self.user.set_password_hash(hash);
    }
}

impl Authorizer for UserProfile {
    fn role(&self) -> Role {
        self.user.role()
    }

    fn set_role(&mut self, role: Role) {
        self.user.set_role(role);
    }
}

impl FriendGraph for UserProfile {
    fn friends(&self) -> &[Friend] {
        self.user.friends()
    }

    fn add_friend<F>(&mut self, other: &F) -> Result<(), FriendError>
    where
        F: Identity + Credentials + Authorizer + ?Sized,
    {
        self.user.add_friend(other)
    }

    fn remove_friend(&mut self, id: &UserId) -> Result<Friend, FriendError> {
        self.user.remove_friend(id)
    }
}
