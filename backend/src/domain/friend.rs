//! One-directional friend relationships between accounts.
//!
//! A friend entry is a reduced snapshot of another account (identity,
//! credentials and role only). It never carries a nested friend list, so the
//! relation cannot recurse through stored documents. No reciprocity is
//! enforced: `a` befriending `b` says nothing about `b`'s list.

use serde::{Deserialize, Serialize};

use super::role::Role;
use super::user::{Authorizer, Credentials, Email, Identity, PasswordHash, User, UserId};

/// Errors raised while editing a friend list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FriendError {
    /// An account cannot befriend itself.
    #[error("a user cannot be their own friend")]
    Invalid,
    /// The account is already on the list.
    #[error("user is already a friend")]
    AlreadyFriend,
    /// The account is not on the list.
    #[error("friend not found")]
    NotFound,
    /// The account has no store identifier yet.
    #[error("only persisted users can be added as friends")]
    Unpersisted,
}

/// Reduced account record stored inside a friend list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Friend {
    #[serde(rename = "_id")]
    id: UserId,
    email: Email,
    #[serde(rename = "password", default)]
    password_hash: PasswordHash,
    #[serde(default)]
    role: Role,
}

impl Friend {
    fn snapshot<F>(id: UserId, account: &F) -> Self
    where
        F: Identity + Credentials + Authorizer + ?Sized,
    {
        Self {
            id,
            email: account.email().clone(),
            password_hash: account.password_hash().clone(),
            role: account.role(),
        }
    }

    /// Identifier of the befriended account.
    pub fn id(&self) -> &UserId {
        &self.id
    }
}

impl Identity for Friend {
    fn id(&self) -> Option<&UserId> {
        Some(&self.id)
    }

    fn email(&self) -> &Email {
        &self.email
    }
}

impl Credentials for Friend {
    fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    fn set_password_hash(&mut self, hash: PasswordHash) {
        self.password_hash = hash;
    }
}

impl Authorizer for Friend {
    fn role(&self) -> Role {
        self.role
    }

    fn set_role(&mut self, role: Role) {
        self.role = role;
    }
}

/// Friend-list capability.
pub trait FriendGraph {
    /// Friends in insertion order.
    fn friends(&self) -> &[Friend];

    /// Append `other` to the friend list.
    ///
    /// Fails with [`FriendError::Invalid`] for the account itself and
    /// [`FriendError::AlreadyFriend`] when the id is already listed. The list
    /// is untouched on failure.
    fn add_friend<F>(&mut self, other: &F) -> Result<(), FriendError>
    where
        F: Identity + Credentials + Authorizer + ?Sized;

    /// Remove and return the friend with `id`.
    ///
    /// Fails with [`FriendError::NotFound`] and leaves the list unchanged
    /// when no such friend exists.
    fn remove_friend(&mut self, id: &UserId) -> Result<Friend, FriendError>;

    /// True when `id` is on the friend list.
    fn is_friend(&self, id: &UserId) -> bool {
        self.friends().iter().any(|friend| friend.id() == id)
    }
}

fn is_same_account<A, B>(this: &A, other: &B) -> bool
where
    A: Identity + ?Sized,
    B: Identity + ?Sized,
{
    match (this.id(), other.id()) {
        (Some(left), Some(right)) => left == right,
        _ => this.email() == other.email(),
    }
}

impl FriendGraph for User {
    fn friends(&self) -> &[Friend] {
        &self.friends
    }

    fn add_friend<F>(&mut self, other: &F) -> Result<(), FriendError>
    where
        F: Identity + Credentials + Authorizer + ?Sized,
    {
        if is_same_account(&*self, other) {
            return Err(FriendError::Invalid);
        }
        let id = *other.id().ok_or(FriendError::Unpersisted)?;
        if self.is_friend(&id) {
            return Err(FriendError::AlreadyFriend);
        }
        self.friends.push(Friend::snapshot(id, other));
        Ok(())
    }

    fn remove_friend(&mut self, id: &UserId) -> Result<Friend, FriendError> {
        let position = self
            .friends
            .iter()
            .position(|friend| friend.id() == id)
            .ok_or(FriendError::NotFound)?;
        Ok(self.friends.remove(position))
    }
}
