//! Role bitmask used for authorisation.
//!
//! Each bit is an independent capability. Grants combine with `|`; a check
//! passes when the granted and required masks share at least one bit.
//!
//! ```
//! use accounts::domain::Role;
//!
//! let granted = Role::USER | Role::GUEST;
//! assert!(granted.matches(Role::ADMIN | Role::USER));
//! assert!(!granted.matches(Role::ADMIN));
//! ```

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
    /// Authorisation levels granted to a user.
    ///
    /// The empty set means "no role".
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Role: u32 {
        /// Full administrative access.
        const ADMIN = 0b0001;
        /// Regular registered user.
        const USER  = 0b0010;
        /// Restricted guest access.
        const GUEST = 0b0100;
    }
}

impl Role {
    /// Union-style match: true when `self & required` is non-empty.
    ///
    /// This is deliberately not a subset test; holding any one of the
    /// required bits is enough.
    #[must_use]
    pub fn matches(self, required: Self) -> bool {
        self.intersects(required)
    }

    /// Human-readable list of the granted levels, e.g. `"ADMIN | USER"`.
    ///
    /// Returns `"NONE"` for the empty mask.
    #[must_use]
    pub fn description(self) -> String {
        if self.is_empty() {
            return "NONE".to_owned();
        }
        self.iter_names()
            .map(|(name, _)| name)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

// Stored as the raw integer mask so documents stay readable by other clients.
impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u32::deserialize(deserializer)?;
        Ok(Self::from_bits_truncate(bits))
    }
}
