//! # Participant Identity & The Holder Model
//!
//! Every external caller is identified by an [`AccountId`] — an opaque,
//! hex-encoded public key string. The ledger never verifies keys or
//! signatures: authorization is identity equality, checked per operation
//! by the component that owns the state in question.
//!
//! Custody is expressed through [`Holder`], which makes the special case
//! explicit in the type system: an asset is held either by an external
//! account or by the registry itself. Registry custody is what "in escrow"
//! means — a listed-then-auctioned asset is physically out of its seller's
//! hands until the auction settles.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// An opaque participant identity.
///
/// Rendered as a hex-encoded public key string (e.g. `"a3b2c1…"`). The
/// ledger does not interpret the contents — equality is the only operation
/// that matters. The empty string is the null identity: it can never hold
/// an asset and is rejected as a transfer target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Wraps an identity string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The null identity. Exists only to be rejected.
    pub fn null() -> Self {
        Self(String::new())
    }

    /// Returns `true` for the null identity.
    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "<null>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// Holder
// ---------------------------------------------------------------------------

/// The current custodian of an asset.
///
/// Exactly one holder exists per asset at all times. `Registry` is the
/// escrow state: the asset is locked under an open auction and no external
/// party can move it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Holder {
    /// The registry itself holds the asset (escrow).
    Registry,
    /// An external participant holds the asset.
    Account(AccountId),
}

impl Holder {
    /// Returns the account if an external participant holds the asset.
    pub fn account(&self) -> Option<&AccountId> {
        match self {
            Holder::Registry => None,
            Holder::Account(id) => Some(id),
        }
    }

    /// Returns `true` if the registry holds the asset.
    pub fn is_registry(&self) -> bool {
        matches!(self, Holder::Registry)
    }

    /// Returns `true` if `id` is the external holder of the asset.
    pub fn is_account(&self, id: &AccountId) -> bool {
        self.account() == Some(id)
    }
}

impl fmt::Display for Holder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Holder::Registry => write!(f, "registry"),
            Holder::Account(id) => write!(f, "{id}"),
        }
    }
}

impl From<AccountId> for Holder {
    fn from(id: AccountId) -> Self {
        Holder::Account(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_identity_detected() {
        assert!(AccountId::null().is_null());
        assert!(AccountId::new("").is_null());
        assert!(!AccountId::new("a3b2c1").is_null());
    }

    #[test]
    fn display_renders_identity() {
        assert_eq!(AccountId::new("cafe01").to_string(), "cafe01");
        assert_eq!(AccountId::null().to_string(), "<null>");
    }

    #[test]
    fn holder_account_matching() {
        let alice = AccountId::new("alice_pk");
        let holder = Holder::Account(alice.clone());
        assert!(holder.is_account(&alice));
        assert!(!holder.is_account(&AccountId::new("bob_pk")));
        assert_eq!(holder.account(), Some(&alice));
    }

    #[test]
    fn registry_holder_has_no_account() {
        assert!(Holder::Registry.is_registry());
        assert_eq!(Holder::Registry.account(), None);
        assert!(!Holder::Registry.is_account(&AccountId::new("anyone")));
    }

    #[test]
    fn holder_serialization_roundtrip() {
        let holder = Holder::Account(AccountId::new("a3b2c1"));
        let json = serde_json::to_string(&holder).unwrap();
        let restored: Holder = serde_json::from_str(&json).unwrap();
        assert_eq!(holder, restored);
    }
}
