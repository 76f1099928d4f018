//! # Asset Ownership Ledger
//!
//! The registry owns the mapping from asset identifier to current holder
//! and is the sole mutator of holder fields. Every custody change in the
//! system — a sale, an auction settlement, a plain transfer — lands here
//! as a [`AssetRegistry::transfer`] call, with the invariant that exactly
//! one holder exists per asset at all times.
//!
//! The registry does not know about listings or auctions. The marketplace
//! facade coordinates cross-component effects (e.g. a transferred asset is
//! no longer for sale) by pairing a transfer with the owning component's
//! own bookkeeping in the same operation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::asset::{AssetId, AssetTraits};
use crate::identity::{AccountId, Holder};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during ownership operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The referenced asset has never been minted.
    #[error("unknown asset: {asset_id} has never been minted")]
    UnknownAsset {
        /// The identifier that was looked up.
        asset_id: AssetId,
    },

    /// The claimed holder does not match the asset's current holder.
    #[error("not the holder: asset {asset_id} is held by {holder}, not {claimed}")]
    NotHolder {
        /// The asset in question.
        asset_id: AssetId,
        /// The actual current holder.
        holder: Holder,
        /// The holder the caller claimed to be.
        claimed: Holder,
    },

    /// The transfer target is the null identity.
    #[error("invalid transfer target: the null identity cannot hold assets")]
    InvalidTarget,
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A minted asset: identifier, immutable traits, current holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Sequential identifier, unique for the lifetime of the registry.
    pub id: AssetId,
    /// Trait payload derived at creation. Never mutated.
    pub traits: AssetTraits,
    /// Current custodian.
    pub holder: Holder,
    /// Timestamp when the asset was minted.
    pub minted_at: DateTime<Utc>,
}

/// The ownership ledger.
///
/// Assets are keyed by their sequential identifier; iteration order is
/// mint order. Holder mutation goes through [`transfer`](Self::transfer)
/// and nowhere else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRegistry {
    /// Minted assets in mint order.
    assets: BTreeMap<AssetId, AssetRecord>,
    /// Identifier the next mint will receive.
    next_id: AssetId,
}

impl AssetRegistry {
    /// Creates an empty registry. The first minted asset gets id 1.
    pub fn new() -> Self {
        Self {
            assets: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Mints a new asset and hands it to `owner`.
    ///
    /// Identifiers are assigned sequentially and never reused. Supply
    /// policy is not checked here — the minting unit gates creation
    /// requests before any randomness is ever requested.
    pub fn mint(&mut self, owner: AccountId, traits: AssetTraits) -> AssetId {
        let id = self.next_id;
        self.next_id += 1;
        self.assets.insert(
            id,
            AssetRecord {
                id,
                traits,
                holder: Holder::Account(owner),
                minted_at: Utc::now(),
            },
        );
        debug!(asset_id = id, "asset minted");
        id
    }

    /// Moves an asset from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownAsset`] if the asset was never
    /// minted, [`RegistryError::NotHolder`] if `from` is not the current
    /// holder, and [`RegistryError::InvalidTarget`] if `to` is the null
    /// identity. On any error the ledger is unchanged.
    pub fn transfer(
        &mut self,
        asset_id: AssetId,
        from: &Holder,
        to: Holder,
    ) -> Result<(), RegistryError> {
        if let Holder::Account(id) = &to {
            if id.is_null() {
                return Err(RegistryError::InvalidTarget);
            }
        }

        let record = self
            .assets
            .get_mut(&asset_id)
            .ok_or(RegistryError::UnknownAsset { asset_id })?;

        if &record.holder != from {
            return Err(RegistryError::NotHolder {
                asset_id,
                holder: record.holder.clone(),
                claimed: from.clone(),
            });
        }

        debug!(asset_id, %from, %to, "holder changed");
        record.holder = to;
        Ok(())
    }

    /// Returns the current holder of an asset.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownAsset`] if the asset was never minted.
    pub fn holder_of(&self, asset_id: AssetId) -> Result<&Holder, RegistryError> {
        self.assets
            .get(&asset_id)
            .map(|r| &r.holder)
            .ok_or(RegistryError::UnknownAsset { asset_id })
    }

    /// Returns the immutable trait payload of an asset.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownAsset`] if the asset was never minted.
    pub fn traits_of(&self, asset_id: AssetId) -> Result<&AssetTraits, RegistryError> {
        self.assets
            .get(&asset_id)
            .map(|r| &r.traits)
            .ok_or(RegistryError::UnknownAsset { asset_id })
    }

    /// Returns the full record for an asset, or `None` if never minted.
    pub fn record(&self, asset_id: AssetId) -> Option<&AssetRecord> {
        self.assets.get(&asset_id)
    }

    /// Total number of assets ever minted.
    pub fn total_minted(&self) -> u64 {
        self.assets.len() as u64
    }

    /// Iterates over all minted assets in mint order.
    pub fn iter(&self) -> impl Iterator<Item = &AssetRecord> {
        self.assets.values()
    }
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn traits(seed: u8) -> AssetTraits {
        AssetTraits::derive(&[seed; 32])
    }

    fn alice() -> AccountId {
        AccountId::new("alice_pk")
    }

    fn bob() -> AccountId {
        AccountId::new("bob_pk")
    }

    #[test]
    fn mint_assigns_sequential_ids() {
        let mut registry = AssetRegistry::new();
        assert_eq!(registry.mint(alice(), traits(1)), 1);
        assert_eq!(registry.mint(alice(), traits(2)), 2);
        assert_eq!(registry.mint(bob(), traits(3)), 3);
        assert_eq!(registry.total_minted(), 3);
    }

    #[test]
    fn minted_asset_is_held_by_owner() {
        let mut registry = AssetRegistry::new();
        let id = registry.mint(alice(), traits(1));
        assert_eq!(registry.holder_of(id).unwrap(), &Holder::Account(alice()));
    }

    #[test]
    fn transfer_moves_custody() {
        let mut registry = AssetRegistry::new();
        let id = registry.mint(alice(), traits(1));
        registry
            .transfer(id, &Holder::Account(alice()), Holder::Account(bob()))
            .unwrap();
        assert_eq!(registry.holder_of(id).unwrap(), &Holder::Account(bob()));
    }

    #[test]
    fn transfer_by_non_holder_rejected() {
        let mut registry = AssetRegistry::new();
        let id = registry.mint(alice(), traits(1));
        let result = registry.transfer(id, &Holder::Account(bob()), Holder::Account(bob()));
        assert!(matches!(result, Err(RegistryError::NotHolder { .. })));
        // State unchanged.
        assert_eq!(registry.holder_of(id).unwrap(), &Holder::Account(alice()));
    }

    #[test]
    fn transfer_to_null_identity_rejected() {
        let mut registry = AssetRegistry::new();
        let id = registry.mint(alice(), traits(1));
        let result = registry.transfer(
            id,
            &Holder::Account(alice()),
            Holder::Account(AccountId::null()),
        );
        assert!(matches!(result, Err(RegistryError::InvalidTarget)));
    }

    #[test]
    fn transfer_unknown_asset_rejected() {
        let mut registry = AssetRegistry::new();
        let result = registry.transfer(42, &Holder::Account(alice()), Holder::Account(bob()));
        assert!(matches!(
            result,
            Err(RegistryError::UnknownAsset { asset_id: 42 })
        ));
    }

    #[test]
    fn escrow_roundtrip() {
        let mut registry = AssetRegistry::new();
        let id = registry.mint(alice(), traits(1));
        registry
            .transfer(id, &Holder::Account(alice()), Holder::Registry)
            .unwrap();
        assert!(registry.holder_of(id).unwrap().is_registry());
        registry
            .transfer(id, &Holder::Registry, Holder::Account(alice()))
            .unwrap();
        assert_eq!(registry.holder_of(id).unwrap(), &Holder::Account(alice()));
    }

    #[test]
    fn queries_on_unknown_asset_fail() {
        let registry = AssetRegistry::new();
        assert!(registry.holder_of(7).is_err());
        assert!(registry.traits_of(7).is_err());
        assert!(registry.record(7).is_none());
    }

    #[test]
    fn traits_are_stored_verbatim() {
        let mut registry = AssetRegistry::new();
        let payload = traits(9);
        let id = registry.mint(alice(), payload.clone());
        assert_eq!(registry.traits_of(id).unwrap(), &payload);
    }
}
