//! # Direct-Sale Ledger
//!
//! Fixed-price listings, one optional record per asset. A listing exists
//! only while the holder has chosen to sell; it is destroyed on purchase,
//! on explicit delisting, and whenever the asset changes hands for any
//! other reason (a transferred asset is no longer for sale under its old
//! terms).
//!
//! This ledger is the sole mutator of listing records. Holder checks and
//! the actual custody change live with the ownership ledger; the
//! marketplace facade sequences the two so that settlement is atomic —
//! price validated, listing destroyed, asset transferred, payments
//! returned, with no observable intermediate state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use relic_registry::asset::AssetId;
use relic_registry::identity::AccountId;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during sale operations.
#[derive(Debug, Error)]
pub enum SaleError {
    /// A listing must cost something.
    #[error("invalid price: a listing must cost more than zero")]
    InvalidPrice,

    /// The asset already has an active listing.
    #[error("asset {asset_id} is already listed for sale")]
    AlreadyListed {
        /// The asset in question.
        asset_id: AssetId,
    },

    /// No active listing exists for the asset.
    #[error("asset {asset_id} is not listed for sale")]
    NotListed {
        /// The asset in question.
        asset_id: AssetId,
    },

    /// The payment does not cover the listing price. Raised rather than
    /// silently clamping, so a buyer acting on a stale quote finds out.
    #[error("stale price: sent {paid}, the listing costs {price}")]
    StalePrice {
        /// What the buyer attached.
        paid: u64,
        /// The current listing price.
        price: u64,
    },

    /// The buyer already holds the asset.
    #[error("self trade: {buyer} already holds this asset")]
    SelfTrade {
        /// The identity that tried to buy its own asset.
        buyer: AccountId,
    },
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// An active fixed-price listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Asking price in motes. Always greater than zero.
    pub price: u64,
    /// The holder who listed the asset. By the custody invariant this is
    /// the current holder for as long as the listing exists.
    pub seller: AccountId,
    /// When the listing was created.
    pub listed_at: DateTime<Utc>,
}

/// The sale ledger: at most one active listing per asset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaleLedger {
    listings: HashMap<AssetId, Listing>,
}

impl SaleLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a listing.
    ///
    /// # Errors
    ///
    /// Returns [`SaleError::InvalidPrice`] for a zero price and
    /// [`SaleError::AlreadyListed`] if an active listing exists.
    pub fn list(
        &mut self,
        asset_id: AssetId,
        seller: AccountId,
        price: u64,
    ) -> Result<(), SaleError> {
        if price == 0 {
            return Err(SaleError::InvalidPrice);
        }
        if self.listings.contains_key(&asset_id) {
            return Err(SaleError::AlreadyListed { asset_id });
        }
        self.listings.insert(
            asset_id,
            Listing {
                price,
                seller,
                listed_at: Utc::now(),
            },
        );
        debug!(asset_id, price, "listing created");
        Ok(())
    }

    /// Removes a listing at the seller's request.
    ///
    /// # Errors
    ///
    /// Returns [`SaleError::NotListed`] if no active listing exists.
    pub fn delist(&mut self, asset_id: AssetId) -> Result<Listing, SaleError> {
        self.listings
            .remove(&asset_id)
            .ok_or(SaleError::NotListed { asset_id })
    }

    /// Returns the active listing for an asset.
    ///
    /// # Errors
    ///
    /// Returns [`SaleError::NotListed`] if there is none.
    pub fn quote(&self, asset_id: AssetId) -> Result<&Listing, SaleError> {
        self.listings
            .get(&asset_id)
            .ok_or(SaleError::NotListed { asset_id })
    }

    /// Returns the active listing, if any.
    pub fn listing(&self, asset_id: AssetId) -> Option<&Listing> {
        self.listings.get(&asset_id)
    }

    /// Returns `true` if the asset has an active listing.
    pub fn is_listed(&self, asset_id: AssetId) -> bool {
        self.listings.contains_key(&asset_id)
    }

    /// Destroys the listing for an asset, if any. Invoked whenever the
    /// asset changes hands, so stale terms never survive a transfer.
    pub fn clear(&mut self, asset_id: AssetId) -> Option<Listing> {
        let cleared = self.listings.remove(&asset_id);
        if cleared.is_some() {
            debug!(asset_id, "listing cleared");
        }
        cleared
    }
}
