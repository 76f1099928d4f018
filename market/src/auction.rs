//! # Auction Engine
//!
//! The bidding state machine, per asset:
//!
//! ```text
//! none → open → (bid)* → ended-unfinalized → finalized
//! ```
//!
//! Bids are strictly increasing — a tie does not supplant. Whenever a
//! bidder is outbid, their escrowed amount is credited to the refund
//! ledger; credits accumulate across repeated re-entry and are zeroed
//! exactly once, at withdrawal, before any payment instruction is built.
//! The winner's final bid is never credited: it becomes the seller's
//! proceeds at finalization.
//!
//! Time never advances inside the engine. Every deadline comparison is
//! against the caller-supplied `now` (ledger time), and a missed
//! finalization simply leaves the auction finalizable later — records do
//! not expire on their own.
//!
//! The engine owns auction and refund records exclusively. Custody
//! changes (escrow on open, settlement on finalize) are the marketplace
//! facade's job, sequenced around the engine's transitions.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use relic_registry::asset::AssetId;
use relic_registry::identity::AccountId;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during auction operations.
#[derive(Debug, Error)]
pub enum AuctionError {
    /// No auction record exists for the asset.
    #[error("no auction exists for asset {asset_id}")]
    NoSuchAuction {
        /// The asset in question.
        asset_id: AssetId,
    },

    /// An unfinalized auction already exists for the asset.
    #[error("auction already active for asset {asset_id}: unfinalized, ends at {ends_at}")]
    AuctionActive {
        /// The asset in question.
        asset_id: AssetId,
        /// When the existing auction ends (or ended).
        ends_at: DateTime<Utc>,
    },

    /// The requested duration is zero or beyond what a deadline can hold.
    #[error("invalid auction duration: {seconds} seconds")]
    InvalidDuration {
        /// The rejected duration.
        seconds: u64,
    },

    /// The auction's deadline has passed; no further bids.
    #[error("auction for asset {asset_id} ended at {ended_at}")]
    AuctionEnded {
        /// The asset in question.
        asset_id: AssetId,
        /// The deadline that passed.
        ended_at: DateTime<Utc>,
    },

    /// The bid does not beat the current highest bid.
    #[error("bid too low: offered {offered}, the highest bid is {highest}")]
    BidTooLow {
        /// The rejected bid amount.
        offered: u64,
        /// The bid to beat (strictly).
        highest: u64,
    },

    /// The auction is still running; finalization must wait.
    #[error("auction for asset {asset_id} is still running until {ends_at}")]
    AuctionNotEnded {
        /// The asset in question.
        asset_id: AssetId,
        /// When finalization becomes possible.
        ends_at: DateTime<Utc>,
    },

    /// The auction was already finalized. Terminal state; nothing to do.
    #[error("auction for asset {asset_id} has already been finalized")]
    AlreadyFinalized {
        /// The asset in question.
        asset_id: AssetId,
    },

    /// The caller has no refundable balance for this asset.
    #[error("no refund available for {caller} on asset {asset_id}")]
    NoRefundAvailable {
        /// The asset in question.
        asset_id: AssetId,
        /// The identity that asked.
        caller: AccountId,
    },

    /// The caller may not trigger finalization for this auction.
    #[error("unauthorized finalization by {caller}: not the seller, highest bidder, or operator")]
    NotAuthorized {
        /// The identity that attempted the finalization.
        caller: AccountId,
    },

    /// A refund credit would overflow the bidder's balance.
    #[error("refund balance overflow for {bidder} on asset {asset_id}")]
    RefundOverflow {
        /// The asset in question.
        asset_id: AssetId,
        /// The bidder whose balance would overflow.
        bidder: AccountId,
    },
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A per-asset auction record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auction {
    /// The asset under the hammer.
    pub asset_id: AssetId,
    /// Who started the auction and receives the proceeds.
    pub seller: AccountId,
    /// When the auction opened.
    pub started_at: DateTime<Utc>,
    /// The bidding deadline. Bids strictly before, finalization at or
    /// after.
    pub ends_at: DateTime<Utc>,
    /// The bid to beat. Zero while no bid has been accepted.
    pub highest_bid: u64,
    /// The current leader, if any bid has been accepted.
    pub highest_bidder: Option<AccountId>,
    /// Set once, by finalization. Terminal.
    pub finalized: bool,
}

impl Auction {
    /// Returns `true` while bids are still admissible.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        !self.finalized && now < self.ends_at
    }

    /// Returns `true` once the deadline has passed.
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        now >= self.ends_at
    }
}

/// The auction engine: auction records plus the refund ledger.
///
/// Refund balances are keyed by asset and bidder, and survive across
/// consecutive auctions of the same asset — an unwithdrawn refund from a
/// settled auction is still owed after the asset goes under the hammer
/// again.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuctionEngine {
    auctions: HashMap<AssetId, Auction>,
    refunds: HashMap<AssetId, HashMap<AccountId, u64>>,
}

impl AuctionEngine {
    /// Creates an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens an auction for an asset.
    ///
    /// A new auction may start whenever no record exists or the existing
    /// record is finalized. An ended-but-unfinalized auction blocks: it
    /// must be finalized first, so its settlement is never orphaned.
    ///
    /// # Errors
    ///
    /// Returns [`AuctionError::AuctionActive`] if an unfinalized record
    /// exists and [`AuctionError::InvalidDuration`] for a zero or
    /// unrepresentable duration. On error, no record is touched.
    pub fn open(
        &mut self,
        asset_id: AssetId,
        seller: AccountId,
        duration_secs: u64,
        now: DateTime<Utc>,
    ) -> Result<Auction, AuctionError> {
        if let Some(existing) = self.auctions.get(&asset_id) {
            if !existing.finalized {
                return Err(AuctionError::AuctionActive {
                    asset_id,
                    ends_at: existing.ends_at,
                });
            }
        }

        if duration_secs == 0 {
            return Err(AuctionError::InvalidDuration {
                seconds: duration_secs,
            });
        }
        let ends_at = i64::try_from(duration_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|d| now.checked_add_signed(d))
            .ok_or(AuctionError::InvalidDuration {
                seconds: duration_secs,
            })?;

        let auction = Auction {
            asset_id,
            seller,
            started_at: now,
            ends_at,
            highest_bid: 0,
            highest_bidder: None,
            finalized: false,
        };
        debug!(asset_id, %ends_at, "auction opened");
        // Replaces a finalized record; refunds from the previous auction
        // stay on the books until withdrawn.
        self.auctions.insert(asset_id, auction.clone());
        Ok(auction)
    }

    /// Accepts a bid if it strictly beats the current highest.
    ///
    /// The previous leader, if any, has their bid credited to the refund
    /// ledger before the new bid takes over.
    ///
    /// # Errors
    ///
    /// Returns [`AuctionError::NoSuchAuction`], [`AuctionError::AuctionEnded`],
    /// [`AuctionError::BidTooLow`], or [`AuctionError::RefundOverflow`].
    /// On any error the engine is unchanged.
    pub fn place_bid(
        &mut self,
        asset_id: AssetId,
        bidder: AccountId,
        amount: u64,
        now: DateTime<Utc>,
    ) -> Result<(), AuctionError> {
        let auction = self
            .auctions
            .get(&asset_id)
            .ok_or(AuctionError::NoSuchAuction { asset_id })?;

        if auction.finalized || auction.has_ended(now) {
            return Err(AuctionError::AuctionEnded {
                asset_id,
                ended_at: auction.ends_at,
            });
        }
        if amount <= auction.highest_bid {
            return Err(AuctionError::BidTooLow {
                offered: amount,
                highest: auction.highest_bid,
            });
        }

        // Validate the refund credit before any write, so a failed bid
        // leaves both the auction and the refund ledger untouched.
        let credited = match &auction.highest_bidder {
            Some(prev) => {
                let current = self.refund_balance(asset_id, prev);
                let credited =
                    current
                        .checked_add(auction.highest_bid)
                        .ok_or(AuctionError::RefundOverflow {
                            asset_id,
                            bidder: prev.clone(),
                        })?;
                Some((prev.clone(), credited))
            }
            None => None,
        };

        if let Some((prev, balance)) = credited {
            debug!(asset_id, bidder = %prev, balance, "outbid, refund credited");
            self.refunds
                .entry(asset_id)
                .or_default()
                .insert(prev, balance);
        }

        let auction = self.auctions.get_mut(&asset_id).expect("checked above");
        auction.highest_bid = amount;
        auction.highest_bidder = Some(bidder);
        Ok(())
    }

    /// Marks an ended auction finalized and returns a snapshot of the
    /// settled record. Succeeds exactly once per auction.
    ///
    /// # Errors
    ///
    /// Returns [`AuctionError::NoSuchAuction`],
    /// [`AuctionError::AlreadyFinalized`], or
    /// [`AuctionError::AuctionNotEnded`]. On error the record is
    /// unchanged.
    pub fn finalize(
        &mut self,
        asset_id: AssetId,
        now: DateTime<Utc>,
    ) -> Result<Auction, AuctionError> {
        let auction = self
            .auctions
            .get_mut(&asset_id)
            .ok_or(AuctionError::NoSuchAuction { asset_id })?;

        if auction.finalized {
            return Err(AuctionError::AlreadyFinalized { asset_id });
        }
        if !auction.has_ended(now) {
            return Err(AuctionError::AuctionNotEnded {
                asset_id,
                ends_at: auction.ends_at,
            });
        }

        auction.finalized = true;
        debug!(asset_id, highest_bid = auction.highest_bid, "auction finalized");
        Ok(auction.clone())
    }

    /// Withdraws the caller's full refundable balance for an asset.
    ///
    /// The balance is zeroed *before* this returns — the caller builds
    /// the payment instruction from the returned amount, so the clearing
    /// write always precedes the payout.
    ///
    /// # Errors
    ///
    /// Returns [`AuctionError::NoRefundAvailable`] if the balance is zero.
    pub fn withdraw(
        &mut self,
        asset_id: AssetId,
        caller: &AccountId,
    ) -> Result<u64, AuctionError> {
        let amount = self.refund_balance(asset_id, caller);
        if amount == 0 {
            return Err(AuctionError::NoRefundAvailable {
                asset_id,
                caller: caller.clone(),
            });
        }
        if let Some(ledger) = self.refunds.get_mut(&asset_id) {
            ledger.remove(caller);
        }
        debug!(asset_id, %caller, amount, "refund withdrawn");
        Ok(amount)
    }

    /// Returns the auction record for an asset, if any (open, ended, or
    /// finalized).
    pub fn auction(&self, asset_id: AssetId) -> Option<&Auction> {
        self.auctions.get(&asset_id)
    }

    /// Returns the caller's refundable balance for an asset.
    pub fn refund_balance(&self, asset_id: AssetId, account: &AccountId) -> u64 {
        self.refunds
            .get(&asset_id)
            .and_then(|ledger| ledger.get(account))
            .copied()
            .unwrap_or(0)
    }
}
