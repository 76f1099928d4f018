//! # Event Journal
//!
//! Every committed state transition leaves a durable, append-only record.
//! Presentation layers rebuild purchase and auction history from this
//! journal instead of scraping ledger state; the core only guarantees
//! that the sequence is gapless and in commit order.
//!
//! Failed operations never journal — the log describes what happened,
//! not what was attempted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use relic_registry::asset::AssetId;
use relic_registry::identity::{AccountId, Holder};

use crate::minting::RequestToken;

/// A committed state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// A paid creation request was escrowed.
    CreationRequested {
        token: RequestToken,
        payer: AccountId,
        paid: u64,
    },
    /// A creation request was fulfilled and an asset minted.
    AssetMinted {
        asset_id: AssetId,
        token: RequestToken,
        owner: AccountId,
    },
    /// Custody changed outside a sale or auction settlement.
    Transferred {
        asset_id: AssetId,
        from: Holder,
        to: Holder,
    },
    /// A fixed-price listing was created.
    Listed {
        asset_id: AssetId,
        seller: AccountId,
        price: u64,
    },
    /// A listing was removed without a sale.
    Delisted { asset_id: AssetId, seller: AccountId },
    /// A fixed-price sale settled.
    Sold {
        asset_id: AssetId,
        seller: AccountId,
        buyer: AccountId,
        price: u64,
    },
    /// An auction opened and the asset moved into escrow.
    AuctionStarted {
        asset_id: AssetId,
        seller: AccountId,
        ends_at: DateTime<Utc>,
    },
    /// A bid was accepted.
    BidPlaced {
        asset_id: AssetId,
        bidder: AccountId,
        amount: u64,
    },
    /// An auction settled — to the winner, or back to the seller.
    AuctionFinalized {
        asset_id: AssetId,
        winner: Option<AccountId>,
        hammer_price: u64,
    },
    /// An outbid bidder withdrew their refundable balance.
    RefundWithdrawn {
        asset_id: AssetId,
        bidder: AccountId,
        amount: u64,
    },
    /// The operator changed the minting cost.
    MintingCostChanged { previous: u64, current: u64 },
    /// The operator changed the supply cap.
    MaxSupplyChanged { previous: u64, current: u64 },
    /// The operator role changed hands.
    OperatorChanged {
        previous: AccountId,
        current: AccountId,
    },
}

impl LedgerEvent {
    /// The asset this event concerns, if it concerns one.
    pub fn asset_id(&self) -> Option<AssetId> {
        match self {
            LedgerEvent::AssetMinted { asset_id, .. }
            | LedgerEvent::Transferred { asset_id, .. }
            | LedgerEvent::Listed { asset_id, .. }
            | LedgerEvent::Delisted { asset_id, .. }
            | LedgerEvent::Sold { asset_id, .. }
            | LedgerEvent::AuctionStarted { asset_id, .. }
            | LedgerEvent::BidPlaced { asset_id, .. }
            | LedgerEvent::AuctionFinalized { asset_id, .. }
            | LedgerEvent::RefundWithdrawn { asset_id, .. } => Some(*asset_id),
            LedgerEvent::CreationRequested { .. }
            | LedgerEvent::MintingCostChanged { .. }
            | LedgerEvent::MaxSupplyChanged { .. }
            | LedgerEvent::OperatorChanged { .. } => None,
        }
    }
}

/// A journaled event with its position and commit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedEvent {
    /// Gapless, zero-based position in the journal.
    pub seq: u64,
    /// When the transition committed (ledger time where the operation
    /// carries one, wall clock otherwise).
    pub at: DateTime<Utc>,
    /// The transition itself.
    pub event: LedgerEvent,
}

/// The append-only journal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    entries: Vec<RecordedEvent>,
}

impl EventLog {
    /// Creates an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event stamped with the wall clock.
    pub fn record(&mut self, event: LedgerEvent) {
        self.record_at(Utc::now(), event);
    }

    /// Appends an event stamped with an explicit time (ledger time for
    /// deadline-gated operations).
    pub fn record_at(&mut self, at: DateTime<Utc>, event: LedgerEvent) {
        let seq = self.entries.len() as u64;
        self.entries.push(RecordedEvent { seq, at, event });
    }

    /// All entries, in commit order.
    pub fn all(&self) -> &[RecordedEvent] {
        &self.entries
    }

    /// Entries that concern a particular asset, in commit order.
    pub fn for_asset(&self, asset_id: AssetId) -> Vec<&RecordedEvent> {
        self.entries
            .iter()
            .filter(|entry| entry.event.asset_id() == Some(asset_id))
            .collect()
    }

    /// Number of journaled events.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been journaled yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
