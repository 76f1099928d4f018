//! # Marketplace Facade
//!
//! The single call/response surface over the ownership ledger and the
//! three lifecycle machines. Every externally visible operation lives
//! here, takes an explicit caller identity, and follows the same shape:
//! validate against current state, mutate exactly the records the owning
//! components hold, journal the transition, and only then hand back any
//! outbound [`Payment`] instructions.
//!
//! Cross-component effects are sequenced in this module and nowhere else:
//! a custody change clears the asset's listing, opening an auction moves
//! the asset into registry escrow, finalization settles custody and
//! proceeds together. Components never write into each other's records.
//!
//! ## Failure Taxonomy
//!
//! Callers get a typed [`MarketError`] carrying the offending values, and
//! can bucket it with [`MarketError::kind`]: precondition (wrong
//! caller/holder), state (wrong lifecycle phase), value (bad magnitude),
//! or exhaustion. Every failure is detected before any mutation — a
//! rejected call leaves ledger state and journal untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use relic_registry::access::{AccessControl, AccessError};
use relic_registry::asset::{AssetId, AssetTraits};
use relic_registry::config;
use relic_registry::identity::{AccountId, Holder};
use relic_registry::payment::{Payment, PaymentKind};
use relic_registry::registry::{AssetRegistry, RegistryError};

use crate::auction::{Auction, AuctionEngine, AuctionError};
use crate::events::{EventLog, LedgerEvent, RecordedEvent};
use crate::minting::{MintError, MintingUnit, RequestToken};
use crate::sale::{SaleError, SaleLedger};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Coarse failure category, for callers that render by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// Wrong caller or wrong holder.
    Precondition,
    /// Wrong lifecycle phase.
    State,
    /// Bad magnitude.
    Value,
    /// A finite resource ran out.
    Exhaustion,
}

/// Any failure surfaced by a marketplace operation.
#[derive(Debug, Error)]
pub enum MarketError {
    /// Ownership-ledger failure.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Operator-role failure.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// Minting-unit failure.
    #[error(transparent)]
    Mint(#[from] MintError),

    /// Sale-ledger failure.
    #[error(transparent)]
    Sale(#[from] SaleError),

    /// Auction-engine failure.
    #[error(transparent)]
    Auction(#[from] AuctionError),
}

impl MarketError {
    /// Buckets the failure for callers that render by category.
    pub fn kind(&self) -> FailureKind {
        match self {
            MarketError::Registry(e) => match e {
                RegistryError::UnknownAsset { .. } => FailureKind::State,
                RegistryError::NotHolder { .. } | RegistryError::InvalidTarget => {
                    FailureKind::Precondition
                }
            },
            MarketError::Access(AccessError::NotOperator { .. }) => FailureKind::Precondition,
            MarketError::Mint(e) => match e {
                MintError::InsufficientPayment { .. } | MintError::SupplyBelowMinted { .. } => {
                    FailureKind::Value
                }
                MintError::SupplyExhausted { .. } => FailureKind::Exhaustion,
                MintError::UnknownRequest { .. } | MintError::AlreadyFulfilled { .. } => {
                    FailureKind::State
                }
                MintError::NotRandomnessSource { .. } => FailureKind::Precondition,
            },
            MarketError::Sale(e) => match e {
                SaleError::InvalidPrice | SaleError::StalePrice { .. } => FailureKind::Value,
                SaleError::AlreadyListed { .. } | SaleError::NotListed { .. } => FailureKind::State,
                SaleError::SelfTrade { .. } => FailureKind::Precondition,
            },
            MarketError::Auction(e) => match e {
                AuctionError::NoSuchAuction { .. }
                | AuctionError::AuctionActive { .. }
                | AuctionError::AuctionEnded { .. }
                | AuctionError::AuctionNotEnded { .. }
                | AuctionError::AlreadyFinalized { .. }
                | AuctionError::NoRefundAvailable { .. } => FailureKind::State,
                AuctionError::InvalidDuration { .. }
                | AuctionError::BidTooLow { .. }
                | AuctionError::RefundOverflow { .. } => FailureKind::Value,
                AuctionError::NotAuthorized { .. } => FailureKind::Precondition,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration & Receipts
// ---------------------------------------------------------------------------

/// Initial marketplace parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// The registry operator.
    pub operator: AccountId,
    /// The trusted randomness oracle.
    pub randomness_source: AccountId,
    /// Initial creation-request cost, in motes.
    pub minting_cost: u64,
    /// Initial supply cap.
    pub max_supply: u64,
}

impl MarketConfig {
    /// Config with protocol-default minting policy.
    pub fn new(operator: AccountId, randomness_source: AccountId) -> Self {
        Self {
            operator,
            randomness_source,
            minting_cost: config::DEFAULT_MINTING_COST,
            max_supply: config::DEFAULT_MAX_SUPPLY,
        }
    }
}

/// Outcome of a successful fixed-price purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    /// The asset that changed hands.
    pub asset_id: AssetId,
    /// The price actually charged.
    pub price: u64,
    /// Seller proceeds, plus the buyer's change when they overpaid.
    pub payments: Vec<Payment>,
}

/// Outcome of a successful auction finalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionSettlement {
    /// The asset that was under the hammer.
    pub asset_id: AssetId,
    /// The winner, or `None` if no bid was ever accepted.
    pub winner: Option<AccountId>,
    /// The winning bid (zero when there was none).
    pub hammer_price: u64,
    /// The seller's proceeds, when there was a winner.
    pub proceeds: Option<Payment>,
}

// ---------------------------------------------------------------------------
// Marketplace
// ---------------------------------------------------------------------------

/// The registry state: ownership ledger, lifecycle machines, journal.
///
/// All operations take `&mut self` and run to completion — there is no
/// cooperative suspension inside an operation, so each call is atomic
/// with respect to every other. For cross-thread sharing, see
/// [`crate::shared::LedgerHandle`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Marketplace {
    registry: AssetRegistry,
    access: AccessControl,
    minting: MintingUnit,
    sale: SaleLedger,
    auction: AuctionEngine,
    events: EventLog,
    /// Minting fees accrued by the registry, in motes. Informational —
    /// nothing in the core spends it.
    treasury: u64,
}

impl Marketplace {
    /// Creates a marketplace with the given parameters and an empty
    /// ledger.
    pub fn new(config: MarketConfig) -> Self {
        Self {
            registry: AssetRegistry::new(),
            access: AccessControl::new(config.operator),
            minting: MintingUnit::new(
                config.randomness_source,
                config.minting_cost,
                config.max_supply,
            ),
            sale: SaleLedger::new(),
            auction: AuctionEngine::new(),
            events: EventLog::new(),
            treasury: 0,
        }
    }

    fn ensure_account(id: &AccountId) -> Result<(), RegistryError> {
        if id.is_null() {
            Err(RegistryError::InvalidTarget)
        } else {
            Ok(())
        }
    }

    // -----------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------

    /// Escrows a paid creation request and returns its token.
    ///
    /// The asset does not exist yet — it is minted when the randomness
    /// oracle fulfils the token. The payment is retained with the fee.
    pub fn request_creation(
        &mut self,
        payer: &AccountId,
        payment: u64,
    ) -> Result<RequestToken, MarketError> {
        Self::ensure_account(payer)?;
        let token = self
            .minting
            .request(payer.clone(), payment, self.registry.total_minted())?;
        self.treasury = self.treasury.saturating_add(payment);
        self.events.record(LedgerEvent::CreationRequested {
            token,
            payer: payer.clone(),
            paid: payment,
        });
        info!(%token, %payer, payment, "creation requested");
        Ok(token)
    }

    /// Fulfils a creation request with oracle randomness, minting exactly
    /// one asset to the original payer.
    ///
    /// Only the configured randomness source may call this; a token is
    /// consumed on first use and can never mint twice.
    pub fn fulfill(
        &mut self,
        caller: &AccountId,
        token: RequestToken,
        random_value: [u8; 32],
    ) -> Result<AssetId, MarketError> {
        let request = self.minting.consume(caller, token)?;
        let traits = AssetTraits::derive(&random_value);
        let asset_id = self.registry.mint(request.payer.clone(), traits);
        self.events.record(LedgerEvent::AssetMinted {
            asset_id,
            token,
            owner: request.payer.clone(),
        });
        info!(asset_id, %token, owner = %request.payer, "asset minted");
        Ok(asset_id)
    }

    // -----------------------------------------------------------------
    // Ownership
    // -----------------------------------------------------------------

    /// Owner-initiated transfer. `from` must be the current holder; the
    /// asset's listing, if any, does not survive the move.
    pub fn transfer(
        &mut self,
        asset_id: AssetId,
        from: &AccountId,
        to: &AccountId,
    ) -> Result<(), MarketError> {
        let from = Holder::Account(from.clone());
        let to = Holder::Account(to.clone());
        self.registry.transfer(asset_id, &from, to.clone())?;
        if let Some(listing) = self.sale.clear(asset_id) {
            self.events.record(LedgerEvent::Delisted {
                asset_id,
                seller: listing.seller,
            });
        }
        self.events.record(LedgerEvent::Transferred {
            asset_id,
            from: from.clone(),
            to: to.clone(),
        });
        info!(asset_id, %from, %to, "asset transferred");
        Ok(())
    }

    // -----------------------------------------------------------------
    // Direct Sale
    // -----------------------------------------------------------------

    /// Lists an asset at a fixed price. Only the current holder may list.
    pub fn list(
        &mut self,
        seller: &AccountId,
        asset_id: AssetId,
        price: u64,
    ) -> Result<(), MarketError> {
        self.require_holder(asset_id, seller)?;
        self.sale.list(asset_id, seller.clone(), price)?;
        self.events.record(LedgerEvent::Listed {
            asset_id,
            seller: seller.clone(),
            price,
        });
        info!(asset_id, %seller, price, "asset listed");
        Ok(())
    }

    /// Removes an asset's listing. Only the current holder may delist.
    pub fn delist(&mut self, seller: &AccountId, asset_id: AssetId) -> Result<(), MarketError> {
        self.require_holder(asset_id, seller)?;
        self.sale.delist(asset_id)?;
        self.events.record(LedgerEvent::Delisted {
            asset_id,
            seller: seller.clone(),
        });
        info!(asset_id, %seller, "asset delisted");
        Ok(())
    }

    /// Buys a listed asset.
    ///
    /// A single atomic step: the listing is validated against the
    /// attached payment, custody moves to the buyer, the listing is
    /// destroyed, and the returned payments carry the seller's proceeds
    /// plus any change.
    pub fn buy(
        &mut self,
        buyer: &AccountId,
        asset_id: AssetId,
        payment: u64,
    ) -> Result<PurchaseReceipt, MarketError> {
        Self::ensure_account(buyer)?;
        let holder = self.registry.holder_of(asset_id)?.clone();
        let listing = self.sale.quote(asset_id)?;
        if holder.is_account(buyer) {
            return Err(SaleError::SelfTrade {
                buyer: buyer.clone(),
            }
            .into());
        }
        if payment < listing.price {
            return Err(SaleError::StalePrice {
                paid: payment,
                price: listing.price,
            }
            .into());
        }
        let price = listing.price;
        let seller = listing.seller.clone();

        // All checks passed; commit custody and destroy the listing, then
        // build the outbound payments last.
        self.registry
            .transfer(asset_id, &holder, Holder::Account(buyer.clone()))?;
        self.sale.clear(asset_id);

        let mut payments = vec![Payment::new(seller.clone(), price, PaymentKind::SaleProceeds)];
        if payment > price {
            payments.push(Payment::new(
                buyer.clone(),
                payment - price,
                PaymentKind::Change,
            ));
        }
        self.events.record(LedgerEvent::Sold {
            asset_id,
            seller: seller.clone(),
            buyer: buyer.clone(),
            price,
        });
        info!(asset_id, %seller, %buyer, price, "asset sold");
        Ok(PurchaseReceipt {
            asset_id,
            price,
            payments,
        })
    }

    // -----------------------------------------------------------------
    // Auction
    // -----------------------------------------------------------------

    /// Opens a timed auction and moves the asset into registry escrow.
    ///
    /// `now` is ledger time: the deadline is `now + duration_secs` and
    /// every later gate compares against the `now` its own call supplies.
    pub fn start_auction(
        &mut self,
        owner: &AccountId,
        asset_id: AssetId,
        duration_secs: u64,
        now: DateTime<Utc>,
    ) -> Result<(), MarketError> {
        // Checked ahead of the holder: an escrowed asset would otherwise
        // surface as NotHolder and mask the real reason.
        if let Some(existing) = self.auction.auction(asset_id) {
            if !existing.finalized {
                return Err(AuctionError::AuctionActive {
                    asset_id,
                    ends_at: existing.ends_at,
                }
                .into());
            }
        }
        let holder = self.require_holder(asset_id, owner)?;
        let auction = self
            .auction
            .open(asset_id, owner.clone(), duration_secs, now)?;
        self.registry.transfer(asset_id, &holder, Holder::Registry)?;
        if let Some(listing) = self.sale.clear(asset_id) {
            self.events.record_at(
                now,
                LedgerEvent::Delisted {
                    asset_id,
                    seller: listing.seller,
                },
            );
        }
        self.events.record_at(
            now,
            LedgerEvent::AuctionStarted {
                asset_id,
                seller: owner.clone(),
                ends_at: auction.ends_at,
            },
        );
        info!(asset_id, seller = %owner, ends_at = %auction.ends_at, "auction started");
        Ok(())
    }

    /// Places a bid. Must strictly beat the current highest; the
    /// previous leader's bid becomes refundable.
    pub fn bid(
        &mut self,
        bidder: &AccountId,
        asset_id: AssetId,
        amount: u64,
        now: DateTime<Utc>,
    ) -> Result<(), MarketError> {
        Self::ensure_account(bidder)?;
        self.auction.place_bid(asset_id, bidder.clone(), amount, now)?;
        self.events.record_at(
            now,
            LedgerEvent::BidPlaced {
                asset_id,
                bidder: bidder.clone(),
                amount,
            },
        );
        info!(asset_id, %bidder, amount, "bid accepted");
        Ok(())
    }

    /// Settles an ended auction: custody to the winner and proceeds to
    /// the seller, or custody back to the seller when no bid was placed.
    ///
    /// Callable by the seller, the current highest bidder, or the
    /// operator — but the deadline, not the caller, decides *whether*
    /// finalization is possible.
    pub fn finalize_auction(
        &mut self,
        caller: &AccountId,
        asset_id: AssetId,
        now: DateTime<Utc>,
    ) -> Result<AuctionSettlement, MarketError> {
        let auction = self
            .auction
            .auction(asset_id)
            .ok_or(AuctionError::NoSuchAuction { asset_id })?;
        let authorized = caller == &auction.seller
            || auction.highest_bidder.as_ref() == Some(caller)
            || self.access.is_operator(caller);
        if !authorized {
            return Err(AuctionError::NotAuthorized {
                caller: caller.clone(),
            }
            .into());
        }

        let settled = self.auction.finalize(asset_id, now)?;
        let proceeds = match &settled.highest_bidder {
            Some(winner) => {
                self.registry
                    .transfer(asset_id, &Holder::Registry, Holder::Account(winner.clone()))?;
                Some(Payment::new(
                    settled.seller.clone(),
                    settled.highest_bid,
                    PaymentKind::AuctionProceeds,
                ))
            }
            None => {
                self.registry.transfer(
                    asset_id,
                    &Holder::Registry,
                    Holder::Account(settled.seller.clone()),
                )?;
                None
            }
        };

        self.events.record_at(
            now,
            LedgerEvent::AuctionFinalized {
                asset_id,
                winner: settled.highest_bidder.clone(),
                hammer_price: settled.highest_bid,
            },
        );
        info!(
            asset_id,
            winner = %settled
                .highest_bidder
                .as_ref()
                .map(|w| w.to_string())
                .unwrap_or_else(|| "none".into()),
            hammer_price = settled.highest_bid,
            "auction finalized"
        );
        Ok(AuctionSettlement {
            asset_id,
            winner: settled.highest_bidder,
            hammer_price: settled.highest_bid,
            proceeds,
        })
    }

    /// Withdraws the caller's full refundable balance for an asset.
    ///
    /// The balance is zeroed before the payment instruction exists;
    /// withdrawing twice fails.
    pub fn withdraw_refund(
        &mut self,
        caller: &AccountId,
        asset_id: AssetId,
    ) -> Result<Payment, MarketError> {
        let amount = self.auction.withdraw(asset_id, caller)?;
        self.events.record(LedgerEvent::RefundWithdrawn {
            asset_id,
            bidder: caller.clone(),
            amount,
        });
        info!(asset_id, %caller, amount, "refund withdrawn");
        Ok(Payment::new(caller.clone(), amount, PaymentKind::Refund))
    }

    // -----------------------------------------------------------------
    // Administration
    // -----------------------------------------------------------------

    /// Operator-only: changes the creation-request cost.
    pub fn set_minting_cost(&mut self, caller: &AccountId, cost: u64) -> Result<(), MarketError> {
        self.access.require_operator(caller)?;
        let previous = self.minting.minting_cost();
        self.minting.set_minting_cost(cost);
        self.events.record(LedgerEvent::MintingCostChanged {
            previous,
            current: cost,
        });
        info!(previous, current = cost, "minting cost changed");
        Ok(())
    }

    /// Operator-only: changes the supply cap. The cap can never undercut
    /// what is already minted or reserved.
    pub fn set_max_supply(&mut self, caller: &AccountId, max: u64) -> Result<(), MarketError> {
        self.access.require_operator(caller)?;
        let previous = self.minting.max_supply();
        self.minting
            .set_max_supply(max, self.registry.total_minted())?;
        self.events.record(LedgerEvent::MaxSupplyChanged {
            previous,
            current: max,
        });
        info!(previous, current = max, "max supply changed");
        Ok(())
    }

    /// Operator-only: hands the operator role to a new identity.
    pub fn set_operator(
        &mut self,
        caller: &AccountId,
        new_operator: AccountId,
    ) -> Result<(), MarketError> {
        Self::ensure_account(&new_operator)?;
        let previous = self.access.operator().clone();
        self.access.set_operator(caller, new_operator.clone())?;
        self.events.record(LedgerEvent::OperatorChanged {
            previous,
            current: new_operator,
        });
        Ok(())
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// Current holder of an asset.
    pub fn holder_of(&self, asset_id: AssetId) -> Result<&Holder, MarketError> {
        Ok(self.registry.holder_of(asset_id)?)
    }

    /// Immutable trait payload of an asset.
    pub fn traits_of(&self, asset_id: AssetId) -> Result<&AssetTraits, MarketError> {
        Ok(self.registry.traits_of(asset_id)?)
    }

    /// Total number of assets ever minted.
    pub fn total_minted(&self) -> u64 {
        self.registry.total_minted()
    }

    /// Returns `true` if the asset has an active listing.
    pub fn is_for_sale(&self, asset_id: AssetId) -> bool {
        self.sale.is_listed(asset_id)
    }

    /// Asking price of an asset's active listing, if any.
    pub fn price_of(&self, asset_id: AssetId) -> Option<u64> {
        self.sale.listing(asset_id).map(|l| l.price)
    }

    /// Auction record for an asset, if any (open, ended, or finalized).
    pub fn auction_state(&self, asset_id: AssetId) -> Option<&Auction> {
        self.auction.auction(asset_id)
    }

    /// The account's refundable balance for an asset.
    pub fn refund_balance_of(&self, asset_id: AssetId, account: &AccountId) -> u64 {
        self.auction.refund_balance(asset_id, account)
    }

    /// Current creation-request cost.
    pub fn minting_cost(&self) -> u64 {
        self.minting.minting_cost()
    }

    /// Current supply cap.
    pub fn max_supply(&self) -> u64 {
        self.minting.max_supply()
    }

    /// The registry operator.
    pub fn operator(&self) -> &AccountId {
        self.access.operator()
    }

    /// Minting fees accrued so far, in motes.
    pub fn treasury_balance(&self) -> u64 {
        self.treasury
    }

    /// The full journal, in commit order.
    pub fn events(&self) -> &[RecordedEvent] {
        self.events.all()
    }

    /// Journal entries concerning one asset, in commit order.
    pub fn events_for_asset(&self, asset_id: AssetId) -> Vec<&RecordedEvent> {
        self.events.for_asset(asset_id)
    }

    // -----------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------

    /// Fails unless `account` is the asset's current (external) holder.
    /// Returns the holder for follow-up custody moves.
    fn require_holder(
        &self,
        asset_id: AssetId,
        account: &AccountId,
    ) -> Result<Holder, MarketError> {
        let holder = self.registry.holder_of(asset_id)?;
        if !holder.is_account(account) {
            return Err(RegistryError::NotHolder {
                asset_id,
                holder: holder.clone(),
                claimed: Holder::Account(account.clone()),
            }
            .into());
        }
        Ok(holder.clone())
    }
}
