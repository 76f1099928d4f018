//! # Outbound Payment Instructions
//!
//! Money leaves the ledger as data. An operation that owes a participant
//! funds — sale proceeds, buyer change, auction proceeds, a refund —
//! returns a [`Payment`] instruction as its final result, constructed only
//! after every balance-affecting write has committed. The settlement layer
//! executes the instruction; by the time it runs, re-entering the ledger
//! can only observe fully-settled state. This ordering is the structural
//! replacement for ad hoc reentrancy guards.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::AccountId;

/// Why a payment is owed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentKind {
    /// Proceeds of a fixed-price sale, owed to the seller.
    SaleProceeds,
    /// Overpayment on a fixed-price purchase, returned to the buyer.
    Change,
    /// Winning bid of a finalized auction, owed to the seller.
    AuctionProceeds,
    /// An outbid bidder's escrowed funds, returned on withdrawal.
    Refund,
}

impl fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentKind::SaleProceeds => write!(f, "sale proceeds"),
            PaymentKind::Change => write!(f, "change"),
            PaymentKind::AuctionProceeds => write!(f, "auction proceeds"),
            PaymentKind::Refund => write!(f, "refund"),
        }
    }
}

/// An instruction to pay `amount` motes to `recipient`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Who is owed.
    pub recipient: AccountId,
    /// How much, in motes.
    pub amount: u64,
    /// Why.
    pub kind: PaymentKind,
}

impl Payment {
    /// Builds a payment instruction.
    pub fn new(recipient: AccountId, amount: u64, kind: PaymentKind) -> Self {
        Self {
            recipient,
            amount,
            kind,
        }
    }
}

impl fmt::Display for Payment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} motes to {} ({})", self.amount, self.recipient, self.kind)
    }
}
