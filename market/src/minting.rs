//! # Randomized Minting Unit
//!
//! Creation is a two-phase protocol. A payer lodges a paid request and
//! receives an opaque token; the asset does not exist yet. When the
//! trusted randomness oracle later delivers an unpredictable value for
//! that token, the request is consumed — exactly once — and the asset is
//! minted with traits derived deterministically from the randomness.
//!
//! Two properties are safety-critical and enforced here:
//!
//! - **single use** — a token is consumed the moment it is fulfilled.
//!   Replaying it fails, and can never mint a second asset.
//! - **supply reservation** — a request is only accepted while minted
//!   plus outstanding requests stay under the supply cap, so every
//!   escrowed request can be fulfilled without overshooting the cap.
//!
//! The unit also owns the minting policy (cost and cap). Both are
//! runtime-mutable through operator-gated paths on the marketplace.

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use relic_registry::identity::AccountId;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during creation-request operations.
#[derive(Debug, Error)]
pub enum MintError {
    /// The attached payment does not cover the current minting cost.
    #[error("insufficient payment: sent {paid}, minting costs {required}")]
    InsufficientPayment {
        /// What the payer attached.
        paid: u64,
        /// The current minting cost.
        required: u64,
    },

    /// Minted plus outstanding requests have reached the supply cap.
    #[error("supply exhausted: all {max_supply} assets are minted or reserved")]
    SupplyExhausted {
        /// The current supply cap.
        max_supply: u64,
    },

    /// The request token was never issued.
    #[error("unknown creation request: {token}")]
    UnknownRequest {
        /// The token the oracle presented.
        token: RequestToken,
    },

    /// The request token was already consumed by an earlier fulfilment.
    #[error("creation request {token} has already been fulfilled")]
    AlreadyFulfilled {
        /// The replayed token.
        token: RequestToken,
    },

    /// The caller is not the configured randomness oracle.
    #[error("unauthorized randomness source: {caller}")]
    NotRandomnessSource {
        /// The identity that attempted the fulfilment.
        caller: AccountId,
    },

    /// A supply cap below what is already minted or reserved.
    #[error("max supply {requested} is below the {committed} assets already minted or reserved")]
    SupplyBelowMinted {
        /// The cap the operator asked for.
        requested: u64,
        /// Assets already minted plus outstanding requests.
        committed: u64,
    },
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Opaque handle to an escrowed creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestToken(Uuid);

impl RequestToken {
    fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A paid creation request awaiting oracle randomness.
///
/// Ephemeral by design: destroyed (consumed) the moment the randomness
/// arrives and an asset is minted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRequest {
    /// The token handed back to the payer.
    pub token: RequestToken,
    /// Who paid, and who will own the minted asset.
    pub payer: AccountId,
    /// What they attached. Retained with the fee; creation does not
    /// return change.
    pub paid: u64,
    /// When the request was lodged.
    pub requested_at: DateTime<Utc>,
}

/// The minting unit: escrowed requests plus the minting policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintingUnit {
    /// Outstanding requests by token.
    pending: HashMap<RequestToken, PendingRequest>,
    /// Tokens that have already minted. Kept so a replay is
    /// distinguishable from a token that never existed.
    consumed: HashSet<RequestToken>,
    /// The identity allowed to fulfil requests.
    randomness_source: AccountId,
    /// Current cost of a creation request, in motes.
    minting_cost: u64,
    /// Cap on assets ever minted.
    max_supply: u64,
}

impl MintingUnit {
    /// Creates the unit with its oracle identity and initial policy.
    pub fn new(randomness_source: AccountId, minting_cost: u64, max_supply: u64) -> Self {
        Self {
            pending: HashMap::new(),
            consumed: HashSet::new(),
            randomness_source,
            minting_cost,
            max_supply,
        }
    }

    /// Escrows a paid creation request and issues its token.
    ///
    /// `minted` is the registry's current mint count; together with the
    /// outstanding requests it is checked against the supply cap.
    ///
    /// # Errors
    ///
    /// Returns [`MintError::InsufficientPayment`] if `payment` does not
    /// cover the current cost, and [`MintError::SupplyExhausted`] if no
    /// supply remains unreserved. On error, no request is created.
    pub fn request(
        &mut self,
        payer: AccountId,
        payment: u64,
        minted: u64,
    ) -> Result<RequestToken, MintError> {
        if payment < self.minting_cost {
            return Err(MintError::InsufficientPayment {
                paid: payment,
                required: self.minting_cost,
            });
        }

        let committed = minted + self.pending.len() as u64;
        if committed >= self.max_supply {
            return Err(MintError::SupplyExhausted {
                max_supply: self.max_supply,
            });
        }

        let token = RequestToken::fresh();
        self.pending.insert(
            token,
            PendingRequest {
                token,
                payer,
                paid: payment,
                requested_at: Utc::now(),
            },
        );
        debug!(%token, "creation request escrowed");
        Ok(token)
    }

    /// Consumes a request for fulfilment. Single use: succeeds at most
    /// once per token, ever.
    ///
    /// # Errors
    ///
    /// Returns [`MintError::NotRandomnessSource`] unless `caller` is the
    /// configured oracle, [`MintError::AlreadyFulfilled`] on a replay,
    /// and [`MintError::UnknownRequest`] for a token that was never
    /// issued.
    pub fn consume(
        &mut self,
        caller: &AccountId,
        token: RequestToken,
    ) -> Result<PendingRequest, MintError> {
        if caller != &self.randomness_source {
            return Err(MintError::NotRandomnessSource {
                caller: caller.clone(),
            });
        }
        if self.consumed.contains(&token) {
            return Err(MintError::AlreadyFulfilled { token });
        }
        let request = self
            .pending
            .remove(&token)
            .ok_or(MintError::UnknownRequest { token })?;
        self.consumed.insert(token);
        debug!(%token, payer = %request.payer, "creation request consumed");
        Ok(request)
    }

    /// Current minting cost in motes.
    pub fn minting_cost(&self) -> u64 {
        self.minting_cost
    }

    /// Current supply cap.
    pub fn max_supply(&self) -> u64 {
        self.max_supply
    }

    /// The identity allowed to fulfil requests.
    pub fn randomness_source(&self) -> &AccountId {
        &self.randomness_source
    }

    /// Number of outstanding requests.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Looks up an outstanding request.
    pub fn pending(&self, token: RequestToken) -> Option<&PendingRequest> {
        self.pending.get(&token)
    }

    /// Replaces the minting cost. Applies to future requests only.
    pub fn set_minting_cost(&mut self, cost: u64) {
        self.minting_cost = cost;
    }

    /// Replaces the supply cap.
    ///
    /// # Errors
    ///
    /// Returns [`MintError::SupplyBelowMinted`] if the new cap is below
    /// what is already minted or reserved by outstanding requests.
    pub fn set_max_supply(&mut self, max_supply: u64, minted: u64) -> Result<(), MintError> {
        let committed = minted + self.pending.len() as u64;
        if max_supply < committed {
            return Err(MintError::SupplyBelowMinted {
                requested: max_supply,
                committed,
            });
        }
        self.max_supply = max_supply;
        Ok(())
    }
}
