//! # Relic Market — Lifecycle State Machines
//!
//! The three coupled lifecycles that make Relic more than a ledger of
//! static ownership rows:
//!
//! - **minting** — paid creation requests escrowed until an external
//!   randomness oracle fulfils them; one request, one asset, never twice.
//! - **sale** — fixed-price listings with atomic pay-transfer-clear
//!   settlement.
//! - **auction** — the timed bidding state machine: escrowed custody,
//!   strictly increasing bids, a refund ledger for everyone who was
//!   outbid, and a single irrevocable finalization.
//!
//! The [`marketplace`] module ties the machines to the ownership ledger
//! behind one call/response surface; [`events`] journals every committed
//! transition; [`shared`] serializes concurrent callers into the total
//! order the ledger contract requires.
//!
//! ## Design Principles
//!
//! 1. Validate first, mutate second — a failed operation leaves every
//!    ledger byte as it found it.
//! 2. Balance-affecting writes commit before any outbound payment is
//!    constructed. Refund-then-pay is structure, not discipline.
//! 3. State transitions are explicit: enum variants and typed errors, not
//!    boolean soup.

pub mod auction;
pub mod events;
pub mod marketplace;
pub mod minting;
pub mod sale;
pub mod shared;
