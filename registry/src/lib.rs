//! # Relic Registry — Core Primitives
//!
//! The foundation of the Relic ledger: a registry of unique digital assets
//! with exclusive, exactly-one-holder custody. Everything above it — minting,
//! direct sale, auctions — moves assets and money *through* the primitives
//! defined here, never around them.
//!
//! ## Architecture
//!
//! - **identity** — participant identities and the holder model. The
//!   registry itself is a valid holder, which is how escrow works.
//! - **asset** — the asset model and the deterministic derivation of an
//!   asset's immutable traits from oracle randomness.
//! - **registry** — the ownership ledger. The sole mutator of holder
//!   fields; every custody change in the system is a call into it.
//! - **access** — the single privileged operator role, checked by identity
//!   equality. No approval hierarchies, no delegation.
//! - **payment** — outbound payment instructions. Money leaves the ledger
//!   as data, constructed only after all bookkeeping has committed.
//! - **config** — protocol constants: unit scaling, default minting
//!   policy, trait catalog dimensions.
//!
//! ## Design Philosophy
//!
//! 1. One holder per asset, at every instant. Not zero, not two.
//! 2. All monetary arithmetic is checked — wrapping and money do not mix.
//! 3. Failures are detected before any state is touched.
//! 4. Every public type is serializable (serde) for wire transport and
//!    persistent storage.

pub mod access;
pub mod asset;
pub mod config;
pub mod identity;
pub mod payment;
pub mod registry;
