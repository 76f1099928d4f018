//! # Shared Ledger Handle
//!
//! The marketplace is a sequentially consistent ledger: operations on the
//! same asset are totally ordered by arrival, and no operation may observe
//! another's partially applied state. Within one thread, `&mut self`
//! already guarantees this. [`LedgerHandle`] extends the guarantee across
//! threads with a single write lock — coarse on purpose, because the
//! ordering contract is per ledger call, not per map shard.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::marketplace::Marketplace;

/// A cloneable, thread-safe handle to one marketplace.
///
/// Writers serialize; readers share. Closures keep lock scopes tight and
/// make it impossible to hold a guard across unrelated work.
#[derive(Clone)]
pub struct LedgerHandle {
    inner: Arc<RwLock<Marketplace>>,
}

impl LedgerHandle {
    /// Wraps a marketplace for shared use.
    pub fn new(market: Marketplace) -> Self {
        Self {
            inner: Arc::new(RwLock::new(market)),
        }
    }

    /// Runs a query under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&Marketplace) -> R) -> R {
        f(&self.inner.read())
    }

    /// Runs an operation under the write lock. The closure sees the
    /// ledger exactly as the previous operation left it.
    pub fn write<R>(&self, f: impl FnOnce(&mut Marketplace) -> R) -> R {
        f(&mut self.inner.write())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::MarketConfig;
    use relic_registry::identity::AccountId;

    fn handle() -> LedgerHandle {
        LedgerHandle::new(Marketplace::new(MarketConfig {
            operator: AccountId::new("operator_pk"),
            randomness_source: AccountId::new("oracle_pk"),
            minting_cost: 1_000,
            max_supply: 100,
        }))
    }

    #[test]
    fn reads_and_writes_share_one_ledger() {
        let ledger = handle();
        let token = ledger
            .write(|m| m.request_creation(&AccountId::new("alice_pk"), 1_000))
            .unwrap();
        ledger
            .write(|m| m.fulfill(&AccountId::new("oracle_pk"), token, [1u8; 32]))
            .unwrap();
        assert_eq!(ledger.read(|m| m.total_minted()), 1);
    }

    #[test]
    fn concurrent_requests_all_land() {
        let ledger = handle();
        let threads: Vec<_> = (0..8)
            .map(|i| {
                let ledger = ledger.clone();
                std::thread::spawn(move || {
                    let payer = AccountId::new(format!("payer_{i}"));
                    ledger.write(|m| m.request_creation(&payer, 1_000)).unwrap();
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        // Eight escrowed requests, eight journal entries, no torn state.
        assert_eq!(ledger.read(|m| m.events().len()), 8);
        assert_eq!(ledger.read(|m| m.treasury_balance()), 8_000);
    }
}
