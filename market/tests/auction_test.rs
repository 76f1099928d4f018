//! Integration tests for the auction lifecycle.
//!
//! Time is ledger time: every deadline-gated call takes an explicit `now`,
//! so these tests advance the clock by supplying later instants instead of
//! sleeping. The core story — two bidders, an outbid refund, finalization
//! to the winner, a one-shot withdrawal — is covered end to end, along
//! with the edges around re-auctioning and escrowed custody.

use chrono::{DateTime, Duration, Utc};

use relic_market::marketplace::{FailureKind, MarketConfig, Marketplace};
use relic_registry::config::MOTES_PER_COIN;
use relic_registry::identity::{AccountId, Holder};
use relic_registry::payment::PaymentKind;

const COIN: u64 = MOTES_PER_COIN;
const HOUR: u64 = 3_600;

fn account(name: &str) -> AccountId {
    AccountId::new(name)
}

fn oracle() -> AccountId {
    account("oracle_pk")
}

fn operator() -> AccountId {
    account("operator_pk")
}

fn market() -> Marketplace {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    Marketplace::new(MarketConfig {
        operator: operator(),
        randomness_source: oracle(),
        minting_cost: COIN,
        max_supply: 100,
    })
}

fn mint_to(market: &mut Marketplace, owner: &AccountId, seed: u8) -> u64 {
    let token = market.request_creation(owner, COIN).unwrap();
    market.fulfill(&oracle(), token, [seed; 32]).unwrap()
}

fn after(start: DateTime<Utc>, secs: u64) -> DateTime<Utc> {
    start + Duration::seconds(secs as i64)
}

// ---------------------------------------------------------------------------
// Opening
// ---------------------------------------------------------------------------

#[test]
fn starting_an_auction_escrows_the_asset() {
    let mut market = market();
    let seller = account("seller_pk");
    let asset_id = mint_to(&mut market, &seller, 1);
    let t0 = Utc::now();

    market.start_auction(&seller, asset_id, HOUR, t0).unwrap();

    // The registry itself holds the asset while the auction runs.
    assert!(market.holder_of(asset_id).unwrap().is_registry());
    let auction = market.auction_state(asset_id).unwrap();
    assert_eq!(auction.seller, seller);
    assert_eq!(auction.ends_at, after(t0, HOUR));
    assert_eq!(auction.highest_bid, 0);
    assert_eq!(auction.highest_bidder, None);
    assert!(!auction.finalized);
}

#[test]
fn starting_requires_the_holder() {
    let mut market = market();
    let seller = account("seller_pk");
    let asset_id = mint_to(&mut market, &seller, 1);

    let err = market
        .start_auction(&account("mallory_pk"), asset_id, HOUR, Utc::now())
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Precondition);
    assert!(market.auction_state(asset_id).is_none());
}

#[test]
fn starting_clears_an_active_listing() {
    let mut market = market();
    let seller = account("seller_pk");
    let asset_id = mint_to(&mut market, &seller, 1);

    market.list(&seller, asset_id, COIN).unwrap();
    market
        .start_auction(&seller, asset_id, HOUR, Utc::now())
        .unwrap();
    assert!(!market.is_for_sale(asset_id));
}

#[test]
fn zero_duration_rejected() {
    let mut market = market();
    let seller = account("seller_pk");
    let asset_id = mint_to(&mut market, &seller, 1);

    let err = market
        .start_auction(&seller, asset_id, 0, Utc::now())
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Value);
}

#[test]
fn unfinalized_auction_blocks_a_second_start() {
    let mut market = market();
    let seller = account("seller_pk");
    let asset_id = mint_to(&mut market, &seller, 1);
    let t0 = Utc::now();

    market.start_auction(&seller, asset_id, HOUR, t0).unwrap();

    // Still running.
    let err = market
        .start_auction(&seller, asset_id, HOUR, after(t0, 10))
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::State);

    // Ended but unfinalized: still blocked, finalize first.
    let err = market
        .start_auction(&seller, asset_id, HOUR, after(t0, HOUR + 1))
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::State);
}

#[test]
fn finalized_auction_allows_a_fresh_start() {
    let mut market = market();
    let seller = account("seller_pk");
    let asset_id = mint_to(&mut market, &seller, 1);
    let t0 = Utc::now();

    market.start_auction(&seller, asset_id, HOUR, t0).unwrap();
    market
        .finalize_auction(&seller, asset_id, after(t0, HOUR))
        .unwrap();

    // No bids, so the asset came back and can go under the hammer again.
    market
        .start_auction(&seller, asset_id, HOUR, after(t0, HOUR + 10))
        .unwrap();
    assert!(market.holder_of(asset_id).unwrap().is_registry());
}

// ---------------------------------------------------------------------------
// Bidding
// ---------------------------------------------------------------------------

#[test]
fn bids_must_strictly_increase() {
    let mut market = market();
    let seller = account("seller_pk");
    let asset_id = mint_to(&mut market, &seller, 1);
    let t0 = Utc::now();

    market.start_auction(&seller, asset_id, HOUR, t0).unwrap();
    market
        .bid(&account("a_pk"), asset_id, COIN, after(t0, 1))
        .unwrap();

    // A tie does not supplant.
    let err = market
        .bid(&account("b_pk"), asset_id, COIN, after(t0, 2))
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Value);

    market
        .bid(&account("b_pk"), asset_id, COIN + 1, after(t0, 3))
        .unwrap();
    let auction = market.auction_state(asset_id).unwrap();
    assert_eq!(auction.highest_bid, COIN + 1);
    assert_eq!(auction.highest_bidder, Some(account("b_pk")));
}

#[test]
fn bid_without_an_auction_rejected() {
    let mut market = market();
    let seller = account("seller_pk");
    let asset_id = mint_to(&mut market, &seller, 1);

    let err = market
        .bid(&account("a_pk"), asset_id, COIN, Utc::now())
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::State);
}

#[test]
fn bid_at_the_deadline_rejected() {
    let mut market = market();
    let seller = account("seller_pk");
    let asset_id = mint_to(&mut market, &seller, 1);
    let t0 = Utc::now();

    market.start_auction(&seller, asset_id, HOUR, t0).unwrap();
    let err = market
        .bid(&account("a_pk"), asset_id, COIN, after(t0, HOUR))
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::State);
}

#[test]
fn rebidding_accumulates_refund_credit() {
    let mut market = market();
    let seller = account("seller_pk");
    let a = account("a_pk");
    let b = account("b_pk");
    let asset_id = mint_to(&mut market, &seller, 1);
    let t0 = Utc::now();

    market.start_auction(&seller, asset_id, HOUR, t0).unwrap();
    market.bid(&a, asset_id, COIN, after(t0, 1)).unwrap();
    market.bid(&b, asset_id, 2 * COIN, after(t0, 2)).unwrap();
    market.bid(&a, asset_id, 3 * COIN, after(t0, 3)).unwrap();
    market.bid(&b, asset_id, 4 * COIN, after(t0, 4)).unwrap();

    // A was outbid twice: 1 + 3. B's 2 is refundable; his 4 leads.
    assert_eq!(market.refund_balance_of(asset_id, &a), 4 * COIN);
    assert_eq!(market.refund_balance_of(asset_id, &b), 2 * COIN);
}

// ---------------------------------------------------------------------------
// Finalization & Refunds
// ---------------------------------------------------------------------------

/// Two bidders, an outbid refund, settlement to the winner, and a
/// one-shot withdrawal.
#[test]
fn two_bidder_auction_settles_and_refunds() {
    let mut market = market();
    let seller = account("seller_pk");
    let a = account("a_pk");
    let b = account("b_pk");
    let asset_id = mint_to(&mut market, &seller, 1);
    let t0 = Utc::now();

    market.start_auction(&seller, asset_id, HOUR, t0).unwrap();
    market.bid(&a, asset_id, COIN, after(t0, 60)).unwrap();
    market.bid(&b, asset_id, 2 * COIN, after(t0, 120)).unwrap();

    assert_eq!(market.refund_balance_of(asset_id, &a), COIN);
    let auction = market.auction_state(asset_id).unwrap();
    assert_eq!(auction.highest_bidder, Some(b.clone()));
    assert_eq!(auction.highest_bid, 2 * COIN);

    // Past the deadline: settle.
    let settlement = market
        .finalize_auction(&seller, asset_id, after(t0, HOUR + 1))
        .unwrap();
    assert_eq!(market.holder_of(asset_id).unwrap(), &Holder::Account(b.clone()));
    assert_eq!(settlement.winner, Some(b));
    assert_eq!(settlement.hammer_price, 2 * COIN);
    let proceeds = settlement.proceeds.unwrap();
    assert_eq!(proceeds.recipient, seller);
    assert_eq!(proceeds.amount, 2 * COIN);
    assert_eq!(proceeds.kind, PaymentKind::AuctionProceeds);

    // A withdraws exactly once.
    let refund = market.withdraw_refund(&a, asset_id).unwrap();
    assert_eq!(refund.recipient, a);
    assert_eq!(refund.amount, COIN);
    assert_eq!(refund.kind, PaymentKind::Refund);
    assert_eq!(market.refund_balance_of(asset_id, &a), 0);

    let err = market.withdraw_refund(&a, asset_id).unwrap_err();
    assert_eq!(err.kind(), FailureKind::State);
}

#[test]
fn finalize_before_the_deadline_rejected() {
    let mut market = market();
    let seller = account("seller_pk");
    let asset_id = mint_to(&mut market, &seller, 1);
    let t0 = Utc::now();

    market.start_auction(&seller, asset_id, HOUR, t0).unwrap();
    let err = market
        .finalize_auction(&seller, asset_id, after(t0, HOUR - 1))
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::State);
    assert!(market.holder_of(asset_id).unwrap().is_registry());
}

#[test]
fn finalize_without_bids_returns_the_asset() {
    let mut market = market();
    let seller = account("seller_pk");
    let asset_id = mint_to(&mut market, &seller, 1);
    let t0 = Utc::now();

    market.start_auction(&seller, asset_id, HOUR, t0).unwrap();
    let settlement = market
        .finalize_auction(&seller, asset_id, after(t0, HOUR))
        .unwrap();

    assert_eq!(settlement.winner, None);
    assert_eq!(settlement.hammer_price, 0);
    assert!(settlement.proceeds.is_none());
    assert_eq!(market.holder_of(asset_id).unwrap(), &Holder::Account(seller));
}

#[test]
fn finalize_twice_fails_with_identical_state() {
    let mut market = market();
    let seller = account("seller_pk");
    let a = account("a_pk");
    let asset_id = mint_to(&mut market, &seller, 1);
    let t0 = Utc::now();

    market.start_auction(&seller, asset_id, HOUR, t0).unwrap();
    market.bid(&a, asset_id, COIN, after(t0, 1)).unwrap();
    market
        .finalize_auction(&seller, asset_id, after(t0, HOUR))
        .unwrap();

    let holder_before = market.holder_of(asset_id).unwrap().clone();
    let auction_before = market.auction_state(asset_id).unwrap().clone();
    let events_before = market.events().len();

    let err = market
        .finalize_auction(&seller, asset_id, after(t0, HOUR + 60))
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::State);

    assert_eq!(market.holder_of(asset_id).unwrap(), &holder_before);
    assert_eq!(market.auction_state(asset_id).unwrap(), &auction_before);
    assert_eq!(market.events().len(), events_before);
}

#[test]
fn finalize_gated_to_seller_bidder_or_operator() {
    let mut market = market();
    let seller = account("seller_pk");
    let a = account("a_pk");
    let asset_id = mint_to(&mut market, &seller, 1);
    let t0 = Utc::now();

    market.start_auction(&seller, asset_id, HOUR, t0).unwrap();
    market.bid(&a, asset_id, COIN, after(t0, 1)).unwrap();

    let err = market
        .finalize_auction(&account("rando_pk"), asset_id, after(t0, HOUR))
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Precondition);

    // The highest bidder may trigger settlement.
    market
        .finalize_auction(&a, asset_id, after(t0, HOUR))
        .unwrap();
}

#[test]
fn operator_may_finalize() {
    let mut market = market();
    let seller = account("seller_pk");
    let asset_id = mint_to(&mut market, &seller, 1);
    let t0 = Utc::now();

    market.start_auction(&seller, asset_id, HOUR, t0).unwrap();
    market
        .finalize_auction(&operator(), asset_id, after(t0, HOUR))
        .unwrap();
}

#[test]
fn the_winner_has_nothing_to_withdraw() {
    let mut market = market();
    let seller = account("seller_pk");
    let a = account("a_pk");
    let asset_id = mint_to(&mut market, &seller, 1);
    let t0 = Utc::now();

    market.start_auction(&seller, asset_id, HOUR, t0).unwrap();
    market.bid(&a, asset_id, COIN, after(t0, 1)).unwrap();
    market
        .finalize_auction(&seller, asset_id, after(t0, HOUR))
        .unwrap();

    let err = market.withdraw_refund(&a, asset_id).unwrap_err();
    assert_eq!(err.kind(), FailureKind::State);
}

#[test]
fn refunds_survive_a_reauction() {
    let mut market = market();
    let seller = account("seller_pk");
    let a = account("a_pk");
    let b = account("b_pk");
    let asset_id = mint_to(&mut market, &seller, 1);
    let t0 = Utc::now();

    market.start_auction(&seller, asset_id, HOUR, t0).unwrap();
    market.bid(&a, asset_id, COIN, after(t0, 1)).unwrap();
    market.bid(&b, asset_id, 2 * COIN, after(t0, 2)).unwrap();
    market
        .finalize_auction(&seller, asset_id, after(t0, HOUR))
        .unwrap();

    // B won and starts a new auction; A never withdrew.
    market
        .start_auction(&b, asset_id, HOUR, after(t0, HOUR + 10))
        .unwrap();
    assert_eq!(market.refund_balance_of(asset_id, &a), COIN);
    let refund = market.withdraw_refund(&a, asset_id).unwrap();
    assert_eq!(refund.amount, COIN);
}

// ---------------------------------------------------------------------------
// Escrow Boundaries
// ---------------------------------------------------------------------------

#[test]
fn escrowed_asset_cannot_be_listed_or_moved() {
    let mut market = market();
    let seller = account("seller_pk");
    let asset_id = mint_to(&mut market, &seller, 1);

    market
        .start_auction(&seller, asset_id, HOUR, Utc::now())
        .unwrap();

    let err = market.list(&seller, asset_id, COIN).unwrap_err();
    assert_eq!(err.kind(), FailureKind::Precondition);

    let err = market
        .transfer(asset_id, &seller, &account("bob_pk"))
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Precondition);
}

#[test]
fn journal_tells_the_auction_story_in_order() {
    let mut market = market();
    let seller = account("seller_pk");
    let a = account("a_pk");
    let b = account("b_pk");
    let asset_id = mint_to(&mut market, &seller, 1);
    let t0 = Utc::now();

    market.start_auction(&seller, asset_id, HOUR, t0).unwrap();
    market.bid(&a, asset_id, COIN, after(t0, 1)).unwrap();
    market.bid(&b, asset_id, 2 * COIN, after(t0, 2)).unwrap();
    market
        .finalize_auction(&seller, asset_id, after(t0, HOUR))
        .unwrap();
    market.withdraw_refund(&a, asset_id).unwrap();

    use relic_market::events::LedgerEvent;
    let kinds: Vec<&'static str> = market
        .events_for_asset(asset_id)
        .iter()
        .map(|e| match &e.event {
            LedgerEvent::AssetMinted { .. } => "minted",
            LedgerEvent::AuctionStarted { .. } => "started",
            LedgerEvent::BidPlaced { .. } => "bid",
            LedgerEvent::AuctionFinalized { .. } => "finalized",
            LedgerEvent::RefundWithdrawn { .. } => "refund",
            _ => "other",
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["minted", "started", "bid", "bid", "finalized", "refund"]
    );
}
