//! Market Engine Service
//!
//! Continuous double-auction engine for site-local commodity books.
//! Orders are escrow-backed limit orders keyed by (location, item, currency);
//! crossing orders match under price-time priority and settle atomically
//! against in-memory balance and inventory rows.
//!
//! **Key Invariants:**
//! - Exactly-once settlement: every trade commits as one atomic unit
//! - Balances and inventories never go negative
//! - Trades always execute at the maker's price
//! - Equal-price makers fill in creation order
//! - Value conservation: credits issued by a trade equal escrow consumed
//!
//! **Lock order** (fixed, global): order rows by ascending `OrderId`, then
//! ledger rows by ascending `RowKey`; book indexes are leaf locks and are
//! never held while waiting on a row.

pub mod book;
pub mod controller;
pub(crate) mod escrow;
pub mod ledger;
pub mod matching;

pub use book::{BookDepth, DepthLevel, OrderBookRepository};
pub use controller::{MarketController, PlaceOutcome};
pub use ledger::{LedgerError, LedgerStore, LedgerTxn, RowKey};
pub use matching::MatchingEngine;

/// Current wall-clock time in unix nanos for audit timestamps
pub(crate) fn now_nanos() -> i64 {
    chrono::Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}
