//! Matching engine
//!
//! Price-time-priority crossing loop: given a newly placed taker order,
//! repeatedly pull the best opposing maker and settle one trade at a time
//! until the taker fills or the book stops crossing. Each trade commits on
//! its own, so row locks are held for at most one settlement and completed
//! trades stay final even if a later iteration fails.

pub mod crossing;
mod settlement;

pub use crossing::crosses;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{error, info};
use types::order::{Order, OrderStatus};
use types::trade::Trade;

use crate::book::OrderBookRepository;
use crate::ledger::LedgerStore;
use crate::now_nanos;

/// The crossing loop over one book
pub struct MatchingEngine {
    ledger: Arc<LedgerStore>,
    repo: Arc<OrderBookRepository>,
    trade_seq: AtomicU64,
}

impl MatchingEngine {
    pub fn new(ledger: Arc<LedgerStore>, repo: Arc<OrderBookRepository>) -> Self {
        Self {
            ledger,
            repo,
            trade_seq: AtomicU64::new(1),
        }
    }

    /// Match a just-placed taker against the book until it fills or no
    /// crossing maker remains; returns the trades settled in this pass
    ///
    /// The taker rests OPEN with its committed fill whenever the loop stops
    /// early (no cross, lost cancel race, settlement failure).
    pub(crate) fn run(&self, taker_row: &Arc<Mutex<Order>>) -> Vec<Trade> {
        let mut trades = Vec::new();

        loop {
            // Snapshot the taker under a brief lock; it may have been
            // cancelled between iterations.
            let (book, taker_side, taker_price, taker_id) = {
                let taker = taker_row.lock().expect("order row lock poisoned");
                if taker.status != OrderStatus::Open {
                    break;
                }
                (taker.book.clone(), taker.side, taker.price, taker.order_id)
            };

            let Some((maker_price, maker_id)) = self.repo.best_opposing(&book, taker_side)
            else {
                break;
            };
            if !crossing::crosses(taker_side, taker_price, maker_price) {
                break;
            }

            let maker_side = taker_side.opposite();
            let Some(maker_row) = self.repo.get(&maker_id) else {
                self.repo.unlist(&book, maker_side, maker_price, &maker_id);
                continue;
            };

            // Order rows lock in ascending OrderId order regardless of
            // taker/maker roles; an in-flight taker is itself listed in the
            // book, so role-based ordering could cycle.
            let (mut taker, mut maker) = if taker_id < maker_id {
                let taker = taker_row.lock().expect("order row lock poisoned");
                let maker = maker_row.lock().expect("order row lock poisoned");
                (taker, maker)
            } else {
                let maker = maker_row.lock().expect("order row lock poisoned");
                let taker = taker_row.lock().expect("order row lock poisoned");
                (taker, maker)
            };

            if taker.status != OrderStatus::Open {
                break;
            }
            if maker.status != OrderStatus::Open {
                // The hint went stale (filled or cancelled since the index
                // lookup); unlist it and retry.
                drop(maker);
                drop(taker);
                self.repo.unlist(&book, maker_side, maker_price, &maker_id);
                continue;
            }

            let sequence = self.trade_seq.fetch_add(1, Ordering::Relaxed);
            match settlement::settle_trade(
                &self.ledger,
                &mut taker,
                &mut maker,
                sequence,
                now_nanos(),
            ) {
                Ok(trade) => {
                    if maker.status == OrderStatus::Filled {
                        self.repo.unlist(&book, maker_side, maker_price, &maker_id);
                    }
                    if taker.status == OrderStatus::Filled {
                        self.repo.unlist(&book, taker_side, taker_price, &taker_id);
                    }
                    info!(
                        trade_id = %trade.trade_id,
                        book = %book,
                        price = %trade.price,
                        quantity = %trade.quantity,
                        maker = %maker_id,
                        taker = %taker_id,
                        "trade settled"
                    );
                    trades.push(trade);
                }
                Err(err) => {
                    // This trade's transaction aborted; everything settled
                    // earlier in the pass stays final.
                    error!(
                        book = %book,
                        maker = %maker_id,
                        taker = %taker_id,
                        %err,
                        "settlement aborted, taker rests open"
                    );
                    break;
                }
            }
        }

        trades
    }
}
