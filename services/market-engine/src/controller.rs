//! Order lifecycle controller
//!
//! The only public entry points into the engine. `place` sequences
//! validation, escrow, persistence, and matching; `cancel` enforces the
//! OPEN → CANCELLED transition and refunds the unfilled remainder. The
//! state machine is OPEN —match(partial)→ OPEN, OPEN —match(complete)→
//! FILLED, OPEN —cancel→ CANCELLED; FILLED and CANCELLED are terminal.

use std::sync::Arc;
use tracing::{info, warn};
use types::errors::MarketError;
use types::ids::{BookId, OrderId, OwnerId};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderStatus, Side};
use types::trade::Trade;

use crate::book::{BookDepth, OrderBookRepository};
use crate::escrow;
use crate::ledger::LedgerStore;
use crate::matching::MatchingEngine;
use crate::now_nanos;

/// Result of a placement: the order's final state for this request plus the
/// trades settled during the matching pass
#[derive(Debug, Clone)]
pub struct PlaceOutcome {
    pub order: Order,
    pub trades: Vec<Trade>,
}

/// Public facade over ledger, book, and matching engine
pub struct MarketController {
    ledger: Arc<LedgerStore>,
    repo: Arc<OrderBookRepository>,
    engine: MatchingEngine,
}

impl MarketController {
    pub fn new() -> Self {
        let ledger = Arc::new(LedgerStore::new());
        let repo = Arc::new(OrderBookRepository::new());
        let engine = MatchingEngine::new(ledger.clone(), repo.clone());
        Self {
            ledger,
            repo,
            engine,
        }
    }

    /// The ledger store, for deposits/grants by the surrounding game systems
    pub fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    /// Place a limit order
    ///
    /// Validates input, locks escrow (rejecting with the specific
    /// insufficiency and creating nothing on failure), persists the order
    /// OPEN, then runs the matching pass. Returns the order's final state —
    /// FILLED, or OPEN with whatever fill was committed.
    pub fn place(
        &self,
        owner: OwnerId,
        book: BookId,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> Result<PlaceOutcome, MarketError> {
        if price.is_zero() {
            return Err(MarketError::InvalidOrder {
                reason: "price must be positive".to_string(),
            });
        }
        if quantity.is_zero() {
            return Err(MarketError::InvalidOrder {
                reason: "quantity must be positive".to_string(),
            });
        }

        let order = Order::new(
            owner,
            book,
            side,
            price,
            quantity,
            self.repo.next_seq(),
            now_nanos(),
        );

        if let Err(err) = escrow::hold(&self.ledger, &order) {
            warn!(owner = %owner, book = %order.book, %err, "order rejected");
            return Err(err);
        }

        info!(
            order_id = %order.order_id,
            owner = %owner,
            book = %order.book,
            side = ?side,
            price = %price,
            quantity = %quantity,
            "order placed"
        );

        let row = self.repo.insert(order);
        let trades = self.engine.run(&row);
        let order = row.lock().expect("order row lock poisoned").clone();
        Ok(PlaceOutcome { order, trades })
    }

    /// Cancel an open order, refunding its unfilled remainder
    ///
    /// A cancel that loses the race to a fill observes the terminal status
    /// under the row lock and fails with `InvalidState` — never a silent
    /// no-op against stale data.
    pub fn cancel(&self, owner: OwnerId, order_id: OrderId) -> Result<Order, MarketError> {
        let row = self
            .repo
            .get(&order_id)
            .ok_or(MarketError::NotFound { order_id })?;

        let mut order = row.lock().expect("order row lock poisoned");
        if order.owner != owner {
            return Err(MarketError::Forbidden { order_id });
        }
        if order.status != OrderStatus::Open {
            return Err(MarketError::InvalidState {
                order_id,
                status: order.status,
            });
        }

        let mut txn = self.ledger.begin();
        escrow::refund_remainder(&mut txn, &order);
        // Credit-only transaction; commit cannot be rejected.
        txn.commit().expect("refund transaction is credit-only");

        order.status = OrderStatus::Cancelled;
        self.repo
            .unlist(&order.book, order.side, order.price, &order_id);

        info!(
            order_id = %order_id,
            owner = %owner,
            remaining = %order.remaining(),
            "order cancelled"
        );
        Ok(order.clone())
    }

    /// Snapshot of the caller's open orders, oldest first
    pub fn list_open_orders(&self, owner: OwnerId) -> Vec<Order> {
        self.repo.open_orders_for(owner)
    }

    /// Aggregated open quantity per price level: bids descending, asks
    /// ascending
    pub fn get_book(&self, book: &BookId) -> BookDepth {
        self.repo.depth(book)
    }
}

impl Default for MarketController {
    fn default() -> Self {
        Self::new()
    }
}
