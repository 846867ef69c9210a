//! Order lifecycle types
//!
//! An order is a standing intent to trade a quantity of one item at one
//! location, priced in one currency. It is created OPEN and only ever
//! transitions to FILLED (fully matched) or CANCELLED (owner-initiated);
//! both are terminal. Terminal orders are kept as an audit record.

use crate::ids::{BookId, OrderId, OwnerId};
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    BUY,
    /// Sell order (ask)
    SELL,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::BUY => Side::SELL,
            Side::SELL => Side::BUY,
        }
    }
}

/// Order status
///
/// OPEN is the sole initial state; FILLED and CANCELLED are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// Resting in the book, may still match or be cancelled
    Open,
    /// Completely matched (terminal)
    Filled,
    /// Cancelled by the owner, unfilled remainder refunded (terminal)
    Cancelled,
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
    }
}

/// A limit order resting in, or matching against, one book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub owner: OwnerId,
    pub book: BookId,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
    pub filled_quantity: Quantity,
    pub status: OrderStatus,
    /// Global placement sequence; sole tie-breaker for equal-price priority
    pub created_seq: u64,
    /// Unix nanos at placement (audit only; priority uses `created_seq`)
    pub created_at: i64,
}

impl Order {
    /// Create a new open order with zero fill
    pub fn new(
        owner: OwnerId,
        book: BookId,
        side: Side,
        price: Price,
        quantity: Quantity,
        created_seq: u64,
        created_at: i64,
    ) -> Self {
        Self {
            order_id: OrderId::new(),
            owner,
            book,
            side,
            price,
            quantity,
            filled_quantity: Quantity::zero(),
            status: OrderStatus::Open,
            created_seq,
            created_at,
        }
    }

    /// Unfilled quantity still resting in the book
    pub fn remaining(&self) -> Quantity {
        self.quantity - self.filled_quantity
    }

    /// Check the fill invariant: filled never exceeds quantity
    pub fn check_invariant(&self) -> bool {
        self.filled_quantity <= self.quantity
    }

    /// Check if order is completely filled
    pub fn is_filled(&self) -> bool {
        self.filled_quantity == self.quantity
    }

    /// Record a fill; transitions to FILLED in the same step when the
    /// remainder reaches zero, so an observable OPEN order always has
    /// remaining > 0.
    ///
    /// # Panics
    /// Panics if the fill would exceed the order quantity
    pub fn fill(&mut self, match_qty: Quantity) {
        let new_filled = self.filled_quantity + match_qty;
        assert!(
            new_filled <= self.quantity,
            "Fill would exceed order quantity"
        );

        self.filled_quantity = new_filled;
        if self.is_filled() {
            self.status = OrderStatus::Filled;
        }

        assert!(self.check_invariant(), "Invariant violated after fill");
    }
}
