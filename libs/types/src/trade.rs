//! Settled trade records
//!
//! A `Trade` is emitted by the matching engine only after its settlement
//! transaction has committed, so every observable trade is final. Trades are
//! not persisted by the engine; callers wanting history keep their own.

use crate::ids::{BookId, OrderId, OwnerId, TradeId};
use crate::numeric::{Price, Quantity};
use crate::order::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One atomic exchange between a maker and a taker order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    /// Global monotonic sequence
    pub sequence: u64,
    pub book: BookId,

    // Order references
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,

    // Counterparties, independent of maker/taker roles
    pub buyer: OwnerId,
    pub seller: OwnerId,

    /// Taker side (the aggressor's side)
    pub taker_side: Side,
    /// Execution price — always the maker's limit price
    pub price: Price,
    pub quantity: Quantity,

    /// Overpayment returned to a BUY taker that escrowed above the
    /// execution price (zero otherwise)
    pub buyer_refund: Decimal,

    /// Unix nanos at settlement commit
    pub executed_at: i64,
}

impl Trade {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sequence: u64,
        book: BookId,
        maker_order_id: OrderId,
        taker_order_id: OrderId,
        buyer: OwnerId,
        seller: OwnerId,
        taker_side: Side,
        price: Price,
        quantity: Quantity,
        buyer_refund: Decimal,
        executed_at: i64,
    ) -> Self {
        Self {
            trade_id: TradeId::new(),
            sequence,
            book,
            maker_order_id,
            taker_order_id,
            buyer,
            seller,
            taker_side,
            price,
            quantity,
            buyer_refund,
            executed_at,
        }
    }

    /// Trade value (price × quantity), the amount credited to the seller
    pub fn trade_value(&self) -> Decimal {
        self.price.notional(self.quantity)
    }
}
