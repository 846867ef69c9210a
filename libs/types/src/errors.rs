//! Error types for the exchange core
//!
//! Caller-facing error taxonomy using thiserror. Every error is returned to
//! the immediate caller; the engine never retries on its own.

use crate::ids::{CurrencyCode, ItemId, LocationId, OrderId};
use crate::numeric::Quantity;
use crate::order::OrderStatus;
use rust_decimal::Decimal;
use thiserror::Error;

/// Rejections produced by the order lifecycle controller
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketError {
    /// Malformed input, rejected before any state change
    #[error("Invalid order: {reason}")]
    InvalidOrder { reason: String },

    /// Escrow admission failure on a BUY, nothing created
    #[error("Insufficient funds ({currency}): required {required}, available {available}")]
    InsufficientFunds {
        currency: CurrencyCode,
        required: Decimal,
        available: Decimal,
    },

    /// Escrow admission failure on a SELL, nothing created
    #[error(
        "Insufficient inventory of item {item} at location {location}: \
         required {required}, available {available}"
    )]
    InsufficientInventory {
        item: ItemId,
        location: LocationId,
        required: Quantity,
        available: Quantity,
    },

    /// Unknown order id
    #[error("Order not found: {order_id}")]
    NotFound { order_id: OrderId },

    /// Caller does not own the order
    #[error("Order {order_id} does not belong to the caller")]
    Forbidden { order_id: OrderId },

    /// Operation is illegal for the order's current status, e.g. a cancel
    /// that lost the race to a fill
    #[error("Order {order_id} is {status:?}; operation requires an open order")]
    InvalidState {
        order_id: OrderId,
        status: OrderStatus,
    },
}
