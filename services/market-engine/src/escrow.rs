//! Escrow manager
//!
//! Converts order-side semantics into ledger deltas. Placement locks the
//! full obligation up front: a BUY holds `price × quantity` of the order
//! currency, a SELL holds `quantity` units of the item at the order
//! location. Cancellation refunds only the unfilled remainder — the filled
//! portion was already consumed by settlement transfers at match time.

use rust_decimal::Decimal;
use tracing::debug;
use types::errors::MarketError;
use types::numeric::Quantity;
use types::order::{Order, Side};

use crate::ledger::{integral_quantity, LedgerError, LedgerStore, LedgerTxn, RowKey};

/// Ledger row backing an order's escrow
fn escrow_row(order: &Order) -> RowKey {
    match order.side {
        Side::BUY => RowKey::Balance {
            owner: order.owner,
            currency: order.book.currency.clone(),
        },
        Side::SELL => RowKey::Inventory {
            owner: order.owner,
            location: order.book.location,
            item: order.book.item,
        },
    }
}

/// Escrow value of `quantity` units of the order
fn escrow_amount(order: &Order, quantity: Quantity) -> Decimal {
    match order.side {
        Side::BUY => order.price.notional(quantity),
        Side::SELL => quantity.as_decimal(),
    }
}

/// Lock the resources a new order requires, all-or-nothing
///
/// On failure nothing is deducted and the specific insufficiency is
/// returned; the caller must not persist the order.
pub(crate) fn hold(ledger: &LedgerStore, order: &Order) -> Result<(), MarketError> {
    let mut txn = ledger.begin();
    txn.debit(escrow_row(order), escrow_amount(order, order.quantity));
    txn.commit().map_err(|err| insufficiency(order, err))?;

    debug!(
        order_id = %order.order_id,
        side = ?order.side,
        book = %order.book,
        "escrow held"
    );
    Ok(())
}

/// Stage the refund of an order's unfilled remainder
///
/// `remaining × price` back to the balance for a BUY, `remaining` units back
/// to the inventory for a SELL. Never refunds the filled portion.
pub(crate) fn refund_remainder(txn: &mut LedgerTxn<'_>, order: &Order) {
    let remaining = order.remaining();
    if remaining.is_zero() {
        return;
    }
    txn.credit(escrow_row(order), escrow_amount(order, remaining));
    debug!(
        order_id = %order.order_id,
        remaining = %remaining,
        "escrow remainder refunded"
    );
}

/// Map a ledger admission failure to the order's specific insufficiency
fn insufficiency(order: &Order, err: LedgerError) -> MarketError {
    let LedgerError::InsufficientResource {
        required, available, ..
    } = err;
    match order.side {
        Side::BUY => MarketError::InsufficientFunds {
            currency: order.book.currency.clone(),
            required,
            available,
        },
        Side::SELL => MarketError::InsufficientInventory {
            item: order.book.item,
            location: order.book.location,
            required: integral_quantity(required),
            available: integral_quantity(available),
        },
    }
}
