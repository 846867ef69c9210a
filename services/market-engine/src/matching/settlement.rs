//! Trade settlement
//!
//! Settles one matched pair: moves funds to the seller, goods to the buyer,
//! refunds a BUY taker's overpayment, and records the fills — all while the
//! caller holds both order-row locks, so the trade is one atomic unit.

use rust_decimal::Decimal;
use types::numeric::Quantity;
use types::order::{Order, Side};
use types::trade::Trade;

use crate::ledger::{LedgerError, LedgerStore, RowKey};

/// Settle one trade between a locked taker and a locked maker
///
/// `match_qty = min(taker.remaining, maker.remaining)`, executed at the
/// maker's price — price priority always favors the resting order. The
/// ledger transaction commits before the fills are recorded; it is
/// credit-only, so with both order rows locked it cannot be rejected.
pub(crate) fn settle_trade(
    ledger: &LedgerStore,
    taker: &mut Order,
    maker: &mut Order,
    sequence: u64,
    executed_at: i64,
) -> Result<Trade, LedgerError> {
    debug_assert_eq!(taker.book, maker.book);
    debug_assert_eq!(taker.side, maker.side.opposite());

    let match_qty = taker.remaining().min(maker.remaining());
    debug_assert!(!match_qty.is_zero());
    let exec_price = maker.price;
    let book = taker.book.clone();

    let (buyer, seller) = match taker.side {
        Side::BUY => (taker.owner, maker.owner),
        Side::SELL => (maker.owner, taker.owner),
    };

    let mut txn = ledger.begin();

    // Seller receives funds at the execution price.
    txn.credit(
        RowKey::Balance {
            owner: seller,
            currency: book.currency.clone(),
        },
        exec_price.notional(match_qty),
    );

    // Buyer receives goods at the book's location.
    txn.credit(
        RowKey::Inventory {
            owner: buyer,
            location: book.location,
            item: book.item,
        },
        match_qty.as_decimal(),
    );

    // A BUY taker escrowed at its own limit; return the spread above the
    // (better) execution price.
    let buyer_refund = if taker.side == Side::BUY && taker.price > exec_price {
        (taker.price.as_decimal() - exec_price.as_decimal()) * match_qty.as_decimal()
    } else {
        Decimal::ZERO
    };
    if buyer_refund > Decimal::ZERO {
        txn.credit(
            RowKey::Balance {
                owner: taker.owner,
                currency: book.currency.clone(),
            },
            buyer_refund,
        );
    }

    txn.commit()?;

    taker.fill(match_qty);
    maker.fill(match_qty);

    Ok(Trade::new(
        sequence,
        book.clone(),
        maker.order_id,
        taker.order_id,
        buyer,
        seller,
        taker.side,
        exec_price,
        match_qty,
        buyer_refund,
        executed_at,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::{BookId, CurrencyCode, ItemId, LocationId, OwnerId};
    use types::numeric::Price;
    use types::order::OrderStatus;

    fn test_book() -> BookId {
        BookId::new(LocationId::new(1), ItemId::new(2), CurrencyCode::new("CRED"))
    }

    fn order(owner: OwnerId, side: Side, price: u64, qty: u64, seq: u64) -> Order {
        Order::new(
            owner,
            test_book(),
            side,
            Price::from_u64(price),
            Quantity::new(qty),
            seq,
            0,
        )
    }

    #[test]
    fn test_settles_at_maker_price_with_taker_refund() {
        let ledger = LedgerStore::new();
        let buyer = OwnerId::new();
        let seller = OwnerId::new();

        // Maker sells at 50; taker buys at 60 and escrowed 5 × 60 upstream.
        let mut maker = order(seller, Side::SELL, 50, 5, 1);
        let mut taker = order(buyer, Side::BUY, 60, 5, 2);

        let trade = settle_trade(&ledger, &mut taker, &mut maker, 1, 0).unwrap();

        assert_eq!(trade.price, Price::from_u64(50));
        assert_eq!(trade.quantity, Quantity::new(5));
        assert_eq!(trade.buyer, buyer);
        assert_eq!(trade.seller, seller);
        assert_eq!(trade.buyer_refund, Decimal::from(50));
        assert_eq!(trade.trade_value(), Decimal::from(250));

        assert_eq!(
            ledger.balance(seller, CurrencyCode::new("CRED")),
            Decimal::from(250)
        );
        assert_eq!(
            ledger.balance(buyer, CurrencyCode::new("CRED")),
            Decimal::from(50)
        );
        assert_eq!(
            ledger.stock(buyer, LocationId::new(1), ItemId::new(2)),
            Quantity::new(5)
        );

        assert_eq!(taker.status, OrderStatus::Filled);
        assert_eq!(maker.status, OrderStatus::Filled);
    }

    #[test]
    fn test_sell_taker_gets_maker_bid_price_no_refund() {
        let ledger = LedgerStore::new();
        let buyer = OwnerId::new();
        let seller = OwnerId::new();

        // Resting bid at 55; seller takes at 50 — executes at 55, and the
        // maker-buyer escrowed at 55, so no refund is due anyone.
        let mut maker = order(buyer, Side::BUY, 55, 10, 1);
        let mut taker = order(seller, Side::SELL, 50, 4, 2);

        let trade = settle_trade(&ledger, &mut taker, &mut maker, 1, 0).unwrap();

        assert_eq!(trade.price, Price::from_u64(55));
        assert_eq!(trade.buyer_refund, Decimal::ZERO);
        assert_eq!(
            ledger.balance(seller, CurrencyCode::new("CRED")),
            Decimal::from(220)
        );

        // Partial maker fill stays open.
        assert_eq!(maker.status, OrderStatus::Open);
        assert_eq!(maker.remaining(), Quantity::new(6));
        assert_eq!(taker.status, OrderStatus::Filled);
    }

    #[test]
    fn test_value_conservation_per_trade() {
        let ledger = LedgerStore::new();
        let buyer = OwnerId::new();
        let seller = OwnerId::new();

        let mut maker = order(seller, Side::SELL, 50, 5, 1);
        let mut taker = order(buyer, Side::BUY, 60, 5, 2);
        let trade = settle_trade(&ledger, &mut taker, &mut maker, 1, 0).unwrap();

        // Credits issued equal the escrow the taker consumed for this slice:
        // 5 × 60 escrowed = 5 × 50 to seller + 50 refund.
        let escrow_consumed = taker.price.notional(trade.quantity);
        assert_eq!(trade.trade_value() + trade.buyer_refund, escrow_consumed);
    }

    #[test]
    fn test_self_trade_settles_cleanly() {
        let ledger = LedgerStore::new();
        let owner = OwnerId::new();

        let mut maker = order(owner, Side::SELL, 50, 5, 1);
        let mut taker = order(owner, Side::BUY, 50, 5, 2);
        let trade = settle_trade(&ledger, &mut taker, &mut maker, 1, 0).unwrap();

        assert_eq!(trade.buyer, trade.seller);
        // Seller credit lands on the owner's own balance row.
        assert_eq!(
            ledger.balance(owner, CurrencyCode::new("CRED")),
            Decimal::from(250)
        );
        assert_eq!(
            ledger.stock(owner, LocationId::new(1), ItemId::new(2)),
            Quantity::new(5)
        );
    }
}
