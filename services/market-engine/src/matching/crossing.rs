//! Crossing detection
//!
//! A trade is possible when the limit prices of a buy and a sell overlap.

use types::numeric::Price;
use types::order::Side;

/// Check whether a taker crosses a resting maker
///
/// A BUY taker crosses a SELL maker priced at or below its limit; a SELL
/// taker crosses a BUY maker priced at or above its limit.
pub fn crosses(taker_side: Side, taker_price: Price, maker_price: Price) -> bool {
    match taker_side {
        Side::BUY => maker_price <= taker_price,
        Side::SELL => maker_price >= taker_price,
    }
}
