//! Bid and ask side queues
//!
//! Each side of a book keeps its price levels in a BTreeMap for
//! deterministic iteration: bids serve the highest price first, asks the
//! lowest. Within a level, orders queue in placement order.

use std::collections::BTreeMap;
use types::ids::OrderId;
use types::numeric::Price;

use super::level::PriceLevel;

/// Buy-side queue: best price is the highest bid
#[derive(Debug, Clone, Default)]
pub(crate) struct BidQueue {
    levels: BTreeMap<Price, PriceLevel>,
}

impl BidQueue {
    pub(crate) fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, price: Price, seq: u64, order_id: OrderId) {
        self.levels
            .entry(price)
            .or_insert_with(PriceLevel::new)
            .insert(seq, order_id);
    }

    /// Remove an order, dropping its level when empty
    pub(crate) fn remove(&mut self, price: Price, order_id: &OrderId) -> bool {
        if let Some(level) = self.levels.get_mut(&price) {
            if level.remove(order_id) {
                if level.is_empty() {
                    self.levels.remove(&price);
                }
                return true;
            }
        }
        false
    }

    /// Best bid: highest price, earliest placement within it
    pub(crate) fn best(&self) -> Option<(Price, OrderId)> {
        // BTreeMap iterates ascending, so the best bid is the last level.
        self.levels
            .iter()
            .next_back()
            .and_then(|(price, level)| level.front().map(|id| (*price, id)))
    }

    /// Levels in display order (highest price first) with their listed ids
    pub(crate) fn levels_desc(&self) -> impl Iterator<Item = (Price, Vec<OrderId>)> + '_ {
        self.levels
            .iter()
            .rev()
            .map(|(price, level)| (*price, level.order_ids().collect()))
    }
}

/// Sell-side queue: best price is the lowest ask
#[derive(Debug, Clone, Default)]
pub(crate) struct AskQueue {
    levels: BTreeMap<Price, PriceLevel>,
}

impl AskQueue {
    pub(crate) fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, price: Price, seq: u64, order_id: OrderId) {
        self.levels
            .entry(price)
            .or_insert_with(PriceLevel::new)
            .insert(seq, order_id);
    }

    pub(crate) fn remove(&mut self, price: Price, order_id: &OrderId) -> bool {
        if let Some(level) = self.levels.get_mut(&price) {
            if level.remove(order_id) {
                if level.is_empty() {
                    self.levels.remove(&price);
                }
                return true;
            }
        }
        false
    }

    /// Best ask: lowest price, earliest placement within it
    pub(crate) fn best(&self) -> Option<(Price, OrderId)> {
        self.levels
            .iter()
            .next()
            .and_then(|(price, level)| level.front().map(|id| (*price, id)))
    }

    /// Levels in display order (lowest price first) with their listed ids
    pub(crate) fn levels_asc(&self) -> impl Iterator<Item = (Price, Vec<OrderId>)> + '_ {
        self.levels
            .iter()
            .map(|(price, level)| (*price, level.order_ids().collect()))
    }
}
