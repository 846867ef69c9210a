//! Price level with creation-order queue
//!
//! A price level holds the ids of all orders resting at one price, ordered
//! by placement sequence so time priority survives concurrent insertion.

use std::collections::VecDeque;
use types::ids::OrderId;

/// Entry in a price level queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LevelEntry {
    seq: u64,
    order_id: OrderId,
}

/// Orders resting at a single price, earliest placement first
#[derive(Debug, Clone, Default)]
pub(crate) struct PriceLevel {
    entries: VecDeque<LevelEntry>,
}

impl PriceLevel {
    pub(crate) fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Insert an order, positioned by placement sequence
    ///
    /// Insertion is almost always at the back; the walk from the back covers
    /// the rare case where two placements at the same price raced and the
    /// later sequence listed first.
    pub(crate) fn insert(&mut self, seq: u64, order_id: OrderId) {
        let mut at = self.entries.len();
        while at > 0 && self.entries[at - 1].seq > seq {
            at -= 1;
        }
        self.entries.insert(at, LevelEntry { seq, order_id });
    }

    /// Remove an order by id; returns true if it was listed
    pub(crate) fn remove(&mut self, order_id: &OrderId) -> bool {
        match self.entries.iter().position(|e| &e.order_id == order_id) {
            Some(at) => {
                self.entries.remove(at);
                true
            }
            None => false,
        }
    }

    /// Earliest-placed order at this price
    pub(crate) fn front(&self) -> Option<OrderId> {
        self.entries.front().map(|e| e.order_id)
    }

    /// Listed order ids in priority order
    pub(crate) fn order_ids(&self) -> impl Iterator<Item = OrderId> + '_ {
        self.entries.iter().map(|e| e.order_id)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut level = PriceLevel::new();
        let first = OrderId::new();
        let second = OrderId::new();
        let third = OrderId::new();

        level.insert(1, first);
        level.insert(2, second);
        level.insert(3, third);

        assert_eq!(level.front(), Some(first));
        let ids: Vec<_> = level.order_ids().collect();
        assert_eq!(ids, vec![first, second, third]);
    }

    #[test]
    fn test_out_of_order_insert_respects_sequence() {
        let mut level = PriceLevel::new();
        let early = OrderId::new();
        let late = OrderId::new();

        // Later sequence listed first; priority must still go to `early`.
        level.insert(5, late);
        level.insert(2, early);

        assert_eq!(level.front(), Some(early));
        let ids: Vec<_> = level.order_ids().collect();
        assert_eq!(ids, vec![early, late]);
    }

    #[test]
    fn test_remove() {
        let mut level = PriceLevel::new();
        let first = OrderId::new();
        let second = OrderId::new();

        level.insert(1, first);
        level.insert(2, second);

        assert!(level.remove(&first));
        assert!(!level.remove(&first));
        assert_eq!(level.front(), Some(second));
        assert_eq!(level.order_ids().count(), 1);
    }
}
