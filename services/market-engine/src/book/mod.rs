//! Order book repository
//!
//! Owns every order row and the per-book side indexes. Order rows live in a
//! concurrent map as individually lockable `Arc<Mutex<Order>>` and are never
//! deleted; terminal orders remain as an audit record. The side indexes are
//! hints ordered by price-time priority — the order row is authoritative,
//! and entries whose order has gone terminal are unlisted lazily by the
//! matcher or eagerly on cancel and fill.
//!
//! Index mutexes are leaf locks: no order-row lock is ever requested while
//! an index lock is held.

mod level;
mod queues;

use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use types::ids::{BookId, OrderId, OwnerId};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderStatus, Side};

use queues::{AskQueue, BidQueue};

/// Both side indexes of one book
#[derive(Debug, Default)]
struct BookSides {
    bids: BidQueue,
    asks: AskQueue,
}

/// Aggregated open quantity at one price level
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepthLevel {
    pub price: Price,
    pub quantity: Quantity,
}

/// Aggregated book snapshot: bids descending, asks ascending
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookDepth {
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
}

/// Store of order rows plus per-book priority indexes
pub struct OrderBookRepository {
    orders: DashMap<OrderId, Arc<Mutex<Order>>>,
    books: DashMap<BookId, Arc<Mutex<BookSides>>>,
    place_seq: AtomicU64,
}

impl OrderBookRepository {
    pub fn new() -> Self {
        Self {
            orders: DashMap::new(),
            books: DashMap::new(),
            place_seq: AtomicU64::new(1),
        }
    }

    /// Next placement sequence; assigned to an order before insertion and
    /// used as the sole equal-price tie-breaker
    pub fn next_seq(&self) -> u64 {
        self.place_seq.fetch_add(1, Ordering::Relaxed)
    }

    fn sides(&self, book: &BookId) -> Arc<Mutex<BookSides>> {
        self.books
            .entry(book.clone())
            .or_insert_with(|| Arc::new(Mutex::new(BookSides::default())))
            .clone()
    }

    /// Persist an open order and list it in its book index
    pub fn insert(&self, order: Order) -> Arc<Mutex<Order>> {
        debug_assert_eq!(order.status, OrderStatus::Open);
        let order_id = order.order_id;
        let book = order.book.clone();
        let side = order.side;
        let price = order.price;
        let seq = order.created_seq;

        let row = Arc::new(Mutex::new(order));
        self.orders.insert(order_id, row.clone());

        let sides = self.sides(&book);
        let mut sides = sides.lock().expect("book index lock poisoned");
        match side {
            Side::BUY => sides.bids.insert(price, seq, order_id),
            Side::SELL => sides.asks.insert(price, seq, order_id),
        }
        row
    }

    /// Look up an order row by id
    pub fn get(&self, order_id: &OrderId) -> Option<Arc<Mutex<Order>>> {
        self.orders.get(order_id).map(|row| row.clone())
    }

    /// Best listed order opposing a taker of `taker_side`
    ///
    /// BUY takers see the lowest ask, SELL takers the highest bid; equal
    /// prices serve the earliest placement. The returned entry is a hint and
    /// must be re-verified under the order-row lock.
    pub fn best_opposing(&self, book: &BookId, taker_side: Side) -> Option<(Price, OrderId)> {
        let sides = self.sides(book);
        let sides = sides.lock().expect("book index lock poisoned");
        match taker_side {
            Side::BUY => sides.asks.best(),
            Side::SELL => sides.bids.best(),
        }
    }

    /// Remove a book-index entry (terminal or stale order)
    pub fn unlist(&self, book: &BookId, side: Side, price: Price, order_id: &OrderId) {
        let sides = self.sides(book);
        let mut sides = sides.lock().expect("book index lock poisoned");
        match side {
            Side::BUY => sides.bids.remove(price, order_id),
            Side::SELL => sides.asks.remove(price, order_id),
        };
    }

    /// Snapshot of every open order belonging to `owner`
    pub fn open_orders_for(&self, owner: OwnerId) -> Vec<Order> {
        let mut open: Vec<Order> = self
            .orders
            .iter()
            .filter_map(|entry| {
                let order = entry.value().lock().expect("order row lock poisoned");
                (order.owner == owner && order.status == OrderStatus::Open)
                    .then(|| order.clone())
            })
            .collect();
        open.sort_by_key(|o| o.created_seq);
        open
    }

    /// Aggregated open quantity per price level for one book
    pub fn depth(&self, book: &BookId) -> BookDepth {
        // Snapshot the listed ids first; row locks are taken only after the
        // index lock is released.
        let (bid_levels, ask_levels) = {
            let sides = self.sides(book);
            let sides = sides.lock().expect("book index lock poisoned");
            (
                sides.bids.levels_desc().collect::<Vec<_>>(),
                sides.asks.levels_asc().collect::<Vec<_>>(),
            )
        };

        BookDepth {
            bids: self.aggregate(bid_levels),
            asks: self.aggregate(ask_levels),
        }
    }

    fn aggregate(&self, levels: Vec<(Price, Vec<OrderId>)>) -> Vec<DepthLevel> {
        levels
            .into_iter()
            .filter_map(|(price, ids)| {
                let mut total = Quantity::zero();
                for id in ids {
                    if let Some(row) = self.get(&id) {
                        let order = row.lock().expect("order row lock poisoned");
                        if order.status == OrderStatus::Open {
                            total += order.remaining();
                        }
                    }
                }
                (!total.is_zero()).then_some(DepthLevel {
                    price,
                    quantity: total,
                })
            })
            .collect()
    }
}

impl Default for OrderBookRepository {
    fn default() -> Self {
        Self::new()
    }
}
