//! The smallest entity in the book: a residual-size claim by a user on one
//! side, timestamped for time priority.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Buy side / sell side of the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    /// The other side of the book — the side a resting order on `self` would match against.
    pub fn opposite(self) -> Side {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }
}

/// `LIMIT` rests at its price; `MARKET` walks the opposite side immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Limit,
    Market,
}

/// Unique, monotonically increasing order identifier (64-bit signed, per spec).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub i64);

/// Generates fresh, collision-free order ids for one [`OrderBook`](crate::order_book::OrderBook).
///
/// Uses a monotonic counter rather than a PRNG with a collision check —
/// simpler, and ids only need to be unique within one book's lifetime.
#[derive(Debug, Default)]
pub struct OrderIdGenerator(AtomicI64);

impl OrderIdGenerator {
    pub fn new() -> Self {
        Self(AtomicI64::new(1))
    }

    pub fn next(&self) -> OrderId {
        OrderId(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

pub(crate) fn now_nanos() -> i128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_nanos() as i128
}

pub type Price = u64;
pub type Size = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: u64,
    pub size: Size,
    pub side: Side,
    pub timestamp: i128,
    /// Price of the level currently hosting this order, if it is resting.
    ///
    /// The `Order` itself is owned solely by its
    /// [`PriceLevel`](crate::price_level::PriceLevel)'s queue, so a live
    /// pointer back to that same level would be a cycle. This field records
    /// just enough (the price) for
    /// [`OrderBook`](crate::order_book::OrderBook) to re-descend from its
    /// side book down to the exact level during cancellation.
    pub level: Option<Price>,
}

impl Order {
    /// Creates a fresh order, not yet attached to any level.
    pub fn new(id: OrderId, side: Side, size: Size, user_id: u64) -> Self {
        Order {
            id,
            user_id,
            size,
            side,
            timestamp: now_nanos(),
            level: None,
        }
    }

    pub fn is_filled(&self) -> bool {
        self.size == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_unique() {
        let gen = OrderIdGenerator::new();
        let a = gen.next();
        let b = gen.next();
        let c = gen.next();
        assert!(a.0 < b.0 && b.0 < c.0);
    }

    #[test]
    fn is_filled_reflects_residual_size() {
        let o = Order::new(OrderId(1), Side::Bid, 5, 42);
        assert!(!o.is_filled());
        let mut o = o;
        o.size = 0;
        assert!(o.is_filled());
    }

    #[test]
    fn opposite_side_round_trips() {
        assert_eq!(Side::Bid.opposite(), Side::Ask);
        assert_eq!(Side::Ask.opposite(), Side::Bid);
    }
}
