use serde::{Deserialize, Serialize};

use crate::order::{OrderId, Price, Side, Size, now_nanos};

/// The transient product of one fill inside a [`PriceLevel`](crate::price_level::PriceLevel).
///
/// Not persisted inside the book — only [`Trade`] is. Returned to the
/// caller of `place_market` so settlement can read maker/taker identities
/// without further book queries. Carries order/user ids rather than
/// references: the resting order may keep mutating (or be evicted) after
/// the match that touched it, so a reference couldn't safely outlive the
/// call under single ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub bid_order_id: OrderId,
    pub bid_user_id: u64,
    pub ask_order_id: OrderId,
    pub ask_user_id: u64,
    pub size_filled: Size,
    pub price: Price,
}

/// A persisted record of one [`Match`] in the order book's append-only trade log.
///
/// - `price` is the maker's (resting order's) price.
/// - `size` is the quantity filled.
/// - `taker_side` is the side of the order that crossed the book and caused the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub price: Price,
    pub size: Size,
    pub timestamp: i128,
    pub taker_side: Side,
}

impl Trade {
    pub fn from_match(m: &Match, taker_side: Side) -> Self {
        Trade {
            price: m.price,
            size: m.size_filled,
            timestamp: now_nanos(),
            taker_side,
        }
    }
}
