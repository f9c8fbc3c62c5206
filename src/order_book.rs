//! One book per market: two sides, a global order-id index, and an
//! append-only trade log, all guarded by a single `RwLock`.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::errors::EngineError;
use crate::order::{Order, OrderId, OrderIdGenerator, Price, Side, Size};
use crate::price_level::PriceLevel;
use crate::side_book::{LevelView, SideBook};
use crate::trade::{Match, Trade};

/// A point-in-time copy of one resting order, safe to hand to callers
/// outside the lock (the real `Order` lives only inside its `PriceLevel`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderSnapshot {
    pub id: OrderId,
    pub user_id: u64,
    pub side: Side,
    pub price: Price,
    pub size: Size,
    pub timestamp: i128,
}

impl OrderSnapshot {
    fn from_order(order: &Order, price: Price) -> Self {
        OrderSnapshot {
            id: order.id,
            user_id: order.user_id,
            side: order.side,
            price,
            size: order.size,
            timestamp: order.timestamp,
        }
    }
}

/// A full resting-order snapshot of the book, for `GET /book/{market}`.
#[derive(Debug, Clone)]
pub struct BookSnapshot {
    pub bids: Vec<OrderSnapshot>,
    pub asks: Vec<OrderSnapshot>,
    pub total_bid_volume: Size,
    pub total_ask_volume: Size,
}

/// Locator recorded in the order-id index in place of a direct `Order`
/// reference, since the order itself is owned solely by its price level's
/// queue. Re-descending from here (`side` then `price`) always lands on the
/// exact `PriceLevel` hosting the order, as long as every mutation keeps
/// the index and the levels in sync.
#[derive(Debug, Clone, Copy)]
struct OrderLocator {
    side: Side,
    price: Price,
}

struct OrderBookInner {
    bids: SideBook,
    asks: SideBook,
    orders: HashMap<OrderId, OrderLocator>,
    trades: Vec<Trade>,
    id_gen: OrderIdGenerator,
}

impl OrderBookInner {
    fn new() -> Self {
        OrderBookInner {
            bids: SideBook::new(Side::Bid),
            asks: SideBook::new(Side::Ask),
            orders: HashMap::new(),
            trades: Vec::new(),
            id_gen: OrderIdGenerator::new(),
        }
    }

    fn side_book(&self, side: Side) -> &SideBook {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    fn place_limit(&mut self, side: Side, price: Price, size: Size, user_id: u64) -> OrderId {
        let id = self.id_gen.next();
        let order = Order::new(id, side, size, user_id);
        let side_book = match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        };
        side_book.level_mut(price).add(order);
        self.orders.insert(id, OrderLocator { side, price });
        id
    }

    /// Walks the opposite side best-price-first, filling `incoming` until it
    /// is exhausted or the side runs dry. Caller has already verified enough
    /// liquidity exists, so the side is guaranteed to run dry only if
    /// `incoming` is already filled by then.
    fn place_market(&mut self, side: Side, size: Size, user_id: u64) -> (OrderId, Vec<Match>) {
        let id = self.id_gen.next();
        let mut incoming = Order::new(id, side, size, user_id);

        let mut matches = Vec::new();
        let mut filled_ids: Vec<OrderId> = Vec::new();
        let mut drained_prices: Vec<Price> = Vec::new();

        {
            let opposite = match side {
                Side::Bid => &mut self.asks,
                Side::Ask => &mut self.bids,
            };
            let mut iter = opposite.levels_best_first();
            while !incoming.is_filled() {
                let Some((&price, level)) = iter.next() else {
                    break;
                };
                let (level_matches, level_filled_ids) = level.fill_against(&mut incoming);
                matches.extend(level_matches);
                filled_ids.extend(level_filled_ids);
                if level.is_empty() {
                    drained_prices.push(price);
                }
            }
        }

        for filled_id in &filled_ids {
            self.orders.remove(filled_id);
        }

        let opposite = match side {
            Side::Bid => &mut self.asks,
            Side::Ask => &mut self.bids,
        };
        for price in drained_prices {
            opposite.prune_if_empty(price);
        }

        for m in &matches {
            self.trades.push(Trade::from_match(m, side));
        }

        (id, matches)
    }

    fn cancel(&mut self, id: OrderId) -> Result<(), EngineError> {
        let locator = self.orders.remove(&id).ok_or(EngineError::UnknownOrder(id))?;
        let side_book = match locator.side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        };
        let level = side_book.get_mut(locator.price).ok_or_else(|| {
            EngineError::InvariantViolation(format!(
                "order {id:?} indexed at price {} on {:?} but no such level exists",
                locator.price, locator.side
            ))
        })?;
        level.remove(id).map_err(|_| {
            EngineError::InvariantViolation(format!(
                "order {id:?} indexed at price {} on {:?} but absent from that level's queue",
                locator.price, locator.side
            ))
        })?;
        side_book.prune_if_empty(locator.price);
        Ok(())
    }

    fn orders_of(&self, user_id: u64) -> (Vec<OrderSnapshot>, Vec<OrderSnapshot>) {
        let collect = |side_book: &SideBook| -> Vec<OrderSnapshot> {
            side_book
                .levels()
                .flat_map(|level: &PriceLevel| {
                    let price = level.price;
                    level
                        .orders()
                        .filter(move |o| o.user_id == user_id)
                        .map(move |o| OrderSnapshot::from_order(o, price))
                })
                .collect()
        };
        (collect(&self.bids), collect(&self.asks))
    }

    fn snapshot(&self) -> BookSnapshot {
        let collect = |side_book: &SideBook| -> Vec<OrderSnapshot> {
            side_book
                .levels()
                .flat_map(|level: &PriceLevel| {
                    let price = level.price;
                    level.orders().map(move |o| OrderSnapshot::from_order(o, price))
                })
                .collect()
        };
        BookSnapshot {
            bids: collect(&self.bids),
            asks: collect(&self.asks),
            total_bid_volume: self.bids.total_volume(),
            total_ask_volume: self.asks.total_volume(),
        }
    }
}

/// One market's order book. Every public method acquires the lock for its
/// whole duration: mutators take the write guard, readers the read guard.
/// A mutation never yields, so the critical sections are always short and
/// CPU-only — a plain `std::sync::RwLock` is the right tool, not an async
/// one.
pub struct OrderBook {
    inner: RwLock<OrderBookInner>,
}

impl OrderBook {
    pub fn new() -> Self {
        OrderBook {
            inner: RwLock::new(OrderBookInner::new()),
        }
    }

    /// Rests `size` units at `price` on `side`. Never crosses the opposite
    /// side, even if a better-priced order is already resting there.
    pub fn place_limit(
        &self,
        side: Side,
        price: Price,
        size: Size,
        user_id: u64,
    ) -> Result<OrderId, EngineError> {
        if price == 0 {
            return Err(EngineError::InvalidInput("price must be positive".into()));
        }
        if size == 0 {
            return Err(EngineError::InvalidInput("size must be positive".into()));
        }
        let mut inner = self.inner.write().expect("order book lock poisoned");
        let id = inner.place_limit(side, price, size, user_id);
        info!(order_id = ?id, ?side, price, size, user_id, "limit order placed");
        Ok(id)
    }

    /// Walks the opposite side best-price-first until filled. Rejected
    /// atomically, with no state change, if the opposite side can't cover
    /// the whole size.
    pub fn place_market(
        &self,
        side: Side,
        size: Size,
        user_id: u64,
    ) -> Result<(OrderId, Vec<Match>), EngineError> {
        if size == 0 {
            return Err(EngineError::InvalidInput("size must be positive".into()));
        }
        let mut inner = self.inner.write().expect("order book lock poisoned");
        let available = inner.side_book(side.opposite()).total_volume();
        if size > available {
            warn!(?side, size, available, "market order rejected: insufficient liquidity");
            return Err(EngineError::InsufficientLiquidity {
                side,
                requested: size,
                available,
            });
        }
        let (id, matches) = inner.place_market(side, size, user_id);
        info!(order_id = ?id, ?side, size, matched = matches.len(), "market order placed");
        Ok((id, matches))
    }

    pub fn cancel(&self, id: OrderId) -> Result<(), EngineError> {
        let mut inner = self.inner.write().expect("order book lock poisoned");
        match inner.cancel(id) {
            Ok(()) => {
                info!(order_id = ?id, "order cancelled");
                Ok(())
            }
            Err(EngineError::InvariantViolation(msg)) => {
                error!(order_id = ?id, %msg, "invariant violation during cancel");
                Err(EngineError::InvariantViolation(msg))
            }
            Err(other) => Err(other),
        }
    }

    pub fn best_bid(&self) -> Result<LevelView, EngineError> {
        let inner = self.inner.read().expect("order book lock poisoned");
        inner
            .bids
            .best()
            .ok_or_else(|| EngineError::InvalidInput("no liquidity on bid side".into()))
    }

    pub fn best_ask(&self) -> Result<LevelView, EngineError> {
        let inner = self.inner.read().expect("order book lock poisoned");
        inner
            .asks
            .best()
            .ok_or_else(|| EngineError::InvalidInput("no liquidity on ask side".into()))
    }

    pub fn total_volume(&self, side: Side) -> Size {
        let inner = self.inner.read().expect("order book lock poisoned");
        inner.side_book(side).total_volume()
    }

    pub fn orders_of(&self, user_id: u64) -> (Vec<OrderSnapshot>, Vec<OrderSnapshot>) {
        let inner = self.inner.read().expect("order book lock poisoned");
        inner.orders_of(user_id)
    }

    pub fn trade_log(&self) -> Vec<Trade> {
        let inner = self.inner.read().expect("order book lock poisoned");
        inner.trades.clone()
    }

    pub fn snapshot(&self) -> BookSnapshot {
        let inner = self.inner.read().expect("order book lock poisoned");
        inner.snapshot()
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // S1 — Limit add/remove.
    #[test]
    fn s1_limit_add_remove() {
        let ob = OrderBook::new();
        let o1 = ob.place_limit(Side::Bid, 10_000, 5, 1).unwrap();
        let o2 = ob.place_limit(Side::Bid, 10_000, 8, 1).unwrap();
        let o3 = ob.place_limit(Side::Bid, 10_000, 10, 1).unwrap();
        ob.cancel(o2).unwrap();

        let snap = ob.snapshot();
        assert_eq!(snap.bids.len(), 2);
        assert_eq!(snap.bids[0].id, o1);
        assert_eq!(snap.bids[0].size, 5);
        assert_eq!(snap.bids[1].id, o3);
        assert_eq!(snap.bids[1].size, 10);
        assert_eq!(snap.total_bid_volume, 15);
    }

    // S2 — Market fills a single ask.
    #[test]
    fn s2_market_fills_single_ask() {
        let ob = OrderBook::new();
        ob.place_limit(Side::Ask, 10_000, 20, 2).unwrap();
        let (taker_id, matches) = ob.place_market(Side::Bid, 10, 3).unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].size_filled, 10);
        assert_eq!(matches[0].price, 10_000);

        assert_eq!(ob.total_volume(Side::Ask), 10);
        let trades = ob.trade_log();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, 10_000);
        assert_eq!(trades[0].size, 10);
        assert_eq!(trades[0].taker_side, Side::Bid);
        let _ = taker_id;
    }

    // S3 — Multi-level fill with pruning and price ordering.
    #[test]
    fn s3_multi_level_fill_with_pruning() {
        let ob = OrderBook::new();
        ob.place_limit(Side::Bid, 5_000, 10, 1).unwrap();
        ob.place_limit(Side::Bid, 10_000, 5, 1).unwrap();
        ob.place_limit(Side::Bid, 9_000, 8, 1).unwrap();
        ob.place_limit(Side::Bid, 5_000, 1, 1).unwrap();

        assert_eq!(ob.total_volume(Side::Bid), 24);

        let (_, matches) = ob.place_market(Side::Ask, 20, 9).unwrap();

        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].price, 10_000);
        assert_eq!(matches[0].size_filled, 5);
        assert_eq!(matches[1].price, 9_000);
        assert_eq!(matches[1].size_filled, 8);
        assert_eq!(matches[2].price, 5_000);
        assert_eq!(matches[2].size_filled, 7);

        assert_eq!(ob.total_volume(Side::Bid), 4);
        let snap = ob.snapshot();
        assert_eq!(snap.bids.iter().filter(|o| o.price == 5_000).count(), 2);
        assert!(snap.bids.iter().all(|o| o.price == 5_000));
        assert_eq!(ob.trade_log().len(), 3);
    }

    // S4 — Cancel a bid.
    #[test]
    fn s4_cancel_a_bid() {
        let ob = OrderBook::new();
        let id = ob.place_limit(Side::Bid, 10_000, 4, 22).unwrap();
        ob.cancel(id).unwrap();

        assert_eq!(ob.total_volume(Side::Bid), 0);
        assert!(ob.best_bid().is_err());
        assert!(matches!(ob.cancel(id), Err(EngineError::UnknownOrder(_))));
    }

    // S5 — Cancel an ask.
    #[test]
    fn s5_cancel_an_ask() {
        let ob = OrderBook::new();
        let id = ob.place_limit(Side::Ask, 10_000, 4, 11).unwrap();
        ob.cancel(id).unwrap();

        assert_eq!(ob.total_volume(Side::Ask), 0);
        assert!(ob.best_ask().is_err());
    }

    // S6 — Insufficient liquidity.
    #[test]
    fn s6_insufficient_liquidity() {
        let ob = OrderBook::new();
        ob.place_limit(Side::Ask, 10_000, 10, 2).unwrap();

        let err = ob.place_market(Side::Bid, 11, 3).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientLiquidity { .. }));

        assert_eq!(ob.total_volume(Side::Ask), 10);
        assert!(ob.trade_log().is_empty());
    }

    #[test]
    fn place_limit_rejects_non_positive_inputs() {
        let ob = OrderBook::new();
        assert!(matches!(
            ob.place_limit(Side::Bid, 0, 5, 1),
            Err(EngineError::InvalidInput(_))
        ));
        assert!(matches!(
            ob.place_limit(Side::Bid, 100, 0, 1),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn place_limit_never_crosses_the_book() {
        let ob = OrderBook::new();
        ob.place_limit(Side::Ask, 105, 5, 1).unwrap();
        ob.place_limit(Side::Bid, 110, 3, 2).unwrap();

        // A limit order always rests at its own price, even when it
        // crosses the best opposite price — it never triggers a fill.
        assert!(ob.trade_log().is_empty());
        assert_eq!(ob.total_volume(Side::Ask), 5);
        assert_eq!(ob.total_volume(Side::Bid), 3);
    }

    #[test]
    fn round_trip_place_then_cancel_restores_shape() {
        let ob = OrderBook::new();
        ob.place_limit(Side::Bid, 10_000, 7, 1).unwrap();
        let before = ob.snapshot();

        let id = ob.place_limit(Side::Bid, 9_000, 3, 1).unwrap();
        ob.cancel(id).unwrap();
        let after = ob.snapshot();

        assert_eq!(before.total_bid_volume, after.total_bid_volume);
        assert_eq!(before.bids.len(), after.bids.len());
    }

    #[test]
    fn orders_of_partitions_bid_and_ask() {
        let ob = OrderBook::new();
        ob.place_limit(Side::Bid, 100, 5, 7).unwrap();
        ob.place_limit(Side::Ask, 110, 3, 7).unwrap();
        ob.place_limit(Side::Bid, 100, 9, 8).unwrap();

        let (bids, asks) = ob.orders_of(7);
        assert_eq!(bids.len(), 1);
        assert_eq!(asks.len(), 1);
        assert_eq!(bids[0].size, 5);
        assert_eq!(asks[0].size, 3);
    }
}
