//! One side (bid or ask) of the book: a price-indexed map of [`PriceLevel`]s
//! plus best-level access.

use std::collections::BTreeMap;

use crate::order::{Price, Side, Size};
use crate::price_level::PriceLevel;

/// A read-only view of a price level, returned by `best_bid`/`best_ask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelView {
    pub price: Price,
    pub total_volume: Size,
}

/// Keyed by price, backed by a [`BTreeMap`] for O(log n) best-level access
/// and O(log n) insertion/removal by price.
#[derive(Debug, Clone, Default)]
pub struct SideBook {
    levels: BTreeMap<Price, PriceLevel>,
    side: Option<Side>,
}

impl SideBook {
    pub fn new(side: Side) -> Self {
        SideBook {
            levels: BTreeMap::new(),
            side: Some(side),
        }
    }

    /// Returns the level at `price`, creating it lazily if absent.
    pub fn level_mut(&mut self, price: Price) -> &mut PriceLevel {
        self.levels
            .entry(price)
            .or_insert_with(|| PriceLevel::new(price))
    }

    pub fn get(&self, price: Price) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    pub fn get_mut(&mut self, price: Price) -> Option<&mut PriceLevel> {
        self.levels.get_mut(&price)
    }

    /// Removes the level at `price` if it is present and empty. A no-op
    /// (not an error) if the level still holds orders or doesn't exist —
    /// callers are expected to check emptiness themselves when that
    /// distinction matters.
    pub fn prune_if_empty(&mut self, price: Price) {
        if self.levels.get(&price).is_some_and(PriceLevel::is_empty) {
            self.levels.remove(&price);
        }
    }

    /// The best level on this side: highest price for bids, lowest for asks.
    pub fn best(&self) -> Option<LevelView> {
        let (price, level) = match self.side {
            Some(Side::Bid) => self.levels.iter().next_back(),
            Some(Side::Ask) => self.levels.iter().next(),
            None => None,
        }?;
        Some(LevelView {
            price: *price,
            total_volume: level.total_volume(),
        })
    }

    /// Iterates levels best-price-first: descending for bids, ascending for asks.
    pub fn levels_best_first(&mut self) -> Box<dyn Iterator<Item = (&Price, &mut PriceLevel)> + '_> {
        match self.side {
            Some(Side::Bid) => Box::new(self.levels.iter_mut().rev()),
            Some(Side::Ask) => Box::new(self.levels.iter_mut()),
            None => Box::new(std::iter::empty()),
        }
    }

    pub fn total_volume(&self) -> Size {
        self.levels.values().map(PriceLevel::total_volume).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn levels(&self) -> impl Iterator<Item = &PriceLevel> {
        self.levels.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{Order, OrderIdGenerator};

    #[test]
    fn best_bid_is_highest_price() {
        let gen = OrderIdGenerator::new();
        let mut bids = SideBook::new(Side::Bid);
        bids.level_mut(5_000)
            .add(Order::new(gen.next(), Side::Bid, 10, 1));
        bids.level_mut(9_000)
            .add(Order::new(gen.next(), Side::Bid, 8, 1));
        assert_eq!(bids.best().unwrap().price, 9_000);
    }

    #[test]
    fn best_ask_is_lowest_price() {
        let gen = OrderIdGenerator::new();
        let mut asks = SideBook::new(Side::Ask);
        asks.level_mut(5_000)
            .add(Order::new(gen.next(), Side::Ask, 10, 1));
        asks.level_mut(9_000)
            .add(Order::new(gen.next(), Side::Ask, 8, 1));
        assert_eq!(asks.best().unwrap().price, 5_000);
    }

    #[test]
    fn empty_side_has_no_best_level() {
        let bids = SideBook::new(Side::Bid);
        assert!(bids.best().is_none());
    }

    #[test]
    fn prune_if_empty_removes_only_drained_levels() {
        let gen = OrderIdGenerator::new();
        let mut bids = SideBook::new(Side::Bid);
        let order = Order::new(gen.next(), Side::Bid, 10, 1);
        let id = order.id;
        bids.level_mut(5_000).add(order);
        bids.prune_if_empty(5_000);
        assert!(bids.get(5_000).is_some(), "non-empty level must survive");

        bids.get_mut(5_000).unwrap().remove(id).unwrap();
        bids.prune_if_empty(5_000);
        assert!(bids.get(5_000).is_none(), "drained level must be pruned");
    }
}
