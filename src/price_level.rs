//! A FIFO queue of resting orders sharing one price, oldest first.

use std::collections::VecDeque;

use tracing::warn;

use crate::errors::PriceLevelError;
use crate::order::{Order, OrderId, Price, Size};
use crate::trade::Match;

/// One price level on one side of the book.
///
/// Invariant: `total_volume == sum(order.size for order in queue)`, and
/// `total_volume == 0 iff queue.is_empty()`.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    pub price: Price,
    queue: VecDeque<Order>,
    total_volume: Size,
}

impl PriceLevel {
    pub fn new(price: Price) -> Self {
        PriceLevel {
            price,
            queue: VecDeque::new(),
            total_volume: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn total_volume(&self) -> Size {
        self.total_volume
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Oldest-first view of the resting orders, for snapshots.
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.queue.iter()
    }

    /// Appends to the tail of the queue, preserving time priority.
    pub fn add(&mut self, mut order: Order) {
        order.level = Some(self.price);
        self.total_volume += order.size;
        self.queue.push_back(order);
    }

    /// Removes the order with `id` from the queue, wherever it sits.
    ///
    /// Position within the queue doesn't matter for correctness, but the
    /// remaining orders must stay sorted by timestamp ascending — since the
    /// queue is a `VecDeque` and we remove in place, that ordering is
    /// preserved automatically.
    pub fn remove(&mut self, id: OrderId) -> Result<Order, PriceLevelError> {
        let pos = self
            .queue
            .iter()
            .position(|o| o.id == id)
            .ok_or(PriceLevelError::NotPresent(id))?;
        let mut order = self
            .queue
            .remove(pos)
            .expect("position was just located in this queue");
        self.total_volume -= order.size;
        order.level = None;
        Ok(order)
    }

    /// Matches `incoming` against the head of the queue, oldest order first,
    /// until either `incoming` is exhausted or the queue empties.
    ///
    /// Returns the matches produced, in order, plus the ids of any resting
    /// orders that were fully consumed — the caller (`OrderBook`) is
    /// responsible for evicting those ids from its own order index, so that
    /// `PriceLevel` never needs to know about `OrderBook`.
    pub fn fill_against(&mut self, incoming: &mut Order) -> (Vec<Match>, Vec<OrderId>) {
        let mut matches = Vec::new();
        let mut filled_ids = Vec::new();

        while incoming.size > 0 {
            let Some(resting) = self.queue.front_mut() else {
                break;
            };

            let size_filled = incoming.size.min(resting.size);
            resting.size -= size_filled;
            incoming.size -= size_filled;
            self.total_volume -= size_filled;

            let (bid_order_id, bid_user_id, ask_order_id, ask_user_id) = match incoming.side {
                crate::order::Side::Bid => {
                    (incoming.id, incoming.user_id, resting.id, resting.user_id)
                }
                crate::order::Side::Ask => {
                    (resting.id, resting.user_id, incoming.id, incoming.user_id)
                }
            };

            matches.push(Match {
                bid_order_id,
                bid_user_id,
                ask_order_id,
                ask_user_id,
                price: self.price,
                size_filled,
            });

            if resting.is_filled() {
                let id = resting.id;
                warn!(order_id = ?id, price = self.price, "resting order fully filled, evicting");
                self.queue.pop_front();
                filled_ids.push(id);
            }
        }

        (matches, filled_ids)
    }
}
