use thiserror::Error;

use crate::order::{OrderId, Side};

/// Errors surfaced by a [`PriceLevel`](crate::price_level::PriceLevel).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceLevelError {
    #[error("order {0:?} not present in price level")]
    NotPresent(OrderId),
}

/// Errors surfaced by the public [`OrderBook`](crate::order_book::OrderBook) operations.
///
/// `InvariantViolation` is fatal: it indicates a programming error inside
/// the core, not a bad request. The core never panics on it directly; the
/// embedder (the HTTP facade, here) escalates it to a `500` and logs it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(
        "insufficient liquidity on {side:?} side: requested {requested}, available {available}"
    )]
    InsufficientLiquidity {
        side: Side,
        requested: u64,
        available: u64,
    },

    #[error("unknown order {0:?}")]
    UnknownOrder(OrderId),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}
