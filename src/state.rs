use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::market::Market;
use crate::order_book::OrderBook;

/// Shared application state: one [`OrderBook`] per registered market.
///
/// Markets are fixed at startup (via [`AppState::new`]'s `markets` argument)
/// rather than created on first use — a request naming an unregistered
/// market is rejected rather than silently opening a new, empty book.
#[derive(Clone)]
pub struct AppState {
    books: Arc<RwLock<HashMap<Market, Arc<OrderBook>>>>,
}

impl AppState {
    pub fn new(markets: impl IntoIterator<Item = Market>) -> Self {
        let books = markets
            .into_iter()
            .map(|m| (m, Arc::new(OrderBook::new())))
            .collect();
        AppState {
            books: Arc::new(RwLock::new(books)),
        }
    }

    pub async fn book(&self, market: &Market) -> Option<Arc<OrderBook>> {
        self.books.read().await.get(market).cloned()
    }

    pub async fn markets(&self) -> Vec<Market> {
        self.books.read().await.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unregistered_market_has_no_book() {
        let state = AppState::new([Market::new("BTC-USD")]);
        assert!(state.book(&Market::new("BTC-USD")).await.is_some());
        assert!(state.book(&Market::new("ETH-USD")).await.is_none());
    }
}
