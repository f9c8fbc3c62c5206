use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, warn};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{FromRequest, Path, Request, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};

use crate::{
    errors::EngineError,
    market::Market,
    order::{OrderId, OrderType, Side},
    order_book::{BookSnapshot, OrderSnapshot},
    state::AppState,
    trade::{Match, Trade},
};

type ApiErr = (StatusCode, Json<serde_json::Value>);

fn err(status: StatusCode, msg: impl Into<String>) -> ApiErr {
    (status, Json(json!({ "error": msg.into() })))
}

fn engine_err(e: EngineError) -> ApiErr {
    match &e {
        EngineError::InvalidInput(_) | EngineError::InsufficientLiquidity { .. } => {
            err(StatusCode::BAD_REQUEST, e.to_string())
        }
        EngineError::UnknownOrder(_) => err(StatusCode::NOT_FOUND, e.to_string()),
        EngineError::InvariantViolation(msg) => {
            tracing::error!(%msg, "invariant violation surfaced to the facade");
            err(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn unknown_market(market: &Market) -> ApiErr {
    err(StatusCode::NOT_FOUND, format!("unknown market `{market}`"))
}

/// Wraps `Json` extraction with a log line on rejection, the way the core's
/// HTTP facade logs every malformed request before answering it.
pub struct LoggedJson<T>(pub T);

impl<S, T> FromRequest<S> for LoggedJson<T>
where
    S: Send + Sync,
    T: serde::de::DeserializeOwned,
{
    type Rejection = ApiErr;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let method = req.method().clone();
        let uri = req.uri().clone();
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| err(StatusCode::BAD_REQUEST, e.to_string()))?;

        match serde_json::from_slice::<T>(&bytes) {
            Ok(val) => Ok(LoggedJson(val)),
            Err(e) => {
                let preview = String::from_utf8_lossy(&bytes);
                let preview = &preview[..preview.len().min(4096)];
                warn!(error = %e, %method, %uri, body_preview = %preview, "order rejected: malformed JSON body");
                Err(err(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
            }
        }
    }
}

/// `POST /order` request body.
#[derive(Debug, Deserialize)]
pub struct NewOrder {
    pub user_id: u64,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub bid: bool,
    pub size: u64,
    pub price: Option<u64>,
    pub market: String,
}

impl NewOrder {
    fn side(&self) -> Side {
        if self.bid { Side::Bid } else { Side::Ask }
    }
}

/// `POST /order` response body.
#[derive(Debug, Serialize)]
pub struct OrderAck {
    pub order_id: i64,
    pub matches: Vec<Match>,
}

#[derive(Debug, Serialize)]
pub struct LevelResponse {
    pub price: u64,
    pub total_volume: u64,
}

#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub market: String,
    pub bids: Vec<OrderSnapshot>,
    pub asks: Vec<OrderSnapshot>,
    pub total_bid_volume: u64,
    pub total_ask_volume: u64,
}

impl BookResponse {
    fn from_snapshot(market: &Market, snapshot: BookSnapshot) -> Self {
        BookResponse {
            market: market.to_string(),
            bids: snapshot.bids,
            asks: snapshot.asks,
            total_bid_volume: snapshot.total_bid_volume,
            total_ask_volume: snapshot.total_ask_volume,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrdersResponse {
    pub bids: Vec<OrderSnapshot>,
    pub asks: Vec<OrderSnapshot>,
}

/// `POST /order` — place a limit or market order.
pub async fn create_order(
    State(state): State<AppState>,
    LoggedJson(payload): LoggedJson<NewOrder>,
) -> Result<Json<OrderAck>, ApiErr> {
    let market = Market::new(&payload.market);
    let Some(book) = state.book(&market).await else {
        warn!(%market, "order rejected: unknown market");
        return Err(unknown_market(&market).await);
    };

    let side = payload.side();
    let (order_id, matches) = match payload.order_type {
        OrderType::Limit => {
            let Some(price) = payload.price else {
                return Err(err(StatusCode::BAD_REQUEST, "price is required for limit orders"));
            };
            let id = book
                .place_limit(side, price, payload.size, payload.user_id)
                .map_err(engine_err)?;
            (id, Vec::new())
        }
        OrderType::Market => book
            .place_market(side, payload.size, payload.user_id)
            .map_err(engine_err)?,
    };

    info!(?order_id, %market, ?side, "order accepted");
    Ok(Json(OrderAck {
        order_id: order_id.0,
        matches,
    }))
}

/// `DELETE /order/{id}` — cancel a resting order.
///
/// The id alone doesn't name a market, so every registered book is asked in
/// turn; cancellation is O(1) inside a book that doesn't have the order.
pub async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiErr> {
    let order_id = OrderId(id);
    for market in state.markets().await {
        let Some(book) = state.book(&market).await else {
            continue;
        };
        match book.cancel(order_id) {
            Ok(()) => return Ok((StatusCode::OK, Json(json!({ "status": "cancelled" })))),
            Err(EngineError::UnknownOrder(_)) => continue,
            Err(e) => return Err(engine_err(e)),
        }
    }
    Err(err(StatusCode::NOT_FOUND, "order not found"))
}

/// `GET /book/{market}` — full resting-order snapshot.
pub async fn get_book(
    State(state): State<AppState>,
    Path(market): Path<String>,
) -> Result<Json<BookResponse>, ApiErr> {
    let market = Market::new(market);
    let book = state.book(&market).await.ok_or_else(|| {
        (StatusCode::NOT_FOUND, Json(json!({ "error": format!("unknown market `{market}`") })))
    })?;
    Ok(Json(BookResponse::from_snapshot(&market, book.snapshot())))
}

/// `GET /book/{market}/ask` — best ask level.
pub async fn get_best_ask(
    State(state): State<AppState>,
    Path(market): Path<String>,
) -> Result<Json<LevelResponse>, ApiErr> {
    let market = Market::new(market);
    let book = state.book(&market).await.ok_or_else(|| {
        (StatusCode::NOT_FOUND, Json(json!({ "error": format!("unknown market `{market}`") })))
    })?;
    let level = book.best_ask().map_err(engine_err)?;
    Ok(Json(LevelResponse {
        price: level.price,
        total_volume: level.total_volume,
    }))
}

/// `GET /book/{market}/bid` — best bid level.
pub async fn get_best_bid(
    State(state): State<AppState>,
    Path(market): Path<String>,
) -> Result<Json<LevelResponse>, ApiErr> {
    let market = Market::new(market);
    let book = state.book(&market).await.ok_or_else(|| {
        (StatusCode::NOT_FOUND, Json(json!({ "error": format!("unknown market `{market}`") })))
    })?;
    let level = book.best_bid().map_err(engine_err)?;
    Ok(Json(LevelResponse {
        price: level.price,
        total_volume: level.total_volume,
    }))
}

/// `GET /orders/{user_id}` — that user's resting orders across every market.
pub async fn get_orders(
    State(state): State<AppState>,
    Path(user_id): Path<u64>,
) -> Json<OrdersResponse> {
    let mut bids = Vec::new();
    let mut asks = Vec::new();
    for market in state.markets().await {
        if let Some(book) = state.book(&market).await {
            let (mut b, mut a) = book.orders_of(user_id);
            bids.append(&mut b);
            asks.append(&mut a);
        }
    }
    Json(OrdersResponse { bids, asks })
}

/// `GET /trades/{market}` — the append-only trade log.
pub async fn get_trades(
    State(state): State<AppState>,
    Path(market): Path<String>,
) -> Result<Json<Vec<Trade>>, ApiErr> {
    let market = Market::new(market);
    let book = state.book(&market).await.ok_or_else(|| {
        (StatusCode::NOT_FOUND, Json(json!({ "error": format!("unknown market `{market}`") })))
    })?;
    Ok(Json(book.trade_log()))
}

/// Constructs the application's `Router` with all routes and shared state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/order", post(create_order))
        .route("/order/{id}", delete(cancel_order))
        .route("/book/{market}", get(get_book))
        .route("/book/{market}/ask", get(get_best_ask))
        .route("/book/{market}/bid", get(get_best_bid))
        .route("/orders/{user_id}", get(get_orders))
        .route("/trades/{market}", get(get_trades))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .include_headers(false)
                        .level(tracing::Level::TRACE),
                )
                .on_response(DefaultOnResponse::new().level(tracing::Level::TRACE)),
        )
        .with_state(state)
}
