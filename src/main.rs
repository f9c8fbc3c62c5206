use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use order_book_engine::cli::{Cli, Command};
use order_book_engine::market::Market;
use order_book_engine::state::AppState;
use order_book_engine::utils::shutdown_token;
use order_book_engine::{api, cli};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match Cli::parse().command {
        Command::Serve { port, markets } => {
            let markets = if markets.is_empty() {
                vec![Market::new("default")]
            } else {
                markets.into_iter().map(Market::new).collect()
            };
            tracing::info!(?markets, port, "starting order book engine");

            let state = AppState::new(markets);
            let app = api::router(state);
            let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
            let token = shutdown_token();
            tracing::info!("HTTP server listening on 0.0.0.0:{port}");
            axum::serve(listener, app)
                .with_graceful_shutdown(token.cancelled_owned())
                .await?;
        }
        Command::Local { command } => cli::run_local(command),
    }

    Ok(())
}
