//! `serve` boots the HTTP facade; `local` drives one in-process book
//! directly, for quick manual testing without a server.

use clap::{Parser, Subcommand, builder::PossibleValuesParser};

use crate::order::{OrderType, Side};
use crate::order_book::OrderBook;

#[derive(Parser)]
#[command(name = "order-book-engine")]
#[command(version, about = "A continuous double-auction limit order book")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Boot the HTTP facade, one order book per `--market`.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
        /// May be given more than once; defaults to a single `default` market.
        #[arg(long = "market")]
        markets: Vec<String>,
    },
    /// Drive a single in-process order book, no network.
    Local {
        #[command(subcommand)]
        command: LocalCommand,
    },
}

#[derive(Subcommand)]
pub enum LocalCommand {
    /// Place a limit order.
    Add {
        #[arg(value_parser = PossibleValuesParser::new(["bid", "ask"]))]
        side: String,
        price: u64,
        size: u64,
        #[arg(default_value_t = 1)]
        user_id: u64,
    },
    /// Place a market order.
    Match {
        #[arg(value_parser = PossibleValuesParser::new(["bid", "ask"]))]
        side: String,
        size: u64,
        #[arg(default_value_t = 1)]
        user_id: u64,
    },
    /// Print the current book.
    Book,
}

fn parse_side(s: &str) -> Side {
    match s {
        "bid" => Side::Bid,
        "ask" => Side::Ask,
        _ => unreachable!("clap validated this against [\"bid\", \"ask\"]"),
    }
}

fn print_book(order_book: &OrderBook) {
    let snapshot = order_book.snapshot();
    println!("------ Order Book ------");
    println!("Bids (highest first):");
    let mut bids: Vec<_> = snapshot.bids.iter().collect();
    bids.sort_by(|a, b| b.price.cmp(&a.price));
    for o in bids {
        println!("  price={} size={} order_id={:?}", o.price, o.size, o.id);
    }
    println!("Asks (lowest first):");
    let mut asks: Vec<_> = snapshot.asks.iter().collect();
    asks.sort_by_key(|o| o.price);
    for o in asks {
        println!("  price={} size={} order_id={:?}", o.price, o.size, o.id);
    }
    println!(
        "total_bid_volume={} total_ask_volume={}",
        snapshot.total_bid_volume, snapshot.total_ask_volume
    );
    println!("--------------------------");
}

/// Runs a single `local` subcommand against a fresh, transient book.
pub fn run_local(command: LocalCommand) {
    let order_book = OrderBook::new();
    match command {
        LocalCommand::Add {
            side,
            price,
            size,
            user_id,
        } => {
            let side = parse_side(&side);
            match order_book.place_limit(side, price, size, user_id) {
                Ok(id) => println!("limit order placed: {id:?} ({:?} order_type)", OrderType::Limit),
                Err(e) => eprintln!("rejected: {e}"),
            }
            print_book(&order_book);
        }
        LocalCommand::Match {
            side,
            size,
            user_id,
        } => {
            let side = parse_side(&side);
            match order_book.place_market(side, size, user_id) {
                Ok((id, matches)) if matches.is_empty() => {
                    println!("market order {id:?} placed, no matches")
                }
                Ok((id, matches)) => {
                    println!("market order {id:?} placed, {} match(es):", matches.len());
                    for m in matches {
                        println!("  {m:?}");
                    }
                }
                Err(e) => eprintln!("rejected: {e}"),
            }
            print_book(&order_book);
        }
        LocalCommand::Book => print_book(&order_book),
    }
}
