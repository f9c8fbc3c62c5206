use criterion::{Criterion, criterion_group, criterion_main};
use order_book_engine::order::Side;
use order_book_engine::order_book::OrderBook;

fn setup_order_book(depth: u64, orders_per_level: u64) -> OrderBook {
    let ob = OrderBook::new();
    for price in 1..=depth {
        for _ in 0..orders_per_level {
            ob.place_limit(Side::Ask, price, 1, 1).unwrap();
            ob.place_limit(Side::Bid, price, 1, 2).unwrap();
        }
    }
    ob
}

fn bench_match_order(c: &mut Criterion) {
    let depth = 100;
    let orders_per_level = 10;

    c.bench_function("market order walking half the book", |b| {
        b.iter_batched(
            || setup_order_book(depth, orders_per_level),
            |ob| ob.place_market(Side::Bid, depth * orders_per_level / 2, 3).unwrap(),
            criterion::BatchSize::SmallInput,
        )
    });

    c.bench_function("limit order resting at the best price", |b| {
        let ob = setup_order_book(depth, orders_per_level);
        b.iter(|| ob.place_limit(Side::Ask, depth / 2, 1, 4).unwrap())
    });

    c.bench_function("cancel a resting order", |b| {
        b.iter_batched(
            || {
                let ob = setup_order_book(depth, orders_per_level);
                let id = ob.place_limit(Side::Bid, depth / 2, 1, 5).unwrap();
                (ob, id)
            },
            |(ob, id)| ob.cancel(id).unwrap(),
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_match_order);
criterion_main!(benches);
