//! Benchmarks for the stock-take planner.

#[cfg(feature = "bench")]
extern crate criterion;

#[cfg(feature = "bench")]
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use chrono::NaiveDate;
use stocktake_planner::calendar::WeekdayCalendar;
use stocktake_planner::cancel::CancellationToken;
use stocktake_planner::config::{SchedulingConfig, TspConfig};
use stocktake_planner::neighbors::{NeighborNetwork, NeighborParams};
use stocktake_planner::shop::{Region, Shop};
use stocktake_planner::tsp::{DistanceMatrix, RouteOptimizer, TspStrategy};
use stocktake_planner::StockTakePlanner;

/// Create `size` shops on a grid with roughly 400 m spacing.
fn create_benchmark_shops(size: usize) -> Vec<Shop> {
    let grid_size = (size as f64).sqrt().ceil() as usize;
    (0..size)
        .map(|i| {
            let row = i / grid_size;
            let col = i % grid_size;
            Shop::new(
                format!("S{:05}", i),
                Region::ALL[row % Region::ALL.len()],
                Some(22.20 + row as f64 * 0.004),
                Some(114.00 + col as f64 * 0.004),
            )
        })
        .collect()
}

#[cfg(feature = "bench")]
fn benchmark_neighbor_network(c: &mut Criterion) {
    let mut group = c.benchmark_group("neighbor_network");

    for size in [100, 500, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let shops = create_benchmark_shops(size);
            b.iter(|| NeighborNetwork::build(&shops, &NeighborParams::default()));
        });
    }

    group.finish();
}

#[cfg(feature = "bench")]
fn benchmark_route_ordering(c: &mut Criterion) {
    let mut group = c.benchmark_group("route_ordering");

    for strategy in [TspStrategy::Exact, TspStrategy::LocalSearch] {
        for size in [8, 12].iter() {
            let id = BenchmarkId::new(format!("{:?}", strategy), size);
            group.bench_with_input(id, size, |b, &size| {
                let locations: Vec<Option<(f64, f64)>> =
                    create_benchmark_shops(size).iter().map(|shop| shop.location()).collect();
                let matrix = DistanceMatrix::from_locations(&locations);
                let optimizer = RouteOptimizer::new(TspConfig {
                    strategy,
                    ..TspConfig::default()
                });
                let cancel = CancellationToken::new();

                b.iter(|| optimizer.solve(&matrix, &cancel));
            });
        }
    }

    group.finish();
}

#[cfg(feature = "bench")]
fn benchmark_full_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_plan");
    group.sample_size(10);

    for size in [200, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let shops = create_benchmark_shops(size);
            let start = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
            let planner = StockTakePlanner::new(SchedulingConfig::new(start), WeekdayCalendar);

            b.iter(|| planner.generate(&shops));
        });
    }

    group.finish();
}

#[cfg(feature = "bench")]
criterion_group!(
    benches,
    benchmark_neighbor_network,
    benchmark_route_ordering,
    benchmark_full_plan
);

#[cfg(feature = "bench")]
criterion_main!(benches);
