//! Property-based checks of the planner invariants.

use std::collections::HashSet;

use proptest::prelude::*;
use stocktake_planner::cancel::CancellationToken;
use stocktake_planner::clustering::{ClusterParams, ProximityClusterer};
use stocktake_planner::config::TspConfig;
use stocktake_planner::geo::distance_km;
use stocktake_planner::neighbors::{NeighborNetwork, NeighborParams};
use stocktake_planner::shop::{Region, Shop};
use stocktake_planner::tsp::{is_valid_route, DistanceMatrix, RouteOptimizer, TspStrategy};

/// Shops scattered over roughly 20 x 20 km, some without coordinates.
fn shops_strategy(max: usize) -> impl Strategy<Value = Vec<Shop>> {
    prop::collection::vec(
        prop::option::weighted(0.9, (22.20f64..22.40, 114.00f64..114.20)),
        0..max,
    )
    .prop_map(|points| {
        points
            .into_iter()
            .enumerate()
            .map(|(i, point)| {
                let region = Region::ALL[i % Region::ALL.len()];
                Shop::new(format!("S{:03}", i), region, point.map(|p| p.0), point.map(|p| p.1))
            })
            .collect()
    })
}

fn matrix_strategy() -> impl Strategy<Value = Vec<Vec<f64>>> {
    (1usize..10).prop_flat_map(|n| prop::collection::vec(prop::collection::vec(0.0f64..100.0, n), n))
}

proptest! {
    #[test]
    fn prop_distance_symmetric_and_non_negative(
        lat1 in -90.0f64..90.0, lon1 in -180.0f64..180.0,
        lat2 in -90.0f64..90.0, lon2 in -180.0f64..180.0,
    ) {
        let ab = distance_km(lat1, lon1, lat2, lon2);
        let ba = distance_km(lat2, lon2, lat1, lon1);
        prop_assert!(ab >= 0.0);
        prop_assert!((ab - ba).abs() < 1e-6);
        // Half the circumference bounds every great-circle distance
        prop_assert!(ab <= 20_016.0);
    }

    #[test]
    fn prop_neighbor_lists_respect_limits(
        shops in shops_strategy(40),
        max_neighbors in 1usize..8,
        max_distance_km in 0.5f64..10.0,
    ) {
        let params = NeighborParams { max_distance_km, max_neighbors, same_region_only: false };
        let network = NeighborNetwork::build(&shops, &params);

        for (shop_id, entries) in &network.neighbors {
            prop_assert!(entries.len() <= max_neighbors);
            for entry in entries {
                prop_assert!(&entry.shop_id != shop_id);
                prop_assert!(entry.distance_km <= max_distance_km);
            }
            for pair in entries.windows(2) {
                prop_assert!(pair[0].distance_km <= pair[1].distance_km);
            }
        }
        prop_assert_eq!(network.neighbors.len() + network.skipped.len(), shops.len());
    }

    #[test]
    fn prop_clusters_partition_the_shops(
        shops in shops_strategy(60),
        max_per_cluster in 1usize..12,
    ) {
        let network = NeighborNetwork::build(&shops, &NeighborParams::default());
        let set = ProximityClusterer::new(ClusterParams { max_per_cluster, ..ClusterParams::default() })
            .cluster(&shops, &network);

        let mut seen = HashSet::new();
        for cluster in &set.clusters {
            prop_assert!(!cluster.is_empty());
            for id in &cluster.shop_ids {
                prop_assert!(seen.insert(id.clone()), "{} placed twice", id);
            }
        }
        prop_assert_eq!(seen.len(), shops.len());

        if set.depth_limited == 0 {
            for cluster in &set.clusters {
                prop_assert!(cluster.len() <= max_per_cluster);
            }
        }
    }

    #[test]
    fn prop_route_is_a_permutation_from_zero(rows in matrix_strategy()) {
        let n = rows.len();
        let matrix = DistanceMatrix::new(rows).unwrap();

        for strategy in [TspStrategy::Exact, TspStrategy::LocalSearch, TspStrategy::NearestNeighbor] {
            let optimizer = RouteOptimizer::new(TspConfig { strategy, ..TspConfig::default() });
            let solution = optimizer.solve(&matrix, &CancellationToken::new());
            prop_assert!(is_valid_route(&solution.order, n));
            prop_assert!(!solution.fallback);
        }
    }
}
