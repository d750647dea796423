//! Nearest-neighbor network between shops.
//!
//! Every located shop is compared against every other located shop, so the
//! build is O(n²) in the number of located shops. That is fine for the few
//! thousand shops a stock-take plan covers; larger inputs would want a spatial
//! index.

use crate::geo;
use crate::shop::Shop;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A neighbor of a shop and its distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborEntry {
    pub shop_id: String,
    pub distance_km: f64,
}

/// Parameters for the neighbor network.
#[derive(Debug, Clone, Copy)]
pub struct NeighborParams {
    pub max_distance_km: f64,
    pub max_neighbors: usize,
    pub same_region_only: bool,
}

impl Default for NeighborParams {
    fn default() -> Self {
        NeighborParams {
            max_distance_km: 5.5,
            max_neighbors: 5,
            same_region_only: false,
        }
    }
}

/// Nearest neighbors of every located shop.
#[derive(Debug, Clone, Default)]
pub struct NeighborNetwork {
    /// Shop id to its neighbors, nearest first.
    pub neighbors: BTreeMap<String, Vec<NeighborEntry>>,
    /// Shops left out because they have no usable coordinates.
    pub skipped: Vec<String>,
}

impl NeighborNetwork {
    /// Build the network for the given shops.
    pub fn build(shops: &[Shop], params: &NeighborParams) -> Self {
        let mut network = NeighborNetwork::default();

        let mut located: Vec<(&Shop, (f64, f64))> = Vec::with_capacity(shops.len());
        for shop in shops {
            match shop.location() {
                Some(location) => located.push((shop, location)),
                None => network.skipped.push(shop.shop_id.clone()),
            }
        }

        for (i, (shop, from)) in located.iter().enumerate() {
            let mut candidates: Vec<NeighborEntry> = located
                .iter()
                .enumerate()
                .filter(|(j, (other, _))| {
                    *j != i && (!params.same_region_only || other.region == shop.region)
                })
                .filter_map(|(_, (other, to))| {
                    let distance_km = geo::distance_between(*from, *to);
                    (distance_km <= params.max_distance_km).then(|| NeighborEntry {
                        shop_id: other.shop_id.clone(),
                        distance_km,
                    })
                })
                .collect();

            candidates.sort_by(|a, b| {
                a.distance_km
                    .total_cmp(&b.distance_km)
                    .then_with(|| a.shop_id.cmp(&b.shop_id))
            });
            candidates.truncate(params.max_neighbors);

            network.neighbors.insert(shop.shop_id.clone(), candidates);
        }

        log::debug!(
            "neighbor network: {} located shops, {} edges, {} skipped",
            network.neighbors.len(),
            network.edge_count(),
            network.skipped.len()
        );

        network
    }

    /// Neighbors of a shop, nearest first.
    pub fn get(&self, shop_id: &str) -> Option<&[NeighborEntry]> {
        self.neighbors.get(shop_id).map(Vec::as_slice)
    }

    /// Add a directed neighbor pair.
    pub fn insert(&mut self, shop_id: impl Into<String>, neighbor_id: impl Into<String>, distance_km: f64) {
        self.neighbors.entry(shop_id.into()).or_default().push(NeighborEntry {
            shop_id: neighbor_id.into(),
            distance_km,
        });
    }

    /// Iterate all `(shop, neighbor, distance)` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.neighbors.iter().flat_map(|(shop_id, entries)| {
            entries
                .iter()
                .map(move |entry| (shop_id.as_str(), entry.shop_id.as_str(), entry.distance_km))
        })
    }

    /// Total number of directed neighbor pairs.
    pub fn edge_count(&self) -> usize {
        self.neighbors.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }
}
