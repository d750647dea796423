//! Diagnostic metrics for a clustering result.

use crate::clustering::Cluster;
use crate::geo;
use crate::neighbors::NeighborNetwork;
use crate::shop::{shop_index, Shop};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cluster quality summary. Never used to gate scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterQuality {
    /// Mean pairwise distance between located shops sharing a cluster
    pub avg_intra_cluster_distance_km: f64,
    /// Fraction of clusters whose shops all share one region. Single-shop
    /// clusters count as consistent, so this reads higher than a measure
    /// that only credits multi-shop clusters.
    pub region_consistency: f64,
    pub avg_cluster_size: f64,
    pub total_clusters: usize,
    pub singleton_clusters: usize,
    /// Clusters with at least five shops
    pub large_clusters: usize,
    /// Shops left out of the neighbor network for lack of coordinates
    pub skipped_shops: usize,
}

impl ClusterQuality {
    /// Evaluate the clusters against the shops they were built from.
    pub fn evaluate(clusters: &[Cluster], shops: &[Shop], network: &NeighborNetwork) -> Self {
        let index = shop_index(shops);

        let mut total_distance = 0.0;
        let mut pairs = 0usize;
        let mut consistent = 0usize;

        for cluster in clusters {
            let members: Vec<&Shop> = cluster
                .shop_ids
                .iter()
                .filter_map(|id| index.get(id.as_str()).copied())
                .collect();

            if members.iter().map(|shop| shop.region).all_equal() {
                consistent += 1;
            }

            if members.len() < 2 {
                continue;
            }
            for (a, b) in members.iter().filter_map(|shop| shop.location()).tuple_combinations() {
                total_distance += geo::distance_between(a, b);
                pairs += 1;
            }
        }

        let total_clusters = clusters.len();
        let shop_total: usize = clusters.iter().map(Cluster::len).sum();

        ClusterQuality {
            avg_intra_cluster_distance_km: if pairs > 0 { total_distance / pairs as f64 } else { 0.0 },
            region_consistency: ratio(consistent, total_clusters),
            avg_cluster_size: ratio(shop_total, total_clusters),
            total_clusters,
            singleton_clusters: clusters.iter().filter(|c| c.len() == 1).count(),
            large_clusters: clusters.iter().filter(|c| c.len() >= 5).count(),
            skipped_shops: network.skipped.len(),
        }
    }

    /// Region consistency as a percentage.
    pub fn region_consistency_pct(&self) -> f64 {
        self.region_consistency * 100.0
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl fmt::Display for ClusterQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cluster Quality:")?;
        writeln!(f, "- Clusters: {}", self.total_clusters)?;
        writeln!(f, "- Avg Intra-Cluster Distance: {:.2} km", self.avg_intra_cluster_distance_km)?;
        writeln!(f, "- Region Consistency: {:.1}%", self.region_consistency_pct())?;
        writeln!(f, "- Avg Cluster Size: {:.1}", self.avg_cluster_size)?;
        writeln!(f, "- Singleton Clusters: {}", self.singleton_clusters)?;
        writeln!(f, "- Large Clusters (5+): {}", self.large_clusters)?;
        write!(f, "- Shops Without Coordinates: {}", self.skipped_shops)
    }
}
