//! Proximity clustering of shops.
//!
//! Shops linked by the neighbor network form an undirected graph whose
//! connected components are the initial clusters. Components larger than the
//! size cap are broken up with k-means on their coordinates, falling back to
//! contiguous chunks when k-means cannot make progress.

use crate::kmeans::KMeans;
use crate::neighbors::NeighborNetwork;
use crate::shop::Shop;
use petgraph::algo::kosaraju_scc;
use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Where a cluster came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterKind {
    /// Connected component or a geometric split of one.
    Proximity,
    /// Shops without coordinates pulled out of an oversized component.
    Unlocated,
}

/// A set of shops scheduled together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub shop_ids: Vec<String>,
    pub kind: ClusterKind,
}

impl Cluster {
    pub fn new(shop_ids: Vec<String>) -> Self {
        Cluster {
            shop_ids,
            kind: ClusterKind::Proximity,
        }
    }

    pub fn len(&self) -> usize {
        self.shop_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shop_ids.is_empty()
    }

    pub fn contains(&self, shop_id: &str) -> bool {
        self.shop_ids.iter().any(|id| id == shop_id)
    }
}

/// Parameters for the clusterer.
#[derive(Debug, Clone, Copy)]
pub struct ClusterParams {
    pub max_per_cluster: usize,
    pub min_cluster_size: usize,
    pub max_split_depth: usize,
    pub kmeans_seed: u64,
    pub kmeans_restarts: usize,
}

impl Default for ClusterParams {
    fn default() -> Self {
        ClusterParams {
            max_per_cluster: 10,
            min_cluster_size: 1,
            max_split_depth: 10,
            kmeans_seed: 42,
            kmeans_restarts: 10,
        }
    }
}

/// Output of a clustering pass.
#[derive(Debug, Clone, Default)]
pub struct ClusterSet {
    pub clusters: Vec<Cluster>,
    /// Shops without coordinates that had to be moved out of oversized components.
    pub unlocated: Vec<String>,
    /// Groups emitted over the size cap because the split depth limit was hit.
    pub depth_limited: usize,
    /// Clusters smaller than `min_cluster_size`; they are still scheduled.
    pub undersized: usize,
}

impl ClusterSet {
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Total number of shops across all clusters.
    pub fn shop_count(&self) -> usize {
        self.clusters.iter().map(Cluster::len).sum()
    }
}

/// Groups shops into size-bounded proximity clusters.
pub struct ProximityClusterer {
    pub params: ClusterParams,
}

impl ProximityClusterer {
    pub fn new(params: ClusterParams) -> Self {
        ProximityClusterer { params }
    }

    /// Cluster every shop in `shops` using the links in `network`.
    ///
    /// Each shop appears in exactly one returned cluster. Neighbor entries
    /// naming shops outside `shops` are ignored.
    pub fn cluster(&self, shops: &[Shop], network: &NeighborNetwork) -> ClusterSet {
        let max = self.params.max_per_cluster.max(1);

        let mut graph: UnGraph<usize, f64> = UnGraph::default();
        let mut nodes: HashMap<&str, NodeIndex> = HashMap::with_capacity(shops.len());
        for (i, shop) in shops.iter().enumerate() {
            nodes
                .entry(shop.shop_id.as_str())
                .or_insert_with(|| graph.add_node(i));
        }
        for (from, to, distance_km) in network.pairs() {
            if let (Some(&a), Some(&b)) = (nodes.get(from), nodes.get(to)) {
                if a != b {
                    graph.add_edge(a, b, distance_km);
                }
            }
        }

        // Strongly connected components of an undirected graph are its
        // connected components.
        let mut components: Vec<Vec<usize>> = kosaraju_scc(&graph)
            .into_iter()
            .map(|component| {
                let mut members: Vec<usize> = component.into_iter().map(|node| graph[node]).collect();
                members.sort_unstable();
                members
            })
            .collect();
        components.sort_by_key(|members| members.first().copied());

        log::debug!(
            "{} shops form {} connected components",
            graph.node_count(),
            components.len()
        );

        let mut set = ClusterSet::default();
        let mut queue: VecDeque<(Vec<usize>, usize)> = VecDeque::new();
        let mut unlocated: Vec<usize> = Vec::new();

        for members in components {
            if members.len() <= max {
                set.clusters.push(to_cluster(shops, &members));
            } else {
                queue.push_back((members, 0));
            }
        }

        while let Some((members, depth)) = queue.pop_front() {
            if members.len() <= max {
                set.clusters.push(to_cluster(shops, &members));
                continue;
            }
            if depth >= self.params.max_split_depth {
                log::warn!(
                    "split depth limit {} reached, keeping a group of {} shops",
                    self.params.max_split_depth,
                    members.len()
                );
                set.depth_limited += 1;
                set.clusters.push(to_cluster(shops, &members));
                continue;
            }

            let (located, missing): (Vec<usize>, Vec<usize>) =
                members.into_iter().partition(|&i| shops[i].is_located());
            unlocated.extend(missing);

            if located.is_empty() {
                continue;
            }
            if located.len() <= max {
                set.clusters.push(to_cluster(shops, &located));
                continue;
            }

            match self.split(shops, &located, max) {
                Some(parts) => {
                    for part in parts {
                        if part.len() > max {
                            queue.push_back((part, depth + 1));
                        } else {
                            set.clusters.push(to_cluster(shops, &part));
                        }
                    }
                }
                None => {
                    for chunk in located.chunks(max) {
                        set.clusters.push(to_cluster(shops, chunk));
                    }
                }
            }
        }

        if !unlocated.is_empty() {
            log::warn!(
                "{} shops without coordinates moved into separate clusters",
                unlocated.len()
            );
            unlocated.sort_by(|&a, &b| {
                let (x, y) = (&shops[a], &shops[b]);
                (x.region.code(), &x.district, &x.shop_id).cmp(&(y.region.code(), &y.district, &y.shop_id))
            });
            for chunk in unlocated.chunks(max) {
                let mut cluster = to_cluster(shops, chunk);
                cluster.kind = ClusterKind::Unlocated;
                set.clusters.push(cluster);
            }
            set.unlocated = unlocated.iter().map(|&i| shops[i].shop_id.clone()).collect();
        }

        set.undersized = set
            .clusters
            .iter()
            .filter(|cluster| cluster.len() < self.params.min_cluster_size)
            .count();
        if set.undersized > 0 {
            log::debug!(
                "{} clusters below the minimum size of {}",
                set.undersized,
                self.params.min_cluster_size
            );
        }

        set
    }

    /// Split located shops with k-means; `None` when k-means fails or makes
    /// no progress.
    fn split(&self, shops: &[Shop], located: &[usize], max: usize) -> Option<Vec<Vec<usize>>> {
        let points: Vec<(f64, f64)> = located
            .iter()
            .filter_map(|&i| shops[i].location())
            .collect();

        let k = ((located.len() + max - 1) / max).clamp(2, located.len());
        let labels = match KMeans::new(k)
            .with_seed(self.params.kmeans_seed)
            .with_restarts(self.params.kmeans_restarts)
            .fit_predict(&points)
        {
            Ok(labels) => labels,
            Err(err) => {
                log::warn!("k-means failed on {} shops ({}), chunking instead", located.len(), err);
                return None;
            }
        };

        let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); k];
        for (&shop, &label) in located.iter().zip(&labels) {
            buckets[label].push(shop);
        }
        buckets.retain(|bucket| !bucket.is_empty());

        let largest = buckets.iter().map(Vec::len).max().unwrap_or(0);
        if buckets.len() < 2 || largest >= located.len() {
            log::warn!("k-means split of {} shops made no progress, chunking instead", located.len());
            return None;
        }

        Some(buckets)
    }
}

fn to_cluster(shops: &[Shop], members: &[usize]) -> Cluster {
    Cluster::new(members.iter().map(|&i| shops[i].shop_id.clone()).collect())
}
