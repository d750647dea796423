//! Configuration parameters for schedule generation.

use crate::error::ScheduleError;
use crate::shop::Region;
use crate::tsp::TspStrategy;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

/// How rail-adjacent shops are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RailPolicy {
    /// Schedule rail-adjacent shops together with everything else.
    #[default]
    Include,
    /// Leave rail-adjacent shops out of the plan.
    Exclude,
    /// Schedule rail-adjacent clusters in a second phase after the others.
    Separate,
}

/// Whether clusters may span regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CrossRegionPolicy {
    #[default]
    Allow,
    SameRegionOnly,
}

/// Restricts the shop universe before planning. Empty lists match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShopFilter {
    #[serde(default)]
    pub regions: Vec<Region>,
    #[serde(default)]
    pub districts: Vec<String>,
    #[serde(default)]
    pub brands: Vec<String>,
}

/// Proximity clustering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Neighbors further than this are not linked
    pub max_distance_km: f64,
    /// Maximum neighbors kept per shop
    pub max_neighbors: usize,
    /// Cluster size cap; defaults to `min(shops_per_day, 12)` when unset
    pub max_per_cluster: Option<usize>,
    /// Clusters below this size are counted, never merged or dropped
    pub min_cluster_size: usize,
    /// Oversized groups are emitted as-is once this many splits deep
    pub max_split_depth: usize,
    /// Seed for k-means initialization
    pub kmeans_seed: u64,
    /// Number of k-means restarts
    pub kmeans_restarts: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        ClusteringConfig {
            max_distance_km: 5.5,
            max_neighbors: 5,
            max_per_cluster: None,
            min_cluster_size: 1,
            max_split_depth: 10,
            kmeans_seed: 42,
            kmeans_restarts: 10,
        }
    }
}

/// Route-ordering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TspConfig {
    pub strategy: TspStrategy,
    /// Per-batch solve budget, written as seconds (`5`, `0.5`) or
    /// `{"millis": 500}`
    #[serde(with = "duration_secs")]
    pub time_limit: Duration,
    /// Largest batch solved exactly by the `Exact` strategy
    pub exact_max_nodes: usize,
    /// Solve independent batches on the rayon pool
    pub parallel: bool,
}

impl Default for TspConfig {
    fn default() -> Self {
        TspConfig {
            strategy: TspStrategy::LocalSearch,
            time_limit: Duration::from_secs(5),
            exact_max_nodes: 12,
            parallel: true,
        }
    }
}

/// Configuration for one scheduling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingConfig {
    /// Shops visited per business day across all groups
    pub shops_per_day: usize,
    /// Field teams working each day
    pub groups_per_day: usize,
    /// First candidate date; moved forward to a business day
    pub start_date: NaiveDate,
    #[serde(default)]
    pub filter: ShopFilter,
    #[serde(default)]
    pub rail_policy: RailPolicy,
    #[serde(default)]
    pub cross_region: CrossRegionPolicy,
    /// Cluster by proximity instead of a plain region/district sort
    #[serde(default = "default_true")]
    pub use_clustering: bool,
    /// Estimate daily travel distance and time
    #[serde(default)]
    pub include_distance: bool,
    #[serde(default)]
    pub clustering: ClusteringConfig,
    #[serde(default)]
    pub tsp: TspConfig,
}

fn default_true() -> bool {
    true
}

/// Durations as plain seconds in config files.
mod duration_secs {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(f64),
        Millis { millis: u64 },
        Parts { secs: u64, nanos: u32 },
    }

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Seconds(secs) => Duration::try_from_secs_f64(secs)
                .map_err(|_| D::Error::custom(format!("invalid duration of {} seconds", secs))),
            Raw::Millis { millis } => Ok(Duration::from_millis(millis)),
            Raw::Parts { secs, nanos } => Ok(Duration::new(secs, nanos)),
        }
    }
}

impl SchedulingConfig {
    /// Create a configuration with default capacities starting at `start_date`.
    pub fn new(start_date: NaiveDate) -> Self {
        SchedulingConfig {
            shops_per_day: 9,
            groups_per_day: 3,
            start_date,
            filter: ShopFilter::default(),
            rail_policy: RailPolicy::default(),
            cross_region: CrossRegionPolicy::default(),
            use_clustering: true,
            include_distance: false,
            clustering: ClusteringConfig::default(),
            tsp: TspConfig::default(),
        }
    }

    /// Load a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScheduleError> {
        let file = File::open(path)?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    /// Set the daily shop quota.
    pub fn with_shops_per_day(mut self, shops: usize) -> Self {
        self.shops_per_day = shops;
        self
    }

    /// Set the number of groups per day.
    pub fn with_groups_per_day(mut self, groups: usize) -> Self {
        self.groups_per_day = groups;
        self
    }

    /// Restrict to the given regions.
    pub fn with_regions(mut self, regions: Vec<Region>) -> Self {
        self.filter.regions = regions;
        self
    }

    /// Restrict to the given districts.
    pub fn with_districts(mut self, districts: Vec<String>) -> Self {
        self.filter.districts = districts;
        self
    }

    /// Restrict to the given brands.
    pub fn with_brands(mut self, brands: Vec<String>) -> Self {
        self.filter.brands = brands;
        self
    }

    pub fn with_rail_policy(mut self, policy: RailPolicy) -> Self {
        self.rail_policy = policy;
        self
    }

    pub fn with_cross_region(mut self, policy: CrossRegionPolicy) -> Self {
        self.cross_region = policy;
        self
    }

    /// Enable or disable proximity clustering.
    pub fn with_clustering(mut self, enabled: bool) -> Self {
        self.use_clustering = enabled;
        self
    }

    /// Enable or disable travel estimation.
    pub fn with_distance(mut self, enabled: bool) -> Self {
        self.include_distance = enabled;
        self
    }

    /// Set the neighbor distance threshold.
    pub fn with_max_distance_km(mut self, km: f64) -> Self {
        self.clustering.max_distance_km = km;
        self
    }

    /// Set the neighbor cap.
    pub fn with_max_neighbors(mut self, n: usize) -> Self {
        self.clustering.max_neighbors = n;
        self
    }

    /// Set the cluster size cap.
    pub fn with_max_per_cluster(mut self, n: usize) -> Self {
        self.clustering.max_per_cluster = Some(n);
        self
    }

    /// Set the split depth limit.
    pub fn with_max_split_depth(mut self, depth: usize) -> Self {
        self.clustering.max_split_depth = depth;
        self
    }

    /// Set the route-ordering strategy.
    pub fn with_tsp_strategy(mut self, strategy: TspStrategy) -> Self {
        self.tsp.strategy = strategy;
        self
    }

    /// Set the per-batch route-ordering time limit.
    pub fn with_tsp_time_limit(mut self, duration: Duration) -> Self {
        self.tsp.time_limit = duration;
        self
    }

    /// Solve route batches in parallel or one after another.
    pub fn with_parallel_tsp(mut self, parallel: bool) -> Self {
        self.tsp.parallel = parallel;
        self
    }

    /// Effective cluster size cap.
    pub fn max_per_cluster(&self) -> usize {
        self.clustering
            .max_per_cluster
            .unwrap_or_else(|| self.shops_per_day.min(12))
    }

    /// Reject configurations the planner cannot run with.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.shops_per_day == 0 {
            return Err(ScheduleError::config("shops_per_day must be positive"));
        }
        if self.groups_per_day == 0 {
            return Err(ScheduleError::config("groups_per_day must be positive"));
        }
        if self.groups_per_day > self.shops_per_day {
            return Err(ScheduleError::config(format!(
                "groups_per_day ({}) exceeds shops_per_day ({})",
                self.groups_per_day, self.shops_per_day
            )));
        }
        if self.clustering.max_per_cluster == Some(0) {
            return Err(ScheduleError::config("max_per_cluster must be positive"));
        }
        if self.clustering.max_neighbors == 0 {
            return Err(ScheduleError::config("max_neighbors must be positive"));
        }
        if !self.clustering.max_distance_km.is_finite() || self.clustering.max_distance_km < 0.0 {
            return Err(ScheduleError::config("max_distance_km must be a non-negative number"));
        }
        if self.tsp.time_limit.is_zero() {
            return Err(ScheduleError::config("tsp time_limit must be positive"));
        }
        Ok(())
    }
}
