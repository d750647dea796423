//! # Stock-take planner
//!
//! Plans multi-day stock-take visits for a set of retail shops.
//!
//! Shops close to each other are linked into a neighbor network, grouped into
//! size-bounded proximity clusters, packed into business days and field
//! groups, and each group's visits for the day are put into a short visiting
//! order.
//!
//! The planner is a pure in-process computation. Loading shops, storing the
//! plan and maintaining holidays belong to the caller; the planner only
//! consumes a [`calendar::BusinessCalendar`] and hands results to an
//! [`schedule::AssignmentSink`].

pub mod assignment;
pub mod calendar;
pub mod cancel;
pub mod clustering;
pub mod config;
pub mod error;
pub mod geo;
pub mod kmeans;
pub mod neighbors;
pub mod quality;
pub mod route;
pub mod schedule;
pub mod shop;
pub mod tsp;
pub mod utils;

use crate::assignment::{sort_for_sequential, Assignment, DayAssigner};
use crate::calendar::BusinessCalendar;
use crate::cancel::CancellationToken;
use crate::clustering::{ClusterParams, ProximityClusterer};
use crate::config::{CrossRegionPolicy, RailPolicy, SchedulingConfig};
use crate::error::ScheduleError;
use crate::neighbors::{NeighborNetwork, NeighborParams};
use crate::quality::ClusterQuality;
use crate::route::{day_travel_totals, optimize_routes, HaversineEstimator, TravelEstimator};
use crate::schedule::{region_counts, AssignmentSink, SchedulePlan, ScheduleResult};
use crate::shop::{shop_index, Shop};
use crate::tsp::RouteOptimizer;

use std::collections::HashSet;
use std::time::Instant;

/// Runs the full planning pipeline for one configuration.
pub struct StockTakePlanner<C: BusinessCalendar> {
    pub config: SchedulingConfig,
    pub calendar: C,
    estimator: Box<dyn TravelEstimator>,
}

impl<C: BusinessCalendar> StockTakePlanner<C> {
    /// Create a planner with the default travel estimator.
    pub fn new(config: SchedulingConfig, calendar: C) -> Self {
        StockTakePlanner {
            config,
            calendar,
            estimator: Box::new(HaversineEstimator::default()),
        }
    }

    /// Replace the travel estimator used when distances are requested.
    pub fn with_estimator(mut self, estimator: Box<dyn TravelEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    /// Generate a plan without storing it anywhere.
    pub fn generate(&self, shops: &[Shop]) -> Result<SchedulePlan, ScheduleError> {
        self.generate_with(shops, &mut (), &CancellationToken::new())
    }

    /// Generate a plan, handing assignments and route orders to `sink` as
    /// they are produced.
    pub fn generate_with(
        &self,
        shops: &[Shop],
        sink: &mut dyn AssignmentSink,
        cancel: &CancellationToken,
    ) -> Result<SchedulePlan, ScheduleError> {
        let start_time = Instant::now();
        self.config.validate()?;
        check_unique_ids(shops)?;

        let selected: Vec<Shop> = self.select_shops(shops).into_iter().cloned().collect();
        let start_date = self.config.start_date;

        if selected.is_empty() {
            log::info!("no shops match the filters, nothing to schedule");
            return Ok(SchedulePlan::empty(start_date));
        }
        log::info!("scheduling {} of {} shops", selected.len(), shops.len());

        let index = shop_index(&selected);
        let assigner = DayAssigner::new(&self.calendar, self.config.shops_per_day, self.config.groups_per_day)
            .with_rail_policy(self.config.rail_policy);

        let (assignments, cluster_quality, unlocated_shops) = if self.config.use_clustering {
            let network = NeighborNetwork::build(&selected, &self.neighbor_params());
            log::info!(
                "neighbor network: {} links, {} shops without coordinates",
                network.edge_count(),
                network.skipped.len()
            );

            let clusters = ProximityClusterer::new(self.cluster_params()).cluster(&selected, &network);
            log::info!("created {} clusters", clusters.len());

            let quality = ClusterQuality::evaluate(&clusters.clusters, &selected, &network);
            log::info!(
                "avg intra-cluster distance {:.2} km, region consistency {:.1}%",
                quality.avg_intra_cluster_distance_km,
                quality.region_consistency_pct()
            );

            let assignments = assigner.assign_clusters(&clusters.clusters, start_date, &index);
            (assignments, Some(quality), network.skipped.len())
        } else {
            log::info!("clustering disabled, packing shops by region and district");
            let mut ordered: Vec<&Shop> = selected.iter().collect();
            sort_for_sequential(&mut ordered);
            let unlocated = ordered.iter().filter(|shop| !shop.is_located()).count();
            (assigner.assign_sequential(&ordered, start_date), None, unlocated)
        };

        sink.store_assignments(&assignments)?;

        if cancel.is_cancelled() {
            return Err(ScheduleError::Cancelled);
        }

        let optimizer = RouteOptimizer::new(self.config.tsp.clone());
        let route_orders = optimize_routes(&assignments, &index, &optimizer, cancel)?;
        sink.store_route_orders(&route_orders)?;

        let dates = distinct_dates(&assignments);
        let business_days = dates.len();
        let finish_date = dates.last().copied().unwrap_or(start_date);

        let (avg_daily_distance_km, avg_daily_travel_hours) = if self.config.include_distance && business_days > 0 {
            let totals = day_travel_totals(&route_orders, &index, self.estimator.as_ref());
            let km: f64 = totals.iter().map(|day| day.distance_km).sum();
            let minutes: f64 = totals.iter().map(|day| day.travel_minutes).sum();
            (km / business_days as f64, minutes / 60.0 / business_days as f64)
        } else {
            (0.0, 0.0)
        };

        let selected_refs: Vec<&Shop> = selected.iter().collect();
        let result = ScheduleResult {
            total_shops: selected.len(),
            business_days,
            start_date,
            finish_date,
            avg_daily_distance_km,
            avg_daily_travel_hours,
            region_counts: region_counts(&selected_refs),
            cluster_quality,
            unlocated_shops,
        };

        log::info!(
            "scheduled {} shops over {} business days ({} to {}) in {:?}",
            result.total_shops,
            result.business_days,
            result.start_date,
            result.finish_date,
            start_time.elapsed()
        );

        Ok(SchedulePlan {
            assignments,
            route_orders,
            result,
        })
    }

    /// Active shops passing the region, district, brand and rail filters.
    pub fn select_shops<'s>(&self, shops: &'s [Shop]) -> Vec<&'s Shop> {
        let filter = &self.config.filter;
        shops
            .iter()
            .filter(|shop| shop.active)
            .filter(|shop| filter.regions.is_empty() || filter.regions.contains(&shop.region))
            .filter(|shop| filter.districts.is_empty() || filter.districts.contains(&shop.district))
            .filter(|shop| filter.brands.is_empty() || filter.brands.contains(&shop.brand))
            .filter(|shop| self.config.rail_policy != RailPolicy::Exclude || !shop.near_rail)
            .collect()
    }

    fn neighbor_params(&self) -> NeighborParams {
        NeighborParams {
            max_distance_km: self.config.clustering.max_distance_km,
            max_neighbors: self.config.clustering.max_neighbors,
            same_region_only: self.config.cross_region == CrossRegionPolicy::SameRegionOnly,
        }
    }

    fn cluster_params(&self) -> ClusterParams {
        let clustering = &self.config.clustering;
        ClusterParams {
            max_per_cluster: self.config.max_per_cluster(),
            min_cluster_size: clustering.min_cluster_size,
            max_split_depth: clustering.max_split_depth,
            kmeans_seed: clustering.kmeans_seed,
            kmeans_restarts: clustering.kmeans_restarts,
        }
    }
}

fn check_unique_ids(shops: &[Shop]) -> Result<(), ScheduleError> {
    let mut seen = HashSet::with_capacity(shops.len());
    for shop in shops {
        if !seen.insert(shop.shop_id.as_str()) {
            return Err(ScheduleError::DuplicateShop(shop.shop_id.clone()));
        }
    }
    Ok(())
}

fn distinct_dates(assignments: &[Assignment]) -> Vec<chrono::NaiveDate> {
    let mut dates: Vec<chrono::NaiveDate> = assignments.iter().map(|a| a.date).collect();
    dates.sort_unstable();
    dates.dedup();
    dates
}
