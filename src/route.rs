//! Per-(date, group) visiting order and travel estimates.

use crate::assignment::Assignment;
use crate::cancel::CancellationToken;
use crate::error::ScheduleError;
use crate::geo;
use crate::shop::Shop;
use crate::tsp::{DistanceMatrix, RouteOptimizer};
use chrono::NaiveDate;
use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Average travel speed assumed by [`HaversineEstimator`].
const DEFAULT_SPEED_KMH: f64 = 40.0;

/// Ordered visits of one group on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteOrder {
    pub date: NaiveDate,
    pub group: usize,
    /// Shops in visiting order
    pub shop_ids: Vec<String>,
    /// Great-circle length of the route
    pub distance_km: f64,
    pub solve_time: Duration,
    /// The solver result was discarded for the input order
    pub fallback: bool,
}

struct Batch<'a> {
    date: NaiveDate,
    group: usize,
    shops: Vec<&'a Shop>,
}

/// Group assignments into (date, group) batches, keeping assignment order
/// inside each batch.
fn batches<'a>(
    assignments: &[Assignment],
    shops: &HashMap<&str, &'a Shop>,
) -> Vec<Batch<'a>> {
    assignments
        .iter()
        .filter_map(|a| shops.get(a.shop_id.as_str()).map(|shop| ((a.date, a.group), *shop)))
        .into_group_map()
        .into_iter()
        .sorted_by_key(|(key, _)| *key)
        .map(|((date, group), shops)| Batch { date, group, shops })
        .collect()
}

/// Order the visits of every (date, group) batch.
///
/// Batches are independent, so with `parallel` set they are solved on the
/// rayon pool. Cancellation is checked before each batch.
pub fn optimize_routes(
    assignments: &[Assignment],
    shops: &HashMap<&str, &Shop>,
    optimizer: &RouteOptimizer,
    cancel: &CancellationToken,
) -> Result<Vec<RouteOrder>, ScheduleError> {
    let batches = batches(assignments, shops);
    log::info!("optimizing {} route batches", batches.len());

    let solve = |batch: &Batch| -> Result<RouteOrder, ScheduleError> {
        if cancel.is_cancelled() {
            return Err(ScheduleError::Cancelled);
        }
        Ok(order_batch(batch, optimizer, cancel))
    };

    let routes: Result<Vec<RouteOrder>, ScheduleError> = if optimizer.config.parallel {
        batches.par_iter().map(solve).collect()
    } else {
        batches.iter().map(solve).collect()
    };

    // A batch solved while cancellation landed still counts as cancelled.
    if cancel.is_cancelled() {
        return Err(ScheduleError::Cancelled);
    }
    routes
}

fn order_batch(batch: &Batch, optimizer: &RouteOptimizer, cancel: &CancellationToken) -> RouteOrder {
    let locations: Vec<Option<(f64, f64)>> = batch.shops.iter().map(|shop| shop.location()).collect();
    let matrix = DistanceMatrix::from_locations(&locations);
    let solution = optimizer.solve(&matrix, cancel);

    log::debug!(
        "{} group {}: {} shops, {:.0} m in {:?}",
        batch.date,
        batch.group,
        batch.shops.len(),
        solution.distance,
        solution.solve_time
    );

    RouteOrder {
        date: batch.date,
        group: batch.group,
        shop_ids: solution
            .order
            .iter()
            .map(|&i| batch.shops[i].shop_id.clone())
            .collect(),
        distance_km: solution.distance / 1000.0,
        solve_time: solution.solve_time,
        fallback: solution.fallback,
    }
}

/// Travel distance and time for one leg.
pub trait TravelEstimator: Sync {
    /// `(km, minutes)` from one `(lat, lng)` to another.
    fn leg(&self, from: (f64, f64), to: (f64, f64)) -> (f64, f64);
}

/// Straight-line distance at an assumed average speed.
#[derive(Debug, Clone)]
pub struct HaversineEstimator {
    pub speed_kmh: f64,
}

impl Default for HaversineEstimator {
    fn default() -> Self {
        HaversineEstimator {
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl HaversineEstimator {
    pub fn new(speed_kmh: f64) -> Self {
        HaversineEstimator { speed_kmh }
    }
}

impl TravelEstimator for HaversineEstimator {
    fn leg(&self, from: (f64, f64), to: (f64, f64)) -> (f64, f64) {
        let km = geo::distance_between(from, to);
        let minutes = if self.speed_kmh > 0.0 { km / self.speed_kmh * 60.0 } else { 0.0 };
        (km, minutes)
    }
}

/// Travel totals for one day across all its groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayTravel {
    pub date: NaiveDate,
    pub distance_km: f64,
    pub travel_minutes: f64,
}

/// Sum consecutive legs of each route, per day. Routes are expected in date
/// order, as [`optimize_routes`] returns them. Legs touching a shop without
/// coordinates are skipped.
pub fn day_travel_totals(
    routes: &[RouteOrder],
    shops: &HashMap<&str, &Shop>,
    estimator: &dyn TravelEstimator,
) -> Vec<DayTravel> {
    let mut totals: Vec<DayTravel> = Vec::new();

    for (date, day_routes) in &routes.iter().group_by(|route| route.date) {
        let mut day = DayTravel {
            date,
            distance_km: 0.0,
            travel_minutes: 0.0,
        };
        for route in day_routes {
            let located = route
                .shop_ids
                .iter()
                .map(|id| shops.get(id.as_str()).and_then(|shop| shop.location()));
            for (from, to) in located.tuple_windows() {
                if let (Some(from), Some(to)) = (from, to) {
                    let (km, minutes) = estimator.leg(from, to);
                    day.distance_km += km;
                    day.travel_minutes += minutes;
                }
            }
        }
        totals.push(day);
    }

    totals
}
