//! Schedule outputs.

use crate::assignment::Assignment;
use crate::error::ScheduleError;
use crate::quality::ClusterQuality;
use crate::route::RouteOrder;
use crate::shop::{Region, Shop};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summary of a scheduling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub total_shops: usize,
    pub business_days: usize,
    pub start_date: NaiveDate,
    pub finish_date: NaiveDate,
    /// Zero unless travel estimation was requested
    pub avg_daily_distance_km: f64,
    /// Zero unless travel estimation was requested
    pub avg_daily_travel_hours: f64,
    /// Shop count per region; every region is present
    pub region_counts: BTreeMap<Region, usize>,
    pub cluster_quality: Option<ClusterQuality>,
    /// Shops left out of geometric steps for lack of coordinates
    pub unlocated_shops: usize,
}

impl ScheduleResult {
    /// Summary for a run with nothing to schedule.
    pub fn empty(start_date: NaiveDate) -> Self {
        ScheduleResult {
            total_shops: 0,
            business_days: 0,
            start_date,
            finish_date: start_date,
            avg_daily_distance_km: 0.0,
            avg_daily_travel_hours: 0.0,
            region_counts: region_counts(&[]),
            cluster_quality: None,
            unlocated_shops: 0,
        }
    }
}

/// Count shops per region, including regions with none.
pub fn region_counts(shops: &[&Shop]) -> BTreeMap<Region, usize> {
    let mut counts: BTreeMap<Region, usize> = Region::ALL.iter().map(|region| (*region, 0)).collect();
    for shop in shops {
        *counts.entry(shop.region).or_default() += 1;
    }
    counts
}

/// Everything a scheduling run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulePlan {
    pub assignments: Vec<Assignment>,
    pub route_orders: Vec<RouteOrder>,
    pub result: ScheduleResult,
}

impl SchedulePlan {
    pub fn empty(start_date: NaiveDate) -> Self {
        SchedulePlan {
            assignments: Vec::new(),
            route_orders: Vec::new(),
            result: ScheduleResult::empty(start_date),
        }
    }

    /// Distinct dates in the plan, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.assignments.iter().map(|a| a.date).collect();
        dates.sort_unstable();
        dates.dedup();
        dates
    }

    /// Assignments for one date.
    pub fn assignments_on(&self, date: NaiveDate) -> Vec<&Assignment> {
        self.assignments.iter().filter(|a| a.date == date).collect()
    }

    /// Visiting order of one group on one date.
    pub fn route_for(&self, date: NaiveDate, group: usize) -> Option<&RouteOrder> {
        self.route_orders
            .iter()
            .find(|route| route.date == date && route.group == group)
    }
}

/// Receives the plan as it is produced, before route ordering and after it.
pub trait AssignmentSink {
    fn store_assignments(&mut self, assignments: &[Assignment]) -> Result<(), ScheduleError>;

    fn store_route_orders(&mut self, _routes: &[RouteOrder]) -> Result<(), ScheduleError> {
        Ok(())
    }
}

/// Discards everything.
impl AssignmentSink for () {
    fn store_assignments(&mut self, _assignments: &[Assignment]) -> Result<(), ScheduleError> {
        Ok(())
    }
}

/// Keeps a copy of the last plan stored.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub assignments: Vec<Assignment>,
    pub route_orders: Vec<RouteOrder>,
}

impl AssignmentSink for MemorySink {
    fn store_assignments(&mut self, assignments: &[Assignment]) -> Result<(), ScheduleError> {
        self.assignments = assignments.to_vec();
        Ok(())
    }

    fn store_route_orders(&mut self, routes: &[RouteOrder]) -> Result<(), ScheduleError> {
        self.route_orders = routes.to_vec();
        Ok(())
    }
}
