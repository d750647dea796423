//! Packing clusters into business days and field groups.

use crate::calendar::BusinessCalendar;
use crate::clustering::Cluster;
use crate::config::RailPolicy;
use crate::shop::Shop;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One shop visit on a given date by a given group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub date: NaiveDate,
    pub shop_id: String,
    /// Group number in `1..=groups_per_day`
    pub group: usize,
}

/// Assigns shops to days and groups.
pub struct DayAssigner<'a, C: BusinessCalendar + ?Sized> {
    pub calendar: &'a C,
    pub shops_per_day: usize,
    pub groups_per_day: usize,
    pub rail_policy: RailPolicy,
}

impl<'a, C: BusinessCalendar + ?Sized> DayAssigner<'a, C> {
    pub fn new(calendar: &'a C, shops_per_day: usize, groups_per_day: usize) -> Self {
        DayAssigner {
            calendar,
            shops_per_day,
            groups_per_day,
            rail_policy: RailPolicy::Include,
        }
    }

    pub fn with_rail_policy(mut self, policy: RailPolicy) -> Self {
        self.rail_policy = policy;
        self
    }

    fn shops_per_group(&self) -> usize {
        (self.shops_per_day / self.groups_per_day.max(1)).max(1)
    }

    /// Group number for the shop at `position_in_day`.
    pub fn group_for(&self, position_in_day: usize) -> usize {
        (position_in_day / self.shops_per_group() + 1).min(self.groups_per_day.max(1))
    }

    /// Pack whole clusters into days, biggest first.
    ///
    /// A cluster is never split across days. One larger than the daily quota
    /// gets a day to itself and over-fills it.
    pub fn assign_clusters(
        &self,
        clusters: &[Cluster],
        start_date: NaiveDate,
        shops: &HashMap<&str, &Shop>,
    ) -> Vec<Assignment> {
        let mut ordered: Vec<&Cluster> = clusters.iter().filter(|c| !c.is_empty()).collect();
        ordered.sort_by_key(|c| std::cmp::Reverse(c.len()));

        let phases: Vec<Vec<&Cluster>> = if self.rail_policy == RailPolicy::Separate {
            let (rail, other): (Vec<&Cluster>, Vec<&Cluster>) = ordered.into_iter().partition(|cluster| {
                cluster
                    .shop_ids
                    .iter()
                    .any(|id| shops.get(id.as_str()).map_or(false, |shop| shop.near_rail))
            });
            log::debug!("{} non-rail clusters, {} rail clusters", other.len(), rail.len());
            vec![other, rail]
        } else {
            vec![ordered]
        };

        let mut assignments = Vec::new();
        let mut day = self.calendar.next_business_day(start_date);
        let mut used_today = 0;

        for phase in phases.into_iter().filter(|phase| !phase.is_empty()) {
            // Each phase starts on a day of its own.
            if used_today > 0 {
                day = self.calendar.following_business_day(day);
                used_today = 0;
            }

            for cluster in phase {
                if used_today > 0 && used_today + cluster.len() > self.shops_per_day {
                    day = self.calendar.following_business_day(day);
                    used_today = 0;
                }

                for (i, shop_id) in cluster.shop_ids.iter().enumerate() {
                    assignments.push(Assignment {
                        date: day,
                        shop_id: shop_id.clone(),
                        group: self.group_for(used_today + i),
                    });
                }
                used_today += cluster.len();
            }
        }

        assignments
    }

    /// Pack shops in their given order, `shops_per_day` per business day.
    pub fn assign_sequential(&self, shops: &[&Shop], start_date: NaiveDate) -> Vec<Assignment> {
        let mut assignments = Vec::with_capacity(shops.len());
        let mut day = self.calendar.next_business_day(start_date);

        for (i, chunk) in shops.chunks(self.shops_per_day.max(1)).enumerate() {
            if i > 0 {
                day = self.calendar.following_business_day(day);
            }
            for (position, shop) in chunk.iter().enumerate() {
                assignments.push(Assignment {
                    date: day,
                    shop_id: shop.shop_id.clone(),
                    group: self.group_for(position),
                });
            }
        }

        assignments
    }
}

/// Deterministic order used when clustering is off: region, district, id.
pub fn sort_for_sequential(shops: &mut [&Shop]) {
    shops.sort_by(|a, b| (a.region.code(), &a.district, &a.shop_id).cmp(&(b.region.code(), &b.district, &b.shop_id)));
}
