//! Business-day calendars.
//!
//! The planner only asks whether a date is a working day; where holiday data
//! comes from is up to the caller.

use crate::error::ScheduleError;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::RwLock;

/// Upper bound on the days searched for the next business day.
const MAX_LOOKAHEAD_DAYS: usize = 3660;

/// Decides which dates are working days.
pub trait BusinessCalendar: Sync {
    fn is_business_day(&self, date: NaiveDate) -> bool;

    /// First business day at or after `date`.
    fn next_business_day(&self, date: NaiveDate) -> NaiveDate {
        let mut day = date;
        for _ in 0..MAX_LOOKAHEAD_DAYS {
            if self.is_business_day(day) {
                return day;
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        log::warn!("no business day found within {} days of {}", MAX_LOOKAHEAD_DAYS, date);
        day
    }

    /// First business day strictly after `date`.
    fn following_business_day(&self, date: NaiveDate) -> NaiveDate {
        match date.succ_opt() {
            Some(next) => self.next_business_day(next),
            None => date,
        }
    }
}

impl<C: BusinessCalendar + ?Sized> BusinessCalendar for &C {
    fn is_business_day(&self, date: NaiveDate) -> bool {
        (**self).is_business_day(date)
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Monday to Friday, no holidays.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeekdayCalendar;

impl BusinessCalendar for WeekdayCalendar {
    fn is_business_day(&self, date: NaiveDate) -> bool {
        !is_weekend(date)
    }
}

/// A public holiday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    pub date: NaiveDate,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_kind")]
    pub kind: String,
}

fn default_kind() -> String {
    "General".to_string()
}

impl Holiday {
    pub fn new(date: NaiveDate, name: impl Into<String>) -> Self {
        Holiday {
            date,
            name: name.into(),
            kind: default_kind(),
        }
    }
}

/// Load holidays from a JSON array file.
pub fn load_holidays<P: AsRef<Path>>(path: P) -> Result<Vec<Holiday>, ScheduleError> {
    let file = File::open(path)?;
    let holidays = serde_json::from_reader(BufReader::new(file))?;
    Ok(holidays)
}

/// Supplies holiday dates to a [`HolidayCalendar`].
pub trait HolidaySource: Sync {
    fn holiday_dates(&self) -> Vec<NaiveDate>;
}

impl HolidaySource for Vec<NaiveDate> {
    fn holiday_dates(&self) -> Vec<NaiveDate> {
        self.clone()
    }
}

impl HolidaySource for Vec<Holiday> {
    fn holiday_dates(&self) -> Vec<NaiveDate> {
        self.iter().map(|holiday| holiday.date).collect()
    }
}

/// Weekends plus holidays from a source.
///
/// Holidays are read from the source on first use and cached. Whoever edits
/// the holiday data calls [`HolidayCalendar::clear`] so the next lookup reloads.
pub struct HolidayCalendar<S: HolidaySource> {
    source: S,
    cache: RwLock<Option<HashSet<NaiveDate>>>,
}

impl<S: HolidaySource> HolidayCalendar<S> {
    pub fn new(source: S) -> Self {
        HolidayCalendar {
            source,
            cache: RwLock::new(None),
        }
    }

    /// Drop the cached holidays.
    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.write() {
            *cache = None;
        }
    }

    /// Whether holidays are currently cached.
    pub fn is_cached(&self) -> bool {
        self.cache.read().map(|cache| cache.is_some()).unwrap_or(false)
    }

    /// Mutable access to the source; the cache is cleared.
    pub fn source_mut(&mut self) -> &mut S {
        self.clear();
        &mut self.source
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        if let Ok(cache) = self.cache.read() {
            if let Some(holidays) = cache.as_ref() {
                return holidays.contains(&date);
            }
        }

        let holidays: HashSet<NaiveDate> = self.source.holiday_dates().into_iter().collect();
        let found = holidays.contains(&date);
        if let Ok(mut cache) = self.cache.write() {
            *cache = Some(holidays);
        }
        found
    }
}

impl<S: HolidaySource> BusinessCalendar for HolidayCalendar<S> {
    fn is_business_day(&self, date: NaiveDate) -> bool {
        !is_weekend(date) && !self.is_holiday(date)
    }
}

/// Business days needed for `total_shops` at `shops_per_day`.
pub fn estimate_required_business_days(total_shops: usize, shops_per_day: usize) -> usize {
    if shops_per_day == 0 {
        return 0;
    }
    (total_shops + shops_per_day - 1) / shops_per_day
}

/// Date of the `required_days`-th business day counting from `start`.
///
/// Returns `start` when no days are required.
pub fn estimate_finish_date<C: BusinessCalendar + ?Sized>(
    start: NaiveDate,
    required_days: usize,
    calendar: &C,
) -> NaiveDate {
    if required_days == 0 {
        return start;
    }

    let mut day = calendar.next_business_day(start);
    for _ in 1..required_days {
        day = calendar.following_business_day(day);
    }
    day
}
