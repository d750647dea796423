//! Tests for business-day calendars and finish-date estimates.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use stocktake_planner::calendar::{
    estimate_finish_date, estimate_required_business_days, BusinessCalendar, Holiday, HolidayCalendar,
    HolidaySource, WeekdayCalendar,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Holiday source that counts how often it is read.
struct CountingSource {
    dates: Vec<NaiveDate>,
    reads: Arc<AtomicUsize>,
}

impl HolidaySource for CountingSource {
    fn holiday_dates(&self) -> Vec<NaiveDate> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.dates.clone()
    }
}

#[test]
fn test_weekday_calendar() {
    let calendar = WeekdayCalendar;
    assert!(calendar.is_business_day(date(2025, 3, 7)));
    assert!(!calendar.is_business_day(date(2025, 3, 8)));
    assert!(!calendar.is_business_day(date(2025, 3, 9)));

    assert_eq!(calendar.next_business_day(date(2025, 3, 7)), date(2025, 3, 7));
    assert_eq!(calendar.next_business_day(date(2025, 3, 8)), date(2025, 3, 10));
    assert_eq!(calendar.following_business_day(date(2025, 3, 7)), date(2025, 3, 10));
}

#[test]
fn test_holidays_are_not_business_days() {
    let calendar = HolidayCalendar::new(vec![
        Holiday::new(date(2025, 4, 18), "Good Friday"),
        Holiday::new(date(2025, 4, 21), "Easter Monday"),
    ]);

    assert!(!calendar.is_business_day(date(2025, 4, 18)));
    assert!(!calendar.is_business_day(date(2025, 4, 21)));
    assert!(calendar.is_business_day(date(2025, 4, 17)));
    assert_eq!(calendar.following_business_day(date(2025, 4, 17)), date(2025, 4, 22));
}

#[test]
fn test_holiday_cache_and_clear() {
    let reads = Arc::new(AtomicUsize::new(0));
    let mut calendar = HolidayCalendar::new(CountingSource {
        dates: vec![date(2025, 4, 18)],
        reads: Arc::clone(&reads),
    });
    assert!(!calendar.is_cached());

    assert!(calendar.is_holiday(date(2025, 4, 18)));
    assert!(!calendar.is_holiday(date(2025, 4, 17)));
    assert!(calendar.is_cached());
    assert_eq!(reads.load(Ordering::SeqCst), 1);

    // Editing through source_mut drops the cache, so the edit is seen
    calendar.source_mut().dates.push(date(2025, 4, 17));
    assert!(!calendar.is_cached());
    assert!(calendar.is_holiday(date(2025, 4, 17)));
    assert_eq!(reads.load(Ordering::SeqCst), 2);

    calendar.clear();
    assert!(!calendar.is_cached());
    assert!(!calendar.is_holiday(date(2025, 4, 16)));
    assert_eq!(reads.load(Ordering::SeqCst), 3);
}

#[test]
fn test_required_business_days() {
    assert_eq!(estimate_required_business_days(0, 9), 0);
    assert_eq!(estimate_required_business_days(9, 9), 1);
    assert_eq!(estimate_required_business_days(10, 9), 2);
    assert_eq!(estimate_required_business_days(100, 9), 12);
    assert_eq!(estimate_required_business_days(5, 0), 0);
}

#[test]
fn test_finish_date_estimate() {
    let weekdays = WeekdayCalendar;
    // Monday start, five days ends Friday
    assert_eq!(estimate_finish_date(date(2025, 3, 3), 5, &weekdays), date(2025, 3, 7));
    assert_eq!(estimate_finish_date(date(2025, 3, 3), 6, &weekdays), date(2025, 3, 10));
    // Saturday start counts from Monday
    assert_eq!(estimate_finish_date(date(2025, 3, 8), 1, &weekdays), date(2025, 3, 10));
    assert_eq!(estimate_finish_date(date(2025, 3, 8), 0, &weekdays), date(2025, 3, 8));

    let easter = HolidayCalendar::new(vec![date(2025, 4, 18), date(2025, 4, 21)]);
    // Thu 17th, then Tue 22nd
    assert_eq!(estimate_finish_date(date(2025, 4, 17), 2, &easter), date(2025, 4, 22));
}

#[test]
fn test_holidays_deserialize_with_defaults() {
    let holidays: Vec<Holiday> =
        serde_json::from_str(r#"[{"date": "2025-04-18", "name": "Good Friday"}, {"date": "2025-12-25"}]"#).unwrap();

    assert_eq!(holidays.len(), 2);
    assert_eq!(holidays[0].kind, "General");
    assert_eq!(holidays[1].name, "");
    assert_eq!(holidays[1].date, date(2025, 12, 25));
}
