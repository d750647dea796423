//! Reporting helpers for generated plans.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use crate::error::ScheduleError;
use crate::schedule::{SchedulePlan, ScheduleResult};

/// Format a duration as hours, minutes, and seconds.
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}h {:02}m {:02}s", hours, minutes, seconds)
}

/// Save a plan as pretty-printed JSON.
pub fn save_plan_json<P: AsRef<Path>>(plan: &SchedulePlan, path: P) -> Result<(), ScheduleError> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, plan)?;
    Ok(())
}

/// Write a human-readable day-by-day report.
pub fn write_plan_report<W: Write>(plan: &SchedulePlan, out: &mut W) -> std::io::Result<()> {
    writeln!(out, "{}", format_summary(&plan.result))?;
    writeln!(out)?;

    for date in plan.dates() {
        let day = plan.assignments_on(date);
        writeln!(out, "{} ({} shops)", date.format("%Y-%m-%d %a"), day.len())?;

        let mut groups: Vec<usize> = day.iter().map(|a| a.group).collect();
        groups.sort_unstable();
        groups.dedup();

        for group in groups {
            match plan.route_for(date, group) {
                Some(route) => {
                    writeln!(out, "  Group {}: {}", group, route.shop_ids.join(" -> "))?;
                    writeln!(out, "    Distance: {:.2} km", route.distance_km)?;
                }
                None => {
                    let ids: Vec<&str> = day
                        .iter()
                        .filter(|a| a.group == group)
                        .map(|a| a.shop_id.as_str())
                        .collect();
                    writeln!(out, "  Group {}: {}", group, ids.join(", "))?;
                }
            }
        }
        writeln!(out)?;
    }

    Ok(())
}

/// Save the human-readable report to a file.
pub fn save_plan_report<P: AsRef<Path>>(plan: &SchedulePlan, path: P) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_plan_report(plan, &mut writer)?;
    writer.flush()
}

/// Format the run summary.
pub fn format_summary(result: &ScheduleResult) -> String {
    let regions: Vec<String> = result
        .region_counts
        .iter()
        .map(|(region, count)| format!("{}={}", region, count))
        .collect();

    let mut summary = format!(
        "Schedule Summary:
- Shops: {}
- Business Days: {}
- Start Date: {}
- Finish Date: {}
- Avg Daily Distance: {:.2} km
- Avg Daily Travel: {:.2} h
- Regions: {}
- Shops Without Coordinates: {}",
        result.total_shops,
        result.business_days,
        result.start_date,
        result.finish_date,
        result.avg_daily_distance_km,
        result.avg_daily_travel_hours,
        regions.join(", "),
        result.unlocated_shops,
    );

    if let Some(quality) = &result.cluster_quality {
        summary.push('\n');
        summary.push_str(&quality.to_string());
    }

    summary
}

/// Total time spent ordering routes.
pub fn total_solve_time(plan: &SchedulePlan) -> Duration {
    plan.route_orders.iter().map(|route| route.solve_time).sum()
}
