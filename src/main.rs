//! Command-line entry point for the stock-take planner.

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use stocktake_planner::calendar::{
    estimate_finish_date, estimate_required_business_days, load_holidays, Holiday, HolidayCalendar,
};
use stocktake_planner::config::{CrossRegionPolicy, RailPolicy, SchedulingConfig};
use stocktake_planner::error::ScheduleError;
use stocktake_planner::route::HaversineEstimator;
use stocktake_planner::shop::{load_shops, Region};
use stocktake_planner::tsp::TspStrategy;
use stocktake_planner::utils::{format_duration, format_summary, save_plan_json, save_plan_report, total_solve_time};
use stocktake_planner::StockTakePlanner;

#[derive(Parser)]
#[command(name = "stocktake-planner", version, about = "Plan multi-day shop stock-take routes")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a schedule from a shop list.
    Plan(PlanArgs),
    /// Estimate how many business days a number of shops needs.
    Estimate {
        #[arg(long)]
        shops: usize,
        #[arg(long, default_value_t = 9)]
        shops_per_day: usize,
        #[arg(long)]
        start: NaiveDate,
        /// JSON array of holidays
        #[arg(long)]
        holidays: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct PlanArgs {
    /// JSON array of shop records
    #[arg(long)]
    shops: PathBuf,
    /// First candidate date (YYYY-MM-DD)
    #[arg(long)]
    start: NaiveDate,
    /// JSON configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON array of holidays
    #[arg(long)]
    holidays: Option<PathBuf>,
    #[arg(long)]
    shops_per_day: Option<usize>,
    #[arg(long)]
    groups_per_day: Option<usize>,
    /// Region codes to include (HK, KN, NT, IS, MO)
    #[arg(long, value_delimiter = ',')]
    regions: Vec<String>,
    #[arg(long, value_delimiter = ',')]
    districts: Vec<String>,
    #[arg(long, value_delimiter = ',')]
    brands: Vec<String>,
    #[arg(long, value_enum)]
    rail: Option<RailArg>,
    /// Keep clusters inside one region
    #[arg(long)]
    same_region: bool,
    /// Pack by region and district instead of clustering
    #[arg(long)]
    no_clustering: bool,
    /// Estimate daily travel distance and time
    #[arg(long)]
    distance: bool,
    /// Average travel speed for the estimate, in km/h
    #[arg(long)]
    speed_kmh: Option<f64>,
    #[arg(long, value_enum)]
    solver: Option<SolverArg>,
    /// Per-batch route solve limit in seconds
    #[arg(long)]
    time_limit: Option<u64>,
    /// Write the plan as JSON
    #[arg(long)]
    output: Option<PathBuf>,
    /// Write a human-readable report
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum RailArg {
    Include,
    Exclude,
    Separate,
}

#[derive(Clone, Copy, ValueEnum)]
enum SolverArg {
    Exact,
    LocalSearch,
    Greedy,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Plan(args) => run_plan(args),
        Command::Estimate {
            shops,
            shops_per_day,
            start,
            holidays,
        } => run_estimate(shops, shops_per_day, start, holidays),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn holiday_calendar(path: Option<PathBuf>) -> Result<HolidayCalendar<Vec<Holiday>>, ScheduleError> {
    let holidays = match path {
        Some(path) => load_holidays(path)?,
        None => Vec::new(),
    };
    log::debug!("loaded {} holidays", holidays.len());
    Ok(HolidayCalendar::new(holidays))
}

fn build_config(args: &PlanArgs) -> Result<SchedulingConfig, ScheduleError> {
    let mut config = match &args.config {
        Some(path) => SchedulingConfig::from_file(path)?,
        None => SchedulingConfig::new(args.start),
    };
    config.start_date = args.start;

    if let Some(shops) = args.shops_per_day {
        config = config.with_shops_per_day(shops);
    }
    if let Some(groups) = args.groups_per_day {
        config = config.with_groups_per_day(groups);
    }
    if !args.regions.is_empty() {
        let regions = args
            .regions
            .iter()
            .map(|code| {
                Region::from_code(code)
                    .ok_or_else(|| ScheduleError::InvalidConfig(format!("unknown region code `{}`", code)))
            })
            .collect::<Result<Vec<Region>, ScheduleError>>()?;
        config = config.with_regions(regions);
    }
    if !args.districts.is_empty() {
        config = config.with_districts(args.districts.clone());
    }
    if !args.brands.is_empty() {
        config = config.with_brands(args.brands.clone());
    }
    if let Some(rail) = args.rail {
        config = config.with_rail_policy(match rail {
            RailArg::Include => RailPolicy::Include,
            RailArg::Exclude => RailPolicy::Exclude,
            RailArg::Separate => RailPolicy::Separate,
        });
    }
    if args.same_region {
        config = config.with_cross_region(CrossRegionPolicy::SameRegionOnly);
    }
    if args.no_clustering {
        config = config.with_clustering(false);
    }
    if args.distance {
        config = config.with_distance(true);
    }
    if let Some(solver) = args.solver {
        config = config.with_tsp_strategy(match solver {
            SolverArg::Exact => TspStrategy::Exact,
            SolverArg::LocalSearch => TspStrategy::LocalSearch,
            SolverArg::Greedy => TspStrategy::NearestNeighbor,
        });
    }
    if let Some(seconds) = args.time_limit {
        config = config.with_tsp_time_limit(Duration::from_secs(seconds));
    }

    Ok(config)
}

fn run_plan(args: PlanArgs) -> Result<(), ScheduleError> {
    let config = build_config(&args)?;
    let calendar = holiday_calendar(args.holidays.clone())?;

    log::info!("loading shops from {}", args.shops.display());
    let shops = load_shops(&args.shops)?;

    let mut planner = StockTakePlanner::new(config, calendar);
    if let Some(speed) = args.speed_kmh {
        if !(speed.is_finite() && speed > 0.0) {
            return Err(ScheduleError::InvalidConfig("speed_kmh must be positive".to_string()));
        }
        planner = planner.with_estimator(Box::new(HaversineEstimator::new(speed)));
    }
    let plan = planner.generate(&shops)?;

    println!("{}", format_summary(&plan.result));
    println!("Route solve time: {}", format_duration(total_solve_time(&plan)));

    if let Some(path) = &args.output {
        log::info!("saving plan to {}", path.display());
        save_plan_json(&plan, path)?;
    }
    if let Some(path) = &args.report {
        log::info!("saving report to {}", path.display());
        save_plan_report(&plan, path)?;
    }

    Ok(())
}

fn run_estimate(
    shops: usize,
    shops_per_day: usize,
    start: NaiveDate,
    holidays: Option<PathBuf>,
) -> Result<(), ScheduleError> {
    if shops_per_day == 0 {
        return Err(ScheduleError::InvalidConfig("shops_per_day must be positive".to_string()));
    }
    let calendar = holiday_calendar(holidays)?;
    let days = estimate_required_business_days(shops, shops_per_day);
    let finish = estimate_finish_date(start, days, &calendar);

    println!("Business days required: {}", days);
    println!("Estimated finish date: {}", finish);
    Ok(())
}
