//! # Tide Predictor Application Entry Point
//!
//! Command line front end: loads the configuration and the station snapshot,
//! predicts `window_hours` either side of now and prints the current tide and
//! the upcoming high and low waters.
//!
//! ```text
//! tide-predictor [--config PATH] [--station ID] [--hours N] [--json]
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use anyhow::{bail, Context};
use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};
use std::env;
use std::path::PathBuf;
use tide_predictor_lib::config::Config;
use tide_predictor_lib::predictor::TidePredictor;
use tide_predictor_lib::station::{StationCatalog, StationRepository};
use tide_predictor_lib::TideSeries;
use tracing_subscriber::EnvFilter;

/// Command line overrides of the configuration file.
#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    station: Option<String>,
    hours: Option<i64>,
    json: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args::default();
    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => args.config = Some(iter.next().context("--config needs a path")?.into()),
            "--station" => args.station = Some(iter.next().context("--station needs an id")?),
            "--hours" => {
                let value = iter.next().context("--hours needs a number")?;
                let hours: i64 = value
                    .parse()
                    .with_context(|| format!("invalid --hours value {value}"))?;
                if hours <= 0 {
                    bail!("--hours must be positive");
                }
                args.hours = Some(hours);
            }
            "--json" => args.json = true,
            other => bail!("unknown argument {other}"),
        }
    }
    Ok(args)
}

fn print_table(
    series: &TideSeries,
    name: &str,
    now: DateTime<Utc>,
    current: f64,
    rate: f64,
    utc_offset_minutes: i32,
) {
    let zone = FixedOffset::east_opt(utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix());
    let trend = if rate > 0.0 { "rising" } else { "falling" };

    println!("{name} ({})", series.station_id);
    if series.subordinate {
        println!("  subordinate station, derived from its reference station");
    }
    println!("  now: {current:.2} ft, {trend} {:.2} ft/h", rate.abs());
    println!();
    for extremum in series.extrema.iter().filter(|e| e.time > now) {
        println!(
            "  {:<4}  {}  {:>6.2} ft",
            extremum.kind.label(),
            extremum.time.with_timezone(&zone).format("%a %b %-d %H:%M"),
            extremum.height
        );
    }
    if let Some((low, high)) = series.height_range() {
        println!();
        println!("  range over window: {low:.2} to {high:.2} ft");
    }
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;
    let mut config = match &args.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };
    if let Some(id) = args.station {
        config.station.id = id;
    }
    if let Some(hours) = args.hours {
        config.prediction.window_hours = hours;
    }

    let catalog = StationCatalog::load(&config.station.stations_file).with_context(|| {
        format!(
            "loading stations from {}",
            config.station.stations_file.display()
        )
    })?;
    let station = catalog
        .resolve(&config.station.id)
        .with_context(|| format!("resolving station {}", config.station.id))?;

    let window = config.prediction.window().with_context(|| {
        format!(
            "window of {} hours is too large",
            config.prediction.window_hours
        )
    })?;
    let predictor = TidePredictor::new(config.prediction.settings());
    let now = Utc::now();
    let series = predictor.series_around(&station, now, window)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&series)?);
        return Ok(());
    }

    let current = predictor.height_at(&station, now)?;
    let rate = predictor.rate_at(&station, now)?;
    let info = station.info();
    print_table(&series, &info.name, now, current, rate, info.utc_offset_minutes);

    if series.extrema.is_empty() && window >= Duration::hours(7) {
        tracing::warn!(station = %info.id, "no extrema found in a window longer than a tidal cycle");
    }
    Ok(())
}
