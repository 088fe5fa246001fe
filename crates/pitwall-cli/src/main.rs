//! PitWall terminal display
//!
//! Thin consumer of the core's published state: spawns the refresh loop and
//! redraws a ranked table whenever a new state is published. All logic lives
//! in `pitwall-core`; this binary only renders.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pitwall_core::demo::DemoFeed;
use pitwall_core::feed::{FeedEndpoints, HttpFeedSource};
use pitwall_core::model::{format_delta, format_lap_time, BoolEncoding, DeltaConvention};
use pitwall_core::refresh::{LeaderboardState, RefreshConfig, RefreshLoop};
use pitwall_core::standings::Trend;

#[derive(Debug, Parser)]
#[command(name = "pitwall", version, about = "Live race leaderboard in the terminal")]
struct Args {
    /// Race metadata feed URL
    #[arg(long)]
    metadata_url: Option<String>,

    /// Leaderboard feed URL
    #[arg(long)]
    leaderboard_url: Option<String>,

    /// JSON config file with feed URLs and refresh settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seconds between refresh cycles
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Run against the built-in race simulator instead of real feeds
    #[arg(long)]
    demo: bool,

    /// How to render a negative delta (two feed conventions exist)
    #[arg(long, value_enum, default_value = "seconds")]
    delta_format: DeltaFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DeltaFormat {
    /// Negative delta is seconds ahead of the leader
    Seconds,
    /// Negative delta is a number of laps down
    Laps,
}

impl From<DeltaFormat> for DeltaConvention {
    fn from(format: DeltaFormat) -> Self {
        match format {
            DeltaFormat::Seconds => DeltaConvention::SecondsGap,
            DeltaFormat::Laps => DeltaConvention::LapsDown,
        }
    }
}

/// Shape of the optional JSON config file.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    race_metadata_url: Option<String>,
    #[serde(default)]
    leaderboard_url: Option<String>,
    #[serde(default)]
    interval_secs: Option<u64>,
    #[serde(default)]
    bool_encoding: Option<BoolEncoding>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let file = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            serde_json::from_str::<FileConfig>(&text)
                .with_context(|| format!("parsing config file {}", path.display()))?
        }
        None => FileConfig::default(),
    };

    let mut config = RefreshConfig::default();
    if let Some(secs) = file.interval_secs {
        config.interval_secs = secs;
    }
    if let Some(encoding) = file.bool_encoding {
        config.bool_encoding = encoding;
    }
    if let Some(secs) = args.interval_secs {
        config.interval_secs = secs;
    }

    let convention: DeltaConvention = args.delta_format.into();
    info!(
        interval_secs = config.interval_secs,
        demo = args.demo,
        "starting refresh loop"
    );

    let handle = if args.demo {
        RefreshLoop::new(DemoFeed::new(), config).spawn()
    } else {
        let race_metadata = args.metadata_url.or(file.race_metadata_url);
        let leaderboard = args.leaderboard_url.or(file.leaderboard_url);
        let (Some(race_metadata), Some(leaderboard)) = (race_metadata, leaderboard) else {
            bail!(
                "feed URLs are required unless --demo is set \
                 (use --metadata-url/--leaderboard-url or --config)"
            );
        };
        let endpoints = FeedEndpoints {
            race_metadata,
            leaderboard,
        };
        let source = HttpFeedSource::new(endpoints).context("building HTTP feed client")?;
        RefreshLoop::new(source, config).spawn()
    };

    let mut states = handle.states();
    loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                render(&state, convention);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    info!("shutting down");
    handle.shutdown().await;
    Ok(())
}

fn render(state: &LeaderboardState, convention: DeltaConvention) {
    // Clear the screen and home the cursor
    print!("\x1b[2J\x1b[H");

    match &state.race {
        Some(race) => {
            println!(
                "{}  |  Series {}  |  {}",
                race.run_name, race.series_id, race.track_name
            );
            println!(
                "{}  |  Lap {} / {}",
                race.flag_state.display_name(),
                race.lap_number,
                race.laps_in_race
            );
        }
        None => println!("Waiting for race data..."),
    }

    if let Some(error) = &state.last_error {
        println!();
        println!("  ! {error}");
        return;
    }

    println!();
    println!(
        "{:>3}  {:<5} {:>4}  {:<22} {:<4} {:>9} {:>9}  STATUS",
        "POS", "MOVE", "CAR", "DRIVER", "MFR", "LAST LAP", "DELTA"
    );
    for driver in &state.snapshot {
        let change = state.position_change(driver).signed();
        let movement = match Trend::from_signed(change) {
            Trend::Improved => format!("^ +{change}"),
            Trend::Worsened => format!("v {change}"),
            Trend::Unchanged => "-".to_string(),
        };
        let status = match (driver.is_on_track, driver.is_on_dvp) {
            (true, true) => "ON DVP",
            (true, false) => "ON",
            (false, true) => "OFF DVP",
            (false, false) => "OFF",
        };
        println!(
            "{:>3}  {:<5} {:>4}  {:<22} {:<4} {:>9} {:>9}  {}",
            driver.running_position,
            movement,
            driver.vehicle_number,
            driver.full_name,
            driver.vehicle_manufacturer,
            format_lap_time(driver.last_lap_time),
            format_delta(driver.delta, convention),
            status,
        );
    }
}
