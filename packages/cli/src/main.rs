#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the feedback map engine.
//!
//! Fetches per-region feedback aggregates, classifies them, and prints the
//! visual encodings, legend, and summary a map renderer would draw. Without
//! a subcommand an interactive menu is shown.

mod commands;
mod interactive;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use feedback_map_analytics_models::{RenderMode, SeverityFilter};
use feedback_map_config::EngineConfig;
use feedback_map_geography::RegionRegistry;
use feedback_map_geography_models::Coordinate;

use crate::commands::{Context, HeatmapOptions, SourceSelection};

#[derive(Parser)]
#[command(name = "feedback_map", about = "Regional feedback heatmap engine")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct SourceArgs {
    /// Dashboard API base URL (defaults to `aggregate_url` from config)
    #[arg(long, conflicts_with = "file")]
    url: Option<String>,
    /// Read aggregates from a saved JSON response instead of the API
    #[arg(long)]
    file: Option<PathBuf>,
    /// Lookback window in days (defaults to `lookback_days` from config)
    #[arg(long)]
    days: Option<u32>,
}

impl From<SourceArgs> for SourceSelection {
    fn from(args: SourceArgs) -> Self {
        Self {
            url: args.url,
            file: args.file,
            days: args.days,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the registered regions
    Regions,
    /// Fetch, classify, and print the heatmap
    Heatmap {
        #[command(flatten)]
        source: SourceArgs,
        /// Render mode: heat, choropleth, cluster, or pulse
        #[arg(long, default_value = "heat")]
        mode: RenderMode,
        /// Case-insensitive region name filter
        #[arg(long, default_value = "")]
        search: String,
        /// Severity tier to show (e.g. "critical"), or "all"
        #[arg(long, default_value = "all")]
        severity: SeverityFilter,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the legend and batch summary
    Legend {
        #[command(flatten)]
        source: SourceArgs,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Find the region nearest to a coordinate
    Resolve {
        /// Latitude in degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in degrees
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Catchment radius in km (defaults to `catchment_km` from config)
        #[arg(long)]
        catchment_km: Option<f64>,
    },
    /// Replay a pointer path through the hover controller
    Hover {
        /// Pointer position as "lat,lng"; repeat for a path
        #[arg(
            long = "point",
            required = true,
            allow_hyphen_values = true,
            value_parser = commands::parse_coordinate
        )]
        points: Vec<Coordinate>,
        /// Milliseconds between pointer moves
        #[arg(long, default_value = "50")]
        step_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = EngineConfig::load(cli.config.as_deref())?;
    log::debug!("Using config: {config:?}");

    let ctx = Context {
        config,
        registry: Arc::new(RegionRegistry::kenya()),
    };

    let Some(command) = cli.command else {
        return interactive::run(&ctx).await;
    };

    match command {
        Commands::Regions => commands::list_regions(&ctx.registry),
        Commands::Heatmap {
            source,
            mode,
            search,
            severity,
            json,
        } => {
            commands::heatmap(
                &ctx,
                &HeatmapOptions {
                    source: source.into(),
                    mode,
                    search,
                    severity,
                    json,
                },
            )
            .await?;
        }
        Commands::Legend { source, json } => {
            commands::legend(&ctx, &source.into(), json).await?;
        }
        Commands::Resolve {
            lat,
            lng,
            catchment_km,
        } => {
            let coordinate = Coordinate::new(lat, lng);
            if !coordinate.is_valid() {
                return Err(format!("coordinate out of range: {lat},{lng}").into());
            }
            commands::resolve(&ctx, coordinate, catchment_km);
        }
        Commands::Hover { points, step_ms } => {
            commands::hover(&ctx, &points, Duration::from_millis(step_ms)).await;
        }
    }

    Ok(())
}
