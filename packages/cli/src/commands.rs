//! Implementations of the CLI commands, shared by the flag-driven and
//! interactive front ends.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use feedback_map_analytics::HeatmapView;
use feedback_map_analytics_models::{
    BatchSummary, LegendEntry, RegionWithAggregate, RenderMode, SeverityFilter, VisualEncoding,
};
use feedback_map_config::EngineConfig;
use feedback_map_geography::RegionRegistry;
use feedback_map_geography_models::{Coordinate, ScreenPosition};
use feedback_map_source::{
    AggregateSource, AggregateStore, FileAggregateSource, HttpAggregateSource, RefreshOutcome,
};
use feedback_map_spatial::{HitResolver, HoverListener, spawn_hover_controller};
use serde::Serialize;

/// Loaded configuration and registry.
pub struct Context {
    /// Engine configuration.
    pub config: EngineConfig,
    /// Region registry shared with the hit resolver.
    pub registry: Arc<RegionRegistry>,
}

/// Where to read aggregates from. Falls back to the configured API URL.
#[derive(Debug, Clone, Default)]
pub struct SourceSelection {
    /// Dashboard API base URL.
    pub url: Option<String>,
    /// Saved JSON response to read instead of the API. Takes precedence
    /// over `url`.
    pub file: Option<PathBuf>,
    /// Lookback window in days, or the configured default.
    pub days: Option<u32>,
}

/// Options for [`heatmap`].
#[derive(Debug, Clone)]
pub struct HeatmapOptions {
    /// Where to read aggregates from.
    pub source: SourceSelection,
    /// Render mode for the encodings.
    pub mode: RenderMode,
    /// Case-insensitive region name substring. Empty shows every region.
    pub search: String,
    /// Tier filter applied to the listed rows.
    pub severity: SeverityFilter,
    /// Print JSON instead of a table.
    pub json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HeatmapRow<'a> {
    #[serde(flatten)]
    row: &'a RegionWithAggregate,
    encoding: Option<&'a VisualEncoding>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HeatmapOutput<'a> {
    lookback_days: u32,
    max_count: u64,
    mode: RenderMode,
    regions: Vec<HeatmapRow<'a>>,
    unknown_regions: &'a [String],
}

#[derive(Serialize)]
struct LegendOutput<'a> {
    legend: &'a [LegendEntry],
    summary: &'a BatchSummary,
}

/// Prints the registry.
pub fn list_regions(registry: &RegionRegistry) {
    println!("{} ({} regions)", registry.name(), registry.len());
    println!("{:<20} {:>10} {:>10}", "NAME", "LAT", "LNG");
    println!("{}", "-".repeat(42));
    for region in registry {
        println!("{:<20} {:>10.4} {:>10.4}", region.name, region.lat, region.lng);
    }
}

fn build_source(
    config: &EngineConfig,
    selection: &SourceSelection,
) -> Result<Box<dyn AggregateSource>, Box<dyn std::error::Error>> {
    if let Some(path) = &selection.file {
        return Ok(Box::new(FileAggregateSource::new(path)));
    }
    let url = selection
        .url
        .clone()
        .unwrap_or_else(|| config.aggregate_url.clone());
    Ok(Box::new(HttpAggregateSource::new(url, config.request_timeout())?))
}

/// Fetches a batch and joins it with the registry.
///
/// # Errors
///
/// Returns an error if the source cannot be built or the fetch fails.
pub async fn load_view(
    ctx: &Context,
    selection: &SourceSelection,
) -> Result<HeatmapView, Box<dyn std::error::Error>> {
    let source = build_source(&ctx.config, selection)?;
    let days = selection.days.unwrap_or(ctx.config.lookback_days);

    let store = AggregateStore::new();
    match store.refresh(source.as_ref(), days).await {
        RefreshOutcome::Fresh { regions } => {
            log::debug!("Loaded {regions} regions from {}", source.describe());
        }
        RefreshOutcome::Stale { error } | RefreshOutcome::Unavailable { error } => {
            return Err(error.into());
        }
    }

    let snapshot = store
        .snapshot()
        .ok_or("aggregate store is empty after a successful refresh")?;
    let view = HeatmapView::build(&ctx.registry, &snapshot.batch);

    if !view.unknown_regions().is_empty() {
        log::warn!(
            "Ignoring {} unregistered region(s): {}",
            view.unknown_regions().len(),
            view.unknown_regions().join(", ")
        );
    }
    Ok(view)
}

/// Fetches, classifies, filters, encodes, and prints the heatmap.
///
/// # Errors
///
/// Returns an error if loading fails or JSON serialization fails.
pub async fn heatmap(
    ctx: &Context,
    options: &HeatmapOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let view = load_view(ctx, &options.source).await?;
    let rows = view.project(&options.search, options.severity);
    let encodings = view.encodings(options.mode, &ctx.config.encoder_options());
    let by_region: BTreeMap<&str, &VisualEncoding> =
        encodings.iter().map(|e| (e.region.as_str(), e)).collect();

    if options.json {
        let output = HeatmapOutput {
            lookback_days: view.lookback_days(),
            max_count: view.max_count(),
            mode: options.mode,
            regions: rows
                .iter()
                .map(|row| HeatmapRow {
                    row,
                    encoding: by_region.get(row.name()).copied(),
                })
                .collect(),
            unknown_regions: view.unknown_regions(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if view.is_empty() {
        println!("No data available for the last {} days.", view.lookback_days());
        return Ok(());
    }

    println!(
        "Feedback heatmap: last {} days, mode {}, max count {}",
        view.lookback_days(),
        options.mode,
        view.max_count()
    );
    println!(
        "{:<18} {:>7} {:<10} {:>8} {:>6} {:>7} {:<8} RINGS",
        "REGION", "COUNT", "TIER", "PRIORITY", "NEG%", "RADIUS", "COLOR"
    );
    println!("{}", "-".repeat(80));

    for row in &rows {
        let Some(encoding) = by_region.get(row.name()) else {
            continue;
        };
        println!(
            "{:<18} {:>7} {:<10} {:>8.2} {:>5.0}% {:>7.1} {:<8} {}",
            row.name(),
            row.count(),
            row.tier().label(),
            row.classification.priority_ratio,
            row.classification.negative_ratio * 100.0,
            encoding.radius,
            encoding.fill_color,
            encoding.rings.len()
        );
    }

    if rows.is_empty() {
        println!("No regions match the current filter.");
    }
    Ok(())
}

/// Prints the legend and batch summary.
///
/// # Errors
///
/// Returns an error if loading fails or JSON serialization fails.
pub async fn legend(
    ctx: &Context,
    selection: &SourceSelection,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let view = load_view(ctx, selection).await?;
    let entries = view.legend();
    let summary = view.summary();

    if json {
        let output = LegendOutput {
            legend: &entries,
            summary: &summary,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{:<10} {:<8} {:>7}", "TIER", "COLOR", "REGIONS");
    println!("{}", "-".repeat(27));
    for entry in &entries {
        println!("{:<10} {:<8} {:>7}", entry.label, entry.color, entry.region_count);
    }

    println!();
    println!("Last {} days", summary.lookback_days);
    println!("  Total feedback:    {}", summary.total_feedback);
    println!("  Regions reporting: {}", summary.regions_reporting);
    println!(
        "  Sentiment:         {} positive / {} negative / {} neutral",
        summary.sentiment.positive, summary.sentiment.negative, summary.sentiment.neutral
    );
    if !summary.unknown_regions.is_empty() {
        println!("  Unregistered:      {}", summary.unknown_regions.join(", "));
    }
    Ok(())
}

/// Prints the region nearest to a coordinate.
pub fn resolve(ctx: &Context, coordinate: Coordinate, catchment_km: Option<f64>) {
    let catchment_km = catchment_km.unwrap_or(ctx.config.catchment_km);
    let resolver = HitResolver::new(Arc::clone(&ctx.registry), catchment_km);

    match resolver.resolve(coordinate) {
        Some(hit) => println!("{} ({:.2} km)", hit.region.name, hit.distance_km),
        None => println!("No region within {catchment_km} km"),
    }
}

struct PrintListener {
    started: Instant,
}

impl HoverListener for PrintListener {
    fn on_hover_start(&mut self, region: &str, screen_position: ScreenPosition) {
        println!(
            "{:>6} ms  show {region} at ({}, {})",
            self.started.elapsed().as_millis(),
            screen_position.x,
            screen_position.y
        );
    }

    fn on_hover_end(&mut self) {
        println!("{:>6} ms  hide", self.started.elapsed().as_millis());
    }
}

/// Replays a pointer path through the hover controller, one point every
/// `step`, then leaves the map surface.
pub async fn hover(ctx: &Context, path: &[Coordinate], step: Duration) {
    let resolver = HitResolver::new(Arc::clone(&ctx.registry), ctx.config.catchment_km);
    let handle = spawn_hover_controller(
        resolver,
        ctx.config.hide_delay(),
        PrintListener {
            started: Instant::now(),
        },
    );

    let mut x = 0.0;
    for &coordinate in path {
        handle.pointer_move(coordinate, ScreenPosition::new(x, 0.0));
        x += 10.0;
        tokio::time::sleep(step).await;
    }

    // Let any pending hide fire before leaving.
    tokio::time::sleep(ctx.config.hide_delay()).await;
    handle.pointer_leave();
    handle.shutdown().await;
}

/// Parses `lat,lng`.
///
/// # Errors
///
/// Returns a message if the text is not two comma-separated numbers or
/// the coordinate is out of range.
pub fn parse_coordinate(s: &str) -> Result<Coordinate, String> {
    let (lat, lng) = s
        .split_once(',')
        .ok_or_else(|| format!("expected 'lat,lng', got '{s}'"))?;
    let lat: f64 = lat.trim().parse().map_err(|e| format!("bad latitude '{lat}': {e}"))?;
    let lng: f64 = lng.trim().parse().map_err(|e| format!("bad longitude '{lng}': {e}"))?;

    let coordinate = Coordinate::new(lat, lng);
    if !coordinate.is_valid() {
        return Err(format!("coordinate out of range: {lat},{lng}"));
    }
    Ok(coordinate)
}
