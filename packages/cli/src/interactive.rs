//! Menu-driven front end, used when no subcommand is given.

use dialoguer::{Input, Select};
use feedback_map_analytics_models::{RenderMode, SeverityFilter, SeverityTier};

use crate::commands::{self, Context, HeatmapOptions, SourceSelection};

enum Action {
    Heatmap,
    Legend,
    Regions,
    Resolve,
}

impl Action {
    const ALL: &[Self] = &[Self::Heatmap, Self::Legend, Self::Regions, Self::Resolve];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Heatmap => "Show heatmap",
            Self::Legend => "Show legend and summary",
            Self::Regions => "List regions",
            Self::Resolve => "Find region at a coordinate",
        }
    }
}

/// Prompts for an action and its parameters, then runs it.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected command fails.
pub async fn run(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::Heatmap => {
            let source = prompt_source(ctx)?;
            let mode = prompt_mode()?;
            let search: String = Input::new()
                .with_prompt("Search (blank for all)")
                .allow_empty(true)
                .interact_text()?;
            let severity = prompt_severity()?;

            commands::heatmap(
                ctx,
                &HeatmapOptions {
                    source,
                    mode,
                    search,
                    severity,
                    json: false,
                },
            )
            .await?;
        }
        Action::Legend => {
            let source = prompt_source(ctx)?;
            commands::legend(ctx, &source, false).await?;
        }
        Action::Regions => commands::list_regions(&ctx.registry),
        Action::Resolve => {
            let text: String = Input::new()
                .with_prompt("Coordinate (lat,lng)")
                .validate_with(|s: &String| commands::parse_coordinate(s).map(|_| ()))
                .interact_text()?;
            let coordinate = commands::parse_coordinate(&text)?;
            commands::resolve(ctx, coordinate, None);
        }
    }

    Ok(())
}

fn prompt_source(ctx: &Context) -> Result<SourceSelection, Box<dyn std::error::Error>> {
    let kinds = ["Dashboard API", "JSON file"];
    let kind = Select::new()
        .with_prompt("Aggregate source")
        .items(&kinds)
        .default(0)
        .interact()?;

    let mut selection = SourceSelection::default();
    if kind == 0 {
        let url: String = Input::new()
            .with_prompt("API base URL")
            .default(ctx.config.aggregate_url.clone())
            .interact_text()?;
        selection.url = Some(url);
    } else {
        let path: String = Input::new().with_prompt("JSON file path").interact_text()?;
        selection.file = Some(path.into());
    }

    let days: u32 = Input::new()
        .with_prompt("Lookback days")
        .default(ctx.config.lookback_days)
        .validate_with(|d: &u32| if *d > 0 { Ok(()) } else { Err("must be at least 1") })
        .interact_text()?;
    selection.days = Some(days);

    Ok(selection)
}

fn prompt_mode() -> Result<RenderMode, Box<dyn std::error::Error>> {
    let modes = RenderMode::all();
    let labels: Vec<String> = modes.iter().map(ToString::to_string).collect();
    let idx = Select::new()
        .with_prompt("Render mode")
        .items(&labels)
        .default(0)
        .interact()?;
    Ok(modes[idx])
}

fn prompt_severity() -> Result<SeverityFilter, Box<dyn std::error::Error>> {
    let mut labels = vec!["All"];
    labels.extend(SeverityTier::all().iter().map(|t| t.label()));
    let idx = Select::new()
        .with_prompt("Severity")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(match idx {
        0 => SeverityFilter::All,
        n => SeverityFilter::Tier(SeverityTier::all()[n - 1]),
    })
}
