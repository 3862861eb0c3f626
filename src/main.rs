//! CLI entry point for the county education choropleth.
//!
//! Provides subcommands for rendering the map, exporting the per-county
//! classification and printing the legend buckets.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use edu_choropleth::classify::{ColorScale, Thresholds, hex};
use edu_choropleth::config::{self, DEFAULT_OBJECT, MapConfig};
use edu_choropleth::fetch::source_for;
use edu_choropleth::output::{print_json, print_pretty, write_document, write_table};
use edu_choropleth::pipeline::{ChoroplethMap, run};
use edu_choropleth::projection::{Canvas, Projection};
use edu_choropleth::render::{OutputFormat, render};
use edu_choropleth::stats::MapSummary;
use std::ffi::OsStr;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "edu_choropleth")]
#[command(about = "Render U.S. county educational attainment as a choropleth", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Education dataset (file or URL); defaults to $EDUCATION_URL
    #[arg(long, value_name = "FILE_OR_URL")]
    education: Option<String>,

    /// County topology (file or URL); defaults to $TOPOLOGY_URL
    #[arg(long, value_name = "FILE_OR_URL")]
    topology: Option<String>,

    /// Topology object holding the county geometries
    #[arg(long, default_value = DEFAULT_OBJECT)]
    object: String,

    /// Comma-separated bucket thresholds in percent
    #[arg(long, value_delimiter = ',', default_value = "10,20,30,40,50,60,70,80,90,100")]
    thresholds: Vec<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch both datasets and write the choropleth
    Render {
        #[command(flatten)]
        sources: SourceArgs,

        /// Output file
        #[arg(short, long, default_value = "choropleth.svg")]
        output: String,

        /// Output format; inferred from the output extension when omitted
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        #[arg(long, default_value_t = 1200.0)]
        width: f64,

        #[arg(long, default_value_t = 800.0)]
        height: f64,

        #[arg(long, default_value_t = 40.0)]
        padding: f64,

        /// How topology coordinates map to the canvas
        #[arg(long, value_enum, default_value_t = Projection::Identity)]
        projection: Projection,

        /// Heading drawn above the map
        #[arg(long)]
        title: Option<String>,

        /// Sub-heading drawn under the title
        #[arg(long)]
        description: Option<String>,

        /// Optional: also write the classification table to this CSV
        #[arg(long, value_name = "CSV")]
        table: Option<String>,
    },
    /// Fetch both datasets and export the per-county buckets as CSV
    Classify {
        #[command(flatten)]
        sources: SourceArgs,

        /// CSV file to write
        #[arg(short, long, default_value = "classification.csv")]
        output: String,
    },
    /// Print the legend buckets for a threshold list
    Legend {
        /// Comma-separated bucket thresholds in percent
        #[arg(long, value_delimiter = ',', default_value = "10,20,30,40,50,60,70,80,90,100")]
        thresholds: Vec<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/edu_choropleth.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("edu_choropleth.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let result = execute(cli.command).await;
    if let Err(e) = &result {
        error!(error = %format!("{e:#}"), "Fetch or processing failed");
    }
    result
}

async fn execute(command: Commands) -> Result<()> {
    match command {
        Commands::Render {
            sources,
            output,
            format,
            width,
            height,
            padding,
            projection,
            title,
            description,
            table,
        } => {
            let config = MapConfig {
                canvas: Canvas {
                    width,
                    height,
                    padding,
                },
                projection,
                title,
                description,
                ..map_config(&sources)
            };
            let map = load_map(&sources, &config).await?;

            let format = format
                .or_else(|| OutputFormat::from_path(&output))
                .unwrap_or_default();
            write_document(&output, &render(&map, format))?;

            if let Some(table) = table {
                let rows = write_table(&table, &map)?;
                info!(path = %table, rows, "Classification table written");
            }

            report(&map)?;
        }
        Commands::Classify { sources, output } => {
            let map = load_map(&sources, &map_config(&sources)).await?;
            let rows = write_table(&output, &map)?;
            info!(path = %output, rows, "Classification table written");
            report(&map)?;
        }
        Commands::Legend { thresholds } => {
            let scale = ColorScale::blues(Thresholds::new(thresholds)?)?;

            for entry in scale.legend() {
                let range = match (entry.lower, entry.upper) {
                    (None, Some(upper)) => format!("< {upper}%"),
                    (Some(lower), Some(upper)) => format!("{lower}%-{upper}%"),
                    (Some(lower), None) => format!(">= {lower}%"),
                    (None, None) => "all values".to_string(),
                };
                info!(
                    bucket = entry.bucket,
                    range = %range,
                    color = %hex(entry.color),
                    label = %entry.label,
                    "Legend bucket"
                );
            }
        }
    }

    Ok(())
}

fn map_config(sources: &SourceArgs) -> MapConfig {
    MapConfig {
        object: sources.object.clone(),
        thresholds: sources.thresholds.clone(),
        ..MapConfig::default()
    }
}

/// Resolves both locators and runs the pipeline.
#[tracing::instrument(skip_all)]
async fn load_map(sources: &SourceArgs, config: &MapConfig) -> Result<ChoroplethMap> {
    let education = sources
        .education
        .clone()
        .unwrap_or_else(config::education_locator);
    let topology = sources
        .topology
        .clone()
        .unwrap_or_else(config::topology_locator);
    info!(education = %education, topology = %topology, "Loading datasets");

    let education_src = source_for(&education);
    let topology_src = source_for(&topology);
    run(education_src.as_ref(), topology_src.as_ref(), config).await
}

fn report(map: &ChoroplethMap) -> Result<()> {
    let summary = MapSummary::from_map(map);
    print_pretty(&summary);
    info!(
        geometries = summary.geometries,
        match_pct = summary.match_pct(),
        min_pct = summary.min_pct,
        max_pct = summary.max_pct,
        "Classification summary"
    );
    print_json(&summary)
}
