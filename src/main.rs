use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

mod aggregate;
mod filter;
mod kpi;
mod loader;
mod models;
mod report;

use crate::filter::{CategoryFilter, DateRange};
use crate::models::{DashboardData, HireOutcome, PipelineRecord, TrafficDay};

#[derive(Parser)]
#[command(name = "funnel-dashboard")]
#[command(about = "Recruitment funnel analytics over flat CSV exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the headline KPIs and funnel stages
    Kpis {
        #[command(flatten)]
        sources: SourceArgs,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Write a markdown report
    Report {
        #[command(flatten)]
        sources: SourceArgs,
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Write the full dashboard payload as JSON
    Export {
        #[command(flatten)]
        sources: SourceArgs,
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, default_value = "dashboard.json")]
        out: PathBuf,
    },
}

#[derive(Args, Clone)]
struct SourceArgs {
    /// Daily conversation traffic CSV
    #[arg(long, default_value = "data/traffic.csv")]
    traffic: PathBuf,

    /// Per-candidate pipeline CSV
    #[arg(long, default_value = "data/pipeline.csv")]
    pipeline: PathBuf,
}

#[derive(Args, Clone)]
struct FilterArgs {
    /// First day of the window (YYYY-MM-DD); defaults to the first observed day
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last day of the window, inclusive; defaults to the last observed day
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Employment statuses to include; defaults to all present in the window
    #[arg(long = "status")]
    statuses: Vec<String>,

    /// Genders to include; defaults to all present in the window
    #[arg(long = "gender")]
    genders: Vec<String>,

    /// Hire outcomes to include; defaults to both
    #[arg(long = "outcome", value_enum)]
    outcomes: Vec<HireOutcome>,
}

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Kpis { sources, filters } => {
            let data = run_dashboard(&sources, &filters)?;
            println!("Funnel for {} to {}:", data.start, data.end);
            for stage in &data.funnel {
                println!("- {}: {}", stage.stage, stage.count);
            }
            println!(
                "Scheduling rate {:.1}%, closure rate {:.1}%, avg {:.1} days to close.",
                data.kpis.scheduling_rate, data.kpis.closure_rate, data.kpis.avg_days_to_close
            );
        }
        Commands::Report {
            sources,
            filters,
            out,
        } => {
            let data = run_dashboard(&sources, &filters)?;
            let report = report::build_report(&data);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write report: {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export {
            sources,
            filters,
            out,
        } => {
            let data = run_dashboard(&sources, &filters)?;
            let mut payload =
                serde_json::to_string_pretty(&data).context("failed to serialize dashboard data")?;
            payload.push('\n');
            std::fs::write(&out, payload)
                .with_context(|| format!("failed to write export: {}", out.display()))?;
            println!("Dashboard data written to {}.", out.display());
        }
    }

    Ok(())
}

/// One full render: load, filter, aggregate, reduce. Stateless; every
/// invocation rereads the source files.
fn run_dashboard(sources: &SourceArgs, filters: &FilterArgs) -> Result<DashboardData> {
    let pipeline = loader::load_pipeline(&sources.pipeline)?;
    let traffic = loader::load_traffic(&sources.traffic)?;
    let combined = loader::combine_daily(&traffic, &pipeline);

    let range = resolve_range(filters, &combined);
    let traffic_f = filter::filter_traffic(&combined, range);
    let dated = filter::filter_by_date(&pipeline, range);
    let categories = resolve_categories(filters, &dated);
    let pipeline_f = filter::apply_categories(&dated, &categories);

    let daily_conversations = aggregate::daily_conversations(&traffic_f);
    let daily_scheduled = aggregate::daily_scheduled(&traffic_f);
    let daily_hires = aggregate::daily_hires(&pipeline_f);
    let weekly = aggregate::weekly_evolution(&traffic_f, &pipeline_f);
    let channels = aggregate::channel_closure(&pipeline_f);
    let genders = aggregate::gender_distribution(&pipeline_f);
    let statuses = aggregate::status_breakdown(&pipeline_f);
    let channel_volume = aggregate::channel_volume(&pipeline_f);
    let withdrawal_reasons = aggregate::withdrawal_reasons(&pipeline_f);

    let kpis = kpi::calculate_kpis(&pipeline_f, &daily_conversations);
    let funnel = kpi::funnel_stages(&kpis);

    Ok(DashboardData {
        start: range.start,
        end: range.end,
        kpis,
        funnel,
        daily: traffic_f,
        daily_conversations,
        daily_scheduled,
        daily_hires,
        weekly,
        channels,
        genders,
        statuses,
        channel_volume,
        withdrawal_reasons,
        pipeline: pipeline_f,
    })
}

/// Explicit bounds win; otherwise the observed span of the combined
/// series. With no data and no bounds the window is unbounded, which
/// still admits every undated lead.
fn resolve_range(filters: &FilterArgs, combined: &[TrafficDay]) -> DateRange {
    let observed_start = combined.first().map(|day| day.date);
    let observed_end = combined.last().map(|day| day.date);
    let fallback = DateRange::unbounded();

    DateRange::new(
        filters.start.or(observed_start).unwrap_or(fallback.start),
        filters.end.or(observed_end).unwrap_or(fallback.end),
    )
}

fn resolve_categories(filters: &FilterArgs, dated: &[PipelineRecord]) -> CategoryFilter {
    let mut categories = CategoryFilter::all_present(dated);
    if !filters.statuses.is_empty() {
        categories.statuses = filters
            .statuses
            .iter()
            .map(|status| loader::normalize_category(status))
            .collect();
    }
    if !filters.genders.is_empty() {
        categories.genders = filters
            .genders
            .iter()
            .map(|gender| loader::normalize_category(gender))
            .collect();
    }
    if !filters.outcomes.is_empty() {
        categories.outcomes = filters.outcomes.iter().copied().collect();
    }
    categories
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
