use std::path::PathBuf;

use absence_analytics::report::{format_currency, format_month, format_percent};
use absence_analytics::session::{Dashboard, RefreshOutcome};
use absence_analytics::{loader, report, AnalyticsConfig, FilterSpec, SeriesName};
use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "absence-analytics")]
#[command(about = "Absenteeism indicators and charts data for employee absence records", long_about = None)]
struct Cli {
    /// TOML file with wage and ranking settings
    #[arg(long, global = true, env = "ABSENCE_ANALYTICS_CONFIG")]
    config: Option<PathBuf>,

    /// Log pipeline stages to stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Sources {
    /// Employee records (JSON array or CSV)
    #[arg(long)]
    employees: PathBuf,
    /// Absence records (JSON array or CSV)
    #[arg(long)]
    absences: PathBuf,
}

#[derive(Args)]
struct Filters {
    /// First day of the window, defaults to three months ago
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Last day of the window, defaults to today
    #[arg(long)]
    end: Option<NaiveDate>,
    #[arg(long)]
    unit: Option<String>,
    #[arg(long)]
    department: Option<String>,
    #[arg(long)]
    situation: Option<String>,
}

impl From<Filters> for FilterSpec {
    fn from(filters: Filters) -> Self {
        FilterSpec {
            start_date: filters.start,
            end_date: filters.end,
            unit: filters.unit,
            department: filters.department,
            situation: filters.situation,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print headline indicators and top rows
    Summary {
        #[command(flatten)]
        sources: Sources,
        #[command(flatten)]
        filters: Filters,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        sources: Sources,
        #[command(flatten)]
        filters: Filters,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Print metrics and series as JSON
    Json {
        #[command(flatten)]
        sources: Sources,
        #[command(flatten)]
        filters: Filters,
    },
    /// List the values available for each filter
    Options {
        #[command(flatten)]
        sources: Sources,
    },
}

/// Installs the stderr subscriber; `--debug` forces debug level.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_dashboard(
    dashboard: &Dashboard,
    sources: &Sources,
    spec: &FilterSpec,
) -> anyhow::Result<std::sync::Arc<absence_analytics::DashboardResult>> {
    let outcome = dashboard
        .refresh(spec, loader::load_snapshot(&sources.employees, &sources.absences))
        .await
        .context("failed to build dashboard")?;

    match outcome {
        RefreshOutcome::Published(result) => Ok(result),
        RefreshOutcome::Superseded => anyhow::bail!("dashboard run was superseded"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = match &cli.config {
        Some(path) => AnalyticsConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AnalyticsConfig::default(),
    };
    let dashboard = Dashboard::new(config);

    match cli.command {
        Commands::Summary {
            sources,
            filters,
            limit,
        } => {
            let spec = FilterSpec::from(filters);
            let result = run_dashboard(&dashboard, &sources, &spec).await?;
            let metrics = &result.metrics;

            println!(
                "Absences from {} to {}",
                result.window.start, result.window.end
            );
            println!(
                "Absenteeism rate {} across {} employees and {} certificates",
                format_percent(metrics.absenteeism_rate),
                metrics.total_employees,
                metrics.total_absence_events
            );
            println!(
                "{} days off ({} hours) costing {} ({} of payroll)",
                metrics.total_days_off,
                metrics.total_hours_off,
                format_currency(metrics.cost),
                format_percent(metrics.cost_percentage_of_payroll)
            );
            println!(
                "Savings at 10/20/30%: {} / {} / {}",
                format_currency(metrics.savings10),
                format_currency(metrics.savings20),
                format_currency(metrics.savings30)
            );

            for name in SeriesName::ALL {
                let rows = result.series.get(name);
                if rows.is_empty() {
                    continue;
                }
                println!();
                println!("{}:", name.title());
                for row in rows.iter().take(limit) {
                    let label = match name {
                        SeriesName::ByMonth => format_month(&row.label),
                        _ => row.label.clone(),
                    };
                    let measure = match name {
                        SeriesName::CostBySector => format_currency(row.primary_measure),
                        _ => row.primary_measure.to_string(),
                    };
                    println!("- {label}: {measure}");
                }
            }
        }
        Commands::Report {
            sources,
            filters,
            out,
        } => {
            let spec = FilterSpec::from(filters);
            let result = run_dashboard(&dashboard, &sources, &spec).await?;
            let report = report::build_report(&spec, &result);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Json { sources, filters } => {
            let spec = FilterSpec::from(filters);
            let result = run_dashboard(&dashboard, &sources, &spec).await?;
            println!("{}", serde_json::to_string_pretty(result.as_ref())?);
        }
        Commands::Options { sources } => {
            let store = loader::load_snapshot(&sources.employees, &sources.absences).await?;
            println!("{}", serde_json::to_string_pretty(&store.filter_options())?);
        }
    }

    Ok(())
}
