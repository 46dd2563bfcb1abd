use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

mod aggregate;
mod clean;
mod error;
mod interaction;
mod loader;
mod models;
mod report;
mod state;
mod zoom;

use aggregate::{AggregateOptions, YearRange};
use models::Dimension;
use state::{ChartState, UiEvent};

const CSV_ENV: &str = "COLLISIONS_CSV";
const DEFAULT_CSV: &str = "Motor_Vehicle_Collisions_2020-2024.csv";

#[derive(Parser)]
#[command(name = "collision-trends")]
#[command(about = "Monthly NYC motor vehicle collision trends by year or vehicle type", long_about = None)]
struct Cli {
    /// Collision export to read (falls back to $COLLISIONS_CSV)
    #[arg(long, global = true)]
    csv: Option<PathBuf>,
    #[arg(long, global = true, default_value_t = 2020)]
    from_year: i32,
    #[arg(long, global = true, default_value_t = 2024)]
    to_year: i32,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ViewArgs {
    #[arg(long, value_enum, default_value_t = Dimension::Year)]
    view: Dimension,
    /// Number of vehicle types charted in the vehicle view
    #[arg(long, default_value_t = 8)]
    top: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the month-by-month series
    Series {
        #[command(flatten)]
        view: ViewArgs,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        view: ViewArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Drive hover and zoom from stdin, one event per line
    Explore {
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Filter a raw export down to chartable rows
    Clean {
        #[arg(long, default_value = "cleaned.csv")]
        out: PathBuf,
    },
}

fn csv_path(cli: &Cli) -> PathBuf {
    cli.csv
        .clone()
        .or_else(|| std::env::var_os(CSV_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CSV))
}

async fn load_chart(
    path: &std::path::Path,
    years: YearRange,
    view: &ViewArgs,
) -> Result<aggregate::Chart, error::LoadError> {
    let rows = loader::load_rows(path).await?;
    let options = AggregateOptions {
        dimension: view.view,
        years,
        top_n: view.top,
    };
    Ok(aggregate::aggregate(&rows, &options))
}

fn explore(mut chart_state: ChartState) -> anyhow::Result<()> {
    let dimension = chart_state.chart().dimension;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write!(out, "{}", chart_state.frame(None))?;

    for line in std::io::stdin().lock().lines() {
        let line = line.context("failed to read event from stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        if matches!(line.trim(), "quit" | "exit") {
            break;
        }
        match UiEvent::parse(&line, dimension) {
            Ok(event) => {
                let frame = chart_state.apply(event);
                debug!(state = ?chart_state.controller().state(), "applied event");
                writeln!(out, "---")?;
                write!(out, "{frame}")?;
            }
            Err(err) => warn!("skipping event: {err:#}"),
        }
    }

    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let path = csv_path(&cli);
    let years = YearRange::new(cli.from_year, cli.to_year);

    match &cli.command {
        Commands::Series { view, json } => {
            let chart = load_chart(&path, years, view).await?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&chart.series)?);
            } else {
                print!("{}", report::series_table(&chart));
            }
        }
        Commands::Report { view, out } => {
            let chart = load_chart(&path, years, view).await?;
            let report = report::build_report(&chart, &years, &path.display().to_string());
            std::fs::write(out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Explore { view } => {
            let chart = load_chart(&path, years, view).await?;
            explore(ChartState::mount(chart))?;
        }
        Commands::Clean { out } => {
            let source = std::fs::File::open(&path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            let sink = std::fs::File::create(out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            let stats = clean::clean(source, sink, &years)?;
            println!(
                "Kept {} of {} rows in {}.",
                stats.kept,
                stats.read,
                out.display()
            );
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("collision_trends=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<error::LoadError>() {
                Some(load_error) => eprintln!("Error loading collision data: {load_error}"),
                None => error!("{err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}
