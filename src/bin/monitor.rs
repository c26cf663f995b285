//! Monitoring CLI for the prediction event log
//!
//! Reads the same configuration as the server and works directly against
//! the event store and the model directory.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use housing_sentinel::application::monitoring::prediction_stats::{
    lookback_start, prediction_stats,
};
use housing_sentinel::application::system::Application;
use housing_sentinel::config::Config;
use housing_sentinel::domain::monitoring::baseline::{BaselineDistribution, DEFAULT_BUCKETS};
use housing_sentinel::domain::monitoring::event::EventFilter;
use housing_sentinel::infrastructure::export::{ExportFormat, export_events};
use housing_sentinel::infrastructure::ml::model_store::write_baseline;
use housing_sentinel::infrastructure::ml::training_data::read_training_csv;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about = "Prediction monitoring tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute and print the current health snapshot
    Health,
    /// Prediction volume and output statistics
    Stats {
        /// Number of days to look back
        #[arg(short, long, default_value = "7")]
        days: i64,
    },
    /// Export logged events to a file
    Export {
        /// Output format (csv, json)
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// Directory the export is written to
        #[arg(short, long, default_value = "exports")]
        out_dir: PathBuf,

        /// Only events from the last N days
        #[arg(short, long)]
        days: Option<i64>,
    },
    /// Capture a drift baseline into the model directory
    Baseline {
        /// Training CSV (wire-named columns, optional MedHouseVal target)
        #[arg(long, conflicts_with = "events")]
        csv: Option<PathBuf>,

        /// Use the most recent N logged events as the reference
        #[arg(long)]
        events: Option<usize>,

        /// Histogram buckets per feature
        #[arg(short, long, default_value_t = DEFAULT_BUCKETS)]
        buckets: usize,
    },
    /// Delete events older than N days
    Purge {
        #[arg(long)]
        older_than_days: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so command output stays pipeable
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let app = Application::build(config.clone()).await?;

    match cli.command {
        Commands::Health => {
            let snapshot = app.monitor().refresh().await?;
            println!("{}", serde_json::to_string_pretty(snapshot.as_ref())?);
        }
        Commands::Stats { days } => {
            if days < 1 {
                bail!("--days must be at least 1");
            }
            if lookback_start(Utc::now(), days).is_none() {
                bail!("--days {} is out of range", days);
            }
            let stats = prediction_stats(&app.recorder(), days, Utc::now()).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Export {
            format,
            out_dir,
            days,
        } => {
            let format = ExportFormat::from_str(&format)?;
            let filter = match days {
                Some(days) => match lookback_start(Utc::now(), days) {
                    Some(since) => EventFilter::all().since(since),
                    None => bail!("--days {} is out of range", days),
                },
                None => EventFilter::all(),
            };
            let events = app.recorder().collect(filter).await?;
            match export_events(&events, format, &out_dir)? {
                Some(path) => println!("{}", path.display()),
                None => info!("No events to export"),
            }
        }
        Commands::Baseline {
            csv,
            events,
            buckets,
        } => {
            let baseline = match (csv, events) {
                (Some(path), _) => {
                    let (rows, targets) = read_training_csv(&path)?;
                    if rows.is_empty() {
                        bail!("{} holds no rows", path.display());
                    }
                    BaselineDistribution::from_rows(
                        &rows,
                        &targets,
                        buckets,
                        format!("training csv {}", path.display()),
                    )
                }
                (None, Some(count)) => {
                    let reference = app
                        .recorder()
                        .collect(EventFilter::all().latest(count))
                        .await?;
                    if reference.is_empty() {
                        bail!("The event log is empty");
                    }
                    BaselineDistribution::from_events(&reference, buckets)
                }
                (None, None) => bail!("Pass either --csv <file> or --events <count>"),
            };

            let path = write_baseline(&config.serving.model_dir, &baseline)
                .context("Failed to write baseline")?;
            info!(
                "Baseline with {} features written to {}",
                baseline.features.len(),
                path.display()
            );
            println!("{}", path.display());
        }
        Commands::Purge { older_than_days } => {
            let Some(cutoff) = lookback_start(Utc::now(), older_than_days) else {
                bail!("--older-than-days {} is out of range", older_than_days);
            };
            let deleted = app.event_repository().purge_before(cutoff).await?;
            println!("Deleted {} events older than {}", deleted, cutoff.to_rfc3339());
        }
    }

    Ok(())
}
