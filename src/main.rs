use clap::{Parser, Subcommand};
use tracing::error;

mod config;
mod constants;
mod error;
mod fetch;
mod logging;
mod pipeline;
mod storage;
mod transform;
mod types;

use crate::config::PipelineConfig;
use crate::fetch::Fetcher;
use crate::pipeline::PipelineRunSummary;
use crate::storage::{SqliteStorage, Storage};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "health_etl")]
#[command(about = "ETL pipeline for CDC public health datasets")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the SQLite database file
    #[arg(long, default_value = constants::DEFAULT_DB_PATH)]
    db_path: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the COVID-19 case-count pipeline
    Cases,
    /// Run the county vaccination pipeline
    Vaccinations,
    /// Run both pipelines sequentially
    Run,
    /// Report the states with the highest total case counts
    TopStates {
        /// Number of states to report
        #[arg(long, default_value_t = constants::TOP_STATES_LIMIT)]
        limit: u32,
    },
}

fn print_summary(summary: &PipelineRunSummary) {
    println!("📊 Loaded table '{}'", summary.table);
    println!("   Fetched records: {}", summary.fetched);
    println!("   Loaded records:  {}", summary.loaded);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _log_guard = logging::init_logging();

    let cli = Cli::parse();
    let storage: Arc<dyn Storage> = Arc::new(SqliteStorage::new(&cli.db_path));

    match cli.command {
        Commands::Cases => {
            let fetcher = Fetcher::new()?;
            let summary =
                pipeline::run_cases(&fetcher, &storage, &PipelineConfig::cases()).await?;
            print_summary(&summary);
        }
        Commands::Vaccinations => {
            let fetcher = Fetcher::new()?;
            let summary =
                pipeline::run_vaccinations(&fetcher, &storage, &PipelineConfig::vaccinations())
                    .await?;
            print_summary(&summary);
        }
        Commands::Run => {
            let fetcher = Fetcher::new()?;
            match pipeline::run_cases(&fetcher, &storage, &PipelineConfig::cases()).await {
                Ok(summary) => print_summary(&summary),
                Err(e) => {
                    error!("case pipeline failed: {}", e);
                    return Err(e.into());
                }
            }
            match pipeline::run_vaccinations(&fetcher, &storage, &PipelineConfig::vaccinations())
                .await
            {
                Ok(summary) => print_summary(&summary),
                Err(e) => {
                    error!("vaccination pipeline failed: {}", e);
                    return Err(e.into());
                }
            }
        }
        Commands::TopStates { limit } => {
            let totals = storage
                .top_states_by_cases(constants::CASES_TABLE, limit)
                .await?;
            for total in totals {
                println!("{}: {} cases", total.state, total.total_cases);
            }
        }
    }

    Ok(())
}
