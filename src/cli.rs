//! CLI module for the market snapshot pipeline
//!
//! Each stage is its own subcommand so a scheduler can sequence them and
//! retry them independently; `run` chains both for a single partition.

use clap::{Parser, Subcommand};
use tracing::info;

use crate::{
    configuration::{get_configuration, set_configuration, Config, Stage},
    error::Error,
    handler::{extract, load, run_pipeline, PipelineReport, RetryPolicy},
    helpers::Partition,
    provider::{DatabasePool, S3Storage, HTTP},
    types::BlobLocation,
};

/// Crypto market snapshot ETL
#[derive(Parser)]
#[command(name = "crypto-etl")]
#[command(about = "Daily market snapshots: API to object store to PostgreSQL", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the ranked market list and store it under the partition key
    Extract {
        /// Partition date (YYYY-MM-DD), defaults to today in local time
        #[arg(long)]
        date: Option<Partition>,
    },

    /// Replace the raw_markets table with the partition's stored snapshot
    Load {
        /// Partition date (YYYY-MM-DD), defaults to today in local time
        #[arg(long)]
        date: Option<Partition>,
    },

    /// Extract then load one partition, retrying each failed stage
    Run {
        /// Partition date (YYYY-MM-DD), defaults to today in local time
        #[arg(long)]
        date: Option<Partition>,
    },
}

impl Commands {
    pub fn stage(&self) -> Stage {
        match self {
            Commands::Extract { .. } => Stage::Extract,
            Commands::Load { .. } => Stage::Load,
            Commands::Run { .. } => Stage::Run,
        }
    }

    pub fn partition(&self) -> Partition {
        let date = match self {
            Commands::Extract { date }
            | Commands::Load { date }
            | Commands::Run { date } => date,
        };

        date.unwrap_or_else(Partition::today)
    }
}

/// Initialize configuration for the stage about to run
pub fn init_config(stage: Stage) -> Result<Config, Error> {
    set_configuration()?;
    get_configuration(stage)
}

pub async fn run(cli: Cli) -> Result<(), Error> {
    let stage = cli.command.stage();
    let partition = cli.command.partition();
    let config = init_config(stage)?;

    info!("Running {} for partition {}", stage, partition);

    match stage {
        Stage::Extract => {
            run_extract(&config, partition).await?;
        },
        Stage::Load => {
            run_load(&config, partition).await?;
        },
        Stage::Run => {
            let report = run_all(&config, partition).await?;
            info!(
                "Partition {} {}: {} records extracted, {} rows loaded",
                report.partition, report.state, report.location.records, report.rows
            );
        },
    }

    Ok(())
}

pub async fn run_extract(
    config: &Config,
    partition: Partition,
) -> Result<BlobLocation, Error> {
    let http = HTTP::new(config)?;
    let storage = S3Storage::new(&config.storage).await;

    extract(&http, &storage, partition).await
}

pub async fn run_load(config: &Config, partition: Partition) -> Result<u64, Error> {
    let database = DatabasePool::new(config.database()?);
    let storage = S3Storage::new(&config.storage).await;

    let result = load(&storage, &database, partition).await;
    database.close().await;

    result
}

pub async fn run_all(
    config: &Config,
    partition: Partition,
) -> Result<PipelineReport, Error> {
    let http = HTTP::new(config)?;
    let database = DatabasePool::new(config.database()?);
    let storage = S3Storage::new(&config.storage).await;

    let result = run_pipeline(
        &http,
        &storage,
        &database,
        partition,
        RetryPolicy::new(config),
    )
    .await;
    database.close().await;

    result
}
