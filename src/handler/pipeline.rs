use std::{fmt, future::Future, time::Duration};

use tokio::time;
use tracing::{error, info, warn};

use crate::{
    configuration::Config,
    error::Error,
    handler::{extract, load},
    helpers::Partition,
    provider::{BlobStore, Warehouse, HTTP},
    types::BlobLocation,
};

/// Progress of one partition through the two stages. There is no partially
/// loaded state: a load either commits every row or none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Pending,
    Extracted,
    Loaded,
    ExtractFailed,
    LoadFailed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PipelineState::Pending => write!(f, "PENDING"),
            PipelineState::Extracted => write!(f, "EXTRACTED"),
            PipelineState::Loaded => write!(f, "LOADED"),
            PipelineState::ExtractFailed => write!(f, "EXTRACT_FAILED"),
            PipelineState::LoadFailed => write!(f, "LOAD_FAILED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(config: &Config) -> RetryPolicy {
        RetryPolicy {
            retries: config.retries,
            delay: Duration::from_secs(config.retry_delay),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub partition: Partition,
    pub state: PipelineState,
    pub location: BlobLocation,
    pub rows: u64,
}

/// Runs `task` until it succeeds or has failed `policy.retries + 1` times,
/// sleeping `policy.delay` between attempts. The last error is returned.
pub async fn with_retry<T, F, Fut>(
    stage: &str,
    policy: RetryPolicy,
    mut task: F,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match task().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt <= policy.retries => {
                warn!(
                    "Stage {} failed on attempt {}/{}, retrying in {}s: {}",
                    stage,
                    attempt,
                    policy.retries + 1,
                    policy.delay.as_secs(),
                    err
                );
                time::sleep(policy.delay).await;
            },
            Err(err) => return Err(err),
        }
    }
}

/// Extract then load one partition. Load only starts once extraction has
/// succeeded for the same partition; each stage is retried on its own.
pub async fn run_pipeline<S, W>(
    http: &HTTP,
    storage: &S,
    warehouse: &W,
    partition: Partition,
    policy: RetryPolicy,
) -> Result<PipelineReport, Error>
where
    S: BlobStore,
    W: Warehouse,
{
    let mut state = PipelineState::Pending;
    info!("Partition {} is {}", partition, state);

    let location = match with_retry("extract", policy, || {
        extract(http, storage, partition)
    })
    .await
    {
        Ok(location) => location,
        Err(err) => {
            state = PipelineState::ExtractFailed;
            error!("Partition {} is {}", partition, state);
            return Err(err);
        },
    };

    state = PipelineState::Extracted;
    info!("Partition {} is {}", partition, state);

    let rows = match with_retry("load", policy, || {
        load(storage, warehouse, partition)
    })
    .await
    {
        Ok(rows) => rows,
        Err(err) => {
            state = PipelineState::LoadFailed;
            error!("Partition {} is {}", partition, state);
            return Err(err);
        },
    };

    state = PipelineState::Loaded;
    info!("Partition {} is {}", partition, state);

    Ok(PipelineReport {
        partition,
        state,
        location,
        rows,
    })
}
