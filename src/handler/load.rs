use chrono::Utc;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::{
    error::Error,
    helpers::Partition,
    model::{Raw_Market, RAW_MARKETS_TABLE},
    provider::{BlobStore, Warehouse},
};

/// Materialises the partition's blob into the destination table.
///
/// The blob is downloaded and fully parsed before the warehouse is touched,
/// so a missing or corrupt extraction never drops the table. The replace
/// itself is one transaction: the table ends up holding either every record
/// of the blob or its previous contents.
pub async fn load<S, W>(
    storage: &S,
    warehouse: &W,
    partition: Partition,
) -> Result<u64, Error>
where
    S: BlobStore,
    W: Warehouse,
{
    let key = partition.blob_key();
    info!("Downloading {} from bucket {}", key, storage.bucket());

    let body = storage.get(&key).await.inspect_err(|e| {
        error!("Failed to download {} [{}]: {}", key, e.kind(), e);
    })?;

    let records = parse_records(&body).inspect_err(|e| {
        error!("Blob {} is unusable [{}]: {}", key, e.kind(), e);
    })?;
    info!("Downloaded {} records", records.len());

    let rows = project(&records);

    let without_id = rows.iter().filter(|row| row.asset_id.is_none()).count();
    if without_id > 0 {
        warn!("{} records of partition {} have no id", without_id, partition);
    }

    let inserted = warehouse.replace_markets(&rows).await.inspect_err(|e| {
        error!("Database error [{}]: {}", e.kind(), e);
    })?;
    info!(
        "Success! Loaded {} rows of partition {} into {}",
        inserted, partition, RAW_MARKETS_TABLE
    );

    Ok(inserted)
}

fn parse_records(body: &[u8]) -> Result<Vec<Value>, Error> {
    serde_json::from_slice::<Vec<Value>>(body).map_err(|e| {
        Error::StorageError(format!("blob is not a JSON array: {}", e))
    })
}

/// One row per record, all stamped with the same load time.
fn project(records: &[Value]) -> Vec<Raw_Market> {
    let loaded_at = Utc::now();

    records
        .iter()
        .map(|record| Raw_Market::from_value(record, loaded_at))
        .collect()
}
