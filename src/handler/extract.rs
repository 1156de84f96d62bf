use tracing::{error, info};

use crate::{
    error::Error,
    helpers::Partition,
    provider::{BlobStore, HTTP},
    types::BlobLocation,
};

/// Fetches the ranked market list and stores the response body verbatim at
/// the partition's key. Nothing is uploaded unless the fetch fully succeeded,
/// and re-running for the same partition overwrites the same object.
pub async fn extract<S: BlobStore>(
    http: &HTTP,
    storage: &S,
    partition: Partition,
) -> Result<BlobLocation, Error> {
    let key = partition.blob_key();
    info!("Extracting partition {}", partition);

    let payload = http.get_markets().await.inspect_err(|e| {
        error!("API request failed [{}]: {}", e.kind(), e);
    })?;
    info!("Successfully fetched {} records", payload.records);

    info!("Uploading to bucket {}", storage.bucket());
    storage.put_json(&key, payload.body).await.inspect_err(|e| {
        error!("Upload of {} failed [{}]: {}", key, e.kind(), e);
    })?;

    let location = BlobLocation {
        bucket: storage.bucket().to_owned(),
        key,
        records: payload.records,
    };
    info!("Partition {} extracted to {}", partition, location);

    Ok(location)
}
