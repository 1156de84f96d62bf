use std::{future::Future, time::Duration};

use aws_config::{timeout::TimeoutConfig, BehaviorVersion};
use aws_sdk_s3::{
    config::{Builder, Credentials, Region},
    error::DisplayErrorContext,
    primitives::ByteStream,
    Client,
};
use tracing::info;

use crate::{configuration::StorageConfig, error::Error};

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Object store holding one JSON blob per partition.
///
/// `put_json` must be all-or-nothing: after a failed call the key holds
/// either its previous object or nothing, never a truncated body.
pub trait BlobStore {
    fn bucket(&self) -> &str;

    fn put_json(
        &self,
        key: &str,
        body: Vec<u8>,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    /// Fails with `Error::MissingPartition` when nothing is stored at `key`.
    fn get(&self, key: &str)
        -> impl Future<Output = Result<Vec<u8>, Error>> + Send;
}

#[derive(Debug, Clone)]
pub struct S3Storage {
    pub client: Client,
    pub bucket: String,
}

impl S3Storage {
    pub async fn new(config: &StorageConfig) -> S3Storage {
        let timeouts = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(config.timeout))
            .build();

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .timeout_config(timeouts);

        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }

        if let Some(credentials) = &config.credentials {
            loader = loader.credentials_provider(Credentials::new(
                credentials.access_key_id.clone(),
                credentials.secret_access_key.clone(),
                None,
                None,
                "crypto-etl",
            ));
        }

        let sdk_config = loader.load().await;
        let mut builder = Builder::from(&sdk_config);

        if let Some(endpoint_url) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint_url.clone()).force_path_style(true);
        }

        S3Storage {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket_name.clone(),
        }
    }
}

impl BlobStore for S3Storage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_json(&self, key: &str, body: Vec<u8>) -> Result<(), Error> {
        let size = body.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(JSON_CONTENT_TYPE)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                Error::StorageError(format!(
                    "upload to s3://{}/{} failed: {}",
                    self.bucket,
                    key,
                    DisplayErrorContext(&e)
                ))
            })?;

        info!("Uploaded {} bytes to s3://{}/{}", size, self.bucket, key);

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, Error> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                if err.as_service_error().is_some_and(|e| e.is_no_such_key()) {
                    return Err(Error::MissingPartition(format!(
                        "s3://{}/{}",
                        self.bucket, key
                    )));
                }

                return Err(Error::StorageError(format!(
                    "download of s3://{}/{} failed: {}",
                    self.bucket,
                    key,
                    DisplayErrorContext(&err)
                )));
            },
        };

        let body = output.body.collect().await.map_err(|e| {
            Error::StorageError(format!(
                "reading s3://{}/{} failed: {}",
                self.bucket, key, e
            ))
        })?;

        Ok(body.into_bytes().to_vec())
    }
}
