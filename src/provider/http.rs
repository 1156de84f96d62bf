use std::time::Duration;

use reqwest::Client;
use tracing::info;
use url::Url;

use crate::{
    configuration::Config,
    error::{self, Error},
    types::MarketsPayload,
};

#[derive(Debug)]
pub struct HTTP {
    pub markets_url: Url,
    pub http: Client,
}

impl HTTP {
    pub fn new(config: &Config) -> Result<HTTP, Error> {
        let http = match Client::builder()
            .timeout(Duration::from_secs(config.api_timeout))
            .user_agent(concat!("crypto-etl/", env!("CARGO_PKG_VERSION")))
            .build()
        {
            Ok(c) => c,
            Err(e) => {
                return Err(error::Error::ReqwestError(e));
            },
        };

        HTTP::from_client(config, http)
    }

    pub fn from_client(config: &Config, http: Client) -> Result<HTTP, Error> {
        Ok(HTTP {
            markets_url: config.get_markets_url()?,
            http,
        })
    }

    /// One bounded request for the ranked market list. The status is checked
    /// before the body is read, and the body is returned untouched.
    pub async fn get_markets(&self) -> Result<MarketsPayload, Error> {
        info!("Fetching {}", &self.markets_url);

        let response = self.http.get(self.markets_url.clone()).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(Error::ApiStatus {
                status: status.as_u16(),
                url: self.markets_url.to_string(),
            });
        }

        let body = response.bytes().await?.to_vec();
        MarketsPayload::parse(body)
    }
}
