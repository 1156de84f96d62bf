use std::{future::Future, time::Duration};

use crate::{
    configuration::DatabaseConfig,
    dao::{ConnectOption, PoolOption, PoolType, MAX_BIND_PARAMS},
    error::Error,
    model::{Raw_Market, Table, RAW_MARKETS_COLUMNS, RAW_MARKETS_TABLE},
};

/// Relational target of the loader. The table must be a single-writer
/// resource: two replaces running at once race on drop-and-recreate, so
/// callers serialise loads.
pub trait Warehouse {
    /// Atomically swaps the destination table's contents for `rows` and
    /// returns the inserted row count. On error nothing has changed.
    fn replace_markets(
        &self,
        rows: &[Raw_Market],
    ) -> impl Future<Output = Result<u64, Error>> + Send;
}

#[derive(Debug)]
pub struct DatabasePool {
    pub raw_market: Table<Raw_Market>,
    pub pool: PoolType,
}

impl DatabasePool {
    /// Builds a lazily connecting pool; no connection is opened until the
    /// first query runs.
    pub fn new(config: &DatabaseConfig) -> DatabasePool {
        let options = ConnectOption::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.name)
            .username(&config.user)
            .password(&config.password);

        let pool = PoolOption::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(config.timeout))
            .connect_lazy_with(options);

        DatabasePool::from_pool(pool)
    }

    pub fn from_pool(pool: PoolType) -> DatabasePool {
        DatabasePool {
            raw_market: Table::new(pool.clone(), RAW_MARKETS_TABLE),
            pool,
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl Warehouse for DatabasePool {
    async fn replace_markets(&self, rows: &[Raw_Market]) -> Result<u64, Error> {
        let params = rows.len() * RAW_MARKETS_COLUMNS.len();

        if params > MAX_BIND_PARAMS {
            return Err(Error::BatchTooLarge {
                rows: rows.len(),
                params,
                limit: MAX_BIND_PARAMS,
            });
        }

        let inserted = self.raw_market.replace_all(rows).await?;
        Ok(inserted)
    }
}
