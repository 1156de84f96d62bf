use sqlx::{error::Error, QueryBuilder, Transaction};
use tracing::error;

use super::{DataBase, QueryResult};
use crate::model::{Raw_Market, Table, RAW_MARKETS_COLUMNS};

impl Table<Raw_Market> {
    /// Replaces the whole table with `data` in one transaction: drop,
    /// recreate, one multi-row insert, commit. Any failure rolls the
    /// transaction back so readers keep seeing the previous contents.
    pub async fn replace_all(&self, data: &[Raw_Market]) -> Result<u64, Error> {
        let mut transaction = self.pool.begin().await?;

        let result = match self.recreate(&mut transaction).await {
            Ok(()) => self.insert_many(data, &mut transaction).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(rows) => {
                transaction.commit().await?;
                Ok(rows)
            },
            Err(err) => {
                if let Err(rollback_err) = transaction.rollback().await {
                    error!("Rollback of {} failed: {}", self.name, rollback_err);
                }
                Err(err)
            },
        }
    }

    pub async fn recreate(
        &self,
        transaction: &mut Transaction<'_, DataBase>,
    ) -> Result<(), Error> {
        sqlx::query(&format!(r#"DROP TABLE IF EXISTS "{}""#, self.name))
            .execute(&mut **transaction)
            .await?;

        sqlx::query(&format!(
            r#"
            CREATE TABLE "{}" (
                id TEXT,
                symbol TEXT,
                name TEXT,
                current_price NUMERIC,
                market_cap NUMERIC,
                total_volume NUMERIC,
                high_24h NUMERIC,
                low_24h NUMERIC,
                last_updated TEXT,
                _loaded_at TIMESTAMPTZ NOT NULL
            )
            "#,
            self.name
        ))
        .execute(&mut **transaction)
        .await?;

        Ok(())
    }

    pub async fn insert_many(
        &self,
        data: &[Raw_Market],
        transaction: &mut Transaction<'_, DataBase>,
    ) -> Result<u64, Error> {
        if data.is_empty() {
            return Ok(0);
        }

        let mut query_builder: QueryBuilder<DataBase> = QueryBuilder::new(
            format!(
                r#"INSERT INTO "{}" ({}) "#,
                self.name,
                RAW_MARKETS_COLUMNS.join(", ")
            ),
        );

        query_builder.push_values(data, |mut b, market| {
            b.push_bind(&market.asset_id)
                .push_bind(&market.symbol)
                .push_bind(&market.name)
                .push_bind(&market.current_price)
                .push_bind(&market.market_cap)
                .push_bind(&market.total_volume)
                .push_bind(&market.high_24h)
                .push_bind(&market.low_24h)
                .push_bind(&market.source_last_updated)
                .push_bind(market.loaded_at);
        });

        let result: QueryResult =
            query_builder.build().execute(&mut **transaction).await?;

        Ok(result.rows_affected())
    }

    pub async fn get_all(&self) -> Result<Vec<Raw_Market>, Error> {
        sqlx::query_as(&format!(
            r#"SELECT {} FROM "{}""#,
            RAW_MARKETS_COLUMNS.join(", "),
            self.name
        ))
        .fetch_all(&self.pool)
        .await
    }

    pub async fn count(&self) -> Result<i64, Error> {
        let (count,): (i64,) =
            sqlx::query_as(&format!(r#"SELECT COUNT(*) FROM "{}""#, self.name))
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
