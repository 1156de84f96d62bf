use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::Value;
use bigdecimal::BigDecimal;
use sqlx::FromRow;

pub const RAW_MARKETS_TABLE: &str = "raw_markets";

pub const RAW_MARKETS_COLUMNS: [&str; 10] = [
    "id",
    "symbol",
    "name",
    "current_price",
    "market_cap",
    "total_volume",
    "high_24h",
    "low_24h",
    "last_updated",
    "_loaded_at",
];

/// One asset of one partition, as landed in the raw layer. Every source field
/// is optional; only `loaded_at` is always set, by the loader.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Raw_Market {
    #[sqlx(rename = "id")]
    pub asset_id: Option<String>,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub current_price: Option<BigDecimal>,
    pub market_cap: Option<BigDecimal>,
    pub total_volume: Option<BigDecimal>,
    pub high_24h: Option<BigDecimal>,
    pub low_24h: Option<BigDecimal>,
    #[sqlx(rename = "last_updated")]
    pub source_last_updated: Option<String>,
    #[sqlx(rename = "_loaded_at")]
    pub loaded_at: DateTime<Utc>,
}

impl Raw_Market {
    /// Projects one element of the API array. Absent or mistyped fields become
    /// NULL instead of failing, and a non-object element yields an all-NULL
    /// row so the row count always matches the blob.
    pub fn from_value(value: &Value, loaded_at: DateTime<Utc>) -> Raw_Market {
        let field = |key: &str| value.get(key);

        Raw_Market {
            asset_id: text(field("id")),
            symbol: text(field("symbol")),
            name: text(field("name")),
            current_price: decimal(field("current_price")),
            market_cap: decimal(field("market_cap")),
            total_volume: decimal(field("total_volume")),
            high_24h: decimal(field("high_24h")),
            low_24h: decimal(field("low_24h")),
            source_last_updated: text(field("last_updated")),
            loaded_at,
        }
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.to_owned()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn decimal(value: Option<&Value>) -> Option<BigDecimal> {
    match value? {
        Value::Number(n) => BigDecimal::from_str(&n.to_string()).ok(),
        Value::String(s) => BigDecimal::from_str(s.trim()).ok(),
        _ => None,
    }
}
