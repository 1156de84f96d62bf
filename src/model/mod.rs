//! Warehouse row models.

mod raw_market;
mod table;

pub use raw_market::{Raw_Market, RAW_MARKETS_COLUMNS, RAW_MARKETS_TABLE};
pub use table::Table;
