pub use self::types::{
    ConnectOption, DataBase, PoolOption, PoolType, QueryResult,
    MAX_BIND_PARAMS,
};

mod raw_market;
mod types;
