mod postgre;

pub use postgre::{
    ConnectOption, DataBase, PoolOption, PoolType, QueryResult,
    MAX_BIND_PARAMS,
};
