use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions, PgQueryResult},
    PgPool, Postgres,
};

pub type PoolType = PgPool;
pub type PoolOption = PgPoolOptions;
pub type ConnectOption = PgConnectOptions;
pub type QueryResult = PgQueryResult;
pub type DataBase = Postgres;

/// Bind parameters PostgreSQL accepts in a single statement.
pub const MAX_BIND_PARAMS: usize = u16::MAX as usize;
