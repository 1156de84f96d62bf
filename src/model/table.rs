use std::marker::{self, PhantomData};

use crate::dao::PoolType;

/// Typed handle on one relational table. Queries for `T` live in
/// `dao::postgre` as `impl Table<T>` blocks.
#[derive(Debug)]
pub struct Table<T> {
    pub pool: PoolType,
    pub name: &'static str,
    _phantomdata: marker::PhantomData<T>,
}

impl<T> Table<T> {
    pub fn new(pool: PoolType, name: &'static str) -> Self {
        Table {
            pool,
            name,
            _phantomdata: PhantomData,
        }
    }
}
