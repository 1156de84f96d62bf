pub use self::{
    database::{DatabasePool, Warehouse},
    http::HTTP,
    storage::{BlobStore, S3Storage, JSON_CONTENT_TYPE},
};

mod database;
mod http;
mod storage;
