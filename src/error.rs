use std::{fmt, io::Error as IO_ERROR};

use chrono::ParseError as DATE_PARSE_ERROR;
use reqwest::Error as REQWEST_ERROR;
use sqlx::error::Error as SQL_ERROR;
use thiserror::Error;
use tracing::subscriber::SetGlobalDefaultError as TRACING_GLOBAL_DEFAULT_ERROR;
use url::ParseError as URL_ERROR;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Io(#[from] IO_ERROR),

    #[error("{0}")]
    URL(#[from] URL_ERROR),

    #[error("{0}")]
    SQL(#[from] SQL_ERROR),

    #[error("{0}")]
    ReqwestError(#[from] REQWEST_ERROR),

    #[error("Invalid partition date: {0}")]
    DateParseError(#[from] DATE_PARSE_ERROR),

    #[error("Tracing error: {0}")]
    SetGlobalDefaultError(#[from] TRACING_GLOBAL_DEFAULT_ERROR),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Missing params: {0}")]
    MissingParams(String),

    #[error("Market API returned status {status} for {url}")]
    ApiStatus { status: u16, url: String },

    #[error("Malformed API response: {0}")]
    MalformedResponse(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Partition blob not found: {0}")]
    MissingPartition(String),

    #[error("Batch of {rows} rows needs {params} bind parameters, limit is {limit}")]
    BatchTooLarge {
        rows: usize,
        params: usize,
        limit: usize,
    },
}

/// Failure classes a stage can end with. The orchestrator only sees a non-zero
/// exit, the kind is there for logs and for callers that branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    UpstreamApi,
    Storage,
    Database,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "configuration"),
            ErrorKind::UpstreamApi => write!(f, "upstream-api"),
            ErrorKind::Storage => write!(f, "storage"),
            ErrorKind::Database => write!(f, "database"),
            ErrorKind::Internal => write!(f, "internal"),
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ConfigurationError(_)
            | Error::MissingParams(_)
            | Error::URL(_)
            | Error::DateParseError(_) => ErrorKind::Configuration,
            Error::ApiStatus { .. }
            | Error::MalformedResponse(_)
            | Error::ReqwestError(_) => ErrorKind::UpstreamApi,
            Error::StorageError(_) | Error::MissingPartition(_) => {
                ErrorKind::Storage
            },
            Error::SQL(_) | Error::BatchTooLarge { .. } => {
                ErrorKind::Database
            },
            Error::Io(_) | Error::SetGlobalDefaultError(_) => {
                ErrorKind::Internal
            },
        }
    }
}
