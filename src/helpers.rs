use std::{fmt, str::FromStr};

use chrono::{Local, NaiveDate};

use crate::error::Error;

pub const DOMAIN: &str = "crypto_markets";
pub const PARTITION_FORMAT: &str = "%Y-%m-%d";

/// Calendar day a pipeline run works on. Both stages derive every storage
/// location from it, so it is computed once and handed to each of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Partition(NaiveDate);

impl Partition {
    pub fn new(date: NaiveDate) -> Partition {
        Partition(date)
    }

    /// Current day in the host's local time zone.
    pub fn today() -> Partition {
        Partition(Local::now().date_naive())
    }

    pub fn blob_key(&self) -> String {
        format!("raw/{}/{}/data.json", DOMAIN, self)
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.format(PARTITION_FORMAT))
    }
}

impl FromStr for Partition {
    type Err = Error;

    fn from_str(value: &str) -> Result<Partition, Self::Err> {
        let partition =
            Partition(NaiveDate::parse_from_str(value, PARTITION_FORMAT)?);

        // chrono accepts unpadded and signed fields, the key layout does not
        if partition.to_string() != value {
            return Err(Error::ConfigurationError(format!(
                "partition date '{}' is not YYYY-MM-DD",
                value
            )));
        }

        Ok(partition)
    }
}
